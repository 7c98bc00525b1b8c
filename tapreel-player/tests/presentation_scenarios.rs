//! End-to-end presentation scenarios
//!
//! **Test Coverage:**
//! - Tap cycle through the playlist, wrapping back to the looping first clip
//! - Refused play request mid-session, then a successful retry
//! - Preload deadline: error shown, start prompt never appears
//! - Cyclic closure for playlists of one to four clips
//! - Exactly one visible slot whenever no transition is in flight
//! - Slot 0 keeps looping when nobody taps
//! - Busy policies (ignore / defer) and the end-of-clip advance mode,
//!   including clips shorter than the crossfade
//!
//! All tests run on the paused tokio clock, so fades and load delays
//! complete instantly.

mod test_session;

use std::time::Duration;
use tapreel_common::config::{AdvanceMode, BusyPolicy, TapreelConfig};
use tapreel_common::events::PresentationEvent;
use tapreel_player::media::{ClipScript, MediaElement, MediaError, SimulatedBackend};
use tapreel_player::Error;
use test_session::{config_with_clips, wait, TestSession, PRELOAD_SETTLE};

/// Test 1: Three-clip cycle
///
/// **Scenario:** [A (looping), B, C], tap four times
/// **Expected:** 0 -> 1 -> 2 -> 0; each outgoing clip paused and rewound
#[tokio::test(start_paused = true)]
async fn test_three_clip_tap_cycle() {
    let session = TestSession::ready(config_with_clips(3)).await;
    assert!(session.element(0).is_looping());
    assert!(!session.element(1).is_looping());
    assert!(!session.element(2).is_looping());

    // First tap starts on clip 0
    session.tap_and_settle().await;
    assert_eq!(session.surface.visible_slots(), vec![0]);
    assert_eq!(session.playing(), vec![0]);
    assert!(!session.surface.start_prompt_visible());

    for expected in [1, 2, 0] {
        session.tap_and_settle().await;
        assert_eq!(session.surface.visible_slots(), vec![expected]);
        assert_eq!(session.playing(), vec![expected]);
        for other in (0..3).filter(|i| *i != expected) {
            assert_eq!(session.element(other).current_position(), 0.0);
        }
    }

    let summary = session.finish().await.unwrap();
    assert!(summary.started);
    assert_eq!(summary.active_index, Some(0));
    assert_eq!(summary.transitions, 3);
}

/// Test 2: Refused play during an advance
///
/// **Scenario:** Start, then the play request for clip 1 is refused
/// **Expected:** Clip 0 stays on screen, error shown; the next tap retries 0 -> 1
#[tokio::test(start_paused = true)]
async fn test_play_rejection_keeps_last_good_clip() {
    let mut session = TestSession::ready(config_with_clips(3)).await;
    session.tap_and_settle().await;

    session.element(1).reject_next_plays(1);
    session.tap_and_settle().await;

    assert_eq!(session.surface.visible_slots(), vec![0]);
    assert_eq!(session.playing(), vec![0]);
    assert!(session.surface.error_visible());
    assert!(session.surface.errors()[0].contains("Tap again"));

    let rejected: Vec<_> = session
        .events()
        .iter()
        .filter_map(|e| match e {
            PresentationEvent::AdvanceRejected { from, to, .. } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(rejected, vec![(Some(0), 1)]);

    session.tap_and_settle().await;
    assert_eq!(session.surface.visible_slots(), vec![1]);
    assert!(!session.surface.error_visible());

    let summary = session.finish().await.unwrap();
    assert_eq!(summary.active_index, Some(1));
    assert_eq!(summary.transitions, 1);
}

/// Test 3: Preload deadline
///
/// **Scenario:** One clip never buffers; the deadline elapses
/// **Expected:** LoadTimeout with an actionable error; the start prompt never appears
#[tokio::test(start_paused = true)]
async fn test_preload_timeout_never_offers_start() {
    let mut config = config_with_clips(3);
    config.preload.timeout_ms = 5_000;
    let backend = SimulatedBackend::new(ClipScript::default())
        .with_script("clip2.mp4", ClipScript::stalled());

    let session = TestSession::launch_with(config, backend);
    wait(Duration::from_secs(1)).await;
    assert!(session.surface.loading_visible());
    assert_eq!(session.surface.snapshot().attached.len(), 3);

    wait(Duration::from_secs(5)).await;
    assert!(!session.surface.start_prompt_ever_shown());
    assert!(!session.surface.loading_visible());
    assert!(session.surface.error_visible());
    assert!(session.surface.errors()[0].contains("refresh"));
    assert!(session.playing().is_empty());

    match session.join().await {
        Err(Error::LoadTimeout {
            ready,
            total,
            timeout_ms,
        }) => {
            assert_eq!(ready, 2);
            assert_eq!(total, 3);
            assert_eq!(timeout_ms, 5_000);
        }
        other => panic!("expected LoadTimeout, got {:?}", other),
    }
}

/// Test 4: Load failure is fatal
///
/// **Scenario:** One clip fails to fetch during preload
/// **Expected:** LoadFailure naming the clip; no start prompt
#[tokio::test(start_paused = true)]
async fn test_load_failure_is_fatal() {
    let backend = SimulatedBackend::new(ClipScript::default()).with_script(
        "clip1.mp4",
        ClipScript::failing(MediaError::Network("404".to_string())),
    );
    let session = TestSession::launch_with(config_with_clips(3), backend);
    wait(PRELOAD_SETTLE).await;

    assert!(!session.surface.start_prompt_ever_shown());
    let surface = session.surface.clone();
    match session.join().await {
        Err(Error::LoadFailure { index, locator, .. }) => {
            assert_eq!(index, 1);
            assert_eq!(locator, "clip1.mp4");
        }
        other => panic!("expected LoadFailure, got {:?}", other),
    }
    assert!(surface.error_visible());
}

/// Test 5: Cyclic closure
///
/// **Scenario:** For N in 1..=4, start then tap N times
/// **Expected:** Back on slot 0 every time
#[tokio::test(start_paused = true)]
async fn test_n_taps_return_to_first_clip() {
    for n in 1..=4 {
        let session = TestSession::ready(config_with_clips(n)).await;
        session.tap_and_settle().await;
        for _ in 0..n {
            session.tap_and_settle().await;
        }
        assert_eq!(session.surface.visible_slots(), vec![0], "N = {}", n);

        let summary = session.finish().await.unwrap();
        assert_eq!(summary.active_index, Some(0), "N = {}", n);
        assert_eq!(summary.transitions, n as u64, "N = {}", n);
    }
}

/// Test 6: Single visible slot
///
/// **Scenario:** Walk the playlist, checking visibility mid-fade and after
/// **Expected:** One opacity target at a time; both clips play only while fading
#[tokio::test(start_paused = true)]
async fn test_one_visible_slot_when_settled() {
    let session = TestSession::ready(config_with_clips(4)).await;
    assert!(session.surface.visible_slots().is_empty());

    session.tap_and_settle().await;
    for _ in 0..6 {
        session.tap().await;
        // Mid-fade: both clips play; the surface has the new target
        assert_eq!(session.playing().len(), 2);
        assert_eq!(session.surface.visible_slots().len(), 1);

        session.settle().await;
        assert_eq!(session.surface.visible_slots().len(), 1);
        assert_eq!(session.playing().len(), 1);
        assert_eq!(session.playing(), session.surface.visible_slots());
    }
    session.finish().await.unwrap();
}

/// Test 7: No input, no advance
///
/// **Scenario:** Start, then wait a long time with clips that have a duration
/// **Expected:** Slot 0 loops and is still the only visible, playing slot
#[tokio::test(start_paused = true)]
async fn test_first_clip_loops_without_input() {
    let backend =
        SimulatedBackend::new(ClipScript::default().with_duration(Duration::from_secs(3)));
    let mut session = TestSession::launch_with(config_with_clips(3), backend);
    wait(PRELOAD_SETTLE).await;
    session.tap_and_settle().await;

    wait(Duration::from_secs(60)).await;
    assert_eq!(session.surface.visible_slots(), vec![0]);
    assert_eq!(session.playing(), vec![0]);
    assert_eq!(session.count_events("TransitionStarted"), 0);

    let summary = session.finish().await.unwrap();
    assert_eq!(summary.active_index, Some(0));
}

/// Test 8: Ignore policy
///
/// **Scenario:** Second tap lands mid-fade
/// **Expected:** Dropped; only one transition happens
#[tokio::test(start_paused = true)]
async fn test_taps_during_fade_are_ignored() {
    let mut session = TestSession::ready(config_with_clips(3)).await;
    session.tap_and_settle().await;

    session.tap().await;
    wait(Duration::from_millis(100)).await;
    session.tap().await;
    session.settle().await;
    wait(Duration::from_secs(1)).await;

    assert_eq!(session.surface.visible_slots(), vec![1]);
    assert_eq!(session.count_events("TransitionStarted"), 1);
    assert!(session.count_events("InputSuppressed") >= 1);

    let summary = session.finish().await.unwrap();
    assert_eq!(summary.transitions, 1);
}

/// Test 9: Defer policy
///
/// **Scenario:** Several taps land mid-fade
/// **Expected:** Exactly one extra advance runs once the fade settles
#[tokio::test(start_paused = true)]
async fn test_taps_during_fade_are_deferred_once() {
    let mut config = config_with_clips(4);
    config.transition.busy_policy = BusyPolicy::Defer;
    let mut session = TestSession::ready(config).await;
    session.tap_and_settle().await;

    session.tap().await;
    wait(Duration::from_millis(100)).await;
    session.tap().await;
    session.tap().await;
    session.settle().await;
    session.settle().await;

    assert_eq!(session.surface.visible_slots(), vec![2]);
    assert_eq!(session.count_events("TransitionStarted"), 2);

    let summary = session.finish().await.unwrap();
    assert_eq!(summary.transitions, 2);
}

/// Test 10: End-of-clip advance
///
/// **Scenario:** advance_mode = clip_end, clips last two seconds
/// **Expected:** Tap leaves the looping clip; later clips advance on their own and wrap
#[tokio::test(start_paused = true)]
async fn test_clip_end_mode_advances_without_taps() {
    let mut config: TapreelConfig = config_with_clips(3);
    config.transition.advance_mode = AdvanceMode::ClipEnd;
    let backend =
        SimulatedBackend::new(ClipScript::default().with_duration(Duration::from_secs(2)));
    let mut session = TestSession::launch_with(config, backend);
    wait(PRELOAD_SETTLE).await;

    session.tap_and_settle().await;
    wait(Duration::from_secs(10)).await;
    assert_eq!(session.surface.visible_slots(), vec![0]);

    // Leave the looping clip; 1 and 2 then run to their ends
    session.tap_and_settle().await;
    assert_eq!(session.surface.visible_slots(), vec![1]);

    // Taps on a non-looping clip do nothing in this mode
    session.tap_and_settle().await;
    assert_eq!(session.surface.visible_slots(), vec![1]);

    wait(Duration::from_secs(5)).await;
    assert_eq!(session.surface.visible_slots(), vec![0]);
    assert_eq!(session.count_events("TransitionCompleted"), 3);

    let summary = session.finish().await.unwrap();
    assert_eq!(summary.active_index, Some(0));
}

/// Test 11: Clips shorter than the crossfade
///
/// **Scenario:** advance_mode = clip_end, fade 800ms, clips last 300ms
/// **Expected:** Each clip that ends during its own fade-in advances once
/// the fade settles; the presentation wraps back to the looping clip
#[tokio::test(start_paused = true)]
async fn test_clip_end_mode_with_clips_shorter_than_fade() {
    let mut config: TapreelConfig = config_with_clips(3);
    config.transition.advance_mode = AdvanceMode::ClipEnd;
    config.transition.fade_ms = 800;
    let backend =
        SimulatedBackend::new(ClipScript::default().with_duration(Duration::from_millis(300)));
    let mut session = TestSession::launch_with(config, backend);
    wait(PRELOAD_SETTLE).await;

    session.tap_and_settle().await;
    session.tap_and_settle().await;

    wait(Duration::from_secs(60)).await;
    assert_eq!(session.surface.visible_slots(), vec![0]);
    assert_eq!(session.playing(), vec![0]);
    assert_eq!(session.count_events("TransitionCompleted"), 3);

    let summary = session.finish().await.unwrap();
    assert_eq!(summary.active_index, Some(0));
    assert_eq!(summary.transitions, 3);
}
