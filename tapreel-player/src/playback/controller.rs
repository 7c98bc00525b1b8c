//! Playlist controller: the presentation state machine
//!
//! States:
//! - `NotStarted`: slots ready, waiting for the first gesture
//! - `Presenting(i)`: slot `i` visible and playing
//! - `Transitioning { from, to }`: crossfade in flight, both slots playing
//! - `Error(fault)`: a play request was refused; the next gesture retries
//!
//! A transition from slot `i` to `j = (i + 1) % N` runs strictly in order:
//! rewind `j`, play `j` while still hidden, wait for the play request to be
//! acknowledged, start the crossfade, move `active_index` to `j`, and once
//! the fade duration has elapsed pause and rewind `i`.
//!
//! The controller never sleeps. It records the fade deadline and the
//! session loop calls [`PlaylistController::complete_transition`] when the
//! deadline passes, so every mutation happens on one logical thread.

use crate::error::{Error, Result};
use crate::media::{MediaError, MediaEvent, MediaSlot, ReadyState};
use crate::playback::input_gate::AdvanceCommand;
use crate::surface::{PresentationSurface, VisibilityFade};
use std::sync::Arc;
use std::time::Duration;
use tapreel_common::config::{AdvanceMode, BusyPolicy, TapreelConfig};
use tapreel_common::events::{EventBus, PresentationEvent};
use tapreel_common::time;
use tapreel_common::FadeCurve;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Transition tuning taken from configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerSettings {
    /// One duration for both halves of the crossfade
    pub fade: Duration,
    pub curve: FadeCurve,
    pub busy_policy: BusyPolicy,
    pub advance_mode: AdvanceMode,
}

impl ControllerSettings {
    pub fn from_config(config: &TapreelConfig) -> Self {
        Self {
            fade: config.fade_duration(),
            curve: config.transition.fade_curve,
            busy_policy: config.transition.busy_policy,
            advance_mode: config.transition.advance_mode,
        }
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from_config(&TapreelConfig::default())
    }
}

/// Recoverable fault left behind by a refused play request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fault {
    /// Slot still on screen; `None` if the refused request was the start
    pub active: Option<usize>,
    /// Slot the refused request targeted
    pub target: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    NotStarted,
    Presenting(usize),
    Transitioning { from: usize, to: usize },
    Error(Fault),
}

impl std::fmt::Display for ControllerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControllerState::NotStarted => write!(f, "NotStarted"),
            ControllerState::Presenting(i) => write!(f, "Presenting({})", i),
            ControllerState::Transitioning { from, to } => {
                write!(f, "Transitioning({}, {})", from, to)
            }
            ControllerState::Error(fault) => write!(f, "Error(-> {})", fault.target),
        }
    }
}

/// Result of handling one advance command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// First slot activated
    Started,
    /// Crossfade initiated
    TransitionStarted { from: usize, to: usize },
    /// Single-slot playlist: the clip restarted in place
    Restarted { index: usize },
    /// Dropped: transition in flight under `BusyPolicy::Ignore`
    Ignored,
    /// Remembered: will run once the in-flight transition settles
    Deferred,
    /// Dropped: this command's source is not wired in the current mode
    NotWired,
}

pub struct PlaylistController {
    slots: Vec<MediaSlot>,
    active_index: usize,
    started: bool,
    state: ControllerState,
    settings: ControllerSettings,
    surface: Arc<dyn PresentationSurface>,
    events: EventBus,
    fade_deadline: Option<Instant>,
    deferred_advance: bool,
    /// The incoming clip finished before its fade-in did
    ended_mid_fade: bool,
    transitions_completed: u64,
}

impl PlaylistController {
    /// Take ownership of preloaded slots
    ///
    /// Every slot must be Ready; the controller is not actionable otherwise.
    pub fn new(
        slots: Vec<MediaSlot>,
        settings: ControllerSettings,
        surface: Arc<dyn PresentationSurface>,
        events: EventBus,
    ) -> Result<Self> {
        if slots.is_empty() {
            return Err(Error::InvalidState(
                "controller needs at least one slot".to_string(),
            ));
        }
        if let Some(slot) = slots.iter().find(|s| s.ready_state() != ReadyState::Ready) {
            return Err(Error::InvalidState(format!(
                "slot {} is {}, not ready",
                slot.index(),
                slot.ready_state()
            )));
        }

        Ok(Self {
            slots,
            active_index: 0,
            started: false,
            state: ControllerState::NotStarted,
            settings,
            surface,
            events,
            fade_deadline: None,
            deferred_advance: false,
            ended_mid_fade: false,
            transitions_completed: 0,
        })
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn slots(&self) -> &[MediaSlot] {
        &self.slots
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// When the in-flight crossfade finishes, if one is running
    pub fn fade_deadline(&self) -> Option<Instant> {
        self.fade_deadline
    }

    pub fn transitions_completed(&self) -> u64 {
        self.transitions_completed
    }

    fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.slots.len()
    }

    /// Handle a command produced by the input gate
    ///
    /// Before the session has started every command starts it. Afterwards
    /// taps advance in `AdvanceMode::Tap`. In `ClipEnd` mode a tap only
    /// leaves a looping slot (which never ends on its own) or retries a
    /// refused play request.
    pub async fn handle_command(&mut self, command: AdvanceCommand) -> Result<AdvanceOutcome> {
        debug!("{:?} command in state {}", command, self.state);
        let wired = match self.state {
            ControllerState::NotStarted | ControllerState::Error(_) => true,
            _ if self.settings.advance_mode == AdvanceMode::Tap => true,
            ControllerState::Presenting(i) => self.slots[i].loop_flag(),
            ControllerState::Transitioning { .. } => false,
        };
        if !wired {
            debug!("Tap advance not wired in {:?} mode", self.settings.advance_mode);
            self.emit_suppressed("tap advance disabled in clip-end mode");
            return Ok(AdvanceOutcome::NotWired);
        }
        self.advance().await
    }

    /// Handle a notification from a media element
    pub async fn on_media_event(&mut self, event: MediaEvent) -> Result<Option<AdvanceOutcome>> {
        match event {
            MediaEvent::Ended { index } => {
                if self.settings.advance_mode != AdvanceMode::ClipEnd {
                    debug!("Clip {} ended; end-of-clip advance not wired", index);
                    return Ok(None);
                }
                if self.slots[index].loop_flag() {
                    return Ok(None);
                }
                match self.state {
                    ControllerState::Presenting(active) if active == index => {
                        info!("Clip {} finished, advancing", index);
                        self.advance().await.map(Some)
                    }
                    ControllerState::Transitioning { to, .. } if to == index => {
                        debug!("Clip {} finished during its fade-in", index);
                        self.ended_mid_fade = true;
                        Ok(None)
                    }
                    _ => {
                        debug!("Ignoring end of clip {} in state {}", index, self.state);
                        Ok(None)
                    }
                }
            }
        }
    }

    async fn advance(&mut self) -> Result<AdvanceOutcome> {
        match self.state {
            ControllerState::NotStarted => self.start().await,
            ControllerState::Error(Fault { active: None, .. }) => self.start().await,
            ControllerState::Presenting(i) => self.begin_transition(i).await,
            ControllerState::Error(Fault {
                active: Some(i), ..
            }) => self.begin_transition(i).await,
            ControllerState::Transitioning { from, to } => match self.settings.busy_policy {
                BusyPolicy::Ignore => {
                    debug!("Advance ignored: transition {} -> {} in flight", from, to);
                    self.emit_suppressed("transition in progress");
                    Ok(AdvanceOutcome::Ignored)
                }
                BusyPolicy::Defer => {
                    debug!("Advance deferred until {} -> {} settles", from, to);
                    self.deferred_advance = true;
                    Ok(AdvanceOutcome::Deferred)
                }
            },
        }
    }

    /// NotStarted -> Presenting(0)
    async fn start(&mut self) -> Result<AdvanceOutcome> {
        let first = &mut self.slots[0];
        first.reset_position();
        first.set_opacity(1.0);
        self.surface.set_visibility(
            0,
            VisibilityFade::over(1.0, self.settings.fade, self.settings.curve),
        );

        if let Err(reason) = self.slots[0].play().await {
            self.slots[0].set_opacity(0.0);
            self.surface.set_visibility(0, VisibilityFade::immediate(0.0));
            self.state = ControllerState::Error(Fault {
                active: None,
                target: 0,
            });
            let error = Error::PlayRejected { index: 0, reason };
            self.report_rejection(None, 0, &error);
            return Err(error);
        }

        self.started = true;
        self.active_index = 0;
        self.state = ControllerState::Presenting(0);
        self.surface.set_start_prompt(false);
        self.surface.clear_error();
        info!("Presentation started on clip 0");
        self.events.emit_lossy(PresentationEvent::PresentationStarted {
            index: 0,
            timestamp: time::now(),
        });
        self.prebuffer_after(0);
        Ok(AdvanceOutcome::Started)
    }

    /// Presenting(i) -> Transitioning(i, j)
    async fn begin_transition(&mut self, from: usize) -> Result<AdvanceOutcome> {
        let to = self.next_index(from);
        if to == from {
            return self.restart_in_place(from).await;
        }

        // 1. Rewind, 2. play while still hidden
        self.slots[to].reset_position();
        if let Err(reason) = self.slots[to].play().await {
            self.slots[to].pause();
            self.slots[to].reset_position();
            self.state = ControllerState::Error(Fault {
                active: Some(from),
                target: to,
            });
            let error = if matches!(reason, MediaError::NotAllowed(_)) {
                Error::PlayRejected { index: to, reason }
            } else {
                Error::TransitionAborted { from, to, reason }
            };
            self.report_rejection(Some(from), to, &error);
            return Err(error);
        }

        // 3. Play acknowledged: crossfade with one duration for both halves
        let fade = self.settings.fade;
        let curve = self.settings.curve;
        self.slots[from].set_opacity(0.0);
        self.slots[to].set_opacity(1.0);
        self.surface
            .set_visibility(from, VisibilityFade::over(0.0, fade, curve));
        self.surface
            .set_visibility(to, VisibilityFade::over(1.0, fade, curve));
        self.surface.clear_error();

        // 4. Logical position moves as soon as the fade is initiated
        self.active_index = to;
        self.ended_mid_fade = false;
        self.state = ControllerState::Transitioning { from, to };
        self.fade_deadline = Some(Instant::now() + fade);

        info!("Crossfade {} -> {} ({}ms)", from, to, fade.as_millis());
        self.events.emit_lossy(PresentationEvent::TransitionStarted {
            from,
            to,
            timestamp: time::now(),
        });
        Ok(AdvanceOutcome::TransitionStarted { from, to })
    }

    /// Single-slot playlist: rewind and replay without a crossfade
    async fn restart_in_place(&mut self, index: usize) -> Result<AdvanceOutcome> {
        self.slots[index].reset_position();
        if let Err(reason) = self.slots[index].play().await {
            self.state = ControllerState::Error(Fault {
                active: Some(index),
                target: index,
            });
            let error = Error::PlayRejected { index, reason };
            self.report_rejection(Some(index), index, &error);
            return Err(error);
        }
        self.surface.clear_error();
        self.state = ControllerState::Presenting(index);
        self.transitions_completed += 1;
        self.events.emit_lossy(PresentationEvent::TransitionCompleted {
            active: index,
            timestamp: time::now(),
        });
        Ok(AdvanceOutcome::Restarted { index })
    }

    /// Transitioning(i, j) -> Presenting(j)
    ///
    /// 5. Pause and rewind the outgoing slot. Runs a deferred advance, or
    /// the end-of-clip advance for a clip shorter than the fade, and
    /// returns its outcome.
    pub async fn complete_transition(&mut self) -> Result<Option<AdvanceOutcome>> {
        let ControllerState::Transitioning { from, to } = self.state else {
            debug!("No transition to complete in state {}", self.state);
            return Ok(None);
        };

        self.slots[from].pause();
        self.slots[from].reset_position();
        self.fade_deadline = None;
        self.state = ControllerState::Presenting(to);
        self.transitions_completed += 1;

        info!("Now presenting clip {}", to);
        self.events.emit_lossy(PresentationEvent::TransitionCompleted {
            active: to,
            timestamp: time::now(),
        });
        self.prebuffer_after(to);

        let deferred = std::mem::take(&mut self.deferred_advance);
        let ended = std::mem::take(&mut self.ended_mid_fade);
        if deferred || ended {
            debug!("Running pending advance (deferred: {}, ended: {})", deferred, ended);
            return self.advance().await.map(Some);
        }
        Ok(None)
    }

    /// Keep the successor of `index` buffering as a latency hedge
    fn prebuffer_after(&self, index: usize) {
        let next = self.next_index(index);
        if next != index {
            self.slots[next].prebuffer();
        }
    }

    fn report_rejection(&self, from: Option<usize>, to: usize, error: &Error) {
        warn!("{}", error);
        self.surface.show_error(&error.user_message());
        self.events.emit_lossy(PresentationEvent::AdvanceRejected {
            from,
            to,
            message: error.to_string(),
            timestamp: time::now(),
        });
    }

    fn emit_suppressed(&self, reason: &str) {
        self.events.emit_lossy(PresentationEvent::InputSuppressed {
            reason: reason.to_string(),
            timestamp: time::now(),
        });
    }
}
