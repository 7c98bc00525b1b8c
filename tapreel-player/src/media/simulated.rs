//! Scriptable in-process media backend
//!
//! Stands in for the platform media pipeline in the headless harness and
//! in tests. Each clip follows a [`ClipScript`]: how long buffering takes,
//! whether it succeeds, how many play requests get refused, and whether
//! the runtime insists on an explicit `load()` before it buffers anything
//! (the behaviour of several mobile browsers).

use super::{MediaBackend, MediaElement, MediaError, MediaEvent, MediaEventSender, MediaOptions};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, trace};

/// How a clip's readiness wait resolves
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadBehavior {
    /// Becomes ready after the load delay
    Ready,
    /// Fails after the load delay
    Fail(MediaError),
    /// Never becomes ready
    Stall,
}

/// Scripted behaviour of one simulated clip
#[derive(Debug, Clone)]
pub struct ClipScript {
    pub load_delay: Duration,
    pub load: LoadBehavior,
    /// Number of upcoming play requests to refuse
    pub reject_plays: u32,
    /// Buffering does not begin until `load()` is called
    pub needs_explicit_load: bool,
    /// Clip length; `None` means the clip only ends via [`SimulatedElement::finish_playback`]
    pub duration: Option<Duration>,
}

impl Default for ClipScript {
    fn default() -> Self {
        Self {
            load_delay: Duration::from_millis(10),
            load: LoadBehavior::Ready,
            reject_plays: 0,
            needs_explicit_load: false,
            duration: None,
        }
    }
}

impl ClipScript {
    pub fn failing(error: MediaError) -> Self {
        Self {
            load: LoadBehavior::Fail(error),
            ..Self::default()
        }
    }

    pub fn stalled() -> Self {
        Self {
            load: LoadBehavior::Stall,
            ..Self::default()
        }
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn rejecting_plays(mut self, count: u32) -> Self {
        self.reject_plays = count;
        self
    }

    pub fn requiring_explicit_load(mut self) -> Self {
        self.needs_explicit_load = true;
        self
    }
}

/// Backend that opens [`SimulatedElement`]s
pub struct SimulatedBackend {
    default_script: ClipScript,
    scripts: HashMap<String, ClipScript>,
    elements: Mutex<Vec<Arc<SimulatedElement>>>,
}

impl SimulatedBackend {
    pub fn new(default_script: ClipScript) -> Self {
        Self {
            default_script,
            scripts: HashMap::new(),
            elements: Mutex::new(Vec::new()),
        }
    }

    /// Override the script for one locator
    pub fn with_script(mut self, locator: impl Into<String>, script: ClipScript) -> Self {
        self.scripts.insert(locator.into(), script);
        self
    }

    /// Element opened for slot `index`, if any
    pub fn element(&self, index: usize) -> Option<Arc<SimulatedElement>> {
        lock(&self.elements)
            .iter()
            .find(|e| e.index == index)
            .cloned()
    }

    /// Every element opened so far, in open order
    pub fn elements(&self) -> Vec<Arc<SimulatedElement>> {
        lock(&self.elements).clone()
    }
}

impl MediaBackend for SimulatedBackend {
    fn open(
        &self,
        index: usize,
        locator: &str,
        options: MediaOptions,
        events: MediaEventSender,
    ) -> Arc<dyn MediaElement> {
        let script = self
            .scripts
            .get(locator)
            .cloned()
            .unwrap_or_else(|| self.default_script.clone());
        debug!("Opening simulated clip {} ({})", index, locator);

        let element = SimulatedElement::new(index, locator, options, script, events);
        lock(&self.elements).push(Arc::clone(&element));
        element
    }
}

#[derive(Debug)]
struct ElementState {
    playing: bool,
    looping: bool,
    position: f64,
    reject_plays: u32,
    /// One-shot failure returned by the next play request
    play_failure: Option<MediaError>,
    load_count: u32,
    play_count: u32,
    pause_count: u32,
    prebuffer_count: u32,
    /// Bumped on every play/pause/seek so stale end timers are ignored
    generation: u64,
}

/// One simulated clip
pub struct SimulatedElement {
    index: usize,
    locator: String,
    options: MediaOptions,
    script: ClipScript,
    events: MediaEventSender,
    state: Mutex<ElementState>,
    load_signal: Notify,
    me: Weak<SimulatedElement>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SimulatedElement {
    fn new(
        index: usize,
        locator: &str,
        options: MediaOptions,
        script: ClipScript,
        events: MediaEventSender,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            index,
            locator: locator.to_string(),
            options,
            state: Mutex::new(ElementState {
                playing: false,
                looping: options.looping,
                position: 0.0,
                reject_plays: script.reject_plays,
                play_failure: None,
                load_count: 0,
                play_count: 0,
                pause_count: 0,
                prebuffer_count: 0,
                generation: 0,
            }),
            script,
            events,
            load_signal: Notify::new(),
            me: me.clone(),
        })
    }

    fn state(&self) -> MutexGuard<'_, ElementState> {
        lock(&self.state)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn options(&self) -> MediaOptions {
        self.options
    }

    pub fn is_playing(&self) -> bool {
        self.state().playing
    }

    pub fn is_looping(&self) -> bool {
        self.state().looping
    }

    pub fn play_count(&self) -> u32 {
        self.state().play_count
    }

    pub fn pause_count(&self) -> u32 {
        self.state().pause_count
    }

    pub fn load_count(&self) -> u32 {
        self.state().load_count
    }

    pub fn prebuffer_count(&self) -> u32 {
        self.state().prebuffer_count
    }

    /// Refuse the next `count` play requests
    pub fn reject_next_plays(&self, count: u32) {
        self.state().reject_plays = count;
    }

    /// Fail the next play request with `error`
    pub fn fail_next_play(&self, error: MediaError) {
        self.state().play_failure = Some(error);
    }

    /// Move the playhead forward while playing
    pub fn advance_position(&self, seconds: f64) {
        let mut state = self.state();
        if state.playing {
            state.position += seconds;
        }
    }

    /// Reach the end of the clip
    ///
    /// Looping clips wrap to the start and keep playing; others stop and
    /// signal `Ended`.
    pub fn finish_playback(&self) {
        let mut state = self.state();
        if !state.playing {
            return;
        }
        if state.looping {
            trace!("Clip {} looped", self.index);
            state.position = 0.0;
            state.generation += 1;
            let generation = state.generation;
            drop(state);
            self.arm_end_timer(generation);
            return;
        }
        state.playing = false;
        state.generation += 1;
        drop(state);

        debug!("Clip {} ended", self.index);
        let _ = self.events.send(MediaEvent::Ended { index: self.index });
    }

    fn arm_end_timer(&self, generation: u64) {
        let (Some(duration), Some(me)) = (self.script.duration, self.me.upgrade()) else {
            return;
        };
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let current = me.state().generation;
            if current == generation {
                me.finish_playback();
            }
        });
    }
}

#[async_trait]
impl MediaElement for SimulatedElement {
    fn locator(&self) -> &str {
        &self.locator
    }

    fn load(&self) {
        self.state().load_count += 1;
        self.load_signal.notify_waiters();
    }

    async fn can_play_through(&self) -> Result<(), MediaError> {
        if self.script.needs_explicit_load {
            loop {
                let notified = self.load_signal.notified();
                if self.state().load_count > 0 {
                    break;
                }
                notified.await;
            }
        }

        tokio::time::sleep(self.script.load_delay).await;

        match &self.script.load {
            LoadBehavior::Ready => Ok(()),
            LoadBehavior::Fail(error) => Err(error.clone()),
            LoadBehavior::Stall => std::future::pending().await,
        }
    }

    async fn play(&self) -> Result<(), MediaError> {
        let mut state = self.state();
        if let Some(error) = state.play_failure.take() {
            return Err(error);
        }
        if state.reject_plays > 0 {
            state.reject_plays -= 1;
            return Err(MediaError::NotAllowed(
                "play() request was refused by the autoplay policy".to_string(),
            ));
        }
        state.playing = true;
        state.play_count += 1;
        state.generation += 1;
        let generation = state.generation;
        drop(state);

        self.arm_end_timer(generation);
        Ok(())
    }

    fn pause(&self) {
        let mut state = self.state();
        state.playing = false;
        state.pause_count += 1;
        state.generation += 1;
    }

    fn current_position(&self) -> f64 {
        self.state().position
    }

    fn set_current_position(&self, seconds: f64) {
        let mut state = self.state();
        state.position = seconds.max(0.0);
        state.generation += 1;
        let rearm = state.playing.then_some(state.generation);
        drop(state);

        if let Some(generation) = rearm {
            self.arm_end_timer(generation);
        }
    }

    fn set_looping(&self, looping: bool) {
        self.state().looping = looping;
    }

    fn prebuffer(&self) {
        self.state().prebuffer_count += 1;
    }
}
