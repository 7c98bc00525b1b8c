//! Media slot: one clip plus its readiness and playback state

use super::{MediaElement, MediaError};
use crate::error::{Error, Result};
use crate::playback::capabilities::PrimingMode;
use std::sync::Arc;
use tracing::debug;

/// Preload lifecycle of a slot
///
/// Moves Unloaded -> Loading -> (Ready | Failed) exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

impl std::fmt::Display for ReadyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadyState::Unloaded => write!(f, "unloaded"),
            ReadyState::Loading => write!(f, "loading"),
            ReadyState::Ready => write!(f, "ready"),
            ReadyState::Failed => write!(f, "failed"),
        }
    }
}

/// One clip in the playlist
///
/// Owned exclusively by the Preloader until handoff, then by the
/// PlaylistController.
pub struct MediaSlot {
    index: usize,
    source_locator: String,
    ready_state: ReadyState,
    loop_flag: bool,
    /// Last opacity target sent to the surface
    opacity: f32,
    load_requested: bool,
    primed: bool,
    element: Arc<dyn MediaElement>,
}

impl std::fmt::Debug for MediaSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaSlot")
            .field("index", &self.index)
            .field("source_locator", &self.source_locator)
            .field("ready_state", &self.ready_state)
            .field("loop_flag", &self.loop_flag)
            .field("opacity", &self.opacity)
            .field("primed", &self.primed)
            .finish()
    }
}

impl MediaSlot {
    /// Wrap an opened element; slot 0 is the looping slot
    pub fn new(index: usize, element: Arc<dyn MediaElement>) -> Self {
        let loop_flag = index == 0;
        element.set_looping(loop_flag);
        Self {
            index,
            source_locator: element.locator().to_string(),
            ready_state: ReadyState::Unloaded,
            loop_flag,
            opacity: 0.0,
            load_requested: false,
            primed: false,
            element,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn source_locator(&self) -> &str {
        &self.source_locator
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    pub fn loop_flag(&self) -> bool {
        self.loop_flag
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn is_primed(&self) -> bool {
        self.primed
    }

    /// Playback position in seconds, as reported by the element
    pub fn playback_position(&self) -> f64 {
        self.element.current_position()
    }

    /// Shared handle to the element, used to await readiness concurrently
    pub fn element(&self) -> Arc<dyn MediaElement> {
        Arc::clone(&self.element)
    }

    pub fn mark_loading(&mut self) -> Result<()> {
        self.transition_ready_state(ReadyState::Unloaded, ReadyState::Loading)
    }

    pub fn mark_ready(&mut self) -> Result<()> {
        self.transition_ready_state(ReadyState::Loading, ReadyState::Ready)
    }

    pub fn mark_failed(&mut self) -> Result<()> {
        self.transition_ready_state(ReadyState::Loading, ReadyState::Failed)
    }

    fn transition_ready_state(&mut self, expected: ReadyState, next: ReadyState) -> Result<()> {
        if self.ready_state != expected {
            return Err(Error::InvalidState(format!(
                "slot {} cannot move to {} from {}",
                self.index, next, self.ready_state
            )));
        }
        debug!("Slot {} {} -> {}", self.index, self.ready_state, next);
        self.ready_state = next;
        Ok(())
    }

    /// Issue an explicit load once; later calls are no-ops
    pub fn request_load(&mut self) {
        if !self.load_requested {
            self.load_requested = true;
            self.element.load();
        }
    }

    /// Run the platform warm-up so a later `play` is honoured
    ///
    /// Idempotent: a primed slot is left untouched.
    pub async fn prime(&mut self, mode: PrimingMode) -> std::result::Result<(), MediaError> {
        if self.primed {
            return Ok(());
        }
        if mode.forces_load() {
            self.request_load();
        }
        if mode.plays_then_pauses() {
            self.element.play().await?;
            self.element.pause();
            self.element.set_current_position(0.0);
        }
        self.primed = true;
        debug!("Slot {} primed ({:?})", self.index, mode);
        Ok(())
    }

    pub fn reset_position(&self) {
        self.element.set_current_position(0.0);
    }

    pub async fn play(&self) -> std::result::Result<(), MediaError> {
        self.element.play().await
    }

    pub fn pause(&self) {
        self.element.pause();
    }

    pub fn prebuffer(&self) {
        self.element.prebuffer();
    }

    pub(crate) fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }
}
