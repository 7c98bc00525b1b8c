//! Presentation surface collaborator
//!
//! The visual host (DOM container in the browser build) that attaches
//! slots, fades them, and displays the loading indicator, start prompt
//! and error message. The controller never touches layout directly.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tapreel_common::{time, FadeCurve};
use tracing::{debug, info, warn};

/// Opacity change for one slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityFade {
    /// Target opacity (0.0 hidden, 1.0 fully visible)
    pub opacity: f32,
    pub duration: Duration,
    pub curve: FadeCurve,
}

impl VisibilityFade {
    /// Jump straight to `opacity`
    pub fn immediate(opacity: f32) -> Self {
        Self {
            opacity,
            duration: Duration::ZERO,
            curve: FadeCurve::Linear,
        }
    }

    pub fn over(opacity: f32, duration: Duration, curve: FadeCurve) -> Self {
        Self {
            opacity,
            duration,
            curve,
        }
    }

    /// Opacity `elapsed` into the fade, starting from `from`
    pub fn opacity_at(&self, from: f32, elapsed: Duration) -> f32 {
        let progress = time::progress(elapsed, self.duration);
        if progress >= 1.0 {
            return self.opacity;
        }
        self.curve.interpolate(from, self.opacity, progress)
    }
}

/// Visual host for the slots
pub trait PresentationSurface: Send + Sync {
    /// Add a slot's element to the container (hidden)
    fn attach(&self, index: usize, locator: &str);

    /// Start an opacity transition for a slot
    fn set_visibility(&self, index: usize, fade: VisibilityFade);

    /// Show an actionable error message
    fn show_error(&self, message: &str);

    /// Remove a previously shown error message
    fn clear_error(&self);

    /// Show or hide the "tap to start" prompt
    fn set_start_prompt(&self, visible: bool);

    /// Show or hide the loading indicator
    fn set_loading(&self, visible: bool);
}

/// Surface that only logs, used by the headless harness
#[derive(Debug, Default)]
pub struct LoggingSurface;

impl PresentationSurface for LoggingSurface {
    fn attach(&self, index: usize, locator: &str) {
        debug!("attach slot {} <- {}", index, locator);
    }

    fn set_visibility(&self, index: usize, fade: VisibilityFade) {
        info!(
            "slot {} -> opacity {:.1} over {}ms ({})",
            index,
            fade.opacity,
            fade.duration.as_millis(),
            fade.curve
        );
    }

    fn show_error(&self, message: &str) {
        warn!("error shown: {}", message);
    }

    fn clear_error(&self) {
        debug!("error cleared");
    }

    fn set_start_prompt(&self, visible: bool) {
        info!("start prompt {}", if visible { "shown" } else { "hidden" });
    }

    fn set_loading(&self, visible: bool) {
        info!("loading indicator {}", if visible { "shown" } else { "hidden" });
    }
}

/// Everything a [`RecordingSurface`] has been told
#[derive(Debug, Clone, Default)]
pub struct SurfaceRecord {
    pub attached: Vec<(usize, String)>,
    /// Latest opacity target per slot
    pub opacity: BTreeMap<usize, f32>,
    /// Every fade, in call order
    pub fades: Vec<(usize, VisibilityFade)>,
    pub errors: Vec<String>,
    pub error_visible: bool,
    pub start_prompt: bool,
    pub start_prompt_shown_count: usize,
    pub loading: bool,
}

/// Surface that records calls for inspection
#[derive(Debug, Default)]
pub struct RecordingSurface {
    record: Mutex<SurfaceRecord>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceRecord> {
        self.record
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> SurfaceRecord {
        self.lock().clone()
    }

    pub fn opacity(&self, index: usize) -> f32 {
        self.lock().opacity.get(&index).copied().unwrap_or(0.0)
    }

    /// Slots whose latest opacity target is non-zero
    pub fn visible_slots(&self) -> Vec<usize> {
        self.lock()
            .opacity
            .iter()
            .filter(|(_, opacity)| **opacity > 0.0)
            .map(|(index, _)| *index)
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.lock().errors.clone()
    }

    pub fn error_visible(&self) -> bool {
        self.lock().error_visible
    }

    pub fn start_prompt_visible(&self) -> bool {
        self.lock().start_prompt
    }

    pub fn start_prompt_ever_shown(&self) -> bool {
        self.lock().start_prompt_shown_count > 0
    }

    pub fn loading_visible(&self) -> bool {
        self.lock().loading
    }
}

impl PresentationSurface for RecordingSurface {
    fn attach(&self, index: usize, locator: &str) {
        let mut record = self.lock();
        record.attached.push((index, locator.to_string()));
        record.opacity.insert(index, 0.0);
    }

    fn set_visibility(&self, index: usize, fade: VisibilityFade) {
        let mut record = self.lock();
        record.opacity.insert(index, fade.opacity);
        record.fades.push((index, fade));
    }

    fn show_error(&self, message: &str) {
        let mut record = self.lock();
        record.errors.push(message.to_string());
        record.error_visible = true;
    }

    fn clear_error(&self) {
        self.lock().error_visible = false;
    }

    fn set_start_prompt(&self, visible: bool) {
        let mut record = self.lock();
        record.start_prompt = visible;
        if visible {
            record.start_prompt_shown_count += 1;
        }
    }

    fn set_loading(&self, visible: bool) {
        self.lock().loading = visible;
    }
}
