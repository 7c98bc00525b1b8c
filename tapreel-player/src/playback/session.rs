//! Presentation session
//!
//! One tokio task owns the gate, the preloader and the controller and
//! multiplexes raw input, media notifications, the crossfade deadline and
//! shutdown with `select!`. Nothing else mutates presentation state.

use crate::error::{Error, Result};
use crate::media::{MediaBackend, MediaEvent};
use crate::playback::capabilities::Capabilities;
use crate::playback::controller::{ControllerSettings, PlaylistController};
use crate::playback::input_gate::{InputEvent, InputGate, ListenerHost};
use crate::playback::preloader::Preloader;
use crate::surface::PresentationSurface;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tapreel_common::config::TapreelConfig;
use tapreel_common::events::{EventBus, PresentationEvent};
use tapreel_common::time;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Everything a session needs from configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PresentationSettings {
    pub playlist: Vec<String>,
    pub preload_timeout: Duration,
    pub capabilities: Capabilities,
    pub controller: ControllerSettings,
    pub dedup_window: Duration,
}

impl PresentationSettings {
    /// Resolve settings, including the one-time priming capability check
    pub fn from_config(config: &TapreelConfig) -> Self {
        Self {
            playlist: config.playlist.clone(),
            preload_timeout: config.preload_timeout(),
            capabilities: Capabilities::resolve(
                config.preload.priming,
                config.preload.user_agent.as_deref(),
            ),
            controller: ControllerSettings::from_config(config),
            dedup_window: config.dedup_window(),
        }
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSummary {
    pub started: bool,
    /// Slot on screen at shutdown; `None` if the session never started
    pub active_index: Option<usize>,
    pub transitions: u64,
}

pub struct Presentation {
    settings: PresentationSettings,
    backend: Arc<dyn MediaBackend>,
    surface: Arc<dyn PresentationSurface>,
    events: EventBus,
    gate: InputGate,
}

impl Presentation {
    pub fn new(
        settings: PresentationSettings,
        backend: Arc<dyn MediaBackend>,
        surface: Arc<dyn PresentationSurface>,
        events: EventBus,
    ) -> Self {
        let gate = InputGate::new(settings.dedup_window);
        Self {
            settings,
            backend,
            surface,
            events,
            gate,
        }
    }

    pub fn settings(&self) -> &PresentationSettings {
        &self.settings
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Register input listeners on the presentation container
    pub fn bind_input(&mut self, host: &mut dyn ListenerHost) -> bool {
        self.gate.bind(host)
    }

    /// Run the session until `shutdown` resolves
    ///
    /// Returns the preload error if the clips never became ready; that
    /// error is shown on the surface and the start prompt never appears.
    pub async fn run<F>(
        mut self,
        mut input: mpsc::Receiver<InputEvent>,
        shutdown: F,
    ) -> Result<SessionSummary>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        if !self.gate.is_bound() {
            warn!("Running presentation without bound input listeners");
        }

        let (media_tx, mut media_rx) = mpsc::unbounded_channel::<MediaEvent>();
        let preloader = Preloader::new(
            self.settings.preload_timeout,
            self.settings.capabilities,
            self.events.clone(),
        );

        self.surface.set_start_prompt(false);
        self.surface.set_loading(true);

        let mut input_open = true;
        let loaded = {
            let preload = preloader.run(
                &self.settings.playlist,
                self.backend.as_ref(),
                self.surface.as_ref(),
                media_tx,
            );
            tokio::pin!(preload);

            loop {
                tokio::select! {
                    result = &mut preload => break result,
                    event = input.recv(), if input_open => match event {
                        Some(event) => {
                            debug!("Ignoring {} while clips are loading", event.kind);
                            self.emit_suppressed("clips still loading");
                        }
                        None => input_open = false,
                    },
                    _ = &mut shutdown => {
                        info!("Shutdown requested during preload");
                        self.surface.set_loading(false);
                        return Ok(SessionSummary::default());
                    }
                }
            }
        };

        self.surface.set_loading(false);
        let slots = match loaded {
            Ok(slots) => slots,
            Err(e) => {
                error!("Presentation cannot start: {}", e);
                self.surface.show_error(&e.user_message());
                return Err(e);
            }
        };

        let mut controller = PlaylistController::new(
            slots,
            self.settings.controller,
            Arc::clone(&self.surface),
            self.events.clone(),
        )?;
        self.surface.set_start_prompt(true);
        info!("Ready: waiting for the first tap");

        loop {
            let deadline = controller.fade_deadline();
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                event = input.recv(), if input_open => match event {
                    Some(event) => {
                        let decision = self.gate.accept(event);
                        if let Some(command) = decision.command {
                            let outcome = controller.handle_command(command).await.map(|_| ());
                            report(outcome)?;
                            self.gate.set_started(controller.is_started());
                        } else {
                            self.emit_suppressed("duplicate gesture");
                        }
                    }
                    None => {
                        debug!("Input channel closed");
                        input_open = false;
                    }
                },
                Some(event) = media_rx.recv() => {
                    report(controller.on_media_event(event).await.map(|_| ()))?;
                }
                _ = fade_elapsed(deadline) => {
                    report(controller.complete_transition().await.map(|_| ()))?;
                }
            }
        }

        let summary = SessionSummary {
            started: controller.is_started(),
            active_index: controller.is_started().then(|| controller.active_index()),
            transitions: controller.transitions_completed(),
        };
        info!(
            "Session ended after {} transitions (active clip {:?})",
            summary.transitions, summary.active_index
        );
        Ok(summary)
    }

    fn emit_suppressed(&self, reason: &str) {
        self.events.emit_lossy(PresentationEvent::InputSuppressed {
            reason: reason.to_string(),
            timestamp: time::now(),
        });
    }
}

/// Recoverable errors were already surfaced by the controller; only
/// fatal ones end the session.
fn report(result: Result<()>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e @ (Error::PlayRejected { .. } | Error::TransitionAborted { .. })) => {
            debug!("Recoverable: {}", e);
            Ok(())
        }
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!("{}", e);
            Ok(())
        }
    }
}

async fn fade_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{ClipScript, SimulatedBackend};
    use crate::playback::input_gate::{InputKind, ListenerRegistry};
    use crate::surface::RecordingSurface;
    use tapreel_common::config::PrimingSetting;

    #[test]
    fn test_settings_from_config() {
        let mut config = TapreelConfig::default();
        config.preload.priming = PrimingSetting::Auto;
        config.preload.user_agent = Some("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0)".to_string());

        let settings = PresentationSettings::from_config(&config);
        assert_eq!(settings.playlist, config.playlist);
        assert_eq!(settings.preload_timeout, Duration::from_millis(30_000));
        assert_eq!(settings.dedup_window, Duration::from_millis(600));
        assert!(settings.capabilities.priming.plays_then_pauses());
        assert_eq!(settings.controller.fade, Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_input_during_preload_is_suppressed() {
        let settings = PresentationSettings::from_config(&TapreelConfig::default());
        let backend = Arc::new(SimulatedBackend::new(
            ClipScript::default().with_load_delay(Duration::from_secs(2)),
        ));
        let surface = Arc::new(RecordingSurface::new());
        let mut presentation =
            Presentation::new(settings, backend.clone(), surface.clone(), EventBus::new(64));
        let mut host = ListenerRegistry::new();
        assert!(presentation.bind_input(&mut host));

        let (tx, rx) = mpsc::channel(8);
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let task = tokio::spawn(presentation.run(rx, async {
            let _ = stop_rx.await;
        }));

        tokio::time::sleep(Duration::from_millis(500)).await;
        tx.send(InputEvent::now(InputKind::Click)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(surface.loading_visible());
        assert!(backend.elements().iter().all(|e| !e.is_playing()));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!surface.loading_visible());
        assert!(surface.start_prompt_visible());

        stop_tx.send(()).unwrap();
        let summary = task.await.unwrap().unwrap();
        assert!(!summary.started);
        assert_eq!(summary.active_index, None);
    }
}
