//! Test harness wrapping a running Presentation session
//!
//! Spawns the session on the (paused) tokio clock with a SimulatedBackend
//! and a RecordingSurface, and exposes helpers to tap, wait and inspect.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use tapreel_common::config::TapreelConfig;
use tapreel_common::events::{EventBus, PresentationEvent};
use tapreel_player::media::{ClipScript, SimulatedBackend, SimulatedElement};
use tapreel_player::playback::{InputEvent, InputKind, ListenerRegistry, SessionSummary};
use tapreel_player::surface::RecordingSurface;
use tapreel_player::{Presentation, PresentationSettings, Result};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

/// Time for every default clip (10ms load delay) to become ready
pub const PRELOAD_SETTLE: Duration = Duration::from_millis(100);

pub struct TestSession {
    pub backend: Arc<SimulatedBackend>,
    pub surface: Arc<RecordingSurface>,
    pub host: ListenerRegistry,
    pub fade: Duration,
    input: mpsc::Sender<InputEvent>,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<SessionSummary>>,
    events: broadcast::Receiver<PresentationEvent>,
    seen: Vec<PresentationEvent>,
}

/// Config with `count` generated clip names
pub fn config_with_clips(count: usize) -> TapreelConfig {
    TapreelConfig {
        playlist: (0..count).map(|i| format!("clip{}.mp4", i)).collect(),
        ..TapreelConfig::default()
    }
}

impl TestSession {
    /// Launch with default clip behaviour
    pub fn launch(config: TapreelConfig) -> Self {
        Self::launch_with(config, SimulatedBackend::new(ClipScript::default()))
    }

    pub fn launch_with(config: TapreelConfig, backend: SimulatedBackend) -> Self {
        let settings = PresentationSettings::from_config(&config);
        let fade = settings.controller.fade;
        let backend = Arc::new(backend);
        let surface = Arc::new(RecordingSurface::new());
        let bus = EventBus::new(1024);
        let events = bus.subscribe();

        let mut presentation =
            Presentation::new(settings, backend.clone(), surface.clone(), bus);
        let mut host = ListenerRegistry::new();
        presentation.bind_input(&mut host);

        let (input, rx) = mpsc::channel(64);
        let (stop, stop_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(presentation.run(rx, async {
            let _ = stop_rx.await;
        }));

        Self {
            backend,
            surface,
            host,
            fade,
            input,
            stop: Some(stop),
            task,
            events,
            seen: Vec::new(),
        }
    }

    /// Launch and wait until the start prompt is up
    pub async fn ready(config: TapreelConfig) -> Self {
        let session = Self::launch(config);
        wait(PRELOAD_SETTLE).await;
        assert!(session.surface.start_prompt_visible(), "preload should have completed");
        session
    }

    /// Send one raw event and let the session handle it
    pub async fn send(&self, kind: InputKind) {
        self.input
            .send(InputEvent::now(kind))
            .await
            .expect("session stopped listening");
        wait(Duration::from_millis(1)).await;
    }

    pub async fn tap(&self) {
        self.send(InputKind::Click).await;
    }

    /// Tap, then wait for the crossfade to finish
    pub async fn tap_and_settle(&self) {
        self.tap().await;
        self.settle().await;
    }

    /// Wait past the fade duration
    pub async fn settle(&self) {
        wait(self.fade + Duration::from_millis(10)).await;
    }

    pub fn element(&self, index: usize) -> Arc<SimulatedElement> {
        self.backend.element(index).expect("no element for slot")
    }

    /// Indices of elements currently playing
    pub fn playing(&self) -> Vec<usize> {
        self.backend
            .elements()
            .iter()
            .filter(|e| e.is_playing())
            .map(|e| e.index())
            .collect()
    }

    /// Every event emitted so far
    pub fn events(&mut self) -> &[PresentationEvent] {
        while let Ok(event) = self.events.try_recv() {
            self.seen.push(event);
        }
        &self.seen
    }

    pub fn count_events(&mut self, event_type: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| e.event_type() == event_type)
            .count()
    }

    /// Stop the session and collect its result
    pub async fn finish(mut self) -> Result<SessionSummary> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.task.await.expect("session task panicked")
    }

    /// Wait for a session that ends on its own (preload failure)
    pub async fn join(self) -> Result<SessionSummary> {
        self.task.await.expect("session task panicked")
    }
}

pub async fn wait(duration: Duration) {
    tokio::time::sleep(duration).await;
}
