//! Event types for the tapreel event system
//!
//! Provides the presentation event enum and the EventBus that distributes it.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Presentation event types
///
/// Events are broadcast via EventBus and serialize with a `type` tag so a
/// host page or log shipper can consume them as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PresentationEvent {
    /// One more slot became ready during preload
    PreloadProgress {
        ready: usize,
        total: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Every slot is ready; the start prompt is now visible
    PreloadComplete {
        total: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Preload failed or timed out; the session can never start
    PreloadFailed {
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// First interaction activated the first slot
    PresentationStarted {
        index: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Crossfade initiated between two slots
    TransitionStarted {
        from: usize,
        to: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Crossfade finished; outgoing slot paused and rewound
    TransitionCompleted {
        active: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Play request for the incoming slot was refused
    ///
    /// `from` is `None` when the rejected request was the initial start.
    AdvanceRejected {
        from: Option<usize>,
        to: usize,
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An interaction was dropped (duplicate modality, busy, not ready)
    InputSuppressed {
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl PresentationEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            PresentationEvent::PreloadProgress { .. } => "PreloadProgress",
            PresentationEvent::PreloadComplete { .. } => "PreloadComplete",
            PresentationEvent::PreloadFailed { .. } => "PreloadFailed",
            PresentationEvent::PresentationStarted { .. } => "PresentationStarted",
            PresentationEvent::TransitionStarted { .. } => "TransitionStarted",
            PresentationEvent::TransitionCompleted { .. } => "TransitionCompleted",
            PresentationEvent::AdvanceRejected { .. } => "AdvanceRejected",
            PresentationEvent::InputSuppressed { .. } => "InputSuppressed",
        }
    }
}

/// Central event distribution bus
///
/// Uses tokio::broadcast internally:
/// - Non-blocking publish (slow subscribers don't block the controller)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use tapreel_common::events::{EventBus, PresentationEvent};
///
/// let bus = EventBus::new(100);
/// let mut rx = bus.subscribe();
///
/// bus.emit_lossy(PresentationEvent::PresentationStarted {
///     index: 0,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert_eq!(rx.try_recv().unwrap().event_type(), "PresentationStarted");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PresentationEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<PresentationEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: PresentationEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
