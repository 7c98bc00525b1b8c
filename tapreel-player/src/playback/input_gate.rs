//! Input gate
//!
//! Turns raw pointer and touch events into at most one advance command per
//! physical gesture. Touch runtimes fire `touchstart` and then a synthetic
//! `click` for the same tap; the second modality inside the de-duplication
//! window is swallowed.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Raw interaction kinds the gate understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    Click,
    TouchStart,
    PointerDown,
}

impl InputKind {
    /// DOM event name
    pub fn event_name(&self) -> &'static str {
        match self {
            InputKind::Click => "click",
            InputKind::TouchStart => "touchstart",
            InputKind::PointerDown => "pointerdown",
        }
    }

    /// Parse a DOM event name
    pub fn from_event_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "click" => Some(InputKind::Click),
            "touchstart" | "touch" => Some(InputKind::TouchStart),
            "pointerdown" | "pointer" => Some(InputKind::PointerDown),
            _ => None,
        }
    }
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.event_name())
    }
}

/// One raw interaction event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub kind: InputKind,
    pub at: Instant,
}

impl InputEvent {
    /// Event happening now
    pub fn now(kind: InputKind) -> Self {
        Self {
            kind,
            at: Instant::now(),
        }
    }

    pub fn at(kind: InputKind, at: Instant) -> Self {
        Self { kind, at }
    }
}

/// Command forwarded to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceCommand {
    /// First interaction of the session
    Start,
    /// Every later interaction
    Advance,
}

/// What to do with one raw event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateDecision {
    /// `None` when the event was a duplicate of an accepted gesture
    pub command: Option<AdvanceCommand>,
    /// Default browser handling (scroll, zoom, synthetic click) is always cancelled
    pub prevent_default: bool,
}

impl GateDecision {
    fn suppressed() -> Self {
        Self {
            command: None,
            prevent_default: true,
        }
    }

    fn forward(command: AdvanceCommand) -> Self {
        Self {
            command: Some(command),
            prevent_default: true,
        }
    }
}

/// Listener registration options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Passive listeners cannot cancel default handling, so this is always false
    pub passive: bool,
}

/// Something listeners can be attached to (the presentation container)
pub trait ListenerHost {
    fn add_listener(&mut self, kind: InputKind, options: ListenerOptions);
}

/// Host that only records registrations
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    registered: Vec<(InputKind, ListenerOptions)>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registered(&self) -> &[(InputKind, ListenerOptions)] {
        &self.registered
    }

    pub fn count(&self, kind: InputKind) -> usize {
        self.registered.iter().filter(|(k, _)| *k == kind).count()
    }
}

impl ListenerHost for ListenerRegistry {
    fn add_listener(&mut self, kind: InputKind, options: ListenerOptions) {
        self.registered.push((kind, options));
    }
}

/// Listeners every presentation needs
const BOUND_KINDS: [InputKind; 2] = [InputKind::Click, InputKind::TouchStart];

pub struct InputGate {
    dedup_window: Duration,
    last_accepted: Option<InputEvent>,
    bound: bool,
    started: bool,
}

impl InputGate {
    pub fn new(dedup_window: Duration) -> Self {
        Self {
            dedup_window,
            last_accepted: None,
            bound: false,
            started: false,
        }
    }

    /// Register listeners on `host`
    ///
    /// Returns false if this gate was already bound; nothing is registered twice.
    pub fn bind(&mut self, host: &mut dyn ListenerHost) -> bool {
        if self.bound {
            debug!("Input listeners already bound");
            return false;
        }
        for kind in BOUND_KINDS {
            host.add_listener(kind, ListenerOptions { passive: false });
        }
        self.bound = true;
        debug!("Bound input listeners: click, touchstart");
        true
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Whether the presentation has started (taps advance rather than start)
    pub fn set_started(&mut self, started: bool) {
        self.started = started;
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Classify one raw event
    pub fn accept(&mut self, event: InputEvent) -> GateDecision {
        if let Some(last) = self.last_accepted {
            let since = event.at.saturating_duration_since(last.at);
            if last.kind != event.kind && since < self.dedup_window {
                trace!(
                    "Suppressed {} {}ms after {}",
                    event.kind,
                    since.as_millis(),
                    last.kind
                );
                return GateDecision::suppressed();
            }
        }

        self.last_accepted = Some(event);
        let command = if self.started {
            AdvanceCommand::Advance
        } else {
            AdvanceCommand::Start
        };
        debug!("{} -> {:?}", event.kind, command);
        GateDecision::forward(command)
    }
}
