//! Preload, transition and input handling

pub mod capabilities;
pub mod controller;
pub mod input_gate;
pub mod preloader;
pub mod session;

pub use capabilities::{Capabilities, PrimingMode};
pub use controller::{AdvanceOutcome, ControllerSettings, ControllerState, Fault, PlaylistController};
pub use input_gate::{
    AdvanceCommand, GateDecision, InputEvent, InputGate, InputKind, ListenerHost, ListenerOptions,
    ListenerRegistry,
};
pub use preloader::Preloader;
pub use session::{Presentation, PresentationSettings, SessionSummary};
