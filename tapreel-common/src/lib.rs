//! # Tapreel Common Library
//!
//! Shared code for the tapreel crates:
//! - Error type and `Result` alias
//! - Presentation event types and the broadcast EventBus
//! - Fade curve definitions used for crossfades
//! - Bootstrap configuration loading (TOML + environment)
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod events;
pub mod fade_curves;
pub mod time;

pub use config::TapreelConfig;
pub use error::{Error, Result};
pub use events::{EventBus, PresentationEvent};
pub use fade_curves::FadeCurve;
