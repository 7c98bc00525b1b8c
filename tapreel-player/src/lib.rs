//! # Tapreel Player Library (tapreel-player)
//!
//! Tap-to-advance clip presentation: a fixed, cyclic playlist of short
//! clips is preloaded, then each user gesture crossfades to the next clip.
//!
//! **Architecture:**
//! - [`media`]: media element collaborator traits and the per-clip [`media::MediaSlot`]
//! - [`playback::Preloader`]: drives every slot to readiness under one deadline
//! - [`playback::PlaylistController`]: the start / crossfade / wrap state machine
//! - [`playback::InputGate`]: turns raw pointer and touch events into advance commands
//! - [`playback::Presentation`]: single-task session loop tying the above together
//! - [`surface`]: the visual host the controller shows, hides and fades slots on

pub mod error;
pub mod media;
pub mod playback;
pub mod surface;

pub use error::{Error, Result};
pub use playback::{Presentation, PresentationSettings};
