//! Media pipeline collaborator
//!
//! The platform's media element (an HTML `<video>` in the browser build,
//! [`simulated::SimulatedBackend`] in the headless harness and tests) sits
//! behind [`MediaElement`]. Elements are opened through a [`MediaBackend`]
//! and report completion on a [`MediaEvent`] channel.

pub mod simulated;
pub mod slot;

pub use simulated::{ClipScript, LoadBehavior, SimulatedBackend, SimulatedElement};
pub use slot::{MediaSlot, ReadyState};

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors reported by a media element
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// Play refused by an autoplay or user-gesture policy
    #[error("not allowed: {0}")]
    NotAllowed(String),

    /// Media could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    /// Media could not be fetched
    #[error("network error: {0}")]
    Network(String),

    /// Request superseded or cancelled by the element
    #[error("aborted: {0}")]
    Aborted(String),
}

/// Asynchronous notifications from media elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    /// Playback of a non-looping clip reached its end
    Ended { index: usize },
}

/// Sender half handed to every element at open time
pub type MediaEventSender = mpsc::UnboundedSender<MediaEvent>;

/// Element attributes fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaOptions {
    /// Mobile runtimes only allow inline autoplay for muted media
    pub muted: bool,
    /// Play inside the page rather than in a native fullscreen player
    pub inline: bool,
    /// Restart automatically at the end instead of signalling `Ended`
    pub looping: bool,
}

impl MediaOptions {
    /// Options for slot `index`; only the first slot loops
    pub fn for_slot(index: usize) -> Self {
        Self {
            muted: true,
            inline: true,
            looping: index == 0,
        }
    }
}

/// One playable clip resource
///
/// Methods take `&self`; implementations use interior mutability the way
/// a platform media element does.
#[async_trait]
pub trait MediaElement: Send + Sync {
    /// Clip identifier (URL or path)
    fn locator(&self) -> &str;

    /// Explicitly (re)start fetching the resource
    fn load(&self);

    /// Resolve once enough data is buffered to play through without stalling
    async fn can_play_through(&self) -> Result<(), MediaError>;

    /// Request playback; resolves when the pipeline accepts or refuses the request
    async fn play(&self) -> Result<(), MediaError>;

    fn pause(&self);

    /// Playback position in seconds
    fn current_position(&self) -> f64;

    fn set_current_position(&self, seconds: f64);

    fn set_looping(&self, looping: bool);

    /// Non-blocking hint to keep buffering ahead of a future `play`
    fn prebuffer(&self) {}
}

/// Factory for media elements
pub trait MediaBackend: Send + Sync {
    /// Create the element for slot `index`
    fn open(
        &self,
        index: usize,
        locator: &str,
        options: MediaOptions,
        events: MediaEventSender,
    ) -> Arc<dyn MediaElement>;
}
