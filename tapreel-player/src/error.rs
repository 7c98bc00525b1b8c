//! Error types for tapreel-player
//!
//! Load errors are fatal to session start. Play rejections during an
//! advance are recoverable: the session keeps its last good slot and the
//! next user gesture retries the same advance.

use crate::media::MediaError;
use thiserror::Error;

/// Main error type for tapreel-player
#[derive(Error, Debug)]
pub enum Error {
    /// A slot's media failed to buffer
    #[error("Clip {index} ({locator}) failed to load: {reason}")]
    LoadFailure {
        index: usize,
        locator: String,
        reason: MediaError,
    },

    /// Aggregate preload exceeded its deadline
    #[error("Preload timed out after {timeout_ms}ms ({ready}/{total} clips ready)")]
    LoadTimeout {
        ready: usize,
        total: usize,
        timeout_ms: u64,
    },

    /// Play request refused (gesture policy or decode error)
    #[error("Play request for clip {index} rejected: {reason}")]
    PlayRejected { index: usize, reason: MediaError },

    /// The play-before-fade step failed mid-protocol
    #[error("Transition {from} -> {to} aborted: {reason}")]
    TransitionAborted {
        from: usize,
        to: usize,
        reason: MediaError,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl Error {
    /// Whether this error prevents the session from ever starting
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::LoadFailure { .. }
                | Error::LoadTimeout { .. }
                | Error::Config(_)
        )
    }

    /// Message shown to the viewer through the presentation surface
    pub fn user_message(&self) -> String {
        match self {
            Error::LoadFailure { .. } | Error::LoadTimeout { .. } => {
                "The videos could not be loaded. Please refresh the page to try again.".to_string()
            }
            Error::PlayRejected { .. } | Error::TransitionAborted { .. } => {
                "Playback was blocked. Tap again to retry.".to_string()
            }
            other => format!("{}. Please refresh the page.", other),
        }
    }
}

/// Convenience Result type using tapreel-player Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_errors_are_fatal() {
        let failure = Error::LoadFailure {
            index: 1,
            locator: "b.mp4".to_string(),
            reason: MediaError::Network("404".to_string()),
        };
        let timeout = Error::LoadTimeout {
            ready: 2,
            total: 3,
            timeout_ms: 30_000,
        };
        assert!(failure.is_fatal());
        assert!(timeout.is_fatal());
        assert!(failure.user_message().contains("refresh"));
        assert!(timeout.user_message().contains("refresh"));
    }

    #[test]
    fn test_play_errors_are_recoverable() {
        let rejected = Error::PlayRejected {
            index: 1,
            reason: MediaError::NotAllowed("gesture required".to_string()),
        };
        let aborted = Error::TransitionAborted {
            from: 0,
            to: 1,
            reason: MediaError::Decode("bad frame".to_string()),
        };
        assert!(!rejected.is_fatal());
        assert!(!aborted.is_fatal());
        assert!(rejected.user_message().contains("Tap again"));
    }

    #[test]
    fn test_display_includes_progress() {
        let timeout = Error::LoadTimeout {
            ready: 1,
            total: 3,
            timeout_ms: 500,
        };
        assert_eq!(
            timeout.to_string(),
            "Preload timed out after 500ms (1/3 clips ready)"
        );
    }
}
