//! Platform capability resolution
//!
//! Resolved once at startup and handed to the Preloader; nothing else
//! branches on the platform.

use tapreel_common::config::PrimingSetting;
use tracing::info;

/// Warm-up a slot needs before `play` is reliably honoured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimingMode {
    /// Desktop runtimes: buffering hint is enough
    None,
    /// Call `load()` explicitly before waiting for readiness
    ForceLoad,
    /// Explicit load, then a play/pause cycle once ready
    PlayPause,
}

impl PrimingMode {
    pub fn forces_load(&self) -> bool {
        matches!(self, PrimingMode::ForceLoad | PrimingMode::PlayPause)
    }

    pub fn plays_then_pauses(&self) -> bool {
        matches!(self, PrimingMode::PlayPause)
    }
}

/// Capabilities of the runtime hosting the presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub priming: PrimingMode,
}

impl Capabilities {
    /// Resolve the priming requirement from config and an optional user agent
    pub fn resolve(setting: PrimingSetting, user_agent: Option<&str>) -> Self {
        let priming = match setting {
            PrimingSetting::None => PrimingMode::None,
            PrimingSetting::ForceLoad => PrimingMode::ForceLoad,
            PrimingSetting::PlayPause => PrimingMode::PlayPause,
            PrimingSetting::Auto => match user_agent {
                Some(ua) if is_mobile_user_agent(ua) => PrimingMode::PlayPause,
                _ => PrimingMode::None,
            },
        };
        info!("Resolved media priming: {:?}", priming);
        Self { priming }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            priming: PrimingMode::None,
        }
    }
}

/// Whether a user agent string names a mobile runtime
pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    const MOBILE_MARKERS: &[&str] = &["iphone", "ipad", "ipod", "android", "mobile"];
    let ua = user_agent.to_lowercase();
    MOBILE_MARKERS.iter().any(|marker| ua.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    const DESKTOP_UA: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

    #[test]
    fn test_auto_resolves_from_user_agent() {
        assert_eq!(
            Capabilities::resolve(PrimingSetting::Auto, Some(IPHONE_UA)).priming,
            PrimingMode::PlayPause
        );
        assert_eq!(
            Capabilities::resolve(PrimingSetting::Auto, Some(DESKTOP_UA)).priming,
            PrimingMode::None
        );
        assert_eq!(
            Capabilities::resolve(PrimingSetting::Auto, None).priming,
            PrimingMode::None
        );
    }

    #[test]
    fn test_explicit_setting_wins_over_user_agent() {
        assert_eq!(
            Capabilities::resolve(PrimingSetting::None, Some(IPHONE_UA)).priming,
            PrimingMode::None
        );
        assert_eq!(
            Capabilities::resolve(PrimingSetting::ForceLoad, Some(DESKTOP_UA)).priming,
            PrimingMode::ForceLoad
        );
    }

    #[test]
    fn test_priming_steps() {
        assert!(!PrimingMode::None.forces_load());
        assert!(PrimingMode::ForceLoad.forces_load());
        assert!(!PrimingMode::ForceLoad.plays_then_pauses());
        assert!(PrimingMode::PlayPause.forces_load());
        assert!(PrimingMode::PlayPause.plays_then_pauses());
    }
}
