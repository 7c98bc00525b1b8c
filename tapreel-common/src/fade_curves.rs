//! Opacity easing for slot crossfades
//!
//! A crossfade drives the incoming slot from 0.0 to 1.0 and the outgoing
//! slot from 1.0 to 0.0 over the same duration. Both sides use the same
//! easing, so at any instant the two opacities add up to 1.0. Names follow
//! the CSS timing functions a browser host would hand the transition to.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Timing function for an opacity transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    /// e(t) = t
    Linear,

    /// e(t) = t²
    EaseIn,

    /// e(t) = 1 - (1 - t)²
    EaseOut,

    /// e(t) = (1 - cos(πt)) / 2
    #[default]
    EaseInOut,
}

impl FadeCurve {
    pub const ALL: [FadeCurve; 4] = [
        FadeCurve::Linear,
        FadeCurve::EaseIn,
        FadeCurve::EaseOut,
        FadeCurve::EaseInOut,
    ];

    /// Eased progress for linear progress `t`; both clamped to 0.0..=1.0
    pub fn ease(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            FadeCurve::Linear => t,
            FadeCurve::EaseIn => t * t,
            FadeCurve::EaseOut => {
                let inv = 1.0 - t;
                1.0 - inv * inv
            }
            FadeCurve::EaseInOut => 0.5 * (1.0 - (PI * t).cos()),
        }
    }

    /// Opacity between `from` and `to` at linear progress `t`
    pub fn interpolate(&self, from: f32, to: f32, t: f32) -> f32 {
        from + (to - from) * self.ease(t)
    }

    /// Matching CSS `transition-timing-function` keyword
    pub fn css_keyword(&self) -> &'static str {
        match self {
            FadeCurve::Linear => "linear",
            FadeCurve::EaseIn => "ease-in",
            FadeCurve::EaseOut => "ease-out",
            FadeCurve::EaseInOut => "ease-in-out",
        }
    }
}

impl std::fmt::Display for FadeCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.css_keyword())
    }
}
