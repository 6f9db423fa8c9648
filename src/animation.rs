// Help group approach: eased interpolation from the mount point to the strike target.
// Mirrors the page's `top/left 1.2s ease-out` transition so hosts without CSS
// transitions can sample the same motion.

use serde::{Deserialize, Serialize};

use crate::types::*;

/// One in-flight approach of the help group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HelpApproach {
    pub from: Position,
    pub to: Position,
    pub started_at: Millis,
    pub duration_ms: u64,
    pub easing: EasingType,
}

impl HelpApproach {
    pub fn new(from: Position, to: Position, started_at: Millis, duration_ms: u64, easing: EasingType) -> Self {
        HelpApproach {
            from,
            to,
            started_at,
            duration_ms,
            easing,
        }
    }

    /// Linear progress in `[0, 1]` at `now`.
    pub fn progress(&self, now: Millis) -> f64 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        (now.since(self.started_at) as f64 / self.duration_ms as f64).clamp(0.0, 1.0)
    }

    pub fn is_finished(&self, now: Millis) -> bool {
        self.progress(now) >= 1.0
    }

    /// Eased position at `now`. Clamped to `from` before the start and `to` after the end.
    pub fn position_at(&self, now: Millis) -> Position {
        let t = apply_easing(self.progress(now), self.easing);
        Position::new(lerp(self.from.top, self.to.top, t), lerp(self.from.left, self.to.left, t))
    }
}

pub fn apply_easing(t: f64, easing: EasingType) -> f64 {
    match easing {
        EasingType::Linear => t,
        EasingType::EaseOut => 1.0 - (1.0 - t).powi(3),
        EasingType::EaseInOut => {
            if t < 0.5 {
                4.0 * t * t * t
            } else {
                1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
            }
        }
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
