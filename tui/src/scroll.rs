//! Scroll Animation
//!
//! Programmatic scrolls move the page over a number of frames rather than
//! jumping. The easing curve is picked by name from the scroll options so the
//! story settings (`scroll.easing`) carry through to the terminal.

use serde::{Deserialize, Serialize};

/// Frame interval for animated scrolls
pub const FRAME_MS: u64 = 16;

/// Easing curves understood by the terminal driver
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    /// Constant speed
    Linear,
    /// Slow start, fast end
    EaseIn,
    /// Fast start, slow end
    EaseOut,
    /// Slow start and end
    #[default]
    EaseInOut,
    /// Cubic slow start and end
    EaseInOutCubic,
}

impl Easing {
    /// Look up an easing by name, falling back to the default
    #[must_use]
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            Some("linear") => Self::Linear,
            Some("ease-in") => Self::EaseIn,
            Some("ease-out") => Self::EaseOut,
            Some("ease-in-out") | None => Self::EaseInOut,
            Some("ease-in-out-cubic") => Self::EaseInOutCubic,
            Some(other) => {
                tracing::debug!(easing = other, "Unknown easing, using ease-in-out");
                Self::default()
            }
        }
    }

    /// Apply the easing to a progress value (0.0 to 1.0)
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - (1.0 - t).powi(2),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Self::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

/// Intermediate offsets for a scroll from `start` to `end`
///
/// The last entry is always exactly `end`. A zero duration yields a single
/// jump.
#[must_use]
pub fn frame_offsets(start: f64, end: f64, duration_ms: u64, easing: Easing) -> Vec<f64> {
    let frames = (duration_ms / FRAME_MS).max(1);
    (1..=frames)
        .map(|frame| {
            if frame == frames {
                end
            } else {
                #[allow(clippy::cast_precision_loss)]
                let t = frame as f64 / frames as f64;
                start + (end - start) * easing.apply(t)
            }
        })
        .collect()
}
