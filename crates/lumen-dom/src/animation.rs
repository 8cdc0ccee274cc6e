//! Frame-stepped numeric animations attached to elements.

use serde::Serialize;

/// Linear interpolation of a numeric property over a fixed number of frames.
///
/// Created by whatever reacts to a style change (e.g. a transition on
/// `opacity`); layout and paint only ever read [`NumericAnimation::value`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericAnimation {
    old_value: f64,
    change_per_frame: f64,
    num_frames: u32,
    frame_count: u32,
    min: f64,
    max: f64,
}

impl NumericAnimation {
    /// Animate from `old_value` to `new_value` over `num_frames` frames.
    ///
    /// A zero-frame animation starts (and stays) at `new_value`.
    #[must_use]
    pub fn new(old_value: f64, new_value: f64, num_frames: u32) -> Self {
        let change_per_frame = if num_frames == 0 {
            new_value - old_value
        } else {
            (new_value - old_value) / f64::from(num_frames)
        };
        Self {
            old_value,
            change_per_frame,
            num_frames,
            frame_count: u32::from(num_frames == 0),
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    /// An animation whose value is always clamped to `[0, 1]`.
    #[must_use]
    pub fn opacity(old_value: f64, new_value: f64, num_frames: u32) -> Self {
        Self {
            min: 0.0,
            max: 1.0,
            ..Self::new(old_value, new_value, num_frames)
        }
    }

    /// Current value.
    #[must_use]
    pub fn value(&self) -> f64 {
        let value = self.old_value + self.change_per_frame * f64::from(self.frame_count);
        value.clamp(self.min, self.max)
    }

    /// Step one frame. Returns `false` once the animation has finished.
    pub fn advance(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.frame_count += 1;
        true
    }

    /// Whether every frame has been played.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.frame_count >= self.num_frames.max(1)
    }
}
