//! Weighted spinning wheel.

pub mod arcs;
pub mod option;
pub mod wheel;

pub use arcs::{normalize_angle, pointer_angle, Arc, ArcTable};
pub use option::{SpinOption, StoredOption};
pub use wheel::WeightedSpinner;

use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
pub struct SpinnerConfig {
    pub duration: Duration,
    /// Whole extra turns are drawn from `min_turns..=max_turns`
    pub min_turns: u32,
    pub max_turns: u32,
}

impl Default for SpinnerConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(3),
            min_turns: 5,
            max_turns: 8,
        }
    }
}

/// Where a spin starts and where it comes to rest
#[derive(Clone, Debug, PartialEq)]
pub struct SpinPlan {
    pub start_rotation: f64,
    pub turns: u32,
    /// Sub-turn part of the spin, in `[0, 2pi)`
    pub offset: f64,
    pub duration: Duration,
}

impl SpinPlan {
    pub fn end_rotation(&self) -> f64 {
        self.start_rotation + f64::from(self.turns) * std::f64::consts::TAU + self.offset
    }

    /// Resting angle reduced to `[0, 2pi)`
    pub fn resting_angle(&self) -> f64 {
        normalize_angle(self.end_rotation())
    }

    /// Displayed rotation at animation progress `p` in `[0, 1]`
    pub fn rotation_at(&self, p: f64) -> f64 {
        let delta = self.end_rotation() - self.start_rotation;
        self.start_rotation + delta * ease_out_cubic(p)
    }
}

/// Fast start, slow finish
pub fn ease_out_cubic(p: f64) -> f64 {
    let p = p.clamp(0.0, 1.0);
    1.0 - (1.0 - p).powi(3)
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpinResult {
    /// Resting rotation in `[0, 2pi)`
    pub angle: f64,
    pub index: usize,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SpinEvent {
    Started {
        plan: SpinPlan,
    },
    ProgressTick {
        index: usize,
        label: String,
        progress: f64,
    },
    Finished(SpinResult),
    Cancelled,
}
