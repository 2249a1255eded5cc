use std::f64::consts::TAU;

use super::option::SpinOption;
use crate::error::{GameError, Result};

/// Half-open angular interval `[start, end)` measured clockwise from the
/// pointer, in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arc {
    pub start: f64,
    pub end: f64,
}

impl Arc {
    /// Angular size of the arc
    pub fn sweep(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, angle: f64) -> bool {
        angle >= self.start && angle < self.end
    }

    pub fn mid(&self) -> f64 {
        (self.start + self.end) / 2.0
    }
}

/// Contiguous arcs, one per option and in option order, covering `[0, 2pi)`.
#[derive(Clone, Debug, PartialEq)]
pub struct ArcTable {
    arcs: Vec<Arc>,
}

impl ArcTable {
    pub fn from_options(options: &[SpinOption]) -> Result<Self> {
        Self::from_weights(options.iter().map(|o| o.weight))
    }

    /// Lay out arcs proportional to `weights`.
    ///
    /// Rejects an empty list, negative or non-finite weights, and lists that
    /// mix zero and positive weights. All-zero lists split evenly.
    pub fn from_weights(weights: impl IntoIterator<Item = f64>) -> Result<Self> {
        let weights: Vec<f64> = weights.into_iter().collect();
        if weights.is_empty() {
            return Err(GameError::InvalidConfiguration(
                "the wheel needs at least one option".to_string(),
            ));
        }
        if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(GameError::InvalidConfiguration(format!(
                "option weight must be a positive number, got {bad}"
            )));
        }

        let total: f64 = weights.iter().sum();
        let zeros = weights.iter().filter(|w| **w == 0.0).count();
        let shares: Vec<f64> = if zeros == weights.len() {
            vec![1.0 / weights.len() as f64; weights.len()]
        } else if zeros > 0 {
            return Err(GameError::InvalidConfiguration(
                "option weight must be greater than zero".to_string(),
            ));
        } else {
            weights.iter().map(|w| w / total).collect()
        };

        let mut arcs = Vec::with_capacity(shares.len());
        let mut start = 0.0;
        for share in &shares {
            let end = start + TAU * share;
            arcs.push(Arc { start, end });
            start = end;
        }
        // close the circle exactly so every angle below 2pi has an owner
        if let Some(last) = arcs.last_mut() {
            last.end = TAU;
        }
        Ok(Self { arcs })
    }

    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Index of the option under the pointer when the wheel is turned by
    /// `rotation` radians.
    ///
    /// An angle sitting exactly on a boundary belongs to the later arc.
    pub fn index_at(&self, rotation: f64) -> usize {
        let angle = pointer_angle(rotation);
        self.arcs
            .iter()
            .position(|arc| arc.contains(angle))
            .unwrap_or(self.arcs.len().saturating_sub(1))
    }
}

/// Wheel angle under the fixed pointer: the wheel turns, the pointer stays.
pub fn pointer_angle(rotation: f64) -> f64 {
    normalize_angle(TAU - rotation)
}

/// Reduce any angle into `[0, 2pi)`
pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if a >= TAU {
        0.0
    } else {
        a
    }
}
