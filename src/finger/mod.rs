//! Multi-touch finger picker.
//!
//! Everyone puts a finger down, holds it through a short countdown, and the
//! game spotlights participants for a while before naming the winners.

pub mod selector;
pub mod tracker;

pub use selector::{pick_winners, WinnerSelector};
pub use tracker::ParticipantTracker;

use std::time::{Duration, Instant};

/// Opaque identity of one press session (a finger, a key, a touch id)
pub type SessionId = u64;

pub const MIN_WINNERS: usize = 1;
pub const MAX_WINNERS: usize = 4;
pub const MIN_ORBIT_SECS: f64 = 1.0;
pub const MAX_ORBIT_SECS: f64 = 10.0;
pub const DEFAULT_ORBIT_SECS: f64 = 4.0;

/// Number of distinct display slots handed out to participants
pub const PARTICIPANT_SLOTS: usize = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Timing and winner settings for one round
#[derive(Clone, Debug, PartialEq)]
pub struct FingerConfig {
    /// Whole seconds counted down before the selection starts
    pub settle_secs: u32,
    /// Minimum hold for a press to take part
    pub validity: Duration,
    /// How long the spotlight wanders before the winners are revealed
    pub orbit: Duration,
    /// Spotlight hop period
    pub orbit_interval: Duration,
    pub max_winners: usize,
}

impl Default for FingerConfig {
    fn default() -> Self {
        Self {
            settle_secs: 3,
            validity: Duration::from_secs(2),
            orbit: Duration::from_secs_f64(DEFAULT_ORBIT_SECS),
            orbit_interval: Duration::from_millis(600),
            max_winners: 1,
        }
    }
}

impl FingerConfig {
    /// Build a config from user settings, repairing out-of-range values
    /// the same way the settings screen would have prevented them.
    pub fn from_settings(max_winners: usize, orbit_secs: f64) -> Self {
        Self {
            max_winners: clamp_winners(max_winners),
            orbit: Duration::from_secs_f64(clamp_orbit_secs(orbit_secs)),
            ..Self::default()
        }
    }
}

/// Winner counts outside `[1, 4]` fall back to a single winner
pub fn clamp_winners(requested: usize) -> usize {
    if (MIN_WINNERS..=MAX_WINNERS).contains(&requested) {
        requested
    } else {
        MIN_WINNERS
    }
}

/// Non-positive (or NaN) durations mean "use the default"; everything else
/// is held to `[1, 10]` seconds.
pub fn clamp_orbit_secs(secs: f64) -> f64 {
    if secs.is_nan() || secs <= 0.0 {
        DEFAULT_ORBIT_SECS
    } else {
        secs.clamp(MIN_ORBIT_SECS, MAX_ORBIT_SECS)
    }
}

#[derive(Clone, Debug)]
pub struct Participant {
    pub id: SessionId,
    pub slot: usize,
    /// Press order within the tracker
    pub seq: u64,
    pub started_at: Instant,
    pub position: Position,
}

impl Participant {
    pub fn new(
        id: SessionId,
        slot: usize,
        seq: u64,
        started_at: Instant,
        position: Position,
    ) -> Self {
        Self {
            id,
            slot,
            seq,
            started_at,
            position,
        }
    }

    pub fn duration(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }

    pub fn is_valid_at(&self, now: Instant, threshold: Duration) -> bool {
        self.duration(now) >= threshold
    }
}

/// Where a round currently is
#[derive(Clone, Debug, PartialEq)]
pub enum RoundState {
    Idle,
    Counting {
        remaining: u32,
    },
    Selecting {
        eligible: Vec<SessionId>,
        started_at: Instant,
    },
    Finished {
        winners: Vec<SessionId>,
    },
}

impl RoundState {
    pub fn is_idle(&self) -> bool {
        matches!(self, RoundState::Idle)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, RoundState::Finished { .. })
    }
}

/// Everything the display layer needs to mirror a round
#[derive(Clone, Debug, PartialEq)]
pub enum FingerEvent {
    ParticipantAdded {
        id: SessionId,
        slot: usize,
        position: Position,
    },
    ParticipantMoved {
        id: SessionId,
        position: Position,
    },
    ParticipantRemoved {
        id: SessionId,
    },
    ValidityFinalized {
        id: SessionId,
        valid: bool,
    },
    CountingStarted {
        remaining: u32,
    },
    CountingTick {
        remaining: u32,
    },
    SelectionStarted {
        eligible: Vec<SessionId>,
    },
    SelectionTick {
        highlighted: SessionId,
    },
    /// The countdown ran out with nobody eligible
    SelectionSkipped,
    Finished {
        winners: Vec<SessionId>,
    },
    RoundReset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winners_outside_range_fall_back_to_one() {
        assert_eq!(clamp_winners(0), 1);
        assert_eq!(clamp_winners(3), 3);
        assert_eq!(clamp_winners(4), 4);
        assert_eq!(clamp_winners(9), 1);
    }

    #[test]
    fn orbit_secs_are_repaired() {
        assert_eq!(clamp_orbit_secs(0.0), DEFAULT_ORBIT_SECS);
        assert_eq!(clamp_orbit_secs(-2.0), DEFAULT_ORBIT_SECS);
        assert_eq!(clamp_orbit_secs(f64::NAN), DEFAULT_ORBIT_SECS);
        assert_eq!(clamp_orbit_secs(0.5), 1.0);
        assert_eq!(clamp_orbit_secs(6.5), 6.5);
        assert_eq!(clamp_orbit_secs(30.0), 10.0);
    }

    #[test]
    fn config_from_settings() {
        let cfg = FingerConfig::from_settings(2, 5.0);
        assert_eq!(cfg.max_winners, 2);
        assert_eq!(cfg.orbit, Duration::from_secs(5));
        assert_eq!(cfg.settle_secs, 3);
        assert_eq!(cfg.validity, Duration::from_secs(2));
    }
}
