use std::time::{Duration, Instant};

/// Identity of one arming of a [`Timer`].
///
/// A token stays current until the timer is cancelled or re-armed, so a
/// callback holding an old token can check whether it still applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerToken {
    generation: u64,
}

/// Polled, cancellable timer. One-shot or fixed-period.
///
/// Nothing runs in the background: the owner calls [`Timer::poll`] from its
/// tick handler and acts on the returned token.
#[derive(Debug, Default)]
pub struct Timer {
    generation: u64,
    deadline: Option<Instant>,
    period: Option<Duration>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a one-shot timer, replacing whatever was armed before
    pub fn start_once(&mut self, now: Instant, after: Duration) -> TimerToken {
        self.arm(now + after, None)
    }

    /// Arm a repeating timer whose first fire is one `period` from `now`
    pub fn start_repeating(&mut self, now: Instant, period: Duration) -> TimerToken {
        // A zero period would fire forever within a single poll loop
        let period = period.max(Duration::from_millis(1));
        self.arm(now + period, Some(period))
    }

    fn arm(&mut self, deadline: Instant, period: Option<Duration>) -> TimerToken {
        self.generation = self.generation.wrapping_add(1);
        self.deadline = Some(deadline);
        self.period = period;
        self.token()
    }

    /// Stop the timer and invalidate every token handed out so far.
    /// Safe to call any number of times.
    pub fn cancel(&mut self) {
        if self.deadline.is_some() || self.period.is_some() {
            self.generation = self.generation.wrapping_add(1);
        }
        self.deadline = None;
        self.period = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn is_current(&self, token: TimerToken) -> bool {
        token.generation == self.generation
    }

    pub fn token(&self) -> TimerToken {
        TimerToken {
            generation: self.generation,
        }
    }

    /// Time left before the next fire, if armed
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }

    /// Returns the current token once per due fire.
    ///
    /// A repeating timer that fell behind fires once per call, so callers
    /// that want to catch up loop with `while let`.
    pub fn poll(&mut self, now: Instant) -> Option<TimerToken> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        match self.period {
            Some(period) => self.deadline = Some(deadline + period),
            None => self.deadline = None,
        }
        Some(self.token())
    }
}
