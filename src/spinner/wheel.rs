use std::f64::consts::TAU;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, info};

use super::arcs::{normalize_angle, ArcTable};
use super::option::SpinOption;
use super::{SpinEvent, SpinPlan, SpinResult, SpinnerConfig};
use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::timer::{Timer, TimerToken};

#[derive(Debug)]
struct ActiveSpin {
    plan: SpinPlan,
    started_at: Instant,
    token: TimerToken,
}

impl ActiveSpin {
    fn progress(&self, now: Instant) -> f64 {
        let total = self.plan.duration.as_secs_f64();
        if total <= 0.0 {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at).as_secs_f64();
        (elapsed / total).min(1.0)
    }
}

/// A wheel of weighted options under a fixed pointer.
///
/// The option list is validated whenever it is set, so a spinner that
/// exists can always spin.
#[derive(Debug)]
pub struct WeightedSpinner<C: Clock = SystemClock, R: Rng = StdRng> {
    config: SpinnerConfig,
    options: Vec<SpinOption>,
    arcs: ArcTable,
    clock: C,
    rng: R,
    /// Resting rotation in `[0, 2pi)`
    rotation: f64,
    spin: Option<ActiveSpin>,
    finish: Timer,
    events: Vec<SpinEvent>,
}

impl<C: Clock, R: Rng> WeightedSpinner<C, R> {
    pub fn new(options: Vec<SpinOption>, config: SpinnerConfig, clock: C, rng: R) -> Result<Self> {
        let arcs = ArcTable::from_options(&options)?;
        Ok(Self {
            config,
            options,
            arcs,
            clock,
            rng,
            rotation: 0.0,
            spin: None,
            finish: Timer::new(),
            events: Vec::new(),
        })
    }

    pub fn options(&self) -> &[SpinOption] {
        &self.options
    }

    pub fn arcs(&self) -> &ArcTable {
        &self.arcs
    }

    pub fn config(&self) -> &SpinnerConfig {
        &self.config
    }

    pub fn is_spinning(&self) -> bool {
        self.spin.is_some()
    }

    /// Replace the options. An in-flight spin is cancelled; on error the
    /// current wheel is left untouched.
    pub fn set_options(&mut self, options: Vec<SpinOption>) -> Result<()> {
        let arcs = ArcTable::from_options(&options)?;
        self.cancel();
        self.options = options;
        self.arcs = arcs;
        Ok(())
    }

    /// Rotation currently on screen
    pub fn rotation(&self) -> f64 {
        match &self.spin {
            Some(spin) => {
                let now = self.clock.now();
                spin.plan.rotation_at(spin.progress(now))
            }
            None => self.rotation,
        }
    }

    pub fn resolve_index(&self, rotation: f64) -> usize {
        self.arcs.index_at(rotation)
    }

    pub fn resolve_option(&self, rotation: f64) -> &SpinOption {
        &self.options[self.resolve_index(rotation)]
    }

    /// Option under the pointer right now
    pub fn current_option(&self) -> &SpinOption {
        self.resolve_option(self.rotation())
    }

    /// Take the events produced since the last call
    pub fn drain_events(&mut self) -> Vec<SpinEvent> {
        std::mem::take(&mut self.events)
    }

    /// Draw a fair random spin starting from the current rotation
    pub fn draw_plan(&mut self) -> SpinPlan {
        let min_turns = self.config.min_turns;
        let max_turns = self.config.max_turns.max(min_turns);
        SpinPlan {
            start_rotation: self.rotation(),
            turns: self.rng.gen_range(min_turns..=max_turns),
            offset: self.rng.gen_range(0.0..TAU),
            duration: self.config.duration,
        }
    }

    pub fn spin_to_random_option(&mut self) -> SpinPlan {
        let plan = self.draw_plan();
        self.start(plan.clone());
        plan
    }

    /// Play a specific spin. Any spin already in flight is abandoned where
    /// it currently stands and never reports a result.
    pub fn start(&mut self, plan: SpinPlan) {
        let now = self.clock.now();
        let token = self.finish.start_once(now, plan.duration);
        debug!(
            turns = plan.turns,
            offset = plan.offset,
            restarted = self.spin.is_some(),
            "spin started"
        );
        self.events.push(SpinEvent::Started { plan: plan.clone() });
        self.spin = Some(ActiveSpin {
            plan,
            started_at: now,
            token,
        });
    }

    /// Stop the current spin where it stands. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        self.finish.cancel();
        if let Some(spin) = self.spin.take() {
            let now = self.clock.now();
            self.rotation = normalize_angle(spin.plan.rotation_at(spin.progress(now)));
            self.events.push(SpinEvent::Cancelled);
        }
    }

    /// Advance the animation to the clock's current time
    pub fn tick(&mut self) {
        let Some(spin) = &self.spin else {
            return;
        };
        if !self.finish.is_current(spin.token) {
            self.spin = None;
            return;
        }

        let now = self.clock.now();
        let progress = spin.progress(now);
        let done = self.finish.poll(now).is_some() || progress >= 1.0;
        if done {
            self.complete();
            return;
        }

        let index = self.arcs.index_at(spin.plan.rotation_at(progress));
        self.events.push(SpinEvent::ProgressTick {
            index,
            label: self.options[index].label.clone(),
            progress,
        });
    }

    fn complete(&mut self) {
        let Some(spin) = self.spin.take() else {
            return;
        };
        self.finish.cancel();
        let angle = spin.plan.resting_angle();
        self.rotation = angle;
        let index = self.arcs.index_at(angle);
        let label = self.options[index].label.clone();
        info!(%label, index, "spin finished");

        self.events.push(SpinEvent::ProgressTick {
            index,
            label: label.clone(),
            progress: 1.0,
        });
        self.events
            .push(SpinEvent::Finished(SpinResult { angle, index, label }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::GameError;
    use assert_matches::assert_matches;
    use rand::SeedableRng;
    use std::f64::consts::PI;
    use std::time::Duration;

    fn letters(n: usize) -> Vec<SpinOption> {
        ["A", "B", "C", "D", "E", "F"]
            .iter()
            .take(n)
            .map(|l| SpinOption::new(*l, 1.0))
            .collect()
    }

    fn spinner(options: Vec<SpinOption>) -> (WeightedSpinner<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let s = WeightedSpinner::new(
            options,
            SpinnerConfig::default(),
            clock.clone(),
            StdRng::seed_from_u64(99),
        )
        .unwrap();
        (s, clock)
    }

    fn finished(events: &[SpinEvent]) -> Vec<SpinResult> {
        events
            .iter()
            .filter_map(|e| match e {
                SpinEvent::Finished(r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    fn run_for(s: &mut WeightedSpinner<ManualClock>, clock: &ManualClock, secs: f64) {
        let frames = (secs * 60.0).round() as usize;
        for _ in 0..frames {
            clock.advance(Duration::from_micros(16_667));
            s.tick();
        }
    }

    #[test]
    fn empty_wheel_is_rejected() {
        let clock = ManualClock::new();
        let result = WeightedSpinner::new(
            Vec::new(),
            SpinnerConfig::default(),
            clock,
            StdRng::seed_from_u64(1),
        );
        assert_matches!(result, Err(GameError::InvalidConfiguration(_)));
    }

    #[test]
    fn landing_in_the_third_arc_reports_c() {
        let (mut s, clock) = spinner(letters(5));
        // pointer angle 2pi - pi = pi sits inside arc 2 = [4pi/5, 6pi/5)
        s.start(SpinPlan {
            start_rotation: 0.0,
            turns: 5,
            offset: PI,
            duration: Duration::from_secs(3),
        });
        run_for(&mut s, &clock, 3.2);

        let results = finished(&s.drain_events());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].index, 2);
        assert_eq!(results[0].label, "C");
        assert!(!s.is_spinning());
        assert_eq!(s.current_option().label, "C");
    }

    #[test]
    fn live_ticks_follow_the_animation() {
        let (mut s, clock) = spinner(letters(5));
        s.spin_to_random_option();
        run_for(&mut s, &clock, 1.5);

        let events = s.drain_events();
        assert_matches!(events.first(), Some(SpinEvent::Started { .. }));
        let ticks: Vec<(usize, f64)> = events
            .iter()
            .filter_map(|e| match e {
                SpinEvent::ProgressTick {
                    index, progress, ..
                } => Some((*index, *progress)),
                _ => None,
            })
            .collect();
        assert!(ticks.len() > 60);
        assert!(ticks.windows(2).all(|w| w[0].1 <= w[1].1));
        assert!(ticks.iter().all(|(_, p)| *p > 0.0 && *p < 1.0));
        let distinct: std::collections::HashSet<usize> = ticks.iter().map(|t| t.0).collect();
        assert!(distinct.len() > 1, "pointer should pass several options");
        assert!(finished(&events).is_empty());
    }

    #[test]
    fn drawn_plans_stay_in_range() {
        let (mut s, _clock) = spinner(letters(3));
        for _ in 0..500 {
            let plan = s.draw_plan();
            assert!((5..=8).contains(&plan.turns));
            assert!((0.0..TAU).contains(&plan.offset));
            assert_eq!(plan.duration, Duration::from_secs(3));
        }
    }

    #[test]
    fn equal_options_are_drawn_uniformly() {
        let (mut s, _clock) = spinner(letters(5));
        let trials = 10_000;
        let mut counts = [0usize; 5];
        for _ in 0..trials {
            let plan = s.draw_plan();
            counts[s.resolve_index(plan.resting_angle())] += 1;
        }
        let expected = trials as f64 / 5.0;
        let chi_square: f64 = counts
            .iter()
            .map(|&c| (c as f64 - expected).powi(2) / expected)
            .sum();
        // 4 degrees of freedom, p = 0.001
        assert!(chi_square < 18.47, "counts {counts:?}, chi2 {chi_square}");
    }

    #[test]
    fn weights_bias_the_draw() {
        let options = vec![SpinOption::new("rare", 1.0), SpinOption::new("common", 3.0)];
        let (mut s, _clock) = spinner(options);
        let trials = 8_000;
        let common = (0..trials)
            .filter(|_| {
                let plan = s.draw_plan();
                s.resolve_index(plan.resting_angle()) == 1
            })
            .count();
        let share = common as f64 / trials as f64;
        assert!((share - 0.75).abs() < 0.03, "common share {share}");
    }

    #[test]
    fn next_spin_starts_where_the_last_one_rested() {
        let (mut s, clock) = spinner(letters(4));
        s.start(SpinPlan {
            start_rotation: 0.0,
            turns: 5,
            offset: 1.0,
            duration: Duration::from_secs(3),
        });
        run_for(&mut s, &clock, 3.1);
        assert!((s.rotation() - 1.0).abs() < 1e-9);

        let plan = s.draw_plan();
        assert!((plan.start_rotation - 1.0).abs() < 1e-9);
    }

    #[test]
    fn restarting_mid_spin_reports_only_the_second_result() {
        let (mut s, clock) = spinner(letters(5));
        s.spin_to_random_option();
        run_for(&mut s, &clock, 1.0);
        let second = s.spin_to_random_option();
        assert!(second.start_rotation > 0.0);
        run_for(&mut s, &clock, 4.0);

        let results = finished(&s.drain_events());
        assert_eq!(results.len(), 1);
        assert!((results[0].angle - second.resting_angle()).abs() < 1e-9);
    }

    #[test]
    fn cancel_is_idempotent_and_silences_the_spin() {
        let (mut s, clock) = spinner(letters(5));
        s.spin_to_random_option();
        run_for(&mut s, &clock, 0.5);
        s.cancel();
        s.cancel();
        let events = s.drain_events();
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, SpinEvent::Cancelled))
                .count(),
            1
        );

        run_for(&mut s, &clock, 5.0);
        assert!(s.drain_events().is_empty(), "no ticks after cancel");
        assert!(!s.is_spinning());
    }

    #[test]
    fn changing_options_cancels_the_spin() {
        let (mut s, clock) = spinner(letters(5));
        s.spin_to_random_option();
        run_for(&mut s, &clock, 0.5);
        s.set_options(letters(2)).unwrap();
        run_for(&mut s, &clock, 5.0);

        assert!(finished(&s.drain_events()).is_empty());
        assert_eq!(s.options().len(), 2);
    }

    #[test]
    fn bad_options_leave_the_wheel_untouched() {
        let (mut s, _clock) = spinner(letters(3));
        let err = s.set_options(vec![SpinOption::new("x", -1.0)]);
        assert_matches!(err, Err(GameError::InvalidConfiguration(_)));
        assert_eq!(s.options().len(), 3);
    }

    #[test]
    fn resolve_option_uses_half_open_arcs() {
        let (s, _clock) = spinner(letters(4));
        // pointer exactly on the A|B boundary picks B
        assert_eq!(s.resolve_option(TAU - PI / 2.0).label, "B");
        assert_eq!(s.resolve_option(0.0).label, "A");
    }
}
