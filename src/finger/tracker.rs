use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, info};

use super::{
    FingerConfig, FingerEvent, Participant, Position, RoundState, SessionId, WinnerSelector,
    PARTICIPANT_SLOTS,
};
use crate::clock::{Clock, SystemClock};
use crate::timer::{Timer, TimerToken};

const COUNTDOWN_STEP: Duration = Duration::from_secs(1);

/// Tracks the presses of one finger-picker round and drives it through
/// `Idle -> Counting -> Selecting -> Finished -> Idle`.
///
/// All input and timer handling happens on the caller's thread. Time only
/// advances through the injected [`Clock`], and timers only fire from
/// [`ParticipantTracker::tick`].
#[derive(Debug)]
pub struct ParticipantTracker<C: Clock = SystemClock, R: Rng = StdRng> {
    config: FingerConfig,
    pending_config: Option<FingerConfig>,
    clock: C,
    selector: WinnerSelector<R>,
    active: Vec<Participant>,
    released_valid: Vec<(u64, SessionId)>,
    next_seq: u64,
    state: RoundState,
    // settle already ran for the presses still held
    settled: bool,
    countdown: Timer,
    orbit: Timer,
    events: Vec<FingerEvent>,
}

impl<C: Clock, R: Rng> ParticipantTracker<C, R> {
    pub fn new(config: FingerConfig, clock: C, selector: WinnerSelector<R>) -> Self {
        Self {
            config,
            pending_config: None,
            clock,
            selector,
            active: Vec::new(),
            released_valid: Vec::new(),
            next_seq: 0,
            state: RoundState::Idle,
            settled: false,
            countdown: Timer::new(),
            orbit: Timer::new(),
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn config(&self) -> &FingerConfig {
        &self.config
    }

    /// New settings take effect when the next round starts
    pub fn set_config(&mut self, config: FingerConfig) {
        if self.state.is_idle() && self.active.is_empty() {
            self.config = config;
        } else {
            self.pending_config = Some(config);
        }
    }

    /// Currently pressed participants in press order
    pub fn participants(&self) -> &[Participant] {
        &self.active
    }

    pub fn participant(&self, id: SessionId) -> Option<&Participant> {
        self.active.iter().find(|p| p.id == id)
    }

    /// Token of the running settle countdown, if one is running
    pub fn settle_token(&self) -> Option<TimerToken> {
        self.countdown.is_armed().then(|| self.countdown.token())
    }

    /// Take the events produced since the last call
    pub fn drain_events(&mut self) -> Vec<FingerEvent> {
        std::mem::take(&mut self.events)
    }

    /// A press started. Returns whether it joined the round.
    pub fn begin(&mut self, id: SessionId, position: Position) -> bool {
        if self.state.is_finished() {
            debug!(id, "round finished, ignoring new press until all are lifted");
            return false;
        }
        if self.participant(id).is_some() {
            debug!(id, "duplicate press start ignored");
            return false;
        }

        let now = self.clock.now();
        if self.active.is_empty() {
            self.apply_pending_config();
        }
        let slot = self.free_slot();
        let seq = self.next_seq;
        self.next_seq += 1;
        self.active
            .push(Participant::new(id, slot, seq, now, position));
        self.events
            .push(FingerEvent::ParticipantAdded { id, slot, position });

        match self.state {
            RoundState::Idle if self.settled => {
                debug!(id, "settle already ran, waiting for everyone to lift");
            }
            RoundState::Idle | RoundState::Counting { .. } => self.start_countdown(now),
            // joins the screen, but the spotlight only visits the snapshot taken at settle
            RoundState::Selecting { .. } | RoundState::Finished { .. } => {}
        }
        true
    }

    /// Position change only; never affects the round
    pub fn update(&mut self, id: SessionId, position: Position) {
        if let Some(p) = self.active.iter_mut().find(|p| p.id == id) {
            p.position = position;
            self.events
                .push(FingerEvent::ParticipantMoved { id, position });
        }
    }

    /// A press ended. Freezes its validity and resets the round once the
    /// last press is gone.
    pub fn end(&mut self, id: SessionId) {
        let Some(idx) = self.active.iter().position(|p| p.id == id) else {
            return;
        };
        let now = self.clock.now();
        let participant = self.active.remove(idx);
        let valid = participant.is_valid_at(now, self.config.validity);
        debug!(
            id,
            held_ms = participant.duration(now).as_millis() as u64,
            valid,
            "press ended"
        );

        if valid && matches!(self.state, RoundState::Counting { .. }) {
            self.released_valid.push((participant.seq, id));
        }
        self.events.push(FingerEvent::ValidityFinalized { id, valid });
        self.events.push(FingerEvent::ParticipantRemoved { id });

        if self.active.is_empty() {
            self.reset_round();
        }
    }

    /// Drop every press and reset, e.g. when the game is put away
    pub fn stop(&mut self) {
        for p in std::mem::take(&mut self.active) {
            self.events
                .push(FingerEvent::ParticipantRemoved { id: p.id });
        }
        self.reset_round();
    }

    /// Fire whatever timers are due at the clock's current time
    pub fn tick(&mut self) {
        let now = self.clock.now();
        while let Some(token) = self.countdown.poll(now) {
            self.on_countdown_step(token);
        }
        while let Some(token) = self.orbit.poll(now) {
            self.on_orbit_step(token, now);
        }
    }

    /// Participants that would be eligible if selection started right now:
    /// held presses past the threshold plus valid early releases of this
    /// round, in press order.
    pub fn eligible_now(&self) -> Vec<SessionId> {
        let now = self.clock.now();
        let mut eligible: Vec<(u64, SessionId)> = self
            .active
            .iter()
            .filter(|p| p.is_valid_at(now, self.config.validity))
            .map(|p| (p.seq, p.id))
            .collect();
        for released in &self.released_valid {
            if !eligible.iter().any(|(_, id)| *id == released.1) {
                eligible.push(*released);
            }
        }
        eligible.sort_by_key(|(seq, _)| *seq);
        eligible.into_iter().map(|(_, id)| id).collect()
    }

    /// The settle countdown ran out. Stale tokens (from a countdown that
    /// was restarted or reset) are ignored, as is any second call for the
    /// same round.
    pub fn settle_elapsed(&mut self, token: TimerToken) {
        if !self.countdown.is_current(token) {
            debug!("stale settle timer ignored");
            return;
        }
        if !matches!(self.state, RoundState::Counting { .. }) {
            return;
        }
        self.countdown.cancel();

        let eligible = self.eligible_now();
        self.released_valid.clear();
        if eligible.is_empty() {
            debug!("countdown finished with nobody eligible");
            self.state = RoundState::Idle;
            self.settled = true;
            self.events.push(FingerEvent::SelectionSkipped);
            return;
        }

        let now = self.clock.now();
        debug!(count = eligible.len(), "selection started");
        self.orbit.start_repeating(now, self.config.orbit_interval);
        self.events.push(FingerEvent::SelectionStarted {
            eligible: eligible.clone(),
        });
        self.state = RoundState::Selecting {
            eligible,
            started_at: now,
        };
    }

    fn start_countdown(&mut self, now: Instant) {
        let remaining = self.config.settle_secs;
        self.countdown.start_repeating(now, COUNTDOWN_STEP);
        self.state = RoundState::Counting { remaining };
        self.events.push(FingerEvent::CountingStarted { remaining });
        if remaining == 0 {
            let token = self.countdown.token();
            self.settle_elapsed(token);
        }
    }

    fn on_countdown_step(&mut self, token: TimerToken) {
        let RoundState::Counting { remaining } = &mut self.state else {
            self.countdown.cancel();
            return;
        };
        *remaining = remaining.saturating_sub(1);
        let remaining = *remaining;
        if remaining == 0 {
            self.settle_elapsed(token);
        } else {
            self.events.push(FingerEvent::CountingTick { remaining });
        }
    }

    fn on_orbit_step(&mut self, token: TimerToken, now: Instant) {
        if !self.orbit.is_current(token) {
            return;
        }
        let RoundState::Selecting {
            eligible,
            started_at,
        } = &self.state
        else {
            self.orbit.cancel();
            return;
        };

        if now.saturating_duration_since(*started_at) >= self.config.orbit {
            let winners = self.selector.pick(eligible, self.config.max_winners);
            self.orbit.cancel();
            info!(?winners, "finger round finished");
            self.events.push(FingerEvent::Finished {
                winners: winners.clone(),
            });
            self.state = RoundState::Finished { winners };
        } else if let Some(highlighted) = self.selector.highlight(eligible) {
            self.events.push(FingerEvent::SelectionTick { highlighted });
        }
    }

    fn reset_round(&mut self) {
        self.countdown.cancel();
        self.orbit.cancel();
        self.released_valid.clear();
        self.settled = false;
        let was_idle = self.state.is_idle();
        self.state = RoundState::Idle;
        self.apply_pending_config();
        if !was_idle {
            debug!("round reset");
        }
        self.events.push(FingerEvent::RoundReset);
    }

    /// Lowest slot no held press is using, cycling once all are taken
    fn free_slot(&self) -> usize {
        (0..PARTICIPANT_SLOTS)
            .find(|slot| self.active.iter().all(|p| p.slot != *slot))
            .unwrap_or(self.active.len() % PARTICIPANT_SLOTS)
    }

    fn apply_pending_config(&mut self) {
        if let Some(config) = self.pending_config.take() {
            self.config = config;
        }
    }
}
