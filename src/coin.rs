//! Coin flip with running heads/tails tallies.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::timer::{Timer, TimerToken};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum CoinFace {
    Heads,
    Tails,
}

impl CoinFace {
    pub fn flipped(self) -> Self {
        match self {
            CoinFace::Heads => CoinFace::Tails,
            CoinFace::Tails => CoinFace::Heads,
        }
    }
}

/// Artwork set for the coin. Only changes how faces are drawn.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CoinStyle {
    #[default]
    Classic,
    Funny,
    Japanese,
    Futuristic,
}

impl CoinStyle {
    pub const ALL: [CoinStyle; 4] = [
        CoinStyle::Classic,
        CoinStyle::Funny,
        CoinStyle::Japanese,
        CoinStyle::Futuristic,
    ];

    pub fn face_label(self, face: CoinFace) -> &'static str {
        match (self, face) {
            (CoinStyle::Classic, CoinFace::Heads) => "HEADS",
            (CoinStyle::Classic, CoinFace::Tails) => "TAILS",
            (CoinStyle::Funny, CoinFace::Heads) => "(^o^)",
            (CoinStyle::Funny, CoinFace::Tails) => "(-_-)",
            (CoinStyle::Japanese, CoinFace::Heads) => "表",
            (CoinStyle::Japanese, CoinFace::Tails) => "裏",
            (CoinStyle::Futuristic, CoinFace::Heads) => "<H/>",
            (CoinStyle::Futuristic, CoinFace::Tails) => "<T/>",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CoinConfig {
    pub duration: Duration,
    /// Minimum number of times the coin turns over during a flip
    pub half_turns: u32,
}

impl Default for CoinConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(1),
            half_turns: 6,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CoinEvent {
    FlipStarted,
    FlipProgress { showing: CoinFace, progress: f64 },
    FlipFinished { face: CoinFace },
    CountsReset,
}

#[derive(Debug)]
struct ActiveFlip {
    face: CoinFace,
    from: CoinFace,
    turns: u32,
    started_at: Instant,
    token: TimerToken,
}

impl ActiveFlip {
    fn progress(&self, now: Instant, duration: Duration) -> f64 {
        if duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at).as_secs_f64();
        (elapsed / duration.as_secs_f64()).min(1.0)
    }

    /// Face up after `progress` of the animation. Ends on `face`.
    fn showing(&self, progress: f64) -> CoinFace {
        let turned = (progress * f64::from(self.turns)).floor() as u32;
        if turned % 2 == 1 {
            self.from.flipped()
        } else {
            self.from
        }
    }
}

#[derive(Debug)]
pub struct CoinFlip<C: Clock = SystemClock, R: Rng = StdRng> {
    config: CoinConfig,
    style: CoinStyle,
    heads: u32,
    tails: u32,
    showing: CoinFace,
    clock: C,
    rng: R,
    flip: Option<ActiveFlip>,
    timer: Timer,
    events: Vec<CoinEvent>,
}

impl<C: Clock, R: Rng> CoinFlip<C, R> {
    pub fn new(config: CoinConfig, style: CoinStyle, clock: C, rng: R) -> Self {
        Self {
            config,
            style,
            heads: 0,
            tails: 0,
            showing: CoinFace::Heads,
            clock,
            rng,
            flip: None,
            timer: Timer::new(),
            events: Vec::new(),
        }
    }

    pub fn style(&self) -> CoinStyle {
        self.style
    }

    pub fn heads(&self) -> u32 {
        self.heads
    }

    pub fn tails(&self) -> u32 {
        self.tails
    }

    pub fn is_flipping(&self) -> bool {
        self.flip.is_some()
    }

    /// Face currently drawn
    pub fn showing(&self) -> CoinFace {
        match &self.flip {
            Some(flip) => flip.showing(flip.progress(self.clock.now(), self.config.duration)),
            None => self.showing,
        }
    }

    pub fn drain_events(&mut self) -> Vec<CoinEvent> {
        std::mem::take(&mut self.events)
    }

    /// Switch artwork. A different style starts fresh tallies.
    pub fn set_style(&mut self, style: CoinStyle) {
        if style == self.style {
            return;
        }
        debug!(%style, "coin style changed");
        self.style = style;
        self.reset_counts();
    }

    pub fn reset_counts(&mut self) {
        self.heads = 0;
        self.tails = 0;
        self.events.push(CoinEvent::CountsReset);
    }

    /// Toss the coin. Ignored while a flip is still in the air.
    pub fn flip(&mut self) -> Option<CoinFace> {
        if self.flip.is_some() {
            return None;
        }
        let face = if self.rng.gen_bool(0.5) {
            CoinFace::Heads
        } else {
            CoinFace::Tails
        };
        Some(self.flip_to(face))
    }

    /// Toss the coin so it lands on `face`
    pub fn flip_to(&mut self, face: CoinFace) -> CoinFace {
        let now = self.clock.now();
        let from = self.showing();
        // one extra half-turn when the coin has to end on its other side
        let turns = self.config.half_turns + u32::from(from != face);
        let token = self.timer.start_once(now, self.config.duration);
        self.flip = Some(ActiveFlip {
            face,
            from,
            turns,
            started_at: now,
            token,
        });
        debug!(%face, turns, "coin flip started");
        self.events.push(CoinEvent::FlipStarted);
        face
    }

    pub fn tick(&mut self) {
        let Some(flip) = &self.flip else {
            return;
        };
        if !self.timer.is_current(flip.token) {
            self.flip = None;
            return;
        }
        let now = self.clock.now();
        let progress = flip.progress(now, self.config.duration);
        if self.timer.poll(now).is_some() || progress >= 1.0 {
            self.land();
            return;
        }
        self.events.push(CoinEvent::FlipProgress {
            showing: flip.showing(progress),
            progress,
        });
    }

    fn land(&mut self) {
        let Some(flip) = self.flip.take() else {
            return;
        };
        self.timer.cancel();
        let face = flip.face;
        self.showing = face;
        match face {
            CoinFace::Heads => self.heads += 1,
            CoinFace::Tails => self.tails += 1,
        }
        info!(%face, heads = self.heads, tails = self.tails, "coin landed");
        self.events.push(CoinEvent::FlipProgress {
            showing: face,
            progress: 1.0,
        });
        self.events.push(CoinEvent::FlipFinished { face });
    }
}
