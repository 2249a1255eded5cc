//! Free-play allowance per game.
//!
//! Each game may be played `limit` times until the app is unlocked. The
//! cores never look at the gate; the front end asks before starting a game
//! and records a play once the game has produced its result.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

pub const DEFAULT_USAGE_LIMIT: u32 = 10;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameKind {
    Coin,
    Finger,
    Spinner,
}

impl GameKind {
    pub const ALL: [GameKind; 3] = [GameKind::Coin, GameKind::Finger, GameKind::Spinner];
}

/// Where play counts live
pub trait UsageStore {
    fn usage_count(&self, kind: GameKind) -> Result<u32>;
    /// Count one more play and return the new total
    fn increment_usage(&mut self, kind: GameKind) -> Result<u32>;
    fn reset_usage(&mut self, kind: GameKind) -> Result<()>;
}

/// Play counts that vanish with the process
#[derive(Debug, Default, Clone)]
pub struct MemoryUsageStore {
    counts: HashMap<GameKind, u32>,
}

impl MemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UsageStore for MemoryUsageStore {
    fn usage_count(&self, kind: GameKind) -> Result<u32> {
        Ok(self.counts.get(&kind).copied().unwrap_or(0))
    }

    fn increment_usage(&mut self, kind: GameKind) -> Result<u32> {
        let count = self.counts.entry(kind).or_insert(0);
        *count = count.saturating_add(1);
        Ok(*count)
    }

    fn reset_usage(&mut self, kind: GameKind) -> Result<()> {
        self.counts.remove(&kind);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageGate {
    pub limit: u32,
    pub unlocked: bool,
}

impl Default for UsageGate {
    fn default() -> Self {
        Self {
            limit: DEFAULT_USAGE_LIMIT,
            unlocked: false,
        }
    }
}

impl UsageGate {
    pub fn new(limit: u32, unlocked: bool) -> Self {
        Self { limit, unlocked }
    }

    pub fn is_limit_reached<S: UsageStore + ?Sized>(&self, store: &S, kind: GameKind) -> Result<bool> {
        if self.unlocked {
            return Ok(false);
        }
        let count = store.usage_count(kind)?;
        debug!(%kind, count, limit = self.limit, "usage check");
        Ok(count >= self.limit)
    }

    /// Plays left before the gate closes, `None` once unlocked
    pub fn remaining<S: UsageStore + ?Sized>(&self, store: &S, kind: GameKind) -> Result<Option<u32>> {
        if self.unlocked {
            return Ok(None);
        }
        Ok(Some(self.limit.saturating_sub(store.usage_count(kind)?)))
    }
}
