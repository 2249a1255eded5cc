use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::{Rng, SeedableRng};

/// Draw `winner_count` distinct entries from `eligible`, uniformly and
/// without replacement.
///
/// The count is clamped to `[1, eligible.len()]`; an empty pool yields no
/// winners. Winners come back in draw order.
pub fn pick_winners<T, R>(eligible: &[T], winner_count: usize, rng: &mut R) -> Vec<T>
where
    T: Clone,
    R: Rng + ?Sized,
{
    if eligible.is_empty() {
        return Vec::new();
    }
    let count = winner_count.clamp(1, eligible.len());
    index::sample(rng, eligible.len(), count)
        .into_iter()
        .map(|i| eligible[i].clone())
        .collect()
}

/// Owns the random source used to pick winners and the "spotlight" that
/// wanders between participants while the selection plays out.
#[derive(Debug, Clone)]
pub struct WinnerSelector<R = StdRng> {
    rng: R,
}

impl WinnerSelector<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> WinnerSelector<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn pick<T: Clone>(&mut self, eligible: &[T], winner_count: usize) -> Vec<T> {
        pick_winners(eligible, winner_count, &mut self.rng)
    }

    /// One uniformly chosen entry, for the per-tick highlight
    pub fn highlight<T: Clone>(&mut self, eligible: &[T]) -> Option<T> {
        eligible.choose(&mut self.rng).cloned()
    }
}
