//! Injectable permutation source for the shuffle plan
//!
//! The engine never touches a global randomness source; it is handed a
//! [`QueueShuffler`] at construction. Production code uses
//! [`RandomShuffler`] seeded from the OS; tests use
//! [`RandomShuffler::seeded`] or a hand-written implementation producing a
//! fixed permutation.

use crate::TrackRef;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Produces the permutation used as the shuffle plan.
///
/// Implementations must permute `tracks` in place: the same multiset of
/// references must be present before and after the call.
pub trait QueueShuffler: Send + Sync {
    fn shuffle(&mut self, tracks: &mut [TrackRef]);
}

/// Uniformly random permutations via a seedable RNG.
///
/// `SliceRandom::shuffle` is a Fisher-Yates shuffle, so each of the n!
/// orderings is equally likely.
pub struct RandomShuffler {
    rng: StdRng,
}

impl RandomShuffler {
    /// Creates a shuffler seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Creates a shuffler with a fixed seed, for deterministic plans.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomShuffler {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueShuffler for RandomShuffler {
    fn shuffle(&mut self, tracks: &mut [TrackRef]) {
        tracks.shuffle(&mut self.rng);
    }
}
