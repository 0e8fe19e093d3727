//! Chance gate shared by every requirement of one crafting pass

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded probability gate.
///
/// Passing the gate means the normal outcome (inputs consumed, outputs
/// produced plain). Failing it selects the alternate outcome.
#[derive(Debug, Clone)]
pub struct ResultChance {
    rng: StdRng,
}

impl ResultChance {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Roll against `chance` (probability of passing)
    pub fn passes(&mut self, chance: f32) -> bool {
        if chance >= 1.0 {
            return true;
        }
        if chance <= 0.0 || chance.is_nan() {
            return false;
        }
        self.rng.gen_range(0.0..1.0) < chance
    }
}
