use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::engine::Move;

/// Strategy for choosing one move out of a candidate set.
///
/// Gestures only say *that* the player wants to select or place; which square
/// is meant is decided here. A pointer-driven picker can replace the random
/// one without touching the interaction state machine.
pub trait MovePicker {
    fn pick<'a>(&mut self, candidates: &'a [Move]) -> Option<&'a Move>;
}

/// Uniform random choice among all candidates.
pub struct RandomPicker {
    rng: StdRng,
}

impl RandomPicker {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl MovePicker for RandomPicker {
    fn pick<'a>(&mut self, candidates: &'a [Move]) -> Option<&'a Move> {
        candidates.choose(&mut self.rng)
    }
}

/// Always the first candidate; handy for reproducible replays.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstPicker;

impl MovePicker for FirstPicker {
    fn pick<'a>(&mut self, candidates: &'a [Move]) -> Option<&'a Move> {
        candidates.first()
    }
}
