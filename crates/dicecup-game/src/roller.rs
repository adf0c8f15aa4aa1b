//! Injected randomness for the roll transition.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;

/// Produces die faces for [`rules::roll`](crate::rules::roll).
///
/// The roll transition asks for one value per unlocked die, in dice
/// order. Production code uses [`RandomRoller`]; tests and demos use
/// [`ScriptedRoller`] to get exact dice.
pub trait DiceRoller: Send + Sync + 'static {
    /// Returns a face value in `1..=6`.
    fn roll(&self) -> u8;
}

/// Uniformly random faces from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomRoller;

impl DiceRoller for RandomRoller {
    fn roll(&self) -> u8 {
        rand::rng().random_range(1..=6)
    }
}

/// Replays a fixed script of faces, cycling when it runs out.
///
/// Out-of-range script values are clamped into `1..=6`; an empty script
/// always rolls 1.
#[derive(Debug, Default)]
pub struct ScriptedRoller {
    script: Vec<u8>,
    cursor: AtomicUsize,
}

impl ScriptedRoller {
    /// Creates a roller that returns `values` in order.
    pub fn new(values: impl IntoIterator<Item = u8>) -> Self {
        Self {
            script: values.into_iter().map(|v| v.clamp(1, 6)).collect(),
            cursor: AtomicUsize::new(0),
        }
    }
}

impl DiceRoller for ScriptedRoller {
    fn roll(&self) -> u8 {
        if self.script.is_empty() {
            return 1;
        }
        let i = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.script[i % self.script.len()]
    }
}
