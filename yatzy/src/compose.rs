//! Enumerate every way to distribute `n` indistinguishable dice over the six
//! faces, i.e., every tuple `(x_1, .., x_6)` with `x_i >= 0` and
//! `x_1 + .. + x_6 = n`. For `n = 5` there are `6 multichoose 5 = 252` of
//! them, one per distinct (unordered) throw of five dice.
//!
//! See "Matters Computational" (the FXT book), ch. 7 on compositions.

use crate::{dice::DiceState, YatzyError, NUM_DICE, NUM_FACES};
use std::iter::FusedIterator;

/// Returned by [`CompositionGenerator::advance`] once every composition has
/// been generated.
pub const DONE: usize = NUM_FACES;

/// Generates compositions in place, one cheap successor step at a time.
///
/// This is not lexicographic order. The successor of `x` finds the first
/// non-zero bin `j`, empties it, moves all but one of its items back to bin 0
/// and bumps bin `j + 1`. Each step is amortized O(1).
#[derive(Clone, Debug)]
pub struct CompositionGenerator {
    x: [u8; NUM_FACES],
    n: u8,
}

impl CompositionGenerator {
    /// A generator over compositions of `n` into six parts, positioned at the
    /// first composition. There's nothing to distribute when `n == 0`.
    pub fn new(n: u8) -> Result<Self, YatzyError> {
        if n == 0 {
            return Err(YatzyError::InvalidDiceCount { ndice: 0 });
        }
        Ok(Self::new_unchecked(n))
    }

    /// A generator over the five dice in play.
    pub fn for_dice() -> Self {
        Self::new_unchecked(NUM_DICE as u8)
    }

    fn new_unchecked(n: u8) -> Self {
        debug_assert!(n >= 1);

        let mut gen = Self {
            x: [0; NUM_FACES],
            n,
        };
        gen.first();
        gen
    }

    /// Reset to the first composition, `(n, 0, 0, 0, 0, 0)`.
    pub fn first(&mut self) {
        self.x = [0; NUM_FACES];
        self.x[0] = self.n;
    }

    /// The current composition. Overwritten by the next call to
    /// [`advance`](Self::advance).
    #[inline]
    pub fn data(&self) -> &[u8; NUM_FACES] {
        &self.x
    }

    /// Step to the next composition. Returns the highest bin index that
    /// changed, or [`DONE`] once the last composition, `(0, .., 0, n)`, has
    /// already been reached (in which case nothing changes).
    pub fn advance(&mut self) -> usize {
        // n >= 1, so there's always a non-zero bin
        let mut j = 0;
        while self.x[j] == 0 {
            j += 1;
        }

        if j == NUM_FACES - 1 {
            return DONE;
        }

        let v = self.x[j];
        self.x[j] = 0;
        self.x[0] = v - 1;
        self.x[j + 1] += 1;

        debug_assert_eq!(self.x.iter().sum::<u8>(), self.n);
        j + 1
    }

    /// Step to the next composition. Returns `false` when there are no more.
    #[inline]
    pub fn next_composition(&mut self) -> bool {
        self.advance() != DONE
    }
}

/// An `Iterator` over owned copies of every composition, in generator order.
pub struct Compositions {
    gen: CompositionGenerator,
    done: bool,
}

impl Compositions {
    pub fn new(n: u8) -> Result<Self, YatzyError> {
        CompositionGenerator::new(n).map(Self::from)
    }
}

impl From<CompositionGenerator> for Compositions {
    /// Iterate from wherever `gen` currently is.
    fn from(gen: CompositionGenerator) -> Self {
        Self { gen, done: false }
    }
}

impl Iterator for Compositions {
    type Item = [u8; NUM_FACES];

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        // this is the composition we're about to output
        let current = *self.gen.data();
        self.done = !self.gen.next_composition();

        Some(current)
    }
}

impl FusedIterator for Compositions {}

/// All 252 distinct throws of five dice, in generator order.
pub fn all_dice_states() -> impl Iterator<Item = DiceState> {
    Compositions::from(CompositionGenerator::for_dice()).map(DiceState::from_counts_unchecked)
}

///////////
// Tests //
///////////
