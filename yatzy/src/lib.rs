//! # yatzy
//!
//! A simulator for the (Scandinavian) Yatzy dice game that plays a full
//! 15-category game with a greedy re-roll strategy : )
//!
//! ## Rules
//!
//! https://en.wikipedia.org/wiki/Yatzy
//!
//! ## Explanation
//!
//! Given the five dice currently on the table, each scoring category picks the
//! closest dice configuration (the "target") that scores something in that
//! category. Closest means the fewest dice that must be re-rolled to get there;
//! ties go to the target with the higher score. The dice that already agree
//! with the target are held, everything else gets re-rolled.
//!
//! This is a greedy strategy: it only ever minimizes the number of dice that
//! must land correctly, and never weighs the actual probability of reaching a
//! pattern or the expected value of a category.
//!
//! A [`game::Game`] drives 15 rounds of up to 3 throws each, choosing which
//! category to aim for with a [`game::TargetPolicy`]. The default
//! [`game::ForcedRule`] fills the score sheet strictly top-to-bottom.

#[macro_use]
mod macros;

pub mod cli;
pub mod compose;
pub mod dice;
pub mod eval;
pub mod game;
pub mod score;
pub mod stats;

use crate::score::Category;
use std::cmp;
use thiserror::Error;

/// The number of dice in play.
pub const NUM_DICE: usize = 5;

/// The number of faces on each die.
pub const NUM_FACES: usize = 6;

/// The number of distinct (unordered) throws of five dice, `6 multichoose 5`.
pub const NUM_DICE_STATES: usize = num_multisets(NUM_FACES as u32, NUM_DICE as u32) as usize;

/// The number of scoring categories (and therefore rounds) in a game.
pub const NUM_CATEGORIES: usize = 15;

/// The number of throws per round, including the first one.
pub const THROWS_PER_ROUND: u8 = 3;

/// The upper section (Ones..Sixes) must sum to at least this much to earn the
/// bonus.
pub const UPPER_BONUS_THRESHOLD: u16 = 63;

/// Bonus awarded when the upper section reaches [`UPPER_BONUS_THRESHOLD`].
pub const UPPER_BONUS: u16 = 50;

pub(crate) const DEFAULT_SEED: u64 = 19283;
pub(crate) const DEFAULT_NUM_GAMES: usize = 10_000;

////////////
// Errors //
////////////

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum YatzyError {
    /// A die showed a face outside `1..=6`.
    #[error("die face is out of range [1, 6]: {face}")]
    InvalidFace { face: u8 },

    /// A dice state didn't contain exactly five dice.
    #[error("expected exactly {} dice, got {ndice}", NUM_DICE)]
    InvalidDiceCount { ndice: usize },

    /// A pattern evaluator couldn't find any composition with a non-zero
    /// score. This means the scoring table itself is broken.
    #[error("no target with a non-zero score exists for {category}")]
    NoValidTarget { category: Category },

    /// A target policy picked a category that's already on the score sheet.
    #[error("category {category} has already been scored")]
    CategoryFilled { category: Category },
}

///////////////////
// Combinatorics //
///////////////////

/// The number of factorials to precompute in our static lookup table. Note this
/// number is chosen so as not to overflow a u32.
pub(crate) const NUM_FACTORIALS: usize = 13;

/// A precomputed lookup table of factorials from `0 <= n < NUM_FACTORIALS`.
/// `FACTORIAL_LT[n] = n!`.
const FACTORIAL_LT: [u32; NUM_FACTORIALS] = precompute_factorials();

const fn precompute_factorials() -> [u32; NUM_FACTORIALS] {
    let mut factorials: [u32; NUM_FACTORIALS] = [1; NUM_FACTORIALS];

    // no for-loops in const fn...
    let mut idx = 1;
    loop {
        if idx >= NUM_FACTORIALS {
            break;
        }
        factorials[idx] = (idx as u32) * factorials[idx - 1];
        idx += 1;
    }

    factorials
}

pub(crate) const fn factorial(n: u32) -> u32 {
    FACTORIAL_LT[n as usize]
}

/// count `n choose k` without replacement.
pub(crate) const fn num_combinations(n: u32, k: u32) -> u32 {
    factorial(n) / (factorial(k) * factorial(n - k))
}

/// count `n choose k` with replacement. also known as `n multichoose k`.
#[inline]
pub(crate) const fn num_multisets(n: u32, k: u32) -> u32 {
    num_combinations(n + k - 1, k)
}

/// The number of distinct orderings of a multiset with the given face counts,
/// i.e., the multinomial coefficient `n! / ∏ c_i!`.
pub(crate) fn num_permutations(counts: &[u8]) -> u32 {
    let n: u32 = counts.iter().map(|&c| c as u32).sum();
    let denom: u32 = counts.iter().map(|&c| factorial(c as u32)).product();
    factorial(n) / denom
}

////////////////////////////
// Unstable std functions //
////////////////////////////

/// Returns `true` if the iterator `iter` is sorted, according to the comparator
/// function `compare`, i.e., `x_1 <= x2 <= ... <= x_n`.
// TODO: use `Iterator::is_sorted_by` once the crate's MSRV allows it.
pub(crate) fn is_sorted_by<T, F>(mut iter: impl Iterator<Item = T>, mut compare: F) -> bool
where
    F: FnMut(&T, &T) -> Option<cmp::Ordering>,
{
    let mut prev = match iter.next() {
        Some(first) => first,
        None => return true,
    };

    for next in iter {
        if let Some(cmp::Ordering::Greater) | None = compare(&prev, &next) {
            return false;
        }
        prev = next;
    }

    true
}

///////////
// Tests //
///////////

#[cfg(test)]
mod test {
    use super::*;

    fn factorial_ref(n: u32) -> u32 {
        (1..=n).product()
    }

    #[test]
    fn test_factorial_lt() {
        for n in 0..NUM_FACTORIALS as u32 {
            assert_eq!(factorial_ref(n), factorial(n));
        }
    }

    #[test]
    fn test_num_multisets() {
        // 5 indistinguishable dice over 6 faces
        assert_eq!(252, num_multisets(6, 5));
        assert_eq!(6, num_multisets(6, 1));
        assert_eq!(1, num_multisets(6, 0));
    }

    #[test]
    fn test_num_permutations() {
        assert_eq!(120, num_permutations(&[1, 1, 1, 1, 1, 0]));
        assert_eq!(1, num_permutations(&[0, 0, 5, 0, 0, 0]));
        // full house: 5! / (2! 3!)
        assert_eq!(10, num_permutations(&[2, 0, 3, 0, 0, 0]));
        assert_eq!(30, num_permutations(&[2, 2, 1, 0, 0, 0]));
    }

    #[test]
    fn test_is_sorted_by() {
        let cmp = |a: &u8, b: &u8| Some(a.cmp(b));
        assert!(is_sorted_by([].into_iter(), cmp));
        assert!(is_sorted_by([1, 1, 3, 4, 6].into_iter(), cmp));
        assert!(!is_sorted_by([1, 3, 2].into_iter(), cmp));
    }
}
