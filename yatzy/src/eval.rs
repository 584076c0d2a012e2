//! Greedy position evaluation.
//!
//! For each category, find the dice state "closest" to the current throw that
//! scores something, and which of the current dice to keep to get there.

use crate::{
    compose::all_dice_states,
    dice::{DiceCounts, DiceState, HoldMask},
    score::Category,
    YatzyError, NUM_DICE, NUM_FACES,
};
use claim::debug_assert_le;
use log::trace;

/// How an evaluator picks its target.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EvaluatorShape {
    /// Ones..Sixes: the only target worth chasing is all five dice on `face`.
    FixedFace(u8),
    /// Everything else: search every scoring composition for the closest one.
    PatternSearch,
}

/// The number of dice that must change face to turn `from` into `to`, i.e.,
/// half the L1 distance between their counts.
#[inline]
pub fn distance(from: &DiceState, to: &DiceState) -> u8 {
    excess_counts(&from.counts(), &to.counts()).iter().sum()
}

/// Per face, how many more dice `from` has than `to`.
#[inline]
fn excess_counts(from: &DiceCounts, to: &DiceCounts) -> DiceCounts {
    let mut excess = [0; NUM_FACES];
    for idx in 0..NUM_FACES {
        excess[idx] = from[idx].saturating_sub(to[idx]);
    }
    excess
}

///////////////////////
// DiceStateComparer //
///////////////////////

/// Computes how to get from one dice state to another: the distance and which
/// of the current dice to hold. `compare` overwrites the previous result.
#[derive(Clone, Debug)]
pub struct DiceStateComparer {
    dice_to_hold: HoldMask,
    distance: u8,
}

impl DiceStateComparer {
    pub fn new() -> Self {
        Self {
            dice_to_hold: HoldMask::all(),
            distance: 0,
        }
    }

    /// Compare the actual dice, `from`, against the desired dice, `to`. The
    /// arguments are not symmetric: the hold mask indexes into
    /// `from.values()`.
    pub fn compare(&mut self, from: &DiceState, to: &DiceState) -> u8 {
        let values = from.values();
        let excess = excess_counts(&from.counts(), &to.counts());

        let mut hold = HoldMask::all();
        let mut distance = 0;

        for (face_idx, &nexcess) in excess.iter().enumerate() {
            if nexcess == 0 {
                continue;
            }
            distance += nexcess;

            // values are sorted, so all dice showing this face sit together
            let face = face_idx as u8 + 1;
            let start = values
                .iter()
                .position(|&v| v == face)
                .unwrap_or(NUM_DICE);
            for idx in start..start + nexcess as usize {
                hold.release(idx);
            }
        }

        debug_assert_le!(distance as usize, NUM_DICE);
        debug_assert_eq!(distance as usize, hold.num_rerolled());

        self.dice_to_hold = hold;
        self.distance = distance;
        distance
    }

    #[inline]
    pub fn distance(&self) -> u8 {
        self.distance
    }

    #[inline]
    pub fn dice_to_hold(&self) -> HoldMask {
        self.dice_to_hold
    }
}

impl Default for DiceStateComparer {
    fn default() -> Self {
        Self::new()
    }
}

////////////////
// Evaluation //
////////////////

/// The outcome of evaluating one category against the current dice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evaluation {
    pub category: Category,
    /// The dice state we're aiming for.
    pub target: DiceState,
    /// Aligned with the sorted values of the evaluated dice.
    pub dice_to_hold: HoldMask,
    pub distance: u8,
    /// The score if the re-rolled dice land exactly on `target`. Not an
    /// expected value.
    pub potential_score: u16,
}

///////////////////////
// PositionEvaluator //
///////////////////////

/// Every composition that scores in `category`, in generator order.
pub fn valid_targets(category: Category) -> impl Iterator<Item = DiceState> {
    all_dice_states().filter(move |state| category.score(state) > 0)
}

/// Picks the greedy target for one category. Keeps its candidate targets and
/// a scratch comparer around, so reuse one evaluator per category per game.
#[derive(Clone, Debug)]
pub struct PositionEvaluator {
    category: Category,
    /// (target, score) pairs in generator order.
    targets: Vec<(DiceState, u16)>,
    comparer: DiceStateComparer,
    last: Option<Evaluation>,
}

impl PositionEvaluator {
    pub fn new(category: Category) -> Self {
        let targets = match category.shape() {
            EvaluatorShape::FixedFace(face) => {
                let target = DiceState::all_of(face);
                let score = category.score(&target);
                vec![(target, score)]
            }
            EvaluatorShape::PatternSearch => valid_targets(category)
                .map(|target| {
                    let score = category.score(&target);
                    (target, score)
                })
                .collect(),
        };

        Self {
            category,
            targets,
            comparer: DiceStateComparer::new(),
            last: None,
        }
    }

    /// One evaluator per category, in canonical order.
    pub fn all() -> Vec<Self> {
        Category::all().iter().copied().map(Self::new).collect()
    }

    #[inline]
    pub fn category(&self) -> Category {
        self.category
    }

    /// The number of candidate targets this evaluator searches.
    #[inline]
    pub fn num_targets(&self) -> usize {
        self.targets.len()
    }

    /// Choose the target closest to `current`, breaking distance ties by the
    /// higher score and then by generator order.
    pub fn evaluate_position(&mut self, current: &DiceState) -> Result<&Evaluation, YatzyError> {
        let mut best: Option<(usize, u8, u16)> = None;

        for (idx, (target, score)) in self.targets.iter().enumerate() {
            let dist = distance(current, target);
            let is_better = match best {
                None => true,
                Some((_, best_dist, best_score)) => {
                    dist < best_dist || (dist == best_dist && *score > best_score)
                }
            };
            if is_better {
                best = Some((idx, dist, *score));
            }
        }

        let (idx, dist, score) = best.ok_or(YatzyError::NoValidTarget {
            category: self.category,
        })?;
        let target = &self.targets[idx].0;

        self.comparer.compare(current, target);
        debug_assert_eq!(dist, self.comparer.distance());

        trace!(
            "{}: dice={} target={} hold={} distance={} potential={}",
            self.category,
            current,
            target,
            self.comparer.dice_to_hold(),
            dist,
            score,
        );

        Ok(self.last.insert(Evaluation {
            category: self.category,
            target: target.clone(),
            dice_to_hold: self.comparer.dice_to_hold(),
            distance: dist,
            potential_score: score,
        }))
    }

    /// The result of the most recent [`evaluate_position`](Self::evaluate_position).
    #[inline]
    pub fn last_evaluation(&self) -> Option<&Evaluation> {
        self.last.as_ref()
    }

    /// Score the dice as they stand.
    #[inline]
    pub fn calculate_score(&self, dice: &DiceState) -> u16 {
        self.category.score(dice)
    }
}

///////////
// Tests //
///////////
