use crate::{
    dice::{DiceState, HoldMask, RollingDice},
    eval::{Evaluation, PositionEvaluator},
    score::Category,
    YatzyError, NUM_CATEGORIES, THROWS_PER_ROUND, UPPER_BONUS, UPPER_BONUS_THRESHOLD,
};
use log::debug;
use serde::{Deserialize, Serialize};

////////////////
// ScoreSheet //
////////////////

/// One slot per category. `None` means the slot hasn't been filled yet.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSheet {
    scores: [Option<u16>; NUM_CATEGORIES],
}

impl ScoreSheet {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, category: Category) -> Option<u16> {
        self.scores[category.index()]
    }

    #[inline]
    pub fn is_filled(&self, category: Category) -> bool {
        self.get(category).is_some()
    }

    /// The lowest-index category that hasn't been scored yet.
    pub fn first_unfilled(&self) -> Option<Category> {
        Category::all()
            .iter()
            .copied()
            .find(|&category| !self.is_filled(category))
    }

    pub fn is_complete(&self) -> bool {
        self.scores.iter().all(Option::is_some)
    }

    /// Write `score` into an empty slot.
    pub(crate) fn fill(&mut self, category: Category, score: u16) -> Result<(), YatzyError> {
        let slot = &mut self.scores[category.index()];
        if slot.is_some() {
            return Err(YatzyError::CategoryFilled { category });
        }
        *slot = Some(score);
        Ok(())
    }

    /// The sum of Ones..Sixes, counting unfilled slots as zero.
    pub fn upper_sum(&self) -> u16 {
        Category::upper()
            .iter()
            .filter_map(|&category| self.get(category))
            .sum()
    }

    pub fn bonus(&self) -> u16 {
        if self.upper_sum() >= UPPER_BONUS_THRESHOLD {
            UPPER_BONUS
        } else {
            0
        }
    }

    /// Every filled slot plus the bonus.
    pub fn total(&self) -> u16 {
        self.scores.iter().flatten().sum::<u16>() + self.bonus()
    }

    /// `(category, slot)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, Option<u16>)> + '_ {
        Category::all().iter().copied().zip(self.scores.iter().copied())
    }

    pub fn as_array(&self) -> [Option<u16>; NUM_CATEGORIES] {
        self.scores
    }
}

//////////////////
// TargetPolicy //
//////////////////

/// Picks the category to aim for after each throw.
pub trait TargetPolicy {
    /// `evaluations` holds one entry per unfilled category, in canonical
    /// order. The returned category must not already be on the sheet.
    fn choose_target(
        &mut self,
        sheet: &ScoreSheet,
        evaluations: &[Evaluation],
        throws_left: u8,
    ) -> Category;
}

/// Fill the score sheet strictly top to bottom, regardless of the dice.
#[derive(Copy, Clone, Debug, Default)]
pub struct ForcedRule;

impl TargetPolicy for ForcedRule {
    fn choose_target(
        &mut self,
        sheet: &ScoreSheet,
        _evaluations: &[Evaluation],
        _throws_left: u8,
    ) -> Category {
        // only a full sheet has no unfilled slot, and the game rejects the
        // filled Yatzy slot in that case
        sheet.first_unfilled().unwrap_or(Category::Yatzy)
    }
}

/////////////////
// RoundRecord //
/////////////////

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThrowRecord {
    /// The dice right after this throw.
    pub dice: DiceState,
    /// The category the policy chose after seeing these dice.
    pub target: Category,
    /// The greedy target the chosen category was aiming at.
    pub evaluation: Evaluation,
    /// The dice held for the next throw; `None` after the last throw.
    pub hold: Option<HoldMask>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundRecord {
    pub round: usize,
    pub throws: Vec<ThrowRecord>,
    pub category: Category,
    pub score: u16,
}

//////////
// Game //
//////////

/// One player working through a full 15-round game.
///
/// `play` can be called repeatedly. Each call starts from an empty sheet and
/// keeps drawing from the same dice, so every game is different, but the
/// sequence of games is fixed by the seed.
pub struct Game<P = ForcedRule> {
    dice: RollingDice,
    evaluators: Vec<PositionEvaluator>,
    policy: P,
    sheet: ScoreSheet,
    history: Vec<RoundRecord>,
}

impl Game {
    pub fn new(seed: u64) -> Self {
        Self::with_policy(seed, ForcedRule)
    }
}

impl<P: TargetPolicy> Game<P> {
    pub fn with_policy(seed: u64, policy: P) -> Self {
        Self {
            dice: RollingDice::from_seed(seed),
            evaluators: PositionEvaluator::all(),
            policy,
            sheet: ScoreSheet::new(),
            history: Vec::with_capacity(NUM_CATEGORIES),
        }
    }

    /// Play all 15 rounds from a fresh sheet.
    pub fn play(&mut self) -> Result<(), YatzyError> {
        self.sheet = ScoreSheet::new();
        self.history.clear();

        for round in 0..NUM_CATEGORIES {
            let record = self.play_round(round)?;
            self.history.push(record);
        }

        debug_assert!(self.sheet.is_complete());
        debug!(
            "game over: upper={} bonus={} total={}",
            self.sheet.upper_sum(),
            self.sheet.bonus(),
            self.sheet.total(),
        );
        Ok(())
    }

    fn play_round(&mut self, round: usize) -> Result<RoundRecord, YatzyError> {
        let mut throws = Vec::with_capacity(THROWS_PER_ROUND as usize);
        let mut evaluations = Vec::with_capacity(NUM_CATEGORIES);

        let mut last = self.throw(round, THROWS_PER_ROUND - 1, None, &mut evaluations)?;
        for throws_left in (0..THROWS_PER_ROUND - 1).rev() {
            let hold = last.hold;
            throws.push(last);
            last = self.throw(round, throws_left, hold.as_ref(), &mut evaluations)?;
        }

        // the last throw's choice is the one that gets scored
        let category = last.target;
        throws.push(last);

        let score = category.score(self.dice.state());
        self.sheet.fill(category, score)?;

        debug!("round {}: scored {} in {}", round, score, category);

        Ok(RoundRecord {
            round,
            throws,
            category,
            score,
        })
    }

    /// Roll the dice not in `hold`, evaluate every unfilled category, and let
    /// the policy pick a target. `evaluations` is scratch space.
    fn throw(
        &mut self,
        round: usize,
        throws_left: u8,
        hold: Option<&HoldMask>,
        evaluations: &mut Vec<Evaluation>,
    ) -> Result<ThrowRecord, YatzyError> {
        self.dice.roll(hold);

        evaluations.clear();
        for evaluator in self
            .evaluators
            .iter_mut()
            .filter(|evaluator| !self.sheet.is_filled(evaluator.category()))
        {
            let evaluation = evaluator.evaluate_position(self.dice.state())?;
            evaluations.push(evaluation.clone());
        }

        let category = self
            .policy
            .choose_target(&self.sheet, evaluations, throws_left);
        if self.sheet.is_filled(category) {
            return Err(YatzyError::CategoryFilled { category });
        }

        let evaluation = evaluations
            .iter()
            .find(|evaluation| evaluation.category == category)
            .cloned()
            .ok_or(YatzyError::NoValidTarget { category })?;

        let next_hold = if throws_left > 0 {
            Some(evaluation.dice_to_hold)
        } else {
            None
        };

        debug!(
            "round {} throw {}: dice={} target={} ({}) hold={}",
            round,
            THROWS_PER_ROUND - throws_left,
            self.dice.state(),
            category,
            evaluation.target,
            evaluation.dice_to_hold,
        );

        Ok(ThrowRecord {
            dice: self.dice.state().clone(),
            target: category,
            evaluation,
            hold: next_hold,
        })
    }

    #[inline]
    pub fn scores(&self) -> &ScoreSheet {
        &self.sheet
    }

    /// 50 if the upper section reached 63, else 0.
    #[inline]
    pub fn bonus(&self) -> u16 {
        self.sheet.bonus()
    }

    #[inline]
    pub fn total(&self) -> u16 {
        self.sheet.total()
    }

    /// Every round of the most recent `play`, in order.
    #[inline]
    pub fn history(&self) -> &[RoundRecord] {
        &self.history
    }
}

///////////
// Tests //
///////////
