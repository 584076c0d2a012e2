use crate::{dice::DiceState, eval::EvaluatorShape, NUM_CATEGORIES};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

//////////////
// Category //
//////////////

/// The 15 scoring categories, in score sheet order. The order is also the
/// fill order for the forced rule, so don't rearrange these.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Ones = 0,
    Twos,
    Threes,
    Fours,
    Fives,
    Sixes,
    OnePair,
    TwoPairs,
    ThreeOfAKind,
    FourOfAKind,
    SmallStraight,
    LargeStraight,
    House,
    Chance,
    Yatzy,
}

impl Category {
    pub const fn all() -> &'static [Category; NUM_CATEGORIES] {
        &[
            Self::Ones,
            Self::Twos,
            Self::Threes,
            Self::Fours,
            Self::Fives,
            Self::Sixes,
            Self::OnePair,
            Self::TwoPairs,
            Self::ThreeOfAKind,
            Self::FourOfAKind,
            Self::SmallStraight,
            Self::LargeStraight,
            Self::House,
            Self::Chance,
            Self::Yatzy,
        ]
    }

    /// The upper section, scored by a single face.
    pub const fn upper() -> &'static [Category; 6] {
        &[
            Self::Ones,
            Self::Twos,
            Self::Threes,
            Self::Fours,
            Self::Fives,
            Self::Sixes,
        ]
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::all().get(idx).copied()
    }

    #[inline]
    pub const fn is_upper(self) -> bool {
        self.index() < 6
    }

    /// For Ones..Sixes, the face that scores. `None` for the pattern
    /// categories.
    pub const fn face(self) -> Option<u8> {
        if self.is_upper() {
            Some(self.index() as u8 + 1)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ones => "Ones",
            Self::Twos => "Twos",
            Self::Threes => "Threes",
            Self::Fours => "Fours",
            Self::Fives => "Fives",
            Self::Sixes => "Sixes",
            Self::OnePair => "OnePair",
            Self::TwoPairs => "TwoPairs",
            Self::ThreeOfAKind => "ThreeOfAKind",
            Self::FourOfAKind => "FourOfAKind",
            Self::SmallStraight => "SmallStraight",
            Self::LargeStraight => "LargeStraight",
            Self::House => "House",
            Self::Chance => "Chance",
            Self::Yatzy => "Yatzy",
        }
    }

    /// Score `dice` in this category. Zero means the pattern wasn't made.
    pub fn score(self, dice: &DiceState) -> u16 {
        match self {
            Self::Ones | Self::Twos | Self::Threes | Self::Fours | Self::Fives | Self::Sixes => {
                fixed_face(dice, self.index() as u8 + 1)
            }
            Self::OnePair => n_of_a_kind(dice, 2),
            Self::TwoPairs => two_pairs(dice),
            Self::ThreeOfAKind => n_of_a_kind(dice, 3),
            Self::FourOfAKind => n_of_a_kind(dice, 4),
            Self::SmallStraight => straight(dice, 1),
            Self::LargeStraight => straight(dice, 2),
            Self::House => house(dice),
            Self::Chance => chance(dice),
            Self::Yatzy => yatzy(dice),
        }
    }

    /// How this category's evaluator picks its target.
    pub fn shape(self) -> EvaluatorShape {
        match self.face() {
            Some(face) => EvaluatorShape::FixedFace(face),
            None => EvaluatorShape::PatternSearch,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a category name, ignoring case and any `-`, `_`, or ` ` separators,
/// e.g., "TwoPairs", "two-pairs", or "two pairs".
impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        Self::all()
            .iter()
            .copied()
            .find(|category| category.as_str().to_ascii_lowercase() == normalized)
            .ok_or_else(|| format!("unrecognized category: '{}'", s))
    }
}

/////////////
// Scoring //
/////////////

/// Ones, Twos, .., Sixes: the sum of the dice showing `face`.
///
/// # Panics
///
/// If `face` isn't in `1..=6`.
#[inline]
pub fn fixed_face(dice: &DiceState, face: u8) -> u16 {
    dice.count(face) as u16 * face as u16
}

/// One pair, three and four of a kind. With several candidates the highest
/// face wins.
pub fn n_of_a_kind(dice: &DiceState, n: u8) -> u16 {
    (1..=6_u8)
        .rev()
        .find(|&face| dice.count(face) >= n)
        .map(|face| face as u16 * n as u16)
        .unwrap_or(0)
}

/// Two different faces, each showing at least twice.
pub fn two_pairs(dice: &DiceState) -> u16 {
    let mut pairs = (1..=6_u8).filter(|&face| dice.count(face) >= 2);
    match (pairs.next(), pairs.next()) {
        (Some(lo), Some(hi)) => 2 * (lo as u16 + hi as u16),
        _ => 0,
    }
}

/// Small (`first == 1`, 1-2-3-4-5) or large (`first == 2`, 2-3-4-5-6)
/// straight.
pub(crate) fn straight(dice: &DiceState, first: u8) -> u16 {
    debug_assert!(first == 1 || first == 2);

    if (first..first + 5).all(|face| dice.count(face) == 1) {
        if first == 1 {
            15
        } else {
            20
        }
    } else {
        0
    }
}

/// Full house: a pair and three of a kind of two different faces.
pub fn house(dice: &DiceState) -> u16 {
    let two = (1..=6_u8).find(|&face| dice.count(face) == 2);
    let three = (1..=6_u8).find(|&face| dice.count(face) == 3);
    match (two, three) {
        (Some(two), Some(three)) => 2 * two as u16 + 3 * three as u16,
        _ => 0,
    }
}

#[inline]
pub fn chance(dice: &DiceState) -> u16 {
    dice.sum()
}

pub fn yatzy(dice: &DiceState) -> u16 {
    if dice.counts().contains(&5) {
        50
    } else {
        0
    }
}

///////////
// Tests //
///////////

#[cfg(test)]
mod test {
    use super::*;
    use crate::compose::all_dice_states;
    use claim::assert_le;
    use proptest::prelude::*;

    fn dice(values: [u8; 5]) -> DiceState {
        DiceState::from_values(&values).unwrap()
    }

    #[test]
    fn test_category_order() {
        for (idx, category) in Category::all().iter().enumerate() {
            assert_eq!(idx, category.index());
            assert_eq!(Some(*category), Category::from_index(idx));
        }
        assert_eq!(None, Category::from_index(15));

        assert_eq!(Category::all()[..6], Category::upper()[..]);
        assert!(Category::Sixes.is_upper());
        assert!(!Category::OnePair.is_upper());
        assert_eq!(Some(4), Category::Fours.face());
        assert_eq!(None, Category::House.face());
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!(Ok(Category::TwoPairs), Category::from_str("TwoPairs"));
        assert_eq!(Ok(Category::TwoPairs), Category::from_str("two-pairs"));
        assert_eq!(Ok(Category::ThreeOfAKind), Category::from_str("three of a kind"));
        assert_eq!(Ok(Category::Yatzy), Category::from_str("YATZY"));
        assert!(Category::from_str("sevens").is_err());

        for category in Category::all() {
            assert_eq!(Ok(*category), category.to_string().parse::<Category>());
        }
    }

    #[test]
    fn test_score_full_house_roll() {
        let d = dice([1, 3, 3, 3, 1]);
        assert_eq!(2, Category::Ones.score(&d));
        assert_eq!(9, Category::Threes.score(&d));
        // highest pair, not the first one
        assert_eq!(6, Category::OnePair.score(&d));
        assert_eq!(9, Category::ThreeOfAKind.score(&d));
        assert_eq!(11, Category::House.score(&d));
        assert_eq!(8, Category::TwoPairs.score(&d));
    }

    #[test]
    fn test_score_four_of_a_kind_roll() {
        let d = dice([2, 2, 5, 2, 2]);
        assert_eq!(8, Category::Twos.score(&d));
        assert_eq!(5, Category::Fives.score(&d));
        assert_eq!(8, Category::FourOfAKind.score(&d));
        assert_eq!(6, Category::ThreeOfAKind.score(&d));
        // only one face qualifies
        assert_eq!(0, Category::TwoPairs.score(&d));
        assert_eq!(0, Category::House.score(&d));
        assert_eq!(13, Category::Chance.score(&d));
    }

    #[test]
    fn test_score_two_pairs_roll() {
        let d = dice([6, 1, 6, 4, 4]);
        assert_eq!(12, Category::Sixes.score(&d));
        assert_eq!(8, Category::Fours.score(&d));
        assert_eq!(20, Category::TwoPairs.score(&d));
        assert_eq!(12, Category::OnePair.score(&d));
    }

    #[test]
    fn test_score_straights() {
        let d = dice([1, 2, 3, 4, 5]);
        assert_eq!(15, Category::SmallStraight.score(&d));
        assert_eq!(0, Category::LargeStraight.score(&d));

        let d = dice([2, 3, 4, 5, 6]);
        assert_eq!(0, Category::SmallStraight.score(&d));
        assert_eq!(20, Category::LargeStraight.score(&d));
    }

    #[test]
    fn test_score_yatzy() {
        let d = dice([3, 3, 3, 3, 3]);
        assert_eq!(50, Category::Yatzy.score(&d));
        assert_eq!(15, Category::Threes.score(&d));
        assert_eq!(12, Category::FourOfAKind.score(&d));
        // five of a kind is neither two pairs nor a house
        assert_eq!(0, Category::TwoPairs.score(&d));
        assert_eq!(0, Category::House.score(&d));
    }

    #[test]
    fn test_score_nothing() {
        let d = dice([1, 2, 3, 4, 6]);
        for category in Category::all() {
            let score = category.score(&d);
            match category {
                Category::Chance => assert_eq!(16, score),
                Category::Fives => assert_eq!(0, score),
                category if category.is_upper() => {
                    assert_eq!(category.face().unwrap() as u16, score)
                }
                _ => assert_eq!(0, score, "{category}"),
            }
        }
    }

    #[test]
    fn test_scores_are_bounded() {
        for state in all_dice_states() {
            for category in Category::all() {
                assert_le!(category.score(&state), 50);
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn test_prop_upper_scores_sum_to_chance(d in any::<DiceState>()) {
            let upper_sum: u16 = Category::upper().iter().map(|c| c.score(&d)).sum();
            prop_assert_eq!(Category::Chance.score(&d), upper_sum);
        }

        #[test]
        fn test_prop_score_is_order_invariant(d in any::<DiceState>()) {
            let mut reversed = d.values();
            reversed.reverse();
            let d2 = DiceState::from_values(&reversed).unwrap();
            for category in Category::all() {
                prop_assert_eq!(category.score(&d), category.score(&d2));
            }
        }
    }
}
