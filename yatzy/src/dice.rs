use crate::{is_sorted_by, YatzyError, NUM_DICE, NUM_FACES};
use claim::debug_assert_le;
#[cfg(test)]
use proptest::{
    arbitrary::Arbitrary,
    strategy::{BoxedStrategy, Strategy},
};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;
use std::{
    cell::Cell,
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
    str::FromStr,
};

/// The five dice faces, sorted ascending.
pub type DiceValues = [u8; NUM_DICE];

/// `counts[face - 1]` is the number of dice showing `face`.
pub type DiceCounts = [u8; NUM_FACES];

/// Returns `Ok(())` if `face` is a real die face.
#[inline]
fn validate_face(face: u8) -> Result<(), YatzyError> {
    if (1..=NUM_FACES as u8).contains(&face) {
        Ok(())
    } else {
        Err(YatzyError::InvalidFace { face })
    }
}

fn validate_counts(counts: &DiceCounts) -> Result<(), YatzyError> {
    let ndice: usize = counts.iter().map(|&c| c as usize).sum();
    if ndice == NUM_DICE {
        Ok(())
    } else {
        Err(YatzyError::InvalidDiceCount { ndice })
    }
}

/// Spread the face counts back out into a sorted list of faces.
fn values_from_counts(counts: &DiceCounts) -> DiceValues {
    let mut values = [0; NUM_DICE];
    let mut idx = 0;
    for (face_idx, &count) in counts.iter().enumerate() {
        for _ in 0..count {
            values[idx] = (face_idx + 1) as u8;
            idx += 1;
        }
    }
    values
}

///////////////
// DiceState //
///////////////

/// Five dice, stored canonically as the number of dice showing each face.
///
/// The sorted face values are a derived view, computed from the counts the
/// first time they're needed and cached until the next update. All updates go
/// through [`DiceState::set_state`] (or a crate-internal path that only ever
/// produces valid counts), so the two views can never disagree.
///
/// Not `Sync`: the values cache is a plain `Cell`. Each game owns its own
/// states.
#[derive(Clone)]
pub struct DiceState {
    counts: DiceCounts,
    values: Cell<Option<DiceValues>>,
}

impl DiceState {
    /// Build a state from per-face counts (`counts[0]` is the number of 1s).
    pub fn from_counts(counts: DiceCounts) -> Result<Self, YatzyError> {
        let mut state = Self::default();
        state.set_state(|new_counts| *new_counts = counts)?;
        Ok(state)
    }

    /// Build a state from five (unordered) die faces.
    pub fn from_values(values: &[u8]) -> Result<Self, YatzyError> {
        let mut state = Self::default();
        state.set_values(values)?;
        Ok(state)
    }

    /// All five dice showing `face`.
    pub(crate) fn all_of(face: u8) -> Self {
        debug_assert!(validate_face(face).is_ok());

        let mut counts = [0; NUM_FACES];
        counts[(face - 1) as usize] = NUM_DICE as u8;
        Self::from_counts_unchecked(counts)
    }

    /// Build a state from counts that are known to be valid, e.g., a
    /// composition of 5 into 6 parts.
    #[inline]
    pub(crate) fn from_counts_unchecked(counts: DiceCounts) -> Self {
        let state = Self {
            counts,
            values: Cell::new(None),
        };
        debug_assert!(state.invariant());
        state
    }

    /// The single way to update a `DiceState`. `setter` receives a zeroed
    /// counts array to fill in. The new counts are validated before they're
    /// committed; on error the state is left untouched.
    pub fn set_state<F>(&mut self, setter: F) -> Result<(), YatzyError>
    where
        F: FnOnce(&mut DiceCounts),
    {
        let mut counts = [0; NUM_FACES];
        setter(&mut counts);
        validate_counts(&counts)?;
        self.commit(counts);
        Ok(())
    }

    /// Replace the dice with five (unordered) faces.
    pub fn set_values(&mut self, values: &[u8]) -> Result<(), YatzyError> {
        if values.len() != NUM_DICE {
            return Err(YatzyError::InvalidDiceCount {
                ndice: values.len(),
            });
        }
        for &face in values {
            validate_face(face)?;
        }
        self.set_state(|counts| {
            for &face in values {
                counts[(face - 1) as usize] += 1;
            }
        })
    }

    /// Crate-internal update for counts that are valid by construction.
    #[inline]
    pub(crate) fn replace_counts(&mut self, counts: DiceCounts) {
        self.commit(counts);
        debug_assert!(self.invariant());
    }

    #[inline]
    fn commit(&mut self, counts: DiceCounts) {
        self.counts = counts;
        self.values.set(None);
    }

    fn invariant(&self) -> bool {
        validate_counts(&self.counts).is_ok()
            && is_sorted_by(self.values().into_iter(), |v1, v2| Some(v1.cmp(v2)))
            && (1..=NUM_FACES as u8).all(|face| {
                let nvalues = self.values().iter().filter(|&&v| v == face).count();
                nvalues == self.count(face) as usize
            })
    }

    /// The number of dice showing `face`.
    ///
    /// # Panics
    ///
    /// If `face` isn't in `1..=6`.
    #[inline]
    pub fn count(&self, face: u8) -> u8 {
        debug_assert!(validate_face(face).is_ok());
        self.counts[(face - 1) as usize]
    }

    #[inline]
    pub fn counts(&self) -> DiceCounts {
        self.counts
    }

    /// The dice faces, sorted ascending.
    pub fn values(&self) -> DiceValues {
        match self.values.get() {
            Some(values) => values,
            None => {
                let values = values_from_counts(&self.counts);
                self.values.set(Some(values));
                values
            }
        }
    }

    /// The sum of all five faces.
    pub fn sum(&self) -> u16 {
        self.counts
            .iter()
            .enumerate()
            .map(|(face_idx, &count)| (face_idx as u16 + 1) * count as u16)
            .sum()
    }
}

impl Default for DiceState {
    /// Five 1s.
    fn default() -> Self {
        Self::all_of(1)
    }
}

impl PartialEq for DiceState {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.counts == other.counts
    }
}

impl Eq for DiceState {}

impl Hash for DiceState {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.counts.hash(state)
    }
}

impl fmt::Debug for DiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.values())
    }
}

impl fmt::Display for DiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.values())
    }
}

/// Parse a comma/space/tab separated list of five dice into a `DiceState`.
/// Enclosing brackets ('[' or ']') optional.
impl FromStr for DiceState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim_start_matches('[');
        let s = s.trim_end_matches(']');

        let splitters = &[',', ' ', '\n', '\t'];

        let faces = s
            .split(splitters)
            .filter(|s| !s.is_empty())
            .map(|face_str| {
                face_str
                    .parse::<u8>()
                    .map_err(|err| format!("die face is not a valid integer: {}", err))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_values(&faces).map_err(|err| err.to_string())
    }
}

#[cfg(test)]
impl Arbitrary for DiceState {
    type Parameters = ();
    type Strategy = BoxedStrategy<DiceState>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        proptest::array::uniform5(1_u8..=6)
            .prop_map(|faces| DiceState::from_values(&faces).unwrap())
            .boxed()
    }
}

//////////////
// HoldMask //
//////////////

/// Which dice to keep for the next throw. Index `i` refers to the `i`'th die
/// of the sorted [`DiceState::values`] the mask was computed against.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct HoldMask([bool; NUM_DICE]);

impl HoldMask {
    /// Hold every die.
    #[inline]
    pub const fn all() -> Self {
        Self([true; NUM_DICE])
    }

    /// Re-roll every die.
    #[inline]
    pub const fn none() -> Self {
        Self([false; NUM_DICE])
    }

    #[inline]
    pub fn is_held(&self, idx: usize) -> bool {
        self.0[idx]
    }

    #[inline]
    pub(crate) fn release(&mut self, idx: usize) {
        self.0[idx] = false;
    }

    pub fn num_held(&self) -> usize {
        self.0.iter().filter(|&&held| held).count()
    }

    #[inline]
    pub fn num_rerolled(&self) -> usize {
        NUM_DICE - self.num_held()
    }

    /// The faces of the held dice in `state`, which must be the state this
    /// mask was computed against.
    pub fn held_faces(self, state: &DiceState) -> impl Iterator<Item = u8> {
        state
            .values()
            .into_iter()
            .zip(self.0)
            .filter_map(|(face, held)| if held { Some(face) } else { None })
    }

    #[inline]
    pub fn as_array(&self) -> [bool; NUM_DICE] {
        self.0
    }
}

impl From<[bool; NUM_DICE]> for HoldMask {
    #[inline]
    fn from(mask: [bool; NUM_DICE]) -> Self {
        Self(mask)
    }
}

/// Renders held dice as `H` and re-rolled dice as `.`, e.g., `..HH.`.
impl fmt::Display for HoldMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for held in self.0 {
            f.write_str(if held { "H" } else { "." })?;
        }
        Ok(())
    }
}

/////////////////
// RollingDice //
/////////////////

/// A `DiceState` that re-rolls itself with a private, seeded PRNG.
pub struct RollingDice<R = Xoroshiro128PlusPlus> {
    state: DiceState,
    rng: R,
}

impl RollingDice {
    pub fn from_seed(seed: u64) -> Self {
        Self::new(Xoroshiro128PlusPlus::seed_from_u64(seed))
    }
}

impl<R: Rng> RollingDice<R> {
    /// Wrap `rng` and throw all five dice once so we start from a random state.
    pub fn new(rng: R) -> Self {
        let mut dice = Self {
            state: DiceState::default(),
            rng,
        };
        dice.roll(None);
        dice
    }

    /// Re-roll every die not held by `hold`. `None` re-rolls all dice.
    pub fn roll(&mut self, hold: Option<&HoldMask>) {
        let values = self.state.values();
        let mut counts = self.state.counts();

        for (idx, face) in values.into_iter().enumerate() {
            if hold.map_or(false, |hold| hold.is_held(idx)) {
                continue;
            }

            let new_face: u8 = self.rng.gen_range(1..=NUM_FACES as u8);
            debug_assert_le!(1, counts[(face - 1) as usize]);
            counts[(face - 1) as usize] -= 1;
            counts[(new_face - 1) as usize] += 1;
        }

        self.state.replace_counts(counts);
    }

    #[inline]
    pub fn state(&self) -> &DiceState {
        &self.state
    }
}

impl<R> Deref for RollingDice<R> {
    type Target = DiceState;

    #[inline]
    fn deref(&self) -> &DiceState {
        &self.state
    }
}

cfg_test! {
    /// Count the faces of the held dice in `state`, indexed like `DiceCounts`.
    fn held_counts(state: &DiceState, hold: HoldMask) -> DiceCounts {
        let mut counts = [0; NUM_FACES];
        for face in hold.held_faces(state) {
            counts[(face - 1) as usize] += 1;
        }
        counts
    }
}

///////////
// Tests //
///////////

#[cfg(test)]
mod test {
    use super::*;
    use claim::assert_lt;
    use proptest::{array::uniform5, prelude::*};

    fn niters(n: u32) -> ProptestConfig {
        ProptestConfig::with_cases(n)
    }

    #[test]
    fn test_values_from_counts() {
        let dice = DiceState::from_counts([2, 0, 0, 1, 1, 1]).unwrap();
        assert_eq!([1, 1, 4, 5, 6], dice.values());
        assert_eq!(17, dice.sum());

        let dice = DiceState::from_counts([0, 0, 0, 0, 0, 5]).unwrap();
        assert_eq!([6, 6, 6, 6, 6], dice.values());
    }

    #[test]
    fn test_values_are_sorted() {
        let dice = DiceState::from_values(&[6, 1, 6, 4, 4]).unwrap();
        assert_eq!([1, 4, 4, 6, 6], dice.values());
        assert_eq!([1, 0, 0, 2, 0, 2], dice.counts());
    }

    #[test]
    fn test_set_state_invalidates_values() {
        let mut dice = DiceState::from_values(&[1, 2, 3, 4, 5]).unwrap();
        assert_eq!([1, 2, 3, 4, 5], dice.values());

        dice.set_state(|counts| counts[2] = 5).unwrap();
        assert_eq!([3, 3, 3, 3, 3], dice.values());
        assert_eq!(5, dice.count(3));
        assert_eq!(0, dice.count(1));
    }

    #[test]
    fn test_invalid_states() {
        assert_eq!(
            Err(YatzyError::InvalidFace { face: 0 }),
            DiceState::from_values(&[0, 1, 2, 3, 4]),
        );
        assert_eq!(
            Err(YatzyError::InvalidFace { face: 7 }),
            DiceState::from_values(&[1, 2, 3, 4, 7]),
        );
        assert_eq!(
            Err(YatzyError::InvalidDiceCount { ndice: 3 }),
            DiceState::from_values(&[1, 2, 3]),
        );
        assert_eq!(
            Err(YatzyError::InvalidDiceCount { ndice: 6 }),
            DiceState::from_counts([1, 1, 1, 1, 1, 1]),
        );
        assert_eq!(
            Err(YatzyError::InvalidDiceCount { ndice: 0 }),
            DiceState::from_counts([0; 6]),
        );
    }

    #[test]
    fn test_failed_set_state_leaves_state_untouched() {
        let mut dice = DiceState::from_values(&[2, 3, 3, 5, 2]).unwrap();
        let before = dice.clone();

        let err = dice.set_state(|counts| counts[0] = 4).unwrap_err();
        assert_eq!(YatzyError::InvalidDiceCount { ndice: 4 }, err);
        assert_eq!(before, dice);
        assert_eq!([2, 2, 3, 3, 5], dice.values());

        let err = dice.set_values(&[1, 1, 1, 1, 9]).unwrap_err();
        assert_eq!(YatzyError::InvalidFace { face: 9 }, err);
        assert_eq!(before, dice);
    }

    #[test]
    #[should_panic]
    fn test_count_rejects_face_zero() {
        DiceState::default().count(0);
    }

    #[test]
    #[should_panic]
    fn test_count_rejects_face_seven() {
        DiceState::default().count(7);
    }

    #[test]
    fn test_dice_state_from_str() {
        assert_eq!(
            DiceState::from_values(&[2, 3, 4, 4, 5]).unwrap(),
            DiceState::from_str("[2,3,4,4,5]").unwrap(),
        );
        assert_eq!(
            DiceState::from_values(&[5, 3, 3, 2, 2]).unwrap(),
            DiceState::from_str("5 3\t3, 2 2").unwrap(),
        );
        assert!(DiceState::from_str("[1,2,3,4]").is_err());
        assert!(DiceState::from_str("[1,2,3,4,0]").is_err());
        assert!(DiceState::from_str("[1,2,x,4,5]").is_err());
    }

    #[test]
    fn test_hold_mask_display() {
        assert_eq!("HHHHH", HoldMask::all().to_string());
        assert_eq!(".....", HoldMask::none().to_string());
        assert_eq!(
            "..HH.",
            HoldMask::from([false, false, true, true, false]).to_string()
        );
    }

    #[test]
    fn test_rolling_dice_deterministic() {
        let mut dice1 = RollingDice::from_seed(0xd15c0);
        let mut dice2 = RollingDice::from_seed(0xd15c0);

        for _ in 0..100 {
            assert_eq!(dice1.state(), dice2.state());
            dice1.roll(None);
            dice2.roll(None);
        }
    }

    #[test]
    fn test_rolling_dice_state_changes() {
        let num_rolls = 10_000;
        let mut dice = RollingDice::from_seed(9901823);
        let mut num_repeats = 0;

        for _ in 0..num_rolls {
            let before = dice.state().clone();
            dice.roll(None);
            if &before == dice.state() {
                num_repeats += 1;
            }
        }

        // Pr[two consecutive throws of 5 dice land on the same multiset] is
        // ≈ 0.00635. allow plenty of slack on top of that.
        assert_lt!((num_repeats as f64) / (num_rolls as f64), 0.01);
    }

    proptest! {
        #![proptest_config(niters(1000))]

        #[test]
        fn test_prop_counts_match_values(faces in uniform5(1_u8..=6)) {
            let dice = DiceState::from_values(&faces).unwrap();
            for face in 1..=6 {
                let expected = faces.iter().filter(|&&f| f == face).count();
                prop_assert_eq!(expected, dice.count(face) as usize);
            }
            prop_assert!(dice.invariant());
        }

        #[test]
        fn test_prop_counts_round_trip(dice in any::<DiceState>()) {
            prop_assert_eq!(&dice, &DiceState::from_counts(dice.counts()).unwrap());
            prop_assert_eq!(&dice, &DiceState::from_values(&dice.values()).unwrap());
        }
    }

    #[test]
    fn test_roll_honours_hold_mask() {
        proptest!(niters(100), |(mask in uniform5(any::<bool>()), seed in any::<u64>())| {
            let hold = HoldMask::from(mask);
            let mut dice = RollingDice::from_seed(seed);

            for _ in 0..100 {
                let held = held_counts(dice.state(), hold);
                prop_assert_eq!(hold.num_held(), held.iter().map(|&c| c as usize).sum::<usize>());

                dice.roll(Some(&hold));

                // the held dice can't disappear after the roll
                for (face_idx, &nheld) in held.iter().enumerate() {
                    prop_assert!(dice.counts()[face_idx] >= nheld);
                }
            }
        });
    }

    #[test]
    fn test_roll_holding_everything_is_a_no_op() {
        let mut dice = RollingDice::from_seed(42);
        let before = dice.state().clone();
        for _ in 0..10 {
            dice.roll(Some(&HoldMask::all()));
            assert_eq!(&before, dice.state());
        }
    }
}
