use crate::{
    compose::all_dice_states,
    game::{Game, ScoreSheet},
    num_permutations,
    score::Category,
    YatzyError, NUM_CATEGORIES, NUM_DICE, NUM_FACES, UPPER_BONUS,
};
use log::info;
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

////////////////
// Simulation //
////////////////

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: Category,
    pub mean: f64,
    pub std_dev: f64,
    /// The fraction of games where this category was scratched.
    pub zero_rate: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub seed: u64,
    pub num_games: usize,
    /// One entry per category, in canonical order.
    pub categories: Vec<CategoryStats>,
    pub total_mean: f64,
    pub total_std_dev: f64,
    pub total_min: u16,
    pub total_max: u16,
    /// The fraction of games that earned the upper section bonus.
    pub bonus_rate: f64,
}

/// Play `num_games` independent forced-rule games in parallel. Game `i` is
/// seeded with `seed + i`, so the summary only depends on `seed` and
/// `num_games`, never on the thread count.
///
/// With zero games every mean and rate is `NaN`. The standard deviations need
/// at least two games and are `NaN` otherwise.
pub fn simulate(seed: u64, num_games: usize) -> Result<SimulationSummary, YatzyError> {
    info!("simulating {} games from seed {}", num_games, seed);

    let sheets = time!("simulate", {
        (0..num_games)
            .into_par_iter()
            .map(|idx| {
                let mut game = Game::new(seed.wrapping_add(idx as u64));
                game.play()?;
                Ok(game.scores().clone())
            })
            .collect::<Result<Vec<ScoreSheet>, YatzyError>>()?
    });

    let summary = summarize(seed, &sheets);
    info!(
        "simulated {} games: mean total {:.2}, bonus rate {:.3}",
        num_games, summary.total_mean, summary.bonus_rate,
    );
    Ok(summary)
}

fn summarize(seed: u64, sheets: &[ScoreSheet]) -> SimulationSummary {
    let num_games = sheets.len();

    let categories = Category::all()
        .iter()
        .map(|&category| {
            let scores = sheets
                .iter()
                .map(|sheet| sheet.get(category).unwrap_or(0) as f64)
                .collect::<Vec<_>>();
            let num_zeros = scores.iter().filter(|&&score| score == 0.0).count();

            CategoryStats {
                category,
                mean: Statistics::mean(&scores),
                std_dev: Statistics::std_dev(&scores),
                zero_rate: num_zeros as f64 / num_games as f64,
            }
        })
        .collect::<Vec<_>>();

    let totals = sheets.iter().map(ScoreSheet::total).collect::<Vec<_>>();
    let totals_f64 = totals.iter().map(|&total| total as f64).collect::<Vec<_>>();
    let num_bonus = sheets
        .iter()
        .filter(|sheet| sheet.bonus() == UPPER_BONUS)
        .count();

    SimulationSummary {
        seed,
        num_games,
        categories,
        total_mean: Statistics::mean(&totals_f64),
        total_std_dev: Statistics::std_dev(&totals_f64),
        total_min: Iterator::min(totals.iter().copied()).unwrap_or(0),
        total_max: Iterator::max(totals.iter().copied()).unwrap_or(0),
        bonus_rate: num_bonus as f64 / num_games as f64,
    }
}

///////////////////////
// Score frequencies //
///////////////////////

/// Rows of [`score_frequencies`]: every non-zero score a category can take.
pub const NUM_SCORE_ROWS: usize = 31;

/// The score for each row of [`score_frequencies`]: 1..=30, then 50.
pub fn score_for_row(row: usize) -> u16 {
    debug_assert!(row < NUM_SCORE_ROWS);
    if row < 30 {
        row as u16 + 1
    } else {
        50
    }
}

fn row_for_score(score: u16) -> Option<usize> {
    match score {
        1..=30 => Some(score as usize - 1),
        50 => Some(30),
        _ => None,
    }
}

/// `table[[row, category]]` is the number of ordered throws of five dice (out
/// of 6^5 = 7776) that score [`score_for_row(row)`](score_for_row) in
/// `category`. Zero scores aren't counted.
pub fn score_frequencies() -> Array2<u32> {
    let mut table = Array2::<u32>::zeros((NUM_SCORE_ROWS, NUM_CATEGORIES));

    let mut total_weight = 0;
    for state in all_dice_states() {
        let weight = num_permutations(&state.counts());
        total_weight += weight;
        for &category in Category::all() {
            if let Some(row) = row_for_score(category.score(&state)) {
                table[[row, category.index()]] += weight;
            }
        }
    }
    debug_assert_eq!(total_weight, (NUM_FACES as u32).pow(NUM_DICE as u32));

    table
}

///////////
// Tests //
///////////

#[cfg(test)]
mod test {
    use super::*;
    use crate::DEFAULT_SEED;
    use approx::assert_relative_eq;
    use claim::{assert_ge, assert_le};
    use ndarray::Axis;

    #[test]
    fn test_score_rows() {
        for row in 0..NUM_SCORE_ROWS {
            assert_eq!(Some(row), row_for_score(score_for_row(row)));
        }
        assert_eq!(None, row_for_score(0));
        assert_eq!(None, row_for_score(31));
    }

    #[test]
    fn test_score_frequencies() {
        let table = score_frequencies();
        assert_eq!((NUM_SCORE_ROWS, NUM_CATEGORIES), table.dim());

        let col_sums = table.sum_axis(Axis(0));
        let col = |category: Category| category.index();

        // chance always scores
        assert_eq!(7776, col_sums[col(Category::Chance)]);
        // everything but the throws without a single 1
        assert_eq!(7776 - 3125, col_sums[col(Category::Ones)]);
        // 30 distinct houses, 5! / (2! 3!) orderings each
        assert_eq!(300, col_sums[col(Category::House)]);

        assert_eq!(6, table[[30, col(Category::Yatzy)]]);
        assert_eq!(6, col_sums[col(Category::Yatzy)]);
        assert_eq!(120, table[[14, col(Category::SmallStraight)]]);
        assert_eq!(120, table[[19, col(Category::LargeStraight)]]);

        // five ones, or a single way to roll a chance of 5
        assert_eq!(1, table[[4, col(Category::Chance)]]);
        assert_eq!(1, table[[29, col(Category::Chance)]]);

        for &count in col_sums.iter() {
            assert_le!(count, 7776);
        }
    }

    #[test]
    fn test_simulate_deterministic() {
        let summary1 = simulate(DEFAULT_SEED, 64).unwrap();
        let summary2 = simulate(DEFAULT_SEED, 64).unwrap();
        assert_eq!(summary1, summary2);

        // game i only depends on seed + i
        let mut game = Game::new(DEFAULT_SEED + 3);
        game.play().unwrap();
        let single = simulate(DEFAULT_SEED + 3, 1).unwrap();
        assert_eq!(game.total(), single.total_min);
        assert_eq!(game.total(), single.total_max);
    }

    #[test]
    fn test_simulate_single_game_spread() {
        let summary = simulate(DEFAULT_SEED, 1).unwrap();
        assert_eq!(summary.total_min as f64, summary.total_mean);
        assert!(summary.total_std_dev.is_nan());
        for stats in &summary.categories {
            assert!(stats.std_dev.is_nan());
            assert!(!stats.mean.is_nan());
        }

        let summary = simulate(DEFAULT_SEED, 2).unwrap();
        assert!(summary.total_std_dev.is_finite());
    }

    #[test]
    fn test_simulate_summary() {
        let summary = simulate(DEFAULT_SEED, 200).unwrap();
        assert_eq!(200, summary.num_games);
        assert_eq!(NUM_CATEGORIES, summary.categories.len());

        for (stats, &category) in summary.categories.iter().zip(Category::all()) {
            assert_eq!(category, stats.category);
            assert_ge!(stats.mean, 0.0);
            assert_le!(stats.mean, 50.0);
            assert_ge!(stats.zero_rate, 0.0);
            assert_le!(stats.zero_rate, 1.0);
        }
        assert_ge!(summary.bonus_rate, 0.0);
        assert_le!(summary.bonus_rate, 1.0);
        assert_le!(summary.total_min, summary.total_max);

        // the mean total is the sum of the category means plus the bonus
        let category_means: f64 = summary.categories.iter().map(|stats| stats.mean).sum();
        assert_relative_eq!(
            category_means + summary.bonus_rate * UPPER_BONUS as f64,
            summary.total_mean,
            epsilon = 1e-9,
        );
    }
}
