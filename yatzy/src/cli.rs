use crate::{
    dice::DiceState,
    eval::PositionEvaluator,
    game::{Game, RoundRecord, ThrowRecord},
    score::Category,
    stats::{score_for_row, score_frequencies, simulate, SimulationSummary},
    DEFAULT_NUM_GAMES, DEFAULT_SEED, NUM_CATEGORIES,
};
use itertools::Itertools;
use ndarray::Array2;
use std::{fmt, iter, str::FromStr};
use tabular::{row, Row, Table};
use trice::Instant;

///////////////////////////
// String parser helpers //
///////////////////////////

fn parse_req<T>(label: &'static str, s: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    T::from_str(s).map_err(|err| format!("invalid {label}: {err}"))
}

fn parse_opt<T>(label: &'static str, opt_s: Option<&str>) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    opt_s
        .map(T::from_str)
        .transpose()
        .map_err(|err| format!("invalid {label}: {err}"))
}

//////////////////////
// CLI Args Wrapper //
//////////////////////

pub struct Args(pico_args::Arguments);

impl Args {
    pub fn new(inner: pico_args::Arguments) -> Self {
        Self(inner)
    }

    fn subcommand(&mut self) -> Result<Option<String>, String> {
        self.0.subcommand().map_err(|err| err.to_string())
    }

    fn opt_value(&mut self, keys: impl Into<pico_args::Keys>) -> Result<Option<String>, String> {
        self.0
            .opt_value_from_fn(keys, |s| Result::<_, pico_args::Error>::Ok(s.to_owned()))
            .map_err(|err| err.to_string())
    }

    fn free_value(&mut self) -> Result<String, String> {
        self.0
            .free_from_fn(|s| Result::<_, pico_args::Error>::Ok(s.to_owned()))
            .map_err(|err| err.to_string())
    }

    fn expect_finished(self) -> Result<(), String> {
        let remaining = self.0.finish();
        if !remaining.is_empty() {
            Err(format!("unexpected arguments left: '{:?}'", remaining))
        } else {
            Ok(())
        }
    }

    fn maybe_help(&mut self, usage: &str) {
        if self.0.contains(["-h", "--help"]) {
            print!("{}", usage);
            std::process::exit(0);
        }
    }
}

/////////////
// Metrics //
/////////////

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Metrics(pub Vec<(String, String)>);

impl Metrics {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, label: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.push((label.into(), value.into()));
        self
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new("{:>}  {:<}");

        for (label, value) in &self.0 {
            table.add_row(row!(label, value));
        }

        table
    }
}

fn row_from_cells(cells: impl Iterator<Item = String>) -> Row {
    let mut row = Row::new();
    for cell in cells {
        row.add_cell(cell);
    }
    row
}

///////////////////
// Command trait //
///////////////////

pub trait Command: Sized {
    const USAGE: &'static str;

    type Output: fmt::Display;

    fn try_from_cli_args(args: Args) -> Result<Self, String>;
    fn run(self) -> Result<Self::Output, String>;
}

///////////////////////////
// ListCategoriesCommand //
///////////////////////////

#[derive(Clone, Debug)]
pub struct ListCategoriesCommand;

impl Command for ListCategoriesCommand {
    const USAGE: &'static str = "\
yatzy list-categories - list the scoring categories in score sheet order

USAGE:
    yatzy list-categories
";

    type Output = Table;

    fn try_from_cli_args(mut args: Args) -> Result<Self, String> {
        args.maybe_help(Self::USAGE);

        args.expect_finished()?;
        Ok(Self)
    }

    fn run(self) -> Result<Self::Output, String> {
        let mut table = Table::new("  {:>}  {:<}  {:<}");

        for &category in Category::all() {
            let section = if category.is_upper() { "upper" } else { "lower" };
            table.add_row(row!(category.index(), category, section));
        }

        Ok(table)
    }
}

/////////////////
// PlayCommand //
/////////////////

#[derive(Clone, Debug)]
pub struct PlayCommand {
    seed: u64,
}

impl PlayCommand {
    pub fn try_from_str_args(seed: Option<&str>) -> Result<Self, String> {
        Ok(Self {
            seed: parse_opt("seed", seed)?.unwrap_or(DEFAULT_SEED),
        })
    }
}

impl Command for PlayCommand {
    const USAGE: &'static str = "\
yatzy play - play one game, filling the score sheet top to bottom

USAGE:
    yatzy play [option ...]

EXAMPLES:
    yatzy play
    yatzy play --seed 42

OPTIONS:
    · --seed / -s n (default: 19283)
      Seed for the dice.
";

    type Output = PlayCommandOutput;

    fn try_from_cli_args(mut args: Args) -> Result<Self, String> {
        args.maybe_help(Self::USAGE);

        let seed = args.opt_value(["-s", "--seed"])?;
        args.expect_finished()?;

        Self::try_from_str_args(seed.as_deref())
    }

    fn run(self) -> Result<Self::Output, String> {
        let mut game = Game::new(self.seed);

        let start_time = Instant::now();
        game.play().map_err(|err| err.to_string())?;
        let play_duration = start_time.elapsed();

        let mut metrics = Metrics::new();
        metrics.push("seed", self.seed.to_string());
        metrics.push("play duration", format!("{:.2?}", play_duration));

        Ok(PlayCommandOutput {
            history: game.history().to_vec(),
            sheet: game
                .scores()
                .iter()
                .map(|(category, score)| (category, score.unwrap_or(0)))
                .collect(),
            upper_sum: game.scores().upper_sum(),
            bonus: game.bonus(),
            total: game.total(),
            metrics,
        })
    }
}

fn throw_cell(throw: &ThrowRecord) -> String {
    match throw.hold {
        Some(hold) => format!("{} {}", throw.dice, hold),
        None => throw.dice.to_string(),
    }
}

pub struct PlayCommandOutput {
    history: Vec<RoundRecord>,
    sheet: Vec<(Category, u16)>,
    upper_sum: u16,
    bonus: u16,
    total: u16,
    metrics: Metrics,
}

impl fmt::Display for PlayCommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rounds = Table::new("{:>}  {:<}  {:<}  {:<}  {:<}  {:>}").with_row(row!(
            "round", "category", "throw 1", "throw 2", "throw 3", "score"
        ));

        for record in &self.history {
            let mut cells = vec![(record.round + 1).to_string(), record.category.to_string()];
            cells.extend(record.throws.iter().map(throw_cell));
            cells.push(record.score.to_string());
            rounds.add_row(row_from_cells(cells.into_iter()));
        }

        let mut sheet = Table::new("{:>}  {:>}");
        for (category, score) in &self.sheet {
            sheet.add_row(row!(category, score));
        }
        sheet.add_row(row!("upper sum", self.upper_sum));
        sheet.add_row(row!("bonus", self.bonus));
        sheet.add_row(row!("total", self.total));

        write!(f, "\n{}\n{}\n{}", rounds, sheet, self.metrics.to_table())
    }
}

/////////////////////
// SimulateCommand //
/////////////////////

#[derive(Clone, Debug)]
pub struct SimulateCommand {
    seed: u64,
    num_games: usize,
}

impl SimulateCommand {
    pub fn try_from_str_args(seed: Option<&str>, num_games: Option<&str>) -> Result<Self, String> {
        let cmd = Self {
            seed: parse_opt("seed", seed)?.unwrap_or(DEFAULT_SEED),
            num_games: parse_opt("number of games", num_games)?.unwrap_or(DEFAULT_NUM_GAMES),
        };

        if cmd.num_games < 2 {
            return Err("need at least 2 games to estimate the spread".to_string());
        }

        Ok(cmd)
    }
}

impl Command for SimulateCommand {
    const USAGE: &'static str = "\
yatzy simulate - play many independent games and summarize the scores

USAGE:
    yatzy simulate [option ...]

EXAMPLES:
    yatzy simulate
    yatzy simulate -s 7 -n 100000

OPTIONS:
    · --seed / -s n (default: 19283)
      Game i is seeded with n + i.

    · --games / -n count (default: 10000)
      The number of games to play, at least 2.
";

    type Output = SimulateCommandOutput;

    fn try_from_cli_args(mut args: Args) -> Result<Self, String> {
        args.maybe_help(Self::USAGE);

        let seed = args.opt_value(["-s", "--seed"])?;
        let num_games = args.opt_value(["-n", "--games"])?;
        args.expect_finished()?;

        Self::try_from_str_args(seed.as_deref(), num_games.as_deref())
    }

    fn run(self) -> Result<Self::Output, String> {
        let start_time = Instant::now();
        let summary = simulate(self.seed, self.num_games).map_err(|err| err.to_string())?;
        let duration = start_time.elapsed();

        let mut metrics = Metrics::new();
        metrics.push("seed", self.seed.to_string());
        metrics.push("games", self.num_games.to_string());
        metrics.push(
            "total",
            format!(
                "{:.2} ± {:.2} (min: {}, max: {})",
                summary.total_mean, summary.total_std_dev, summary.total_min, summary.total_max,
            ),
        );
        metrics.push("bonus rate", format!("{:0.3}", summary.bonus_rate));
        metrics.push("simulation duration", format!("{:.2?}", duration));
        metrics.push(
            "games/sec",
            format!("{:.0}", self.num_games as f64 / duration.as_secs_f64()),
        );

        Ok(SimulateCommandOutput { summary, metrics })
    }
}

pub struct SimulateCommandOutput {
    summary: SimulationSummary,
    metrics: Metrics,
}

impl fmt::Display for SimulateCommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut table = Table::new("{:>}  {:>}  {:>}  {:>}")
            .with_row(row!("category", "mean", "std dev", "zero rate"));

        for stats in &self.summary.categories {
            table.add_row(row!(
                stats.category,
                format!("{:.2}", stats.mean),
                format!("{:.2}", stats.std_dev),
                format!("{:.3}", stats.zero_rate),
            ));
        }

        write!(f, "\n{}\n{}", table, self.metrics.to_table())
    }
}

/////////////////////
// EvaluateCommand //
/////////////////////

#[derive(Clone, Debug)]
pub struct EvaluateCommand {
    dice: DiceState,
}

impl EvaluateCommand {
    pub fn try_from_str_args(dice: &str) -> Result<Self, String> {
        Ok(Self {
            dice: parse_req("dice", dice)?,
        })
    }
}

impl Command for EvaluateCommand {
    const USAGE: &'static str = "\
yatzy evaluate - show the greedy target for every category

USAGE:
    yatzy evaluate <dice>

EXAMPLES:
    yatzy evaluate [2,3,4,4,5]
    yatzy evaluate 6,6,1,2,6
";

    type Output = EvaluateCommandOutput;

    fn try_from_cli_args(mut args: Args) -> Result<Self, String> {
        args.maybe_help(Self::USAGE);

        let dice = args.free_value()?;
        args.expect_finished()?;

        Self::try_from_str_args(&dice)
    }

    fn run(self) -> Result<Self::Output, String> {
        let mut rows = Vec::with_capacity(NUM_CATEGORIES);

        for mut evaluator in PositionEvaluator::all() {
            let score = evaluator.calculate_score(&self.dice);
            let evaluation = evaluator
                .evaluate_position(&self.dice)
                .map_err(|err| err.to_string())?;

            rows.push(vec![
                evaluation.category.to_string(),
                evaluation.target.to_string(),
                evaluation.dice_to_hold.to_string(),
                format!(
                    "[{}]",
                    evaluation.dice_to_hold.held_faces(&self.dice).join(", ")
                ),
                evaluation.distance.to_string(),
                evaluation.potential_score.to_string(),
                score.to_string(),
            ]);
        }

        Ok(EvaluateCommandOutput {
            dice: self.dice,
            rows,
        })
    }
}

pub struct EvaluateCommandOutput {
    dice: DiceState,
    rows: Vec<Vec<String>>,
}

impl fmt::Display for EvaluateCommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut table = Table::new("{:>}  {:<}  {:<}  {:<}  {:>}  {:>}  {:>}").with_row(row!(
            "category",
            "target",
            "hold",
            "held dice",
            "distance",
            "potential",
            "score"
        ));

        for cells in &self.rows {
            table.add_row(row_from_cells(cells.iter().cloned()));
        }

        write!(f, "\ndice: {}\n\n{}", self.dice, table)
    }
}

//////////////////////
// ScoreFreqCommand //
//////////////////////

#[derive(Clone, Debug)]
pub struct ScoreFreqCommand;

impl Command for ScoreFreqCommand {
    const USAGE: &'static str = "\
yatzy score-freq - count the throws of five dice that reach each score

USAGE:
    yatzy score-freq

Each entry is the number of the 6^5 = 7776 ordered throws that score exactly
that much in that category. Zero scores are left out.
";

    type Output = ScoreFreqCommandOutput;

    fn try_from_cli_args(mut args: Args) -> Result<Self, String> {
        args.maybe_help(Self::USAGE);

        args.expect_finished()?;
        Ok(Self)
    }

    fn run(self) -> Result<Self::Output, String> {
        Ok(ScoreFreqCommandOutput {
            table: time!("score frequencies", score_frequencies()),
        })
    }
}

pub struct ScoreFreqCommandOutput {
    table: Array2<u32>,
}

impl fmt::Display for ScoreFreqCommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spec = iter::repeat("{:>}").take(NUM_CATEGORIES + 1).join(" ");
        let header = iter::once("score".to_string())
            .chain(Category::all().iter().map(Category::to_string));
        let mut table = Table::new(&spec).with_row(row_from_cells(header));

        for (row, counts) in self.table.outer_iter().enumerate() {
            let cells = iter::once(score_for_row(row).to_string())
                .chain(counts.iter().map(|count| count.to_string()));
            table.add_row(row_from_cells(cells));
        }

        write!(f, "\n{}", table)
    }
}

/////////////////
// BaseCommand //
/////////////////

#[derive(Debug)]
pub enum BaseCommand {
    ListCategories(ListCategoriesCommand),
    Play(PlayCommand),
    Simulate(SimulateCommand),
    Evaluate(EvaluateCommand),
    ScoreFreq(ScoreFreqCommand),
}

impl Command for BaseCommand {
    const USAGE: &'static str = "\
yatzy - play and simulate Yatzy with a greedy re-roll strategy

USAGE:
    yatzy [option ...] <subcommand>

SUBCOMMANDS:
    · yatzy list-categories - list the scoring categories in score sheet order
    · yatzy play - play one game, filling the score sheet top to bottom
    · yatzy simulate - play many independent games and summarize the scores
    · yatzy evaluate - show the greedy target for every category
    · yatzy score-freq - count the throws of five dice that reach each score

Set RUST_LOG=debug to log every throw.
";

    type Output = String;

    fn try_from_cli_args(mut args: Args) -> Result<Self, String> {
        let maybe_subcommand = args.subcommand()?;

        match maybe_subcommand.as_deref() {
            Some("list-categories") => Ok(Self::ListCategories(
                ListCategoriesCommand::try_from_cli_args(args)?,
            )),
            Some("play") => Ok(Self::Play(PlayCommand::try_from_cli_args(args)?)),
            Some("simulate") => Ok(Self::Simulate(SimulateCommand::try_from_cli_args(args)?)),
            Some("evaluate") => Ok(Self::Evaluate(EvaluateCommand::try_from_cli_args(args)?)),
            Some("score-freq") => Ok(Self::ScoreFreq(ScoreFreqCommand::try_from_cli_args(args)?)),
            Some(command) => Err(format!("'{}' is not a recognized command", command)),
            None => {
                args.maybe_help(Self::USAGE);
                Err("no subcommand specified".to_string())
            }
        }
    }

    fn run(self) -> Result<String, String> {
        match self {
            Self::ListCategories(cmd) => cmd.run().map(|out| out.to_string()),
            Self::Play(cmd) => cmd.run().map(|out| out.to_string()),
            Self::Simulate(cmd) => cmd.run().map(|out| out.to_string()),
            Self::Evaluate(cmd) => cmd.run().map(|out| out.to_string()),
            Self::ScoreFreq(cmd) => cmd.run().map(|out| out.to_string()),
        }
    }
}

///////////
// Tests //
///////////
