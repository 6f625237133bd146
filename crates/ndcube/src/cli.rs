use std::io::{Read, Write};

use eyre::{Result, WrapErr, bail};
use ndcube_log::{DEFAULT_LENGTH, DEFAULT_PUZZLE, LogFile};
use ndcube_puzzle::*;
use serde::Serialize;

/// Build, fingerprint, scramble, and replay 3D and 4D twisty puzzles
///
/// Set `RUST_LOG=info` to see build progress.
#[derive(Debug, clap::Parser)]
#[command(version)]
pub(crate) struct Args {
    #[command(subcommand)]
    pub subcommand: Subcommand,

    /// Accept puzzles that are not 4-dimensional.
    #[arg(long, global = true)]
    pub allow_any_dim: bool,
    /// Compute grips on a single thread.
    #[arg(long, global = true)]
    pub single_threaded: bool,
}

/// Puzzle to build.
#[derive(clap::Args, Debug)]
pub(crate) struct PuzzleArgs {
    /// Schläfli product, such as `{4,3,3}` or `{5}x{4}`.
    #[arg(default_value = DEFAULT_PUZZLE)]
    pub schlafli: String,
    /// Edge length, such as `3` or `3(2.5)`.
    #[arg(default_value_t = DEFAULT_LENGTH.to_string())]
    pub length: String,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum Subcommand {
    /// Print a summary of a puzzle as JSON.
    Info {
        #[command(flatten)]
        puzzle: PuzzleArgs,
    },
    /// Print the topological fingerprint of a puzzle and its digest.
    Fingerprint {
        #[command(flatten)]
        puzzle: PuzzleArgs,
    },
    /// Scramble a puzzle and write a log file.
    Scramble {
        #[command(flatten)]
        puzzle: PuzzleArgs,

        /// Number of random twists. By default, the puzzle is fully
        /// scrambled.
        #[arg(short = 'n', long)]
        twists: Option<usize>,
        /// Seed string for a reproducible scramble.
        #[arg(long)]
        seed: Option<String>,
        /// Log file to write, use '-' for stdout.
        #[arg(short, long, value_parser, default_value = "-")]
        output: clio::Output,
    },
    /// Replay a log file and print its state as JSON.
    Replay {
        /// Log file to replay, use '-' for stdin.
        #[arg(value_parser)]
        log_file: clio::Input,
    },
}

/// Result of replaying a log file.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
struct ReplayReport {
    prescription: String,
    scramble_state: String,
    moves: usize,
    twists: usize,
    solved: bool,
}

pub(crate) fn exec(args: Args) -> Result<()> {
    let build = |prescription: &Prescription| {
        build_puzzle(prescription, args.allow_any_dim, !args.single_threaded)
    };

    match args.subcommand {
        Subcommand::Info { puzzle } => {
            let puzzle = build(&puzzle.prescription()?)?;
            write_json_output(&PuzzleSummary::from(&puzzle))
        }

        Subcommand::Fingerprint { puzzle } => {
            let puzzle = build(&puzzle.prescription()?)?;
            let fingerprint = puzzle.fingerprint();
            println!("{}", fingerprint.text());
            match fingerprint.digest() {
                Some(digest) => println!("digest: {digest}"),
                None => println!("digest: none"),
            }
            Ok(())
        }

        Subcommand::Scramble {
            puzzle,
            twists,
            seed,
            mut output,
        } => {
            let puzzle = build(&puzzle.prescription()?)?;
            let seed = seed.unwrap_or_else(|| rand::random::<u64>().to_string());
            log::info!("scrambling with seed {seed:?}");
            let mut rng = rng_from_seed(&seed);

            let mut state = PuzzleState::new(&puzzle);
            let scramble = match twists {
                Some(n) => state.scramble(&puzzle, &mut rng, n),
                None => state.scramble_fully(&puzzle, &mut rng),
            }
            .wrap_err("error scrambling puzzle")?;

            let log_file = LogFile::scrambled(&puzzle, &scramble, twists.is_none());
            write!(output, "{log_file}")
                .and_then(|()| output.flush())
                .wrap_err("error writing log file")?;
            log::info!("wrote log file with {} scramble twists", scramble.len());
            Ok(())
        }

        Subcommand::Replay { mut log_file } => {
            let mut buffer = String::new();
            log_file
                .read_to_string(&mut buffer)
                .wrap_err("error reading log file")?;
            let mut log_file: LogFile = buffer.parse().wrap_err("error parsing log file")?;

            let puzzle = build(&log_file.prescription)?;
            let state = log_file
                .replay(&puzzle)
                .wrap_err("error replaying log file")?;

            write_json_output(&ReplayReport {
                prescription: log_file.prescription.to_string(),
                scramble_state: format!("{:?}", log_file.scramble_state),
                moves: log_file.history.count_moves(false),
                twists: log_file.twist_count(),
                solved: state.is_solved(&puzzle),
            })
        }
    }
}

impl PuzzleArgs {
    fn prescription(&self) -> Result<Prescription> {
        Prescription::new(&self.schlafli, &self.length).wrap_err("bad puzzle")
    }
}

fn build_puzzle(
    prescription: &Prescription,
    allow_any_dim: bool,
    parallel_grips: bool,
) -> Result<PuzzleDescription> {
    let options = BuildOptions { parallel_grips };
    let outcome = PuzzleDescription::build_with(prescription, &options, &mut LogProgress::new())
        .wrap_err_with(|| format!("error building {prescription}"))?;
    let puzzle = match outcome {
        BuildOutcome::Built(puzzle) => puzzle,
        BuildOutcome::Cancelled => bail!("building {prescription} was cancelled"),
    };
    if puzzle.ndim() != 4 && !allow_any_dim {
        bail!("{}", invention_rejection(&puzzle));
    }
    Ok(puzzle)
}

/// Returns the message explaining that a puzzle is rejected because it is not
/// 4-dimensional.
fn invention_rejection(puzzle: &PuzzleDescription) -> String {
    let cubies = puzzle.num_cubies();
    format!(
        "you have invented a new puzzle! {} is {}-dimensional and has \
         {} faces, {} stickers, {} cubie{}, and {:?} elements of each rank. \
         Only 4-dimensional puzzles are accepted without --allow-any-dim.",
        puzzle.prescription(),
        puzzle.ndim(),
        puzzle.num_faces(),
        puzzle.num_stickers(),
        cubies,
        if cubies == 1 { "" } else { "s" },
        puzzle.original_element_counts(),
    )
}

fn write_json_output<T: Serialize>(value: &T) -> Result<()> {
    serde_json::to_writer_pretty(std::io::stdout(), value)
        .wrap_err("error serializing data and writing to stdout")?;
    println!();
    Ok(())
}
