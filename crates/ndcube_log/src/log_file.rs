//! Log file format: a saved puzzle session.
//!
//! ```text
//! MagicCube4D 3 2 0 {4,3,3} 3
//! 1 0 0 0
//! 0 1 0 0
//! 0 0 1 0
//! 0 0 0 1
//! *
//! 12,1,1 m| 40,-1,2.
//! ```
//!
//! The first line holds the magic number, file version, scramble state, twist
//! count, Schläfli product, and edge length. The next four lines are the rows
//! of the 4D view matrix. The history follows the `*` line.

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use ndcube_math::{Float, Matrix};
use ndcube_puzzle::{Prescription, PuzzleDescription, PuzzleState, Twist};

use crate::{
    History, HistoryConfig, LOG_FILE_VERSION, LogFileError, MAGIC_NUMBER, MARK_SCRAMBLE_BOUNDARY,
};

const VIEW_MATRIX_NDIM: u8 = 4;

/// How the puzzle in a log file was scrambled, and whether it has been solved
/// since.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ScrambleState {
    /// Not scrambled, or scrambled by hand.
    #[default]
    None = 0,
    /// Scrambled with a few random twists.
    Partial = 1,
    /// Scrambled with enough random twists to fully mix the puzzle.
    Full = 2,
    /// Scrambled and then solved.
    Solved = 3,
}
impl ScrambleState {
    fn from_index(i: u8) -> Option<Self> {
        match i {
            0 => Some(Self::None),
            1 => Some(Self::Partial),
            2 => Some(Self::Full),
            3 => Some(Self::Solved),
            _ => None,
        }
    }

    /// Returns whether the puzzle was scrambled by the program and not yet
    /// solved.
    pub fn is_scrambled(self) -> bool {
        matches!(self, Self::Partial | Self::Full)
    }
}
impl fmt::Display for ScrambleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// Contents of a log file.
#[derive(Debug, Clone, PartialEq)]
pub struct LogFile {
    /// Puzzle that the history applies to.
    pub prescription: Prescription,
    /// How the puzzle was scrambled.
    pub scramble_state: ScrambleState,
    /// 4x4 rotation applied to the puzzle for viewing.
    pub view_matrix: Matrix,
    /// Every move made on the puzzle.
    pub history: History,
}

impl LogFile {
    /// Constructs a log file with an identity view matrix.
    pub fn new(
        prescription: Prescription,
        scramble_state: ScrambleState,
        history: History,
    ) -> Self {
        Self {
            prescription,
            scramble_state,
            view_matrix: Matrix::ident(VIEW_MATRIX_NDIM),
            history,
        }
    }

    /// Constructs a log file for a puzzle that has just been scrambled with
    /// `twists`. The history ends with a scramble boundary mark.
    pub fn scrambled(puzzle: &PuzzleDescription, twists: &[Twist], fully: bool) -> Self {
        let prescription = puzzle.prescription().clone();
        let mut history = History::new(prescription.int_length, HistoryConfig::default());
        history.append_all(twists.iter().copied());
        history.mark(MARK_SCRAMBLE_BOUNDARY);
        let scramble_state = match (twists.is_empty(), fully) {
            (true, _) => ScrambleState::None,
            (false, false) => ScrambleState::Partial,
            (false, true) => ScrambleState::Full,
        };
        Self::new(prescription, scramble_state, history)
    }

    /// Returns the number of twists made since the scramble, not counting
    /// whole-puzzle rotations.
    pub fn twist_count(&self) -> usize {
        self.history.count_twists()
    }

    /// Applies every move before the history cursor to a solved puzzle, and
    /// returns the resulting state.
    ///
    /// If the puzzle was scrambled and the result is solved, the scramble
    /// state becomes [`ScrambleState::Solved`].
    pub fn replay(&mut self, puzzle: &PuzzleDescription) -> Result<PuzzleState, LogFileError> {
        let mut state = PuzzleState::new(puzzle);
        for twist in self.history.moves() {
            state.twist(puzzle, twist)?;
        }
        if self.scramble_state.is_scrambled() && state.is_solved(puzzle) {
            log::info!("log file puzzle is solved");
            self.scramble_state = ScrambleState::Solved;
        }
        Ok(state)
    }
}

impl fmt::Display for LogFile {
    /// Writes the log file, including moves after the history cursor so that
    /// they can still be redone after reading it back.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Neither field may contain spaces.
        let schlafli = self.prescription.schlafli.canonical();
        let length = self.prescription.length_string.split_whitespace().join("");
        writeln!(
            f,
            "{MAGIC_NUMBER} {LOG_FILE_VERSION} {} {} {schlafli} {length}",
            self.scramble_state,
            self.history.count_twists(),
        )?;
        for row in 0..VIEW_MATRIX_NDIM {
            let values = (0..VIEW_MATRIX_NDIM).map(|col| self.view_matrix.get(col, row));
            writeln!(f, "{}", values.format(" "))?;
        }
        writeln!(f, "*")?;
        writeln!(f, "{}", self.history)
    }
}

impl FromStr for LogFile {
    type Err = LogFileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rest = s.trim_start();

        let first_line = next_line(&mut rest);
        if first_line.is_empty() {
            return Err(LogFileError::Empty);
        }
        let fields = first_line.split_whitespace().collect_vec();
        let &[
            magic,
            version,
            scramble_state,
            twist_count,
            schlafli,
            length,
        ] = fields.as_slice()
        else {
            return Err(LogFileError::WrongFieldCount(fields.len()));
        };

        if magic != MAGIC_NUMBER {
            return Err(LogFileError::BadMagic {
                expected: MAGIC_NUMBER,
                actual: magic.to_owned(),
            });
        }
        if version.parse::<u32>().ok() != Some(LOG_FILE_VERSION) {
            return Err(LogFileError::UnsupportedVersion(version.to_owned()));
        }
        let scramble_state = scramble_state
            .parse()
            .ok()
            .and_then(ScrambleState::from_index)
            .ok_or_else(|| LogFileError::BadScrambleState(scramble_state.to_owned()))?;
        // The twist count is recomputed from the history.
        twist_count
            .parse::<usize>()
            .map_err(|_| LogFileError::BadTwistCount(twist_count.to_owned()))?;
        let prescription = Prescription::new(schlafli, length)?;

        let mut view_matrix = Matrix::ident(VIEW_MATRIX_NDIM);
        for row in 0..VIEW_MATRIX_NDIM {
            let line = next_line(&mut rest);
            let bad_row = || LogFileError::BadViewMatrix {
                row: row as usize,
                line: line.to_owned(),
            };
            let values = line
                .split_whitespace()
                .map(|x| x.parse::<Float>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| bad_row())?;
            if values.len() != VIEW_MATRIX_NDIM as usize {
                return Err(bad_row());
            }
            for (col, value) in (0..).zip(values) {
                *view_matrix.get_mut(col, row) = value;
            }
        }

        let (_, history_str) = rest.split_once('*').ok_or(LogFileError::MissingHistory)?;
        let mut history = History::new(prescription.int_length, HistoryConfig::default());
        history.read(history_str)?;

        Ok(Self {
            prescription,
            scramble_state,
            view_matrix,
            history,
        })
    }
}

/// Splits off the first line of `rest`, without its line terminator.
fn next_line<'a>(rest: &mut &'a str) -> &'a str {
    let (line, remaining) = rest.split_once('\n').unwrap_or((rest, ""));
    *rest = remaining;
    line.trim()
}

#[cfg(test)]
mod tests {
    use ndcube_puzzle::{CCW, CW, Grip, rng_from_seed};
    use pretty_assertions::assert_eq;

    use super::*;

    fn cube() -> PuzzleDescription {
        PuzzleDescription::build("{4,3}", "3").unwrap()
    }

    #[test]
    fn test_write_log_file() {
        let mut history = History::new(3, HistoryConfig::default());
        history.append(Twist::new(Grip(5), CCW, 1));
        history.mark(MARK_SCRAMBLE_BOUNDARY);
        history.append(Twist::new(Grip(7), CW, 2));
        history.append(Twist::new(Grip(9), CW, 1));
        history.undo();
        let log = LogFile::new("{4,3} 3".parse().unwrap(), ScrambleState::Partial, history);
        assert_eq!(
            log.to_string(),
            "MagicCube4D 3 1 1 {4,3} 3\n\
             1 0 0 0\n\
             0 1 0 0\n\
             0 0 1 0\n\
             0 0 0 1\n\
             *\n\
             5,1,1 m| 7,-1,2 c 9,-1,1.\n",
        );
    }

    #[test]
    fn test_read_log_file() {
        let s = "MagicCube4D 3 2 1 {4,3,3} 3\n\
                 1.0 0.0 0.0 0.0\n\
                 0.0 0.0 1.0 0.0\n\
                 0.0 1.0 0.0 0.0\n\
                 0.0 0.0 0.0 1.0\n\
                 *\n\
                 12,1,1 m| c 40,-1,2.\n";
        let log: LogFile = s.parse().unwrap();
        assert_eq!(log.prescription.to_string(), "{4,3,3} 3");
        assert_eq!(log.scramble_state, ScrambleState::Full);
        assert_eq!(log.view_matrix.get(2, 1), 1.0);
        assert_eq!(log.view_matrix.get(1, 1), 0.0);
        assert_eq!(log.history.len(), 3);
        assert_eq!(log.history.moves(), [Twist::new(Grip(12), CCW, 1)]);
        assert!(log.history.has_next_move());

        // Redo moves survive a round trip.
        let written = log.to_string();
        assert!(written.ends_with("*\n12,1,1 m| c 40,-1,2.\n"));
        let reread: LogFile = written.parse().unwrap();
        assert_eq!(reread.view_matrix, log.view_matrix);
        assert_eq!(reread.history, log.history);
        assert!(reread.history.has_next_move());
    }

    #[test]
    fn test_read_log_file_errors() {
        let parse = |s: &str| s.parse::<LogFile>().unwrap_err();
        assert_eq!(parse(""), LogFileError::Empty);
        assert_eq!(
            parse("MagicCube4D 3 0 0 {4,3,3}"),
            LogFileError::WrongFieldCount(5)
        );
        assert_eq!(
            parse("MagicCube5D 3 0 0 {4,3,3} 3"),
            LogFileError::BadMagic {
                expected: MAGIC_NUMBER,
                actual: "MagicCube5D".to_owned(),
            },
        );
        assert_eq!(
            parse("MagicCube4D 2 0 0 {4,3,3} 3"),
            LogFileError::UnsupportedVersion("2".to_owned()),
        );
        assert_eq!(
            parse("MagicCube4D 3 4 0 {4,3,3} 3"),
            LogFileError::BadScrambleState("4".to_owned()),
        );
        assert_eq!(
            parse("MagicCube4D 3 0 -1 {4,3,3} 3"),
            LogFileError::BadTwistCount("-1".to_owned()),
        );
        assert!(matches!(
            parse("MagicCube4D 3 0 0 {4,3,3} 0"),
            LogFileError::Prescription(_),
        ));
        assert_eq!(
            parse("MagicCube4D 3 0 0 {4,3,3} 3\n1 0 0 0\n0 1 0\n"),
            LogFileError::BadViewMatrix {
                row: 1,
                line: "0 1 0".to_owned(),
            },
        );
        assert_eq!(
            parse("MagicCube4D 3 0 0 {4,3,3} 3\n1 0 0 0\n0 1 0 0\n0 0 1 0\n0 0 0 1\n"),
            LogFileError::MissingHistory,
        );
        assert!(matches!(
            parse("MagicCube4D 3 0 0 {4,3,3} 3\n1 0 0 0\n0 1 0 0\n0 0 1 0\n0 0 0 1\n*\n1,1"),
            LogFileError::History(_),
        ));
    }

    #[test]
    fn test_scramble_and_solve() {
        let p = cube();
        let mut state = PuzzleState::new(&p);
        let twists = state.scramble(&p, &mut rng_from_seed("log"), 8).unwrap();
        let mut log = LogFile::scrambled(&p, &twists, false);
        assert_eq!(log.scramble_state, ScrambleState::Partial);
        assert_eq!(log.twist_count(), 0);
        assert!(log.history.at_mark(MARK_SCRAMBLE_BOUNDARY));

        let mut log: LogFile = log.to_string().parse().unwrap();
        assert_eq!(log.replay(&p).unwrap(), state);
        assert_eq!(log.scramble_state, ScrambleState::Partial);

        // Solve by undoing the scramble.
        for &twist in twists.iter().rev() {
            log.history.apply(twist.rev());
        }
        assert!(log.replay(&p).unwrap().is_solved(&p));
        assert_eq!(log.scramble_state, ScrambleState::Solved);
    }

    #[test]
    fn test_replay_bad_twist() {
        let p = cube();
        let mut history = History::default();
        history.append(Twist::new(Grip(10_000), CCW, 1));
        let mut log = LogFile::new(p.prescription().clone(), ScrambleState::None, history);
        assert!(matches!(log.replay(&p), Err(LogFileError::Twist(_))));
    }
}
