use ndcube_puzzle::{PrescriptionError, TwistError};

/// Error while reading a serialized history.
#[allow(missing_docs)]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryParseError {
    #[error("history ended before the terminating '.'")]
    UnexpectedEnd,
    #[error("unexpected character {ch:?} at byte {offset} of history")]
    UnexpectedChar { ch: char, offset: usize },
    #[error("bad number {text:?} at byte {offset} of history")]
    BadNumber { text: String, offset: usize },
}

/// Error while reading a log file or replaying it.
#[allow(missing_docs)]
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LogFileError {
    #[error("log file is empty")]
    Empty,
    #[error("unexpected log file format: expected 6 fields in the first line, got {0}")]
    WrongFieldCount(usize),
    #[error("not a log file: expected {expected:?}, got {actual:?}")]
    BadMagic {
        expected: &'static str,
        actual: String,
    },
    #[error("incompatible log file version {0}")]
    UnsupportedVersion(String),
    #[error("bad scramble state {0:?}")]
    BadScrambleState(String),
    #[error("bad twist count {0:?}")]
    BadTwistCount(String),
    #[error("bad view matrix row {row}: {line:?}")]
    BadViewMatrix { row: usize, line: String },
    #[error("log file has no '*' before the history")]
    MissingHistory,
    #[error("bad puzzle: {0}")]
    Prescription(#[from] PrescriptionError),
    #[error("bad history: {0}")]
    History(#[from] HistoryParseError),
    #[error("bad twist in history: {0}")]
    Twist(#[from] TwistError),
}

/// Error while reading a macro file or applying a macro.
#[allow(missing_docs)]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MacroError {
    #[error("macro file is empty")]
    Empty,
    #[error("unexpected macro file header {0:?}")]
    BadHeader(String),
    #[error("unhandled macro file version {0}")]
    UnsupportedVersion(String),
    #[error("malformed macro at byte {offset}: {reason}")]
    Malformed { offset: usize, reason: &'static str },
    #[error("bad history in macro {name:?}: {error}")]
    History {
        name: String,
        error: HistoryParseError,
    },
    #[error("reference grip {0} does not exist on this puzzle")]
    BadReference(u32),
    #[error("reference grips do not match the pattern of the macro's definition")]
    ReferenceMismatch,
}
