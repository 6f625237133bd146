//! Move history with undo, redo, and marks, plus the text formats used to
//! save it: log files and macro files.

mod error;
mod history;
mod log_file;
mod macros;

pub use error::{HistoryParseError, LogFileError, MacroError};
pub use history::{
    History, HistoryConfig, HistoryNode, MARK_ANY, MARK_MACRO_CLOSE, MARK_MACRO_OPEN,
    MARK_SCRAMBLE_BOUNDARY, MARK_SETUP_MOVES, NOT_CURRENT,
};
pub use log_file::{LogFile, ScrambleState};
pub use macros::{MAX_REFS, Macro, MacroFile};
pub use ndcube_puzzle::{CCW, CW};

/// First word of every log file and macro file.
pub const MAGIC_NUMBER: &str = "MagicCube4D";
/// Log file version. This **MUST** be incremented whenever breaking changes
/// are made to the log file format.
pub const LOG_FILE_VERSION: u32 = 3;
/// Macro file version. This **MUST** be incremented whenever breaking
/// changes are made to the macro file format.
pub const MACRO_FILE_VERSION: u32 = 2;

/// Puzzle shape used when none is given.
pub const DEFAULT_PUZZLE: &str = "{4,3,3}";
/// Edge length used when none is given.
pub const DEFAULT_LENGTH: u32 = 3;
