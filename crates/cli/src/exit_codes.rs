//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Success                                                  |
//! | 1    | General error (worker panic, unexpected failure)         |
//! | 2    | Usage error (bad args, input required by the mode absent)|
//! | 3    | I/O or workbook error (copy, read or save failed)        |
//! | 4    | Run aborted (calendar missing or unreadable)             |
//! | 5    | Grade table file invalid                                 |

use cubefill_report::ProcessError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required inputs.
pub const EXIT_USAGE: u8 = 2;

/// A file could not be copied, read as a workbook, or saved.
pub const EXIT_IO: u8 = 3;

/// The run stopped before populating anything (calendar load failed).
/// The output copy exists but is unprocessed.
pub const EXIT_ABORTED: u8 = 4;

/// The grade table file failed to parse or validate.
pub const EXIT_GRADE_TABLE: u8 = 5;

/// Map a batch error to its exit code.
pub fn process_exit_code(err: &ProcessError) -> u8 {
    match err {
        ProcessError::MissingInput(_) => EXIT_USAGE,
        ProcessError::Io(_) | ProcessError::Workbook(_) => EXIT_IO,
        ProcessError::GradeTable(_) => EXIT_GRADE_TABLE,
    }
}
