use std::fmt;
use std::path::PathBuf;

/// Errors from building or loading a grade table.
#[derive(Debug, Clone, PartialEq)]
pub enum GradeTableError {
    /// The table has no grades.
    Empty,
    /// Two grades normalize to the same id.
    DuplicateId(String),
    /// A grade id is blank.
    BlankId,
    /// A range is inverted or not finite.
    InvalidRange { grade: String, field: &'static str, min: f64, max: f64 },
    /// A range cannot hold the distinct values one row needs.
    InsufficientCapacity { grade: String, field: &'static str, needed: usize, available: usize },
    /// JSON parse / deserialization error.
    Parse(String),
    /// IO error reading a table file.
    Io(String),
}

impl fmt::Display for GradeTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "grade table is empty"),
            Self::DuplicateId(id) => write!(f, "duplicate grade id '{id}'"),
            Self::BlankId => write!(f, "grade id must not be blank"),
            Self::InvalidRange { grade, field, min, max } => {
                write!(f, "grade '{grade}': invalid {field} range [{min}, {max}]")
            }
            Self::InsufficientCapacity { grade, field, needed, available } => write!(
                f,
                "grade '{grade}': {field} range holds {available} distinct value(s) at the required gap, {needed} needed"
            ),
            Self::Parse(msg) => write!(f, "grade table parse error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for GradeTableError {}

/// Errors from loading the calendar workbook. All of them abort a dated run.
#[derive(Debug, Clone, PartialEq)]
pub enum CalendarError {
    /// No calendar file at the given path.
    Missing(PathBuf),
    /// The file exists but could not be read as a workbook.
    Unreadable(String),
    /// The calendar sheet has no entries.
    Empty,
}

impl fmt::Display for CalendarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(path) => write!(f, "calendar file not found: {}", path.display()),
            Self::Unreadable(msg) => write!(f, "calendar file unreadable: {msg}"),
            Self::Empty => write!(f, "calendar has no dates"),
        }
    }
}

impl std::error::Error for CalendarError {}

/// Errors that stop a batch run before or while it executes.
///
/// A calendar that fails to load is not an error: the run reports itself
/// aborted through `ProcessOutcome::aborted`.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessError {
    /// A required input is absent (validated before the run starts).
    MissingInput(String),
    /// Copying the template or another filesystem operation failed.
    Io(String),
    /// A workbook could not be read or written.
    Workbook(String),
    /// The grade table is invalid.
    GradeTable(GradeTableError),
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingInput(msg) => write!(f, "missing input: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::Workbook(msg) => write!(f, "workbook error: {msg}"),
            Self::GradeTable(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ProcessError {}

impl From<GradeTableError> for ProcessError {
    fn from(e: GradeTableError) -> Self {
        Self::GradeTable(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let e = GradeTableError::InsufficientCapacity {
            grade: "1:4".to_string(),
            field: "weight",
            needed: 6,
            available: 4,
        };
        assert_eq!(
            e.to_string(),
            "grade '1:4': weight range holds 4 distinct value(s) at the required gap, 6 needed"
        );
        assert_eq!(
            CalendarError::Missing(PathBuf::from("cal.xlsx")).to_string(),
            "calendar file not found: cal.xlsx"
        );
        assert_eq!(
            ProcessError::from(GradeTableError::Empty).to_string(),
            "grade table is empty"
        );
    }
}
