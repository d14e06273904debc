//! `cubefill-report`: fills cube-test report templates.
//!
//! Samples unique, gap-separated measurement values per concrete grade or
//! mortar ratio, matches template sheets to grades by their label cell,
//! writes sampled or externally supplied rows into the fixed report layout,
//! and stamps 7-day / 28-day testing dates from a calendar workbook.

pub mod calendar;
pub mod error;
pub mod events;
pub mod grade;
pub mod layout;
pub mod matcher;
pub mod populate;
pub mod process;
pub mod sampler;

pub use calendar::Calendar;
pub use error::{CalendarError, GradeTableError, ProcessError};
pub use events::{EventCollector, Level, LogReporter, ProcessEvent, Reporter};
pub use grade::{GradeKind, GradeSpec, GradeTable, ValueRange};
pub use process::{process, ProcessOutcome, ProcessRequest, RunMode};
pub use sampler::{generate_row, generate_rows, sample_unique, SampledRow};
