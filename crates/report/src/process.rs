//! Batch orchestration: one template in, one processed workbook out.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use cubefill_engine::workbook::Workbook;
use cubefill_io::xlsx;
use rand::Rng;

use crate::calendar::Calendar;
use crate::error::ProcessError;
use crate::events::Reporter;
use crate::grade::GradeTable;
use crate::matcher::grade_from_filename;
use crate::populate::{
    apply_auto_detected, apply_dates, apply_generated_grades, apply_legacy_rows, phase_progress,
    read_legacy_rows, DateSummary,
};

/// What a run does to the template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RunMode {
    /// Sampled values only
    #[default]
    Generate,
    /// Sampled values, then testing dates
    GenerateWithDates,
    /// Testing dates only
    DateOnly,
    /// Rows copied from legacy grade files
    LegacyFiles,
    /// Legacy rows, then testing dates
    LegacyFilesWithDates,
}

impl RunMode {
    pub const ALL: [RunMode; 5] = [
        RunMode::Generate,
        RunMode::GenerateWithDates,
        RunMode::DateOnly,
        RunMode::LegacyFiles,
        RunMode::LegacyFilesWithDates,
    ];

    /// Identifier stored in settings files
    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::Generate => "generate",
            RunMode::GenerateWithDates => "generate+date",
            RunMode::DateOnly => "date_only",
            RunMode::LegacyFiles => "grade_files",
            RunMode::LegacyFilesWithDates => "grade_files+date",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RunMode::Generate => "Generate values",
            RunMode::GenerateWithDates => "Generate values + dates",
            RunMode::DateOnly => "Dates only",
            RunMode::LegacyFiles => "Grade files",
            RunMode::LegacyFilesWithDates => "Grade files + dates",
        }
    }

    pub fn generates(self) -> bool {
        matches!(self, RunMode::Generate | RunMode::GenerateWithDates)
    }

    pub fn uses_legacy_files(self) -> bool {
        matches!(self, RunMode::LegacyFiles | RunMode::LegacyFilesWithDates)
    }

    pub fn applies_dates(self) -> bool {
        matches!(
            self,
            RunMode::GenerateWithDates | RunMode::DateOnly | RunMode::LegacyFilesWithDates
        )
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "generate" => Ok(RunMode::Generate),
            "generate+date" | "generate-with-dates" => Ok(RunMode::GenerateWithDates),
            "date_only" | "date-only" | "dates" => Ok(RunMode::DateOnly),
            "grade_files" | "legacy-files" | "legacy" => Ok(RunMode::LegacyFiles),
            "grade_files+date" | "legacy-files-with-dates" => Ok(RunMode::LegacyFilesWithDates),
            other => Err(format!(
                "unknown mode '{other}' (expected one of: {})",
                RunMode::ALL.map(RunMode::as_str).join(", ")
            )),
        }
    }
}

/// Inputs of one batch run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRequest {
    pub template: PathBuf,
    pub output_dir: PathBuf,
    pub mode: RunMode,
    /// Explicit grade ids; `None` or an empty list means auto-detect
    pub grades: Option<Vec<String>>,
    pub legacy_files: Vec<PathBuf>,
    pub calendar: Option<PathBuf>,
}

impl ProcessRequest {
    pub fn new(template: impl Into<PathBuf>, output_dir: impl Into<PathBuf>, mode: RunMode) -> Self {
        Self {
            template: template.into(),
            output_dir: output_dir.into(),
            mode,
            grades: None,
            legacy_files: Vec::new(),
            calendar: None,
        }
    }

    pub fn with_grades<I, S>(mut self, grades: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.grades = Some(grades.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_legacy_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.legacy_files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_calendar(mut self, calendar: impl Into<PathBuf>) -> Self {
        self.calendar = Some(calendar.into());
        self
    }

    /// Check every input the mode needs before anything is touched.
    pub fn validate(&self) -> Result<(), ProcessError> {
        if !self.template.is_file() {
            return Err(ProcessError::MissingInput(format!(
                "template not found: {}",
                self.template.display()
            )));
        }
        if !self.output_dir.is_dir() {
            return Err(ProcessError::MissingInput(format!(
                "output directory not found: {}",
                self.output_dir.display()
            )));
        }
        if self.mode.uses_legacy_files() {
            if self.legacy_files.is_empty() {
                return Err(ProcessError::MissingInput(format!(
                    "mode '{}' needs at least one grade file",
                    self.mode
                )));
            }
            if let Some(missing) = self.legacy_files.iter().find(|p| !p.is_file()) {
                return Err(ProcessError::MissingInput(format!(
                    "grade file not found: {}",
                    missing.display()
                )));
            }
        }
        if self.mode.applies_dates() && self.calendar.is_none() {
            return Err(ProcessError::MissingInput(format!(
                "mode '{}' needs a calendar file",
                self.mode
            )));
        }
        Ok(())
    }

    fn explicit_grades(&self) -> Option<&[String]> {
        self.grades.as_deref().filter(|g| !g.is_empty())
    }
}

/// `<output_dir>/<template stem>_Processed.xlsx`
pub fn output_path_for(template: &Path, output_dir: &Path) -> PathBuf {
    let stem = template
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "template".to_string());
    output_dir.join(format!("{stem}_Processed.xlsx"))
}

/// Result of a finished or aborted run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessOutcome {
    pub output_path: PathBuf,
    /// Sheets populated by generation or legacy rows; dates are not counted
    pub operations: usize,
    /// Date pass result, for date modes that got that far
    pub dates: Option<DateSummary>,
    /// Sheets whose label matched no grade during auto-detect
    pub unsupported_sheets: Vec<String>,
    /// Why the run stopped early, if it did. The output copy is left
    /// unprocessed in that case.
    pub aborted: Option<String>,
}

impl ProcessOutcome {
    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }
}

fn open_workbook<P: Reporter>(path: &Path, reporter: &mut P) -> Result<Workbook, ProcessError> {
    let (workbook, result) = xlsx::import(path).map_err(ProcessError::Workbook)?;
    for warning in &result.warnings {
        reporter.warn(format!("  {}: {}", path.display(), warning));
    }
    log::debug!("{}: {}", path.display(), result.summary());
    Ok(workbook)
}

/// Run one batch.
///
/// The template is copied to [`output_path_for`] first and only the copy is
/// edited. A calendar that cannot be loaded aborts the run after logging:
/// the outcome has zero operations and the copy is not saved over. Per-sheet
/// problems are warnings and never stop the run.
pub fn process<R: Rng, P: Reporter>(
    request: &ProcessRequest,
    table: &GradeTable,
    rng: &mut R,
    reporter: &mut P,
) -> Result<ProcessOutcome, ProcessError> {
    request.validate()?;

    let output_path = output_path_for(&request.template, &request.output_dir);
    let mut outcome = ProcessOutcome { output_path: output_path.clone(), ..Default::default() };

    reporter.info(format!("Mode: {}", request.mode.label()));
    reporter.progress(0.0);

    fs::copy(&request.template, &output_path).map_err(|e| {
        ProcessError::Io(format!("copy {} to {}: {e}", request.template.display(), output_path.display()))
    })?;
    let mut workbook = open_workbook(&output_path, reporter)?;
    reporter.info(format!("Template: {} sheets", workbook.sheet_count()));

    let calendar = match (&request.calendar, request.mode.applies_dates()) {
        (Some(path), true) => match Calendar::load(path) {
            Ok(calendar) => {
                reporter.info(format!("Calendar: {} dates", calendar.len()));
                Some(calendar)
            }
            Err(e) => {
                reporter.error(format!("Calendar failed: {e}"));
                outcome.aborted = Some(e.to_string());
                return Ok(outcome);
            }
        },
        _ => None,
    };

    if request.mode.generates() {
        match request.explicit_grades() {
            Some(grades) => {
                reporter.info(format!("Generating for {} grade(s)", grades.len()));
                outcome.operations += apply_generated_grades(&mut workbook, table, grades, rng, reporter);
            }
            None => {
                reporter.info("Auto-detecting grades from labels");
                let summary = apply_auto_detected(&mut workbook, table, rng, reporter);
                outcome.operations += summary.populated;
                outcome.unsupported_sheets = summary.unsupported;
            }
        }
    }

    if request.mode.uses_legacy_files() {
        let total = request.legacy_files.len();
        for (i, path) in request.legacy_files.iter().enumerate() {
            let grade = grade_from_filename(path);
            reporter.info(format!("File: {} (grade {})", path.display(), grade));

            let legacy = open_workbook(path, reporter)?;
            let rows = match legacy.active_sheet().or_else(|| legacy.sheet(0)) {
                Some(sheet) => read_legacy_rows(sheet),
                None => Vec::new(),
            };
            reporter.info(format!("  Data rows: {}", rows.len()));

            outcome.operations += apply_legacy_rows(&mut workbook, &grade, &rows, reporter);
            reporter.progress(phase_progress(i, total));
        }
    }

    if let Some(calendar) = &calendar {
        reporter.info("Applying testing dates");
        let summary = apply_dates(&mut workbook, calendar, reporter);
        reporter.info(format!(
            "Dates: {} updated, {} not in calendar",
            summary.updated,
            summary.missing.len()
        ));
        outcome.dates = Some(summary);
    }

    reporter.progress(0.9);
    let result = xlsx::export(&workbook, &output_path).map_err(ProcessError::Workbook)?;
    log::debug!("{}: {}", output_path.display(), result.summary());

    reporter.info(format!("Saved: {}", output_path.display()));
    reporter.info(format!("Operations: {}", outcome.operations));
    reporter.progress(1.0);
    Ok(outcome)
}
