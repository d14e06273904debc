// cubefill - fills cube-test report templates from the command line

mod batch;
mod exit_codes;
mod grades;
mod logging;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use cubefill_config::Settings;
use cubefill_report::{GradeTable, ProcessError};

use exit_codes::{process_exit_code, EXIT_ERROR, EXIT_GRADE_TABLE, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "cubefill")]
#[command(about = "Fill cube-test report templates with sampled or recorded measurements")]
#[command(version)]
struct Cli {
    /// Settings file holding the last-used inputs
    #[arg(long, global = true, env = "CUBEFILL_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Debug diagnostics on stderr (RUST_LOG overrides)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy a template to <stem>_Processed.xlsx and populate the copy
    #[command(after_help = "\
Modes:
  generate            sampled values (explicit --grade list, or --auto-detect from B12)
  generate+date       sampled values, then 7-day / 28-day dates from --calendar
  date_only           dates only
  grade_files         rows copied from --legacy files (M20.xlsx, Mortar_1_4.xlsx)
  grade_files+date    legacy rows, then dates

Examples:
  cubefill process --template report.xlsx --output-dir out
  cubefill process --template report.xlsx --output-dir out --grade M20 --grade 1:4
  cubefill process --template report.xlsx --output-dir out --mode date_only --calendar cal.xlsx
  cubefill process --template report.xlsx --output-dir out --mode grade_files --legacy M20.xlsx

Inputs left out fall back to the last saved settings; --auto-detect
drops saved grades.")]
    Process(batch::ProcessArgs),

    /// List the grade table
    Grades {
        /// Custom grade table (JSON)
        #[arg(long, value_name = "PATH")]
        grades_file: Option<PathBuf>,

        /// Print the table in the grade-file JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show which grade each template sheet resolves to, without writing
    Detect {
        /// Report template workbook
        template: PathBuf,

        /// Custom grade table (JSON)
        #[arg(long, value_name = "PATH")]
        grades_file: Option<PathBuf>,

        /// One JSON object per sheet
        #[arg(long)]
        json: bool,
    },

    /// Write a grade file of sampled rows for the grade_files modes
    #[command(after_help = "\
Examples:
  cubefill generate --grade M20 --rows 12 --output data
  cubefill generate --grade 1:4 --rows 6 --output data --seed 7")]
    Generate {
        /// Grade id (M20, 1:4, ...)
        #[arg(long)]
        grade: String,

        /// Number of data rows
        #[arg(long, default_value_t = 10)]
        rows: usize,

        /// Directory the grade file is written to
        #[arg(long, short = 'o', default_value = ".")]
        output: PathBuf,

        /// Custom grade table (JSON)
        #[arg(long, value_name = "PATH")]
        grades_file: Option<PathBuf>,

        /// Seed for reproducible values
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the settings file location and contents
    Settings {
        /// Print the raw JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let settings_path = cli.config.clone().unwrap_or_else(Settings::config_path);

    let result = match cli.command {
        Commands::Process(args) => batch::cmd_process(args, &settings_path),
        Commands::Grades { grades_file, json } => {
            let settings = Settings::load_from(&settings_path);
            load_table(grades_file.or(settings.grades_file).as_deref())
                .and_then(|table| grades::cmd_grades(&table, json))
        }
        Commands::Detect { template, grades_file, json } => {
            let settings = Settings::load_from(&settings_path);
            load_table(grades_file.or(settings.grades_file).as_deref())
                .and_then(|table| grades::cmd_detect(&template, &table, json))
        }
        Commands::Generate { grade, rows, output, grades_file, seed } => {
            let settings = Settings::load_from(&settings_path);
            load_table(grades_file.or(settings.grades_file).as_deref())
                .and_then(|table| grades::cmd_generate(&grade, rows, &output, &table, seed))
        }
        Commands::Settings { json } => cmd_settings(&settings_path, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Create error from a batch error with the matching exit code.
    pub fn process(err: ProcessError) -> Self {
        let hint = match &err {
            ProcessError::MissingInput(_) => {
                Some("pass the input on the command line or run once with it to save it".to_string())
            }
            ProcessError::Workbook(_) => Some("is the file an .xlsx workbook and not open elsewhere?".to_string()),
            _ => None,
        };
        Self { code: process_exit_code(&err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// The grade table from `path`, or the built-in one.
fn load_table(path: Option<&Path>) -> Result<GradeTable, CliError> {
    match path {
        Some(path) => GradeTable::load(path).map_err(|e| CliError {
            code: EXIT_GRADE_TABLE,
            message: format!("{}: {}", path.display(), e),
            hint: Some("`cubefill grades --json` prints a valid grade file to start from".to_string()),
        }),
        None => Ok(GradeTable::builtin()),
    }
}

// ============================================================================
// settings
// ============================================================================

fn display_opt(path: &Option<PathBuf>) -> String {
    path.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "-".to_string())
}

fn display_list<T: AsRef<Path>>(items: &[T]) -> String {
    if items.is_empty() {
        return "-".to_string();
    }
    items
        .iter()
        .map(|p| p.as_ref().display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn cmd_settings(path: &Path, json: bool) -> Result<(), CliError> {
    let settings = Settings::load_from(path);

    if json {
        let text = serde_json::to_string_pretty(&settings).map_err(|e| CliError::general(e.to_string()))?;
        println!("{}", text);
        return Ok(());
    }

    let exists = if path.exists() { "" } else { " (not created yet)" };
    println!("path:         {}{}", path.display(), exists);
    println!("template:     {}", display_opt(&settings.template_path));
    println!("output dir:   {}", display_opt(&settings.output_dir));
    println!("mode:         {}", settings.mode);
    if settings.selected_grades.is_empty() {
        println!("grades:       auto-detect");
    } else {
        println!("grades:       {}", settings.selected_grades.join(", "));
    }
    println!("grade files:  {}", display_list(&settings.legacy_files));
    println!("calendar:     {}", display_opt(&settings.calendar_path));
    println!("grades file:  {}", display_opt(&settings.grades_file));
    Ok(())
}
