// `cubefill process`: resolve inputs, run the batch on a worker thread,
// stream its events to stderr.

use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use clap::Args;
use cubefill_config::Settings;
use cubefill_report::{
    process, GradeTable, Level, ProcessEvent, ProcessOutcome, ProcessRequest, RunMode,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::exit_codes::EXIT_ABORTED;
use crate::{load_table, CliError};

#[derive(Args, Debug, Default)]
pub struct ProcessArgs {
    /// Report template workbook (.xlsx)
    #[arg(long, short = 't', value_name = "PATH")]
    pub template: Option<PathBuf>,

    /// Directory for <stem>_Processed.xlsx (defaults to the template's directory)
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Run mode: generate, generate+date, date_only, grade_files, grade_files+date
    #[arg(long, short = 'm')]
    pub mode: Option<String>,

    /// Grade to generate for (repeatable); none falls back to the saved grades
    #[arg(long = "grade", short = 'g', value_name = "ID")]
    pub grades: Vec<String>,

    /// Detect each sheet's grade from its label, ignoring saved grades
    #[arg(long, conflicts_with = "grades")]
    pub auto_detect: bool,

    /// Legacy grade file (repeatable)
    #[arg(long = "legacy", short = 'l', value_name = "PATH")]
    pub legacy: Vec<PathBuf>,

    /// Calendar workbook for the date modes
    #[arg(long, short = 'c', value_name = "PATH")]
    pub calendar: Option<PathBuf>,

    /// Custom grade table (JSON)
    #[arg(long, value_name = "PATH")]
    pub grades_file: Option<PathBuf>,

    /// Seed for reproducible values
    #[arg(long)]
    pub seed: Option<u64>,

    /// Only warnings and errors on stderr
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Do not remember these inputs for the next run
    #[arg(long)]
    pub no_save: bool,
}

/// Command-line arguments merged over saved settings.
#[derive(Debug)]
struct ResolvedInputs {
    request: ProcessRequest,
    grades_file: Option<PathBuf>,
}

fn resolve(args: &ProcessArgs, settings: &Settings) -> Result<ResolvedInputs, CliError> {
    let template = args
        .template
        .clone()
        .or_else(|| settings.template_path.clone())
        .ok_or_else(|| CliError::usage("no template given").with_hint("pass --template <report.xlsx>"))?;

    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| settings.output_dir.clone())
        .or_else(|| template.parent().filter(|p| !p.as_os_str().is_empty()).map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));

    let mode: RunMode = args
        .mode
        .as_deref()
        .unwrap_or(settings.mode.as_str())
        .parse()
        .map_err(CliError::usage)?;

    let grades = if args.auto_detect {
        Vec::new()
    } else if args.grades.is_empty() {
        settings.selected_grades.clone()
    } else {
        args.grades.clone()
    };
    let legacy = if args.legacy.is_empty() { settings.legacy_files.clone() } else { args.legacy.clone() };

    let mut request = ProcessRequest::new(template, output_dir, mode)
        .with_grades(grades)
        .with_legacy_files(legacy);
    if let Some(calendar) = args.calendar.clone().or_else(|| settings.calendar_path.clone()) {
        request = request.with_calendar(calendar);
    }

    Ok(ResolvedInputs {
        request,
        grades_file: args.grades_file.clone().or_else(|| settings.grades_file.clone()),
    })
}

fn remember(settings_path: &Path, inputs: &ResolvedInputs) {
    let request = &inputs.request;
    let settings = Settings {
        template_path: Some(request.template.clone()),
        output_dir: Some(request.output_dir.clone()),
        mode: request.mode.as_str().to_string(),
        selected_grades: request.grades.clone().unwrap_or_default(),
        legacy_files: request.legacy_files.clone(),
        calendar_path: request.calendar.clone(),
        grades_file: inputs.grades_file.clone(),
    };
    if let Err(e) = settings.save_to(settings_path) {
        tracing::warn!("settings not saved to {}: {}", settings_path.display(), e);
    }
}

/// Prints batch events as they arrive.
struct EventPrinter {
    quiet: bool,
    last_percent: Option<u32>,
}

impl EventPrinter {
    fn new(quiet: bool) -> Self {
        Self { quiet, last_percent: None }
    }

    fn print(&mut self, event: &ProcessEvent) {
        match event {
            ProcessEvent::Log { level: Level::Info, message } => {
                if !self.quiet {
                    eprintln!("{}", message);
                }
            }
            ProcessEvent::Log { level: Level::Warn, message } => eprintln!("warning: {}", message.trim_start()),
            ProcessEvent::Log { level: Level::Error, message } => eprintln!("error: {}", message.trim_start()),
            ProcessEvent::Progress(fraction) => {
                let percent = (fraction * 100.0).round() as u32;
                // Whole steps of ten, and 100 once
                let step = percent / 10;
                if !self.quiet && self.last_percent.map_or(true, |last| step > last / 10) {
                    eprintln!("[{:>3}%]", percent);
                    self.last_percent = Some(percent);
                }
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run the batch on a worker thread and drain its events here until the
/// worker drops its sender. A panicking worker becomes a single error.
fn run_worker(
    request: ProcessRequest,
    table: GradeTable,
    seed: Option<u64>,
    quiet: bool,
) -> Result<ProcessOutcome, CliError> {
    let (tx, rx) = mpsc::channel::<ProcessEvent>();

    let worker = thread::Builder::new()
        .name("cubefill-batch".to_string())
        .spawn(move || {
            let mut reporter = tx;
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            process(&request, &table, &mut rng, &mut reporter)
        })
        .map_err(|e| CliError::general(format!("failed to start batch worker: {}", e)))?;

    let mut printer = EventPrinter::new(quiet);
    for event in rx {
        printer.print(&event);
    }

    match worker.join() {
        Ok(Ok(outcome)) => Ok(outcome),
        Ok(Err(e)) => Err(CliError::process(e)),
        Err(panic) => Err(CliError::general(format!("batch failed: {}", panic_message(panic.as_ref())))),
    }
}

fn print_outcome(outcome: &ProcessOutcome) {
    println!("output:      {}", outcome.output_path.display());
    println!("operations:  {}", outcome.operations);
    if let Some(dates) = &outcome.dates {
        println!("dates:       {} updated, {} not in calendar", dates.updated, dates.missing.len());
    }
    if !outcome.unsupported_sheets.is_empty() {
        println!("unsupported: {}", outcome.unsupported_sheets.join(", "));
    }
}

pub fn cmd_process(args: ProcessArgs, settings_path: &Path) -> Result<(), CliError> {
    let settings = Settings::load_from(settings_path);
    let inputs = resolve(&args, &settings)?;
    let table = load_table(inputs.grades_file.as_deref())?;

    // Nothing is copied or remembered for a request that cannot run
    inputs.request.validate().map_err(CliError::process)?;
    if !args.no_save {
        remember(settings_path, &inputs);
    }
    tracing::debug!("running {:?}", inputs.request);

    let outcome = run_worker(inputs.request, table, args.seed, args.quiet)?;
    print_outcome(&outcome);

    match outcome.aborted {
        Some(reason) => Err(CliError {
            code: EXIT_ABORTED,
            message: format!("run aborted: {}", reason),
            hint: Some("check --calendar; the output copy was left unprocessed".to_string()),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_arguments_over_settings() {
        let settings = Settings {
            template_path: Some(PathBuf::from("/saved/report.xlsx")),
            output_dir: Some(PathBuf::from("/saved/out")),
            mode: "generate+date".to_string(),
            selected_grades: vec!["M25".to_string()],
            calendar_path: Some(PathBuf::from("/saved/cal.xlsx")),
            ..Default::default()
        };
        let args = ProcessArgs {
            template: Some(PathBuf::from("/new/report.xlsx")),
            grades: vec!["M30".to_string()],
            ..Default::default()
        };

        let request = resolve(&args, &settings).unwrap().request;
        assert_eq!(request.template, PathBuf::from("/new/report.xlsx"));
        assert_eq!(request.output_dir, PathBuf::from("/saved/out"));
        assert_eq!(request.mode, RunMode::GenerateWithDates);
        assert_eq!(request.grades, Some(vec!["M30".to_string()]));
        assert_eq!(request.calendar, Some(PathBuf::from("/saved/cal.xlsx")));
    }

    #[test]
    fn test_resolve_auto_detect_ignores_saved_grades() {
        let settings = Settings {
            template_path: Some(PathBuf::from("/saved/report.xlsx")),
            selected_grades: vec!["M20".to_string()],
            ..Default::default()
        };

        // Without the flag the saved grades still apply
        let request = resolve(&ProcessArgs::default(), &settings).unwrap().request;
        assert_eq!(request.grades, Some(vec!["M20".to_string()]));

        let args = ProcessArgs { auto_detect: true, ..Default::default() };
        let inputs = resolve(&args, &settings).unwrap();
        assert_eq!(inputs.request.grades, Some(Vec::new()));

        // What gets remembered is auto-detect too
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        remember(&path, &inputs);
        assert!(Settings::load_from(&path).selected_grades.is_empty());
    }

    #[test]
    fn test_auto_detect_conflicts_with_grade() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: ProcessArgs,
        }

        let parsed = Wrapper::try_parse_from(["cubefill", "--auto-detect"]).unwrap();
        assert!(parsed.args.auto_detect);
        assert!(Wrapper::try_parse_from(["cubefill", "--auto-detect", "--grade", "M20"]).is_err());
    }

    #[test]
    fn test_resolve_defaults_output_dir_to_template_dir() {
        let args = ProcessArgs { template: Some(PathBuf::from("/data/report.xlsx")), ..Default::default() };
        let request = resolve(&args, &Settings::default()).unwrap().request;
        assert_eq!(request.output_dir, PathBuf::from("/data"));
        assert_eq!(request.mode, RunMode::Generate);

        let args = ProcessArgs { template: Some(PathBuf::from("report.xlsx")), ..Default::default() };
        assert_eq!(resolve(&args, &Settings::default()).unwrap().request.output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_resolve_errors() {
        let err = resolve(&ProcessArgs::default(), &Settings::default()).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_USAGE);
        assert!(err.hint.is_some());

        let args = ProcessArgs {
            template: Some(PathBuf::from("report.xlsx")),
            mode: Some("sideways".to_string()),
            ..Default::default()
        };
        let err = resolve(&args, &Settings::default()).unwrap_err();
        assert!(err.message.contains("sideways"));
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(3);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
