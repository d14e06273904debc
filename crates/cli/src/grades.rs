// `cubefill grades`, `cubefill detect`, `cubefill generate`

use std::path::Path;

use cubefill_io::xlsx;
use cubefill_report::layout::TemplateLayout;
use cubefill_report::matcher::{detect_grade, label_text};
use cubefill_report::populate::{build_legacy_workbook, legacy_file_name};
use cubefill_report::{generate_rows, GradeKind, GradeTable, ValueRange};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::CliError;

fn range_text(range: ValueRange, decimals: u32) -> String {
    let d = decimals as usize;
    format!("{:.*} - {:.*}", d, range.min, d, range.max)
}

pub fn cmd_grades(table: &GradeTable, json: bool) -> Result<(), CliError> {
    if json {
        let text = table.to_json().map_err(|e| CliError::general(e.to_string()))?;
        println!("{}", text);
        return Ok(());
    }

    println!(
        "{:<12} {:<9} {:<17} {:<19} {}",
        "GRADE", "KIND", "WEIGHT", "7-DAY STRENGTH", "28-DAY STRENGTH"
    );
    for spec in table.iter() {
        println!(
            "{:<12} {:<9} {:<17} {:<19} {}",
            spec.display_name(),
            spec.kind().as_str(),
            range_text(spec.weight(), GradeKind::WEIGHT_DECIMALS),
            range_text(spec.strength_7d(), GradeKind::STRENGTH_DECIMALS),
            range_text(spec.strength_28d(), GradeKind::STRENGTH_DECIMALS),
        );
    }
    Ok(())
}

/// One sheet of `cubefill detect --json`
#[derive(Debug, Serialize)]
struct DetectedSheet {
    index: usize,
    sheet: String,
    label: String,
    grade: Option<String>,
}

pub fn cmd_detect(template: &Path, table: &GradeTable, json: bool) -> Result<(), CliError> {
    let (workbook, _) = xlsx::import(template)
        .map_err(|e| CliError::io(format!("{}: {}", template.display(), e)))?;
    let layout = TemplateLayout::STANDARD;

    let detected: Vec<DetectedSheet> = workbook
        .sheets()
        .iter()
        .enumerate()
        .map(|(index, sheet)| {
            let label = label_text(sheet, &layout);
            DetectedSheet {
                index,
                sheet: sheet.name.clone(),
                grade: detect_grade(table, &label).map(|spec| spec.id().to_string()),
                label,
            }
        })
        .collect();

    if json {
        for entry in &detected {
            let line = serde_json::to_string(entry).map_err(|e| CliError::general(e.to_string()))?;
            println!("{}", line);
        }
    } else {
        for entry in &detected {
            let grade = match (&entry.grade, entry.label.is_empty()) {
                (Some(grade), _) => grade.as_str(),
                (None, true) => "(no label)",
                (None, false) => "(unsupported)",
            };
            println!("{:<24} {:<16} {}", entry.sheet, entry.label, grade);
        }
    }

    let recognized = detected.iter().filter(|d| d.grade.is_some()).count();
    eprintln!("{} of {} sheets recognized", recognized, detected.len());
    Ok(())
}

pub fn cmd_generate(
    grade: &str,
    rows: usize,
    output: &Path,
    table: &GradeTable,
    seed: Option<u64>,
) -> Result<(), CliError> {
    let spec = table.get(grade).ok_or_else(|| {
        CliError::usage(format!("unknown grade '{}'", grade.trim()))
            .with_hint(format!("available grades: {}", table.ids().join(", ")))
    })?;
    if rows == 0 {
        return Err(CliError::usage("--rows must be at least 1"));
    }
    if !output.is_dir() {
        return Err(CliError::usage(format!("output directory not found: {}", output.display())));
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let sampled = generate_rows(&mut rng, spec, rows);
    let workbook = build_legacy_workbook(spec, &sampled);

    let path = output.join(legacy_file_name(spec));
    xlsx::export(&workbook, &path).map_err(|e| CliError::io(format!("{}: {}", path.display(), e)))?;

    eprintln!("{}: {} rows", spec.display_name(), rows);
    println!("{}", path.display());
    Ok(())
}
