//! Writes sampled rows, legacy rows and testing dates into template sheets.
//!
//! Every function here mutates the open workbook in place and reports
//! through a `Reporter`; none of them adds or removes sheets.

use cubefill_engine::cell::{Cell, CellValue, NumberFormat};
use cubefill_engine::cell_ref::CellRef;
use cubefill_engine::sheet::Sheet;
use cubefill_engine::workbook::Workbook;
use rand::Rng;

use crate::calendar::Calendar;
use crate::events::Reporter;
use crate::grade::{GradeKind, GradeSpec, GradeTable, STRENGTHS_PER_AGE, WEIGHTS_PER_ROW};
use crate::layout::{LegacyLayout, TemplateLayout};
use crate::matcher::{detect_grade, find_sheets_for_grade, label_text};
use crate::sampler::{generate_row, SampledRow};

/// Share of overall progress owned by the data phases; saving gets the rest.
const DATA_PHASE_SHARE: f32 = 0.8;

/// Progress after finishing item `index` of `total` in a data phase
pub fn phase_progress(index: usize, total: usize) -> f32 {
    if total == 0 {
        return DATA_PHASE_SHARE;
    }
    (index + 1) as f32 / total as f32 * DATA_PHASE_SHARE
}

fn write_numbers(sheet: &mut Sheet, start: CellRef, values: &[f64], decimals: u32) {
    for (i, value) in values.iter().enumerate() {
        let cell = start.offset_cols(i);
        sheet.set_number(cell.row, cell.col, *value);
        sheet.set_number_format(cell.row, cell.col, NumberFormat::Fixed { decimals: decimals as u8 });
    }
}

/// Write one sampled row: weights to C25..H25, strengths to C27..H27.
pub fn write_sampled_row(sheet: &mut Sheet, layout: &TemplateLayout, row: &SampledRow) {
    write_numbers(sheet, layout.weights, &row.weights, GradeKind::WEIGHT_DECIMALS);
    write_numbers(sheet, layout.strength_7d, &row.strength_7d, GradeKind::STRENGTH_DECIMALS);
    write_numbers(sheet, layout.strength_28d, &row.strength_28d, GradeKind::STRENGTH_DECIMALS);
}

/// Generate and write one row per sheet matching each requested grade.
///
/// Unknown grade ids are skipped with a warning. A grade listed twice
/// overwrites its sheets again. Returns the number of sheets written.
pub fn apply_generated_grades<R: Rng, P: Reporter>(
    workbook: &mut Workbook,
    table: &GradeTable,
    grades: &[String],
    rng: &mut R,
    reporter: &mut P,
) -> usize {
    let layout = TemplateLayout::STANDARD;
    let mut total = 0;

    for (gi, grade) in grades.iter().enumerate() {
        let Some(spec) = table.get(grade) else {
            reporter.warn(format!("Unknown grade '{}' skipped", grade.trim()));
            reporter.progress(phase_progress(gi, grades.len()));
            continue;
        };

        let sheets = find_sheets_for_grade(workbook, spec.id());
        reporter.info(format!("Grade: {} -> {} matching sheets", spec.display_name(), sheets.len()));
        if sheets.is_empty() {
            reporter.warn(format!("No sheets with {} = '{}'", layout.label, spec.id()));
        }

        for idx in sheets {
            let row = generate_row(rng, spec);
            if let Some(sheet) = workbook.sheet_mut(idx) {
                write_sampled_row(sheet, &layout, &row);
                total += 1;
                reporter.info(format!("  {} filled", sheet.name));
            }
        }

        reporter.progress(phase_progress(gi, grades.len()));
    }

    total
}

/// Result of an auto-detect pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutoDetectSummary {
    /// Sheets written
    pub populated: usize,
    /// Names of sheets whose non-blank label matched no grade
    pub unsupported: Vec<String>,
}

/// Resolve every sheet's grade from its label and write one generated row.
///
/// Sheets with a blank label are passed over silently; labels that match
/// no grade are warned about and listed as unsupported.
pub fn apply_auto_detected<R: Rng, P: Reporter>(
    workbook: &mut Workbook,
    table: &GradeTable,
    rng: &mut R,
    reporter: &mut P,
) -> AutoDetectSummary {
    let layout = TemplateLayout::STANDARD;
    let mut summary = AutoDetectSummary::default();
    let sheet_count = workbook.sheet_count();

    for idx in 0..sheet_count {
        if let Some(sheet) = workbook.sheet_mut(idx) {
            let label = label_text(sheet, &layout);
            if !label.is_empty() {
                match detect_grade(table, &label) {
                    Some(spec) => {
                        let row = generate_row(rng, spec);
                        write_sampled_row(sheet, &layout, &row);
                        summary.populated += 1;
                        reporter.info(format!("  {}: {} filled", sheet.name, spec.display_name()));
                    }
                    None => {
                        reporter.warn(format!("  {}: unsupported grade label '{}'", sheet.name, label));
                        summary.unsupported.push(sheet.name.clone());
                    }
                }
            }
        }
        reporter.progress(phase_progress(idx, sheet_count));
    }

    summary
}

/// One data row of a legacy grade file, cells copied as found.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyRow {
    pub weights: [Cell; WEIGHTS_PER_ROW],
    /// Three 7-day strengths followed by three 28-day strengths
    pub strengths: [Cell; 2 * STRENGTHS_PER_AGE],
}

/// Copy of a legacy cell suitable for another workbook: formulas are
/// replaced by their cached value when one exists.
fn detached_cell(sheet: &Sheet, row: usize, col: usize) -> Cell {
    let mut cell = sheet.get_cell_opt(row, col).cloned().unwrap_or_default();
    if let CellValue::Formula { cached: Some(cached), .. } = &cell.value {
        cell.value = (**cached).clone();
    }
    cell
}

/// Read data rows from the first data row until a blank terminator cell.
pub fn read_legacy_rows(sheet: &Sheet) -> Vec<LegacyRow> {
    let layout = LegacyLayout::STANDARD;
    let mut rows = Vec::new();
    let mut row = layout.first_data_row;

    while row < sheet.rows && !sheet.is_blank(row, layout.terminator_col) {
        rows.push(LegacyRow {
            weights: std::array::from_fn(|i| detached_cell(sheet, row, layout.weight_col + i)),
            strengths: std::array::from_fn(|i| detached_cell(sheet, row, layout.strength_col + i)),
        });
        row += 1;
    }

    rows
}

/// File name a legacy grade file for `spec` is saved under, such that
/// [`grade_from_filename`](crate::matcher::grade_from_filename) maps it back.
pub fn legacy_file_name(spec: &GradeSpec) -> String {
    if spec.is_mortar() {
        format!("Mortar_{}.xlsx", spec.id().replace(':', "_"))
    } else {
        format!("{}.xlsx", spec.id())
    }
}

/// Lay sampled rows out as a legacy grade file: a header row, then one
/// numbered data row per sample.
pub fn build_legacy_workbook(spec: &GradeSpec, rows: &[SampledRow]) -> Workbook {
    let layout = LegacyLayout::STANDARD;
    let mut sheet = Sheet::new_with_name(
        layout.first_data_row + rows.len() + 1,
        layout.strength_col + 2 * STRENGTHS_PER_AGE,
        &spec.display_name().replace(':', "-"),
    );

    sheet.set_text(0, 0, "No");
    for i in 0..WEIGHTS_PER_ROW {
        sheet.set_text(0, layout.weight_col + i, &format!("W{}", i + 1));
    }
    for i in 0..STRENGTHS_PER_AGE {
        sheet.set_text(0, layout.strength_col + i, &format!("7D-{}", i + 1));
        sheet.set_text(0, layout.strength_col + STRENGTHS_PER_AGE + i, &format!("28D-{}", i + 1));
    }

    let weight_format = NumberFormat::Fixed { decimals: GradeKind::WEIGHT_DECIMALS as u8 };
    let strength_format = NumberFormat::Fixed { decimals: GradeKind::STRENGTH_DECIMALS as u8 };
    for (i, row) in rows.iter().enumerate() {
        let r = layout.first_data_row + i;
        sheet.set_number(r, 0, (i + 1) as f64);
        for (c, value) in row.weights.iter().enumerate() {
            sheet.set_number(r, layout.weight_col + c, *value);
            sheet.set_number_format(r, layout.weight_col + c, weight_format);
        }
        let strengths = row.strength_7d.iter().chain(row.strength_28d.iter());
        for (c, value) in strengths.enumerate() {
            sheet.set_number(r, layout.strength_col + c, *value);
            sheet.set_number_format(r, layout.strength_col + c, strength_format);
        }
    }

    Workbook::from_sheets(vec![sheet], 0)
}

fn write_cells(sheet: &mut Sheet, start: CellRef, cells: &[Cell]) {
    for (i, cell) in cells.iter().enumerate() {
        let target = start.offset_cols(i);
        sheet.set_cell_value(target.row, target.col, cell.value.clone());
        if cell.format.number_format != NumberFormat::General {
            sheet.set_number_format(target.row, target.col, cell.format.number_format);
        }
    }
}

/// Map legacy rows 1:1, in order, onto the sheets labelled `grade`.
///
/// Rows beyond the number of matching sheets are dropped with one warning.
/// Returns the number of sheets written.
pub fn apply_legacy_rows<P: Reporter>(
    workbook: &mut Workbook,
    grade: &str,
    rows: &[LegacyRow],
    reporter: &mut P,
) -> usize {
    let layout = TemplateLayout::STANDARD;
    let sheets = find_sheets_for_grade(workbook, grade);
    reporter.info(format!("  Matching sheets: {}", sheets.len()));

    if sheets.is_empty() {
        reporter.warn(format!("  No sheets with {} = '{}'", layout.label, grade));
        return 0;
    }

    let mut total = 0;
    for (i, row) in rows.iter().enumerate() {
        let Some(&idx) = sheets.get(i) else {
            reporter.warn(format!(
                "  More data rows than sheets: {} rows, {} sheets; {} row(s) ignored",
                rows.len(),
                sheets.len(),
                rows.len() - sheets.len()
            ));
            break;
        };
        if let Some(sheet) = workbook.sheet_mut(idx) {
            write_cells(sheet, layout.weights, &row.weights);
            write_cells(sheet, layout.strength_7d, &row.strengths);
            total += 1;
        }
    }

    total
}

/// Result of a date pass; not counted as operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateSummary {
    /// Sheets whose casting date was found in the calendar
    pub updated: usize,
    /// (sheet name, casting date) for dates absent from the calendar
    pub missing: Vec<(String, String)>,
}

/// Stamp 7-day and 28-day dates on every sheet with a casting date.
///
/// Blank calendar texts leave the corresponding cell untouched; unknown
/// casting dates are warned about and skipped.
pub fn apply_dates<P: Reporter>(workbook: &mut Workbook, calendar: &Calendar, reporter: &mut P) -> DateSummary {
    let layout = TemplateLayout::STANDARD;
    let mut summary = DateSummary::default();

    for sheet in workbook.sheets_mut() {
        let key = sheet
            .get_display(layout.casting_date.row, layout.casting_date.col)
            .trim()
            .to_string();
        if key.is_empty() {
            continue;
        }

        match calendar.lookup(&key) {
            Some(entry) => {
                if !entry.seven_day.is_empty() {
                    sheet.set_text(layout.seven_day_date.row, layout.seven_day_date.col, &entry.seven_day);
                }
                if !entry.twenty_eight_day.is_empty() {
                    sheet.set_text(
                        layout.twenty_eight_day_date.row,
                        layout.twenty_eight_day_date.col,
                        &entry.twenty_eight_day,
                    );
                }
                summary.updated += 1;
                reporter.info(format!(
                    "  {}: {} -> 7d: {}, 28d: {}",
                    sheet.name, key, entry.seven_day, entry.twenty_eight_day
                ));
            }
            None => {
                reporter.warn(format!("  Date not in calendar: {} ({})", key, sheet.name));
                summary.missing.push((sheet.name.clone(), key));
            }
        }
    }

    summary
}
