//! Sheet-to-grade matching by the label cell.

use std::path::Path;

use cubefill_engine::sheet::Sheet;
use cubefill_engine::workbook::Workbook;

use crate::grade::{GradeKind, GradeSpec, GradeTable};
use crate::layout::TemplateLayout;

/// Canonical form for exact matching: whitespace removed, uppercased.
pub fn normalize_grade(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_uppercase()
}

/// Looser form for auto-detection: also drops `_` and `-`.
fn detection_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .collect::<String>()
        .to_uppercase()
}

/// Trimmed display text of a sheet's label cell
pub fn label_text(sheet: &Sheet, layout: &TemplateLayout) -> String {
    sheet.get_display(layout.label.row, layout.label.col).trim().to_string()
}

/// Indices of every sheet whose label equals `grade` after normalization.
pub fn find_sheets_for_grade(workbook: &Workbook, grade: &str) -> Vec<usize> {
    let layout = TemplateLayout::STANDARD;
    let target = normalize_grade(grade);
    if target.is_empty() {
        return Vec::new();
    }
    workbook
        .sheets()
        .iter()
        .enumerate()
        .filter(|(_, sheet)| normalize_grade(&label_text(sheet, &layout)) == target)
        .map(|(idx, _)| idx)
        .collect()
}

/// Ratio representations of a mortar id such as `1:4`: `1:4`, `1/4`, `14`.
fn ratio_forms(id: &str) -> Vec<String> {
    let key = detection_key(id);
    match key.split_once(':') {
        Some((a, b)) => vec![format!("{a}:{b}"), format!("{a}/{b}"), format!("{a}{b}")],
        None => vec![key],
    }
}

/// Resolve a raw label to a grade with a tolerant heuristic.
///
/// 1. Concrete ids match directly once spaces, `_` and `-` are stripped
///    (`m-20` is `M20`).
/// 2. Mortar ratios match any ratio form with or without a `MORTAR`
///    prefix (`MORTAR_1_4`, `1/4`, `Mortar 1:4`).
/// 3. Last resort: the text contains `MORTAR` and a ratio form anywhere.
pub fn detect_grade<'t>(table: &'t GradeTable, raw: &str) -> Option<&'t GradeSpec> {
    let key = detection_key(raw);
    if key.is_empty() {
        return None;
    }

    if let Some(spec) = table
        .of_kind(GradeKind::Concrete)
        .find(|spec| detection_key(spec.id()) == key)
    {
        return Some(spec);
    }

    let bare = key.strip_prefix("MORTAR").unwrap_or(&key);
    if let Some(spec) = table
        .of_kind(GradeKind::Mortar)
        .find(|spec| ratio_forms(spec.id()).iter().any(|form| form == bare))
    {
        return Some(spec);
    }

    if key.contains("MORTAR") {
        return table
            .of_kind(GradeKind::Mortar)
            .find(|spec| ratio_forms(spec.id()).iter().any(|form| key.contains(form.as_str())));
    }

    None
}

/// Grade id encoded in a legacy file name.
///
/// `Mortar_1_4.xlsx` gives `1:4`; other names lose `_` and `-`
/// (`M-20.xlsx` gives `M20`).
pub fn grade_from_filename(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = file_name.split('.').next().unwrap_or("").to_uppercase();

    if name.contains("MORTAR") && name.contains('_') {
        let parts: Vec<&str> = name.split('_').collect();
        if parts.len() >= 3 {
            return format!("{}:{}", parts[parts.len() - 2], parts[parts.len() - 1]);
        }
    }
    name.replace(&['_', '-'][..], "").trim().to_string()
}
