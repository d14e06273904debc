// Excel workbook import (calamine) and export (rust_xlsxwriter)

use std::path::Path;
use std::time::Instant;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use cubefill_engine::cell::{
    Alignment, BorderStyle, CellFormat, CellValue, NumberFormat, VerticalAlignment,
};
use cubefill_engine::cell_ref::cell_address;
use cubefill_engine::sheet::{MergedRegion, Sheet, DEFAULT_COLS as MAX_COLS, DEFAULT_ROWS as MAX_ROWS};
use cubefill_engine::workbook::Workbook;
use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatBorder, FormatUnderline, Workbook as XlsxWorkbook, Worksheet,
};

use crate::xlsx_layout::{self, SheetLayout, WorkbookLayout};

/// Statistics from an import
#[derive(Debug, Default)]
pub struct ImportResult {
    pub sheets_imported: usize,
    pub cells_imported: usize,
    pub formulas_imported: usize,
    /// Cells carrying an Excel date (kept as serials with a date format)
    pub dates_imported: usize,
    /// Decimal formats restored from the style table
    pub number_formats_imported: usize,
    /// Cells given a font, fill, border or alignment from the style table
    pub styles_imported: usize,
    pub merges_imported: usize,
    /// Merges rejected as invalid or overlapping
    pub merges_dropped: usize,
    pub truncated: bool,
    /// Actionable warnings
    pub warnings: Vec<String>,
    pub import_duration_ms: u128,
}

impl ImportResult {
    /// Returns a summary message suitable for display
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("{} sheet{}", self.sheets_imported, if self.sheets_imported == 1 { "" } else { "s" }),
            format!("{} cells", self.cells_imported),
        ];
        if self.formulas_imported > 0 {
            parts.push(format!("{} formulas", self.formulas_imported));
        }
        if self.styles_imported > 0 {
            parts.push(format!("{} styled cells", self.styles_imported));
        }
        if self.merges_imported > 0 {
            if self.merges_dropped > 0 {
                parts.push(format!("{} merged regions ({} dropped)", self.merges_imported, self.merges_dropped));
            } else {
                parts.push(format!("{} merged regions", self.merges_imported));
            }
        }
        parts.join(" · ")
    }

    pub fn has_warnings(&self) -> bool {
        self.truncated || self.merges_dropped > 0 || !self.warnings.is_empty()
    }
}

/// Statistics from an export
#[derive(Debug, Default)]
pub struct ExportResult {
    pub sheets_exported: usize,
    pub cells_exported: usize,
    pub formulas_exported: usize,
    /// Blank cells written only for their style
    pub styled_blanks_exported: usize,
    pub merges_exported: usize,
    pub export_duration_ms: u128,
}

impl ExportResult {
    /// Returns a summary message suitable for display
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("{} sheet{}", self.sheets_exported, if self.sheets_exported == 1 { "" } else { "s" }),
            format!("{} cells", self.cells_exported),
        ];
        if self.formulas_exported > 0 {
            parts.push(format!("{} formulas", self.formulas_exported));
        }
        parts.join(", ")
    }
}

/// Import an Excel file (xlsx, xlsm, xls, xlsb, ods).
///
/// Values are read first, formulas second (keeping the value as the
/// formula's cached result). For zip-based formats the worksheet layout is
/// overlaid afterwards; a layout that cannot be read is a warning, not an error.
pub fn import(path: &Path) -> Result<(Workbook, ImportResult), String> {
    let start_time = Instant::now();

    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open Excel file: {}", e))?;

    let mut result = ImportResult::default();
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();

    if sheet_names.is_empty() {
        return Err("Excel file contains no sheets".to_string());
    }

    let mut sheets: Vec<Sheet> = Vec::with_capacity(sheet_names.len());

    for sheet_name in &sheet_names {
        let range = workbook
            .worksheet_range(sheet_name)
            .map_err(|e| format!("Failed to read sheet '{}': {}", sheet_name, e))?;

        let mut sheet = Sheet::new_with_name(MAX_ROWS, MAX_COLS, sheet_name);
        let (height, width) = range.get_size();

        if height > 0 && width > 0 {
            let (start_row, start_col) = range.start().unwrap_or((0, 0));
            let total_rows = start_row as usize + height;
            let total_cols = start_col as usize + width;
            if total_rows > MAX_ROWS || total_cols > MAX_COLS {
                result.truncated = true;
                result.warnings.push(format!(
                    "Sheet '{}' truncated from {}x{} to {}x{}",
                    sheet_name,
                    total_rows,
                    total_cols,
                    total_rows.min(MAX_ROWS),
                    total_cols.min(MAX_COLS)
                ));
            }

            for (row_idx, row) in range.rows().enumerate() {
                let target_row = start_row as usize + row_idx;
                if target_row >= MAX_ROWS {
                    break;
                }
                for (col_idx, cell) in row.iter().enumerate() {
                    let target_col = start_col as usize + col_idx;
                    if target_col >= MAX_COLS {
                        break;
                    }
                    if import_value(&mut sheet, target_row, target_col, cell, &mut result) {
                        result.cells_imported += 1;
                    }
                }
            }
        }

        if let Ok(formula_range) = workbook.worksheet_formula(sheet_name) {
            let (start_row, start_col) = formula_range.start().unwrap_or((0, 0));

            for (row_idx, row) in formula_range.rows().enumerate() {
                let target_row = start_row as usize + row_idx;
                if target_row >= MAX_ROWS {
                    break;
                }
                for (col_idx, formula) in row.iter().enumerate() {
                    let target_col = start_col as usize + col_idx;
                    if target_col >= MAX_COLS {
                        break;
                    }
                    if formula.is_empty() {
                        continue;
                    }

                    let previous = sheet.get_cell_value(target_row, target_col).clone();
                    if previous.is_empty() {
                        result.cells_imported += 1;
                    }
                    let source = if formula.starts_with('=') {
                        formula.clone()
                    } else {
                        format!("={}", formula)
                    };
                    let cached = if previous.is_empty() { None } else { Some(Box::new(previous)) };
                    sheet.set_cell_value(target_row, target_col, CellValue::Formula { source, cached });
                    result.formulas_imported += 1;
                }
            }
        }

        sheets.push(sheet);
        result.sheets_imported += 1;
    }

    if is_zip_format(path) {
        match xlsx_layout::read_layouts(path, &sheet_names) {
            Ok(layout) => {
                for (sheet, sheet_layout) in sheets.iter_mut().zip(&layout.sheets) {
                    apply_imported_layout(sheet, sheet_layout, &layout, &mut result);
                }
            }
            Err(e) => result.warnings.push(format!("Layout not imported: {}", e)),
        }
    }

    result.import_duration_ms = start_time.elapsed().as_millis();
    log::debug!("imported {}: {}", path.display(), result.summary());

    Ok((Workbook::from_sheets(sheets, 0), result))
}

/// Store one calamine value. Returns true if a cell was created.
fn import_value(sheet: &mut Sheet, row: usize, col: usize, cell: &Data, result: &mut ImportResult) -> bool {
    match cell {
        Data::Empty => return false,
        Data::String(s) => {
            if s.is_empty() {
                return false;
            }
            // Text stays text: a "20" label must not turn into a number
            sheet.set_text(row, col, s);
        }
        Data::Float(n) => sheet.set_number(row, col, *n),
        Data::Int(n) => sheet.set_number(row, col, *n as f64),
        Data::Bool(b) => sheet.set_cell_value(row, col, CellValue::Bool(*b)),
        Data::Error(e) => sheet.set_text(row, col, &e.to_string()),
        Data::DateTime(dt) => {
            sheet.set_number(row, col, dt.as_f64());
            sheet.set_number_format(row, col, NumberFormat::Date);
            result.dates_imported += 1;
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => sheet.set_text(row, col, s),
    }
    true
}

fn is_zip_format(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("xlsx") | Some("xlsm")
    )
}

fn apply_imported_layout(
    sheet: &mut Sheet,
    layout: &SheetLayout,
    workbook_layout: &WorkbookLayout,
    result: &mut ImportResult,
) {
    sheet.col_widths.extend(&layout.col_widths);
    sheet.row_heights.extend(&layout.row_heights);

    // Blank cells keep their style too (bordered input boxes). A General
    // style never replaces the date format calamine already set.
    for &(row, col, style) in &layout.cell_styles {
        let Some(style) = workbook_layout.style(style) else {
            continue;
        };
        if style.is_default() {
            continue;
        }
        let mut format = style.clone();
        let current = sheet.get_format(row, col).number_format;
        if format.number_format == NumberFormat::General {
            format.number_format = current;
        } else if current == NumberFormat::General && !sheet.is_blank(row, col) {
            result.number_formats_imported += 1;
        }
        if format.has_style() {
            result.styles_imported += 1;
        }
        sheet.set_format(row, col, format);
    }

    for &(r1, c1, r2, c2) in &layout.merged_regions {
        match sheet.add_merge(MergedRegion::new((r1, c1), (r2, c2))) {
            Ok(()) => result.merges_imported += 1,
            Err(e) => {
                result.merges_dropped += 1;
                result.warnings.push(format!("Sheet '{}': merge dropped ({})", sheet.name, e));
            }
        }
    }
}

/// Export a workbook to xlsx with number formats, fonts, fills, borders,
/// alignment, merges and sheet geometry.
pub fn export(workbook: &Workbook, path: &Path) -> Result<ExportResult, String> {
    let start_time = Instant::now();
    let mut result = ExportResult::default();

    let mut xlsx_workbook = XlsxWorkbook::new();

    for sheet in workbook.sheets() {
        let worksheet = xlsx_workbook
            .add_worksheet()
            .set_name(&sheet.name)
            .map_err(|e| format!("Failed to create sheet '{}': {}", sheet.name, e))?;

        // merge_range() blanks the whole region in the origin's style; the
        // origin value is written over it by export_sheet_cells()
        for merge in &sheet.merged_regions {
            let merge_format = build_format(&sheet.get_format(merge.start.0, merge.start.1));
            worksheet
                .merge_range(
                    merge.start.0 as u32,
                    merge.start.1 as u16,
                    merge.end.0 as u32,
                    merge.end.1 as u16,
                    "",
                    &merge_format,
                )
                .map_err(|e| format!("Failed to write merge: {}", e))?;
            result.merges_exported += 1;
        }

        let counts = export_sheet_cells(sheet, worksheet)?;
        result.cells_exported += counts.cells;
        result.formulas_exported += counts.formulas;
        result.styled_blanks_exported += counts.styled_blanks;

        apply_layout(sheet, worksheet)?;
        result.sheets_exported += 1;
    }

    if let Ok(ws) = xlsx_workbook.worksheet_from_index(workbook.active_sheet_index()) {
        let _ = ws.set_active(true);
    }

    xlsx_workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file: {}", e))?;

    result.export_duration_ms = start_time.elapsed().as_millis();
    log::debug!("exported {}: {}", path.display(), result.summary());
    Ok(result)
}

/// Excel format for a cell. Defaults are left unset so an unstyled cell
/// gets the writer's default format.
fn build_format(cell_format: &CellFormat) -> Format {
    let mut format = Format::new();

    if let Some(code) = cell_format.number_format.excel_code() {
        format = format.set_num_format(code);
    }

    // Font
    if cell_format.bold {
        format = format.set_bold();
    }
    if cell_format.italic {
        format = format.set_italic();
    }
    if cell_format.underline {
        format = format.set_underline(FormatUnderline::Single);
    }
    if cell_format.strikethrough {
        format = format.set_font_strikethrough();
    }
    if let Some(size) = cell_format.font_size {
        format = format.set_font_size(size);
    }
    if let Some(color) = cell_format.font_color {
        format = format.set_font_color(Color::RGB(color));
    }
    if let Some(ref family) = cell_format.font_family {
        format = format.set_font_name(family);
    }

    // Alignment
    format = match cell_format.alignment {
        Alignment::General => format,
        Alignment::Left => format.set_align(FormatAlign::Left),
        Alignment::Center => format.set_align(FormatAlign::Center),
        Alignment::Right => format.set_align(FormatAlign::Right),
        Alignment::CenterAcross => format.set_align(FormatAlign::CenterAcross),
    };
    format = match cell_format.vertical_alignment {
        VerticalAlignment::Top => format.set_align(FormatAlign::Top),
        VerticalAlignment::Center => format.set_align(FormatAlign::VerticalCenter),
        VerticalAlignment::Bottom => format,
    };
    if cell_format.wrap_text {
        format = format.set_text_wrap();
    }

    if let Some(color) = cell_format.background_color {
        format = format.set_background_color(Color::RGB(color));
    }

    // Borders
    let top = &cell_format.border_top;
    if !top.is_none() {
        format = format.set_border_top(border_style_to_xlsx(top.style));
        if let Some(color) = top.color {
            format = format.set_border_top_color(Color::RGB(color));
        }
    }
    let right = &cell_format.border_right;
    if !right.is_none() {
        format = format.set_border_right(border_style_to_xlsx(right.style));
        if let Some(color) = right.color {
            format = format.set_border_right_color(Color::RGB(color));
        }
    }
    let bottom = &cell_format.border_bottom;
    if !bottom.is_none() {
        format = format.set_border_bottom(border_style_to_xlsx(bottom.style));
        if let Some(color) = bottom.color {
            format = format.set_border_bottom_color(Color::RGB(color));
        }
    }
    let left = &cell_format.border_left;
    if !left.is_none() {
        format = format.set_border_left(border_style_to_xlsx(left.style));
        if let Some(color) = left.color {
            format = format.set_border_left_color(Color::RGB(color));
        }
    }

    format
}

fn border_style_to_xlsx(style: BorderStyle) -> FormatBorder {
    match style {
        BorderStyle::None => FormatBorder::None,
        BorderStyle::Hair => FormatBorder::Hair,
        BorderStyle::Thin => FormatBorder::Thin,
        BorderStyle::Dotted => FormatBorder::Dotted,
        BorderStyle::Dashed => FormatBorder::Dashed,
        BorderStyle::Medium => FormatBorder::Medium,
        BorderStyle::MediumDashed => FormatBorder::MediumDashed,
        BorderStyle::Thick => FormatBorder::Thick,
        BorderStyle::Double => FormatBorder::Double,
    }
}

#[derive(Debug, Default)]
struct CellCounts {
    cells: usize,
    formulas: usize,
    styled_blanks: usize,
}

fn export_sheet_cells(sheet: &Sheet, worksheet: &mut Worksheet) -> Result<CellCounts, String> {
    let mut counts = CellCounts::default();

    for ((row, col), cell) in sheet.cells_iter() {
        let row32 = *row as u32;
        let col16 = *col as u16;
        let write_err = |e: rust_xlsxwriter::XlsxError| {
            format!("Failed to write {}!{}: {}", sheet.name, cell_address(*row, *col), e)
        };
        let format = build_format(&cell.format);

        // Covered merge cells hold no value in Excel, only their own edges
        if cell.value.is_empty() || sheet.is_merge_hidden(*row, *col) {
            if !cell.format.is_default() {
                worksheet.write_blank(row32, col16, &format).map_err(write_err)?;
                counts.styled_blanks += 1;
            }
            continue;
        }

        match &cell.value {
            CellValue::Empty => {}
            CellValue::Text(s) => {
                worksheet
                    .write_string_with_format(row32, col16, s, &format)
                    .map_err(write_err)?;
            }
            CellValue::Number(n) => {
                worksheet
                    .write_number_with_format(row32, col16, *n, &format)
                    .map_err(write_err)?;
            }
            CellValue::Bool(b) => {
                worksheet
                    .write_boolean_with_format(row32, col16, *b, &format)
                    .map_err(write_err)?;
            }
            CellValue::Formula { source, .. } => {
                let formula = source.strip_prefix('=').unwrap_or(source);
                worksheet
                    .write_formula_with_format(row32, col16, formula, &format)
                    .map_err(write_err)?;
                counts.formulas += 1;
            }
        }
        counts.cells += 1;
    }

    Ok(counts)
}

fn apply_layout(sheet: &Sheet, worksheet: &mut Worksheet) -> Result<(), String> {
    for (col, width) in &sheet.col_widths {
        worksheet
            .set_column_width(*col as u16, *width)
            .map_err(|e| format!("Failed to set column {} width: {}", col, e))?;
    }
    for (row, height) in &sheet.row_heights {
        worksheet
            .set_row_height(*row as u32, *height)
            .map_err(|e| format!("Failed to set row {} height: {}", row, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubefill_engine::cell::CellBorder;

    #[test]
    fn test_import_result_summary() {
        let result = ImportResult {
            sheets_imported: 3,
            cells_imported: 120,
            formulas_imported: 4,
            merges_imported: 2,
            ..Default::default()
        };
        assert_eq!(result.summary(), "3 sheets · 120 cells · 4 formulas · 2 merged regions");
        assert!(!result.has_warnings());
    }

    #[test]
    fn test_export_result_summary() {
        let result = ExportResult {
            sheets_exported: 1,
            cells_exported: 10,
            ..Default::default()
        };
        assert_eq!(result.summary(), "1 sheet, 10 cells");
    }

    fn formula(source: &str) -> CellValue {
        CellValue::Formula { source: source.to_string(), cached: None }
    }

    #[test]
    fn test_export_basic() {
        let mut sheet = Sheet::new_with_name(100, 26, "Sheet1");
        sheet.set_text(0, 0, "Hello");
        sheet.set_number(0, 1, 123.0);
        sheet.set_cell_value(1, 0, formula("=B1*2"));
        let workbook = Workbook::from_sheets(vec![sheet], 0);

        let temp_dir = tempfile::tempdir().unwrap();
        let export_path = temp_dir.path().join("basic.xlsx");

        let result = export(&workbook, &export_path).unwrap();
        assert_eq!(result.sheets_exported, 1);
        assert_eq!(result.cells_exported, 3);
        assert_eq!(result.formulas_exported, 1);
        assert_eq!(result.styled_blanks_exported, 0);
        assert!(std::fs::metadata(&export_path).unwrap().len() > 100);
    }

    #[test]
    fn test_roundtrip_preserves_values_formats_and_layout() {
        let mut sheet = Sheet::new_with_name(MAX_ROWS, MAX_COLS, "M20");
        sheet.set_text(11, 1, "M20");
        sheet.set_number(16, 2, 46023.0);
        sheet.set_number_format(16, 2, NumberFormat::Date);
        sheet.set_number(24, 2, 8.1);
        sheet.set_number_format(24, 2, NumberFormat::Fixed { decimals: 3 });
        sheet.set_cell_value(26, 7, formula("=AVERAGE(C27:E27)"));
        sheet.add_merge(MergedRegion::new((17, 2), (17, 4))).unwrap();
        sheet.col_widths.insert(1, 20.0);
        sheet.row_heights.insert(0, 30.0);
        let mut calendar = Sheet::new_with_name(MAX_ROWS, MAX_COLS, "Calendar");
        calendar.set_text(0, 0, "01-01-2026");
        let workbook = Workbook::from_sheets(vec![sheet, calendar], 0);

        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("roundtrip.xlsx");
        export(&workbook, &path).unwrap();

        let (imported, result) = import(&path).unwrap();
        let names: Vec<&str> = imported.sheets().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["M20", "Calendar"]);
        assert_eq!(result.formulas_imported, 1);
        assert_eq!(result.merges_imported, 1);

        let sheet = imported.sheet(0).unwrap();
        assert_eq!(sheet.get_display(11, 1), "M20");
        assert_eq!(sheet.get_display(16, 2), "01-01-2026");
        assert_eq!(sheet.get_cell_value(24, 2).as_number(), Some(8.1));
        assert_eq!(sheet.get_display(24, 2), "8.100");
        assert!(result.number_formats_imported >= 1);
        assert_eq!(sheet.get_cell_value(26, 7).raw_display(), "=AVERAGE(C27:E27)");
        assert_eq!(sheet.merged_regions, vec![MergedRegion::new((17, 2), (17, 4))]);
        assert!(sheet.col_widths.get(&1).copied().unwrap_or(0.0) >= 20.0);
        assert_eq!(sheet.row_heights.get(&0), Some(&30.0));

        assert_eq!(imported.sheet(1).unwrap().get_display(0, 0), "01-01-2026");
    }

    #[test]
    fn test_roundtrip_preserves_fonts_fills_and_borders() {
        let thin = CellBorder::new(BorderStyle::Thin);
        let label = CellFormat {
            bold: true,
            font_family: Some("Arial".to_string()),
            font_size: Some(14.0),
            font_color: Some(0xC00000),
            background_color: Some(0xFFFF00),
            alignment: Alignment::Center,
            vertical_alignment: VerticalAlignment::Center,
            border_top: thin,
            border_right: thin,
            border_bottom: thin,
            border_left: CellBorder { style: BorderStyle::Medium, color: Some(0x0000FF) },
            ..Default::default()
        };
        let input_box = CellFormat {
            number_format: NumberFormat::Fixed { decimals: 3 },
            border_bottom: CellBorder::new(BorderStyle::Double),
            wrap_text: true,
            ..Default::default()
        };

        let mut sheet = Sheet::new_with_name(MAX_ROWS, MAX_COLS, "M20");
        sheet.set_text(11, 1, "M20");
        sheet.set_format(11, 1, label.clone());
        // Empty until populated; the border and number format must survive
        sheet.set_format(24, 2, input_box.clone());
        sheet.set_text(20, 0, "plain");
        let workbook = Workbook::from_sheets(vec![sheet], 0);

        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("styles.xlsx");
        let exported = export(&workbook, &path).unwrap();
        assert_eq!(exported.styled_blanks_exported, 1);

        let (imported, result) = import(&path).unwrap();
        assert_eq!(result.styles_imported, 2);
        let sheet = imported.sheet(0).unwrap();

        assert_eq!(sheet.get_display(11, 1), "M20");
        assert_eq!(sheet.get_format(11, 1), label);

        assert!(sheet.is_blank(24, 2));
        assert_eq!(sheet.get_format(24, 2), input_box);

        assert!(sheet.get_format(20, 0).is_default());
    }

    #[test]
    fn test_merged_region_takes_origin_style() {
        let boxed = CellFormat {
            border_bottom: CellBorder::new(BorderStyle::Thin),
            ..Default::default()
        };
        let mut sheet = Sheet::new_with_name(MAX_ROWS, MAX_COLS, "M20");
        sheet.set_text(17, 2, "01-01-2026");
        sheet.set_format(17, 2, boxed.clone());
        sheet.add_merge(MergedRegion::new((17, 2), (17, 4))).unwrap();
        let workbook = Workbook::from_sheets(vec![sheet], 0);

        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("merge.xlsx");
        export(&workbook, &path).unwrap();

        let (imported, _) = import(&path).unwrap();
        let sheet = imported.sheet(0).unwrap();
        for col in 2..=4 {
            assert_eq!(sheet.get_format(17, col).border_bottom, boxed.border_bottom, "col {col}");
        }
    }

    #[test]
    fn test_import_keeps_numeric_text_as_text() {
        let mut sheet = Sheet::new_with_name(MAX_ROWS, MAX_COLS, "Sheet1");
        sheet.set_text(0, 0, "20");
        let workbook = Workbook::from_sheets(vec![sheet], 0);

        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("text.xlsx");
        export(&workbook, &path).unwrap();

        let (imported, _) = import(&path).unwrap();
        assert_eq!(
            imported.sheet(0).unwrap().get_cell_value(0, 0),
            &CellValue::Text("20".to_string())
        );
    }

    #[test]
    fn test_import_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = import(&temp_dir.path().join("nope.xlsx")).unwrap_err();
        assert!(err.starts_with("Failed to open Excel file"), "{err}");
    }
}
