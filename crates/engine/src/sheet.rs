use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::cell::{Cell, CellFormat, CellValue, NumberFormat};
use super::cell_ref::cell_address;

/// Default sheet dimensions (matches the xlsx import limits)
pub const DEFAULT_ROWS: usize = 65536;
pub const DEFAULT_COLS: usize = 256;

/// A rectangular merged region, inclusive on both corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedRegion {
    /// (row, col) of the top-left (origin) cell
    pub start: (usize, usize),
    /// (row, col) of the bottom-right cell
    pub end: (usize, usize),
}

impl MergedRegion {
    pub fn new(start: (usize, usize), end: (usize, usize)) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.start.0 && row <= self.end.0 && col >= self.start.1 && col <= self.end.1
    }

    fn overlaps(&self, other: &MergedRegion) -> bool {
        self.start.0 <= other.end.0
            && other.start.0 <= self.end.0
            && self.start.1 <= other.end.1
            && other.start.1 <= self.end.1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    cells: HashMap<(usize, usize), Cell>,
    pub rows: usize,
    pub cols: usize,
    pub merged_regions: Vec<MergedRegion>,
    /// Column index -> width in Excel character units
    pub col_widths: HashMap<usize, f64>,
    /// Row index -> height in points
    pub row_heights: HashMap<usize, f64>,
}

impl Sheet {
    pub fn new_with_name(rows: usize, cols: usize, name: &str) -> Self {
        Self {
            name: name.to_string(),
            cells: HashMap::new(),
            rows,
            cols,
            merged_regions: Vec::new(),
            col_widths: HashMap::new(),
            row_heights: HashMap::new(),
        }
    }

    /// Set a cell to an already-typed value, keeping its format
    pub fn set_cell_value(&mut self, row: usize, col: usize, value: CellValue) {
        let cell = self.cells.entry((row, col)).or_insert_with(Cell::new);
        cell.value = value;
    }

    pub fn set_number(&mut self, row: usize, col: usize, value: f64) {
        self.set_cell_value(row, col, CellValue::Number(value));
    }

    /// Set a cell to literal text (never reinterpreted as a number or formula)
    pub fn set_text(&mut self, row: usize, col: usize, value: &str) {
        self.set_cell_value(row, col, CellValue::Text(value.to_string()));
    }

    /// Replace a cell's whole format. Creates a blank cell when needed, so
    /// empty bordered or filled cells keep their style.
    pub fn set_format(&mut self, row: usize, col: usize, format: CellFormat) {
        let cell = self.cells.entry((row, col)).or_insert_with(Cell::new);
        cell.format = format;
    }

    pub fn set_number_format(&mut self, row: usize, col: usize, number_format: NumberFormat) {
        let cell = self.cells.entry((row, col)).or_insert_with(Cell::new);
        cell.format.number_format = number_format;
    }

    pub fn get_format(&self, row: usize, col: usize) -> CellFormat {
        self.cells
            .get(&(row, col))
            .map(|c| c.format.clone())
            .unwrap_or_default()
    }

    /// Get a reference to a cell's value (Empty if the cell was never set)
    pub fn get_cell_value(&self, row: usize, col: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.cells.get(&(row, col)).map(|c| &c.value).unwrap_or(&EMPTY)
    }

    pub fn get_cell_opt(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Display text with number formatting applied
    pub fn get_display(&self, row: usize, col: usize) -> String {
        match self.cells.get(&(row, col)) {
            Some(cell) => cell.value.formatted_display(&cell.format),
            None => String::new(),
        }
    }

    pub fn is_blank(&self, row: usize, col: usize) -> bool {
        self.get_cell_value(row, col).is_empty()
    }

    /// Iterate over all populated cells
    pub fn cells_iter(&self) -> impl Iterator<Item = (&(usize, usize), &Cell)> {
        self.cells.iter()
    }

    // =========================================================================
    // Merged regions
    // =========================================================================

    /// Add a merged region. Rejects single cells, inverted corners and overlaps.
    pub fn add_merge(&mut self, region: MergedRegion) -> Result<(), String> {
        if region.end.0 < region.start.0 || region.end.1 < region.start.1 {
            return Err(format!(
                "invalid merge {}:{}",
                cell_address(region.start.0, region.start.1),
                cell_address(region.end.0, region.end.1)
            ));
        }
        if region.start == region.end {
            return Err(format!(
                "single-cell merge {}",
                cell_address(region.start.0, region.start.1)
            ));
        }
        if let Some(existing) = self.merged_regions.iter().find(|m| m.overlaps(&region)) {
            return Err(format!(
                "{}:{} overlaps {}:{}",
                cell_address(region.start.0, region.start.1),
                cell_address(region.end.0, region.end.1),
                cell_address(existing.start.0, existing.start.1),
                cell_address(existing.end.0, existing.end.1)
            ));
        }
        self.merged_regions.push(region);
        Ok(())
    }

    pub fn merge_at(&self, row: usize, col: usize) -> Option<&MergedRegion> {
        self.merged_regions.iter().find(|m| m.contains(row, col))
    }

    /// True for cells covered by a merge other than its origin
    pub fn is_merge_hidden(&self, row: usize, col: usize) -> bool {
        self.merge_at(row, col)
            .map(|m| m.start != (row, col))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{BorderStyle, CellBorder};

    #[test]
    fn test_set_and_display() {
        let mut sheet = Sheet::new_with_name(100, 26, "M20");
        sheet.set_text(11, 1, "M20");
        sheet.set_number(24, 2, 8.125);

        assert_eq!(sheet.get_display(11, 1), "M20");
        assert_eq!(sheet.get_cell_value(24, 2), &CellValue::Number(8.125));
        assert_eq!(sheet.get_display(0, 0), "");
        assert!(sheet.is_blank(0, 0));
    }

    #[test]
    fn test_set_text_is_literal() {
        let mut sheet = Sheet::new_with_name(10, 10, "M20");
        sheet.set_text(0, 0, "08-01-2026");
        sheet.set_text(0, 1, "12");
        assert_eq!(sheet.get_cell_value(0, 0), &CellValue::Text("08-01-2026".to_string()));
        assert_eq!(sheet.get_cell_value(0, 1), &CellValue::Text("12".to_string()));
    }

    #[test]
    fn test_format_persists_with_value() {
        let mut sheet = Sheet::new_with_name(10, 10, "M20");
        sheet.set_number_format(0, 0, NumberFormat::Fixed { decimals: 3 });
        sheet.set_number(0, 0, 8.1);

        assert_eq!(sheet.get_format(0, 0).number_format, NumberFormat::Fixed { decimals: 3 });
        assert_eq!(sheet.get_display(0, 0), "8.100");
    }

    #[test]
    fn test_date_display() {
        let mut sheet = Sheet::new_with_name(10, 10, "M20");
        sheet.set_number(16, 2, 46023.0);
        sheet.set_number_format(16, 2, NumberFormat::Date);
        assert_eq!(sheet.get_display(16, 2), "01-01-2026");
    }

    #[test]
    fn test_set_format_on_blank_cell() {
        let mut sheet = Sheet::new_with_name(10, 10, "M20");
        let boxed = CellFormat {
            bold: true,
            border_bottom: CellBorder::new(BorderStyle::Thin),
            ..Default::default()
        };
        sheet.set_format(3, 3, boxed.clone());

        assert!(sheet.is_blank(3, 3));
        assert_eq!(sheet.cells_iter().count(), 1);
        assert_eq!(sheet.get_format(3, 3), boxed);

        // Writing a value later keeps the style
        sheet.set_number(3, 3, 12.5);
        assert_eq!(sheet.get_format(3, 3), boxed);
    }

    #[test]
    fn test_add_merge_rejects_overlap() {
        let mut sheet = Sheet::new_with_name(10, 10, "M20");
        assert!(sheet.add_merge(MergedRegion::new((0, 0), (1, 2))).is_ok());
        let err = sheet.add_merge(MergedRegion::new((1, 2), (3, 3))).unwrap_err();
        assert!(err.contains("overlaps"), "{err}");
        assert!(sheet.add_merge(MergedRegion::new((2, 0), (2, 1))).is_ok());
        assert_eq!(sheet.merged_regions.len(), 2);
    }

    #[test]
    fn test_add_merge_rejects_invalid() {
        let mut sheet = Sheet::new_with_name(10, 10, "M20");
        assert!(sheet.add_merge(MergedRegion::new((3, 3), (1, 1))).is_err());
        assert!(sheet.add_merge(MergedRegion::new((2, 2), (2, 2))).is_err());
        assert!(sheet.merged_regions.is_empty());
    }

    #[test]
    fn test_merge_hidden_cells() {
        let mut sheet = Sheet::new_with_name(10, 10, "M20");
        sheet.add_merge(MergedRegion::new((17, 2), (17, 4))).unwrap();
        assert!(!sheet.is_merge_hidden(17, 2));
        assert!(sheet.is_merge_hidden(17, 3));
        assert!(sheet.is_merge_hidden(17, 4));
        assert!(!sheet.is_merge_hidden(17, 5));
    }
}
