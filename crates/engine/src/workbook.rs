use serde::{Deserialize, Serialize};

use crate::sheet::Sheet;

/// An ordered collection of sheets, addressed by position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workbook {
    sheets: Vec<Sheet>,
    active_sheet: usize,
}

impl Workbook {
    /// Create a workbook from sheets (for import)
    pub fn from_sheets(sheets: Vec<Sheet>, active: usize) -> Self {
        let active_sheet = active.min(sheets.len().saturating_sub(1));
        Self { sheets, active_sheet }
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn active_sheet_index(&self) -> usize {
        self.active_sheet
    }

    pub fn active_sheet(&self) -> Option<&Sheet> {
        self.sheets.get(self.active_sheet)
    }

    pub fn sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index)
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheets_mut(&mut self) -> &mut [Sheet] {
        &mut self.sheets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_sheets_clamps_active() {
        let sheets = vec![Sheet::new_with_name(10, 10, "A"), Sheet::new_with_name(10, 10, "B")];
        let wb = Workbook::from_sheets(sheets, 7);
        assert_eq!(wb.sheet_count(), 2);
        assert_eq!(wb.active_sheet_index(), 1);
        assert_eq!(wb.active_sheet().map(|s| s.name.as_str()), Some("B"));
    }

    #[test]
    fn test_empty_workbook_has_no_active_sheet() {
        let wb = Workbook::from_sheets(Vec::new(), 0);
        assert_eq!(wb.active_sheet_index(), 0);
        assert!(wb.active_sheet().is_none());
    }

    #[test]
    fn test_sheet_mut_edits_in_place() {
        let mut wb = Workbook::from_sheets(vec![Sheet::new_with_name(10, 10, "M20")], 0);
        wb.sheet_mut(0).unwrap().set_text(11, 1, "M20");
        assert_eq!(wb.sheets()[0].get_display(11, 1), "M20");
        assert!(wb.sheet_mut(1).is_none());
    }
}
