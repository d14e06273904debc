//! Casting date -> testing dates lookup, read from a calendar workbook.

use std::collections::HashMap;
use std::path::Path;

use cubefill_engine::sheet::Sheet;
use cubefill_io::xlsx;

use crate::error::CalendarError;
use crate::layout::CalendarLayout;

/// Testing dates for one casting date, as display text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CalendarEntry {
    pub seven_day: String,
    pub twenty_eight_day: String,
}

/// Read-only after loading.
#[derive(Debug, Clone, Default)]
pub struct Calendar {
    entries: HashMap<String, CalendarEntry>,
}

impl Calendar {
    /// Build from explicit entries (keys are trimmed; later keys win).
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, CalendarEntry)>,
        K: AsRef<str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(key, entry)| (key.as_ref().trim().to_string(), entry))
                .collect(),
        }
    }

    /// Read the calendar table from a sheet with the standard layout.
    ///
    /// Rows are read until the first blank key cell; a table without rows
    /// is an error.
    pub fn from_sheet(sheet: &Sheet) -> Result<Self, CalendarError> {
        Self::from_sheet_with_layout(sheet, &CalendarLayout::STANDARD)
    }

    pub fn from_sheet_with_layout(sheet: &Sheet, layout: &CalendarLayout) -> Result<Self, CalendarError> {
        let mut entries = HashMap::new();
        let mut row = layout.first_row;
        while row < sheet.rows {
            let key = sheet.get_display(row, layout.key_col).trim().to_string();
            if key.is_empty() {
                break;
            }
            entries.insert(
                key,
                CalendarEntry {
                    seven_day: sheet.get_display(row, layout.seven_day_col).trim().to_string(),
                    twenty_eight_day: sheet
                        .get_display(row, layout.twenty_eight_day_col)
                        .trim()
                        .to_string(),
                },
            );
            row += 1;
        }

        if entries.is_empty() {
            return Err(CalendarError::Empty);
        }
        Ok(Self { entries })
    }

    /// Load the calendar from the first sheet of a workbook file.
    pub fn load(path: &Path) -> Result<Self, CalendarError> {
        if !path.is_file() {
            return Err(CalendarError::Missing(path.to_path_buf()));
        }
        let (workbook, _) = xlsx::import(path).map_err(CalendarError::Unreadable)?;
        let sheet = workbook
            .sheet(0)
            .ok_or_else(|| CalendarError::Unreadable("workbook has no sheets".to_string()))?;
        Self::from_sheet(sheet)
    }

    /// Exact match on the trimmed key
    pub fn lookup(&self, casting_date: &str) -> Option<&CalendarEntry> {
        self.entries.get(casting_date.trim())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
