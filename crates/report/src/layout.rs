//! Fixed cell positions of the report template, the legacy grade files and
//! the calendar workbook. Other tools produce and consume these files, so
//! the defaults must not move.

use cubefill_engine::cell_ref::CellRef;

/// Report template: one sheet per specimen set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateLayout {
    /// Grade label (B12)
    pub label: CellRef,
    /// Casting date (C17), the calendar key
    pub casting_date: CellRef,
    /// 7-day testing date (C18)
    pub seven_day_date: CellRef,
    /// 28-day testing date (F18)
    pub twenty_eight_day_date: CellRef,
    /// First of six weights (C25..H25)
    pub weights: CellRef,
    /// First of three 7-day strengths (C27..E27)
    pub strength_7d: CellRef,
    /// First of three 28-day strengths (F27..H27)
    pub strength_28d: CellRef,
}

impl TemplateLayout {
    pub const STANDARD: TemplateLayout = TemplateLayout {
        label: CellRef::new(11, 1),
        casting_date: CellRef::new(16, 2),
        seven_day_date: CellRef::new(17, 2),
        twenty_eight_day_date: CellRef::new(17, 5),
        weights: CellRef::new(24, 2),
        strength_7d: CellRef::new(26, 2),
        strength_28d: CellRef::new(26, 5),
    };
}

impl Default for TemplateLayout {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Legacy grade file: one data row per specimen set, header in row 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyLayout {
    /// 0-based row of the first data row (row 2)
    pub first_data_row: usize,
    /// First of six weight columns (B..G)
    pub weight_col: usize,
    /// First of six strength columns (I..N): three 7-day, then three 28-day
    pub strength_col: usize,
    /// Data ends at the first blank cell in this column (B)
    pub terminator_col: usize,
}

impl LegacyLayout {
    pub const STANDARD: LegacyLayout = LegacyLayout {
        first_data_row: 1,
        weight_col: 1,
        strength_col: 8,
        terminator_col: 1,
    };
}

impl Default for LegacyLayout {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Calendar workbook: casting date, 7-day date, 28-day date per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarLayout {
    pub first_row: usize,
    pub key_col: usize,
    pub seven_day_col: usize,
    pub twenty_eight_day_col: usize,
}

impl CalendarLayout {
    pub const STANDARD: CalendarLayout = CalendarLayout {
        first_row: 1,
        key_col: 0,
        seven_day_col: 1,
        twenty_eight_day_col: 2,
    };
}

impl Default for CalendarLayout {
    fn default() -> Self {
        Self::STANDARD
    }
}
