// Workbook file I/O

pub mod xlsx;
pub mod xlsx_layout;
pub mod xlsx_styles;
