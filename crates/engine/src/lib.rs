pub mod cell;
pub mod cell_ref;
pub mod sheet;
pub mod workbook;
