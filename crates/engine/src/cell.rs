use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Number format type
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub enum NumberFormat {
    #[default]
    General,
    /// Fixed number of decimal places (e.g. `0.000`)
    Fixed { decimals: u8 },
    /// Excel serial date (1900 system), displayed as DD-MM-YYYY
    Date,
}

impl NumberFormat {
    /// Excel number format code for export
    pub fn excel_code(&self) -> Option<String> {
        match self {
            NumberFormat::General => None,
            NumberFormat::Fixed { decimals: 0 } => Some("0".to_string()),
            NumberFormat::Fixed { decimals } => Some(format!("0.{}", "0".repeat(*decimals as usize))),
            NumberFormat::Date => Some("dd-mm-yyyy".to_string()),
        }
    }
}

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Alignment {
    /// Excel default: numbers right, text left
    #[default]
    General,
    Left,
    Center,
    Right,
    CenterAcross,
}

/// Vertical text alignment
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum VerticalAlignment {
    Top,
    Center,
    #[default]
    Bottom,
}

/// Line style of one cell edge
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum BorderStyle {
    #[default]
    None,
    Hair,
    Thin,
    Dotted,
    Dashed,
    Medium,
    MediumDashed,
    Thick,
    Double,
}

/// One cell edge. Colors are `0xRRGGBB`; None is automatic (black).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CellBorder {
    pub style: BorderStyle,
    pub color: Option<u32>,
}

impl CellBorder {
    pub const fn new(style: BorderStyle) -> Self {
        Self { style, color: None }
    }

    pub fn is_none(&self) -> bool {
        self.style == BorderStyle::None
    }
}

/// Cell formatting options.
///
/// Font family and size are only set where they differ from the workbook
/// default font. Colors are `0xRRGGBB`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CellFormat {
    pub number_format: NumberFormat,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub font_color: Option<u32>,
    /// Solid fill
    pub background_color: Option<u32>,
    pub alignment: Alignment,
    pub vertical_alignment: VerticalAlignment,
    pub wrap_text: bool,
    pub border_top: CellBorder,
    pub border_right: CellBorder,
    pub border_bottom: CellBorder,
    pub border_left: CellBorder,
}

impl CellFormat {
    /// True when anything besides the number format differs from default
    pub fn has_style(&self) -> bool {
        let plain = CellFormat { number_format: self.number_format, ..CellFormat::default() };
        *self != plain
    }

    /// True when nothing at all is set
    pub fn is_default(&self) -> bool {
        *self == CellFormat::default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Formula source (with leading `=`) and the value cached by the last
    /// application that calculated the file, if any
    Formula { source: String, cached: Option<Box<CellValue>> },
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Text as typed: formulas keep their leading `=`
    pub fn raw_display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => Self::format_number(*n, &NumberFormat::General),
            CellValue::Bool(b) => if *b { "TRUE".to_string() } else { "FALSE".to_string() },
            CellValue::Formula { source, .. } => source.clone(),
        }
    }

    /// Format a number according to the specified format
    pub fn format_number(n: f64, format: &NumberFormat) -> String {
        match format {
            NumberFormat::General => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", n as i64)
                } else {
                    format!("{}", n)
                }
            }
            NumberFormat::Fixed { decimals } => {
                format!("{:.*}", *decimals as usize, n)
            }
            NumberFormat::Date => match excel_serial_to_date(n) {
                Some(date) => date.format("%d-%m-%Y").to_string(),
                None => Self::format_number(n, &NumberFormat::General),
            },
        }
    }

    /// Display value with formatting applied
    pub fn formatted_display(&self, format: &CellFormat) -> String {
        match self {
            CellValue::Number(n) => Self::format_number(*n, &format.number_format),
            CellValue::Formula { cached: Some(cached), .. } => cached.formatted_display(format),
            other => other.raw_display(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse().ok(),
            CellValue::Formula { cached: Some(cached), .. } => cached.as_number(),
            _ => None,
        }
    }
}

/// Convert an Excel serial (1900 date system) to a calendar date.
///
/// Serial 1 is 1900-01-01; the epoch is shifted to 1899-12-30 to absorb
/// Excel's phantom 1900-02-29. Serials before 1900-03-01 are off by one,
/// exactly as they are in Excel.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_days(Days::new(serial.floor() as u64))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub format: CellFormat,
}

impl Cell {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_general() {
        assert_eq!(CellValue::format_number(20.0, &NumberFormat::General), "20");
        assert_eq!(CellValue::format_number(8.125, &NumberFormat::General), "8.125");
    }

    #[test]
    fn test_format_number_fixed() {
        assert_eq!(CellValue::format_number(8.1, &NumberFormat::Fixed { decimals: 3 }), "8.100");
        assert_eq!(CellValue::format_number(366.456, &NumberFormat::Fixed { decimals: 2 }), "366.46");
    }

    #[test]
    fn test_format_number_date() {
        // 46023 = 2026-01-01
        assert_eq!(CellValue::format_number(46023.0, &NumberFormat::Date), "01-01-2026");
        assert_eq!(CellValue::format_number(46030.0, &NumberFormat::Date), "08-01-2026");
        // Invalid serials fall back to the plain number
        assert_eq!(CellValue::format_number(-3.0, &NumberFormat::Date), "-3");
    }

    #[test]
    fn test_excel_code() {
        assert_eq!(NumberFormat::General.excel_code(), None);
        assert_eq!(NumberFormat::Fixed { decimals: 3 }.excel_code().as_deref(), Some("0.000"));
        assert_eq!(NumberFormat::Fixed { decimals: 0 }.excel_code().as_deref(), Some("0"));
        assert_eq!(NumberFormat::Date.excel_code().as_deref(), Some("dd-mm-yyyy"));
    }

    #[test]
    fn test_formula_displays_cached_value() {
        let value = CellValue::Formula {
            source: "=Summary!B2".to_string(),
            cached: Some(Box::new(CellValue::Text("M25".to_string()))),
        };
        assert_eq!(value.formatted_display(&CellFormat::default()), "M25");
        assert_eq!(value.raw_display(), "=Summary!B2");

        let uncached = CellValue::Formula { source: "=1+1".to_string(), cached: None };
        assert_eq!(uncached.formatted_display(&CellFormat::default()), "=1+1");
    }

    #[test]
    fn test_has_style_ignores_number_format() {
        let mut format = CellFormat { number_format: NumberFormat::Fixed { decimals: 3 }, ..Default::default() };
        assert!(!format.has_style());
        assert!(!format.is_default());

        format.border_bottom = CellBorder::new(BorderStyle::Thin);
        assert!(format.has_style());

        let bold = CellFormat { bold: true, ..Default::default() };
        assert!(bold.has_style());
        assert!(CellFormat::default().is_default());
    }

    #[test]
    fn test_is_empty() {
        assert!(CellValue::Empty.is_empty());
        assert!(CellValue::Text(String::new()).is_empty());
        assert!(!CellValue::Number(0.0).is_empty());
    }
}
