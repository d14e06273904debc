//! Cell styles from styles.xml.
//!
//! calamine reports dates but nothing else about formatting, so the importer
//! resolves each cell's `s` attribute (a cellXfs index) through the table
//! built here: number format, font, solid fill, borders and alignment.
//!
//! Colors come back as `0xRRGGBB`. Theme colors use the default Office
//! palette; tints are applied, the workbook's own theme part is not read.

use std::collections::HashMap;

use cubefill_engine::cell::{
    Alignment, BorderStyle, CellBorder, CellFormat, NumberFormat, VerticalAlignment,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Built-in number format ids that the engine can represent.
fn builtin_number_format(id: u16) -> NumberFormat {
    match id {
        1 | 3 | 37 | 38 => NumberFormat::Fixed { decimals: 0 },
        2 | 4 | 39 | 40 => NumberFormat::Fixed { decimals: 2 },
        14..=17 => NumberFormat::Date,
        _ => NumberFormat::General,
    }
}

/// Classify a custom format code.
///
/// `0.000` and `#,##0.00` keep their decimal count; codes with day, month
/// or year tokens outside quotes are dates; anything else is General.
pub fn classify_format_code(code: &str) -> NumberFormat {
    // First section only: "0.00;[Red]-0.00" formats positives as "0.00"
    let section = code.split(';').next().unwrap_or("");

    let mut bare = String::new();
    let mut in_quotes = false;
    let mut in_brackets = false;
    for c in section.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            '[' if !in_quotes => in_brackets = true,
            ']' if !in_quotes => in_brackets = false,
            _ if in_quotes || in_brackets => {}
            _ => bare.push(c.to_ascii_lowercase()),
        }
    }

    if bare.contains(&['d', 'y'][..]) || (bare.contains('m') && !bare.contains('0')) {
        return NumberFormat::Date;
    }
    if bare.is_empty() || bare == "general" || !bare.contains('0') {
        return NumberFormat::General;
    }

    let decimals = bare
        .split_once('.')
        .map(|(_, frac)| frac.chars().take_while(|c| *c == '0').count())
        .unwrap_or(0);
    NumberFormat::Fixed { decimals: decimals.min(15) as u8 }
}

// =============================================================================
// Colors
// =============================================================================

/// Standard 64-entry indexed palette. 64 and 65 (system colors) resolve to
/// automatic.
const INDEXED_COLORS: [u32; 64] = [
    0x000000, 0xFFFFFF, 0xFF0000, 0x00FF00, 0x0000FF, 0xFFFF00, 0xFF00FF, 0x00FFFF,
    0x000000, 0xFFFFFF, 0xFF0000, 0x00FF00, 0x0000FF, 0xFFFF00, 0xFF00FF, 0x00FFFF,
    0x800000, 0x008000, 0x000080, 0x808000, 0x800080, 0x008080, 0xC0C0C0, 0x808080,
    0x9999FF, 0x993366, 0xFFFFCC, 0xCCFFFF, 0x660066, 0xFF8080, 0x0066CC, 0xCCCCFF,
    0x000080, 0xFF00FF, 0xFFFF00, 0x00FFFF, 0x800080, 0x800000, 0x008080, 0x0000FF,
    0x00CCFF, 0xCCFFFF, 0xCCFFCC, 0xFFFF99, 0x99CCFF, 0xFF99CC, 0xCC99FF, 0xFFCC99,
    0x3366FF, 0x33CCCC, 0x99CC00, 0xFFCC00, 0xFF9900, 0xFF6600, 0x666699, 0x969696,
    0x003366, 0x339966, 0x003300, 0x333300, 0x993300, 0x993333, 0x333399, 0x333333,
];

/// Default Office theme: lt1, dk1, lt2, dk2, accent1..accent6
const THEME_COLORS: [u32; 10] = [
    0xFFFFFF, 0x000000, 0xEEECE1, 0x1F497D, 0x4F81BD, 0xC0504D, 0x9BBB59, 0x8064A2, 0x4BACC6,
    0xF79646,
];

/// Parse `AARRGGBB` or `RRGGBB`; alpha is ignored.
fn parse_rgb_hex(hex: &str) -> Option<u32> {
    let hex = hex.trim_start_matches('#');
    let rgb = match hex.len() {
        8 => &hex[2..],
        6 => hex,
        _ => return None,
    };
    u32::from_str_radix(rgb, 16).ok()
}

/// Lighten (positive) or darken (negative) each channel.
fn apply_tint(rgb: u32, tint: f64) -> u32 {
    if tint == 0.0 {
        return rgb;
    }
    let channel = |shift: u32| {
        let c = ((rgb >> shift) & 0xFF) as f64;
        let tinted = if tint < 0.0 { c * (1.0 + tint) } else { c + (255.0 - c) * tint };
        (tinted.round().clamp(0.0, 255.0) as u32) << shift
    };
    channel(16) | channel(8) | channel(0)
}

/// Resolve a `<color>`, `<fgColor>` or border color element.
///
/// Preference: rgb, indexed, theme. `auto` and system colors are None.
fn parse_color(e: &BytesStart) -> Option<u32> {
    let mut rgb = None;
    let mut indexed = None;
    let mut theme = None;
    let mut tint = 0.0;

    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value);
        match attr.key.as_ref() {
            b"rgb" => rgb = parse_rgb_hex(&value),
            b"indexed" => indexed = value.parse::<usize>().ok(),
            b"theme" => theme = value.parse::<usize>().ok(),
            b"tint" => tint = value.parse().unwrap_or(0.0),
            b"auto" if value == "1" || value == "true" => return None,
            _ => {}
        }
    }

    if rgb.is_some() {
        return rgb;
    }
    if let Some(idx) = indexed {
        return INDEXED_COLORS.get(idx).copied();
    }
    theme
        .and_then(|idx| THEME_COLORS.get(idx).copied())
        .map(|color| apply_tint(color, tint))
}

// =============================================================================
// Component tables
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
struct ParsedFont {
    bold: bool,
    italic: bool,
    underline: bool,
    strikethrough: bool,
    size: Option<f64>,
    color: Option<u32>,
    family: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct ParsedFill {
    color: Option<u32>,
}

#[derive(Debug, Clone, Default)]
struct ParsedBorder {
    top: CellBorder,
    right: CellBorder,
    bottom: CellBorder,
    left: CellBorder,
}

#[derive(Debug, Default)]
struct XfEntry {
    num_fmt_id: u16,
    font_id: Option<usize>,
    fill_id: Option<usize>,
    border_id: Option<usize>,
    h_align: Option<String>,
    v_align: Option<String>,
    wrap_text: bool,
}

fn attr_value(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

fn attr_flag(value: &[u8]) -> bool {
    value == b"1" || value == b"true"
}

/// `<b/>`, `<i/>` and `<strike/>` are on unless `val` says otherwise
fn toggle_on(e: &BytesStart) -> bool {
    match attr_value(e, b"val") {
        Some(v) => v != "0" && v != "false",
        None => true,
    }
}

/// Unescape the predefined XML entities in a format code
fn unescape_xml(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Custom `<numFmt>` entries: id -> format code
fn parse_num_fmts(xml: &str) -> HashMap<u16, String> {
    let mut map = HashMap::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == b"numFmt" => {
                let id = attr_value(e, b"numFmtId").and_then(|v| v.parse().ok());
                let code = attr_value(e, b"formatCode").map(|c| unescape_xml(&c));
                if let (Some(id), Some(code)) = (id, code) {
                    map.insert(id, code);
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"numFmts" => break,
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    map
}

/// `<fonts>`, in index order. Fonts under `<dxfs>` are not part of it.
fn parse_fonts(xml: &str) -> Vec<ParsedFont> {
    let mut fonts = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut depth = 0; // 1 = inside <fonts>, 2 = inside <font>
    let mut current = ParsedFont::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"fonts" if depth == 0 => depth = 1,
                b"font" if depth == 1 => {
                    depth = 2;
                    current = ParsedFont::default();
                }
                b"color" if depth == 2 => current.color = parse_color(e),
                _ => {}
            },
            Ok(Event::Empty(ref e)) if depth == 2 => match e.name().as_ref() {
                b"b" => current.bold = toggle_on(e),
                b"i" => current.italic = toggle_on(e),
                b"strike" => current.strikethrough = toggle_on(e),
                b"u" => current.underline = attr_value(e, b"val").map_or(true, |v| v != "none"),
                b"sz" => current.size = attr_value(e, b"val").and_then(|v| v.parse().ok()),
                b"color" => current.color = parse_color(e),
                b"name" | b"rFont" => current.family = attr_value(e, b"val"),
                _ => {}
            },
            // <font/> with no children still takes an index
            Ok(Event::Empty(ref e)) if depth == 1 && e.name().as_ref() == b"font" => {
                fonts.push(ParsedFont::default());
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"font" if depth == 2 => {
                    fonts.push(std::mem::take(&mut current));
                    depth = 1;
                }
                b"fonts" if depth == 1 => break,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    fonts
}

/// `<fills>`, in index order. Only solid pattern fills carry a color.
fn parse_fills(xml: &str) -> Vec<ParsedFill> {
    let mut fills = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut depth = 0; // 1 = inside <fills>, 2 = inside <fill>
    let mut solid = false;
    let mut current = ParsedFill::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"fills" if depth == 0 => depth = 1,
                b"fill" if depth == 1 => {
                    depth = 2;
                    current = ParsedFill::default();
                }
                b"patternFill" if depth == 2 => {
                    solid = attr_value(e, b"patternType").as_deref() == Some("solid");
                }
                b"fgColor" if depth == 2 && solid => current.color = parse_color(e),
                _ => {}
            },
            Ok(Event::Empty(ref e)) if depth == 2 => {
                if e.name().as_ref() == b"fgColor" && solid {
                    current.color = parse_color(e);
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"patternFill" => solid = false,
                b"fill" if depth == 2 => {
                    fills.push(std::mem::take(&mut current));
                    depth = 1;
                    solid = false;
                }
                b"fills" if depth == 1 => break,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    fills
}

fn parse_border_style(s: &str) -> BorderStyle {
    match s {
        "hair" => BorderStyle::Hair,
        "thin" => BorderStyle::Thin,
        "dotted" => BorderStyle::Dotted,
        "dashed" | "dashDot" | "dashDotDot" | "slantDashDot" => BorderStyle::Dashed,
        "medium" => BorderStyle::Medium,
        "mediumDashed" | "mediumDashDot" | "mediumDashDotDot" => BorderStyle::MediumDashed,
        "thick" => BorderStyle::Thick,
        "double" => BorderStyle::Double,
        _ => BorderStyle::None,
    }
}

fn border_side<'a>(border: &'a mut ParsedBorder, name: &[u8]) -> Option<&'a mut CellBorder> {
    match name {
        b"top" => Some(&mut border.top),
        b"right" => Some(&mut border.right),
        b"bottom" => Some(&mut border.bottom),
        b"left" => Some(&mut border.left),
        _ => None,
    }
}

/// `<borders>`, in index order. Diagonals are ignored.
fn parse_borders(xml: &str) -> Vec<ParsedBorder> {
    let mut borders = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut depth = 0; // 1 = inside <borders>, 2 = inside <border>
    let mut current = ParsedBorder::default();
    let mut side: Option<Vec<u8>> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = e.name();
                match name.as_ref() {
                    b"borders" if depth == 0 => depth = 1,
                    b"border" if depth == 1 => {
                        depth = 2;
                        current = ParsedBorder::default();
                    }
                    b"top" | b"right" | b"bottom" | b"left" if depth == 2 => {
                        let style = attr_value(e, b"style").map_or(BorderStyle::None, |s| parse_border_style(&s));
                        if let Some(edge) = border_side(&mut current, name.as_ref()) {
                            *edge = CellBorder::new(style);
                        }
                        side = Some(name.as_ref().to_vec());
                    }
                    b"color" if depth == 2 => {
                        if let Some(edge) = side.as_deref().and_then(|s| border_side(&mut current, s)) {
                            edge.color = parse_color(e);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) if depth == 2 => {
                let name = e.name();
                match name.as_ref() {
                    b"top" | b"right" | b"bottom" | b"left" => {
                        let style = attr_value(e, b"style").map_or(BorderStyle::None, |s| parse_border_style(&s));
                        if let Some(edge) = border_side(&mut current, name.as_ref()) {
                            *edge = CellBorder::new(style);
                        }
                    }
                    b"color" => {
                        if let Some(edge) = side.as_deref().and_then(|s| border_side(&mut current, s)) {
                            edge.color = parse_color(e);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"top" | b"right" | b"bottom" | b"left" | b"diagonal" => side = None,
                b"border" if depth == 2 => {
                    // A side without a line has no color either
                    for edge in [&mut current.top, &mut current.right, &mut current.bottom, &mut current.left] {
                        if edge.is_none() {
                            edge.color = None;
                        }
                    }
                    borders.push(std::mem::take(&mut current));
                    depth = 1;
                }
                b"borders" if depth == 1 => break,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    borders
}

fn read_xf(e: &BytesStart) -> XfEntry {
    let mut xf = XfEntry::default();
    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value);
        match attr.key.as_ref() {
            b"numFmtId" => xf.num_fmt_id = value.parse().unwrap_or(0),
            b"fontId" => xf.font_id = value.parse().ok(),
            b"fillId" => xf.fill_id = value.parse().ok(),
            b"borderId" => xf.border_id = value.parse().ok(),
            _ => {}
        }
    }
    xf
}

fn read_alignment(e: &BytesStart, xf: &mut XfEntry) {
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"horizontal" => xf.h_align = Some(String::from_utf8_lossy(&attr.value).to_string()),
            b"vertical" => xf.v_align = Some(String::from_utf8_lossy(&attr.value).to_string()),
            b"wrapText" => xf.wrap_text = attr_flag(&attr.value),
            _ => {}
        }
    }
}

/// `<cellXfs>` entries in index order. `cellStyleXfs` uses the same element
/// name and is skipped.
fn parse_cell_xfs(xml: &str) -> Vec<XfEntry> {
    let mut xfs = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_cell_xfs = false;
    let mut current: Option<XfEntry> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"cellXfs" => in_cell_xfs = true,
                b"xf" if in_cell_xfs => current = Some(read_xf(e)),
                b"alignment" => {
                    if let Some(xf) = current.as_mut() {
                        read_alignment(e, xf);
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"xf" if in_cell_xfs => xfs.push(read_xf(e)),
                b"alignment" => {
                    if let Some(xf) = current.as_mut() {
                        read_alignment(e, xf);
                    }
                }
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"xf" => {
                    if let Some(xf) = current.take() {
                        xfs.push(xf);
                    }
                }
                b"cellXfs" => break,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    xfs
}

/// Resolve one xf against the component tables.
///
/// Font family, size and color are kept only where they differ from the
/// workbook's default font (`fonts[0]`).
fn resolve_xf(
    xf: &XfEntry,
    custom_num_fmts: &HashMap<u16, String>,
    fonts: &[ParsedFont],
    fills: &[ParsedFill],
    borders: &[ParsedBorder],
) -> CellFormat {
    let mut format = CellFormat {
        number_format: match custom_num_fmts.get(&xf.num_fmt_id) {
            Some(code) => classify_format_code(code),
            None => builtin_number_format(xf.num_fmt_id),
        },
        ..Default::default()
    };

    if let Some(font) = xf.font_id.and_then(|id| fonts.get(id)) {
        let base = fonts.first();
        format.bold = font.bold;
        format.italic = font.italic;
        format.underline = font.underline;
        format.strikethrough = font.strikethrough;
        if base.map(|b| &b.family) != Some(&font.family) {
            format.font_family = font.family.clone();
        }
        if base.map(|b| b.size) != Some(font.size) {
            format.font_size = font.size;
        }
        if base.map(|b| b.color) != Some(font.color) {
            format.font_color = font.color;
        }
    }

    if let Some(fill) = xf.fill_id.and_then(|id| fills.get(id)) {
        format.background_color = fill.color;
    }

    if let Some(border) = xf.border_id.and_then(|id| borders.get(id)) {
        format.border_top = border.top;
        format.border_right = border.right;
        format.border_bottom = border.bottom;
        format.border_left = border.left;
    }

    format.alignment = match xf.h_align.as_deref() {
        Some("left") => Alignment::Left,
        Some("center") => Alignment::Center,
        Some("right") => Alignment::Right,
        Some("centerContinuous") => Alignment::CenterAcross,
        _ => Alignment::General,
    };
    format.vertical_alignment = match xf.v_align.as_deref() {
        Some("top") => VerticalAlignment::Top,
        Some("center") => VerticalAlignment::Center,
        _ => VerticalAlignment::Bottom,
    };
    format.wrap_text = xf.wrap_text;

    format
}

/// Resolve every `<xf>` in `<cellXfs>` to a [`CellFormat`], in index order.
pub fn parse_styles(xml: &str) -> Vec<CellFormat> {
    let custom_num_fmts = parse_num_fmts(xml);
    let fonts = parse_fonts(xml);
    let fills = parse_fills(xml);
    let borders = parse_borders(xml);

    parse_cell_xfs(xml)
        .iter()
        .map(|xf| resolve_xf(xf, &custom_num_fmts, &fonts, &fills, &borders))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="2">
    <numFmt numFmtId="164" formatCode="0.000"/>
    <numFmt numFmtId="165" formatCode="dd&quot;-&quot;mm&quot;-&quot;yyyy"/>
  </numFmts>
  <fonts count="3">
    <font><sz val="11"/><color theme="1"/><name val="Calibri"/><family val="2"/></font>
    <font><b/><sz val="11"/><color theme="1"/><name val="Calibri"/></font>
    <font><b val="0"/><i/><u/><sz val="14"/><color rgb="FFC00000"/><name val="Arial"/></font>
  </fonts>
  <fills count="4">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><patternFill patternType="solid"><fgColor rgb="FFFFFF00"/><bgColor indexed="64"/></patternFill></fill>
    <fill><patternFill patternType="solid"><fgColor theme="0" tint="-0.5"/></patternFill></fill>
  </fills>
  <borders count="2">
    <border><left/><right/><top/><bottom/><diagonal/></border>
    <border>
      <left style="thin"><color indexed="64"/></left>
      <right style="medium"><color rgb="FF0000FF"/></right>
      <top style="double"/>
      <bottom style="thin"><color auto="1"/></bottom>
      <diagonal style="thick"/>
    </border>
  </borders>
  <cellStyleXfs count="1">
    <xf numFmtId="2" fontId="1" fillId="2" borderId="1"/>
  </cellStyleXfs>
  <cellXfs count="5">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="164" fontId="1" fillId="2" borderId="1" xfId="0" applyFont="1" applyFill="1" applyBorder="1">
      <alignment horizontal="center" vertical="center" wrapText="1"/>
    </xf>
    <xf numFmtId="165" fontId="2" fillId="1" borderId="0" xfId="0"/>
    <xf numFmtId="2" fontId="0" fillId="3" borderId="0" xfId="0">
      <alignment horizontal="centerContinuous"/>
    </xf>
    <xf numFmtId="0" fontId="9" fillId="9" borderId="9" xfId="0"/>
  </cellXfs>
  <dxfs count="1">
    <dxf><font><b/></font><fill><patternFill><bgColor rgb="FFFF0000"/></patternFill></fill></dxf>
  </dxfs>
</styleSheet>"#;

    #[test]
    fn test_builtin_number_format() {
        assert_eq!(builtin_number_format(0), NumberFormat::General);
        assert_eq!(builtin_number_format(2), NumberFormat::Fixed { decimals: 2 });
        assert_eq!(builtin_number_format(14), NumberFormat::Date);
        assert_eq!(builtin_number_format(49), NumberFormat::General);
    }

    #[test]
    fn test_classify_format_code() {
        assert_eq!(classify_format_code("0.000"), NumberFormat::Fixed { decimals: 3 });
        assert_eq!(classify_format_code("#,##0.00"), NumberFormat::Fixed { decimals: 2 });
        assert_eq!(classify_format_code("0"), NumberFormat::Fixed { decimals: 0 });
        assert_eq!(classify_format_code("0.00;[Red]-0.00"), NumberFormat::Fixed { decimals: 2 });
        assert_eq!(classify_format_code("dd-mm-yyyy"), NumberFormat::Date);
        assert_eq!(classify_format_code("d/m/yy;@"), NumberFormat::Date);
        assert_eq!(classify_format_code("[$-409]mmm-yy"), NumberFormat::Date);
        // Quoted text is not a date token
        assert_eq!(classify_format_code("0.0\" days\""), NumberFormat::Fixed { decimals: 1 });
        assert_eq!(classify_format_code("General"), NumberFormat::General);
        assert_eq!(classify_format_code("@"), NumberFormat::General);
    }

    #[test]
    fn test_parse_styles_number_formats() {
        let formats: Vec<NumberFormat> = parse_styles(STYLES_XML).iter().map(|f| f.number_format).collect();
        assert_eq!(
            formats,
            vec![
                NumberFormat::General,
                NumberFormat::Fixed { decimals: 3 },
                NumberFormat::Date,
                NumberFormat::Fixed { decimals: 2 },
                NumberFormat::General,
            ]
        );
    }

    #[test]
    fn test_parse_styles_default_xf_is_plain() {
        let styles = parse_styles(STYLES_XML);
        assert!(styles[0].is_default());
        // Out-of-range component ids resolve to nothing
        assert!(styles[4].is_default());
    }

    #[test]
    fn test_parse_styles_font_fill_border_alignment() {
        let styles = parse_styles(STYLES_XML);

        let boxed = &styles[1];
        assert!(boxed.bold);
        assert!(!boxed.italic);
        // Same family, size and color as the default font
        assert_eq!(boxed.font_family, None);
        assert_eq!(boxed.font_size, None);
        assert_eq!(boxed.font_color, None);
        assert_eq!(boxed.background_color, Some(0xFFFF00));
        assert_eq!(boxed.border_left, CellBorder::new(BorderStyle::Thin));
        assert_eq!(boxed.border_right, CellBorder { style: BorderStyle::Medium, color: Some(0x0000FF) });
        assert_eq!(boxed.border_top, CellBorder::new(BorderStyle::Double));
        assert_eq!(boxed.border_bottom, CellBorder::new(BorderStyle::Thin));
        assert_eq!(boxed.alignment, Alignment::Center);
        assert_eq!(boxed.vertical_alignment, VerticalAlignment::Center);
        assert!(boxed.wrap_text);
    }

    #[test]
    fn test_parse_styles_font_overrides() {
        let styles = parse_styles(STYLES_XML);

        let heading = &styles[2];
        assert!(!heading.bold, "val=\"0\" switches bold off");
        assert!(heading.italic);
        assert!(heading.underline);
        assert_eq!(heading.font_family.as_deref(), Some("Arial"));
        assert_eq!(heading.font_size, Some(14.0));
        assert_eq!(heading.font_color, Some(0xC00000));
        // gray125 is a pattern, not a solid fill
        assert_eq!(heading.background_color, None);
        assert!(heading.border_bottom.is_none());
    }

    #[test]
    fn test_parse_styles_theme_fill_and_center_across() {
        let styles = parse_styles(STYLES_XML);
        // lt1 (white) darkened by half
        assert_eq!(styles[3].background_color, Some(0x808080));
        assert_eq!(styles[3].alignment, Alignment::CenterAcross);
    }

    #[test]
    fn test_parse_color_sources() {
        fn color(xml: &str) -> Option<u32> {
            let mut reader = Reader::from_str(xml);
            match reader.read_event() {
                Ok(Event::Empty(e)) => parse_color(&e),
                other => panic!("unexpected event {:?}", other),
            }
        }

        assert_eq!(color(r#"<color rgb="FF00B050"/>"#), Some(0x00B050));
        assert_eq!(color(r#"<color rgb="00B050"/>"#), Some(0x00B050));
        assert_eq!(color(r#"<color indexed="10"/>"#), Some(0xFF0000));
        assert_eq!(color(r#"<color indexed="64"/>"#), None);
        assert_eq!(color(r#"<color theme="4"/>"#), Some(0x4F81BD));
        assert_eq!(color(r#"<color theme="1" tint="0.5"/>"#), Some(0x808080));
        assert_eq!(color(r#"<color auto="1"/>"#), None);
        // rgb wins over indexed
        assert_eq!(color(r#"<color indexed="10" rgb="FF0000FF"/>"#), Some(0x0000FF));
    }

    #[test]
    fn test_parse_border_style() {
        assert_eq!(parse_border_style("hair"), BorderStyle::Hair);
        assert_eq!(parse_border_style("dashDot"), BorderStyle::Dashed);
        assert_eq!(parse_border_style("mediumDashDotDot"), BorderStyle::MediumDashed);
        assert_eq!(parse_border_style("none"), BorderStyle::None);
    }

    #[test]
    fn test_parse_styles_empty() {
        assert!(parse_styles("<styleSheet/>").is_empty());
    }
}
