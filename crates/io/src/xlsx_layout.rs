//! Worksheet layout reader: merged regions, custom column widths, custom
//! row heights and per-cell style ids straight from the worksheet XML inside
//! an XLSX (ZIP) archive.
//!
//! calamine exposes cell values and formulas but not sheet geometry, so the
//! importer overlays what this module finds onto the imported sheets.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use cubefill_engine::cell::CellFormat;
use cubefill_engine::cell_ref::parse_cell_ref;
use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::xlsx_styles::parse_styles;

/// Geometry of one worksheet, in raw Excel units.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SheetLayout {
    /// Column index -> width in character units
    pub col_widths: HashMap<usize, f64>,
    /// Row index -> height in points
    pub row_heights: HashMap<usize, f64>,
    /// Merged regions as (start_row, start_col, end_row, end_col)
    pub merged_regions: Vec<(usize, usize, usize, usize)>,
    /// (row, col, cellXfs index) for cells with a non-default style
    pub cell_styles: Vec<(usize, usize, usize)>,
}

impl SheetLayout {
    pub fn is_empty(&self) -> bool {
        self.col_widths.is_empty()
            && self.row_heights.is_empty()
            && self.merged_regions.is_empty()
            && self.cell_styles.is_empty()
    }
}

/// Layout of a whole workbook.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WorkbookLayout {
    /// cellXfs index -> resolved style
    pub styles: Vec<CellFormat>,
    /// One entry per requested sheet name, in order
    pub sheets: Vec<SheetLayout>,
}

impl WorkbookLayout {
    /// Style a cellXfs index resolves to; None for unknown ids
    pub fn style(&self, style: usize) -> Option<&CellFormat> {
        self.styles.get(style)
    }
}

fn attr_usize(value: &[u8]) -> Option<usize> {
    std::str::from_utf8(value).ok().and_then(|s| s.parse().ok())
}

fn attr_f64(value: &[u8]) -> Option<f64> {
    std::str::from_utf8(value).ok().and_then(|s| s.parse().ok())
}

fn attr_flag(value: &[u8]) -> bool {
    value == b"1" || value == b"true"
}

/// Parse a merge reference like `C18:E18`
fn parse_range_ref(range: &str) -> Option<(usize, usize, usize, usize)> {
    let (start, end) = range.split_once(':')?;
    let (r1, c1) = parse_cell_ref(start)?;
    let (r2, c2) = parse_cell_ref(end)?;
    Some((r1.min(r2), c1.min(c2), r1.max(r2), c1.max(c2)))
}

/// Extract layout from a worksheet XML document.
///
/// Only widths and heights flagged custom are kept; default geometry is
/// left to the writer.
pub fn parse_sheet_layout(xml: &str) -> SheetLayout {
    let mut layout = SheetLayout::default();

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"row" => {
                    let mut row = None;
                    let mut height = None;
                    let mut custom = false;
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"r" => row = attr_usize(&attr.value).map(|r| r.saturating_sub(1)),
                            b"ht" => height = attr_f64(&attr.value),
                            b"customHeight" => custom = attr_flag(&attr.value),
                            _ => {}
                        }
                    }
                    if custom {
                        if let (Some(row), Some(height)) = (row, height) {
                            layout.row_heights.insert(row, height);
                        }
                    }
                }
                b"col" => {
                    let mut min = None;
                    let mut max = None;
                    let mut width = None;
                    let mut custom = false;
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"min" => min = attr_usize(&attr.value).map(|c| c.saturating_sub(1)),
                            b"max" => max = attr_usize(&attr.value).map(|c| c.saturating_sub(1)),
                            b"width" => width = attr_f64(&attr.value),
                            b"customWidth" => custom = attr_flag(&attr.value),
                            _ => {}
                        }
                    }
                    if custom {
                        if let (Some(min), Some(max), Some(width)) = (min, max, width) {
                            // Full-width <col> spans (max=16384) would flood the map
                            for col in min..=max.min(min + 1024) {
                                layout.col_widths.insert(col, width);
                            }
                        }
                    }
                }
                b"c" => {
                    let mut cell = None;
                    let mut style = None;
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"r" => cell = parse_cell_ref(&String::from_utf8_lossy(&attr.value)),
                            b"s" => style = attr_usize(&attr.value),
                            _ => {}
                        }
                    }
                    if let (Some((row, col)), Some(style)) = (cell, style) {
                        if style > 0 {
                            layout.cell_styles.push((row, col, style));
                        }
                    }
                }
                b"mergeCell" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"ref" {
                            let range = String::from_utf8_lossy(&attr.value);
                            if let Some(region) = parse_range_ref(&range) {
                                layout.merged_regions.push(region);
                            }
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    layout
}

/// Map sheet names to worksheet part paths via workbook.xml and its rels.
///
/// Returns one entry per requested name; `None` when the sheet cannot be
/// resolved.
pub fn resolve_worksheet_paths(
    workbook_xml: &str,
    rels_xml: &str,
    sheet_names: &[String],
) -> Vec<Option<String>> {
    let mut name_to_rid: HashMap<String, String> = HashMap::new();
    let mut reader = Reader::from_str(workbook_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut rid = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"name" => name = Some(unescape_xml(&String::from_utf8_lossy(&attr.value))),
                        b"r:id" => rid = Some(String::from_utf8_lossy(&attr.value).to_string()),
                        _ => {}
                    }
                }
                if let (Some(name), Some(rid)) = (name, rid) {
                    name_to_rid.insert(name, rid);
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    let mut rid_to_target: HashMap<String, String> = HashMap::new();
    let mut reader = Reader::from_str(rels_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"Relationship" =>
            {
                let mut id = None;
                let mut target = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => id = Some(String::from_utf8_lossy(&attr.value).to_string()),
                        b"Target" => target = Some(String::from_utf8_lossy(&attr.value).to_string()),
                        _ => {}
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    rid_to_target.insert(id, target);
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    sheet_names
        .iter()
        .map(|name| {
            name_to_rid
                .get(name)
                .and_then(|rid| rid_to_target.get(rid))
                .map(|target| match target.strip_prefix('/') {
                    Some(absolute) => absolute.to_string(),
                    None => format!("xl/{}", target.trim_start_matches("./")),
                })
        })
        .collect()
}

/// Unescape the predefined XML entities (sheet names may contain `&`)
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

fn read_zip_text<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String, String> {
    let mut file = archive
        .by_name(name)
        .map_err(|e| format!("Missing '{}' in archive: {}", name, e))?;
    let mut text = String::new();
    file.read_to_string(&mut text)
        .map_err(|e| format!("Failed to read '{}': {}", name, e))?;
    Ok(text)
}

/// Read the style table and the layout of every named sheet from an XLSX
/// file.
///
/// Sheets whose part cannot be located get an empty layout; a missing
/// styles part leaves every cell unstyled.
pub fn read_layouts(path: &Path, sheet_names: &[String]) -> Result<WorkbookLayout, String> {
    let file = File::open(path).map_err(|e| format!("Failed to open '{}': {}", path.display(), e))?;
    let mut archive = ZipArchive::new(file).map_err(|e| format!("Not an XLSX archive: {}", e))?;

    let styles = match read_zip_text(&mut archive, "xl/styles.xml") {
        Ok(xml) => parse_styles(&xml),
        Err(e) => {
            log::debug!("styles skipped: {}", e);
            Vec::new()
        }
    };

    let workbook_xml = read_zip_text(&mut archive, "xl/workbook.xml")?;
    let rels_xml = read_zip_text(&mut archive, "xl/_rels/workbook.xml.rels")?;
    let paths = resolve_worksheet_paths(&workbook_xml, &rels_xml, sheet_names);

    let mut layouts = Vec::with_capacity(paths.len());
    for (name, part) in sheet_names.iter().zip(paths) {
        let layout = match part {
            Some(part) => match read_zip_text(&mut archive, &part) {
                Ok(xml) => parse_sheet_layout(&xml),
                Err(e) => {
                    log::debug!("layout for sheet '{}' skipped: {}", name, e);
                    SheetLayout::default()
                }
            },
            None => SheetLayout::default(),
        };
        layouts.push(layout);
    }
    Ok(WorkbookLayout { styles, sheets: layouts })
}
