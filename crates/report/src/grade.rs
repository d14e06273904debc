//! Grade table: the numeric ranges per concrete grade and mortar ratio.
//!
//! Built once (built-in or from a JSON file), validated, then passed by
//! reference to everything that samples.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GradeTableError;
use crate::matcher::normalize_grade;
use crate::sampler::grid_capacity;

/// Values sampled per weight group.
pub const WEIGHTS_PER_ROW: usize = 6;
/// Values sampled per strength group (7-day and 28-day each).
pub const STRENGTHS_PER_AGE: usize = 3;

/// Material family; decides precision and minimum gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeKind {
    Concrete,
    Mortar,
}

impl GradeKind {
    pub const WEIGHT_DECIMALS: u32 = 3;
    pub const STRENGTH_DECIMALS: u32 = 2;

    /// Minimum pairwise gap between weights (kg)
    pub fn weight_gap(self) -> f64 {
        match self {
            GradeKind::Concrete => 0.015,
            GradeKind::Mortar => 0.005,
        }
    }

    /// Minimum pairwise gap between strengths of one age (kN)
    pub fn strength_gap(self) -> f64 {
        match self {
            GradeKind::Concrete => 5.0,
            GradeKind::Mortar => 1.0,
        }
    }

    /// Mortar ratios are written `a:b`; everything else is a concrete grade.
    pub fn infer(id: &str) -> Self {
        if id.contains(':') {
            GradeKind::Mortar
        } else {
            GradeKind::Concrete
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GradeKind::Concrete => "concrete",
            GradeKind::Mortar => "mortar",
        }
    }
}

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

/// One grade's identity and ranges. Only constructible through validation,
/// so every spec can produce a full row.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeSpec {
    id: String,
    kind: GradeKind,
    weight: ValueRange,
    strength_7d: ValueRange,
    strength_28d: ValueRange,
}

impl GradeSpec {
    pub fn new(
        id: &str,
        kind: GradeKind,
        weight: ValueRange,
        strength_7d: ValueRange,
        strength_28d: ValueRange,
    ) -> Result<Self, GradeTableError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(GradeTableError::BlankId);
        }

        let groups = [
            ("weight", weight, GradeKind::WEIGHT_DECIMALS, kind.weight_gap(), WEIGHTS_PER_ROW),
            ("7-day strength", strength_7d, GradeKind::STRENGTH_DECIMALS, kind.strength_gap(), STRENGTHS_PER_AGE),
            ("28-day strength", strength_28d, GradeKind::STRENGTH_DECIMALS, kind.strength_gap(), STRENGTHS_PER_AGE),
        ];
        for (field, range, decimals, gap, needed) in groups {
            if !range.is_valid() {
                return Err(GradeTableError::InvalidRange {
                    grade: id.to_string(),
                    field,
                    min: range.min,
                    max: range.max,
                });
            }
            let available = grid_capacity(range, decimals, gap);
            if available < needed {
                return Err(GradeTableError::InsufficientCapacity {
                    grade: id.to_string(),
                    field,
                    needed,
                    available,
                });
            }
        }

        Ok(Self { id: id.to_string(), kind, weight, strength_7d, strength_28d })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> GradeKind {
        self.kind
    }

    pub fn weight(&self) -> ValueRange {
        self.weight
    }

    pub fn strength_7d(&self) -> ValueRange {
        self.strength_7d
    }

    pub fn strength_28d(&self) -> ValueRange {
        self.strength_28d
    }

    pub fn is_mortar(&self) -> bool {
        self.kind == GradeKind::Mortar
    }

    /// Friendly name: `Mortar 1:4` for ratios, the id otherwise
    pub fn display_name(&self) -> String {
        match self.kind {
            GradeKind::Mortar => format!("Mortar {}", self.id),
            GradeKind::Concrete => self.id.clone(),
        }
    }
}

/// On-disk form of one grade
#[derive(Debug, Serialize, Deserialize)]
struct GradeEntry {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<GradeKind>,
    weight: [f64; 2],
    strength_7d: [f64; 2],
    strength_28d: [f64; 2],
}

#[derive(Debug, Serialize, Deserialize)]
struct GradeFile {
    grades: Vec<GradeEntry>,
}

/// Built-in ranges: (id, weight, 7-day strength, 28-day strength)
const BUILTIN: [(&str, (f64, f64), (f64, f64), (f64, f64)); 10] = [
    ("M10", (8.100, 8.300), (214.00, 267.40), (320.10, 365.50)),
    ("M15", (8.100, 8.300), (290.10, 320.50), (433.10, 480.10)),
    ("M20", (8.100, 8.300), (366.10, 410.10), (547.10, 590.10)),
    ("M25", (8.180, 8.350), (442.10, 490.10), (660.10, 710.10)),
    ("M30", (8.100, 8.350), (518.10, 560.10), (770.10, 812.10)),
    ("M35", (8.100, 8.350), (595.10, 632.80), (880.90, 925.10)),
    ("M40", (8.100, 8.350), (669.10, 728.10), (995.10, 1038.10)),
    ("M45", (8.200, 8.400), (735.10, 788.10), (1105.35, 1150.10)),
    ("1:4", (0.800, 0.835), (25.20, 33.90), (40.60, 50.10)),
    ("1:6", (0.800, 0.835), (15.20, 25.00), (25.20, 33.90)),
];

/// Immutable, validated set of grades in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeTable {
    grades: Vec<GradeSpec>,
}

impl GradeTable {
    /// Concrete grades M10 through M45 and mortar ratios 1:4 and 1:6.
    pub fn builtin() -> Self {
        let grades = BUILTIN
            .iter()
            .filter_map(|(id, w, s7, s28)| {
                match GradeSpec::new(
                    id,
                    GradeKind::infer(id),
                    ValueRange::new(w.0, w.1),
                    ValueRange::new(s7.0, s7.1),
                    ValueRange::new(s28.0, s28.1),
                ) {
                    Ok(spec) => Some(spec),
                    Err(e) => {
                        log::error!("built-in grade {} rejected: {}", id, e);
                        None
                    }
                }
            })
            .collect();
        Self { grades }
    }

    /// Build a table from specs, rejecting empty tables and ids that collide
    /// after normalization.
    pub fn from_specs(grades: Vec<GradeSpec>) -> Result<Self, GradeTableError> {
        if grades.is_empty() {
            return Err(GradeTableError::Empty);
        }
        let mut seen: Vec<String> = Vec::with_capacity(grades.len());
        for spec in &grades {
            let key = normalize_grade(spec.id());
            if seen.contains(&key) {
                return Err(GradeTableError::DuplicateId(spec.id().to_string()));
            }
            seen.push(key);
        }
        Ok(Self { grades })
    }

    /// Parse a table from JSON:
    /// `{"grades":[{"id":"M20","kind":"concrete","weight":[8.1,8.3],"strength_7d":[..],"strength_28d":[..]}]}`.
    /// `kind` is optional and inferred from the id.
    pub fn from_json(json: &str) -> Result<Self, GradeTableError> {
        let file: GradeFile =
            serde_json::from_str(json).map_err(|e| GradeTableError::Parse(e.to_string()))?;

        let specs = file
            .grades
            .into_iter()
            .map(|entry| {
                let kind = entry.kind.unwrap_or_else(|| GradeKind::infer(&entry.id));
                GradeSpec::new(
                    &entry.id,
                    kind,
                    ValueRange::new(entry.weight[0], entry.weight[1]),
                    ValueRange::new(entry.strength_7d[0], entry.strength_7d[1]),
                    ValueRange::new(entry.strength_28d[0], entry.strength_28d[1]),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_specs(specs)
    }

    pub fn load(path: &Path) -> Result<Self, GradeTableError> {
        let json = fs::read_to_string(path)
            .map_err(|e| GradeTableError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Serialize in the format `from_json` reads
    pub fn to_json(&self) -> Result<String, GradeTableError> {
        let file = GradeFile {
            grades: self
                .grades
                .iter()
                .map(|g| GradeEntry {
                    id: g.id.clone(),
                    kind: Some(g.kind),
                    weight: [g.weight.min, g.weight.max],
                    strength_7d: [g.strength_7d.min, g.strength_7d.max],
                    strength_28d: [g.strength_28d.min, g.strength_28d.max],
                })
                .collect(),
        };
        serde_json::to_string_pretty(&file).map_err(|e| GradeTableError::Parse(e.to_string()))
    }

    /// Look up a grade; spaces and case are ignored (`"m 20"` finds `M20`)
    pub fn get(&self, id: &str) -> Option<&GradeSpec> {
        let key = normalize_grade(id);
        self.grades.iter().find(|g| normalize_grade(&g.id) == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GradeSpec> {
        self.grades.iter()
    }

    pub fn of_kind(&self, kind: GradeKind) -> impl Iterator<Item = &GradeSpec> {
        self.grades.iter().filter(move |g| g.kind == kind)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.grades.iter().map(|g| g.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.grades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grades.is_empty()
    }
}

impl Default for GradeTable {
    fn default() -> Self {
        Self::builtin()
    }
}
