// Persisted run settings
// Loaded from ~/.config/cubefill/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Last-used inputs, offered as defaults for the next run.
///
/// Every field is optional on disk; unknown keys are ignored so older and
/// newer versions can share a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Report template workbook
    pub template_path: Option<PathBuf>,
    /// Directory the processed workbook is written to
    pub output_dir: Option<PathBuf>,
    /// Run mode id (`generate`, `generate+date`, `date_only`, `grade_files`, `grade_files+date`)
    pub mode: String,
    /// Grades chosen for generate mode; empty means auto-detect
    pub selected_grades: Vec<String>,
    /// Legacy single-grade workbooks
    pub legacy_files: Vec<PathBuf>,
    /// Calendar workbook; its first sheet is read
    pub calendar_path: Option<PathBuf>,
    /// Custom grade table (JSON); None uses the built-in table
    pub grades_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            template_path: None,
            output_dir: None,
            mode: "generate".to_string(),
            selected_grades: Vec::new(),
            legacy_files: Vec::new(),
            calendar_path: None,
            grades_file: None,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cubefill");
        config_dir.join("settings.json")
    }

    /// Load settings from `path`. Never fails: a missing file yields
    /// defaults, an unreadable or malformed one yields defaults plus a warning.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => {
                // Hand-edited files may carry // comment lines
                let cleaned: String = contents
                    .lines()
                    .filter(|line| !line.trim().starts_with("//"))
                    .collect::<Vec<_>>()
                    .join("\n");

                match serde_json::from_str(&cleaned) {
                    Ok(settings) => settings,
                    Err(e) => {
                        log::warn!("Error parsing {}: {}; using default settings", path.display(), e);
                        Self::default()
                    }
                }
            }
            Err(e) => {
                log::warn!("Error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;

        fs::write(path, json).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("settings.json"));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.mode, "generate");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = Settings {
            template_path: Some(PathBuf::from("/data/template.xlsx")),
            mode: "grade_files+date".to_string(),
            selected_grades: vec!["M20".to_string(), "1:4".to_string()],
            legacy_files: vec![PathBuf::from("/data/M20.xlsx")],
            ..Default::default()
        };
        settings.save_to(&path).unwrap();

        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{
    // last template
    "template_path": "/data/template.xlsx",
    "future_option": 3
}"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.template_path, Some(PathBuf::from("/data/template.xlsx")));
        assert_eq!(settings.mode, "generate");
        assert!(settings.selected_grades.is_empty());
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }
}
