//! Configuration management with layered hierarchy

use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::PathBuf;

use crate::core::Project;
use crate::costing::CostingSettings;

/// FQT configuration with layered hierarchy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default author for new entities
    pub author: Option<String>,

    /// Editor command for `fqt ... edit`
    pub editor: Option<String>,

    /// Default output format
    pub default_format: Option<String>,

    /// Costing defaults applied when a calculation does not override them
    pub costing: CostingOverrides,
}

/// Partial costing settings as they appear in config files
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CostingOverrides {
    pub material_markup_percent: Option<Decimal>,
    pub subcon_markup_percent: Option<Decimal>,
    pub cost_per_hour: Option<Decimal>,
    pub use_p80: Option<bool>,
    pub contingency_low: Option<f64>,
    pub contingency_medium: Option<f64>,
    pub contingency_high: Option<f64>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/fqt/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                if let Ok(contents) = std::fs::read_to_string(&global_path) {
                    if let Ok(global) = serde_yml::from_str::<Config>(&contents) {
                        config.merge(global);
                    }
                }
            }
        }

        // 3. Project config (.fqt/config.yaml)
        if let Ok(project) = Project::discover() {
            let project_config_path = project.fqt_dir().join("config.yaml");
            if project_config_path.exists() {
                if let Ok(contents) = std::fs::read_to_string(&project_config_path) {
                    if let Ok(project_config) = serde_yml::from_str::<Config>(&contents) {
                        config.merge(project_config);
                    }
                }
            }
        }

        // 4. Environment variables
        if let Ok(author) = std::env::var("FQT_AUTHOR") {
            config.author = Some(author);
        }
        if let Ok(editor) = std::env::var("FQT_EDITOR") {
            config.editor = Some(editor);
        }

        config
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "fqt")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.author.is_some() {
            self.author = other.author;
        }
        if other.editor.is_some() {
            self.editor = other.editor;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        let c = other.costing;
        if c.material_markup_percent.is_some() {
            self.costing.material_markup_percent = c.material_markup_percent;
        }
        if c.subcon_markup_percent.is_some() {
            self.costing.subcon_markup_percent = c.subcon_markup_percent;
        }
        if c.cost_per_hour.is_some() {
            self.costing.cost_per_hour = c.cost_per_hour;
        }
        if c.use_p80.is_some() {
            self.costing.use_p80 = c.use_p80;
        }
        if c.contingency_low.is_some() {
            self.costing.contingency_low = c.contingency_low;
        }
        if c.contingency_medium.is_some() {
            self.costing.contingency_medium = c.contingency_medium;
        }
        if c.contingency_high.is_some() {
            self.costing.contingency_high = c.contingency_high;
        }
    }

    /// Resolve the effective costing settings once, at the call boundary.
    ///
    /// The result is an immutable value handed into each calculation; it is
    /// never read back or mutated mid-computation.
    pub fn costing_settings(&self) -> CostingSettings {
        let defaults = CostingSettings::default();
        let c = &self.costing;
        CostingSettings {
            material_markup_percent: c
                .material_markup_percent
                .unwrap_or(defaults.material_markup_percent),
            subcon_markup_percent: c
                .subcon_markup_percent
                .unwrap_or(defaults.subcon_markup_percent),
            cost_per_hour: c.cost_per_hour.unwrap_or(defaults.cost_per_hour),
            use_p80: c.use_p80.unwrap_or(defaults.use_p80),
            contingency_low: c.contingency_low.unwrap_or(defaults.contingency_low),
            contingency_medium: c
                .contingency_medium
                .unwrap_or(defaults.contingency_medium),
            contingency_high: c.contingency_high.unwrap_or(defaults.contingency_high),
        }
    }

    /// Get the author name, falling back to git config or username
    pub fn author(&self) -> String {
        if let Some(ref author) = self.author {
            return author.clone();
        }

        if let Ok(output) = std::process::Command::new("git")
            .args(["config", "user.name"])
            .output()
        {
            if output.status.success() {
                let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !name.is_empty() {
                    return name;
                }
            }
        }

        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }

    /// Get the editor command
    pub fn editor(&self) -> String {
        self.editor
            .clone()
            .or_else(|| std::env::var("EDITOR").ok())
            .or_else(|| std::env::var("VISUAL").ok())
            .unwrap_or_else(|| "vi".to_string())
    }

    /// Run the editor on a file, properly handling commands with arguments
    /// (e.g., "emacsclient -nw" or "code --wait")
    pub fn run_editor(
        &self,
        file_path: &std::path::Path,
    ) -> std::io::Result<std::process::ExitStatus> {
        let editor = self.editor();
        let parts: Vec<&str> = editor.split_whitespace().collect();

        if parts.is_empty() {
            return std::process::Command::new("vi").arg(file_path).status();
        }

        let cmd = parts[0];
        let args = &parts[1..];

        std::process::Command::new(cmd)
            .args(args)
            .arg(file_path)
            .status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_costing_settings_defaults() {
        let config = Config::default();
        let settings = config.costing_settings();
        assert_eq!(settings.material_markup_percent, dec!(10));
        assert_eq!(settings.cost_per_hour, dec!(60));
        assert!(!settings.use_p80);
    }

    #[test]
    fn test_costing_settings_overrides() {
        let yaml = r#"
costing:
  material_markup_percent: "15"
  use_p80: true
  contingency_high: 0.2
"#;
        let config: Config = serde_yml::from_str(yaml).unwrap();
        let settings = config.costing_settings();
        assert_eq!(settings.material_markup_percent, dec!(15));
        assert!(settings.use_p80);
        assert!((settings.contingency_high - 0.2).abs() < 1e-12);
        // untouched fields keep their defaults
        assert_eq!(settings.subcon_markup_percent, dec!(10));
    }

    #[test]
    fn test_merge_precedence() {
        let mut base: Config = serde_yml::from_str("author: alice").unwrap();
        let over: Config = serde_yml::from_str("author: bob\neditor: hx").unwrap();
        base.merge(over);
        assert_eq!(base.author.as_deref(), Some("bob"));
        assert_eq!(base.editor.as_deref(), Some("hx"));
    }
}
