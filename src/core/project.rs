//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::identity::{EntityId, EntityPrefix};

/// Represents an FQT project
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of .fqt/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current =
            std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            let fqt_dir = current.join(".fqt");
            if fqt_dir.is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new project structure at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        let fqt_dir = root.join(".fqt");
        if fqt_dir.exists() {
            return Err(ProjectError::AlreadyExists(root.clone()));
        }

        std::fs::create_dir_all(&fqt_dir)
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        let config_path = fqt_dir.join("config.yaml");
        std::fs::write(&config_path, Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        Self::create_entity_dirs(&root)?;

        Ok(Self { root })
    }

    /// Force initialization even if .fqt/ exists
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        let fqt_dir = root.join(".fqt");
        std::fs::create_dir_all(&fqt_dir)
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        let config_path = fqt_dir.join("config.yaml");
        std::fs::write(&config_path, Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        Self::create_entity_dirs(&root)?;

        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# FQT Project Configuration

# Default author for new entities (can be overridden by global config)
# author: ""

# Editor to use for `fqt ... edit` commands (default: $EDITOR)
# editor: ""

# Default output format (auto, yaml, tsv, json, csv, md, id)
# default_format: auto

# Costing defaults applied when a quotation does not override them
costing:
  # Markup percentage applied to material line costs
  material_markup_percent: "10"
  # Markup percentage applied to subcontract line costs
  subcon_markup_percent: "10"
  # Hourly labour rate used when a routing resource cannot be resolved
  cost_per_hour: "60"
  # Use the ~80th percentile instead of the expected value for estimates
  use_p80: false
  # Contingency rates by material price volatility
  contingency_low: 0.02
  contingency_medium: 0.05
  contingency_high: 0.10
"#
    }

    fn create_entity_dirs(root: &Path) -> Result<(), ProjectError> {
        let dirs = ["quotations", "materials", "resources", "vendors", "rfqs"];

        for dir in dirs {
            std::fs::create_dir_all(root.join(dir))
                .map_err(|e| ProjectError::IoError(e.to_string()))?;
        }

        Ok(())
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .fqt configuration directory
    pub fn fqt_dir(&self) -> PathBuf {
        self.root.join(".fqt")
    }

    /// Get the path for a new entity file
    pub fn entity_path(&self, prefix: EntityPrefix, id: &EntityId) -> PathBuf {
        self.entity_dir(prefix).join(format!("{}.fqt.yaml", id))
    }

    /// Get the directory for a given entity prefix
    pub fn entity_dir(&self, prefix: EntityPrefix) -> PathBuf {
        self.root.join(Self::entity_directory(prefix))
    }

    /// Get the directory name for a given entity prefix
    pub fn entity_directory(prefix: EntityPrefix) -> &'static str {
        match prefix {
            EntityPrefix::Quot => "quotations",
            EntityPrefix::Mat => "materials",
            EntityPrefix::Res => "resources",
            EntityPrefix::Ven => "vendors",
            EntityPrefix::Rfq => "rfqs",
        }
    }

    /// Iterate all entity files of a given prefix type
    pub fn iter_entity_files(&self, prefix: EntityPrefix) -> impl Iterator<Item = PathBuf> {
        let dir = self.entity_dir(prefix);
        walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().to_string_lossy().ends_with(".fqt.yaml"))
            .map(|e| e.path().to_path_buf())
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not an FQT project (searched from {searched_from:?}). Run 'fqt init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("FQT project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_project_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        assert!(project.fqt_dir().exists());
        assert!(project.fqt_dir().join("config.yaml").exists());
        assert!(project.root().join("quotations").is_dir());
        assert!(project.root().join("materials").is_dir());
        assert!(project.root().join("resources").is_dir());
        assert!(project.root().join("vendors").is_dir());
        assert!(project.root().join("rfqs").is_dir());
    }

    #[test]
    fn test_project_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let err = Project::init(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists(_)));
    }

    #[test]
    fn test_project_discover_finds_fqt_dir() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let subdir = tmp.path().join("some/nested/dir");
        std::fs::create_dir_all(&subdir).unwrap();

        let project = Project::discover_from(&subdir).unwrap();
        assert_eq!(
            project.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_project_discover_fails_without_fqt_dir() {
        let tmp = tempdir().unwrap();
        let err = Project::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }

    #[test]
    fn test_entity_directories() {
        assert_eq!(Project::entity_directory(EntityPrefix::Quot), "quotations");
        assert_eq!(Project::entity_directory(EntityPrefix::Mat), "materials");
        assert_eq!(Project::entity_directory(EntityPrefix::Rfq), "rfqs");
    }
}
