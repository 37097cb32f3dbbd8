//! Project management
//!
//! Handles project initialization and provides access to stores.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::{CatalogStore, Config, SqliteCatalog};
use crate::domain::{MemoryCatalog, ResolutionLimits, UnitRegistry};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a bom project. Run 'bom init' first.")]
    NotInProject,
}

/// A bom project: a directory containing `.bom/`
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let bom_dir = root.join(".bom");

        if !bom_dir.is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path; existing files are kept
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let bom_dir = root.join(".bom");

        fs::create_dir_all(&bom_dir)
            .with_context(|| format!("Failed to create .bom directory: {}", bom_dir.display()))?;

        // Create default config
        let config_path = bom_dir.join("config.toml");
        if !config_path.exists() {
            let default_config = r#"# bom-cost configuration

[resolution]
# Deepest recipe nesting followed before giving up
max_depth = 64
# Wall-clock budget per resolution, in milliseconds (unset = unlimited)
# max_duration_ms = 2000
# Reuse sub-recipe costs within one resolution
memoize = true
# Fail instead of returning partially resolved costs
strict = false

[display]
# Decimal places in text output (JSON is never rounded)
scale = 2
currency = "$"

# Extra units, e.g.
# [[units]]
# token = "tray"
# dimension = "count"
# factor = 24
"#;
            fs::write(&config_path, default_config)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        // Create .gitignore for .bom
        let gitignore_path = bom_dir.join(".gitignore");
        if !gitignore_path.exists() {
            let gitignore = r#"# Ignore SQLite cache (regenerated from catalog.jsonl)
.cache/

# Ignore interrupted writes
*.tmp
"#;
            fs::write(&gitignore_path, gitignore).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        let catalog_path = bom_dir.join("catalog.jsonl");
        if !catalog_path.exists() {
            fs::write(&catalog_path, "")
                .with_context(|| format!("Failed to create catalog: {}", catalog_path.display()))?;
        }

        tracing::debug!(root = %root.display(), "initialized project");

        Self::open(root)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .bom directory path
    pub fn bom_dir(&self) -> PathBuf {
        self.root.join(".bom")
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a mutable reference to the configuration
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Returns the catalog store
    pub fn catalog_store(&self) -> CatalogStore {
        CatalogStore::for_project(&self.root)
    }

    /// Loads catalog.jsonl into memory
    pub fn load_catalog(&self) -> Result<MemoryCatalog> {
        self.catalog_store().load()
    }

    /// Standard units plus the ones declared in config.toml
    pub fn units(&self) -> Result<UnitRegistry> {
        self.config
            .project
            .unit_registry()
            .context("Invalid [[units]] in config.toml")
    }

    /// Resolution limits from config.toml
    pub fn limits(&self) -> ResolutionLimits {
        self.config.project.resolution.clone()
    }

    /// Returns the cache directory
    pub fn cache_dir(&self) -> PathBuf {
        self.bom_dir().join(".cache")
    }

    /// Opens the SQLite cache for this project
    pub fn cache(&self) -> Result<SqliteCatalog> {
        SqliteCatalog::open(&self.root)
    }

    /// Rebuilds the cache from catalog.jsonl; returns the number of rows
    pub fn rebuild_cache(&self) -> Result<usize> {
        let mut cache = self.cache()?;
        self.refill(&mut cache)
    }

    /// Gets the cache if it's fresh, or rebuilds it if stale
    pub fn get_or_rebuild_cache(&self) -> Result<SqliteCatalog> {
        let mut cache = self.cache()?;

        if cache.is_stale()? {
            tracing::debug!("catalog cache is stale, rebuilding");
            self.refill(&mut cache)?;
        }

        Ok(cache)
    }

    fn refill(&self, cache: &mut SqliteCatalog) -> Result<usize> {
        let store = self.catalog_store();
        // Fingerprint first: a concurrent edit then only makes the cache
        // look stale, never fresh
        let fingerprint = store.fingerprint().context("Failed to fingerprint catalog")?;
        let records = store.read_all()?;
        cache.rebuild(records.values(), &fingerprint)
    }
}
