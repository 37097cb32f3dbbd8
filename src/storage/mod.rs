//! # Storage Layer
//!
//! Persistence for bom-cost with git-friendly file formats.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Catalog | JSONL (one record per line) | `.bom/catalog.jsonl` |
//! | Config | TOML | `.bom/config.toml` |
//! | Read view | SQLite (auto-regenerated) | `.bom/.cache/catalog.db` |
//!
//! ## Concurrency Safety
//!
//! - [`CatalogStore`] uses file locking (`fs2`) for concurrent access
//! - All full rewrites are atomic (temp file + rename)
//! - [`SqliteCatalog`] serves each resolution from one read transaction
//!
//! ## Project Structure
//!
//! ```text
//! .bom/
//! ├── catalog.jsonl         # Items, recipes, variants and add-ons
//! ├── config.toml           # Project configuration
//! ├── .cache/catalog.db     # SQLite read view (auto-generated)
//! └── .gitignore            # Ignores the cache
//! ```
//!
//! ## Key Types
//!
//! - [`Project`] - Entry point for accessing a bom project
//! - [`CatalogStore`] - Read/write catalog rows as JSONL
//! - [`SqliteCatalog`] - Fingerprinted SQLite copy implementing `Catalog`
//! - [`Config`] - Project and global configuration

mod jsonl;
mod config;
mod project;
mod cache;

pub use jsonl::CatalogStore;
pub use config::{Config, ConfigError, DisplayConfig, GlobalConfig, OutputFormat, ProjectConfig};
pub use project::{Project, ProjectError};
pub use cache::{CacheStats, SqliteCatalog};
