//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Project management | `init`, `import` |
//! | Pricing | Cost resolution | `cost`, `variant`, `price` |
//! | Catalog | Static analysis | `check`, `where-used` |
//! | Units | Unit vocabulary | `units list`, `units convert` |
//! | Cache | SQLite read view | `cache rebuild`, `cache status` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` - Human-readable output, amounts rounded to `display.scale`
//! - `json` - Machine-parseable JSON at full precision
//!
//! Without the flag, `default_format` from the global config applies.
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug logging on stderr:
//! ```bash
//! bom --verbose price cake Large --add-on candles=2
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod cache_cmd;
mod catalog;
mod quote;
mod units;

pub use app::{run, Cli, Commands};
pub use output::Output;
