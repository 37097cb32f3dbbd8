//! Main CLI application structure

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::output::Output;
use super::{cache_cmd, catalog, quote, units};
use crate::domain::AddOnSelection;
use crate::storage::{Config, OutputFormat, Project};

#[derive(Parser)]
#[command(name = "bom")]
#[command(author, version, about = "Bill-of-materials cost resolution for made-to-order products")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to `default_format` in the global config)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new bom project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Import items, recipes, variants and add-ons from a YAML or JSON file
    Import {
        /// Catalog document to merge into the project
        file: PathBuf,
    },

    /// Inspect and convert units
    #[command(subcommand)]
    Units(units::UnitsCommands),

    /// Cost one batch of a composite material
    Cost {
        /// Material ID
        material: String,

        /// Fail instead of pricing unresolvable lines at zero
        #[arg(long)]
        strict: bool,
    },

    /// Show which material a product size is priced from
    Variant {
        /// Product ID
        product: String,

        /// Size tag (e.g. Large)
        size: String,
    },

    /// Price an order line
    Price {
        /// Product ID
        product: String,

        /// Size tag (e.g. Large)
        size: String,

        /// Number of units ordered
        #[arg(long, default_value = "1")]
        qty: u32,

        /// Add-on to include, optionally with a quantity (repeatable)
        #[arg(long = "add-on", value_name = "ID[=QTY]")]
        add_ons: Vec<AddOnSelection>,

        /// Fail instead of pricing unresolvable lines at zero
        #[arg(long)]
        strict: bool,
    },

    /// Check the catalog for broken references, unit problems and cycles
    Check,

    /// List the recipes that directly use an item or material
    WhereUsed {
        /// ID, optionally prefixed with `item:` or `material:`
        id: String,
    },

    /// Manage the SQLite cache
    #[command(subcommand)]
    Cache(cache_cmd::CacheCommands),
}

/// Installs the stderr log subscriber
///
/// `--verbose` shows this crate's debug events; otherwise `RUST_LOG`
/// applies, defaulting to warnings only.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("bom_cost=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // A subscriber may already be installed when embedded
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let format = match cli.format {
        Some(format) => format,
        None => Config::load_global()?.default_format,
    };
    let output = Output::new(format);

    output.verbose("bom starting");

    match cli.command {
        Commands::Init { path } => {
            output.verbose_ctx("init", &format!("Initializing project at: {}", path));
            let project = Project::init(&path)?;
            output.verbose_ctx(
                "init",
                &format!("Created .bom directory at: {}", project.bom_dir().display()),
            );
            output.success(&format!("Initialized bom project at {}", project.root().display()));
        }

        Commands::Import { file } => catalog::import(&output, &file)?,

        Commands::Units(cmd) => units::run(cmd, &output)?,

        Commands::Cost { material, strict } => {
            output.verbose_ctx("cost", &format!("Costing {}, strict={}", material, strict));
            quote::cost(&output, &material, strict)?
        }

        Commands::Variant { product, size } => quote::variant(&output, &product, &size)?,

        Commands::Price {
            product,
            size,
            qty,
            add_ons,
            strict,
        } => {
            output.verbose_ctx(
                "price",
                &format!(
                    "Pricing {} / {} x{} with {} add-on(s), strict={}",
                    product,
                    size,
                    qty,
                    add_ons.len(),
                    strict
                ),
            );
            quote::price(&output, &product, &size, qty, &add_ons, strict)?
        }

        Commands::Check => catalog::check(&output)?,

        Commands::WhereUsed { id } => catalog::where_used(&output, &id)?,

        Commands::Cache(cmd) => cache_cmd::run(cmd, &output)?,
    }

    output.verbose("Command completed successfully");
    Ok(())
}

/// Parses a decimal argument, accepting scientific notation
pub(crate) fn parse_decimal(raw: &str) -> Result<Decimal> {
    let raw = raw.trim();
    raw.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(raw))
        .with_context(|| format!("Invalid number: {}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_price_with_add_ons() {
        let cli = Cli::try_parse_from([
            "bom", "price", "cake", "Large", "--qty", "2", "--add-on", "7=3", "--add-on", "8",
            "--strict",
        ])
        .unwrap();

        match cli.command {
            Commands::Price {
                product,
                size,
                qty,
                add_ons,
                strict,
            } => {
                assert_eq!(product, "cake");
                assert_eq!(size, "Large");
                assert_eq!(qty, 2);
                assert_eq!(add_ons.len(), 2);
                assert_eq!(add_ons[0].quantity, 3);
                assert_eq!(add_ons[1].quantity, 1);
                assert!(strict);
            }
            _ => panic!("expected price command"),
        }
    }

    #[test]
    fn rejects_bad_add_on() {
        assert!(Cli::try_parse_from(["bom", "price", "cake", "Large", "--add-on", "7=x"]).is_err());
    }

    #[test]
    fn format_is_optional() {
        let cli = Cli::try_parse_from(["bom", "check"]).unwrap();
        assert!(cli.format.is_none());

        let cli = Cli::try_parse_from(["bom", "--format", "json", "check"]).unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
    }

    #[test]
    fn parse_decimal_forms() {
        assert_eq!(parse_decimal("2.5").unwrap(), Decimal::new(25, 1));
        assert_eq!(parse_decimal("1e3").unwrap(), Decimal::new(1000, 0));
        assert!(parse_decimal("abc").is_err());
    }
}
