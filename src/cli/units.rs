//! Unit CLI commands

use anyhow::{Context, Result};
use clap::Subcommand;

use super::app::parse_decimal;
use super::output::{quantity, Output};
use crate::domain::UnitRegistry;
use crate::storage::{Config, Project};

#[derive(Subcommand)]
pub enum UnitsCommands {
    /// List known units (standard plus project-defined)
    List,

    /// Convert an amount between two units of the same dimension
    Convert {
        /// Amount to convert
        amount: String,

        /// Unit to convert from
        from: String,

        /// Unit to convert to
        to: String,
    },
}

pub fn run(cmd: UnitsCommands, output: &Output) -> Result<()> {
    let units = registry()?;

    match cmd {
        UnitsCommands::List => list(output, &units),
        UnitsCommands::Convert { amount, from, to } => convert(output, &units, &amount, &from, &to),
    }
}

/// Project units when inside a project, the standard set otherwise
fn registry() -> Result<UnitRegistry> {
    match Config::find_project_root() {
        Some(root) => Project::open(root)?.units(),
        None => Ok(UnitRegistry::standard()),
    }
}

fn list(output: &Output, units: &UnitRegistry) -> Result<()> {
    if output.is_json() {
        let defs: Vec<_> = units.units().collect();
        output.data(&defs);
        return Ok(());
    }

    println!("{:<8} {:<8} {:>16}  ALIASES", "UNIT", "KIND", "FACTOR");
    println!("{}", "-".repeat(60));
    for def in units.units() {
        println!(
            "{:<8} {:<8} {:>16}  {}",
            def.token,
            def.dimension.as_str(),
            format!("{} {}", quantity(def.factor), def.dimension.base_unit()),
            def.aliases.join(", ")
        );
    }

    Ok(())
}

fn convert(output: &Output, units: &UnitRegistry, amount: &str, from: &str, to: &str) -> Result<()> {
    let amount = parse_decimal(amount)?;
    let converted = units
        .convert(amount, from, to)
        .with_context(|| format!("Cannot convert {} {} to {}", quantity(amount), from, to))?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "amount": amount,
            "from": from,
            "to": to,
            "result": converted,
        }));
    } else {
        println!("{} {} = {} {}", quantity(amount), from, quantity(converted), to);
    }

    Ok(())
}
