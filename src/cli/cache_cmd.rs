//! Cache CLI commands

use anyhow::Result;
use clap::Subcommand;

use super::output::Output;
use crate::storage::Project;

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Rebuild the cache from catalog.jsonl
    Rebuild,

    /// Show cache status
    Status,
}

pub fn run(cmd: CacheCommands, output: &Output) -> Result<()> {
    match cmd {
        CacheCommands::Rebuild => rebuild(output),
        CacheCommands::Status => status(output),
    }
}

fn rebuild(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    output.verbose("Rebuilding cache from catalog.jsonl");

    let start = std::time::Instant::now();
    let rows = project.rebuild_cache()?;
    let duration = start.elapsed();

    if output.is_json() {
        output.data(&serde_json::json!({
            "rebuilt": true,
            "duration_ms": duration.as_millis(),
            "rows": rows,
        }));
    } else {
        output.success(&format!("Cache rebuilt in {:?} ({} rows)", duration, rows));
    }

    Ok(())
}

fn status(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let cache = project.cache()?;

    let is_stale = cache.is_stale()?;
    let cache_path = cache.path().to_path_buf();
    let stats = cache.stats()?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "path": cache_path.display().to_string(),
            "stale": is_stale,
            "stats": stats,
        }));
    } else {
        println!("Cache Status");
        println!("{}", "=".repeat(40));
        println!("Path: {}", cache_path.display());
        println!(
            "Status: {}",
            if is_stale {
                "STALE (needs rebuild)"
            } else {
                "fresh"
            }
        );
        match stats.last_rebuild {
            Some(at) => println!("Last rebuild: {}", at.to_rfc3339()),
            None => println!("Last rebuild: never"),
        }
        println!();
        println!("Cached Data:");
        println!("  Items: {}", stats.items);
        println!(
            "  Materials: {} ({} component lines)",
            stats.materials, stats.component_edges
        );
        println!(
            "  Variants: {} ({} sub-variants)",
            stats.variants, stats.sub_variants
        );
        println!("  Add-ons: {}", stats.add_ons);

        if is_stale {
            println!();
            println!("Run 'bom cache rebuild' to update the cache.");
        }
    }

    Ok(())
}
