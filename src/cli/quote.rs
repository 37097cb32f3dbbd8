//! Cost and price commands

use anyhow::{Context, Result};
use serde::Serialize;

use super::output::{money, quantity, Output};
use crate::domain::{
    AddOnSelection, Binding, CostEngine, CostStatus, Costing, MaterialId, OrderLineQuote,
    ProductId, Size,
};
use crate::storage::{DisplayConfig, Project};

/// Costing plus its status, as printed in JSON mode
#[derive(Serialize)]
struct CostReport<'a> {
    status: CostStatus,
    #[serde(flatten)]
    costing: &'a Costing,
}

#[derive(Serialize)]
struct QuoteReport<'a> {
    material: &'a MaterialId,
    status: CostStatus,
    #[serde(flatten)]
    quote: &'a OrderLineQuote,
}

fn selection(product: &str, size: &str) -> Result<(ProductId, Size)> {
    let product = ProductId::new(product).context("Invalid product ID")?;
    let size = Size::new(size).context("Invalid size")?;
    Ok((product, size))
}

/// `bom cost MATERIAL`
pub fn cost(output: &Output, material: &str, strict: bool) -> Result<()> {
    let material = MaterialId::new(material).context("Invalid material ID")?;

    let project = Project::open_current()?;
    let units = project.units()?;
    let cache = project.get_or_rebuild_cache()?;

    let mut limits = project.limits();
    limits.strict |= strict;

    let costing = CostEngine::new(&cache, &units)
        .with_limits(limits)
        .resolve_unit_cost(&material)?;

    if output.is_json() {
        output.data(&CostReport {
            status: costing.status(),
            costing: &costing,
        });
    } else {
        print_costing(&project.config().project.display, &costing);
    }

    Ok(())
}

fn print_costing(display: &DisplayConfig, costing: &Costing) {
    println!("Material: {}", costing.material);
    println!(
        "Batch: {} {}",
        quantity(costing.batch_amount),
        costing.batch_unit
    );

    if !costing.lines.is_empty() {
        println!();
        println!("{:<5} {:<28} {:>14} {:>12}", "POS", "COMPONENT", "AMOUNT", "COST");
        println!("{}", "-".repeat(62));
        for line in &costing.lines {
            println!(
                "{:<5} {:<28} {:>14} {:>12}",
                line.position,
                line.target.to_string(),
                format!("{} {}", quantity(line.amount), line.unit),
                money(display, line.cost)
            );
        }
    }

    println!();
    println!("Batch cost: {}", money(display, costing.cost));
    print_warnings(costing);
}

fn print_warnings(costing: &Costing) {
    if costing.is_complete() {
        return;
    }

    println!();
    println!(
        "Partially resolved: {} line(s) priced at zero",
        costing.warnings.len()
    );
    for warning in &costing.warnings {
        println!("  warning: {}", warning);
    }
}

/// `bom variant PRODUCT SIZE`
pub fn variant(output: &Output, product: &str, size: &str) -> Result<()> {
    let (product, size) = selection(product, size)?;

    let project = Project::open_current()?;
    let units = project.units()?;
    let cache = project.get_or_rebuild_cache()?;

    let material = CostEngine::new(&cache, &units).resolve_variant(&product, &size)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "product": product,
            "size": size,
            "material": material,
        }));
    } else {
        println!("{} / {} -> {}", product, size, material);
    }

    Ok(())
}

/// `bom price PRODUCT SIZE`
pub fn price(
    output: &Output,
    product: &str,
    size: &str,
    qty: u32,
    add_ons: &[AddOnSelection],
    strict: bool,
) -> Result<()> {
    let (product, size) = selection(product, size)?;

    let project = Project::open_current()?;
    let units = project.units()?;
    let cache = project.get_or_rebuild_cache()?;

    let mut limits = project.limits();
    limits.strict |= strict;

    let quote = CostEngine::new(&cache, &units)
        .with_limits(limits)
        .resolve_order_line_price(&product, &size, qty, add_ons)?;

    if output.is_json() {
        output.data(&QuoteReport {
            material: quote.material(),
            status: quote.base.status(),
            quote: &quote,
        });
    } else {
        print_quote(&project.config().project.display, &quote);
    }

    Ok(())
}

fn print_quote(display: &DisplayConfig, quote: &OrderLineQuote) {
    let via = match quote.binding {
        Binding::SubVariant => "sub-variant",
        Binding::Variant => "variant",
    };

    println!("Product: {} / {}", quote.product, quote.size);
    println!("Material: {} (via {})", quote.material(), via);
    println!(
        "Base: {} x {} = {}",
        money(display, quote.base.cost),
        quote.quantity,
        money(display, quote.base_total)
    );

    if !quote.add_ons.is_empty() {
        println!("Add-ons:");
        for charge in &quote.add_ons {
            println!(
                "  {:<16} {} x {} = {}",
                charge.add_on.to_string(),
                money(display, charge.unit_price),
                charge.quantity,
                money(display, charge.total)
            );
        }
    }

    println!("Total: {}", money(display, quote.total));
    print_warnings(&quote.base);
}
