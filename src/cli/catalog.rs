//! Catalog maintenance commands: import, check, where-used

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use super::output::Output;
use crate::domain::{
    lint_catalog, BomGraph, CatalogDocument, ComponentRef, ItemId, MaterialId, Severity,
};
use crate::storage::Project;

fn read_document(file: &Path) -> Result<CatalogDocument> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let is_json = file
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON catalog: {}", file.display()))
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML catalog: {}", file.display()))
    }
}

/// `bom import FILE`
pub fn import(output: &Output, file: &Path) -> Result<()> {
    let project = Project::open_current()?;
    let document = read_document(file)?;
    output.verbose_ctx("import", &format!("Read {} row(s) from {}", document.len(), file.display()));

    let written = project.catalog_store().upsert(document.into_records())?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "imported": written,
            "file": file.display().to_string(),
        }));
    } else {
        output.success(&format!("Imported {} row(s) from {}", written, file.display()));
    }

    Ok(())
}

/// `bom check`
pub fn check(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let units = project.units()?;
    let catalog = project.load_catalog()?;

    let issues = lint_catalog(&catalog, &units);
    let errors = issues.iter().filter(|i| i.severity == Severity::Error).count();
    let warnings = issues.len() - errors;

    if output.is_json() {
        output.data(&serde_json::json!({
            "rows": catalog.len(),
            "errors": errors,
            "warnings": warnings,
            "issues": issues,
        }));
    } else {
        for issue in &issues {
            println!("{}", issue);
        }
        if !issues.is_empty() {
            println!();
        }
        println!(
            "Checked {} row(s): {} error(s), {} warning(s)",
            catalog.len(),
            errors,
            warnings
        );
    }

    if errors > 0 {
        bail!("Catalog has {} error(s)", errors);
    }

    Ok(())
}

/// `bom where-used ID`
pub fn where_used(output: &Output, id: &str) -> Result<()> {
    let project = Project::open_current()?;
    let catalog = project.load_catalog()?;
    let graph = BomGraph::from_materials(catalog.materials());

    let candidates: Vec<ComponentRef> = if let Some(raw) = id.strip_prefix("item:") {
        vec![ComponentRef::Item(ItemId::new(raw).context("Invalid item ID")?)]
    } else if let Some(raw) = id.strip_prefix("material:") {
        vec![ComponentRef::Material(MaterialId::new(raw).context("Invalid material ID")?)]
    } else {
        let item = ComponentRef::Item(ItemId::new(id).context("Invalid ID")?);
        let material = ComponentRef::Material(MaterialId::new(id).context("Invalid ID")?);
        let known: Vec<ComponentRef> = [item, material]
            .into_iter()
            .filter(|node| {
                let in_catalog = match node {
                    ComponentRef::Item(i) => catalog.item(i).is_some(),
                    ComponentRef::Material(m) => catalog.material(m).is_some(),
                };
                in_catalog || graph.contains(node)
            })
            .collect();
        if known.is_empty() {
            bail!("No item or material named '{}'", id);
        }
        known
    };

    let results: Vec<(ComponentRef, Vec<MaterialId>)> = candidates
        .into_iter()
        .map(|node| {
            let users = graph.where_used(&node);
            (node, users)
        })
        .collect();

    if output.is_json() {
        let data: Vec<_> = results
            .iter()
            .map(|(node, users)| {
                serde_json::json!({
                    "component": node,
                    "used_by": users,
                })
            })
            .collect();
        output.data(&data);
    } else {
        for (node, users) in &results {
            if users.is_empty() {
                println!("{} is not used by any recipe", node);
            } else {
                println!("{} is used by:", node);
                for user in users {
                    println!("  {}", user);
                }
            }
        }
    }

    Ok(())
}
