//! Static catalog checks
//!
//! Finds the data problems the cost engine would otherwise only discover
//! (and price at zero) while resolving: dangling and inactive references,
//! unknown units, unit dimension mismatches, bad batch sizes and cycles.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use super::catalog::{CatalogRecord, ComponentRef, MemoryCatalog, RecordKey};
use super::graph::BomGraph;
use super::id::{MaterialId, ProductId, Size};
use super::unit::UnitRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Will make resolutions fail or price lines at zero
    Error,
    /// Suspicious but priceable
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct LintIssue {
    pub severity: Severity,

    /// Catalog row the issue is about (e.g. `material:sponge`)
    pub subject: String,

    pub message: String,
}

impl LintIssue {
    fn error(subject: impl fmt::Display, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            subject: subject.to_string(),
            message: message.into(),
        }
    }

    fn warning(subject: impl fmt::Display, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            subject: subject.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.subject, self.message)
    }
}

/// Checks a whole catalog and returns issues sorted by severity then subject
pub fn lint_catalog(catalog: &MemoryCatalog, units: &UnitRegistry) -> Vec<LintIssue> {
    let mut issues = Vec::new();

    for item in catalog.items() {
        let key = RecordKey::Item(item.id.clone());
        if !units.is_valid_unit(&item.unit) {
            issues.push(LintIssue::error(&key, format!("unknown unit '{}'", item.unit)));
        }
        if item.unit_price < Decimal::ZERO {
            issues.push(LintIssue::warning(&key, format!("negative unit price {}", item.unit_price)));
        }
    }

    for material in catalog.materials() {
        let key = RecordKey::Material(material.id.clone());
        if !units.is_valid_unit(&material.batch_unit) {
            issues.push(LintIssue::error(
                &key,
                format!("unknown batch unit '{}'", material.batch_unit),
            ));
        }
        if material.batch_amount <= Decimal::ZERO {
            issues.push(LintIssue::error(
                &key,
                format!("batch amount {} is not positive", material.batch_amount),
            ));
        }

        for edge in material.components.iter().filter(|e| e.active) {
            let line = format!("line {} ({})", edge.position, edge.target);
            if edge.amount <= Decimal::ZERO {
                issues.push(LintIssue::warning(
                    &key,
                    format!("{}: amount {} is not positive", line, edge.amount),
                ));
            }
            if !units.is_valid_unit(&edge.unit) {
                issues.push(LintIssue::error(&key, format!("{}: unknown unit '{}'", line, edge.unit)));
                continue;
            }

            let target_unit = match &edge.target {
                ComponentRef::Item(id) => match catalog.item(id) {
                    None => {
                        issues.push(LintIssue::error(&key, format!("{}: target does not exist", line)));
                        continue;
                    }
                    Some(item) => {
                        if !item.active {
                            issues.push(LintIssue::warning(&key, format!("{}: target is inactive", line)));
                        }
                        &item.unit
                    }
                },
                ComponentRef::Material(id) => match catalog.material(id) {
                    None => {
                        issues.push(LintIssue::error(&key, format!("{}: target does not exist", line)));
                        continue;
                    }
                    Some(target) => {
                        if !target.active {
                            issues.push(LintIssue::warning(&key, format!("{}: target is inactive", line)));
                        }
                        &target.batch_unit
                    }
                },
            };

            if units.is_valid_unit(target_unit) && !units.same_dimension(&edge.unit, target_unit) {
                issues.push(LintIssue::error(
                    &key,
                    format!("{}: cannot convert '{}' to '{}'", line, edge.unit, target_unit),
                ));
            }
        }
    }

    for record in catalog.records() {
        let (product, size, material) = match &record {
            CatalogRecord::Variant(v) => (&v.product, &v.size, &v.material),
            CatalogRecord::SubVariant(v) => (&v.product, &v.size, &v.material),
            _ => continue,
        };
        let is_base = matches!(record, CatalogRecord::Variant(_));
        check_binding(catalog, &record.key(), product, size, material, is_base, &mut issues);
    }

    for add_on in catalog.add_ons() {
        if add_on.unit_price < Decimal::ZERO {
            issues.push(LintIssue::warning(
                RecordKey::AddOn(add_on.id.clone()),
                format!("negative unit price {}", add_on.unit_price),
            ));
        }
    }

    let graph = BomGraph::from_materials(catalog.materials());
    for cycle in graph.cycles() {
        let members: Vec<&str> = cycle.iter().map(|m| m.as_str()).collect();
        if let Some(first) = cycle.first() {
            issues.push(LintIssue::error(
                RecordKey::Material(first.clone()),
                format!("cyclic recipe: {}", members.join(", ")),
            ));
        }
    }

    issues.sort();
    issues
}

fn check_binding(
    catalog: &MemoryCatalog,
    key: &RecordKey,
    product: &ProductId,
    size: &Size,
    material: &MaterialId,
    is_base: bool,
    issues: &mut Vec<LintIssue>,
) {
    let Some(target) = catalog.material(material) else {
        issues.push(LintIssue::error(key, format!("material '{}' does not exist", material)));
        return;
    };

    if !target.active {
        issues.push(LintIssue::error(key, format!("material '{}' is inactive", material)));
    }

    // A sub-variant for the same selection shadows the base binding
    let overridden = is_base
        && catalog
            .sub_variants()
            .any(|sub| &sub.product == product && &sub.size == size);

    if is_base && !overridden {
        if let Some(tag) = &target.size {
            if tag != size {
                issues.push(LintIssue::error(
                    key,
                    format!(
                        "material '{}' is tagged for size '{}', so {} / {} never resolves through it",
                        material, tag, product, size
                    ),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{ComponentEdge, InventoryItem, MaterialRecord, SubVariant, Variant};
    use crate::domain::id::ItemId;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn mid(s: &str) -> MaterialId {
        MaterialId::new(s).unwrap()
    }

    fn iid(s: &str) -> ItemId {
        ItemId::new(s).unwrap()
    }

    fn flour() -> CatalogRecord {
        CatalogRecord::Item(InventoryItem {
            id: iid("flour"),
            name: None,
            unit_price: dec("2.00"),
            unit: "kg".to_string(),
            active: true,
        })
    }

    fn lint(catalog: &MemoryCatalog) -> Vec<LintIssue> {
        lint_catalog(catalog, &UnitRegistry::standard())
    }

    #[test]
    fn clean_catalog_has_no_issues() {
        let catalog = MemoryCatalog::new().with(flour()).with(CatalogRecord::Material(
            MaterialRecord::new(mid("sponge"), dec("1"), "kg")
                .with(ComponentEdge::item(1, iid("flour"), dec("500"), "g")),
        ));

        assert!(lint(&catalog).is_empty());
    }

    #[test]
    fn dangling_reference() {
        let catalog = MemoryCatalog::new().with(CatalogRecord::Material(
            MaterialRecord::new(mid("sponge"), dec("1"), "kg")
                .with(ComponentEdge::material(1, mid("batter"), dec("1"), "kg")),
        ));

        let issues = lint(&catalog);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(issues[0].subject, "material:sponge");
        assert!(issues[0].message.contains("does not exist"));
    }

    #[test]
    fn dimension_mismatch() {
        let catalog = MemoryCatalog::new().with(flour()).with(CatalogRecord::Material(
            MaterialRecord::new(mid("sponge"), dec("1"), "kg")
                .with(ComponentEdge::item(1, iid("flour"), dec("2"), "cup")),
        ));

        let issues = lint(&catalog);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("cannot convert 'cup' to 'kg'"));
    }

    #[test]
    fn unknown_units_and_bad_batch() {
        let catalog = MemoryCatalog::new().with(CatalogRecord::Material(
            MaterialRecord::new(mid("sponge"), Decimal::ZERO, "bucket"),
        ));

        let issues = lint(&catalog);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.severity == Severity::Error));
    }

    #[test]
    fn inactive_target_is_a_warning() {
        let item = InventoryItem {
            id: iid("saffron"),
            name: None,
            unit_price: dec("9000"),
            unit: "kg".to_string(),
            active: false,
        };
        let catalog = MemoryCatalog::new()
            .with(CatalogRecord::Item(item))
            .with(CatalogRecord::Material(
                MaterialRecord::new(mid("bun"), dec("1"), "pc")
                    .with(ComponentEdge::item(1, iid("saffron"), dec("1"), "g")),
            ));

        let issues = lint(&catalog);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn cycles_are_errors() {
        let catalog = MemoryCatalog::new()
            .with(CatalogRecord::Material(
                MaterialRecord::new(mid("a"), dec("1"), "kg")
                    .with(ComponentEdge::material(1, mid("b"), dec("1"), "kg")),
            ))
            .with(CatalogRecord::Material(
                MaterialRecord::new(mid("b"), dec("1"), "kg")
                    .with(ComponentEdge::material(1, mid("a"), dec("1"), "kg")),
            ));

        let issues = lint(&catalog);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "cyclic recipe: a, b");
    }

    #[test]
    fn variant_bound_to_missing_or_mistagged_material() {
        let mut small = MaterialRecord::new(mid("small-cake"), dec("1"), "pc");
        small.size = Some(Size::new("Small").unwrap());

        let catalog = MemoryCatalog::new()
            .with(CatalogRecord::Material(small))
            .with(CatalogRecord::Variant(Variant {
                product: ProductId::new("cake").unwrap(),
                size: Size::new("Large").unwrap(),
                material: mid("small-cake"),
            }))
            .with(CatalogRecord::Variant(Variant {
                product: ProductId::new("pie").unwrap(),
                size: Size::new("Large").unwrap(),
                material: mid("ghost"),
            }));

        let issues = lint(&catalog);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().any(|i| i.message.contains("tagged for size 'Small'")));
        assert!(issues.iter().any(|i| i.message.contains("'ghost' does not exist")));
    }

    #[test]
    fn mistagged_base_is_fine_when_a_sub_variant_overrides_it() {
        let mut small = MaterialRecord::new(mid("small-cake"), dec("1"), "pc");
        small.size = Some(Size::new("Small").unwrap());

        let catalog = MemoryCatalog::new()
            .with(CatalogRecord::Material(small))
            .with(CatalogRecord::Material(MaterialRecord::new(mid("large-cake"), dec("1"), "pc")))
            .with(CatalogRecord::Variant(Variant {
                product: ProductId::new("cake").unwrap(),
                size: Size::new("Large").unwrap(),
                material: mid("small-cake"),
            }))
            .with(CatalogRecord::SubVariant(SubVariant {
                product: ProductId::new("cake").unwrap(),
                size: Size::new("Large").unwrap(),
                material: mid("large-cake"),
            }));

        assert!(lint(&catalog).is_empty());
    }
}
