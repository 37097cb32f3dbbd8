//! Engine entry points
//!
//! Both operations open exactly one catalog snapshot and do every lookup
//! of the call through it.

use rust_decimal::Decimal;
use serde::Serialize;

use super::addon::{price_add_ons, AddOnCharge, AddOnSelection};
use super::catalog::{Catalog, CatalogReader};
use super::cost::{CostResolver, CostWarning, Costing, ResolutionLimits};
use super::error::{OverflowSite, ResolveError};
use super::id::{MaterialId, ProductId, Size};
use super::unit::UnitRegistry;
use super::variant::{resolve_pricing_node, Binding};

/// Price of one order line
#[must_use = "a quote may be partial; check its warnings"]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderLineQuote {
    pub product: ProductId,
    pub size: Size,
    pub binding: Binding,
    pub quantity: u32,

    /// Costing of one batch of the resolved recipe
    pub base: Costing,

    /// `base.cost * quantity`
    pub base_total: Decimal,

    pub add_ons: Vec<AddOnCharge>,
    pub add_on_total: Decimal,

    /// `base_total + add_on_total`
    pub total: Decimal,
}

impl OrderLineQuote {
    pub fn material(&self) -> &MaterialId {
        &self.base.material
    }

    pub fn warnings(&self) -> &[CostWarning] {
        &self.base.warnings
    }

    pub fn is_complete(&self) -> bool {
        self.base.is_complete()
    }
}

/// Cost resolution engine over a catalog
pub struct CostEngine<'a, C: Catalog + ?Sized> {
    catalog: &'a C,
    units: &'a UnitRegistry,
    limits: ResolutionLimits,
}

impl<'a, C: Catalog + ?Sized> CostEngine<'a, C> {
    pub fn new(catalog: &'a C, units: &'a UnitRegistry) -> Self {
        Self {
            catalog,
            units,
            limits: ResolutionLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ResolutionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &ResolutionLimits {
        &self.limits
    }

    /// Cost of one declared batch of a composite material
    pub fn resolve_unit_cost(&self, material: &MaterialId) -> Result<Costing, ResolveError> {
        let snapshot = self.catalog.snapshot()?;
        self.unit_cost_in(snapshot.as_ref(), material)
    }

    /// Composite material a (product, size) selection is priced from
    pub fn resolve_variant(&self, product: &ProductId, size: &Size) -> Result<MaterialId, ResolveError> {
        let snapshot = self.catalog.snapshot()?;
        resolve_pricing_node(snapshot.as_ref(), product, size).map(|(material, _)| material)
    }

    /// Full price of an order line: recipe cost times quantity plus add-ons
    pub fn resolve_order_line_price(
        &self,
        product: &ProductId,
        size: &Size,
        quantity: u32,
        add_ons: &[AddOnSelection],
    ) -> Result<OrderLineQuote, ResolveError> {
        let snapshot = self.catalog.snapshot()?;
        let reader = snapshot.as_ref();

        let (material, binding) = resolve_pricing_node(reader, product, size)?;
        let base = self.unit_cost_in(reader, &material)?;
        let overlay = price_add_ons(reader, add_ons)?;

        let overflow = || ResolveError::Overflow {
            at: OverflowSite::OrderLine {
                product: product.clone(),
                size: size.clone(),
            },
        };
        let base_total = base
            .cost
            .checked_mul(Decimal::from(quantity))
            .ok_or_else(overflow)?;
        let total = base_total.checked_add(overlay.total).ok_or_else(overflow)?;

        tracing::debug!(
            %product,
            %size,
            %material,
            quantity,
            total = %total,
            "priced order line"
        );

        Ok(OrderLineQuote {
            product: product.clone(),
            size: size.clone(),
            binding,
            quantity,
            base,
            base_total,
            add_ons: overlay.charges,
            add_on_total: overlay.total,
            total,
        })
    }

    fn unit_cost_in(&self, reader: &dyn CatalogReader, material: &MaterialId) -> Result<Costing, ResolveError> {
        let costing = CostResolver::new(reader, self.units, &self.limits).resolve_material(material)?;

        if self.limits.strict && !costing.is_complete() {
            return Err(ResolveError::Incomplete {
                material: costing.material,
                warnings: costing.warnings,
            });
        }

        Ok(costing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{
        AddOn, CatalogRecord, ComponentEdge, InventoryItem, MaterialRecord, MemoryCatalog,
        SubVariant, Variant,
    };
    use crate::domain::error::NotFound;
    use crate::domain::id::{AddOnId, ItemId};
    use crate::domain::cost::CostStatus;
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

    /// Product `d`: Large maps to `m1` (sponge + frosting), overridden by `m2`
    fn bakery() -> MemoryCatalog {
        MemoryCatalog::from_records([
            CatalogRecord::Item(InventoryItem {
                id: iid("flour"),
                name: Some("Flour".to_string()),
                unit_price: dec("2.00"),
                unit: "kg".to_string(),
                active: true,
            }),
            CatalogRecord::Item(InventoryItem {
                id: iid("butter"),
                name: None,
                unit_price: dec("8.00"),
                unit: "kg".to_string(),
                active: true,
            }),
            CatalogRecord::Material(
                MaterialRecord::new(mid("sponge"), dec("1"), "kg")
                    .with(ComponentEdge::item(1, iid("flour"), dec("0.5"), "kg")),
            ),
            CatalogRecord::Material(
                MaterialRecord::new(mid("m1"), dec("1"), "pc")
                    .with(ComponentEdge::material(1, mid("sponge"), dec("2"), "kg"))
                    .with(ComponentEdge::item(2, iid("butter"), dec("250"), "g")),
            ),
            CatalogRecord::Material(
                MaterialRecord::new(mid("m2"), dec("1"), "pc")
                    .with(ComponentEdge::material(1, mid("sponge"), dec("3"), "kg")),
            ),
            CatalogRecord::Material(
                MaterialRecord::new(mid("m3"), dec("1"), "pc")
                    .with(ComponentEdge::item(1, iid("cocoa"), dec("100"), "g")),
            ),
            CatalogRecord::Variant(Variant {
                product: ProductId::new("d").unwrap(),
                size: Size::new("Medium").unwrap(),
                material: mid("m1"),
            }),
            CatalogRecord::Variant(Variant {
                product: ProductId::new("d").unwrap(),
                size: Size::new("Large").unwrap(),
                material: mid("m1"),
            }),
            CatalogRecord::SubVariant(SubVariant {
                product: ProductId::new("d").unwrap(),
                size: Size::new("Large").unwrap(),
                material: mid("m2"),
            }),
            CatalogRecord::Variant(Variant {
                product: ProductId::new("choc").unwrap(),
                size: Size::new("Small").unwrap(),
                material: mid("m3"),
            }),
            CatalogRecord::AddOn(AddOn {
                id: AddOnId::new("7").unwrap(),
                name: Some("Candles".to_string()),
                unit_price: dec("1.50"),
                active: true,
            }),
        ])
    }

    fn pid(s: &str) -> ProductId {
        ProductId::new(s).unwrap()
    }

    fn size(s: &str) -> Size {
        Size::new(s).unwrap()
    }

    #[test]
    fn unit_cost_of_a_batch() {
        let catalog = bakery();
        let units = UnitRegistry::standard();
        let engine = CostEngine::new(&catalog, &units);

        let costing = engine.resolve_unit_cost(&mid("sponge")).unwrap();
        assert_eq!(costing.cost, dec("1.00"));

        // 2 kg sponge (2.00) + 250 g butter (2.00)
        let costing = engine.resolve_unit_cost(&mid("m1")).unwrap();
        assert_eq!(costing.cost, dec("4.00"));
        assert_eq!(costing.lines.len(), 2);
    }

    #[test]
    fn repeated_resolution_is_identical() {
        let catalog = bakery();
        let units = UnitRegistry::standard();
        let engine = CostEngine::new(&catalog, &units);

        let first = engine.resolve_unit_cost(&mid("m1")).unwrap();
        let second = engine.resolve_unit_cost(&mid("m1")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn variant_resolution_prefers_override() {
        let catalog = bakery();
        let units = UnitRegistry::standard();
        let engine = CostEngine::new(&catalog, &units);

        assert_eq!(engine.resolve_variant(&pid("d"), &size("Large")).unwrap(), mid("m2"));
        assert_eq!(engine.resolve_variant(&pid("d"), &size("Medium")).unwrap(), mid("m1"));
    }

    #[test]
    fn order_line_with_add_ons() {
        let catalog = bakery();
        let units = UnitRegistry::standard();
        let engine = CostEngine::new(&catalog, &units);

        let quote = engine
            .resolve_order_line_price(
                &pid("d"),
                &size("Medium"),
                2,
                &[AddOnSelection::new(AddOnId::new("7").unwrap(), 3)],
            )
            .unwrap();

        assert_eq!(quote.material(), &mid("m1"));
        assert_eq!(quote.binding, Binding::Variant);
        assert_eq!(quote.base.cost, dec("4.00"));
        assert_eq!(quote.base_total, dec("8.00"));
        assert_eq!(quote.add_on_total, dec("4.50"));
        assert_eq!(quote.total, dec("12.50"));
        assert!(quote.is_complete());
    }

    #[test]
    fn order_line_uses_sub_variant() {
        let catalog = bakery();
        let units = UnitRegistry::standard();
        let engine = CostEngine::new(&catalog, &units);

        let quote = engine
            .resolve_order_line_price(&pid("d"), &size("Large"), 1, &[])
            .unwrap();

        assert_eq!(quote.material(), &mid("m2"));
        assert_eq!(quote.binding, Binding::SubVariant);
        assert_eq!(quote.total, dec("3.00"));
    }

    #[test]
    fn partial_costing_is_returned_with_warnings() {
        let catalog = bakery();
        let units = UnitRegistry::standard();
        let engine = CostEngine::new(&catalog, &units);

        let quote = engine
            .resolve_order_line_price(&pid("choc"), &size("Small"), 1, &[])
            .unwrap();

        assert_eq!(quote.total, Decimal::ZERO);
        assert_eq!(quote.base.status(), CostStatus::PartiallyResolved);
        assert_eq!(quote.warnings().len(), 1);
    }

    #[test]
    fn strict_mode_refuses_partial_costing() {
        let catalog = bakery();
        let units = UnitRegistry::standard();
        let engine = CostEngine::new(&catalog, &units).with_limits(ResolutionLimits {
            strict: true,
            ..Default::default()
        });

        let err = engine.resolve_unit_cost(&mid("m3")).unwrap_err();
        match err {
            ResolveError::Incomplete { material, warnings } => {
                assert_eq!(material, mid("m3"));
                assert_eq!(warnings.len(), 1);
            }
            other => panic!("expected incomplete, got {other:?}"),
        }

        assert!(engine.resolve_unit_cost(&mid("m1")).is_ok());
    }

    #[test]
    fn unknown_selection_fails() {
        let catalog = bakery();
        let units = UnitRegistry::standard();
        let engine = CostEngine::new(&catalog, &units);

        let err = engine
            .resolve_order_line_price(&pid("d"), &size("Tiny"), 1, &[])
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(NotFound::Variant { .. })));
    }

    #[test]
    fn unknown_add_on_fails_the_quote() {
        let catalog = bakery();
        let units = UnitRegistry::standard();
        let engine = CostEngine::new(&catalog, &units);

        let err = engine
            .resolve_order_line_price(
                &pid("d"),
                &size("Medium"),
                1,
                &[AddOnSelection::new(AddOnId::new("99").unwrap(), 1)],
            )
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(NotFound::AddOn(_))));
    }

    #[test]
    fn order_line_overflow_is_an_error() {
        let catalog = MemoryCatalog::from_records([
            CatalogRecord::Item(InventoryItem {
                id: iid("gold"),
                name: None,
                unit_price: Decimal::MAX,
                unit: "pc".to_string(),
                active: true,
            }),
            CatalogRecord::Material(
                MaterialRecord::new(mid("crown"), dec("1"), "pc")
                    .with(ComponentEdge::item(1, iid("gold"), dec("1"), "pc")),
            ),
            CatalogRecord::Variant(Variant {
                product: pid("crown"),
                size: size("Large"),
                material: mid("crown"),
            }),
        ]);
        let units = UnitRegistry::standard();
        let engine = CostEngine::new(&catalog, &units);

        let one = engine
            .resolve_order_line_price(&pid("crown"), &size("Large"), 1, &[])
            .unwrap();
        assert_eq!(one.total, Decimal::MAX);

        let err = engine
            .resolve_order_line_price(&pid("crown"), &size("Large"), 2, &[])
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Overflow {
                at: OverflowSite::OrderLine { .. }
            }
        ));
    }
}
