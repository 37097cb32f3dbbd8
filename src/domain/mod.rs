//! Domain models for bill-of-materials costing
//!
//! Contains the core business logic without any I/O concerns.

mod id;
mod unit;
mod catalog;
mod cost;
mod error;
mod variant;
mod addon;
mod engine;
mod graph;
mod lint;

pub use id::{AddOnId, IdError, ItemId, MaterialId, ProductId, Size};
pub use unit::{Dimension, UnitDefinition, UnitError, UnitRegistry};
pub use catalog::{
    AddOn, Catalog, CatalogDocument, CatalogError, CatalogReader, CatalogRecord, ComponentEdge,
    ComponentKind, ComponentRef, CompositeMaterial, InventoryItem, MaterialRecord, MemoryCatalog,
    RecordKey, SubVariant, Variant,
};
pub use cost::{
    CostLine, CostResolver, CostStatus, CostWarning, Costing, MissingReason, ResolutionLimits,
    WarningKind,
};
pub use error::{Bound, NotFound, OverflowSite, ResolveError};
pub use variant::{resolve_pricing_node, Binding};
pub use addon::{price_add_ons, AddOnCharge, AddOnOverlay, AddOnSelection, SelectionError};
pub use engine::{CostEngine, OrderLineQuote};
pub use graph::{BomGraph, GraphError};
pub use lint::{lint_catalog, LintIssue, Severity};
