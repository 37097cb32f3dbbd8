//! bom-cost - Bill-of-materials cost resolution
//!
//! Prices made-to-order products from a recipe graph: raw inventory items
//! with unit prices, composite materials built from other materials, size
//! variants with per-size overrides, and flat-priced add-ons. Costs are
//! exact decimals and every unpriceable line is reported, never hidden.

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{CostEngine, Costing, MemoryCatalog, OrderLineQuote, ResolveError, UnitRegistry};
