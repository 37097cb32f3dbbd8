//! Resolution errors
//!
//! Only failures that abort a whole resolution live here. Data problems on
//! individual recipe lines are folded into a zero contribution and reported
//! as [`CostWarning`]s instead.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use super::catalog::CatalogError;
use super::cost::{CostWarning, MissingReason};
use super::id::{AddOnId, MaterialId, ProductId, Size};

/// A customer-facing selection that does not exist
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NotFound {
    #[error("No variant of product '{product}' in size '{size}'")]
    Variant { product: ProductId, size: Size },

    #[error("Add-on '{0}' does not exist or is not active")]
    AddOn(AddOnId),
}

/// The limit a resolution ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    Depth(usize),
    Duration(Duration),
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Depth(depth) => write!(f, "maximum nesting depth of {}", depth),
            Bound::Duration(limit) => write!(f, "time budget of {} ms", limit.as_millis()),
        }
    }
}

/// Where a running total outgrew what a decimal can hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverflowSite {
    /// Pricing the lines of a recipe
    Material(MaterialId),
    /// Multiplying a recipe cost by the ordered quantity
    OrderLine { product: ProductId, size: Size },
    /// Pricing add-on selections
    AddOn(AddOnId),
}

impl fmt::Display for OverflowSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowSite::Material(id) => write!(f, "material '{}'", id),
            OverflowSite::OrderLine { product, size } => {
                write!(f, "order line '{}' ({})", product, size)
            }
            OverflowSite::AddOn(id) => write!(f, "add-on '{}'", id),
        }
    }
}

fn format_path(path: &[MaterialId]) -> String {
    path.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Cyclic reference between materials: {}", format_path(path))]
    CyclicReference { path: Vec<MaterialId> },

    #[error("Resolution of '{at}' exceeded the {bound}")]
    ResolutionTooDeep { bound: Bound, at: MaterialId },

    #[error(transparent)]
    NotFound(#[from] NotFound),

    #[error("Material '{id}' cannot be priced: {reason}")]
    MissingReference { id: MaterialId, reason: MissingReason },

    #[error("Costing of '{material}' is incomplete ({} warning(s))", warnings.len())]
    Incomplete {
        material: MaterialId,
        warnings: Vec<CostWarning>,
    },

    #[error("Amount overflowed while pricing {at}")]
    Overflow { at: OverflowSite },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl ResolveError {
    /// Short machine-readable name of the error kind
    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::CyclicReference { .. } => "cyclic_reference",
            ResolveError::ResolutionTooDeep { .. } => "resolution_too_deep",
            ResolveError::NotFound(_) => "not_found",
            ResolveError::MissingReference { .. } => "missing_reference",
            ResolveError::Incomplete { .. } => "incomplete",
            ResolveError::Overflow { .. } => "overflow",
            ResolveError::Catalog(_) => "catalog",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_shows_path() {
        let err = ResolveError::CyclicReference {
            path: vec![
                MaterialId::new("a").unwrap(),
                MaterialId::new("b").unwrap(),
                MaterialId::new("a").unwrap(),
            ],
        };
        assert_eq!(err.to_string(), "Cyclic reference between materials: a -> b -> a");
        assert_eq!(err.code(), "cyclic_reference");
    }

    #[test]
    fn bound_messages() {
        assert_eq!(Bound::Depth(64).to_string(), "maximum nesting depth of 64");
        assert_eq!(
            Bound::Duration(Duration::from_millis(250)).to_string(),
            "time budget of 250 ms"
        );
    }

    #[test]
    fn overflow_names_the_site() {
        let err = ResolveError::Overflow {
            at: OverflowSite::Material(MaterialId::new("cake").unwrap()),
        };
        assert_eq!(err.to_string(), "Amount overflowed while pricing material 'cake'");
        assert_eq!(err.code(), "overflow");
    }

    #[test]
    fn not_found_is_transparent() {
        let err: ResolveError = NotFound::AddOn(AddOnId::new("7").unwrap()).into();
        assert_eq!(err.to_string(), "Add-on '7' does not exist or is not active");
    }
}
