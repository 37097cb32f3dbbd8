//! Add-on overlay
//!
//! Add-ons are explicit customer selections priced outside the recipe
//! graph, so an unknown or inactive add-on fails the whole quote instead
//! of being priced at zero.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::catalog::CatalogReader;
use super::error::{NotFound, OverflowSite, ResolveError};
use super::id::{AddOnId, IdError};

#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error(transparent)]
    Id(#[from] IdError),

    #[error("Invalid add-on quantity '{0}': expected a whole number")]
    InvalidQuantity(String),
}

/// An add-on chosen for an order line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOnSelection {
    pub add_on: AddOnId,
    pub quantity: u32,
}

impl AddOnSelection {
    pub fn new(add_on: AddOnId, quantity: u32) -> Self {
        Self { add_on, quantity }
    }
}

impl fmt::Display for AddOnSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.add_on, self.quantity)
    }
}

/// Parses `ID` or `ID=QUANTITY`
impl FromStr for AddOnSelection {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, quantity) = match s.split_once('=') {
            Some((id, qty)) => {
                let qty = qty.trim();
                let quantity = qty
                    .parse::<u32>()
                    .map_err(|_| SelectionError::InvalidQuantity(qty.to_string()))?;
                (id, quantity)
            }
            None => (s, 1),
        };

        Ok(Self {
            add_on: AddOnId::new(id)?,
            quantity,
        })
    }
}

/// Priced add-on selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddOnCharge {
    pub add_on: AddOnId,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub total: Decimal,
}

/// All add-on charges of an order line
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AddOnOverlay {
    pub charges: Vec<AddOnCharge>,
    pub total: Decimal,
}

/// Prices every selection, failing on the first unknown or inactive add-on
pub fn price_add_ons(
    catalog: &dyn CatalogReader,
    selections: &[AddOnSelection],
) -> Result<AddOnOverlay, ResolveError> {
    let mut overlay = AddOnOverlay::default();

    for selection in selections {
        let add_on = match catalog.add_on(&selection.add_on)? {
            Some(a) if a.active => a,
            _ => return Err(NotFound::AddOn(selection.add_on.clone()).into()),
        };

        let overflow = || ResolveError::Overflow {
            at: OverflowSite::AddOn(add_on.id.clone()),
        };
        let total = add_on
            .unit_price
            .checked_mul(Decimal::from(selection.quantity))
            .ok_or_else(overflow)?;
        overlay.total = overlay.total.checked_add(total).ok_or_else(overflow)?;
        overlay.charges.push(AddOnCharge {
            add_on: add_on.id,
            unit_price: add_on.unit_price,
            quantity: selection.quantity,
            total,
        });
    }

    Ok(overlay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{AddOn, CatalogRecord, MemoryCatalog};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn add_on(id: &str, price: &str, active: bool) -> CatalogRecord {
        CatalogRecord::AddOn(AddOn {
            id: AddOnId::new(id).unwrap(),
            name: None,
            unit_price: dec(price),
            active,
        })
    }

    #[test]
    fn parses_selection() {
        let sel: AddOnSelection = "7=3".parse().unwrap();
        assert_eq!(sel, AddOnSelection::new(AddOnId::new("7").unwrap(), 3));

        let sel: AddOnSelection = "candles".parse().unwrap();
        assert_eq!(sel.quantity, 1);
        assert_eq!(sel.to_string(), "candles=1");
    }

    #[test]
    fn rejects_bad_quantity() {
        let err = "7=three".parse::<AddOnSelection>().unwrap_err();
        assert_eq!(err, SelectionError::InvalidQuantity("three".to_string()));
        assert!("7=-1".parse::<AddOnSelection>().is_err());
    }

    #[test]
    fn quantity_scales_price() {
        let catalog = MemoryCatalog::new().with(add_on("7", "1.50", true));
        let overlay =
            price_add_ons(&catalog, &[AddOnSelection::new(AddOnId::new("7").unwrap(), 3)]).unwrap();

        assert_eq!(overlay.total, dec("4.50"));
        assert_eq!(overlay.charges[0].total, dec("4.50"));
    }

    #[test]
    fn sums_multiple_add_ons() {
        let catalog = MemoryCatalog::new()
            .with(add_on("candles", "0.20", true))
            .with(add_on("topper", "3.00", true));
        let selections: Vec<AddOnSelection> = vec![
            "candles=10".parse().unwrap(),
            "topper".parse().unwrap(),
        ];

        let overlay = price_add_ons(&catalog, &selections).unwrap();
        assert_eq!(overlay.total, dec("5.00"));
        assert_eq!(overlay.charges.len(), 2);
    }

    #[test]
    fn no_selections_cost_nothing() {
        let overlay = price_add_ons(&MemoryCatalog::new(), &[]).unwrap();
        assert_eq!(overlay.total, Decimal::ZERO);
        assert!(overlay.charges.is_empty());
    }

    #[test]
    fn missing_add_on_fails() {
        let err = price_add_ons(&MemoryCatalog::new(), &["7".parse::<AddOnSelection>().unwrap()]).unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(NotFound::AddOn(_))));
    }

    #[test]
    fn inactive_add_on_fails() {
        let catalog = MemoryCatalog::new().with(add_on("7", "1.50", false));
        let err = price_add_ons(&catalog, &["7=1".parse::<AddOnSelection>().unwrap()]).unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(NotFound::AddOn(_))));
    }

    #[test]
    fn overflowing_add_on_total_fails() {
        let catalog = MemoryCatalog::new().with(CatalogRecord::AddOn(AddOn {
            id: AddOnId::new("crown").unwrap(),
            name: None,
            unit_price: Decimal::MAX,
            active: true,
        }));

        let err = price_add_ons(&catalog, &["crown=2".parse::<AddOnSelection>().unwrap()]).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Overflow {
                at: OverflowSite::AddOn(_)
            }
        ));
    }
}
