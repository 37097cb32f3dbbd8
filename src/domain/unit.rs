//! Unit vocabulary and conversion
//!
//! Every unit belongs to exactly one [`Dimension`] and is described by its
//! factor relative to the dimension's base unit (gram, millilitre, piece).
//! Conversion is only defined within a dimension; there is no density
//! table, so `1 cup` of flour never becomes grams.
//!
//! The registry is a value, not a global. [`UnitRegistry::standard`] covers
//! the usual kitchen units and projects can extend it from config.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum UnitError {
    #[error("Unknown unit: '{0}'")]
    UnknownUnit(String),

    #[error("Cannot convert {from} ({from_dimension}) to {to} ({to_dimension})")]
    DimensionMismatch {
        from: String,
        to: String,
        from_dimension: Dimension,
        to_dimension: Dimension,
    },

    #[error("Unit '{token}' must have a positive factor, got {factor}")]
    InvalidFactor { token: String, factor: Decimal },

    #[error("Unit '{token}' is already defined as {existing}, cannot redefine it as {requested}")]
    ConflictingDefinition {
        token: String,
        existing: Dimension,
        requested: Dimension,
    },

    #[error("Converting {amount} {from} to {to} overflows")]
    Overflow {
        amount: Decimal,
        from: String,
        to: String,
    },
}

/// The physical quantity a unit measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Mass,
    Volume,
    Count,
}

impl Dimension {
    /// Returns the token of the base unit all factors are relative to
    pub fn base_unit(&self) -> &'static str {
        match self {
            Dimension::Mass => "g",
            Dimension::Volume => "ml",
            Dimension::Count => "pc",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Mass => "mass",
            Dimension::Volume => "volume",
            Dimension::Count => "count",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit definition, as read from config or built into the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDefinition {
    /// Canonical token (e.g. `kg`)
    pub token: String,

    /// Dimension the unit measures
    pub dimension: Dimension,

    /// How many base units one of this unit is
    pub factor: Decimal,

    /// Alternative spellings (e.g. `kilogram`, `kilograms`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl UnitDefinition {
    pub fn new(token: &str, dimension: Dimension, factor: Decimal, aliases: &[&str]) -> Self {
        Self {
            token: token.to_string(),
            dimension,
            factor,
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }
}

fn normalize(token: &str) -> String {
    token.trim().to_lowercase()
}

/// Registry of recognized units
#[derive(Debug, Clone, Default)]
pub struct UnitRegistry {
    /// Definitions in registration order
    units: Vec<UnitDefinition>,

    /// Normalized token or alias -> index into `units`
    lookup: HashMap<String, usize>,
}

impl UnitRegistry {
    /// Creates a registry with no units
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates the registry of standard kitchen units
    pub fn standard() -> Self {
        use Dimension::*;

        let builtin = [
            UnitDefinition::new("mg", Mass, Decimal::new(1, 3), &["milligram", "milligrams"]),
            UnitDefinition::new("g", Mass, Decimal::ONE, &["gram", "grams", "gr"]),
            UnitDefinition::new("kg", Mass, Decimal::new(1000, 0), &["kilogram", "kilograms", "kilo", "kilos"]),
            UnitDefinition::new("oz", Mass, Decimal::new(28_349_523_125, 9), &["ounce", "ounces"]),
            UnitDefinition::new("lb", Mass, Decimal::new(45_359_237, 5), &["lbs", "pound", "pounds"]),
            UnitDefinition::new("ml", Volume, Decimal::ONE, &["milliliter", "milliliters", "millilitre", "millilitres"]),
            UnitDefinition::new("cl", Volume, Decimal::new(10, 0), &["centiliter", "centilitre"]),
            UnitDefinition::new("dl", Volume, Decimal::new(100, 0), &["deciliter", "decilitre"]),
            UnitDefinition::new("l", Volume, Decimal::new(1000, 0), &["liter", "liters", "litre", "litres"]),
            UnitDefinition::new("tsp", Volume, Decimal::new(492_892_159_375, 11), &["teaspoon", "teaspoons"]),
            UnitDefinition::new("tbsp", Volume, Decimal::new(1_478_676_478_125, 11), &["tablespoon", "tablespoons"]),
            UnitDefinition::new("cup", Volume, Decimal::new(2_365_882_365, 7), &["cups"]),
            UnitDefinition::new("fl_oz", Volume, Decimal::new(295_735_295_625, 10), &["fl oz", "fluid_ounce", "fluid_ounces"]),
            UnitDefinition::new("pc", Count, Decimal::ONE, &["pcs", "piece", "pieces", "each", "ea"]),
            UnitDefinition::new("dozen", Count, Decimal::new(12, 0), &["dz"]),
        ];

        let mut registry = Self::empty();
        for def in builtin {
            registry.insert(def);
        }
        registry
    }

    /// Adds or redefines a unit
    ///
    /// A token may be redefined with a new factor but never moved to a
    /// different dimension.
    pub fn define(&mut self, def: UnitDefinition) -> Result<(), UnitError> {
        let token = normalize(&def.token);
        if def.factor <= Decimal::ZERO {
            return Err(UnitError::InvalidFactor {
                token,
                factor: def.factor,
            });
        }

        for name in std::iter::once(&def.token).chain(def.aliases.iter()) {
            if let Some(existing) = self.get(name) {
                if existing.dimension != def.dimension {
                    return Err(UnitError::ConflictingDefinition {
                        token: normalize(name),
                        existing: existing.dimension,
                        requested: def.dimension,
                    });
                }
            }
        }

        self.insert(def);
        Ok(())
    }

    /// Adds every definition, stopping at the first invalid one
    pub fn extend(&mut self, defs: impl IntoIterator<Item = UnitDefinition>) -> Result<(), UnitError> {
        for def in defs {
            self.define(def)?;
        }
        Ok(())
    }

    fn insert(&mut self, mut def: UnitDefinition) {
        def.token = normalize(&def.token);
        def.aliases = def.aliases.iter().map(|a| normalize(a)).collect();

        let idx = match self.units.iter().position(|u| u.token == def.token) {
            Some(idx) => {
                self.units[idx] = def;
                idx
            }
            None => {
                self.units.push(def);
                self.units.len() - 1
            }
        };

        let def = &self.units[idx];
        for name in std::iter::once(&def.token).chain(def.aliases.iter()) {
            self.lookup.insert(name.clone(), idx);
        }
    }

    /// Looks up a unit by token or alias
    pub fn get(&self, token: &str) -> Option<&UnitDefinition> {
        self.lookup
            .get(&normalize(token))
            .and_then(|idx| self.units.get(*idx))
    }

    /// Returns true if the token is a recognized unit
    pub fn is_valid_unit(&self, token: &str) -> bool {
        self.get(token).is_some()
    }

    /// Classifies a unit into its dimension
    pub fn dimension_of(&self, token: &str) -> Result<Dimension, UnitError> {
        self.get(token)
            .map(|u| u.dimension)
            .ok_or_else(|| UnitError::UnknownUnit(token.trim().to_string()))
    }

    /// Returns true if both units are recognized and measure the same dimension
    pub fn same_dimension(&self, a: &str, b: &str) -> bool {
        match (self.get(a), self.get(b)) {
            (Some(a), Some(b)) => a.dimension == b.dimension,
            _ => false,
        }
    }

    /// Converts an amount between two units of the same dimension
    pub fn convert(&self, amount: Decimal, from: &str, to: &str) -> Result<Decimal, UnitError> {
        let from_def = self
            .get(from)
            .ok_or_else(|| UnitError::UnknownUnit(from.trim().to_string()))?;
        let to_def = self
            .get(to)
            .ok_or_else(|| UnitError::UnknownUnit(to.trim().to_string()))?;

        if from_def.dimension != to_def.dimension {
            return Err(UnitError::DimensionMismatch {
                from: from_def.token.clone(),
                to: to_def.token.clone(),
                from_dimension: from_def.dimension,
                to_dimension: to_def.dimension,
            });
        }

        if from_def.token == to_def.token || from_def.factor == to_def.factor {
            return Ok(amount);
        }

        amount
            .checked_mul(from_def.factor)
            .and_then(|base| base.checked_div(to_def.factor))
            .ok_or_else(|| UnitError::Overflow {
                amount,
                from: from_def.token.clone(),
                to: to_def.token.clone(),
            })
    }

    /// Returns all canonical definitions in registration order
    pub fn units(&self) -> impl Iterator<Item = &UnitDefinition> {
        self.units.iter()
    }

    /// Returns the number of canonical units
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns true if no units are registered
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
