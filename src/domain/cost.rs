//! Bill-of-materials cost aggregation
//!
//! Prices a composite material by walking its recipe graph down to
//! inventory items. Every line converts its declared amount into the unit
//! of whatever it points at:
//!
//! - item line: `unit_price * convert(amount, line_unit, item_unit)`
//! - material line: `convert(amount, line_unit, batch_unit) / batch_amount`
//!   batches of the sub-recipe, times the sub-recipe's batch cost
//!
//! Lines that point at missing or inactive rows, or whose units cannot be
//! converted, contribute zero and leave a [`CostWarning`] behind. Cycles
//! and runaway nesting abort the resolution.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::catalog::{CatalogReader, ComponentEdge, ComponentRef, CompositeMaterial};
use super::error::{Bound, OverflowSite, ResolveError};
use super::id::MaterialId;
use super::unit::{UnitError, UnitRegistry};

/// Why a referenced row could not be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingReason {
    Absent,
    Inactive,
}

impl fmt::Display for MissingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingReason::Absent => f.write_str("not in the catalog"),
            MissingReason::Inactive => f.write_str("inactive"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WarningKind {
    /// The line points at a row that is absent or inactive
    MissingReference { reason: MissingReason },

    /// The line's unit cannot be converted into the target's unit
    IncompatibleUnit { line_unit: String, target_unit: String },

    /// The referenced recipe declares a batch amount that is not positive
    InvalidBatch { batch_amount: Decimal },
}

/// A recipe line that was priced at zero
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostWarning {
    /// Recipe owning the line
    pub material: MaterialId,

    /// Position of the line within the recipe
    pub position: u32,

    pub target: ComponentRef,

    #[serde(flatten)]
    pub kind: WarningKind,
}

impl fmt::Display for CostWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} line {} ({}): ", self.material, self.position, self.target)?;
        match &self.kind {
            WarningKind::MissingReference { reason } => write!(f, "target is {}", reason),
            WarningKind::IncompatibleUnit {
                line_unit,
                target_unit,
            } => write!(f, "cannot convert '{}' to '{}'", line_unit, target_unit),
            WarningKind::InvalidBatch { batch_amount } => {
                write!(f, "batch amount {} is not positive", batch_amount)
            }
        }
    }
}

/// Contribution of one direct line of the priced recipe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostLine {
    pub position: u32,
    pub target: ComponentRef,
    pub amount: Decimal,
    pub unit: String,
    pub cost: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CostStatus {
    /// Every line was priced
    Resolved,
    /// At least one line was priced at zero; see the warnings
    PartiallyResolved,
}

/// Cost of one declared batch of a composite material
#[must_use = "a costing may be partial; check its status or warnings"]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Costing {
    pub material: MaterialId,
    pub batch_amount: Decimal,
    pub batch_unit: String,
    pub cost: Decimal,
    pub lines: Vec<CostLine>,
    pub warnings: Vec<CostWarning>,
}

impl Costing {
    pub fn status(&self) -> CostStatus {
        if self.warnings.is_empty() {
            CostStatus::Resolved
        } else {
            CostStatus::PartiallyResolved
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status() == CostStatus::Resolved
    }
}

/// Limits applied to every resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionLimits {
    /// Deepest chain of nested recipes allowed
    pub max_depth: usize,

    /// Wall-clock budget per resolution in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_duration_ms: Option<u64>,

    /// Price shared sub-recipes once per resolution
    pub memoize: bool,

    /// Refuse partially priced results instead of returning them
    pub strict: bool,
}

impl Default for ResolutionLimits {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_duration_ms: None,
            memoize: true,
            strict: false,
        }
    }
}

impl ResolutionLimits {
    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration_ms.map(Duration::from_millis)
    }
}

/// Batch cost of a sub-recipe, as remembered within one resolution
#[derive(Debug, Clone)]
struct BatchCost {
    cost: Decimal,
    warnings: Vec<CostWarning>,
}

/// Recursive resolver over one catalog view
///
/// A resolver is meant for a single resolution: its memo table is keyed by
/// material and reflects the view it was created with.
pub struct CostResolver<'a> {
    catalog: &'a dyn CatalogReader,
    units: &'a UnitRegistry,
    limits: &'a ResolutionLimits,

    /// Materials currently being expanded, outermost first
    in_progress: Vec<MaterialId>,

    memo: HashMap<MaterialId, BatchCost>,
    deadline: Option<(Instant, Duration)>,
}

impl<'a> CostResolver<'a> {
    pub fn new(
        catalog: &'a dyn CatalogReader,
        units: &'a UnitRegistry,
        limits: &'a ResolutionLimits,
    ) -> Self {
        // A budget past the end of the clock is no budget at all
        let deadline = limits.max_duration().and_then(|budget| {
            Instant::now()
                .checked_add(budget)
                .map(|deadline| (deadline, budget))
        });

        Self {
            catalog,
            units,
            limits,
            in_progress: Vec::new(),
            memo: HashMap::new(),
            deadline,
        }
    }

    /// Prices one declared batch of a material
    ///
    /// The root material itself must exist and be active; there is no
    /// enclosing line to fold a zero into.
    pub fn resolve_material(&mut self, id: &MaterialId) -> Result<Costing, ResolveError> {
        let material = match self.catalog.composite_material(id)? {
            Some(m) if m.active => m,
            Some(_) => {
                return Err(ResolveError::MissingReference {
                    id: id.clone(),
                    reason: MissingReason::Inactive,
                })
            }
            None => {
                return Err(ResolveError::MissingReference {
                    id: id.clone(),
                    reason: MissingReason::Absent,
                })
            }
        };

        let mut lines = Vec::new();
        let batch = self.expand(&material, Some(&mut lines))?;

        Ok(Costing {
            material: material.id,
            batch_amount: material.batch_amount,
            batch_unit: material.batch_unit,
            cost: batch.cost,
            lines,
            warnings: batch.warnings,
        })
    }

    /// Sums the active lines of a material
    fn expand(
        &mut self,
        material: &CompositeMaterial,
        mut lines: Option<&mut Vec<CostLine>>,
    ) -> Result<BatchCost, ResolveError> {
        if lines.is_none() {
            if let Some(cached) = self.memo.get(&material.id) {
                tracing::trace!(material = %material.id, "reusing memoized batch cost");
                return Ok(cached.clone());
            }
        }

        if let Some(start) = self.in_progress.iter().position(|id| id == &material.id) {
            let mut path = self.in_progress[start..].to_vec();
            path.push(material.id.clone());
            return Err(ResolveError::CyclicReference { path });
        }

        if self.in_progress.len() >= self.limits.max_depth {
            return Err(ResolveError::ResolutionTooDeep {
                bound: Bound::Depth(self.limits.max_depth),
                at: material.id.clone(),
            });
        }

        if let Some((deadline, budget)) = self.deadline {
            if Instant::now() >= deadline {
                return Err(ResolveError::ResolutionTooDeep {
                    bound: Bound::Duration(budget),
                    at: material.id.clone(),
                });
            }
        }

        self.in_progress.push(material.id.clone());

        let edges = self.catalog.component_edges(&material.id)?;
        let mut total = Decimal::ZERO;
        let mut warnings = Vec::new();

        for edge in edges.iter().filter(|e| e.active) {
            let cost = self.resolve_edge(&material.id, edge, &mut warnings)?;
            total = total
                .checked_add(cost)
                .ok_or_else(|| overflow(&material.id))?;

            if let Some(lines) = lines.as_deref_mut() {
                lines.push(CostLine {
                    position: edge.position,
                    target: edge.target.clone(),
                    amount: edge.amount,
                    unit: edge.unit.clone(),
                    cost,
                });
            }
        }

        self.in_progress.pop();

        tracing::debug!(
            material = %material.id,
            cost = %total,
            warnings = warnings.len(),
            "resolved batch cost"
        );

        let batch = BatchCost {
            cost: total,
            warnings,
        };

        if self.limits.memoize {
            self.memo.insert(material.id.clone(), batch.clone());
        }

        Ok(batch)
    }

    /// Prices one line of `parent`
    fn resolve_edge(
        &mut self,
        parent: &MaterialId,
        edge: &ComponentEdge,
        warnings: &mut Vec<CostWarning>,
    ) -> Result<Decimal, ResolveError> {
        let warn = |kind: WarningKind| {
            let warning = CostWarning {
                material: parent.clone(),
                position: edge.position,
                target: edge.target.clone(),
                kind,
            };
            tracing::warn!("{}", warning);
            warning
        };

        match &edge.target {
            ComponentRef::Item(id) => {
                let item = match self.catalog.inventory_item(id)? {
                    Some(item) if item.active => item,
                    Some(_) => {
                        warnings.push(warn(WarningKind::MissingReference {
                            reason: MissingReason::Inactive,
                        }));
                        return Ok(Decimal::ZERO);
                    }
                    None => {
                        warnings.push(warn(WarningKind::MissingReference {
                            reason: MissingReason::Absent,
                        }));
                        return Ok(Decimal::ZERO);
                    }
                };

                match self.convert(parent, edge.amount, &edge.unit, &item.unit)? {
                    Some(quantity) => item
                        .unit_price
                        .checked_mul(quantity)
                        .ok_or_else(|| overflow(parent)),
                    None => {
                        warnings.push(warn(WarningKind::IncompatibleUnit {
                            line_unit: edge.unit.clone(),
                            target_unit: item.unit,
                        }));
                        Ok(Decimal::ZERO)
                    }
                }
            }

            ComponentRef::Material(id) => {
                let material = match self.catalog.composite_material(id)? {
                    Some(m) if m.active => m,
                    Some(_) => {
                        warnings.push(warn(WarningKind::MissingReference {
                            reason: MissingReason::Inactive,
                        }));
                        return Ok(Decimal::ZERO);
                    }
                    None => {
                        warnings.push(warn(WarningKind::MissingReference {
                            reason: MissingReason::Absent,
                        }));
                        return Ok(Decimal::ZERO);
                    }
                };

                let Some(quantity) = self.convert(parent, edge.amount, &edge.unit, &material.batch_unit)? else {
                    warnings.push(warn(WarningKind::IncompatibleUnit {
                        line_unit: edge.unit.clone(),
                        target_unit: material.batch_unit,
                    }));
                    return Ok(Decimal::ZERO);
                };

                if material.batch_amount <= Decimal::ZERO {
                    warnings.push(warn(WarningKind::InvalidBatch {
                        batch_amount: material.batch_amount,
                    }));
                    return Ok(Decimal::ZERO);
                }

                let multiplier = quantity
                    .checked_div(material.batch_amount)
                    .ok_or_else(|| overflow(parent))?;
                let batch = self.expand(&material, None)?;
                merge_warnings(warnings, batch.warnings);

                multiplier
                    .checked_mul(batch.cost)
                    .ok_or_else(|| overflow(parent))
            }
        }
    }

    /// Converts when both units are known and share a dimension
    ///
    /// `Ok(None)` means the units are incompatible; an amount too large to
    /// represent aborts the resolution of `parent`.
    fn convert(
        &self,
        parent: &MaterialId,
        amount: Decimal,
        from: &str,
        to: &str,
    ) -> Result<Option<Decimal>, ResolveError> {
        if !self.units.same_dimension(from, to) {
            return Ok(None);
        }
        match self.units.convert(amount, from, to) {
            Ok(quantity) => Ok(Some(quantity)),
            Err(UnitError::Overflow { .. }) => Err(overflow(parent)),
            Err(_) => Ok(None),
        }
    }
}

fn overflow(at: &MaterialId) -> ResolveError {
    ResolveError::Overflow {
        at: OverflowSite::Material(at.clone()),
    }
}

/// Appends sub-recipe warnings, once per (recipe, line)
///
/// A shared sub-recipe reached from several lines reports its bad lines
/// only once.
fn merge_warnings(into: &mut Vec<CostWarning>, from: Vec<CostWarning>) {
    for warning in from {
        let seen = into
            .iter()
            .any(|w| w.material == warning.material && w.position == warning.position);
        if !seen {
            into.push(warning);
        }
    }
}
