//! Catalog data model and read interface
//!
//! The catalog is owned by the outside world: items, recipes, variants and
//! add-ons are created and edited elsewhere. The cost engine only ever
//! reads it, through a [`CatalogReader`] obtained from
//! [`Catalog::snapshot`], so that one resolution sees one consistent view.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use super::id::{AddOnId, IdError, ItemId, MaterialId, ProductId, Size};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog is unavailable: {0}")]
    Unavailable(String),

    #[error("Catalog row {key} is corrupt: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Catalog backend error")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CatalogError {
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        CatalogError::Backend(Box::new(err))
    }
}

fn default_active() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

/// A raw, priced inventory item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Price of one `unit` of this item
    pub unit_price: Decimal,

    /// Unit the price is quoted in
    pub unit: String,

    #[serde(default = "default_active", skip_serializing_if = "is_true")]
    pub active: bool,
}

/// A recipe header: how much one batch yields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeMaterial {
    pub id: MaterialId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Quantity one batch of this recipe yields
    pub batch_amount: Decimal,

    /// Unit of `batch_amount`
    pub batch_unit: String,

    /// Size tag, for recipes that are the base of a product variant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,

    #[serde(default = "default_active", skip_serializing_if = "is_true")]
    pub active: bool,
}

/// What a component edge points at
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentRef {
    Item(ItemId),
    Material(MaterialId),
}

impl ComponentRef {
    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentRef::Item(_) => ComponentKind::Item,
            ComponentRef::Material(_) => ComponentKind::Material,
        }
    }

    /// Returns the target ID without its kind
    pub fn id(&self) -> &str {
        match self {
            ComponentRef::Item(id) => id.as_str(),
            ComponentRef::Material(id) => id.as_str(),
        }
    }
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind().as_str(), self.id())
    }
}

impl Serialize for ComponentRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Item,
    Material,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Item => "item",
            ComponentKind::Material => "material",
        }
    }
}

/// One ingredient line inside a composite material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawComponentEdge", into = "RawComponentEdge")]
pub struct ComponentEdge {
    /// Order of the line within its recipe
    pub position: u32,
    pub target: ComponentRef,
    pub amount: Decimal,
    pub unit: String,
    pub active: bool,
}

impl ComponentEdge {
    pub fn item(position: u32, id: ItemId, amount: Decimal, unit: impl Into<String>) -> Self {
        Self {
            position,
            target: ComponentRef::Item(id),
            amount,
            unit: unit.into(),
            active: true,
        }
    }

    pub fn material(position: u32, id: MaterialId, amount: Decimal, unit: impl Into<String>) -> Self {
        Self {
            position,
            target: ComponentRef::Material(id),
            amount,
            unit: unit.into(),
            active: true,
        }
    }

    /// Returns the edge marked inactive
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Wire shape of a component edge: `{"kind": "item", "target": "flour", ...}`
#[derive(Serialize, Deserialize)]
struct RawComponentEdge {
    #[serde(default)]
    position: u32,
    kind: ComponentKind,
    target: String,
    amount: Decimal,
    unit: String,
    #[serde(default = "default_active", skip_serializing_if = "is_true")]
    active: bool,
}

impl TryFrom<RawComponentEdge> for ComponentEdge {
    type Error = IdError;

    fn try_from(raw: RawComponentEdge) -> Result<Self, Self::Error> {
        let target = match raw.kind {
            ComponentKind::Item => ComponentRef::Item(ItemId::new(&raw.target)?),
            ComponentKind::Material => ComponentRef::Material(MaterialId::new(&raw.target)?),
        };

        Ok(Self {
            position: raw.position,
            target,
            amount: raw.amount,
            unit: raw.unit,
            active: raw.active,
        })
    }
}

impl From<ComponentEdge> for RawComponentEdge {
    fn from(edge: ComponentEdge) -> Self {
        Self {
            position: edge.position,
            kind: edge.target.kind(),
            target: edge.target.id().to_string(),
            amount: edge.amount,
            unit: edge.unit,
            active: edge.active,
        }
    }
}

/// Base binding of a (product, size) selection to a recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub product: ProductId,
    pub size: Size,
    pub material: MaterialId,
}

/// Override binding for a (product, size) selection; wins over [`Variant`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubVariant {
    pub product: ProductId,
    pub size: Size,
    pub material: MaterialId,
}

/// An optional, flat-priced extra
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOn {
    pub id: AddOnId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub unit_price: Decimal,

    #[serde(default = "default_active", skip_serializing_if = "is_true")]
    pub active: bool,
}

/// A composite material together with the lines it owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    pub id: MaterialId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub batch_amount: Decimal,
    pub batch_unit: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,

    #[serde(default = "default_active", skip_serializing_if = "is_true")]
    pub active: bool,

    #[serde(default)]
    pub components: Vec<ComponentEdge>,
}

impl MaterialRecord {
    /// Creates an active recipe with no lines
    pub fn new(id: MaterialId, batch_amount: Decimal, batch_unit: impl Into<String>) -> Self {
        Self {
            id,
            name: None,
            batch_amount,
            batch_unit: batch_unit.into(),
            size: None,
            active: true,
            components: Vec::new(),
        }
    }

    /// Adds a line, returning the record for chaining
    pub fn with(mut self, edge: ComponentEdge) -> Self {
        self.components.push(edge);
        self
    }

    pub fn header(&self) -> CompositeMaterial {
        CompositeMaterial {
            id: self.id.clone(),
            name: self.name.clone(),
            batch_amount: self.batch_amount,
            batch_unit: self.batch_unit.clone(),
            size: self.size.clone(),
            active: self.active,
        }
    }
}

/// Identity of a catalog row; two records with the same key are versions
/// of the same row
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKey {
    Item(ItemId),
    Material(MaterialId),
    Variant(ProductId, Size),
    SubVariant(ProductId, Size),
    AddOn(AddOnId),
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Item(id) => write!(f, "item:{}", id),
            RecordKey::Material(id) => write!(f, "material:{}", id),
            RecordKey::Variant(p, s) => write!(f, "variant:{}/{}", p, s),
            RecordKey::SubVariant(p, s) => write!(f, "sub_variant:{}/{}", p, s),
            RecordKey::AddOn(id) => write!(f, "add_on:{}", id),
        }
    }
}

/// One row of the persisted catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CatalogRecord {
    Item(InventoryItem),
    Material(MaterialRecord),
    Variant(Variant),
    SubVariant(SubVariant),
    AddOn(AddOn),
}

impl CatalogRecord {
    pub fn key(&self) -> RecordKey {
        match self {
            CatalogRecord::Item(item) => RecordKey::Item(item.id.clone()),
            CatalogRecord::Material(m) => RecordKey::Material(m.id.clone()),
            CatalogRecord::Variant(v) => RecordKey::Variant(v.product.clone(), v.size.clone()),
            CatalogRecord::SubVariant(v) => RecordKey::SubVariant(v.product.clone(), v.size.clone()),
            CatalogRecord::AddOn(a) => RecordKey::AddOn(a.id.clone()),
        }
    }
}

/// Bulk import document (YAML or JSON)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogDocument {
    pub items: Vec<InventoryItem>,
    pub materials: Vec<MaterialRecord>,
    pub variants: Vec<Variant>,
    pub sub_variants: Vec<SubVariant>,
    pub add_ons: Vec<AddOn>,
}

impl CatalogDocument {
    /// Number of rows in the document
    pub fn len(&self) -> usize {
        self.items.len()
            + self.materials.len()
            + self.variants.len()
            + self.sub_variants.len()
            + self.add_ons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_records(self) -> Vec<CatalogRecord> {
        let mut records = Vec::with_capacity(self.len());
        records.extend(self.items.into_iter().map(CatalogRecord::Item));
        records.extend(self.materials.into_iter().map(CatalogRecord::Material));
        records.extend(self.variants.into_iter().map(CatalogRecord::Variant));
        records.extend(self.sub_variants.into_iter().map(CatalogRecord::SubVariant));
        records.extend(self.add_ons.into_iter().map(CatalogRecord::AddOn));
        records
    }
}

/// Read access to one consistent view of the catalog
///
/// Lookups return `Ok(None)` for rows that do not exist; inactive rows are
/// returned as-is so callers can tell "inactive" from "absent".
pub trait CatalogReader {
    fn inventory_item(&self, id: &ItemId) -> Result<Option<InventoryItem>, CatalogError>;

    fn composite_material(&self, id: &MaterialId) -> Result<Option<CompositeMaterial>, CatalogError>;

    /// Returns the lines owned by a material, ordered by position
    fn component_edges(&self, material: &MaterialId) -> Result<Vec<ComponentEdge>, CatalogError>;

    fn variant(&self, product: &ProductId, size: &Size) -> Result<Option<Variant>, CatalogError>;

    fn sub_variant(&self, product: &ProductId, size: &Size) -> Result<Option<SubVariant>, CatalogError>;

    fn add_on(&self, id: &AddOnId) -> Result<Option<AddOn>, CatalogError>;
}

impl<T: CatalogReader + ?Sized> CatalogReader for &T {
    fn inventory_item(&self, id: &ItemId) -> Result<Option<InventoryItem>, CatalogError> {
        (**self).inventory_item(id)
    }

    fn composite_material(&self, id: &MaterialId) -> Result<Option<CompositeMaterial>, CatalogError> {
        (**self).composite_material(id)
    }

    fn component_edges(&self, material: &MaterialId) -> Result<Vec<ComponentEdge>, CatalogError> {
        (**self).component_edges(material)
    }

    fn variant(&self, product: &ProductId, size: &Size) -> Result<Option<Variant>, CatalogError> {
        (**self).variant(product, size)
    }

    fn sub_variant(&self, product: &ProductId, size: &Size) -> Result<Option<SubVariant>, CatalogError> {
        (**self).sub_variant(product, size)
    }

    fn add_on(&self, id: &AddOnId) -> Result<Option<AddOn>, CatalogError> {
        (**self).add_on(id)
    }
}

/// A catalog that can hand out consistent read views
pub trait Catalog {
    fn snapshot(&self) -> Result<Box<dyn CatalogReader + '_>, CatalogError>;
}

/// In-memory catalog
///
/// Immutable while borrowed, so every snapshot is trivially consistent.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    items: HashMap<ItemId, InventoryItem>,
    materials: HashMap<MaterialId, MaterialRecord>,
    variants: HashMap<(ProductId, Size), Variant>,
    sub_variants: HashMap<(ProductId, Size), SubVariant>,
    add_ons: HashMap<AddOnId, AddOn>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog; later records replace earlier ones with the same key
    pub fn from_records(records: impl IntoIterator<Item = CatalogRecord>) -> Self {
        let mut catalog = Self::new();
        for record in records {
            catalog.insert(record);
        }
        catalog
    }

    /// Inserts or replaces a row
    pub fn insert(&mut self, record: CatalogRecord) {
        match record {
            CatalogRecord::Item(item) => {
                self.items.insert(item.id.clone(), item);
            }
            CatalogRecord::Material(mut material) => {
                material.components.sort_by_key(|e| e.position);
                self.materials.insert(material.id.clone(), material);
            }
            CatalogRecord::Variant(v) => {
                self.variants.insert((v.product.clone(), v.size.clone()), v);
            }
            CatalogRecord::SubVariant(v) => {
                self.sub_variants.insert((v.product.clone(), v.size.clone()), v);
            }
            CatalogRecord::AddOn(a) => {
                self.add_ons.insert(a.id.clone(), a);
            }
        }
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, record: CatalogRecord) -> Self {
        self.insert(record);
        self
    }

    /// Returns every row, sorted by key
    pub fn records(&self) -> Vec<CatalogRecord> {
        let mut records: Vec<CatalogRecord> = self
            .items
            .values()
            .cloned()
            .map(CatalogRecord::Item)
            .chain(self.materials.values().cloned().map(CatalogRecord::Material))
            .chain(self.variants.values().cloned().map(CatalogRecord::Variant))
            .chain(self.sub_variants.values().cloned().map(CatalogRecord::SubVariant))
            .chain(self.add_ons.values().cloned().map(CatalogRecord::AddOn))
            .collect();
        records.sort_by_key(|r| r.key());
        records
    }

    pub fn item(&self, id: &ItemId) -> Option<&InventoryItem> {
        self.items.get(id)
    }

    pub fn material(&self, id: &MaterialId) -> Option<&MaterialRecord> {
        self.materials.get(id)
    }

    pub fn items(&self) -> impl Iterator<Item = &InventoryItem> {
        self.items.values()
    }

    pub fn materials(&self) -> impl Iterator<Item = &MaterialRecord> {
        self.materials.values()
    }

    pub fn variants(&self) -> impl Iterator<Item = &Variant> {
        self.variants.values()
    }

    pub fn sub_variants(&self) -> impl Iterator<Item = &SubVariant> {
        self.sub_variants.values()
    }

    pub fn add_ons(&self) -> impl Iterator<Item = &AddOn> {
        self.add_ons.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
            + self.materials.len()
            + self.variants.len()
            + self.sub_variants.len()
            + self.add_ons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CatalogReader for MemoryCatalog {
    fn inventory_item(&self, id: &ItemId) -> Result<Option<InventoryItem>, CatalogError> {
        Ok(self.items.get(id).cloned())
    }

    fn composite_material(&self, id: &MaterialId) -> Result<Option<CompositeMaterial>, CatalogError> {
        Ok(self.materials.get(id).map(MaterialRecord::header))
    }

    fn component_edges(&self, material: &MaterialId) -> Result<Vec<ComponentEdge>, CatalogError> {
        Ok(self
            .materials
            .get(material)
            .map(|m| m.components.clone())
            .unwrap_or_default())
    }

    fn variant(&self, product: &ProductId, size: &Size) -> Result<Option<Variant>, CatalogError> {
        Ok(self.variants.get(&(product.clone(), size.clone())).cloned())
    }

    fn sub_variant(&self, product: &ProductId, size: &Size) -> Result<Option<SubVariant>, CatalogError> {
        Ok(self.sub_variants.get(&(product.clone(), size.clone())).cloned())
    }

    fn add_on(&self, id: &AddOnId) -> Result<Option<AddOn>, CatalogError> {
        Ok(self.add_ons.get(id).cloned())
    }
}

impl Catalog for MemoryCatalog {
    fn snapshot(&self) -> Result<Box<dyn CatalogReader + '_>, CatalogError> {
        Ok(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn item(id: &str, price: &str, unit: &str) -> CatalogRecord {
        CatalogRecord::Item(InventoryItem {
            id: ItemId::new(id).unwrap(),
            name: None,
            unit_price: dec(price),
            unit: unit.to_string(),
            active: true,
        })
    }

    #[test]
    fn edge_wire_format() {
        let edge = ComponentEdge::item(1, ItemId::new("flour").unwrap(), dec("0.5"), "kg");
        let json = serde_json::to_value(&edge).unwrap();

        assert_eq!(json["kind"], "item");
        assert_eq!(json["target"], "flour");
        assert_eq!(json["unit"], "kg");
        assert!(json.get("active").is_none());

        let parsed: ComponentEdge = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, edge);
    }

    #[test]
    fn edge_accepts_numeric_amounts() {
        let json = r#"{"kind": "material", "target": "batter", "amount": 2, "unit": "kg", "active": false}"#;
        let edge: ComponentEdge = serde_json::from_str(json).unwrap();

        assert_eq!(edge.target, ComponentRef::Material(MaterialId::new("batter").unwrap()));
        assert_eq!(edge.amount, dec("2"));
        assert!(!edge.active);
        assert_eq!(edge.position, 0);
    }

    #[test]
    fn edge_rejects_invalid_target() {
        let json = r#"{"kind": "item", "target": "plain flour", "amount": "1", "unit": "kg"}"#;
        assert!(serde_json::from_str::<ComponentEdge>(json).is_err());
    }

    #[test]
    fn record_is_tagged_by_type() {
        let record = item("flour", "2.00", "kg");
        let line = serde_json::to_string(&record).unwrap();
        assert!(line.contains(r#""type":"item""#));

        let parsed: CatalogRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed, record);
        assert_eq!(parsed.key().to_string(), "item:flour");
    }

    #[test]
    fn later_records_replace_earlier_ones() {
        let catalog = MemoryCatalog::from_records([
            item("flour", "2.00", "kg"),
            item("flour", "2.50", "kg"),
        ]);

        let flour = catalog
            .inventory_item(&ItemId::new("flour").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(flour.unit_price, dec("2.50"));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn edges_come_back_in_position_order() {
        let material = MaterialRecord::new(MaterialId::new("batter").unwrap(), dec("1"), "kg")
            .with(ComponentEdge::item(2, ItemId::new("sugar").unwrap(), dec("0.2"), "kg"))
            .with(ComponentEdge::item(1, ItemId::new("flour").unwrap(), dec("0.5"), "kg"));
        let catalog = MemoryCatalog::new().with(CatalogRecord::Material(material));

        let edges = catalog
            .component_edges(&MaterialId::new("batter").unwrap())
            .unwrap();
        let targets: Vec<_> = edges.iter().map(|e| e.target.id().to_string()).collect();
        assert_eq!(targets, vec!["flour", "sugar"]);
    }

    #[test]
    fn unknown_material_has_no_edges() {
        let catalog = MemoryCatalog::new();
        let edges = catalog
            .component_edges(&MaterialId::new("ghost").unwrap())
            .unwrap();
        assert!(edges.is_empty());
    }

    #[test]
    fn document_from_yaml() {
        let yaml = r#"
items:
  - id: flour
    unit_price: "2.00"
    unit: kg
materials:
  - id: sponge
    batch_amount: 1
    batch_unit: kg
    size: Large
    components:
      - position: 1
        kind: item
        target: flour
        amount: "0.5"
        unit: kg
variants:
  - product: cake
    size: Large
    material: sponge
add_ons:
  - id: candles
    unit_price: "1.50"
    active: false
"#;
        let doc: CatalogDocument = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(doc.len(), 4);
        assert!(!doc.add_ons[0].active);
        assert_eq!(doc.materials[0].size, Some(Size::new("Large").unwrap()));

        let catalog = MemoryCatalog::from_records(doc.into_records());
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn snapshot_reads_the_same_rows() {
        let catalog = MemoryCatalog::from_records([item("eggs", "0.25", "pc")]);
        let snapshot = catalog.snapshot().unwrap();

        let eggs = snapshot
            .inventory_item(&ItemId::new("eggs").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(eggs.unit, "pc");
    }
}
