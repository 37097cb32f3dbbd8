//! SQLite read view of the catalog
//!
//! The cache sits in `.bom/.cache/catalog.db` and mirrors the rows of
//! `.bom/catalog.jsonl`. It is invalidated by content fingerprint rather
//! than mtime, so a catalog restored from git with an old timestamp still
//! forces a rebuild.
//!
//! Every [`Catalog::snapshot`] opens a read transaction; in WAL mode that
//! pins one version of the database for the whole resolution even if a
//! rebuild commits from another process meanwhile.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use rust_decimal::Decimal;
use serde::Serialize;

use super::CatalogStore;
use crate::domain::{
    AddOn, AddOnId, Catalog, CatalogError, CatalogReader, CatalogRecord, ComponentEdge,
    ComponentKind, ComponentRef, CompositeMaterial, IdError, InventoryItem, ItemId, MaterialId,
    ProductId, Size, SubVariant, Variant,
};

/// Row counts and freshness of the cache
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub items: usize,
    pub materials: usize,
    pub component_edges: usize,
    pub variants: usize,
    pub sub_variants: usize,
    pub add_ons: usize,
    pub last_rebuild: Option<DateTime<Utc>>,
}

/// SQLite-backed catalog
pub struct SqliteCatalog {
    /// Path to the SQLite database
    db_path: PathBuf,

    /// Path to catalog.jsonl (for fingerprint comparison)
    catalog_path: PathBuf,

    /// Database connection
    conn: Connection,
}

impl SqliteCatalog {
    /// Schema version - bump when schema changes to force rebuild
    const SCHEMA_VERSION: i32 = 1;

    /// Creates or opens the cache for a project
    pub fn open(project_root: &Path) -> Result<Self> {
        let bom_dir = project_root.join(".bom");
        let cache_dir = bom_dir.join(".cache");
        let db_path = cache_dir.join("catalog.db");
        let catalog_path = bom_dir.join("catalog.jsonl");

        // Ensure cache directory exists
        fs::create_dir_all(&cache_dir).with_context(|| {
            format!("Failed to create cache directory: {}", cache_dir.display())
        })?;

        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open cache database: {}", db_path.display()))?;

        // WAL gives readers a stable snapshot while a rebuild writes
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let mut cache = Self {
            db_path,
            catalog_path,
            conn,
        };

        cache.ensure_schema()?;

        Ok(cache)
    }

    /// Ensures the schema is up to date
    fn ensure_schema(&mut self) -> Result<()> {
        let current_version = self.schema_version()?;

        if current_version != Self::SCHEMA_VERSION {
            tracing::debug!(
                found = current_version,
                expected = Self::SCHEMA_VERSION,
                "recreating cache schema"
            );
            self.create_schema()?;
        }

        Ok(())
    }

    /// Gets the current schema version
    fn schema_version(&self) -> Result<i32> {
        let result: Option<i32> = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .optional()?;

        Ok(result.unwrap_or(0))
    }

    /// Creates the schema from scratch
    fn create_schema(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "
            DROP TABLE IF EXISTS component_edges;
            DROP TABLE IF EXISTS materials;
            DROP TABLE IF EXISTS items;
            DROP TABLE IF EXISTS variants;
            DROP TABLE IF EXISTS sub_variants;
            DROP TABLE IF EXISTS add_ons;
            DROP TABLE IF EXISTS cache_meta;
            ",
        )?;

        // Decimals are stored as TEXT so no precision is lost to REAL
        self.conn.execute_batch(
            "
            CREATE TABLE items (
                id TEXT PRIMARY KEY,
                name TEXT,
                unit_price TEXT NOT NULL,
                unit TEXT NOT NULL,
                active INTEGER NOT NULL
            );

            CREATE TABLE materials (
                id TEXT PRIMARY KEY,
                name TEXT,
                batch_amount TEXT NOT NULL,
                batch_unit TEXT NOT NULL,
                size TEXT,
                active INTEGER NOT NULL
            );

            CREATE TABLE component_edges (
                material_id TEXT NOT NULL,
                seq INTEGER NOT NULL,
                position INTEGER NOT NULL,
                kind TEXT NOT NULL,
                target TEXT NOT NULL,
                amount TEXT NOT NULL,
                unit TEXT NOT NULL,
                active INTEGER NOT NULL,
                PRIMARY KEY (material_id, seq)
            );

            CREATE TABLE variants (
                product TEXT NOT NULL,
                size TEXT NOT NULL,
                material_id TEXT NOT NULL,
                PRIMARY KEY (product, size)
            );

            CREATE TABLE sub_variants (
                product TEXT NOT NULL,
                size TEXT NOT NULL,
                material_id TEXT NOT NULL,
                PRIMARY KEY (product, size)
            );

            CREATE TABLE add_ons (
                id TEXT PRIMARY KEY,
                name TEXT,
                unit_price TEXT NOT NULL,
                active INTEGER NOT NULL
            );

            CREATE TABLE cache_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX idx_edges_target ON component_edges(kind, target);
            ",
        )?;

        self.conn.execute(
            &format!("PRAGMA user_version = {}", Self::SCHEMA_VERSION),
            [],
        )?;

        Ok(())
    }

    fn meta(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM cache_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value)
    }

    /// Checks if the cache no longer matches catalog.jsonl
    pub fn is_stale(&self) -> Result<bool> {
        let stored = self.meta("fingerprint")?;
        let current = CatalogStore::new(&self.catalog_path)
            .fingerprint()
            .with_context(|| format!("Failed to read catalog: {}", self.catalog_path.display()))?;

        Ok(stored.as_deref() != Some(current.as_str()))
    }

    /// Time of the last successful rebuild
    pub fn last_rebuild(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(raw) = self.meta("last_rebuild")? else {
            return Ok(None);
        };

        let at = DateTime::parse_from_rfc3339(&raw)
            .with_context(|| format!("Invalid last_rebuild timestamp in cache: {}", raw))?;

        Ok(Some(at.with_timezone(&Utc)))
    }

    /// Replaces the cache contents with `records` in one transaction
    ///
    /// `fingerprint` is the [`CatalogStore::fingerprint`] of the file the
    /// records were read from.
    pub fn rebuild<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a CatalogRecord>,
        fingerprint: &str,
    ) -> Result<usize> {
        let tx = self.conn.transaction()?;

        tx.execute_batch(
            "
            DELETE FROM component_edges;
            DELETE FROM materials;
            DELETE FROM items;
            DELETE FROM variants;
            DELETE FROM sub_variants;
            DELETE FROM add_ons;
            ",
        )?;

        let mut count = 0;
        {
            let mut item_stmt = tx.prepare(
                "INSERT OR REPLACE INTO items (id, name, unit_price, unit, active)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            let mut material_stmt = tx.prepare(
                "INSERT OR REPLACE INTO materials (id, name, batch_amount, batch_unit, size, active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            let mut clear_edges_stmt =
                tx.prepare("DELETE FROM component_edges WHERE material_id = ?1")?;
            let mut edge_stmt = tx.prepare(
                "INSERT INTO component_edges (material_id, seq, position, kind, target, amount, unit, active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            let mut variant_stmt = tx.prepare(
                "INSERT OR REPLACE INTO variants (product, size, material_id) VALUES (?1, ?2, ?3)",
            )?;
            let mut sub_variant_stmt = tx.prepare(
                "INSERT OR REPLACE INTO sub_variants (product, size, material_id) VALUES (?1, ?2, ?3)",
            )?;
            let mut add_on_stmt = tx.prepare(
                "INSERT OR REPLACE INTO add_ons (id, name, unit_price, active) VALUES (?1, ?2, ?3, ?4)",
            )?;

            for record in records {
                match record {
                    CatalogRecord::Item(item) => {
                        item_stmt.execute(params![
                            item.id.as_str(),
                            item.name,
                            item.unit_price.to_string(),
                            item.unit,
                            item.active,
                        ])?;
                    }
                    CatalogRecord::Material(material) => {
                        material_stmt.execute(params![
                            material.id.as_str(),
                            material.name,
                            material.batch_amount.to_string(),
                            material.batch_unit,
                            material.size.as_ref().map(|s| s.as_str()),
                            material.active,
                        ])?;

                        clear_edges_stmt.execute(params![material.id.as_str()])?;
                        for (seq, edge) in material.components.iter().enumerate() {
                            edge_stmt.execute(params![
                                material.id.as_str(),
                                seq as i64,
                                edge.position,
                                edge.target.kind().as_str(),
                                edge.target.id(),
                                edge.amount.to_string(),
                                edge.unit,
                                edge.active,
                            ])?;
                        }
                    }
                    CatalogRecord::Variant(v) => {
                        variant_stmt.execute(params![
                            v.product.as_str(),
                            v.size.as_str(),
                            v.material.as_str()
                        ])?;
                    }
                    CatalogRecord::SubVariant(v) => {
                        sub_variant_stmt.execute(params![
                            v.product.as_str(),
                            v.size.as_str(),
                            v.material.as_str()
                        ])?;
                    }
                    CatalogRecord::AddOn(add_on) => {
                        add_on_stmt.execute(params![
                            add_on.id.as_str(),
                            add_on.name,
                            add_on.unit_price.to_string(),
                            add_on.active,
                        ])?;
                    }
                }
                count += 1;
            }
        }

        let mut meta_stmt =
            tx.prepare("INSERT OR REPLACE INTO cache_meta (key, value) VALUES (?1, ?2)")?;
        meta_stmt.execute(params!["fingerprint", fingerprint])?;
        meta_stmt.execute(params!["last_rebuild", Utc::now().to_rfc3339()])?;
        drop(meta_stmt);

        tx.commit()?;

        tracing::info!(rows = count, path = %self.db_path.display(), "rebuilt catalog cache");

        Ok(count)
    }

    /// Row counts per table
    pub fn stats(&self) -> Result<CacheStats> {
        let count = |table: &str| -> Result<usize> {
            let n: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
            Ok(n as usize)
        };

        Ok(CacheStats {
            items: count("items")?,
            materials: count("materials")?,
            component_edges: count("component_edges")?,
            variants: count("variants")?,
            sub_variants: count("sub_variants")?,
            add_ons: count("add_ons")?,
            last_rebuild: self.last_rebuild()?,
        })
    }

    /// Returns the path to the cache database
    pub fn path(&self) -> &Path {
        &self.db_path
    }
}

impl Catalog for SqliteCatalog {
    /// Opens a read transaction; only one snapshot per connection can be
    /// open at a time
    fn snapshot(&self) -> Result<Box<dyn CatalogReader + '_>, CatalogError> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(CatalogError::backend)?;

        Ok(Box::new(SqliteSnapshot { tx }))
    }
}

/// One read transaction over the cache; rolled back on drop
struct SqliteSnapshot<'c> {
    tx: Transaction<'c>,
}

fn corrupt(key: impl fmt::Display, reason: impl fmt::Display) -> CatalogError {
    CatalogError::Corrupt {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn decimal(key: impl fmt::Display, column: &str, raw: &str) -> Result<Decimal, CatalogError> {
    Decimal::from_str(raw).map_err(|e| corrupt(key, format!("{} {:?}: {}", column, raw, e)))
}

fn id_field<T>(key: impl fmt::Display, parsed: Result<T, IdError>) -> Result<T, CatalogError> {
    parsed.map_err(|e| corrupt(key, e))
}

impl SqliteSnapshot<'_> {
    fn binding(
        &self,
        table: &str,
        product: &ProductId,
        size: &Size,
    ) -> Result<Option<MaterialId>, CatalogError> {
        let mut stmt = self
            .tx
            .prepare_cached(&format!(
                "SELECT material_id FROM {} WHERE product = ?1 AND size = ?2",
                table
            ))
            .map_err(CatalogError::backend)?;

        let raw: Option<String> = stmt
            .query_row(params![product.as_str(), size.as_str()], |row| row.get(0))
            .optional()
            .map_err(CatalogError::backend)?;

        raw.map(|m| id_field(format!("{}:{}/{}", table, product, size), MaterialId::new(m)))
            .transpose()
    }
}

impl CatalogReader for SqliteSnapshot<'_> {
    fn inventory_item(&self, id: &ItemId) -> Result<Option<InventoryItem>, CatalogError> {
        let mut stmt = self
            .tx
            .prepare_cached("SELECT name, unit_price, unit, active FROM items WHERE id = ?1")
            .map_err(CatalogError::backend)?;

        let row: Option<(Option<String>, String, String, bool)> = stmt
            .query_row(params![id.as_str()], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })
            .optional()
            .map_err(CatalogError::backend)?;

        let Some((name, unit_price, unit, active)) = row else {
            return Ok(None);
        };

        Ok(Some(InventoryItem {
            id: id.clone(),
            name,
            unit_price: decimal(format!("item:{}", id), "unit_price", &unit_price)?,
            unit,
            active,
        }))
    }

    fn composite_material(&self, id: &MaterialId) -> Result<Option<CompositeMaterial>, CatalogError> {
        let mut stmt = self
            .tx
            .prepare_cached(
                "SELECT name, batch_amount, batch_unit, size, active FROM materials WHERE id = ?1",
            )
            .map_err(CatalogError::backend)?;

        let row: Option<(Option<String>, String, String, Option<String>, bool)> = stmt
            .query_row(params![id.as_str()], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
            })
            .optional()
            .map_err(CatalogError::backend)?;

        let Some((name, batch_amount, batch_unit, size, active)) = row else {
            return Ok(None);
        };

        let key = format!("material:{}", id);
        let size = size.map(|s| id_field(&key, Size::new(s))).transpose()?;

        Ok(Some(CompositeMaterial {
            id: id.clone(),
            name,
            batch_amount: decimal(&key, "batch_amount", &batch_amount)?,
            batch_unit,
            size,
            active,
        }))
    }

    fn component_edges(&self, material: &MaterialId) -> Result<Vec<ComponentEdge>, CatalogError> {
        let mut stmt = self
            .tx
            .prepare_cached(
                "SELECT position, kind, target, amount, unit, active FROM component_edges
                 WHERE material_id = ?1 ORDER BY position, seq",
            )
            .map_err(CatalogError::backend)?;

        let rows = stmt
            .query_map(params![material.as_str()], |row| {
                Ok((
                    row.get::<_, u32>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, bool>(5)?,
                ))
            })
            .map_err(CatalogError::backend)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(CatalogError::backend)?;

        let key = format!("material:{}", material);
        rows.into_iter()
            .map(|(position, kind, target, amount, unit, active)| {
                let target = match kind.as_str() {
                    k if k == ComponentKind::Item.as_str() => {
                        ComponentRef::Item(id_field(&key, ItemId::new(&target))?)
                    }
                    k if k == ComponentKind::Material.as_str() => {
                        ComponentRef::Material(id_field(&key, MaterialId::new(&target))?)
                    }
                    other => return Err(corrupt(&key, format!("unknown component kind {:?}", other))),
                };

                Ok(ComponentEdge {
                    position,
                    target,
                    amount: decimal(&key, "amount", &amount)?,
                    unit,
                    active,
                })
            })
            .collect()
    }

    fn variant(&self, product: &ProductId, size: &Size) -> Result<Option<Variant>, CatalogError> {
        Ok(self.binding("variants", product, size)?.map(|material| Variant {
            product: product.clone(),
            size: size.clone(),
            material,
        }))
    }

    fn sub_variant(&self, product: &ProductId, size: &Size) -> Result<Option<SubVariant>, CatalogError> {
        Ok(self.binding("sub_variants", product, size)?.map(|material| SubVariant {
            product: product.clone(),
            size: size.clone(),
            material,
        }))
    }

    fn add_on(&self, id: &AddOnId) -> Result<Option<AddOn>, CatalogError> {
        let mut stmt = self
            .tx
            .prepare_cached("SELECT name, unit_price, active FROM add_ons WHERE id = ?1")
            .map_err(CatalogError::backend)?;

        let row: Option<(Option<String>, String, bool)> = stmt
            .query_row(params![id.as_str()], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .optional()
            .map_err(CatalogError::backend)?;

        let Some((name, unit_price, active)) = row else {
            return Ok(None);
        };

        Ok(Some(AddOn {
            id: id.clone(),
            name,
            unit_price: decimal(format!("add_on:{}", id), "unit_price", &unit_price)?,
            active,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AddOnSelection, CostEngine, MaterialRecord, MemoryCatalog, UnitRegistry,
    };
    use tempfile::TempDir;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn mid(s: &str) -> MaterialId {
        MaterialId::new(s).unwrap()
    }

    fn iid(s: &str) -> ItemId {
        ItemId::new(s).unwrap()
    }

    fn setup_project() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let project_root = dir.path().to_path_buf();

        fs::create_dir_all(project_root.join(".bom")).unwrap();

        (dir, project_root)
    }

    fn records() -> Vec<CatalogRecord> {
        vec![
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
                    .with(ComponentEdge::item(2, iid("butter"), dec("250"), "g"))
                    .with(ComponentEdge::material(1, mid("sponge"), dec("2"), "kg")),
            ),
            CatalogRecord::Material(
                MaterialRecord::new(mid("m2"), dec("1"), "pc")
                    .with(ComponentEdge::material(1, mid("sponge"), dec("3"), "kg")),
            ),
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
            CatalogRecord::AddOn(AddOn {
                id: AddOnId::new("7").unwrap(),
                name: Some("Candles".to_string()),
                unit_price: dec("1.50"),
                active: true,
            }),
        ]
    }

    fn populated() -> (TempDir, SqliteCatalog) {
        let (dir, root) = setup_project();
        let mut cache = SqliteCatalog::open(&root).unwrap();
        cache.rebuild(&records(), "test").unwrap();
        (dir, cache)
    }

    #[test]
    fn test_cache_creation() {
        let (_dir, project_root) = setup_project();
        let cache = SqliteCatalog::open(&project_root).unwrap();

        assert!(cache.path().exists());
        assert!(cache.last_rebuild().unwrap().is_none());
    }

    #[test]
    fn test_rebuild_and_stats() {
        let (_dir, cache) = populated();

        let stats = cache.stats().unwrap();
        assert_eq!(stats.items, 2);
        assert_eq!(stats.materials, 3);
        assert_eq!(stats.component_edges, 4);
        assert_eq!(stats.variants, 1);
        assert_eq!(stats.sub_variants, 1);
        assert_eq!(stats.add_ons, 1);
        assert!(stats.last_rebuild.is_some());
    }

    #[test]
    fn test_snapshot_reads_rows() {
        let (_dir, cache) = populated();
        let snapshot = cache.snapshot().unwrap();

        let flour = snapshot.inventory_item(&iid("flour")).unwrap().unwrap();
        assert_eq!(flour.unit_price, dec("2.00"));
        assert_eq!(flour.name.as_deref(), Some("Flour"));
        assert!(snapshot.inventory_item(&iid("cocoa")).unwrap().is_none());

        let m1 = snapshot.composite_material(&mid("m1")).unwrap().unwrap();
        assert_eq!(m1.batch_unit, "pc");

        let edges = snapshot.component_edges(&mid("m1")).unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].target, ComponentRef::Material(mid("sponge")));
        assert_eq!(edges[1].amount, dec("250"));

        let product = ProductId::new("d").unwrap();
        let large = Size::new("Large").unwrap();
        assert_eq!(snapshot.variant(&product, &large).unwrap().unwrap().material, mid("m1"));
        assert_eq!(snapshot.sub_variant(&product, &large).unwrap().unwrap().material, mid("m2"));
        assert!(snapshot
            .variant(&product, &Size::new("Small").unwrap())
            .unwrap()
            .is_none());

        let candles = snapshot.add_on(&AddOnId::new("7").unwrap()).unwrap().unwrap();
        assert_eq!(candles.unit_price, dec("1.50"));
    }

    #[test]
    fn test_matches_memory_catalog() {
        let (_dir, cache) = populated();
        let memory = MemoryCatalog::from_records(records());
        let units = UnitRegistry::standard();
        let product = ProductId::new("d").unwrap();
        let large = Size::new("Large").unwrap();
        let candles: Vec<AddOnSelection> = vec!["7=2".parse().unwrap()];

        let from_sqlite = CostEngine::new(&cache, &units)
            .resolve_order_line_price(&product, &large, 2, &candles)
            .unwrap();
        let from_memory = CostEngine::new(&memory, &units)
            .resolve_order_line_price(&product, &large, 2, &candles)
            .unwrap();

        assert_eq!(from_sqlite.total, from_memory.total);
        assert_eq!(from_sqlite.material(), &mid("m2"));
        assert_eq!(from_sqlite.total, dec("9"));

        let m1 = CostEngine::new(&cache, &units).resolve_unit_cost(&mid("m1")).unwrap();
        assert_eq!(m1.cost, dec("4"));
    }

    #[test]
    fn test_corrupt_decimal_is_reported() {
        let (_dir, cache) = populated();
        cache
            .conn
            .execute("UPDATE items SET unit_price = 'abc' WHERE id = 'flour'", [])
            .unwrap();

        let snapshot = cache.snapshot().unwrap();
        let err = snapshot.inventory_item(&iid("flour")).unwrap_err();
        assert!(matches!(err, CatalogError::Corrupt { ref key, .. } if key == "item:flour"));
    }

    #[test]
    fn test_staleness_follows_catalog_content() {
        let (_dir, root) = setup_project();
        let store = CatalogStore::for_project(&root);
        let mut cache = SqliteCatalog::open(&root).unwrap();

        // Never rebuilt
        assert!(cache.is_stale().unwrap());

        let records = records();
        store.write_all(&records).unwrap();
        cache.rebuild(&records, &store.fingerprint().unwrap()).unwrap();
        assert!(!cache.is_stale().unwrap());

        store.append(&records[0]).unwrap();
        assert!(cache.is_stale().unwrap());
    }

    #[test]
    fn test_schema_version() {
        let (_dir, project_root) = setup_project();
        let cache = SqliteCatalog::open(&project_root).unwrap();

        let version = cache.schema_version().unwrap();
        assert_eq!(version, SqliteCatalog::SCHEMA_VERSION);
    }
}
