//! JSONL storage for the catalog
//!
//! The catalog is stored in `.bom/catalog.jsonl` with one JSON record per
//! line. A later line for the same row replaces an earlier one, so quick
//! edits can be appended and folded away later by [`CatalogStore::compact`].
//! Uses file locking for concurrent access safety.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use crate::domain::{CatalogRecord, MemoryCatalog, RecordKey};

/// Store for catalog rows in JSONL format
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    /// Creates a new catalog store at the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the default store for a project
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(".bom").join("catalog.jsonl"))
    }

    /// Returns the path to the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all rows, keeping the last version of each
    pub fn read_all(&self) -> Result<BTreeMap<RecordKey, CatalogRecord>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open catalog: {}", self.path.display()))?;

        // Acquire shared lock for reading
        file.lock_shared()
            .context("Failed to acquire read lock on catalog")?;

        let reader = BufReader::new(&file);
        let mut records = BTreeMap::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;

            if line.trim().is_empty() {
                continue;
            }

            let record: CatalogRecord = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse catalog record at line {}", line_num + 1))?;

            records.insert(record.key(), record);
        }

        // Lock is released when file is dropped
        Ok(records)
    }

    /// Loads the catalog into memory
    pub fn load(&self) -> Result<MemoryCatalog> {
        Ok(MemoryCatalog::from_records(self.read_all()?.into_values()))
    }

    /// Writes all rows to the store (full rewrite, sorted by key)
    pub fn write_all<'a>(&self, records: impl IntoIterator<Item = &'a CatalogRecord>) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        // Write to temp file first
        let temp_path = self.path.with_extension("jsonl.tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            // Acquire exclusive lock
            file.lock_exclusive()
                .context("Failed to acquire write lock on catalog")?;

            let mut writer = BufWriter::new(&file);

            let mut sorted: Vec<_> = records.into_iter().collect();
            sorted.sort_by_key(|r| r.key());

            for record in sorted {
                let line = serde_json::to_string(record).context("Failed to serialize record")?;
                writeln!(writer, "{}", line).context("Failed to write record")?;
            }

            writer.flush().context("Failed to flush catalog")?;
        }

        // Atomic rename
        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }

    /// Appends a single row without rewriting the file
    pub fn append(&self, record: &CatalogRecord) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open catalog: {}", self.path.display()))?;

        // Acquire exclusive lock
        file.lock_exclusive()
            .context("Failed to acquire write lock on catalog")?;

        let mut writer = BufWriter::new(&file);
        let line = serde_json::to_string(record).context("Failed to serialize record")?;
        writeln!(writer, "{}", line).context("Failed to write record")?;

        writer.flush().context("Failed to flush catalog")?;

        Ok(())
    }

    /// Inserts or replaces rows and rewrites the store; returns the number
    /// of rows written by the caller
    pub fn upsert(&self, incoming: impl IntoIterator<Item = CatalogRecord>) -> Result<usize> {
        let mut records = self.read_all()?;
        let mut count = 0;
        for record in incoming {
            records.insert(record.key(), record);
            count += 1;
        }
        self.write_all(records.values())?;
        Ok(count)
    }

    /// Removes a row by key
    pub fn remove(&self, key: &RecordKey) -> Result<bool> {
        let mut records = self.read_all()?;
        let removed = records.remove(key).is_some();
        if removed {
            self.write_all(records.values())?;
        }
        Ok(removed)
    }

    /// Compacts the store (drops superseded lines, rewrites clean)
    pub fn compact(&self) -> Result<usize> {
        let records = self.read_all()?;
        let count = records.len();
        self.write_all(records.values())?;
        Ok(count)
    }

    /// Content hash of the store file; a missing file hashes as empty
    pub fn fingerprint(&self) -> io::Result<String> {
        let mut hasher = blake3::Hasher::new();

        match File::open(&self.path) {
            Ok(mut file) => {
                let mut buf = [0u8; 8192];
                loop {
                    let n = file.read(&mut buf)?;
                    if n == 0 {
                        break;
                    }
                    hasher.update(&buf[..n]);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        Ok(hasher.finalize().to_hex().to_string())
    }
}
