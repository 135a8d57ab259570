//! # Record Storage Engine
//!
//! A disk-based slotted-page record storage engine for relational
//! databases: variable-length tuple insert/read/update/delete plus a
//! condition-based sequential scan with projection.
//!
//! ## Architecture
//!
//! The engine is composed of modular, swappable components:
//!
//! - **Page Layer** (`page`): slotted page format with a tri-state slot
//!   directory (live / tombstone / forward)
//! - **Storage Layer** (`storage`): whole-page file I/O with operation
//!   counters
//! - **Record Layer** (`record`): record manager, row encoding,
//!   condition evaluation, and scans
//! - **Types** (`types`): descriptors, identifiers, and the binary codec
//!
//! ## Usage
//!
//! ```rust,ignore
//! use record_storage::{Attribute, CompareOp, Config, RecordDescriptor, RecordFile, ScanFilter, Value};
//!
//! let descriptor = RecordDescriptor::new(vec![
//!     Attribute::int("id"),
//!     Attribute::varchar("name", 20),
//! ]);
//! let table = RecordFile::create(Config::new("users.db"), descriptor)?;
//!
//! let rid = table.insert_row(&[Some(Value::Int(1)), Some(Value::Varchar("ada".into()))])?;
//! let row = table.read_row(rid)?;
//!
//! let filter = ScanFilter::new("id", CompareOp::Gt, Value::Int(0));
//! for entry in table.scan(Some(filter), &["name"])? {
//!     let (rid, payload) = entry?;
//!     println!("{rid}: {payload:?}");
//! }
//! ```
//!
//! Concurrency: the engine is single-threaded by design. Exactly one
//! writer and no concurrent readers during a write; callers needing
//! concurrent access must serialize externally.

pub mod error;
pub mod page;
pub mod record;
pub mod storage;
pub mod types;

pub use error::{Result, StorageError};
pub use record::{decode_row, encode_row, evaluate, RecordManager, Scan, ScanFilter, Value};
pub use storage::{IoStats, PagedFile, PagedFileImpl};
pub use types::{
    Attribute, AttributeType, CompareOp, PageId, RecordDescriptor, RecordId, MAX_RECORD_SIZE,
    PAGE_SIZE,
};

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Storage file configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the storage file
    pub path: PathBuf,
    /// Whether to sync writes immediately (default: true)
    pub sync_on_write: bool,
}

impl Config {
    /// Create a new configuration with default settings
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            sync_on_write: true,
        }
    }

    /// Set sync-on-write behavior
    pub fn sync_on_write(mut self, enabled: bool) -> Self {
        self.sync_on_write = enabled;
        self
    }
}

/// Owned handle to one table's storage file.
///
/// Ties a paged file, a record manager, and the table's descriptor
/// together behind the boundary the catalog layer consumes. Each open
/// file gets its own instance; nothing is shared through globals.
pub struct RecordFile {
    manager: RecordManager<PagedFileImpl>,
    descriptor: RecordDescriptor,
}

impl RecordFile {
    /// Create a new storage file for a table with the given descriptor
    pub fn create(config: Config, descriptor: RecordDescriptor) -> Result<Self> {
        let file = Arc::new(PagedFileImpl::create(&config.path, config.sync_on_write)?);
        Ok(Self {
            manager: RecordManager::new(file),
            descriptor,
        })
    }

    /// Open an existing storage file
    pub fn open(config: Config, descriptor: RecordDescriptor) -> Result<Self> {
        let file = Arc::new(PagedFileImpl::open(&config.path, config.sync_on_write)?);
        Ok(Self {
            manager: RecordManager::new(file),
            descriptor,
        })
    }

    /// Delete a table's storage file from disk
    pub fn destroy(path: &Path) -> Result<()> {
        PagedFileImpl::destroy(path)
    }

    /// The table's record descriptor
    pub fn descriptor(&self) -> &RecordDescriptor {
        &self.descriptor
    }

    /// Insert raw record bytes
    pub fn insert(&self, record: &[u8]) -> Result<RecordId> {
        self.manager.insert(record)
    }

    /// Encode and insert a row of typed values
    pub fn insert_row(&self, values: &[Option<Value>]) -> Result<RecordId> {
        let record = encode_row(&self.descriptor, values)?;
        self.manager.insert(&record)
    }

    /// Read raw record bytes
    pub fn read(&self, rid: RecordId) -> Result<Vec<u8>> {
        self.manager.read(rid)
    }

    /// Read a record back as typed values
    pub fn read_row(&self, rid: RecordId) -> Result<Vec<Option<Value>>> {
        let record = self.manager.read(rid)?;
        decode_row(&self.descriptor, &record)
    }

    /// Replace a record's bytes; the handle stays valid
    pub fn update(&self, rid: RecordId, record: &[u8]) -> Result<()> {
        self.manager.update(rid, record)
    }

    /// Encode and write a replacement row
    pub fn update_row(&self, rid: RecordId, values: &[Option<Value>]) -> Result<()> {
        let record = encode_row(&self.descriptor, values)?;
        self.manager.update(rid, &record)
    }

    /// Delete a record
    pub fn delete(&self, rid: RecordId) -> Result<()> {
        self.manager.delete(rid)
    }

    /// Read one attribute of a record; `None` if the attribute is null
    pub fn read_attribute(&self, rid: RecordId, name: &str) -> Result<Option<Vec<u8>>> {
        self.manager.read_attribute(&self.descriptor, rid, name)
    }

    /// Scan all records, filtering and projecting.
    ///
    /// `projection` lists the attribute names to emit, in order.
    pub fn scan(
        &self,
        filter: Option<ScanFilter>,
        projection: &[&str],
    ) -> Result<Scan<'_, PagedFileImpl>> {
        Scan::new(&self.manager, &self.descriptor, filter, projection)
    }

    /// Diagnostic I/O counters
    pub fn io_stats(&self) -> IoStats {
        self.manager.file().io_stats()
    }

    /// Flush all data to disk
    pub fn sync(&self) -> Result<()> {
        self.manager.file().sync()
    }
}
