//! Paged file implementation.
//!
//! Fixed-size page I/O over a single backing file. The file is a flat
//! sequence of data pages: page 0 is an ordinary page and the page count
//! is simply `file length / PAGE_SIZE`. The trait abstraction allows
//! mocking the backing store in tests.
//!
//! Concurrency note: the internal locks only make individual page
//! operations atomic with respect to each other. The engine assumes a
//! single writer and no concurrent readers during a write; callers
//! needing concurrent access must serialize externally.

use crate::error::{Result, StorageError};
use crate::page::PageBuf;
use crate::types::{PageId, PAGE_SIZE};
use parking_lot::RwLock;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::trace;

/// Read/write/append counters, incremented once per successful operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoStats {
    /// Number of successful page reads
    pub reads: u64,
    /// Number of successful page writes
    pub writes: u64,
    /// Number of successful page appends
    pub appends: u64,
}

/// Trait for whole-page file I/O
pub trait PagedFile: Send + Sync {
    /// Read a page; fails if `page_id >= page_count()`
    fn read_page(&self, page_id: PageId) -> Result<PageBuf>;

    /// Overwrite a page; fails if `page_id >= page_count()`
    fn write_page(&self, page_id: PageId, data: &[u8]) -> Result<()>;

    /// Append a new page, growing the file by exactly one page granule
    fn append_page(&self, data: &[u8]) -> Result<PageId>;

    /// Number of pages currently in the file
    fn page_count(&self) -> u32;

    /// Flush all data to disk
    fn sync(&self) -> Result<()>;

    /// Diagnostic operation counters
    fn io_stats(&self) -> IoStats;
}

/// File-backed paged file implementation
pub struct PagedFileImpl {
    /// The backing file
    file: RwLock<File>,
    /// Cached page count (file length / PAGE_SIZE)
    page_count: RwLock<u32>,
    /// Operation counters
    stats: RwLock<IoStats>,
    /// Whether to sync on each write
    sync_on_write: bool,
}

impl PagedFileImpl {
    /// Create a new, empty storage file.
    ///
    /// Fails with `AlreadyExists` if the path is taken.
    pub fn create(path: &Path, sync_on_write: bool) -> Result<Self> {
        if path.exists() {
            return Err(StorageError::AlreadyExists(path.to_path_buf()));
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        Ok(Self {
            file: RwLock::new(file),
            page_count: RwLock::new(0),
            stats: RwLock::new(IoStats::default()),
            sync_on_write,
        })
    }

    /// Open an existing storage file.
    ///
    /// Fails with `FileNotFound` if the path does not exist.
    pub fn open(path: &Path, sync_on_write: bool) -> Result<Self> {
        if !path.exists() {
            return Err(StorageError::FileNotFound(path.to_path_buf()));
        }

        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let page_count = (file.metadata()?.len() / PAGE_SIZE as u64) as u32;

        Ok(Self {
            file: RwLock::new(file),
            page_count: RwLock::new(page_count),
            stats: RwLock::new(IoStats::default()),
            sync_on_write,
        })
    }

    /// Delete a storage file from disk.
    ///
    /// Fails with `FileNotFound` if the path does not exist.
    pub fn destroy(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(StorageError::FileNotFound(path.to_path_buf()));
        }
        std::fs::remove_file(path)?;
        Ok(())
    }

    fn check_in_range(&self, page_id: PageId) -> Result<()> {
        let page_count = self.page_count();
        if page_id.value() >= page_count {
            return Err(StorageError::PageOutOfRange {
                page: page_id,
                page_count,
            });
        }
        Ok(())
    }

    fn check_page_sized(data: &[u8]) -> Result<()> {
        if data.len() != PAGE_SIZE {
            return Err(StorageError::invalid_operation(format!(
                "page data must be {} bytes, got {}",
                PAGE_SIZE,
                data.len()
            )));
        }
        Ok(())
    }
}

impl PagedFile for PagedFileImpl {
    fn read_page(&self, page_id: PageId) -> Result<PageBuf> {
        self.check_in_range(page_id)?;

        let mut buf = [0u8; PAGE_SIZE];
        let mut file = self.file.write();
        file.seek(SeekFrom::Start(page_id.file_offset(PAGE_SIZE)))?;
        file.read_exact(&mut buf)?;
        drop(file);

        self.stats.write().reads += 1;
        Ok(PageBuf::from_bytes(&buf))
    }

    fn write_page(&self, page_id: PageId, data: &[u8]) -> Result<()> {
        self.check_in_range(page_id)?;
        Self::check_page_sized(data)?;

        let mut file = self.file.write();
        file.seek(SeekFrom::Start(page_id.file_offset(PAGE_SIZE)))?;
        file.write_all(data)?;
        if self.sync_on_write {
            file.sync_data()?;
        }
        drop(file);

        self.stats.write().writes += 1;
        Ok(())
    }

    fn append_page(&self, data: &[u8]) -> Result<PageId> {
        Self::check_page_sized(data)?;

        let mut page_count = self.page_count.write();
        let page_id = PageId::new(*page_count);

        let mut file = self.file.write();
        file.seek(SeekFrom::Start(page_id.file_offset(PAGE_SIZE)))?;
        file.write_all(data)?;
        if self.sync_on_write {
            file.sync_data()?;
        }
        drop(file);

        *page_count += 1;
        self.stats.write().appends += 1;
        trace!(page = %page_id, "appended page");
        Ok(page_id)
    }

    fn page_count(&self) -> u32 {
        *self.page_count.read()
    }

    fn sync(&self) -> Result<()> {
        let file = self.file.write();
        file.sync_all()?;
        Ok(())
    }

    fn io_stats(&self) -> IoStats {
        *self.stats.read()
    }
}
