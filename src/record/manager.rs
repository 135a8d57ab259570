//! Record manager: slotted-page record CRUD with forwarding resolution.
//!
//! Records are addressed by the [`RecordId`] returned at insert time.
//! Updates that relocate a record leave a forwarding entry behind, so the
//! original handle keeps resolving; deletes leave a tombstone. Space from
//! deleted or relocated records is never reclaimed.

use crate::error::{Result, StorageError};
use crate::page::{Slot, SlottedPage};
use crate::storage::PagedFile;
use crate::types::{PageId, RecordDescriptor, RecordId, MAX_RECORD_SIZE, PAGE_SIZE, SLOT_SIZE};
use std::sync::Arc;
use tracing::debug;

/// Terminal state of a resolved record handle
pub(crate) enum Resolved {
    /// The handle reaches a live record at this physical location
    Live {
        location: RecordId,
        offset: usize,
        length: usize,
        page: SlottedPage,
    },
    /// The handle reaches a tombstone
    Dead,
}

/// Record insert/read/update/delete over a paged file.
///
/// One manager owns the logical record space of one file; instances are
/// passed explicitly rather than shared through globals, so multiple
/// files (and tests) stay isolated.
pub struct RecordManager<F: PagedFile> {
    file: Arc<F>,
}

impl<F: PagedFile> RecordManager<F> {
    /// Create a manager over the given paged file
    pub fn new(file: Arc<F>) -> Self {
        Self { file }
    }

    /// The underlying paged file
    pub fn file(&self) -> &Arc<F> {
        &self.file
    }

    /// Insert a record, returning its stable handle.
    ///
    /// Scans pages in ascending order for the first with room, appending
    /// a fresh page when none qualifies. Fails with `NoSpace` only when
    /// the record exceeds the capacity of an entire page.
    pub fn insert(&self, record: &[u8]) -> Result<RecordId> {
        self.insert_from(0, record)
    }

    /// Insert starting the page search at `first_page`.
    ///
    /// Relocation inserts (updates) start at page 1: a forward to page 0
    /// would encode as offset `-0`, which collides with the tombstone
    /// encoding.
    fn insert_from(&self, first_page: u32, record: &[u8]) -> Result<RecordId> {
        if record.len() > MAX_RECORD_SIZE {
            return Err(StorageError::NoSpace {
                needed: record.len(),
                max: MAX_RECORD_SIZE,
            });
        }

        for page_no in first_page..self.file.page_count() {
            let page_id = PageId::new(page_no);
            let mut page = SlottedPage::from_buf(self.file.read_page(page_id)?);
            if page.can_fit(record.len()) {
                let slot = page.append_record(record);
                self.file.write_page(page_id, page.as_bytes())?;
                return Ok(RecordId { page: page_id, slot });
            }
        }

        let mut page = SlottedPage::new();
        let slot = page.append_record(record);
        let page_id = self.file.append_page(page.as_bytes())?;
        debug!(page = %page_id, "no page with free space, appended one");
        Ok(RecordId { page: page_id, slot })
    }

    /// Read a record's bytes.
    ///
    /// `RecordNotFound` if the handle's page or slot index was never
    /// allocated; `RecordDeleted` if resolution ends at a tombstone.
    pub fn read(&self, rid: RecordId) -> Result<Vec<u8>> {
        match self.resolve(rid)? {
            Resolved::Live {
                offset,
                length,
                page,
                ..
            } => Ok(page.record_bytes(offset, length).to_vec()),
            Resolved::Dead => Err(StorageError::RecordDeleted(rid)),
        }
    }

    /// Delete a record, tombstoning its resolved slot.
    ///
    /// A second delete of the same handle fails with `RecordDeleted`.
    pub fn delete(&self, rid: RecordId) -> Result<()> {
        match self.resolve(rid)? {
            Resolved::Live {
                location, mut page, ..
            } => {
                page.set_slot(location.slot, Slot::Tombstone);
                self.file.write_page(location.page, page.as_bytes())?;
                Ok(())
            }
            Resolved::Dead => Err(StorageError::RecordDeleted(rid)),
        }
    }

    /// Replace a record's bytes, keeping its handle stable.
    ///
    /// The new bytes are inserted at a fresh physical location and the
    /// record's current live slot becomes a forward to it, so the handle
    /// returned by the original insert continues to resolve.
    pub fn update(&self, rid: RecordId, record: &[u8]) -> Result<()> {
        let location = match self.resolve(rid)? {
            Resolved::Live { location, .. } => location,
            Resolved::Dead => return Err(StorageError::RecordDeleted(rid)),
        };

        let target = self.insert_from(1, record)?;

        // Re-read the page: the insert above may have landed on it.
        let mut page = SlottedPage::from_buf(self.file.read_page(location.page)?);
        page.set_slot(
            location.slot,
            Slot::Forward {
                page: target.page,
                slot: target.slot,
            },
        );
        self.file.write_page(location.page, page.as_bytes())?;
        debug!(record = %rid, from = %location, to = %target, "relocated record");
        Ok(())
    }

    /// Read one attribute of a record.
    ///
    /// Returns `None` when the null bitmap marks the attribute absent,
    /// otherwise the fixed-width field bytes at the attribute's static
    /// offset. `UnknownAttribute` if the name is not in the descriptor.
    pub fn read_attribute(
        &self,
        descriptor: &RecordDescriptor,
        rid: RecordId,
        attribute_name: &str,
    ) -> Result<Option<Vec<u8>>> {
        let index = descriptor
            .index_of(attribute_name)
            .ok_or_else(|| StorageError::UnknownAttribute(attribute_name.to_string()))?;

        let record = self.read(rid)?;
        let bitmap = &record[..descriptor.bitmap_size()];
        if crate::page::bitmap::is_null(bitmap, index) {
            return Ok(None);
        }

        let offset = descriptor.field_offset(index);
        let length = descriptor.get(index).map(|a| a.length as usize).unwrap_or(0);
        Ok(Some(record[offset..offset + length].to_vec()))
    }

    /// Follow a handle's forwarding chain to its terminal slot.
    ///
    /// Iteration is bounded by the file's total slot capacity: a walk
    /// longer than every slot in the file must revisit one, so it aborts
    /// with `CorruptForward`. Forward targets outside the file or past a
    /// page's directory are corrupt as well.
    pub(crate) fn resolve(&self, rid: RecordId) -> Result<Resolved> {
        let page_count = self.file.page_count();
        if rid.page.value() >= page_count {
            return Err(StorageError::RecordNotFound(rid));
        }

        let mut page = SlottedPage::from_buf(self.file.read_page(rid.page)?);
        if rid.slot >= page.record_count() {
            return Err(StorageError::RecordNotFound(rid));
        }

        let max_hops = page_count as u64 * (PAGE_SIZE / SLOT_SIZE) as u64;
        let mut current = rid;
        let mut hops = 0u64;

        loop {
            match page.slot(current.slot) {
                Slot::Live { offset, length } => {
                    return Ok(Resolved::Live {
                        location: current,
                        offset,
                        length,
                        page,
                    });
                }
                Slot::Tombstone => return Ok(Resolved::Dead),
                Slot::Forward {
                    page: next_page,
                    slot: next_slot,
                } => {
                    hops += 1;
                    if hops > max_hops || next_page.value() >= page_count {
                        return Err(StorageError::CorruptForward(rid));
                    }
                    page = SlottedPage::from_buf(self.file.read_page(next_page)?);
                    if next_slot >= page.record_count() {
                        return Err(StorageError::CorruptForward(rid));
                    }
                    current = RecordId {
                        page: next_page,
                        slot: next_slot,
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PagedFileImpl;
    use tempfile::{tempdir, TempDir};

    fn manager() -> (TempDir, RecordManager<PagedFileImpl>) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.db");
        let file = Arc::new(PagedFileImpl::create(&path, false).unwrap());
        (dir, RecordManager::new(file))
    }

    #[test]
    fn test_insert_read_roundtrip() -> Result<()> {
        let (_dir, rm) = manager();

        let rid = rm.insert(b"hello record")?;
        assert_eq!(rid, RecordId::new(0, 0));
        assert_eq!(rm.read(rid)?, b"hello record");

        let rid2 = rm.insert(b"another")?;
        assert_eq!(rid2, RecordId::new(0, 1));
        assert_eq!(rm.read(rid2)?, b"another");
        Ok(())
    }

    #[test]
    fn test_read_unknown_handle() -> Result<()> {
        let (_dir, rm) = manager();
        rm.insert(b"only one")?;

        assert!(matches!(
            rm.read(RecordId::new(5, 0)),
            Err(StorageError::RecordNotFound(_))
        ));
        assert!(matches!(
            rm.read(RecordId::new(0, 9)),
            Err(StorageError::RecordNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_delete_is_terminal() -> Result<()> {
        let (_dir, rm) = manager();
        let rid = rm.insert(b"doomed")?;

        rm.delete(rid)?;
        assert!(matches!(
            rm.read(rid),
            Err(StorageError::RecordDeleted(_))
        ));
        assert!(matches!(
            rm.delete(rid),
            Err(StorageError::RecordDeleted(_))
        ));
        assert!(matches!(
            rm.update(rid, b"too late"),
            Err(StorageError::RecordDeleted(_))
        ));
        Ok(())
    }

    #[test]
    fn test_update_keeps_handle_stable() -> Result<()> {
        let (_dir, rm) = manager();
        let rid = rm.insert(b"version 1")?;

        rm.update(rid, b"version 2, a bit longer")?;
        assert_eq!(rm.read(rid)?, b"version 2, a bit longer");

        // Repeated updates chain forwards; the handle still resolves.
        for i in 3..10 {
            let body = format!("version {}", i);
            rm.update(rid, body.as_bytes())?;
            assert_eq!(rm.read(rid)?, body.as_bytes());
        }

        // The original slot is now a forward, never a live record.
        let page = SlottedPage::from_buf(rm.file().read_page(rid.page)?);
        assert!(matches!(page.slot(rid.slot), Slot::Forward { .. }));
        Ok(())
    }

    #[test]
    fn test_update_then_delete_through_forward() -> Result<()> {
        let (_dir, rm) = manager();
        let rid = rm.insert(b"moving target")?;
        rm.update(rid, b"moved")?;

        rm.delete(rid)?;
        assert!(matches!(
            rm.read(rid),
            Err(StorageError::RecordDeleted(_))
        ));
        Ok(())
    }

    #[test]
    fn test_oversized_record_rejected() {
        let (_dir, rm) = manager();
        let too_big = vec![0u8; MAX_RECORD_SIZE + 1];
        assert!(matches!(
            rm.insert(&too_big),
            Err(StorageError::NoSpace { .. })
        ));

        // Exactly max payload fits.
        let max = vec![1u8; MAX_RECORD_SIZE];
        let rid = rm.insert(&max).unwrap();
        assert_eq!(rm.read(rid).unwrap(), max);
    }

    #[test]
    fn test_insert_spills_to_new_page() -> Result<()> {
        let (_dir, rm) = manager();
        let record = [9u8; 1000];

        // 4 records of 1000+8 bytes fit in one page, the 5th does not.
        for _ in 0..4 {
            let rid = rm.insert(&record)?;
            assert_eq!(rid.page, PageId::new(0));
        }
        assert_eq!(rm.file().page_count(), 1);

        let rid = rm.insert(&record)?;
        assert_eq!(rid.page, PageId::new(1));
        assert_eq!(rm.file().page_count(), 2);

        // A small record still lands in page 0's remaining gap.
        let rid = rm.insert(b"tiny")?;
        assert_eq!(rid.page, PageId::new(0));
        Ok(())
    }

    #[test]
    fn test_corrupt_forward_out_of_range() -> Result<()> {
        let (_dir, rm) = manager();
        let rid = rm.insert(b"victim")?;

        // Point the slot at a page that does not exist.
        let mut page = SlottedPage::from_buf(rm.file().read_page(rid.page)?);
        page.set_slot(
            rid.slot,
            Slot::Forward {
                page: PageId::new(40),
                slot: 0,
            },
        );
        rm.file().write_page(rid.page, page.as_bytes())?;

        assert!(matches!(
            rm.read(rid),
            Err(StorageError::CorruptForward(_))
        ));
        Ok(())
    }

    #[test]
    fn test_corrupt_forward_cycle() -> Result<()> {
        let (_dir, rm) = manager();
        let a = rm.insert(b"a")?;
        let b = rm.insert(b"b")?;

        // a -> b -> a
        let mut page = SlottedPage::from_buf(rm.file().read_page(a.page)?);
        page.set_slot(
            a.slot,
            Slot::Forward {
                page: b.page,
                slot: b.slot,
            },
        );
        page.set_slot(
            b.slot,
            Slot::Forward {
                page: a.page,
                slot: a.slot,
            },
        );
        rm.file().write_page(a.page, page.as_bytes())?;

        assert!(matches!(
            rm.read(a),
            Err(StorageError::CorruptForward(_))
        ));
        Ok(())
    }

    #[test]
    fn test_read_attribute_null_semantics() -> Result<()> {
        use crate::record::row::{encode_row, Value};
        use crate::types::{codec, Attribute};

        let (_dir, rm) = manager();
        let desc = RecordDescriptor::new(vec![
            Attribute::int("a"),
            Attribute::varchar("b", 5),
        ]);

        let record = encode_row(&desc, &[Some(Value::Int(77)), None])?;
        let rid = rm.insert(&record)?;

        assert_eq!(rm.read_attribute(&desc, rid, "b")?, None);
        assert_eq!(
            rm.read_attribute(&desc, rid, "a")?,
            Some(codec::encode_i32(77).to_vec())
        );
        assert!(matches!(
            rm.read_attribute(&desc, rid, "zzz"),
            Err(StorageError::UnknownAttribute(_))
        ));
        Ok(())
    }
}
