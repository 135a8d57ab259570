//! Sequential scan over all records of a file, with filtering and
//! projection.
//!
//! The scan walks pages in ascending order and slots in directory order
//! within each page. Tombstones are skipped, and so are forwarding
//! entries: a relocated record participates only through the slot it
//! physically lives in, so no record is visited twice. A record whose
//! condition attribute is null never matches.

use crate::error::{Result, StorageError};
use crate::page::{bitmap, Slot, SlottedPage};
use crate::record::condition::evaluate;
use crate::record::manager::RecordManager;
use crate::record::row::Value;
use crate::storage::PagedFile;
use crate::types::{codec, AttributeType, CompareOp, PageId, RecordDescriptor, RecordId};
use tracing::debug;

/// A scan condition: `attribute <op> threshold`
#[derive(Debug, Clone)]
pub struct ScanFilter {
    /// Name of the condition attribute
    pub attribute: String,
    /// Comparison operator
    pub op: CompareOp,
    /// Threshold value the attribute is compared against
    pub threshold: Value,
}

impl ScanFilter {
    /// Create a filter comparing the named attribute against a value
    pub fn new(attribute: impl Into<String>, op: CompareOp, threshold: Value) -> Self {
        Self {
            attribute: attribute.into(),
            op,
            threshold,
        }
    }
}

/// Resolved filter state: condition attribute location plus encoded
/// threshold bytes
struct CompiledFilter {
    index: usize,
    attr_type: AttributeType,
    offset: usize,
    width: usize,
    op: CompareOp,
    threshold: Vec<u8>,
}

/// Lazy iterator over `(RecordId, projected record)` pairs.
///
/// Finite and restartable: each call to [`RecordManager`]-level scan
/// construction yields a fresh iterator starting from page 0. The
/// emitted payload is a record in the standard wire format over the
/// projected attribute subset, in projection-list order.
pub struct Scan<'a, F: PagedFile> {
    manager: &'a RecordManager<F>,
    descriptor: &'a RecordDescriptor,
    filter: Option<CompiledFilter>,
    /// Projected attribute indices, in emission order
    projection: Vec<usize>,
    page_count: u32,
    current_page: u32,
    current_slot: u32,
    page: Option<SlottedPage>,
}

impl<'a, F: PagedFile> Scan<'a, F> {
    /// Set up a scan over every record of the manager's file.
    ///
    /// Fails with `UnknownAttribute` if the filter or projection names an
    /// attribute missing from the descriptor, and with a type error if
    /// the filter threshold does not match the condition attribute.
    pub fn new(
        manager: &'a RecordManager<F>,
        descriptor: &'a RecordDescriptor,
        filter: Option<ScanFilter>,
        projection: &[&str],
    ) -> Result<Self> {
        let filter = filter.map(|f| compile_filter(descriptor, f)).transpose()?;

        let projection = projection
            .iter()
            .map(|name| {
                descriptor
                    .index_of(name)
                    .ok_or_else(|| StorageError::UnknownAttribute((*name).to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        let page_count = manager.file().page_count();
        debug!(pages = page_count, "starting scan");

        Ok(Self {
            manager,
            descriptor,
            filter,
            projection,
            page_count,
            current_page: 0,
            current_slot: 0,
            page: None,
        })
    }

    /// Whether the record passes the filter; a null condition attribute
    /// never matches
    fn record_matches(&self, record: &[u8]) -> bool {
        let Some(filter) = &self.filter else {
            return true;
        };

        let bits = &record[..self.descriptor.bitmap_size()];
        if bitmap::is_null(bits, filter.index) {
            return false;
        }

        let field = &record[filter.offset..filter.offset + filter.width];
        evaluate(filter.attr_type, field, filter.op, &filter.threshold)
    }

    /// Build the projected payload: fresh null bitmap over the projected
    /// attributes plus their fixed-width fields in projection order
    fn project(&self, record: &[u8]) -> Vec<u8> {
        let source_bits = &record[..self.descriptor.bitmap_size()];
        let out_bitmap_size = bitmap::size(self.projection.len());

        let widths: usize = self
            .projection
            .iter()
            .map(|&i| self.descriptor.get(i).map(|a| a.length as usize).unwrap_or(0))
            .sum();
        let mut payload = vec![0u8; out_bitmap_size + widths];

        let mut cursor = out_bitmap_size;
        for (out_index, &attr_index) in self.projection.iter().enumerate() {
            let width = self
                .descriptor
                .get(attr_index)
                .map(|a| a.length as usize)
                .unwrap_or(0);
            if !bitmap::is_null(source_bits, attr_index) {
                let offset = self.descriptor.field_offset(attr_index);
                payload[cursor..cursor + width].copy_from_slice(&record[offset..offset + width]);
                bitmap::set_present(&mut payload[..out_bitmap_size], out_index, true);
            }
            cursor += width;
        }

        payload
    }

    /// Stop iterating after an I/O error
    fn fuse(&mut self) {
        self.current_page = self.page_count;
        self.page = None;
    }
}

fn compile_filter(descriptor: &RecordDescriptor, filter: ScanFilter) -> Result<CompiledFilter> {
    let (index, attr) = descriptor
        .iter()
        .enumerate()
        .find(|(_, a)| a.name == filter.attribute)
        .ok_or_else(|| StorageError::UnknownAttribute(filter.attribute.clone()))?;

    if filter.threshold.attr_type() != attr.attr_type {
        return Err(StorageError::invalid_operation(format!(
            "filter threshold {:?} does not match attribute {:?} of type {:?}",
            filter.threshold, attr.name, attr.attr_type
        )));
    }

    let threshold = match &filter.threshold {
        Value::Int(v) => codec::encode_i32(*v).to_vec(),
        Value::Real(v) => codec::encode_f64(*v).to_vec(),
        Value::Varchar(s) => s.as_bytes().to_vec(),
    };

    Ok(CompiledFilter {
        index,
        attr_type: attr.attr_type,
        offset: descriptor.field_offset(index),
        width: attr.length as usize,
        op: filter.op,
        threshold,
    })
}

impl<F: PagedFile> Iterator for Scan<'_, F> {
    type Item = Result<(RecordId, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_page >= self.page_count {
                return None;
            }

            if self.page.is_none() {
                let page_id = PageId::new(self.current_page);
                match self.manager.file().read_page(page_id) {
                    Ok(buf) => self.page = Some(SlottedPage::from_buf(buf)),
                    Err(e) => {
                        self.fuse();
                        return Some(Err(e));
                    }
                }
            }
            let Some(page) = self.page.as_ref() else {
                return None;
            };

            if self.current_slot >= page.record_count() {
                self.page = None;
                self.current_page += 1;
                self.current_slot = 0;
                continue;
            }

            let slot_index = self.current_slot;
            self.current_slot += 1;

            match page.slot(slot_index) {
                Slot::Tombstone | Slot::Forward { .. } => continue,
                Slot::Live { offset, length } => {
                    let record = page.record_bytes(offset, length);
                    if !self.record_matches(record) {
                        continue;
                    }
                    let payload = self.project(record);
                    let rid = RecordId::new(self.current_page, slot_index);
                    return Some(Ok((rid, payload)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::row::{decode_row, encode_row};
    use crate::storage::PagedFileImpl;
    use crate::types::Attribute;
    use std::sync::Arc;
    use tempfile::{tempdir, TempDir};

    fn descriptor() -> RecordDescriptor {
        RecordDescriptor::new(vec![Attribute::int("id"), Attribute::varchar("name", 5)])
    }

    fn fixture() -> (TempDir, RecordManager<PagedFileImpl>) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scan.db");
        let file = Arc::new(PagedFileImpl::create(&path, false).unwrap());
        (dir, RecordManager::new(file))
    }

    fn insert_row(
        rm: &RecordManager<PagedFileImpl>,
        desc: &RecordDescriptor,
        id: i32,
        name: &str,
    ) -> RecordId {
        let record =
            encode_row(desc, &[Some(Value::Int(id)), Some(Value::Varchar(name.into()))]).unwrap();
        rm.insert(&record).unwrap()
    }

    fn collect(scan: Scan<'_, PagedFileImpl>) -> Vec<(RecordId, Vec<u8>)> {
        scan.map(|item| item.unwrap()).collect()
    }

    #[test]
    fn test_scan_empty_table() {
        let (_dir, rm) = fixture();
        let desc = descriptor();
        let scan = Scan::new(&rm, &desc, None, &["id", "name"]).unwrap();
        assert!(collect(scan).is_empty());
    }

    #[test]
    fn test_scan_filters_by_condition() {
        let (_dir, rm) = fixture();
        let desc = descriptor();
        insert_row(&rm, &desc, 1, "a");
        insert_row(&rm, &desc, 2, "b");
        insert_row(&rm, &desc, 3, "c");

        let filter = ScanFilter::new("id", CompareOp::Gt, Value::Int(1));
        let scan = Scan::new(&rm, &desc, Some(filter), &["id", "name"]).unwrap();
        let results = collect(scan);

        assert_eq!(results.len(), 2);
        let rows: Vec<_> = results
            .iter()
            .map(|(_, payload)| decode_row(&desc, payload).unwrap())
            .collect();
        assert_eq!(
            rows[0],
            vec![Some(Value::Int(2)), Some(Value::Varchar("b".into()))]
        );
        assert_eq!(
            rows[1],
            vec![Some(Value::Int(3)), Some(Value::Varchar("c".into()))]
        );
        // Ascending page/slot order.
        assert!(results[0].0.slot < results[1].0.slot);
    }

    #[test]
    fn test_scan_projection_order_and_subset() {
        let (_dir, rm) = fixture();
        let desc = descriptor();
        insert_row(&rm, &desc, 42, "x");

        // Project a reordered subset: name first.
        let scan = Scan::new(&rm, &desc, None, &["name", "id"]).unwrap();
        let results = collect(scan);
        assert_eq!(results.len(), 1);

        let projected_desc =
            RecordDescriptor::new(vec![Attribute::varchar("name", 5), Attribute::int("id")]);
        let row = decode_row(&projected_desc, &results[0].1).unwrap();
        assert_eq!(
            row,
            vec![Some(Value::Varchar("x".into())), Some(Value::Int(42))]
        );
    }

    #[test]
    fn test_scan_skips_tombstones_and_forwards() {
        let (_dir, rm) = fixture();
        let desc = descriptor();
        let keep = insert_row(&rm, &desc, 1, "keep");
        let dead = insert_row(&rm, &desc, 2, "dead");
        let moved = insert_row(&rm, &desc, 3, "old");

        rm.delete(dead).unwrap();
        let record = encode_row(
            &desc,
            &[Some(Value::Int(3)), Some(Value::Varchar("new".into()))],
        )
        .unwrap();
        rm.update(moved, &record).unwrap();

        let scan = Scan::new(&rm, &desc, None, &["id", "name"]).unwrap();
        let results = collect(scan);

        // keep + relocated copy of `moved`; the forward-source slot and
        // the tombstone are not reported.
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, keep);
        let rows: Vec<_> = results
            .iter()
            .map(|(_, p)| decode_row(&desc, p).unwrap())
            .collect();
        assert!(rows.contains(&vec![
            Some(Value::Int(3)),
            Some(Value::Varchar("new".into()))
        ]));
        assert!(!rows.contains(&vec![
            Some(Value::Int(3)),
            Some(Value::Varchar("old".into()))
        ]));
    }

    #[test]
    fn test_scan_null_condition_attribute_never_matches() {
        let (_dir, rm) = fixture();
        let desc = descriptor();
        let record = encode_row(&desc, &[None, Some(Value::Varchar("anon".into()))]).unwrap();
        rm.insert(&record).unwrap();
        insert_row(&rm, &desc, 5, "named");

        // id NE 0 would match any non-null id; the null row is skipped.
        let filter = ScanFilter::new("id", CompareOp::Ne, Value::Int(0));
        let scan = Scan::new(&rm, &desc, Some(filter), &["name"]).unwrap();
        assert_eq!(collect(scan).len(), 1);
    }

    #[test]
    fn test_scan_varchar_condition() {
        let (_dir, rm) = fixture();
        let desc = descriptor();
        insert_row(&rm, &desc, 1, "bob");
        insert_row(&rm, &desc, 2, "carl");
        insert_row(&rm, &desc, 3, "dana");

        let filter = ScanFilter::new("name", CompareOp::Lt, Value::Varchar("carl".into()));
        let scan = Scan::new(&rm, &desc, Some(filter), &["name"]).unwrap();
        assert_eq!(collect(scan).len(), 1);
    }

    #[test]
    fn test_scan_unknown_names_rejected() {
        let (_dir, rm) = fixture();
        let desc = descriptor();

        assert!(matches!(
            Scan::new(&rm, &desc, None, &["nope"]),
            Err(StorageError::UnknownAttribute(_))
        ));

        let filter = ScanFilter::new("nope", CompareOp::Eq, Value::Int(1));
        assert!(matches!(
            Scan::new(&rm, &desc, Some(filter), &["id"]),
            Err(StorageError::UnknownAttribute(_))
        ));

        // Threshold type must match the condition attribute.
        let filter = ScanFilter::new("id", CompareOp::Eq, Value::Varchar("1".into()));
        assert!(matches!(
            Scan::new(&rm, &desc, Some(filter), &["id"]),
            Err(StorageError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_scan_is_restartable() {
        let (_dir, rm) = fixture();
        let desc = descriptor();
        insert_row(&rm, &desc, 1, "a");
        insert_row(&rm, &desc, 2, "b");

        let first = collect(Scan::new(&rm, &desc, None, &["id"]).unwrap());
        let second = collect(Scan::new(&rm, &desc, None, &["id"]).unwrap());
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }
}
