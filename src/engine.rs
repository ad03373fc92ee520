//! # ISAM Engine
//!
//! Orchestrates the sparse index, pager and page codec into the four
//! store operations: insert, search, delete and scan.
//!
//! ## Insert Protocol
//!
//! ```text
//! locate chain head via index
//!   └─ walk next_page links to the terminal page,
//!      checking every visited page for the key (DuplicateKey aborts)
//!        └─ sorted insert into the terminal page
//!             ├─ fits: rewrite that page in place
//!             └─ overfull: split at ceil(count/2); low half stays,
//!                high half is appended and spliced into the chain
//! ```
//!
//! A split never touches the index: the low half keeps the page's minimum
//! key, so the primary page still owns the same key range. Structural
//! growth is absorbed entirely by the overflow chain; the only inserts
//! that change the index are the very first record (creating page 0) and
//! a key below every known minimum (which lowers the first entry).
//!
//! ## Degradation
//!
//! Search costs O(log P) for the index probe plus a chain walk. Chains
//! lengthen without bound as a key range keeps growing; there is no
//! rebalancing or compaction. That trade is the point of ISAM: a static
//! index and cheap inserts, paid for with degrading chains.
//!
//! ## Ownership
//!
//! The engine owns its pager and index outright; every operation takes
//! `&mut self`, making the single-writer, single-process contract a
//! compile-time property instead of a lock.

use std::path::Path;

use tracing::debug;

use crate::error::{Result, StoreError};
use crate::index::SparseIndex;
use crate::record::Record;
use crate::storage::{Page, Pager, NO_NEXT_PAGE};

#[derive(Debug)]
pub struct IsamStore {
    pager: Pager,
    index: SparseIndex,
    block_factor: usize,
}

impl IsamStore {
    /// Opens (creating if absent) a store over `data_path` + `index_path`.
    ///
    /// `block_factor` is fixed at store creation; opening an existing file
    /// with a different value is a [`StoreError::FormatMismatch`]. If the
    /// data file is non-empty but the index is absent or empty, the index
    /// is rebuilt from the data file before the store is usable.
    pub fn open(data_path: &Path, index_path: &Path, block_factor: usize) -> Result<Self> {
        if block_factor == 0 {
            return Err(StoreError::FormatMismatch {
                path: data_path.to_path_buf(),
                reason: "block factor must be at least 1".to_string(),
            });
        }

        let mut pager = Pager::open(data_path, block_factor)?;
        let mut index = SparseIndex::load(index_path)?;

        let page_count = pager.page_count()?;
        if page_count > 0 {
            // a block-factor change can leave the file length a coincidental
            // multiple of the new page size; the page-0 header gives it away
            match pager.read_page(0) {
                Ok(_) => {}
                Err(StoreError::CorruptPage { reason }) => {
                    return Err(StoreError::FormatMismatch {
                        path: data_path.to_path_buf(),
                        reason,
                    })
                }
                Err(e) => return Err(e),
            }

            if index.is_empty() {
                index.build(&mut pager)?;
                index.persist()?;
            }
        }

        Ok(Self {
            pager,
            index,
            block_factor,
        })
    }

    pub fn block_factor(&self) -> usize {
        self.block_factor
    }

    /// Inserts a record; `id` must be unique across the whole store.
    pub fn insert(&mut self, record: Record) -> Result<()> {
        let id = record.id;

        if self.pager.page_count()? == 0 {
            let page_no = self
                .pager
                .append_page(&Page::new(vec![record], NO_NEXT_PAGE))?;
            self.index.insert_entry(id, page_no)?;
            self.index.persist()?;
            debug!(id, page_no, "created initial primary page");
            return Ok(());
        }

        let Some(primary) = self.index.find_owning_page(id) else {
            return Err(StoreError::CorruptFile {
                path: self.pager.path().to_path_buf(),
                reason: "sparse index is empty for a non-empty store".to_string(),
            });
        };

        // walk to the terminal page, checking the whole chain for the key
        let mut page_no = primary;
        let mut page = self.pager.read_page(page_no)?;
        loop {
            if page.get(id).is_some() {
                return Err(StoreError::DuplicateKey { id });
            }
            if page.next_page() == NO_NEXT_PAGE {
                break;
            }
            page_no = page.next_page() as u32;
            page = self.pager.read_page(page_no)?;
        }

        let below_min = self.index.first_min_key().is_some_and(|min| id < min);

        page.insert_sorted(record);
        if page.len() <= self.block_factor {
            self.pager.write_page(page_no, &page)?;
        } else {
            let high = page.split_upper_half();
            let new_page_no = self.pager.append_page(&high)?;
            page.set_next_page(new_page_no as i32);
            self.pager.write_page(page_no, &page)?;
            debug!(
                page_no,
                new_page_no,
                low = page.len(),
                high = high.len(),
                "split overfull page into overflow chain"
            );
        }

        if below_min {
            // the insert routed through the before-the-beginning fallback;
            // keep the first entry an exact lower bound for its chain
            self.index.lower_first_min_key(id);
            self.index.persist()?;
        }

        Ok(())
    }

    /// Looks up a record by id: one index probe, then a chain walk with an
    /// in-page binary search per page.
    pub fn search(&mut self, id: i32) -> Result<Option<Record>> {
        if self.pager.page_count()? == 0 {
            return Ok(None);
        }
        let Some(mut page_no) = self.index.find_owning_page(id) else {
            return Ok(None);
        };

        loop {
            let page = self.pager.read_page(page_no)?;
            if let Some(record) = page.get(id) {
                return Ok(Some(record.clone()));
            }
            if page.next_page() == NO_NEXT_PAGE {
                return Ok(None);
            }
            page_no = page.next_page() as u32;
        }
    }

    /// Removes the record with the given id; returns whether it existed.
    ///
    /// Removing a primary page's minimum key does not rewrite the index:
    /// the entry becomes a conservative lower bound that still routes
    /// correctly. An overflow page emptied by deletes stays in its chain
    /// (chain compaction is out of scope).
    pub fn delete(&mut self, id: i32) -> Result<bool> {
        if self.pager.page_count()? == 0 {
            return Ok(false);
        }
        let Some(mut page_no) = self.index.find_owning_page(id) else {
            return Ok(false);
        };

        loop {
            let mut page = self.pager.read_page(page_no)?;
            if page.remove(id).is_some() {
                self.pager.write_page(page_no, &page)?;
                return Ok(true);
            }
            if page.next_page() == NO_NEXT_PAGE {
                return Ok(false);
            }
            page_no = page.next_page() as u32;
        }
    }

    /// Lazy forward-only scan: primary pages in increasing page-number
    /// order, each overflow chain followed to exhaustion before the next
    /// primary. Yields every record exactly once; global key order is not
    /// guaranteed across chains.
    pub fn scan_all(&mut self) -> Scan<'_> {
        Scan {
            pager: &mut self.pager,
            primaries: self.index.primary_page_numbers().into_iter(),
            current: None,
        }
    }

    /// Explicit full index rebuild from the data file, then persist.
    /// O(pages); the accepted cost of re-deriving the index after ad hoc
    /// structural changes.
    pub fn rebuild_index(&mut self) -> Result<()> {
        self.index.build(&mut self.pager)?;
        self.index.persist()
    }

    /// Flushes the data file to disk.
    pub fn sync(&mut self) -> Result<()> {
        self.pager.sync()
    }
}

/// Iterator state for [`IsamStore::scan_all`].
pub struct Scan<'a> {
    pager: &'a mut Pager,
    primaries: std::vec::IntoIter<u32>,
    current: Option<(Page, usize)>,
}

impl Iterator for Scan<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((page, cursor)) = &mut self.current {
                if *cursor < page.len() {
                    let record = page.records()[*cursor].clone();
                    *cursor += 1;
                    return Some(Ok(record));
                }

                let next = page.next_page();
                self.current = None;
                if next != NO_NEXT_PAGE {
                    match self.pager.read_page(next as u32) {
                        Ok(page) => self.current = Some((page, 0)),
                        Err(e) => return Some(Err(e)),
                    }
                }
                continue;
            }

            let page_no = self.primaries.next()?;
            match self.pager.read_page(page_no) {
                Ok(page) => self.current = Some((page, 0)),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn rec(id: i32) -> Record {
        Record::new(id, format!("item-{id}"), id, id as f32, "2024-01-01")
    }

    fn open_store(dir: &Path, block_factor: usize) -> IsamStore {
        IsamStore::open(
            &dir.join("data.dat"),
            &dir.join("index.dat"),
            block_factor,
        )
        .unwrap()
    }

    #[test]
    fn zero_block_factor_is_rejected() {
        let dir = tempdir().unwrap();
        let err = IsamStore::open(
            &dir.path().join("data.dat"),
            &dir.path().join("index.dat"),
            0,
        )
        .unwrap_err();

        assert!(matches!(err, StoreError::FormatMismatch { .. }));
    }

    #[test]
    fn search_on_empty_store_finds_nothing() {
        let dir = tempdir().unwrap();
        let mut store = open_store(dir.path(), 3);

        assert_eq!(store.search(1).unwrap(), None);
        assert!(!store.delete(1).unwrap());
        assert_eq!(store.scan_all().count(), 0);
    }

    #[test]
    fn first_insert_creates_the_sole_primary_page() {
        let dir = tempdir().unwrap();
        let mut store = open_store(dir.path(), 3);

        store.insert(rec(42)).unwrap();

        assert_eq!(store.search(42).unwrap().map(|r| r.id), Some(42));
        assert_eq!(store.search(41).unwrap(), None);
    }

    #[test]
    fn duplicate_insert_is_rejected_anywhere_in_the_chain() {
        let dir = tempdir().unwrap();
        let mut store = open_store(dir.path(), 2);

        // force a chain: 1,2 | 3,4 split into multiple pages
        for id in [1, 2, 3, 4, 5] {
            store.insert(rec(id)).unwrap();
        }

        // key 2 lives in an early chain page, not the terminal one
        let err = store.insert(rec(2)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { id: 2 }));
    }

    #[test]
    fn delete_then_reinsert_same_key() {
        let dir = tempdir().unwrap();
        let mut store = open_store(dir.path(), 3);

        store.insert(rec(5)).unwrap();
        assert!(store.delete(5).unwrap());
        assert_eq!(store.search(5).unwrap(), None);

        store.insert(rec(5)).unwrap();
        assert_eq!(store.search(5).unwrap().map(|r| r.id), Some(5));
    }
}
