//! # Sparse Index
//!
//! A sorted array of `(min_key, page_no)` pairs, one per primary page.
//! The index answers one question: which chain head is responsible for a
//! key? The rule is "largest `min_key <= key`", with keys below every
//! entry falling back to the first entry (there is always at least one
//! primary page once the store is non-empty).
//!
//! ## On-Disk Format
//!
//! ```text
//! (int32 min_key | int32 page_no) repeated, little-endian,
//! sorted ascending by min_key, no file header
//! ```
//!
//! The entry count is implicit: `file_len / 8`. The index is small
//! relative to the data, so structural changes rewrite the whole file.
//!
//! ## Invariants
//!
//! - `min_key` values are strictly increasing by position.
//! - No two entries share a `page_no`.
//! - Overflow pages are never indexed; splitting a chain does not change
//!   which primary page owns a key range.
//!
//! ## Rebuild by Reachability
//!
//! The binary page format carries no primary/overflow flag, but chain
//! pointers recover the distinction: any page referenced by some page's
//! `next_page` is an overflow page, every other non-empty page is a chain
//! head. [`SparseIndex::build`] runs that two-pass scan, an O(pages) cost
//! accepted for full rebuilds.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;
use zerocopy::little_endian::I32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::{Result, StoreError};
use crate::storage::{Pager, NO_NEXT_PAGE};

/// Encoded size of one index entry.
pub const INDEX_ENTRY_SIZE: usize = 8;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct IndexEntry {
    min_key: I32,
    page_no: I32,
}

impl IndexEntry {
    pub fn new(min_key: i32, page_no: u32) -> Self {
        Self {
            min_key: I32::new(min_key),
            page_no: I32::new(page_no as i32),
        }
    }

    /// Smallest key the primary page held at index-maintenance time.
    pub fn min_key(&self) -> i32 {
        self.min_key.get()
    }

    pub fn page_no(&self) -> u32 {
        self.page_no.get() as u32
    }
}

/// In-memory sparse index, owned by one engine instance for a session.
#[derive(Debug)]
pub struct SparseIndex {
    path: PathBuf,
    entries: Vec<IndexEntry>,
}

impl SparseIndex {
    /// Loads the whole persisted index; a missing file yields an empty
    /// index (the store has simply never been indexed yet).
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        if bytes.len() % INDEX_ENTRY_SIZE != 0 {
            return Err(StoreError::CorruptFile {
                path: path.to_path_buf(),
                reason: format!(
                    "index length {} is not a multiple of entry size {}",
                    bytes.len(),
                    INDEX_ENTRY_SIZE
                ),
            });
        }

        let entries = <[IndexEntry]>::ref_from_bytes(&bytes)
            .map_err(|e| StoreError::CorruptFile {
                path: path.to_path_buf(),
                reason: format!("index entries unreadable: {:?}", e),
            })?
            .to_vec();

        let index = Self {
            path: path.to_path_buf(),
            entries,
        };
        index.check_invariants()?;
        Ok(index)
    }

    /// Rewrites the whole index file from the in-memory entries.
    pub fn persist(&self) -> Result<()> {
        fs::write(&self.path, self.entries.as_slice().as_bytes())?;
        Ok(())
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Binary search for the primary page owning `key`: the entry with the
    /// largest `min_key <= key`, or the first entry when `key` precedes
    /// every known minimum. `None` only for an empty index.
    pub fn find_owning_page(&self, key: i32) -> Option<u32> {
        if self.entries.is_empty() {
            return None;
        }

        let upper = self.entries.partition_point(|e| e.min_key() <= key);
        let entry = if upper == 0 {
            // before the beginning: route to the first chain
            &self.entries[0]
        } else {
            &self.entries[upper - 1]
        };
        Some(entry.page_no())
    }

    /// Inserts a new primary-page entry at its sorted position.
    pub fn insert_entry(&mut self, min_key: i32, page_no: u32) -> Result<()> {
        if self.entries.iter().any(|e| e.page_no() == page_no) {
            return Err(StoreError::CorruptFile {
                path: self.path.clone(),
                reason: format!("page {} is already indexed", page_no),
            });
        }

        match self
            .entries
            .binary_search_by_key(&min_key, |e| e.min_key())
        {
            Ok(_) => Err(StoreError::CorruptFile {
                path: self.path.clone(),
                reason: format!("min key {} is already indexed", min_key),
            }),
            Err(pos) => {
                self.entries.insert(pos, IndexEntry::new(min_key, page_no));
                Ok(())
            }
        }
    }

    /// Lowers the first entry's `min_key` after an insert that routed
    /// through the before-the-beginning fallback. Lowering the first entry
    /// can never break the strict ordering of minimums.
    pub fn lower_first_min_key(&mut self, key: i32) {
        if let Some(first) = self.entries.first_mut() {
            if key < first.min_key() {
                *first = IndexEntry::new(key, first.page_no());
            }
        }
    }

    pub fn first_min_key(&self) -> Option<i32> {
        self.entries.first().map(|e| e.min_key())
    }

    /// Indexed page numbers in increasing page-number order (scan order).
    pub fn primary_page_numbers(&self) -> Vec<u32> {
        let mut pages: Vec<u32> = self.entries.iter().map(|e| e.page_no()).collect();
        pages.sort_unstable();
        pages
    }

    /// Full rebuild from the data file, classifying pages by reachability:
    /// pages referenced by a `next_page` pointer are overflow, every other
    /// non-empty page is a chain head and gets an entry for its first key.
    pub fn build(&mut self, pager: &mut Pager) -> Result<()> {
        let page_count = pager.page_count()?;

        let mut heads: Vec<(u32, Option<i32>)> = Vec::with_capacity(page_count as usize);
        let mut referenced: HashSet<u32> = HashSet::new();

        for page_no in 0..page_count {
            let page = pager.read_page(page_no)?;
            if page.next_page() != NO_NEXT_PAGE {
                referenced.insert(page.next_page() as u32);
            }
            heads.push((page_no, page.min_key()));
        }

        let mut entries = Vec::new();
        for (page_no, min_key) in heads {
            if referenced.contains(&page_no) {
                continue;
            }
            if let Some(min_key) = min_key {
                entries.push(IndexEntry::new(min_key, page_no));
            }
        }
        entries.sort_by_key(|e| e.min_key());

        self.entries = entries;
        self.check_invariants()?;

        debug!(
            pages = page_count,
            primaries = self.entries.len(),
            "rebuilt sparse index from data file"
        );
        Ok(())
    }

    fn check_invariants(&self) -> Result<()> {
        for pair in self.entries.windows(2) {
            if pair[0].min_key() >= pair[1].min_key() {
                return Err(StoreError::CorruptFile {
                    path: self.path.clone(),
                    reason: format!(
                        "index minimums not strictly increasing: {} then {}",
                        pair[0].min_key(),
                        pair[1].min_key()
                    ),
                });
            }
        }

        let mut seen = HashSet::new();
        for entry in &self.entries {
            if !seen.insert(entry.page_no()) {
                return Err(StoreError::CorruptFile {
                    path: self.path.clone(),
                    reason: format!("page {} indexed twice", entry.page_no()),
                });
            }
        }
        Ok(())
    }
}
