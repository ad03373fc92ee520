//! # Page Header and Codec
//!
//! Every page begins with an 8-byte header (`count`, `next_page`) followed
//! by `block_factor` fixed-width record slots, of which only the first
//! `count` are live; the rest are zero-filled padding. Within a page the
//! live records are kept strictly increasing by id on every mutation.
//!
//! The header uses `zerocopy` little-endian wrappers so it can be read
//! straight off the page buffer without manual byte fiddling. Decoding
//! validates `0 <= count <= block_factor` before touching any slot, so a
//! corrupt count is reported as [`StoreError::CorruptPage`] rather than
//! read as data.

use zerocopy::little_endian::I32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::{Result, StoreError};
use crate::record::{Record, RECORD_SIZE};

/// Byte size of the page header: `count` + `next_page`.
pub const PAGE_HEADER_SIZE: usize = 8;

/// `next_page` sentinel meaning "no successor in this chain".
pub const NO_NEXT_PAGE: i32 = -1;

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct PageHeader {
    count: I32,
    next_page: I32,
}

impl PageHeader {
    pub fn new(count: i32, next_page: i32) -> Self {
        Self {
            count: I32::new(count),
            next_page: I32::new(next_page),
        }
    }

    pub fn count(&self) -> i32 {
        self.count.get()
    }

    pub fn next_page(&self) -> i32 {
        self.next_page.get()
    }
}

/// In-memory view of one page.
///
/// The record vector may transiently hold `block_factor + 1` entries while
/// the engine decides whether to split; an overfull page is never encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    records: Vec<Record>,
    next_page: i32,
}

impl Page {
    pub fn new(records: Vec<Record>, next_page: i32) -> Self {
        Self { records, next_page }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), NO_NEXT_PAGE)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn next_page(&self) -> i32 {
        self.next_page
    }

    pub fn set_next_page(&mut self, next_page: i32) {
        self.next_page = next_page;
    }

    /// Key of the smallest live record, `None` on an empty page.
    pub fn min_key(&self) -> Option<i32> {
        self.records.first().map(|r| r.id)
    }

    /// Returns the record with the given id, if this page holds it.
    pub fn get(&self, id: i32) -> Option<&Record> {
        self.records
            .binary_search_by_key(&id, |r| r.id)
            .ok()
            .map(|pos| &self.records[pos])
    }

    /// Inserts a record at its sorted position.
    ///
    /// The caller has already established the id is absent from the chain;
    /// ordering within the page stays strict.
    pub fn insert_sorted(&mut self, record: Record) {
        let pos = self
            .records
            .binary_search_by_key(&record.id, |r| r.id)
            .unwrap_or_else(|pos| pos);
        self.records.insert(pos, record);
    }

    /// Removes and returns the record with the given id, keeping the
    /// remaining records sorted and contiguous.
    pub fn remove(&mut self, id: i32) -> Option<Record> {
        let pos = self.records.binary_search_by_key(&id, |r| r.id).ok()?;
        Some(self.records.remove(pos))
    }

    /// Splits off the upper half of an overfull page.
    ///
    /// `ceil(count / 2)` records stay here as the low half, so the page's
    /// minimum key is unchanged. The returned high page inherits this
    /// page's `next_page`, keeping the chain linked; the caller appends it
    /// and re-points `next_page` here at the new page number.
    pub fn split_upper_half(&mut self) -> Page {
        let mid = self.records.len().div_ceil(2);
        let high = self.records.split_off(mid);
        Page::new(high, self.next_page)
    }

    /// Encodes the page into exactly `page_size(block_factor)` bytes.
    pub fn encode(&self, block_factor: usize) -> Result<Vec<u8>> {
        if self.records.len() > block_factor {
            return Err(StoreError::CorruptPage {
                reason: format!(
                    "cannot encode {} records into a page of capacity {}",
                    self.records.len(),
                    block_factor
                ),
            });
        }

        let mut buf = vec![0u8; super::page_size(block_factor)];
        let header = PageHeader::new(self.records.len() as i32, self.next_page);
        buf[..PAGE_HEADER_SIZE].copy_from_slice(header.as_bytes());

        for (slot, record) in self.records.iter().enumerate() {
            let start = PAGE_HEADER_SIZE + slot * RECORD_SIZE;
            buf[start..start + RECORD_SIZE].copy_from_slice(&record.encode());
        }

        Ok(buf)
    }

    /// Decodes a page from exactly `page_size(block_factor)` bytes.
    ///
    /// Only the first `count` slots are decoded; padding is never read as
    /// data. `page_no` is carried for error context only.
    pub fn decode(data: &[u8], block_factor: usize, page_no: u32) -> Result<Page> {
        let expected = super::page_size(block_factor);
        if data.len() != expected {
            return Err(StoreError::CorruptPage {
                reason: format!(
                    "page {} has {} bytes, expected {}",
                    page_no,
                    data.len(),
                    expected
                ),
            });
        }

        let header = PageHeader::ref_from_bytes(&data[..PAGE_HEADER_SIZE]).map_err(|e| {
            StoreError::CorruptPage {
                reason: format!("page {} header unreadable: {:?}", page_no, e),
            }
        })?;

        let count = header.count();
        if count < 0 || count as usize > block_factor {
            return Err(StoreError::CorruptPage {
                reason: format!(
                    "page {} claims {} records, capacity is {}",
                    page_no, count, block_factor
                ),
            });
        }

        let mut records = Vec::with_capacity(count as usize);
        for slot in 0..count as usize {
            let start = PAGE_HEADER_SIZE + slot * RECORD_SIZE;
            let bytes: &[u8; RECORD_SIZE] =
                data[start..start + RECORD_SIZE].try_into().unwrap();
            records.push(Record::decode(bytes));
        }

        Ok(Page::new(records, header.next_page()))
    }
}
