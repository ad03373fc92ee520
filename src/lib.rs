//! # isamdb - Indexed Sequential Access Method Record Store
//!
//! A single-file, disk-resident record store built on ISAM: a static
//! sparse index over fixed-size primary data pages, with per-page
//! overflow chains absorbing the inserts that exceed page capacity.
//!
//! ## Quick Start
//!
//! ```ignore
//! use isamdb::{IsamStore, Record};
//!
//! let mut store = IsamStore::open(
//!     "data.dat".as_ref(),
//!     "index.dat".as_ref(),
//!     5, // block factor: records per page, fixed at creation
//! )?;
//!
//! store.insert(Record::new(1, "Voltage Stabilizer", 25, 192.26, "2024-10-21"))?;
//! let hit = store.search(1)?;
//! for record in store.scan_all() {
//!     println!("{:?}", record?);
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │        ISAM Engine (IsamStore)       │  insert / search / delete / scan
//! ├──────────────────┬──────────────────┤
//! │   Sparse Index   │    Page Codec    │  (min_key, page_no) / slotted pages
//! ├──────────────────┴──────────────────┤
//! │            Pager (data file)         │  read / write / append page N
//! ├─────────────────────────────────────┤
//! │          Record Codec (67 B)         │  fixed-width binary rows
//! └─────────────────────────────────────┘
//! ```
//!
//! Control flows downward only. The index holds one entry per primary
//! page; overflow pages are reachable solely through `next_page` links
//! and are never indexed, so page splits never reshape the index.
//!
//! ## File Layout
//!
//! Two flat files, both headerless with implicit counts:
//!
//! - data file: fixed-size pages back to back, `offset = page_no * page_size`
//! - index file: `(int32 min_key, int32 page_no)` pairs sorted by `min_key`
//!
//! ## Scope
//!
//! Single-writer, single-process, synchronous. No WAL, no transactions,
//! no secondary indexes, no chain compaction; failures surface as typed
//! [`StoreError`] values and are never retried internally.

pub mod engine;
pub mod error;
pub mod index;
pub mod record;
pub mod storage;

pub use engine::{IsamStore, Scan};
pub use error::{Result, StoreError};
pub use index::{IndexEntry, SparseIndex};
pub use record::{Record, DATE_WIDTH, NAME_WIDTH, RECORD_SIZE};
pub use storage::{Page, Pager, NO_NEXT_PAGE};
