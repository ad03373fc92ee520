//! # Storage Layer
//!
//! Fixed-size-page file storage for the ISAM store. The data file is a
//! flat sequence of pages addressed `0..N-1`; a page's byte offset is
//! `page_no * page_size`, so random access is O(1) with a single seek.
//!
//! ## Page Layout
//!
//! ```text
//! Offset  Size            Field      Description
//! ------  --------------  ---------  --------------------------------
//! 0       4               count      live record slots (int32 LE)
//! 4       4               next_page  chain successor, -1 = none
//! 8       count * 67      records    sorted ascending by id
//! ...     zero padding up to block_factor slots
//! ```
//!
//! The page size is a pure function of the block factor:
//! `page_size = 8 + block_factor * RECORD_SIZE`. It is fixed at store
//! creation and must match on every subsequent open.
//!
//! ## Chain Membership
//!
//! Nothing in a page marks it primary or overflow; membership is purely
//! reachability. A page referenced by some other page's `next_page` is an
//! overflow page, everything else is a chain head (primary). The sparse
//! index layer relies on this when rebuilding from the data file alone.
//!
//! ## Module Organization
//!
//! - `page`: page header (zerocopy) and the page codec
//! - `pager`: seek-addressed read/write/append over the data file
//!
//! ## Thread Safety
//!
//! `Pager` takes `&mut self` for every operation; the single-writer
//! contract is enforced by the borrow checker rather than locks.

mod page;
mod pager;

pub use page::{Page, PageHeader, NO_NEXT_PAGE, PAGE_HEADER_SIZE};
pub use pager::Pager;

use crate::record::RECORD_SIZE;

/// Encoded byte size of a page holding `block_factor` record slots.
pub fn page_size(block_factor: usize) -> usize {
    PAGE_HEADER_SIZE + block_factor * RECORD_SIZE
}
