//! # Error Taxonomy
//!
//! Every fallible operation in the crate returns [`Result<T>`] with a
//! [`StoreError`]. The variants split along how a caller should react:
//!
//! - [`StoreError::Io`]: filesystem failure, surfaced as-is and never
//!   retried internally.
//! - [`StoreError::CorruptFile`] / [`StoreError::CorruptPage`]: a structural
//!   invariant was violated while decoding. Fatal for the affected
//!   operation; nothing is auto-repaired.
//! - [`StoreError::DuplicateKey`]: an insert hit an existing id. This is a
//!   normal negative result the caller branches on, not a crash.
//! - [`StoreError::OutOfRange`]: a page address beyond the end of the data
//!   file. A programming-contract violation by the caller.
//! - [`StoreError::FormatMismatch`]: the configured block factor (or record
//!   width) does not match the file being opened. Detected at open time.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt file {path:?}: {reason}")]
    CorruptFile { path: PathBuf, reason: String },

    #[error("corrupt page: {reason}")]
    CorruptPage { reason: String },

    #[error("duplicate key {id}")]
    DuplicateKey { id: i32 },

    #[error("page {page_no} out of range (store has {page_count} pages)")]
    OutOfRange { page_no: u32, page_count: u32 },

    #[error("format mismatch on {path:?}: {reason}")]
    FormatMismatch { path: PathBuf, reason: String },
}
