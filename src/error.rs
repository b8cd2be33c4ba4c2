//! Crate-wide error type.
//!
//! Mirrors `cryo`'s layered `StorageError`: one `thiserror` enum at the
//! boundary, with I/O failures wrapped via `#[from]` so `?` composes across the
//! pager, DAL, transaction and collection layers without any manual conversions.

use std::io;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("collection '{0}' not found")]
    NotFound(String),

    #[error("collection '{0}' already exists")]
    AlreadyExists(String),

    #[error("mutating operation attempted on a read-only transaction")]
    WriteTxRequired,

    #[error("corrupt meta page: {0}")]
    CorruptMeta(String),

    #[error("item too large: {0} bytes (max 255)")]
    ItemTooLarge(usize),

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("database lock poisoned by a panicked transaction")]
    Poisoned,
}
