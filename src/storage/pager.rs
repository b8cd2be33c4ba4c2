//! Disk-backed page management layer.
//!
//! The `pager` module defines the [`Pager`] struct, responsible for the lowest
//! level of the storage engine: turning a [`PageNum`] into exactly `page_size`
//! bytes read from or written to the underlying file.
//!
//! # Responsibilities
//!
//! - Opening (or creating) the backing file.
//! - Reading and writing whole, aligned pages via positioned I/O.
//!
//! # Design Notes
//!
//! Unlike an in-memory page cache, the pager performs direct positioned reads
//! and writes (`pread`/`pwrite` semantics via [`std::os::unix::fs::FileExt`]).
//! There is no shared file cursor, so concurrent readers never race each other
//! or the writer over seek state — each read is a self-contained positioned
//! read. This is what lets [`crate::Db::read_tx`] hand out multiple live read
//! transactions from different threads without any page-level locking.
//!
//! # See Also
//! - [`super::page`]: the raw, uninterpreted page buffer this module moves around.
//! - [`super::dal`]: composes the pager with the freelist and meta page.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::Path;

use log::trace;

use super::page::{Page, PageNum};
use crate::error::Result;

#[derive(Debug)]
pub struct Pager {
    file: File,
    page_size: usize,
}

impl Pager {
    /// Opens (creating if necessary) the backing file for positioned page I/O.
    pub fn open(path: &Path, page_size: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;

        Ok(Self { file, page_size })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Returns the current file length in bytes, used by the DAL to decide
    /// whether it is opening a fresh or an existing database file.
    pub fn file_len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Reads exactly `page_size` bytes at `page_num * page_size`.
    pub fn read_page(&self, page_num: PageNum) -> Result<Page> {
        let mut buf = vec![0u8; self.page_size];
        let offset = page_num * self.page_size as u64;
        trace!("reading page {page_num} at offset {offset}");
        self.file.read_exact_at(&mut buf, offset)?;
        Ok(buf)
    }

    /// Writes exactly `page_size` bytes at `page_num * page_size`.
    pub fn write_page(&self, page_num: PageNum, bytes: &[u8]) -> Result<()> {
        debug_assert_eq!(bytes.len(), self.page_size);
        let offset = page_num * self.page_size as u64;
        trace!("writing page {page_num} at offset {offset}");
        self.file.write_all_at(bytes, offset)?;
        Ok(())
    }

    /// Flushes the underlying file to stable storage.
    pub fn sync(&self) -> Result<()> {
        self.file.sync_data()?;
        Ok(())
    }
}
