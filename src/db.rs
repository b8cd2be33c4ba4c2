//! Top-level handle: open options and the read/write transaction boundary.
//!
//! [`Db`] owns the single [`Dal`] for a database file plus the
//! [`RwLock`] that enforces single-writer/multi-reader access. Any number of
//! [`Tx::writable`]`() == false` transactions may be outstanding at once;
//! at most one writable transaction may be outstanding, and it excludes all
//! readers while open. This is the same model as the original's
//! `db.go`, which guards every transaction with a `sync.RWMutex`.

use std::path::Path;
use std::sync::RwLock;

use log::info;

use crate::error::{Error, Result};
use crate::storage::dal::Dal;
use crate::storage::page::MIN_PAGE_SIZE;
use crate::tx::{Tx, TxGuard};

/// Tuning knobs for a database file. Defaults mirror the original's
/// `DefaultOptions`: a page sized to the host's memory page, and fill
/// thresholds of 50%/95%.
#[derive(Debug, Clone)]
pub struct Options {
    /// Page size in bytes. `None` auto-detects the host's page size.
    pub page_size: Option<usize>,
    /// A node under this fraction of a full page triggers a rebalance.
    pub min_fill_percent: f64,
    /// A node over this fraction of a full page triggers a split.
    pub max_fill_percent: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            page_size: None,
            min_fill_percent: 0.5,
            max_fill_percent: 0.95,
        }
    }
}

impl Options {
    fn validate(&self, page_size: usize) -> Result<()> {
        if page_size < MIN_PAGE_SIZE {
            return Err(Error::InvalidOptions(format!(
                "page_size must be at least {MIN_PAGE_SIZE} bytes, got {page_size}"
            )));
        }
        if self.min_fill_percent <= 0.0 || !(0.0..=1.0).contains(&self.min_fill_percent) {
            return Err(Error::InvalidOptions(format!(
                "min_fill_percent must be in (0, 1], got {}",
                self.min_fill_percent
            )));
        }
        if self.max_fill_percent <= 0.0 || !(0.0..=1.0).contains(&self.max_fill_percent) {
            return Err(Error::InvalidOptions(format!(
                "max_fill_percent must be in (0, 1], got {}",
                self.max_fill_percent
            )));
        }
        if self.min_fill_percent >= self.max_fill_percent {
            return Err(Error::InvalidOptions(format!(
                "min_fill_percent ({}) must be less than max_fill_percent ({})",
                self.min_fill_percent, self.max_fill_percent
            )));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct Db {
    dal: Dal,
    lock: RwLock<()>,
}

impl Db {
    /// Opens (creating if necessary) the database file at `path`.
    pub fn open(path: &Path, options: Options) -> Result<Self> {
        let page_size = options.page_size.unwrap_or_else(page_size::get);
        options.validate(page_size)?;

        info!(
            "opening database at {} (page_size={page_size}, min_fill={}, max_fill={})",
            path.display(),
            options.min_fill_percent,
            options.max_fill_percent
        );

        let dal = Dal::open(path, page_size, options.min_fill_percent, options.max_fill_percent)?;
        Ok(Self {
            dal,
            lock: RwLock::new(()),
        })
    }

    /// Opens a read-only transaction. Any number of these may be live at once,
    /// concurrently with each other, but not alongside a write transaction.
    pub fn read_tx(&self) -> Result<Tx<'_>> {
        let guard = self.lock.read().map_err(|_| Error::Poisoned)?;
        Ok(Tx::new(&self.dal, TxGuard::Read(guard), false))
    }

    /// Opens the single writable transaction. Blocks until any outstanding
    /// readers or writer release the lock.
    pub fn write_tx(&self) -> Result<Tx<'_>> {
        let guard = self.lock.write().map_err(|_| Error::Poisoned)?;
        Ok(Tx::new(&self.dal, TxGuard::Write(guard), true))
    }

    /// Flushes and closes the database file.
    pub fn close(self) -> Result<()> {
        self.dal.close()
    }
}
