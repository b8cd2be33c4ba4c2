//! Data Access Layer: composes the pager, freelist and meta page into the
//! single object the transaction layer talks to.
//!
//! The DAL is the one place that knows how a [`Node`] maps to a page number,
//! how pages are allocated and released, and how the meta/freelist pages are
//! kept in sync with that bookkeeping. Everything above this layer ([`super::tx::Tx`],
//! [`crate::collection::Collection`], [`crate::tree`]) only ever calls
//! `get_node`/`write_node`/`delete_node` and never touches a [`Pager`] directly.
//!
//! # See Also
//! - [`super::pager::Pager`]: raw page I/O.
//! - [`super::freelist::Freelist`], [`super::meta::Meta`]: the two small
//!   structures persisted alongside the tree data.

use std::path::Path;
use std::sync::Mutex;

use log::debug;

use super::freelist::Freelist;
use super::meta::Meta;
use super::node::Node;
use super::page::{PageNum, META_PAGE_NUM};
use super::pager::Pager;
use crate::error::Result;

/// Page 1 always holds the freelist; page 2 always holds the freshly
/// initialized root-of-roots leaf. Only meaningful on a brand-new file — an
/// existing file's layout is whatever its meta page says it is.
const FRESH_FREELIST_PAGE: PageNum = 1;
const FRESH_ROOT_OF_ROOTS_PAGE: PageNum = 2;

#[derive(Debug)]
pub struct Dal {
    pager: Pager,
    page_size: usize,
    min_fill_percent: f64,
    max_fill_percent: f64,
    freelist: Mutex<Freelist>,
    meta: Mutex<Meta>,
}

impl Dal {
    pub fn open(
        path: &Path,
        page_size: usize,
        min_fill_percent: f64,
        max_fill_percent: f64,
    ) -> Result<Self> {
        let pager = Pager::open(path, page_size)?;

        let (freelist, meta) = if pager.file_len()? == 0 {
            debug!("initializing fresh database at {}", path.display());
            let meta = Meta::new(FRESH_ROOT_OF_ROOTS_PAGE, FRESH_FREELIST_PAGE);
            let mut freelist = Freelist::new();
            // Reserve pages 0 (meta), 1 (freelist) and 2 (root-of-roots) up front
            // so the first real allocation starts at page 3.
            freelist.max_page = FRESH_ROOT_OF_ROOTS_PAGE;

            let root_of_roots = Node::new(vec![], vec![]);
            pager.write_page(FRESH_ROOT_OF_ROOTS_PAGE, &root_of_roots.serialize(page_size))?;
            pager.write_page(FRESH_FREELIST_PAGE, &freelist.serialize(page_size))?;
            pager.write_page(META_PAGE_NUM, &meta.serialize(page_size))?;

            (freelist, meta)
        } else {
            debug!("opening existing database at {}", path.display());
            let meta = Meta::deserialize(&pager.read_page(META_PAGE_NUM)?)?;
            let freelist = Freelist::deserialize(&pager.read_page(meta.freelist_page)?);
            (freelist, meta)
        };

        Ok(Self {
            pager,
            page_size,
            min_fill_percent,
            max_fill_percent,
            freelist: Mutex::new(freelist),
            meta: Mutex::new(meta),
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn min_fill_percent(&self) -> f64 {
        self.min_fill_percent
    }

    pub fn max_fill_percent(&self) -> f64 {
        self.max_fill_percent
    }

    pub fn root_of_roots(&self) -> PageNum {
        self.meta.lock().unwrap().root_of_roots
    }

    /// Reads and decodes the node at `page_num`, attaching its page number.
    pub fn get_node(&self, page_num: PageNum) -> Result<Node> {
        let mut node = Node::deserialize(&self.pager.read_page(page_num)?)?;
        node.page_num = Some(page_num);
        Ok(node)
    }

    /// Persists `node`, allocating a fresh page number if it doesn't have one yet.
    pub fn write_node(&self, mut node: Node) -> Result<Node> {
        let page_num = match node.page_num {
            Some(n) => n,
            None => {
                let n = self.freelist.lock().unwrap().get_next_page();
                node.page_num = Some(n);
                n
            }
        };

        self.pager.write_page(page_num, &node.serialize(self.page_size))?;
        Ok(node)
    }

    /// Releases `page_num` back to the freelist pool.
    pub fn delete_node(&self, page_num: PageNum) {
        self.freelist.lock().unwrap().release_page(page_num);
    }

    /// Reserves a fresh page number without writing anything to it yet. Used
    /// by [`super::tx::Tx::new_node`] to number a node the moment it's
    /// created, before it's staged as dirty.
    pub fn allocate_page(&self) -> PageNum {
        self.freelist.lock().unwrap().get_next_page()
    }

    /// Flushes the underlying file to stable storage without touching meta
    /// or the freelist page.
    pub fn sync(&self) -> Result<()> {
        self.pager.sync()
    }

    pub fn write_meta(&self, root_of_roots: PageNum) -> Result<()> {
        let freelist_page = self.meta.lock().unwrap().freelist_page;
        let meta = Meta::new(root_of_roots, freelist_page);
        self.pager.write_page(META_PAGE_NUM, &meta.serialize(self.page_size))?;
        *self.meta.lock().unwrap() = meta;
        Ok(())
    }

    /// Rewrites the freelist page and returns its page number.
    pub fn write_freelist(&self) -> Result<PageNum> {
        let freelist_page = self.meta.lock().unwrap().freelist_page;
        let bytes = self.freelist.lock().unwrap().serialize(self.page_size);
        self.pager.write_page(freelist_page, &bytes)?;
        Ok(freelist_page)
    }

    /// Persists freelist and meta, then flushes to stable storage.
    pub fn close(&self) -> Result<()> {
        self.write_freelist()?;
        let root_of_roots = self.root_of_roots();
        self.write_meta(root_of_roots)?;
        self.pager.sync()
    }
}
