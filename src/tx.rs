//! Transactions: the single entry point through which callers read and
//! write collections.
//!
//! A [`Tx`] borrows the [`Db`](crate::db::Db) for its whole lifetime and holds
//! the guard that enforces the single-writer/multi-reader model described in
//! [`crate::db`]. Every node a write transaction creates or modifies is kept
//! in an in-memory `dirty_nodes` map and only reaches disk on [`Tx::commit`];
//! [`Tx::rollback`] (or simply dropping the transaction) discards them
//! instead.
//!
//! Node mutation itself — find/insert-split/delete-rebalance — lives in
//! [`crate::tree`] as free functions that take `&mut Tx`, not as methods on
//! `Node`: a node has no business knowing which transaction it belongs to.

use std::collections::HashMap;
use std::sync::{RwLockReadGuard, RwLockWriteGuard};

use log::trace;

use crate::error::{Error, Result};
use crate::storage::dal::Dal;
use crate::storage::node::Node;
use crate::storage::page::PageNum;

pub(crate) enum TxGuard<'db> {
    Read(RwLockReadGuard<'db, ()>),
    Write(RwLockWriteGuard<'db, ()>),
}

pub struct Tx<'db> {
    pub(crate) dal: &'db Dal,
    #[allow(dead_code)]
    guard: TxGuard<'db>,
    writable: bool,
    dirty_nodes: HashMap<PageNum, Node>,
    pages_to_delete: Vec<PageNum>,
    root_of_roots: PageNum,
    finished: bool,
}

impl<'db> Tx<'db> {
    pub(crate) fn new(dal: &'db Dal, guard: TxGuard<'db>, writable: bool) -> Self {
        Self {
            dal,
            guard,
            writable,
            dirty_nodes: HashMap::new(),
            pages_to_delete: Vec::new(),
            root_of_roots: dal.root_of_roots(),
            finished: false,
        }
    }

    pub fn writable(&self) -> bool {
        self.writable
    }

    pub fn page_size(&self) -> usize {
        self.dal.page_size()
    }

    pub fn min_fill_percent(&self) -> f64 {
        self.dal.min_fill_percent()
    }

    pub fn max_fill_percent(&self) -> f64 {
        self.dal.max_fill_percent()
    }

    pub fn root_of_roots(&self) -> PageNum {
        self.root_of_roots
    }

    pub fn set_root_of_roots(&mut self, page_num: PageNum) {
        self.root_of_roots = page_num;
    }

    fn require_writable(&self) -> Result<()> {
        if self.writable {
            Ok(())
        } else {
            Err(Error::WriteTxRequired)
        }
    }

    /// Reads a node, checking the in-memory dirty set before falling through
    /// to disk. A write transaction must see its own uncommitted edits.
    pub fn get_node(&self, page_num: PageNum) -> Result<Node> {
        if let Some(node) = self.dirty_nodes.get(&page_num) {
            return Ok(node.clone());
        }
        self.dal.get_node(page_num)
    }

    /// Allocates a page number for a brand-new node and stages it as dirty.
    pub fn new_node(&mut self, mut node: Node) -> Result<Node> {
        self.require_writable()?;
        let page_num = self.dal.allocate_page();
        node.page_num = Some(page_num);
        self.dirty_nodes.insert(page_num, node.clone());
        Ok(node)
    }

    /// Stages an already-numbered node as dirty, to be flushed at commit.
    pub fn write_node(&mut self, node: Node) -> Result<Node> {
        self.require_writable()?;
        match node.page_num {
            Some(page_num) => {
                self.dirty_nodes.insert(page_num, node.clone());
                Ok(node)
            }
            None => self.new_node(node),
        }
    }

    /// Stages `node`'s page for release once the transaction commits.
    pub fn delete_node(&mut self, node: &Node) -> Result<()> {
        self.require_writable()?;
        if let Some(page_num) = node.page_num {
            self.dirty_nodes.remove(&page_num);
            self.pages_to_delete.push(page_num);
        }
        Ok(())
    }

    /// Flushes dirty nodes, releases deleted pages, and persists the
    /// (possibly moved) root-of-roots and freelist. No-op for a read
    /// transaction beyond releasing its lock on drop.
    pub fn commit(mut self) -> Result<()> {
        self.finished = true;
        if !self.writable {
            return Ok(());
        }

        trace!(
            "committing tx: {} dirty nodes, {} pages to delete",
            self.dirty_nodes.len(),
            self.pages_to_delete.len()
        );

        for node in self.dirty_nodes.drain().map(|(_, n)| n) {
            self.dal.write_node(node)?;
        }
        for page_num in self.pages_to_delete.drain(..) {
            self.dal.delete_node(page_num);
        }

        self.dal.write_freelist()?;
        self.dal.write_meta(self.root_of_roots)?;
        self.dal.sync()
    }

    /// Discards every staged edit. Equivalent to dropping the transaction,
    /// spelled out for callers that want to be explicit about intent.
    pub fn rollback(mut self) {
        self.finished = true;
        self.dirty_nodes.clear();
        self.pages_to_delete.clear();
    }
}

impl Drop for Tx<'_> {
    fn drop(&mut self) {
        if !self.finished && self.writable && !self.dirty_nodes.is_empty() {
            trace!("dropping uncommitted write transaction, discarding staged edits");
        }
    }
}
