//! Named collections: independent B-trees addressed by name through a
//! root-of-roots catalog tree.
//!
//! The root-of-roots is itself an ordinary tree managed by [`crate::storage::tree`],
//! whose keys are collection names and whose values are encoded
//! [`CollectionMeta`] records (the collection's own root page number). Opening
//! a collection means looking up its name in the root-of-roots; every write
//! that changes a collection's root (the first insert, a split, a root
//! collapse) re-persists that catalog entry so the next lookup sees it.

use crate::error::{Error, Result};
use crate::storage::page::PageNum;
use crate::storage::tree;
use crate::tx::Tx;

/// A collection's catalog entry: just its root page. Encoded as a fixed
/// 8-byte little-endian page number — there is nothing else to version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CollectionMeta {
    root: PageNum,
}

impl CollectionMeta {
    fn encode(self) -> Vec<u8> {
        self.root.to_le_bytes().to_vec()
    }

    fn decode(bytes: &[u8]) -> Self {
        Self {
            root: PageNum::from_le_bytes(bytes.try_into().expect("catalog entries are 8 bytes")),
        }
    }
}

/// A handle to one named collection, borrowed for the lifetime of a
/// transaction. Obtained via [`Tx`]-level helpers in [`crate::tx`] is not
/// exposed directly; instead callers go through [`create`], [`open`] and
/// [`delete`] below, passing the owning transaction each time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    name: Vec<u8>,
    root: PageNum,
}

impl Collection {
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    pub fn root(&self) -> PageNum {
        self.root
    }

    /// Fetches the value stored under `key`, if any.
    pub fn get(&self, tx: &Tx, key: &[u8]) -> Result<Option<Vec<u8>>> {
        tree::find(tx, self.root, key)
    }

    /// Inserts or updates `key` -> `value`. If this changes the collection's
    /// root (first write, or a split), the catalog entry is re-persisted.
    pub fn put(&mut self, tx: &mut Tx, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        let new_root = tree::put(tx, self.root, key, value)?;
        self.set_root(tx, new_root)
    }

    /// Removes `key`. A no-op, not an error, if `key` isn't present.
    pub fn remove(&mut self, tx: &mut Tx, key: &[u8]) -> Result<()> {
        let new_root = tree::remove(tx, self.root, key)?;
        self.set_root(tx, new_root)
    }

    fn set_root(&mut self, tx: &mut Tx, new_root: PageNum) -> Result<()> {
        if new_root == self.root {
            return Ok(());
        }
        self.root = new_root;
        write_catalog_entry(tx, &self.name, CollectionMeta { root: new_root })
    }
}

fn write_catalog_entry(tx: &mut Tx, name: &[u8], meta: CollectionMeta) -> Result<()> {
    let root_of_roots = tree::put(tx, tx.root_of_roots(), name.to_vec(), meta.encode())?;
    tx.set_root_of_roots(root_of_roots);
    Ok(())
}

/// Creates a new, empty collection named `name`. Errors with
/// [`Error::AlreadyExists`] if the name is already in use.
pub fn create(tx: &mut Tx, name: &[u8]) -> Result<Collection> {
    if tree::find(tx, tx.root_of_roots(), name)?.is_some() {
        return Err(Error::AlreadyExists(String::from_utf8_lossy(name).into_owned()));
    }

    let root_node = tx.new_node(crate::storage::node::Node::new(vec![], vec![]))?;
    let root = root_node.page_num.expect("new_node assigns a page number");

    write_catalog_entry(tx, name, CollectionMeta { root })?;
    Ok(Collection {
        name: name.to_vec(),
        root,
    })
}

/// Looks up an existing collection by name, returning `None` if no
/// collection with that name exists.
pub fn open(tx: &Tx, name: &[u8]) -> Result<Option<Collection>> {
    let encoded = tree::find(tx, tx.root_of_roots(), name)?;

    Ok(encoded.map(|encoded| Collection {
        name: name.to_vec(),
        root: CollectionMeta::decode(&encoded).root,
    }))
}

/// Deletes a collection and every node reachable from its root. Errors with
/// [`Error::NotFound`] if no collection with that name exists.
pub fn delete(tx: &mut Tx, name: &[u8]) -> Result<()> {
    let collection = open(tx, name)?
        .ok_or_else(|| Error::NotFound(String::from_utf8_lossy(name).into_owned()))?;
    drop_subtree(tx, collection.root)?;

    let new_root_of_roots = tree::remove(tx, tx.root_of_roots(), name)?;
    tx.set_root_of_roots(new_root_of_roots);
    Ok(())
}

/// Walks every node reachable from `page_num` and releases its page.
fn drop_subtree(tx: &mut Tx, page_num: PageNum) -> Result<()> {
    let node = tx.get_node(page_num)?;
    for child in node.children.clone() {
        drop_subtree(tx, child)?;
    }
    tx.delete_node(&node)
}
