//! B-tree engine: find, insert-with-split, and delete-with-rebalance.
//!
//! Every function here takes `&mut Tx` (or `&Tx` for reads) as explicit
//! context rather than being a method on [`Node`]: a node is just bytes with
//! a shape, it has no business knowing which transaction it's being read or
//! written through. This mirrors how the original keeps its `dal`/tree
//! mutation code free of any back-pointer from node to transaction.
//!
//! Collections never touch this module's internals directly — they call
//! [`find`], [`put`] and [`remove`] with their own root page number and use
//! the returned (possibly new) root to update their catalog entry.

use log::{debug, trace};

use crate::error::Result;
use crate::storage::node::{Item, Node};
use crate::storage::page::PageNum;
use crate::tx::Tx;

/// Looks up `key` starting from `root`, returning its value if present.
pub fn find(tx: &Tx, root: PageNum, key: &[u8]) -> Result<Option<Vec<u8>>> {
    let mut node = tx.get_node(root)?;
    loop {
        match node.find_key(key) {
            Ok(i) => return Ok(Some(node.items[i].value.clone())),
            Err(i) => {
                if node.is_leaf() {
                    return Ok(None);
                }
                node = tx.get_node(node.children[i])?;
            }
        }
    }
}

/// Inserts or updates `key` -> `value` under `root`, returning the root to
/// use from now on (unchanged unless the root itself split).
pub fn put(tx: &mut Tx, root: PageNum, key: Vec<u8>, value: Vec<u8>) -> Result<PageNum> {
    let item = Item::new(key, value)?;

    match insert_into(tx, root, item)? {
        None => Ok(root),
        Some((promoted, right)) => {
            let right = tx.write_node(right)?;
            let new_root = tx.new_node(Node::new(
                vec![promoted],
                vec![root, right.page_num.expect("written node has a page number")],
            ))?;
            Ok(new_root.page_num.expect("new_node assigns a page number"))
        }
    }
}

/// Recursively inserts `item` under `page_num`. Returns `Some((promoted,
/// right))` if the node at `page_num` overflowed and had to split, in which
/// case the caller is responsible for linking `right` in as a new sibling.
fn insert_into(tx: &mut Tx, page_num: PageNum, item: Item) -> Result<Option<(Item, Node)>> {
    let mut node = tx.get_node(page_num)?;
    trace!("insert_into: page {page_num} ({} items, leaf={})", node.items.len(), node.is_leaf());

    if node.is_leaf() {
        match node.find_key(&item.key) {
            Ok(i) => node.items[i] = item,
            Err(i) => node.items.insert(i, item),
        }
    } else {
        match node.find_key(&item.key) {
            Ok(i) => {
                node.items[i] = item;
                tx.write_node(node)?;
                return Ok(None);
            }
            Err(i) => {
                let child = node.children[i];
                if let Some((promoted, right)) = insert_into(tx, child, item)? {
                    let right = tx.write_node(right)?;
                    node.items.insert(i, promoted);
                    node.children
                        .insert(i + 1, right.page_num.expect("written node has a page number"));
                }
            }
        }
    }

    if node.is_over_populated(tx.page_size(), tx.max_fill_percent()) {
        debug!("page {page_num} is over-populated ({} bytes), splitting", node.size());
        let (promoted, right) = split_node(&mut node, tx.page_size(), tx.max_fill_percent());
        tx.write_node(node)?;
        Ok(Some((promoted, right)))
    } else {
        tx.write_node(node)?;
        Ok(None)
    }
}

/// Splits an overflowing node at the smallest index whose left partition
/// exceeds half the max-fill threshold. `node` is truncated to its left half
/// in place; the promoted item and the new right sibling are returned.
fn split_node(node: &mut Node, page_size: usize, max_fill_percent: f64) -> (Item, Node) {
    let threshold = page_size as f64 * max_fill_percent / 2.0;
    let is_leaf = node.is_leaf();

    let mut split_index = node.items.len() - 1;
    for i in 1..node.items.len() {
        if Node::size_for(is_leaf, &node.items[0..i]) as f64 > threshold {
            split_index = i;
            break;
        }
    }
    debug!("split point at index {split_index} of {} items", node.items.len());

    let right_items = node.items.split_off(split_index + 1);
    let promoted = node.items.pop().expect("split_index is a valid item index");
    let right_children = if is_leaf {
        vec![]
    } else {
        node.children.split_off(split_index + 1)
    };

    (promoted, Node::new(right_items, right_children))
}

/// Removes `key` from under `root`, returning the root to use from now on
/// (unchanged unless the root itself collapsed, or unless `key` wasn't
/// present at all — removing a missing key is a no-op, not an error).
pub fn remove(tx: &mut Tx, root: PageNum, key: &[u8]) -> Result<PageNum> {
    if !remove_from(tx, root, key)? {
        trace!("remove: key not present, nothing to do");
        return Ok(root);
    }

    let root_node = tx.get_node(root)?;
    if !root_node.is_leaf() && root_node.items.is_empty() {
        debug!("root {root} collapsed to its only child, promoting it");
        let new_root = root_node.children[0];
        tx.delete_node(&root_node)?;
        return Ok(new_root);
    }

    Ok(root)
}

/// Recursively removes `key` from the subtree at `page_num`, rebalancing any
/// child left underpopulated along the way. Returns whether `key` was found.
fn remove_from(tx: &mut Tx, page_num: PageNum, key: &[u8]) -> Result<bool> {
    let mut node = tx.get_node(page_num)?;
    trace!("remove_from: page {page_num} ({} items, leaf={})", node.items.len(), node.is_leaf());

    if node.is_leaf() {
        return match node.find_key(key) {
            Ok(i) => {
                node.items.remove(i);
                tx.write_node(node)?;
                Ok(true)
            }
            Err(_) => {
                trace!("page {page_num} has no matching item");
                Ok(false)
            }
        };
    }

    match node.find_key(key) {
        Ok(i) => {
            let left_child = node.children[i];
            let predecessor = find_max(tx, left_child)?;
            debug!("page {page_num}: removing internal key, promoting predecessor {:?}", predecessor.key);
            node.items[i] = predecessor.clone();
            tx.write_node(node)?;
            remove_from(tx, left_child, &predecessor.key)?;
            rebalance_child(tx, page_num, i)?;
            Ok(true)
        }
        Err(i) => {
            let child = node.children[i];
            if remove_from(tx, child, key)? {
                rebalance_child(tx, page_num, i)?;
                Ok(true)
            } else {
                Ok(false)
            }
        }
    }
}

/// Finds the rightmost (largest-keyed) item reachable from `page_num`.
fn find_max(tx: &Tx, page_num: PageNum) -> Result<Item> {
    let mut node = tx.get_node(page_num)?;
    loop {
        if node.is_leaf() {
            return Ok(node.items.last().expect("subtree is non-empty").clone());
        }
        let last_child = *node.children.last().expect("internal node has a child");
        node = tx.get_node(last_child)?;
    }
}

/// Checks whether `parent`'s child at `child_index` is underpopulated and, if
/// so, fixes it by borrowing from a sibling (rotate) or folding into one
/// (merge), preferring the left sibling.
fn rebalance_child(tx: &mut Tx, parent_page: PageNum, child_index: usize) -> Result<()> {
    let mut parent = tx.get_node(parent_page)?;
    let child = tx.get_node(parent.children[child_index])?;

    if !child.is_under_populated(tx.page_size(), tx.min_fill_percent()) {
        return Ok(());
    }
    debug!("child {child_index} of page {parent_page} is under-populated, rebalancing");

    if child_index > 0 {
        let left_sibling = tx.get_node(parent.children[child_index - 1])?;
        if can_lend(&left_sibling) {
            debug!("borrowing from left sibling of child {child_index}");
            rotate_right(tx, &mut parent, child_index, left_sibling, child)?;
            tx.write_node(parent)?;
            return Ok(());
        }
    }

    if child_index + 1 < parent.children.len() {
        let right_sibling = tx.get_node(parent.children[child_index + 1])?;
        if can_lend(&right_sibling) {
            debug!("borrowing from right sibling of child {child_index}");
            rotate_left(tx, &mut parent, child_index, child, right_sibling)?;
            tx.write_node(parent)?;
            return Ok(());
        }
    }

    let left_index = if child_index == 0 { 0 } else { child_index - 1 };
    debug!("no sibling can lend, merging children {left_index} and {}", left_index + 1);
    merge(tx, &mut parent, left_index)?;
    tx.write_node(parent)?;
    Ok(())
}

/// A sibling can give up its outermost item without itself becoming
/// underpopulated: it must have more than one item left over afterwards.
fn can_lend(sibling: &Node) -> bool {
    sibling.items.len() > 2
}

/// Borrows the leftmost item of the right sibling of `parent`'s child at
/// `child_index`, rotating the separator down through `parent`.
fn rotate_left(
    tx: &mut Tx,
    parent: &mut Node,
    child_index: usize,
    mut child: Node,
    mut right_sibling: Node,
) -> Result<()> {
    trace!("rotate_left: separator at index {child_index} moves down, right sibling's first item moves up");
    child.items.push(parent.items[child_index].clone());
    let borrowed = right_sibling.items.remove(0);
    parent.items[child_index] = borrowed;

    if !child.is_leaf() {
        child.children.push(right_sibling.children.remove(0));
    }

    tx.write_node(child)?;
    tx.write_node(right_sibling)?;
    Ok(())
}

/// Borrows the rightmost item of the left sibling of `parent`'s child at
/// `child_index`, rotating the separator down through `parent`.
fn rotate_right(
    tx: &mut Tx,
    parent: &mut Node,
    child_index: usize,
    mut left_sibling: Node,
    mut child: Node,
) -> Result<()> {
    trace!("rotate_right: separator at index {} moves down, left sibling's last item moves up", child_index - 1);
    let separator_index = child_index - 1;
    child.items.insert(0, parent.items[separator_index].clone());
    let borrowed = left_sibling
        .items
        .pop()
        .expect("can_lend guarantees a non-empty sibling");
    parent.items[separator_index] = borrowed;

    if !child.is_leaf() {
        let borrowed_child = left_sibling
            .children
            .pop()
            .expect("internal sibling keeps one more child than items");
        child.children.insert(0, borrowed_child);
    }

    tx.write_node(left_sibling)?;
    tx.write_node(child)?;
    Ok(())
}

/// Merges `parent`'s children at `left_index` and `left_index + 1` into one
/// node, pulling the separating item down from `parent`.
fn merge(tx: &mut Tx, parent: &mut Node, left_index: usize) -> Result<()> {
    let mut left = tx.get_node(parent.children[left_index])?;
    let right = tx.get_node(parent.children[left_index + 1])?;
    trace!(
        "merging {} items of right child into {} items of left child, pulling down separator {left_index}",
        right.items.len(),
        left.items.len()
    );

    left.items.push(parent.items[left_index].clone());
    left.items.extend(right.items.clone());
    left.children.extend(right.children.clone());

    tx.delete_node(&right)?;
    parent.items.remove(left_index);
    parent.children.remove(left_index + 1);
    tx.write_node(left)?;
    Ok(())
}
