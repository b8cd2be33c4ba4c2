//! Raw, fixed-size unit of file I/O.
//!
//! A `Page` is nothing more than `page_size` bytes at a known offset in the
//! database file. This module only knows about *bytes*; it has no opinion on
//! whether those bytes decode to a meta page, a freelist page or a B-tree node.
//! Interpreting page contents is the job of [`super::meta`], [`super::freelist`]
//! and [`super::node`] respectively.
//!
//! # See Also
//! - [`super::pager::Pager`]: turns page numbers into positioned reads/writes of pages.

/// Identifies a page within the database file. Page 0 is always the meta page.
pub type PageNum = u64;

/// Page 0 is reserved for the meta page; every other page holds either the
/// freelist or a B-tree node.
pub const META_PAGE_NUM: PageNum = 0;

/// The smallest page size the engine will accept; below this a node cannot
/// hold even a single small item alongside its header.
pub const MIN_PAGE_SIZE: usize = 512;

/// A page's on-disk contents: exactly `page_size` bytes.
pub type Page = Vec<u8>;

/// Allocates an in-memory, zero-filled page buffer. No I/O is performed.
pub fn empty_page(page_size: usize) -> Page {
    vec![0u8; page_size]
}
