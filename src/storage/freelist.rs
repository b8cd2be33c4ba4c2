//! Free-page tracking.
//!
//! Tracks the highest page ever allocated (`max_page`) and a pool of pages
//! released by the tree engine (merges, root collapses) that are available
//! for reuse before the file is grown further.
//!
//! # See Also
//! - [`super::dal::Dal`]: the only caller of [`Freelist::get_next_page`] / [`Freelist::release_page`].

use super::page::PageNum;

pub const FREELIST_HEADER_SIZE: usize = 4;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Freelist {
    pub max_page: PageNum,
    pub released_pages: Vec<PageNum>,
}

impl Freelist {
    pub fn new() -> Self {
        Self {
            max_page: 0,
            released_pages: Vec::new(),
        }
    }

    /// Pops a released page if one is available, otherwise grows the file by
    /// bumping `max_page`.
    pub fn get_next_page(&mut self) -> PageNum {
        if let Some(page) = self.released_pages.pop() {
            return page;
        }

        self.max_page += 1;
        self.max_page
    }

    /// Returns a page to the pool. The caller guarantees `page` is not
    /// currently reachable from any collection tree.
    pub fn release_page(&mut self, page: PageNum) {
        self.released_pages.push(page);
    }

    /// Encodes this freelist into a `page_size` buffer:
    /// `max_page` (u16 LE) | released count (u16 LE) | released pages (u64 LE each).
    pub fn serialize(&self, page_size: usize) -> Vec<u8> {
        let mut buf = vec![0u8; page_size];
        buf[0..2].copy_from_slice(&(self.max_page as u16).to_le_bytes());
        buf[2..4].copy_from_slice(&(self.released_pages.len() as u16).to_le_bytes());

        let mut offset = FREELIST_HEADER_SIZE;
        for page in &self.released_pages {
            buf[offset..offset + 8].copy_from_slice(&page.to_le_bytes());
            offset += 8;
        }

        buf
    }

    pub fn deserialize(buf: &[u8]) -> Self {
        let max_page = u16::from_le_bytes(buf[0..2].try_into().unwrap()) as PageNum;
        let count = u16::from_le_bytes(buf[2..4].try_into().unwrap()) as usize;

        let mut released_pages = Vec::with_capacity(count);
        let mut offset = FREELIST_HEADER_SIZE;
        for _ in 0..count {
            let page = PageNum::from_le_bytes(buf[offset..offset + 8].try_into().unwrap());
            released_pages.push(page);
            offset += 8;
        }

        Self {
            max_page,
            released_pages,
        }
    }
}
