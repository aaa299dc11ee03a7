use alloc::vec;
use alloc::vec::Vec;
use log::{debug, warn};

pub const PAGE_WIDTH: usize = 320;
pub const PAGE_HEIGHT: usize = 200;
pub const PAGE_SIZE: usize = PAGE_WIDTH * PAGE_HEIGHT;
pub const PAGE_COUNT: usize = 4;

/// Alias for the page currently on screen.
pub const PAGE_FRONT: u8 = 0xFE;
/// Alias for the page that becomes visible on the next swap.
pub const PAGE_BACK: u8 = 0xFF;

/// Size of a 4-bitplane 320x200 background image.
pub const PLANAR_BITMAP_SIZE: usize = PAGE_SIZE / 2;

pub type Page = [u8; PAGE_SIZE];

/// Four off-screen pages plus the front/back/work redirections.
///
/// Aliases only ever hold physical indices; they are swapped, never copied.
#[derive(Debug, Clone)]
pub struct PageStore {
    // heap allocated, 256KiB in total
    pages: Vec<Page>,
    work: usize,
    front: usize,
    back: usize,
}

impl Default for PageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PageStore {
    pub fn new() -> Self {
        let mut store = Self {
            pages: vec![[0; PAGE_SIZE]; PAGE_COUNT],
            work: 0,
            front: 2,
            back: 1,
        };
        store.select_work(PAGE_FRONT);
        store
    }

    /// Map a page id or alias to a physical page.
    pub fn resolve(&self, id: u8) -> usize {
        match id {
            0..=3 => id as usize,
            PAGE_FRONT => self.front,
            PAGE_BACK => self.back,
            _ => {
                warn!("unknown page id {:#04x}, using page 0", id);
                0
            }
        }
    }

    #[inline(always)]
    pub fn work(&self) -> usize {
        self.work
    }

    #[inline(always)]
    pub fn front(&self) -> usize {
        self.front
    }

    #[inline(always)]
    pub fn back(&self) -> usize {
        self.back
    }

    pub fn select_work(&mut self, id: u8) {
        self.work = self.resolve(id);
    }

    pub fn page(&self, index: usize) -> &Page {
        &self.pages[index]
    }

    pub fn page_mut(&mut self, index: usize) -> &mut Page {
        &mut self.pages[index]
    }

    /// Page 0 for reading alongside a different page for writing.
    ///
    /// Returns `None` when `target` is page 0 itself.
    pub fn background_and(&mut self, target: usize) -> Option<(&Page, &mut Page)> {
        if target == 0 {
            return None;
        }
        let (head, tail) = self.pages.split_at_mut(1);
        Some((&head[0], &mut tail[target - 1]))
    }

    fn pair_mut(&mut self, src: usize, dst: usize) -> (&Page, &mut Page) {
        debug_assert_ne!(src, dst);
        if src < dst {
            let (head, tail) = self.pages.split_at_mut(dst);
            (&head[src], &mut tail[0])
        } else {
            let (head, tail) = self.pages.split_at_mut(src);
            (&tail[0], &mut head[dst])
        }
    }

    pub fn fill(&mut self, id: u8, color: u8) {
        let index = self.resolve(id);
        self.pages[index].fill(color);
    }

    /// Copy one page onto another.
    ///
    /// The aliases copy whole. Other source ids with bit 7 set (ignoring
    /// bit 6) copy page `src & 3` shifted down by `vscroll` rows.
    pub fn copy(&mut self, src: u8, dst: u8, vscroll: i16) {
        let whole = if src >= PAGE_FRONT {
            Some(src)
        } else if (src & 0xBF) & 0x80 == 0 {
            Some(src & 0xBF)
        } else {
            None
        };
        if let Some(src) = whole {
            let (s, d) = (self.resolve(src), self.resolve(dst));
            if s != d {
                let (from, to) = self.pair_mut(s, d);
                to.copy_from_slice(from);
            }
            return;
        }

        let (s, d) = (self.resolve(src & 3), self.resolve(dst));
        if s == d || !(-199..=199).contains(&vscroll) {
            debug!("scrolled copy {} -> {} by {} skipped", s, d, vscroll);
            return;
        }

        let rows = PAGE_HEIGHT - vscroll.unsigned_abs() as usize;
        let (from_row, to_row) = if vscroll < 0 { ((-vscroll) as usize, 0) } else { (0, vscroll as usize) };
        let (from, to) = self.pair_mut(s, d);
        to[to_row * PAGE_WIDTH..(to_row + rows) * PAGE_WIDTH]
            .copy_from_slice(&from[from_row * PAGE_WIDTH..(from_row + rows) * PAGE_WIDTH]);
    }

    /// Point the front alias at the page to show and return it.
    ///
    /// `PAGE_BACK` swaps front and back, `PAGE_FRONT` keeps the current
    /// front, any other id makes that page the front.
    pub fn update_display(&mut self, id: u8) -> usize {
        match id {
            PAGE_FRONT => {}
            PAGE_BACK => core::mem::swap(&mut self.front, &mut self.back),
            _ => self.front = self.resolve(id),
        }
        self.front
    }

    /// Decode a planar background image into page 0.
    pub fn load_planar_bitmap(&mut self, bitmap: &[u8]) -> bool {
        if bitmap.len() != PLANAR_BITMAP_SIZE {
            warn!("bitmap is {} bytes, expected {}", bitmap.len(), PLANAR_BITMAP_SIZE);
            return false;
        }

        let plane_size = PAGE_SIZE / 8;
        let page = &mut self.pages[0];
        for (byte_index, pixels) in page.chunks_exact_mut(8).enumerate() {
            for (bit, pixel) in pixels.iter_mut().enumerate() {
                let mask = 0x80 >> bit;
                let mut color = 0;
                for plane in 0..4 {
                    if bitmap[plane * plane_size + byte_index] & mask != 0 {
                        color |= 1 << plane;
                    }
                }
                *pixel = color;
            }
        }
        true
    }
}
