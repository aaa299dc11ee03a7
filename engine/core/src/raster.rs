//! Scanline rasterization of polygons, points and lines into a page.
//!
//! Edge stepping is 16.16 fixed point. The step for an edge is
//! `(dx * (0x4000 / dy)) << 2` with the division done first, and at every
//! edge pair the left accumulator's fraction restarts at 0x7FFF and the
//! right one's at 0x8000. Game logic hit-tests against the resulting pixels,
//! so the rounding must stay exactly like this.

use heapless::Vec;
use log::{debug, warn};

use crate::pages::{PageStore, PAGE_HEIGHT, PAGE_WIDTH};

/// Most vertices a polygon strip can carry.
pub const MAX_VERTICES: usize = 70;

/// Color that ORs the overlay bit into existing pixels.
pub const COLOR_BLEND: u8 = 0x10;
/// Color that copies pixels from page 0.
pub const COLOR_BACKGROUND: u8 = 0x11;

const OVERLAY_BIT: u8 = 0x08;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i16,
    pub y: i16,
}

impl Point {
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }
}

/// How a span's pixels are produced, picked once per polygon.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FillMode {
    Solid(u8),
    Blend,
    Background,
}

impl FillMode {
    pub fn from_color(color: u8) -> Self {
        match color {
            c if c < COLOR_BLEND => FillMode::Solid(c),
            COLOR_BLEND => FillMode::Blend,
            _ => FillMode::Background,
        }
    }
}

/// A polygon ready for scan conversion: absolute vertices plus the
/// zoomed bounding box it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Polygon {
    pub width: u16,
    pub height: u16,
    pub anchor: Point,
    pub vertices: Vec<Point, MAX_VERTICES>,
}

/// Draws into one target page of a [`PageStore`].
pub struct Rasterizer<'a> {
    pages: &'a mut PageStore,
    target: usize,
}

impl<'a> Rasterizer<'a> {
    pub fn new(pages: &'a mut PageStore, target: usize) -> Self {
        Self { pages, target }
    }

    pub fn target(&self) -> usize {
        self.target
    }

    /// Draw a polygon, or the point/line it degenerates to.
    pub fn draw_polygon(&mut self, color: u8, polygon: &Polygon) {
        let vertices = &polygon.vertices;

        if vertices.len() == 4 && polygon.width == 0 && polygon.height <= 1 {
            self.draw_point(color, polygon.anchor);
            return;
        }

        match vertices.len() {
            0 => {}
            1 => self.draw_point(color, vertices[0]),
            2 => self.draw_line(color, vertices[0], vertices[1]),
            n if n % 2 == 1 => warn!("odd strip of {} vertices not drawn", n),
            _ => self.fill_strip(FillMode::from_color(color), vertices),
        }
    }

    pub fn draw_point(&mut self, color: u8, point: Point) {
        if point.x < 0 || point.x as usize >= PAGE_WIDTH || point.y < 0 || point.y as usize >= PAGE_HEIGHT {
            return;
        }
        let offset = point.y as usize * PAGE_WIDTH + point.x as usize;

        match color {
            COLOR_BLEND => self.pages.page_mut(self.target)[offset] |= OVERLAY_BIT,
            COLOR_BACKGROUND => {
                if let Some((background, page)) = self.pages.background_and(self.target) {
                    page[offset] = background[offset];
                }
            }
            _ => self.pages.page_mut(self.target)[offset] = color,
        }
    }

    /// Two-vertex shapes: a horizontal span on the left endpoint's row when
    /// the endpoints are at least as far apart in x as in y, otherwise a
    /// vertical run on the left endpoint's column.
    pub fn draw_line(&mut self, color: u8, a: Point, b: Point) {
        let (left, right) = if a.x > b.x { (b, a) } else { (a, b) };
        let mode = FillMode::from_color(color);

        let dx = (right.x as i32 - left.x as i32).abs();
        let dy = (right.y as i32 - left.y as i32).abs();
        if dx >= dy {
            if left.y >= 0 && (left.y as usize) < PAGE_HEIGHT && left.x < PAGE_WIDTH as i16 && right.x >= 0 {
                let x1 = left.x.max(0);
                let x2 = right.x.min(PAGE_WIDTH as i16 - 1);
                self.span(mode, x1, x2, left.y);
            }
        } else {
            let (top, bottom) = (left.y.min(right.y), left.y.max(right.y));
            for y in top.max(0)..=bottom.min(PAGE_HEIGHT as i16 - 1) {
                if left.x >= 0 && (left.x as usize) < PAGE_WIDTH {
                    self.span(mode, left.x, left.x, y);
                }
            }
        }
    }

    /// Walk the ring from both ends inward, filling between the two edges.
    fn fill_strip(&mut self, mode: FillMode, v: &[Point]) {
        let mut i = 0;
        let mut j = v.len() - 1;

        let mut left: u32 = ((v[j].x as i32) << 16) as u32;
        let mut right: u32 = ((v[i].x as i32) << 16) as u32;
        let mut y = v[i].y.min(v[j].y);

        i += 1;
        j -= 1;

        let mut remaining = v.len();
        loop {
            remaining -= 2;
            if remaining == 0 {
                return;
            }

            let (left_step, _) = edge_step(v[j + 1], v[j]);
            let (right_step, rows) = edge_step(v[i - 1], v[i]);
            i += 1;
            j -= 1;

            left = (left & 0xFFFF_0000) | 0x7FFF;
            right = (right & 0xFFFF_0000) | 0x8000;

            if rows == 0 {
                left = left.wrapping_add(left_step);
                right = right.wrapping_add(right_step);
                continue;
            }

            for _ in 0..rows {
                if y >= PAGE_HEIGHT as i16 {
                    return;
                }
                if y >= 0 {
                    let x1 = (left >> 16) as u16 as i16;
                    let x2 = (right >> 16) as u16 as i16;
                    if x1 < PAGE_WIDTH as i16 && x2 >= 0 {
                        self.span(mode, x1.max(0), x2.min(PAGE_WIDTH as i16 - 1), y);
                    }
                }
                left = left.wrapping_add(left_step);
                right = right.wrapping_add(right_step);
                y += 1;
                if y >= PAGE_HEIGHT as i16 {
                    return;
                }
            }
        }
    }

    /// Fill `[min(x1,x2), max(x1,x2)]` on row `y`; coordinates are in range.
    fn span(&mut self, mode: FillMode, x1: i16, x2: i16, y: i16) {
        let (lo, hi) = (x1.min(x2) as usize, x1.max(x2) as usize);
        let row = y as usize * PAGE_WIDTH;
        let range = row + lo..=row + hi;

        match mode {
            FillMode::Solid(color) => self.pages.page_mut(self.target)[range].fill(color),
            FillMode::Blend => {
                for pixel in &mut self.pages.page_mut(self.target)[range] {
                    *pixel |= OVERLAY_BIT;
                }
            }
            FillMode::Background => match self.pages.background_and(self.target) {
                Some((background, page)) => page[range.clone()].copy_from_slice(&background[range]),
                None => debug!("background span onto page 0 is a no-op"),
            },
        }
    }
}

/// 16.16 x step from `from` to `to` and the number of rows it spans.
fn edge_step(from: Point, to: Point) -> (u32, u16) {
    let rows = to.y.wrapping_sub(from.y) as u16;
    let divisor = if rows <= 1 { 1 } else { rows as i32 };
    let dx = to.x as i32 - from.x as i32;
    let step = (dx * (0x4000 / divisor)) << 2;
    (step as u32, rows)
}
