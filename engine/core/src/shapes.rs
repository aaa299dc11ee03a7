//! Walks polygon and group records in a video segment.
//!
//! Record layout, all lengths scaled by `zoom / 64`:
//!
//! ```text
//! polygon  sel>=0xC0  bbw bbh count (x y)*count
//! group    sel&0x3F=2 dx dy n (ref:u16 x y [color sub])*(n+1)
//! ```
//!
//! A group child reference is a word offset into the same segment; with bit
//! 15 set it is followed by a color byte and a sub-id byte.

use heapless::Vec;
use log::{debug, warn};
use vge_bytecode::{ByteCursor, ZOOM_UNIT};

use crate::error::ShapeError;
use crate::raster::{Point, Polygon, Rasterizer, MAX_VERTICES};

/// Color that makes a polygon take its color from its own selector.
pub const COLOR_FROM_SELECTOR: u8 = 0xFF;

const POLYGON_SELECTOR: u8 = 0xC0;
const GROUP: u8 = 2;
const CHILD_HAS_COLOR: u16 = 0x8000;
const MAX_NESTING: u8 = 16;

#[inline(always)]
fn scale(value: u8, zoom: u16) -> i16 {
    (value as u32 * zoom as u32 / ZOOM_UNIT as u32) as i16
}

/// Draw the shape record at `offset` of `segment` centred on `anchor`.
pub fn draw_shape(
    segment: &[u8],
    offset: u16,
    color: u8,
    zoom: u16,
    anchor: Point,
    raster: &mut Rasterizer,
) -> Result<(), ShapeError> {
    ShapeWalker { segment, zoom, raster }.shape(offset, color, anchor, 0)
}

struct ShapeWalker<'s, 'r, 'p> {
    segment: &'s [u8],
    zoom: u16,
    raster: &'r mut Rasterizer<'p>,
}

impl ShapeWalker<'_, '_, '_> {
    fn shape(&mut self, offset: u16, color: u8, anchor: Point, depth: u8) -> Result<(), ShapeError> {
        let mut data = ByteCursor::new(self.segment, offset);
        let selector = fetch(&mut data, offset)?;

        if selector >= POLYGON_SELECTOR {
            let color = if color & 0x80 != 0 { selector & 0x3F } else { color };
            return self.polygon(&mut data, offset, color, anchor);
        }

        match selector & 0x3F {
            GROUP if depth >= MAX_NESTING => Err(ShapeError::Nesting(MAX_NESTING)),
            GROUP => self.group(&mut data, offset, anchor, depth),
            other => {
                warn!("unknown shape selector {:#04x} at {:#06x}", other, offset);
                Ok(())
            }
        }
    }

    fn polygon(&mut self, data: &mut ByteCursor, offset: u16, color: u8, anchor: Point) -> Result<(), ShapeError> {
        let zoom = self.zoom;
        let width = scale(fetch(data, offset)?, zoom);
        let height = scale(fetch(data, offset)?, zoom);

        let x1 = anchor.x.wrapping_sub(width / 2);
        let x2 = anchor.x.wrapping_add(width / 2);
        let y1 = anchor.y.wrapping_sub(height / 2);
        let y2 = anchor.y.wrapping_add(height / 2);
        if x1 > 319 || x2 < 0 || y1 > 199 || y2 < 0 {
            return Ok(());
        }

        let count = fetch(data, offset)?;
        if count & 1 != 0 {
            warn!("polygon at {:#06x} has an odd vertex count {}", offset, count);
            return Ok(());
        }
        if count as usize > MAX_VERTICES {
            return Err(ShapeError::TooManyVertices { offset, count });
        }

        let mut vertices: Vec<Point, MAX_VERTICES> = Vec::new();
        for _ in 0..count {
            let x = x1.wrapping_add(scale(fetch(data, offset)?, zoom));
            let y = y1.wrapping_add(scale(fetch(data, offset)?, zoom));
            vertices
                .push(Point::new(x, y))
                .map_err(|_| ShapeError::TooManyVertices { offset, count })?;
        }

        let polygon = Polygon {
            width: width as u16,
            height: height as u16,
            anchor,
            vertices,
        };
        self.raster.draw_polygon(color, &polygon);
        Ok(())
    }

    fn group(&mut self, data: &mut ByteCursor, offset: u16, anchor: Point, depth: u8) -> Result<(), ShapeError> {
        let zoom = self.zoom;
        let origin = Point::new(
            anchor.x.wrapping_sub(scale(fetch(data, offset)?, zoom)),
            anchor.y.wrapping_sub(scale(fetch(data, offset)?, zoom)),
        );

        let last = fetch(data, offset)?;
        for _ in 0..=last {
            let reference = data.fetch_word().map_err(|_| ShapeError::Truncated { offset })?;
            let position = Point::new(
                origin.x.wrapping_add(scale(fetch(data, offset)?, zoom)),
                origin.y.wrapping_add(scale(fetch(data, offset)?, zoom)),
            );

            let mut color = COLOR_FROM_SELECTOR;
            if reference & CHILD_HAS_COLOR != 0 {
                color = fetch(data, offset)?;
                let _sub_id = fetch(data, offset)?;
                if color & 0x80 != 0 {
                    debug!("skipping hard-coded sprite child at {:#06x}", offset);
                    continue;
                }
                color &= 0x7F;
            }

            let child = reference.wrapping_shl(1);
            self.shape(child, color, position, depth + 1)?;
        }
        Ok(())
    }
}

#[inline(always)]
fn fetch(data: &mut ByteCursor, offset: u16) -> Result<u8, ShapeError> {
    data.fetch_byte().map_err(|_| ShapeError::Truncated { offset })
}
