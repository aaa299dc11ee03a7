use log::debug;

use crate::pages::{Page, PAGE_HEIGHT, PAGE_WIDTH};

pub const GLYPH_SIZE: usize = 8;
const FIRST_GLYPH: u8 = 0x20;

/// Draw `text` with an 8x8 bitmap font.
///
/// `column` counts glyph cells, `y` counts pixels. A newline moves down one
/// glyph and back to the starting column. Glyphs that would cross the page
/// edge are not drawn.
pub fn draw_string(page: &mut Page, font: &[u8], text: &str, column: u16, y: u16, color: u8) {
    let mut x = column;
    let mut y = y;

    for byte in text.bytes() {
        if byte == b'\n' {
            y = y.wrapping_add(GLYPH_SIZE as u16);
            x = column;
            continue;
        }
        draw_glyph(page, font, byte, x as usize * GLYPH_SIZE, y as usize, color);
        x = x.wrapping_add(1);
    }
}

fn draw_glyph(page: &mut Page, font: &[u8], byte: u8, x: usize, y: usize, color: u8) {
    if x > PAGE_WIDTH - GLYPH_SIZE || y > PAGE_HEIGHT - GLYPH_SIZE {
        return;
    }
    let Some(index) = byte.checked_sub(FIRST_GLYPH) else {
        debug!("no glyph for control byte {:#04x}", byte);
        return;
    };
    let start = index as usize * GLYPH_SIZE;
    let Some(rows) = font.get(start..start + GLYPH_SIZE) else {
        debug!("no glyph for {:#04x}", byte);
        return;
    };

    for (dy, bits) in rows.iter().enumerate() {
        let row = &mut page[(y + dy) * PAGE_WIDTH + x..][..GLYPH_SIZE];
        for (dx, pixel) in row.iter_mut().enumerate() {
            if bits & (0x80 >> dx) != 0 {
                *pixel = color;
            }
        }
    }
}
