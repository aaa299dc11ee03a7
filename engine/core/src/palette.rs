use log::warn;

pub const PALETTE_COLORS: usize = 16;
/// Bytes per palette in a palette segment: 16 big-endian 0x0RGB words.
pub const PALETTE_STRIDE: usize = PALETTE_COLORS * 2;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Expand a 0x0RGB word, four bits per channel.
    pub fn from_word(word: u16) -> Self {
        let expand = |nibble: u16| ((nibble & 0xF) as u8) * 0x11;
        Self {
            r: expand(word >> 8),
            g: expand(word >> 4),
            b: expand(word),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Palette {
    pub colors: [Rgb; PALETTE_COLORS],
}

impl Palette {
    /// Palette `index` out of a part's palette segment.
    pub fn from_segment(segment: &[u8], index: u8) -> Option<Self> {
        let start = index as usize * PALETTE_STRIDE;
        let Some(bytes) = segment.get(start..start + PALETTE_STRIDE) else {
            warn!("palette {} is outside a {} byte segment", index, segment.len());
            return None;
        };

        let mut palette = Palette::default();
        for (color, word) in palette.colors.iter_mut().zip(bytes.chunks_exact(2)) {
            *color = Rgb::from_word(u16::from_be_bytes([word[0], word[1]]));
        }
        Some(palette)
    }

    /// Color of a page pixel; the overlay bit picks from the upper half.
    #[inline(always)]
    pub fn color(&self, pixel: u8) -> Rgb {
        self.colors[(pixel & 0xF) as usize]
    }
}

/// Current palette plus the one requested for the next display update.
#[derive(Debug, Clone, Default)]
pub struct PaletteState {
    pub current: Palette,
    pub requested: Option<u8>,
}

impl PaletteState {
    pub fn request(&mut self, index: u8) {
        self.requested = Some(index);
    }

    /// Apply a pending request. Only the display update calls this.
    pub fn apply_pending(&mut self, segment: &[u8]) -> bool {
        let Some(index) = self.requested.take() else {
            return false;
        };
        match Palette::from_segment(segment, index) {
            Some(palette) => {
                self.current = palette;
                true
            }
            None => false,
        }
    }
}
