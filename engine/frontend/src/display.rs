use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use bytemuck::cast_slice;
use image::ColorType;
use tracing::{debug, error};
use vge_core::pages::{PAGE_HEIGHT, PAGE_WIDTH};
use vge_core::{Palette, Presenter};

/// Expand a page of palette indices to RGBA pixels.
pub fn to_rgba(page: &[u8], palette: &Palette) -> Vec<[u8; 4]> {
    page.iter()
        .map(|&index| {
            let rgb = palette.color(index);
            [rgb.r, rgb.g, rgb.b, 0xFF]
        })
        .collect()
}

pub fn write_png(path: &Path, page: &[u8], palette: &Palette) -> anyhow::Result<()> {
    let pixels = to_rgba(page, palette);
    image::save_buffer(path, cast_slice(&pixels), PAGE_WIDTH as u32, PAGE_HEIGHT as u32, ColorType::Rgba8)
        .with_context(|| format!("writing {}", path.display()))
}

/// Presents frames without a window, keeping the last one and writing every
/// `dump_every`th to `out_dir` as a PNG.
pub struct PngPresenter {
    out_dir: PathBuf,
    dump_every: u64,
    presented: u64,
    start: Instant,
    pub last_frame: Option<(Vec<u8>, Palette)>,
}

impl PngPresenter {
    pub fn new(out_dir: impl Into<PathBuf>, dump_every: u64) -> anyhow::Result<Self> {
        let out_dir = out_dir.into();
        if dump_every > 0 {
            fs::create_dir_all(&out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
        }
        Ok(Self {
            out_dir,
            dump_every,
            presented: 0,
            start: Instant::now(),
            last_frame: None,
        })
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }

    pub fn frame_path(&self, frame: u64) -> PathBuf {
        self.out_dir.join(format!("frame_{frame:06}.png"))
    }
}

impl Presenter for PngPresenter {
    fn timestamp_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn sleep_ms(&mut self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }

    fn present(&mut self, page: &[u8], palette: &Palette) {
        self.presented += 1;
        if self.dump_every > 0 && self.presented % self.dump_every == 0 {
            let path = self.frame_path(self.presented);
            match write_png(&path, page, palette) {
                Ok(()) => debug!("wrote {}", path.display()),
                Err(e) => error!("frame dump failed: {:#}", e),
            }
        }
        self.last_frame = Some((page.to_vec(), *palette));
    }
}
