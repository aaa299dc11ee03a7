//! Collaborators the engine talks to but does not implement.

use alloc::vec::Vec;

use crate::error::{ResourceError, SnapshotError};
use crate::pages::{PAGE_HEIGHT, PAGE_WIDTH};
use crate::palette::Palette;
use crate::snapshot::Snapshot;

/// Supplies already-decompressed segments and auxiliary resources.
pub trait ResourceProvider {
    fn code_segment(&mut self, part: u16) -> Result<Vec<u8>, ResourceError>;
    fn video_segment(&mut self, part: u16) -> Result<Vec<u8>, ResourceError>;
    fn palette_segment(&mut self, part: u16) -> Result<Vec<u8>, ResourceError>;

    /// Not every part ships a second video segment.
    fn alt_video_segment(&mut self, part: u16) -> Result<Option<Vec<u8>>, ResourceError> {
        let _ = part;
        Ok(None)
    }

    /// A 320x200 planar background image, if `id` names one.
    fn bitmap(&mut self, id: u16) -> Result<Option<Vec<u8>>, ResourceError> {
        let _ = id;
        Ok(None)
    }

    fn string(&self, id: u16) -> Option<&str> {
        let _ = id;
        None
    }

    /// 8x8 glyphs starting at ASCII 0x20, one byte per row.
    fn font(&self) -> Option<&[u8]> {
        None
    }
}

/// Fire-and-forget audio triggers.
pub trait AudioSink {
    fn play_sound(&mut self, resource: u16, freq: u8, volume: u8, channel: u8);
    fn play_music(&mut self, resource: u16, delay: u16, position: u8);
    fn stop_all(&mut self) {}
}

/// Pacing and final presentation of finished pages.
pub trait Presenter {
    fn timestamp_ms(&self) -> u64;
    fn sleep_ms(&mut self, ms: u64);

    /// Size of the host surface the next frame goes to.
    fn prepare_frame(&mut self) -> (usize, usize) {
        (PAGE_WIDTH, PAGE_HEIGHT)
    }

    /// `page` holds one palette index per pixel, row-major.
    fn present(&mut self, page: &[u8], palette: &Palette);
}

pub trait SnapshotStore {
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError>;
    fn load(&mut self) -> Result<Snapshot, SnapshotError>;
}
