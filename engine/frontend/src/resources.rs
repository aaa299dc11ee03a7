use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, warn};
use vge_core::error::SegmentKind;
use vge_core::{ResourceError, ResourceProvider};

/// Resources unpacked into a directory tree:
///
/// ```text
/// <root>/<part>/code.bin, video.bin, video2.bin (optional), palette.bin
/// <root>/bitmaps/<id>.bin
/// <root>/strings.txt   one `id<TAB>text` per line, `\n` escapes a newline
/// <root>/font.bin
/// ```
pub struct DirResources {
    root: PathBuf,
    strings: HashMap<u16, String>,
    font: Option<Vec<u8>>,
}

impl DirResources {
    pub fn open(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            anyhow::bail!("{} is not a directory", root.display());
        }

        let strings = match fs::read_to_string(root.join("strings.txt")) {
            Ok(text) => parse_strings(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e).context("reading strings.txt"),
        };
        let font = read_optional(&root.join("font.bin")).context("reading font.bin")?;
        debug!("{} strings, font {}", strings.len(), if font.is_some() { "present" } else { "missing" });

        Ok(Self { root, strings, font })
    }

    fn segment(&self, part: u16, segment: SegmentKind, file: &str) -> Result<Option<Vec<u8>>, ResourceError> {
        let path = self.root.join(part.to_string()).join(file);
        read_optional(&path).map_err(|e| ResourceError::Unavailable {
            id: part,
            reason: format!("{} segment {}: {}", segment, path.display(), e),
        })
    }

    fn required(&self, part: u16, segment: SegmentKind, file: &str) -> Result<Vec<u8>, ResourceError> {
        self.segment(part, segment, file)?
            .ok_or(ResourceError::MissingSegment { part, segment })
    }
}

fn read_optional(path: &Path) -> std::io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn parse_id(text: &str) -> Option<u16> {
    match text.strip_prefix("0x") {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

fn parse_strings(text: &str) -> HashMap<u16, String> {
    let mut strings = HashMap::new();
    for (number, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let Some((id, value)) = line.split_once('\t') else {
            warn!("strings.txt:{}: no tab separator", number + 1);
            continue;
        };
        let Some(id) = parse_id(id.trim()) else {
            warn!("strings.txt:{}: bad id {:?}", number + 1, id);
            continue;
        };
        strings.insert(id, value.replace("\\n", "\n"));
    }
    strings
}

impl ResourceProvider for DirResources {
    fn code_segment(&mut self, part: u16) -> Result<Vec<u8>, ResourceError> {
        self.required(part, SegmentKind::Code, "code.bin")
    }

    fn video_segment(&mut self, part: u16) -> Result<Vec<u8>, ResourceError> {
        self.required(part, SegmentKind::Video, "video.bin")
    }

    fn palette_segment(&mut self, part: u16) -> Result<Vec<u8>, ResourceError> {
        self.required(part, SegmentKind::Palette, "palette.bin")
    }

    fn alt_video_segment(&mut self, part: u16) -> Result<Option<Vec<u8>>, ResourceError> {
        self.segment(part, SegmentKind::AltVideo, "video2.bin")
    }

    fn bitmap(&mut self, id: u16) -> Result<Option<Vec<u8>>, ResourceError> {
        let path = self.root.join("bitmaps").join(format!("{id}.bin"));
        read_optional(&path).map_err(|e| ResourceError::Unavailable { id, reason: e.to_string() })
    }

    fn string(&self, id: u16) -> Option<&str> {
        self.strings.get(&id).map(String::as_str)
    }

    fn font(&self) -> Option<&[u8]> {
        self.font.as_deref()
    }
}
