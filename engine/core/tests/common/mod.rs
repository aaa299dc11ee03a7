#![allow(dead_code)]

use std::collections::HashMap;

use vge_bytecode::{Assembler, Instruction};
use vge_core::audio_queue::AudioCommand;
use vge_core::error::SegmentKind;
use vge_core::{AudioSink, Engine, EngineConfig, Palette, Presenter, ResourceError, ResourceProvider};

pub const BOOT_PART: u16 = 16001;

#[derive(Debug, Clone, Default)]
pub struct MemPart {
    pub code: Vec<u8>,
    pub video: Vec<u8>,
    pub alt_video: Option<Vec<u8>>,
    pub palette: Vec<u8>,
}

impl MemPart {
    pub fn with_code(code: Vec<u8>) -> Self {
        Self { code, palette: vec![0; 32 * 2], ..Default::default() }
    }
}

/// Resources held in memory, keyed by part.
#[derive(Debug, Default)]
pub struct MemResources {
    pub parts: HashMap<u16, MemPart>,
    pub bitmaps: HashMap<u16, Vec<u8>>,
    pub strings: HashMap<u16, String>,
    pub font: Option<Vec<u8>>,
}

impl MemResources {
    fn part(&self, part: u16, segment: SegmentKind) -> Result<&MemPart, ResourceError> {
        self.parts.get(&part).ok_or(ResourceError::MissingSegment { part, segment })
    }
}

impl ResourceProvider for MemResources {
    fn code_segment(&mut self, part: u16) -> Result<Vec<u8>, ResourceError> {
        Ok(self.part(part, SegmentKind::Code)?.code.clone())
    }

    fn video_segment(&mut self, part: u16) -> Result<Vec<u8>, ResourceError> {
        Ok(self.part(part, SegmentKind::Video)?.video.clone())
    }

    fn palette_segment(&mut self, part: u16) -> Result<Vec<u8>, ResourceError> {
        Ok(self.part(part, SegmentKind::Palette)?.palette.clone())
    }

    fn alt_video_segment(&mut self, part: u16) -> Result<Option<Vec<u8>>, ResourceError> {
        Ok(self.part(part, SegmentKind::AltVideo)?.alt_video.clone())
    }

    fn bitmap(&mut self, id: u16) -> Result<Option<Vec<u8>>, ResourceError> {
        Ok(self.bitmaps.get(&id).cloned())
    }

    fn string(&self, id: u16) -> Option<&str> {
        self.strings.get(&id).map(String::as_str)
    }

    fn font(&self) -> Option<&[u8]> {
        self.font.as_deref()
    }
}

/// A clock that only moves when the engine sleeps.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    pub now: u64,
    pub sleeps: Vec<u64>,
    pub frames: Vec<(Vec<u8>, Palette)>,
}

impl Presenter for RecordingPresenter {
    fn timestamp_ms(&self) -> u64 {
        self.now
    }

    fn sleep_ms(&mut self, ms: u64) {
        self.sleeps.push(ms);
        self.now += ms;
    }

    fn present(&mut self, page: &[u8], palette: &Palette) {
        self.frames.push((page.to_vec(), *palette));
    }
}

#[derive(Debug, Default)]
pub struct RecordingAudio {
    pub commands: Vec<AudioCommand>,
}

impl AudioSink for RecordingAudio {
    fn play_sound(&mut self, resource: u16, freq: u8, volume: u8, channel: u8) {
        self.commands.push(AudioCommand::PlaySound { resource, freq, volume, channel });
    }

    fn play_music(&mut self, resource: u16, delay: u16, position: u8) {
        self.commands.push(AudioCommand::PlayMusic { resource, delay, position });
    }

    fn stop_all(&mut self) {
        self.commands.push(AudioCommand::StopAll);
    }
}

pub type TestEngine = Engine<MemResources, RecordingPresenter, RecordingAudio>;

pub fn test_config() -> EngineConfig {
    EngineConfig { fast_mode: true, seed_random_register: false, ..Default::default() }
}

/// A booted engine over the given resources.
pub fn boot(resources: MemResources, config: EngineConfig) -> TestEngine {
    let mut engine = Engine::init(config, resources, RecordingPresenter::default(), RecordingAudio::default());
    engine.boot().expect("boot part loads");
    engine
}

/// A booted engine whose boot part runs `code` and draws from `video`.
pub fn boot_with(code: Vec<u8>, video: Vec<u8>) -> TestEngine {
    let mut resources = MemResources::default();
    resources.parts.insert(BOOT_PART, MemPart { video, ..MemPart::with_code(code) });
    boot(resources, test_config())
}

pub fn program(insns: &[Instruction]) -> Vec<u8> {
    let mut asm = Assembler::new();
    for insn in insns {
        asm.emit(*insn);
    }
    asm.finish()
}

pub fn lit(page: &[u8], color: u8) -> usize {
    page.iter().filter(|&&p| p == color).count()
}
