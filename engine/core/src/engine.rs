use alloc::vec::Vec;
use log::{debug, info};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::EngineError;
use crate::host::{AudioSink, Presenter, ResourceProvider, SnapshotStore};
use crate::interpreter::Interpreter;
use crate::pages::PageStore;
use crate::palette::PaletteState;
use crate::registers::{var, CallStack, PlayerInput, Registers};
use crate::snapshot::Snapshot;
use crate::tasks::{Scheduler, TASK_COUNT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Skip the frame pacing sleep in display updates.
    pub fast_mode: bool,
    /// Put a random value in the seed register on every part load.
    pub seed_random_register: bool,
    pub boot_part: u16,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fast_mode: false,
            seed_random_register: true,
            boot_part: 16001,
        }
    }
}

/// The segments of the loaded part.
#[derive(Debug, Clone, Default)]
pub struct Segments {
    pub code: Vec<u8>,
    pub video: Vec<u8>,
    pub alt_video: Option<Vec<u8>>,
    pub palette: Vec<u8>,
}

/// Everything the bytecode can observe or change.
#[derive(Debug, Clone, Default)]
pub struct VmState {
    pub registers: Registers,
    pub call_stack: CallStack,
    pub scheduler: Scheduler,
    pub pages: PageStore,
    pub palette: PaletteState,
    pub part: Option<u16>,
    /// Part requested by a load-resource, switched to at the next frame.
    pub pending_part: Option<u16>,
    pub last_timestamp: u64,
    pub frames_presented: u64,
}

pub struct Engine<R: ResourceProvider, P: Presenter, A: AudioSink> {
    pub config: EngineConfig,
    pub resources: R,
    pub presenter: P,
    pub audio: A,

    vm: VmState,
    segments: Option<Segments>,
    input: PlayerInput,
    rng: SmallRng,
}

impl <R: ResourceProvider, P: Presenter, A: AudioSink> Engine<R, P, A> {
    pub fn init(config: EngineConfig, resources: R, presenter: P, audio: A) -> Self {
        let now = presenter.timestamp_ms();
        Engine {
            config,
            resources,
            presenter,
            audio,
            vm: VmState { last_timestamp: now, ..Default::default() },
            segments: None,
            input: PlayerInput::default(),
            rng: SmallRng::seed_from_u64(now),
        }
    }

    /// Load the configured boot part.
    pub fn boot(&mut self) -> Result<(), EngineError> {
        self.load_part(self.config.boot_part)
    }

    /// Fetch a part's segments and reset the VM for it.
    ///
    /// Pages keep their contents across parts.
    pub fn load_part(&mut self, part: u16) -> Result<(), EngineError> {
        info!("loading part {}", part);
        let segments = self.fetch_segments(part)?;

        self.audio.stop_all();

        let vm = &mut self.vm;
        vm.registers.clear();
        if self.config.seed_random_register {
            vm.registers.set(var::RANDOM_SEED, self.rng.gen());
        }
        vm.scheduler.reset();
        vm.call_stack.clear();
        vm.palette.requested = None;
        vm.pending_part = None;
        vm.part = Some(part);

        self.segments = Some(segments);
        Ok(())
    }

    fn fetch_segments(&mut self, part: u16) -> Result<Segments, EngineError> {
        let segments = Segments {
            code: self.resources.code_segment(part)?,
            video: self.resources.video_segment(part)?,
            alt_video: self.resources.alt_video_segment(part)?,
            palette: self.resources.palette_segment(part)?,
        };
        debug!(
            " - part {}: {} code, {} video, {} palette bytes",
            part,
            segments.code.len(),
            segments.video.len(),
            segments.palette.len()
        );
        Ok(segments)
    }

    /// Controls to mirror into the input registers from the next frame on.
    pub fn set_input(&mut self, input: PlayerInput) {
        self.input = input;
    }

    /// Run one frame: switch part if one was requested, promote task
    /// requests, then run every runnable task in id order.
    pub fn run_frame(&mut self) -> Result<(), EngineError> {
        if let Some(part) = self.vm.pending_part.take() {
            self.load_part(part)?;
        }
        let segments = self.segments.as_ref().ok_or(EngineError::NoPart)?;

        self.vm.scheduler.begin_frame();
        self.vm.registers.apply_input(&self.input);

        let mut interpreter = Interpreter::new(
            &mut self.vm,
            segments,
            &mut self.resources,
            &mut self.presenter,
            &mut self.audio,
            self.config.fast_mode,
        );
        for task in 0..TASK_COUNT {
            let Some(entry) = interpreter.vm.scheduler.runnable(task) else {
                continue;
            };
            let resume = interpreter.run_task(task as u8, entry)?;
            interpreter.vm.scheduler.store_resume(task, resume);
        }
        Ok(())
    }

    pub fn state(&self) -> &VmState {
        &self.vm
    }

    pub fn state_mut(&mut self) -> &mut VmState {
        &mut self.vm
    }

    pub fn segments(&self) -> Option<&Segments> {
        self.segments.as_ref()
    }

    pub fn snapshot(&self) -> Result<Snapshot, EngineError> {
        let part = self.vm.part.ok_or(EngineError::NoPart)?;
        Ok(Snapshot {
            part,
            registers: self.vm.registers.0,
            tasks: self.vm.scheduler.active,
        })
    }

    /// Resume from a snapshot: the part's segments are fetched again, but the
    /// registers and task table come from the snapshot untouched.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<(), EngineError> {
        let segments = self.fetch_segments(snapshot.part)?;

        let vm = &mut self.vm;
        vm.registers.0 = snapshot.registers;
        vm.scheduler.restore(&snapshot.tasks);
        vm.call_stack.clear();
        vm.palette.requested = None;
        vm.pending_part = None;
        vm.part = Some(snapshot.part);

        self.segments = Some(segments);
        info!("restored part {}", snapshot.part);
        Ok(())
    }

    pub fn save_to<S: SnapshotStore>(&self, store: &mut S) -> Result<(), EngineError> {
        let snapshot = self.snapshot()?;
        store.save(&snapshot)?;
        Ok(())
    }

    pub fn load_from<S: SnapshotStore>(&mut self, store: &mut S) -> Result<(), EngineError> {
        let snapshot = store.load()?;
        self.restore(&snapshot)
    }
}
