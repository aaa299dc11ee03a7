use log::{debug, error, trace, warn};
use vge_bytecode::{decode, ByteCursor, Condition, Instruction, Operand, Zoom, ZOOM_UNIT};

use crate::engine::{Segments, VmState};
use crate::error::{EngineError, Fault, ShapeError};
use crate::host::{AudioSink, Presenter, ResourceProvider};
use crate::raster::{Point, Rasterizer};
use crate::registers::var;
use crate::shapes::{draw_shape, COLOR_FROM_SELECTOR};
use crate::text::draw_string;
use crate::PART_BASE;

/// What the task does after an instruction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StepResult {
    Continue,
    /// End of the task's turn; it resumes at the next instruction next frame.
    Yield,
    /// The task removed itself from the table.
    Killed,
}

/// Executes instructions of one part against the VM state for one frame.
pub struct Interpreter<'a, R: ResourceProvider, P: Presenter, A: AudioSink> {
    pub vm: &'a mut VmState,
    segments: &'a Segments,
    resources: &'a mut R,
    presenter: &'a mut P,
    audio: &'a mut A,
    fast_mode: bool,
}

impl <'a, R: ResourceProvider, P: Presenter, A: AudioSink> Interpreter<'a, R, P, A> {
    pub fn new(
        vm: &'a mut VmState,
        segments: &'a Segments,
        resources: &'a mut R,
        presenter: &'a mut P,
        audio: &'a mut A,
        fast_mode: bool,
    ) -> Self {
        Self { vm, segments, resources, presenter, audio, fast_mode }
    }

    /// Run `task` from `entry` until it yields or kills itself.
    ///
    /// Returns where the task should resume, `None` if it is gone.
    pub fn run_task(&mut self, task: u8, entry: u16) -> Result<Option<u16>, EngineError> {
        let segments = self.segments;
        let mut cursor = ByteCursor::new(&segments.code, entry);
        self.vm.call_stack.clear();
        trace!("task {} from {:#06x}", task, entry);

        loop {
            let ip = cursor.pos();
            match self.step(&mut cursor) {
                Ok(StepResult::Continue) => {}
                Ok(StepResult::Yield) => return Ok(Some(cursor.pos())),
                Ok(StepResult::Killed) => return Ok(None),
                Err(fault) => {
                    let opcode = segments.code.get(ip as usize).copied().unwrap_or(0);
                    error!("task {} faulted at {:#06x}: {}", task, ip, fault);
                    return Err(EngineError::Script { task, ip, opcode, fault });
                }
            }
        }
    }

    /// Decode and execute the instruction at the cursor.
    pub fn step(&mut self, cursor: &mut ByteCursor) -> Result<StepResult, Fault> {
        let insn = decode(cursor)?;
        self.execute(insn, cursor)
    }

    fn execute(&mut self, insn: Instruction, cursor: &mut ByteCursor) -> Result<StepResult, Fault> {
        let segments = self.segments;
        let regs = &mut self.vm.registers;

        match insn {
            Instruction::MoveConst { dst, value } => regs.set(dst, value),
            Instruction::Move { dst, src } => regs.set(dst, regs.get(src)),
            Instruction::Add { dst, src } => regs.set(dst, regs.get(dst).wrapping_add(regs.get(src))),
            Instruction::AddConst { dst, value } => regs.set(dst, regs.get(dst).wrapping_add(value)),
            Instruction::Sub { dst, src } => regs.set(dst, regs.get(dst).wrapping_sub(regs.get(src))),
            Instruction::And { dst, mask } => regs.set(dst, (regs.get(dst) as u16 & mask) as i16),
            Instruction::Or { dst, mask } => regs.set(dst, (regs.get(dst) as u16 | mask) as i16),
            Instruction::Shl { dst, shift } => {
                let value = (regs.get(dst) as u16).checked_shl(shift as u32).unwrap_or(0);
                regs.set(dst, value as i16);
            }
            Instruction::Shr { dst, shift } => {
                let value = (regs.get(dst) as u16).checked_shr(shift as u32).unwrap_or(0);
                regs.set(dst, value as i16);
            }

            Instruction::Call { target } => {
                self.vm.call_stack.push(cursor.pos())?;
                cursor.seek(target);
            }
            Instruction::Return => {
                let ret = self.vm.call_stack.pop()?;
                cursor.seek(ret);
            }
            Instruction::Jump { target } => cursor.seek(target),
            Instruction::DecrementJumpNonZero { counter, target } => {
                let value = regs.get(counter).wrapping_sub(1);
                regs.set(counter, value);
                if value != 0 {
                    cursor.seek(target);
                }
            }
            Instruction::JumpIf { condition, lhs, rhs, target } => {
                let lhs = regs.get(lhs);
                let rhs = match rhs {
                    Operand::Register(r) => regs.get(r),
                    Operand::Byte(v) | Operand::Word(v) => v,
                };
                if let Condition::Never(bits) = condition {
                    warn!("conditional jump with predicate {} never taken", bits);
                }
                if condition.holds(lhs, rhs) {
                    cursor.seek(target);
                }
            }

            Instruction::Yield => return Ok(StepResult::Yield),
            Instruction::Kill => return Ok(StepResult::Killed),
            Instruction::StartTask { task, target } => self.vm.scheduler.request_start(task, target),
            Instruction::ChangeTasks { first, last, state } => self.vm.scheduler.request_range(first, last, state),

            Instruction::SetPalette { value } => self.vm.palette.request((value >> 8) as u8),
            Instruction::SelectPage { page } => self.vm.pages.select_work(page),
            Instruction::FillPage { page, color } => self.vm.pages.fill(page, color),
            Instruction::CopyPage { src, dst } => {
                let vscroll = regs.get(var::SCROLL_Y);
                self.vm.pages.copy(src, dst, vscroll);
            }
            Instruction::UpdateDisplay { page } => self.update_display(page),
            Instruction::DrawString { string, x, y, color } => self.draw_string(string, x, y, color),

            Instruction::PlaySound { resource, freq, volume, channel } => {
                self.audio.play_sound(resource, freq, volume, channel)
            }
            Instruction::PlayMusic { resource, delay, position } => self.audio.play_music(resource, delay, position),
            Instruction::LoadResource { resource } => self.load_resource(resource),

            Instruction::DrawBackgroundShape { offset, x, y } => {
                let (x, y) = Instruction::background_position(x, y);
                self.draw(&segments.video, offset, ZOOM_UNIT, Point::new(x, y))?;
            }
            Instruction::DrawShape { offset, x, y, zoom } => {
                let anchor = Point::new(self.operand(x), self.operand(y));
                let (segment, zoom) = match zoom {
                    Zoom::Default => (&segments.video, ZOOM_UNIT),
                    Zoom::Immediate(z) => (&segments.video, z as u16),
                    Zoom::Register(r) => (&segments.video, self.vm.registers.get(r) as u16),
                    Zoom::AltSegment => {
                        let alt = segments.alt_video.as_ref().ok_or(ShapeError::NoAltSegment)?;
                        (alt, ZOOM_UNIT)
                    }
                };
                self.draw(segment, offset, zoom, anchor)?;
            }
        }

        Ok(StepResult::Continue)
    }

    fn operand(&self, operand: Operand) -> i16 {
        match operand {
            Operand::Register(r) => self.vm.registers.get(r),
            Operand::Byte(v) | Operand::Word(v) => v,
        }
    }

    fn draw(&mut self, segment: &[u8], offset: u16, zoom: u16, anchor: Point) -> Result<(), Fault> {
        let target = self.vm.pages.work();
        let mut raster = Rasterizer::new(&mut self.vm.pages, target);
        draw_shape(segment, offset, COLOR_FROM_SELECTOR, zoom, anchor, &mut raster)?;
        Ok(())
    }

    /// Pace the frame, then apply the palette request and show a page.
    fn update_display(&mut self, page: u8) {
        let vm = &mut *self.vm;

        if !self.fast_mode {
            let elapsed = self.presenter.timestamp_ms().saturating_sub(vm.last_timestamp) as i64;
            let pause = vm.registers.get(var::PAUSE_SLICES) as i64 * 20 - elapsed;
            if pause > 0 {
                self.presenter.sleep_ms(pause as u64);
            }
        }
        vm.last_timestamp = self.presenter.timestamp_ms();

        vm.registers.set(var::FRAME_FLAG, 0);
        vm.palette.apply_pending(&self.segments.palette);
        let front = vm.pages.update_display(page);

        let (width, height) = self.presenter.prepare_frame();
        trace!("presenting page {} on a {}x{} surface", front, width, height);
        self.presenter.present(vm.pages.page(front), &vm.palette.current);
        vm.frames_presented += 1;
    }

    fn draw_string(&mut self, id: u16, column: u8, y: u8, color: u8) {
        let Some(font) = self.resources.font() else {
            warn!("no font, string {:#06x} not drawn", id);
            return;
        };
        let Some(text) = self.resources.string(id) else {
            warn!("unknown string {:#06x}", id);
            return;
        };
        let work = self.vm.pages.work();
        draw_string(self.vm.pages.page_mut(work), font, text, column as u16, y as u16, color);
    }

    fn load_resource(&mut self, id: u16) {
        match id {
            0 => debug!("resource flush requested"),
            id if id > PART_BASE => {
                debug!("part {} requested", id);
                self.vm.pending_part = Some(id);
            }
            id => match self.resources.bitmap(id) {
                Ok(Some(bitmap)) => {
                    self.vm.pages.load_planar_bitmap(&bitmap);
                }
                Ok(None) => debug!("resource {} needs no loading", id),
                Err(err) => error!("resource {}: {}", id, err),
            },
        }
    }
}
