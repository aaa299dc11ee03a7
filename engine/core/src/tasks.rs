//! The 64-slot cooperative task table.
//!
//! Every slot has an active half, read while a frame runs, and a requested
//! half that tasks write to. Requests only take effect at the next
//! [`Scheduler::begin_frame`], so a frame always runs against the table as
//! it stood when the frame began.

use log::warn;

pub const TASK_COUNT: usize = 64;

/// A pending change to a task's entry point.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Request {
    #[default]
    Unset,
    Kill,
    Offset(u16),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct TaskSlot {
    pub entry: Option<u16>,
    pub paused: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct RequestSlot {
    pub entry: Request,
    pub paused: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheduler {
    pub active: [TaskSlot; TASK_COUNT],
    pub requested: [RequestSlot; TASK_COUNT],
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            active: [TaskSlot::default(); TASK_COUNT],
            requested: [RequestSlot::default(); TASK_COUNT],
        }
    }
}

impl Scheduler {
    /// Clear both halves and start task 0 at offset 0.
    pub fn reset(&mut self) {
        *self = Self::default();
        self.active[0].entry = Some(0);
    }

    pub fn request_start(&mut self, task: u8, offset: u16) {
        match self.requested.get_mut(task as usize) {
            Some(slot) => slot.entry = Request::Offset(offset),
            None => warn!("start of task {} ignored, only {} tasks", task, TASK_COUNT),
        }
    }

    pub fn request_pause(&mut self, task: u8, paused: bool) {
        match self.requested.get_mut(task as usize) {
            Some(slot) => slot.paused = paused,
            None => warn!("pause of task {} ignored, only {} tasks", task, TASK_COUNT),
        }
    }

    /// Apply a change-tasks request to the inclusive range `first..=last`.
    ///
    /// State 2 asks for the tasks to be killed, 0 and 1 unpause and pause.
    /// Ids past the table are clamped; an inverted range and unknown states
    /// are logged and do nothing.
    pub fn request_range(&mut self, first: u8, last: u8, state: u8) {
        if last < first {
            warn!("inverted task range {}..={}", first, last);
            return;
        }
        if state > 2 {
            warn!("unknown task state {} for {}..={}", state, first, last);
            return;
        }

        let last = (last as usize).min(TASK_COUNT - 1);
        let first = first as usize;
        if first > last {
            return;
        }
        for slot in &mut self.requested[first..=last] {
            match state {
                2 => slot.entry = Request::Kill,
                _ => slot.paused = state == 1,
            }
        }
    }

    /// Replace the active table with a saved one. Pause flags are seeded into
    /// the requested half too, so the next promotion keeps them.
    pub fn restore(&mut self, tasks: &[TaskSlot; TASK_COUNT]) {
        self.active = *tasks;
        for (requested, saved) in self.requested.iter_mut().zip(tasks) {
            *requested = RequestSlot { entry: Request::Unset, paused: saved.paused };
        }
    }

    /// Promote requested state to active state.
    pub fn begin_frame(&mut self) {
        for (active, requested) in self.active.iter_mut().zip(self.requested.iter_mut()) {
            active.paused = requested.paused;
            match requested.entry {
                Request::Unset => {}
                Request::Kill => active.entry = None,
                Request::Offset(offset) => active.entry = Some(offset),
            }
            requested.entry = Request::Unset;
        }
    }

    /// Entry point of `task` if it should run this frame.
    pub fn runnable(&self, task: usize) -> Option<u16> {
        let slot = self.active.get(task)?;
        if slot.paused {
            return None;
        }
        slot.entry
    }

    /// Record where a task stopped. `None` means it killed itself.
    pub fn store_resume(&mut self, task: usize, resume: Option<u16>) {
        if let Some(slot) = self.active.get_mut(task) {
            slot.entry = resume;
        }
    }

    pub fn running_count(&self) -> usize {
        self.active.iter().filter(|slot| slot.entry.is_some()).count()
    }
}
