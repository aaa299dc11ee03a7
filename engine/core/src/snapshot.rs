//! Save-state encoding.
//!
//! ```text
//! "VGES" version:u8 part:u16 registers:[i16; 256] tasks:[(entry:u16, paused:u8); 64]
//! ```
//!
//! All words are big-endian; an entry of 0xFFFF marks an unscheduled task.

use alloc::vec::Vec;

use crate::error::SnapshotError;
use crate::registers::REGISTER_COUNT;
use crate::tasks::{TaskSlot, TASK_COUNT};

pub const MAGIC: &[u8; 4] = b"VGES";
pub const VERSION: u8 = 1;
pub const ENCODED_LEN: usize = 4 + 1 + 2 + REGISTER_COUNT * 2 + TASK_COUNT * 3;

const UNSCHEDULED: u16 = 0xFFFF;

/// The part, register file and active task table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub part: u16,
    pub registers: [i16; REGISTER_COUNT],
    pub tasks: [TaskSlot; TASK_COUNT],
}

impl Snapshot {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ENCODED_LEN);
        out.extend_from_slice(MAGIC);
        out.push(VERSION);
        out.extend_from_slice(&self.part.to_be_bytes());
        for register in &self.registers {
            out.extend_from_slice(&register.to_be_bytes());
        }
        for task in &self.tasks {
            out.extend_from_slice(&task.entry.unwrap_or(UNSCHEDULED).to_be_bytes());
            out.push(task.paused as u8);
        }
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        if bytes.len() != ENCODED_LEN {
            return Err(SnapshotError::Length { len: bytes.len(), expected: ENCODED_LEN });
        }
        if &bytes[..4] != MAGIC {
            return Err(SnapshotError::Magic);
        }
        if bytes[4] != VERSION {
            return Err(SnapshotError::Version(bytes[4]));
        }

        let word = |at: usize| u16::from_be_bytes([bytes[at], bytes[at + 1]]);
        let part = word(5);

        let mut registers = [0i16; REGISTER_COUNT];
        let base = 7;
        for (i, register) in registers.iter_mut().enumerate() {
            *register = word(base + i * 2) as i16;
        }

        let mut tasks = [TaskSlot::default(); TASK_COUNT];
        let base = base + REGISTER_COUNT * 2;
        for (i, task) in tasks.iter_mut().enumerate() {
            let at = base + i * 3;
            let entry = word(at);
            task.entry = (entry != UNSCHEDULED).then_some(entry);
            task.paused = bytes[at + 2] != 0;
        }

        Ok(Snapshot { part, registers, tasks })
    }
}
