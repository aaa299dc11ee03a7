use heapless::Vec;

use crate::error::Fault;

pub const REGISTER_COUNT: usize = 256;
pub const CALL_STACK_DEPTH: usize = 64;

/// Registers with a fixed meaning to the engine.
pub mod var {
    pub const RANDOM_SEED: u8 = 0x3C;
    pub const LAST_KEYCHAR: u8 = 0xDA;
    pub const HERO_POS_UP_DOWN: u8 = 0xE5;
    pub const MUSIC_SYNC: u8 = 0xF4;
    /// Cleared by every display update.
    pub const FRAME_FLAG: u8 = 0xF7;
    pub const SCROLL_Y: u8 = 0xF9;
    pub const HERO_ACTION: u8 = 0xFA;
    pub const HERO_POS_JUMP_DOWN: u8 = 0xFB;
    pub const HERO_POS_LEFT_RIGHT: u8 = 0xFC;
    pub const HERO_POS_MASK: u8 = 0xFD;
    pub const HERO_ACTION_POS_MASK: u8 = 0xFE;
    /// Frame pacing, in 20ms slices.
    pub const PAUSE_SLICES: u8 = 0xFF;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers(pub [i16; REGISTER_COUNT]);

impl Default for Registers {
    fn default() -> Self {
        Self([0; REGISTER_COUNT])
    }
}

impl Registers {
    #[inline(always)]
    pub fn get(&self, index: u8) -> i16 {
        self.0[index as usize]
    }

    #[inline(always)]
    pub fn set(&mut self, index: u8, value: i16) {
        self.0[index as usize] = value;
    }

    pub fn clear(&mut self) {
        self.0 = [0; REGISTER_COUNT];
    }

    /// Mirror the player's controls into the input registers.
    pub fn apply_input(&mut self, input: &PlayerInput) {
        let mut left_right = 0;
        let mut up_down = 0;
        let mut mask = 0;

        if input.right {
            left_right = 1;
            mask |= 1;
        }
        if input.left {
            left_right = -1;
            mask |= 2;
        }
        if input.down {
            up_down = 1;
            mask |= 4;
        }
        if input.up {
            up_down = -1;
            mask |= 8;
        }

        self.set(var::HERO_POS_UP_DOWN, up_down);
        self.set(var::HERO_POS_JUMP_DOWN, up_down);
        self.set(var::HERO_POS_LEFT_RIGHT, left_right);
        self.set(var::HERO_POS_MASK, mask);

        let mut action = 0;
        if input.action {
            action = 1;
            mask |= 0x80;
        }
        self.set(var::HERO_ACTION, action);
        self.set(var::HERO_ACTION_POS_MASK, mask);

        if let Some(key) = input.last_char {
            self.set(var::LAST_KEYCHAR, key as i16);
        }
    }
}

/// Controller state sampled once per frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct PlayerInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub action: bool,
    pub last_char: Option<u8>,
}

/// Return addresses for `call`, reset whenever a task starts running.
#[derive(Debug, Clone, Default)]
pub struct CallStack(Vec<u16, CALL_STACK_DEPTH>);

impl CallStack {
    pub fn push(&mut self, ret: u16) -> Result<(), Fault> {
        self.0.push(ret).map_err(|_| Fault::StackOverflow)
    }

    pub fn pop(&mut self) -> Result<u16, Fault> {
        self.0.pop().ok_or(Fault::StackUnderflow)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}
