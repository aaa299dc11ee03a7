//! Script bytecode for the VGE virtual machine.
//!
//! Instructions are decoded once into [`Instruction`] by [`decode`], which
//! fetches operands in exactly the order the content compiler laid them out.
//! [`encode`] is the inverse and is what tests and tooling use to produce
//! code segments.
#![no_std]
#![allow(clippy::single_match)]
extern crate alloc;
#[cfg(test)]
#[macro_use]
extern crate std;

pub mod cursor;
pub mod instructions;
pub mod decode;
pub mod encode;

pub use cursor::{ByteCursor, DecodeError};
pub use decode::decode;
pub use encode::{encode, Assembler};
pub use instructions::{Condition, Instruction, Operand, Zoom};

/// Zoom value meaning 100%.
pub const ZOOM_UNIT: u16 = 0x40;

/// Highest numbered instruction.
pub const LAST_OPCODE: u8 = 0x1A;
