use bit_field::BitField;

use crate::cursor::{ByteCursor, DecodeError};
use crate::instructions::{Condition, Instruction, Operand, Zoom};
use crate::LAST_OPCODE;

/// Decode the instruction at the cursor, leaving the cursor on the next one.
pub fn decode(cursor: &mut ByteCursor) -> Result<Instruction, DecodeError> {
    let start = cursor.pos() as usize;
    let opcode = cursor.fetch_byte()?;

    if opcode.get_bit(7) {
        return decode_background_shape(opcode, cursor);
    }
    if opcode.get_bit(6) {
        return decode_shape(opcode, cursor);
    }
    if opcode > LAST_OPCODE {
        return Err(DecodeError::UndefinedInstruction { offset: start, opcode });
    }

    let insn = match opcode {
        0x00 => Instruction::MoveConst { dst: cursor.fetch_byte()?, value: cursor.fetch_word()? as i16 },
        0x01 => Instruction::Move { dst: cursor.fetch_byte()?, src: cursor.fetch_byte()? },
        0x02 => Instruction::Add { dst: cursor.fetch_byte()?, src: cursor.fetch_byte()? },
        0x03 => Instruction::AddConst { dst: cursor.fetch_byte()?, value: cursor.fetch_word()? as i16 },
        0x04 => Instruction::Call { target: cursor.fetch_word()? },
        0x05 => Instruction::Return,
        0x06 => Instruction::Yield,
        0x07 => Instruction::Jump { target: cursor.fetch_word()? },
        0x08 => Instruction::StartTask { task: cursor.fetch_byte()?, target: cursor.fetch_word()? },
        0x09 => Instruction::DecrementJumpNonZero { counter: cursor.fetch_byte()?, target: cursor.fetch_word()? },
        0x0A => decode_jump_if(cursor)?,
        0x0B => Instruction::SetPalette { value: cursor.fetch_word()? },
        0x0C => Instruction::ChangeTasks {
            first: cursor.fetch_byte()?,
            last: cursor.fetch_byte()?,
            state: cursor.fetch_byte()?,
        },
        0x0D => Instruction::SelectPage { page: cursor.fetch_byte()? },
        0x0E => Instruction::FillPage { page: cursor.fetch_byte()?, color: cursor.fetch_byte()? },
        0x0F => Instruction::CopyPage { src: cursor.fetch_byte()?, dst: cursor.fetch_byte()? },
        0x10 => Instruction::UpdateDisplay { page: cursor.fetch_byte()? },
        0x11 => Instruction::Kill,
        0x12 => Instruction::DrawString {
            string: cursor.fetch_word()?,
            x: cursor.fetch_byte()?,
            y: cursor.fetch_byte()?,
            color: cursor.fetch_byte()?,
        },
        0x13 => Instruction::Sub { dst: cursor.fetch_byte()?, src: cursor.fetch_byte()? },
        0x14 => Instruction::And { dst: cursor.fetch_byte()?, mask: cursor.fetch_word()? },
        0x15 => Instruction::Or { dst: cursor.fetch_byte()?, mask: cursor.fetch_word()? },
        0x16 => Instruction::Shl { dst: cursor.fetch_byte()?, shift: cursor.fetch_word()? },
        0x17 => Instruction::Shr { dst: cursor.fetch_byte()?, shift: cursor.fetch_word()? },
        0x18 => Instruction::PlaySound {
            resource: cursor.fetch_word()?,
            freq: cursor.fetch_byte()?,
            volume: cursor.fetch_byte()?,
            channel: cursor.fetch_byte()?,
        },
        0x19 => Instruction::LoadResource { resource: cursor.fetch_word()? },
        0x1A => Instruction::PlayMusic {
            resource: cursor.fetch_word()?,
            delay: cursor.fetch_word()?,
            position: cursor.fetch_byte()?,
        },
        _ => unreachable!("opcode range checked above"),
    };

    Ok(insn)
}

fn decode_jump_if(cursor: &mut ByteCursor) -> Result<Instruction, DecodeError> {
    let flags = cursor.fetch_byte()?;
    let lhs = cursor.fetch_byte()?;
    let rhs = if flags.get_bit(7) {
        Operand::Register(cursor.fetch_byte()?)
    } else if flags.get_bit(6) {
        Operand::Word(cursor.fetch_word()? as i16)
    } else {
        Operand::Byte(cursor.fetch_byte()? as i8 as i16)
    };
    // the target is fetched whether or not the branch is taken
    let target = cursor.fetch_word()?;

    Ok(Instruction::JumpIf { condition: Condition::from_bits(flags), lhs, rhs, target })
}

fn decode_background_shape(opcode: u8, cursor: &mut ByteCursor) -> Result<Instruction, DecodeError> {
    let lo = cursor.fetch_byte()?;
    let offset = u16::from_be_bytes([opcode, lo]).wrapping_mul(2);
    let x = cursor.fetch_byte()?;
    let y = cursor.fetch_byte()?;
    Ok(Instruction::DrawBackgroundShape { offset, x, y })
}

fn decode_shape(opcode: u8, cursor: &mut ByteCursor) -> Result<Instruction, DecodeError> {
    let offset = cursor.fetch_word()?.wrapping_mul(2);

    let first = cursor.fetch_byte()?;
    let x = match opcode.get_bits(4..6) {
        0b00 => Operand::Word(u16::from_be_bytes([first, cursor.fetch_byte()?]) as i16),
        0b01 => Operand::Register(first),
        0b10 => Operand::Byte(first as i16),
        _ => Operand::Byte(first as i16 + 0x100),
    };

    let first = cursor.fetch_byte()?;
    let y = match opcode.get_bits(2..4) {
        0b00 => Operand::Word(u16::from_be_bytes([first, cursor.fetch_byte()?]) as i16),
        0b01 => Operand::Register(first),
        _ => Operand::Byte(first as i16),
    };

    let zoom = match opcode.get_bits(0..2) {
        0b00 => Zoom::Default,
        0b01 => Zoom::Register(cursor.fetch_byte()?),
        0b10 => Zoom::Immediate(cursor.fetch_byte()?),
        _ => Zoom::AltSegment,
    };

    Ok(Instruction::DrawShape { offset, x, y, zoom })
}
