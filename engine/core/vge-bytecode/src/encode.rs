use alloc::vec::Vec;

use crate::instructions::{Instruction, Operand, Zoom};

/// Append the encoding of `insn` to `out`.
///
/// Draw offsets must be even; the instruction stream stores them halved.
pub fn encode(insn: &Instruction, out: &mut Vec<u8>) {
    use Instruction::*;

    if let Some(op) = insn.opcode() {
        out.push(op);
    }

    match *insn {
        MoveConst { dst, value } | AddConst { dst, value } => {
            out.push(dst);
            out.extend_from_slice(&value.to_be_bytes());
        }
        Move { dst, src } | Add { dst, src } | Sub { dst, src } => {
            out.push(dst);
            out.push(src);
        }
        Call { target } | Jump { target } => out.extend_from_slice(&target.to_be_bytes()),
        Return | Yield | Kill => {}
        StartTask { task, target } => {
            out.push(task);
            out.extend_from_slice(&target.to_be_bytes());
        }
        DecrementJumpNonZero { counter, target } => {
            out.push(counter);
            out.extend_from_slice(&target.to_be_bytes());
        }
        JumpIf { condition, lhs, rhs, target } => {
            let width = match rhs {
                Operand::Register(_) => 0x80,
                Operand::Word(_) => 0x40,
                Operand::Byte(_) => 0x00,
            };
            out.push(width | condition.bits());
            out.push(lhs);
            match rhs {
                Operand::Register(r) => out.push(r),
                Operand::Word(v) => out.extend_from_slice(&v.to_be_bytes()),
                Operand::Byte(v) => out.push(v as i8 as u8),
            }
            out.extend_from_slice(&target.to_be_bytes());
        }
        SetPalette { value } | LoadResource { resource: value } => out.extend_from_slice(&value.to_be_bytes()),
        ChangeTasks { first, last, state } => out.extend_from_slice(&[first, last, state]),
        SelectPage { page } | UpdateDisplay { page } => out.push(page),
        FillPage { page, color } => out.extend_from_slice(&[page, color]),
        CopyPage { src, dst } => out.extend_from_slice(&[src, dst]),
        DrawString { string, x, y, color } => {
            out.extend_from_slice(&string.to_be_bytes());
            out.extend_from_slice(&[x, y, color]);
        }
        And { dst, mask } | Or { dst, mask } | Shl { dst, shift: mask } | Shr { dst, shift: mask } => {
            out.push(dst);
            out.extend_from_slice(&mask.to_be_bytes());
        }
        PlaySound { resource, freq, volume, channel } => {
            out.extend_from_slice(&resource.to_be_bytes());
            out.extend_from_slice(&[freq, volume, channel]);
        }
        PlayMusic { resource, delay, position } => {
            out.extend_from_slice(&resource.to_be_bytes());
            out.extend_from_slice(&delay.to_be_bytes());
            out.push(position);
        }
        DrawBackgroundShape { offset, x, y } => {
            let half = (offset >> 1) & 0x7FFF;
            out.push(0x80 | (half >> 8) as u8);
            out.push(half as u8);
            out.extend_from_slice(&[x, y]);
        }
        DrawShape { offset, x, y, zoom } => encode_shape(offset, x, y, zoom, out),
    }
}

fn encode_shape(offset: u16, x: Operand, y: Operand, zoom: Zoom, out: &mut Vec<u8>) {
    let mut opcode = 0x40u8;
    let mut operands = Vec::with_capacity(6);

    operands.extend_from_slice(&(offset >> 1).to_be_bytes());

    match x {
        Operand::Word(v) => operands.extend_from_slice(&v.to_be_bytes()),
        Operand::Register(r) => {
            opcode |= 0x10;
            operands.push(r);
        }
        Operand::Byte(v) if v >= 0x100 => {
            opcode |= 0x30;
            operands.push((v - 0x100) as u8);
        }
        Operand::Byte(v) => {
            opcode |= 0x20;
            operands.push(v as u8);
        }
    }

    match y {
        Operand::Word(v) => operands.extend_from_slice(&v.to_be_bytes()),
        Operand::Register(r) => {
            opcode |= 0x04;
            operands.push(r);
        }
        Operand::Byte(v) => {
            opcode |= 0x08;
            operands.push(v as u8);
        }
    }

    match zoom {
        Zoom::Default => {}
        Zoom::Register(r) => {
            opcode |= 0x01;
            operands.push(r);
        }
        Zoom::Immediate(z) => {
            opcode |= 0x02;
            operands.push(z);
        }
        Zoom::AltSegment => opcode |= 0x03,
    }

    out.push(opcode);
    out.extend_from_slice(&operands);
}

/// Builds a code segment instruction by instruction.
#[derive(Debug, Default, Clone)]
pub struct Assembler {
    code: Vec<u8>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset the next instruction will be placed at.
    pub fn here(&self) -> u16 {
        self.code.len() as u16
    }

    pub fn emit(&mut self, insn: Instruction) -> &mut Self {
        encode(&insn, &mut self.code);
        self
    }

    /// Pad with zero bytes up to `offset`.
    pub fn align_to(&mut self, offset: u16) -> &mut Self {
        if self.code.len() < offset as usize {
            self.code.resize(offset as usize, 0);
        }
        self
    }

    /// Overwrite the trailing 16-bit jump target of the instruction at `at`.
    pub fn patch_target(&mut self, at: u16, target: u16) -> &mut Self {
        let mut cursor = crate::ByteCursor::new(&self.code, at);
        if crate::decode(&mut cursor).is_ok() {
            let end = cursor.pos() as usize;
            self.code[end - 2..end].copy_from_slice(&target.to_be_bytes());
        }
        self
    }

    pub fn finish(&self) -> Vec<u8> {
        self.code.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decode, ByteCursor, Condition};
    use proptest::prelude::*;

    fn round_trip(insn: Instruction) -> (Instruction, usize) {
        let mut bytes = Vec::new();
        encode(&insn, &mut bytes);
        let mut cursor = ByteCursor::new(&bytes, 0);
        let decoded = decode(&mut cursor).expect("decodes");
        assert_eq!(cursor.pos() as usize, bytes.len());
        (decoded, bytes.len())
    }

    #[test]
    fn patch_target_rewrites_forward_jump() {
        let mut asm = Assembler::new();
        let jump = asm.here();
        asm.emit(Instruction::Jump { target: 0 });
        asm.emit(Instruction::Yield);
        let end = asm.here();
        asm.patch_target(jump, end);
        assert_eq!(asm.finish(), [0x07, 0x00, 0x04, 0x06]);
    }

    #[test]
    fn shape_forms_survive_encoding() {
        let shapes = [
            Instruction::DrawShape { offset: 0x100, x: Operand::Byte(300), y: Operand::Byte(20), zoom: Zoom::AltSegment },
            Instruction::DrawShape { offset: 0x100, x: Operand::Word(-5), y: Operand::Register(3), zoom: Zoom::Immediate(32) },
            Instruction::DrawBackgroundShape { offset: 0xFFFE, x: 1, y: 250 },
        ];
        for shape in shapes {
            assert_eq!(round_trip(shape).0, shape);
        }
    }

    proptest! {
        #[test]
        fn jump_if_length_only_depends_on_operand_form(
            cond in 0u8..8,
            lhs in any::<u8>(),
            value in any::<i16>(),
            target in any::<u16>(),
        ) {
            let condition = Condition::from_bits(cond);
            let (_, reg_len) = round_trip(Instruction::JumpIf { condition, lhs, rhs: Operand::Register(value as u8), target });
            let (_, byte_len) = round_trip(Instruction::JumpIf { condition, lhs, rhs: Operand::Byte(value as i8 as i16), target });
            let (decoded, word_len) = round_trip(Instruction::JumpIf { condition, lhs, rhs: Operand::Word(value), target });
            prop_assert_eq!(reg_len, 6);
            prop_assert_eq!(byte_len, 6);
            prop_assert_eq!(word_len, 7);
            prop_assert_eq!(decoded, Instruction::JumpIf { condition, lhs, rhs: Operand::Word(value), target });
        }
    }
}
