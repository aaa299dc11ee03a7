use core::fmt::{Display, Formatter};

/// A value operand as it is encoded in the instruction stream.
///
/// The encoded width is part of the instruction's identity since it decides
/// how many bytes the instruction occupies.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operand {
    Register(u8),
    /// One encoded byte. Draw-shape x coordinates carry an extra high bit in
    /// the opcode, so the value may reach 511 there.
    Byte(i16),
    /// Two encoded bytes.
    Word(i16),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Zoom {
    /// 100%, no operand byte.
    Default,
    Immediate(u8),
    Register(u8),
    /// 100%, shape read from the alternate video segment.
    AltSegment,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Condition {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    /// Predicate values 6 and 7 never jump.
    Never(u8),
}

impl Condition {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 7 {
            0 => Condition::Eq,
            1 => Condition::Ne,
            2 => Condition::Gt,
            3 => Condition::Ge,
            4 => Condition::Lt,
            5 => Condition::Le,
            other => Condition::Never(other),
        }
    }

    pub fn bits(&self) -> u8 {
        match self {
            Condition::Eq => 0,
            Condition::Ne => 1,
            Condition::Gt => 2,
            Condition::Ge => 3,
            Condition::Lt => 4,
            Condition::Le => 5,
            Condition::Never(bits) => bits & 7,
        }
    }

    pub fn holds(&self, lhs: i16, rhs: i16) -> bool {
        match self {
            Condition::Eq => lhs == rhs,
            Condition::Ne => lhs != rhs,
            Condition::Gt => lhs > rhs,
            Condition::Ge => lhs >= rhs,
            Condition::Lt => lhs < rhs,
            Condition::Le => lhs <= rhs,
            Condition::Never(_) => false,
        }
    }

    fn mnemonic(&self) -> &'static str {
        match self {
            Condition::Eq => "==",
            Condition::Ne => "!=",
            Condition::Gt => ">",
            Condition::Ge => ">=",
            Condition::Lt => "<",
            Condition::Le => "<=",
            Condition::Never(_) => "never",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Instruction {
    MoveConst { dst: u8, value: i16 },
    Move { dst: u8, src: u8 },
    Add { dst: u8, src: u8 },
    AddConst { dst: u8, value: i16 },
    Call { target: u16 },
    Return,
    Yield,
    Jump { target: u16 },
    StartTask { task: u8, target: u16 },
    DecrementJumpNonZero { counter: u8, target: u16 },
    JumpIf { condition: Condition, lhs: u8, rhs: Operand, target: u16 },
    /// The operand word's high byte is the palette number.
    SetPalette { value: u16 },
    ChangeTasks { first: u8, last: u8, state: u8 },
    SelectPage { page: u8 },
    FillPage { page: u8, color: u8 },
    CopyPage { src: u8, dst: u8 },
    UpdateDisplay { page: u8 },
    Kill,
    DrawString { string: u16, x: u8, y: u8, color: u8 },
    Sub { dst: u8, src: u8 },
    And { dst: u8, mask: u16 },
    Or { dst: u8, mask: u16 },
    Shl { dst: u8, shift: u16 },
    Shr { dst: u8, shift: u16 },
    PlaySound { resource: u16, freq: u8, volume: u8, channel: u8 },
    LoadResource { resource: u16 },
    PlayMusic { resource: u16, delay: u16, position: u8 },
    /// `offset` is the byte offset into the primary video segment, `x`/`y`
    /// are the raw operand bytes (see [`Instruction::background_position`]).
    DrawBackgroundShape { offset: u16, x: u8, y: u8 },
    DrawShape { offset: u16, x: Operand, y: Operand, zoom: Zoom },
}

impl Instruction {
    /// Number of a numbered instruction, `None` for the draw families.
    pub fn opcode(&self) -> Option<u8> {
        let op = match self {
            Instruction::MoveConst { .. } => 0x00,
            Instruction::Move { .. } => 0x01,
            Instruction::Add { .. } => 0x02,
            Instruction::AddConst { .. } => 0x03,
            Instruction::Call { .. } => 0x04,
            Instruction::Return => 0x05,
            Instruction::Yield => 0x06,
            Instruction::Jump { .. } => 0x07,
            Instruction::StartTask { .. } => 0x08,
            Instruction::DecrementJumpNonZero { .. } => 0x09,
            Instruction::JumpIf { .. } => 0x0A,
            Instruction::SetPalette { .. } => 0x0B,
            Instruction::ChangeTasks { .. } => 0x0C,
            Instruction::SelectPage { .. } => 0x0D,
            Instruction::FillPage { .. } => 0x0E,
            Instruction::CopyPage { .. } => 0x0F,
            Instruction::UpdateDisplay { .. } => 0x10,
            Instruction::Kill => 0x11,
            Instruction::DrawString { .. } => 0x12,
            Instruction::Sub { .. } => 0x13,
            Instruction::And { .. } => 0x14,
            Instruction::Or { .. } => 0x15,
            Instruction::Shl { .. } => 0x16,
            Instruction::Shr { .. } => 0x17,
            Instruction::PlaySound { .. } => 0x18,
            Instruction::LoadResource { .. } => 0x19,
            Instruction::PlayMusic { .. } => 0x1A,
            Instruction::DrawBackgroundShape { .. } | Instruction::DrawShape { .. } => return None,
        };
        Some(op)
    }

    /// Background shapes anchored below the last row slide right by the
    /// overflow and sit on row 199.
    pub fn background_position(x: u8, y: u8) -> (i16, i16) {
        let (mut x, mut y) = (x as i16, y as i16);
        let overflow = y - 199;
        if overflow > 0 {
            y = 199;
            x += overflow;
        }
        (x, y)
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Operand::Register(r) => write!(f, "v{r:#04x}"),
            Operand::Byte(v) | Operand::Word(v) => write!(f, "{v}"),
        }
    }
}

impl Display for Zoom {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Zoom::Default => write!(f, "64"),
            Zoom::Immediate(z) => write!(f, "{z}"),
            Zoom::Register(r) => write!(f, "v{r:#04x}"),
            Zoom::AltSegment => write!(f, "64 [alt]"),
        }
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        use Instruction::*;
        match *self {
            MoveConst { dst, value } => write!(f, "mov v{dst:#04x}, {value}"),
            Move { dst, src } => write!(f, "mov v{dst:#04x}, v{src:#04x}"),
            Add { dst, src } => write!(f, "add v{dst:#04x}, v{src:#04x}"),
            AddConst { dst, value } => write!(f, "add v{dst:#04x}, {value}"),
            Call { target } => write!(f, "call {target:#06x}"),
            Return => write!(f, "ret"),
            Yield => write!(f, "yield"),
            Jump { target } => write!(f, "jmp {target:#06x}"),
            StartTask { task, target } => write!(f, "task {task}, {target:#06x}"),
            DecrementJumpNonZero { counter, target } => write!(f, "dbra v{counter:#04x}, {target:#06x}"),
            JumpIf { condition, lhs, rhs, target } => {
                write!(f, "jif v{lhs:#04x} {} {rhs}, {target:#06x}", condition.mnemonic())
            }
            SetPalette { value } => write!(f, "palette {}", value >> 8),
            ChangeTasks { first, last, state } => write!(f, "tasks {first}..={last}, {state}"),
            SelectPage { page } => write!(f, "page {page:#04x}"),
            FillPage { page, color } => write!(f, "fill {page:#04x}, {color}"),
            CopyPage { src, dst } => write!(f, "copy {src:#04x}, {dst:#04x}"),
            UpdateDisplay { page } => write!(f, "display {page:#04x}"),
            Kill => write!(f, "kill"),
            DrawString { string, x, y, color } => write!(f, "text {string:#06x}, {x}, {y}, {color}"),
            Sub { dst, src } => write!(f, "sub v{dst:#04x}, v{src:#04x}"),
            And { dst, mask } => write!(f, "and v{dst:#04x}, {mask:#06x}"),
            Or { dst, mask } => write!(f, "or v{dst:#04x}, {mask:#06x}"),
            Shl { dst, shift } => write!(f, "shl v{dst:#04x}, {shift}"),
            Shr { dst, shift } => write!(f, "shr v{dst:#04x}, {shift}"),
            PlaySound { resource, freq, volume, channel } => {
                write!(f, "sound {resource:#06x}, {freq}, {volume}, {channel}")
            }
            LoadResource { resource } => write!(f, "load {resource}"),
            PlayMusic { resource, delay, position } => write!(f, "music {resource:#06x}, {delay}, {position}"),
            DrawBackgroundShape { offset, x, y } => {
                let (x, y) = Instruction::background_position(x, y);
                write!(f, "bgshape {offset:#06x}, {x}, {y}")
            }
            DrawShape { offset, x, y, zoom } => write!(f, "shape {offset:#06x}, {x}, {y}, {zoom}"),
        }
    }
}
