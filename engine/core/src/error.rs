use alloc::string::String;
use thiserror::Error;
use vge_bytecode::DecodeError;

/// Which segment of a part a resource error refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    Code,
    Video,
    AltVideo,
    Palette,
}

impl core::fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            SegmentKind::Code => "code",
            SegmentKind::Video => "video",
            SegmentKind::AltVideo => "alternate video",
            SegmentKind::Palette => "palette",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("part {part} has no {segment} segment")]
    MissingSegment { part: u16, segment: SegmentKind },
    #[error("resource {id} unavailable: {reason}")]
    Unavailable { id: u16, reason: String },
}

/// Shape data that cannot be walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("shape record at {offset:#06x} runs past the segment end")]
    Truncated { offset: u16 },
    #[error("polygon at {offset:#06x} has {count} vertices, more than a strip holds")]
    TooManyVertices { offset: u16, count: u8 },
    #[error("shape groups nest deeper than {0} levels")]
    Nesting(u8),
    #[error("alternate video segment requested but the part has none")]
    NoAltSegment,
}

/// A content error that stops the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Fault {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("call stack overflow")]
    StackOverflow,
    #[error("return with an empty call stack")]
    StackUnderflow,
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is {len} bytes, expected {expected}")]
    Length { len: usize, expected: usize },
    #[error("bad snapshot magic")]
    Magic,
    #[error("unsupported snapshot version {0}")]
    Version(u8),
    #[error("snapshot store: {0}")]
    Store(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("task {task} faulted at {ip:#06x} (opcode {opcode:#04x}): {fault}")]
    Script { task: u8, ip: u16, opcode: u8, fault: Fault },
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("no part loaded")]
    NoPart,
}
