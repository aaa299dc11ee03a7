#![no_std]
#![allow(clippy::single_match)]
extern crate alloc;
#[cfg(test)]
#[macro_use]
extern crate std;

pub mod error;
pub mod host;
pub mod pages;
pub mod palette;
pub mod raster;
pub mod shapes;
pub mod text;
pub mod registers;
pub mod tasks;
pub mod interpreter;
pub mod engine;
pub mod snapshot;
pub mod audio_queue;

pub use engine::{Engine, EngineConfig, VmState};
pub use error::{EngineError, Fault, ResourceError, ShapeError, SnapshotError};
pub use host::{AudioSink, Presenter, ResourceProvider, SnapshotStore};
pub use interpreter::StepResult;
pub use palette::{Palette, Rgb};
pub use registers::PlayerInput;
pub use snapshot::Snapshot;

/// Parts are numbered from here; a load-resource id above it requests a part switch.
pub const PART_BASE: u16 = 16000;
