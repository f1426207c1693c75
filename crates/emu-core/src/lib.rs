//! Core traits and types for cycle-accurate chipset emulation.
//!
//! Everything advances in DMA cycles. Beam positions, register latencies and
//! pixel columns all derive from the cycle counter. No exceptions.

mod bus;
mod observable;
mod recorder;
mod tickable;
mod ticks;

pub use bus::ChipBus;
pub use observable::{Observable, Value};
pub use recorder::ChangeRecorder;
pub use tickable::Tickable;
pub use ticks::Ticks;
