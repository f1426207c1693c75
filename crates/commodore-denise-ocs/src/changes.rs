//! Pixel-keyed register change queues.
//!
//! Denise renders a whole line at once after the line has ended. Writes that
//! land mid-line are therefore recorded with the pixel they become visible
//! at and replayed while the line is rendered.

use emu_core::ChangeRecorder;

/// Register touched by a recorded write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeniseReg {
    #[default]
    None,
    BplCon0,
    BplCon2,
    SprPos(u8),
    SprCtl(u8),
    SprData(u8),
    SprDatb(u8),
    Color(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PixelChange {
    pub reg: DeniseReg,
    pub value: u16,
}

// The bus carries at most one register write per DMA cycle, so a line of
// 227 cycles never records more than 227 changes into one queue.

/// BPLCON0/BPLCON2 writes of one line.
pub type ConChangeQueue = ChangeRecorder<PixelChange, 256>;
/// Sprite register writes of one sprite pair.
pub type SpriteChangeQueue = ChangeRecorder<PixelChange, 256>;
/// Colour register writes (and HAM switches) of one line.
pub type ColorChangeQueue = ChangeRecorder<PixelChange, 512>;
