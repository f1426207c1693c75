//! Commodore Denise OCS: bitplane shifter, playfield priority and colour output.
//!
//! Denise receives bitplane and sprite data from Agnus DMA, shifts it out
//! into per-line pixel buffers, resolves playfield and sprite priority,
//! latches collisions, and turns the result into ARGB32 pixels.

mod changes;
mod colors;
mod denise;
mod playfield;
mod sprites;

pub use changes::{ColorChangeQueue, ConChangeQueue, DeniseReg, PixelChange, SpriteChangeQueue};
pub use colors::{ColorStage, rgb12_to_argb32};
pub use denise::{Accessor, BorderState, DeniseOcs, FB_HEIGHT, FB_WIDTH};
pub use playfield::{PixelBuffers, bpu};

/// Framebuffer pixels per raster line (four per DMA cycle).
pub const HPIXELS: usize = 908;
/// Last pixel of a line.
pub const LAST_PIXEL: usize = HPIXELS - 1;
/// Pixel buffer length. Fetches near the line end draw past `HPIXELS`.
pub const BUFFER_LEN: usize = HPIXELS + 4 * 16 + 6;
/// Lines above this one are vertical blank.
pub const FIRST_VISIBLE_LINE: u16 = 26;

/// First pixel drawn for DMA cycle `h`.
#[must_use]
pub const fn ppos(h: u16) -> usize {
    h as usize * 4 + 2
}
