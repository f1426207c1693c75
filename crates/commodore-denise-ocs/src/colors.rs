//! Colour registers, HAM decoding, and ARGB32 conversion.

use crate::changes::{ColorChangeQueue, DeniseReg, PixelChange};
use crate::playfield::sprite_in_front;

const BPLCON0_HAM: u16 = 0x0800;

/// Expand a 12-bit Amiga colour to opaque ARGB32.
#[must_use]
pub fn rgb12_to_argb32(rgb12: u16) -> u32 {
    let r = ((rgb12 >> 8) & 0xF) as u8;
    let g = ((rgb12 >> 4) & 0xF) as u8;
    let b = (rgb12 & 0xF) as u8;
    let r8 = (r << 4) | r;
    let g8 = (g << 4) | g;
    let b8 = (b << 4) | b;
    0xFF00_0000 | (u32::from(r8) << 16) | (u32::from(g8) << 8) | u32::from(b8)
}

fn half_bright(rgb12: u16) -> u16 {
    (rgb12 >> 1) & 0x777
}

/// The colour registers as seen while a line is rendered.
#[derive(Clone)]
pub struct ColorStage {
    palette: [u16; 32],
    /// 0..32: the registers, 32..64: the same at half brightness.
    argb: [u32; 64],
    pub changes: ColorChangeQueue,
    ham: bool,
}

impl ColorStage {
    #[must_use]
    pub fn new() -> Self {
        let mut stage = Self {
            palette: [0; 32],
            argb: [0; 64],
            changes: ColorChangeQueue::new(),
            ham: false,
        };
        for n in 0..32 {
            stage.set_color(n, 0);
        }
        stage
    }

    #[must_use]
    pub fn palette(&self) -> &[u16; 32] {
        &self.palette
    }

    #[must_use]
    pub fn argb(&self, index: u8) -> u32 {
        self.argb[usize::from(index & 0x3F)]
    }

    pub fn set_color(&mut self, n: usize, value: u16) {
        let value = value & 0x0FFF;
        self.palette[n] = value;
        self.argb[n] = rgb12_to_argb32(value);
        self.argb[n + 32] = rgb12_to_argb32(half_bright(value));
    }

    fn apply(&mut self, change: PixelChange) {
        match change.reg {
            DeniseReg::Color(n) => self.set_color(usize::from(n), change.value),
            DeniseReg::BplCon0 => self.ham = change.value & BPLCON0_HAM != 0,
            _ => {}
        }
    }

    /// Apply every pending change without drawing.
    pub fn apply_pending(&mut self) {
        while let Some((_, change)) = self.changes.pop() {
            self.apply(change);
        }
    }

    /// Convert one line of colour indices into `dst`.
    ///
    /// `playfield` holds the indices before sprites were drawn, `mixed` the
    /// indices after and `z` the depth of every pixel. In HAM mode a pixel
    /// covered by a sprite still advances the hold register.
    pub fn colorize(
        &mut self,
        dst: &mut [u32],
        playfield: &[u8],
        mixed: &[u8],
        z: &[u16],
        bplcon0: u16,
    ) {
        self.ham = bplcon0 & BPLCON0_HAM != 0;
        let mut hold = self.palette[0];
        let mut pixel = 0;

        while let Some((trigger, change)) = self.changes.pop() {
            let to = (trigger as usize).min(dst.len());
            self.colorize_range(dst, playfield, mixed, z, pixel, to, &mut hold);
            pixel = pixel.max(to);
            self.apply(change);
        }
        let end = dst.len();
        self.colorize_range(dst, playfield, mixed, z, pixel, end, &mut hold);
    }

    fn colorize_range(
        &self,
        dst: &mut [u32],
        playfield: &[u8],
        mixed: &[u8],
        z: &[u16],
        from: usize,
        to: usize,
        hold: &mut u16,
    ) {
        if !self.ham {
            for p in from..to {
                dst[p] = self.argb(mixed[p]);
            }
            return;
        }
        for p in from..to {
            let index = playfield[p];
            let data = u16::from(index & 0xF);
            *hold = match (index >> 4) & 0b11 {
                0 => self.palette[usize::from(index & 0xF)],
                1 => (*hold & 0xFF0) | data,
                2 => (*hold & 0x0FF) | (data << 8),
                _ => (*hold & 0xF0F) | (data << 4),
            };
            dst[p] = if sprite_in_front(z[p]) {
                self.argb(mixed[p])
            } else {
                rgb12_to_argb32(*hold)
            };
        }
    }
}

impl Default for ColorStage {
    fn default() -> Self {
        Self::new()
    }
}
