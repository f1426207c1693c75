//! Denise register file, bitplane shifter, and line pipeline.

use std::fmt;

use log::trace;

use crate::changes::{ConChangeQueue, DeniseReg, PixelChange};
use crate::colors::ColorStage;
use crate::playfield::{PixelBuffers, Priorities, bpu};
use crate::sprites::{SpriteUnit, check_playfield_pair};
use crate::{BUFFER_LEN, FIRST_VISIBLE_LINE, HPIXELS, ppos};

pub const FB_WIDTH: u32 = HPIXELS as u32;
/// One row per line of a long PAL field plus one spare.
pub const FB_HEIGHT: u32 = 313 + 1;

const BPLCON0_HIRES: u16 = 0x8000;
const BPLCON0_HAM: u16 = 0x0800;

const VBLANK_ARGB: u32 = 0xFF00_0000;

// Plane masks per bitplane count. Odd planes are 1/3/5 (bits 0/2/4).
const ODD_MASKS: [u8; 7] = [0b00_0000, 0b00_0001, 0b00_0001, 0b00_0101, 0b00_0101, 0b01_0101, 0b01_0101];
const EVEN_MASKS: [u8; 7] = [0b00_0000, 0b00_0000, 0b00_0010, 0b00_0010, 0b00_1010, 0b00_1010, 0b10_1010];
const BOTH_MASKS: [u8; 7] = [0b00_0000, 0b00_0001, 0b00_0011, 0b00_0111, 0b00_1111, 0b01_1111, 0b11_1111];

/// Who performs a register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accessor {
    Cpu,
    /// Copper or DMA.
    Agnus,
}

/// Display window flip-flops of the line being finished.
///
/// Horizontal positions are in lores pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BorderState {
    pub v_flop: bool,
    pub h_flop: bool,
    pub h_flop_on: Option<u16>,
    pub h_flop_off: Option<u16>,
}

impl BorderState {
    /// A window that covers the whole line.
    pub const OPEN: Self = Self {
        v_flop: true,
        h_flop: true,
        h_flop_on: None,
        h_flop_off: None,
    };
}

pub struct DeniseOcs {
    pub bplcon0: u16,
    pub bplcon1: u16,
    pub bplcon2: u16,
    pub clxcon: u16,
    pub clxdat: u16,
    pub bpldat: [u16; 6],
    /// Colour registers as last written.
    pub colors: [u16; 32],
    pub framebuffer: Vec<u32>,
    pub pixels: PixelBuffers,

    shift_reg: [u16; 6],
    /// Shift register contents transposed: one 6-bit value per pixel.
    slice: [u8; 16],
    armed_odd: bool,
    armed_even: bool,
    pixel_offset_odd: usize,
    pixel_offset_even: usize,

    initial_bplcon0: u16,
    initial_bplcon2: u16,
    con_changes: ConChangeQueue,
    sprites: SpriteUnit,
    sprite_clip: (usize, usize),
    stage: ColorStage,
}

impl DeniseOcs {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bplcon0: 0,
            bplcon1: 0,
            bplcon2: 0,
            clxcon: 0,
            clxdat: 0,
            bpldat: [0; 6],
            colors: [0; 32],
            framebuffer: vec![VBLANK_ARGB; (FB_WIDTH * FB_HEIGHT) as usize],
            pixels: PixelBuffers::new(),
            shift_reg: [0; 6],
            slice: [0; 16],
            armed_odd: false,
            armed_even: false,
            pixel_offset_odd: 0,
            pixel_offset_even: 0,
            initial_bplcon0: 0,
            initial_bplcon2: 0,
            con_changes: ConChangeQueue::new(),
            sprites: SpriteUnit::new(),
            sprite_clip: (HPIXELS, HPIXELS),
            stage: ColorStage::new(),
        }
    }

    #[must_use]
    pub fn hires(&self) -> bool {
        self.bplcon0 & BPLCON0_HIRES != 0
    }

    #[must_use]
    pub fn ham(&self) -> bool {
        self.bplcon0 & BPLCON0_HAM != 0
    }

    #[must_use]
    pub fn bpu(&self) -> u8 {
        bpu(self.bplcon0)
    }

    // -----------------------------------------------------------------
    // Registers
    // -----------------------------------------------------------------

    /// BPLCON0 as it reaches Denise during cycle `h`.
    pub fn set_bplcon0(&mut self, value: u16, h: u16) {
        let pixel = (4 * usize::from(h)).saturating_sub(4);
        let change = PixelChange { reg: DeniseReg::BplCon0, value };
        self.con_changes.insert(pixel as u64, change);
        if (self.bplcon0 ^ value) & BPLCON0_HAM != 0 {
            self.stage.changes.insert(pixel as u64, change);
        }
        self.bplcon0 = value;

        let raw = (value >> 12) & 0b111;
        let max = if value & BPLCON0_HIRES != 0 { 4 } else { 6 };
        if raw > max {
            trace!(target: "denise::line", "BPLCON0 {value:#06X}: illegal plane count {raw}");
        }
    }

    pub fn set_bplcon1(&mut self, value: u16) {
        self.bplcon1 = value & 0xFF;
        self.pixel_offset_odd = usize::from(self.bplcon1 & 0b0000_0001) << 1;
        self.pixel_offset_even = usize::from(self.bplcon1 & 0b0001_0000) >> 3;
    }

    /// BPLCON2 as it reaches Denise during cycle `h`.
    pub fn set_bplcon2(&mut self, value: u16, h: u16) {
        self.bplcon2 = value;
        let pixel = 4 * u64::from(h) + 4;
        self.con_changes
            .insert(pixel, PixelChange { reg: DeniseReg::BplCon2, value });
    }

    pub fn write_bpldat(&mut self, n: usize, value: u16) {
        self.bpldat[n] = value;
    }

    pub fn write_clxcon(&mut self, value: u16) {
        self.clxcon = value;
    }

    /// CLXDAT read. Bit 15 always reads as set; reading clears the latch.
    pub fn read_clxdat(&mut self) -> u16 {
        let value = self.clxdat | 0x8000;
        self.clxdat = 0;
        value
    }

    /// COLORxx write during cycle `h`. CPU writes land one cycle earlier
    /// than Copper writes.
    pub fn poke_color(&mut self, n: usize, value: u16, h: u16, accessor: Accessor) {
        let value = value & 0x0FFF;
        self.colors[n] = value;
        let pos = if accessor == Accessor::Cpu && h != 0 { h - 1 } else { h };
        self.stage.changes.insert(
            4 * u64::from(pos),
            PixelChange { reg: DeniseReg::Color(n as u8), value },
        );
    }

    fn record_sprite(&mut self, reg: DeniseReg, value: u16, h: u16) {
        let pixel = 4 * (usize::from(h) + 1);
        self.sprites.record(pixel, PixelChange { reg, value });
    }

    pub fn poke_sprpos(&mut self, x: usize, value: u16, h: u16) {
        self.record_sprite(DeniseReg::SprPos(x as u8), value, h);
    }

    pub fn poke_sprctl(&mut self, x: usize, value: u16, h: u16) {
        self.record_sprite(DeniseReg::SprCtl(x as u8), value, h);
    }

    pub fn poke_sprdata(&mut self, x: usize, value: u16, h: u16) {
        self.record_sprite(DeniseReg::SprData(x as u8), value, h);
    }

    pub fn poke_sprdatb(&mut self, x: usize, value: u16, h: u16) {
        self.record_sprite(DeniseReg::SprDatb(x as u8), value, h);
    }

    /// Sprite registers as applied so far: (POS, CTL, DATA, DATB).
    #[must_use]
    pub fn sprite_regs(&self, x: usize) -> (u16, u16, u16, u16) {
        let s = &self.sprites;
        (s.pos[x], s.ctl[x], s.data[x], s.datb[x])
    }

    // -----------------------------------------------------------------
    // Shifter
    // -----------------------------------------------------------------

    /// Load the shift registers from the data registers. Happens with the
    /// BPL1DAT transfer at the end of every fetch unit.
    pub fn fill_shift_registers(&mut self, odd: bool, even: bool, h: u16) {
        if odd {
            self.armed_odd = true;
        }
        if even {
            self.armed_even = true;
        }
        self.sprite_clip.0 = self.sprite_clip.0.min(ppos(h) + 2);

        let planes = usize::from(self.bpu());
        self.shift_reg[..planes].copy_from_slice(&self.bpldat[..planes]);

        for (i, pixel) in self.slice.iter_mut().enumerate() {
            let bit = 15 - i;
            *pixel = self
                .shift_reg
                .iter()
                .enumerate()
                .fold(0, |acc, (plane, reg)| acc | ((((reg >> bit) & 1) as u8) << plane));
        }
    }

    fn synthesize(&mut self, start: usize, mask: u8, keep: u8, hires: bool) {
        let b = &mut self.pixels.b;
        let mut p = start;
        for &bits in &self.slice {
            let index = bits & mask;
            let width = if hires { 1 } else { 2 };
            for _ in 0..width {
                debug_assert!(p < BUFFER_LEN, "pixel {p} outside the line buffer");
                b[p] = (b[p] & keep) | index;
                p += 1;
            }
        }
    }

    /// Shift out the odd planes of the current fetch unit.
    pub fn draw_odd(&mut self, h: u16, hires: bool) {
        if !self.armed_odd {
            return;
        }
        let mask = ODD_MASKS[usize::from(self.bpu())];
        self.synthesize(ppos(h) + self.pixel_offset_odd, mask, 0b10_1010, hires);
        self.armed_odd = false;
        self.shift_reg[0] = 0;
        self.shift_reg[2] = 0;
        self.shift_reg[4] = 0;
    }

    /// Shift out the even planes of the current fetch unit.
    pub fn draw_even(&mut self, h: u16, hires: bool) {
        if !self.armed_even {
            return;
        }
        let mask = EVEN_MASKS[usize::from(self.bpu())];
        self.synthesize(ppos(h) + self.pixel_offset_even, mask, 0b01_0101, hires);
        self.armed_even = false;
        self.shift_reg[1] = 0;
        self.shift_reg[3] = 0;
        self.shift_reg[5] = 0;
    }

    /// Shift out all planes at once if both halves line up.
    pub fn draw_both(&mut self, h: u16, hires: bool) {
        if self.armed_odd && self.armed_even && self.pixel_offset_odd == self.pixel_offset_even {
            let mask = BOTH_MASKS[usize::from(self.bpu())];
            self.synthesize(ppos(h) + self.pixel_offset_odd, mask, 0, hires);
            self.armed_odd = false;
            self.armed_even = false;
            self.shift_reg = [0; 6];
        } else {
            self.draw_odd(h, hires);
            self.draw_even(h, hires);
        }
    }

    // -----------------------------------------------------------------
    // Line pipeline
    // -----------------------------------------------------------------

    pub fn begin_of_line(&mut self) {
        self.con_changes.clear();
        self.stage.apply_pending();
        self.initial_bplcon0 = self.bplcon0;
        self.initial_bplcon2 = self.bplcon2;
        self.sprites.was_armed = self.sprites.armed;
        self.shift_reg = [0; 6];
        self.pixels.clear_bitplanes();
        self.sprite_clip = (HPIXELS, HPIXELS);
    }

    /// Render line `v` into the framebuffer.
    pub fn end_of_line(&mut self, v: u16, border: BorderState) {
        if v >= FIRST_VISIBLE_LINE {
            self.translate();
            self.sprites
                .draw(&mut self.pixels, self.sprite_clip, self.clxcon, &mut self.clxdat, true);
            self.draw_border(border);
            check_playfield_pair(&self.pixels, HPIXELS, self.clxcon, &mut self.clxdat);
            self.colorize(v);
        } else {
            self.sprites
                .draw(&mut self.pixels, self.sprite_clip, self.clxcon, &mut self.clxdat, false);
            self.stage.apply_pending();
            if let Some(row) = self.row_mut(v) {
                row.fill(VBLANK_ARGB);
            }
        }
    }

    /// Colour indices of the last finished line.
    #[must_use]
    pub fn line_indices(&self) -> &[u8] {
        &self.pixels.m[..HPIXELS]
    }

    fn translate(&mut self) {
        let mut bplcon0 = self.initial_bplcon0;
        let mut prio = Priorities::from_bplcon2(self.initial_bplcon2);
        let mut pixel = 0;

        while let Some((trigger, change)) = self.con_changes.pop() {
            let to = (trigger as usize).min(BUFFER_LEN);
            self.pixels.translate(bplcon0, prio, pixel, to);
            pixel = pixel.max(to);
            match change.reg {
                DeniseReg::BplCon0 => bplcon0 = change.value,
                DeniseReg::BplCon2 => prio = Priorities::from_bplcon2(change.value),
                _ => {}
            }
        }
        self.pixels.translate(bplcon0, prio, pixel, BUFFER_LEN);
    }

    fn draw_border(&mut self, border: BorderState) {
        let h_flop_was_set = border.h_flop || border.h_flop_on.is_some();
        if !border.v_flop || !h_flop_was_set {
            self.pixels.fill_border(0, HPIXELS, 0);
            return;
        }
        if !border.h_flop {
            if let Some(on) = border.h_flop_on {
                self.pixels.fill_border(0, 2 * usize::from(on), 0);
            }
        }
        if let Some(off) = border.h_flop_off {
            self.pixels.fill_border(2 * usize::from(off), HPIXELS, 0);
        }
    }

    fn row_mut(&mut self, v: u16) -> Option<&mut [u32]> {
        let width = FB_WIDTH as usize;
        let start = usize::from(v) * width;
        self.framebuffer.get_mut(start..start + width)
    }

    fn colorize(&mut self, v: u16) {
        let width = FB_WIDTH as usize;
        let start = usize::from(v) * width;
        let Some(row) = self.framebuffer.get_mut(start..start + width) else {
            return;
        };
        self.stage.colorize(
            row,
            &self.pixels.i[..HPIXELS],
            &self.pixels.m[..HPIXELS],
            &self.pixels.z[..HPIXELS],
            self.initial_bplcon0,
        );
    }

    /// Framebuffer row of line `v`.
    #[must_use]
    pub fn row(&self, v: u16) -> &[u32] {
        let width = FB_WIDTH as usize;
        let start = usize::from(v) * width;
        &self.framebuffer[start..start + width]
    }
}

impl Default for DeniseOcs {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DeniseOcs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeniseOcs")
            .field("bplcon0", &format_args!("{:#06X}", self.bplcon0))
            .field("bplcon1", &format_args!("{:#06X}", self.bplcon1))
            .field("bplcon2", &format_args!("{:#06X}", self.bplcon2))
            .field("clxdat", &format_args!("{:#06X}", self.clxdat))
            .field("armed_odd", &self.armed_odd)
            .field("armed_even", &self.armed_even)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::rgb12_to_argb32;

    const LINE: u16 = 40;
    const H: u16 = 0x40;

    /// Spread per-pixel colour indices over six plane words.
    fn planes_for(pixels: &[u8; 16]) -> [u16; 6] {
        let mut words = [0u16; 6];
        for (k, &index) in pixels.iter().enumerate() {
            for (plane, word) in words.iter_mut().enumerate() {
                if index & (1 << plane) != 0 {
                    *word |= 0x8000 >> k;
                }
            }
        }
        words
    }

    fn load_and_draw(denise: &mut DeniseOcs, words: [u16; 6], h: u16) {
        for (n, w) in words.into_iter().enumerate() {
            denise.write_bpldat(n, w);
        }
        denise.fill_shift_registers(true, true, h);
        denise.draw_both(h, false);
    }

    /// Lores pixel `k` of the fetch unit drawn at cycle `h`.
    fn lores_pixel(denise: &DeniseOcs, v: u16, h: u16, k: usize) -> u32 {
        denise.row(v)[ppos(h) + 2 * k]
    }

    #[test]
    fn lores_bitplane_draws_two_pixels_per_bit() {
        let mut denise = DeniseOcs::new();
        denise.poke_color(0, 0x000, 0, Accessor::Agnus);
        denise.poke_color(1, 0xF00, 0, Accessor::Agnus);
        denise.set_bplcon0(0x1200, 0);
        denise.begin_of_line();

        load_and_draw(&mut denise, [0x8001, 0, 0, 0, 0, 0], H);
        denise.end_of_line(LINE, BorderState::OPEN);

        let p = ppos(H);
        let row = denise.row(LINE);
        assert_eq!(row[p], rgb12_to_argb32(0xF00));
        assert_eq!(row[p + 1], rgb12_to_argb32(0xF00));
        assert_eq!(row[p + 2], rgb12_to_argb32(0x000));
        assert_eq!(row[p + 30], rgb12_to_argb32(0xF00));
        assert_eq!(row[p + 32], rgb12_to_argb32(0x000));
    }

    #[test]
    fn unarmed_shifter_draws_nothing() {
        let mut denise = DeniseOcs::new();
        denise.set_bplcon0(0x1200, 0);
        denise.begin_of_line();
        denise.write_bpldat(0, 0xFFFF);
        denise.draw_both(H, false);
        assert!(denise.pixels.b.iter().all(|&b| b == 0));
    }

    #[test]
    fn odd_scroll_splits_the_draw() {
        let mut denise = DeniseOcs::new();
        denise.set_bplcon0(0x2200, 0);
        denise.set_bplcon1(0x0001);
        denise.begin_of_line();

        load_and_draw(&mut denise, [0x8000, 0x8000, 0, 0, 0, 0], H);
        let p = ppos(H);
        assert_eq!(denise.pixels.b[p], 0b10, "even plane unshifted");
        assert_eq!(denise.pixels.b[p + 2], 0b01, "odd plane two pixels later");
    }

    #[test]
    fn ham_line_follows_encoded_deltas_and_resets_next_line() {
        let mut denise = DeniseOcs::new();
        denise.poke_color(0, 0x135, 0, Accessor::Agnus);
        denise.poke_color(3, 0x0F0, 0, Accessor::Agnus);
        denise.set_bplcon0(0x6800, 0);
        denise.begin_of_line();

        let mut pixels = [0b01_1111u8; 16];
        pixels[..5].copy_from_slice(&[
            0b00_0011, // colour 3
            0b01_0101, // blue 5
            0b10_1010, // red A
            0b11_0001, // green 1
            0b01_1111, // blue F
        ]);
        load_and_draw(&mut denise, planes_for(&pixels), H);
        denise.end_of_line(LINE, BorderState::OPEN);

        let expected = [0x0F0, 0x0F5, 0xAF5, 0xA15, 0xA1F, 0xA1F];
        for (k, &rgb) in expected.iter().enumerate() {
            assert_eq!(lores_pixel(&denise, LINE, H, k), rgb12_to_argb32(rgb), "pixel {k}");
        }
        assert_eq!(denise.row(LINE)[0], rgb12_to_argb32(0x135));

        // Next line: a red-only modify starts from the background colour
        denise.begin_of_line();
        let mut pixels = [0u8; 16];
        pixels[0] = 0b10_0000;
        load_and_draw(&mut denise, planes_for(&pixels), H);
        denise.end_of_line(LINE + 1, BorderState::OPEN);

        assert_eq!(denise.row(LINE + 1)[0], rgb12_to_argb32(0x135));
        assert_eq!(lores_pixel(&denise, LINE + 1, H, 0), rgb12_to_argb32(0x035));
    }

    #[test]
    fn ham_sprite_pixel_shows_sprite_colour_when_codes_collide() {
        let mut denise = DeniseOcs::new();
        denise.poke_color(17, 0xF00, 0, Accessor::Agnus);
        denise.set_bplcon0(0x6800, 0);
        denise.set_bplcon2(0x0024, 0);
        denise.begin_of_line();

        // Sprite 0 at hstart $90 (pixels $122 and $123)
        denise.poke_sprpos(0, 0x2848, 0x15);
        denise.poke_sprctl(0, 0x3000, 0x17);
        denise.poke_sprdatb(0, 0x0000, 0x19);
        denise.poke_sprdata(0, 0x8000, 0x19);
        denise.end_of_line(LINE, BorderState::OPEN);

        denise.begin_of_line();
        load_and_draw(&mut denise, [0; 6], H);
        // Modify blue to 1 under the sprite, then green to 0
        denise.pixels.b[0x122] = 0b01_0001;
        denise.pixels.b[0x123] = 0b01_0001;
        denise.pixels.b[0x124] = 0b11_0000;
        denise.end_of_line(LINE + 1, BorderState::OPEN);

        assert_eq!(denise.line_indices()[0x122], 17);
        let row = denise.row(LINE + 1);
        assert_eq!(row[0x122], rgb12_to_argb32(0xF00));
        assert_eq!(row[0x123], rgb12_to_argb32(0xF00));
        // The hold register kept advancing underneath the sprite
        assert_eq!(row[0x124], rgb12_to_argb32(0x001));
    }

    #[test]
    fn dense_bplcon_writes_fit_in_one_line() {
        let mut denise = DeniseOcs::new();
        denise.set_bplcon0(0x1200, 0);
        denise.begin_of_line();
        for h in 0..227u16 {
            if h % 2 == 0 {
                denise.set_bplcon2(h & 0x3F, h);
            } else {
                denise.set_bplcon0(0x1200 | (h & 0x40), h);
            }
        }
        denise.end_of_line(LINE, BorderState::OPEN);
        assert!(denise.con_changes.is_empty());
    }

    #[test]
    fn extra_half_brite_uses_halved_register() {
        let mut denise = DeniseOcs::new();
        denise.poke_color(2, 0xEEE, 0, Accessor::Agnus);
        denise.set_bplcon0(0x6200, 0);
        denise.begin_of_line();

        let mut pixels = [0u8; 16];
        pixels[0] = 32 + 2;
        load_and_draw(&mut denise, planes_for(&pixels), H);
        denise.end_of_line(LINE, BorderState::OPEN);
        assert_eq!(lores_pixel(&denise, LINE, H, 0), rgb12_to_argb32(0x777));
    }

    #[test]
    fn border_covers_outside_of_window() {
        let mut denise = DeniseOcs::new();
        denise.poke_color(0, 0x00F, 0, Accessor::Agnus);
        denise.poke_color(1, 0xFFF, 0, Accessor::Agnus);
        denise.set_bplcon0(0x1200, 0);
        denise.begin_of_line();
        load_and_draw(&mut denise, [0xFFFF, 0, 0, 0, 0, 0], H);

        // Window opens at lores pixel $85 (hires 266) and never closes
        let border = BorderState {
            v_flop: true,
            h_flop: false,
            h_flop_on: Some(0x85),
            h_flop_off: None,
        };
        denise.end_of_line(LINE, border);
        let row = denise.row(LINE);
        assert_eq!(row[265], rgb12_to_argb32(0x00F));
        assert_eq!(row[266], rgb12_to_argb32(0xFFF));
    }

    #[test]
    fn closed_vertical_window_blanks_the_line() {
        let mut denise = DeniseOcs::new();
        denise.poke_color(1, 0xFFF, 0, Accessor::Agnus);
        denise.set_bplcon0(0x1200, 0);
        denise.begin_of_line();
        load_and_draw(&mut denise, [0xFFFF, 0, 0, 0, 0, 0], H);
        denise.end_of_line(LINE, BorderState::default());
        assert!(denise.line_indices().iter().all(|&i| i == 0));
    }

    #[test]
    fn bplcon2_change_mid_line_switches_playfield_priority() {
        let mut denise = DeniseOcs::new();
        denise.poke_color(1, 0x100, 0, Accessor::Agnus);
        denise.poke_color(9, 0x900, 0, Accessor::Agnus);
        // Dual playfield, two planes, PF1P = PF2P = 1
        denise.set_bplcon0(0x2600, 0);
        denise.set_bplcon2(0b001_001, 0);
        denise.begin_of_line();

        load_and_draw(&mut denise, [0xFFFF, 0xFFFF, 0, 0, 0, 0], H);
        load_and_draw(&mut denise, [0xFFFF, 0xFFFF, 0, 0, 0, 0], H + 8);
        denise.set_bplcon2(0x40 | 0b001_001, H + 4);
        denise.end_of_line(LINE, BorderState::OPEN);

        assert_eq!(lores_pixel(&denise, LINE, H, 0), rgb12_to_argb32(0x100));
        assert_eq!(lores_pixel(&denise, LINE, H + 8, 0), rgb12_to_argb32(0x900));
    }

    #[test]
    fn copper_colour_write_lands_mid_line() {
        let mut denise = DeniseOcs::new();
        denise.poke_color(0, 0x000, 0, Accessor::Agnus);
        denise.begin_of_line();
        denise.poke_color(0, 0xFFF, 0x50, Accessor::Agnus);
        denise.end_of_line(LINE, BorderState::OPEN);

        let row = denise.row(LINE);
        assert_eq!(row[4 * 0x50 - 1], rgb12_to_argb32(0x000));
        assert_eq!(row[4 * 0x50], rgb12_to_argb32(0xFFF));
    }

    #[test]
    fn cpu_colour_write_lands_one_cycle_earlier() {
        let mut denise = DeniseOcs::new();
        denise.begin_of_line();
        denise.poke_color(0, 0xFFF, 0x50, Accessor::Cpu);
        denise.end_of_line(LINE, BorderState::OPEN);
        assert_eq!(denise.row(LINE)[4 * 0x4F], rgb12_to_argb32(0xFFF));
    }

    #[test]
    fn sprites_appear_only_after_first_bitplane_load() {
        let mut denise = DeniseOcs::new();
        denise.poke_color(17, 0xF00, 0, Accessor::Agnus);
        denise.set_bplcon0(0x1200, 0);
        denise.begin_of_line();

        // Sprite 0 at hstart $90 (pixel $122)
        denise.poke_sprpos(0, 0x2848, 0x15);
        denise.poke_sprctl(0, 0x3000, 0x17);
        denise.poke_sprdatb(0, 0x0000, 0x19);
        denise.poke_sprdata(0, 0x8000, 0x19);
        denise.end_of_line(LINE, BorderState::OPEN);
        assert_eq!(denise.line_indices()[0x122], 0, "no bitplane load yet");

        denise.begin_of_line();
        load_and_draw(&mut denise, [0; 6], H);
        denise.end_of_line(LINE + 1, BorderState::OPEN);
        assert_eq!(denise.line_indices()[0x122], 17);
        assert_eq!(denise.row(LINE + 1)[0x122], rgb12_to_argb32(0xF00));
    }

    #[test]
    fn clxdat_read_sets_bit_15_and_clears() {
        let mut denise = DeniseOcs::new();
        denise.clxdat = 0x0201;
        assert_eq!(denise.read_clxdat(), 0x8201);
        assert_eq!(denise.read_clxdat(), 0x8000);
    }

    #[test]
    fn vblank_lines_stay_black() {
        let mut denise = DeniseOcs::new();
        denise.poke_color(0, 0xFFF, 0, Accessor::Agnus);
        denise.begin_of_line();
        denise.end_of_line(10, BorderState::OPEN);
        assert!(denise.row(10).iter().all(|&p| p == VBLANK_ARGB));
    }
}
