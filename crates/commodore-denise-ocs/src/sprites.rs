//! Sprite shifters and collision detection.
//!
//! Sprite register writes are recorded with the pixel they land on. At the
//! end of a line each sprite pair is drawn by replaying its writes in pixel
//! order: a DATA write arms the comparator, a CTL write disarms it, and a
//! POS write moves the horizontal start.

use crate::BUFFER_LEN;
use crate::changes::{DeniseReg, PixelChange, SpriteChangeQueue};
use crate::playfield::{PixelBuffers, Z_DPF, Z_SP, Z_SP_ALL};

#[derive(Clone)]
pub(crate) struct SpriteUnit {
    pub pos: [u16; 8],
    pub ctl: [u16; 8],
    pub data: [u16; 8],
    pub datb: [u16; 8],
    /// Shift registers.
    ssra: [u16; 8],
    ssrb: [u16; 8],
    /// Comparator armed, one bit per sprite.
    pub armed: u8,
    /// Sprites that were armed at some point during the current line.
    pub was_armed: u8,
    pub changes: [SpriteChangeQueue; 4],
}

impl SpriteUnit {
    pub fn new() -> Self {
        Self {
            pos: [0; 8],
            ctl: [0; 8],
            data: [0; 8],
            datb: [0; 8],
            ssra: [0; 8],
            ssrb: [0; 8],
            armed: 0,
            was_armed: 0,
            changes: std::array::from_fn(|_| SpriteChangeQueue::new()),
        }
    }

    /// Horizontal start of sprite `x` in pixel coordinates.
    pub fn hstart(&self, x: usize) -> usize {
        let hpos = (usize::from(self.pos[x] & 0xFF) << 1) | usize::from(self.ctl[x] & 1);
        2 * (hpos + 1)
    }

    pub fn record(&mut self, pixel: usize, change: PixelChange) {
        let x = match change.reg {
            DeniseReg::SprPos(x) | DeniseReg::SprCtl(x) | DeniseReg::SprData(x) | DeniseReg::SprDatb(x) => x,
            _ => return,
        };
        if matches!(change.reg, DeniseReg::SprData(_)) {
            self.was_armed |= 1 << x;
        }
        self.changes[usize::from(x / 2)].insert(pixel as u64, change);
    }

    fn apply(&mut self, change: PixelChange) {
        match change.reg {
            DeniseReg::SprPos(x) => self.pos[usize::from(x)] = change.value,
            DeniseReg::SprCtl(x) => {
                self.ctl[usize::from(x)] = change.value;
                self.armed &= !(1 << x);
            }
            DeniseReg::SprData(x) => {
                self.data[usize::from(x)] = change.value;
                self.armed |= 1 << x;
            }
            DeniseReg::SprDatb(x) => self.datb[usize::from(x)] = change.value,
            _ => {}
        }
    }

    /// Draw all sprites into the line buffers and latch collisions.
    ///
    /// On blank lines (`visible == false`) only the register writes are
    /// replayed.
    pub fn draw(
        &mut self,
        buf: &mut PixelBuffers,
        clip: (usize, usize),
        clxcon: u16,
        clxdat: &mut u16,
        visible: bool,
    ) {
        for pair in (0..4).rev() {
            if self.was_armed & (0b11 << (2 * pair)) != 0 {
                self.draw_pair(pair, buf, clip, clxcon, clxdat, visible);
            } else {
                self.replay(pair);
            }
        }
    }

    fn replay(&mut self, pair: usize) {
        while let Some((_, change)) = self.changes[pair].pop() {
            self.apply(change);
        }
    }

    fn draw_pair(
        &mut self,
        pair: usize,
        buf: &mut PixelBuffers,
        clip: (usize, usize),
        clxcon: u16,
        clxdat: &mut u16,
        visible: bool,
    ) {
        let (s1, s2) = (2 * pair, 2 * pair + 1);
        let mut strt1 = self.hstart(s1);
        let mut strt2 = self.hstart(s2);
        let mut from = 0;

        while let Some((trigger, change)) = self.changes[pair].pop() {
            let to = (trigger as usize).min(BUFFER_LEN - 1);
            if visible {
                self.draw_pair_range(pair, buf, clip, from, to, strt1, strt2);
            }
            from = from.max(to);
            self.apply(change);
            strt1 = self.hstart(s1);
            strt2 = self.hstart(s2);
        }
        if !visible {
            return;
        }
        self.draw_pair_range(pair, buf, clip, from, BUFFER_LEN - 1, strt1, strt2);

        check_sprite_collisions(s1, strt1, buf, clxcon, clxdat);
        check_sprite_collisions(s2, strt2, buf, clxcon, clxdat);
        check_playfield_collisions(s1, strt1, buf, clxcon, clxdat);
        check_playfield_collisions(s2, strt2, buf, clxcon, clxdat);
    }

    fn draw_pair_range(
        &mut self,
        pair: usize,
        buf: &mut PixelBuffers,
        (clip_begin, clip_end): (usize, usize),
        from: usize,
        to: usize,
        strt1: usize,
        strt2: usize,
    ) {
        let (s1, s2) = (2 * pair, 2 * pair + 1);
        let armed1 = self.armed & (1 << s1) != 0;
        let armed2 = self.armed & (1 << s2) != 0;
        let attached = self.ctl[s2] & 0x0080 != 0;

        for hpos in (from..to).step_by(2) {
            if hpos == strt1 && armed1 {
                self.ssra[s1] = self.data[s1];
                self.ssrb[s1] = self.datb[s1];
            }
            if hpos == strt2 && armed2 {
                self.ssra[s2] = self.data[s2];
                self.ssrb[s2] = self.datb[s2];
            }
            if self.ssra[s1] | self.ssrb[s1] | self.ssra[s2] | self.ssrb[s2] == 0 {
                continue;
            }
            if hpos >= clip_begin && hpos < clip_end {
                if attached {
                    self.draw_attached_pixel(s2, buf, hpos);
                } else {
                    self.draw_pixel(s1, buf, hpos);
                    self.draw_pixel(s2, buf, hpos);
                }
            }
            for x in [s1, s2] {
                self.ssra[x] <<= 1;
                self.ssrb[x] <<= 1;
            }
        }
    }

    fn draw_pixel(&self, x: usize, buf: &mut PixelBuffers, hpos: usize) {
        let a = (self.ssra[x] >> 15) as u8;
        let b = ((self.ssrb[x] >> 14) & 2) as u8;
        let col = a | b;
        if col == 0 {
            return;
        }
        let z = Z_SP[x];
        let base = 16 + 2 * (x as u8 & 6);
        for p in [hpos, hpos + 1] {
            if z > buf.z[p] {
                buf.m[p] = base | col;
            }
            buf.z[p] |= z;
        }
    }

    fn draw_attached_pixel(&self, x: usize, buf: &mut PixelBuffers, hpos: usize) {
        let a1 = (self.ssra[x - 1] >> 15) as u8;
        let b1 = ((self.ssrb[x - 1] >> 15) as u8) << 1;
        let a2 = ((self.ssra[x] >> 15) as u8) << 2;
        let b2 = ((self.ssrb[x] >> 15) as u8) << 3;
        let col = a1 | b1 | a2 | b2;
        if col == 0 {
            return;
        }
        let z = Z_SP[x];
        for p in [hpos, hpos + 1] {
            if z > buf.z[p] {
                buf.m[p] = 0b1_0000 | col;
            }
            buf.z[p] |= z;
        }
    }
}

/// Pixels a sprite can cover, walked right to left at lores steps.
fn sprite_span(strt: usize) -> impl Iterator<Item = usize> {
    let end = (strt + 31).min(BUFFER_LEN - 1);
    (strt.min(end)..=end).rev().step_by(2)
}

fn check_sprite_collisions(x: usize, strt: usize, buf: &PixelBuffers, clxcon: u16, clxdat: &mut u16) {
    // Odd sprites take part only when enabled
    if x % 2 == 1 && clxcon & (1 << (12 + x / 2)) == 0 {
        return;
    }
    let ensp = |n: u16| clxcon & (1 << (12 + n)) != 0;
    let comp01 = Z_SP[0] | if ensp(0) { Z_SP[1] } else { 0 };
    let comp23 = Z_SP[2] | if ensp(1) { Z_SP[3] } else { 0 };
    let comp45 = Z_SP[4] | if ensp(2) { Z_SP[5] } else { 0 };
    let comp67 = Z_SP[6] | if ensp(3) { Z_SP[7] } else { 0 };

    for p in sprite_span(strt) {
        let z = buf.z[p];
        if z & (Z_SP_ALL ^ Z_SP[x]) == 0 || z & Z_SP[x] == 0 {
            continue;
        }
        let hit = |a: u16, b: u16| z & a != 0 && z & b != 0;
        if hit(comp45, comp67) {
            *clxdat |= 1 << 14;
        }
        if hit(comp23, comp67) {
            *clxdat |= 1 << 13;
        }
        if hit(comp23, comp45) {
            *clxdat |= 1 << 12;
        }
        if hit(comp01, comp67) {
            *clxdat |= 1 << 11;
        }
        if hit(comp01, comp45) {
            *clxdat |= 1 << 10;
        }
        if hit(comp01, comp23) {
            *clxdat |= 1 << 9;
        }
    }
}

fn check_playfield_collisions(x: usize, strt: usize, buf: &PixelBuffers, clxcon: u16, clxdat: &mut u16) {
    if x % 2 == 1 && clxcon & (1 << (12 + x / 2)) == 0 {
        return;
    }
    let (enabled1, enabled2, compare1, compare2) = playfield_match(clxcon);

    for p in sprite_span(strt) {
        let z = buf.z[p];
        if z & Z_SP[x] == 0 {
            continue;
        }
        let b = buf.b[p];
        if b & enabled2 == compare2 {
            *clxdat |= 1 << (5 + x / 2);
        } else if z & Z_DPF == 0 {
            // Without a PF2 match PF1 never matches in single playfield mode
            continue;
        }
        if b & enabled1 == compare1 {
            *clxdat |= 1 << (1 + x / 2);
        }
    }
}

/// Enable masks and match values for both playfields, in bitplane-bit
/// layout (plane 1 in bit 0).
pub(crate) fn playfield_match(clxcon: u16) -> (u8, u8, u8, u8) {
    let enabled = ((clxcon >> 6) & 0x3F) as u8;
    let values = (clxcon & 0x3F) as u8;
    let enabled1 = enabled & 0b01_0101;
    let enabled2 = enabled & 0b10_1010;
    (enabled1, enabled2, values & enabled1, values & enabled2)
}

/// Playfield against playfield. Sets bit 0 once per line at most.
pub(crate) fn check_playfield_pair(buf: &PixelBuffers, len: usize, clxcon: u16, clxdat: &mut u16) {
    if *clxdat & 1 != 0 {
        return;
    }
    let (enabled1, enabled2, compare1, compare2) = playfield_match(clxcon);
    if buf.b[..len]
        .iter()
        .any(|&b| b & enabled1 == compare1 && b & enabled2 == compare2)
    {
        *clxdat |= 1;
    }
}
