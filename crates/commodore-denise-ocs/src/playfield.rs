//! Playfield translation and per-line pixel buffers.
//!
//! The shifter writes raw bitplane bits into `b`. Translation turns them
//! into colour register indices (`i`, copied to `m` where sprites are later
//! drawn) and a depth value per pixel (`z`) that sprite drawing compares
//! against.

use crate::BUFFER_LEN;

// Depth values. Playfield priority slots interleave with the sprite pairs so
// that a plain numeric comparison resolves sprite against playfield.
pub(crate) const Z_0: u16 = 0b1000_0000_0000_0000;
pub(crate) const Z_SP0: u16 = 0b0100_0000_0000_0000;
pub(crate) const Z_SP1: u16 = 0b0010_0000_0000_0000;
pub(crate) const Z_1: u16 = 0b0001_0000_0000_0000;
pub(crate) const Z_SP2: u16 = 0b0000_1000_0000_0000;
pub(crate) const Z_SP3: u16 = 0b0000_0100_0000_0000;
pub(crate) const Z_2: u16 = 0b0000_0010_0000_0000;
pub(crate) const Z_SP4: u16 = 0b0000_0001_0000_0000;
pub(crate) const Z_SP5: u16 = 0b0000_0000_1000_0000;
pub(crate) const Z_3: u16 = 0b0000_0000_0100_0000;
pub(crate) const Z_SP6: u16 = 0b0000_0000_0010_0000;
pub(crate) const Z_SP7: u16 = 0b0000_0000_0001_0000;
pub(crate) const Z_4: u16 = 0b0000_0000_0000_1000;

pub(crate) const Z_SP: [u16; 8] = [Z_SP0, Z_SP1, Z_SP2, Z_SP3, Z_SP4, Z_SP5, Z_SP6, Z_SP7];
pub(crate) const Z_SP_ALL: u16 = Z_SP0 | Z_SP1 | Z_SP2 | Z_SP3 | Z_SP4 | Z_SP5 | Z_SP6 | Z_SP7;

/// True if a sprite is the frontmost layer at a pixel of depth `z`.
pub(crate) fn sprite_in_front(z: u16) -> bool {
    z & Z_SP_ALL > z & !Z_SP_ALL
}

// Dual playfield state in the low bits
pub(crate) const Z_DPF: u16 = 0x1;
pub(crate) const Z_DPF1: u16 = 0x2;
pub(crate) const Z_DPF2: u16 = 0x3;
pub(crate) const Z_DPF12: u16 = 0x4;
pub(crate) const Z_DPF21: u16 = 0x5;

const BPLCON0_HIRES: u16 = 0x8000;
const BPLCON0_DBLPF: u16 = 0x0400;
const BPLCON2_PF2PRI: u16 = 0x0040;

/// Bitplanes displayed for a BPLCON0 value.
///
/// Illegal plane counts turn everything off in hires and clamp to four
/// planes in lores.
#[must_use]
pub fn bpu(bplcon0: u16) -> u8 {
    let raw = ((bplcon0 >> 12) & 0b111) as u8;
    if bplcon0 & BPLCON0_HIRES != 0 {
        if raw < 5 { raw } else { 0 }
    } else if raw < 7 {
        raw
    } else {
        4
    }
}

pub(crate) fn dual_playfield(bplcon0: u16) -> bool {
    bplcon0 & BPLCON0_DBLPF != 0
}

/// Depth of a playfield priority code. Codes above 4 have no depth.
pub(crate) fn z_pf(code: u16) -> u16 {
    match code {
        0 => Z_0,
        1 => Z_1,
        2 => Z_2,
        3 => Z_3,
        4 => Z_4,
        _ => 0,
    }
}

/// Playfield priorities and ordering decoded from BPLCON2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Priorities {
    pub pf2pri: bool,
    pub prio1: u16,
    pub prio2: u16,
}

impl Priorities {
    pub fn from_bplcon2(bplcon2: u16) -> Self {
        Self {
            pf2pri: bplcon2 & BPLCON2_PF2PRI != 0,
            prio1: z_pf(bplcon2 & 0b111),
            prio2: z_pf((bplcon2 >> 3) & 0b111),
        }
    }
}

/// The four line buffers.
#[derive(Clone)]
pub struct PixelBuffers {
    /// Raw bitplane bits, plane 1 in bit 0.
    pub b: Vec<u8>,
    /// Playfield colour index.
    pub i: Vec<u8>,
    /// Colour index after sprites.
    pub m: Vec<u8>,
    /// Depth.
    pub z: Vec<u16>,
}

impl PixelBuffers {
    #[must_use]
    pub fn new() -> Self {
        Self {
            b: vec![0; BUFFER_LEN],
            i: vec![0; BUFFER_LEN],
            m: vec![0; BUFFER_LEN],
            z: vec![0; BUFFER_LEN],
        }
    }

    pub fn clear_bitplanes(&mut self) {
        self.b.fill(0);
    }

    /// Single playfield translation of `from..to`.
    pub(crate) fn translate_spf(&mut self, prio: Priorities, from: usize, to: usize) {
        if prio.prio2 != 0 {
            for p in from..to {
                let s = self.b[p];
                self.i[p] = s;
                self.m[p] = s;
                self.z[p] = if s != 0 { prio.prio2 } else { 0 };
            }
        } else {
            // Invalid PF2 priority: bitplane 5 forces colour 16
            for p in from..to {
                let s = self.b[p];
                let index = if s & 16 != 0 { 16 } else { s };
                self.i[p] = index;
                self.m[p] = index;
                self.z[p] = 0;
            }
        }
    }

    /// Dual playfield translation of `from..to`.
    ///
    /// A playfield with an illegal priority code is drawn transparent.
    pub(crate) fn translate_dpf(&mut self, prio: Priorities, from: usize, to: usize) {
        let mask1 = if prio.prio1 != 0 { 0b1111 } else { 0 };
        let mask2 = if prio.prio2 != 0 { 0b1111 } else { 0 };

        for p in from..to {
            let s = self.b[p];
            let index1 = (s & 1) | ((s & 4) >> 1) | ((s & 16) >> 2);
            let index2 = ((s & 2) >> 1) | ((s & 8) >> 2) | ((s & 32) >> 3);

            let (index, z) = match (index1 != 0, index2 != 0) {
                (true, true) if prio.pf2pri => ((index2 | 0b1000) & mask2, prio.prio2 | Z_DPF21),
                (true, true) => (index1 & mask1, prio.prio1 | Z_DPF12),
                (true, false) => (index1 & mask1, prio.prio1 | Z_DPF1),
                (false, true) => ((index2 | 0b1000) & mask2, prio.prio2 | Z_DPF2),
                (false, false) => (0, Z_DPF),
            };
            self.i[p] = index;
            self.m[p] = index;
            self.z[p] = z;
        }
    }

    pub(crate) fn translate(&mut self, bplcon0: u16, prio: Priorities, from: usize, to: usize) {
        if dual_playfield(bplcon0) {
            self.translate_dpf(prio, from, to);
        } else {
            self.translate_spf(prio, from, to);
        }
    }

    /// Paint `from..to` with the border colour index.
    pub(crate) fn fill_border(&mut self, from: usize, to: usize, index: u8) {
        let to = to.min(self.i.len());
        if from < to {
            self.i[from..to].fill(index);
            self.m[from..to].fill(index);
        }
    }
}

impl Default for PixelBuffers {
    fn default() -> Self {
        Self::new()
    }
}
