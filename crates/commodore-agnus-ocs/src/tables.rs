//! Per-line event tables and their jump tables.
//!
//! Agnus does not decide slot by slot who fetches what. Two tables indexed by
//! the horizontal position describe the whole line: one for bitplane fetches,
//! one for disk, audio, sprite and refresh slots. Each table is assembled by
//! copying rows of static templates and is rebuilt only when something that
//! shapes it changes. A jump table beside each one lets the scheduler hop to
//! the next populated cell directly.

use std::sync::OnceLock;

use log::trace;

use crate::beam::{HPOS_CNT, HPOS_MAX};
use crate::ddf::DdfWindow;
use crate::event::{BplEvent, DRAW_EVEN, DRAW_ODD, DasEvent};

/// Jump table value for "no further event in this line".
pub const JUMP_SENTINEL: u16 = HPOS_CNT;

const LEN: usize = HPOS_CNT as usize;
const LAST: usize = HPOS_MAX as usize;

/// Maps the position within an 8-cycle lores fetch unit to the bitplane
/// fetched there. `None` leaves the slot to the Copper, Blitter or CPU.
pub const LOWRES_DDF_TO_PLANE: [Option<u8>; 8] = [
    None,
    Some(3),
    Some(5),
    Some(1),
    None,
    Some(2),
    Some(4),
    Some(0),
];

/// Same for the 4-cycle hires fetch unit.
pub const HIRES_DDF_TO_PLANE: [Option<u8>; 4] = [Some(3), Some(1), Some(2), Some(0)];

const DMACON_DSKEN: u8 = 0x10;
const DMACON_SPREN: u8 = 0x20;

/// Horizontal scroll delays from BPLCON1, in cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollOffsets {
    pub lores_odd: u16,
    pub lores_even: u16,
    pub hires_odd: u16,
    pub hires_even: u16,
}

impl ScrollOffsets {
    #[must_use]
    pub const fn from_bplcon1(bplcon1: u16) -> Self {
        Self {
            lores_odd: (bplcon1 & 0b1110) >> 1,
            lores_even: (bplcon1 & 0b1110_0000) >> 5,
            hires_odd: (bplcon1 & 0b0110) >> 1,
            hires_even: (bplcon1 & 0b0110_0000) >> 5,
        }
    }
}

struct Templates {
    /// [hires][bitplanes][h]
    bpl: [[[BplEvent; LEN]; 7]; 2],
    /// [DMACON & 0x3F][h]
    das: [[DasEvent; LEN]; 64],
}

impl Templates {
    fn build() -> Self {
        let mut bpl = [[[BplEvent::NONE; LEN]; 7]; 2];

        for bpu in 0..7u8 {
            let lores = &mut bpl[0][usize::from(bpu)];
            for unit in (0..=0xD8).step_by(8) {
                for (offset, plane) in LOWRES_DDF_TO_PLANE.iter().enumerate() {
                    if let Some(plane) = *plane {
                        if plane < bpu {
                            lores[unit + offset] = BplEvent::lores(plane);
                        }
                    }
                }
            }
            lores[LAST] = BplEvent::END_OF_LINE;

            let hires = &mut bpl[1][usize::from(bpu)];
            for unit in (0..=0xDC).step_by(4) {
                for (offset, plane) in HIRES_DDF_TO_PLANE.iter().enumerate() {
                    if let Some(plane) = *plane {
                        if plane < bpu.min(4) {
                            hires[unit + offset] = BplEvent::hires(plane);
                        }
                    }
                }
            }
            hires[LAST] = BplEvent::END_OF_LINE;
        }

        let mut das = [[DasEvent::None; LEN]; 64];
        for (mask, row) in das.iter_mut().enumerate() {
            let mask = mask as u8;
            row[0x01] = DasEvent::Refresh;

            if mask & DMACON_DSKEN != 0 {
                row[0x07] = DasEvent::Disk(0);
                row[0x09] = DasEvent::Disk(1);
                row[0x0B] = DasEvent::Disk(2);
            }

            // Audio slots are present regardless of the enable bits; each
            // channel decides per slot whether it actually fetches.
            for channel in 0..4u8 {
                row[0x0D + 2 * usize::from(channel)] = DasEvent::Audio(channel);
            }

            if mask & DMACON_SPREN != 0 {
                for sprite in 0..8u8 {
                    let h = 0x15 + 4 * usize::from(sprite);
                    row[h] = DasEvent::SpriteFirst(sprite);
                    row[h + 2] = DasEvent::SpriteSecond(sprite);
                }
            }

            row[0xDF] = DasEvent::SpriteDmaUpdate;
        }

        Self { bpl, das }
    }
}

fn templates() -> &'static Templates {
    static TEMPLATES: OnceLock<Box<Templates>> = OnceLock::new();
    TEMPLATES.get_or_init(|| Box::new(Templates::build()))
}

/// Template row for the bitplane table.
#[must_use]
pub fn bpl_template(hires: bool, bpu: u8) -> &'static [BplEvent; LEN] {
    assert!(bpu <= 6, "bitplane count {bpu} exceeds the template range");
    &templates().bpl[usize::from(hires)][usize::from(bpu)]
}

/// Template row for the DAS table.
#[must_use]
pub fn das_template(mask: u8) -> &'static [DasEvent; LEN] {
    &templates().das[usize::from(mask & 0x3F)]
}

/// Recompute `next[0..=last]` so that each cell names the first populated
/// cell at or after it.
fn rebuild_jump<T: Copy>(
    events: &[T; LEN],
    next: &mut [u16; LEN],
    last: usize,
    populated: impl Fn(T) -> bool,
) {
    let mut following = if last < LAST { next[last + 1] } else { JUMP_SENTINEL };
    for i in (0..=last).rev() {
        if populated(events[i]) {
            following = i as u16;
        }
        next[i] = following;
    }
}

/// The two event tables of the current line.
#[derive(Clone)]
pub struct EventTables {
    bpl: [BplEvent; LEN],
    bpl_next: [u16; LEN],
    das: [DasEvent; LEN],
    das_next: [u16; LEN],
}

impl EventTables {
    #[must_use]
    pub fn new() -> Self {
        let mut tables = Self {
            bpl: [BplEvent::NONE; LEN],
            bpl_next: [JUMP_SENTINEL; LEN],
            das: [DasEvent::None; LEN],
            das_next: [JUMP_SENTINEL; LEN],
        };
        tables.clear_bpl();
        tables.rebuild_das(0);
        tables
    }

    #[must_use]
    pub fn bpl(&self) -> &[BplEvent; LEN] {
        &self.bpl
    }

    #[must_use]
    pub fn bpl_jump(&self) -> &[u16; LEN] {
        &self.bpl_next
    }

    #[must_use]
    pub fn das(&self) -> &[DasEvent; LEN] {
        &self.das
    }

    #[must_use]
    pub fn das_jump(&self) -> &[u16; LEN] {
        &self.das_next
    }

    #[must_use]
    pub fn bpl_event(&self, h: u16) -> BplEvent {
        self.bpl[usize::from(h)]
    }

    #[must_use]
    pub fn das_event(&self, h: u16) -> DasEvent {
        self.das[usize::from(h)]
    }

    /// First populated bitplane cell at or after `h`.
    #[must_use]
    pub fn next_bpl(&self, h: u16) -> Option<u16> {
        if h > HPOS_MAX {
            return None;
        }
        let next = self.bpl_next[usize::from(h)];
        (next != JUMP_SENTINEL).then_some(next)
    }

    /// First populated DAS cell at or after `h`.
    #[must_use]
    pub fn next_das(&self, h: u16) -> Option<u16> {
        if h > HPOS_MAX {
            return None;
        }
        let next = self.das_next[usize::from(h)];
        (next != JUMP_SENTINEL).then_some(next)
    }

    /// Drop all bitplane fetches. Only the end-of-line marker remains.
    pub fn clear_bpl(&mut self) {
        self.bpl = [BplEvent::NONE; LEN];
        self.bpl[LAST] = BplEvent::END_OF_LINE;
        rebuild_jump(&self.bpl, &mut self.bpl_next, LAST, |e| !e.is_empty());
    }

    /// Rewrite the bitplane table from `first` to the end of the line.
    ///
    /// `channels` is the effective fetch count for this line (zero if no
    /// bitplane DMA takes place). Cells before `first` keep their fetches;
    /// drawing flags are laid over the whole line.
    pub fn rebuild_bpl(
        &mut self,
        channels: u8,
        hires: bool,
        window: &DdfWindow,
        scroll: ScrollOffsets,
        first: u16,
    ) {
        let first = usize::from(first.min(HPOS_MAX));
        let template = bpl_template(hires, channels);
        let half = if hires { 2 } else { 4 };

        for i in first..LAST {
            let h = i as u16;
            let open = if i & half != 0 {
                window.in_range_odd(h)
            } else {
                window.in_range_even(h)
            };
            self.bpl[i] = if open { template[i] } else { BplEvent::NONE };
        }

        // The last odd or even fetch group still needs its shift register
        // load when the two halves of the window are offset.
        if channels > 0 {
            let unit_end = if hires { 3 } else { 7 };
            let gaps = (window.strt_even..window.strt_odd).chain(window.stop_odd..window.stop_even);
            for h in gaps {
                let i = usize::from(h);
                if i >= first && i < LAST && i & unit_end == unit_end && self.bpl[i].is_empty() {
                    self.bpl[i] = BplEvent::SHIFT_ONLY;
                }
            }
        }

        self.bpl[LAST] = BplEvent::END_OF_LINE;

        let (odd, even, stride) = if hires {
            (scroll.hires_odd, scroll.hires_even, 4)
        } else {
            (scroll.lores_odd, scroll.lores_even, 8)
        };
        for i in (usize::from(odd)..LEN).step_by(stride) {
            self.bpl[i] = self.bpl[i].with_flags(DRAW_ODD);
        }
        for i in (usize::from(even)..LEN).step_by(stride) {
            self.bpl[i] = self.bpl[i].with_flags(DRAW_EVEN);
        }

        rebuild_jump(&self.bpl, &mut self.bpl_next, LAST, |e| !e.is_empty());
        trace!(
            target: "agnus::tables",
            "bpl table from ${first:02X}: {channels} channels, hires={hires}, window {window:?}"
        );
    }

    /// Replace the whole DAS table with the template row for `mask`.
    pub fn rebuild_das(&mut self, mask: u8) {
        self.rebuild_das_from(mask, 0);
    }

    /// Replace the DAS table from `first` onwards.
    pub fn rebuild_das_from(&mut self, mask: u8, first: u16) {
        let first = usize::from(first.min(HPOS_MAX));
        let template = das_template(mask);
        self.das[first..].copy_from_slice(&template[first..]);
        rebuild_jump(&self.das, &mut self.das_next, LAST, |e| !e.is_empty());
        trace!(target: "agnus::tables", "das table from ${first:02X}: mask {mask:#04X}");
    }

    /// Panic if either jump table disagrees with its event table.
    pub fn verify_jump_tables(&self) {
        verify_jump(&self.bpl, &self.bpl_next, |e| !e.is_empty(), "bitplane");
        verify_jump(&self.das, &self.das_next, |e| !e.is_empty(), "DAS");
    }
}

fn verify_jump<T: Copy>(
    events: &[T; LEN],
    next: &[u16; LEN],
    populated: impl Fn(T) -> bool,
    name: &str,
) {
    for i in 0..LEN {
        let j = next[i];
        if j == JUMP_SENTINEL {
            assert!(
                (i..LEN).all(|k| !populated(events[k])),
                "{name} jump table: cell {i:#04X} claims no further events"
            );
            continue;
        }
        let j = usize::from(j);
        assert!(j >= i, "{name} jump table points backwards at {i:#04X}");
        assert!(j < LEN, "{name} jump table out of range at {i:#04X}");
        assert!(populated(events[j]), "{name} jump table names empty cell {j:#04X}");
        assert!(
            (i..j).all(|k| !populated(events[k])),
            "{name} jump table at {i:#04X} skips a populated cell"
        );
    }
}

impl Default for EventTables {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventTables {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bpl = self.bpl.iter().filter(|e| !e.is_empty()).count();
        let das = self.das.iter().filter(|e| !e.is_empty()).count();
        f.debug_struct("EventTables")
            .field("bpl_events", &bpl)
            .field("das_events", &das)
            .finish_non_exhaustive()
    }
}
