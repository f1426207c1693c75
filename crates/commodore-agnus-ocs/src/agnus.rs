//! Agnus - beam counter, register file and DMA slot scheduling.
//!
//! Agnus owns the cycle counter and the event slots. It decides which DMA
//! transfer belongs to which cycle but leaves the consumers of the fetched
//! words (Denise, Paula, the disk controller) to the owning machine.

use bitflags::bitflags;
use emu_core::ChipBus;
use log::trace;

use crate::beam::{Beam, Cycle, Frame, HPOS_CNT, HPOS_MAX, VideoStandard};
use crate::bus::{BusArbiter, BusOwner};
use crate::changes::{ChipsetReg, RegChange, RegChangeQueue};
use crate::ddf::{DdfPredictor, DdfWindow};
use crate::event::{EventSlot, EventSlots};
use crate::revision::ChipsetRevision;
use crate::sprite_dma::{SpriteDma, SpriteFetch};
use crate::tables::{EventTables, ScrollOffsets};

pub const DMACON_SET: u16 = 0x8000;
pub const DMACON_BLTPRI: u16 = 0x0400;
pub const DMACON_DMAEN: u16 = 0x0200;
pub const DMACON_BPLEN: u16 = 0x0100;
pub const DMACON_COPEN: u16 = 0x0080;
pub const DMACON_BLTEN: u16 = 0x0040;
pub const DMACON_SPREN: u16 = 0x0020;
pub const DMACON_DSKEN: u16 = 0x0010;

const BPLCON0_HIRES: u16 = 0x8000;
const BPLCON0_LACE: u16 = 0x0004;

/// Sprite writes at or after this cycle count for the next line.
const SPRITE_LINE_SWITCH: u16 = 0xDF;

bitflags! {
    /// Work deferred to the next horizontal sync.
    #[derive(Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct HsyncActions: u8 {
        const PREDICT_DDF = 0b001;
        const UPDATE_BPL = 0b010;
        const UPDATE_DAS = 0b100;
    }
}

/// Display window registers and the flip-flops driven by them.
///
/// Horizontal coordinates are in lores pixels (two per DMA cycle).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DisplayWindow {
    pub vstrt: u16,
    pub vstop: u16,
    pub hstrt: Option<u16>,
    pub hstop: Option<u16>,
    pub v_flop: bool,
    pub h_flop: bool,
    /// Where the horizontal flop switches on in the current line.
    pub h_flop_on: Option<u16>,
    /// Where the horizontal flop switches off in the current line.
    pub h_flop_off: Option<u16>,
}

impl DisplayWindow {
    fn new() -> Self {
        Self {
            vstrt: 0,
            vstop: 0,
            hstrt: None,
            hstop: None,
            v_flop: false,
            h_flop: true,
            h_flop_on: None,
            h_flop_off: None,
        }
    }
}

/// A word delivered by a sprite DMA slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteTransfer {
    Pos(u16),
    Ctl(u16),
    Data(u16),
    Datb(u16),
}

#[derive(Debug, Clone)]
pub struct Agnus {
    pub revision: ChipsetRevision,
    /// Next DMA cycle to execute.
    pub clock: Cycle,
    /// Beam position of `clock`.
    pub pos: Beam,
    pub frame: Frame,
    pub slots: EventSlots,
    pub tables: EventTables,
    pub bus: BusArbiter,
    pub ddf: DdfPredictor,
    pub changes: RegChangeQueue,
    pub sprites: SpriteDma,
    pub diw: DisplayWindow,

    // Registers
    pub dmacon: u16,
    pub bplcon0: u16,
    pub bplcon1: u16,
    pub ddfstrt: u16,
    pub ddfstop: u16,
    pub diwstrt: u16,
    pub diwstop: u16,
    pub bpl_pt: [u32; 6],
    pub bpl1mod: i16,
    pub bpl2mod: i16,

    pub scroll: ScrollOffsets,
    /// Vertical fetch enable: inside the display window and not on the
    /// last line of the frame.
    pub ddf_v_flop: bool,
    /// Whether the current line fetches bitplanes at all.
    pub bpl_dma_line: bool,
    /// Disk/audio/sprite enable bits the DAS table was built from.
    pub das_mask: u8,
    pub hsync_actions: HsyncActions,
    ptr_mask: u32,
}

impl Agnus {
    #[must_use]
    pub fn new(revision: ChipsetRevision, standard: VideoStandard) -> Self {
        let ptr_mask = (revision.chip_ram_limit_kb() * 1024 - 1) & !1;
        let mut agnus = Self {
            revision,
            clock: 0,
            pos: Beam::default(),
            frame: Frame::new(standard),
            slots: EventSlots::new(),
            tables: EventTables::new(),
            bus: BusArbiter::new(),
            ddf: DdfPredictor::new(),
            changes: RegChangeQueue::new(),
            sprites: SpriteDma::new(),
            diw: DisplayWindow::new(),
            dmacon: 0,
            bplcon0: 0,
            bplcon1: 0,
            ddfstrt: 0,
            ddfstop: 0,
            diwstrt: 0,
            diwstop: 0,
            bpl_pt: [0; 6],
            bpl1mod: 0,
            bpl2mod: 0,
            scroll: ScrollOffsets::default(),
            ddf_v_flop: false,
            bpl_dma_line: false,
            das_mask: 0,
            hsync_actions: HsyncActions::PREDICT_DDF,
            ptr_mask,
        };
        agnus.schedule_line_events();
        agnus
    }

    /// Mask applied to every DMA pointer.
    #[must_use]
    pub fn ptr_mask(&self) -> u32 {
        self.ptr_mask
    }

    // -----------------------------------------------------------------
    // Decoders
    // -----------------------------------------------------------------

    /// Bitplanes fetched for a BPLCON0 value.
    ///
    /// Out-of-range plane counts disable hires fetches entirely and clamp
    /// lores fetches to four planes.
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

    #[must_use]
    pub fn hires(&self) -> bool {
        self.bplcon0 & BPLCON0_HIRES != 0
    }

    #[must_use]
    pub fn lace(&self) -> bool {
        self.bplcon0 & BPLCON0_LACE != 0
    }

    /// `bit` is enabled in DMACON together with the master enable.
    #[must_use]
    pub fn dma_enabled(&self, bit: u16) -> bool {
        self.dmacon & DMACON_DMAEN != 0 && self.dmacon & bit != 0
    }

    #[must_use]
    pub fn in_bpl_dma_line(&self) -> bool {
        self.ddf_v_flop && Self::bpu(self.bplcon0) > 0 && self.dma_enabled(DMACON_BPLEN)
    }

    /// Fetch window for the current resolution.
    #[must_use]
    pub fn window(&self) -> &DdfWindow {
        if self.hires() { &self.ddf.hires } else { &self.ddf.lores }
    }

    /// Bitplanes actually fetched in this line.
    #[must_use]
    pub fn bpl_channels(&self) -> u8 {
        if !self.in_bpl_dma_line() || self.ddf.strt_reached.is_none() {
            0
        } else {
            Self::bpu(self.bplcon0)
        }
    }

    #[must_use]
    pub fn last_line(&self) -> bool {
        self.pos.v == self.frame.last_line()
    }

    /// Absolute cycle of the given position in the current line.
    #[must_use]
    pub fn cycle_of(&self, h: u16) -> Cycle {
        assert!(h >= self.pos.h, "position ${h:02X} already passed");
        self.clock + u64::from(h - self.pos.h)
    }

    // -----------------------------------------------------------------
    // Beam
    // -----------------------------------------------------------------

    /// Step the counter by one cycle. Returns `true` if the line ended.
    pub fn advance(&mut self) -> bool {
        self.clock += 1;
        self.pos.h += 1;
        self.pos.h == HPOS_CNT
    }

    /// Skip `cycles` cycles with no event in between.
    pub fn skip(&mut self, cycles: u64) {
        assert!(
            u64::from(self.pos.h) + cycles <= u64::from(HPOS_MAX),
            "bulk advance of {cycles} cycles from {} crosses the line end",
            self.pos
        );
        self.clock += cycles;
        self.pos.h += cycles as u16;
    }

    /// Horizontal sync. Returns `true` if a new frame started.
    pub fn hsync(&mut self) -> bool {
        assert_eq!(self.pos.h, HPOS_CNT, "hsync off the line end");

        self.pos.h = 0;
        self.pos.v += 1;
        let vsync = self.pos.v >= self.frame.num_lines();
        if vsync {
            self.vsync();
        }

        // Display window flip-flops
        if self.pos.v == self.diw.vstrt && !self.diw.v_flop {
            self.diw.v_flop = true;
        }
        if self.pos.v == self.diw.vstop && self.diw.v_flop {
            self.diw.v_flop = false;
        }
        self.diw.h_flop = if self.diw.h_flop_off.is_some() {
            false
        } else if self.diw.h_flop_on.is_some() {
            true
        } else {
            self.diw.h_flop
        };
        self.diw.h_flop_on = self.diw.hstrt;
        self.diw.h_flop_off = self.diw.hstop;

        self.ddf_v_flop = !self.last_line() && self.diw.v_flop;

        let bpl_line = self.in_bpl_dma_line();
        if bpl_line != self.bpl_dma_line {
            self.hsync_actions |= HsyncActions::UPDATE_BPL;
            self.bpl_dma_line = bpl_line;
        }

        let mut das = if self.dmacon & DMACON_DMAEN != 0 {
            (self.dmacon & 0x3F) as u8
        } else {
            0
        };
        if self.pos.v < 25 || self.pos.v >= self.frame.last_line() {
            das &= !(DMACON_SPREN as u8);
        }
        if das != self.das_mask {
            self.hsync_actions |= HsyncActions::UPDATE_DAS;
            self.das_mask = das;
        }

        if self.hsync_actions.contains(HsyncActions::PREDICT_DDF) {
            self.hsync_actions.remove(HsyncActions::PREDICT_DDF);
            let ecs = self.revision.is_ecs();
            if self.ddf.predict(self.ddfstrt, self.ddfstop, ecs, self.pos.v) {
                self.hsync_actions |= HsyncActions::UPDATE_BPL | HsyncActions::PREDICT_DDF;
            }
        }
        if self.hsync_actions.contains(HsyncActions::UPDATE_BPL) {
            self.hsync_actions.remove(HsyncActions::UPDATE_BPL);
            self.update_bpl_events(0);
        }
        if self.hsync_actions.contains(HsyncActions::UPDATE_DAS) {
            self.hsync_actions.remove(HsyncActions::UPDATE_DAS);
            self.tables.rebuild_das(self.das_mask);
        }

        self.bus.clear_line();
        self.schedule_line_events();
        vsync
    }

    fn vsync(&mut self) {
        let lace = self.lace();
        self.frame.advance(self.clock, lace);
        self.pos.v = 0;
        self.diw.v_flop = false;
        self.diw.h_flop = true;
        self.bus.end_frame();
        trace!(
            target: "agnus::bus",
            "frame {} starts at cycle {} ({} lines)",
            self.frame.nr,
            self.clock,
            self.frame.num_lines()
        );
    }

    fn schedule_line_events(&mut self) {
        self.schedule_next_bpl(0);
        self.schedule_next_das(0);
        let ras = self.cycle_of(HPOS_MAX);
        self.slots.schedule(EventSlot::Ras, ras, 0);
    }

    // -----------------------------------------------------------------
    // Scheduling
    // -----------------------------------------------------------------

    /// Point the bitplane slot at the first bitplane event at or after `h`.
    pub fn schedule_next_bpl(&mut self, h: u16) {
        match self.tables.next_bpl(h) {
            Some(next) => {
                let trigger = self.cycle_of(next);
                let id = self.tables.bpl_event(next).raw();
                self.slots.schedule(EventSlot::Bpl, trigger, id);
            }
            None => self.slots.cancel(EventSlot::Bpl),
        }
    }

    /// Point the DAS slot at the first DAS event at or after `h`.
    pub fn schedule_next_das(&mut self, h: u16) {
        match self.tables.next_das(h) {
            Some(next) => {
                let trigger = self.cycle_of(next);
                let id = self.tables.das_event(next).code();
                self.slots.schedule(EventSlot::Das, trigger, id);
            }
            None => self.slots.cancel(EventSlot::Das),
        }
    }

    /// Move the bitplane and DAS slots past the current cycle if a write
    /// issued after they were serviced pulled them back onto it.
    pub fn skip_serviced_cycle(&mut self) {
        let next = self.pos.h + 1;
        if self.slots.is_due(EventSlot::Bpl, self.clock) {
            self.schedule_next_bpl(next);
        }
        if self.slots.is_due(EventSlot::Das, self.clock) {
            self.schedule_next_das(next);
        }
    }

    fn schedule_next_reg(&mut self) {
        match self.changes.trigger() {
            Some(trigger) => self.slots.schedule(EventSlot::Reg, trigger, 0),
            None => self.slots.cancel(EventSlot::Reg),
        }
    }

    /// Rebuild the bitplane table from `first` on with the current state.
    pub fn update_bpl_events(&mut self, first: u16) {
        let channels = self.bpl_channels();
        let hires = self.hires();
        let window = *self.window();
        self.tables
            .rebuild_bpl(channels, hires, &window, self.scroll, first);
    }

    // -----------------------------------------------------------------
    // Deferred register changes
    // -----------------------------------------------------------------

    /// Queue a write to take effect `reg.delay()` cycles from now.
    pub fn record_change(&mut self, reg: ChipsetReg, value: u16) {
        self.changes
            .insert(self.clock + reg.delay(), RegChange { reg, value });
        self.schedule_next_reg();
    }

    /// Remove the next change due at or before `upto`.
    pub fn pop_due_change(&mut self, upto: Cycle) -> Option<RegChange> {
        let change = self.changes.pop_due(upto).map(|(_, change)| change);
        if change.is_none() {
            self.schedule_next_reg();
        }
        change
    }

    /// Apply a change that targets Agnus. Denise changes are ignored.
    pub fn apply_change(&mut self, change: RegChange) {
        match change.reg {
            ChipsetReg::BplCon0Agnus => self.set_bplcon0(change.value),
            ChipsetReg::BplCon1Agnus => self.set_bplcon1(change.value),
            ChipsetReg::DdfStrt => self.set_ddfstrt(change.value),
            ChipsetReg::DdfStop => self.set_ddfstop(change.value),
            ChipsetReg::DiwStrt => self.set_diwstrt(change.value),
            ChipsetReg::DiwStop => self.set_diwstop(change.value),
            ChipsetReg::BplPtH(n) => self.set_bplpth(usize::from(n), change.value),
            ChipsetReg::BplPtL(n) => self.set_bplptl(usize::from(n), change.value),
            ChipsetReg::Bpl1Mod => self.bpl1mod = (change.value & 0xFFFE) as i16,
            ChipsetReg::Bpl2Mod => self.bpl2mod = (change.value & 0xFFFE) as i16,
            ChipsetReg::None
            | ChipsetReg::BplCon0Denise
            | ChipsetReg::BplCon1Denise
            | ChipsetReg::BplCon2Denise => {}
        }
    }

    // -----------------------------------------------------------------
    // Register writes (bus side)
    // -----------------------------------------------------------------

    pub fn poke_bplcon0(&mut self, value: u16) {
        self.record_change(ChipsetReg::BplCon0Agnus, value);
    }

    pub fn poke_bplcon1(&mut self, value: u16) {
        if self.bplcon1 != value & 0xFF {
            self.record_change(ChipsetReg::BplCon1Agnus, value);
        }
    }

    pub fn poke_ddfstrt(&mut self, value: u16) {
        let value = value & self.revision.ddf_mask();
        self.record_change(ChipsetReg::DdfStrt, value);
    }

    pub fn poke_ddfstop(&mut self, value: u16) {
        let value = value & self.revision.ddf_mask();
        self.record_change(ChipsetReg::DdfStop, value);
    }

    pub fn poke_diwstrt(&mut self, value: u16) {
        self.record_change(ChipsetReg::DiwStrt, value);
    }

    pub fn poke_diwstop(&mut self, value: u16) {
        self.record_change(ChipsetReg::DiwStop, value);
    }

    pub fn poke_bplpth(&mut self, n: usize, value: u16) {
        self.record_change(ChipsetReg::BplPtH(n as u8), value);
    }

    pub fn poke_bplptl(&mut self, n: usize, value: u16) {
        self.record_change(ChipsetReg::BplPtL(n as u8), value);
    }

    pub fn poke_bpl1mod(&mut self, value: u16) {
        self.record_change(ChipsetReg::Bpl1Mod, value);
    }

    pub fn poke_bpl2mod(&mut self, value: u16) {
        self.record_change(ChipsetReg::Bpl2Mod, value);
    }

    pub fn poke_sprpth(&mut self, n: usize, value: u16) {
        self.sprites.write_pth(n, value, self.ptr_mask);
    }

    pub fn poke_sprptl(&mut self, n: usize, value: u16) {
        self.sprites.write_ptl(n, value, self.ptr_mask);
    }

    fn sprite_seen_line(&self) -> u16 {
        if self.pos.h < SPRITE_LINE_SWITCH {
            self.pos.v
        } else {
            self.pos.v + 1
        }
    }

    pub fn poke_sprpos(&mut self, n: usize, value: u16) {
        let v = self.sprite_seen_line();
        self.sprites.write_pos(n, value, v);
    }

    pub fn poke_sprctl(&mut self, n: usize, value: u16) {
        let v = self.sprite_seen_line();
        self.sprites.write_ctl(n, value, v);
    }

    // -----------------------------------------------------------------
    // Register effects
    // -----------------------------------------------------------------

    /// DMACON write with SET/CLR semantics. Takes effect immediately.
    pub fn set_dmacon(&mut self, value: u16) {
        let old = self.dmacon;
        let new = if value & DMACON_SET != 0 {
            (old | value) & 0x07FF
        } else {
            (old & !value) & 0x07FF
        };
        if old == new {
            return;
        }
        self.dmacon = new;

        let enabled = |v: u16, bit: u16| v & DMACON_DMAEN != 0 && v & bit != 0;
        let toggled = |bit: u16| enabled(old, bit) != enabled(new, bit);
        let h = self.pos.h;

        if toggled(DMACON_BPLEN) {
            self.update_bpl_events((h + 2).min(HPOS_MAX));
            self.schedule_next_bpl(h);
            self.hsync_actions |= HsyncActions::UPDATE_BPL;
        }

        if toggled(DMACON_DSKEN) || toggled(DMACON_SPREN) {
            let das = if new & DMACON_DMAEN != 0 {
                (new & 0x3F) as u8
            } else {
                0
            };
            self.tables.rebuild_das_from(das, h);
            self.schedule_next_das(h);
            self.hsync_actions |= HsyncActions::UPDATE_DAS;
        }
    }

    pub fn set_bplcon0(&mut self, value: u16) {
        let old = self.bplcon0;
        self.bplcon0 = value;
        self.hsync_actions |= HsyncActions::UPDATE_BPL;

        if (old ^ value) & 0xF000 != 0 {
            let h = self.pos.h;
            self.update_bpl_events(h);
            self.schedule_next_bpl(h);
        }
    }

    pub fn set_bplcon1(&mut self, value: u16) {
        let value = value & 0xFF;
        if value == self.bplcon1 {
            return;
        }
        self.bplcon1 = value;
        self.scroll = ScrollOffsets::from_bplcon1(value);

        let h = self.pos.h;
        self.update_bpl_events(h);
        self.schedule_next_bpl(h);
        self.hsync_actions |= HsyncActions::UPDATE_BPL | HsyncActions::PREDICT_DDF;
    }

    pub fn set_ddfstrt(&mut self, value: u16) {
        self.ddfstrt = value;
        self.hsync_actions |= HsyncActions::PREDICT_DDF;

        let h = self.pos.h;
        if !matches!(self.ddf.strt_reached, Some(s) if h < s) {
            return;
        }
        if value <= h + 2 {
            // Too late to match in this line
            self.ddf.strt_reached = None;
            self.tables.clear_bpl();
        } else {
            self.ddf.strt_reached = (value < HPOS_CNT).then_some(value);
            self.ddf.recompute_current(self.revision.is_ecs(), self.pos.v);
            self.update_bpl_events(0);
        }
        self.schedule_next_bpl(h);
    }

    pub fn set_ddfstop(&mut self, value: u16) {
        self.ddfstop = value;
        self.hsync_actions |= HsyncActions::PREDICT_DDF;

        let h = self.pos.h;
        let pending = match self.ddf.stop_reached {
            None => true,
            Some(stop) => h + 2 < stop,
        };
        if !pending {
            return;
        }
        if value <= h + 2 {
            self.ddf.stop_reached = None;
        } else {
            self.ddf.stop_reached = (value < HPOS_CNT).then_some(value);
            if self.ddf.strt_reached.is_some() {
                self.ddf.recompute_current(self.revision.is_ecs(), self.pos.v);
                self.update_bpl_events(0);
                self.schedule_next_bpl(h);
            }
        }
    }

    pub fn set_diwstrt(&mut self, value: u16) {
        self.diwstrt = value;
        let vstrt = value >> 8;
        let hstrt = Some(value & 0xFF).filter(|&h| h >= 2);

        let cur = 2 * self.pos.h;
        let old = self.diw.hstrt;
        if old.is_some_and(|o| cur < o) && hstrt.is_some_and(|n| cur < n) {
            self.diw.h_flop_on = hstrt;
        }
        if hstrt.is_none_or(|n| n < cur) && old.is_some_and(|o| cur < o) {
            self.diw.h_flop_on = None;
        }

        self.diw.vstrt = vstrt;
        self.diw.hstrt = hstrt;
        self.update_v_flop();
    }

    pub fn set_diwstop(&mut self, value: u16) {
        self.diwstop = value;
        let vstop = (value >> 8) | if value & 0x8000 != 0 { 0 } else { 0x100 };
        let hstop = Some((value & 0xFF) | 0x100).filter(|&h| h <= 0x1C7);

        let cur = 2 * self.pos.h;
        let old = self.diw.hstop;
        if old.is_some_and(|o| cur < o) && hstop.is_some_and(|n| cur < n) {
            self.diw.h_flop_off = hstop;
        }
        if hstop.is_none_or(|n| n < cur) && old.is_some_and(|o| cur < o) {
            self.diw.h_flop_off = None;
        }

        self.diw.vstop = vstop;
        self.diw.hstop = hstop;
        self.update_v_flop();
    }

    fn update_v_flop(&mut self) {
        if self.pos.v == self.diw.vstrt {
            self.diw.v_flop = true;
        }
        if self.pos.v == self.diw.vstop {
            self.diw.v_flop = false;
        }
    }

    pub fn set_bplpth(&mut self, n: usize, value: u16) {
        self.bpl_pt[n] = ((u32::from(value) << 16) | (self.bpl_pt[n] & 0xFFFF)) & self.ptr_mask;
    }

    pub fn set_bplptl(&mut self, n: usize, value: u16) {
        self.bpl_pt[n] = ((self.bpl_pt[n] & 0xFFFF_0000) | u32::from(value)) & self.ptr_mask;
    }

    // -----------------------------------------------------------------
    // DMA transfers
    // -----------------------------------------------------------------

    /// Fetch the next word of bitplane `plane` in the current cycle.
    ///
    /// The modulo is added after the last fetch unit of the line.
    pub fn fetch_bitplane(&mut self, plane: u8, mem: &impl ChipBus) -> u16 {
        let n = usize::from(plane);
        let addr = self.bpl_pt[n];
        let value = mem.read_word(addr);
        self.bpl_pt[n] = addr.wrapping_add(2) & self.ptr_mask;
        self.bus.claim(self.pos.h, BusOwner::Bitplane(plane), value);

        let last_unit = if self.hires() {
            self.ddf.hires.stop_odd.saturating_sub(4)
        } else {
            self.ddf.lores.stop_odd.saturating_sub(8)
        };
        if self.pos.h >= last_unit {
            let modulo = if plane % 2 == 0 { self.bpl1mod } else { self.bpl2mod };
            self.bpl_pt[n] = self.bpl_pt[n].wrapping_add_signed(i32::from(modulo)) & self.ptr_mask;
        }
        value
    }

    fn fetch_sprite_word(&mut self, n: u8, mem: &impl ChipBus) -> u16 {
        let addr = self.sprites.next_address(usize::from(n), self.ptr_mask);
        let value = mem.read_word(addr);
        self.bus.claim(self.pos.h, BusOwner::Sprite(n), value);
        value
    }

    /// First DMA slot of sprite `n`: POS or DATA.
    pub fn sprite_first_slot(&mut self, n: u8, mem: &impl ChipBus) -> Option<SpriteTransfer> {
        self.sprite_slot(n, false, mem)
    }

    /// Second DMA slot of sprite `n`: CTL or DATB.
    pub fn sprite_second_slot(&mut self, n: u8, mem: &impl ChipBus) -> Option<SpriteTransfer> {
        self.sprite_slot(n, true, mem)
    }

    fn sprite_slot(&mut self, n: u8, second: bool, mem: &impl ChipBus) -> Option<SpriteTransfer> {
        let i = usize::from(n);
        match self.sprites.fetch_kind(i, self.pos.v) {
            SpriteFetch::Control => {
                self.sprites.finish(i);
                if self.bus.is_owned(self.pos.h) {
                    return None;
                }
                let value = self.fetch_sprite_word(n, mem);
                if second {
                    self.poke_sprctl(i, value);
                    Some(SpriteTransfer::Ctl(value))
                } else {
                    self.poke_sprpos(i, value);
                    Some(SpriteTransfer::Pos(value))
                }
            }
            SpriteFetch::Data => {
                if self.bus.is_owned(self.pos.h) {
                    return None;
                }
                let value = self.fetch_sprite_word(n, mem);
                Some(if second {
                    SpriteTransfer::Datb(value)
                } else {
                    SpriteTransfer::Data(value)
                })
            }
            SpriteFetch::Nothing => None,
        }
    }

    /// Evaluate sprite start/stop lines for the next line.
    pub fn update_sprite_dma(&mut self) {
        let spr_dma = self.dma_enabled(DMACON_SPREN);
        let last = self.frame.last_line();
        self.sprites.update_for_line(self.pos.v + 1, spr_dma, last);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::BplEventKind;

    struct Ram(Vec<u16>);

    impl ChipBus for Ram {
        fn read_word(&self, address: u32) -> u16 {
            self.0[(address as usize / 2) % self.0.len()]
        }

        fn write_word(&mut self, address: u32, value: u16) {
            let len = self.0.len();
            self.0[(address as usize / 2) % len] = value;
        }
    }

    fn ocs() -> Agnus {
        Agnus::new(ChipsetRevision::Ocs, VideoStandard::Pal)
    }

    fn run_line(agnus: &mut Agnus) {
        while !agnus.advance() {}
        agnus.hsync();
    }

    fn apply_pending(agnus: &mut Agnus) {
        while let Some(change) = agnus.pop_due_change(Cycle::MAX) {
            agnus.apply_change(change);
        }
    }

    #[test]
    fn bpu_clamps_illegal_values() {
        assert_eq!(Agnus::bpu(0x4000), 4);
        assert_eq!(Agnus::bpu(0x6000), 6);
        assert_eq!(Agnus::bpu(0x7000), 4, "lores 7 planes fetches 4");
        assert_eq!(Agnus::bpu(0x8000 | 0x4000), 4);
        assert_eq!(Agnus::bpu(0x8000 | 0x5000), 0, "hires 5 planes fetches nothing");
    }

    #[test]
    fn dmacon_set_and_clear() {
        let mut agnus = ocs();
        agnus.set_dmacon(DMACON_SET | DMACON_DMAEN | DMACON_BPLEN | DMACON_COPEN);
        assert_eq!(agnus.dmacon, DMACON_DMAEN | DMACON_BPLEN | DMACON_COPEN);
        agnus.set_dmacon(DMACON_COPEN);
        assert_eq!(agnus.dmacon, DMACON_DMAEN | DMACON_BPLEN);
        assert!(agnus.dma_enabled(DMACON_BPLEN));
        assert!(!agnus.dma_enabled(DMACON_COPEN));
    }

    #[test]
    fn ddf_writes_are_masked_by_revision() {
        let mut agnus = ocs();
        agnus.poke_ddfstrt(0x3A);
        apply_pending(&mut agnus);
        assert_eq!(agnus.ddfstrt, 0x38);

        let mut ecs = Agnus::new(ChipsetRevision::Ecs1Mb, VideoStandard::Pal);
        ecs.poke_ddfstrt(0x3A);
        apply_pending(&mut ecs);
        assert_eq!(ecs.ddfstrt, 0x3A);
    }

    #[test]
    fn register_change_waits_for_its_cycle() {
        let mut agnus = ocs();
        agnus.poke_bplcon0(0x4200);
        assert_eq!(agnus.slots.trigger(EventSlot::Reg), 4);
        assert_eq!(agnus.pop_due_change(3), None);
        assert_eq!(agnus.bplcon0, 0);
        let change = agnus.pop_due_change(4);
        assert_eq!(
            change,
            Some(RegChange { reg: ChipsetReg::BplCon0Agnus, value: 0x4200 })
        );
    }

    #[test]
    fn display_window_decodes_corners() {
        let mut agnus = ocs();
        agnus.set_diwstrt(0x2C81);
        agnus.set_diwstop(0x2CC1);
        assert_eq!(agnus.diw.vstrt, 0x2C);
        assert_eq!(agnus.diw.hstrt, Some(0x81));
        assert_eq!(agnus.diw.vstop, 0x12C);
        assert_eq!(agnus.diw.hstop, Some(0x1C1));

        agnus.set_diwstrt(0x2C01);
        assert_eq!(agnus.diw.hstrt, None, "start below 2 never matches");
    }

    #[test]
    fn bitplane_table_follows_predicted_window() {
        let mut agnus = ocs();
        agnus.set_dmacon(DMACON_SET | DMACON_DMAEN | DMACON_BPLEN);
        agnus.set_diwstrt(0x0181);
        agnus.set_diwstop(0xFFC1);
        agnus.set_bplcon0(0x4200);
        agnus.set_ddfstrt(0x38);
        agnus.set_ddfstop(0xD0);

        run_line(&mut agnus);
        run_line(&mut agnus);

        assert!(agnus.bpl_dma_line);
        assert_eq!(agnus.bpl_channels(), 4);
        assert_eq!(agnus.tables.bpl_event(0x3F).kind(), BplEventKind::Lores(0));
        assert_eq!(agnus.tables.bpl_event(0x39).kind(), BplEventKind::Lores(3));
        assert_eq!(agnus.tables.bpl_event(0xD7).kind(), BplEventKind::Lores(0));
        assert_eq!(agnus.tables.bpl_event(0xDF).kind(), BplEventKind::None);
        agnus.tables.verify_jump_tables();
    }

    #[test]
    fn hsync_clears_bus_owners_and_schedules_raster_slot() {
        let mut agnus = ocs();
        agnus.bus.claim(0x40, BusOwner::Copper, 0);
        run_line(&mut agnus);
        assert_eq!(agnus.bus.owner(0x40), BusOwner::None);
        assert_eq!(agnus.pos, Beam::new(1, 0));
        assert_eq!(
            agnus.slots.trigger(EventSlot::Ras),
            u64::from(HPOS_CNT) + u64::from(HPOS_MAX)
        );
    }

    #[test]
    fn frame_wraps_after_last_line() {
        let mut agnus = ocs();
        let lines = agnus.frame.num_lines();
        for _ in 0..lines {
            run_line(&mut agnus);
        }
        assert_eq!(agnus.pos, Beam::new(0, 0));
        assert_eq!(agnus.frame.nr, 1);
        assert_eq!(agnus.frame.start, agnus.clock);
    }

    #[test]
    fn sprite_dma_is_masked_outside_sprite_lines() {
        let mut agnus = ocs();
        agnus.set_dmacon(DMACON_SET | DMACON_DMAEN | DMACON_SPREN);
        run_line(&mut agnus);
        assert_eq!(agnus.das_mask & DMACON_SPREN as u8, 0);
        while agnus.pos.v < 25 {
            run_line(&mut agnus);
        }
        assert_ne!(agnus.das_mask & DMACON_SPREN as u8, 0);
    }

    #[test]
    fn bitplane_fetch_adds_modulo_after_last_unit() {
        let mut agnus = ocs();
        agnus.ddf.lores = DdfWindow::compute(0x38, 0xD0, false);
        agnus.bpl_pt[0] = 0x1000;
        agnus.bpl1mod = 40;
        let ram = Ram(vec![0xABCD; 0x8000]);

        agnus.pos.h = 0x3F;
        assert_eq!(agnus.fetch_bitplane(0, &ram), 0xABCD);
        assert_eq!(agnus.bpl_pt[0], 0x1002);
        assert_eq!(agnus.bus.owner(0x3F), BusOwner::Bitplane(0));

        agnus.pos.h = 0xD7;
        agnus.fetch_bitplane(0, &ram);
        assert_eq!(agnus.bpl_pt[0], 0x1004 + 40);
    }

    #[test]
    fn sprite_slots_read_control_words_then_data() {
        let mut agnus = ocs();
        let mut ram = Ram(vec![0; 0x8000]);
        ram.write_word(0x2000, 0x3050); // POS: VSTART $30
        ram.write_word(0x2002, 0x3200); // CTL: VSTOP $32
        ram.write_word(0x2004, 0xF00F);
        ram.write_word(0x2006, 0x0FF0);
        agnus.poke_sprptl(0, 0x2000);

        agnus.pos = Beam::new(25, 0x15);
        agnus.sprites.vstop[0] = 25;
        assert_eq!(agnus.sprite_first_slot(0, &ram), Some(SpriteTransfer::Pos(0x3050)));
        agnus.pos.h = 0x17;
        assert_eq!(agnus.sprite_second_slot(0, &ram), Some(SpriteTransfer::Ctl(0x3200)));
        assert_eq!(agnus.sprites.vstrt[0], 0x30);
        assert_eq!(agnus.sprites.vstop[0], 0x32);

        agnus.pos = Beam::new(0x2F, 0xDF);
        agnus.update_sprite_dma();
        agnus.bus.clear_line();
        agnus.pos = Beam::new(0x30, 0x15);
        assert_eq!(agnus.sprite_first_slot(0, &ram), Some(SpriteTransfer::Data(0xF00F)));
        agnus.pos.h = 0x17;
        assert_eq!(agnus.sprite_second_slot(0, &ram), Some(SpriteTransfer::Datb(0x0FF0)));
    }

    #[test]
    fn sprite_slot_yields_to_owned_cycle() {
        let mut agnus = ocs();
        let ram = Ram(vec![0x1234; 0x100]);
        agnus.pos = Beam::new(25, 0x15);
        agnus.sprites.vstop[0] = 25;
        agnus.bus.claim(0x15, BusOwner::Refresh, 0);
        assert_eq!(agnus.sprite_first_slot(0, &ram), None);
        assert!(!agnus.sprites.is_active(0));
    }

    #[test]
    fn ddfstrt_too_close_cancels_the_line() {
        let mut agnus = ocs();
        agnus.set_dmacon(DMACON_SET | DMACON_DMAEN | DMACON_BPLEN);
        agnus.set_diwstrt(0x0181);
        agnus.set_diwstop(0xFFC1);
        agnus.set_bplcon0(0x1200);
        agnus.set_ddfstrt(0x38);
        agnus.set_ddfstop(0xD0);
        run_line(&mut agnus);
        run_line(&mut agnus);
        assert_eq!(agnus.ddf.strt_reached, Some(0x38));

        agnus.skip(0x30);
        agnus.set_ddfstrt(0x30);
        assert_eq!(agnus.ddf.strt_reached, None);
        assert!(
            agnus.tables.bpl().iter().all(|e| !matches!(e.kind(), BplEventKind::Lores(_))),
            "no fetches left in the line"
        );
        agnus.tables.verify_jump_tables();
    }
}
