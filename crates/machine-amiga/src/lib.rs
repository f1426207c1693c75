//! Amiga display DMA core.
//!
//! `Amiga` owns Agnus, Denise and chip RAM and steps them together, one DMA
//! cycle at a time or in bulk between events. Components outside the display
//! path (CPU, Copper, Blitter, disk, audio) plug in through [`DmaClients`]
//! and reach the chip bus through the arbiter.

pub mod config;
pub mod custom_regs;
pub mod dma_debugger;
pub mod memory;
pub mod snapshot;

#[cfg(feature = "native")]
pub mod capture;

use commodore_agnus_ocs::{
    BplEventKind, BusOwner, ChipsetReg, Cycle, DRAW_EVEN, DRAW_ODD, DasEvent, EventSlot,
    SpriteTransfer,
};
use commodore_denise_ocs::{Accessor, BorderState};
use emu_core::{ChipBus, Observable, Tickable, Ticks, Value};
use log::trace;

pub use crate::config::{AmigaConfig, CHIP_RAM_SIZES_KB, ConfigError};
pub use crate::dma_debugger::{DisplayMode, DmaDebugger, Rgb};
pub use crate::memory::ChipRam;
pub use crate::snapshot::DmaSnapshot;
pub use commodore_agnus_ocs;
pub use commodore_agnus_ocs::Agnus;
pub use commodore_denise_ocs;
pub use commodore_denise_ocs::DeniseOcs;

/// Stalled CPU cycles after which the Blitter has to let the CPU in.
pub const BLS_THRESHOLD: u64 = 2;

type ScanlineCallback = Box<dyn FnMut(u16, &[u8])>;
type FrameCallback = Box<dyn FnMut(u64, &[u32])>;

/// A DMA client's view of the chipset while one of its events runs.
pub struct BusPort<'a> {
    pub agnus: &'a mut Agnus,
    pub denise: &'a mut DeniseOcs,
    pub ram: &'a mut ChipRam,
}

impl BusPort<'_> {
    #[must_use]
    pub fn beam(&self) -> commodore_agnus_ocs::Beam {
        self.agnus.pos
    }

    #[must_use]
    pub fn clock(&self) -> Cycle {
        self.agnus.clock
    }

    #[must_use]
    pub fn dmacon(&self) -> u16 {
        self.agnus.dmacon
    }

    /// Blitter slow-down line.
    #[must_use]
    pub fn bls(&self) -> bool {
        self.agnus.bus.bls
    }

    /// Ask the arbiter for the current cycle. Copper and Blitter requests
    /// honour DMACON, the Copper dead cycle and BLS.
    pub fn request(&mut self, owner: BusOwner, value: u16) -> bool {
        let h = self.agnus.pos.h;
        let dmacon = self.agnus.dmacon;
        self.agnus.bus.allocate(h, owner, dmacon, value)
    }

    /// Take the current cycle for a fixed-slot channel.
    pub fn claim(&mut self, owner: BusOwner, value: u16) {
        let h = self.agnus.pos.h;
        self.agnus.bus.claim(h, owner, value);
    }

    pub fn schedule(&mut self, slot: EventSlot, trigger: Cycle, id: u8) {
        assert!(slot.is_external(), "{slot:?} belongs to the chipset core");
        self.agnus.slots.schedule(slot, trigger, id);
    }

    pub fn schedule_in(&mut self, slot: EventSlot, cycles: u64, id: u8) {
        let trigger = self.agnus.clock + cycles;
        self.schedule(slot, trigger, id);
    }

    /// Custom register write issued by DMA (Copper moves).
    pub fn poke(&mut self, offset: u16, value: u16) {
        custom_regs::write(self.agnus, self.denise, offset, value, Accessor::Agnus);
    }

    #[must_use]
    pub fn read_word(&self, addr: u32) -> u16 {
        self.ram.read_word(addr)
    }

    pub fn write_word(&mut self, addr: u32, value: u16) {
        self.ram.write_word(addr, value);
    }
}

/// Consumers of the event slots and DMA cycles the display core does not
/// model itself. Every method defaults to doing nothing.
pub trait DmaClients {
    /// An external event slot came due. The slot is already cancelled.
    fn service(&mut self, slot: EventSlot, id: u8, port: &mut BusPort<'_>) {
        let _ = (slot, id, port);
    }

    /// A disk DMA slot of the DAS table.
    fn disk_slot(&mut self, port: &mut BusPort<'_>) {
        let _ = port;
    }

    /// An audio DMA slot of the DAS table.
    fn audio_slot(&mut self, channel: u8, port: &mut BusPort<'_>) {
        let _ = (channel, port);
    }
}

/// No external clients: display DMA only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClients;

impl DmaClients for NoClients {}

pub struct Amiga<C: DmaClients = NoClients> {
    pub config: AmigaConfig,
    pub agnus: Agnus,
    pub denise: DeniseOcs,
    pub ram: ChipRam,
    pub clients: C,
    pub debugger: DmaDebugger,
    /// CPU cycles lost waiting for the bus.
    pub cpu_wait_states: u64,
    on_scanline: Option<ScanlineCallback>,
    on_frame: Option<FrameCallback>,
}

impl Amiga<NoClients> {
    /// Build a machine without external DMA clients.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration describes impossible hardware.
    pub fn new(config: AmigaConfig) -> Result<Self, ConfigError> {
        Self::with_clients(config, NoClients)
    }
}

impl<C: DmaClients> Amiga<C> {
    /// # Errors
    ///
    /// Returns an error if the configuration describes impossible hardware.
    pub fn with_clients(config: AmigaConfig, clients: C) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut denise = DeniseOcs::new();
        denise.begin_of_line();
        Ok(Self {
            config,
            agnus: Agnus::new(config.revision, config.video),
            denise,
            ram: ChipRam::new(config.chip_ram_kb),
            clients,
            debugger: DmaDebugger::new(),
            cpu_wait_states: 0,
            on_scanline: None,
            on_frame: None,
        })
    }

    /// Called after every finished line with its colour indices.
    pub fn set_scanline_callback(&mut self, callback: impl FnMut(u16, &[u8]) + 'static) {
        self.on_scanline = Some(Box::new(callback));
    }

    /// Called at every vertical sync with the finished framebuffer.
    pub fn set_frame_callback(&mut self, callback: impl FnMut(u64, &[u32]) + 'static) {
        self.on_frame = Some(Box::new(callback));
    }

    #[must_use]
    pub fn clock(&self) -> Cycle {
        self.agnus.clock
    }

    #[must_use]
    pub fn framebuffer(&self) -> &[u32] {
        &self.denise.framebuffer
    }

    #[must_use]
    pub fn framebuffer_width(&self) -> u32 {
        commodore_denise_ocs::FB_WIDTH
    }

    #[must_use]
    pub fn framebuffer_height(&self) -> u32 {
        commodore_denise_ocs::FB_HEIGHT
    }

    #[must_use]
    pub fn snapshot(&self) -> DmaSnapshot {
        DmaSnapshot::capture(&self.agnus)
    }

    /// Schedule an external slot, e.g. to start the Blitter.
    pub fn schedule(&mut self, slot: EventSlot, trigger: Cycle, id: u8) {
        assert!(slot.is_external(), "{slot:?} belongs to the chipset core");
        self.agnus.slots.schedule(slot, trigger, id);
    }

    // -----------------------------------------------------------------
    // Registers
    // -----------------------------------------------------------------

    /// Custom register write at the current cycle.
    pub fn poke(&mut self, offset: u16, value: u16, accessor: Accessor) {
        custom_regs::write(&mut self.agnus, &mut self.denise, offset, value, accessor);
    }

    /// Custom register write by the CPU.
    pub fn write_custom_reg(&mut self, offset: u16, value: u16) {
        self.poke(offset, value, Accessor::Cpu);
    }

    pub fn read_custom_reg(&mut self, offset: u16) -> u16 {
        custom_regs::read(&self.agnus, &mut self.denise, offset)
    }

    /// Apply every deferred register write due at or before `upto`.
    /// Returns how many were applied.
    pub fn replay_due(&mut self, upto: Cycle) -> usize {
        let mut applied = 0;
        while let Some(change) = self.agnus.pop_due_change(upto) {
            self.apply_change(change.reg, change.value);
            applied += 1;
        }
        applied
    }

    fn apply_change(&mut self, reg: ChipsetReg, value: u16) {
        let h = self.agnus.pos.h;
        match reg {
            ChipsetReg::BplCon0Denise => self.denise.set_bplcon0(value, h),
            ChipsetReg::BplCon1Denise => self.denise.set_bplcon1(value),
            ChipsetReg::BplCon2Denise => self.denise.set_bplcon2(value, h),
            _ => self
                .agnus
                .apply_change(commodore_agnus_ocs::RegChange { reg, value }),
        }
    }

    // -----------------------------------------------------------------
    // Execution
    // -----------------------------------------------------------------

    /// Execute exactly one DMA cycle.
    pub fn advance_one_cycle(&mut self) {
        self.service_cycle();
        self.finish_cycle();
    }

    /// Run until the clock reaches `target`. Stretches without a pending
    /// event are skipped arithmetically.
    pub fn execute_until(&mut self, target: Cycle) {
        while self.agnus.clock < target {
            let next = self.agnus.slots.next_trigger().min(target);
            if next > self.agnus.clock {
                self.agnus.skip(next - self.agnus.clock);
            } else {
                self.advance_one_cycle();
            }
        }
    }

    /// Run until the next vertical sync.
    pub fn run_frame(&mut self) {
        let nr = self.agnus.frame.nr;
        while self.agnus.frame.nr == nr {
            let end = self.agnus.frame.end();
            self.execute_until(end);
        }
    }

    /// Stall the CPU until it gets the bus.
    ///
    /// The CPU competes for the cycle following the last executed one. While
    /// that is taken it waits cycle by cycle; after [`BLS_THRESHOLD`] lost
    /// cycles the Blitter slow-down line is raised. Returns the number of
    /// wait states, which are also added to `cpu_wait_states`.
    pub fn execute_until_bus_is_free(&mut self) -> u64 {
        let free_now = match self.agnus.pos.h.checked_sub(1) {
            None => true,
            Some(prev) if !self.agnus.bus.is_owned(prev) => {
                self.agnus.bus.claim(prev, BusOwner::Cpu, 0);
                true
            }
            Some(_) => false,
        };
        if free_now {
            return 0;
        }

        let mut delay = 0;
        loop {
            let h = self.agnus.pos.h;
            self.service_cycle();
            delay += 1;
            if delay == BLS_THRESHOLD {
                self.agnus.bus.bls = true;
            }
            let free = !self.agnus.bus.is_owned(h);
            if free {
                self.agnus.bus.claim(h, BusOwner::Cpu, 0);
            }
            self.finish_cycle();
            if free {
                break;
            }
        }
        self.agnus.bus.bls = false;
        self.cpu_wait_states += delay;
        trace!(target: "agnus::bus", "CPU waited {delay} cycles at {}", self.agnus.pos);
        delay
    }

    fn service_cycle(&mut self) {
        let clock = self.agnus.clock;
        if self.agnus.slots.next_trigger() > clock {
            return;
        }
        for slot in EventSlot::ALL {
            if !self.agnus.slots.is_due(slot, clock) {
                continue;
            }
            match slot {
                EventSlot::Ras => self.agnus.slots.cancel(EventSlot::Ras),
                EventSlot::Reg => {
                    self.replay_due(clock);
                }
                EventSlot::Bpl => self.service_bpl(),
                EventSlot::Das => self.service_das(),
                _ => {
                    let id = self.agnus.slots.get(slot).id;
                    self.agnus.slots.cancel(slot);
                    let mut port = BusPort {
                        agnus: &mut self.agnus,
                        denise: &mut self.denise,
                        ram: &mut self.ram,
                    };
                    self.clients.service(slot, id, &mut port);
                }
            }
        }
        self.agnus.skip_serviced_cycle();
    }

    fn finish_cycle(&mut self) {
        if self.agnus.advance() {
            self.end_line();
        }
    }

    fn service_bpl(&mut self) {
        let h = self.agnus.pos.h;
        let event = self.agnus.tables.bpl_event(h);
        let flags = event.drawing_flags();
        match event.kind() {
            BplEventKind::Lores(0) => {
                self.draw(flags, false);
                self.fetch_bitplane(0);
            }
            BplEventKind::Hires(0) => {
                self.draw(flags, true);
                self.fetch_bitplane(0);
            }
            BplEventKind::Lores(plane) => {
                self.fetch_bitplane(plane);
                self.draw(flags, false);
            }
            BplEventKind::Hires(plane) => {
                self.fetch_bitplane(plane);
                self.draw(flags, true);
            }
            BplEventKind::ShiftOnly => {
                self.denise.fill_shift_registers(false, true, h);
                self.draw(flags, self.agnus.hires());
            }
            BplEventKind::None | BplEventKind::EndOfLine => self.draw(flags, self.agnus.hires()),
        }
        self.agnus.schedule_next_bpl(h + 1);
    }

    fn fetch_bitplane(&mut self, plane: u8) {
        let h = self.agnus.pos.h;
        let value = self.agnus.fetch_bitplane(plane, &self.ram);
        self.denise.write_bpldat(usize::from(plane), value);
        if plane == 0 {
            let window = self.agnus.window();
            let (odd, even) = (window.in_range_odd(h), window.in_range_even(h));
            self.denise.fill_shift_registers(odd, even, h);
        }
    }

    fn draw(&mut self, flags: u8, hires: bool) {
        let h = self.agnus.pos.h;
        match (flags & DRAW_ODD != 0, flags & DRAW_EVEN != 0) {
            (true, true) => self.denise.draw_both(h, hires),
            (true, false) => self.denise.draw_odd(h, hires),
            (false, true) => self.denise.draw_even(h, hires),
            (false, false) => {}
        }
    }

    fn service_das(&mut self) {
        let h = self.agnus.pos.h;
        match self.agnus.tables.das_event(h) {
            DasEvent::None => {}
            DasEvent::Refresh => self.agnus.bus.claim_refresh(),
            DasEvent::Disk(_) => {
                let mut port = BusPort {
                    agnus: &mut self.agnus,
                    denise: &mut self.denise,
                    ram: &mut self.ram,
                };
                self.clients.disk_slot(&mut port);
            }
            DasEvent::Audio(channel) => {
                let mut port = BusPort {
                    agnus: &mut self.agnus,
                    denise: &mut self.denise,
                    ram: &mut self.ram,
                };
                self.clients.audio_slot(channel, &mut port);
            }
            DasEvent::SpriteFirst(n) => {
                let transfer = self.agnus.sprite_first_slot(n, &self.ram);
                self.forward_sprite(n, transfer);
            }
            DasEvent::SpriteSecond(n) => {
                let transfer = self.agnus.sprite_second_slot(n, &self.ram);
                self.forward_sprite(n, transfer);
            }
            DasEvent::SpriteDmaUpdate => self.agnus.update_sprite_dma(),
        }
        self.agnus.schedule_next_das(h + 1);
    }

    fn forward_sprite(&mut self, n: u8, transfer: Option<SpriteTransfer>) {
        let h = self.agnus.pos.h;
        let x = usize::from(n);
        match transfer {
            Some(SpriteTransfer::Pos(v)) => self.denise.poke_sprpos(x, v, h),
            Some(SpriteTransfer::Ctl(v)) => self.denise.poke_sprctl(x, v, h),
            Some(SpriteTransfer::Data(v)) => self.denise.poke_sprdata(x, v, h),
            Some(SpriteTransfer::Datb(v)) => self.denise.poke_sprdatb(x, v, h),
            None => {}
        }
    }

    fn end_line(&mut self) {
        let v = self.agnus.pos.v;
        let diw = self.agnus.diw;
        self.denise.end_of_line(
            v,
            BorderState {
                v_flop: diw.v_flop,
                h_flop: diw.h_flop,
                h_flop_on: diw.h_flop_on,
                h_flop_off: diw.h_flop_off,
            },
        );

        let width = commodore_denise_ocs::FB_WIDTH as usize;
        let start = usize::from(v) * width;
        if let Some(row) = self.denise.framebuffer.get_mut(start..start + width) {
            self.debugger
                .overlay(self.agnus.bus.owners(), self.agnus.bus.values(), row);
        }
        if let Some(callback) = self.on_scanline.as_mut() {
            callback(v, self.denise.line_indices());
        }

        if self.agnus.hsync() {
            let nr = self.agnus.frame.nr;
            if let Some(callback) = self.on_frame.as_mut() {
                callback(nr, &self.denise.framebuffer);
            }
        }
        self.denise.begin_of_line();
    }
}

impl<C: DmaClients> Tickable for Amiga<C> {
    fn tick(&mut self) {
        self.advance_one_cycle();
    }

    fn tick_n(&mut self, count: Ticks) {
        let target = self.agnus.clock + count.get();
        self.execute_until(target);
    }
}

impl<C: DmaClients> Observable for Amiga<C> {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("agnus.") {
            let agnus = &self.agnus;
            match rest {
                "dmacon" => Some(agnus.dmacon.into()),
                "bplcon0" => Some(agnus.bplcon0.into()),
                "bplcon1" => Some(agnus.bplcon1.into()),
                "ddfstrt" => Some(agnus.ddfstrt.into()),
                "ddfstop" => Some(agnus.ddfstop.into()),
                "diwstrt" => Some(agnus.diwstrt.into()),
                "diwstop" => Some(agnus.diwstop.into()),
                "bpl1mod" => Some(agnus.bpl1mod.into()),
                "bpl2mod" => Some(agnus.bpl2mod.into()),
                "bls" => Some(agnus.bus.bls.into()),
                "revision" => Some(agnus.revision.to_string().into()),
                _ => None,
            }
        } else if let Some(rest) = path.strip_prefix("denise.") {
            if let Some(idx) = rest.strip_prefix("color.") {
                let n: usize = idx.parse().ok()?;
                return self.denise.colors.get(n).map(|&c| c.into());
            }
            match rest {
                "bplcon0" => Some(self.denise.bplcon0.into()),
                "bplcon1" => Some(self.denise.bplcon1.into()),
                "bplcon2" => Some(self.denise.bplcon2.into()),
                "clxcon" => Some(self.denise.clxcon.into()),
                "clxdat" => Some(self.denise.clxdat.into()),
                _ => None,
            }
        } else if let Some(rest) = path.strip_prefix("bus.") {
            if let Some(idx) = rest.strip_prefix("owner.") {
                let h: u16 = idx.parse().ok()?;
                let owners = self.agnus.bus.owners();
                return owners
                    .get(usize::from(h))
                    .map(|o| format!("{o:?}").into());
            }
            let stats = self.agnus.bus.last_frame;
            if rest == "last_frame" {
                let map = commodore_agnus_ocs::BusChannel::ALL
                    .into_iter()
                    .map(|c| (format!("{c:?}").to_lowercase(), Value::U64(stats.get(c))))
                    .collect();
                return Some(Value::Map(map));
            }
            let name = rest.strip_prefix("last_frame.")?;
            let channel = commodore_agnus_ocs::BusChannel::ALL
                .into_iter()
                .find(|c| format!("{c:?}").eq_ignore_ascii_case(name))?;
            Some(stats.get(channel).into())
        } else {
            match path {
                "beam.v" => Some(self.agnus.pos.v.into()),
                "beam.h" => Some(self.agnus.pos.h.into()),
                "frame" => Some(self.agnus.frame.nr.into()),
                "lof" => Some(self.agnus.frame.lof.into()),
                "cycle" => Some(self.agnus.clock.into()),
                "cpu_wait_states" => Some(self.cpu_wait_states.into()),
                _ => None,
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "beam.v",
            "beam.h",
            "frame",
            "lof",
            "cycle",
            "cpu_wait_states",
            "agnus.dmacon",
            "agnus.bplcon0",
            "agnus.bplcon1",
            "agnus.ddfstrt",
            "agnus.ddfstop",
            "agnus.diwstrt",
            "agnus.diwstop",
            "agnus.bpl1mod",
            "agnus.bpl2mod",
            "agnus.bls",
            "agnus.revision",
            "denise.bplcon0",
            "denise.bplcon1",
            "denise.bplcon2",
            "denise.clxcon",
            "denise.clxdat",
            "denise.color.<0-31>",
            "bus.owner.<h>",
            "bus.last_frame",
            "bus.last_frame.<channel>",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custom_regs::{BPLCON0, COLOR00, DMACON};
    use commodore_agnus_ocs::{DMACON_BPLEN, DMACON_DMAEN, DMACON_SET, HPOS_CNT};

    fn amiga() -> Amiga {
        Amiga::new(AmigaConfig::default()).unwrap()
    }

    #[test]
    fn impossible_config_is_rejected_up_front() {
        let err = Amiga::new(AmigaConfig::default().with_chip_ram_kb(2048));
        assert!(err.is_err());
    }

    #[test]
    fn one_line_is_227_cycles() {
        let mut amiga = amiga();
        amiga.execute_until(u64::from(HPOS_CNT));
        assert_eq!(amiga.agnus.pos.v, 1);
        assert_eq!(amiga.agnus.pos.h, 0);
    }

    #[test]
    fn refresh_is_booked_every_line() {
        let mut amiga = amiga();
        amiga.execute_until(10);
        assert_eq!(amiga.agnus.bus.owner(0x01), BusOwner::Refresh);
        assert_eq!(amiga.agnus.bus.owner(0x03), BusOwner::Refresh);
        assert_eq!(amiga.agnus.bus.owner(0x05), BusOwner::Refresh);
    }

    #[test]
    fn dmacon_applies_immediately() {
        let mut amiga = amiga();
        amiga.write_custom_reg(DMACON, DMACON_SET | DMACON_DMAEN | DMACON_BPLEN);
        assert_eq!(amiga.read_custom_reg(custom_regs::DMACONR), DMACON_DMAEN | DMACON_BPLEN);
    }

    #[test]
    fn denise_sees_bplcon0_one_cycle_late() {
        let mut amiga = amiga();
        amiga.execute_until(100);
        amiga.write_custom_reg(BPLCON0, 0x1200);
        assert_eq!(amiga.denise.bplcon0, 0);
        amiga.advance_one_cycle();
        assert_eq!(amiga.denise.bplcon0, 0);
        amiga.advance_one_cycle();
        assert_eq!(amiga.denise.bplcon0, 0x1200);
        assert_eq!(amiga.agnus.bplcon0, 0, "Agnus latency is four cycles");
        amiga.execute_until(105);
        assert_eq!(amiga.agnus.bplcon0, 0x1200);
    }

    #[test]
    fn cpu_gets_a_free_bus_without_waiting() {
        let mut amiga = amiga();
        amiga.execute_until(0x40);
        assert_eq!(amiga.execute_until_bus_is_free(), 0);
        assert_eq!(amiga.agnus.bus.owner(0x3F), BusOwner::Cpu);
        assert_eq!(amiga.cpu_wait_states, 0);
    }

    #[test]
    fn scanline_callback_sees_every_line() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let lines = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&lines);
        let mut amiga = amiga();
        amiga.set_scanline_callback(move |v, indices| {
            sink.borrow_mut().push((v, indices.len()));
        });
        amiga.execute_until(3 * u64::from(HPOS_CNT));
        let lines = lines.borrow();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2].0, 2);
        assert_eq!(lines[0].1, commodore_denise_ocs::HPIXELS);
    }

    #[test]
    fn tick_n_matches_single_ticks() {
        let mut bulk = amiga();
        let mut single = amiga();
        for m in [&mut bulk, &mut single] {
            m.write_custom_reg(DMACON, DMACON_SET | DMACON_DMAEN | DMACON_BPLEN);
            m.write_custom_reg(BPLCON0, 0x2200);
        }
        bulk.tick_n(Ticks::new(3 * u64::from(HPOS_CNT) + 17));
        for _ in 0..3 * u64::from(HPOS_CNT) + 17 {
            single.tick();
        }
        assert_eq!(bulk.snapshot(), single.snapshot());
        assert_eq!(bulk.agnus.pos, commodore_agnus_ocs::Beam::new(3, 17));
    }

    #[test]
    fn queries_cover_the_listed_paths() {
        let mut amiga = amiga();
        amiga.poke(COLOR00 + 2, 0x0F00, Accessor::Cpu);
        amiga.execute_until(500);
        assert_eq!(amiga.query("cycle"), Some(Value::U64(500)));
        assert_eq!(amiga.query("beam.v"), Some(Value::U16(2)));
        assert_eq!(amiga.query("denise.color.1"), Some(Value::U16(0x0F00)));
        assert_eq!(amiga.query("bus.owner.1"), Some(Value::String("Refresh".into())));
        assert_eq!(amiga.query("nonsense"), None);
        for path in amiga.query_paths() {
            if !path.contains('<') {
                assert!(amiga.query(path).is_some(), "{path} not answered");
            }
        }
    }
}
