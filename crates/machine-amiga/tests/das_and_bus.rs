use machine_amiga::commodore_agnus_ocs::{
    BusOwner, DMACON_BLTEN, DMACON_BLTPRI, DMACON_DMAEN, DMACON_DSKEN, DMACON_SET, DasEvent,
    EventSlot, HPOS_CNT,
};
use machine_amiga::commodore_denise_ocs::HPIXELS;
use machine_amiga::custom_regs::DMACON;
use machine_amiga::{Amiga, AmigaConfig, BusPort, DmaClients, Rgb};

fn line_start(v: u16) -> u64 {
    u64::from(v) * u64::from(HPOS_CNT)
}

/// Counts the disk and audio slots it is offered and takes the disk ones.
#[derive(Default)]
struct SlotCounter {
    disk: u32,
    audio: [u32; 4],
}

impl DmaClients for SlotCounter {
    fn disk_slot(&mut self, port: &mut BusPort<'_>) {
        self.disk += 1;
        port.claim(BusOwner::Disk, 0x4489);
    }

    fn audio_slot(&mut self, channel: u8, _port: &mut BusPort<'_>) {
        self.audio[usize::from(channel)] += 1;
    }
}

/// Asks for one bus cycle per pending word until it has moved them all.
#[derive(Default)]
struct Blitter {
    words: u32,
    /// (h, bls, granted) for every request.
    log: Vec<(u16, bool, bool)>,
}

impl DmaClients for Blitter {
    fn service(&mut self, slot: EventSlot, _id: u8, port: &mut BusPort<'_>) {
        assert_eq!(slot, EventSlot::Blt);
        let granted = port.request(BusOwner::Blitter, 0);
        self.log.push((port.beam().h, port.bls(), granted));
        if granted {
            self.words -= 1;
        }
        if self.words > 0 {
            port.schedule_in(EventSlot::Blt, 1, 0);
        }
    }
}

fn blitter_machine(words: u32, dmacon: u16) -> Amiga<Blitter> {
    let blitter = Blitter { words, log: Vec::new() };
    let mut amiga = Amiga::with_clients(AmigaConfig::default(), blitter).unwrap();
    amiga.write_custom_reg(DMACON, DMACON_SET | DMACON_DMAEN | DMACON_BLTEN | dmacon);

    // Start the Blitter at $50 of line 1; it takes that cycle itself.
    amiga.execute_until(line_start(1) + 0x50);
    let now = amiga.clock();
    amiga.schedule(EventSlot::Blt, now, 0);
    amiga.advance_one_cycle();
    amiga
}

#[test]
fn disk_and_audio_slots_reach_the_clients() {
    let mut amiga = Amiga::with_clients(AmigaConfig::default(), SlotCounter::default()).unwrap();
    amiga.write_custom_reg(DMACON, DMACON_SET | DMACON_DMAEN | DMACON_DSKEN);
    amiga.execute_until(line_start(10));

    assert_eq!(amiga.clients.disk, 30);
    assert_eq!(amiga.clients.audio, [10; 4]);

    let das = amiga.snapshot().das_events;
    assert_eq!(das[0x01], DasEvent::Refresh);
    assert_eq!(das[0x07], DasEvent::Disk(0));
    assert_eq!(das[0x09], DasEvent::Disk(1));
    assert_eq!(das[0x0B], DasEvent::Disk(2));
    for channel in 0..4u8 {
        assert_eq!(das[0x0D + 2 * usize::from(channel)], DasEvent::Audio(channel));
    }
    assert!(
        das.iter()
            .all(|e| !matches!(e, DasEvent::SpriteFirst(_) | DasEvent::SpriteSecond(_))),
        "sprite DMA is off"
    );

    amiga.execute_until(line_start(10) + 0x20);
    assert_eq!(amiga.agnus.bus.owner(0x07), BusOwner::Disk);
    assert_eq!(amiga.agnus.bus.value(0x07), 0x4489);
    assert_eq!(amiga.agnus.bus.owner(0x0D), BusOwner::None, "audio client took nothing");
}

#[test]
fn disabling_disk_dma_empties_its_slots_in_the_same_line() {
    let mut amiga = Amiga::with_clients(AmigaConfig::default(), SlotCounter::default()).unwrap();
    amiga.write_custom_reg(DMACON, DMACON_SET | DMACON_DMAEN | DMACON_DSKEN);
    amiga.execute_until(line_start(2) + 0x08);
    amiga.write_custom_reg(DMACON, DMACON_DSKEN);
    amiga.execute_until(line_start(3));
    // Two full lines plus the slot at $07 of line 2
    assert_eq!(amiga.clients.disk, 7);
}

#[test]
fn owners_are_forgotten_at_the_start_of_a_line() {
    let mut amiga = Amiga::new(AmigaConfig::default()).unwrap();
    amiga.execute_until(line_start(4) + 0x10);
    assert_eq!(amiga.agnus.bus.owner(0x01), BusOwner::Refresh);
    amiga.execute_until(line_start(5));
    assert!(amiga.agnus.bus.owners().iter().all(|&o| o == BusOwner::None));
    assert_eq!(amiga.snapshot().owned_cycles(), 0);
}

#[test]
fn blitter_slow_down_lets_the_cpu_in() {
    let mut amiga = blitter_machine(20, 0);
    assert_eq!(amiga.agnus.bus.owner(0x50), BusOwner::Blitter);

    let waited = amiga.execute_until_bus_is_free();
    assert_eq!(waited, 3);
    assert_eq!(amiga.cpu_wait_states, 3);

    let bus = &amiga.agnus.bus;
    assert_eq!(bus.owner(0x51), BusOwner::Blitter);
    assert_eq!(bus.owner(0x52), BusOwner::Blitter);
    assert_eq!(bus.owner(0x53), BusOwner::Cpu);
    assert!(!bus.bls, "slow-down ends with the CPU access");

    assert_eq!(
        amiga.clients.log,
        vec![
            (0x50, false, true),
            (0x51, false, true),
            (0x52, false, true),
            (0x53, true, false),
        ]
    );

    // The Blitter carries on once the CPU is through
    amiga.advance_one_cycle();
    assert_eq!(amiga.agnus.bus.owner(0x54), BusOwner::Blitter);
}

#[test]
fn blitter_priority_ignores_slow_down() {
    let mut amiga = blitter_machine(6, DMACON_BLTPRI);
    let waited = amiga.execute_until_bus_is_free();
    assert_eq!(waited, 6);
    for h in 0x50..0x56 {
        assert_eq!(amiga.agnus.bus.owner(h), BusOwner::Blitter, "cycle ${h:02X}");
    }
    assert_eq!(amiga.agnus.bus.owner(0x56), BusOwner::Cpu);
    assert!(amiga.clients.log.iter().all(|&(_, _, granted)| granted));
    assert_eq!(amiga.clients.words, 0);
}

#[test]
fn cpu_waits_out_fixed_dma_without_slow_down_effects() {
    let mut amiga = Amiga::new(AmigaConfig::default()).unwrap();
    // Cycle $01 is refresh; the CPU asks right after it
    amiga.execute_until(line_start(3) + 0x02);
    assert_eq!(amiga.execute_until_bus_is_free(), 1);
    assert_eq!(amiga.agnus.bus.owner(0x02), BusOwner::Cpu);
    assert!(!amiga.agnus.bus.bls);
}

#[test]
fn debugger_overlay_paints_bus_owners() {
    let mut amiga = Amiga::new(AmigaConfig::default()).unwrap();
    amiga.debugger.enabled = true;
    amiga.debugger.set_opacity(1.0);
    amiga.execute_until(line_start(31));

    let row = &amiga.framebuffer()[30 * HPIXELS..31 * HPIXELS];
    let refresh = Rgb::new(1.0, 0.0, 0.0).shade(0.3).to_argb();
    assert_eq!(row[4], refresh, "refresh at $01");
    assert_eq!(row[4 * 0xE2], refresh, "refresh at $E2");
    assert_ne!(row[0], refresh);
}

#[test]
fn last_frame_statistics_are_queryable() {
    use emu_core::{Observable, Value};

    let mut amiga = Amiga::new(AmigaConfig::default()).unwrap();
    amiga.run_frame();
    let lines = u64::from(amiga.agnus.frame.num_lines());
    assert_eq!(amiga.query("bus.last_frame.refresh"), Some(Value::U64(4 * lines)));
    assert_eq!(amiga.query("bus.last_frame.blitter"), Some(Value::U64(0)));
    assert_eq!(amiga.query("bus.last_frame.nothing"), None);

    let Some(Value::Map(all)) = amiga.query("bus.last_frame") else {
        panic!("bus.last_frame is not a map");
    };
    assert_eq!(all.len(), 9);
    assert_eq!(all["refresh"], Value::U64(4 * lines));
}
