//! Custom chip register offsets and write/read routing.
//!
//! Custom registers live at $DFF000-$DFF1FF. Only the registers handled by
//! the display DMA core are decoded here; every other offset is ignored.

#![allow(clippy::cast_possible_truncation)]

use commodore_agnus_ocs::{Agnus, ChipsetReg};
use commodore_denise_ocs::{Accessor, DeniseOcs};
use log::trace;

// Read registers (offsets from $DFF000):
pub const DMACONR: u16 = 0x002;
pub const VPOSR: u16 = 0x004;
pub const VHPOSR: u16 = 0x006;
pub const CLXDAT: u16 = 0x00E;

// Write registers:
pub const DIWSTRT: u16 = 0x08E;
pub const DIWSTOP: u16 = 0x090;
pub const DDFSTRT: u16 = 0x092;
pub const DDFSTOP: u16 = 0x094;
pub const DMACON: u16 = 0x096;
pub const CLXCON: u16 = 0x098;
pub const BPL1PTH: u16 = 0x0E0;
pub const BPL6PTL: u16 = 0x0F6;
pub const BPLCON0: u16 = 0x100;
pub const BPLCON1: u16 = 0x102;
pub const BPLCON2: u16 = 0x104;
pub const BPL1MOD: u16 = 0x108;
pub const BPL2MOD: u16 = 0x10A;
pub const BPL1DAT: u16 = 0x110;
pub const BPL6DAT: u16 = 0x11A;
pub const SPR0PTH: u16 = 0x120;
pub const SPR7PTL: u16 = 0x13E;
pub const SPR0POS: u16 = 0x140;
pub const SPR7DATB: u16 = 0x17E;
pub const COLOR00: u16 = 0x180;
pub const COLOR31: u16 = 0x1BE;

/// Route a register write to the chip(s) that latch it.
///
/// Writes that reach a chip late go through the register change queue of
/// Agnus; the rest take effect in the current cycle.
pub fn write(agnus: &mut Agnus, denise: &mut DeniseOcs, offset: u16, value: u16, accessor: Accessor) {
    let offset = offset & 0x1FE;
    let h = agnus.pos.h;
    match offset {
        DMACON => agnus.set_dmacon(value),
        CLXCON => denise.write_clxcon(value),
        DIWSTRT => agnus.poke_diwstrt(value),
        DIWSTOP => agnus.poke_diwstop(value),
        DDFSTRT => agnus.poke_ddfstrt(value),
        DDFSTOP => agnus.poke_ddfstop(value),
        BPL1PTH..=BPL6PTL => {
            let n = usize::from((offset - BPL1PTH) / 4);
            if offset & 2 == 0 {
                agnus.poke_bplpth(n, value);
            } else {
                agnus.poke_bplptl(n, value);
            }
        }
        BPLCON0 => {
            agnus.poke_bplcon0(value);
            agnus.record_change(ChipsetReg::BplCon0Denise, value);
        }
        BPLCON1 => {
            agnus.poke_bplcon1(value);
            agnus.record_change(ChipsetReg::BplCon1Denise, value);
        }
        BPLCON2 => agnus.record_change(ChipsetReg::BplCon2Denise, value),
        BPL1MOD => agnus.poke_bpl1mod(value),
        BPL2MOD => agnus.poke_bpl2mod(value),
        BPL1DAT..=BPL6DAT => {
            let n = usize::from((offset - BPL1DAT) / 2);
            denise.write_bpldat(n, value);
            if n == 0 {
                denise.fill_shift_registers(true, true, h);
            }
        }
        SPR0PTH..=SPR7PTL => {
            let n = usize::from((offset - SPR0PTH) / 4);
            if offset & 2 == 0 {
                agnus.poke_sprpth(n, value);
            } else {
                agnus.poke_sprptl(n, value);
            }
        }
        SPR0POS..=SPR7DATB => {
            let n = usize::from((offset - SPR0POS) / 8);
            match (offset >> 1) & 3 {
                0 => {
                    agnus.poke_sprpos(n, value);
                    denise.poke_sprpos(n, value, h);
                }
                1 => {
                    agnus.poke_sprctl(n, value);
                    denise.poke_sprctl(n, value, h);
                }
                2 => denise.poke_sprdata(n, value, h),
                _ => denise.poke_sprdatb(n, value, h),
            }
        }
        COLOR00..=COLOR31 => {
            let n = usize::from((offset - COLOR00) / 2);
            denise.poke_color(n, value, h, accessor);
        }
        _ => trace!(target: "agnus::bus", "write to unhandled register ${offset:03X} = ${value:04X}"),
    }
}

/// Read a register. Unhandled offsets read as zero.
pub fn read(agnus: &Agnus, denise: &mut DeniseOcs, offset: u16) -> u16 {
    match offset & 0x1FE {
        DMACONR => agnus.dmacon,
        VPOSR => (u16::from(agnus.frame.lof) << 15) | ((agnus.pos.v >> 8) & 1),
        VHPOSR => ((agnus.pos.v & 0xFF) << 8) | (agnus.pos.h & 0xFF),
        CLXDAT => denise.read_clxdat(),
        _ => 0,
    }
}
