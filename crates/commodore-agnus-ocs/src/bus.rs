//! Bus ownership record and arbitration rules.
//!
//! Fixed DMA slots (refresh, disk, audio, bitplane, sprite) take their cycle
//! unconditionally. The Copper and the Blitter compete for whatever is left;
//! the CPU gets a cycle only once the previous one has been released.

use std::fmt;

use crate::beam::HPOS_CNT;

const LEN: usize = HPOS_CNT as usize;

const DMACON_BLTPRI: u16 = 0x0400;
const DMACON_DMAEN: u16 = 0x0200;
const DMACON_COPEN: u16 = 0x0080;
const DMACON_BLTEN: u16 = 0x0040;

/// The Copper never gets this cycle.
pub const COPPER_DEAD_CYCLE: u16 = 0xE0;

/// Refresh cycles of every line.
pub const REFRESH_SLOTS: [u16; 4] = [0x01, 0x03, 0x05, 0xE2];

/// Who holds the chip bus in a given cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BusOwner {
    #[default]
    None,
    Cpu,
    Refresh,
    Disk,
    Audio(u8),
    Bitplane(u8),
    Sprite(u8),
    Copper,
    Blitter,
}

impl BusOwner {
    /// Statistics bucket of this owner.
    #[must_use]
    pub const fn channel(self) -> BusChannel {
        match self {
            Self::None => BusChannel::None,
            Self::Cpu => BusChannel::Cpu,
            Self::Refresh => BusChannel::Refresh,
            Self::Disk => BusChannel::Disk,
            Self::Audio(_) => BusChannel::Audio,
            Self::Bitplane(_) => BusChannel::Bitplane,
            Self::Sprite(_) => BusChannel::Sprite,
            Self::Copper => BusChannel::Copper,
            Self::Blitter => BusChannel::Blitter,
        }
    }
}

impl fmt::Display for BusOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "-"),
            Self::Cpu => write!(f, "CPU"),
            Self::Refresh => write!(f, "REF"),
            Self::Disk => write!(f, "DSK"),
            Self::Audio(n) => write!(f, "AUD{n}"),
            Self::Bitplane(n) => write!(f, "BPL{}", n + 1),
            Self::Sprite(n) => write!(f, "SPR{n}"),
            Self::Copper => write!(f, "COP"),
            Self::Blitter => write!(f, "BLT"),
        }
    }
}

/// Owner classes without the channel number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BusChannel {
    None,
    Cpu,
    Refresh,
    Disk,
    Audio,
    Bitplane,
    Sprite,
    Copper,
    Blitter,
}

impl BusChannel {
    pub const COUNT: usize = 9;

    pub const ALL: [BusChannel; Self::COUNT] = [
        Self::None,
        Self::Cpu,
        Self::Refresh,
        Self::Disk,
        Self::Audio,
        Self::Bitplane,
        Self::Sprite,
        Self::Copper,
        Self::Blitter,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Bus cycles used per owner class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DmaStats {
    pub counts: [u64; BusChannel::COUNT],
}

impl DmaStats {
    #[must_use]
    pub fn get(&self, channel: BusChannel) -> u64 {
        self.counts[channel.index()]
    }

    pub fn add(&mut self, channel: BusChannel, cycles: u64) {
        self.counts[channel.index()] += cycles;
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Per-cycle bus record of the current line.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BusArbiter {
    #[cfg_attr(feature = "serde", serde(with = "serde_line"))]
    owner: [BusOwner; LEN],
    #[cfg_attr(feature = "serde", serde(with = "serde_line"))]
    value: [u16; LEN],
    /// Usage of the running frame.
    pub stats: DmaStats,
    /// Usage of the last completed frame.
    pub last_frame: DmaStats,
    /// Blitter slow-down: the CPU has been starved long enough that the
    /// Blitter must let it through.
    pub bls: bool,
}

impl BusArbiter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            owner: [BusOwner::None; LEN],
            value: [0; LEN],
            stats: DmaStats::default(),
            last_frame: DmaStats::default(),
            bls: false,
        }
    }

    #[must_use]
    pub fn owner(&self, h: u16) -> BusOwner {
        self.owner[usize::from(h)]
    }

    #[must_use]
    pub fn value(&self, h: u16) -> u16 {
        self.value[usize::from(h)]
    }

    #[must_use]
    pub fn owners(&self) -> &[BusOwner; LEN] {
        &self.owner
    }

    #[must_use]
    pub fn values(&self) -> &[u16; LEN] {
        &self.value
    }

    #[must_use]
    pub fn is_owned(&self, h: u16) -> bool {
        self.owner(h) != BusOwner::None
    }

    /// Whether `owner` may take cycle `h` given the current DMACON.
    ///
    /// Only meaningful for the Copper, the Blitter and the CPU; fixed-slot
    /// DMA uses [`BusArbiter::claim`] directly.
    #[must_use]
    pub fn is_free(&self, h: u16, owner: BusOwner, dmacon: u16) -> bool {
        if self.is_owned(h) {
            return false;
        }
        let dma = dmacon & DMACON_DMAEN != 0;
        match owner {
            BusOwner::Copper => dma && dmacon & DMACON_COPEN != 0 && h != COPPER_DEAD_CYCLE,
            BusOwner::Blitter => {
                dma && dmacon & DMACON_BLTEN != 0 && !(self.bls && dmacon & DMACON_BLTPRI == 0)
            }
            _ => true,
        }
    }

    /// Claim `h` for `owner` if [`BusArbiter::is_free`] allows it.
    pub fn allocate(&mut self, h: u16, owner: BusOwner, dmacon: u16, value: u16) -> bool {
        if !self.is_free(h, owner, dmacon) {
            return false;
        }
        self.claim(h, owner, value);
        true
    }

    /// Book `h` for `owner` unconditionally and count it.
    pub fn claim(&mut self, h: u16, owner: BusOwner, value: u16) {
        let i = usize::from(h);
        self.owner[i] = owner;
        self.value[i] = value;
        self.stats.add(owner.channel(), 1);
    }

    /// Book `h` for `owner` without recording a transfer or counting it.
    pub fn reserve(&mut self, h: u16, owner: BusOwner) {
        self.owner[usize::from(h)] = owner;
    }

    /// Book all four refresh cycles of the line.
    pub fn claim_refresh(&mut self) {
        for h in REFRESH_SLOTS {
            self.claim(h, BusOwner::Refresh, 0);
        }
    }

    /// Forget every owner of the line.
    pub fn clear_line(&mut self) {
        self.owner = [BusOwner::None; LEN];
    }

    /// Close the frame's statistics.
    pub fn end_frame(&mut self) {
        self.last_frame = self.stats;
        self.stats = DmaStats::default();
    }
}

impl Default for BusArbiter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BusArbiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let owned = self.owner.iter().filter(|o| **o != BusOwner::None).count();
        f.debug_struct("BusArbiter")
            .field("owned_cycles", &owned)
            .field("bls", &self.bls)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "serde")]
mod serde_line {
    use super::LEN;
    use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error};

    pub fn serialize<T: Serialize, S: Serializer>(line: &[T; LEN], s: S) -> Result<S::Ok, S::Error> {
        line.as_slice().serialize(s)
    }

    pub fn deserialize<'de, T, D>(d: D) -> Result<[T; LEN], D::Error>
    where
        T: Deserialize<'de> + Copy + Default,
        D: Deserializer<'de>,
    {
        let items = Vec::<T>::deserialize(d)?;
        let len = items.len();
        items
            .try_into()
            .map_err(|_| D::Error::invalid_length(len, &"one entry per DMA cycle"))
    }
}
