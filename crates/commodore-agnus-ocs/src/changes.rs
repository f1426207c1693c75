//! Deferred chipset register writes.

use emu_core::ChangeRecorder;

/// Register whose write reaches the chip a few cycles late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChipsetReg {
    #[default]
    None,
    BplCon0Agnus,
    BplCon1Agnus,
    DdfStrt,
    DdfStop,
    DiwStrt,
    DiwStop,
    BplPtH(u8),
    BplPtL(u8),
    Bpl1Mod,
    Bpl2Mod,
    BplCon0Denise,
    BplCon1Denise,
    BplCon2Denise,
}

impl ChipsetReg {
    /// Cycles between the write and the moment the chip sees it.
    #[must_use]
    pub const fn delay(self) -> u64 {
        match self {
            Self::None => 0,
            Self::BplCon0Agnus => 4,
            Self::BplCon1Agnus | Self::BplCon0Denise | Self::BplCon1Denise | Self::BplCon2Denise => 1,
            Self::DdfStrt
            | Self::DdfStop
            | Self::DiwStrt
            | Self::DiwStop
            | Self::BplPtH(_)
            | Self::BplPtL(_)
            | Self::Bpl1Mod
            | Self::Bpl2Mod => 2,
        }
    }

    /// Whether Denise rather than Agnus consumes the change.
    #[must_use]
    pub const fn is_denise(self) -> bool {
        matches!(
            self,
            Self::BplCon0Denise | Self::BplCon1Denise | Self::BplCon2Denise
        )
    }
}

/// One pending write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegChange {
    pub reg: ChipsetReg,
    pub value: u16,
}

/// Enough for every register above to be written several times per line.
pub const REG_QUEUE_CAPACITY: usize = 128;

pub type RegChangeQueue = ChangeRecorder<RegChange, REG_QUEUE_CAPACITY>;
