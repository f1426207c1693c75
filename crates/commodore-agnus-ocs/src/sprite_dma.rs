//! Sprite DMA state machine.
//!
//! Each sprite is either idle, in which case the DMA slots pick up the next
//! POS/CTL pair once the beam reaches the stop line, or active, in which
//! case the slots deliver DATA/DATB. Transitions are evaluated once per
//! line for the line that follows.

/// First line on which sprite DMA can run.
pub const SPRITE_DMA_FIRST_LINE: u16 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpriteDmaState {
    #[default]
    Idle,
    Active,
}

/// What the two DMA slots of a sprite fetch on the current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteFetch {
    /// Control words (POS in the first slot, CTL in the second).
    Control,
    /// Image data (DATA in the first slot, DATB in the second).
    Data,
    Nothing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpriteDma {
    pub pt: [u32; 8],
    pub vstrt: [u16; 8],
    pub vstop: [u16; 8],
    pub state: [SpriteDmaState; 8],
}

impl SpriteDma {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_pth(&mut self, n: usize, value: u16, ptr_mask: u32) {
        self.pt[n] = ((u32::from(value) << 16) | (self.pt[n] & 0xFFFF)) & ptr_mask;
    }

    pub fn write_ptl(&mut self, n: usize, value: u16, ptr_mask: u32) {
        self.pt[n] = ((self.pt[n] & 0xFFFF_0000) | u32::from(value & 0xFFFE)) & ptr_mask;
    }

    /// SPRxPOS as seen by Agnus. `seen_v` is the line the write counts for.
    pub fn write_pos(&mut self, n: usize, value: u16, seen_v: u16) {
        self.vstrt[n] = (value >> 8) | (self.vstrt[n] & 0x100);
        self.compare(n, seen_v);
    }

    /// SPRxCTL as seen by Agnus.
    pub fn write_ctl(&mut self, n: usize, value: u16, seen_v: u16) {
        self.vstrt[n] = ((value & 0b100) << 6) | (self.vstrt[n] & 0x00FF);
        self.vstop[n] = ((value & 0b010) << 7) | (value >> 8);
        self.compare(n, seen_v);
    }

    fn compare(&mut self, n: usize, v: u16) {
        if self.vstrt[n] == v {
            self.state[n] = SpriteDmaState::Active;
        }
        if self.vstop[n] == v {
            self.state[n] = SpriteDmaState::Idle;
        }
    }

    /// What sprite `n` fetches on line `v`.
    #[must_use]
    pub fn fetch_kind(&self, n: usize, v: u16) -> SpriteFetch {
        if v == self.vstop[n] {
            SpriteFetch::Control
        } else if self.state[n] == SpriteDmaState::Active {
            SpriteFetch::Data
        } else {
            SpriteFetch::Nothing
        }
    }

    /// Reading the control words ends the current sprite.
    pub fn finish(&mut self, n: usize) {
        self.state[n] = SpriteDmaState::Idle;
    }

    /// Return the pointer of sprite `n` and advance it by one word.
    pub fn next_address(&mut self, n: usize, ptr_mask: u32) -> u32 {
        let addr = self.pt[n];
        self.pt[n] = addr.wrapping_add(2) & ptr_mask;
        addr
    }

    /// Prepare the state of every sprite for line `next_v`.
    pub fn update_for_line(&mut self, next_v: u16, spr_dma: bool, last_line: u16) {
        if next_v == SPRITE_DMA_FIRST_LINE && spr_dma {
            self.vstop = [SPRITE_DMA_FIRST_LINE; 8];
            return;
        }
        if next_v == last_line {
            self.state = [SpriteDmaState::Idle; 8];
            return;
        }
        for n in 0..8 {
            self.compare(n, next_v);
        }
    }

    #[must_use]
    pub fn is_active(&self, n: usize) -> bool {
        self.state[n] == SpriteDmaState::Active
    }
}
