//! Event identifiers and the scheduler slot array.

use crate::beam::Cycle;

/// Trigger value of a slot with nothing pending.
pub const NEVER: Cycle = Cycle::MAX;

/// Denise should shift out the odd planes at this cycle.
pub const DRAW_ODD: u8 = 0b01;
/// Denise should shift out the even planes at this cycle.
pub const DRAW_EVEN: u8 = 0b10;
const DRAW_MASK: u8 = DRAW_ODD | DRAW_EVEN;

/// One cell of the bitplane event table.
///
/// The low two bits carry the drawing flags, the rest identifies the fetch.
/// Use [`BplEvent::kind`] and [`BplEvent::drawing_flags`] rather than the raw
/// byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BplEvent(u8);

/// What a bitplane event does apart from drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BplEventKind {
    None,
    /// Lores fetch for plane 0..=5.
    Lores(u8),
    /// Hires fetch for plane 0..=3.
    Hires(u8),
    /// Load the shift registers without a fetch.
    ShiftOnly,
    EndOfLine,
}

const LORES_BASE: u8 = 0x04;
const HIRES_BASE: u8 = 0x1C;
const SHIFT_ONLY: u8 = 0x2C;
const END_OF_LINE: u8 = 0x30;

impl BplEvent {
    pub const NONE: Self = Self(0);
    pub const SHIFT_ONLY: Self = Self(SHIFT_ONLY);
    pub const END_OF_LINE: Self = Self(END_OF_LINE);

    #[must_use]
    pub const fn lores(plane: u8) -> Self {
        assert!(plane < 6, "lores bitplane out of range");
        Self(LORES_BASE + 4 * plane)
    }

    #[must_use]
    pub const fn hires(plane: u8) -> Self {
        assert!(plane < 4, "hires bitplane out of range");
        Self(HIRES_BASE + 4 * plane)
    }

    #[must_use]
    pub const fn kind(self) -> BplEventKind {
        match self.0 & !DRAW_MASK {
            0 => BplEventKind::None,
            id @ LORES_BASE..HIRES_BASE => BplEventKind::Lores((id - LORES_BASE) / 4),
            id @ HIRES_BASE..SHIFT_ONLY => BplEventKind::Hires((id - HIRES_BASE) / 4),
            SHIFT_ONLY => BplEventKind::ShiftOnly,
            _ => BplEventKind::EndOfLine,
        }
    }

    #[must_use]
    pub const fn drawing_flags(self) -> u8 {
        self.0 & DRAW_MASK
    }

    #[must_use]
    pub const fn with_flags(self, flags: u8) -> Self {
        Self(self.0 | (flags & DRAW_MASK))
    }

    /// Same event with the drawing flags stripped.
    #[must_use]
    pub const fn without_flags(self) -> Self {
        Self(self.0 & !DRAW_MASK)
    }

    /// Nothing at all happens in this cycle.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }
}

/// One cell of the disk, audio and sprite event table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DasEvent {
    #[default]
    None,
    /// Memory refresh; books all four refresh slots of the line.
    Refresh,
    Disk(u8),
    Audio(u8),
    /// POS or DATA fetch of a sprite.
    SpriteFirst(u8),
    /// CTL or DATB fetch of a sprite.
    SpriteSecond(u8),
    /// Evaluate vertical sprite start/stop for the next line.
    SpriteDmaUpdate,
}

impl DasEvent {
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::None)
    }

    /// Compact code stored as the slot payload.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Refresh => 1,
            Self::Disk(n) => 2 + n,
            Self::Audio(n) => 5 + n,
            Self::SpriteFirst(n) => 9 + 2 * n,
            Self::SpriteSecond(n) => 10 + 2 * n,
            Self::SpriteDmaUpdate => 25,
        }
    }
}

/// Scheduler slots in service order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventSlot {
    /// Raster sync. Bounds bulk execution to the current line.
    Ras,
    /// Deferred register changes.
    Reg,
    CiaA,
    CiaB,
    Bpl,
    Das,
    Cop,
    Blt,
    Irq,
    Dsk,
    /// Secondary slot for rare events.
    Sec,
}

impl EventSlot {
    pub const COUNT: usize = 11;

    pub const ALL: [EventSlot; Self::COUNT] = [
        Self::Ras,
        Self::Reg,
        Self::CiaA,
        Self::CiaB,
        Self::Bpl,
        Self::Das,
        Self::Cop,
        Self::Blt,
        Self::Irq,
        Self::Dsk,
        Self::Sec,
    ];

    /// Slots owned by components outside the chipset core.
    #[must_use]
    pub const fn is_external(self) -> bool {
        !matches!(self, Self::Ras | Self::Reg | Self::Bpl | Self::Das)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A pending event: trigger cycle plus an identifier payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PendingEvent {
    pub trigger: Cycle,
    pub id: u8,
}

impl PendingEvent {
    const IDLE: Self = Self { trigger: NEVER, id: 0 };
}

/// One pending trigger per slot. Scheduling overwrites.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventSlots {
    slots: [PendingEvent; EventSlot::COUNT],
    next_trigger: Cycle,
}

impl EventSlots {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: [PendingEvent::IDLE; EventSlot::COUNT],
            next_trigger: NEVER,
        }
    }

    pub fn schedule(&mut self, slot: EventSlot, trigger: Cycle, id: u8) {
        self.slots[slot.index()] = PendingEvent { trigger, id };
        if trigger < self.next_trigger {
            self.next_trigger = trigger;
        } else {
            self.recompute_next();
        }
    }

    pub fn cancel(&mut self, slot: EventSlot) {
        self.slots[slot.index()] = PendingEvent::IDLE;
        self.recompute_next();
    }

    #[must_use]
    pub fn get(&self, slot: EventSlot) -> PendingEvent {
        self.slots[slot.index()]
    }

    #[must_use]
    pub fn trigger(&self, slot: EventSlot) -> Cycle {
        self.slots[slot.index()].trigger
    }

    #[must_use]
    pub fn is_pending(&self, slot: EventSlot) -> bool {
        self.trigger(slot) != NEVER
    }

    #[must_use]
    pub fn is_due(&self, slot: EventSlot, cycle: Cycle) -> bool {
        self.trigger(slot) <= cycle
    }

    /// Earliest trigger over all slots.
    #[must_use]
    pub fn next_trigger(&self) -> Cycle {
        self.next_trigger
    }

    fn recompute_next(&mut self) {
        self.next_trigger = self
            .slots
            .iter()
            .map(|e| e.trigger)
            .min()
            .unwrap_or(NEVER);
    }
}

impl Default for EventSlots {
    fn default() -> Self {
        Self::new()
    }
}
