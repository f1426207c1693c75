//! Read-only view of the DMA scheduler for debuggers and tests.

use commodore_agnus_ocs::{
    Agnus, Beam, BplEvent, BusOwner, Cycle, DasEvent, DmaStats, EventSlot, PendingEvent,
};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DmaSnapshot {
    pub clock: Cycle,
    pub beam: Beam,
    pub frame: u64,
    pub bpl_events: Vec<BplEvent>,
    pub bpl_jump: Vec<u16>,
    pub das_events: Vec<DasEvent>,
    pub das_jump: Vec<u16>,
    pub slots: Vec<(EventSlot, PendingEvent)>,
    pub owners: Vec<BusOwner>,
    pub values: Vec<u16>,
    pub stats: DmaStats,
    pub last_frame: DmaStats,
    pub bls: bool,
}

impl DmaSnapshot {
    #[must_use]
    pub fn capture(agnus: &Agnus) -> Self {
        Self {
            clock: agnus.clock,
            beam: agnus.pos,
            frame: agnus.frame.nr,
            bpl_events: agnus.tables.bpl().to_vec(),
            bpl_jump: agnus.tables.bpl_jump().to_vec(),
            das_events: agnus.tables.das().to_vec(),
            das_jump: agnus.tables.das_jump().to_vec(),
            slots: EventSlot::ALL
                .iter()
                .map(|&slot| (slot, agnus.slots.get(slot)))
                .collect(),
            owners: agnus.bus.owners().to_vec(),
            values: agnus.bus.values().to_vec(),
            stats: agnus.bus.stats,
            last_frame: agnus.bus.last_frame,
            bls: agnus.bus.bls,
        }
    }

    /// Cycles of the current line booked by anyone.
    #[must_use]
    pub fn owned_cycles(&self) -> usize {
        self.owners.iter().filter(|&&o| o != BusOwner::None).count()
    }

    #[cfg(feature = "native")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
