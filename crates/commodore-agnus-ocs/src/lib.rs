//! Commodore Agnus (OCS/ECS): beam counter, DMA slot scheduler and bus arbiter.
//!
//! Agnus is the master DMA controller of the Amiga chipset. It generates the
//! beam position, decides per DMA cycle which channel owns the chip bus, and
//! keeps the per-line event tables that drive bitplane, sprite, disk, audio
//! and refresh fetches.

mod agnus;
mod beam;
mod bus;
mod changes;
mod ddf;
mod event;
mod revision;
mod sprite_dma;
mod tables;

pub use agnus::{
    Agnus, DMACON_BLTEN, DMACON_BLTPRI, DMACON_BPLEN, DMACON_COPEN, DMACON_DMAEN, DMACON_DSKEN,
    DMACON_SET, DMACON_SPREN, DisplayWindow, HsyncActions, SpriteTransfer,
};
pub use beam::{Beam, Cycle, Frame, HPOS_CNT, HPOS_MAX, VideoStandard};
pub use bus::{BusArbiter, BusChannel, BusOwner, COPPER_DEAD_CYCLE, DmaStats, REFRESH_SLOTS};
pub use changes::{ChipsetReg, REG_QUEUE_CAPACITY, RegChange, RegChangeQueue};
pub use ddf::{DDF_EARLY, DDF_LATE, DdfPredictor, DdfState, DdfWindow};
pub use event::{BplEvent, BplEventKind, DRAW_EVEN, DRAW_ODD, DasEvent, EventSlot, EventSlots, NEVER, PendingEvent};
pub use revision::ChipsetRevision;
pub use sprite_dma::{SPRITE_DMA_FIRST_LINE, SpriteDma, SpriteDmaState, SpriteFetch};
pub use tables::{
    EventTables, HIRES_DDF_TO_PLANE, JUMP_SENTINEL, LOWRES_DDF_TO_PLANE, ScrollOffsets,
    bpl_template, das_template,
};
