//! Trait for components that can be advanced cycle by cycle.

use crate::Ticks;

/// A component that can be advanced by DMA cycles.
///
/// The owning machine drives every chip through this trait. Bulk advancing
/// exists purely for speed.
pub trait Tickable {
    /// Advance the component by one DMA cycle.
    fn tick(&mut self);

    /// Advance the component by multiple cycles.
    ///
    /// Default implementation calls `tick()` in a loop. Components may
    /// override with a fast path, but must arrive at an identical state.
    fn tick_n(&mut self, count: Ticks) {
        for _ in 0..count.get() {
            self.tick();
        }
    }
}
