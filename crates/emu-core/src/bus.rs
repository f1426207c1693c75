//! Chip memory access as seen by the DMA engine.

/// Word-wide access to chip memory.
///
/// Every DMA channel moves 16-bit words on even addresses. Implementations
/// mask the address to the installed RAM size; the DMA engine never sees an
/// unmapped cycle.
pub trait ChipBus {
    /// Read the word at `address` (bit 0 ignored).
    fn read_word(&self, address: u32) -> u16;

    /// Write the word at `address` (bit 0 ignored).
    fn write_word(&mut self, address: u32, value: u16);
}
