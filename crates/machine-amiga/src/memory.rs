//! Chip RAM as seen by the DMA channels.

use emu_core::ChipBus;

#[derive(Clone)]
pub struct ChipRam {
    pub bytes: Vec<u8>,
    pub mask: u32,
}

impl ChipRam {
    /// `size_kb` must be a power of two.
    #[must_use]
    pub fn new(size_kb: u32) -> Self {
        let size = size_kb as usize * 1024;
        Self {
            bytes: vec![0; size],
            mask: (size as u32).wrapping_sub(1),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[must_use]
    pub fn read_byte(&self, addr: u32) -> u8 {
        self.bytes[(addr & self.mask) as usize]
    }

    pub fn write_byte(&mut self, addr: u32, val: u8) {
        self.bytes[(addr & self.mask) as usize] = val;
    }

    /// Store consecutive big-endian words from `addr` on.
    pub fn load_words(&mut self, addr: u32, words: &[u16]) {
        for (i, &word) in words.iter().enumerate() {
            self.write_word(addr.wrapping_add(2 * i as u32), word);
        }
    }
}

impl ChipBus for ChipRam {
    fn read_word(&self, address: u32) -> u16 {
        let addr = address & self.mask & !1;
        u16::from_be_bytes([self.read_byte(addr), self.read_byte(addr | 1)])
    }

    fn write_word(&mut self, address: u32, value: u16) {
        let addr = address & self.mask & !1;
        let [hi, lo] = value.to_be_bytes();
        self.write_byte(addr, hi);
        self.write_byte(addr | 1, lo);
    }
}

impl std::fmt::Debug for ChipRam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChipRam")
            .field("size_kb", &(self.bytes.len() / 1024))
            .finish_non_exhaustive()
    }
}
