//! Sorted ring buffer for deferred register changes.
//!
//! Chipset register writes often become visible a few cycles (or a few
//! pixels) after the CPU or Copper performs them. The writer records the
//! change keyed by its trigger position; the consumer pops entries in key
//! order once it reaches them.

/// A fixed-capacity queue of `(trigger, change)` pairs kept sorted by trigger.
///
/// Entries with equal triggers keep their insertion order. Inserting into a
/// full recorder panics: callers size `N` so that no legal write sequence
/// within one scanline can exceed it.
#[derive(Debug, Clone)]
pub struct ChangeRecorder<T, const N: usize> {
    keys: [u64; N],
    elements: [T; N],
    head: usize,
    len: usize,
}

impl<T: Copy + Default, const N: usize> ChangeRecorder<T, N> {
    pub const CAPACITY: usize = N;

    #[must_use]
    pub fn new() -> Self {
        Self {
            keys: [0; N],
            elements: [T::default(); N],
            head: 0,
            len: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len == N
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    fn slot(&self, i: usize) -> usize {
        (self.head + i) % N
    }

    /// Insert `element` to fire at `key`.
    pub fn insert(&mut self, key: u64, element: T) {
        assert!(
            self.len < N,
            "change recorder overflow: {N} entries pending, next trigger {key}"
        );

        // Shift later entries up by one; stop at the first key <= ours so
        // equal keys stay in insertion order.
        let mut i = self.len;
        while i > 0 {
            let prev = self.slot(i - 1);
            if self.keys[prev] <= key {
                break;
            }
            let cur = self.slot(i);
            self.keys[cur] = self.keys[prev];
            self.elements[cur] = self.elements[prev];
            i -= 1;
        }

        let at = self.slot(i);
        self.keys[at] = key;
        self.elements[at] = element;
        self.len += 1;
    }

    /// Trigger of the earliest pending entry.
    #[must_use]
    pub fn trigger(&self) -> Option<u64> {
        (self.len > 0).then(|| self.keys[self.head])
    }

    #[must_use]
    pub fn peek(&self) -> Option<(u64, T)> {
        (self.len > 0).then(|| (self.keys[self.head], self.elements[self.head]))
    }

    /// Remove and return the earliest entry.
    pub fn pop(&mut self) -> Option<(u64, T)> {
        let entry = self.peek()?;
        self.head = (self.head + 1) % N;
        self.len -= 1;
        Some(entry)
    }

    /// Remove and return the earliest entry if its trigger is `<= upto`.
    pub fn pop_due(&mut self, upto: u64) -> Option<(u64, T)> {
        match self.trigger() {
            Some(key) if key <= upto => self.pop(),
            _ => None,
        }
    }

    /// Pending entries in trigger order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, T)> + '_ {
        (0..self.len).map(move |i| {
            let at = self.slot(i);
            (self.keys[at], self.elements[at])
        })
    }
}

impl<T: Copy + Default, const N: usize> Default for ChangeRecorder<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
