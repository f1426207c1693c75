//! Beam position and frame bookkeeping.
//!
//! The cycle counter is the only ground truth. A beam position is derived
//! from it relative to the first cycle of the current frame; Agnus caches the
//! result so the per-cycle path does not divide.

use std::fmt;

/// Absolute DMA cycle number since power-on.
pub type Cycle = u64;

/// DMA cycles per raster line.
pub const HPOS_CNT: u16 = 227;
/// Last horizontal position of a line.
pub const HPOS_MAX: u16 = HPOS_CNT - 1;

/// Video timing standard. Selects the number of lines per field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VideoStandard {
    #[default]
    Pal,
    Ntsc,
}

impl VideoStandard {
    /// Lines in a long (`lof`) or short field.
    #[must_use]
    pub const fn lines(self, lof: bool) -> u16 {
        match (self, lof) {
            (Self::Pal, true) => 313,
            (Self::Pal, false) => 312,
            (Self::Ntsc, true) => 263,
            (Self::Ntsc, false) => 262,
        }
    }
}

/// A raster beam coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Beam {
    pub v: u16,
    pub h: u16,
}

impl Beam {
    #[must_use]
    pub const fn new(v: u16, h: u16) -> Self {
        Self { v, h }
    }
}

impl fmt::Display for Beam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},${:02X})", self.v, self.h)
    }
}

/// Per-field state, replaced at every vertical sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    /// Field counter.
    pub nr: u64,
    /// Long field flag.
    pub lof: bool,
    /// Long field flag of the previous field.
    pub prev_lof: bool,
    /// First cycle of this field.
    pub start: Cycle,
    pub standard: VideoStandard,
}

impl Frame {
    #[must_use]
    pub fn new(standard: VideoStandard) -> Self {
        Self {
            nr: 0,
            lof: true,
            prev_lof: true,
            start: 0,
            standard,
        }
    }

    #[must_use]
    pub fn num_lines(&self) -> u16 {
        self.standard.lines(self.lof)
    }

    #[must_use]
    pub fn last_line(&self) -> u16 {
        self.num_lines() - 1
    }

    #[must_use]
    pub fn num_cycles(&self) -> u64 {
        u64::from(self.num_lines()) * u64::from(HPOS_CNT)
    }

    /// First cycle after this field.
    #[must_use]
    pub fn end(&self) -> Cycle {
        self.start + self.num_cycles()
    }

    #[must_use]
    pub fn contains(&self, cycle: Cycle) -> bool {
        (self.start..self.end()).contains(&cycle)
    }

    /// Beam position of `cycle`, counted from the start of this field.
    #[must_use]
    pub fn cycle_to_beam(&self, cycle: Cycle) -> Beam {
        assert!(
            cycle >= self.start,
            "cycle {cycle} precedes frame start {}",
            self.start
        );
        let offset = cycle - self.start;
        let line_len = u64::from(HPOS_CNT);
        Beam {
            v: (offset / line_len) as u16,
            h: (offset % line_len) as u16,
        }
    }

    /// Cycle at which the beam reaches `beam` in this field.
    #[must_use]
    pub fn beam_to_cycle(&self, beam: Beam) -> Cycle {
        assert!(beam.h < HPOS_CNT, "horizontal position {} out of range", beam.h);
        self.start + u64::from(beam.v) * u64::from(HPOS_CNT) + u64::from(beam.h)
    }

    /// Begin the next field at cycle `start`.
    pub fn advance(&mut self, start: Cycle, interlace: bool) {
        self.nr += 1;
        self.prev_lof = self.lof;
        if interlace {
            self.lof = !self.lof;
        }
        self.start = start;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn pal_long_field_spans_313_lines() {
        let frame = Frame::new(VideoStandard::Pal);
        assert_eq!(frame.num_lines(), 313);
        assert_eq!(frame.last_line(), 312);
        assert_eq!(frame.num_cycles(), 313 * 227);
    }

    #[test]
    fn conversions_are_relative_to_frame_start() {
        let mut frame = Frame::new(VideoStandard::Pal);
        frame.advance(10_000, false);
        assert_eq!(frame.cycle_to_beam(10_000), Beam::new(0, 0));
        assert_eq!(frame.cycle_to_beam(10_000 + 227 * 3 + 0x40), Beam::new(3, 0x40));
        assert_eq!(frame.beam_to_cycle(Beam::new(1, 0xE2)), 10_000 + 227 + 0xE2);
    }

    #[test]
    fn interlace_alternates_field_length() {
        let mut frame = Frame::new(VideoStandard::Pal);
        frame.advance(frame.end(), true);
        assert!(!frame.lof);
        assert!(frame.prev_lof);
        assert_eq!(frame.num_lines(), 312);
        frame.advance(frame.end(), true);
        assert!(frame.lof);
        assert!(!frame.prev_lof);
    }

    #[test]
    fn progressive_keeps_long_fields() {
        let mut frame = Frame::new(VideoStandard::Ntsc);
        frame.advance(frame.end(), false);
        assert!(frame.lof);
        assert_eq!(frame.num_lines(), 263);
        assert_eq!(frame.nr, 1);
    }

    #[test]
    #[should_panic(expected = "precedes frame start")]
    fn beam_of_earlier_frame_is_rejected() {
        let mut frame = Frame::new(VideoStandard::Pal);
        frame.advance(500, false);
        let _ = frame.cycle_to_beam(499);
    }

    proptest! {
        #[test]
        fn prop_beam_round_trip(
            start in 0u64..1_000_000_000,
            ntsc in any::<bool>(),
            lof in any::<bool>(),
            v in 0u16..313,
            h in 0u16..HPOS_CNT,
        ) {
            let standard = if ntsc { VideoStandard::Ntsc } else { VideoStandard::Pal };
            let mut frame = Frame::new(standard);
            frame.lof = lof;
            frame.start = start;
            let beam = Beam::new(v % frame.num_lines(), h);

            let cycle = frame.beam_to_cycle(beam);
            prop_assert!(frame.contains(cycle));
            prop_assert_eq!(frame.cycle_to_beam(cycle), beam);
        }
    }
}
