//! Data-fetch window prediction.
//!
//! DDFSTRT and DDFSTOP do not map onto the fetch interval directly. The
//! hardware compares them against the horizontal counter and only some
//! combinations open the window; values below $18 or never reached in the
//! line clamp against hardwired bounds. Both rule sets are kept as lookup
//! tables and reproduced entry for entry, including the combinations that
//! simply produce no fetch at all.

use log::trace;

use crate::beam::HPOS_CNT;

/// Earliest cycle at which bitplane DMA can start.
pub const DDF_EARLY: u16 = 0x18;
/// Hardwired stop position used when DDFSTOP is never matched.
pub const DDF_LATE: u16 = 0xD8;
/// No fetch unit may run past this cycle.
const DDF_LIMIT: u16 = 0xE0;

/// Bitplane fetch interval of one line, split by odd and even planes.
///
/// Both intervals are half-open. When DDFSTRT is not aligned to a fetch unit
/// the even planes lag behind the odd planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DdfWindow {
    pub strt_odd: u16,
    pub stop_odd: u16,
    pub strt_even: u16,
    pub stop_even: u16,
}

impl DdfWindow {
    pub const EMPTY: Self = Self {
        strt_odd: 0,
        stop_odd: 0,
        strt_even: 0,
        stop_even: 0,
    };

    /// Window for a start/stop pair. `hires` selects the alignment of the
    /// even planes (4 cycles in lores, 2 in hires).
    #[must_use]
    pub fn compute(strt: u16, stop: u16, hires: bool) -> Self {
        let half = if hires { 2 } else { 4 };
        let units = if stop < strt { 0 } else { (stop - strt + 15) >> 3 };

        let strt_odd = strt;
        let stop_odd = (strt + 8 * units).min(DDF_LIMIT);
        let (strt_even, stop_even) = if strt & half != 0 {
            (strt + half, (stop_odd + half).min(DDF_LIMIT))
        } else {
            (strt_odd, stop_odd)
        };

        Self {
            strt_odd,
            stop_odd,
            strt_even,
            stop_even,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strt_odd >= self.stop_odd && self.strt_even >= self.stop_even
    }

    #[must_use]
    pub fn in_range_odd(&self, h: u16) -> bool {
        h >= self.strt_odd && h < self.stop_odd
    }

    #[must_use]
    pub fn in_range_even(&self, h: u16) -> bool {
        h >= self.strt_even && h < self.stop_even
    }
}

/// Whether the fetch window was left open at the end of the previous line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DdfState {
    #[default]
    Off,
    On,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interval {
    Empty,
    StrtStop,
    StrtLate,
    EarlyStop,
    EarlyLate,
}

use Interval::{EarlyLate, EarlyStop, Empty, StrtLate, StrtStop};

/// Indexed by `3 * class(strt) + class(stop)`.
const OCS_RULES: [Interval; 9] = [
    Empty, EarlyStop, EarlyLate, //
    Empty, StrtStop, StrtLate, //
    Empty, Empty, Empty,
];

/// Indexed by `6 * class(strt) + 2 * class(stop) + (state == On)`.
const ECS_RULES: [(Interval, DdfState); 18] = [
    (Empty, DdfState::Off),
    (Empty, DdfState::Off),
    (EarlyStop, DdfState::Off),
    (EarlyStop, DdfState::Off),
    (EarlyLate, DdfState::On),
    (EarlyLate, DdfState::On),
    //
    (Empty, DdfState::Off),
    (Empty, DdfState::Off),
    (StrtStop, DdfState::Off),
    (EarlyStop, DdfState::Off),
    (StrtLate, DdfState::On),
    (EarlyLate, DdfState::On),
    //
    (Empty, DdfState::Off),
    (Empty, DdfState::Off),
    (Empty, DdfState::Off),
    (Empty, DdfState::Off),
    (Empty, DdfState::Off),
    (EarlyLate, DdfState::On),
];

/// 0: below $18, 1: regular, 2: never reached in this line.
fn class(reached: Option<u16>) -> usize {
    match reached {
        None => 2,
        Some(value) if value < DDF_EARLY => 0,
        Some(_) => 1,
    }
}

fn reached(value: u16) -> Option<u16> {
    (value < HPOS_CNT).then_some(value)
}

/// Carries the fetch-window state from one line to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DdfPredictor {
    pub lores: DdfWindow,
    pub hires: DdfWindow,
    pub state: DdfState,
    /// State the current line was predicted from.
    entry_state: DdfState,
    /// DDFSTRT as matched by the horizontal counter in the current line.
    pub strt_reached: Option<u16>,
    /// DDFSTOP as matched by the horizontal counter in the current line.
    pub stop_reached: Option<u16>,
    /// Line on which an OCS Agnus with DDFSTRT < $18 fetches.
    ocs_early_access_line: Option<u16>,
}

impl DdfPredictor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch the register values for the line `v` and recompute the windows.
    ///
    /// Returns `true` if the windows or the carried state changed, in which
    /// case the bitplane table must be rebuilt and the prediction repeated
    /// at the next line.
    pub fn predict(&mut self, ddfstrt: u16, ddfstop: u16, ecs: bool, v: u16) -> bool {
        let before = (self.lores, self.hires, self.state);

        self.entry_state = self.state;
        self.strt_reached = reached(ddfstrt);
        self.stop_reached = reached(ddfstop);

        if ecs {
            self.compute_ecs();
        } else {
            self.compute_ocs(v);
        }

        let changed = before != (self.lores, self.hires, self.state);
        if changed {
            trace!(
                target: "agnus::ddf",
                "line {v}: ddf {ddfstrt:#04X}..{ddfstop:#04X} -> lores {:?} hires {:?} {:?}",
                self.lores,
                self.hires,
                self.state
            );
        }
        changed
    }

    /// Recompute the current line from the `*_reached` values. Used when a
    /// DDF register is written before the beam passes it.
    pub fn recompute_current(&mut self, ecs: bool, v: u16) {
        self.state = self.entry_state;
        if ecs {
            self.compute_ecs();
        } else {
            self.compute_ocs(v);
        }
    }

    fn compute_ocs(&mut self, v: u16) {
        let strt = self.strt_reached;
        let stop = self.stop_reached;

        // DDFSTRT below $18 only fetches on every other line.
        if let Some(early) = strt.filter(|&s| s < DDF_EARLY) {
            if self.ocs_early_access_line == Some(v) {
                self.set_windows(early, stop.unwrap_or(DDF_LATE));
            } else {
                self.clear_windows();
                self.ocs_early_access_line = Some(v + 1);
            }
            return;
        }

        let interval = OCS_RULES[3 * class(strt) + class(stop)];
        self.apply(interval, strt, stop);
    }

    fn compute_ecs(&mut self) {
        let strt = self.strt_reached;
        let stop = self.stop_reached;
        let on = usize::from(self.state == DdfState::On);

        let (interval, next) = ECS_RULES[6 * class(strt) + 2 * class(stop) + on];
        self.apply(interval, strt, stop);
        self.state = next;
    }

    fn apply(&mut self, interval: Interval, strt: Option<u16>, stop: Option<u16>) {
        match (interval, strt, stop) {
            (StrtStop, Some(s), Some(e)) => self.set_windows(s, e),
            (StrtLate, Some(s), _) => self.set_windows(s, DDF_LATE),
            (EarlyStop, _, Some(e)) => self.set_windows(DDF_EARLY, e),
            (EarlyLate, _, _) => self.set_windows(DDF_EARLY, DDF_LATE),
            _ => self.clear_windows(),
        }
    }

    fn set_windows(&mut self, strt: u16, stop: u16) {
        self.lores = DdfWindow::compute(strt, stop, false);
        self.hires = DdfWindow::compute(strt, stop, true);
    }

    fn clear_windows(&mut self) {
        self.lores = DdfWindow::EMPTY;
        self.hires = DdfWindow::EMPTY;
    }
}
