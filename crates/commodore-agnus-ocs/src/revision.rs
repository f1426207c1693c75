//! Agnus chip revisions.

use std::fmt;

/// The Agnus part fitted to the machine.
///
/// The revision decides how much chip RAM can be addressed, which DDF rule
/// table the fetch-window predictor uses, and how many low bits of DDFSTRT
/// and DDFSTOP are significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChipsetRevision {
    /// 8367 (OCS), 512 KB chip RAM.
    #[default]
    Ocs,
    /// 8372 (ECS), 1 MB chip RAM.
    Ecs1Mb,
    /// 8375 (ECS), 2 MB chip RAM.
    Ecs2Mb,
}

impl ChipsetRevision {
    #[must_use]
    pub const fn is_ecs(self) -> bool {
        !matches!(self, Self::Ocs)
    }

    #[must_use]
    pub const fn chip_ram_limit_kb(self) -> u32 {
        match self {
            Self::Ocs => 512,
            Self::Ecs1Mb => 1024,
            Self::Ecs2Mb => 2048,
        }
    }

    /// Significant bits of DDFSTRT/DDFSTOP.
    #[must_use]
    pub const fn ddf_mask(self) -> u16 {
        if self.is_ecs() { 0xFE } else { 0xFC }
    }

    #[must_use]
    pub const fn part_number(self) -> &'static str {
        match self {
            Self::Ocs => "8367",
            Self::Ecs1Mb => "8372",
            Self::Ecs2Mb => "8375",
        }
    }
}

impl fmt::Display for ChipsetRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.is_ecs() { "ECS" } else { "OCS" };
        write!(f, "{name} Agnus {}", self.part_number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ecs_keeps_one_more_ddf_bit() {
        assert_eq!(ChipsetRevision::Ocs.ddf_mask(), 0xFC);
        assert_eq!(ChipsetRevision::Ecs1Mb.ddf_mask(), 0xFE);
        assert_eq!(ChipsetRevision::Ecs2Mb.ddf_mask(), 0xFE);
    }

    #[test]
    fn display_names_part() {
        assert_eq!(ChipsetRevision::Ecs2Mb.to_string(), "ECS Agnus 8375");
    }
}
