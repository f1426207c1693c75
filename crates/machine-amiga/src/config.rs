//! Configuration for the Amiga machine crate.

use std::fmt;

use commodore_agnus_ocs::{ChipsetRevision, VideoStandard};
use log::debug;

/// Chip RAM sizes an Agnus can be fitted with.
pub const CHIP_RAM_SIZES_KB: [u32; 4] = [256, 512, 1024, 2048];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AmigaConfig {
    pub revision: ChipsetRevision,
    pub chip_ram_kb: u32,
    pub video: VideoStandard,
}

impl Default for AmigaConfig {
    fn default() -> Self {
        Self {
            revision: ChipsetRevision::Ocs,
            chip_ram_kb: 512,
            video: VideoStandard::Pal,
        }
    }
}

impl AmigaConfig {
    #[must_use]
    pub fn with_revision(mut self, revision: ChipsetRevision) -> Self {
        self.revision = revision;
        self
    }

    #[must_use]
    pub fn with_chip_ram_kb(mut self, kb: u32) -> Self {
        self.chip_ram_kb = kb;
        self
    }

    #[must_use]
    pub fn with_video(mut self, video: VideoStandard) -> Self {
        self.video = video;
        self
    }

    /// Reject combinations no real machine could be built with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !CHIP_RAM_SIZES_KB.contains(&self.chip_ram_kb) {
            return Err(ConfigError::UnsupportedChipRam(self.chip_ram_kb));
        }
        let limit_kb = self.revision.chip_ram_limit_kb();
        if self.chip_ram_kb > limit_kb {
            return Err(ConfigError::ChipRamExceedsAgnus {
                revision: self.revision,
                requested_kb: self.chip_ram_kb,
                limit_kb,
            });
        }
        debug!(
            target: "amiga::config",
            "{} with {} KB chip RAM, {:?}",
            self.revision,
            self.chip_ram_kb,
            self.video
        );
        Ok(())
    }
}

/// Why a configuration was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnsupportedChipRam(u32),
    ChipRamExceedsAgnus {
        revision: ChipsetRevision,
        requested_kb: u32,
        limit_kb: u32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedChipRam(kb) => {
                write!(f, "unsupported chip RAM size: {kb} KB (expected 256, 512, 1024 or 2048)")
            }
            Self::ChipRamExceedsAgnus {
                revision,
                requested_kb,
                limit_kb,
            } => write!(
                f,
                "{revision} addresses at most {limit_kb} KB chip RAM, {requested_kb} KB requested"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_a_stock_pal_a500() {
        let config = AmigaConfig::default();
        assert_eq!(config.revision, ChipsetRevision::Ocs);
        assert_eq!(config.chip_ram_kb, 512);
        assert_eq!(config.video, VideoStandard::Pal);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn odd_ram_sizes_are_rejected() {
        let config = AmigaConfig::default().with_chip_ram_kb(768);
        assert_eq!(config.validate(), Err(ConfigError::UnsupportedChipRam(768)));
    }

    #[test]
    fn ocs_agnus_cannot_address_a_megabyte() {
        let config = AmigaConfig::default().with_chip_ram_kb(1024);
        let err = config.validate().unwrap_err();
        assert_eq!(
            err,
            ConfigError::ChipRamExceedsAgnus {
                revision: ChipsetRevision::Ocs,
                requested_kb: 1024,
                limit_kb: 512,
            }
        );
        assert!(err.to_string().contains("8367"));
    }

    #[test]
    fn ecs_agnus_takes_two_megabytes() {
        let config = AmigaConfig::default()
            .with_revision(ChipsetRevision::Ecs2Mb)
            .with_chip_ram_kb(2048)
            .with_video(VideoStandard::Ntsc);
        assert_eq!(config.validate(), Ok(()));
    }
}
