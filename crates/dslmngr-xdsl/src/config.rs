use std::fmt;
use std::str::FromStr;

use crate::mapper::PROFILE;

/// Operating modes a line may be configured to train in, by bit position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyMode {
    Gdmt = 0,
    T1413 = 1,
    Glite = 2,
    Adsl2 = 3,
    Adsl2p = 4,
    Readsl2 = 5,
    Vdsl = 6,
    Vdsl2 = 7,
    Vdsl2p = 8,
    Gfast = 9,
}

impl LegacyMode {
    const ALL: [LegacyMode; 10] = [
        Self::Gdmt,
        Self::T1413,
        Self::Glite,
        Self::Adsl2,
        Self::Adsl2p,
        Self::Readsl2,
        Self::Vdsl,
        Self::Vdsl2,
        Self::Vdsl2p,
        Self::Gfast,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gdmt => "gdmt",
            Self::T1413 => "t1413",
            Self::Glite => "glite",
            Self::Adsl2 => "adsl2",
            Self::Adsl2p => "adsl2p",
            Self::Readsl2 => "readsl2",
            Self::Vdsl => "vdsl",
            Self::Vdsl2 => "vdsl2",
            Self::Vdsl2p => "vdsl2p",
            Self::Gfast => "gfast",
        }
    }

    pub fn bit(self) -> u32 {
        1 << self as u32
    }
}

impl fmt::Display for LegacyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineConfigError {
    #[error("unknown dsl mode '{0}'")]
    UnknownMode(String),
    #[error("unknown vdsl2 profile '{0}'")]
    UnknownProfile(String),
}

impl FromStr for LegacyMode {
    type Err = LineConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| LineConfigError::UnknownMode(s.to_string()))
    }
}

/// Line configuration applied by `start`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineConfig {
    /// Bitmap of [`LegacyMode::bit`].
    pub modes: u32,
    /// Bitmap of VDSL2 profile bits, as in [`PROFILE`].
    pub profiles: u32,
    pub trellis: bool,
    pub bitswap: bool,
    pub sra: bool,
    pub us0: bool,
}

impl LineConfig {
    /// Build the mode bitmap from mode names.
    pub fn mode_bitmap<S: AsRef<str>>(modes: &[S]) -> Result<u32, LineConfigError> {
        modes.iter().try_fold(0, |acc, mode| {
            Ok(acc | mode.as_ref().parse::<LegacyMode>()?.bit())
        })
    }

    /// Build the profile bitmap from profile names (`8a`..`35b`).
    pub fn profile_bitmap<S: AsRef<str>>(profiles: &[S]) -> Result<u32, LineConfigError> {
        profiles.iter().try_fold(0, |acc, profile| {
            let name = profile.as_ref();
            let bit = PROFILE
                .value(name)
                .and_then(|bit| u32::try_from(bit).ok())
                .ok_or_else(|| LineConfigError::UnknownProfile(name.to_string()))?;
            Ok(acc | bit)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_bits_follow_positions() {
        assert_eq!(LegacyMode::Gdmt.bit(), 1);
        assert_eq!(LegacyMode::Adsl2.bit(), 1 << 3);
        assert_eq!(LegacyMode::Gfast.bit(), 1 << 9);
    }

    #[test]
    fn mode_bitmap_from_names() {
        let bitmap = LineConfig::mode_bitmap(&["adsl2", "adsl2p", "vdsl2"]).unwrap();
        assert_eq!(bitmap, (1 << 3) | (1 << 4) | (1 << 7));

        assert_eq!(LineConfig::mode_bitmap::<&str>(&[]).unwrap(), 0);
        assert_eq!(
            LineConfig::mode_bitmap(&["adsl2", "isdn"]),
            Err(LineConfigError::UnknownMode("isdn".to_string()))
        );
    }

    #[test]
    fn profile_bitmap_from_names() {
        let bitmap = LineConfig::profile_bitmap(&["8a", "17a", "35b"]).unwrap();
        assert_eq!(bitmap, 1 | (1 << 6) | (1 << 8));
        assert_eq!(LineConfig::profile_bitmap(&["8d"]).unwrap(), 1 << 3);
        assert!(matches!(
            LineConfig::profile_bitmap(&["99z"]),
            Err(LineConfigError::UnknownProfile(_))
        ));
    }
}
