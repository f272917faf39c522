//! Detector eras.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named detector-configuration epoch selecting which inputs apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Era {
    /// Original pixel detector, strip tracker with digi-level masking.
    #[default]
    Run2,
    /// Phase-1 pixel upgrade: no pixel digi masking source yet.
    Phase1Pixel,
    /// Phase-2 tracker: outer tracker replaces the strips.
    Phase2Tracker,
}

impl Era {
    /// All eras.
    pub const ALL: [Era; 3] = [Era::Run2, Era::Phase1Pixel, Era::Phase2Tracker];

    /// Canonical tag.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Era::Run2 => "run2",
            Era::Phase1Pixel => "phase1_pixel",
            Era::Phase2Tracker => "phase2_tracker",
        }
    }
}

impl fmt::Display for Era {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Era {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Era::ALL
            .into_iter()
            .find(|era| era.tag().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownEra(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_era_parse() {
        assert_eq!("run2".parse::<Era>().unwrap(), Era::Run2);
        assert_eq!("PHASE2_TRACKER".parse::<Era>().unwrap(), Era::Phase2Tracker);
        assert!(matches!("run9".parse::<Era>(), Err(Error::UnknownEra(_))));
    }

    #[test]
    fn test_era_display_roundtrip() {
        for era in Era::ALL {
            assert_eq!(era.to_string().parse::<Era>().unwrap(), era);
        }
    }
}
