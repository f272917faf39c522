//! Detector module identifiers and geometry metadata.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stable identifier of one detector module.
///
/// Identifiers are assigned by geometry and totally ordered, which gives
/// deterministic iteration and binary search over the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ModuleId(pub u32);

impl ModuleId {
    /// Creates a module identifier from its raw value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ModuleId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// Detector technology of a module.
///
/// Determines which cluster collection and which masking list apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ModuleKind {
    /// Silicon pixel module.
    Pixel,
    /// Silicon strip module.
    Strip,
    /// Phase-2 outer tracker module read out as 1D strip-like clusters.
    Phase2Strip,
}

impl ModuleKind {
    /// All kinds, in registry-summary order.
    pub const ALL: [ModuleKind; 3] = [ModuleKind::Pixel, ModuleKind::Strip, ModuleKind::Phase2Strip];

    /// Dense index of this kind, for per-kind counters.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            ModuleKind::Pixel => 0,
            ModuleKind::Strip => 1,
            ModuleKind::Phase2Strip => 2,
        }
    }

    /// Short lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ModuleKind::Pixel => "pixel",
            ModuleKind::Strip => "strip",
            ModuleKind::Phase2Strip => "phase2-strip",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tracker subdetector a module belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Subdetector {
    /// Pixel barrel.
    PixelBarrel,
    /// Pixel forward disks.
    PixelEndcap,
    /// Tracker inner barrel.
    Tib,
    /// Tracker inner disks.
    Tid,
    /// Tracker outer barrel.
    Tob,
    /// Tracker endcaps.
    Tec,
    /// Phase-2 outer tracker barrel.
    Phase2OuterBarrel,
    /// Phase-2 outer tracker endcap.
    Phase2OuterEndcap,
}

impl Subdetector {
    /// Module kind implied by the subdetector.
    #[must_use]
    pub const fn kind(self) -> ModuleKind {
        match self {
            Subdetector::PixelBarrel | Subdetector::PixelEndcap => ModuleKind::Pixel,
            Subdetector::Tib | Subdetector::Tid | Subdetector::Tob | Subdetector::Tec => {
                ModuleKind::Strip
            }
            Subdetector::Phase2OuterBarrel | Subdetector::Phase2OuterEndcap => {
                ModuleKind::Phase2Strip
            }
        }
    }
}

/// Geometry-derived description of one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModuleInfo {
    /// Module identifier.
    pub id: ModuleId,
    /// Subdetector (determines the kind).
    pub subdetector: Subdetector,
    /// Layer or disk number within the subdetector.
    pub layer: u8,
    /// Flagged bad by the conditions database (masked every event when
    /// module quality is in use).
    pub bad: bool,
}

impl ModuleInfo {
    /// Creates a good module.
    #[must_use]
    pub fn new(id: impl Into<ModuleId>, subdetector: Subdetector, layer: u8) -> Self {
        Self {
            id: id.into(),
            subdetector,
            layer,
            bad: false,
        }
    }

    /// Marks the module as bad in conditions.
    #[must_use]
    pub fn with_bad(mut self, bad: bool) -> Self {
        self.bad = bad;
        self
    }

    /// Module kind.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ModuleKind {
        self.subdetector.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_id_ordering() {
        let mut ids = vec![ModuleId(30), ModuleId(10), ModuleId(20)];
        ids.sort();
        assert_eq!(ids, vec![ModuleId(10), ModuleId(20), ModuleId(30)]);
        assert_eq!(ModuleId::new(7).raw(), 7);
        assert_eq!(ModuleId::from(7), ModuleId(7));
    }

    #[test]
    fn test_subdetector_kind() {
        assert_eq!(Subdetector::PixelBarrel.kind(), ModuleKind::Pixel);
        assert_eq!(Subdetector::PixelEndcap.kind(), ModuleKind::Pixel);
        assert_eq!(Subdetector::Tec.kind(), ModuleKind::Strip);
        assert_eq!(Subdetector::Phase2OuterEndcap.kind(), ModuleKind::Phase2Strip);
    }

    #[test]
    fn test_module_info() {
        let info = ModuleInfo::new(42, Subdetector::Tob, 3).with_bad(true);
        assert_eq!(info.id, ModuleId(42));
        assert_eq!(info.kind(), ModuleKind::Strip);
        assert!(info.bad);
    }

    #[test]
    fn test_kind_display_and_index() {
        assert_eq!(ModuleKind::Phase2Strip.to_string(), "phase2-strip");
        for (i, kind) in ModuleKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }
}
