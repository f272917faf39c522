//! Per-event set of inactive (masked) modules.
//!
//! The set is a bitmap over registry positions. Masking sources are merged
//! per kind: pixel sources only mask pixel modules and strip sources only
//! mask strip modules. Identifiers unknown to the registry, or of the wrong
//! kind, are logged and ignored.

use mtevent_core::{
    EventSource, InputToken, ModuleId, ModuleIdCollection, ModuleKind, ModuleRegistry,
};
use std::sync::Arc;

/// Modules marked inactive for the current event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InactiveSet {
    registry: Arc<ModuleRegistry>,
    mask: Vec<bool>,
    count: usize,
}

impl InactiveSet {
    /// An empty set over the given registry.
    #[must_use]
    pub fn empty(registry: Arc<ModuleRegistry>) -> Self {
        let mask = vec![false; registry.len()];
        Self {
            registry,
            mask,
            count: 0,
        }
    }

    /// Returns true if the module is inactive. Unknown modules are not.
    #[must_use]
    pub fn contains(&self, id: ModuleId) -> bool {
        self.registry
            .index_of(id)
            .is_some_and(|idx| self.mask[idx])
    }

    /// Returns true if the module at a registry position is inactive.
    #[inline]
    #[must_use]
    pub fn contains_index(&self, idx: usize) -> bool {
        self.mask.get(idx).copied().unwrap_or(false)
    }

    /// Inactive module identifiers in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.registry
            .all_modules()
            .zip(self.mask.iter())
            .filter_map(|(id, &inactive)| inactive.then_some(id))
    }

    /// Number of inactive modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if no module is inactive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of inactive modules of one kind.
    #[must_use]
    pub fn count_of(&self, kind: ModuleKind) -> usize {
        self.registry
            .modules_of_kind(kind)
            .filter(|(idx, _)| self.mask[*idx])
            .count()
    }

    fn mark_index(&mut self, idx: usize) {
        if !self.mask[idx] {
            self.mask[idx] = true;
            self.count += 1;
        }
    }
}

/// Incremental construction of an [`InactiveSet`].
#[derive(Debug)]
pub struct InactiveSetBuilder {
    set: InactiveSet,
    ignored: usize,
}

impl InactiveSetBuilder {
    /// Starts from an empty set.
    #[must_use]
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        Self {
            set: InactiveSet::empty(registry),
            ignored: 0,
        }
    }

    /// Masks the listed modules of the given kind.
    pub fn mask(&mut self, kind: ModuleKind, ids: &ModuleIdCollection) -> &mut Self {
        for id in ids.iter() {
            match self.set.registry.index_of(id) {
                Some(idx) if self.set.registry.modules()[idx].kind() == kind => {
                    self.set.mark_index(idx);
                }
                Some(idx) => {
                    log::warn!(
                        "ignoring masked module {id}: listed as {kind} but registered as {}",
                        self.set.registry.modules()[idx].kind()
                    );
                    self.ignored += 1;
                }
                None => {
                    log::warn!("ignoring masked module {id}: not in the module registry");
                    self.ignored += 1;
                }
            }
        }
        self
    }

    /// Retrieves every masking source from the event and masks its modules.
    ///
    /// Returns the labels that had no collection in the event; they
    /// contribute no exclusions.
    pub fn mask_from_sources<'t, E: EventSource + ?Sized>(
        &mut self,
        event: &E,
        kind: ModuleKind,
        sources: &'t [InputToken<ModuleIdCollection>],
    ) -> Vec<&'t str> {
        let mut missing = Vec::new();
        for token in sources {
            match event.module_ids(token) {
                Some(ids) => {
                    self.mask(kind, ids);
                }
                None => missing.push(token.label()),
            }
        }
        missing
    }

    /// Masks every module of a kind.
    pub fn switch_off(&mut self, kind: ModuleKind) -> &mut Self {
        let positions: Vec<usize> = self
            .set
            .registry
            .modules_of_kind(kind)
            .map(|(idx, _)| idx)
            .collect();
        for idx in positions {
            self.set.mark_index(idx);
        }
        self
    }

    /// Masks every module flagged bad in the registry.
    pub fn mask_bad_modules(&mut self) -> &mut Self {
        let positions: Vec<usize> = self
            .set
            .registry
            .modules()
            .iter()
            .enumerate()
            .filter(|(_, m)| m.bad)
            .map(|(idx, _)| idx)
            .collect();
        for idx in positions {
            self.set.mark_index(idx);
        }
        self
    }

    /// Number of masking entries ignored so far.
    #[must_use]
    pub fn ignored(&self) -> usize {
        self.ignored
    }

    /// Finishes the set.
    #[must_use]
    pub fn build(self) -> InactiveSet {
        self.set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtevent_core::{ModuleInfo, Subdetector};

    fn registry() -> Arc<ModuleRegistry> {
        Arc::new(
            ModuleRegistry::new(vec![
                ModuleInfo::new(1, Subdetector::PixelBarrel, 1),
                ModuleInfo::new(2, Subdetector::PixelBarrel, 2),
                ModuleInfo::new(3, Subdetector::PixelEndcap, 1).with_bad(true),
                ModuleInfo::new(10, Subdetector::Tib, 1),
                ModuleInfo::new(11, Subdetector::Tob, 1),
            ])
            .unwrap(),
        )
    }

    fn ids(raw: &[u32]) -> ModuleIdCollection {
        raw.iter().copied().map(ModuleId).collect()
    }

    #[test]
    fn test_empty_set() {
        let set = InactiveSet::empty(registry());
        assert!(set.is_empty());
        assert!(!set.contains(ModuleId(1)));
        assert!(!set.contains(ModuleId(999)));
    }

    #[test]
    fn test_union_of_sources() {
        let mut builder = InactiveSetBuilder::new(registry());
        builder
            .mask(ModuleKind::Pixel, &ids(&[1]))
            .mask(ModuleKind::Pixel, &ids(&[1, 2]))
            .mask(ModuleKind::Strip, &ids(&[11]));
        let set = builder.build();

        assert_eq!(set.len(), 3);
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![ModuleId(1), ModuleId(2), ModuleId(11)]
        );
        assert_eq!(set.count_of(ModuleKind::Pixel), 2);
        assert_eq!(set.count_of(ModuleKind::Strip), 1);
    }

    #[test]
    fn test_unknown_and_mismatched_ids_ignored() {
        let mut builder = InactiveSetBuilder::new(registry());
        builder
            .mask(ModuleKind::Pixel, &ids(&[999, 10]))
            .mask(ModuleKind::Strip, &ids(&[2]));
        assert_eq!(builder.ignored(), 3);
        assert!(builder.build().is_empty());
    }

    #[test]
    fn test_switch_off_kind() {
        let mut builder = InactiveSetBuilder::new(registry());
        builder.switch_off(ModuleKind::Pixel);
        let set = builder.build();
        assert_eq!(set.len(), 3);
        assert!(set.contains(ModuleId(3)));
        assert!(!set.contains(ModuleId(10)));
    }

    #[test]
    fn test_bad_modules() {
        let mut builder = InactiveSetBuilder::new(registry());
        builder.mask_bad_modules().mask(ModuleKind::Pixel, &ids(&[3]));
        let set = builder.build();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![ModuleId(3)]);
        assert!(set.contains_index(2));
        assert!(!set.contains_index(100));
    }
}
