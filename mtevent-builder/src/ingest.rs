//! Cluster ingestion and skip filtering.
//!
//! Clusters are grouped by owning module in collection order; within a
//! module the input order is preserved so downstream tie-breaking stays
//! stable.

use crate::inactive::InactiveSet;
use mtevent_core::{
    ClusterCollection, ClusterRef, Error, ModuleId, ModuleKind, ModuleRegistry, ProductId, Result,
    SkipSet,
};
use std::sync::Arc;

/// One present cluster collection and the kind of module it feeds.
#[derive(Debug, Clone, Copy)]
pub struct ClusterInput<'ev> {
    /// Kind every cluster's owning module must have.
    pub kind: ModuleKind,
    /// The collection.
    pub collection: &'ev ClusterCollection,
}

impl<'ev> ClusterInput<'ev> {
    /// Creates an input.
    #[must_use]
    pub fn new(kind: ModuleKind, collection: &'ev ClusterCollection) -> Self {
        Self { kind, collection }
    }
}

/// Counters collected while ingesting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStatistics {
    /// Clusters read from all inputs.
    pub read: usize,
    /// Clusters kept.
    pub kept: usize,
    /// Clusters dropped because they are in the skip set.
    pub skipped: usize,
    /// Clusters dropped because their module is inactive.
    pub on_inactive: usize,
    /// Skip-set entries pointing at collections that were not ingested.
    pub foreign_skip_refs: usize,
}

/// Surviving clusters grouped by module.
#[derive(Debug, Clone)]
pub struct ModuleClusters {
    registry: Arc<ModuleRegistry>,
    per_module: Vec<Vec<ClusterRef>>,
    stats: IngestStatistics,
}

impl ModuleClusters {
    /// Surviving clusters of a module; `None` for an unknown module.
    #[must_use]
    pub fn get(&self, id: ModuleId) -> Option<&[ClusterRef]> {
        self.registry
            .index_of(id)
            .map(|idx| self.per_module[idx].as_slice())
    }

    /// Ingestion counters.
    #[must_use]
    pub fn statistics(&self) -> IngestStatistics {
        self.stats
    }

    /// Moves out the per-module lists, aligned with registry order.
    pub(crate) fn into_per_module(self) -> Vec<Vec<ClusterRef>> {
        self.per_module
    }
}

fn foreign_skip_refs(inputs: &[ClusterInput<'_>], skip: &SkipSet) -> usize {
    let ingested: Vec<ProductId> = inputs.iter().map(|i| i.collection.product()).collect();
    let mut foreign = 0;
    for product in skip.products() {
        if !ingested.contains(&product) {
            let entries = skip.iter().filter(|r| r.product == product).count();
            log::error!(
                "skip set references cluster product {product} ({entries} entries) which is not an ingested collection; entries ignored"
            );
            foreign += entries;
        }
    }
    foreign
}

/// Groups clusters by module, dropping skipped clusters and clusters on
/// inactive modules.
///
/// # Errors
/// Returns [`Error::UnknownModule`] if a cluster's module is not in the
/// registry, or [`Error::KindMismatch`] if it is of a different kind than the
/// collection it came from. Either aborts ingestion.
pub fn ingest(
    inputs: &[ClusterInput<'_>],
    skip: &SkipSet,
    inactive: &InactiveSet,
    registry: &Arc<ModuleRegistry>,
) -> Result<ModuleClusters> {
    let mut per_module: Vec<Vec<ClusterRef>> = vec![Vec::new(); registry.len()];
    let mut stats = IngestStatistics {
        foreign_skip_refs: foreign_skip_refs(inputs, skip),
        ..IngestStatistics::default()
    };
    let modules = registry.modules();

    for input in inputs {
        for (cluster_ref, cluster) in input.collection.iter_refs() {
            stats.read += 1;
            let idx = registry
                .index_of(cluster.module)
                .ok_or(Error::UnknownModule(cluster.module))?;

            let found = modules[idx].kind();
            if found != input.kind {
                return Err(Error::KindMismatch {
                    id: cluster.module,
                    expected: input.kind,
                    found,
                });
            }

            if skip.contains(cluster_ref) {
                stats.skipped += 1;
            } else if inactive.contains_index(idx) {
                stats.on_inactive += 1;
            } else {
                per_module[idx].push(cluster_ref);
                stats.kept += 1;
            }
        }
    }

    Ok(ModuleClusters {
        registry: Arc::clone(registry),
        per_module,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inactive::InactiveSetBuilder;
    use mtevent_core::{Cluster, ModuleIdCollection, ModuleInfo, Subdetector};

    fn registry() -> Arc<ModuleRegistry> {
        Arc::new(
            ModuleRegistry::new(vec![
                ModuleInfo::new(1, Subdetector::PixelBarrel, 1),
                ModuleInfo::new(2, Subdetector::PixelBarrel, 1),
                ModuleInfo::new(10, Subdetector::Tib, 1),
            ])
            .unwrap(),
        )
    }

    fn pixels() -> ClusterCollection {
        ClusterCollection::new(vec![
            Cluster::new(2, 1.0, 1.0, 1, 100),
            Cluster::new(1, 2.0, 2.0, 2, 200),
            Cluster::new(2, 3.0, 3.0, 3, 300),
            Cluster::new(1, 4.0, 4.0, 4, 400),
        ])
        .with_product(ProductId(1))
    }

    #[test]
    fn test_grouping_preserves_order() {
        let registry = registry();
        let coll = pixels();
        let inputs = [ClusterInput::new(ModuleKind::Pixel, &coll)];
        let inactive = InactiveSet::empty(Arc::clone(&registry));

        let grouped = ingest(&inputs, &SkipSet::new(), &inactive, &registry).unwrap();
        let m2: Vec<usize> = grouped
            .get(ModuleId(2))
            .unwrap()
            .iter()
            .map(|r| r.index)
            .collect();
        assert_eq!(m2, vec![0, 2]);
        let m1: Vec<usize> = grouped.get(ModuleId(1)).unwrap().iter().map(|r| r.index).collect();
        assert_eq!(m1, vec![1, 3]);
        assert!(grouped.get(ModuleId(10)).unwrap().is_empty());
        assert!(grouped.get(ModuleId(99)).is_none());
        assert_eq!(grouped.statistics().kept, 4);
    }

    #[test]
    fn test_skip_and_inactive_filtering() {
        let registry = registry();
        let coll = pixels();
        let inputs = [ClusterInput::new(ModuleKind::Pixel, &coll)];
        let skip = SkipSet::from_mask(ProductId(1), &[false, false, true, false]);
        let mut builder = InactiveSetBuilder::new(Arc::clone(&registry));
        builder.mask(ModuleKind::Pixel, &ModuleIdCollection::new(vec![ModuleId(1)]));
        let inactive = builder.build();

        let grouped = ingest(&inputs, &skip, &inactive, &registry).unwrap();
        let m2: Vec<usize> = grouped.get(ModuleId(2)).unwrap().iter().map(|r| r.index).collect();
        assert_eq!(m2, vec![0]);
        assert!(grouped.get(ModuleId(1)).unwrap().is_empty());

        let stats = grouped.statistics();
        assert_eq!(stats.read, 4);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.on_inactive, 2);
        assert_eq!(stats.kept, 1);
    }

    #[test]
    fn test_unknown_module_fails() {
        let registry = registry();
        let coll = ClusterCollection::new(vec![Cluster::new(77, 0.0, 0.0, 1, 1)])
            .with_product(ProductId(1));
        let inputs = [ClusterInput::new(ModuleKind::Pixel, &coll)];
        let inactive = InactiveSet::empty(Arc::clone(&registry));

        let err = ingest(&inputs, &SkipSet::new(), &inactive, &registry).unwrap_err();
        assert_eq!(err, Error::UnknownModule(ModuleId(77)));
    }

    #[test]
    fn test_kind_mismatch_fails() {
        let registry = registry();
        let coll = ClusterCollection::new(vec![Cluster::new(10, 0.0, 0.0, 1, 1)])
            .with_product(ProductId(1));
        let inputs = [ClusterInput::new(ModuleKind::Pixel, &coll)];
        let inactive = InactiveSet::empty(Arc::clone(&registry));

        let err = ingest(&inputs, &SkipSet::new(), &inactive, &registry).unwrap_err();
        assert!(matches!(err, Error::KindMismatch { .. }));
    }

    #[test]
    fn test_foreign_skip_refs_counted() {
        let registry = registry();
        let coll = pixels();
        let inputs = [ClusterInput::new(ModuleKind::Pixel, &coll)];
        let skip = SkipSet::from_mask(ProductId(9), &[true, true]);
        let inactive = InactiveSet::empty(Arc::clone(&registry));

        let grouped = ingest(&inputs, &skip, &inactive, &registry).unwrap();
        assert_eq!(grouped.statistics().foreign_skip_refs, 2);
        assert_eq!(grouped.statistics().kept, 4);
    }

    #[test]
    fn test_skip_into_empty_input_is_not_foreign() {
        let registry = registry();
        let coll = ClusterCollection::new(Vec::new()).with_product(ProductId(3));
        let inputs = [ClusterInput::new(ModuleKind::Pixel, &coll)];
        let skip = SkipSet::from_mask(ProductId(3), &[true]);
        let mut builder = InactiveSetBuilder::new(Arc::clone(&registry));
        builder.switch_off(ModuleKind::Pixel);
        let inactive = builder.build();

        let grouped = ingest(&inputs, &skip, &inactive, &registry).unwrap();
        let stats = grouped.statistics();
        assert_eq!(stats.foreign_skip_refs, 0);
        assert_eq!(stats.read, 0);
    }
}
