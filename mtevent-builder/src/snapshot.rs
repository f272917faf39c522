//! The assembled, read-only measurement tracker event.
//!
//! Every registry module has exactly one entry: inactive, or active with a
//! (possibly empty) ordered list of measurements. Requesting the measurements
//! of an inactive module is an error ([`Error::ModuleInactive`]), so that
//! downstream pattern recognition can tell "masked" from "no hits".

use crate::ingest::{ClusterInput, ModuleClusters};
use crate::inactive::InactiveSet;
use mtevent_core::{
    Cluster, ClusterCollection, ClusterRef, Error, ModuleId, ModuleInfo, ModuleKind,
    ModuleRegistry, Result,
};
use std::fmt;
use std::sync::Arc;

/// State of one module for the current event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleMeasurements {
    /// Masked: its clusters must not feed reconstruction.
    Inactive,
    /// Usable, with measurements in input collection order.
    Active(Vec<ClusterRef>),
}

impl ModuleMeasurements {
    /// Returns true for an active module.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, ModuleMeasurements::Active(_))
    }
}

/// Per-kind counters of a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindSummary {
    /// Modules of this kind.
    pub modules: usize,
    /// Inactive modules.
    pub inactive: usize,
    /// Active modules without measurements.
    pub empty: usize,
    /// Measurements on active modules.
    pub measurements: usize,
}

/// Counters of a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotSummary {
    /// Indexed by [`ModuleKind::index`].
    pub kinds: [KindSummary; 3],
}

impl SnapshotSummary {
    /// Counters of one kind.
    #[must_use]
    pub fn kind(&self, kind: ModuleKind) -> &KindSummary {
        &self.kinds[kind.index()]
    }

    /// Total modules.
    #[must_use]
    pub fn modules(&self) -> usize {
        self.kinds.iter().map(|k| k.modules).sum()
    }

    /// Total active modules.
    #[must_use]
    pub fn active(&self) -> usize {
        self.modules() - self.inactive()
    }

    /// Total inactive modules.
    #[must_use]
    pub fn inactive(&self) -> usize {
        self.kinds.iter().map(|k| k.inactive).sum()
    }

    /// Total measurements.
    #[must_use]
    pub fn measurements(&self) -> usize {
        self.kinds.iter().map(|k| k.measurements).sum()
    }

    /// Accumulates another summary (e.g. across events).
    pub fn add(&mut self, other: &SnapshotSummary) {
        for (mine, theirs) in self.kinds.iter_mut().zip(other.kinds.iter()) {
            mine.modules += theirs.modules;
            mine.inactive += theirs.inactive;
            mine.empty += theirs.empty;
            mine.measurements += theirs.measurements;
        }
    }
}

impl fmt::Display for SnapshotSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} modules ({} active, {} inactive), {} measurements",
            self.modules(),
            self.active(),
            self.inactive(),
            self.measurements()
        )
    }
}

/// Per-event, per-module view of the measurements available to tracking.
///
/// Borrows the event's cluster collections; immutable once assembled.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementTrackerEvent<'ev> {
    registry: Arc<ModuleRegistry>,
    modules: Vec<ModuleMeasurements>,
    collections: Vec<&'ev ClusterCollection>,
}

/// Assembles the snapshot: inactive modules become [`ModuleMeasurements::Inactive`],
/// every other registry module becomes active with its surviving clusters.
#[must_use]
pub fn assemble<'ev>(
    registry: &Arc<ModuleRegistry>,
    inactive: &InactiveSet,
    clusters: ModuleClusters,
    inputs: &[ClusterInput<'ev>],
) -> MeasurementTrackerEvent<'ev> {
    let modules = clusters
        .into_per_module()
        .into_iter()
        .enumerate()
        .map(|(idx, refs)| {
            if inactive.contains_index(idx) {
                ModuleMeasurements::Inactive
            } else {
                ModuleMeasurements::Active(refs)
            }
        })
        .collect();

    MeasurementTrackerEvent {
        registry: Arc::clone(registry),
        modules,
        collections: inputs.iter().map(|input| input.collection).collect(),
    }
}

impl<'ev> MeasurementTrackerEvent<'ev> {
    fn position(&self, id: ModuleId) -> Result<usize> {
        self.registry.index_of(id).ok_or(Error::UnknownModule(id))
    }

    /// Registry the snapshot was built over.
    #[must_use]
    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    /// State of a module.
    ///
    /// # Errors
    /// Returns [`Error::UnknownModule`] if the module is not registered.
    pub fn state(&self, id: ModuleId) -> Result<&ModuleMeasurements> {
        self.position(id).map(|idx| &self.modules[idx])
    }

    /// Returns whether a module is active in this event.
    ///
    /// # Errors
    /// Returns [`Error::UnknownModule`] if the module is not registered.
    pub fn is_active(&self, id: ModuleId) -> Result<bool> {
        self.state(id).map(ModuleMeasurements::is_active)
    }

    /// Measurements of an active module, in input collection order.
    ///
    /// # Errors
    /// Returns [`Error::ModuleInactive`] for a masked module and
    /// [`Error::UnknownModule`] for an unregistered one.
    pub fn measurements_for(&self, id: ModuleId) -> Result<&[ClusterRef]> {
        match self.state(id)? {
            ModuleMeasurements::Active(refs) => Ok(refs.as_slice()),
            ModuleMeasurements::Inactive => Err(Error::ModuleInactive(id)),
        }
    }

    /// Clusters of an active module, resolved against the event collections.
    ///
    /// # Errors
    /// See [`MeasurementTrackerEvent::measurements_for`].
    pub fn clusters_for(&self, id: ModuleId) -> Result<impl Iterator<Item = &'ev Cluster> + '_> {
        let refs = self.measurements_for(id)?;
        Ok(refs.iter().filter_map(|r| self.resolve(*r)))
    }

    /// Resolves a measurement reference to its cluster.
    #[must_use]
    pub fn resolve(&self, cluster: ClusterRef) -> Option<&'ev Cluster> {
        self.collections
            .iter()
            .find(|c| c.product() == cluster.product)
            .copied()
            .and_then(|c| c.get(cluster))
    }

    /// All modules with their state, in registry order.
    pub fn iter(&self) -> impl Iterator<Item = (&ModuleInfo, &ModuleMeasurements)> {
        self.registry.modules().iter().zip(self.modules.iter())
    }

    /// Inactive module identifiers in ascending order.
    pub fn inactive_modules(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.iter()
            .filter(|(_, m)| !m.is_active())
            .map(|(info, _)| info.id)
    }

    /// Number of module entries (equals the registry size).
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns true if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Counts modules and measurements per kind.
    #[must_use]
    pub fn summary(&self) -> SnapshotSummary {
        let mut summary = SnapshotSummary::default();
        for (info, state) in self.iter() {
            let kind = &mut summary.kinds[info.kind().index()];
            kind.modules += 1;
            match state {
                ModuleMeasurements::Inactive => kind.inactive += 1,
                ModuleMeasurements::Active(refs) if refs.is_empty() => kind.empty += 1,
                ModuleMeasurements::Active(refs) => kind.measurements += refs.len(),
            }
        }
        summary
    }
}
