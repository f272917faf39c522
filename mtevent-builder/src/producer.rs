//! Per-event production of the measurement tracker event.

use crate::inactive::InactiveSetBuilder;
use crate::ingest::{ingest, ClusterInput};
use crate::snapshot::{assemble, MeasurementTrackerEvent};
use mtevent_config::{resolve, ProducerConfig, ResolvedBindings};
use mtevent_core::{
    ClusterCollection, Error, EventSource, ModuleKind, ModuleRegistry, RegistryCatalog, Result,
    SkipSet,
};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Builds one [`MeasurementTrackerEvent`] per event from resolved bindings.
///
/// The producer holds only read-only state (bindings and the shared
/// registry), so one instance serves many events concurrently.
#[derive(Debug)]
pub struct MeasurementTrackerEventProducer {
    name: String,
    bindings: ResolvedBindings,
    registry: Arc<ModuleRegistry>,
    warned_missing_masks: AtomicBool,
}

impl MeasurementTrackerEventProducer {
    /// Resolves a configuration and selects its registry.
    ///
    /// # Errors
    /// Returns [`Error::ConfigurationInconsistency`] from resolution, or
    /// [`Error::UnknownMeasurementTracker`] if the configured registry is not
    /// in the catalog.
    pub fn new(
        name: impl Into<String>,
        config: &ProducerConfig,
        catalog: &RegistryCatalog,
    ) -> Result<Self> {
        Self::from_bindings(name, resolve(config)?, catalog)
    }

    /// Creates a producer from already resolved bindings.
    ///
    /// # Errors
    /// Returns [`Error::UnknownMeasurementTracker`] if the configured registry
    /// is not in the catalog.
    pub fn from_bindings(
        name: impl Into<String>,
        bindings: ResolvedBindings,
        catalog: &RegistryCatalog,
    ) -> Result<Self> {
        let registry = catalog.get(&bindings.measurement_tracker)?;
        Ok(Self {
            name: name.into(),
            bindings,
            registry,
            warned_missing_masks: AtomicBool::new(false),
        })
    }

    /// Name the snapshot is published under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved bindings.
    #[must_use]
    pub fn bindings(&self) -> &ResolvedBindings {
        &self.bindings
    }

    /// Shared registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    fn required<'ev, E: EventSource + ?Sized>(
        event: &'ev E,
        kind: ModuleKind,
        bindings: &ResolvedBindings,
    ) -> Result<Option<ClusterInput<'ev>>> {
        let Some(token) = bindings.cluster_source(kind) else {
            return Ok(None);
        };
        event
            .clusters(token)
            .map(|collection| Some(ClusterInput::new(kind, collection)))
            .ok_or_else(|| Error::MissingCollection {
                label: token.label().to_string(),
            })
    }

    /// Decides whether the pixels are switched off, returning the pixel input
    /// when they are not.
    fn pixel_input<'ev, E: EventSource + ?Sized>(
        &self,
        event: &'ev E,
    ) -> Result<(bool, Option<ClusterInput<'ev>>)> {
        let Some(token) = self.bindings.pixel_clusters.as_ref() else {
            return Ok((false, None));
        };
        let collection: Option<&'ev ClusterCollection> = event.clusters(token);

        let pixels_empty = collection.map_or(true, ClusterCollection::is_empty);
        if self.bindings.switch_off_pixels_if_empty && pixels_empty {
            // Absent and empty are treated alike: the pixel detector was off.
            // A present empty collection stays an input so skip references
            // into it are still attributed to an ingested product.
            let input = collection.map(|c| ClusterInput::new(ModuleKind::Pixel, c));
            return Ok((true, input));
        }

        Self::required(event, ModuleKind::Pixel, &self.bindings).map(|input| (false, input))
    }

    fn warn_missing_masks(&self, missing: &[&str], event_id: u64) {
        if missing.is_empty() {
            return;
        }
        if self
            .warned_missing_masks
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            log::warn!(
                "{}: event {event_id} has no inactive-module list for {}; further occurrences are not reported",
                self.name,
                missing.join(", ")
            );
        }
    }

    /// Builds the snapshot for one event.
    ///
    /// # Errors
    /// Returns [`Error::MissingCollection`] when a configured cluster or skip
    /// collection is absent, and [`Error::UnknownModule`] /
    /// [`Error::KindMismatch`] when clusters do not match the registry. No
    /// partial snapshot is returned.
    pub fn produce<'ev, E: EventSource + ?Sized>(
        &self,
        event: &'ev E,
    ) -> Result<MeasurementTrackerEvent<'ev>> {
        let (pixels_off, pixel_input) = self.pixel_input(event)?;
        let strip_input = Self::required(event, ModuleKind::Strip, &self.bindings)?;
        let phase2_input = Self::required(event, ModuleKind::Phase2Strip, &self.bindings)?;
        let inputs: Vec<ClusterInput<'ev>> = [pixel_input, strip_input, phase2_input]
            .into_iter()
            .flatten()
            .collect();

        let mut builder = InactiveSetBuilder::new(Arc::clone(&self.registry));
        let mut missing = builder.mask_from_sources(
            event,
            ModuleKind::Pixel,
            &self.bindings.inactive_pixel_sources,
        );
        missing.extend(builder.mask_from_sources(
            event,
            ModuleKind::Strip,
            &self.bindings.inactive_strip_sources,
        ));
        self.warn_missing_masks(&missing, event.event_id());
        if pixels_off {
            builder.switch_off(ModuleKind::Pixel);
        }
        if self.bindings.use_module_quality {
            builder.mask_bad_modules();
        }
        let inactive = builder.build();

        let empty_skip = SkipSet::new();
        let skip = match &self.bindings.skip_clusters {
            Some(token) => event.skip_set(token).ok_or_else(|| Error::MissingCollection {
                label: token.label().to_string(),
            })?,
            None => &empty_skip,
        };

        let grouped = ingest(&inputs, skip, &inactive, &self.registry)?;
        let stats = grouped.statistics();
        let snapshot = assemble(&self.registry, &inactive, grouped, &inputs);

        log::debug!(
            "{}: event {}: {}; {} clusters read, {} skipped, {} on inactive modules{}",
            self.name,
            event.event_id(),
            snapshot.summary(),
            stats.read,
            stats.skipped,
            stats.on_inactive,
            if pixels_off { ", pixels switched off" } else { "" }
        );

        Ok(snapshot)
    }

    /// Builds snapshots for independent events in parallel.
    ///
    /// Results are returned in event order; a failure affects only its own
    /// event.
    pub fn produce_all<'ev, E: EventSource>(
        &self,
        events: &'ev [E],
    ) -> Vec<Result<MeasurementTrackerEvent<'ev>>> {
        events.par_iter().map(|event| self.produce(event)).collect()
    }

    /// Builds the snapshot and publishes it under the producer name.
    ///
    /// # Errors
    /// See [`MeasurementTrackerEventProducer::produce`]; also fails with
    /// [`Error::DuplicateProduct`] if the name is already published.
    pub fn produce_into<'ev, E: EventSource + ?Sized>(
        &self,
        event: &'ev E,
        published: &mut Published<'ev>,
    ) -> Result<()> {
        let snapshot = self.produce(event)?;
        published.publish(&self.name, snapshot)
    }
}

/// Snapshots of one event, keyed by producer name, for downstream consumers.
#[derive(Debug, Default)]
pub struct Published<'ev> {
    products: BTreeMap<String, MeasurementTrackerEvent<'ev>>,
}

impl<'ev> Published<'ev> {
    /// Creates an empty product set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a snapshot.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateProduct`] if the name is taken.
    pub fn publish(&mut self, name: &str, snapshot: MeasurementTrackerEvent<'ev>) -> Result<()> {
        if self.products.contains_key(name) {
            return Err(Error::DuplicateProduct(name.to_string()));
        }
        self.products.insert(name.to_string(), snapshot);
        Ok(())
    }

    /// Looks up a snapshot by producer name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MeasurementTrackerEvent<'ev>> {
        self.products.get(name)
    }

    /// Iterates `(name, snapshot)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MeasurementTrackerEvent<'ev>)> {
        self.products.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of published snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Returns true if nothing is published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
