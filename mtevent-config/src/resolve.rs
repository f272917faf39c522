//! Resolution of a producer configuration into typed input bindings.

use crate::producer::ProducerConfig;
use mtevent_core::{
    ClusterCollection, Error, InputToken, ModuleIdCollection, ModuleKind, Result, SkipSet,
};
use std::collections::HashSet;

/// Concrete runtime bindings of one producer instance.
///
/// Every label has been turned into a typed token; `None` means the
/// corresponding input is not read in this configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBindings {
    /// Registry name (empty = default).
    pub measurement_tracker: String,
    /// Pixel cluster source.
    pub pixel_clusters: Option<InputToken<ClusterCollection>>,
    /// Strip cluster source.
    pub strip_clusters: Option<InputToken<ClusterCollection>>,
    /// Phase-2 1D cluster source.
    pub phase2_clusters: Option<InputToken<ClusterCollection>>,
    /// Pixel masking sources.
    pub inactive_pixel_sources: Vec<InputToken<ModuleIdCollection>>,
    /// Strip masking sources.
    pub inactive_strip_sources: Vec<InputToken<ModuleIdCollection>>,
    /// Global skip set source.
    pub skip_clusters: Option<InputToken<SkipSet>>,
    /// Empty or absent pixel clusters switch off every pixel module.
    pub switch_off_pixels_if_empty: bool,
    /// Modules flagged bad in the registry are masked.
    pub use_module_quality: bool,
}

impl ResolvedBindings {
    /// Active cluster sources with the module kind they feed.
    pub fn cluster_sources(
        &self,
    ) -> impl Iterator<Item = (ModuleKind, &InputToken<ClusterCollection>)> {
        [
            (ModuleKind::Pixel, self.pixel_clusters.as_ref()),
            (ModuleKind::Strip, self.strip_clusters.as_ref()),
            (ModuleKind::Phase2Strip, self.phase2_clusters.as_ref()),
        ]
        .into_iter()
        .filter_map(|(kind, token)| token.map(|t| (kind, t)))
    }

    /// Cluster source for one kind.
    #[must_use]
    pub fn cluster_source(&self, kind: ModuleKind) -> Option<&InputToken<ClusterCollection>> {
        match kind {
            ModuleKind::Pixel => self.pixel_clusters.as_ref(),
            ModuleKind::Strip => self.strip_clusters.as_ref(),
            ModuleKind::Phase2Strip => self.phase2_clusters.as_ref(),
        }
    }
}

fn optional_token<T>(label: &str) -> Option<InputToken<T>> {
    if label.is_empty() {
        None
    } else {
        Some(InputToken::new(label))
    }
}

fn mask_tokens(option: &str, labels: &[String]) -> Result<Vec<InputToken<ModuleIdCollection>>> {
    let mut seen = HashSet::new();
    labels
        .iter()
        .map(|label| {
            if label.is_empty() {
                return Err(Error::ConfigurationInconsistency(format!(
                    "{option} contains an empty label"
                )));
            }
            if !seen.insert(label.as_str()) {
                return Err(Error::ConfigurationInconsistency(format!(
                    "{option} lists '{label}' more than once"
                )));
            }
            Ok(InputToken::new(label.as_str()))
        })
        .collect()
}

/// Resolves a configuration into bindings.
///
/// An empty producer label disables that variant. Resolution happens once,
/// before any event is processed.
///
/// # Errors
/// Returns [`Error::ConfigurationInconsistency`] when strip and phase-2
/// sources are both configured, when no cluster source is configured at all,
/// or when a masking-label list contains an empty or repeated label.
pub fn resolve(config: &ProducerConfig) -> Result<ResolvedBindings> {
    let bindings = ResolvedBindings {
        measurement_tracker: config.measurement_tracker().to_string(),
        pixel_clusters: optional_token(config.pixel_cluster_producer()),
        strip_clusters: optional_token(config.strip_cluster_producer()),
        phase2_clusters: optional_token(config.phase2_cluster_producer()),
        inactive_pixel_sources: mask_tokens(
            "inactivePixelDetectorLabels",
            config.inactive_pixel_detector_labels(),
        )?,
        inactive_strip_sources: mask_tokens(
            "inactiveStripDetectorLabels",
            config.inactive_strip_detector_labels(),
        )?,
        skip_clusters: optional_token(config.skip_clusters()),
        switch_off_pixels_if_empty: config.switch_off_pixels_if_empty(),
        use_module_quality: config.use_module_quality(),
    };

    if let (Some(strip), Some(phase2)) = (&bindings.strip_clusters, &bindings.phase2_clusters) {
        return Err(Error::ConfigurationInconsistency(format!(
            "stripClusterProducer '{}' and Phase2TrackerCluster1DProducer '{}' belong to different eras",
            strip.label(),
            phase2.label()
        )));
    }

    if bindings.cluster_sources().next().is_none() {
        return Err(Error::ConfigurationInconsistency(
            "no cluster producer configured".to_string(),
        ));
    }

    if bindings.strip_clusters.is_none() && !bindings.inactive_strip_sources.is_empty() {
        log::debug!(
            "strip ingestion disabled; {} strip masking source(s) only affect strip modules present in the registry",
            bindings.inactive_strip_sources.len()
        );
    }

    Ok(bindings)
}
