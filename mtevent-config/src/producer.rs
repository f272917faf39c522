//! Parameter set of one measurement tracker event producer instance.

use crate::era::Era;
use serde::Serialize;

/// Name of the default producer instance.
pub const DEFAULT_INSTANCE: &str = "MeasurementTrackerEvent";

/// Name of the instance reading pre-splitting pixel clusters.
pub const PRE_SPLITTING_INSTANCE: &str = "MeasurementTrackerEventPreSplitting";

/// Immutable configuration of a producer instance.
///
/// An empty label means "not used in this era": the corresponding clusters
/// are not read. Construct through [`ProducerConfig::for_era`] or
/// [`ProducerConfig::builder`]; derive variants with [`ProducerConfig::to_builder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProducerConfig {
    measurement_tracker: String,
    skip_clusters: String,
    pixel_cluster_producer: String,
    strip_cluster_producer: String,
    inactive_pixel_detector_labels: Vec<String>,
    inactive_strip_detector_labels: Vec<String>,
    switch_off_pixels_if_empty: bool,
    #[serde(rename = "Phase2TrackerCluster1DProducer")]
    phase2_cluster_producer: String,
    use_module_quality: bool,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self::for_era(Era::Run2)
    }
}

impl ProducerConfig {
    /// Default instance configuration for an era.
    #[must_use]
    pub fn for_era(era: Era) -> Self {
        let run2 = Self {
            measurement_tracker: String::new(),
            skip_clusters: String::new(),
            pixel_cluster_producer: "siPixelClusters".to_string(),
            strip_cluster_producer: "siStripClusters".to_string(),
            inactive_pixel_detector_labels: vec!["siPixelDigis".to_string()],
            inactive_strip_detector_labels: vec!["siStripDigis".to_string()],
            // Cosmics: an empty pixel collection means the pixels were off
            switch_off_pixels_if_empty: true,
            phase2_cluster_producer: String::new(),
            use_module_quality: true,
        };

        match era {
            Era::Run2 => run2,
            Era::Phase1Pixel => run2
                .to_builder()
                .inactive_pixel_detector_labels(Vec::<String>::new())
                .build(),
            Era::Phase2Tracker => run2
                .to_builder()
                .inactive_pixel_detector_labels(Vec::<String>::new())
                .phase2_cluster_producer("siPhase2Clusters")
                .strip_cluster_producer("")
                .build(),
        }
    }

    /// The pre-splitting variant of this configuration.
    #[must_use]
    pub fn pre_splitting(&self) -> Self {
        self.to_builder()
            .pixel_cluster_producer("siPixelClustersPreSplitting")
            .build()
    }

    /// Starts a builder from the Run 2 defaults.
    #[must_use]
    pub fn builder() -> ProducerConfigBuilder {
        Self::default().to_builder()
    }

    /// Starts a builder from this configuration.
    #[must_use]
    pub fn to_builder(&self) -> ProducerConfigBuilder {
        ProducerConfigBuilder {
            config: self.clone(),
        }
    }

    /// Name of the alternate registry (empty = default).
    #[must_use]
    pub fn measurement_tracker(&self) -> &str {
        &self.measurement_tracker
    }

    /// Label of the skip-set collection (empty = no skipping).
    #[must_use]
    pub fn skip_clusters(&self) -> &str {
        &self.skip_clusters
    }

    /// Label of the pixel clusters (empty = pixel ingestion disabled).
    #[must_use]
    pub fn pixel_cluster_producer(&self) -> &str {
        &self.pixel_cluster_producer
    }

    /// Label of the strip clusters (empty = strip ingestion disabled).
    #[must_use]
    pub fn strip_cluster_producer(&self) -> &str {
        &self.strip_cluster_producer
    }

    /// Label of the phase-2 1D clusters (empty = phase-2 ingestion disabled).
    #[must_use]
    pub fn phase2_cluster_producer(&self) -> &str {
        &self.phase2_cluster_producer
    }

    /// Masking sources for pixel modules.
    #[must_use]
    pub fn inactive_pixel_detector_labels(&self) -> &[String] {
        &self.inactive_pixel_detector_labels
    }

    /// Masking sources for strip modules.
    #[must_use]
    pub fn inactive_strip_detector_labels(&self) -> &[String] {
        &self.inactive_strip_detector_labels
    }

    /// Whether an empty or absent pixel collection switches off all pixels.
    #[must_use]
    pub fn switch_off_pixels_if_empty(&self) -> bool {
        self.switch_off_pixels_if_empty
    }

    /// Whether modules flagged bad in conditions are masked.
    #[must_use]
    pub fn use_module_quality(&self) -> bool {
        self.use_module_quality
    }
}

/// Builder for [`ProducerConfig`].
#[derive(Debug, Clone)]
#[must_use]
pub struct ProducerConfigBuilder {
    config: ProducerConfig,
}

impl ProducerConfigBuilder {
    /// Sets the alternate registry name.
    pub fn measurement_tracker(mut self, name: impl Into<String>) -> Self {
        self.config.measurement_tracker = name.into();
        self
    }

    /// Sets the skip-set label.
    pub fn skip_clusters(mut self, label: impl Into<String>) -> Self {
        self.config.skip_clusters = label.into();
        self
    }

    /// Sets the pixel cluster label.
    pub fn pixel_cluster_producer(mut self, label: impl Into<String>) -> Self {
        self.config.pixel_cluster_producer = label.into();
        self
    }

    /// Sets the strip cluster label.
    pub fn strip_cluster_producer(mut self, label: impl Into<String>) -> Self {
        self.config.strip_cluster_producer = label.into();
        self
    }

    /// Sets the phase-2 cluster label.
    pub fn phase2_cluster_producer(mut self, label: impl Into<String>) -> Self {
        self.config.phase2_cluster_producer = label.into();
        self
    }

    /// Sets the pixel masking sources.
    pub fn inactive_pixel_detector_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.inactive_pixel_detector_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the strip masking sources.
    pub fn inactive_strip_detector_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.inactive_strip_detector_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Enables or disables the empty-pixel switch-off policy.
    pub fn switch_off_pixels_if_empty(mut self, enabled: bool) -> Self {
        self.config.switch_off_pixels_if_empty = enabled;
        self
    }

    /// Enables or disables conditions-based module masking.
    pub fn use_module_quality(mut self, enabled: bool) -> Self {
        self.config.use_module_quality = enabled;
        self
    }

    /// Finishes the configuration.
    #[must_use]
    pub fn build(self) -> ProducerConfig {
        self.config
    }
}

/// A producer configuration published under a module name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedConfig {
    /// Instance name; also the key the snapshot is published under.
    pub name: String,
    /// Instance configuration.
    pub config: ProducerConfig,
}

impl NamedConfig {
    /// Creates a named configuration.
    #[must_use]
    pub fn new(name: impl Into<String>, config: ProducerConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }
}

/// The two standard instances of an era: the default and its pre-splitting clone.
#[must_use]
pub fn standard_instances(era: Era) -> Vec<NamedConfig> {
    let default = ProducerConfig::for_era(era);
    let pre_splitting = default.pre_splitting();
    vec![
        NamedConfig::new(DEFAULT_INSTANCE, default),
        NamedConfig::new(PRE_SPLITTING_INSTANCE, pre_splitting),
    ]
}
