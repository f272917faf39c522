//! Process-level configuration: the era and the named producer instances.
//!
//! JSON schema:
//!
//! ```json
//! {
//!   "era": "phase2_tracker",
//!   "instances": {
//!     "MeasurementTrackerEventIter": {
//!       "inherit": "MeasurementTrackerEvent",
//!       "skipClusters": "initialStepClusters"
//!     }
//!   }
//! }
//! ```
//!
//! Each instance starts from its `inherit` base (a standard instance or
//! another instance of the file) or, without a base, from the era default,
//! and overrides only the options it names.

use crate::era::Era;
use crate::error::{Error, Result};
use crate::producer::{standard_instances, NamedConfig, ProducerConfig};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct JsonProcess {
    era: Era,
    instances: BTreeMap<String, JsonInstance>,
}

#[derive(Deserialize, Default, Clone)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
struct JsonInstance {
    inherit: Option<String>,
    measurement_tracker: Option<String>,
    skip_clusters: Option<String>,
    pixel_cluster_producer: Option<String>,
    strip_cluster_producer: Option<String>,
    inactive_pixel_detector_labels: Option<Vec<String>>,
    inactive_strip_detector_labels: Option<Vec<String>>,
    switch_off_pixels_if_empty: Option<bool>,
    #[serde(rename = "Phase2TrackerCluster1DProducer")]
    phase2_cluster_producer: Option<String>,
    use_module_quality: Option<bool>,
}

impl JsonInstance {
    fn apply(self, base: &ProducerConfig) -> ProducerConfig {
        let mut builder = base.to_builder();
        if let Some(v) = self.measurement_tracker {
            builder = builder.measurement_tracker(v);
        }
        if let Some(v) = self.skip_clusters {
            builder = builder.skip_clusters(v);
        }
        if let Some(v) = self.pixel_cluster_producer {
            builder = builder.pixel_cluster_producer(v);
        }
        if let Some(v) = self.strip_cluster_producer {
            builder = builder.strip_cluster_producer(v);
        }
        if let Some(v) = self.inactive_pixel_detector_labels {
            builder = builder.inactive_pixel_detector_labels(v);
        }
        if let Some(v) = self.inactive_strip_detector_labels {
            builder = builder.inactive_strip_detector_labels(v);
        }
        if let Some(v) = self.switch_off_pixels_if_empty {
            builder = builder.switch_off_pixels_if_empty(v);
        }
        if let Some(v) = self.phase2_cluster_producer {
            builder = builder.phase2_cluster_producer(v);
        }
        if let Some(v) = self.use_module_quality {
            builder = builder.use_module_quality(v);
        }
        builder.build()
    }
}

/// Era plus the ordered list of producer instances to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessConfig {
    era: Era,
    instances: Vec<NamedConfig>,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self::standard(Era::default())
    }
}

impl ProcessConfig {
    /// The standard instances of an era.
    #[must_use]
    pub fn standard(era: Era) -> Self {
        Self {
            era,
            instances: standard_instances(era),
        }
    }

    /// Load configuration from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if an
    /// instance inherits from an unknown or cyclic base.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let json: JsonProcess = serde_json::from_reader(reader)?;
        Self::from_json_process(json, None)
    }

    /// Load configuration from a JSON string.
    ///
    /// # Errors
    /// See [`ProcessConfig::from_file`].
    pub fn from_json(json: &str) -> Result<Self> {
        let json: JsonProcess = serde_json::from_str(json)?;
        Self::from_json_process(json, None)
    }

    /// Load configuration from a JSON string, overriding its era.
    ///
    /// # Errors
    /// See [`ProcessConfig::from_file`].
    pub fn from_json_with_era(json: &str, era: Era) -> Result<Self> {
        let json: JsonProcess = serde_json::from_str(json)?;
        Self::from_json_process(json, Some(era))
    }

    /// Load configuration from a JSON file, overriding its era.
    ///
    /// # Errors
    /// See [`ProcessConfig::from_file`].
    pub fn from_file_with_era<P: AsRef<Path>>(path: P, era: Era) -> Result<Self> {
        let file = File::open(path)?;
        let json: JsonProcess = serde_json::from_reader(BufReader::new(file))?;
        Self::from_json_process(json, Some(era))
    }

    fn from_json_process(json: JsonProcess, era_override: Option<Era>) -> Result<Self> {
        let era = era_override.unwrap_or(json.era);
        let standard = standard_instances(era);

        let mut resolved: BTreeMap<String, ProducerConfig> = BTreeMap::new();
        for name in json.instances.keys() {
            let mut visiting = Vec::new();
            resolve_instance(name, &json.instances, &standard, era, &mut resolved, &mut visiting)?;
        }

        // Standard instances keep their position; file overrides replace them in place
        let mut instances: Vec<NamedConfig> = standard
            .into_iter()
            .map(|named| match resolved.remove(&named.name) {
                Some(config) => NamedConfig::new(named.name, config),
                None => named,
            })
            .collect();
        instances.extend(
            resolved
                .into_iter()
                .map(|(name, config)| NamedConfig::new(name, config)),
        );

        Ok(Self { era, instances })
    }

    /// Selected era.
    #[must_use]
    pub fn era(&self) -> Era {
        self.era
    }

    /// Instances in run order.
    #[must_use]
    pub fn instances(&self) -> &[NamedConfig] {
        &self.instances
    }

    /// Looks up an instance by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ProducerConfig> {
        self.instances
            .iter()
            .find(|named| named.name == name)
            .map(|named| &named.config)
    }

    /// Keeps only the named instances, in the given order.
    ///
    /// # Errors
    /// Returns [`Error::NotConfigured`] for a name that is not configured.
    pub fn select(&self, names: &[String]) -> Result<Self> {
        let instances = names
            .iter()
            .map(|name| {
                self.get(name)
                    .map(|config| NamedConfig::new(name.clone(), config.clone()))
                    .ok_or_else(|| Error::NotConfigured(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            era: self.era,
            instances,
        })
    }
}

fn resolve_instance(
    name: &str,
    defined: &BTreeMap<String, JsonInstance>,
    standard: &[NamedConfig],
    era: Era,
    resolved: &mut BTreeMap<String, ProducerConfig>,
    visiting: &mut Vec<String>,
) -> Result<ProducerConfig> {
    if let Some(config) = resolved.get(name) {
        return Ok(config.clone());
    }
    if visiting.iter().any(|v| v == name) {
        return Err(Error::InheritanceCycle(name.to_string()));
    }

    let Some(instance) = defined.get(name) else {
        return standard
            .iter()
            .find(|named| named.name == name)
            .map(|named| named.config.clone())
            .ok_or_else(|| Error::UnknownInstance {
                name: visiting.last().cloned().unwrap_or_default(),
                base: name.to_string(),
            });
    };

    visiting.push(name.to_string());
    let base = match instance.inherit.as_deref() {
        // An instance overriding a standard name inherits from that standard
        Some(base) if base == name => standard
            .iter()
            .find(|named| named.name == name)
            .map(|named| named.config.clone())
            .ok_or_else(|| Error::InheritanceCycle(name.to_string()))?,
        Some(base) => resolve_instance(base, defined, standard, era, resolved, visiting)?,
        None => ProducerConfig::for_era(era),
    };
    visiting.pop();

    let config = instance.clone().apply(&base);
    resolved.insert(name.to_string(), config.clone());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::{DEFAULT_INSTANCE, PRE_SPLITTING_INSTANCE};
    use std::io::Write;

    #[test]
    fn test_standard_process() {
        let process = ProcessConfig::standard(Era::Phase2Tracker);
        assert_eq!(process.era(), Era::Phase2Tracker);
        assert_eq!(process.instances().len(), 2);
        assert_eq!(
            process.get(PRE_SPLITTING_INSTANCE).unwrap().phase2_cluster_producer(),
            "siPhase2Clusters"
        );
    }

    #[test]
    fn test_empty_json_gives_standard() {
        let process = ProcessConfig::from_json("{}").unwrap();
        assert_eq!(process, ProcessConfig::standard(Era::Run2));
    }

    #[test]
    fn test_inherit_with_one_override() {
        let json = r#"{
            "era": "run2",
            "instances": {
                "MeasurementTrackerEventIter": {
                    "inherit": "MeasurementTrackerEventPreSplitting",
                    "skipClusters": "initialStepClusters"
                }
            }
        }"#;
        let process = ProcessConfig::from_json(json).unwrap();
        assert_eq!(process.instances().len(), 3);
        assert_eq!(process.instances()[2].name, "MeasurementTrackerEventIter");

        let iter = process.get("MeasurementTrackerEventIter").unwrap();
        assert_eq!(iter.skip_clusters(), "initialStepClusters");
        assert_eq!(iter.pixel_cluster_producer(), "siPixelClustersPreSplitting");
        assert_eq!(iter.strip_cluster_producer(), "siStripClusters");
    }

    #[test]
    fn test_override_standard_instance_in_place() {
        let json = r#"{
            "instances": {
                "MeasurementTrackerEvent": { "switchOffPixelsIfEmpty": false }
            }
        }"#;
        let process = ProcessConfig::from_json(json).unwrap();
        assert_eq!(process.instances().len(), 2);
        assert_eq!(process.instances()[0].name, DEFAULT_INSTANCE);
        assert!(!process.get(DEFAULT_INSTANCE).unwrap().switch_off_pixels_if_empty());
        // The standard pre-splitting clone is untouched
        assert!(process
            .get(PRE_SPLITTING_INSTANCE)
            .unwrap()
            .switch_off_pixels_if_empty());
    }

    #[test]
    fn test_chained_inheritance_within_file() {
        let json = r#"{
            "instances": {
                "B": { "inherit": "A", "measurementTracker": "alt" },
                "A": { "pixelClusterProducer": "pixA" }
            }
        }"#;
        let process = ProcessConfig::from_json(json).unwrap();
        let b = process.get("B").unwrap();
        assert_eq!(b.pixel_cluster_producer(), "pixA");
        assert_eq!(b.measurement_tracker(), "alt");
    }

    #[test]
    fn test_inheritance_cycle() {
        let json = r#"{
            "instances": {
                "A": { "inherit": "B" },
                "B": { "inherit": "A" }
            }
        }"#;
        assert!(matches!(
            ProcessConfig::from_json(json),
            Err(Error::InheritanceCycle(_))
        ));
    }

    #[test]
    fn test_unknown_base() {
        let json = r#"{ "instances": { "A": { "inherit": "Nope" } } }"#;
        match ProcessConfig::from_json(json) {
            Err(Error::UnknownInstance { name, base }) => {
                assert_eq!(name, "A");
                assert_eq!(base, "Nope");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_option_rejected() {
        let json = r#"{ "instances": { "A": { "pixelClusterProducr": "x" } } }"#;
        assert!(matches!(ProcessConfig::from_json(json), Err(Error::Json(_))));
    }

    #[test]
    fn test_era_override() {
        let process = ProcessConfig::from_json_with_era("{}", Era::Phase1Pixel).unwrap();
        assert_eq!(process.era(), Era::Phase1Pixel);
        assert!(process
            .get(DEFAULT_INSTANCE)
            .unwrap()
            .inactive_pixel_detector_labels()
            .is_empty());
    }

    #[test]
    fn test_select() {
        let process = ProcessConfig::standard(Era::Run2);
        let only = process
            .select(&[PRE_SPLITTING_INSTANCE.to_string()])
            .unwrap();
        assert_eq!(only.instances().len(), 1);
        assert!(process.select(&["Missing".to_string()]).is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "era": "phase2_tracker", "instances": {{ "X": {{ "inherit": "MeasurementTrackerEvent" }} }} }}"#
        )
        .unwrap();

        let process = ProcessConfig::from_file(file.path()).unwrap();
        assert_eq!(process.era(), Era::Phase2Tracker);
        assert_eq!(process.get("X").unwrap().strip_cluster_producer(), "");
    }
}
