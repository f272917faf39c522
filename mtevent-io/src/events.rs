//! Event files: per-event collections keyed by label.
//!
//! ```json
//! [{"id": 1, "products": {
//!     "siPixelClusters": {"clusters": [{"module": 1, "x": 0.5, "y": 1.5, "size": 2, "charge": 900}]},
//!     "siPixelDigis": {"modules": [1, 2]},
//!     "clusterSkip": {"skip": {"siPixelClusters": [0]}}
//! }}]
//! ```
//!
//! Skip entries name the cluster collection they point into and list
//! cluster indices within it.

use crate::reader::MappedFileReader;
use crate::store::EventData;
use crate::{Error, Result};
use mtevent_core::{Cluster, ClusterRef, ModuleId, SkipSet};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum JsonProduct {
    Clusters(Vec<Cluster>),
    Modules(Vec<ModuleId>),
    Skip(BTreeMap<String, Vec<usize>>),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonEvent {
    id: u64,
    #[serde(default)]
    products: BTreeMap<String, JsonProduct>,
}

fn build_event(event: JsonEvent) -> Result<EventData> {
    let mut data = EventData::new(event.id);
    let mut skips = Vec::new();

    // Skip sets reference cluster collections, which must be stamped first
    for (label, product) in event.products {
        match product {
            JsonProduct::Clusters(clusters) => {
                data.insert_clusters(label, clusters);
            }
            JsonProduct::Modules(ids) => data.insert_module_ids(label, ids),
            JsonProduct::Skip(entries) => skips.push((label, entries)),
        }
    }

    for (label, entries) in skips {
        let mut skip = SkipSet::new();
        for (collection, indices) in entries {
            let product = data.product_id(&collection).ok_or_else(|| {
                Error::InvalidFormat(format!(
                    "event {}: skip set '{label}' references unknown cluster collection '{collection}'",
                    event.id
                ))
            })?;
            for index in indices {
                skip.insert(ClusterRef::new(product, index));
            }
        }
        data.insert_skip_set(label, skip);
    }

    Ok(data)
}

/// Parses an event document.
///
/// # Errors
/// Returns an error for malformed JSON or a skip set naming a cluster
/// collection absent from its event.
pub fn from_json(json: &str) -> Result<Vec<EventData>> {
    let events: Vec<JsonEvent> = serde_json::from_str(json)?;
    events.into_iter().map(build_event).collect()
}

/// Loads an event file through a memory map.
///
/// # Errors
/// See [`from_json`]; also fails if the file cannot be read.
pub fn load_events<P: AsRef<Path>>(path: P) -> Result<Vec<EventData>> {
    let reader = MappedFileReader::open(path)?;
    let events: Vec<JsonEvent> = reader.parse_json()?;
    let events = events
        .into_iter()
        .map(build_event)
        .collect::<Result<Vec<_>>>()?;
    log::info!(
        "loaded {} events from {}",
        events.len(),
        reader.path().display()
    );
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtevent_core::{EventSource, InputToken};

    #[test]
    fn test_parse_products() {
        let events = from_json(
            r#"[{"id": 3, "products": {
                "siPixelClusters": {"clusters": [
                    {"module": 1, "x": 0.5, "y": 1.5, "size": 2, "charge": 900},
                    {"module": 2, "x": 3.0, "size": 1, "charge": 400}
                ]},
                "siPixelDigis": {"modules": [2]},
                "skip": {"skip": {"siPixelClusters": [1]}}
            }}]"#,
        )
        .unwrap();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.event_id(), 3);
        assert_eq!(event.len(), 3);

        let clusters = event
            .clusters(&InputToken::new("siPixelClusters"))
            .unwrap();
        assert_eq!(clusters.len(), 2);
        assert!(clusters.clusters()[1].y.abs() < f32::EPSILON);

        let product = event.product_id("siPixelClusters").unwrap();
        let skip = event.skip_set(&InputToken::new("skip")).unwrap();
        assert!(skip.contains(ClusterRef::new(product, 1)));
        assert!(!skip.contains(ClusterRef::new(product, 0)));
    }

    #[test]
    fn test_skip_on_unknown_collection() {
        let result = from_json(
            r#"[{"id": 1, "products": {"skip": {"skip": {"nothere": [0]}}}}]"#,
        );
        assert!(matches!(result, Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_event_without_products() {
        let events = from_json(r#"[{"id": 9}]"#).unwrap();
        assert!(events[0].is_empty());
    }
}
