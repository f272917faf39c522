//! Geometry files: module lists feeding the [`RegistryCatalog`].
//!
//! A geometry file is either a bare list of modules (the default registry)
//! or an object with named registries:
//!
//! ```json
//! {"trackers": {"": [...], "phase1": [...]}}
//! ```
//!
//! Each module is `{"id": 302055940, "subdetector": "pixel_barrel", "layer": 1}`
//! with an optional `"bad": true`. The kind follows from the subdetector.

use crate::reader::MappedFileReader;
use crate::Result;
use mtevent_core::{ModuleId, ModuleInfo, ModuleRegistry, RegistryCatalog, Subdetector};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonModule {
    id: ModuleId,
    subdetector: Subdetector,
    #[serde(default)]
    layer: u8,
    #[serde(default)]
    bad: bool,
}

impl From<JsonModule> for ModuleInfo {
    fn from(m: JsonModule) -> Self {
        ModuleInfo::new(m.id, m.subdetector, m.layer).with_bad(m.bad)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonCatalog {
    trackers: BTreeMap<String, Vec<JsonModule>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonGeometry {
    Catalog(JsonCatalog),
    Modules(Vec<JsonModule>),
}

fn build_registry(modules: Vec<JsonModule>) -> Result<ModuleRegistry> {
    let registry = ModuleRegistry::new(modules.into_iter().map(ModuleInfo::from))?;
    Ok(registry)
}

/// Parses a geometry document.
///
/// # Errors
/// Returns an error for malformed JSON or a duplicated module identifier.
pub fn from_json(json: &str) -> Result<RegistryCatalog> {
    from_geometry(serde_json::from_str(json)?)
}

/// Loads a geometry file through a memory map.
///
/// # Errors
/// Returns an error if the file cannot be read or does not describe a valid
/// geometry.
pub fn load_geometry<P: AsRef<Path>>(path: P) -> Result<RegistryCatalog> {
    let reader = MappedFileReader::open(path)?;
    let catalog = from_geometry(reader.parse_json()?)?;
    log::info!(
        "loaded geometry {}: {} registr{}",
        reader.path().display(),
        catalog.len(),
        if catalog.len() == 1 { "y" } else { "ies" }
    );
    Ok(catalog)
}

fn from_geometry(geometry: JsonGeometry) -> Result<RegistryCatalog> {
    let mut catalog = RegistryCatalog::new();
    match geometry {
        JsonGeometry::Modules(modules) => catalog.insert("", build_registry(modules)?),
        JsonGeometry::Catalog(JsonCatalog { trackers }) => {
            for (name, modules) in trackers {
                catalog.insert(name, build_registry(modules)?);
            }
        }
    }
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtevent_core::ModuleKind;

    #[test]
    fn test_bare_list_is_default_registry() {
        let catalog = from_json(
            r#"[
                {"id": 2, "subdetector": "pixel_barrel", "layer": 1},
                {"id": 1, "subdetector": "tib", "layer": 2, "bad": true}
            ]"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 1);
        let registry = catalog.get("").unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup(ModuleId(1)).unwrap(), ModuleKind::Strip);
        assert!(registry.info(ModuleId(1)).unwrap().bad);
        assert!(!registry.info(ModuleId(2)).unwrap().bad);
    }

    #[test]
    fn test_named_registries() {
        let catalog = from_json(
            r#"{"trackers": {
                "": [{"id": 1, "subdetector": "pixel_barrel"}],
                "phase2": [{"id": 5, "subdetector": "phase2_outer_barrel"}]
            }}"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);
        let phase2 = catalog.get("phase2").unwrap();
        assert_eq!(phase2.count_of(ModuleKind::Phase2Strip), 1);
    }

    #[test]
    fn test_duplicate_module_rejected() {
        let result = from_json(
            r#"[{"id": 1, "subdetector": "tob"}, {"id": 1, "subdetector": "tec"}]"#,
        );
        assert!(matches!(
            result,
            Err(crate::Error::CoreError(mtevent_core::Error::DuplicateModule(_)))
        ));
    }

    #[test]
    fn test_unknown_subdetector_rejected() {
        assert!(from_json(r#"[{"id": 1, "subdetector": "calorimeter"}]"#).is_err());
    }
}
