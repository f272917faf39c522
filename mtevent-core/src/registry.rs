//! Geometry-derived module registry.
//!
//! The registry is built once per geometry and shared read-only by every
//! event being processed, so lookups take `&self` and need no locking.

use crate::error::{Error, Result};
use crate::module::{ModuleId, ModuleInfo, ModuleKind};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Ordered enumeration of all detector modules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleRegistry {
    modules: Vec<ModuleInfo>,
    kind_counts: [usize; 3],
}

impl ModuleRegistry {
    /// Builds a registry from geometry, sorting modules by identifier.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateModule`] if an identifier appears twice.
    pub fn new<I: IntoIterator<Item = ModuleInfo>>(modules: I) -> Result<Self> {
        let mut modules: Vec<ModuleInfo> = modules.into_iter().collect();
        modules.sort_by_key(|m| m.id);

        if let Some(pair) = modules.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(Error::DuplicateModule(pair[0].id));
        }

        let mut kind_counts = [0usize; 3];
        for module in &modules {
            kind_counts[module.kind().index()] += 1;
        }

        Ok(Self {
            modules,
            kind_counts,
        })
    }

    /// Position of a module in registry order.
    #[inline]
    #[must_use]
    pub fn index_of(&self, id: ModuleId) -> Option<usize> {
        self.modules.binary_search_by_key(&id, |m| m.id).ok()
    }

    /// Kind of a module.
    ///
    /// # Errors
    /// Returns [`Error::UnknownModule`] if the module is not registered.
    pub fn lookup(&self, id: ModuleId) -> Result<ModuleKind> {
        self.info(id).map(ModuleInfo::kind)
    }

    /// Full geometry metadata of a module.
    ///
    /// # Errors
    /// Returns [`Error::UnknownModule`] if the module is not registered.
    pub fn info(&self, id: ModuleId) -> Result<&ModuleInfo> {
        self.index_of(id)
            .map(|idx| &self.modules[idx])
            .ok_or(Error::UnknownModule(id))
    }

    /// Returns true if the module is registered.
    #[must_use]
    pub fn contains(&self, id: ModuleId) -> bool {
        self.index_of(id).is_some()
    }

    /// All module identifiers in ascending order.
    pub fn all_modules(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.modules.iter().map(|m| m.id)
    }

    /// All modules in ascending identifier order.
    #[must_use]
    pub fn modules(&self) -> &[ModuleInfo] {
        &self.modules
    }

    /// Registry positions and metadata of the modules of one kind.
    pub fn modules_of_kind(
        &self,
        kind: ModuleKind,
    ) -> impl Iterator<Item = (usize, &ModuleInfo)> + '_ {
        self.modules
            .iter()
            .enumerate()
            .filter(move |(_, m)| m.kind() == kind)
    }

    /// Number of modules of one kind.
    #[must_use]
    pub fn count_of(&self, kind: ModuleKind) -> usize {
        self.kind_counts[kind.index()]
    }

    /// Total number of modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns true if the registry holds no modules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Named registries selectable through the `measurementTracker` option.
///
/// The empty name selects the default registry.
#[derive(Debug, Clone, Default)]
pub struct RegistryCatalog {
    registries: BTreeMap<String, Arc<ModuleRegistry>>,
}

impl RegistryCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding only a default registry.
    #[must_use]
    pub fn with_default(registry: ModuleRegistry) -> Self {
        let mut catalog = Self::new();
        catalog.insert("", registry);
        catalog
    }

    /// Adds or replaces a named registry.
    pub fn insert(&mut self, name: impl Into<String>, registry: ModuleRegistry) {
        self.registries.insert(name.into(), Arc::new(registry));
    }

    /// Selects a registry by name.
    ///
    /// # Errors
    /// Returns [`Error::UnknownMeasurementTracker`] if no registry has that name.
    pub fn get(&self, name: &str) -> Result<Arc<ModuleRegistry>> {
        self.registries
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownMeasurementTracker(name.to_string()))
    }

    /// Iterates `(name, registry)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<ModuleRegistry>)> {
        self.registries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of registries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registries.len()
    }

    /// Returns true if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::Subdetector;

    fn geometry() -> Vec<ModuleInfo> {
        vec![
            ModuleInfo::new(300, Subdetector::Tob, 1),
            ModuleInfo::new(100, Subdetector::PixelBarrel, 1),
            ModuleInfo::new(200, Subdetector::PixelEndcap, 1),
            ModuleInfo::new(400, Subdetector::Tec, 2).with_bad(true),
        ]
    }

    #[test]
    fn test_registry_sorted() {
        let registry = ModuleRegistry::new(geometry()).unwrap();
        let ids: Vec<u32> = registry.all_modules().map(ModuleId::raw).collect();
        assert_eq!(ids, vec![100, 200, 300, 400]);
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.index_of(ModuleId(300)), Some(2));
    }

    #[test]
    fn test_registry_lookup() {
        let registry = ModuleRegistry::new(geometry()).unwrap();
        assert_eq!(registry.lookup(ModuleId(100)).unwrap(), ModuleKind::Pixel);
        assert_eq!(registry.lookup(ModuleId(400)).unwrap(), ModuleKind::Strip);
        assert!(registry.info(ModuleId(400)).unwrap().bad);
        assert_eq!(
            registry.lookup(ModuleId(999)),
            Err(Error::UnknownModule(ModuleId(999)))
        );
        assert!(!registry.contains(ModuleId(999)));
    }

    #[test]
    fn test_registry_kind_counts() {
        let registry = ModuleRegistry::new(geometry()).unwrap();
        assert_eq!(registry.count_of(ModuleKind::Pixel), 2);
        assert_eq!(registry.count_of(ModuleKind::Strip), 2);
        assert_eq!(registry.count_of(ModuleKind::Phase2Strip), 0);

        let pixel_positions: Vec<usize> = registry
            .modules_of_kind(ModuleKind::Pixel)
            .map(|(idx, _)| idx)
            .collect();
        assert_eq!(pixel_positions, vec![0, 1]);
    }

    #[test]
    fn test_registry_duplicate() {
        let mut modules = geometry();
        modules.push(ModuleInfo::new(200, Subdetector::Tib, 1));
        assert_eq!(
            ModuleRegistry::new(modules),
            Err(Error::DuplicateModule(ModuleId(200)))
        );
    }

    #[test]
    fn test_catalog_selection() {
        let mut catalog = RegistryCatalog::with_default(ModuleRegistry::new(geometry()).unwrap());
        catalog.insert(
            "pixelOnly",
            ModuleRegistry::new(vec![ModuleInfo::new(1, Subdetector::PixelBarrel, 1)]).unwrap(),
        );

        assert_eq!(catalog.get("").unwrap().len(), 4);
        assert_eq!(catalog.get("pixelOnly").unwrap().len(), 1);
        assert_eq!(
            catalog.get("missing").unwrap_err(),
            Error::UnknownMeasurementTracker("missing".to_string())
        );
        assert_eq!(catalog.len(), 2);
    }
}
