//! Cluster collections, cluster references and skip sets.

use crate::module::ModuleId;
use std::collections::HashSet;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Provenance identifier assigned by the event transport to each stored
/// collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ProductId(pub u32);

impl ProductId {
    /// Placeholder for a collection not yet stored in an event.
    pub const UNSET: ProductId = ProductId(0);
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One reconstructed hit cluster, produced upstream.
///
/// The payload is opaque to the measurement tracker: only the owning module
/// is interpreted. Strip-like clusters leave `y` at zero.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cluster {
    /// Owning module.
    pub module: ModuleId,
    /// Local barycenter along the measurement direction (channels).
    pub x: f32,
    /// Local barycenter along the second direction (pixels only).
    #[cfg_attr(feature = "serde", serde(default))]
    pub y: f32,
    /// Number of channels in the cluster.
    pub size: u16,
    /// Total collected charge (ADC counts).
    pub charge: u32,
}

impl Cluster {
    /// Creates a cluster on the given module.
    #[must_use]
    pub fn new(module: impl Into<ModuleId>, x: f32, y: f32, size: u16, charge: u32) -> Self {
        Self {
            module: module.into(),
            x,
            y,
            size,
            charge,
        }
    }
}

/// Reference to one cluster inside a stored collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterRef {
    /// Collection the cluster lives in.
    pub product: ProductId,
    /// Position within the collection.
    pub index: usize,
}

impl ClusterRef {
    /// Creates a reference.
    #[inline]
    #[must_use]
    pub fn new(product: ProductId, index: usize) -> Self {
        Self { product, index }
    }
}

/// A collection of clusters in upstream production order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterCollection {
    product: ProductId,
    clusters: Vec<Cluster>,
}

impl ClusterCollection {
    /// Creates a collection not yet stamped with a product id.
    #[must_use]
    pub fn new(clusters: Vec<Cluster>) -> Self {
        Self {
            product: ProductId::UNSET,
            clusters,
        }
    }

    /// Stamps the collection with its provenance id.
    #[must_use]
    pub fn with_product(mut self, product: ProductId) -> Self {
        self.product = product;
        self
    }

    /// Provenance id.
    #[must_use]
    pub fn product(&self) -> ProductId {
        self.product
    }

    /// Clusters in collection order.
    #[must_use]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Resolves a reference into this collection.
    #[must_use]
    pub fn get(&self, cluster: ClusterRef) -> Option<&Cluster> {
        if cluster.product == self.product {
            self.clusters.get(cluster.index)
        } else {
            None
        }
    }

    /// Returns the number of clusters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Returns true if the collection holds no clusters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Iterates `(reference, cluster)` pairs in collection order.
    pub fn iter_refs(&self) -> impl Iterator<Item = (ClusterRef, &Cluster)> {
        let product = self.product;
        self.clusters
            .iter()
            .enumerate()
            .map(move |(index, cluster)| (ClusterRef::new(product, index), cluster))
    }
}

impl FromIterator<Cluster> for ClusterCollection {
    fn from_iter<I: IntoIterator<Item = Cluster>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A list of module identifiers, as published by a masking source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ModuleIdCollection(Vec<ModuleId>);

impl ModuleIdCollection {
    /// Creates a collection from identifiers.
    #[must_use]
    pub fn new(ids: Vec<ModuleId>) -> Self {
        Self(ids)
    }

    /// Iterates the identifiers in stored order.
    pub fn iter(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.0.iter().copied()
    }

    /// Returns the number of identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<ModuleId> for ModuleIdCollection {
    fn from_iter<I: IntoIterator<Item = ModuleId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Clusters to exclude from the event regardless of module state.
///
/// Typically produced by an earlier iteration that already consumed the
/// clusters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipSet {
    refs: HashSet<ClusterRef>,
}

impl SkipSet {
    /// Creates an empty skip set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a skip set from a per-cluster mask over one collection.
    ///
    /// `mask[i] == true` skips cluster `i` of `product`.
    #[must_use]
    pub fn from_mask(product: ProductId, mask: &[bool]) -> Self {
        let refs = mask
            .iter()
            .enumerate()
            .filter(|(_, skip)| **skip)
            .map(|(index, _)| ClusterRef::new(product, index))
            .collect();
        Self { refs }
    }

    /// Adds a reference.
    pub fn insert(&mut self, cluster: ClusterRef) -> bool {
        self.refs.insert(cluster)
    }

    /// Returns true if the cluster is skipped.
    #[inline]
    #[must_use]
    pub fn contains(&self, cluster: ClusterRef) -> bool {
        self.refs.contains(&cluster)
    }

    /// Distinct collections referenced by this set, sorted.
    #[must_use]
    pub fn products(&self) -> Vec<ProductId> {
        let mut products: Vec<ProductId> = self.refs.iter().map(|r| r.product).collect();
        products.sort_unstable();
        products.dedup();
        products
    }

    /// Iterates the references (unordered).
    pub fn iter(&self) -> impl Iterator<Item = ClusterRef> + '_ {
        self.refs.iter().copied()
    }

    /// Returns the number of skipped clusters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// Returns true if nothing is skipped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

impl FromIterator<ClusterRef> for SkipSet {
    fn from_iter<I: IntoIterator<Item = ClusterRef>>(iter: I) -> Self {
        Self {
            refs: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection() -> ClusterCollection {
        ClusterCollection::new(vec![
            Cluster::new(1, 10.0, 4.0, 2, 300),
            Cluster::new(2, 12.5, 0.0, 3, 450),
            Cluster::new(1, 40.0, 8.0, 1, 120),
        ])
        .with_product(ProductId(5))
    }

    #[test]
    fn test_collection_refs() {
        let coll = collection();
        assert_eq!(coll.len(), 3);
        assert!(!coll.is_empty());

        let refs: Vec<ClusterRef> = coll.iter_refs().map(|(r, _)| r).collect();
        assert_eq!(refs[2], ClusterRef::new(ProductId(5), 2));

        let third = coll.get(refs[2]).unwrap();
        assert_eq!(third.charge, 120);

        // Reference into another product does not resolve
        assert!(coll.get(ClusterRef::new(ProductId(6), 0)).is_none());
    }

    #[test]
    fn test_skip_set_from_mask() {
        let skip = SkipSet::from_mask(ProductId(5), &[true, false, true]);
        assert_eq!(skip.len(), 2);
        assert!(skip.contains(ClusterRef::new(ProductId(5), 0)));
        assert!(!skip.contains(ClusterRef::new(ProductId(5), 1)));
        assert!(skip.contains(ClusterRef::new(ProductId(5), 2)));
        assert_eq!(skip.products(), vec![ProductId(5)]);
    }

    #[test]
    fn test_skip_set_collect() {
        let mut skip: SkipSet = [ClusterRef::new(ProductId(2), 4)].into_iter().collect();
        assert!(skip.insert(ClusterRef::new(ProductId(1), 0)));
        assert!(!skip.insert(ClusterRef::new(ProductId(1), 0)));
        assert_eq!(skip.len(), 2);
        assert_eq!(skip.products(), vec![ProductId(1), ProductId(2)]);
        assert!(SkipSet::new().is_empty());
    }

    #[test]
    fn test_module_id_collection() {
        let ids: ModuleIdCollection = [ModuleId(3), ModuleId(1)].into_iter().collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids.iter().collect::<Vec<_>>(), vec![ModuleId(3), ModuleId(1)]);
        assert!(ModuleIdCollection::default().is_empty());
    }
}
