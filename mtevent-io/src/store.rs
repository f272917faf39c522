//! In-memory event-data store keyed by collection label.

use mtevent_core::{
    Cluster, ClusterCollection, EventSource, InputToken, ModuleId, ModuleIdCollection, ProductId,
    SkipSet,
};
use std::collections::HashMap;

/// Materialized collections of one event.
///
/// Every stored cluster collection is stamped with a fresh [`ProductId`],
/// which skip sets use to reference its clusters.
#[derive(Debug, Clone, Default)]
pub struct EventData {
    id: u64,
    next_product: u32,
    clusters: HashMap<String, ClusterCollection>,
    module_ids: HashMap<String, ModuleIdCollection>,
    skip_sets: HashMap<String, SkipSet>,
}

impl EventData {
    /// Creates an empty event.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Stores a cluster collection, replacing any previous one with the
    /// same label, and returns its product id.
    pub fn insert_clusters(&mut self, label: impl Into<String>, clusters: Vec<Cluster>) -> ProductId {
        self.next_product += 1;
        let product = ProductId(self.next_product);
        self.clusters.insert(
            label.into(),
            ClusterCollection::new(clusters).with_product(product),
        );
        product
    }

    /// Stores a list of module identifiers (masking source).
    pub fn insert_module_ids<I>(&mut self, label: impl Into<String>, ids: I)
    where
        I: IntoIterator,
        I::Item: Into<ModuleId>,
    {
        self.module_ids
            .insert(label.into(), ids.into_iter().map(Into::<ModuleId>::into).collect());
    }

    /// Stores a skip set.
    pub fn insert_skip_set(&mut self, label: impl Into<String>, skip: SkipSet) {
        self.skip_sets.insert(label.into(), skip);
    }

    /// Product id of a stored cluster collection.
    #[must_use]
    pub fn product_id(&self, label: &str) -> Option<ProductId> {
        self.clusters.get(label).map(ClusterCollection::product)
    }

    /// Total number of stored collections of any type.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len() + self.module_ids.len() + self.skip_sets.len()
    }

    /// Returns true if the event holds no collections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSource for EventData {
    fn event_id(&self) -> u64 {
        self.id
    }

    fn clusters(&self, token: &InputToken<ClusterCollection>) -> Option<&ClusterCollection> {
        self.clusters.get(token.label())
    }

    fn module_ids(&self, token: &InputToken<ModuleIdCollection>) -> Option<&ModuleIdCollection> {
        self.module_ids.get(token.label())
    }

    fn skip_set(&self, token: &InputToken<SkipSet>) -> Option<&SkipSet> {
        self.skip_sets.get(token.label())
    }
}
