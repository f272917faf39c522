//! Event-data transport interface.
//!
//! Collections are retrieved through typed [`InputToken`]s resolved once
//! from configuration, never through raw label lookups in core logic.

use crate::cluster::{ClusterCollection, ModuleIdCollection, SkipSet};
use std::fmt;
use std::marker::PhantomData;

/// Typed handle to a labelled collection of `T` in an event.
pub struct InputToken<T> {
    label: String,
    _product: PhantomData<fn() -> T>,
}

impl<T> InputToken<T> {
    /// Creates a token for the given label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            _product: PhantomData,
        }
    }

    /// Collection label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<T> Clone for InputToken<T> {
    fn clone(&self) -> Self {
        Self::new(self.label.clone())
    }
}

impl<T> PartialEq for InputToken<T> {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label
    }
}

impl<T> Eq for InputToken<T> {}

impl<T> fmt::Debug for InputToken<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InputToken").field(&self.label).finish()
    }
}

/// Read access to the materialized collections of one event.
///
/// Implementations return `None` when the event holds no collection under
/// the token's label.
pub trait EventSource: Sync {
    /// Event number, used in diagnostics.
    fn event_id(&self) -> u64;

    /// Retrieves a cluster collection.
    fn clusters(&self, token: &InputToken<ClusterCollection>) -> Option<&ClusterCollection>;

    /// Retrieves a list of module identifiers (masking source).
    fn module_ids(&self, token: &InputToken<ModuleIdCollection>) -> Option<&ModuleIdCollection>;

    /// Retrieves a skip set.
    fn skip_set(&self, token: &InputToken<SkipSet>) -> Option<&SkipSet>;
}
