//! Error types for mtevent-core.

use crate::module::{ModuleId, ModuleKind};
use thiserror::Error;

/// Result type alias for measurement tracker operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for measurement tracker operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A cluster or lookup references a module absent from the registry.
    #[error("unknown module {0}")]
    UnknownModule(ModuleId),

    /// The same module identifier appears twice in a geometry description.
    #[error("duplicate module {0} in registry")]
    DuplicateModule(ModuleId),

    /// A cluster was found in a collection of the wrong detector kind.
    #[error("module {id} is a {found} module but was found in a {expected} cluster collection")]
    KindMismatch {
        /// Owning module of the offending cluster.
        id: ModuleId,
        /// Kind of the collection being ingested.
        expected: ModuleKind,
        /// Kind recorded in the registry.
        found: ModuleKind,
    },

    /// A configured input label has no collection in the event.
    #[error("missing collection '{label}'")]
    MissingCollection {
        /// The configured label.
        label: String,
    },

    /// Configuration cannot be resolved into a consistent set of bindings.
    #[error("configuration inconsistency: {0}")]
    ConfigurationInconsistency(String),

    /// Measurements were requested for a module masked in this event.
    #[error("module {0} is inactive for this event")]
    ModuleInactive(ModuleId),

    /// The `measurementTracker` option names a registry that is not loaded.
    #[error("unknown measurement tracker '{0}'")]
    UnknownMeasurementTracker(String),

    /// Two snapshots were published under the same name in one event.
    #[error("product '{0}' already published for this event")]
    DuplicateProduct(String),
}
