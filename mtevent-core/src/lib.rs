//! mtevent-core: Core types for the per-event measurement tracker.
//!
//! This crate provides the detector-module identifiers, the geometry-derived
//! [`ModuleRegistry`], the cluster collections produced upstream, and the
//! narrow [`EventSource`] interface through which an event's collections are
//! retrieved.
//!

pub mod cluster;
pub mod error;
pub mod event;
pub mod module;
pub mod registry;

pub use cluster::{Cluster, ClusterCollection, ClusterRef, ModuleIdCollection, ProductId, SkipSet};
pub use error::{Error, Result};
pub use event::{EventSource, InputToken};
pub use module::{ModuleId, ModuleInfo, ModuleKind, Subdetector};
pub use registry::{ModuleRegistry, RegistryCatalog};
