//! mtevent-builder: Per-event assembly of the measurement tracker event.
//!
//! This crate implements the event-time pipeline:
//! - **Inactive set** - merges masking sources, the empty-pixel switch-off
//!   policy and conditions-flagged bad modules
//! - **Ingestion** - groups clusters by module, dropping skipped clusters and
//!   clusters on inactive modules
//! - **Snapshot** - the total, read-only module → measurements index
//! - **Producer** - runs the above once per event, in parallel across events
//!
#![warn(missing_docs)]

mod inactive;
mod ingest;
mod producer;
mod snapshot;

pub use inactive::{InactiveSet, InactiveSetBuilder};
pub use ingest::{ingest, ClusterInput, IngestStatistics, ModuleClusters};
pub use producer::{MeasurementTrackerEventProducer, Published};
pub use snapshot::{
    assemble, KindSummary, MeasurementTrackerEvent, ModuleMeasurements, SnapshotSummary,
};

// Re-export core types used in the public API
pub use mtevent_core::{Error, Result};
