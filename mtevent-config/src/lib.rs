//! mtevent-config: Configuration adapter for the measurement tracker event producer.
//!
//! Translates the declarative parameter set (labels, boolean switches and
//! era-specific overrides) into immutable [`ProducerConfig`] values and then
//! into typed [`ResolvedBindings`].
//!
//! # Eras
//!
//! Era selection is a pure function, [`ProducerConfig::for_era`]. Named
//! variants such as the pre-splitting instance are derived with the builder
//! rather than patched after the fact.

mod era;
mod error;
mod process;
mod producer;
mod resolve;

pub use era::Era;
pub use error::{Error, Result};
pub use process::ProcessConfig;
pub use producer::{
    standard_instances, NamedConfig, ProducerConfig, ProducerConfigBuilder, DEFAULT_INSTANCE,
    PRE_SPLITTING_INSTANCE,
};
pub use resolve::{resolve, ResolvedBindings};
