//! mtevent-io: Event-data transport and file readers for mtevent.
//!
//! [`EventData`] is the in-memory event store that the producer reads its
//! inputs from. Geometry and event files are JSON, read through memory
//! maps via memmap2.
//!

mod error;
pub mod events;
pub mod geometry;
mod reader;
mod store;

pub use error::{Error, Result};
pub use events::load_events;
pub use geometry::load_geometry;
pub use reader::MappedFileReader;
pub use store::EventData;
