#![deny(missing_docs)]
#![doc = "Shared error taxonomy and provenance records for the reconfiguration evaluation pipeline."]

pub mod errors;
pub mod provenance;

pub use errors::{ErrorInfo, ReconError};
pub use provenance::{RunProvenance, SchemaVersion};
