//! Result loading, dataset assembly and export for the reconfiguration benchmark evaluations.

mod config;
mod dataset;
mod entity;
mod export;
mod extract;
mod loader;
mod pipeline;
mod schema;
mod serde;

pub use config::{load_config, EvalContext, OutputSpec, ReconConfig, ResultSource};
pub use dataset::{Attachment, Cell, Dataset, Row};
pub use entity::{summarize_entity, EntityOutcome, EntityRecord, EntitySamples};
pub use export::{
    export, write_bundle, ExportBundle, ExportOptions, ScalarSummary, SUMMARY_FILE, SUMMARY_SCHEMA,
};
pub use extract::{
    extractor_for, ClassificationExtractor, ComplexityExtractor, ErrorRateExtractor,
    PacketLossExtractor, RecordExtractor, StrategyExtractor,
};
pub use loader::{FileSelector, RawRecord, RecordContent, ResultLoader};
pub use pipeline::{collect, run, run_all, Collected, RunReport};
pub use schema::{
    AttachmentSpec, ColumnSpec, ComparisonSpec, EvaluationKind, FilePolicy, InputFormat,
    MissingPolicy, SampleSource, ScalarSpec, SchemaDescriptor, SortKey, StrategySpec, SummaryStat,
};

pub use crate::serde::{from_yaml_slice, to_canonical_json_bytes, to_yaml_string};
