// src/lib.rs
pub mod collect;
pub mod config;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod process;
pub mod sink;

pub use collect::{Collection, Collector, PageOutcome, RunSummary};
pub use config::PipelineConfig;
pub use error::PipelineError;
pub use pipeline::{Pipeline, RunReport};
