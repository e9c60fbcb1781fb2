// src/sink/mod.rs

pub mod archive;
pub mod workbook;

pub use archive::ZipArchiveSink;
pub use workbook::WorkbookSink;

use std::{fs, path::Path};

use crate::error::SinkError;
use crate::process::{AggregateRow, Dataset};

/// Stores raw page bodies, one entry per sequence number.
pub trait RawArchiveSink {
    fn store_page(&mut self, seq: usize, content: &str) -> Result<(), SinkError>;

    /// Flush and close. Further `store_page` calls are an error.
    fn finish(&mut self) -> Result<(), SinkError>;
}

/// Stores the combined dataset and, separately, its aggregate.
pub trait DocumentSink {
    fn write_dataset(&mut self, dataset: &Dataset) -> Result<(), SinkError>;

    /// Replaces any earlier aggregate output.
    fn write_aggregate(&mut self, rows: &[AggregateRow]) -> Result<(), SinkError>;
}

pub(crate) fn ensure_parent(path: &Path) -> Result<(), SinkError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| SinkError::Io {
                path: parent.display().to_string(),
                source,
            })
        }
        _ => Ok(()),
    }
}
