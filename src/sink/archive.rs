// src/sink/archive.rs

use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{debug, info};
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

use super::{ensure_parent, RawArchiveSink};
use crate::error::SinkError;

/// Writes every page as `<seq>.html` into one zip file.
pub struct ZipArchiveSink {
    path: PathBuf,
    writer: Option<ZipWriter<File>>,
    entries: usize,
}

impl ZipArchiveSink {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        ensure_parent(&path)?;
        let file = File::create(&path).map_err(|source| SinkError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self {
            path,
            writer: Some(ZipWriter::new(file)),
            entries: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn finished(path: &Path) -> SinkError {
    SinkError::Io {
        path: path.display().to_string(),
        source: std::io::Error::new(std::io::ErrorKind::Other, "archive already finished"),
    }
}

impl RawArchiveSink for ZipArchiveSink {
    fn store_page(&mut self, seq: usize, content: &str) -> Result<(), SinkError> {
        let zip = self
            .writer
            .as_mut()
            .ok_or_else(|| finished(&self.path))?;
        let options: FileOptions<'_, ()> =
            FileOptions::default().compression_method(CompressionMethod::Deflated);
        let name = format!("{}.html", seq);
        zip.start_file(name.as_str(), options)?;
        zip.write_all(content.as_bytes())
            .map_err(|source| SinkError::Io {
                path: self.path.display().to_string(),
                source,
            })?;
        self.entries += 1;
        debug!(entry = %name, bytes = content.len(), "archived page");
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        let zip = self.writer.take().ok_or_else(|| finished(&self.path))?;
        zip.finish()?;
        info!(path = %self.path.display(), entries = self.entries, "archive written");
        Ok(())
    }
}
