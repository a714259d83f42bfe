#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{CellWrite, MemorySheet, SheetError, SheetSnapshot, SheetStore};

/// A CSV file used as the sheet. The file is read once on open and rewritten
/// in full after every write.
#[derive(Debug)]
pub struct CsvSheet {
    /// Backing file.
    path:  PathBuf,
    /// Current contents.
    inner: MemorySheet,
}

impl CsvSheet {
    /// Opens `path`, reading every record. Rows may have differing lengths.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SheetError> {
        let path = path.into();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        let title = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            inner: MemorySheet::new(title, rows),
            path,
        })
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the whole grid back to the file.
    fn persist(&self) -> Result<(), SheetError> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;
        for row in self.inner.grid() {
            writer.write_record(&row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[async_trait]
impl SheetStore for CsvSheet {
    async fn title(&self) -> Result<String, SheetError> {
        self.inner.title().await
    }

    async fn read_all(&self) -> Result<SheetSnapshot, SheetError> {
        self.inner.read_all().await
    }

    async fn write_cells(&self, cells: &[CellWrite]) -> Result<(), SheetError> {
        self.inner.apply(cells);
        self.persist()
    }
}
