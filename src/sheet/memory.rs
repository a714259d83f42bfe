#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{CellWrite, SheetError, SheetSnapshot, SheetStore};

/// A sheet held entirely in memory.
#[derive(Debug, Default)]
pub struct MemorySheet {
    /// Display name.
    title: String,
    /// Rows of cells; row 0 is the header.
    grid:  Mutex<Vec<Vec<String>>>,
}

impl MemorySheet {
    /// Creates a sheet from rows of cells.
    pub fn new<R, C>(title: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let grid = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        Self {
            title: title.into(),
            grid:  Mutex::new(grid),
        }
    }

    /// Locks the grid, recovering from a poisoned lock.
    fn lock(&self) -> MutexGuard<'_, Vec<Vec<String>>> {
        self.grid.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a copy of the current grid.
    pub fn grid(&self) -> Vec<Vec<String>> {
        self.lock().clone()
    }

    /// Returns a cell's value, `None` when outside the grid.
    pub fn cell(&self, row: usize, column: usize) -> Option<String> {
        self.lock().get(row).and_then(|r| r.get(column)).cloned()
    }

    /// Applies writes to the grid, padding short rows and missing rows with
    /// empty cells.
    pub fn apply(&self, cells: &[CellWrite]) {
        let mut grid = self.lock();
        for write in cells {
            if grid.len() <= write.row {
                grid.resize_with(write.row + 1, Vec::new);
            }
            let row = &mut grid[write.row];
            if row.len() <= write.column {
                row.resize(write.column + 1, String::new());
            }
            row[write.column] = write.value.clone();
        }
    }
}

#[async_trait]
impl SheetStore for MemorySheet {
    async fn title(&self) -> Result<String, SheetError> {
        Ok(self.title.clone())
    }

    async fn read_all(&self) -> Result<SheetSnapshot, SheetError> {
        Ok(SheetSnapshot::from_grid(self.grid()))
    }

    async fn write_cells(&self, cells: &[CellWrite]) -> Result<(), SheetError> {
        self.apply(cells);
        Ok(())
    }
}
