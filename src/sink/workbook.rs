// src/sink/workbook.rs

use std::path::{Path, PathBuf};
use tracing::info;
use umya_spreadsheet::{reader, writer, Spreadsheet, Worksheet};

use super::{ensure_parent, DocumentSink};
use crate::config::{AggregateConfig, OutputConfig};
use crate::error::SinkError;
use crate::process::{AggregateRow, Dataset};

/// `.xlsx` workbook with a dataset sheet and an aggregate sheet.
#[derive(Debug, Clone)]
pub struct WorkbookSink {
    path: PathBuf,
    dataset_sheet: String,
    aggregate_sheet: String,
    aggregate_header: Vec<String>,
}

impl WorkbookSink {
    pub fn new(output: &OutputConfig, aggregate: &AggregateConfig) -> Self {
        Self {
            path: output.workbook_path.clone(),
            dataset_sheet: output.dataset_sheet.clone(),
            aggregate_sheet: output.aggregate_sheet.clone(),
            aggregate_header: aggregate.header.clone(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn err(&self, message: impl ToString) -> SinkError {
        SinkError::Workbook {
            path: self.path.display().to_string(),
            message: message.to_string(),
        }
    }

    fn save(&self, book: &Spreadsheet) -> Result<(), SinkError> {
        ensure_parent(&self.path)?;
        writer::xlsx::write(book, &self.path).map_err(|e| self.err(e))
    }
}

impl DocumentSink for WorkbookSink {
    /// Starts a fresh workbook holding only the dataset sheet.
    fn write_dataset(&mut self, dataset: &Dataset) -> Result<(), SinkError> {
        let mut book = umya_spreadsheet::new_file_empty_worksheet();
        let sheet = book
            .new_sheet(self.dataset_sheet.as_str())
            .map_err(|e| self.err(e))?;

        write_text_row(sheet, 1, &dataset.headers);
        for (i, row) in dataset.rows.iter().enumerate() {
            write_text_row(sheet, i as u32 + 2, row);
        }

        self.save(&book)?;
        info!(
            path = %self.path.display(),
            sheet = %self.dataset_sheet,
            rows = dataset.rows.len(),
            "workbook created"
        );
        Ok(())
    }

    /// Drops the aggregate sheet if present and writes it again.
    fn write_aggregate(&mut self, rows: &[AggregateRow]) -> Result<(), SinkError> {
        let mut book = if self.path.exists() {
            reader::xlsx::read(&self.path).map_err(|e| self.err(e))?
        } else {
            umya_spreadsheet::new_file_empty_worksheet()
        };

        if book.get_sheet_by_name(&self.aggregate_sheet).is_some() {
            book.remove_sheet_by_name(&self.aggregate_sheet)
                .map_err(|e| self.err(e))?;
        }
        let sheet = book
            .new_sheet(self.aggregate_sheet.as_str())
            .map_err(|e| self.err(e))?;

        write_text_row(sheet, 1, &self.aggregate_header);
        for (i, agg) in rows.iter().enumerate() {
            let r = i as u32 + 2;
            sheet.get_cell_mut((1u32, r)).set_value(agg.group.as_str());
            sheet.get_cell_mut((2u32, r)).set_value(agg.winner_label.as_str());
            sheet
                .get_cell_mut((3u32, r))
                .set_value_number(agg.winner_value as f64);
            sheet.get_cell_mut((4u32, r)).set_value(agg.loser_label.as_str());
            sheet
                .get_cell_mut((5u32, r))
                .set_value_number(agg.loser_value as f64);
        }

        self.save(&book)?;
        info!(sheet = %self.aggregate_sheet, groups = rows.len(), "aggregate sheet written");
        Ok(())
    }
}

fn write_text_row(sheet: &mut Worksheet, row: u32, cells: &[String]) {
    for (col, value) in cells.iter().enumerate() {
        sheet
            .get_cell_mut((col as u32 + 1, row))
            .set_value(value.as_str());
    }
}
