// src/process/table.rs

use scraper::{ElementRef, Html, Selector};
use tracing::trace;

use super::Table;
use crate::error::ParseError;

/// Extracts the first table matching a marker selector.
#[derive(Debug, Clone)]
pub struct TableParser {
    table: Selector,
    row: Selector,
    header_cell: Selector,
    data_cell: Selector,
}

impl Default for TableParser {
    fn default() -> Self {
        Self::new("table.table").expect("static selector")
    }
}

impl TableParser {
    pub fn new(table_selector: &str) -> Result<Self, ParseError> {
        let table = Selector::parse(table_selector)
            .map_err(|e| ParseError::new(format!("selector '{}': {:?}", table_selector, e)))?;
        Ok(Self {
            table,
            row: Selector::parse("tr").expect("static selector"),
            header_cell: Selector::parse("th").expect("static selector"),
            data_cell: Selector::parse("td").expect("static selector"),
        })
    }

    /// Header from the first row's `th` cells, rows from every later row's
    /// `td` cells. Rows with no `td` at all are spacer rows and are dropped.
    pub fn parse(&self, content: &str) -> Result<Table, ParseError> {
        let doc = Html::parse_document(content);
        let table = doc
            .select(&self.table)
            .next()
            .ok_or_else(|| ParseError::new("no element matches the table selector"))?;

        let mut trs = table.select(&self.row);
        let headers = match trs.next() {
            Some(first) => first.select(&self.header_cell).map(cell_text).collect(),
            None => return Err(ParseError::new("table has no rows")),
        };

        let rows: Vec<Vec<String>> = trs
            .map(|tr| tr.select(&self.data_cell).map(cell_text).collect::<Vec<_>>())
            .filter(|cells| !cells.is_empty())
            .collect();

        trace!(columns = ?headers, rows = rows.len(), "parsed table");
        Ok(Table { headers, rows })
    }
}

fn cell_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}
