// src/process/mod.rs

pub mod aggregate;
pub mod table;

pub use aggregate::aggregate;
pub use table::TableParser;

/// One page's table as parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Text of the header cells in the first row.
    pub headers: Vec<String>,
    /// Each later row with at least one data cell, one String per cell.
    pub rows: Vec<Vec<String>>,
}

/// All pages combined under one canonical header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Extremes of one group: the largest and smallest value with their labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRow {
    pub group: String,
    pub winner_label: String,
    pub winner_value: i64,
    pub loser_label: String,
    pub loser_value: i64,
}
