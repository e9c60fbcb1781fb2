// src/process/aggregate.rs

use std::collections::HashMap;

use super::{AggregateRow, Dataset};
use crate::error::AggregateError;

/// Per-group maximum and minimum of `value_col`, labelled by `label_col`.
///
/// Groups come out in first-seen order. Ties keep the earliest row; a group
/// with a single entry has the same winner and loser.
pub fn aggregate(
    dataset: &Dataset,
    group_col: &str,
    label_col: &str,
    value_col: &str,
) -> Result<Vec<AggregateRow>, AggregateError> {
    let index_of = |name: &str| {
        dataset
            .column_index(name)
            .ok_or_else(|| AggregateError::MissingColumn(name.to_string()))
    };
    let group_idx = index_of(group_col)?;
    let label_idx = index_of(label_col)?;
    let value_idx = index_of(value_col)?;

    // group key -> position in `groups`
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<(&str, i64)>)> = Vec::new();

    for (row_no, row) in dataset.rows.iter().enumerate() {
        let cell = |idx: usize, column: &str| {
            row.get(idx)
                .map(String::as_str)
                .ok_or_else(|| AggregateError::ShortRow {
                    row: row_no,
                    len: row.len(),
                    column: column.to_string(),
                    index: idx,
                })
        };
        let key = cell(group_idx, group_col)?;
        let label = cell(label_idx, label_col)?;
        let text = cell(value_idx, value_col)?;
        let value = text
            .trim()
            .parse::<i64>()
            .map_err(|error| AggregateError::InvalidValue {
                row: row_no,
                column: value_col.to_string(),
                text: text.to_string(),
                error,
            })?;

        let slot = *seen.entry(key).or_insert_with(|| {
            groups.push((key, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push((label, value));
    }

    Ok(groups
        .into_iter()
        .filter_map(|(key, entries)| extremes(key, &entries))
        .collect())
}

fn extremes(key: &str, entries: &[(&str, i64)]) -> Option<AggregateRow> {
    let (first, rest) = entries.split_first()?;
    let (mut hi, mut lo) = (*first, *first);
    for &(label, value) in rest {
        // strict comparisons keep the first occurrence on ties
        if value > hi.1 {
            hi = (label, value);
        }
        if value < lo.1 {
            lo = (label, value);
        }
    }
    Some(AggregateRow {
        group: key.to_string(),
        winner_label: hi.0.to_string(),
        winner_value: hi.1,
        loser_label: lo.0.to_string(),
        loser_value: lo.1,
    })
}
