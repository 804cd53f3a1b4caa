//! Tabular export of search hits.

use indexmap::IndexMap;
use serde::Serialize;

use crate::hit::aggregator::SearchHit;

/// Separator between multiple values of one field in a cell.
pub const VALUE_SEPARATOR: &str = ", ";

/// Hits flattened into rows of configured fields.
///
/// Rendering (spreadsheet, CSV) is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportTable {
    /// Header line naming the query the hits came from.
    pub query_line: String,
    pub fields: Vec<String>,
    /// One field to value map per hit, in field order.
    pub rows: Vec<IndexMap<String, String>>,
}

impl ExportTable {
    /// Build the table for the hits of a search for `query`.
    pub fn new(query: &str, fields: &[String], hits: &[SearchHit]) -> Self {
        let rows = hits
            .iter()
            .map(|hit| {
                fields
                    .iter()
                    .map(|field| {
                        let value = hit.document().values(field).join(VALUE_SEPARATOR);
                        (field.clone(), value)
                    })
                    .collect()
            })
            .collect();

        ExportTable {
            query_line: format!("Query: {query}"),
            fields: fields.to_vec(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All lines of the table: query line, field header, then the hits.
    pub fn to_lines(&self) -> Vec<Vec<String>> {
        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(vec![self.query_line.clone()]);
        lines.push(self.fields.clone());
        for row in &self.rows {
            lines.push(row.values().cloned().collect());
        }
        lines
    }
}
