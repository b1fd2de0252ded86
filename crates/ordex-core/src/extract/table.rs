//! Mapping of detected table columns onto a customer's canonical column names.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::models::config::HeaderMatchPriority;
use crate::models::customer::{canonical, FieldMapping, TABLE_COLUMNS};
use crate::models::document::{RawDocument, Table};

/// One body row keyed by header text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRecord {
    cells: HashMap<String, String>,
}

impl TableRecord {
    /// Zip headers with cell texts; missing cells read as empty, extra
    /// cells are dropped. A repeated header keeps its last cell.
    pub fn new(headers: &[String], cells: Vec<String>) -> Self {
        let mut padded = cells;
        if padded.len() < headers.len() {
            padded.resize(headers.len(), String::new());
        }
        Self {
            cells: headers.iter().cloned().zip(padded).collect(),
        }
    }

    /// Cell text under `header`, empty when absent.
    pub fn get(&self, header: &str) -> &str {
        self.cells.get(header).map(String::as_str).unwrap_or("")
    }
}

/// Column-oriented table data: canonical name → row values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MappedColumns {
    columns: Vec<(String, Vec<String>)>,
}

impl MappedColumns {
    pub fn get(&self, canonical_name: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .find(|(name, _)| name == canonical_name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Canonical names in first-matched header order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Check that every table column is present with at least one value.
    pub fn is_complete(&self) -> bool {
        TABLE_COLUMNS
            .iter()
            .all(|name| self.get(name).is_some_and(|values| !values.is_empty()))
    }

    fn push(&mut self, canonical_name: &str, value: String) {
        match self.columns.iter_mut().find(|(name, _)| name == canonical_name) {
            Some((_, values)) => values.push(value),
            None => self.columns.push((canonical_name.to_string(), vec![value])),
        }
    }

    fn declare(&mut self, canonical_name: &str) {
        if self.get(canonical_name).is_none() {
            self.columns.push((canonical_name.to_string(), Vec::new()));
        }
    }

    fn has_values(&self) -> bool {
        self.columns.iter().any(|(_, values)| !values.is_empty())
    }
}

/// Maps the first usable table in a document onto canonical column names.
#[derive(Debug, Clone)]
pub struct TableColumnMapper {
    /// Table-column entries with indexed labels folded.
    table_mapping: FieldMapping,
    /// Same entries keyed by trimmed, lower-cased label.
    lower_mapping: FieldMapping,
    priority: HeaderMatchPriority,
}

impl TableColumnMapper {
    pub fn new(mapping: &FieldMapping) -> Self {
        let table_mapping = mapping.table_entries();
        let mut lower_mapping = FieldMapping::new();
        for (label, canonical_name) in table_mapping.iter() {
            lower_mapping.insert(label.trim().to_lowercase(), canonical_name);
        }
        Self {
            table_mapping,
            lower_mapping,
            priority: HeaderMatchPriority::default(),
        }
    }

    /// Set the header matching priority.
    pub fn with_priority(mut self, priority: HeaderMatchPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Map the first table (in page order) that has header rows and yields
    /// at least one row with a quantity. Empty when no table qualifies.
    pub fn map(&self, document: &RawDocument) -> MappedColumns {
        for (index, table) in document.tables().enumerate() {
            if !table.has_headers() {
                continue;
            }

            let columns = self.map_table(document, table);
            if columns.has_values() {
                info!(
                    table = index,
                    columns = ?columns.names().collect::<Vec<_>>(),
                    "Mapped table columns"
                );
                return columns;
            }
            debug!(table = index, "Table produced no mapped rows");
        }

        debug!("No matched table headers found");
        MappedColumns::default()
    }

    /// Canonical column for a header, according to the configured priority.
    pub fn match_header(&self, header: &str) -> Option<&str> {
        let normalized = header.trim().to_lowercase();
        let candidates = self
            .lower_mapping
            .iter()
            .filter(|(label, _)| !label.is_empty() && normalized.contains(label));

        match self.priority {
            HeaderMatchPriority::MappingOrder => candidates.map(|(_, c)| c).next(),
            HeaderMatchPriority::LongestKey => candidates
                .fold(None, |best: Option<(&str, &str)>, (label, c)| match best {
                    Some((best_label, _)) if best_label.len() >= label.len() => best,
                    _ => Some((label, c)),
                })
                .map(|(_, c)| c),
        }
    }

    fn map_table(&self, document: &RawDocument, table: &Table) -> MappedColumns {
        let headers = header_texts(document, table);
        debug!(?headers, "Extracted table headers");

        let rows: Vec<TableRecord> = table
            .body_rows
            .iter()
            .map(|row| {
                let cells = row
                    .cells
                    .iter()
                    .map(|cell| document.anchor_text(&cell.layout.text_anchor))
                    .collect();
                TableRecord::new(&headers, cells)
            })
            .collect();

        let mut matched: Vec<(&str, &str)> = Vec::new();
        for header in &headers {
            if matched.iter().any(|(h, _)| *h == header.as_str()) {
                continue;
            }
            if let Some(canonical_name) = self.match_header(header) {
                matched.push((header.as_str(), canonical_name));
            }
        }

        let mut columns = MappedColumns::default();
        if matched.is_empty() {
            return columns;
        }

        let Some(quantity_header) = self.quantity_header(&headers) else {
            debug!("No quantity column resolved; every row is discarded");
            return columns;
        };

        for (_, canonical_name) in &matched {
            columns.declare(canonical_name);
        }
        for row in rows.iter().filter(|r| !r.get(quantity_header).trim().is_empty()) {
            for (header, canonical_name) in &matched {
                columns.push(canonical_name, row.get(header).trim().to_string());
            }
        }

        columns
    }

    /// The header holding quantities: the one equal to the label mapped to
    /// `Quantity`. A header that only contains the label does not count.
    fn quantity_header<'h>(&self, headers: &'h [String]) -> Option<&'h str> {
        let label = self.table_mapping.label_for(canonical::QUANTITY)?.trim();
        headers.iter().map(String::as_str).find(|h| *h == label)
    }
}

/// Header text per column: non-empty cell texts of every header row,
/// joined by a space.
pub fn header_texts(document: &RawDocument, table: &Table) -> Vec<String> {
    let Some(first) = table.header_rows.first() else {
        return Vec::new();
    };

    (0..first.cells.len())
        .map(|col| {
            let parts: Vec<String> = table
                .header_rows
                .iter()
                .filter_map(|row| row.cells.get(col))
                .map(|cell| document.anchor_text(&cell.layout.text_anchor))
                .filter(|text| !text.is_empty())
                .collect();
            parts.join(" ").trim().to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::{Layout, Page, TableCell, TableRow, TextAnchor, TextSegment};
    use pretty_assertions::assert_eq;

    /// Builds a one-page document from header rows and body rows of cell text.
    struct DocBuilder {
        text: String,
    }

    impl DocBuilder {
        fn new() -> Self {
            Self { text: String::new() }
        }

        fn row(&mut self, cells: &[&str]) -> TableRow {
            TableRow {
                cells: cells
                    .iter()
                    .map(|cell| {
                        let start = self.text.len();
                        self.text.push_str(cell);
                        let end = self.text.len();
                        self.text.push('\t');
                        TableCell {
                            layout: Layout {
                                text_anchor: TextAnchor {
                                    text_segments: vec![TextSegment::new(start, end)],
                                },
                            },
                        }
                    })
                    .collect(),
            }
        }

        fn table(&mut self, headers: &[&[&str]], body: &[&[&str]]) -> Table {
            Table {
                header_rows: headers.iter().map(|r| self.row(r)).collect(),
                body_rows: body.iter().map(|r| self.row(r)).collect(),
            }
        }

        fn build(self, tables: Vec<Table>) -> RawDocument {
            RawDocument {
                text: self.text,
                pages: vec![Page {
                    tables,
                    form_fields: Vec::new(),
                }],
                entities: Vec::new(),
            }
        }
    }

    fn customer_mapping() -> FieldMapping {
        FieldMapping::new()
            .with("PO Date", "Order Date")
            .with("Hygenol Product Code", "Product Code")
            .with("Supplier Code", "Supplier Code")
            .with("Description", "Description")
            .with("Order Qty", "Quantity")
            .with("Supplier Pack size", "Price")
    }

    #[test]
    fn test_multi_row_headers_and_quantity_filter() {
        let mut b = DocBuilder::new();
        let table = b.table(
            &[
                &["Hygenol", "Supplier Code", "Description", "Order", "Supplier"],
                &["Product Code", "", "", "Qty", "Pack size"],
            ],
            &[
                &["H-100", "S1", "Blue roll", "4", "6"],
                &["H-200", "S2", "Gloves", "", "10"],
                &["H-300", "S3", "Bin bags", "12"],
            ],
        );
        let doc = b.build(vec![table]);

        let columns = TableColumnMapper::new(&customer_mapping()).map(&doc);

        assert_eq!(columns.get("Product Code").unwrap(), ["H-100", "H-300"]);
        assert_eq!(columns.get("Quantity").unwrap(), ["4", "12"]);
        assert_eq!(columns.get("Price").unwrap(), ["6", ""]);
        assert_eq!(columns.get("Description").unwrap(), ["Blue roll", "Bin bags"]);
        assert!(columns.is_complete());
    }

    #[test]
    fn test_unmatched_headers_give_empty_mapping() {
        let mut b = DocBuilder::new();
        let table = b.table(&[&["Item", "Units"]], &[&["Soap", "3"]]);
        let doc = b.build(vec![table]);

        let columns = TableColumnMapper::new(&customer_mapping()).map(&doc);

        assert!(columns.is_empty());
    }

    #[test]
    fn test_tables_without_headers_are_skipped() {
        let mut b = DocBuilder::new();
        let headerless = b.table(&[], &[&["x", "y"]]);
        let table = b.table(&[&["Description", "Order Qty"]], &[&["Soap", "3"]]);
        let doc = b.build(vec![headerless, table]);

        let columns = TableColumnMapper::new(&customer_mapping()).map(&doc);

        assert_eq!(columns.get("Description").unwrap(), ["Soap"]);
        assert!(!columns.is_complete());
    }

    #[test]
    fn test_first_mapping_key_wins_for_ambiguous_header() {
        let mapping = FieldMapping::new()
            .with("Code", "Supplier Code")
            .with("Product Code", "Product Code");

        let mapper = TableColumnMapper::new(&mapping);

        assert_eq!(mapper.match_header("Product Code"), Some("Supplier Code"));
    }

    #[test]
    fn test_longest_key_priority() {
        let mapping = FieldMapping::new()
            .with("Code", "Supplier Code")
            .with("Product Code", "Product Code");

        let mapper = TableColumnMapper::new(&mapping).with_priority(HeaderMatchPriority::LongestKey);

        assert_eq!(mapper.match_header("PRODUCT CODE (EAN)"), Some("Product Code"));
        assert_eq!(mapper.match_header("Supplier code"), Some("Supplier Code"));
        assert_eq!(mapper.match_header("Qty"), None);
    }

    #[test]
    fn test_quantity_header_must_equal_mapped_label() {
        let mut b = DocBuilder::new();
        let table = b.table(
            &[&["Description", "Order Qty (EA)"]],
            &[&["Soap", "3"], &["Sponge", ""]],
        );
        let doc = b.build(vec![table]);

        let columns = TableColumnMapper::new(&customer_mapping()).map(&doc);

        assert!(columns.is_empty());
        assert!(columns.get("Quantity").is_none());
    }

    #[test]
    fn test_record_pads_missing_cells() {
        let headers = vec!["A".to_string(), "B".to_string()];
        let record = TableRecord::new(&headers, vec!["1".to_string()]);

        assert_eq!(record.get("A"), "1");
        assert_eq!(record.get("B"), "");
        assert_eq!(record.get("C"), "");
    }
}
