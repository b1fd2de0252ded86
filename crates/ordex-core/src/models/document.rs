//! Document-understanding result as produced by the document-AI service.
//!
//! The shapes follow the service's JSON encoding (camelCase keys, 64-bit
//! offsets encoded as strings), so a stored response can be deserialized
//! directly with `serde_json`.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DocumentError;

/// Full document-understanding result for one input file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDocument {
    /// Full recognized text. Every text anchor indexes into this string.
    pub text: String,

    /// Pages in document order.
    pub pages: Vec<Page>,

    /// Labeled entities in document order.
    pub entities: Vec<Entity>,
}

/// A single page with its detected structures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Page {
    /// Detected tables.
    pub tables: Vec<Table>,

    /// Detected label/value pairs.
    pub form_fields: Vec<FormField>,
}

/// A detected table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Table {
    pub header_rows: Vec<TableRow>,
    pub body_rows: Vec<TableRow>,
}

impl Table {
    /// Check if the table has at least one header row.
    pub fn has_headers(&self) -> bool {
        !self.header_rows.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableCell {
    pub layout: Layout,
}

/// A form field: label layout plus value layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormField {
    pub field_name: Layout,
    pub field_value: Layout,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Layout {
    pub text_anchor: TextAnchor,
}

/// Reference into [`RawDocument::text`] made of one or more segments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextAnchor {
    pub text_segments: Vec<TextSegment>,
}

/// Half-open character range `[start_index, end_index)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSegment {
    #[serde(default, deserialize_with = "de_index")]
    pub start_index: usize,
    #[serde(default, deserialize_with = "de_index")]
    pub end_index: usize,
}

impl TextSegment {
    pub fn new(start_index: usize, end_index: usize) -> Self {
        Self {
            start_index,
            end_index,
        }
    }
}

/// An entity labeled by the document-AI extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Entity {
    /// Entity type as labeled by the extractor (e.g. `Product_Code`).
    #[serde(rename = "type")]
    pub entity_type: String,

    /// Text of the mention.
    pub mention_text: String,

    /// Confidence in `[0, 1]`.
    pub confidence: f64,
}

impl Entity {
    pub fn new(entity_type: impl Into<String>, mention_text: impl Into<String>, confidence: f64) -> Self {
        Self {
            entity_type: entity_type.into(),
            mention_text: mention_text.into(),
            confidence,
        }
    }
}

impl RawDocument {
    /// Text of a single segment, clamped to the document bounds.
    pub fn segment_text(&self, segment: &TextSegment) -> &str {
        slice_chars(&self.text, segment.start_index, segment.end_index)
    }

    /// Concatenated, trimmed text of every segment in the anchor.
    pub fn anchor_text(&self, anchor: &TextAnchor) -> String {
        let mut text = String::new();
        for segment in &anchor.text_segments {
            text.push_str(self.segment_text(segment));
        }
        text.trim().to_string()
    }

    /// Trimmed text of the first segment only (empty if the anchor has none).
    pub fn first_segment_text(&self, anchor: &TextAnchor) -> String {
        anchor
            .text_segments
            .first()
            .map(|s| self.segment_text(s).trim().to_string())
            .unwrap_or_default()
    }

    /// Iterate over every table in page order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.pages.iter().flat_map(|p| p.tables.iter())
    }

    /// Iterate over every form field in page order.
    pub fn form_fields(&self) -> impl Iterator<Item = &FormField> {
        self.pages.iter().flat_map(|p| p.form_fields.iter())
    }

    /// Load a stored document-AI result from a JSON file.
    ///
    /// Accepts either a bare document or a `{"document": {...}}` envelope
    /// as returned by the `:process` endpoint.
    pub fn from_file(path: &Path) -> Result<Self, DocumentError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a document from JSON text (bare or enveloped).
    pub fn from_json(content: &str) -> Result<Self, DocumentError> {
        let value: serde_json::Value =
            serde_json::from_str(content).map_err(|e| DocumentError::Malformed(e.to_string()))?;
        let document = match value.get("document") {
            Some(inner) if inner.is_object() => inner.clone(),
            _ => value,
        };
        serde_json::from_value(document).map_err(|e| DocumentError::Malformed(e.to_string()))
    }
}

/// Input media types accepted by the document-AI service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeType {
    Pdf,
    Png,
    Jpeg,
}

impl MimeType {
    /// Guess the media type from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "pdf" => Ok(MimeType::Pdf),
            "png" => Ok(MimeType::Png),
            "jpg" | "jpeg" | "jpe" => Ok(MimeType::Jpeg),
            "" => Err(DocumentError::UnsupportedFormat(format!(
                "{} has no file extension",
                path.display()
            ))),
            other => Err(DocumentError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MimeType::Pdf => "application/pdf",
            MimeType::Png => "image/png",
            MimeType::Jpeg => "image/jpeg",
        }
    }
}

impl std::fmt::Display for MimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Slice `text` by character offsets, truncating out-of-range bounds.
fn slice_chars(text: &str, start: usize, end: usize) -> &str {
    if end <= start {
        return "";
    }
    if text.is_ascii() {
        let end = end.min(text.len());
        return text.get(start.min(end)..end).unwrap_or("");
    }

    let byte_at = |n: usize| {
        text.char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .nth(n)
    };

    match (byte_at(start), byte_at(end)) {
        (Some(begin), Some(finish)) => &text[begin..finish],
        (Some(begin), None) => &text[begin..],
        _ => "",
    }
}

fn de_index<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Index {
        Number(u64),
        Text(String),
    }

    match Index::deserialize(deserializer)? {
        Index::Number(n) => Ok(n as usize),
        Index::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_service_json() {
        let json = r#"{
            "document": {
                "text": "PO Number: 42\n",
                "pages": [{
                    "formFields": [{
                        "fieldName": {"textAnchor": {"textSegments": [{"endIndex": "10"}]}},
                        "fieldValue": {"textAnchor": {"textSegments": [{"startIndex": "11", "endIndex": 13}]}}
                    }]
                }],
                "entities": [{"type": "PO_No", "mentionText": "42", "confidence": 0.87}]
            }
        }"#;

        let doc = RawDocument::from_json(json).unwrap();
        let field = doc.form_fields().next().unwrap();

        assert_eq!(doc.first_segment_text(&field.field_name.text_anchor), "PO Number:");
        assert_eq!(doc.first_segment_text(&field.field_value.text_anchor), "42");
        assert_eq!(doc.entities[0].entity_type, "PO_No");
    }

    #[test]
    fn test_anchor_text_concatenates_segments() {
        let doc = RawDocument {
            text: "Order Qty extra".to_string(),
            ..Default::default()
        };
        let anchor = TextAnchor {
            text_segments: vec![TextSegment::new(0, 6), TextSegment::new(6, 9)],
        };

        assert_eq!(doc.anchor_text(&anchor), "Order Qty");
    }

    #[test]
    fn test_segment_offsets_are_characters() {
        let doc = RawDocument {
            text: "Café Nº 7".to_string(),
            ..Default::default()
        };

        assert_eq!(doc.segment_text(&TextSegment::new(5, 7)), "Nº");
        assert_eq!(doc.segment_text(&TextSegment::new(8, 100)), "7");
        assert_eq!(doc.segment_text(&TextSegment::new(4, 2)), "");
    }

    #[test]
    fn test_mime_type_from_path() {
        assert_eq!(MimeType::from_path(Path::new("a/order.PDF")).unwrap(), MimeType::Pdf);
        assert_eq!(MimeType::from_path(Path::new("scan.jpg")).unwrap(), MimeType::Jpeg);
        assert!(matches!(
            MimeType::from_path(Path::new("order.xlsx")),
            Err(DocumentError::UnsupportedFormat(_))
        ));
        assert!(MimeType::from_path(Path::new("README")).is_err());
    }
}
