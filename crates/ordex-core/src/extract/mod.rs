//! Extraction stages: each one reads the raw document independently.

pub mod dates;
pub mod entities;
pub mod form;
pub mod patterns;
pub mod table;
pub mod text;

pub use dates::{extract_dates, normalize_date, DateExtractor, DateKind};
pub use entities::{EntityGroup, EntityGrouper, GroupedEntities};
pub use form::FormFieldMapper;
pub use table::{MappedColumns, TableColumnMapper, TableRecord};
pub use text::{TextFieldExtractor, TextFields};

/// Trait for regex-driven field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// An extracted value with the text it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Byte range in the source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, source: impl Into<String>) -> Self {
        Self {
            value,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }

    /// Start offset, or 0 when the position is unknown.
    pub fn start(&self) -> usize {
        self.position.map(|(start, _)| start).unwrap_or(0)
    }
}
