//! Mapping of document form fields onto a customer's scalar field names.

use std::collections::HashMap;

use tracing::debug;

use crate::models::customer::{canonical, FieldMapping};
use crate::models::document::RawDocument;
use crate::models::order::ScalarFields;

/// Strip surrounding whitespace and trailing colons from a label.
pub fn normalize_label(label: &str) -> &str {
    label.trim().trim_end_matches(':').trim()
}

/// Exact-label matcher from form fields to scalar canonical names.
#[derive(Debug, Clone)]
pub struct FormFieldMapper {
    /// Normalized label → canonical name.
    index: HashMap<String, String>,
}

impl FormFieldMapper {
    /// Build the label index from the scalar part of `mapping`.
    pub fn new(mapping: &FieldMapping) -> Self {
        let index = mapping
            .scalar_entries()
            .map(|(label, canonical_name)| {
                (normalize_label(label).to_string(), canonical_name.to_string())
            })
            .collect();
        Self { index }
    }

    /// Canonical name for a raw document label, if the customer maps it.
    pub fn canonical_for(&self, label: &str) -> Option<&str> {
        self.index.get(normalize_label(label)).map(String::as_str)
    }

    /// Collect every mapped form field. Later fields overwrite earlier ones.
    pub fn map(&self, document: &RawDocument) -> ScalarFields {
        let mut fields = ScalarFields::default();

        for field in document.form_fields() {
            let label = document.first_segment_text(&field.field_name.text_anchor);
            let Some(canonical_name) = self.canonical_for(&label) else {
                continue;
            };
            let value = document.first_segment_text(&field.field_value.text_anchor);

            match canonical_name {
                canonical::ORDER_NUMBER => fields.order_number = Some(value),
                canonical::ORDER_DATE => fields.order_date = Some(value),
                canonical::DELIVERY_DATE => fields.delivery_date = Some(value),
                canonical::EMAIL => fields.email = Some(value),
                other => {
                    fields.other.insert(other.to_string(), value);
                }
            }
        }

        debug!(?fields, "Mapped form fields");
        fields
    }
}
