//! Intermediate and final order records produced by the pipeline stages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// PO number and dates recovered from free text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateInfo {
    pub po_number: String,
    /// `DD/MM/YYYY` when the match could be parsed, the raw match otherwise.
    pub po_date: String,
    pub delivery_date: String,
}

/// Scalar canonical fields found among the document's form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalarFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Customer-specific scalar fields without a fixed role.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub other: BTreeMap<String, String>,
}

impl ScalarFields {
    /// Check if no scalar field was found.
    pub fn is_empty(&self) -> bool {
        self.order_number.is_none()
            && self.order_date.is_none()
            && self.delivery_date.is_none()
            && self.email.is_none()
            && self.other.is_empty()
    }
}

/// Item columns, aligned by row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableFields {
    pub description: Vec<String>,
    pub quantity: Vec<String>,
    pub price: Vec<String>,
    pub product_code: Vec<String>,
    pub supplier_code: Vec<String>,
}

/// The six address positions of the HEAD row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSlots {
    /// Point of interest, or the raw first address line.
    pub q: String,
    /// Subpremise, premise, locality and route.
    pub r: String,
    /// Reserved; always empty.
    pub s: String,
    /// Postal town.
    pub t: String,
    /// Secondary administrative area.
    pub u: String,
    /// Postal code.
    pub v: String,
}

impl AddressSlots {
    pub fn is_empty(&self) -> bool {
        [&self.q, &self.r, &self.s, &self.t, &self.u, &self.v]
            .iter()
            .all(|s| s.is_empty())
    }
}

/// Resolved delivery address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressResult {
    pub slots: AddressSlots,

    /// Single-line address as formatted by the validation service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_address: Option<String>,

    /// Verdict object returned by the validation service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<serde_json::Value>,

    /// Component type → text, as returned by the validation service.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub components: BTreeMap<String, String>,
}

impl AddressResult {
    pub fn from_slots(slots: AddressSlots) -> Self {
        Self {
            slots,
            ..Default::default()
        }
    }
}

/// The reconciled purchase order.
///
/// `description`, `quantity`, `product_code` and `short_product_code` always
/// have the same length; `price` and `supplier_code` may be shorter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalOrderRecord {
    pub description: Vec<String>,
    pub quantity: Vec<String>,
    pub price: Vec<String>,
    pub product_code: Vec<String>,
    pub supplier_code: Vec<String>,
    pub short_product_code: Vec<String>,

    pub order_number: String,
    pub order_date: String,
    pub delivery_date: String,
    pub extracted_email: String,
}

/// One item of the order, ready for serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine<'a> {
    /// 1-based position.
    pub index: usize,
    pub short_code: &'a str,
    pub product_code: &'a str,
    pub quantity: &'a str,
    pub price: &'a str,
    pub description: &'a str,
}

impl CanonicalOrderRecord {
    /// Number of order items.
    pub fn line_count(&self) -> usize {
        self.description
            .len()
            .max(self.quantity.len())
            .max(self.product_code.len())
    }

    /// Items in order, with missing cells read as empty strings.
    pub fn lines(&self) -> impl Iterator<Item = OrderLine<'_>> {
        (0..self.line_count()).map(move |i| OrderLine {
            index: i + 1,
            short_code: cell(&self.short_product_code, i),
            product_code: cell(&self.product_code, i),
            quantity: cell(&self.quantity, i),
            price: cell(&self.price, i),
            description: cell(&self.description, i),
        })
    }
}

fn cell(values: &[String], i: usize) -> &str {
    values.get(i).map(String::as_str).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_pad_short_columns() {
        let record = CanonicalOrderRecord {
            description: vec!["Bolt".to_string(), "Nut".to_string()],
            quantity: vec!["4".to_string(), "9".to_string()],
            price: vec!["0.10".to_string()],
            product_code: vec!["B-1".to_string(), "N-2".to_string()],
            short_product_code: vec!["B".to_string(), "N".to_string()],
            ..Default::default()
        };

        let lines: Vec<_> = record.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].index, 2);
        assert_eq!(lines[1].price, "");
        assert_eq!(lines[1].short_code, "N");
    }

    #[test]
    fn test_address_slots_empty() {
        assert!(AddressSlots::default().is_empty());
        let slots = AddressSlots {
            v: "YO1 1AA".to_string(),
            ..Default::default()
        };
        assert!(!slots.is_empty());
    }
}
