//! Per-customer inputs: field mapping and stored addresses.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

/// Canonical names that denote table columns. Every other canonical name
/// is a scalar field.
pub const TABLE_COLUMNS: [&str; 5] = [
    "Description",
    "Quantity",
    "Price",
    "Product Code",
    "Supplier Code",
];

/// Canonical scalar names with a fixed role in the order record.
pub mod canonical {
    pub const ORDER_NUMBER: &str = "Order Number";
    pub const ORDER_DATE: &str = "Order Date";
    pub const DELIVERY_DATE: &str = "Delivery Date";
    pub const EMAIL: &str = "Email";

    pub const DESCRIPTION: &str = "Description";
    pub const QUANTITY: &str = "Quantity";
    pub const PRICE: &str = "Price";
    pub const PRODUCT_CODE: &str = "Product Code";
    pub const SUPPLIER_CODE: &str = "Supplier Code";
}

/// Check whether a canonical name denotes a table column.
pub fn is_table_column(canonical_name: &str) -> bool {
    TABLE_COLUMNS.contains(&canonical_name)
}

/// Ordered mapping from a customer's source label to a canonical name.
///
/// Iteration order is the order of the source JSON object; header matching
/// depends on it. Non-string values in the source object are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    entries: Vec<(String, String)>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. An existing label is replaced in place.
    pub fn insert(&mut self, label: impl Into<String>, canonical_name: impl Into<String>) {
        let label = label.into();
        let canonical_name = canonical_name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(l, _)| *l == label) {
            entry.1 = canonical_name;
        } else {
            self.entries.push((label, canonical_name));
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, label: impl Into<String>, canonical_name: impl Into<String>) -> Self {
        self.insert(label, canonical_name);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, c)| (l.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose canonical name is a scalar field.
    pub fn scalar_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(_, c)| !is_table_column(c))
    }

    /// Entries whose canonical name is a table column, with indexed labels
    /// (`Order Qty_2`) folded back to their base label (`Order Qty`).
    ///
    /// Later entries replace earlier ones with the same folded label.
    pub fn table_entries(&self) -> FieldMapping {
        let mut table = FieldMapping::new();
        for (label, canonical_name) in self.iter().filter(|(_, c)| is_table_column(c)) {
            table.insert(fold_indexed_label(label), canonical_name);
        }
        table
    }

    /// Reverse lookup: the last label mapped onto `canonical_name`.
    pub fn label_for(&self, canonical_name: &str) -> Option<&str> {
        self.iter()
            .filter(|(_, c)| *c == canonical_name)
            .map(|(l, _)| l)
            .last()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for FieldMapping {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut mapping = FieldMapping::new();
        for (label, canonical_name) in iter {
            mapping.insert(label, canonical_name);
        }
        mapping
    }
}

/// `Label_12` → `Label`; anything else unchanged.
fn fold_indexed_label(label: &str) -> &str {
    match label.rsplit_once('_') {
        Some((_, suffix)) if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()) => {
            label.split('_').next().unwrap_or(label)
        }
        _ => label,
    }
}

impl Serialize for FieldMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, canonical_name) in &self.entries {
            map.serialize_entry(label, canonical_name)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FieldMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MappingVisitor;

        impl<'de> Visitor<'de> for MappingVisitor {
            type Value = FieldMapping;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping source labels to canonical field names")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut mapping = FieldMapping::new();
                while let Some((label, value)) = access.next_entry::<String, serde_json::Value>()? {
                    match value {
                        serde_json::Value::String(canonical_name) => mapping.insert(label, canonical_name),
                        other => debug!(label = %label, value = %other, "Skipping non-string mapping value"),
                    }
                }
                Ok(mapping)
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(FieldMapping::new())
            }
        }

        deserializer.deserialize_any(MappingVisitor)
    }
}

/// A stored customer address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerAddress {
    pub entity_id: i64,
    pub address_code: Option<String>,
    pub street: String,
    pub city: String,
    pub country: String,
    pub postcode: String,
}

/// Everything the pipeline needs to know about the sending customer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerProfile {
    /// Display name.
    pub name: String,

    /// Internal customer code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_code: Option<String>,

    /// Sender address used to match incoming mail to the customer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Source label → canonical name mapping.
    #[serde(rename = "extra_data", alias = "field_mapping")]
    pub field_mapping: FieldMapping,

    /// `entity_id` of the default delivery address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_address_id: Option<i64>,

    /// Stored addresses in display order.
    pub addresses: Vec<CustomerAddress>,
}

impl CustomerProfile {
    /// Load a customer profile from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// The address referenced by `default_address_id`, if it exists.
    pub fn default_address(&self) -> Option<&CustomerAddress> {
        let id = self.default_address_id?;
        self.addresses.iter().find(|a| a.entity_id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_keeps_source_order() {
        let mapping: FieldMapping = serde_json::from_str(
            r#"{"Qty": "Quantity", "PO Date": "Order Date", "Code": "Product Code", "Notes": 3}"#,
        )
        .unwrap();

        let labels: Vec<&str> = mapping.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["Qty", "PO Date", "Code"]);
    }

    #[test]
    fn test_scalar_and_table_split() {
        let mapping = FieldMapping::new()
            .with("PO Date", "Order Date")
            .with("Order Qty", "Quantity")
            .with("Order Qty_2", "Quantity")
            .with("Our Ref_x", "Description");

        let scalars: Vec<_> = mapping.scalar_entries().collect();
        assert_eq!(scalars, vec![("PO Date", "Order Date")]);

        let table = mapping.table_entries();
        let labels: Vec<&str> = table.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["Order Qty", "Our Ref_x"]);
        assert_eq!(table.label_for("Quantity"), Some("Order Qty"));
    }

    #[test]
    fn test_default_address_lookup() {
        let profile: CustomerProfile = serde_json::from_str(
            r#"{
                "name": "Acme",
                "extra_data": {"PO Number": "Order Number"},
                "default_address_id": 7,
                "addresses": [
                    {"entity_id": 3, "street": "1 Old Road", "city": "Leeds", "country": "UK", "postcode": "LS1 1AA"},
                    {"entity_id": 7, "address_code": "DEPOT", "street": "2 New Road", "city": "York", "country": "UK", "postcode": "YO1 1AA"}
                ]
            }"#,
        )
        .unwrap();

        let address = profile.default_address().unwrap();
        assert_eq!(address.address_code.as_deref(), Some("DEPOT"));
        assert_eq!(profile.field_mapping.len(), 1);
    }
}
