//! Grouping of labeled entities by type.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::models::document::Entity;

/// Lower-cased entity types the reconciler reads.
pub mod entity_types {
    pub const PO_NO: &str = "po_no";
    pub const ORDER_DATE: &str = "order_date";
    pub const DELIVER_ADDRESS: &str = "deliver_address";
    pub const DESCRIPTION: &str = "description";
    pub const QUANTITY: &str = "quantity";
    pub const ORDER_QUANTITY: &str = "order_quantity";
    pub const PRICE: &str = "price";
    pub const PRODUCT_CODE: &str = "product_code";
    pub const SUPPLIER_CODE: &str = "supplier_code";
}

/// All mentions of one entity type, in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntityGroup {
    /// Lower-cased entity type.
    pub entity_type: String,
    /// Trimmed mention text.
    pub values: Vec<String>,
    /// Confidence as a percentage with two decimals, parallel to `values`.
    pub confidences: Vec<f64>,
}

/// Entities grouped by lower-cased type. Groups keep first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupedEntities {
    groups: Vec<EntityGroup>,
}

impl GroupedEntities {
    pub fn get(&self, entity_type: &str) -> Option<&EntityGroup> {
        self.groups.iter().find(|g| g.entity_type == entity_type)
    }

    pub fn contains(&self, entity_type: &str) -> bool {
        self.get(entity_type).is_some()
    }

    /// Values of a type, empty when the type never occurred.
    pub fn values(&self, entity_type: &str) -> &[String] {
        self.get(entity_type).map(|g| g.values.as_slice()).unwrap_or(&[])
    }

    /// First value of a type.
    pub fn first(&self, entity_type: &str) -> Option<&str> {
        self.values(entity_type).first().map(String::as_str)
    }

    pub fn groups(&self) -> &[EntityGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Confidence lists keyed by `{type}_confidence`.
    pub fn confidence_map(&self) -> BTreeMap<String, Vec<f64>> {
        self.groups
            .iter()
            .map(|g| (format!("{}_confidence", g.entity_type), g.confidences.clone()))
            .collect()
    }

    fn push(&mut self, entity_type: String, value: String, confidence: f64) {
        let index = match self.groups.iter().position(|g| g.entity_type == entity_type) {
            Some(index) => index,
            None => {
                self.groups.push(EntityGroup {
                    entity_type,
                    ..Default::default()
                });
                self.groups.len() - 1
            }
        };
        let group = &mut self.groups[index];
        group.values.push(value);
        group.confidences.push(confidence);
    }
}

/// Groups labeled entities by lower-cased type.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityGrouper;

impl EntityGrouper {
    pub fn new() -> Self {
        Self
    }

    pub fn group(&self, entities: &[Entity]) -> GroupedEntities {
        let mut grouped = GroupedEntities::default();

        for entity in entities {
            grouped.push(
                entity.entity_type.to_lowercase(),
                entity.mention_text.trim().to_string(),
                confidence_percent(entity.confidence),
            );
        }

        debug!(
            entities = entities.len(),
            types = grouped.groups.len(),
            "Grouped labeled entities"
        );
        grouped
    }
}

/// `0.87654` → `87.65`
fn confidence_percent(confidence: f64) -> f64 {
    (confidence * 100.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Entity> {
        vec![
            Entity::new("Product_Code", " ABC-1 ", 0.91234),
            Entity::new("quantity", "2", 0.5),
            Entity::new("PRODUCT_CODE", "DEF-2", 0.8),
        ]
    }

    #[test]
    fn test_group_by_lowercase_type() {
        let grouped = EntityGrouper::new().group(&sample());

        assert_eq!(grouped.values("product_code"), ["ABC-1", "DEF-2"]);
        assert_eq!(grouped.first("quantity"), Some("2"));
        assert!(grouped.values("price").is_empty());
        assert_eq!(grouped.groups()[0].entity_type, "product_code");
    }

    #[test]
    fn test_confidence_lists() {
        let grouped = EntityGrouper::new().group(&sample());
        let confidences = grouped.confidence_map();

        assert_eq!(confidences["product_code_confidence"], vec![91.23, 80.0]);
        assert_eq!(confidences["quantity_confidence"], vec![50.0]);
    }
}
