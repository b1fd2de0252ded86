//! Merging of the extraction stages into one canonical order record.

use tracing::{debug, error, info};

use crate::error::ReconcileError;
use crate::extract::entities::{entity_types, GroupedEntities};
use crate::extract::patterns::NON_WORD;
use crate::extract::{MappedColumns, TextFields};
use crate::models::customer::canonical;
use crate::models::order::{CanonicalOrderRecord, ScalarFields, TableFields};

type Resolver<'a> = Box<dyn Fn() -> Option<String> + 'a>;

/// Ordered fallback chain for one field: the first resolver returning a
/// non-empty value wins.
pub struct ResolverChain<'a> {
    field: &'a str,
    resolvers: Vec<(&'static str, Resolver<'a>)>,
}

/// Value picked by a [`ResolverChain`] and the resolver that supplied it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolved {
    pub value: String,
    pub source: Option<&'static str>,
}

impl<'a> ResolverChain<'a> {
    pub fn new(field: &'a str) -> Self {
        Self {
            field,
            resolvers: Vec::new(),
        }
    }

    /// Append a named resolver. Resolvers run lazily, in insertion order.
    pub fn or<F>(mut self, source: &'static str, resolver: F) -> Self
    where
        F: Fn() -> Option<String> + 'a,
    {
        self.resolvers.push((source, Box::new(resolver)));
        self
    }

    pub fn resolve(&self) -> Resolved {
        for (source, resolver) in &self.resolvers {
            if let Some(value) = resolver().filter(|v| !v.is_empty()) {
                debug!(field = self.field, source, value = %value, "Resolved field");
                return Resolved {
                    value,
                    source: Some(*source),
                };
            }
        }
        debug!(field = self.field, "No source supplied a value");
        Resolved::default()
    }
}

/// Where the item columns came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSource {
    Table,
    Entities,
}

/// Builds a [`CanonicalOrderRecord`] from the independent stage outputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldReconciler;

impl FieldReconciler {
    pub fn new() -> Self {
        Self
    }

    pub fn reconcile(
        &self,
        text: &TextFields,
        grouped: &GroupedEntities,
        scalars: &ScalarFields,
        columns: &MappedColumns,
    ) -> Result<CanonicalOrderRecord, ReconcileError> {
        let (table, source) = table_fields(grouped, columns);
        debug!(source = ?source, rows = table.description.len(), "Selected item columns");

        validate(&table).inspect_err(|e| error!(kind = e.kind(), error = %e, "Rejected order record"))?;

        let order_number = ResolverChain::new(canonical::ORDER_NUMBER)
            .or("form", || scalars.order_number.clone())
            .or("entities", || grouped.first(entity_types::PO_NO).map(str::to_string))
            .or("text", || Some(text.dates.po_number.clone()))
            .resolve();

        let order_date = ResolverChain::new(canonical::ORDER_DATE)
            .or("form", || scalars.order_date.clone())
            .or("entities", || grouped.first(entity_types::ORDER_DATE).map(str::to_string))
            .or("text", || Some(text.dates.po_date.clone()))
            .resolve();

        let delivery_date = ResolverChain::new(canonical::DELIVERY_DATE)
            .or("form", || scalars.delivery_date.clone())
            .or("text", || Some(text.dates.delivery_date.clone()))
            .resolve();

        let email = ResolverChain::new(canonical::EMAIL)
            .or("form", || scalars.email.clone())
            .or("text", || Some(text.email.clone()))
            .resolve();

        let short_product_code = short_product_codes(&table.product_code, &table.supplier_code);

        info!(
            lines = table.description.len(),
            order_number = %order_number.value,
            "Reconciled order record"
        );

        Ok(CanonicalOrderRecord {
            description: table.description,
            quantity: table.quantity,
            price: table.price,
            product_code: table.product_code,
            supplier_code: table.supplier_code,
            short_product_code,
            order_number: order_number.value,
            order_date: order_date.value,
            delivery_date: delivery_date.value,
            extracted_email: email.value,
        })
    }
}

/// Item columns from the mapped table when it is complete, from grouped
/// entities otherwise.
pub fn table_fields(grouped: &GroupedEntities, columns: &MappedColumns) -> (TableFields, TableSource) {
    if columns.is_complete() {
        let column = |name: &str| columns.get(name).map(<[String]>::to_vec).unwrap_or_default();
        let fields = TableFields {
            description: column(canonical::DESCRIPTION),
            quantity: column(canonical::QUANTITY).iter().map(|q| clean_quantity(q)).collect(),
            price: column(canonical::PRICE),
            product_code: column(canonical::PRODUCT_CODE)
                .iter()
                .map(|c| clean_product_code(c))
                .collect(),
            supplier_code: column(canonical::SUPPLIER_CODE),
        };
        return (fields, TableSource::Table);
    }

    let values = |entity_type: &str| grouped.values(entity_type).to_vec();
    let quantity = if grouped.contains(entity_types::QUANTITY) {
        values(entity_types::QUANTITY)
    } else {
        values(entity_types::ORDER_QUANTITY)
    };
    let fields = TableFields {
        description: values(entity_types::DESCRIPTION),
        quantity,
        price: values(entity_types::PRICE),
        product_code: values(entity_types::PRODUCT_CODE),
        supplier_code: values(entity_types::SUPPLIER_CODE),
    };
    (fields, TableSource::Entities)
}

fn validate(table: &TableFields) -> Result<(), ReconcileError> {
    if table.description.is_empty() && table.quantity.is_empty() && table.price.is_empty() {
        return Err(ReconcileError::NoExtractableData);
    }

    let (description, quantity, product_code) = (
        table.description.len(),
        table.quantity.len(),
        table.product_code.len(),
    );
    if description != quantity || description != product_code {
        return Err(ReconcileError::SchemaMismatch {
            description,
            quantity,
            product_code,
        });
    }
    Ok(())
}

/// `ABC-12/x` → `ABC12x`
pub fn clean_product_code(code: &str) -> String {
    NON_WORD.replace_all(code, "").into_owned()
}

/// `"0012 pcs"` → `"12"`; no digits → `""`.
pub fn clean_quantity(quantity: &str) -> String {
    let digits: String = quantity.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return digits;
    }
    match digits.trim_start_matches('0') {
        "" => "0".to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Short codes, one per product code. All empty when a supplier code
/// column exists, even if every cell in it is blank.
pub fn short_product_codes(product_codes: &[String], supplier_codes: &[String]) -> Vec<String> {
    if !supplier_codes.is_empty() {
        return vec![String::new(); product_codes.len()];
    }
    product_codes
        .iter()
        .enumerate()
        .map(|(i, code)| {
            let supplier = supplier_codes.get(i).map(String::as_str).unwrap_or("");
            short_code(code, supplier)
        })
        .collect()
}

/// Short code for one row: the part before the first hyphen, else the
/// supplier code for purely numeric product codes, else the product code.
pub fn short_code(product_code: &str, supplier_code: &str) -> String {
    if let Some((head, _)) = product_code.split_once('-') {
        return head.to_string();
    }
    let numeric = !product_code.is_empty() && product_code.chars().all(|c| c.is_ascii_digit());
    if numeric && !supplier_code.is_empty() {
        return supplier_code.to_string();
    }
    product_code.to_string()
}
