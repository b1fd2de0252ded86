//! Labeled date extraction and `DD/MM/YYYY` normalization.

use chrono::NaiveDate;
use regex::Regex;

use super::patterns::{DATE_DMY_DASH, DATE_DMY_SLASH, DATE_PATTERNS, DATE_YMD_DASH};
use super::{ExtractionMatch, FieldExtractor};

/// Semantic role of a labeled date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateKind {
    /// Order (PO) date.
    PoDate,
    /// Requested delivery date.
    DeliveryDate,
}

/// Labeled date extractor.
///
/// Every labeled pattern is applied to the whole text; matches are returned
/// in text order with their kind.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<(DateKind, String)>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();

        for (pattern, kind) in DATE_PATTERNS.iter() {
            for caps in pattern.captures_iter(text) {
                let full_match = caps.get(0).unwrap();
                let date = caps[1].replace('.', "/");
                results.push(
                    ExtractionMatch::new((*kind, date), full_match.as_str())
                        .with_position(full_match.start(), full_match.end()),
                );
            }
        }

        // Stable: equal positions keep pattern order
        results.sort_by_key(|m| m.start());
        results
    }
}

/// Earliest labeled date of each kind, already normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabeledDates {
    pub po_date: Option<String>,
    pub delivery_date: Option<String>,
}

/// Extract the earliest PO date and delivery date from free text.
pub fn extract_dates(text: &str) -> LabeledDates {
    let mut result = LabeledDates::default();

    for found in DateExtractor::new().extract_all(text) {
        let (kind, raw) = found.value;
        let slot = match kind {
            DateKind::PoDate => &mut result.po_date,
            DateKind::DeliveryDate => &mut result.delivery_date,
        };
        if slot.is_none() {
            *slot = Some(normalize_date(&raw));
        }
    }

    result
}

/// Input formats tried in order, each guarded by its accepted shape.
fn input_formats() -> [(&'static str, &'static Regex); 4] {
    [
        ("%d/%m/%Y", &*DATE_DMY_SLASH),
        ("%d-%m-%Y", &*DATE_DMY_DASH),
        ("%m/%d/%Y", &*DATE_DMY_SLASH),
        ("%Y-%m-%d", &*DATE_YMD_DASH),
    ]
}

/// Normalize a date to `DD/MM/YYYY`.
///
/// The first input format that parses wins. Strings that match no format
/// are returned unchanged.
pub fn normalize_date(raw: &str) -> String {
    for (format, shape) in input_formats() {
        if !shape.is_match(raw) {
            continue;
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.format("%d/%m/%Y").to_string();
        }
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_known_formats() {
        assert_eq!(normalize_date("01/02/2024"), "01/02/2024");
        assert_eq!(normalize_date("1/2/2024"), "01/02/2024");
        assert_eq!(normalize_date("05-11-2023"), "05/11/2023");
        assert_eq!(normalize_date("2024-03-09"), "09/03/2024");
    }

    #[test]
    fn test_normalize_falls_back_to_month_first() {
        assert_eq!(normalize_date("12/25/2024"), "25/12/2024");
    }

    #[test]
    fn test_normalize_returns_unparsed_input() {
        assert_eq!(normalize_date("13/25/2024"), "13/25/2024");
        assert_eq!(normalize_date("01/02/24"), "01/02/24");
        assert_eq!(normalize_date("next tuesday"), "next tuesday");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["01/02/2024", "31/12/1999", "12/25/2024", "2024-03-09", "7.8.2024"] {
            let once = normalize_date(raw);
            assert_eq!(normalize_date(&once), once, "input {raw}");
        }
    }

    #[test]
    fn test_earliest_date_per_kind_wins() {
        let text = "Delivery on 03/04/2024\nOrder Date: 02/01/2024\nPO Date: 09/09/2024\nDeliver by 05/05/2024";

        let dates = extract_dates(text);

        assert_eq!(dates.po_date.as_deref(), Some("02/01/2024"));
        assert_eq!(dates.delivery_date.as_deref(), Some("03/04/2024"));
    }

    #[test]
    fn test_dotted_dates_become_slashed() {
        let dates = extract_dates("Order Date 15.06.2024");
        assert_eq!(dates.po_date.as_deref(), Some("15/06/2024"));
    }

    #[test]
    fn test_date_before_order_label() {
        let extractor = DateExtractor::new();
        let found = extractor.extract("Date: 11/10/2024 Order ref 55").unwrap();

        assert_eq!(found.value, (DateKind::PoDate, "11/10/2024".to_string()));
        assert_eq!(found.start(), 0);
    }
}
