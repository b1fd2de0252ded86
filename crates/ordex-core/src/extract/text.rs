//! Regex extraction of email, PO number and dates from the full text.

use tracing::debug;

use crate::models::order::DateInfo;

use super::dates::extract_dates;
use super::patterns::{EMAIL, PO_NUMBER_PATTERNS};
use super::{ExtractionMatch, FieldExtractor};

/// Fields recovered from the document text alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextFields {
    /// First email address in the text, or empty.
    pub email: String,
    pub dates: DateInfo,
}

/// PO number extractor.
///
/// Patterns are tried in priority order; the first pattern with a match
/// wins even if a lower-priority pattern matches earlier in the text.
pub struct PoNumberExtractor;

impl FieldExtractor for PoNumberExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        PO_NUMBER_PATTERNS.iter().find_map(|pattern| {
            pattern.captures(text).map(|caps| {
                let full_match = caps.get(0).unwrap();
                ExtractionMatch::new(caps[1].trim().to_string(), full_match.as_str())
                    .with_position(full_match.start(), full_match.end())
            })
        })
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        PO_NUMBER_PATTERNS
            .iter()
            .flat_map(|pattern| pattern.captures_iter(text))
            .map(|caps| {
                let full_match = caps.get(0).unwrap();
                ExtractionMatch::new(caps[1].trim().to_string(), full_match.as_str())
                    .with_position(full_match.start(), full_match.end())
            })
            .collect()
    }
}

/// Extracts email, PO number and labeled dates from raw document text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFieldExtractor;

impl TextFieldExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str) -> TextFields {
        let fields = TextFields {
            email: self.extract_email(text),
            dates: self.extract_date_info(text),
        };
        debug!(
            email = %fields.email,
            po_number = %fields.dates.po_number,
            po_date = %fields.dates.po_date,
            delivery_date = %fields.dates.delivery_date,
            "Extracted text fields"
        );
        fields
    }

    /// First email address in the text, or an empty string.
    pub fn extract_email(&self, text: &str) -> String {
        EMAIL
            .find(text)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }

    /// PO number plus the earliest normalized PO and delivery dates.
    pub fn extract_date_info(&self, text: &str) -> DateInfo {
        let dates = extract_dates(text);
        DateInfo {
            po_number: PoNumberExtractor
                .extract(text)
                .map(|m| m.value)
                .unwrap_or_default(),
            po_date: dates.po_date.unwrap_or_default(),
            delivery_date: dates.delivery_date.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_po_number_and_order_date() {
        let text = "ACME SUPPLIES\nPO Number: 12345\nOrder Date: 01/02/2024\n";

        let fields = TextFieldExtractor::new().extract(text);

        assert_eq!(fields.dates.po_number, "12345");
        assert_eq!(fields.dates.po_date, "01/02/2024");
        assert_eq!(fields.dates.delivery_date, "");
    }

    #[test]
    fn test_po_number_label_forms() {
        let extractor = TextFieldExtractor::new();

        assert_eq!(extractor.extract_date_info("Purchase Order # 4410").po_number, "4410");
        assert_eq!(extractor.extract_date_info("PO#: 981").po_number, "981");
        assert_eq!(extractor.extract_date_info("Order No 0042").po_number, "0042");
        assert_eq!(extractor.extract_date_info("Invoice 77").po_number, "");
    }

    #[test]
    fn test_po_number_across_line_break() {
        let text = "See PO\n 5521 attached";

        assert_eq!(PoNumberExtractor.extract(text).unwrap().value, "5521");
        assert!(!PoNumberExtractor.extract_all(text).is_empty());
    }

    #[test]
    fn test_extract_email() {
        let extractor = TextFieldExtractor::new();

        assert_eq!(
            extractor.extract_email("Contact: orders@acme.co.uk or sales@acme.com"),
            "orders@acme.co.uk"
        );
        assert_eq!(extractor.extract_email("no address here"), "");
    }

    #[test]
    fn test_delivery_date_variants() {
        let info = TextFieldExtractor::new().extract_date_info("Please deliver by 2/3/2024");
        assert_eq!(info.delivery_date, "02/03/2024");
    }
}
