//! Common regex patterns for purchase-order text extraction.

use lazy_static::lazy_static;
use regex::Regex;

use super::dates::DateKind;

lazy_static! {
    // Email pattern
    pub static ref EMAIL: Regex = Regex::new(
        r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"
    ).unwrap();

    // PO number patterns, highest priority first
    pub static ref PO_NUMBER_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)(?:PO|Purchase Order|Order)\s*(?:No|Number|#)?\s*:?\s*(\d+)").unwrap(),
        Regex::new(r"(?i)\bPO\b\s*(\d+)").unwrap(),
        Regex::new(r"(?i)\b(?:PO|Order)\s*(\d+)").unwrap(),
    ];

    // Labeled dates
    pub static ref DATE_PATTERNS: Vec<(Regex, DateKind)> = vec![
        (
            Regex::new(r"(?i)PO\s*Date\s*:?\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})").unwrap(),
            DateKind::PoDate,
        ),
        (
            Regex::new(r"(?i)Order\s*Date\s*:?\s*(\d{1,2}[./-]\d{1,2}[./-]\d{2,4})").unwrap(),
            DateKind::PoDate,
        ),
        (
            Regex::new(r"(?i)Date\s*:?\s*(\d{1,2}[./-]\d{1,2}[./-]\d{2,4})\s*Order").unwrap(),
            DateKind::PoDate,
        ),
        (
            Regex::new(r"(?i)Delivery\s*Date\s*:?\s*(\d{1,2}[./-]\d{1,2}[./-]\d{2,4})").unwrap(),
            DateKind::DeliveryDate,
        ),
        (
            Regex::new(r"(?i)Delivery\s*on\s*(\d{1,2}[./-]\d{1,2}[./-]\d{2,4})").unwrap(),
            DateKind::DeliveryDate,
        ),
        (
            Regex::new(r"(?i)Deliver\s*by\s*(\d{1,2}[./-]\d{1,2}[./-]\d{2,4})").unwrap(),
            DateKind::DeliveryDate,
        ),
    ];

    // Accepted shapes for date normalization (four-digit years only)
    pub static ref DATE_DMY_SLASH: Regex = Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").unwrap();

    pub static ref DATE_DMY_DASH: Regex = Regex::new(r"^\d{1,2}-\d{1,2}-\d{4}$").unwrap();

    pub static ref DATE_YMD_DASH: Regex = Regex::new(r"^\d{4}-\d{1,2}-\d{1,2}$").unwrap();

    // Characters dropped from table product codes
    pub static ref NON_WORD: Regex = Regex::new(r"\W+").unwrap();
}
