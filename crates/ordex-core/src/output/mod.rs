//! Output serialization.

pub mod csv;

pub use self::csv::{CsvSerializer, CsvStatus};
