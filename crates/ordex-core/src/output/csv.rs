//! HEAD/LINE/RECON flat file writer.
//!
//! Every file holds one `HEAD` row, one `LINE` row per item and one
//! closing `RECON` row. Rows have fixed but different widths.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use ::csv::{Terminator, WriterBuilder};
use tracing::{debug, info, warn};

use crate::error::OutputError;
use crate::models::config::OutputConfig;
use crate::models::order::{AddressSlots, CanonicalOrderRecord, OrderLine};

/// Width of a `HEAD` row.
pub const HEAD_COLUMNS: usize = 111;
/// Width of a `LINE` row.
pub const LINE_COLUMNS: usize = 95;
/// Width of a `RECON` row.
pub const RECON_COLUMNS: usize = 100;

const ORDER_STATUS: &str = "FINAL";
const UNIT_OF_MEASURE: &str = "EA";

/// Terminal state of the serialization stage.
#[derive(Debug)]
pub enum CsvStatus {
    Generated,
    /// Nothing usable was left at the output path.
    Failed(OutputError),
}

impl CsvStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CsvStatus::Generated => "Generated",
            CsvStatus::Failed(_) => "Failed",
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, CsvStatus::Generated)
    }
}

/// Fixed-width row under construction.
struct Row {
    fields: Vec<String>,
    width: usize,
}

impl Row {
    fn new(kind: &str, width: usize) -> Self {
        let mut fields = Vec::with_capacity(width);
        fields.push(kind.to_string());
        Self { fields, width }
    }

    fn push(mut self, value: impl Into<String>) -> Self {
        self.fields.push(value.into());
        self
    }

    fn blanks(mut self, count: usize) -> Self {
        self.fields.extend(std::iter::repeat_n(String::new(), count));
        self
    }

    /// Pad with blanks up to the row width.
    fn finish(mut self) -> Vec<String> {
        debug_assert!(self.fields.len() <= self.width);
        self.fields.resize(self.width, String::new());
        self.fields
    }
}

/// Writes canonical order records as HEAD/LINE/RECON rows.
#[derive(Debug, Clone)]
pub struct CsvSerializer {
    facility_code: String,
    source_system: String,
}

impl Default for CsvSerializer {
    fn default() -> Self {
        Self::new(&OutputConfig::default())
    }
}

impl CsvSerializer {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            facility_code: config.facility_code.clone(),
            source_system: config.source_system.clone(),
        }
    }

    pub fn head_row(&self, record: &CanonicalOrderRecord, address: &AddressSlots) -> Vec<String> {
        Row::new("HEAD", HEAD_COLUMNS)
            .push(&self.facility_code)
            .blanks(1)
            .push(&address.v)
            .push(&record.order_number)
            .push(&record.order_date)
            .push(&record.delivery_date)
            .blanks(5)
            .push(&record.extracted_email)
            .blanks(3)
            .push(&address.q)
            .push(&address.r)
            .push(&address.s)
            .push(&address.t)
            .push(&address.u)
            .push(&address.v)
            .push(&self.facility_code)
            .push(&address.v)
            .blanks(4)
            .push(ORDER_STATUS)
            .push(&record.order_date)
            .blanks(10)
            .push(&record.extracted_email)
            .finish()
    }

    pub fn line_row(&self, line: &OrderLine<'_>, order_date: &str) -> Vec<String> {
        Row::new("LINE", LINE_COLUMNS)
            .push(line.index.to_string())
            .push(line.short_code)
            .blanks(1)
            .push(line.quantity)
            .blanks(1)
            .push(line.product_code)
            .blanks(2)
            .push(line.price)
            .push(line.description)
            .blanks(13)
            .push(order_date)
            .push(line.quantity)
            .push(UNIT_OF_MEASURE)
            .finish()
    }

    pub fn recon_row(&self, record: &CanonicalOrderRecord) -> Vec<String> {
        Row::new("RECON", RECON_COLUMNS)
            .push(&self.source_system)
            .push(&self.facility_code)
            .push(&record.order_number)
            .push(record.line_count().to_string())
            .finish()
    }

    /// Write all rows of one order to `writer`.
    pub fn write<W: Write>(
        &self,
        writer: W,
        record: &CanonicalOrderRecord,
        address: &AddressSlots,
    ) -> Result<(), OutputError> {
        let mut wtr = WriterBuilder::new()
            .terminator(Terminator::CRLF)
            .flexible(true)
            .from_writer(writer);

        wtr.write_record(self.head_row(record, address))?;
        for line in record.lines() {
            wtr.write_record(self.line_row(&line, &record.order_date))?;
        }
        wtr.write_record(self.recon_row(record))?;
        wtr.flush()?;

        debug!(lines = record.line_count(), "Wrote order rows");
        Ok(())
    }

    /// Write one order to `path`, replacing any existing file. A partly
    /// written file is removed again.
    pub fn write_to_path(
        &self,
        path: &Path,
        record: &CanonicalOrderRecord,
        address: &AddressSlots,
    ) -> Result<(), OutputError> {
        let file = File::create(path)?;
        if let Err(e) = self.write(file, record, address) {
            if let Err(remove_err) = fs::remove_file(path) {
                warn!(path = %path.display(), error = %remove_err, "Could not remove partial CSV");
            }
            return Err(e);
        }
        info!(path = %path.display(), lines = record.line_count(), "Generated order CSV");
        Ok(())
    }

    /// Serialization stage: write the order and report how it ended.
    pub fn generate(&self, path: &Path, record: &CanonicalOrderRecord, address: &AddressSlots) -> CsvStatus {
        match self.write_to_path(path, record, address) {
            Ok(()) => CsvStatus::Generated,
            Err(e) => CsvStatus::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn record() -> CanonicalOrderRecord {
        CanonicalOrderRecord {
            description: strings(&["Widget A", "Widget B"]),
            quantity: strings(&["2", "3"]),
            price: strings(&["10.00", "20.00"]),
            product_code: strings(&["ABC-123", "DEF-456"]),
            short_product_code: strings(&["ABC", "DEF"]),
            order_number: "12345".to_string(),
            order_date: "01/02/2024".to_string(),
            delivery_date: "09/02/2024".to_string(),
            extracted_email: "buyer@example.com".to_string(),
            ..Default::default()
        }
    }

    fn address() -> AddressSlots {
        AddressSlots {
            q: "MAIN".to_string(),
            r: "1 High Street".to_string(),
            s: String::new(),
            t: "York".to_string(),
            u: "United Kingdom".to_string(),
            v: "YO1 7HH".to_string(),
        }
    }

    #[test]
    fn test_head_row_layout() {
        let row = CsvSerializer::default().head_row(&record(), &address());

        assert_eq!(row.len(), HEAD_COLUMNS);
        assert_eq!(&row[..7], strings(&["HEAD", "76001", "", "YO1 7HH", "12345", "01/02/2024", "09/02/2024"]));
        assert_eq!(row[12], "buyer@example.com");
        assert_eq!(&row[16..24], strings(&["MAIN", "1 High Street", "", "York", "United Kingdom", "YO1 7HH", "76001", "YO1 7HH"]));
        assert_eq!(row[28], "FINAL");
        assert_eq!(row[29], "01/02/2024");
        assert_eq!(row[40], "buyer@example.com");
        assert!(row[41..].iter().all(String::is_empty));
    }

    #[test]
    fn test_line_row_layout() {
        let record = record();
        let line = record.lines().nth(1).unwrap();

        let row = CsvSerializer::default().line_row(&line, &record.order_date);

        assert_eq!(row.len(), LINE_COLUMNS);
        assert_eq!(
            &row[..11],
            strings(&["LINE", "2", "DEF", "", "3", "", "DEF-456", "", "", "20.00", "Widget B"])
        );
        assert_eq!(&row[24..27], strings(&["01/02/2024", "3", "EA"]));
        assert!(row[27..].iter().all(String::is_empty));
    }

    #[test]
    fn test_recon_row_layout() {
        let config = OutputConfig {
            facility_code: "12000".to_string(),
            source_system: "EDI".to_string(),
        };

        let row = CsvSerializer::new(&config).recon_row(&record());

        assert_eq!(row.len(), RECON_COLUMNS);
        assert_eq!(&row[..5], strings(&["RECON", "EDI", "12000", "12345", "2"]));
    }

    #[test]
    fn test_written_file_shape() {
        let mut buffer = Vec::new();

        CsvSerializer::default()
            .write(&mut buffer, &record(), &address())
            .unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let rows: Vec<&str> = text.split_terminator("\r\n").collect();
        assert_eq!(rows.len(), 4);
        assert!(rows[0].starts_with("HEAD,76001,,YO1 7HH,12345,"));
        assert!(rows[1].starts_with("LINE,1,ABC,,2,,ABC-123,,,10.00,Widget A,"));
        assert!(rows[3].starts_with("RECON,HPC,76001,12345,2,"));
        assert_eq!(rows[2].matches(',').count(), LINE_COLUMNS - 1);
        assert!(text.ends_with("\r\n"));
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("order.csv");

        let result = CsvSerializer::default().write_to_path(&path, &record(), &address());

        assert!(matches!(result, Err(OutputError::Io(_))));
    }

    #[test]
    fn test_generate_reports_status() {
        let dir = tempfile::tempdir().unwrap();
        let serializer = CsvSerializer::default();

        let generated = serializer.generate(&dir.path().join("order.csv"), &record(), &address());
        assert!(generated.is_generated());
        assert_eq!(generated.as_str(), "Generated");

        let failed = serializer.generate(&dir.path().join("missing").join("order.csv"), &record(), &address());
        assert!(matches!(failed, CsvStatus::Failed(OutputError::Io(_))));
        assert_eq!(failed.as_str(), "Failed");
    }
}
