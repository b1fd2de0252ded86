use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const DOCUMENT: &str = r#"{
  "document": {
    "text": "PO Number: 12345\nOrder Date: 01/02/2024\nbuyer@example.com\n",
    "pages": [{"tables": [], "formFields": []}],
    "entities": [
      {"type": "Description", "mentionText": "Widget A", "confidence": 0.98},
      {"type": "Quantity", "mentionText": "2", "confidence": 0.97},
      {"type": "Price", "mentionText": "10.00", "confidence": 0.95},
      {"type": "Product_Code", "mentionText": "ABC-123", "confidence": 0.91},
      {"type": "Description", "mentionText": "Widget B", "confidence": 0.98},
      {"type": "Quantity", "mentionText": "3", "confidence": 0.97},
      {"type": "Price", "mentionText": "20.00", "confidence": 0.95},
      {"type": "Product_Code", "mentionText": "DEF-456", "confidence": 0.9}
    ]
  }
}"#;

const EMPTY_DOCUMENT: &str = r#"{"text": "Thank you for your business", "pages": [], "entities": []}"#;

const CUSTOMER: &str = r#"{
  "name": "Acme Supplies",
  "extra_data": {"PO Number": "Order Number", "Order Qty": "Quantity"},
  "default_address_id": 7,
  "addresses": [
    {"entity_id": 7, "address_code": "MAIN", "street": "1 High Street", "city": "York", "country": "United Kingdom", "postcode": "YO1 7HH"}
  ]
}"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("customer.json"), CUSTOMER).unwrap();
        fs::write(
            dir.path().join("config.json"),
            r#"{"address_validation": {"enabled": false}}"#,
        )
        .unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn ordex(&self) -> Command {
        let mut cmd = Command::cargo_bin("ordex").unwrap();
        cmd.arg("--config").arg(self.path("config.json"));
        cmd
    }

    fn process(&self, input: &Path, document: &Path, output: &Path) -> assert_cmd::assert::Assert {
        self.ordex()
            .arg("process")
            .arg(input)
            .arg("--document")
            .arg(document)
            .arg("--customer")
            .arg(self.path("customer.json"))
            .arg("--output")
            .arg(output)
            .assert()
    }
}

#[test]
fn test_process_stored_document() {
    let fx = Fixture::new();
    let input = fx.write("order.pdf", "%PDF-1.4");
    let document = fx.write("order.json", DOCUMENT);
    let output = fx.path("order.csv");

    fx.process(&input, &document, &output)
        .success()
        .stdout(predicate::str::contains(r#""status": "success""#));

    let csv = fs::read_to_string(&output).unwrap();
    let rows: Vec<&str> = csv.split_terminator("\r\n").collect();
    assert_eq!(rows.len(), 4);
    assert!(rows[0].starts_with("HEAD,76001,,YO1 7HH,12345,01/02/2024,,"));
    assert!(rows[1].starts_with("LINE,1,ABC,,2,,ABC-123,,,10.00,Widget A,"));
    assert!(rows[2].starts_with("LINE,2,DEF,,3,,DEF-456,,,20.00,Widget B,"));
    assert!(rows[3].starts_with("RECON,HPC,76001,12345,2,"));
}

#[test]
fn test_process_without_items_reports_no_data() {
    let fx = Fixture::new();
    let input = fx.write("order.pdf", "%PDF-1.4");
    let document = fx.write("empty.json", EMPTY_DOCUMENT);
    let output = fx.path("order.csv");

    fx.process(&input, &document, &output)
        .success()
        .stdout(predicate::str::contains(r#""status": "no_data""#));

    assert!(!output.exists());
}

#[test]
fn test_process_rejects_unsupported_file() {
    let fx = Fixture::new();
    let input = fx.write("order.docx", "not an order");
    let document = fx.write("order.json", DOCUMENT);
    let output = fx.path("order.csv");

    fx.process(&input, &document, &output)
        .failure()
        .stdout(predicate::str::contains(r#""status": "error""#))
        .stderr(predicate::str::contains("unsupported file type"));

    assert!(!output.exists());
}

#[test]
fn test_config_get_reads_given_file() {
    let fx = Fixture::new();

    fx.ordex()
        .args(["config", "get", "address_validation.enabled"])
        .assert()
        .success()
        .stdout(predicate::str::contains("false"));

    fx.ordex()
        .args(["config", "get", "output.facility_code"])
        .assert()
        .success()
        .stdout(predicate::str::contains("76001"));
}

#[test]
fn test_unsupported_file_rejected_without_stored_document() {
    let fx = Fixture::new();
    let input = fx.write("order.docx", "not an order");

    fx.ordex()
        .arg("process")
        .arg(&input)
        .arg("--customer")
        .arg(fx.path("customer.json"))
        .assert()
        .failure()
        .stdout(predicate::str::contains(r#""status": "error""#))
        .stdout(predicate::str::contains("unsupported file type"));
}

#[test]
fn test_batch_keeps_orders_with_same_file_name() {
    let fx = Fixture::new();
    for sub in ["a", "b"] {
        fs::create_dir_all(fx.path("in").join(sub)).unwrap();
        fs::write(fx.path("in").join(sub).join("order.pdf"), "%PDF-1.4").unwrap();
    }
    fs::create_dir_all(fx.path("docs")).unwrap();
    fs::write(fx.path("docs").join("order.json"), DOCUMENT).unwrap();
    let pattern = format!("{}/in/*/order.pdf", fx.dir.path().display());
    let out = fx.path("out");

    fx.ordex()
        .arg("batch")
        .arg(&pattern)
        .arg("--customer")
        .arg(fx.path("customer.json"))
        .arg("--output-dir")
        .arg(&out)
        .arg("--document-dir")
        .arg(fx.path("docs"))
        .arg("--summary")
        .assert()
        .success();

    assert!(out.join("order.csv").exists());
    assert!(out.join("order-2.csv").exists());
    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.contains("order-2.csv"));
}
