//! End-to-end tests against a live vision model.
//!
//! These read documents from `./test_cases/` and make real API calls, so they
//! are gated behind `E2E_ENABLED` and skip silently otherwise.
//!
//! Run with:
//!   E2E_ENABLED=1 GEMINI_API_KEY=... cargo test --test e2e -- --nocapture

use ledgerscan::{DocumentKind, ExtractionConfig, Extractor, MAX_EXPENSE_COLUMNS};
use std::path::PathBuf;

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

/// Skip this test if E2E_ENABLED is not set *or* no file at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP: test file not found: {}", p.display());
            return;
        }
        p
    }};
}

fn live_extractor() -> Extractor {
    let config = ExtractionConfig::builder()
        .api_timeout_secs(120)
        .build()
        .unwrap();
    Extractor::from_config(config).unwrap()
}

#[tokio::test]
async fn e2e_ledger_photo_to_template() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("ledger.jpg"));
    let bytes = std::fs::read(&path).unwrap();
    let kind = DocumentKind::from_path(&path).unwrap();

    let export = live_extractor()
        .template_export_kind(bytes, kind)
        .await
        .unwrap();

    let text = String::from_utf8(export.bytes).unwrap();
    let header = text.lines().next().unwrap();
    assert_eq!(header.split(',').count(), 13 + 2 * MAX_EXPENSE_COLUMNS);
    assert!(text.lines().count() > 1, "expected at least one member row");
    println!("{text}");
}

#[tokio::test]
async fn e2e_bill_pdf_to_workbook() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("bill.pdf"));
    let bytes = std::fs::read(&path).unwrap();

    let export = live_extractor()
        .direct_export(bytes, "application/pdf")
        .await
        .unwrap();

    assert_eq!(&export.bytes[..2], b"PK");
    println!("{} bytes written", export.bytes.len());
}
