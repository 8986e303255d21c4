//! Request-flow tests against a scripted generation service.

mod common;

use common::{extractor, ledger_jpeg, ledger_png, ScriptedGenerator, MEMBER_TAX_JSON};
use ledgerscan::{
    ErrorKind, GenerationError, LedgerScanError, Stage, DIRECT_FILENAME, MAX_EXPENSE_COLUMNS,
    SHEET_NAME, TEMPLATE_FILENAME,
};

fn csv_rows(bytes: &[u8]) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(bytes);
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[tokio::test]
async fn template_single_member_single_header() {
    let gen = ScriptedGenerator::new(["Tax", MEMBER_TAX_JSON]);
    let export = extractor(gen.clone())
        .template_export(ledger_png(), "image/png")
        .await
        .unwrap();

    assert_eq!(export.filename, TEMPLATE_FILENAME);
    assert_eq!(gen.calls(), 2);

    let rows = csv_rows(&export.bytes);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].len(), 13 + 2 * MAX_EXPENSE_COLUMNS);

    let row = &rows[1];
    assert_eq!(row[0], "A-1");
    assert_eq!(row[4], "John");
    assert_eq!(row[13], "Tax");
    assert_eq!(row[14], "100");
    for (i, value) in row.iter().enumerate() {
        if ![0, 4, 13, 14].contains(&i) {
            assert_eq!(value, "", "column {} ({})", i, rows[0][i]);
        }
    }
}

#[tokio::test]
async fn extraction_prompt_lists_discovered_headers() {
    let gen = ScriptedGenerator::new(["Maintenance Charges, Sinking Fund", "[]"]);
    let _ = extractor(gen.clone())
        .template_export(ledger_jpeg(), "image/jpeg")
        .await;

    let seen = gen.instructions();
    assert_eq!(seen.len(), 2);
    assert!(seen[1].contains("\"Maintenance Charges\""));
    assert!(seen[1].contains("\"Sinking Fund\""));
}

#[tokio::test]
async fn no_headers_stops_after_discovery() {
    let gen = ScriptedGenerator::new(["  ,  , "]);
    let err = extractor(gen.clone())
        .template_export(ledger_png(), "image/png")
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerScanError::NoHeaders));
    assert_eq!(err.kind(), ErrorKind::Extraction);
    assert_eq!(gen.calls(), 1);
}

#[tokio::test]
async fn empty_member_array_is_no_data() {
    let gen = ScriptedGenerator::new(["Tax, Water", "[]"]);
    let err = extractor(gen)
        .template_export(ledger_png(), "image/png")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerScanError::NoData { stage: Stage::Extraction }));
}

#[tokio::test]
async fn fenced_json_is_accepted() {
    let fenced = format!("```json\n{MEMBER_TAX_JSON}\n```");
    let gen = ScriptedGenerator::new(["Tax".to_string(), fenced]);
    let export = extractor(gen)
        .template_export(ledger_png(), "image/png")
        .await
        .unwrap();
    assert_eq!(csv_rows(&export.bytes)[1][0], "A-1");
}

#[tokio::test]
async fn prose_response_is_malformed() {
    let gen = ScriptedGenerator::new(["Tax", "Sorry, I cannot read this image."]);
    let err = extractor(gen)
        .template_export(ledger_png(), "image/png")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerScanError::MalformedResponse { stage: Stage::Extraction, .. }
    ));
}

#[tokio::test]
async fn unsupported_type_never_calls_service() {
    let gen = ScriptedGenerator::new(["Tax", MEMBER_TAX_JSON]);
    let err = extractor(gen.clone())
        .template_export(b"hello".to_vec(), "text/plain")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerScanError::UnsupportedMediaType { .. }));
    assert_eq!(gen.calls(), 0);
}

#[tokio::test]
async fn undecodable_image_never_calls_service() {
    let gen = ScriptedGenerator::new(["Tax"]);
    let err = extractor(gen.clone())
        .direct_export(b"not a png".to_vec(), "image/png")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Processing);
    assert_eq!(gen.calls(), 0);
}

#[tokio::test]
async fn mislabelled_image_is_decoded_by_content() {
    let gen = ScriptedGenerator::new(["Tax", MEMBER_TAX_JSON]);
    let export = extractor(gen.clone())
        .template_export(ledger_jpeg(), "image/png")
        .await
        .unwrap();
    assert_eq!(csv_rows(&export.bytes)[1][0], "A-1");

    let gen = ScriptedGenerator::new(["Tax", MEMBER_TAX_JSON]);
    extractor(gen.clone())
        .template_export(ledger_png(), "image/jpeg")
        .await
        .unwrap();
    assert_eq!(gen.calls(), 2);
}

#[tokio::test]
async fn service_timeout_names_stage() {
    let gen = ScriptedGenerator::with_results([Err(GenerationError::Timeout(30))]);
    let err = extractor(gen)
        .template_export(ledger_png(), "image/png")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerScanError::GenerationTimeout { stage: Stage::Discovery, secs: 30 }
    ));
}

#[tokio::test]
async fn service_failure_in_second_round() {
    let gen = ScriptedGenerator::with_results([
        Ok("Tax".to_string()),
        Err(GenerationError::Api("quota exceeded".into())),
    ]);
    let err = extractor(gen)
        .template_export(ledger_png(), "image/png")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerScanError::GenerationFailed { stage: Stage::Extraction, .. }
    ));
    assert!(err.to_string().contains("quota exceeded"));
}

#[tokio::test]
async fn direct_export_writes_named_sheet() {
    use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
    use std::io::Cursor;

    let gen = ScriptedGenerator::new([r#"[
        {"Flat": "101", "Name": "Asha", "Total": "1,200.00"},
        {"Flat": "102", "Name": "Ravi", "Remarks": "paid"}
    ]"#]);
    let export = extractor(gen.clone())
        .direct_export(ledger_png(), "image/png")
        .await
        .unwrap();

    assert_eq!(gen.calls(), 1);
    assert_eq!(export.filename, DIRECT_FILENAME);

    let mut book: Xlsx<_> = open_workbook_from_rs(Cursor::new(export.bytes)).unwrap();
    assert_eq!(book.sheet_names(), vec![SHEET_NAME.to_string()]);
    let range = book.worksheet_range(SHEET_NAME).unwrap();
    let rows: Vec<&[Data]> = range.rows().collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][3], Data::String("Remarks".into()));
    assert_eq!(rows[1][2], Data::String("1,200.00".into()));
    assert_eq!(rows[2][2], Data::Empty);
}

#[tokio::test]
async fn direct_export_empty_array_is_no_data() {
    let gen = ScriptedGenerator::new(["[]"]);
    let err = extractor(gen)
        .direct_export(ledger_png(), "image/png")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerScanError::NoData { stage: Stage::DirectExport }));
}

#[tokio::test]
async fn direct_export_object_is_malformed() {
    let gen = ScriptedGenerator::new([r#"{"Flat": "101"}"#]);
    let err = extractor(gen)
        .direct_export(ledger_png(), "image/png")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerScanError::MalformedResponse { stage: Stage::DirectExport, .. }
    ));
}
