//! Serialising a [`Table`] to CSV or XLSX bytes.

use crate::error::LedgerScanError;
use crate::model::{Cell, Table};
use rust_xlsxwriter::{Format, Workbook, XlsxError};

/// Sheet name of the direct export workbook.
pub const SHEET_NAME: &str = "Extracted Data";

pub const CSV_MEDIA_TYPE: &str = "text/csv";
pub const XLSX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// A finished download: bytes plus how to present them.
#[derive(Debug, Clone)]
pub struct Export {
    pub bytes: Vec<u8>,
    pub filename: &'static str,
    pub media_type: &'static str,
}

impl Export {
    /// `Content-Disposition` value for this download.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename={}", self.filename)
    }
}

/// Header row, then one record per table row. No index column.
pub fn write_csv(table: &Table) -> Result<Vec<u8>, LedgerScanError> {
    let csv_err = |e: csv::Error| LedgerScanError::ExportFailed {
        format: "CSV",
        detail: e.to_string(),
    };

    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(&table.columns).map_err(csv_err)?;
    for row in &table.rows {
        writer
            .write_record(row.iter().map(Cell::to_string))
            .map_err(csv_err)?;
    }

    writer.into_inner().map_err(|e| LedgerScanError::ExportFailed {
        format: "CSV",
        detail: e.to_string(),
    })
}

/// Single-sheet workbook named `sheet_name` with a bold header row.
pub fn write_xlsx(table: &Table, sheet_name: &str) -> Result<Vec<u8>, LedgerScanError> {
    build_workbook(table, sheet_name).map_err(|e| LedgerScanError::ExportFailed {
        format: "XLSX",
        detail: e.to_string(),
    })
}

fn build_workbook(table: &Table, sheet_name: &str) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    let header = Format::new().set_bold();
    for (col, name) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, column_index(col)?, name, &header)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let row_num = u32::try_from(r + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (c, cell) in row.iter().enumerate() {
            let col_num = column_index(c)?;
            match cell {
                Cell::Null => {}
                Cell::Text(s) => {
                    worksheet.write_string(row_num, col_num, s)?;
                }
                Cell::Number(n) => {
                    worksheet.write_number(row_num, col_num, *n)?;
                }
                Cell::Bool(b) => {
                    worksheet.write_boolean(row_num, col_num, *b)?;
                }
            }
        }
    }

    workbook.save_to_buffer()
}

fn column_index(col: usize) -> Result<u16, XlsxError> {
    u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
    use std::io::Cursor;

    fn sample() -> Table {
        Table {
            columns: vec!["Flat".into(), "Member, Name".into(), "Due".into(), "Paid".into()],
            rows: vec![
                vec![
                    Cell::Text("A-101".into()),
                    Cell::Text("Asha \"Tai\" Rao".into()),
                    Cell::Number(1250.5),
                    Cell::Bool(true),
                ],
                vec![Cell::Text("A-102".into()), Cell::Null, Cell::Number(100.0), Cell::Null],
            ],
        }
    }

    #[test]
    fn csv_quotes_and_nulls() {
        let csv = String::from_utf8(write_csv(&sample()).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Flat,\"Member, Name\",Due,Paid");
        assert_eq!(lines[1], "A-101,\"Asha \"\"Tai\"\" Rao\",1250.5,True");
        assert_eq!(lines[2], "A-102,,100,");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn xlsx_has_named_sheet_and_cells() {
        let bytes = write_xlsx(&sample(), SHEET_NAME).unwrap();
        assert_eq!(&bytes[..2], b"PK");

        let mut book: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        assert_eq!(book.sheet_names(), vec![SHEET_NAME.to_string()]);

        let range = book.worksheet_range(SHEET_NAME).unwrap();
        let rows: Vec<&[Data]> = range.rows().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][1], Data::String("Member, Name".into()));
        assert_eq!(rows[1][2], Data::Float(1250.5));
        assert_eq!(rows[1][3], Data::Bool(true));
        assert_eq!(rows[2][1], Data::Empty);
    }

    #[test]
    fn content_disposition_names_file() {
        let e = Export {
            bytes: vec![],
            filename: "converted_template.csv",
            media_type: CSV_MEDIA_TYPE,
        };
        assert_eq!(
            e.content_disposition(),
            "attachment; filename=converted_template.csv"
        );
    }
}
