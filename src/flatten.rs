//! Flattening extracted records into output tables.
//!
//! Two shapes:
//!
//! * **Template**: the fixed accounting-import schema. Thirteen placeholder
//!   and identity columns followed by exactly [`MAX_EXPENSE_COLUMNS`]
//!   `Expense Code N` / `Expense Amount N` pairs, filled from the discovered
//!   headers in order. Extra headers are dropped; missing ones are null.
//! * **Direct**: each JSON object becomes one row unchanged. Columns are the
//!   union of keys across rows, in first-seen order.

use crate::error::{LedgerScanError, Stage};
use crate::model::{Amount, Cell, ExtractedMember, Table};
use crate::pipeline::postprocess::JsonRow;
use indexmap::IndexSet;
use tracing::debug;

/// Number of expense code/amount pairs in the import template.
pub const MAX_EXPENSE_COLUMNS: usize = 10;

/// Template columns preceding the expense pairs, in output order.
///
/// Only `Bill Number` and `Narration` are sourced from the document; the rest
/// are filled downstream by the ledger-import tooling.
pub const TEMPLATE_FIXED_COLUMNS: [&str; 13] = [
    "Bill Number",
    "Bill Date",
    "Vendor Code",
    "Due Date",
    "Narration",
    "CGST Tax Ledger Code",
    "CGST Amount",
    "SGST Tax Ledger Code",
    "SGST Amount",
    "IGST Tax Ledger Code",
    "IGST Amount",
    "TDS Code",
    "TDS Amount",
];

/// One expense code/amount pair of a template row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpensePair {
    pub code: Option<String>,
    pub amount: Option<Amount>,
}

/// A row of the accounting template.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatTemplateRow {
    pub bill_number: String,
    pub narration: Option<String>,
    pub expenses: [ExpensePair; MAX_EXPENSE_COLUMNS],
}

impl FlatTemplateRow {
    /// Flatten one member against the discovered headers.
    pub fn from_member(member: &ExtractedMember, headers: &[String]) -> Self {
        let expenses = std::array::from_fn(|i| match headers.get(i) {
            Some(header) => ExpensePair {
                code: Some(header.clone()),
                amount: member.charge(header).cloned(),
            },
            None => ExpensePair::default(),
        });

        Self {
            bill_number: bill_number(member.wing.as_deref(), member.unit_no.as_deref()),
            narration: member.member_name.clone(),
            expenses,
        }
    }

    /// Cells in [`template_columns`] order.
    pub fn cells(&self) -> Vec<Cell> {
        let mut cells = Vec::with_capacity(TEMPLATE_FIXED_COLUMNS.len() + 2 * MAX_EXPENSE_COLUMNS);
        cells.push(Cell::Text(self.bill_number.clone()));
        cells.extend([Cell::Null, Cell::Null, Cell::Null]);
        cells.push(Cell::from(self.narration.clone()));
        cells.extend(std::iter::repeat(Cell::Null).take(8));
        for pair in &self.expenses {
            cells.push(Cell::from(pair.code.clone()));
            cells.push(Cell::from(pair.amount.as_ref()));
        }
        cells
    }
}

/// `{wing}-{unit}` with absent parts empty and outer hyphens stripped.
///
/// `("B", "205")` → `"B-205"`, `(None, "205")` → `"205"`,
/// `("B", None)` → `"B"`, `(None, None)` → `""`.
pub fn bill_number(wing: Option<&str>, unit_no: Option<&str>) -> String {
    format!("{}-{}", wing.unwrap_or(""), unit_no.unwrap_or(""))
        .trim_matches('-')
        .to_string()
}

/// Full header row of the template.
pub fn template_columns() -> Vec<String> {
    let mut columns: Vec<String> = TEMPLATE_FIXED_COLUMNS.iter().map(|c| c.to_string()).collect();
    for n in 1..=MAX_EXPENSE_COLUMNS {
        columns.push(format!("Expense Code {n}"));
        columns.push(format!("Expense Amount {n}"));
    }
    columns
}

/// Flatten every member into the template table.
///
/// Fails with `NoData` when there are no members.
pub fn flatten_template(
    members: &[ExtractedMember],
    headers: &[String],
) -> Result<Table, LedgerScanError> {
    if members.is_empty() {
        return Err(LedgerScanError::NoData {
            stage: Stage::Extraction,
        });
    }
    if headers.len() > MAX_EXPENSE_COLUMNS {
        debug!(
            "Dropping {} headers past the {} template expense columns: {:?}",
            headers.len() - MAX_EXPENSE_COLUMNS,
            MAX_EXPENSE_COLUMNS,
            &headers[MAX_EXPENSE_COLUMNS..]
        );
    }

    let rows = members
        .iter()
        .map(|m| FlatTemplateRow::from_member(m, headers).cells())
        .collect();

    Ok(Table {
        columns: template_columns(),
        rows,
    })
}

/// Flatten direct-export rows 1:1.
///
/// Keys missing from a row become null cells. Fails with `NoData` when there
/// are no rows.
pub fn flatten_direct(rows: &[JsonRow]) -> Result<Table, LedgerScanError> {
    if rows.is_empty() {
        return Err(LedgerScanError::NoData {
            stage: Stage::DirectExport,
        });
    }

    let columns: IndexSet<&str> = rows
        .iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .collect();

    let table_rows = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|col| row.get(*col).map_or(Cell::Null, Cell::from_json))
                .collect()
        })
        .collect();

    Ok(Table {
        columns: columns.into_iter().map(str::to_string).collect(),
        rows: table_rows,
    })
}
