//! Request-scoped data types: extracted members, template rows and the
//! generic table both exports serialise.

use crate::pipeline::postprocess::JsonRow;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fmt;

/// A number with thousands separators: western `1,234,567` or Indian
/// `12,34,567`. The last group is always three digits, so a decimal comma
/// like `12,50` never matches.
static GROUPED_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?(?:\d{1,3}(?:,\d{3})+|\d{1,2}(?:,\d{2})+,\d{3})(?:\.\d+)?$").unwrap()
});

/// A charge amount after null/float coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Amount {
    Number(f64),
    /// A non-null value that did not read as a number. Passed through as-is.
    Text(String),
}

impl Amount {
    /// Coerce a JSON charge value. `null` means "no charge".
    pub fn from_json(value: &Value) -> Option<Amount> {
        match value {
            Value::Null => None,
            Value::Number(n) => n.as_f64().map(Amount::Number),
            Value::String(s) => Some(parse_amount(s)),
            other => Some(Amount::Text(other.to_string())),
        }
    }
}

/// "1,250.50" → 1250.5; "12,50" and "abc" pass through as text.
fn parse_amount(raw: &str) -> Amount {
    let trimmed = raw.trim();
    let parsed = if GROUPED_NUMBER.is_match(trimmed) {
        trimmed.replace(',', "").parse::<f64>()
    } else {
        trimmed.parse::<f64>()
    };
    match parsed {
        Ok(n) if n.is_finite() => Amount::Number(n),
        _ => Amount::Text(raw.to_string()),
    }
}

/// One member row from the extraction round.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedMember {
    pub wing: Option<String>,
    pub unit_no: Option<String>,
    pub member_name: Option<String>,
    pub charges: IndexMap<String, Option<Amount>>,
}

impl ExtractedMember {
    /// Read a member from one object of the extraction array.
    ///
    /// Lenient by intent: unknown keys are ignored, scalar fields accept
    /// numbers as well as strings, and a missing or non-object `Charges`
    /// reads as no charges.
    pub fn from_row(row: &JsonRow) -> Self {
        let charges = match row.get("Charges") {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(label, value)| (label.clone(), Amount::from_json(value)))
                .collect(),
            _ => IndexMap::new(),
        };

        Self {
            wing: text_field(row, &["Wing"]),
            unit_no: text_field(row, &["Unit No", "UnitNo"]),
            member_name: text_field(row, &["Member Name", "MemberName"]),
            charges,
        }
    }

    /// Amount recorded for `header`, `None` when absent or null.
    pub fn charge(&self, header: &str) -> Option<&Amount> {
        self.charges.get(header).and_then(Option::as_ref)
    }
}

fn text_field(row: &JsonRow, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| row.get(*k))
        .and_then(|v| match v {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
}

/// One output cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// Map a direct-export JSON value onto a cell.
    ///
    /// Nested arrays and objects become their JSON text.
    pub fn from_json(value: &Value) -> Cell {
        match value {
            Value::Null => Cell::Null,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => n.as_f64().map_or_else(|| Cell::Text(n.to_string()), Cell::Number),
            Value::String(s) => Cell::Text(s.clone()),
            nested => Cell::Text(nested.to_string()),
        }
    }
}

impl From<Option<String>> for Cell {
    fn from(v: Option<String>) -> Self {
        v.map_or(Cell::Null, Cell::Text)
    }
}

impl From<Option<&Amount>> for Cell {
    fn from(v: Option<&Amount>) -> Self {
        match v {
            None => Cell::Null,
            Some(Amount::Number(n)) => Cell::Number(*n),
            Some(Amount::Text(s)) => Cell::Text(s.clone()),
        }
    }
}

/// CSV rendering: null is an empty field, floats use the shortest form
/// (`100.0` → `100`).
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
        }
    }
}

/// A flat table: ordered column names and equally wide rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `row`, looked up by column name.
    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(col)
    }
}
