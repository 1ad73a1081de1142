//! Tabular query results.
//!
//! A [`Table`] is what the query executor hands to the prompt builder:
//! named columns and rows of dynamically typed [`Value`] cells.

use serde::Serialize;
use std::fmt;

/// A single result cell.
///
/// The variant is chosen by the database backend from the driver's
/// column information (`SQLite`) or inferred from the text protocol
/// (`PostgreSQL`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL `NULL`.
    Null,
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// Exact decimal kept as its literal text (e.g. `NUMERIC(12,2)`).
    Decimal(String),
    /// Text value.
    Text(String),
    /// Binary value.
    Blob(Vec<u8>),
}

impl Value {
    /// Infers a value from a text-protocol cell.
    ///
    /// Canonical integers become [`Value::Int`] and plain decimal literals
    /// become [`Value::Decimal`]. Anything that would not survive the round
    /// trip, such as the ZIP code `02134`, stays [`Value::Text`].
    ///
    /// # Examples
    ///
    /// ```
    /// use contrib_qa::core::Value;
    ///
    /// assert_eq!(Value::from_text(Some("500")), Value::Int(500));
    /// assert_eq!(Value::from_text(Some("500.00")), Value::Decimal("500.00".to_string()));
    /// assert_eq!(Value::from_text(Some("02134")), Value::Text("02134".to_string()));
    /// assert_eq!(Value::from_text(None), Value::Null);
    /// ```
    #[must_use]
    pub fn from_text(cell: Option<&str>) -> Self {
        let Some(text) = cell else {
            return Self::Null;
        };

        if let Ok(n) = text.parse::<i64>()
            && n.to_string() == text
        {
            return Self::Int(n);
        }

        if is_decimal_literal(text) {
            return Self::Decimal(text.to_string());
        }

        Self::Text(text.to_string())
    }

    /// Returns true for numeric variants.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_) | Self::Decimal(_))
    }

    /// Returns true for `NULL`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Matches `-?(0|[1-9][0-9]*)\.[0-9]+`.
fn is_decimal_literal(text: &str) -> bool {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let Some((whole, frac)) = unsigned.split_once('.') else {
        return false;
    };

    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    let canonical_whole = whole == "0" || !whole.starts_with('0');

    digits(whole) && digits(frac) && canonical_whole
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Decimal(s) | Self::Text(s) => f.write_str(s),
            Self::Blob(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// A query result: named columns and zero or more rows.
///
/// A table with zero rows is "empty" regardless of how many columns it
/// declares. Execution failures produce [`Table::empty`], which has neither.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Creates a table from column names and rows.
    ///
    /// Rows shorter than the column list are padded with `NULL`; longer rows
    /// are cut to the column count.
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Null);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Returns a table with no columns and no rows.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Column names in result order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Result rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns true when the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns a copy holding at most the first `n` rows.
    #[must_use]
    pub fn head(&self, n: usize) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Looks up a cell by row index and column name.
    #[must_use]
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }
}
