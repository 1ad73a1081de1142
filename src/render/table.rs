//! Fixed-width text rendering of result tables.
//!
//! The same renderer feeds the summary prompt (every row, every character)
//! and the CLI preview (capped cell width).

use crate::core::{Table, Value};
use crate::render::unicode::{ellipsize, grapheme_count, pad};
use std::fmt::Write;

/// Column separator.
const SEPARATOR: &str = "  ";

/// Options for [`render_table`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Maximum cell width in grapheme clusters; `None` renders cells whole.
    pub max_cell_width: Option<usize>,
}

impl RenderOptions {
    /// Renders every cell in full.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            max_cell_width: None,
        }
    }

    /// Caps cell width, marking cut cells with an ellipsis.
    #[must_use]
    pub const fn preview(max_cell_width: usize) -> Self {
        Self {
            max_cell_width: Some(max_cell_width),
        }
    }
}

/// Renders a table as aligned text without an index column.
///
/// Numeric columns (every non-null cell numeric) are right-aligned, all
/// others left-aligned. A table without columns renders as `(empty)`.
///
/// # Examples
///
/// ```
/// use contrib_qa::core::{Table, Value};
/// use contrib_qa::render::{RenderOptions, render_table};
///
/// let table = Table::new(
///     vec!["name".to_string(), "total".to_string()],
///     vec![vec![Value::from("SMITH, JOHN"), Value::Int(500)]],
/// );
/// let text = render_table(&table, RenderOptions::full());
/// assert_eq!(text, "name         total\nSMITH, JOHN    500\n");
/// ```
#[must_use]
pub fn render_table(table: &Table, options: RenderOptions) -> String {
    if table.column_count() == 0 {
        return "(empty)\n".to_string();
    }

    let clip = |s: String| match options.max_cell_width {
        Some(max) => ellipsize(&s, max),
        None => s,
    };

    let header: Vec<String> = table.columns().iter().map(|c| clip(c.clone())).collect();
    let cells: Vec<Vec<String>> = table
        .rows()
        .iter()
        .map(|row| row.iter().map(|v| clip(v.to_string())).collect())
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|col| {
            cells
                .iter()
                .map(|row| grapheme_count(&row[col]))
                .chain(std::iter::once(grapheme_count(&header[col])))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let numeric: Vec<bool> = (0..header.len())
        .map(|col| is_numeric_column(table, col))
        .collect();

    let mut output = String::new();
    write_line(&mut output, &header, &widths, &numeric);
    for row in &cells {
        write_line(&mut output, row, &widths, &numeric);
    }
    output
}

fn write_line(output: &mut String, cells: &[String], widths: &[usize], numeric: &[bool]) {
    let line = cells
        .iter()
        .zip(widths)
        .zip(numeric)
        .map(|((cell, &width), &right)| pad(cell, width, right))
        .collect::<Vec<_>>()
        .join(SEPARATOR);
    let _ = writeln!(output, "{}", line.trim_end());
}

fn is_numeric_column(table: &Table, col: usize) -> bool {
    let mut values = table
        .rows()
        .iter()
        .filter_map(|row| row.get(col))
        .filter(|v| !v.is_null())
        .peekable();

    values.peek().is_some() && values.all(Value::is_numeric)
}
