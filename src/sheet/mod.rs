// src/sheet/mod.rs
pub mod headers;
pub mod reader;

use calamine::Data;

/// Column whose values select the per-project output directory.
pub const PRIMARY_KEY_COLUMN: &str = "project_code";
/// Column whose values select the output file within a project directory.
pub const SECONDARY_KEY_COLUMN: &str = "batch_code";

/// One scalar cell value. Numeric-looking cells stay numeric all the way to
/// the output file; only display/sanitization paths render them as text.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// Convert a raw sheet cell. Empty and error cells yield `None` so rows
    /// stay sparse; dates carry over as their serial number.
    pub fn from_sheet(data: &Data) -> Option<Cell> {
        match data {
            Data::Empty | Data::Error(_) => None,
            Data::String(s) => Some(Cell::Text(s.clone())),
            Data::Float(f) => Some(Cell::Number(*f)),
            Data::Int(i) => Some(Cell::Number(*i as f64)),
            Data::Bool(b) => Some(Cell::Bool(*b)),
            Data::DateTime(dt) => Some(Cell::Number(dt.as_f64())),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Some(Cell::Text(s.clone())),
        }
    }

    /// Text form of the cell, as used for headers and group keys.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Bool(b) => b.to_string(),
        }
    }
}

/// Render a float the way sheet tools do: integral values drop the ".0".
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// One input row: column names paired with cell values, in sheet column
/// order. Cells that were empty in the sheet are simply absent, so two rows
/// of the same table can expose different key sets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, Cell)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from (name, cell) pairs, keeping their order.
    pub fn from_pairs(pairs: Vec<(String, Cell)>) -> Self {
        Self { fields: pairs }
    }

    pub fn push(&mut self, name: &str, cell: Cell) {
        self.fields.push((name.to_string(), cell));
    }

    /// First cell stored under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Cell> {
        self.fields
            .iter()
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, cell)| cell)
    }

    /// Column names present in this row, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A fully materialized input table.
#[derive(Debug, Clone)]
pub struct ParsedTable {
    /// Validated header list; contains both required key columns.
    pub headers: Vec<String>,
    /// Data rows in sheet order, blank rows dropped.
    pub rows: Vec<Row>,
}
