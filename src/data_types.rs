// src/data_types.rs
use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::{DateTime, Local};
use serde_json::Value;

/// A worksheet address: spreadsheet key plus tab title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRef {
    pub spreadsheet_key: String,
    pub worksheet: String,
}

impl SheetRef {
    pub fn new(spreadsheet_key: impl Into<String>, worksheet: impl Into<String>) -> Self {
        SheetRef {
            spreadsheet_key: spreadsheet_key.into(),
            worksheet: worksheet.into(),
        }
    }
}

impl fmt::Display for SheetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.spreadsheet_key, self.worksheet)
    }
}

/// A single cell as delivered by the Sheets API, without coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl From<&Value> for CellValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Empty,
            Value::String(s) if s.is_empty() => CellValue::Empty,
            Value::String(s) => CellValue::Text(s.clone()),
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Number(n) => n
                .as_f64()
                .map(CellValue::Number)
                .unwrap_or_else(|| CellValue::Text(n.to_string())),
            // Sheets never nests values in a cell; keep whatever arrived as text.
            other => CellValue::Text(other.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            // Whole numbers print without a trailing ".0" so ids read like the sheet shows them.
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

/// Normalized worksheet contents.
///
/// Every row has exactly `columns.len()` cells and at least one of them is
/// non-empty. Column and row order are those of the source sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn empty() -> Self {
        Table::default()
    }

    /// Builds a table from raw value rows, using the first row as header.
    ///
    /// Short rows are padded with [`CellValue::Empty`]; cells past the header
    /// width add `Unnamed: <index>` columns. Blank header cells are named the
    /// same way and repeated names get a `.<n>` suffix. Rows that are empty in
    /// every column are dropped.
    pub fn from_values(values: &[Vec<Value>]) -> Self {
        let Some((header, data)) = values.split_first() else {
            return Table::empty();
        };

        let width = values.iter().map(Vec::len).max().unwrap_or(0);
        let columns = unique_column_names(header, width);

        let rows = data
            .iter()
            .map(|row| {
                let mut cells: Vec<CellValue> = row.iter().map(CellValue::from).collect();
                cells.resize(width, CellValue::Empty);
                cells
            })
            .filter(|cells| cells.iter().any(|cell| !cell.is_empty()))
            .collect();

        Table { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell lookup by row position and column name.
    pub fn get(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// A row as a column-name to cell mapping.
    pub fn record(&self, row: usize) -> Option<HashMap<&str, &CellValue>> {
        let cells = self.rows.get(row)?;
        Some(
            self.columns
                .iter()
                .map(String::as_str)
                .zip(cells.iter())
                .collect(),
        )
    }

    /// First `n` rows, same columns.
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}

fn unique_column_names(header: &[Value], width: usize) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::with_capacity(width);
    let mut suffixes: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(width);

    for i in 0..width {
        let base = match header.get(i).map(CellValue::from) {
            None | Some(CellValue::Empty) => format!("Unnamed: {}", i),
            Some(cell) => cell.to_string(),
        };

        let mut name = base.clone();
        if used.contains(&name) {
            // A suffixed name may itself be a header further left.
            let count = suffixes.entry(base.clone()).or_insert(0);
            loop {
                *count += 1;
                name = format!("{}.{}", base, count);
                if !used.contains(&name) {
                    break;
                }
            }
        }
        used.insert(name.clone());
        names.push(name);
    }

    names
}

/// A table together with where and when it was fetched.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub source: SheetRef,
    pub spreadsheet_title: Option<String>,
    pub fetched_at: DateTime<Local>,
    pub table: Table,
}
