use std::fmt;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

pub const MONTH_NAMES: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// pt-BR name of a 1-based month. Out-of-range months yield an empty string.
pub fn month_name(month: u32) -> &'static str {
    match month {
        1..=12 => MONTH_NAMES[(month - 1) as usize],
        _ => "",
    }
}

/// Income or expense. Anything that isn't labelled as income is an expense;
/// transfers and refunds have to be pre-labelled by whoever exports the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MovementKind {
    Receita,
    Despesa,
}

impl MovementKind {
    pub fn classify(raw: &str) -> Self {
        if raw.to_lowercase().contains("receita") {
            MovementKind::Receita
        } else {
            MovementKind::Despesa
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub date: Option<NaiveDate>,
    pub description: String,
    pub category: String,
    pub subcategory: String,
    pub kind_raw: String,
    pub kind: MovementKind,
    pub amount: Decimal,
}

impl Transaction {
    pub fn year(&self) -> Option<i32> {
        self.date.map(|d| d.year())
    }

    pub fn month(&self) -> Option<u32> {
        self.date.map(|d| d.month())
    }

    /// True when the row is dated in the given year (and month, if any).
    pub fn is_in(&self, year: i32, month: Option<u32>) -> bool {
        match (self.year(), self.month()) {
            (Some(y), Some(m)) => y == year && month.map_or(true, |want| want == m),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub date: Option<NaiveDate>,
    pub institution: String,
    pub amount: Decimal,
}

impl Snapshot {
    pub fn year_month(&self) -> Option<YearMonth> {
        self.date.map(YearMonth::from_date)
    }
}

/// Calendar month key. Field order makes the derived `Ord` chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }

    /// Column label, e.g. "Março/2024".
    pub fn label(&self) -> String {
        format!("{}/{}", month_name(self.month), self.year)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixRow {
    pub label: String,
    pub values: Vec<Decimal>,
}

/// A labelled pivot table of raw amounts. Every row has one value per column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Matrix {
    pub columns: Vec<String>,
    pub rows: Vec<MatrixRow>,
}

impl Matrix {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, label: impl Into<String>, values: Vec<Decimal>) {
        debug_assert_eq!(values.len(), self.columns.len());
        self.rows.push(MatrixRow {
            label: label.into(),
            values,
        });
    }
}

#[cfg(test)]
impl Matrix {
    pub fn row(&self, label: &str) -> Option<&[Decimal]> {
        self.rows
            .iter()
            .find(|r| r.label == label)
            .map(|r| r.values.as_slice())
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }

    pub fn row_labels(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.label.as_str()).collect()
    }

    /// Value at (row label, column label).
    pub fn get(&self, row: &str, column: &str) -> Option<Decimal> {
        let idx = self.column_index(column)?;
        self.row(row).and_then(|values| values.get(idx).copied())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KpiSummary {
    pub receitas: Decimal,
    pub despesas: Decimal,
    pub saldo: Decimal,
}
