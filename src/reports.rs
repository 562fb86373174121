use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{KpiSummary, Matrix, MovementKind, Transaction, MONTH_NAMES};

pub const RECEITA: &str = "Receita";
pub const DESPESA: &str = "Despesa";
pub const VIAGEM: &str = "Viagem";
pub const SALDO: &str = "Saldo";
pub const TOTAL_ANO: &str = "Total Ano";
pub const TOTAL_GERAL: &str = "Total do Ano Geral";

const TRAVEL_MARKER: &str = "viagem";

// ---------------------------------------------------------------------------
// Month bucketing
// ---------------------------------------------------------------------------

/// Twelve month columns plus the yearly total.
fn month_columns() -> Vec<String> {
    MONTH_NAMES
        .iter()
        .map(|m| m.to_string())
        .chain(std::iter::once(TOTAL_ANO.to_string()))
        .collect()
}

/// Sum amounts per calendar month. Undated rows fall out here.
fn monthly_sums<'a>(rows: impl Iterator<Item = &'a Transaction>) -> [Decimal; 12] {
    let mut sums = [Decimal::ZERO; 12];
    for t in rows {
        if let Some(m) = t.month() {
            sums[(m - 1) as usize] += t.amount;
        }
    }
    sums
}

fn with_total(months: [Decimal; 12]) -> Vec<Decimal> {
    let total: Decimal = months.iter().sum();
    months.into_iter().chain(std::iter::once(total)).collect()
}

fn in_year(rows: &[Transaction], year: i32) -> impl Iterator<Item = &Transaction> {
    rows.iter().filter(move |t| t.is_in(year, None))
}

fn is_travel(t: &Transaction) -> bool {
    t.subcategory.to_lowercase().contains(TRAVEL_MARKER)
}

fn saldo_by_month(rows: &[Transaction], year: i32) -> [Decimal; 12] {
    let receita = monthly_sums(in_year(rows, year).filter(|t| t.kind == MovementKind::Receita));
    let despesa = monthly_sums(in_year(rows, year).filter(|t| t.kind == MovementKind::Despesa));
    std::array::from_fn(|i| receita[i] - despesa[i])
}

// ---------------------------------------------------------------------------
// Yearly consolidated matrix
// ---------------------------------------------------------------------------

/// Receita / Despesa / Viagem / Saldo by month for one year.
///
/// Viagem is an informational subtotal: its rows are also counted under
/// Receita or Despesa, so the four rows don't add up to anything.
pub fn monthly_matrix(rows: &[Transaction], year: i32) -> Matrix {
    let receita = monthly_sums(in_year(rows, year).filter(|t| t.kind == MovementKind::Receita));
    let despesa = monthly_sums(in_year(rows, year).filter(|t| t.kind == MovementKind::Despesa));
    let viagem = monthly_sums(in_year(rows, year).filter(|t| is_travel(t)));

    let receita = with_total(receita);
    let despesa = with_total(despesa);
    // Total Ano included
    let saldo: Vec<Decimal> = receita.iter().zip(&despesa).map(|(r, d)| r - d).collect();

    let mut matrix = Matrix::new(month_columns());
    matrix.push_row(RECEITA, receita);
    matrix.push_row(DESPESA, despesa);
    matrix.push_row(VIAGEM, with_total(viagem));
    matrix.push_row(SALDO, saldo);
    tracing::debug!(year, "built monthly matrix");
    matrix
}

// ---------------------------------------------------------------------------
// Household expenses
// ---------------------------------------------------------------------------

/// Which column a household category list is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryField {
    Categoria,
    Subcategoria,
}

impl CategoryField {
    fn of<'a>(&self, t: &'a Transaction) -> &'a str {
        match self {
            CategoryField::Categoria => &t.category,
            CategoryField::Subcategoria => &t.subcategory,
        }
    }
}

/// Fixed household categories by month, matched on `Categoria`.
pub fn household_matrix(rows: &[Transaction], year: i32, categories: &[String]) -> Matrix {
    household_matrix_by(rows, year, categories, CategoryField::Categoria)
}

/// One row per listed category (zero-filled when absent from the data) and a
/// grand-total row. Rows outside the list are ignored.
pub fn household_matrix_by(
    rows: &[Transaction],
    year: i32,
    categories: &[String],
    field: CategoryField,
) -> Matrix {
    let mut matrix = Matrix::new(month_columns());
    let mut grand_total = vec![Decimal::ZERO; matrix.columns.len()];

    for category in categories {
        let values = with_total(monthly_sums(
            in_year(rows, year).filter(|t| field.of(t) == category.as_str()),
        ));
        for (acc, v) in grand_total.iter_mut().zip(&values) {
            *acc += *v;
        }
        matrix.push_row(category.clone(), values);
    }
    matrix.push_row(TOTAL_GERAL, grand_total);
    tracing::debug!(year, categories = categories.len(), ?field, "built household matrix");
    matrix
}

// ---------------------------------------------------------------------------
// Monthly KPIs and trend
// ---------------------------------------------------------------------------

pub fn kpi_summary(rows: &[Transaction], year: i32, month: u32) -> KpiSummary {
    let mut receitas = Decimal::ZERO;
    let mut despesas = Decimal::ZERO;
    for t in rows.iter().filter(|t| t.is_in(year, Some(month))) {
        match t.kind {
            MovementKind::Receita => receitas += t.amount,
            MovementKind::Despesa => despesas += t.amount,
        }
    }
    KpiSummary {
        receitas,
        despesas,
        saldo: receitas - despesas,
    }
}

/// Saldo for each of the 12 months, in calendar order.
pub fn yearly_trend(rows: &[Transaction], year: i32) -> Vec<(u32, Decimal)> {
    saldo_by_month(rows, year)
        .into_iter()
        .enumerate()
        .map(|(i, saldo)| (i as u32 + 1, saldo))
        .collect()
}

// ---------------------------------------------------------------------------
// Breakdown and register
// ---------------------------------------------------------------------------

/// Yearly totals per subcategory for one movement kind, largest first.
pub fn subcategory_breakdown(
    rows: &[Transaction],
    year: i32,
    kind: MovementKind,
) -> Vec<(String, Decimal)> {
    let mut totals: BTreeMap<&str, Decimal> = BTreeMap::new();
    for t in in_year(rows, year).filter(|t| t.kind == kind && !t.subcategory.is_empty()) {
        *totals.entry(t.subcategory.as_str()).or_default() += t.amount;
    }
    let mut items: Vec<(String, Decimal)> = totals
        .into_iter()
        .map(|(name, total)| (name.to_string(), total))
        .collect();
    items.sort_by(|a, b| b.1.cmp(&a.1));
    items
}

/// Transactions of one month, oldest first. Same-day rows keep file order.
pub fn month_register(rows: &[Transaction], year: i32, month: u32) -> Vec<&Transaction> {
    let mut register: Vec<&Transaction> =
        rows.iter().filter(|t| t.is_in(year, Some(month))).collect();
    register.sort_by_key(|t| t.date);
    register
}

// ---------------------------------------------------------------------------
// Filter choices
// ---------------------------------------------------------------------------

pub fn available_years(rows: &[Transaction]) -> Vec<i32> {
    let years: BTreeSet<i32> = rows.iter().filter_map(|t| t.year()).collect();
    years.into_iter().collect()
}

pub fn available_months(rows: &[Transaction], year: i32) -> Vec<u32> {
    let months: BTreeSet<u32> = in_year(rows, year).filter_map(|t| t.month()).collect();
    months.into_iter().collect()
}

/// The period shown when no filter is given: today's month when there is
/// data for it, otherwise the latest month on file.
pub fn default_period(rows: &[Transaction], today: NaiveDate) -> Option<(i32, u32)> {
    let years = available_years(rows);
    let year = if years.contains(&today.year()) {
        today.year()
    } else {
        *years.last()?
    };
    let months = available_months(rows, year);
    let month = if year == today.year() && months.contains(&today.month()) {
        today.month()
    } else {
        *months.last()?
    };
    Some((year, month))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn txn(date: Option<(i32, u32, u32)>, cat: &str, sub: &str, tipo: &str, amount: &str) -> Transaction {
        Transaction {
            date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            description: format!("{sub} {amount}"),
            category: cat.to_string(),
            subcategory: sub.to_string(),
            kind_raw: tipo.to_string(),
            kind: MovementKind::classify(tipo),
            amount: d(amount),
        }
    }

    fn seed() -> Vec<Transaction> {
        vec![
            txn(Some((2024, 1, 15)), "Renda", "Salário", "Receita", "1000"),
            txn(Some((2024, 1, 20)), "Lazer", "Viagem SP", "Despesa", "300"),
        ]
    }

    #[test]
    fn test_monthly_matrix_january_example() {
        let m = monthly_matrix(&seed(), 2024);
        assert_eq!(m.get(RECEITA, "Janeiro"), Some(d("1000")));
        assert_eq!(m.get(DESPESA, "Janeiro"), Some(d("300")));
        assert_eq!(m.get(VIAGEM, "Janeiro"), Some(d("300")));
        assert_eq!(m.get(SALDO, "Janeiro"), Some(d("700")));
        for month in &MONTH_NAMES[1..] {
            for row in [RECEITA, DESPESA, VIAGEM, SALDO] {
                assert_eq!(m.get(row, month), Some(d("0")), "{row}/{month}");
            }
        }
        for row in [RECEITA, DESPESA, VIAGEM, SALDO] {
            assert_eq!(m.get(row, TOTAL_ANO), m.get(row, "Janeiro"));
        }
    }

    #[test]
    fn test_monthly_matrix_shape_is_fixed() {
        for rows in [vec![], seed()] {
            let m = monthly_matrix(&rows, 1999);
            assert_eq!(m.columns.len(), 13);
            assert_eq!(m.columns[0], "Janeiro");
            assert_eq!(m.columns[11], "Dezembro");
            assert_eq!(m.columns[12], TOTAL_ANO);
            assert_eq!(m.row_labels(), vec![RECEITA, DESPESA, VIAGEM, SALDO]);
            assert!(m.rows.iter().all(|r| r.values.len() == 13));
        }
    }

    #[test]
    fn test_saldo_is_receita_minus_despesa() {
        let rows = vec![
            txn(Some((2023, 3, 1)), "a", "x", "Receita", "250.5"),
            txn(Some((2023, 3, 9)), "a", "x", "Despesa", "400.25"),
            txn(Some((2023, 7, 9)), "a", "x", "despesa", "12"),
            txn(Some((2023, 11, 2)), "a", "x", "RECEITA extra", "80"),
            txn(Some((2024, 11, 2)), "a", "x", "Receita", "5000"),
        ];
        let m = monthly_matrix(&rows, 2023);
        let receita = m.row(RECEITA).unwrap();
        let despesa = m.row(DESPESA).unwrap();
        let saldo = m.row(SALDO).unwrap();
        for i in 0..13 {
            assert_eq!(saldo[i], receita[i] - despesa[i], "column {i}");
        }
        assert_eq!(m.get(SALDO, "Março"), Some(d("-149.75")));
        assert_eq!(m.get(RECEITA, TOTAL_ANO), Some(d("330.5")));
    }

    #[test]
    fn test_saldo_identity_holds_for_cent_amounts() {
        let rows = vec![
            txn(Some((2024, 1, 3)), "a", "x", "Receita", "0.10"),
            txn(Some((2024, 2, 3)), "a", "x", "Receita", "0.20"),
            txn(Some((2024, 3, 3)), "a", "x", "Receita", "0.30"),
            txn(Some((2024, 4, 3)), "a", "x", "Receita", "1234.56"),
            txn(Some((2024, 1, 4)), "a", "x", "Despesa", "0.30"),
            txn(Some((2024, 2, 4)), "a", "x", "Despesa", "0.20"),
            txn(Some((2024, 3, 4)), "a", "x", "Despesa", "0.10"),
            txn(Some((2024, 4, 4)), "a", "x", "Despesa", "0.07"),
        ];
        let m = monthly_matrix(&rows, 2024);
        let receita = m.row(RECEITA).unwrap();
        let despesa = m.row(DESPESA).unwrap();
        let saldo = m.row(SALDO).unwrap();
        for i in 0..13 {
            assert_eq!(saldo[i], receita[i] - despesa[i], "column {i}");
        }
        assert_eq!(m.get(RECEITA, TOTAL_ANO), Some(d("1235.16")));
        assert_eq!(m.get(DESPESA, TOTAL_ANO), Some(d("0.67")));
        assert_eq!(m.get(SALDO, TOTAL_ANO), Some(d("1234.49")));
        assert_eq!(m.get(SALDO, "Janeiro"), Some(d("-0.20")));
    }

    #[test]
    fn test_viagem_ignores_movement_kind() {
        let rows = vec![
            txn(Some((2024, 5, 1)), "Lazer", "VIAGEM Europa", "Despesa", "100"),
            txn(Some((2024, 5, 2)), "Renda", "Reembolso viagem", "Receita", "40"),
            txn(Some((2024, 5, 3)), "Lazer", "Cinema", "Despesa", "20"),
        ];
        let m = monthly_matrix(&rows, 2024);
        assert_eq!(m.get(VIAGEM, "Maio"), Some(d("140")));
        assert_eq!(m.get(DESPESA, "Maio"), Some(d("120")));
    }

    #[test]
    fn test_undated_rows_are_left_out() {
        let mut rows = seed();
        rows.push(txn(None, "Casa", "Mercado", "Despesa", "50"));
        let m = monthly_matrix(&rows, 2024);
        assert_eq!(m.get(DESPESA, TOTAL_ANO), Some(d("300")));
    }

    #[test]
    fn test_household_matrix_keeps_every_category() {
        let categories: Vec<String> = ["ENEL", "Mercado", "IPTU"].iter().map(|s| s.to_string()).collect();
        let rows = vec![
            txn(Some((2024, 2, 10)), "Mercado", "Feira", "Despesa", "200"),
            txn(Some((2024, 3, 10)), "Mercado", "Feira", "Despesa", "150"),
            txn(Some((2024, 2, 11)), "ENEL", "Luz", "Despesa", "90"),
            txn(Some((2024, 2, 12)), "Lazer", "Cinema", "Despesa", "30"),
            txn(Some((2023, 2, 12)), "Mercado", "Feira", "Despesa", "999"),
        ];
        let m = household_matrix(&rows, 2024, &categories);
        assert_eq!(m.row_labels(), vec!["ENEL", "Mercado", "IPTU", TOTAL_GERAL]);
        assert_eq!(m.get("Mercado", TOTAL_ANO), Some(d("350")));
        assert_eq!(m.row("IPTU").unwrap(), &[Decimal::ZERO; 13]);
        assert_eq!(m.get(TOTAL_GERAL, "Fevereiro"), Some(d("290")));
        assert_eq!(m.get(TOTAL_GERAL, TOTAL_ANO), Some(d("440")));
    }

    #[test]
    fn test_household_matrix_by_subcategory() {
        let categories = vec!["SABESP".to_string()];
        let rows = vec![
            txn(Some((2024, 4, 1)), "Casa", "SABESP", "Despesa", "75"),
            txn(Some((2024, 4, 2)), "SABESP", "Outro", "Despesa", "10"),
        ];
        let m = household_matrix_by(&rows, 2024, &categories, CategoryField::Subcategoria);
        assert_eq!(m.get("SABESP", "Abril"), Some(d("75")));
        assert_eq!(m.get(TOTAL_GERAL, TOTAL_ANO), Some(d("75")));
    }

    #[test]
    fn test_kpi_summary() {
        let k = kpi_summary(&seed(), 2024, 1);
        assert_eq!(k.receitas, d("1000"));
        assert_eq!(k.despesas, d("300"));
        assert_eq!(k.saldo, d("700"));

        let empty = kpi_summary(&seed(), 2024, 2);
        assert_eq!(empty, KpiSummary {
                receitas: Decimal::ZERO,
                despesas: Decimal::ZERO,
                saldo: Decimal::ZERO
            });
    }

    #[test]
    fn test_kpi_summary_sums_cents_exactly() {
        let rows: Vec<Transaction> = (1..=10)
            .map(|day| txn(Some((2024, 6, day)), "a", "x", "Receita", "0.10"))
            .collect();
        let k = kpi_summary(&rows, 2024, 6);
        assert_eq!(k.receitas, Decimal::ONE);
        assert_eq!(k.saldo, Decimal::ONE);
    }

    #[test]
    fn test_yearly_trend_has_twelve_points() {
        let trend = yearly_trend(&seed(), 2024);
        assert_eq!(trend.len(), 12);
        assert_eq!(trend[0], (1, d("700")));
        assert_eq!(trend[11], (12, Decimal::ZERO));
        assert_eq!(yearly_trend(&[], 2024).len(), 12);
    }

    #[test]
    fn test_subcategory_breakdown() {
        let rows = vec![
            txn(Some((2024, 1, 1)), "a", "Mercado", "Despesa", "50"),
            txn(Some((2024, 2, 1)), "a", "Aluguel", "Despesa", "900"),
            txn(Some((2024, 3, 1)), "a", "Mercado", "Despesa", "70"),
            txn(Some((2024, 3, 1)), "a", "", "Despesa", "500"),
            txn(Some((2024, 3, 1)), "a", "Salário", "Receita", "3000"),
        ];
        let items = subcategory_breakdown(&rows, 2024, MovementKind::Despesa);
        assert_eq!(
            items,
            vec![("Aluguel".to_string(), d("900")), ("Mercado".to_string(), d("120"))]
        );
        let income = subcategory_breakdown(&rows, 2024, MovementKind::Receita);
        assert_eq!(income, vec![("Salário".to_string(), d("3000"))]);
    }

    #[test]
    fn test_month_register_sorted_by_date() {
        let rows = vec![
            txn(Some((2024, 1, 20)), "a", "late", "Despesa", "1"),
            txn(Some((2024, 1, 5)), "a", "early", "Despesa", "2"),
            txn(Some((2024, 2, 1)), "a", "other month", "Despesa", "3"),
            txn(Some((2024, 1, 5)), "a", "early too", "Despesa", "4"),
        ];
        let register = month_register(&rows, 2024, 1);
        let subs: Vec<&str> = register.iter().map(|t| t.subcategory.as_str()).collect();
        assert_eq!(subs, vec!["early", "early too", "late"]);
    }

    #[test]
    fn test_available_periods_and_default() {
        let rows = vec![
            txn(Some((2023, 11, 1)), "a", "x", "Despesa", "1"),
            txn(Some((2024, 2, 1)), "a", "x", "Despesa", "1"),
            txn(Some((2024, 5, 1)), "a", "x", "Despesa", "1"),
            txn(None, "a", "x", "Despesa", "1"),
        ];
        assert_eq!(available_years(&rows), vec![2023, 2024]);
        assert_eq!(available_months(&rows, 2024), vec![2, 5]);

        let today = |y, m| NaiveDate::from_ymd_opt(y, m, 10).unwrap();
        assert_eq!(default_period(&rows, today(2024, 2)), Some((2024, 2)));
        assert_eq!(default_period(&rows, today(2024, 3)), Some((2024, 5)));
        assert_eq!(default_period(&rows, today(2026, 1)), Some((2024, 5)));
        assert_eq!(default_period(&[], today(2026, 1)), None);
    }
}
