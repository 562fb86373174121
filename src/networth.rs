//! Net worth per institution over time.
//!
//! Columns are the year-months present in the snapshots, chronological.
//! Institutions are listed alphabetically. Undated snapshots are ignored.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;

use crate::models::{Matrix, Snapshot, YearMonth};

pub const TOTAL_MES: &str = "Total do Mês";
pub const VAR_MES: &str = "% Var. Mês";

/// Percentage change between consecutive totals. The first entry, and any
/// entry whose previous total is zero, is 0.
pub fn month_over_month(totals: &[Decimal]) -> Vec<Decimal> {
    let mut variation = Vec::with_capacity(totals.len());
    for (i, &current) in totals.iter().enumerate() {
        let pct = match i.checked_sub(1).map(|p| totals[p]) {
            Some(prev) => (current - prev)
                .checked_div(prev)
                .map_or(Decimal::ZERO, |ratio| ratio * Decimal::ONE_HUNDRED),
            None => Decimal::ZERO,
        };
        variation.push(pct);
    }
    variation
}

fn dated(snapshots: &[Snapshot]) -> impl Iterator<Item = (YearMonth, &Snapshot)> {
    snapshots
        .iter()
        .filter_map(|s| s.year_month().map(|ym| (ym, s)))
}

pub fn networth_matrix(snapshots: &[Snapshot]) -> Matrix {
    let mut cells: BTreeMap<(&str, YearMonth), Decimal> = BTreeMap::new();
    let mut months: BTreeSet<YearMonth> = BTreeSet::new();
    let mut institutions: BTreeSet<&str> = BTreeSet::new();
    for (ym, s) in dated(snapshots) {
        *cells.entry((s.institution.as_str(), ym)).or_default() += s.amount;
        months.insert(ym);
        institutions.insert(s.institution.as_str());
    }

    let months: Vec<YearMonth> = months.into_iter().collect();
    let mut matrix = Matrix::new(months.iter().map(YearMonth::label).collect());
    let mut totals = vec![Decimal::ZERO; months.len()];

    for institution in institutions {
        let values: Vec<Decimal> = months
            .iter()
            .map(|&ym| cells.get(&(institution, ym)).copied().unwrap_or_default())
            .collect();
        for (acc, v) in totals.iter_mut().zip(&values) {
            *acc += *v;
        }
        matrix.push_row(institution, values);
    }

    let variation = month_over_month(&totals);
    matrix.push_row(TOTAL_MES, totals);
    matrix.push_row(VAR_MES, variation);
    tracing::debug!(columns = months.len(), "built net-worth matrix");
    matrix
}

/// Total net worth per month, for a single-line chart.
pub fn total_series(snapshots: &[Snapshot]) -> Vec<(YearMonth, Decimal)> {
    let mut totals: BTreeMap<YearMonth, Decimal> = BTreeMap::new();
    for (ym, s) in dated(snapshots) {
        *totals.entry(ym).or_default() += s.amount;
    }
    totals.into_iter().collect()
}

/// Amount per (month, institution), for one line or area per institution.
pub fn institution_series(snapshots: &[Snapshot]) -> Vec<(YearMonth, String, Decimal)> {
    let mut totals: BTreeMap<(YearMonth, &str), Decimal> = BTreeMap::new();
    for (ym, s) in dated(snapshots) {
        *totals.entry((ym, s.institution.as_str())).or_default() += s.amount;
    }
    totals
        .into_iter()
        .map(|((ym, institution), amount)| (ym, institution.to_string(), amount))
        .collect()
}
