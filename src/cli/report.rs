use colored::Colorize;
use comfy_table::{Cell, Table};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{matrix_table, print_json, resolve_period, resolve_year, tinted, Workspace};
use crate::error::Result;
use crate::fmt::{format_currency, format_percent};
use crate::models::{month_name, KpiSummary, MovementKind, Transaction};
use crate::reports::{self, SALDO, TOTAL_GERAL};

pub fn mensal(ws: &mut Workspace, year: Option<i32>) -> Result<()> {
    let source = ws.transactions()?;
    let year = resolve_year(&source.rows, year);
    let matrix = ws.cache().monthly_matrix(&source, year);

    if ws.json {
        return print_json(&*matrix);
    }
    let table = matrix_table(&matrix, |_, v| format_currency(v), &[SALDO], &[]);
    println!("Consolidado do Ano {year}\n{table}");
    Ok(())
}

pub fn casa(ws: &mut Workspace, year: Option<i32>, categories: Vec<String>) -> Result<()> {
    let source = ws.transactions()?;
    let year = resolve_year(&source.rows, year);
    let categories = if categories.is_empty() {
        ws.settings.household_categories.clone()
    } else {
        categories
    };
    let field = ws.settings.household_field;
    let matrix = ws.cache().household_matrix(&source, year, &categories, field);

    if ws.json {
        return print_json(&*matrix);
    }
    let table = matrix_table(&matrix, |_, v| format_currency(v), &[], &[TOTAL_GERAL]);
    println!("Consolidado Despesas Casa {year}\n{table}");
    Ok(())
}

#[derive(Serialize)]
struct ResumoJson<'a> {
    year: i32,
    month: u32,
    summary: KpiSummary,
    transactions: Vec<&'a Transaction>,
}

pub fn resumo(ws: &mut Workspace, year: Option<i32>, month: Option<u32>) -> Result<()> {
    let source = ws.transactions()?;
    let (year, month) = resolve_period(&source.rows, year, month)?;
    let kpi = reports::kpi_summary(&source.rows, year, month);
    let register = reports::month_register(&source.rows, year, month);

    if ws.json {
        return print_json(&ResumoJson {
            year,
            month,
            summary: kpi,
            transactions: register,
        });
    }

    println!("Resumo {} {year}", month_name(month));
    println!("  Receitas: {}", format_currency(kpi.receitas));
    println!("  Despesas: {}", format_currency(kpi.despesas));
    println!("  Saldo:    {}", tinted(format_currency(kpi.saldo), kpi.saldo));

    let mut table = Table::new();
    table.set_header(vec!["Data", "Descricao", "Subcategoria", "Tipo", "Valor"]);
    for t in &register {
        table.add_row(vec![
            Cell::new(t.date.map(|d| d.format("%d/%m/%y").to_string()).unwrap_or_default()),
            Cell::new(&t.description),
            Cell::new(&t.subcategory),
            Cell::new(&t.kind_raw),
            Cell::new(format_currency(t.amount)),
        ]);
    }
    println!("\nTransações do Mês {} {year}\n{table}", month_name(month));
    Ok(())
}

pub fn tendencia(ws: &mut Workspace, year: Option<i32>) -> Result<()> {
    let source = ws.transactions()?;
    let year = resolve_year(&source.rows, year);
    let trend = reports::yearly_trend(&source.rows, year);

    if ws.json {
        return print_json(&trend);
    }
    let mut table = Table::new();
    table.set_header(vec!["Mês", "Saldo"]);
    for (month, saldo) in &trend {
        table.add_row(vec![
            Cell::new(month_name(*month)),
            Cell::new(tinted(format_currency(*saldo), *saldo)),
        ]);
    }
    println!("Tendência do Saldo {year}\n{table}");
    Ok(())
}

fn breakdown_table(items: &[(String, Decimal)]) -> Table {
    let total: Decimal = items.iter().map(|(_, v)| v).sum();
    let mut table = Table::new();
    table.set_header(vec!["Subcategoria", "Valor", "%"]);
    for (name, value) in items {
        let pct = value
            .checked_div(total)
            .map_or(Decimal::ZERO, |share| share * Decimal::ONE_HUNDRED);
        table.add_row(vec![
            Cell::new(name),
            Cell::new(format_currency(*value)),
            Cell::new(format_percent(pct)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(format_currency(total)),
        Cell::new(""),
    ]);
    table
}

pub fn subcategorias(ws: &mut Workspace, year: Option<i32>) -> Result<()> {
    let source = ws.transactions()?;
    let year = resolve_year(&source.rows, year);
    let receitas = reports::subcategory_breakdown(&source.rows, year, MovementKind::Receita);
    let despesas = reports::subcategory_breakdown(&source.rows, year, MovementKind::Despesa);

    if ws.json {
        return print_json(&serde_json::json!({
            "year": year,
            "receitas": receitas,
            "despesas": despesas,
        }));
    }
    println!("Receitas por Subcategoria {year}\n{}", breakdown_table(&receitas));
    println!("\nDespesas por Subcategoria {year}\n{}", breakdown_table(&despesas));
    Ok(())
}

/// Every transaction report for one year, sharing a single parse.
pub fn geral(ws: &mut Workspace, year: Option<i32>) -> Result<()> {
    let source = ws.transactions()?;
    let year = resolve_year(&source.rows, year);

    if !reports::available_months(&source.rows, year).is_empty() {
        let (_, month) = resolve_period(&source.rows, Some(year), None)?;
        resumo(ws, Some(year), Some(month))?;
        println!();
    }
    mensal(ws, Some(year))?;
    println!();
    tendencia(ws, Some(year))?;
    println!();
    casa(ws, Some(year), Vec::new())
}
