use comfy_table::{Cell, Table};
use rust_decimal::Decimal;

use super::{matrix_table, print_json, tinted, Workspace};
use crate::error::Result;
use crate::fmt::{format_currency, format_percent};
use crate::networth::{self, TOTAL_MES, VAR_MES};

pub fn patrimonio(ws: &mut Workspace) -> Result<()> {
    let source = ws.snapshots()?;
    let matrix = networth::networth_matrix(&source.rows);

    if ws.json {
        return print_json(&matrix);
    }
    let format = |row: &str, v: Decimal| {
        if row == VAR_MES {
            format_percent(v)
        } else {
            format_currency(v)
        }
    };
    let table = matrix_table(&matrix, format, &[VAR_MES], &[TOTAL_MES]);
    println!("Patrimônio por Instituição\n{table}");
    Ok(())
}

pub fn evolucao(ws: &mut Workspace, por_instituicao: bool) -> Result<()> {
    let source = ws.snapshots()?;

    if por_instituicao {
        let series = networth::institution_series(&source.rows);
        if ws.json {
            return print_json(&series);
        }
        let mut table = Table::new();
        table.set_header(vec!["Mês", "Instituição", "Valor"]);
        for (ym, institution, amount) in &series {
            table.add_row(vec![
                Cell::new(ym.label()),
                Cell::new(institution),
                Cell::new(format_currency(*amount)),
            ]);
        }
        println!("Evolução por Instituição\n{table}");
        return Ok(());
    }

    let series = networth::total_series(&source.rows);
    if ws.json {
        return print_json(&series);
    }
    let totals: Vec<Decimal> = series.iter().map(|(_, total)| *total).collect();
    let variation = networth::month_over_month(&totals);
    let mut table = Table::new();
    table.set_header(vec!["Mês", "Patrimônio Total", "% Var. Mês"]);
    for ((ym, total), pct) in series.iter().zip(variation) {
        table.add_row(vec![
            Cell::new(ym.label()),
            Cell::new(format_currency(*total)),
            Cell::new(tinted(format_percent(pct), pct)),
        ]);
    }
    println!("Patrimônio Total Consolidado\n{table}");
    Ok(())
}
