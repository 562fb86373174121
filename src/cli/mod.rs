pub mod init;
pub mod networth;
pub mod report;

use std::path::PathBuf;

use chrono::Datelike;
use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use comfy_table::{Cell, Table};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::cache::{DataCache, Loaded};
use crate::error::{PainelError, Result};
use crate::fmt::Tone;
use crate::models::{Matrix, Snapshot, Transaction};
use crate::reports::default_period;
use crate::settings::Settings;

#[derive(Parser)]
#[command(name = "painel", about = "Personal-finance reports from transaction and net-worth CSV files.")]
pub struct Cli {
    /// Transactions file (default: <data_dir>/dados.csv)
    #[arg(long, global = true)]
    pub dados: Option<PathBuf>,
    /// Net-worth file (default: <data_dir>/patrimonio.csv)
    #[arg(long, global = true)]
    pub patrimonio: Option<PathBuf>,
    /// Print raw report data as JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,
    /// Log level: error, warn, info, debug, trace
    #[arg(long = "log-level", global = true)]
    pub log_level: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a settings file pointing at a data directory.
    Init {
        /// Directory holding dados.csv and patrimonio.csv
        #[arg(long = "data-dir")]
        data_dir: String,
    },
    /// Receita, Despesa, Viagem and Saldo for every month of a year.
    Mensal {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Fixed household expense categories by month.
    Casa {
        #[arg(long)]
        year: Option<i32>,
        /// Category to include (repeatable; default: settings list)
        #[arg(long = "category")]
        categories: Vec<String>,
    },
    /// Month totals and the month's transactions.
    Resumo {
        #[arg(long)]
        year: Option<i32>,
        /// Month number, 1-12
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
    },
    /// Saldo month by month for a year.
    Tendencia {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Yearly Receita and Despesa totals per subcategory.
    Subcategorias {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Net worth per institution and month.
    Patrimonio,
    /// Net worth over time.
    Evolucao {
        /// One line per institution instead of the overall total
        #[arg(long = "por-instituicao")]
        por_instituicao: bool,
    },
    /// Summary, yearly matrix, trend and household expenses in one go.
    Geral {
        #[arg(long)]
        year: Option<i32>,
    },
}

/// Settings, resolved source paths and the cache shared by every report of
/// one invocation.
pub struct Workspace {
    pub settings: Settings,
    pub json: bool,
    dados: PathBuf,
    patrimonio: PathBuf,
    cache: DataCache,
}

impl Workspace {
    pub fn new(settings: Settings, cli: &Cli) -> Self {
        let dados = cli.dados.clone().unwrap_or_else(|| settings.transactions_path());
        let patrimonio = cli.patrimonio.clone().unwrap_or_else(|| settings.networth_path());
        Self {
            settings,
            json: cli.json,
            dados,
            patrimonio,
            cache: DataCache::new(),
        }
    }

    pub fn transactions(&mut self) -> Result<Loaded<Transaction>> {
        self.cache.transactions(&self.dados)
    }

    pub fn snapshots(&mut self) -> Result<Loaded<Snapshot>> {
        self.cache.snapshots(&self.patrimonio)
    }

    pub fn cache(&mut self) -> &mut DataCache {
        &mut self.cache
    }

    pub fn log_cache_stats(&self) {
        let (hits, misses) = self.cache.source_stats();
        tracing::debug!(hits, misses, reports = self.cache.report_count(), "cache usage");
    }
}

pub fn run(cli: Cli, settings: Settings) -> Result<()> {
    let mut ws = Workspace::new(settings, &cli);
    let result = match cli.command {
        Commands::Init { data_dir } => init::run(&data_dir, &ws.settings),
        Commands::Mensal { year } => report::mensal(&mut ws, year),
        Commands::Casa { year, categories } => report::casa(&mut ws, year, categories),
        Commands::Resumo { year, month } => report::resumo(&mut ws, year, month),
        Commands::Tendencia { year } => report::tendencia(&mut ws, year),
        Commands::Subcategorias { year } => report::subcategorias(&mut ws, year),
        Commands::Patrimonio => networth::patrimonio(&mut ws),
        Commands::Evolucao { por_instituicao } => networth::evolucao(&mut ws, por_instituicao),
        Commands::Geral { year } => report::geral(&mut ws, year),
    };
    ws.log_cache_stats();
    result
}

// ---------------------------------------------------------------------------
// Shared presentation helpers
// ---------------------------------------------------------------------------

pub(crate) fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

/// Explicit year, else the default period's year, else the current year.
pub(crate) fn resolve_year(rows: &[Transaction], year: Option<i32>) -> i32 {
    year.or_else(|| default_period(rows, today()).map(|(y, _)| y))
        .unwrap_or_else(|| today().year())
}

/// Explicit year/month, falling back to the default period.
pub(crate) fn resolve_period(
    rows: &[Transaction],
    year: Option<i32>,
    month: Option<u32>,
) -> Result<(i32, u32)> {
    period_as_of(rows, year, month, today())
}

fn period_as_of(
    rows: &[Transaction],
    year: Option<i32>,
    month: Option<u32>,
    today: chrono::NaiveDate,
) -> Result<(i32, u32)> {
    match (year, month) {
        (Some(y), Some(m)) => Ok((y, m)),
        _ => {
            let (dy, dm) = default_period(rows, today)
                .ok_or_else(|| PainelError::Other("No dated transactions to report on".into()))?;
            let y = year.unwrap_or(dy);
            let m = match month {
                Some(m) => m,
                None if y == dy => dm,
                None => crate::reports::available_months(rows, y).last().copied().unwrap_or(1),
            };
            Ok((y, m))
        }
    }
}

pub(crate) fn tinted(text: String, val: Decimal) -> ColoredString {
    match Tone::of(val) {
        Tone::Positive => text.green().bold(),
        Tone::Negative => text.red().bold(),
        Tone::Neutral => text.normal(),
    }
}

/// Render a matrix with one formatter for values. Rows listed in `tinted_rows`
/// are coloured by sign, rows in `bold_rows` are bold.
pub(crate) fn matrix_table(
    matrix: &Matrix,
    format: impl Fn(&str, Decimal) -> String,
    tinted_rows: &[&str],
    bold_rows: &[&str],
) -> Table {
    let mut table = Table::new();
    let mut header = vec![String::new()];
    header.extend(matrix.columns.iter().cloned());
    table.set_header(header);

    for row in &matrix.rows {
        let label = row.label.as_str();
        let mut cells = vec![if bold_rows.contains(&label) {
            Cell::new(label.bold())
        } else {
            Cell::new(label)
        }];
        for &v in &row.values {
            let text = format(label, v);
            let cell = if tinted_rows.contains(&label) {
                Cell::new(tinted(text, v))
            } else if bold_rows.contains(&label) {
                Cell::new(text.bold())
            } else {
                Cell::new(text)
            };
            cells.push(cell);
        }
        table.add_row(cells);
    }
    table
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| PainelError::Other(e.to_string()))?;
    println!("{json}");
    Ok(())
}
