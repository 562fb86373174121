use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::error::{PainelError, Result};
use crate::fmt::parse_amount;
use crate::models::{MovementKind, Snapshot, Transaction};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const DELIMITER_CANDIDATES: &[u8] = b",;\t|";
const SNIFF_LINES: usize = 20;

/// Columns the transaction file must carry. `Descricao` is optional.
pub const TRANSACTION_COLUMNS: &[&str] = &["Data", "Categoria", "Subcategoria", "Tipo", "Valor"];
pub const SNAPSHOT_COLUMNS: &[&str] = &["Data", "Instituicao", "Valor"];

fn dmy_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4}|\d{2})(?:[ T].*)?$").unwrap()
    })
}

fn iso_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})(?:[ T].*)?$").unwrap())
}

/// Parse a day-first date (31/01/2024, 31-01-24, 31.01.2024 10:00).
/// ISO dates are accepted too since they can't be misread.
pub fn parse_date_dmy(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Some(caps) = dmy_regex().captures(raw) {
        let d: u32 = caps[1].parse().ok()?;
        let m: u32 = caps[2].parse().ok()?;
        let year_text = &caps[3];
        let mut y: i32 = year_text.parse().ok()?;
        if year_text.len() == 2 {
            // same pivot as strptime's %y
            y += if y < 69 { 2000 } else { 1900 };
        }
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    if let Some(caps) = iso_regex().captures(raw) {
        let y: i32 = caps[1].parse().ok()?;
        let m: u32 = caps[2].parse().ok()?;
        let d: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    None
}

pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// UTF-8 (BOM optional) first, Latin-1 otherwise.
pub fn decode(bytes: &[u8], source: &str) -> Result<String> {
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let text = match std::str::from_utf8(body) {
        Ok(s) => s.to_string(),
        Err(_) => {
            tracing::debug!(source, "not valid UTF-8, decoding as Latin-1");
            body.iter().map(|&b| char::from(b)).collect()
        }
    };
    if text.trim().is_empty() {
        return Err(PainelError::Decode(source.to_string()));
    }
    Ok(text)
}

/// Count delimiter occurrences outside double quotes.
fn count_unquoted(line: &str, delim: u8) -> usize {
    let mut in_quotes = false;
    let mut n = 0;
    for b in line.bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
        } else if b == delim && !in_quotes {
            n += 1;
        }
    }
    n
}

/// Pick the delimiter whose per-line count is most consistent across the
/// first lines, breaking ties by how many fields it produces.
pub fn sniff_delimiter(text: &str) -> u8 {
    let lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    let mut best: Option<(usize, usize, u8)> = None;
    for &delim in DELIMITER_CANDIDATES {
        let counts: Vec<usize> = lines.iter().map(|l| count_unquoted(l, delim)).collect();
        let Some(&header_count) = counts.first() else {
            continue;
        };
        if header_count == 0 {
            continue;
        }
        let consistent = counts.iter().filter(|&&c| c == header_count).count();
        let score = (consistent, header_count, delim);
        if best.map_or(true, |(bc, bh, _)| (consistent, header_count) > (bc, bh)) {
            best = Some(score);
        }
    }
    best.map(|(_, _, d)| d).unwrap_or(b',')
}

pub fn normalize_header(raw: &str) -> String {
    raw.trim().replace('\u{feff}', "").trim().to_string()
}

/// Header names plus data records of a delimited text.
struct Table {
    headers: Vec<String>,
    records: Vec<csv::StringRecord>,
}

impl Table {
    fn parse(text: &str) -> Result<Self> {
        let delimiter = sniff_delimiter(text);
        tracing::debug!(delimiter = %char::from(delimiter).escape_default(), "sniffed delimiter");
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(text.as_bytes());
        let headers = rdr.headers()?.iter().map(normalize_header).collect();
        let mut records = Vec::new();
        for result in rdr.records() {
            let record = result?;
            if record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            records.push(record);
        }
        Ok(Self { headers, records })
    }

    /// Index of every required column, failing on the first one missing.
    fn require(&self, source: &str, columns: &[&str]) -> Result<Vec<usize>> {
        columns
            .iter()
            .map(|col| {
                self.headers
                    .iter()
                    .position(|h| h == col)
                    .ok_or_else(|| PainelError::MissingColumn {
                        file: source.to_string(),
                        column: col.to_string(),
                    })
            })
            .collect()
    }

    fn optional(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }
}

fn field(record: &csv::StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

pub fn parse_transactions(text: &str, source: &str) -> Result<Vec<Transaction>> {
    let table = Table::parse(text)?;
    let idx = table.require(source, TRANSACTION_COLUMNS)?;
    let (i_date, i_cat, i_sub, i_kind, i_amount) = (idx[0], idx[1], idx[2], idx[3], idx[4]);
    let i_desc = table.optional("Descricao");

    let mut rows = Vec::with_capacity(table.records.len());
    let mut undated = 0usize;
    for record in &table.records {
        let date = parse_date_dmy(field(record, i_date));
        if date.is_none() {
            undated += 1;
        }
        let kind_raw = field(record, i_kind).to_string();
        rows.push(Transaction {
            date,
            description: i_desc.map(|i| field(record, i).trim().to_string()).unwrap_or_default(),
            category: field(record, i_cat).trim().to_string(),
            subcategory: field(record, i_sub).trim().to_string(),
            kind: MovementKind::classify(&kind_raw),
            kind_raw,
            amount: parse_amount(field(record, i_amount)),
        });
    }
    if undated > 0 {
        tracing::warn!(source, undated, "rows with unreadable dates are left out of monthly reports");
    }
    tracing::info!(source, rows = rows.len(), "loaded transactions");
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Net-worth snapshots
// ---------------------------------------------------------------------------

pub fn parse_snapshots(text: &str, source: &str) -> Result<Vec<Snapshot>> {
    let table = Table::parse(text)?;
    let idx = table.require(source, SNAPSHOT_COLUMNS)?;
    let (i_date, i_inst, i_amount) = (idx[0], idx[1], idx[2]);

    let rows: Vec<Snapshot> = table
        .records
        .iter()
        .map(|record| Snapshot {
            date: parse_date_dmy(field(record, i_date)),
            institution: field(record, i_inst).trim().to_string(),
            amount: parse_amount(field(record, i_amount)),
        })
        .collect();
    tracing::info!(source, rows = rows.len(), "loaded net-worth snapshots");
    Ok(rows)
}
