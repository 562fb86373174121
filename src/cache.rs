//! Memoization keyed by the SHA-256 of each source file.
//!
//! A source is re-read on every `load`, but parsing and aggregation are only
//! redone when its content hash changes. Reports derived from an older
//! version of a file are dropped as soon as the new version is loaded.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;
use crate::importer::{compute_checksum, decode, parse_snapshots, parse_transactions};
use crate::models::{Matrix, Snapshot, Transaction};
use crate::reports::{household_matrix_by, monthly_matrix, CategoryField};

/// Parsed rows of one source file plus the hash they were parsed from.
#[derive(Debug)]
pub struct Loaded<T> {
    pub checksum: String,
    pub rows: Arc<Vec<T>>,
}

impl<T> Clone for Loaded<T> {
    fn clone(&self) -> Self {
        Self {
            checksum: self.checksum.clone(),
            rows: Arc::clone(&self.rows),
        }
    }
}

type ParseFn<T> = fn(&str, &str) -> Result<Vec<T>>;

pub struct SourceCache<T> {
    parse: ParseFn<T>,
    entries: HashMap<PathBuf, Loaded<T>>,
    hits: usize,
    misses: usize,
}

impl<T> SourceCache<T> {
    pub fn new(parse: ParseFn<T>) -> Self {
        Self {
            parse,
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Load `path`, reusing the previous parse when the bytes are unchanged.
    /// Returns the rows and, when the file changed, the checksum it replaced.
    pub fn load(&mut self, path: &Path) -> Result<(Loaded<T>, Option<String>)> {
        let bytes = std::fs::read(path)?;
        let checksum = compute_checksum(&bytes);

        if let Some(entry) = self.entries.get(path) {
            if entry.checksum == checksum {
                self.hits += 1;
                tracing::debug!(path = %path.display(), "source unchanged, reusing parsed rows");
                return Ok((entry.clone(), None));
            }
        }

        self.misses += 1;
        let source = path.display().to_string();
        let rows = (self.parse)(&decode(&bytes, &source)?, &source)?;
        let loaded = Loaded {
            checksum,
            rows: Arc::new(rows),
        };
        let replaced = self
            .entries
            .insert(path.to_path_buf(), loaded.clone())
            .map(|old| old.checksum);
        if replaced.is_some() {
            tracing::info!(path = %source, "source changed, cache invalidated");
        }
        Ok((loaded, replaced))
    }

    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ReportKey {
    Monthly {
        checksum: String,
        year: i32,
    },
    Household {
        checksum: String,
        year: i32,
        categories: Vec<String>,
        field: CategoryField,
    },
}

impl ReportKey {
    fn checksum(&self) -> &str {
        match self {
            ReportKey::Monthly { checksum, .. } | ReportKey::Household { checksum, .. } => checksum,
        }
    }
}

/// Source caches for both files plus memoized transaction matrices.
pub struct DataCache {
    transactions: SourceCache<Transaction>,
    snapshots: SourceCache<Snapshot>,
    reports: HashMap<ReportKey, Arc<Matrix>>,
}

impl Default for DataCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DataCache {
    pub fn new() -> Self {
        Self {
            transactions: SourceCache::new(parse_transactions),
            snapshots: SourceCache::new(parse_snapshots),
            reports: HashMap::new(),
        }
    }

    pub fn transactions(&mut self, path: &Path) -> Result<Loaded<Transaction>> {
        let (loaded, replaced) = self.transactions.load(path)?;
        if let Some(old) = replaced {
            self.forget(&old);
        }
        Ok(loaded)
    }

    pub fn snapshots(&mut self, path: &Path) -> Result<Loaded<Snapshot>> {
        let (loaded, _) = self.snapshots.load(path)?;
        Ok(loaded)
    }

    pub fn monthly_matrix(&mut self, source: &Loaded<Transaction>, year: i32) -> Arc<Matrix> {
        let key = ReportKey::Monthly {
            checksum: source.checksum.clone(),
            year,
        };
        Arc::clone(
            self.reports
                .entry(key)
                .or_insert_with(|| Arc::new(monthly_matrix(&source.rows, year))),
        )
    }

    pub fn household_matrix(
        &mut self,
        source: &Loaded<Transaction>,
        year: i32,
        categories: &[String],
        field: CategoryField,
    ) -> Arc<Matrix> {
        let key = ReportKey::Household {
            checksum: source.checksum.clone(),
            year,
            categories: categories.to_vec(),
            field,
        };
        Arc::clone(self.reports.entry(key).or_insert_with(|| {
            Arc::new(household_matrix_by(&source.rows, year, categories, field))
        }))
    }

    /// Drop every memoized report built from the given source version.
    fn forget(&mut self, checksum: &str) {
        let before = self.reports.len();
        self.reports.retain(|key, _| key.checksum() != checksum);
        tracing::debug!(dropped = before - self.reports.len(), "dropped stale reports");
    }

    pub fn report_count(&self) -> usize {
        self.reports.len()
    }

    pub fn source_stats(&self) -> (usize, usize) {
        self.transactions.stats()
    }
}
