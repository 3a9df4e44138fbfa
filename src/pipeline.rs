//! Orchestrates the end-to-end flow: load two dumps, merge them through the
//! hash table, sort, render a preview, and persist the result.

use std::fmt;
use std::path::Path;

use tracing::info;
use tracing::warn;

use crate::codec;
use crate::codec::LoadError;
use crate::codec::StoreError;
use crate::config::DEFAULT_BUCKETS;
use crate::merge_table::MergeHashTable;
use crate::record::Record;
use crate::table_view::TableViewError;

#[derive(Debug)]
pub enum JoinError {
    /// Both inputs were empty; the original implementation's guard only
    /// rejected this case when *both* sides were empty or null. The spec
    /// adopts that lenient reading deliberately: one empty side is valid
    /// and simply yields a copy of the other.
    BothEmpty,
    Load(LoadError),
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinError::BothEmpty => write!(f, "both inputs are empty"),
            JoinError::Load(err) => write!(f, "{err}"),
        }
    }
}
impl std::error::Error for JoinError {}

/// Merges `first` and `second` into one deduplicated record set. Interleaves
/// insertion order (one from `first`, one from `second`, per step) matching
/// the original implementation; the combine operator is associative over
/// the non-float fields so the published semantics is simply a set-union
/// with fold, and callers may rely on that rather than the interleaving.
pub fn join(first: &[Record], second: &[Record]) -> Result<Vec<Record>, JoinError> {
    if first.is_empty() && second.is_empty() {
        return Err(JoinError::BothEmpty);
    }

    let mut table = MergeHashTable::new(DEFAULT_BUCKETS);
    let max_len = first.len().max(second.len());
    for i in 0..max_len {
        if let Some(record) = first.get(i) {
            table.insert(*record);
        }
        if let Some(record) = second.get(i) {
            table.insert(*record);
        }
    }

    let result = match table.materialise() {
        Ok(records) => records,
        Err(_) => Vec::new(),
    };
    table.clear();
    Ok(result)
}

#[derive(Debug)]
pub enum PipelineError {
    Load(LoadError),
    Join(JoinError),
    Store(StoreError),
    TableView(TableViewError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Load(err) => write!(f, "load failed: {err}"),
            PipelineError::Join(err) => write!(f, "join failed: {err}"),
            PipelineError::Store(err) => write!(f, "store failed: {err}"),
            PipelineError::TableView(err) => write!(f, "table render failed: {err}"),
        }
    }
}
impl std::error::Error for PipelineError {}

/// Loads `first` and `second`, tolerating an empty source (warns rather
/// than failing), joins, sorts by ascending `cost`, renders a bounded
/// preview, and stores the result to `output`.
pub fn run(first: &Path, second: &Path, output: &Path, preview_rows: usize) -> Result<Vec<Record>, PipelineError> {
    let a = load_tolerating_empty(first)?;
    let b = load_tolerating_empty(second)?;

    info!(a = a.len(), b = b.len(), "loaded input dumps");

    let mut merged = join(&a, &b).map_err(PipelineError::Join)?;
    merged.sort_by(|lhs, rhs| lhs.cost.partial_cmp(&rhs.cost).unwrap());

    info!(records = merged.len(), "merged and sorted");

    crate::table_view::render_default(&merged, preview_rows).map_err(PipelineError::TableView)?;

    codec::store(output, &merged).map_err(PipelineError::Store)?;
    info!(path = %output.display(), "stored result");

    Ok(merged)
}

fn load_tolerating_empty(path: &Path) -> Result<Vec<Record>, PipelineError> {
    match codec::load(path) {
        Ok(records) => Ok(records),
        Err(LoadError::Empty) => {
            warn!(path = %path.display(), "source file is empty, continuing with the other side");
            Ok(Vec::new())
        }
        Err(err) => Err(PipelineError::Load(err)),
    }
}
