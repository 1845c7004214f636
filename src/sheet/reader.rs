// src/sheet/reader.rs
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use calamine::{open_workbook, Reader, Xlsx};
use tracing::{debug, info, instrument};

use crate::error::SplitError;
use crate::sheet::headers::extract_headers;
use crate::sheet::{Cell, ParsedTable, Row, PRIMARY_KEY_COLUMN, SECONDARY_KEY_COLUMN};

/// Loads input workbooks and remembers the last few parses.
///
/// The cache is keyed by path alone, oldest entry evicted first. A file that
/// changes on disk behind a cached path is served stale; runs are short-lived
/// enough that re-checking mtimes is not worth the syscalls.
#[derive(Debug)]
pub struct TableReader {
    capacity: usize,
    cache: VecDeque<(PathBuf, Arc<ParsedTable>)>,
}

impl TableReader {
    /// `capacity` is the number of parsed files kept; 0 disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            cache: VecDeque::new(),
        }
    }

    /// Number of parses currently held in the cache.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Parse `path` into headers plus data rows, or serve the cached parse.
    #[instrument(level = "debug", skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn read<P: AsRef<Path>>(&mut self, path: P) -> Result<Arc<ParsedTable>, SplitError> {
        let path = path.as_ref();
        if let Some((_, table)) = self.cache.iter().find(|(p, _)| p.as_path() == path) {
            debug!("serving parsed table from cache");
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(parse_workbook(path)?);
        if self.capacity > 0 {
            if self.cache.len() == self.capacity {
                if let Some((evicted, _)) = self.cache.pop_front() {
                    debug!(evicted = %evicted.display(), "cache full, dropping oldest parse");
                }
            }
            self.cache.push_back((path.to_path_buf(), Arc::clone(&table)));
        }
        Ok(table)
    }
}

/// Parse the first sheet of the workbook at `path` and validate its shape.
fn parse_workbook(path: &Path) -> Result<ParsedTable, SplitError> {
    // 1) whole workbook up front; there is no streaming path here
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| SplitError::CorruptInput {
        path: path.to_path_buf(),
        source: e,
    })?;

    // first sheet only, matching what the desktop exports this tool ingests
    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        return Err(SplitError::EmptySheet(path.to_path_buf()));
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| SplitError::CorruptInput {
            path: path.to_path_buf(),
            source: e,
        })?;

    // 2) headers, then the required-columns check before touching any row
    let headers = extract_headers(&range, path)?;
    let has = |name: &str| headers.iter().any(|h| h == name);
    if !has(PRIMARY_KEY_COLUMN) || !has(SECONDARY_KEY_COLUMN) {
        return Err(SplitError::MissingRequiredColumns);
    }

    // 3) materialize data rows sparsely: empty cells stay absent, fully
    //    blank rows are dropped, cells past the header width are ignored
    let mut rows = Vec::new();
    for sheet_row in range.rows().skip(1) {
        let mut row = Row::new();
        for (idx, value) in sheet_row.iter().enumerate() {
            let Some(name) = headers.get(idx) else {
                break;
            };
            if let Some(cell) = Cell::from_sheet(value) {
                row.push(name, cell);
            }
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }

    info!(
        rows = rows.len(),
        columns = headers.len(),
        "parsed input table"
    );
    Ok(ParsedTable { headers, rows })
}
