// src/sheet/headers.rs
use std::path::Path;

use calamine::{Data, Range};

use crate::error::SplitError;
use crate::sheet::Cell;

/// Recover the ordered header list from the first row of a sheet range.
///
/// Primary strategy: take the first row the range iterator yields, coerce
/// every cell to text, and drop trailing empties. If that leaves nothing,
/// fall back to walking the declared range cell by cell, which tolerates
/// ragged sheets whose first row the iterator misrepresents. Interior empty
/// headers survive as empty strings either way; only trailing ones go.
pub fn extract_headers(range: &Range<Data>, path: &Path) -> Result<Vec<String>, SplitError> {
    // 1) no declared cell range at all means there is nothing to read
    let (start, end) = match (range.start(), range.end()) {
        (Some(start), Some(end)) if start.0 <= end.0 && start.1 <= end.1 => (start, end),
        _ => return Err(SplitError::EmptySheet(path.to_path_buf())),
    };

    // 2) primary: the first materialized row as a record
    if let Some(first) = range.rows().next() {
        let mut headers: Vec<String> = first.iter().map(header_text).collect();
        strip_trailing_empty(&mut headers);
        if !headers.is_empty() {
            return Ok(headers);
        }
    }

    // 3) fallback: walk the declared width of the header row directly
    let mut headers = Vec::with_capacity((end.1 - start.1 + 1) as usize);
    for col in start.1..=end.1 {
        let text = range
            .get_value((start.0, col))
            .map(header_text)
            .unwrap_or_default();
        headers.push(text);
    }
    strip_trailing_empty(&mut headers);

    // 4) both strategies came up empty
    if headers.is_empty() {
        return Err(SplitError::UnreadableHeaders(path.to_path_buf()));
    }
    Ok(headers)
}

fn header_text(data: &Data) -> String {
    Cell::from_sheet(data)
        .map(|cell| cell.to_text())
        .unwrap_or_default()
}

fn strip_trailing_empty(headers: &mut Vec<String>) {
    while headers.last().is_some_and(|h| h.is_empty()) {
        headers.pop();
    }
}
