// src/split/mod.rs
pub mod dispatch;
pub mod task;
pub mod write;

use std::path::Path;
use std::time::Instant;

use tracing::{info, instrument};

use crate::config::SplitConfig;
use crate::error::SplitError;
use crate::group::group_rows;
use crate::sheet::reader::TableReader;
use crate::split::dispatch::{Dispatcher, ProgressSink};
use crate::split::task::build_tasks;

/// Counts of what one split produced.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SplitSummary {
    pub projects: usize,
    pub batches: usize,
    pub rows: usize,
}

/// Splits a keyed input table into one workbook per (project, batch) pair.
///
/// Reading and grouping are single-threaded and finish before any file is
/// written; only the write fan-out runs on the worker pool.
#[derive(Debug)]
pub struct Splitter {
    reader: TableReader,
    dispatcher: Dispatcher,
}

impl Splitter {
    pub fn new(config: SplitConfig) -> Self {
        Self {
            reader: TableReader::new(config.cache_capacity),
            dispatcher: Dispatcher::new(config.max_workers),
        }
    }

    /// Read `input`, group its rows by project and batch code, and write one
    /// workbook per batch under `output_dir`, reporting per-project progress
    /// to `sink`.
    #[instrument(level = "info", skip_all, fields(input = %input.as_ref().display(), output = %output_dir.as_ref().display()))]
    pub fn split<P, Q>(
        &mut self,
        input: P,
        output_dir: Q,
        sink: Option<ProgressSink>,
    ) -> Result<SplitSummary, SplitError>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let input = input.as_ref();
        let output_dir = output_dir.as_ref();
        let started = Instant::now();

        // 1) preconditions, before any reading
        if !input.is_file() {
            return Err(SplitError::InputNotFound(input.to_path_buf()));
        }
        if !output_dir.is_dir() {
            return Err(SplitError::OutputDirNotFound(output_dir.to_path_buf()));
        }

        // 2) read and validate; a header-only sheet is a successful no-op
        let table = self.reader.read(input)?;
        if table.rows.is_empty() {
            info!("input has headers but no data rows, nothing to split");
            return Ok(SplitSummary::default());
        }

        // 3) group and lay out the output tree
        let grouped = group_rows(&table.rows);
        let summary = SplitSummary {
            projects: grouped.projects.len(),
            batches: grouped.batch_count(),
            rows: grouped.row_count(),
        };
        let tasks = build_tasks(grouped, output_dir)?;

        // 4) fan out the writes
        self.dispatcher.run(&tasks, sink)?;
        info!(
            projects = summary.projects,
            batches = summary.batches,
            rows = summary.rows,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "split complete"
        );
        Ok(summary)
    }
}

/// One-shot split with the default configuration.
pub fn split_table<P, Q>(
    input: P,
    output_dir: Q,
    sink: Option<ProgressSink>,
) -> Result<SplitSummary, SplitError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    Splitter::new(SplitConfig::default()).split(input, output_dir, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook, Data, Reader, Xlsx};
    use rust_xlsxwriter::Workbook;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::tempdir;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,sheetsplit=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn s(text: &str) -> Data {
        Data::String(text.into())
    }

    fn n(value: f64) -> Data {
        Data::Float(value)
    }

    fn write_input(path: &Path, headers: &[&str], rows: &[Vec<Data>]) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, header) in headers.iter().enumerate() {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                match value {
                    Data::String(text) => {
                        sheet
                            .write_string((r + 1) as u32, c as u16, text.as_str())
                            .unwrap();
                    }
                    Data::Float(num) => {
                        sheet.write_number((r + 1) as u32, c as u16, *num).unwrap();
                    }
                    other => panic!("fixture cell type not supported: {other:?}"),
                }
            }
        }
        workbook.save(path).unwrap();
    }

    const FIXTURE_HEADERS: [&str; 4] = ["project_code", "batch_code", "Value", "Description"];

    fn fixture_rows() -> Vec<Vec<Data>> {
        vec![
            vec![s("P100"), s("B1"), n(10.0), s("Item A")],
            vec![s("P100"), s("B1"), n(20.0), s("Item B")],
            vec![s("P100"), s("B2"), n(30.0), s("Item C")],
            vec![s("P200"), s("B1"), n(40.0), s("Item D")],
            vec![s("P200"), s("B3"), n(50.0), s("Item E")],
            vec![s("P100"), s("B2"), n(60.0), s("Item F")],
            vec![n(999.0), n(77.0), n(70.0), s("Numeric codes")],
            vec![s("P 300"), s("B 4"), n(80.0), s("Codes w space")],
        ]
    }

    fn output_files(root: &Path) -> Vec<String> {
        let mut found = Vec::new();
        for entry in fs::read_dir(root).unwrap() {
            let entry = entry.unwrap();
            assert!(entry.path().is_dir(), "unexpected {:?}", entry.path());
            let project = entry.file_name().into_string().unwrap();
            for file in fs::read_dir(entry.path()).unwrap() {
                let name = file.unwrap().file_name().into_string().unwrap();
                found.push(format!("{project}/{name}"));
            }
        }
        found.sort();
        found
    }

    fn batch_contents(path: &Path) -> Vec<(f64, String)> {
        let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
        let range = workbook.worksheet_range("Sheet1").unwrap();
        range
            .rows()
            .skip(1)
            .map(|row| {
                let value = match row[2] {
                    Data::Float(f) => f,
                    ref other => panic!("expected numeric Value, got {other:?}"),
                };
                let description = match row[3] {
                    Data::String(ref text) => text.clone(),
                    ref other => panic!("expected text Description, got {other:?}"),
                };
                (value, description)
            })
            .collect()
    }

    #[test]
    fn splits_the_worked_fixture_exactly() {
        init_test_logging();
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.xlsx");
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();
        write_input(&input, &FIXTURE_HEADERS, &fixture_rows());

        let summary = split_table(&input, &out, None).unwrap();
        assert_eq!(
            summary,
            SplitSummary {
                projects: 4,
                batches: 6,
                rows: 8
            }
        );

        assert_eq!(
            output_files(&out),
            vec![
                "999/77.xlsx",
                "P100/B1.xlsx",
                "P100/B2.xlsx",
                "P200/B1.xlsx",
                "P200/B3.xlsx",
                "P_300/B_4.xlsx",
            ]
        );

        assert_eq!(
            batch_contents(&out.join("P100/B1.xlsx")),
            vec![(10.0, "Item A".to_string()), (20.0, "Item B".to_string())]
        );
        assert_eq!(
            batch_contents(&out.join("P100/B2.xlsx")),
            vec![(30.0, "Item C".to_string()), (60.0, "Item F".to_string())]
        );
        assert_eq!(
            batch_contents(&out.join("P200/B1.xlsx")),
            vec![(40.0, "Item D".to_string())]
        );
        assert_eq!(
            batch_contents(&out.join("P200/B3.xlsx")),
            vec![(50.0, "Item E".to_string())]
        );
        assert_eq!(
            batch_contents(&out.join("999/77.xlsx")),
            vec![(70.0, "Numeric codes".to_string())]
        );
        assert_eq!(
            batch_contents(&out.join("P_300/B_4.xlsx")),
            vec![(80.0, "Codes w space".to_string())]
        );

        // row-count conservation across every written file
        let total: usize = output_files(&out)
            .iter()
            .map(|rel| batch_contents(&out.join(rel)).len())
            .sum();
        assert_eq!(total, 8);

        // numeric key cells stay numbers in the output
        let mut workbook: Xlsx<_> = open_workbook(out.join("999/77.xlsx")).unwrap();
        let range = workbook.worksheet_range("Sheet1").unwrap();
        assert_eq!(range.get_value((1, 0)), Some(&Data::Float(999.0)));
        assert_eq!(range.get_value((1, 1)), Some(&Data::Float(77.0)));
    }

    #[test]
    fn second_run_into_the_same_tree_succeeds() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.xlsx");
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();
        write_input(&input, &FIXTURE_HEADERS, &fixture_rows());

        let first = split_table(&input, &out, None).unwrap();
        let second = split_table(&input, &out, None).unwrap();
        assert_eq!(first, second);
        assert_eq!(output_files(&out).len(), 6);
    }

    #[test]
    fn fixture_progress_is_monotone_and_ends_at_100() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.xlsx");
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();
        write_input(&input, &FIXTURE_HEADERS, &fixture_rows());

        let seen = Mutex::new(Vec::new());
        let sink = |p: u8| seen.lock().unwrap().push(p);
        split_table(&input, &out, Some(&sink)).unwrap();

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 4);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*seen.last().unwrap(), 100);
    }

    #[test]
    fn missing_input_file_is_rejected_up_front() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();

        let err = split_table(dir.path().join("absent.xlsx"), &out, None).unwrap_err();
        assert!(matches!(err, SplitError::InputNotFound(_)));
        assert!(err.to_string().starts_with("Input file does not exist"));
    }

    #[test]
    fn missing_output_directory_is_rejected_up_front() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.xlsx");
        write_input(&input, &FIXTURE_HEADERS, &fixture_rows());

        let err = split_table(&input, dir.path().join("nope"), None).unwrap_err();
        assert!(matches!(err, SplitError::OutputDirNotFound(_)));

        // a plain file does not count as an output directory either
        let err = split_table(&input, &input, None).unwrap_err();
        assert!(matches!(err, SplitError::OutputDirNotFound(_)));
    }

    #[test]
    fn missing_required_columns_leaves_the_output_untouched() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.xlsx");
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();
        write_input(
            &input,
            &["project_code", "Value", "Description"],
            &[vec![s("P100"), n(10.0), s("Item A")]],
        );

        let err = split_table(&input, &out, None).unwrap_err();
        assert!(matches!(err, SplitError::MissingRequiredColumns));
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn header_only_input_is_a_success_noop() {
        init_test_logging();
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.xlsx");
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();
        write_input(&input, &FIXTURE_HEADERS, &[]);

        let seen = Mutex::new(Vec::new());
        let sink = |p: u8| seen.lock().unwrap().push(p);
        let summary = split_table(&input, &out, Some(&sink)).unwrap();

        assert_eq!(summary, SplitSummary::default());
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
        assert!(seen.lock().unwrap().is_empty());
    }
}
