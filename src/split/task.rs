// src/split/task.rs
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::SplitError;
use crate::group::{GroupKey, GroupedRows};
use crate::sanitize::sanitize_segment;
use crate::sheet::Row;

/// One output workbook: the raw batch key, its filesystem-safe stem, and the
/// rows it will contain.
#[derive(Debug)]
pub struct BatchTask {
    pub batch: GroupKey,
    pub file_stem: String,
    pub rows: Vec<Row>,
}

/// One project directory and the batch workbooks that go into it. The
/// directory already exists by the time a task is handed to the dispatcher.
#[derive(Debug)]
pub struct ProjectTask {
    pub project: GroupKey,
    pub dir: PathBuf,
    pub batches: Vec<BatchTask>,
}

impl ProjectTask {
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }
}

/// Turn grouped rows into per-project work units under `output_dir`.
///
/// Directory names and file stems are sanitized copies of the raw keys. Two
/// distinct keys that sanitize to the same name would silently share an
/// output path, so that is rejected up front instead. Directories are
/// created here, before any writer runs, and re-running over an existing
/// tree is fine.
pub fn build_tasks(grouped: GroupedRows, output_dir: &Path) -> Result<Vec<ProjectTask>, SplitError> {
    let mut tasks = Vec::with_capacity(grouped.projects.len());
    let mut project_names: HashMap<String, GroupKey> = HashMap::new();

    for project in grouped.projects {
        let label = project.key.to_string();
        let dir_name = sanitize_segment(&label);
        check_collision(&mut project_names, "project", &dir_name, &project.key)?;

        let dir = output_dir.join(&dir_name);
        fs::create_dir_all(&dir).map_err(|e| SplitError::OutputWrite {
            context: format!("Failed to create output directory for project {label}"),
            source: Box::new(e),
        })?;
        debug!(dir = %dir.display(), "prepared project directory");

        let mut batch_names: HashMap<String, GroupKey> = HashMap::new();
        let mut batches = Vec::with_capacity(project.batches.len());
        for batch in project.batches {
            let file_stem = sanitize_segment(&batch.key.to_string());
            check_collision(&mut batch_names, "batch", &file_stem, &batch.key)?;
            batches.push(BatchTask {
                batch: batch.key,
                file_stem,
                rows: batch.rows,
            });
        }

        tasks.push(ProjectTask {
            project: project.key,
            dir,
            batches,
        });
    }
    Ok(tasks)
}

fn check_collision(
    seen: &mut HashMap<String, GroupKey>,
    level: &'static str,
    sanitized: &str,
    key: &GroupKey,
) -> Result<(), SplitError> {
    if let Some(first) = seen.get(sanitized) {
        // grouping already merged equal keys, so a hit here is always a
        // different raw key mapping onto the same name
        return Err(SplitError::NameCollision {
            level,
            sanitized: sanitized.to_string(),
            first: first.to_string(),
            second: key.to_string(),
        });
    }
    seen.insert(sanitized.to_string(), key.clone());
    Ok(())
}
