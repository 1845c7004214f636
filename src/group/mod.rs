// src/group/mod.rs
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::sheet::{format_number, Cell, Row, PRIMARY_KEY_COLUMN, SECONDARY_KEY_COLUMN};

/// Raw grouping key taken from a key cell before any sanitization.
///
/// Keys compare structurally: the number 999 and the text "999" are distinct
/// groups. Missing cells form their own group rather than being dropped.
#[derive(Debug, Clone)]
pub enum GroupKey {
    Text(String),
    Number(f64),
    Bool(bool),
    Missing,
}

impl GroupKey {
    pub fn from_cell(cell: Option<&Cell>) -> Self {
        match cell {
            Some(Cell::Text(s)) => GroupKey::Text(s.clone()),
            Some(Cell::Number(n)) => GroupKey::Number(*n),
            Some(Cell::Bool(b)) => GroupKey::Bool(*b),
            None => GroupKey::Missing,
        }
    }
}

// Numbers hash and compare by bit pattern so the key is usable in a map.
// 0.0 and -0.0 land in different groups, NaN equals itself, both acceptable
// for values that are really just labels.
impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (GroupKey::Text(a), GroupKey::Text(b)) => a == b,
            (GroupKey::Number(a), GroupKey::Number(b)) => a.to_bits() == b.to_bits(),
            (GroupKey::Bool(a), GroupKey::Bool(b)) => a == b,
            (GroupKey::Missing, GroupKey::Missing) => true,
            _ => false,
        }
    }
}

impl Eq for GroupKey {}

impl Hash for GroupKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            GroupKey::Text(s) => {
                0u8.hash(state);
                s.hash(state);
            }
            GroupKey::Number(n) => {
                1u8.hash(state);
                n.to_bits().hash(state);
            }
            GroupKey::Bool(b) => {
                2u8.hash(state);
                b.hash(state);
            }
            GroupKey::Missing => 3u8.hash(state),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Text(s) => f.write_str(s),
            GroupKey::Number(n) => f.write_str(&format_number(*n)),
            GroupKey::Bool(b) => write!(f, "{b}"),
            GroupKey::Missing => Ok(()),
        }
    }
}

/// One batch within a project: the raw batch key and its rows in input order.
#[derive(Debug)]
pub struct BatchGroup {
    pub key: GroupKey,
    pub rows: Vec<Row>,
}

/// One project with its batches in first-seen order.
#[derive(Debug)]
pub struct ProjectGroup {
    pub key: GroupKey,
    pub batches: Vec<BatchGroup>,
    index: HashMap<GroupKey, usize>,
}

impl ProjectGroup {
    fn new(key: GroupKey) -> Self {
        Self {
            key,
            batches: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn batch_mut(&mut self, key: GroupKey) -> &mut BatchGroup {
        let idx = *self.index.entry(key.clone()).or_insert_with(|| {
            self.batches.push(BatchGroup {
                key,
                rows: Vec::new(),
            });
            self.batches.len() - 1
        });
        &mut self.batches[idx]
    }
}

/// Two-level partition of the input rows, projects in first-seen order.
#[derive(Debug, Default)]
pub struct GroupedRows {
    pub projects: Vec<ProjectGroup>,
    index: HashMap<GroupKey, usize>,
}

impl GroupedRows {
    fn project_mut(&mut self, key: GroupKey) -> &mut ProjectGroup {
        let idx = *self.index.entry(key.clone()).or_insert_with(|| {
            self.projects.push(ProjectGroup::new(key));
            self.projects.len() - 1
        });
        &mut self.projects[idx]
    }

    pub fn batch_count(&self) -> usize {
        self.projects.iter().map(|p| p.batches.len()).sum()
    }

    pub fn row_count(&self) -> usize {
        self.projects
            .iter()
            .flat_map(|p| p.batches.iter())
            .map(|b| b.rows.len())
            .sum()
    }
}

/// Partition `rows` by project code, then batch code, preserving encounter
/// order at both levels and input order within each batch. Duplicate rows
/// are kept as-is.
pub fn group_rows(rows: &[Row]) -> GroupedRows {
    let mut grouped = GroupedRows::default();
    for row in rows {
        let project = GroupKey::from_cell(row.get(PRIMARY_KEY_COLUMN));
        let batch = GroupKey::from_cell(row.get(SECONDARY_KEY_COLUMN));
        grouped
            .project_mut(project)
            .batch_mut(batch)
            .rows
            .push(row.clone());
    }
    grouped
}
