// src/lib.rs
pub mod config;
pub mod error;
pub mod group;
pub mod sanitize;
pub mod sheet;
pub mod split;

pub use config::SplitConfig;
pub use error::SplitError;
pub use split::dispatch::ProgressSink;
pub use split::{split_table, SplitSummary, Splitter};
