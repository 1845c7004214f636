// src/sanitize.rs
use once_cell::sync::Lazy;
use regex::Regex;

static ILLEGAL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[\\/:*?"<>|]"#).unwrap());
static EDGE_DOTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\.+|\.+$").unwrap());
static EDGE_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s+|\s+$").unwrap());
static INNER_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Turn a raw group-key string into a single safe path segment.
///
/// Characters that are reserved on common filesystems become `_`, a run of
/// leading or trailing dots becomes `_`, leading/trailing whitespace becomes
/// `_`, and any remaining internal whitespace run collapses to a single `_`.
/// Total and deterministic; distinct inputs can collide (`"B:1"` and `"B/1"`
/// both give `"B_1"`), which the task builder treats as an error.
pub fn sanitize_segment(raw: &str) -> String {
    let out = ILLEGAL.replace_all(raw, "_");
    let out = EDGE_DOTS.replace_all(&out, "_");
    let out = EDGE_SPACE.replace_all(&out, "_");
    INNER_SPACE.replace_all(&out, "_").into_owned()
}
