use once_cell::sync::Lazy;
use regex::Regex;

static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s-]").expect("sanitize pattern should compile"));
static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern should compile"));

/// Turn an arbitrary trait or metadata key into a column-name fragment.
///
/// Drops everything except word characters, whitespace and `-`, trims, then
/// collapses each whitespace run into a single `_`.
pub fn sanitize(raw: &str) -> String {
    let kept = DISALLOWED.replace_all(raw, "");
    WHITESPACE_RUN.replace_all(kept.trim(), "_").into_owned()
}
