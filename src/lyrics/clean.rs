//! Lyrics text cleanup.
//!
//! Remote sources wrap lyrics in page furniture: language markers like
//! "eng||", contributor and translation headers, "you might also like"
//! trailers. [`normalize`] strips those and squashes excess blank lines.

use once_cell::sync::Lazy;
use regex::Regex;

/// Leading language marker, e.g. "eng||" or "FR ||".
static LANG_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\W*[a-z]{2,3}\s*\|\|\s*").expect("language marker regex"));

/// Boilerplate patterns recognized by [`normalize`].
///
/// Sources change their page furniture now and then; keeping the markers as
/// data means a format change is a rule edit, not an algorithm change.
#[derive(Debug, Clone)]
pub struct CleanRules {
    /// A line containing any of these (case-insensitive) is dropped.
    pub drop_contains: Vec<String>,
    /// A line starting with any of these (case-insensitive) ends the lyrics;
    /// it and everything after it is dropped.
    pub stop_prefixes: Vec<String>,
    /// Drop section markers like "[Chorus]" that sit alone on a line.
    pub strip_section_headers: bool,
}

impl Default for CleanRules {
    fn default() -> Self {
        Self {
            drop_contains: vec![
                "contributors".to_string(),
                "translations".to_string(),
                "paroles de la chanson".to_string(),
            ],
            stop_prefixes: vec!["you might also like".to_string()],
            strip_section_headers: true,
        }
    }
}

/// Strip source boilerplate from raw lyrics text.
///
/// Idempotent: running the result through again yields the same text.
pub fn normalize(raw: &str, rules: &CleanRules) -> String {
    let mut kept: Vec<String> = Vec::new();
    'lines: for line in raw.lines() {
        let line = strip_lang_marker(line);
        let lower = line.to_lowercase();
        for prefix in &rules.stop_prefixes {
            if lower.starts_with(&prefix.to_lowercase()) {
                break 'lines;
            }
        }
        if rules
            .drop_contains
            .iter()
            .any(|marker| lower.contains(&marker.to_lowercase()))
        {
            continue;
        }
        if rules.strip_section_headers && is_section_header(&line) {
            continue;
        }
        kept.push(line);
    }
    collapse_blanks(kept).join("\n")
}

fn strip_lang_marker(line: &str) -> String {
    let mut text = line.trim().to_string();
    loop {
        let next = LANG_MARKER.replace(&text, "").trim().to_string();
        if next == text {
            return text;
        }
        text = next;
    }
}

fn is_section_header(line: &str) -> bool {
    line.len() >= 2 && line.starts_with('[') && line.ends_with(']')
}

/// Drop edge blanks; squash any run of more than two blank lines to one.
fn collapse_blanks(lines: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut pending = 0usize;
    for line in lines {
        if line.is_empty() {
            pending += 1;
            continue;
        }
        if !out.is_empty() {
            let blanks = if pending > 2 { 1 } else { pending };
            for _ in 0..blanks {
                out.push(String::new());
            }
        }
        pending = 0;
        out.push(line);
    }
    out
}
