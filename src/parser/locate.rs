use regex::{Regex, RegexBuilder};

use super::text::{ceil_boundary, floor_boundary};

/// One occurrence of a searched pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    /// Byte offset of the match in the searched text.
    pub position: usize,
    /// Byte length of the matched text.
    pub len: usize,
    /// Text around the match: `before` bytes ahead of it, `after` bytes from its start.
    pub context: String,
    /// Bytes of `context` that precede the match.
    pub ahead: usize,
}

impl Hit {
    /// The part of the context window that follows the match itself.
    pub fn after_match(&self) -> &str {
        self.context.get(self.ahead + self.len..).unwrap_or("")
    }

    /// The part of the context window that precedes the match.
    pub fn before_match(&self) -> &str {
        self.context.get(..self.ahead).unwrap_or(&self.context)
    }
}

/// Shape of the context window captured around each hit.
#[derive(Debug, Clone, Copy)]
pub struct Search<'a> {
    pub before: usize,
    pub after: usize,
    pub ignore_case: bool,
    /// Cut the window at the first occurrence of this marker.
    pub stop_at: Option<&'a str>,
}

impl Default for Search<'_> {
    fn default() -> Self {
        Search {
            before: 0,
            after: 0,
            ignore_case: true,
            stop_at: None,
        }
    }
}

fn literal(pattern: &str, ignore_case: bool) -> Option<Regex> {
    alternatives(&[pattern], ignore_case)
}

/// One regex matching any of the literal `patterns`; at a shared start the earlier
/// pattern wins.
fn alternatives(patterns: &[&str], ignore_case: bool) -> Option<Regex> {
    let escaped: Vec<String> = patterns
        .iter()
        .filter(|p| !p.is_empty())
        .map(|p| regex::escape(p))
        .collect();
    if escaped.is_empty() {
        return None;
    }
    RegexBuilder::new(&escaped.join("|"))
        .case_insensitive(ignore_case)
        .build()
        .ok()
}

/// Every non-overlapping occurrence of `pattern`, left to right, with its context window.
pub fn locate(pattern: &str, text: &str, search: &Search) -> Vec<Hit> {
    match literal(pattern, search.ignore_case) {
        Some(re) => collect_hits(&re, text, search),
        None => Vec::new(),
    }
}

/// Locate several equivalent markers in one pass.
///
/// A hit may come from any of the variants; positions always index `text` itself,
/// so they stay comparable with hits from other searches on the same text.
pub fn locate_any(patterns: &[&str], text: &str, search: &Search) -> Vec<Hit> {
    match alternatives(patterns, search.ignore_case) {
        Some(re) => collect_hits(&re, text, search),
        None => Vec::new(),
    }
}

fn collect_hits(re: &Regex, text: &str, search: &Search) -> Vec<Hit> {
    let stop = search
        .stop_at
        .filter(|s| !s.is_empty())
        .and_then(|s| literal(s, search.ignore_case));

    re.find_iter(text)
        .map(|m| {
            let start = floor_boundary(text, m.start().saturating_sub(search.before));
            let end = ceil_boundary(text, m.start().saturating_add(search.after));
            let mut window = &text[start..end];
            if let Some(stop) = &stop {
                // Only a marker after the hit cuts the window.
                let from = (m.end() - start).min(window.len());
                if let Some(cut) = stop.find_at(window, from) {
                    window = &window[..cut.start()];
                }
            }
            Hit {
                position: m.start(),
                len: m.len(),
                context: window.to_string(),
                ahead: m.start() - start,
            }
        })
        .collect()
}
