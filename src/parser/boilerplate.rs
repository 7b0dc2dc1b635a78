use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::locate::{locate, Search};
use super::text::{after_last_digit, before_first_digit};
use super::PageFragments;
use crate::config::EngineConfig;

/// Sentinel left behind wherever boilerplate was cut out of the document.
pub const PAGE_BREAK: &str = "!!!Page_Break!!!";

/// How a fragment list was normalised before counting repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Raw,
    /// Only the text ahead of the first digit run (drops page numbers and what follows).
    BeforeDigits,
    /// Only the text behind the last digit run.
    AfterDigits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Header,
    Footer,
    PostHeader,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoilerplatePattern {
    pub role: Role,
    pub text: String,
    pub strategy: Strategy,
    /// Share of pages carrying the pattern.
    pub frequency: f64,
}

/// How far a removal widens around each boilerplate hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expand {
    #[default]
    None,
    /// Swallow adjacent spaces and linebreaks.
    Whitespace,
    /// Swallow the rest of the line.
    ToLinebreak,
}

/// Most frequent fragment, if it shows up on more than `threshold` of the pages.
///
/// Ties go to the fragment seen first. Trailing linebreaks are dropped from the result.
pub fn repeating(fragments: &[&str], threshold: f64) -> Option<(String, f64)> {
    if fragments.is_empty() {
        return None;
    }
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (idx, f) in fragments.iter().enumerate() {
        counts.entry(*f).or_insert((0, idx)).0 += 1;
    }
    let (text, (count, _)) = counts
        .into_iter()
        .max_by(|a, b| a.1 .0.cmp(&b.1 .0).then(b.1 .1.cmp(&a.1 .1)))?;

    let pages = fragments.len() as f64;
    if count as f64 > threshold * pages {
        let text = text.trim_end_matches('\n');
        if text.is_empty() {
            return None;
        }
        return Some((text.to_string(), count as f64 / pages));
    }
    None
}

/// Longest repeating fragment over the raw, digits-before and digits-after views.
///
/// Equal lengths keep the earlier view, so raw text wins ties.
pub fn largest_repeating(fragments: &[String], threshold: f64, role: Role) -> Option<BoilerplatePattern> {
    let raw: Vec<&str> = fragments.iter().map(String::as_str).collect();
    let before: Vec<&str> = raw.iter().map(|f| before_first_digit(f)).collect();
    let after: Vec<&str> = raw.iter().map(|f| after_last_digit(f)).collect();

    let mut best: Option<BoilerplatePattern> = None;
    for (strategy, view) in [
        (Strategy::Raw, raw),
        (Strategy::BeforeDigits, before),
        (Strategy::AfterDigits, after),
    ] {
        let Some((text, frequency)) = repeating(&view, threshold) else {
            continue;
        };
        let longer = best
            .as_ref()
            .map_or(true, |b| text.chars().count() > b.text.chars().count());
        if longer {
            best = Some(BoilerplatePattern {
                role,
                text,
                strategy,
                frequency,
            });
        }
    }
    best
}

/// Replace every case-sensitive occurrence of `pattern` (widened per `before`/`after`)
/// with [`PAGE_BREAK`].
///
/// Patterns of one character or less are never removed.
pub fn remove_occurrences(text: &str, pattern: &str, before: Expand, after: Expand) -> String {
    if pattern.chars().count() <= 1 {
        return text.to_string();
    }
    let hits = locate(
        pattern,
        text,
        &Search {
            ignore_case: false,
            ..Search::default()
        },
    );
    if hits.is_empty() {
        return text.to_string();
    }

    let bytes = text.as_bytes();
    let mut spans: Vec<(usize, usize)> = Vec::with_capacity(hits.len());
    for hit in &hits {
        let mut start = hit.position;
        match before {
            Expand::None => {}
            Expand::Whitespace => {
                while start > 0 && matches!(bytes[start - 1], b' ' | b'\n') {
                    start -= 1;
                }
            }
            Expand::ToLinebreak => {
                while start > 0 && bytes[start - 1] != b'\n' {
                    start -= 1;
                }
            }
        }
        let mut end = hit.position + pattern.len();
        match after {
            Expand::None => {}
            Expand::Whitespace => {
                while end < bytes.len() && matches!(bytes[end], b' ' | b'\n') {
                    end += 1;
                }
            }
            Expand::ToLinebreak => {
                while end < bytes.len() && bytes[end] != b'\n' {
                    end += 1;
                }
            }
        }
        // Widened spans on one line can overlap; fold them together.
        match spans.last_mut() {
            Some(last) if start < last.1 => last.1 = last.1.max(end),
            _ => spans.push((start, end)),
        }
    }

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (start, end) in spans {
        out.push_str(&text[cursor..start]);
        out.push_str(PAGE_BREAK);
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Cut the dominant header and footer (and optionally post-header) out of the document.
///
/// Returns the new text together with the patterns that were removed.
pub fn strip_boilerplate(
    text: &str,
    pages: &PageFragments,
    config: &EngineConfig,
) -> (String, Vec<BoilerplatePattern>) {
    if pages.headers.len() != pages.footers.len()
        || (!pages.post_headers.is_empty() && pages.post_headers.len() != pages.headers.len())
    {
        warn!(
            headers = pages.headers.len(),
            footers = pages.footers.len(),
            post_headers = pages.post_headers.len(),
            "page fragment lists differ in length"
        );
    }

    let mut roles = vec![(Role::Header, &pages.headers), (Role::Footer, &pages.footers)];
    if config.strip_post_headers {
        roles.push((Role::PostHeader, &pages.post_headers));
    }

    let mut current = text.to_string();
    let mut found = Vec::new();
    for (role, fragments) in roles {
        let Some(pattern) = largest_repeating(fragments, config.boilerplate_threshold, role) else {
            debug!(?role, "no repeating boilerplate");
            continue;
        };
        debug!(?role, text = %pattern.text, strategy = ?pattern.strategy, frequency = pattern.frequency, "removing boilerplate");
        current = remove_occurrences(
            &current,
            &pattern.text,
            config.boilerplate_expand,
            config.boilerplate_expand,
        );
        found.push(pattern);
    }
    (current, found)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn page_numbers_hide_raw_repeats() {
        let footers = owned(&["Page 1 of 3", "Page 2 of 3", "Page 3 of 3"]);
        let p = largest_repeating(&footers, 0.5, Role::Footer).unwrap();
        assert_eq!(p.text, "Page ");
        assert_eq!(p.strategy, Strategy::BeforeDigits);
        assert!((p.frequency - 1.0).abs() < 1e-9);
    }

    #[test]
    fn raw_pattern_wins_when_longest() {
        let headers = owned(&[
            "DREF Final Report\nBolivia: Floods\n",
            "DREF Final Report\nBolivia: Floods\n",
            "Cover page",
        ]);
        let p = largest_repeating(&headers, 0.3, Role::Header).unwrap();
        assert_eq!(p.text, "DREF Final Report\nBolivia: Floods");
        assert_eq!(p.strategy, Strategy::Raw);
    }

    #[test]
    fn tie_prefers_raw_view() {
        let headers = owned(&["IFRC", "IFRC", "IFRC"]);
        let p = largest_repeating(&headers, 0.5, Role::Header).unwrap();
        assert_eq!(p.strategy, Strategy::Raw);
    }

    #[test]
    fn below_threshold_finds_nothing() {
        let footers = owned(&["a", "b", "c", "a"]);
        assert!(largest_repeating(&footers, 0.5, Role::Footer).is_none());
        assert!(largest_repeating(&[], 0.3, Role::Footer).is_none());
    }

    #[test]
    fn detection_is_threshold_monotonic() {
        let footers = owned(&["x 1", "x 2", "y", "z 4", "x 5"]);
        let mut detected_before = true;
        for t in [0.1, 0.3, 0.5, 0.7, 0.9] {
            let detected = largest_repeating(&footers, t, Role::Footer).is_some();
            assert!(detected_before || !detected, "detection reappeared at {t}");
            detected_before = detected;
        }
    }

    #[test]
    fn removes_whole_lines_around_pattern() {
        let text = "Intro text\nPage 1 of 2\nmore text\nPage 2 of 2\nend";
        let out = remove_occurrences(text, "Page ", Expand::ToLinebreak, Expand::ToLinebreak);
        assert_eq!(
            out,
            format!("Intro text\n{PAGE_BREAK}\nmore text\n{PAGE_BREAK}\nend")
        );
    }

    #[test]
    fn whitespace_expansion_eats_blank_runs() {
        let out = remove_occurrences("a \n\nIFRC\n\n b", "IFRC", Expand::Whitespace, Expand::Whitespace);
        assert_eq!(out, format!("a{PAGE_BREAK}b"));
    }

    #[test]
    fn single_char_patterns_are_ignored() {
        assert_eq!(remove_occurrences("a b a", "a", Expand::None, Expand::None), "a b a");
        assert_eq!(remove_occurrences("a b a", "", Expand::None, Expand::None), "a b a");
    }

    #[test]
    fn removal_is_case_sensitive() {
        let out = remove_occurrences("IFRC\nifrc", "IFRC", Expand::None, Expand::None);
        assert_eq!(out, format!("{PAGE_BREAK}\nifrc"));
    }

    #[test]
    fn same_line_hits_fold_into_one_break() {
        let out = remove_occurrences("x\nIFRC IFRC\ny", "IFRC", Expand::ToLinebreak, Expand::ToLinebreak);
        assert_eq!(out, format!("x\n{PAGE_BREAK}\ny"));
    }

    #[test]
    fn strip_boilerplate_removes_headers_and_footers() {
        let text = "Report header\nFirst page text.\nPage 1\n\
                    Report header\nSecond page text.\nPage 2\n\
                    Report header\nThird page text.\nPage 3\n\
                    Report header\nFourth page text.\nPage 4\n";
        let pages = PageFragments {
            headers: owned(&["Report header\n"; 4]),
            footers: owned(&["Page 1\n", "Page 2\n", "Page 3\n", "Page 4\n"]),
            post_headers: Vec::new(),
        };
        let (out, found) = strip_boilerplate(text, &pages, &EngineConfig::default());
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].text, "Page ");
        assert!(!out.contains("Report header"));
        assert!(!out.contains("Page "));
        assert!(out.contains("First page text.") && out.contains("Fourth page text."));
        assert_eq!(out.matches(PAGE_BREAK).count(), 8);
    }

    #[test]
    fn post_headers_removed_when_enabled() {
        let text = "Header\nOperation update\nFirst page.\n\
                    Header\nOperation update\nSecond page.\n\
                    Header\nOperation update\nThird page.\n";
        let pages = PageFragments {
            headers: owned(&["Header\n"; 3]),
            footers: Vec::new(),
            post_headers: owned(&["Operation update\n"; 3]),
        };

        let (_, found) = strip_boilerplate(text, &pages, &EngineConfig::default());
        assert!(found.iter().all(|p| p.role != Role::PostHeader));

        let config = EngineConfig {
            strip_post_headers: true,
            ..EngineConfig::default()
        };
        let (out, found) = strip_boilerplate(text, &pages, &config);
        let post = found.iter().find(|p| p.role == Role::PostHeader).unwrap();
        assert_eq!(post.text, "Operation update");
        assert!(!out.contains("Operation update"));
        assert!(out.contains("Second page."));
        assert_eq!(out.matches(PAGE_BREAK).count(), 6);
    }
}
