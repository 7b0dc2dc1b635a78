use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::text::{ends_sentence, has_digit_dot_digit, is_bullet, sentence_start, BULLETS};

/// Canonical separator every boundary candidate is rewritten to.
const SEP: char = '\u{2029}';
/// Separator that always splits.
const FORCED: char = '\u{2028}';

/// Minimum boundary score for a candidate separator to split.
pub const SPLIT_THRESHOLD: f64 = 2.0;

/// Left-hand words that leave a sentence hanging.
const DANGLING_WORDS: &[&str] = &["and", "the"];
/// A right-hand fragment shorter than this is too small to stand alone.
const MIN_RIGHT_LEN: usize = 10;

static BLANK_SEP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ ]{0,4}\n").unwrap());
static BULLET_SEP_RE: LazyLock<Regex> = LazyLock::new(|| {
    let glyphs: String = BULLETS.iter().map(|c| regex::escape(&c.to_string())).collect();
    Regex::new(&format!(r"\n[ \t]*([{glyphs}])")).unwrap()
});
static NUMBER_SEP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]*([2-5]\.[^0-9])").unwrap());
/// "Output 1"/"Outcome 2" style headings open a new block no matter what precedes them.
static FORCED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Out(?:put|come) [12]").unwrap());
static SEP_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new("[\u{2028}\u{2029}]+").unwrap());

fn normalize(text: &str) -> String {
    let sep = SEP.to_string();
    let out = FORCED_RE.replace_all(text, format!("{FORCED}$0").as_str());
    let out = BLANK_SEP_RE.replace_all(&out, sep.as_str());
    let out = BULLET_SEP_RE.replace_all(&out, format!("{SEP}$1").as_str());
    NUMBER_SEP_RE
        .replace_all(&out, format!("{SEP}$1").as_str())
        .into_owned()
}

/// Pieces between separator runs, and for each run whether it must split.
fn tokenize(normalized: &str) -> (Vec<&str>, Vec<bool>) {
    let mut pieces = Vec::new();
    let mut forced = Vec::new();
    let mut cursor = 0;
    for m in SEP_RUN_RE.find_iter(normalized) {
        pieces.push(&normalized[cursor..m.start()]);
        forced.push(m.as_str().contains(FORCED));
        cursor = m.end();
    }
    pieces.push(&normalized[cursor..]);
    (pieces, forced)
}

fn fragment_key(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || is_bullet(c))
}

/// Fragments of the region split on bullet separators alone.
fn bullet_fragments(region: &str) -> HashSet<String> {
    let sep = SEP.to_string();
    BULLET_SEP_RE
        .replace_all(region, format!("{SEP}$1").as_str())
        .split(sep.as_str())
        .map(fragment_key)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

fn left_ends_sentence(left: &str) -> f64 {
    if ends_sentence(left) {
        1.0
    } else {
        0.0
    }
}

fn right_starts_sentence(right: &str) -> f64 {
    sentence_start(right).score()
}

fn nothing_strange(left: &str, right: &str) -> f64 {
    let last_word = left
        .split_whitespace()
        .last()
        .map(str::to_lowercase)
        .unwrap_or_default();
    let dangling = DANGLING_WORDS.contains(&last_word.as_str());
    if !dangling && right.trim().chars().count() >= MIN_RIGHT_LEN {
        1.0
    } else {
        0.0
    }
}

fn bullet_agreement(left: &str, right: &str, fragments: &HashSet<String>) -> f64 {
    if fragments.contains(fragment_key(left)) && fragments.contains(fragment_key(right)) {
        0.5
    } else {
        0.0
    }
}

/// How strongly the separator between `current` (text accumulated so far, ending in
/// the raw piece `left`) and `right` looks like a real boundary.
pub fn boundary_score(current: &str, left: &str, right: &str, fragments: &HashSet<String>) -> f64 {
    left_ends_sentence(current)
        + right_starts_sentence(right)
        + nothing_strange(current, right)
        + bullet_agreement(left, right, fragments)
}

/// Split a region into excerpt candidates.
///
/// Candidate separators are blank lines, bulleted lines and lines opening with "2." to
/// "5."; each one splits only when [`boundary_score`] reaches [`SPLIT_THRESHOLD`],
/// otherwise the pieces around it are merged with a blank line. Whitespace-only
/// candidates are dropped.
pub fn split(region: &str) -> Vec<String> {
    let normalized = normalize(region);
    let (pieces, forced) = tokenize(&normalized);
    let fragments = bullet_fragments(region);

    let mut out = Vec::new();
    let mut current = pieces[0].to_string();
    for (i, must_split) in forced.into_iter().enumerate() {
        let left = pieces[i];
        let right = pieces[i + 1];
        if must_split || boundary_score(&current, left, right, &fragments) >= SPLIT_THRESHOLD {
            out.push(std::mem::take(&mut current));
            current.push_str(right);
        } else {
            current.push_str("\n\n");
            current.push_str(right);
        }
    }
    out.push(current);
    out.retain(|p| !p.trim().is_empty());
    out
}

/// Numbered output/outcome headings that start structured tables, not narrative.
pub fn is_heading(candidate: &str) -> bool {
    (candidate.contains("Output") && has_digit_dot_digit(candidate))
        || candidate.contains("Outcome 1")
        || candidate.contains("Outcome 2")
}

/// Drop the first heading-like candidate and everything after it.
pub fn drop_headings(mut candidates: Vec<String>) -> Vec<String> {
    if let Some(i) = candidates.iter().position(|c| is_heading(c)) {
        candidates.truncate(i);
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn non_whitespace(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn separate_sentences_split() {
        let parts = split("We lacked funding for the response.\n\nVolunteers were not trained in time.");
        assert_eq!(
            parts,
            vec!["We lacked funding for the response.", "Volunteers were not trained in time."]
        );
    }

    #[test]
    fn broken_sentence_is_merged() {
        let parts = split("The distribution was delayed because the\n\nroads were blocked by landslides.");
        assert_eq!(parts.len(), 1);
        assert!(parts[0].contains("because the\n\nroads"));
    }

    #[test]
    fn short_unfinished_tail_is_merged() {
        let parts = split("Procurement took longer than planned\n\nSee annex");
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn bullets_split_into_items() {
        let region = "Main challenges:\n• Access to remote villages was limited.\n• Stock of hygiene kits ran out early.";
        let parts = split(region);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2].trim(), "• Stock of hygiene kits ran out early.");
    }

    #[test]
    fn numbered_items_split() {
        let region = "1. Funding arrived late in the operation.\n2. Volunteers lacked protective equipment.";
        let parts = split(region);
        assert_eq!(parts.len(), 2);
        assert!(parts[1].starts_with("2. Volunteers"));
    }

    #[test]
    fn decimal_numbers_are_not_separators() {
        let parts = split("Prices rose by\n2.5 percent during the operation period.");
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn outcome_heading_always_splits() {
        let parts = split("Health staff were overstretched and\nOutcome 1 The population is safe.");
        assert_eq!(parts.len(), 2);
        assert!(parts[1].starts_with("Outcome 1"));
    }

    #[test]
    fn split_keeps_every_visible_character() {
        let region = std::fs::read_to_string("tests/fixtures/challenges_region.txt").unwrap();
        let parts = split(&region);
        assert!(parts.len() > 1);
        assert_eq!(non_whitespace(&parts.join(&SEP.to_string())), non_whitespace(&region));
    }

    #[test]
    fn heading_candidates_are_rejected() {
        assert!(is_heading("Output 1.2 Shelter materials distributed"));
        assert!(is_heading("Outcome 2: communities are resilient"));
        assert!(!is_heading("Output of the assessment was shared"));
        let kept = drop_headings(vec![
            "Stock ran out.".into(),
            "Output 1.2 Shelter materials distributed".into(),
            "Trucks were late.".into(),
        ]);
        assert_eq!(kept, vec!["Stock ran out.".to_string()]);
    }

    #[test]
    fn empty_region_yields_nothing() {
        assert!(split("").is_empty());
        assert!(split("\n\n \n").is_empty());
    }
}
