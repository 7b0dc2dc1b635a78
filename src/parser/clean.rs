use std::sync::LazyLock;

use regex::Regex;

use super::regions::Region;
use super::segment::{drop_headings, split};
use super::text::{is_bullet, sentence_start, trim_breaks, SentenceStart};

static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]*\n").unwrap());
static BLANK_COLLAPSE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]*\n\s*").unwrap());
static SPACES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").unwrap());

const CAPTION_MARKERS: &[&str] = &["(Photo:", "(Image:", "Source:"];

/// Dismissive answers and the length under which they mean "nothing to report".
const PLACEHOLDERS: &[(&str, usize)] = &[
    ("none", 70),
    ("nothing", 70),
    ("no challenge", 70),
    ("no lesson", 70),
    ("not applicable", 70),
    ("similar challenges as", 70),
    ("not enough reporting", 105),
];

/// Excerpts of this many characters or fewer carry no content.
const MIN_EXCERPT_LEN: usize = 5;

/// Drop a leading list number such as "3." (but not "3.5").
fn strip_list_number(s: &str) -> &str {
    let mut chars = s.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some('1'..='9'), Some('.'), next) if !next.is_some_and(|c| c.is_ascii_digit()) => &s[2..],
        _ => s,
    }
}

fn strip_once(s: &str) -> &str {
    let s = s.trim_matches(|c: char| c.is_whitespace() || is_bullet(c));
    let s = strip_list_number(s).trim_start();
    s.strip_prefix('.').unwrap_or(s)
}

/// Peel whitespace, bullets and list numbering off both ends until nothing changes.
pub fn strip_all(s: &str, max_passes: usize) -> &str {
    let mut s = s;
    for _ in 0..max_passes {
        let next = strip_once(s);
        if next.len() == s.len() {
            break;
        }
        s = next;
    }
    s
}

fn first_caption(s: &str) -> Option<usize> {
    CAPTION_MARKERS.iter().filter_map(|m| s.find(m)).min()
}

/// Cut out the first image caption.
///
/// The caption runs from the closest earlier blank line followed by a sentence start
/// (or else the start of the marker's line) to the next blank line or the end of text.
pub fn drop_image_caption(s: &str) -> String {
    let Some(at) = first_caption(s) else {
        return s.to_string();
    };
    let end = BLANK_RUN_RE
        .find_at(s, at)
        .map_or(s.len(), |m| m.start());
    let start = BLANK_RUN_RE
        .find_iter(&s[..at])
        .map(|m| m.end())
        .filter(|&i| sentence_start(&s[i..]) == SentenceStart::Yes)
        .last()
        .unwrap_or_else(|| s[..at].rfind('\n').map_or(0, |i| i + 1));
    format!("{}{}", &s[..start], &s[end..])
}

/// Whether the text is a "no challenges"/"N/A" style non-answer.
pub fn is_placeholder(s: &str) -> bool {
    let s = s.trim();
    let chars: Vec<char> = s.chars().collect();
    if chars.len() < 3 {
        return true;
    }
    if !chars.windows(2).any(|w| w[0].is_alphabetic() && w[1].is_alphabetic()) {
        return true;
    }
    let lower = s.to_lowercase();
    if lower == "none" || lower == "n/a" {
        return true;
    }
    PLACEHOLDERS
        .iter()
        .any(|(phrase, cap)| lower.starts_with(phrase) && chars.len() < *cap)
}

/// Blank-line runs become a space, lone linebreaks vanish, runs of spaces shrink to one.
pub fn collapse_whitespace(s: &str) -> String {
    let s = BLANK_COLLAPSE_RE.replace_all(s, " ");
    let s = s.replace('\n', "");
    SPACES_RE.replace_all(&s, " ").into_owned()
}

/// Clean one excerpt candidate, or `None` when nothing worth keeping is left.
pub fn clean_excerpt(raw: &str, max_passes: usize) -> Option<String> {
    let mut s = strip_all(raw, max_passes).to_string();
    while first_caption(&s).is_some() {
        s = strip_all(&drop_image_caption(&s), max_passes).to_string();
    }
    if is_placeholder(&s) || s.chars().count() <= MIN_EXCERPT_LEN {
        return None;
    }
    let s = strip_all(&collapse_whitespace(&s), max_passes).to_string();
    if is_placeholder(&s) || s.chars().count() <= MIN_EXCERPT_LEN {
        return None;
    }
    Some(s)
}

/// Split a region into cleaned excerpts that keep the region's position.
pub fn split_and_clean(region: &Region, max_passes: usize) -> Vec<Region> {
    let candidates = drop_headings(split(trim_breaks(&region.text)));
    candidates
        .iter()
        .filter_map(|c| clean_excerpt(c, max_passes))
        .map(|text| Region {
            position: region.position,
            text,
        })
        .collect()
}

/// All-capitals text, which inside a Lessons list means a section title was captured.
pub fn is_shouting(s: &str) -> bool {
    s.to_uppercase() == s
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSES: usize = 20;

    #[test]
    fn stacked_prefixes_are_stripped() {
        assert_eq!(strip_all("  • 1. • Trucks were late. \n", PASSES), "Trucks were late.");
        assert_eq!(strip_all("\n.Volunteers", PASSES), "Volunteers");
        assert_eq!(strip_all("1.5 million people", PASSES), "1.5 million people");
        assert_eq!(strip_all("", PASSES), "");
    }

    #[test]
    fn strip_respects_pass_limit() {
        assert_eq!(strip_all("1. 2. Text", 1), "2. Text");
    }

    #[test]
    fn caption_is_removed() {
        let s = "Stock ran out early.\n\nVolunteers prepare kits. (Photo: IFRC)\n\nRoads were closed.";
        assert_eq!(drop_image_caption(s), "Stock ran out early.\n\n\n\nRoads were closed.");
    }

    #[test]
    fn caption_at_end_of_text() {
        let s = "Roads were closed.\nSource: national society";
        assert_eq!(drop_image_caption(s), "Roads were closed.\n");
    }

    #[test]
    fn every_caption_is_removed() {
        let raw = "Stock ran out.\n\nKits arrive. (Photo: IFRC)\n\nRoads were closed.\n\n\
                   Volunteers load trucks. (Photo: BRC)\n\nFuel was scarce.\n\nA team meeting. (Image: NS)";
        let once = clean_excerpt(raw, PASSES).unwrap();
        assert_eq!(once, "Stock ran out. Roads were closed. Fuel was scarce.");
        assert_eq!(clean_excerpt(&once, PASSES).as_deref(), Some(once.as_str()));
    }

    #[test]
    fn placeholders() {
        for s in ["N/A", "n/a", "None", "-", "12", "1. 2.", "Nothing to report.", "Not applicable"] {
            assert!(is_placeholder(s), "{s:?}");
        }
        assert!(is_placeholder("No challenges were identified in this sector."));
        assert!(!is_placeholder(
            "Nothing could be procured locally, so all relief items were imported by air."
        ));
        assert!(!is_placeholder("We lacked funding."));
    }

    #[test]
    fn short_dismissive_answers_are_skipped() {
        assert_eq!(
            clean_excerpt("None of the planned activities could start on time.", PASSES),
            None
        );
        assert_eq!(clean_excerpt("• Nothing significant to report for this sector.", PASSES), None);
    }

    #[test]
    fn na_excerpt_is_skipped() {
        assert_eq!(clean_excerpt("  N/A \n", PASSES), None);
        assert_eq!(clean_excerpt("• Nil.", PASSES), None);
    }

    #[test]
    fn whitespace_is_collapsed() {
        assert_eq!(
            clean_excerpt("• The trucks could not reach the\nvillages  in   time.", PASSES).as_deref(),
            Some("The trucks could not reach thevillages in time.")
        );
        assert_eq!(
            collapse_whitespace("First part.\n\n \nSecond part."),
            "First part. Second part."
        );
    }

    #[test]
    fn cleaning_is_idempotent() {
        let raw = std::fs::read_to_string("tests/fixtures/challenges_region.txt").unwrap();
        for piece in split(&raw) {
            if let Some(once) = clean_excerpt(&piece, PASSES) {
                assert_eq!(clean_excerpt(&once, PASSES).as_deref(), Some(once.as_str()));
            }
        }
    }

    #[test]
    fn region_splits_into_clean_excerpts() {
        let region = Region {
            position: 42,
            text: "\n\nWe lacked funding for fuel.\n\nN/A\n\nOutput 1.2 Shelter materials distributed\n\nMore text after heading."
                .into(),
        };
        let out = split_and_clean(&region, PASSES);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "We lacked funding for fuel.");
        assert_eq!(out[0].position, 42);
    }

    #[test]
    fn shouting_titles() {
        assert!(is_shouting("RECOMMENDATIONS"));
        assert!(!is_shouting("Plan earlier."));
    }
}
