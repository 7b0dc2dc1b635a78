use tracing::debug;

use super::clean::is_placeholder;
use super::locate::{locate, locate_any, Search};
use super::stitch::{avoid_page_break, HARD_STOP};
use super::text::{drop_spaces_between_linebreaks, starts_with_bullet, trim_breaks, trim_breaks_end};
use crate::config::EngineConfig;

/// Linebreak layouts a "Challenges" heading shows up with.
const CHALLENGE_ANCHORS: &[&str] = &[
    "\n\nChallenges",
    "\n \nChallenges",
    "\n  \nChallenges",
    "\nChallenges \n",
    "\n\n Challenges",
];
const CHALLENGE_HEADING: &str = "\nChallenges";
/// A Lessons heading ends the Challenges text in front of it.
const CHALLENGE_STOP: &str = "\nLessons ";
const LESSONS_ANCHOR: &str = "\nLessons";
const LESSONS_WORDS: &[&str] = &["learned", "learnt"];
const RECOMMENDATIONS: &str = "Recommendations";
/// Stop used when a Challenges capture ran on too long.
const CHALLENGE_RESTOP: &str = "\n\n\n\n";
/// Blank run after which a short Challenges answer is usually over.
const LONG_GAP: &str = "\n\n\n\n\n";
const NEXT_SECTION: &str = "Strategies for Implementation";

/// Text captured after one anchor. Every excerpt cut from it shares its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub position: usize,
    pub text: String,
}

pub fn challenge_regions(text: &str, config: &EngineConfig) -> Vec<Region> {
    let hits = locate_any(
        CHALLENGE_ANCHORS,
        text,
        &Search {
            before: config.challenge_back_window,
            after: config.challenge_window,
            stop_at: Some(CHALLENGE_STOP),
            ..Search::default()
        },
    );

    let mut regions = Vec::with_capacity(hits.len());
    for (i, hit) in hits.iter().enumerate() {
        let mut body = hit.after_match().to_string();
        let chars = body.chars().count();
        let overlaps_next = hits
            .get(i + 1)
            .is_some_and(|next| hit.position + body.len() > next.position);
        let too_long = chars > config.challenge_hard_cap;
        let long_and_done = chars > config.challenge_soft_cap && likely_ended(&body);
        if overlaps_next || too_long || long_and_done {
            debug!(position = hit.position, overlaps_next, too_long, long_and_done, "shortening challenges");
            body = finish_section(&body, CHALLENGE_RESTOP);
        }
        let body = avoid_page_break(&body, HARD_STOP);
        if trim_breaks(&body).is_empty() {
            continue;
        }
        regions.push(Region {
            position: hit.position,
            text: body,
        });
    }
    regions
}

pub fn lessons_regions(text: &str, config: &EngineConfig) -> Vec<Region> {
    let hits = locate(
        LESSONS_ANCHOR,
        text,
        &Search {
            after: config.lessons_window,
            ..Search::default()
        },
    );

    let mut regions = Vec::new();
    for hit in &hits {
        let Some(body) = strip_lessons_heading(hit.after_match()) else {
            continue;
        };
        let body = avoid_page_break(&body, HARD_STOP);
        let body = finish_section(&body, HARD_STOP);
        if trim_breaks(&body).is_empty() {
            continue;
        }
        regions.push(Region {
            position: hit.position,
            text: body,
        });
    }
    regions
}

/// Text after a real "Lessons learned" heading, or `None` when "Lessons" opens
/// anything else.
///
/// `rest` starts right after the word "Lessons".
pub fn strip_lessons_heading(rest: &str) -> Option<String> {
    let rest = drop_spaces_between_linebreaks(rest);
    let (line, tail) = rest.split_once('\n').unwrap_or((rest.as_str(), ""));
    let word = line.trim_matches(' ').trim_matches(':').trim_matches(' ');
    if !LESSONS_WORDS.iter().any(|w| w.eq_ignore_ascii_case(word)) {
        return None;
    }
    Some(tail.trim_start_matches('\n').to_string())
}

/// Cut a section at the first `stop` run unless what follows clearly continues it.
///
/// Continues over a stop when the section is a bullet list and the next block opens
/// with the same bullet, when the next block is a "Recommendations" sub-heading (the
/// heading itself is dropped), or when the text so far ends with ':'. The result never
/// runs into a following Challenges heading.
pub fn finish_section(s: &str, stop: &str) -> String {
    let s = drop_spaces_between_linebreaks(s);
    let s = s.trim_start_matches('\n');
    let mut blocks = s.split(stop);
    let mut output = blocks.next().unwrap_or("").to_string();
    let bullet = starts_with_bullet(&output);

    for block in blocks.filter(|b| !b.is_empty()) {
        if bullet.is_some() && starts_with_bullet(block) == bullet {
            output.push_str(stop);
            output.push_str(block);
            continue;
        }
        let first_line = block.split('\n').next().unwrap_or("");
        if trim_breaks(first_line) == RECOMMENDATIONS {
            output.push_str(stop);
            output.push_str(&block[first_line.len()..]);
            continue;
        }
        if trim_breaks_end(&output).ends_with(':') {
            output.push_str(stop);
            output.push_str(block);
            continue;
        }
        break;
    }

    match output.find(CHALLENGE_HEADING) {
        Some(i) => output[..i].to_string(),
        None => output,
    }
}

/// Whether a long Challenges capture most likely finished at its first wide blank gap:
/// the text ahead of the gap is a "nothing to report" answer, or the text after it
/// opens the next section.
pub fn likely_ended(s: &str) -> bool {
    let s = drop_spaces_between_linebreaks(s);
    let Some(i) = s.find(LONG_GAP) else {
        return false;
    };
    let before = trim_breaks(&s[..i]);
    let after = s[i + LONG_GAP.len()..].split("\n\n").next().unwrap_or("");
    is_placeholder(before) || trim_breaks(after).starts_with(NEXT_SECTION)
}
