use std::sync::LazyLock;

use regex::Regex;

use super::boilerplate::PAGE_BREAK;
use super::text::{
    ends_sentence, sentence_start, starts_with_bullet, trim_breaks, trim_breaks_end,
    trim_breaks_start, SentenceStart,
};

/// Header and footer removal both leave a marker; two in a row mean one page turn.
static DOUBLE_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| {
    let mark = regex::escape(PAGE_BREAK);
    Regex::new(&format!("[\n ]*{mark}[\n ]*{mark}[\n ]*")).unwrap()
});

/// Blank-line run that means a passage finished before the page turned.
pub const HARD_STOP: &str = "\n\n\n";

fn collapse_double_breaks(region: &str) -> String {
    let mut out = region.to_string();
    while DOUBLE_BREAK_RE.is_match(&out) {
        out = DOUBLE_BREAK_RE.replace_all(&out, PAGE_BREAK).into_owned();
    }
    out
}

/// Whether the text after the break reads as the continuation of the text before it.
fn consistent(pre: &str, post: &str) -> bool {
    matches!(
        (ends_sentence(pre), sentence_start(post)),
        (true, SentenceStart::Yes) | (false, SentenceStart::No)
    )
}

fn same_bullet(pre: &str, post: &str) -> bool {
    match starts_with_bullet(pre) {
        Some(b) => starts_with_bullet(post) == Some(b),
        None => false,
    }
}

/// Resolve the page break inside an extracted region.
///
/// Keeps only the text before the break unless the text after it continues the same
/// passage, in which case both halves are joined with a blank line. Text without a
/// break marker is returned unchanged.
pub fn avoid_page_break(region: &str, stop: &str) -> String {
    if !region.contains(PAGE_BREAK) {
        return region.to_string();
    }
    let region = collapse_double_breaks(region);
    let mut parts = region.split(PAGE_BREAK);
    let pre = parts.next().unwrap_or("");
    let post = parts.next().unwrap_or("");

    if !stop.is_empty() && trim_breaks(pre).contains(stop) {
        return pre.to_string();
    }
    if trim_breaks_end(pre).is_empty() {
        return post.to_string();
    }

    // A list intro carries on even when the next page opens a new sentence.
    let must_go_on = trim_breaks_end(pre).ends_with(':');
    let bulleted = same_bullet(pre, post);
    if consistent(pre, post) || must_go_on || bulleted {
        if bulleted {
            return format!("{}\n\n{}", trim_breaks_end(pre), trim_breaks_start(post));
        }
        return format!("{pre}\n\n{post}");
    }
    pre.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_break(pre: &str, post: &str) -> String {
        format!("{pre}{PAGE_BREAK}{post}")
    }

    #[test]
    fn text_without_marker_is_untouched() {
        for s in ["", "plain text", "a\n\n\nb", "• one\n\n• two"] {
            assert_eq!(avoid_page_break(s, HARD_STOP), s);
        }
    }

    #[test]
    fn same_bullet_joins_without_extra_blank_line() {
        let region = "• Item one\n\n!!!Page_Break!!!\n\n• Item two";
        assert_eq!(avoid_page_break(region, HARD_STOP), "• Item one\n\n• Item two");
    }

    #[test]
    fn sentence_continuing_over_page_is_joined() {
        let region = with_break("The trucks could not reach the\n", "\nvillages in time.");
        assert_eq!(
            avoid_page_break(&region, HARD_STOP),
            "The trucks could not reach the\n\n\n\nvillages in time."
        );
    }

    #[test]
    fn finished_sentence_followed_by_new_one_is_joined() {
        let region = with_break("Funding arrived late.\n", "\nVolunteers were tired.");
        assert!(avoid_page_break(&region, HARD_STOP).ends_with("Volunteers were tired."));
    }

    #[test]
    fn inconsistent_boundary_keeps_first_page() {
        let region = with_break("Funding arrived late.\n", "\nand then more text");
        assert_eq!(avoid_page_break(&region, HARD_STOP), "Funding arrived late.\n");
        let region = with_break("Funding arrived\n", "\nNFI distribution");
        assert_eq!(avoid_page_break(&region, HARD_STOP), "Funding arrived\n");
    }

    #[test]
    fn hard_stop_before_break_keeps_first_page() {
        let region = with_break("Done.\n\n\n\nOther section\n", "\nmore");
        assert_eq!(avoid_page_break(&region, HARD_STOP), "Done.\n\n\n\nOther section\n");
    }

    #[test]
    fn empty_first_page_keeps_second() {
        let region = with_break("\n \n", "Lessons continue here.");
        assert_eq!(avoid_page_break(&region, HARD_STOP), "Lessons continue here.");
    }

    #[test]
    fn colon_before_break_continues() {
        let region = with_break("The main issues were:\n", "\nlate funding.");
        assert!(avoid_page_break(&region, HARD_STOP).contains("late funding."));
    }

    #[test]
    fn colon_joins_capitalised_continuation() {
        let region = with_break("The main issues were:\n", "\nFuel shortages in the north.");
        assert_eq!(
            avoid_page_break(&region, HARD_STOP),
            "The main issues were:\n\n\n\nFuel shortages in the north."
        );
    }

    #[test]
    fn header_and_footer_markers_collapse() {
        let region = format!("Stock ran out\n{PAGE_BREAK}\n \n{PAGE_BREAK}\nin the north.");
        assert_eq!(
            avoid_page_break(&region, HARD_STOP),
            "Stock ran out\n\nin the north."
        );
    }
}
