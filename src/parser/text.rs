use std::sync::LazyLock;

use regex::Regex;

static SPACED_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]+\n").unwrap());

/// Glyphs that open a bulleted list item in converted reports.
pub const BULLETS: &[char] = &['•', '●', '▪', '■', '◦', '○', '\u{f0b7}', '➢', '✓'];

pub fn is_bullet(c: char) -> bool {
    BULLETS.contains(&c)
}

/// Bullet glyph the text opens with, ignoring leading whitespace.
pub fn starts_with_bullet(s: &str) -> Option<char> {
    s.trim_start().chars().next().filter(|c| is_bullet(*c))
}

/// How strongly a fragment looks like the beginning of a sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceStart {
    No,
    /// Two capitals in a row: an acronym or a shouted title, not a clear start.
    Weak,
    Yes,
}

impl SentenceStart {
    pub fn score(self) -> f64 {
        match self {
            SentenceStart::No => 0.0,
            SentenceStart::Weak => 0.5,
            SentenceStart::Yes => 1.0,
        }
    }
}

pub fn ends_sentence(s: &str) -> bool {
    matches!(s.trim_end().chars().last(), Some('.' | '?' | '!'))
}

pub fn sentence_start(s: &str) -> SentenceStart {
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if is_bullet(c) {
            return SentenceStart::Yes;
        }
        if c.is_lowercase() {
            return SentenceStart::No;
        }
        if c.is_uppercase() {
            return match chars.peek() {
                Some(next) if next.is_uppercase() => SentenceStart::Weak,
                _ => SentenceStart::Yes,
            };
        }
    }
    SentenceStart::No
}

/// Turn whitespace-only lines into bare linebreaks, so `"\n \n"` counts as a blank line.
pub fn drop_spaces_between_linebreaks(s: &str) -> String {
    let mut out = s.to_string();
    while SPACED_BREAK_RE.is_match(&out) {
        out = SPACED_BREAK_RE.replace_all(&out, "\n\n").into_owned();
    }
    out
}

/// Last line of `s` with visible content, trimmed.
pub fn bottom_line(s: &str) -> &str {
    s.lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
}

/// True when nothing but spaces sits between the last linebreak and the end of `s`.
pub fn only_spaces_after_last_linebreak(s: &str) -> bool {
    let tail = match s.rfind('\n') {
        Some(i) => &s[i + 1..],
        None => s,
    };
    tail.chars().all(|c| c == ' ' || c == '\t')
}

/// Text before the first ASCII digit; the whole string when it has none.
pub fn before_first_digit(s: &str) -> &str {
    match s.find(|c: char| c.is_ascii_digit()) {
        Some(i) => &s[..i],
        None => s,
    }
}

/// Text after the last ASCII digit; the whole string when it has none.
pub fn after_last_digit(s: &str) -> &str {
    match s.rfind(|c: char| c.is_ascii_digit()) {
        Some(i) => &s[i + 1..],
        None => s,
    }
}

/// Section-number shapes such as `1.5`.
pub fn has_digit_dot_digit(s: &str) -> bool {
    s.as_bytes()
        .windows(3)
        .any(|w| w[0].is_ascii_digit() && w[1] == b'.' && w[2].is_ascii_digit())
}

pub fn trim_breaks(s: &str) -> &str {
    s.trim_matches(|c| c == '\n' || c == ' ')
}

pub fn trim_breaks_end(s: &str) -> &str {
    s.trim_end_matches(|c| c == '\n' || c == ' ')
}

pub fn trim_breaks_start(s: &str) -> &str {
    s.trim_start_matches(|c| c == '\n' || c == ' ')
}

/// Largest char boundary at or below `i`.
pub fn floor_boundary(s: &str, i: usize) -> usize {
    let mut i = i.min(s.len());
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Smallest char boundary at or above `i`.
pub fn ceil_boundary(s: &str, i: usize) -> usize {
    let mut i = i.min(s.len());
    while !s.is_char_boundary(i) {
        i += 1;
    }
    i
}
