use std::ops::Range;

/// Two consecutive line breaks separate paragraphs
pub const PARAGRAPH_SEPARATOR: &[u8] = b"\n\n";

/// Paragraphs whose trimmed text is this many characters or fewer are not analyzed
pub const MIN_ANALYZABLE_CHARS: usize = 20;

/// A paragraph captured from the buffer at one point in time
///
/// `text == document[start..end]` held when the span was captured; it goes
/// stale as soon as the buffer changes at or before `end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Span {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Find the paragraph around `cursor`, if it is long enough to be worth analyzing.
///
/// The paragraph starts right after the last blank-line separator that begins
/// before the cursor (or at 0) and ends right before the first separator that
/// begins at or after the cursor (or at the end of the text). Offsets are
/// untrimmed; trimming only feeds the length check.
pub fn locate(text: &str, cursor: usize) -> Option<Span> {
    let bytes = text.as_bytes();
    let cursor = cursor.min(bytes.len());

    // A separator starting at index <= cursor - 1 ends at or before cursor + 1
    let backward_limit = (cursor + 1).min(bytes.len());
    let start = if cursor == 0 {
        // Only a separator at the very start of the buffer qualifies
        if bytes.starts_with(PARAGRAPH_SEPARATOR) { 2 } else { 0 }
    } else {
        rfind_separator(&bytes[..backward_limit])
            .map(|at| at + PARAGRAPH_SEPARATOR.len())
            .unwrap_or(0)
    };

    let end = find_separator(&bytes[cursor..])
        .map(|at| cursor + at)
        .unwrap_or(bytes.len());

    // A cursor between the newlines of a run of three or more line breaks
    if start > end {
        return None;
    }

    let paragraph = &text[start..end];
    if paragraph.trim().chars().count() > MIN_ANALYZABLE_CHARS {
        Some(Span {
            start,
            end,
            text: paragraph.to_string(),
        })
    } else {
        None
    }
}

fn rfind_separator(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(PARAGRAPH_SEPARATOR.len())
        .rposition(|window| window == PARAGRAPH_SEPARATOR)
}

fn find_separator(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(PARAGRAPH_SEPARATOR.len())
        .position(|window| window == PARAGRAPH_SEPARATOR)
}
