//! Grapheme-aware helpers for fixed-width text layout.
//!
//! Column widths are measured in grapheme clusters so that names with
//! combining marks or emoji line up the same as plain ASCII.

use unicode_segmentation::UnicodeSegmentation;

/// Ellipsis appended to truncated cells.
pub const ELLIPSIS: &str = "...";

/// Counts the number of grapheme clusters in a string.
///
/// # Examples
///
/// ```
/// use contrib_qa::render::unicode::grapheme_count;
///
/// assert_eq!(grapheme_count("Hello"), 5);
/// assert_eq!(grapheme_count("Zoë"), 3);
/// ```
#[must_use]
pub fn grapheme_count(s: &str) -> usize {
    s.graphemes(true).count()
}

/// Truncates a string at a grapheme cluster boundary.
///
/// Returns a slice containing at most `max_graphemes` grapheme clusters.
#[must_use]
pub fn truncate_graphemes(s: &str, max_graphemes: usize) -> &str {
    let mut end_byte = 0;

    for (count, grapheme) in s.graphemes(true).enumerate() {
        if count >= max_graphemes {
            break;
        }
        end_byte += grapheme.len();
    }

    &s[..end_byte]
}

/// Shortens `s` to at most `max_graphemes` clusters, marking the cut with
/// [`ELLIPSIS`].
///
/// When `max_graphemes` leaves no room for the ellipsis the text is cut
/// without one.
#[must_use]
pub fn ellipsize(s: &str, max_graphemes: usize) -> String {
    if grapheme_count(s) <= max_graphemes {
        return s.to_string();
    }

    let marker = grapheme_count(ELLIPSIS);
    if max_graphemes <= marker {
        return truncate_graphemes(s, max_graphemes).to_string();
    }

    format!("{}{ELLIPSIS}", truncate_graphemes(s, max_graphemes - marker))
}

/// Pads `s` with spaces to `width` grapheme clusters.
///
/// Right alignment is used for numeric columns.
#[must_use]
pub fn pad(s: &str, width: usize, right_align: bool) -> String {
    let fill = " ".repeat(width.saturating_sub(grapheme_count(s)));
    if right_align {
        format!("{fill}{s}")
    } else {
        format!("{s}{fill}")
    }
}
