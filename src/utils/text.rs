//! Plain-text extraction from remote HTML fragments
//!
//! Review and description bodies arrive as HTML. The embedding input wants
//! single-spaced plain text, so tags are dropped and whitespace collapsed.

/// Strip HTML tags and collapse all whitespace runs to single spaces.
///
/// `<br>` and `</p>` become word breaks rather than being deleted outright,
/// so adjacent paragraphs do not fuse into one token.
pub fn strip_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '<' {
            out.push(c);
            continue;
        }
        let mut tag = String::new();
        for t in chars.by_ref() {
            if t == '>' {
                break;
            }
            tag.push(t);
        }
        let tag = tag.trim().to_ascii_lowercase();
        if tag.starts_with("br") || tag == "/p" {
            out.push(' ');
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trim and cap text at `max` characters, appending `...` when truncated.
pub fn truncate(value: &str, max: usize) -> String {
    let trimmed = value.trim();
    if trimmed.chars().count() <= max {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(max).collect();
    out.push_str("...");
    out
}
