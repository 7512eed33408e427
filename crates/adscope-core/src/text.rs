//! Text helpers shared by the oracle clients and the pipeline.

/// Cleans a field before it is interpolated into an oracle prompt.
///
/// Drops control characters other than newline and tab, trims, and truncates
/// to `max_chars` characters with a trailing `...`. Empty input renders as
/// `N/A` so the prompt never contains a blank slot.
#[must_use]
pub fn sanitize_for_prompt(text: &str, max_chars: usize) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        return "N/A".to_string();
    }

    if cleaned.chars().count() > max_chars {
        let mut truncated: String = cleaned.chars().take(max_chars).collect();
        truncated.push_str("...");
        truncated
    } else {
        cleaned.to_string()
    }
}

/// Returns the slice from the first `{` to the last `}` inclusive.
///
/// `None` when there is no `{`, no `}`, or the last `}` precedes the first `{`.
#[must_use]
pub fn locate_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// First `max_chars` characters of `text`, with `...` appended when cut.
#[must_use]
pub fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_empty_is_na() {
        assert_eq!(sanitize_for_prompt("", 10), "N/A");
        assert_eq!(sanitize_for_prompt("   \u{0}  ", 10), "N/A");
    }

    #[test]
    fn sanitize_strips_control_chars_but_keeps_newlines() {
        assert_eq!(sanitize_for_prompt("a\u{7}b\nc", 50), "ab\nc");
    }

    #[test]
    fn sanitize_truncates_on_char_boundary() {
        assert_eq!(sanitize_for_prompt("héllo wörld", 5), "héllo...");
    }

    #[test]
    fn locate_json_object_spans_first_and_last_brace() {
        let text = "Here you go: {\"a\": {\"b\": 1}} hope it helps";
        assert_eq!(locate_json_object(text), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn locate_json_object_none_without_braces() {
        assert_eq!(locate_json_object("no json here"), None);
        assert_eq!(locate_json_object("} backwards {"), None);
        assert_eq!(locate_json_object("{ unterminated"), None);
    }

    #[test]
    fn preview_only_marks_truncated_text() {
        assert_eq!(preview("short", 100), "short");
        let long = "x".repeat(120);
        let p = preview(&long, 100);
        assert_eq!(p.chars().count(), 103);
        assert!(p.ends_with("..."));
    }
}
