//! Best-effort message scraping for error text we could not decode structurally.

const MESSAGE_MARKER: &str = "'message': '";
const TYPE_MARKER: &str = "', 'type':";
const H1_OPEN: &str = "<h1>";
const H1_CLOSE: &str = "</h1>";

/// Extract a clean error message from an error string.
///
/// Two shapes are recognised, in this order:
/// - a Python-repr style JSON fragment `'message': '...', 'type': ...`
/// - an HTML error page with an `<h1>...</h1>` heading
///
/// Anything else comes back unmodified.
///
/// ```rust
/// use agent_cli::classifier::extract_error_message;
///
/// let raw = "Error code: 401 - {'error': {'message': 'bad key', 'type': 'x'}}";
/// assert_eq!(extract_error_message(raw), "bad key");
/// assert_eq!(extract_error_message("<h1>Not Found</h1>"), "Not Found");
/// assert_eq!(extract_error_message("plain"), "plain");
/// ```
pub fn extract_error_message(error_str: &str) -> String {
    let mut text = error_str;
    let mut matched = false;

    if let Some(start) = text.find(MESSAGE_MARKER) {
        text = between(&text[start + MESSAGE_MARKER.len()..], TYPE_MARKER);
        matched = true;
    }

    if let Some(start) = text.find(H1_OPEN) {
        text = between(&text[start + H1_OPEN.len()..], H1_CLOSE);
        matched = true;
    }

    if matched {
        text.trim().to_string()
    } else {
        text.to_string()
    }
}

fn between<'a>(rest: &'a str, end_marker: &str) -> &'a str {
    match rest.find(end_marker) {
        Some(end) => &rest[..end],
        None => rest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_json_like_message() {
        let raw = "Error code: 401 - {'error': {'message': 'bad key', 'type': 'x', 'code': 'invalid_api_key'}}";
        assert_eq!(extract_error_message(raw), "bad key");
    }

    #[test]
    fn extracts_html_heading() {
        let raw = "<html><body><h1>Not Found</h1><p>nothing here</p></body></html>";
        assert_eq!(extract_error_message(raw), "Not Found");
    }

    #[test]
    fn message_without_type_marker_runs_to_end() {
        assert_eq!(extract_error_message("{'message': 'truncated"), "truncated");
    }

    #[test]
    fn heading_inside_extracted_message() {
        let raw = "{'message': '<h1> Bad Gateway </h1>', 'type': 'server'}";
        assert_eq!(extract_error_message(raw), "Bad Gateway");
    }

    #[test]
    fn unmatched_text_is_returned_untouched() {
        assert_eq!(extract_error_message("  spaced out  "), "  spaced out  ");
        assert_eq!(extract_error_message(""), "");
    }
}
