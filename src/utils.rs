/// Remove Markdown code-fence markers (```json and ```) from a model response.
pub fn strip_code_fences(response: &str) -> String {
    response
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Extract the JSON object candidate from free text.
///
/// Takes everything from the first `{` to the last `}`, so leading and
/// trailing commentary is ignored. Returns None if no such span exists.
pub fn extract_json_str(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start < end {
        Some(text[start..=end].trim())
    } else {
        None
    }
}

/// First `max_chars` characters of `text`, with an ellipsis if anything was cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
