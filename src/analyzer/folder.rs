//! Folder naming for analyzed jobs.

/// Sanitizes anchor text into a folder name.
///
/// Line breaks become spaces, then everything except ASCII letters, digits,
/// space and hyphen is dropped and trailing whitespace trimmed. The result
/// may be empty; callers fall back to [`single_fallback_name`].
#[must_use]
pub fn sanitize_folder_name(anchor_text: &str) -> String {
    let cleaned: String = anchor_text
        .trim()
        .replace(['\r', '\n'], " ")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ' || *c == '-')
        .collect();
    cleaned.trim_end().to_string()
}

/// Fallback folder name for a SINGLE job whose anchor text sanitizes to nothing.
#[must_use]
pub fn single_fallback_name(document_name: &str, message_index: usize) -> String {
    format!("Single_Download_{document_name}_{}", message_index + 1)
}

/// Folder name for a MULTI job.
#[must_use]
pub fn multi_folder_name(document_name: &str, message_index: usize) -> String {
    format!("Message_Group_{document_name}_{}", message_index + 1)
}

/// Folder name for a SINGLE job from its anchor text.
#[must_use]
pub fn single_folder_name(anchor_text: Option<&str>, document_name: &str, message_index: usize) -> String {
    let sanitized = anchor_text.map(sanitize_folder_name).unwrap_or_default();
    if sanitized.is_empty() {
        single_fallback_name(document_name, message_index)
    } else {
        sanitized
    }
}
