//! Prompt construction for the reviewer.

/// Placeholder sent in place of a variant with no text.
pub const EMPTY_VARIANT: &str = "Empty";

/// Encode one variant for embedding in the prompt.
///
/// Non-empty text becomes a JSON string literal, so quotes, backslashes and
/// control characters are escaped and cannot break the prompt structure.
/// Empty text becomes the bare [`EMPTY_VARIANT`] sentinel.
pub fn encode_variant(text: &str) -> String {
    if text.is_empty() {
        return EMPTY_VARIANT.to_string();
    }
    // Serializing a &str to JSON cannot fail.
    serde_json::to_string(text).unwrap_or_else(|_| EMPTY_VARIANT.to_string())
}

/// Inverse of [`encode_variant`]. Returns `None` for malformed input.
pub fn decode_variant(encoded: &str) -> Option<String> {
    if encoded == EMPTY_VARIANT {
        return Some(String::new());
    }
    serde_json::from_str(encoded).ok()
}

/// Fill a prompt template with the variants of one page.
///
/// `{count}` becomes the number of variants and `{versions}` one
/// `Version N: <encoded>` line per variant, numbered from 1.
pub fn build_prompt(template: &str, variants: &[String]) -> String {
    let versions = variants
        .iter()
        .enumerate()
        .map(|(i, text)| format!("Version {}: {}", i + 1, encode_variant(text)))
        .collect::<Vec<_>>()
        .join("\n");

    template
        .replace("{count}", &variants.len().to_string())
        .replace("{versions}", &versions)
}
