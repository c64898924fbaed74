//! Output filename derivation.

/// Extension appended to derived document names.
pub const DOCUMENT_EXTENSION: &str = "pdf";

/// Default name used when no title candidate is usable.
pub const DEFAULT_TITLE: &str = "document";

/// Replaces every character outside `[A-Za-z0-9]` with `_` and lowercases.
pub fn sanitize_title(title: &str) -> String {
    title
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Picks the first non-blank candidate and sanitizes it, falling back to
/// `default`. Returns the full filename, e.g. `my_paper.pdf`.
pub fn document_filename<S: AsRef<str>>(candidates: &[S], default: &str) -> String {
    let stem = candidates
        .iter()
        .map(|c| c.as_ref().trim())
        .find(|c| !c.is_empty())
        .map(sanitize_title)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| {
            let fallback = sanitize_title(default);
            if fallback.is_empty() {
                DEFAULT_TITLE.to_string()
            } else {
                fallback
            }
        });
    format!("{}.{}", stem, DOCUMENT_EXTENSION)
}
