use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Fold text into comparable form: lowercase, NFKD with combining marks
/// removed, and only alphanumerics and whitespace kept.
///
/// Lowercasing runs again after decomposition because compatibility
/// mappings can yield capitals (`ℌ` -> `H`); this keeps the function
/// idempotent.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(|c| !is_combining_mark(*c) && (c.is_alphanumeric() || c.is_whitespace()))
        .collect()
}

/// Normalize, then split on whitespace.
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text).split_whitespace().map(str::to_string).collect()
}
