//! core::naming
//!
//! Slug derivation rules for category names.
//!
//! # Features
//!
//! - Generate URL-safe slugs from display names
//! - Collapse separators, strip punctuation, bound length

/// Generate a slug from a category display name.
///
/// Converts a display name into a URL-safe slug:
/// - Lowercase
/// - Spaces and underscores become hyphens
/// - Remove other non-alphanumeric characters
/// - Truncate to a reasonable length
///
/// # Example
///
/// ```
/// use shelfwork::core::naming::slugify;
///
/// assert_eq!(slugify("Summer Sale"), "summer-sale");
/// assert_eq!(slugify("Tops & Tees"), "tops-tees");
/// ```
pub fn slugify(name: &str) -> String {
    let first_line = name.lines().next().unwrap_or("");

    first_line
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else if c == ' ' || c == '_' || c == '-' {
                '-'
            } else {
                // Skip invalid characters
                '\0'
            }
        })
        .filter(|&c| c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .take(60) // Matches the Slug length bound
        .collect::<String>()
        .trim_end_matches('-')
        .to_string()
}
