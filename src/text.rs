//! Small string helpers shared by seeding and user normalization.

/// Slug used when the input holds no alphanumeric character at all.
pub const FALLBACK_SLUG: &str = "n-a";

/// Builds a URL-friendly slug: lowercase alphanumerics separated by single dashes.
///
/// Non-ASCII letters are kept (lowercased) so distinct names keep distinct slugs.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        return FALLBACK_SLUG.to_string();
    }
    slug
}

/// Uppercases the first character and leaves the rest untouched.
pub fn capitalize_first(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
