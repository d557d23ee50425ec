//! URL slugs derived from titles.

/// Slug used when a title has no usable character.
const FALLBACK: &str = "untitled";

/// Turn a title into a lowercase, dash separated slug.
///
/// Punctuation acts as a word separator so that `"L'API REST"` gives
/// `"l-api-rest"`. Non-ASCII letters are kept as they are.
pub fn slugify(title: &str) -> String {
    let slug = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join("-");

    if slug.is_empty() {
        FALLBACK.to_string()
    } else {
        slug
    }
}

/// Derive a slug from `title` that `is_taken` does not reject, appending
/// `-2`, `-3`... to the base slug until one is free.
pub fn unique_slug<E>(
    title: &str,
    mut is_taken: impl FnMut(&str) -> Result<bool, E>,
) -> Result<String, E> {
    let base = slugify(title);
    if !is_taken(&base)? {
        return Ok(base);
    }

    let mut n = 2;
    loop {
        let candidate = format!("{base}-{n}");
        if !is_taken(&candidate)? {
            return Ok(candidate);
        }
        n += 1;
    }
}
