//! Image reference resolution
//!
//! Pure string manipulation; no registry is consulted. The repository is
//! everything before the first `:` of the base image.

/// Tag assumed when the image reference carries none
pub const DEFAULT_TAG: &str = "latest";

/// Effective image reference: `base` unchanged without an override,
/// otherwise `repo:tag_override`
pub fn resolve_image(base: &str, tag_override: &str) -> String {
    if tag_override.is_empty() {
        return base.to_string();
    }
    let repo = base.split_once(':').map_or(base, |(repo, _)| repo);
    format!("{}:{}", repo, tag_override)
}

/// Effective tag: the override, else the tag in `base`, else `latest`
pub fn resolve_tag(base: &str, tag_override: &str) -> String {
    if !tag_override.is_empty() {
        return tag_override.to_string();
    }
    match base.split_once(':') {
        Some((_, tag)) if !tag.is_empty() => tag.to_string(),
        _ => DEFAULT_TAG.to_string(),
    }
}
