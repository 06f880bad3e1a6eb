// src/image.rs
use once_cell::sync::OnceCell;
use regex::Regex;

/// First `<img src=...>` in an HTML fragment, if any.
/// Best-effort enrichment; a miss is normal and never blocks a post.
pub fn first_image_src(html: &str) -> Option<String> {
    static RE_IMG: OnceCell<Regex> = OnceCell::new();
    let re = RE_IMG.get_or_init(|| Regex::new(r#"(?is)<img[^>]+src=["']([^"']+)["']"#).unwrap());
    re.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
