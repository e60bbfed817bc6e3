//! Deterministic placeholder avatars.

use rand::seq::SliceRandom;
use sha2::{Digest, Sha256};

use super::prompt::seeded_rng;

/// Avatar styles served by the placeholder endpoint.
pub const PLACEHOLDER_STYLES: &[&str] = &[
    "avataaars",
    "personas",
    "notionists",
    "lorelei",
    "micah",
    "open-peeps",
];

pub const DEFAULT_PLACEHOLDER_BASE: &str = "https://api.dicebear.com/7.x";

/// Placeholder avatar URL for a persona. Same id, same URL.
pub fn placeholder_avatar(base_url: &str, persona_id: &str) -> String {
    let digest = hex::encode(Sha256::digest(persona_id.as_bytes()));
    let style = PLACEHOLDER_STYLES
        .choose(&mut seeded_rng(persona_id))
        .copied()
        .unwrap_or(PLACEHOLDER_STYLES[0]);

    format!(
        "{}/{}/svg?seed={}",
        base_url.trim_end_matches('/'),
        style,
        &digest[..16]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_deterministic() {
        let a = placeholder_avatar(DEFAULT_PLACEHOLDER_BASE, "persona-1");
        assert_eq!(a, placeholder_avatar(DEFAULT_PLACEHOLDER_BASE, "persona-1"));
        assert_ne!(a, placeholder_avatar(DEFAULT_PLACEHOLDER_BASE, "persona-2"));
    }

    #[test]
    fn test_placeholder_shape() {
        let url = placeholder_avatar("https://avatars.test/", "abc");
        assert!(url.starts_with("https://avatars.test/"));
        assert!(!url.contains(".test//"));

        let (path, seed) = url.split_once("/svg?seed=").unwrap();
        assert_eq!(seed.len(), 16);
        assert!(seed.chars().all(|c| c.is_ascii_hexdigit()));
        let style = path.rsplit('/').next().unwrap();
        assert!(PLACEHOLDER_STYLES.contains(&style));
    }
}
