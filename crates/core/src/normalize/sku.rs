const CATEGORY_PREFIX_LEN: usize = 3;
const HASH_HEX_LEN: usize = 10;

/// `<CAT>-<HASH>`: three alphanumerics of the category, uppercased and padded
/// with `X`, then the leading hex digits of the BLAKE3 hash of the
/// normalized title.
pub fn synthesize_sku(category: &str, normalized_title: &str) -> String {
    let mut prefix: String = category
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .take(CATEGORY_PREFIX_LEN)
        .map(|ch| ch.to_ascii_uppercase())
        .collect();
    while prefix.len() < CATEGORY_PREFIX_LEN {
        prefix.push('X');
    }

    let digest = blake3::hash(normalized_title.as_bytes()).to_hex();
    format!("{prefix}-{}", digest.as_str()[..HASH_HEX_LEN].to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::synthesize_sku;

    #[test]
    fn sku_is_deterministic_and_shaped() {
        let first = synthesize_sku("footwear", "running shoe");
        let second = synthesize_sku("footwear", "running shoe");

        assert_eq!(first, second);
        assert!(first.starts_with("FOO-"));
        assert_eq!(first.len(), 14);
        assert!(first[4..].chars().all(|ch| ch.is_ascii_hexdigit() && !ch.is_ascii_lowercase()));
    }

    #[test]
    fn short_categories_are_padded() {
        assert!(synthesize_sku("tv", "oled 55").starts_with("TVX-"));
        assert!(synthesize_sku("", "mystery").starts_with("XXX-"));
    }

    #[test]
    fn different_titles_get_different_hashes() {
        assert_ne!(synthesize_sku("home", "desk lamp"), synthesize_sku("home", "floor lamp"));
    }
}
