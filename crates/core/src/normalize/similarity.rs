/// Lowercases, trims and collapses internal whitespace.
pub fn normalize_title(title: &str) -> String {
    title.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// `1 - levenshtein / max_len`, measured in Unicode scalar values.
/// Two empty strings are identical.
pub fn similarity(left: &str, right: &str) -> f64 {
    let longest = left.chars().count().max(right.chars().count());
    if longest == 0 {
        return 1.0;
    }

    let distance = strsim::levenshtein(left, right);
    1.0 - distance as f64 / longest as f64
}

#[cfg(test)]
mod tests {
    use super::{normalize_title, similarity};

    #[test]
    fn titles_are_case_and_whitespace_insensitive() {
        assert_eq!(normalize_title("  Running   SHOE\t"), "running shoe");
    }

    #[test]
    fn similarity_counts_chars_not_bytes() {
        assert!((similarity("café", "cafe") - 0.75).abs() < f64::EPSILON);
        assert!((similarity("", "") - 1.0).abs() < f64::EPSILON);
        assert!(similarity("running shoe", "running shoes") > 0.9);
        assert!(similarity("desk lamp", "floor fan") < 0.5);
    }
}
