pub const MAX_TAGS: usize = 8;
const MIN_TAG_CHARS: usize = 3;

const STOP_WORDS: &[&str] = &[
    "and", "are", "but", "can", "for", "from", "has", "have", "into", "its", "not", "now", "our",
    "per", "that", "the", "their", "this", "was", "were", "will", "with", "you", "your", "all",
    "any", "each", "made", "more", "new", "one", "only", "out", "over", "very", "general",
];

/// Tags for a product: the candidate's own tags first, then tokens from the
/// description and category. Lowercased, deduplicated, capped at [`MAX_TAGS`].
pub fn derive_tags(existing: &[String], description: &str, category: &str) -> Vec<String> {
    let derived = format!("{description} {category}");
    let tokens = derived
        .split(|ch: char| !ch.is_alphanumeric() && ch != '-')
        .map(|token| token.trim_matches('-'))
        .filter(|token| is_tag_token(token));

    let mut tags: Vec<String> = Vec::with_capacity(MAX_TAGS);
    for tag in existing
        .iter()
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .chain(tokens.map(str::to_lowercase))
    {
        if tags.len() == MAX_TAGS {
            break;
        }
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

fn is_tag_token(token: &str) -> bool {
    token.chars().count() >= MIN_TAG_CHARS
        && !token.chars().all(|ch| ch.is_ascii_digit())
        && !STOP_WORDS.contains(&token.to_lowercase().as_str())
}
