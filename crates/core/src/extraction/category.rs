pub const DEFAULT_CATEGORY: &str = "general";

// Checked in order; the first category with a keyword hit wins.
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("footwear", &["shoe", "sneaker", "boot", "sandal", "trainer", "slipper", "loafer"]),
    (
        "electronics",
        &[
            "laptop",
            "phone",
            "headphone",
            "earbud",
            "camera",
            "tablet",
            "charger",
            "speaker",
            "monitor",
            "keyboard",
            "mouse",
        ],
    ),
    (
        "clothing",
        &["shirt", "jacket", "dress", "pants", "jeans", "hoodie", "sweater", "coat", "sock"],
    ),
    ("home", &["sofa", "chair", "table", "lamp", "bed", "kitchen", "mug", "pillow", "blanket"]),
    ("sports", &["ball", "racket", "yoga", "fitness", "bike", "dumbbell", "tent", "helmet"]),
    ("beauty", &["cream", "shampoo", "lotion", "perfume", "lipstick", "serum", "soap"]),
    ("books", &["book", "novel", "paperback", "hardcover", "edition"]),
    ("accessories", &["wallet", "watch", "belt", "bag", "backpack", "sunglasses"]),
];

/// Infers a category from free text by keyword lookup, falling back to
/// [`DEFAULT_CATEGORY`].
pub fn infer_category(text: &str) -> &'static str {
    let lowered = text.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|(category, _)| *category)
        .unwrap_or(DEFAULT_CATEGORY)
}
