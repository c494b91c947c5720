//! Local keyword search over uploaded document text, used when no model can
//! answer a question.

use serde::Serialize;

pub const MAX_SNIPPETS: usize = 5;
pub const MAX_KEYWORDS: usize = 6;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "match", rename_all = "snake_case")]
pub enum SnippetMatch {
    /// Sentences containing the whole query.
    Exact { total: usize, snippets: Vec<String> },
    /// Sentences containing any of the query's keywords.
    Keywords { keywords: Vec<String>, snippets: Vec<String> },
}

impl SnippetMatch {
    pub fn snippets(&self) -> &[String] {
        match self {
            Self::Exact { snippets, .. } | Self::Keywords { snippets, .. } => snippets,
        }
    }

    pub fn summary(&self) -> String {
        match self {
            Self::Exact { total, snippets } => format!(
                "Found {total} matching snippet(s) from the uploaded document:\n\n{}",
                snippets.join("\n\n")
            ),
            Self::Keywords { keywords, snippets } => format!(
                "Showing relevant snippets from the uploaded document based on keywords ({}):\n\n{}",
                keywords.join(", "),
                snippets.join("\n\n")
            ),
        }
    }
}

/// Splits after `.`, `?` or `!` when followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((index, ch)) = chars.next() {
        if !matches!(ch, '.' | '?' | '!') {
            continue;
        }
        let Some(&(next_index, next)) = chars.peek() else {
            continue;
        };
        if !next.is_whitespace() {
            continue;
        }

        let end = index + ch.len_utf8();
        push_sentence(&mut sentences, &text[start..end]);

        let mut resume = next_index;
        while let Some(&(ws_index, ws)) = chars.peek() {
            if !ws.is_whitespace() {
                break;
            }
            resume = ws_index + ws.len_utf8();
            chars.next();
        }
        start = resume;
    }
    push_sentence(&mut sentences, &text[start..]);

    sentences
}

fn push_sentence<'a>(sentences: &mut Vec<&'a str>, sentence: &'a str) {
    let sentence = sentence.trim();
    if !sentence.is_empty() {
        sentences.push(sentence);
    }
}

/// Distinct lowercase word tokens of `query`, at most [`MAX_KEYWORDS`].
pub fn keywords(query: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for token in query.to_lowercase().split(|ch: char| !ch.is_alphanumeric() && ch != '_') {
        if token.is_empty() || keywords.iter().any(|seen| seen == token) {
            continue;
        }
        keywords.push(token.to_string());
        if keywords.len() == MAX_KEYWORDS {
            break;
        }
    }
    keywords
}

/// Whole-query hits first; keyword hits otherwise. `None` when nothing
/// in the document mentions the query.
pub fn find_snippets(document: &str, query: &str) -> Option<SnippetMatch> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }

    let sentences = split_sentences(document);
    let lowered: Vec<String> = sentences.iter().map(|sentence| sentence.to_lowercase()).collect();

    let exact: Vec<String> = sentences
        .iter()
        .zip(&lowered)
        .filter(|(_, lower)| lower.contains(&query))
        .map(|(sentence, _)| sentence.to_string())
        .collect();
    if !exact.is_empty() {
        let total = exact.len();
        return Some(SnippetMatch::Exact {
            total,
            snippets: exact.into_iter().take(MAX_SNIPPETS).collect(),
        });
    }

    let keywords = keywords(&query);
    let snippets: Vec<String> = sentences
        .iter()
        .zip(&lowered)
        .filter(|(_, lower)| keywords.iter().any(|keyword| lower.contains(keyword.as_str())))
        .map(|(sentence, _)| sentence.to_string())
        .take(MAX_SNIPPETS)
        .collect();

    (!snippets.is_empty()).then_some(SnippetMatch::Keywords { keywords, snippets })
}
