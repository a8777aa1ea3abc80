//! Sentence-aligned chunking of text units.
//!
//! Translation backends cap the size of a single request, so every text unit
//! is cut into chunks made of whole sentences. A chunk never exceeds the
//! character budget unless it holds a single sentence that is longer than the
//! budget on its own; such a sentence is kept intact.

/// Terminators that only end a sentence when followed by whitespace.
const LATIN_TERMINATORS: &[char] = &['.', '!', '?', '…'];

/// Full-width terminators end a sentence immediately.
const CJK_TERMINATORS: &[char] = &['。', '！', '？'];

/// Characters allowed between a terminator and the following whitespace.
const CLOSERS: &[char] = &['"', '\'', ')', ']', '”', '’', '»', '」', '』', '）'];

/// Tokens that end with a period without ending a sentence.
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "e.g", "i.e", "fig", "approx",
];

/// Split text into trimmed, non-empty sentences in their original order
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];

        if CJK_TERMINATORS.contains(&ch) {
            let end = skip_closers(&chars, i + 1);
            push_sentence(&chars[start..end], &mut sentences);
            start = end;
            i = end;
            continue;
        }

        if LATIN_TERMINATORS.contains(&ch) {
            // Runs like "?!" or "..." belong to the same boundary
            let mut end = i + 1;
            while end < chars.len() && LATIN_TERMINATORS.contains(&chars[end]) {
                end += 1;
            }
            end = skip_closers(&chars, end);

            if is_boundary(&chars, start, i, end) {
                push_sentence(&chars[start..end], &mut sentences);
                start = end;
            }
            i = end;
            continue;
        }

        i += 1;
    }

    if start < chars.len() {
        push_sentence(&chars[start..], &mut sentences);
    }

    sentences
}

/// Split `text` into chunks of whole sentences, each at most
/// `max_chunk_size` characters where possible.
///
/// Blank input comes back unchanged as a single chunk so callers can skip
/// translation without special-casing the result shape.
pub fn segment(text: &str, max_chunk_size: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_len = 0;

    for sentence in split_sentences(text) {
        let len = sentence.chars().count();
        // Separators are not counted against the budget
        if !current.is_empty() && current_len + len > max_chunk_size {
            chunks.push(current.join(" "));
            current.clear();
            current_len = 0;
        }
        current_len += len;
        current.push(sentence);
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}

fn skip_closers(chars: &[char], mut pos: usize) -> usize {
    while pos < chars.len() && CLOSERS.contains(&chars[pos]) {
        pos += 1;
    }
    pos
}

/// Decide whether the terminator at `term` (with trailing punctuation up to
/// `end`) closes the sentence that began at `start`.
fn is_boundary(chars: &[char], start: usize, term: usize, end: usize) -> bool {
    if end >= chars.len() {
        return true;
    }
    if !chars[end].is_whitespace() {
        // 3.14, example.com, "a.b"
        return false;
    }

    let next_word = chars[end..].iter().find(|c| !c.is_whitespace());
    match next_word {
        None => return true,
        Some(c) if c.is_lowercase() => return false,
        _ => {}
    }

    if chars[term] == '.' {
        let token_start = chars[start..term]
            .iter()
            .rposition(|c| c.is_whitespace())
            .map(|p| start + p + 1)
            .unwrap_or(start);
        let token: String = chars[token_start..term]
            .iter()
            .filter(|c| !matches!(c, '(' | '"' | '\'' | '“' | '‘'))
            .collect::<String>()
            .to_lowercase();

        if ABBREVIATIONS.contains(&token.as_str()) {
            return false;
        }
        // Initials such as "J. Smith"
        let mut token_chars = token.chars();
        if let (Some(c), None) = (token_chars.next(), token_chars.next()) {
            if c.is_alphabetic() && chars[term - 1].is_uppercase() {
                return false;
            }
        }
    }

    true
}

fn push_sentence(chars: &[char], sentences: &mut Vec<String>) {
    let sentence: String = chars.iter().collect();
    let trimmed = sentence.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}
