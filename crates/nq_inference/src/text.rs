/// Prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn is_sentence_end(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '。' | '\n')
}

/// Sentences of `text`, terminators kept, surrounding whitespace trimmed.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for (idx, c) in text.char_indices() {
        if is_sentence_end(c) {
            let end = idx + c.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Cut `text` to `max_chars`, preferring the last sentence end inside the
/// budget and falling back to the last word boundary.
pub fn bound_length(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let prefix = truncate_chars(text, max_chars);
    if let Some(idx) = prefix.rfind(|c: char| is_sentence_end(c) && c != '\n') {
        let cut = prefix[..=idx].trim_end();
        if !cut.is_empty() {
            return cut.to_string();
        }
    }
    match prefix.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => format!("{}…", prefix[..idx].trim_end()),
        _ => format!("{}…", prefix),
    }
}
