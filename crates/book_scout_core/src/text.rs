//! crates/book_scout_core/src/text.rs
//!
//! Word-boundary matching helpers shared by the intent gate and the query
//! extractor. All matching is done on lowercased text.

/// Returns true when `phrase` occurs in `text` delimited by non-alphanumeric
/// characters (or the string edges) on both sides.
pub(crate) fn contains_word(text: &str, phrase: &str) -> bool {
    find_word(text, phrase).is_some()
}

/// Removes every word-bounded occurrence of `phrase` from `text`,
/// replacing it with a single space.
pub(crate) fn remove_word(text: &str, phrase: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < text.len() {
        if let Some(end) = word_match_at(text, i, phrase) {
            out.push(' ');
            i = end;
            continue;
        }
        let ch = text[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

/// Collapses runs of whitespace into single spaces and trims the edges.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn find_word(text: &str, phrase: &str) -> Option<usize> {
    let mut i = 0;
    while i < text.len() {
        if word_match_at(text, i, phrase).is_some() {
            return Some(i);
        }
        i += text[i..].chars().next().unwrap().len_utf8();
    }
    None
}

/// If `phrase` occurs at byte offset `i` with word boundaries on both
/// sides, returns the byte offset just past the match.
fn word_match_at(text: &str, i: usize, phrase: &str) -> Option<usize> {
    if phrase.is_empty() || !text[i..].starts_with(phrase) {
        return None;
    }
    let before_ok = i == 0
        || !text[..i]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric());
    let end = i + phrase.len();
    let after_ok = end >= text.len()
        || !text[end..]
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric());
    (before_ok && after_ok).then_some(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_word_respects_boundaries() {
        assert!(contains_word("libros con dragones", "con"));
        // "con" inside another word is not a match
        assert!(!contains_word("recomendar libros", "con"));
        assert!(contains_word("quiero leer algo", "quiero leer"));
    }

    #[test]
    fn remove_word_strips_all_occurrences() {
        let out = remove_word("quiero un libro de fantasía", "libro");
        assert_eq!(collapse_whitespace(&out), "quiero un de fantasía");
    }

    #[test]
    fn remove_word_handles_accented_text() {
        let out = remove_word("recomiéndame misterio", "recomiéndame");
        assert_eq!(collapse_whitespace(&out), "misterio");
    }

    #[test]
    fn remove_word_keeps_partial_matches() {
        let out = remove_word("librosextra libros", "libros");
        assert_eq!(collapse_whitespace(&out), "librosextra");
    }
}
