//! Title normalization and free-text title search
//!
//! Normalization is used only for *comparison*: the metadata source is always
//! queried with the title as the user (or the image extractor) wrote it.

/// Replace typographic quotes with their ASCII counterparts
///
/// Phone keyboards and OCR output produce `’` and `“`; the catalog uses `'` and `"`.
pub fn fold_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            other => other,
        })
        .collect()
}

/// Comparison form of a title
///
/// Lower-cases, strips punctuation, collapses runs of spaces and trims.
pub fn normalize_title(title: &str) -> String {
    let stripped: String = fold_quotes(&title.to_lowercase())
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// How a search phrase is matched against titles
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchMode {
    /// Phrase was quote-delimited: case-insensitive substring match
    ExactPhrase(String),
    /// Every whitespace-separated term must appear in the title
    AllTerms(Vec<String>),
}

impl SearchMode {
    /// Interpret a raw search phrase
    ///
    /// A phrase containing exactly two `"` characters is an exact phrase
    /// search; anything else is split into terms.
    pub fn parse(phrase: &str) -> Self {
        let phrase = fold_quotes(phrase);
        if phrase.matches('"').count() == 2 {
            SearchMode::ExactPhrase(phrase.trim_matches('"').to_lowercase())
        } else {
            SearchMode::AllTerms(
                phrase
                    .split_whitespace()
                    .map(|term| term.to_lowercase())
                    .collect(),
            )
        }
    }

    pub fn matches(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        match self {
            SearchMode::ExactPhrase(needle) => title.contains(needle.as_str()),
            SearchMode::AllTerms(terms) => terms.iter().all(|term| title.contains(term.as_str())),
        }
    }
}

/// Titles matching a free-text search phrase, in catalog order
pub fn find_titles<S: AsRef<str>>(phrase: &str, titles: &[S]) -> Vec<String> {
    let mode = SearchMode::parse(phrase);
    let found: Vec<String> = titles
        .iter()
        .map(AsRef::as_ref)
        .filter(|title| mode.matches(title))
        .map(str::to_string)
        .collect();

    tracing::debug!(phrase = %phrase, mode = ?mode, found = found.len(), "Title search");
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_title_strips_punctuation_and_spaces() {
        assert_eq!(normalize_title("  The  Matrix! "), "the matrix");
        assert_eq!(normalize_title("Ocean's Eleven"), "oceans eleven");
        assert_eq!(normalize_title("Ocean\u{2019}s Eleven"), "oceans eleven");
        assert_eq!(normalize_title("Mission: Impossible - Fallout"), "mission impossible fallout");
    }

    #[test]
    fn test_fold_quotes() {
        assert_eq!(fold_quotes("\u{201C}Matrix\u{201D}"), "\"Matrix\"");
        assert_eq!(fold_quotes("It\u{2018}s"), "It's");
    }

    #[test]
    fn test_search_mode_parse() {
        assert_eq!(
            SearchMode::parse("\"Matrix\""),
            SearchMode::ExactPhrase("matrix".to_string())
        );
        assert_eq!(
            SearchMode::parse("matrix reloaded"),
            SearchMode::AllTerms(vec!["matrix".to_string(), "reloaded".to_string()])
        );
        // A single stray quote is not a phrase search
        assert!(matches!(SearchMode::parse("\"matrix"), SearchMode::AllTerms(_)));
    }

    #[test]
    fn test_find_titles_phrase_and_terms() {
        let titles = ["The Matrix", "The Matrix Reloaded", "Speed"];

        assert_eq!(
            find_titles("\"Matrix\"", &titles),
            vec!["The Matrix", "The Matrix Reloaded"]
        );
        assert_eq!(find_titles("matrix reloaded", &titles), vec!["The Matrix Reloaded"]);
        assert_eq!(find_titles("reloaded matrix", &titles), vec!["The Matrix Reloaded"]);
        assert!(find_titles("\"matrix reloaded speed\"", &titles).is_empty());
    }

    #[test]
    fn test_find_titles_phrase_keeps_word_order() {
        let titles = ["The Matrix Reloaded"];
        assert!(find_titles("\"reloaded matrix\"", &titles).is_empty());
        assert_eq!(find_titles("\u{201C}matrix rel\u{201D}", &titles), vec!["The Matrix Reloaded"]);
    }
}
