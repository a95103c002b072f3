use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WordError {
    #[error("expected \"word - translation\"")]
    MissingSeparator,

    #[error("english word cannot be empty")]
    EmptyEnglish,

    #[error("translation cannot be empty")]
    EmptyRussian,

    #[error("unknown word scope: {0}")]
    UnknownScope(String),
}

//
// ─── SCOPE ─────────────────────────────────────────────────────────────────────
//

/// Which list a word pair belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WordScope {
    /// Shared, admin-curated list.
    Default,
    /// Personal list owned by one user.
    User,
}

impl WordScope {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WordScope::Default => "default",
            WordScope::User => "user",
        }
    }

    /// # Errors
    ///
    /// Returns `WordError::UnknownScope` for anything but `default` or `user`.
    pub fn parse(s: &str) -> Result<Self, WordError> {
        match s {
            "default" => Ok(WordScope::Default),
            "user" => Ok(WordScope::User),
            other => Err(WordError::UnknownScope(other.to_owned())),
        }
    }
}

//
// ─── WORD PAIR ─────────────────────────────────────────────────────────────────
//

/// Lowercased, trimmed form used for every stored and looked-up key.
#[must_use]
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// An (english, russian) translation association.
///
/// Both sides are normalized on construction, so equality is case-insensitive
/// with respect to the raw input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WordPair {
    english: String,
    russian: String,
}

impl WordPair {
    /// Build a pair from raw strings.
    ///
    /// # Errors
    ///
    /// Returns `WordError::EmptyEnglish` / `WordError::EmptyRussian` when a side
    /// is blank after trimming.
    pub fn new(english: impl AsRef<str>, russian: impl AsRef<str>) -> Result<Self, WordError> {
        let english = normalize_key(english.as_ref());
        let russian = normalize_key(russian.as_ref());
        if english.is_empty() {
            return Err(WordError::EmptyEnglish);
        }
        if russian.is_empty() {
            return Err(WordError::EmptyRussian);
        }
        Ok(Self { english, russian })
    }

    /// Parse user input of the form `word - translation`.
    ///
    /// A spaced ` - ` is preferred as the separator so hyphenated words such as
    /// `well-known - известный` survive; otherwise the first `-` splits.
    ///
    /// # Errors
    ///
    /// Returns `WordError::MissingSeparator` when there is no dash, or an
    /// emptiness error when either side is blank.
    pub fn parse_input(text: &str) -> Result<Self, WordError> {
        let (english, russian) = text
            .split_once(" - ")
            .or_else(|| text.split_once('-'))
            .ok_or(WordError::MissingSeparator)?;
        Self::new(english, russian)
    }

    #[must_use]
    pub fn english(&self) -> &str {
        &self.english
    }

    #[must_use]
    pub fn russian(&self) -> &str {
        &self.russian
    }

    /// Split the russian side on commas into individual alternatives.
    ///
    /// Dictionary entries may carry several synonyms (`хороший, добрый`).
    pub fn russian_alternatives(&self) -> impl Iterator<Item = &str> {
        self.russian
            .split(',')
            .map(str::trim)
            .filter(|alt| !alt.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_normalizes_both_sides() {
        let pair = WordPair::new("  Apple ", "ЯБЛОКО").unwrap();
        assert_eq!(pair.english(), "apple");
        assert_eq!(pair.russian(), "яблоко");
    }

    #[test]
    fn parse_input_splits_on_dash() {
        let pair = WordPair::parse_input("apple - яблоко").unwrap();
        assert_eq!(pair, WordPair::new("apple", "яблоко").unwrap());

        let tight = WordPair::parse_input("cat-кошка").unwrap();
        assert_eq!(tight.english(), "cat");
        assert_eq!(tight.russian(), "кошка");
    }

    #[test]
    fn parse_input_keeps_hyphenated_words() {
        let pair = WordPair::parse_input("well-known - известный").unwrap();
        assert_eq!(pair.english(), "well-known");
    }

    #[test]
    fn parse_input_rejects_malformed_text() {
        assert_eq!(
            WordPair::parse_input("apple"),
            Err(WordError::MissingSeparator)
        );
        assert_eq!(WordPair::parse_input(" - яблоко"), Err(WordError::EmptyEnglish));
        assert_eq!(WordPair::parse_input("apple - "), Err(WordError::EmptyRussian));
    }

    #[test]
    fn alternatives_split_on_commas() {
        let pair = WordPair::new("good", "хороший, добрый,,").unwrap();
        let alts: Vec<_> = pair.russian_alternatives().collect();
        assert_eq!(alts, vec!["хороший", "добрый"]);
    }

    #[test]
    fn scope_round_trips_through_str() {
        for scope in [WordScope::Default, WordScope::User] {
            assert_eq!(WordScope::parse(scope.as_str()).unwrap(), scope);
        }
        assert!(WordScope::parse("xml").is_err());
    }
}
