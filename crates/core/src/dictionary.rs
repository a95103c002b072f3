//! Static bidirectional english/russian lookup table.
//!
//! The table is built once from an XML document of the form
//!
//! ```xml
//! <dictionary>
//!   <entry><en>apple</en><ru>яблоко</ru></entry>
//! </dictionary>
//! ```
//!
//! and never changes afterwards.

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

use crate::model::{WordPair, normalize_key};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DictionaryError {
    #[error("malformed dictionary xml: {0}")]
    Xml(#[from] quick_xml::DeError),
}

#[derive(Debug, Deserialize)]
struct RawDictionary {
    #[serde(rename = "entry", default)]
    entries: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    en: Option<String>,
    ru: Option<String>,
}

/// Immutable two-way word table.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: Vec<WordPair>,
    english_to_russian: HashMap<String, String>,
    russian_to_english: HashMap<String, String>,
}

impl Dictionary {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the table from pairs. The first pair for a given key wins.
    #[must_use]
    pub fn from_entries(pairs: impl IntoIterator<Item = WordPair>) -> Self {
        let mut dict = Self::default();
        for pair in pairs {
            if dict.english_to_russian.contains_key(pair.english()) {
                continue;
            }
            dict.english_to_russian
                .insert(pair.english().to_owned(), pair.russian().to_owned());
            dict.russian_to_english
                .entry(pair.russian().to_owned())
                .or_insert_with(|| pair.english().to_owned());
            for alt in pair.russian_alternatives() {
                dict.russian_to_english
                    .entry(alt.to_owned())
                    .or_insert_with(|| pair.english().to_owned());
            }
            dict.entries.push(pair);
        }
        dict
    }

    /// Parse the XML form. Entries missing either side are skipped.
    ///
    /// # Errors
    ///
    /// Returns `DictionaryError::Xml` if the document cannot be parsed.
    pub fn from_xml_str(xml: &str) -> Result<Self, DictionaryError> {
        let raw: RawDictionary = quick_xml::de::from_str(xml)?;
        let pairs = raw.entries.into_iter().filter_map(|entry| {
            let (en, ru) = (entry.en?, entry.ru?);
            WordPair::new(en, ru).ok()
        });
        Ok(Self::from_entries(pairs))
    }

    /// Translate in whichever direction the word is known.
    ///
    /// Case-insensitive exact match; english keys are checked first.
    #[must_use]
    pub fn translate(&self, word: &str) -> Option<&str> {
        let key = normalize_key(word);
        self.english_to_russian
            .get(&key)
            .or_else(|| self.russian_to_english.get(&key))
            .map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        self.translate(word).is_some()
    }

    /// Every russian alternative listed for an english word.
    #[must_use]
    pub fn alternatives(&self, english: &str) -> Vec<String> {
        self.english_to_russian
            .get(&normalize_key(english))
            .map(|ru| {
                ru.split(',')
                    .map(str::trim)
                    .filter(|alt| !alt.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Entries in file order, one per english key.
    #[must_use]
    pub fn entries(&self) -> &[WordPair] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
        <dictionary>
            <entry><en>Hello</en><ru>Привет</ru></entry>
            <entry><en>good</en><ru>хороший, добрый</ru></entry>
            <entry><en>orphan</en></entry>
            <entry><en>hello</en><ru>здравствуйте</ru></entry>
        </dictionary>
    ";

    #[test]
    fn lookup_is_symmetric_and_case_insensitive() {
        let dict = Dictionary::from_xml_str(SAMPLE).unwrap();
        assert_eq!(dict.translate("HELLO"), Some("привет"));
        assert_eq!(dict.translate(" привет "), Some("hello"));
    }

    #[test]
    fn first_entry_wins_and_incomplete_entries_are_skipped() {
        let dict = Dictionary::from_xml_str(SAMPLE).unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.translate("hello"), Some("привет"));
        assert!(!dict.contains("orphan"));
    }

    #[test]
    fn alternatives_are_split() {
        let dict = Dictionary::from_xml_str(SAMPLE).unwrap();
        assert_eq!(dict.alternatives("good"), vec!["хороший", "добрый"]);
        assert_eq!(dict.translate("добрый"), Some("good"));
        assert!(dict.alternatives("missing").is_empty());
    }

    #[test]
    fn missing_word_is_none_not_error() {
        let dict = Dictionary::empty();
        assert!(dict.translate("anything").is_none());
        assert!(dict.is_empty());
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(Dictionary::from_xml_str("<dictionary><entry>").is_err());
    }
}
