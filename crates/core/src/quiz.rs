//! Question generation and answer checking for vocabulary quizzes.
//!
//! Everything here is pure: storage lookups (e.g. the set of accepted
//! translations) are resolved by the caller and passed in.

use std::collections::{BTreeSet, HashSet};

use rand::Rng;

use crate::model::{WordPair, WordScope, normalize_key};

/// Known misspellings mapped to their canonical form.
pub const TYPO_CORRECTIONS: &[(&str, &str)] = &[
    ("прстите", "простите"),
    ("извните", "извините"),
    ("сори", "sorry"),
    ("вада", "вода"),
    ("ватер", "water"),
    ("йес", "yes"),
    ("ноу", "no"),
    ("хелло", "hello"),
    ("санкс", "thanks"),
    ("тхак ю", "thank you"),
];

/// Trim, lowercase and apply [`TYPO_CORRECTIONS`].
///
/// Idempotent: no canonical form is itself a known misspelling.
#[must_use]
pub fn normalize_answer(raw: &str) -> String {
    let key = normalize_key(raw);
    TYPO_CORRECTIONS
        .iter()
        .find(|(typo, _)| *typo == key)
        .map_or(key, |(_, canonical)| (*canonical).to_owned())
}

//
// ─── WORD POOL ─────────────────────────────────────────────────────────────────
//

/// Where a quiz word came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordSource {
    Default,
    User,
    Dictionary,
}

impl WordSource {
    /// Store scope for words that live in a word list; `None` for dictionary-only words.
    #[must_use]
    pub fn scope(self) -> Option<WordScope> {
        match self {
            WordSource::Default => Some(WordScope::Default),
            WordSource::User => Some(WordScope::User),
            WordSource::Dictionary => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolWord {
    pub pair: WordPair,
    pub source: WordSource,
}

/// Union of every word a user can be quizzed on, one entry per english key.
#[derive(Debug, Clone, Default)]
pub struct WordPool {
    words: Vec<PoolWord>,
}

impl WordPool {
    /// Merge default, user and dictionary words in that order.
    ///
    /// Duplicates by english key are dropped; the first occurrence wins.
    #[must_use]
    pub fn merge(default: &[WordPair], user: &[WordPair], dictionary: &[WordPair]) -> Self {
        let mut seen = HashSet::new();
        let mut words = Vec::with_capacity(default.len() + user.len() + dictionary.len());
        let sources = [
            (default, WordSource::Default),
            (user, WordSource::User),
            (dictionary, WordSource::Dictionary),
        ];
        for (pairs, source) in sources {
            for pair in pairs {
                if seen.insert(pair.english().to_owned()) {
                    words.push(PoolWord {
                        pair: pair.clone(),
                        source,
                    });
                }
            }
        }
        Self { words }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    #[must_use]
    pub fn words(&self) -> &[PoolWord] {
        &self.words
    }

    /// Draw a uniformly random word and direction. Sampling is with replacement.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Question> {
        if self.words.is_empty() {
            return None;
        }
        let word = self.words[rng.random_range(0..self.words.len())].clone();
        let direction = if rng.random_bool(0.5) {
            Direction::EnglishToRussian
        } else {
            Direction::RussianToEnglish
        };
        Some(Question { word, direction })
    }
}

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Show the english word, expect russian.
    EnglishToRussian,
    /// Show the russian word, expect english.
    RussianToEnglish,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub word: PoolWord,
    pub direction: Direction,
}

impl Question {
    #[must_use]
    pub fn new(word: PoolWord, direction: Direction) -> Self {
        Self { word, direction }
    }

    /// The side shown to the user.
    #[must_use]
    pub fn prompt(&self) -> &str {
        match self.direction {
            Direction::EnglishToRussian => self.word.pair.english(),
            Direction::RussianToEnglish => self.word.pair.russian(),
        }
    }

    /// The hidden side.
    #[must_use]
    pub fn expected(&self) -> &str {
        match self.direction {
            Direction::EnglishToRussian => self.word.pair.russian(),
            Direction::RussianToEnglish => self.word.pair.english(),
        }
    }

    #[must_use]
    pub fn english(&self) -> &str {
        self.word.pair.english()
    }

    /// Judge an answer.
    ///
    /// Russian-to-english has a single canonical answer. English-to-russian
    /// accepts any member of `translations` as well as any comma-separated
    /// alternative of the expected side.
    #[must_use]
    pub fn check(&self, raw_answer: &str, translations: &BTreeSet<String>) -> AnswerCheck {
        let answer = normalize_answer(raw_answer);
        let accepted: BTreeSet<String> = match self.direction {
            Direction::RussianToEnglish => BTreeSet::from([self.expected().to_owned()]),
            Direction::EnglishToRussian => self
                .word
                .pair
                .russian_alternatives()
                .map(str::to_owned)
                .chain(translations.iter().map(|t| normalize_key(t)))
                .filter(|t| !t.is_empty())
                .collect(),
        };
        let is_correct = accepted.contains(&answer);
        AnswerCheck {
            answer,
            is_correct,
            accepted,
        }
    }
}

/// Outcome of checking one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerCheck {
    /// The normalized answer that was compared.
    pub answer: String,
    pub is_correct: bool,
    pub accepted: BTreeSet<String>,
}
