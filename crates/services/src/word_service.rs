use std::sync::Arc;

use storage::repository::WordRepository;
use tracing::info;
use vocab_core::Dictionary;
use vocab_core::model::{UserId, WordPair, WordScope};

use crate::Clock;
use crate::error::WordServiceError;

/// Result of adding a personal word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddWordOutcome {
    Added(WordPair),
    /// The user already has a word with this english key; nothing was stored.
    Duplicate(WordPair),
}

/// One page of the word menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordPage {
    pub page: usize,
    /// English keys shown on this page, shared words first.
    pub words: Vec<String>,
    pub has_prev: bool,
    pub has_next: bool,
}

/// Word lists and translations for one user at a time.
#[derive(Clone)]
pub struct WordService {
    clock: Clock,
    words: Arc<dyn WordRepository>,
    dictionary: Arc<Dictionary>,
    default_limit: u32,
}

impl WordService {
    #[must_use]
    pub fn new(
        clock: Clock,
        words: Arc<dyn WordRepository>,
        dictionary: Arc<Dictionary>,
        default_limit: u32,
    ) -> Self {
        Self {
            clock,
            words,
            dictionary,
            default_limit,
        }
    }

    /// Parse a `word - translation` line and store it as a personal word.
    ///
    /// # Errors
    ///
    /// Returns `WordServiceError::Input` for malformed text.
    /// Returns `WordServiceError::Storage` if persistence fails.
    pub async fn add_word(
        &self,
        user_id: UserId,
        text: &str,
    ) -> Result<AddWordOutcome, WordServiceError> {
        let pair = WordPair::parse_input(text)?;
        let added = self
            .words
            .add_user_word(user_id, &pair, self.clock.now())
            .await?;
        if added {
            info!(user_id = %user_id, english = pair.english(), "added user word");
            Ok(AddWordOutcome::Added(pair))
        } else {
            Ok(AddWordOutcome::Duplicate(pair))
        }
    }

    /// Remove a personal word. Returns `false` when nothing matched.
    ///
    /// # Errors
    ///
    /// Returns `WordServiceError::Storage` if repository access fails.
    pub async fn remove_word(
        &self,
        user_id: UserId,
        english: &str,
    ) -> Result<bool, WordServiceError> {
        let removed = self.words.remove_user_word(user_id, english).await?;
        if removed {
            info!(user_id = %user_id, english, "removed user word");
        }
        Ok(removed)
    }

    /// Personal words, newest first.
    ///
    /// # Errors
    ///
    /// Returns `WordServiceError::Storage` if repository access fails.
    pub async fn user_words(&self, user_id: UserId) -> Result<Vec<WordPair>, WordServiceError> {
        Ok(self.words.list_user_words(user_id).await?)
    }

    /// Shared words, capped at the configured limit.
    ///
    /// # Errors
    ///
    /// Returns `WordServiceError::Storage` if repository access fails.
    pub async fn default_words(&self) -> Result<Vec<WordPair>, WordServiceError> {
        Ok(self.words.list_default_words(self.default_limit).await?)
    }

    /// Page through shared words followed by the user's own.
    ///
    /// Page zero always exists, even when there are no words.
    ///
    /// # Errors
    ///
    /// Returns `WordServiceError::PageOutOfRange` for a page past the end.
    /// Returns `WordServiceError::Storage` if repository access fails.
    pub async fn menu_page(
        &self,
        user_id: UserId,
        page: usize,
        per_page: usize,
    ) -> Result<WordPage, WordServiceError> {
        let per_page = per_page.max(1);
        let mut all = self.default_words().await?;
        all.extend(self.user_words(user_id).await?);

        let start = page
            .checked_mul(per_page)
            .ok_or(WordServiceError::PageOutOfRange { page })?;
        if page > 0 && start >= all.len() {
            return Err(WordServiceError::PageOutOfRange { page });
        }
        let end = (start + per_page).min(all.len());
        let words = all
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .map(|p| p.english().to_owned())
            .collect();

        Ok(WordPage {
            page,
            words,
            has_prev: page > 0,
            has_next: end < all.len(),
        })
    }

    /// Stored translation of a menu word: shared list first, then the user's list.
    ///
    /// # Errors
    ///
    /// Returns `WordServiceError::Storage` if repository access fails.
    pub async fn show_word(
        &self,
        user_id: UserId,
        english: &str,
    ) -> Result<Option<String>, WordServiceError> {
        for scope in [WordScope::Default, WordScope::User] {
            if let Some(t) = self.words.translation(scope, user_id, english).await? {
                return Ok(Some(t));
            }
        }
        Ok(None)
    }

    /// Translate free text: the dictionary in either direction, then the word lists.
    ///
    /// # Errors
    ///
    /// Returns `WordServiceError::Storage` if repository access fails.
    pub async fn translate(
        &self,
        user_id: UserId,
        word: &str,
    ) -> Result<Option<String>, WordServiceError> {
        if let Some(t) = self.dictionary.translate(word) {
            return Ok(Some(t.to_owned()));
        }
        self.show_word(user_id, word).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;
    use vocab_core::time::fixed_clock;

    fn service(dictionary: Dictionary) -> (WordService, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        repo.seed_default_words().unwrap();
        let service = WordService::new(
            fixed_clock(),
            Arc::new(repo.clone()),
            Arc::new(dictionary),
            12,
        );
        (service, repo)
    }

    #[tokio::test]
    async fn add_word_reports_duplicates() {
        let (service, _) = service(Dictionary::empty());
        let user = UserId::new(1);

        let first = service.add_word(user, "Apple - яблоко").await.unwrap();
        assert!(matches!(first, AddWordOutcome::Added(ref p) if p.english() == "apple"));
        let again = service.add_word(user, "APPLE - другое").await.unwrap();
        assert!(matches!(again, AddWordOutcome::Duplicate(_)));
        assert_eq!(service.user_words(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_line_is_an_input_error() {
        let (service, _) = service(Dictionary::empty());
        let err = service.add_word(UserId::new(1), "apple").await.unwrap_err();
        assert!(matches!(err, WordServiceError::Input(_)));
    }

    #[tokio::test]
    async fn menu_pages_through_default_then_user_words() {
        let (service, _) = service(Dictionary::empty());
        let user = UserId::new(2);
        service.add_word(user, "cat - кошка").await.unwrap();

        let first = service.menu_page(user, 0, 6).await.unwrap();
        assert_eq!(first.words.len(), 6);
        assert_eq!(first.words[0], "hello");
        assert!(!first.has_prev);
        assert!(first.has_next);

        let last = service.menu_page(user, 2, 6).await.unwrap();
        assert_eq!(last.words, vec!["cat".to_owned()]);
        assert!(last.has_prev);
        assert!(!last.has_next);

        let err = service.menu_page(user, 3, 6).await.unwrap_err();
        assert!(matches!(err, WordServiceError::PageOutOfRange { page: 3 }));
    }

    #[tokio::test]
    async fn show_word_prefers_the_shared_list() {
        let (service, _) = service(Dictionary::empty());
        let user = UserId::new(3);
        service.add_word(user, "hello - здравствуй").await.unwrap();
        service.add_word(user, "cat - кошка").await.unwrap();

        assert_eq!(
            service.show_word(user, "hello").await.unwrap().as_deref(),
            Some("привет")
        );
        assert_eq!(
            service.show_word(user, "cat").await.unwrap().as_deref(),
            Some("кошка")
        );
        assert!(service.show_word(UserId::new(4), "cat").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn translate_uses_dictionary_in_both_directions() {
        let dictionary = Dictionary::from_entries([WordPair::new("hello", "привет").unwrap()]);
        let (service, _) = service(dictionary);
        let user = UserId::new(5);

        assert_eq!(
            service.translate(user, "Hello").await.unwrap().as_deref(),
            Some("привет")
        );
        assert_eq!(
            service.translate(user, "ПРИВЕТ").await.unwrap().as_deref(),
            Some("hello")
        );
        assert!(service.translate(user, "zebra").await.unwrap().is_none());
    }
}
