use std::io::ErrorKind;
use std::path::Path;

use tracing::{error, info, warn};
use vocab_core::Dictionary;

/// Load the dictionary file once at startup.
///
/// A missing, unreadable or malformed file is not fatal: it is logged and an
/// empty dictionary is returned.
pub async fn load_dictionary(path: &Path) -> Dictionary {
    let xml = match tokio::fs::read_to_string(path).await {
        Ok(xml) => xml,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "dictionary file not found; using an empty dictionary");
            return Dictionary::empty();
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read dictionary; using an empty dictionary");
            return Dictionary::empty();
        }
    };

    match Dictionary::from_xml_str(&xml) {
        Ok(dictionary) => {
            info!(path = %path.display(), entries = dictionary.len(), "loaded dictionary");
            dictionary
        }
        Err(err) => {
            error!(path = %path.display(), error = %err, "failed to parse dictionary; using an empty dictionary");
            Dictionary::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_yields_empty_dictionary() {
        let dict = load_dictionary(Path::new("definitely/not/here.xml")).await;
        assert!(dict.is_empty());
    }

    #[tokio::test]
    async fn reads_entries_from_disk() {
        let path = std::env::temp_dir().join(format!("vocab-dict-{}.xml", std::process::id()));
        tokio::fs::write(
            &path,
            "<dictionary><entry><en>hello</en><ru>привет</ru></entry></dictionary>",
        )
        .await
        .unwrap();

        let dict = load_dictionary(&path).await;
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(dict.translate("Hello"), Some("привет"));
    }

    #[tokio::test]
    async fn malformed_file_yields_empty_dictionary() {
        let path = std::env::temp_dir().join(format!("vocab-bad-{}.xml", std::process::id()));
        tokio::fs::write(&path, "<dictionary><entry>").await.unwrap();

        let dict = load_dictionary(&path).await;
        let _ = tokio::fs::remove_file(&path).await;

        assert!(dict.is_empty());
    }
}
