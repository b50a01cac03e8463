//! File-backed record stores
//!
//! Layout under the data directory:
//!
//! <data_dir>/
//! ├── comm/                          # Marker files dropped by the input device
//! ├── artifacts/                     # One plain-text file per artifact
//! │   └── {title}.txt
//! └── chats/                         # One JSON snapshot per saved chat
//!     └── {title}.json
//!
//! Records are addressed by recency rank: 1 is the most recently saved.
//! Ranks are only stable for one list-then-act round trip.

mod artifacts;
mod chats;

pub use artifacts::{Artifact, ArtifactStore};
pub use chats::{ChatRecord, ChatStore, StoredChat};

use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::core::errors::StoreError;
use crate::core::types::SessionStyle;

/// Characters rejected by common filesystems
const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Words kept when a title is derived from text
pub const TITLE_WORDS: usize = 5;
/// Longest derived title before truncation
pub const TITLE_MAX_CHARS: usize = 50;

/// One line of a recency-ranked listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordEntry {
    /// File stem; also the name read to the user
    pub name: String,
    pub saved_at: DateTime<Local>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<SessionStyle>,
}

/// Turn a title into a filesystem-safe file stem
///
/// Invalid and control characters are removed and whitespace is trimmed;
/// an empty result becomes `placeholder`. Applying it twice gives the same
/// string as applying it once.
pub fn sanitize_title(title: &str, placeholder: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| !INVALID_CHARS.contains(c) && !c.is_control())
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        placeholder.to_string()
    } else {
        trimmed.to_string()
    }
}

/// First few words of `text`, shortened with "..." when too long
pub fn derive_title(text: &str) -> String {
    let title = text
        .split_whitespace()
        .take(TITLE_WORDS)
        .collect::<Vec<_>>()
        .join(" ");

    if title.chars().count() > TITLE_MAX_CHARS {
        let head: String = title.chars().take(TITLE_MAX_CHARS - 3).collect();
        format!("{head}...")
    } else {
        title
    }
}

/// Whether a user-supplied title is short enough to name a record
pub fn is_usable_title(text: &str) -> bool {
    let words = text.split_whitespace().count();
    (2..=TITLE_WORDS).contains(&words)
}

/// First free `stem[_n].ext` path in `dir`
fn unique_path(dir: &Path, stem: &str, ext: &str) -> (String, PathBuf) {
    let mut name = stem.to_string();
    let mut path = dir.join(format!("{name}.{ext}"));
    let mut counter = 1;
    while path.exists() {
        name = format!("{stem}_{counter}");
        path = dir.join(format!("{name}.{ext}"));
        counter += 1;
    }
    (name, path)
}

/// Newest first; equal timestamps fall back to name order
fn sort_by_recency(entries: &mut [RecordEntry]) {
    entries.sort_by(|a, b| {
        b.saved_at
            .cmp(&a.saved_at)
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// Zero-based index for a 1-based `rank`
fn rank_index(rank: usize, count: usize) -> Result<usize, StoreError> {
    if rank == 0 || rank > count {
        return Err(StoreError::OutOfRange {
            requested: rank,
            count,
        });
    }
    Ok(rank - 1)
}

/// "dd/mm/yyyy alle HH:MM"
pub fn format_timestamp(ts: &DateTime<Local>) -> String {
    ts.format("%d/%m/%Y alle %H:%M").to_string()
}

fn stem_of(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e == ext)
}

/// Remove `path`; a missing file is reported as `false`
fn remove_if_present(path: &Path) -> Result<bool, StoreError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_strips_invalid_chars() {
        assert_eq!(sanitize_title("  a/b:c?  ", "X"), "abc");
        assert_eq!(sanitize_title("Poesia\tsul\nmare", "X"), "Poesiasulmare");
    }

    #[test]
    fn test_sanitize_placeholder() {
        assert_eq!(sanitize_title("", "Senza titolo"), "Senza titolo");
        assert_eq!(sanitize_title(" <>:\"/\\|?* ", "Senza titolo"), "Senza titolo");
    }

    #[test]
    fn test_derive_title_takes_five_words() {
        assert_eq!(derive_title("uno due tre quattro cinque sei"), "uno due tre quattro cinque");
        assert_eq!(derive_title("Ciao mondo"), "Ciao mondo");
    }

    #[test]
    fn test_derive_title_truncates_long_words() {
        let text = "supercalifragilistichespiralidoso precipitevolissimevolmente incomprensibilmente";
        let title = derive_title(text);
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_usable_title() {
        assert!(!is_usable_title("uno"));
        assert!(is_usable_title("la mia poesia"));
        assert!(!is_usable_title("uno due tre quattro cinque sei"));
    }

    #[test]
    fn test_unique_path_appends_counter() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("nota.txt"), "a").unwrap();
        std::fs::write(temp.path().join("nota_1.txt"), "b").unwrap();

        let (name, path) = unique_path(temp.path(), "nota", "txt");
        assert_eq!(name, "nota_2");
        assert_eq!(path, temp.path().join("nota_2.txt"));
    }

    #[test]
    fn test_rank_index() {
        assert_eq!(rank_index(1, 3).unwrap(), 0);
        assert!(matches!(
            rank_index(0, 3),
            Err(StoreError::OutOfRange { requested: 0, count: 3 })
        ));
        assert!(rank_index(4, 3).is_err());
    }

    #[test]
    fn test_remove_if_present_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("x.txt");
        std::fs::write(&path, "x").unwrap();
        assert!(remove_if_present(&path).unwrap());
        assert!(!remove_if_present(&path).unwrap());
    }

    proptest! {
        #[test]
        fn prop_sanitize_is_idempotent(title in "\\PC*") {
            let once = sanitize_title(&title, "Senza titolo");
            prop_assert_eq!(sanitize_title(&once, "Senza titolo"), once.clone());
            prop_assert!(!once.is_empty());
            prop_assert!(!once.contains(INVALID_CHARS));
        }

        #[test]
        fn prop_derived_title_is_bounded(text in "[a-zA-Z ]{0,200}") {
            prop_assert!(derive_title(&text).chars().count() <= TITLE_MAX_CHARS);
        }
    }
}
