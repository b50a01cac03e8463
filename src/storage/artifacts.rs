//! Standalone documents kept as plain-text files

use chrono::{DateTime, Local};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::{
    derive_title, format_timestamp, has_extension, rank_index, remove_if_present,
    sanitize_title, sort_by_recency, stem_of, unique_path, RecordEntry, TITLE_WORDS,
};
use crate::core::errors::StoreError;

const EXTENSION: &str = "txt";
/// Gap forced between the mtime of a new artifact and the newest existing one
const STAMP_STEP: Duration = Duration::from_millis(1);
pub const PLACEHOLDER: &str = "Senza titolo";

/// A stored artifact with its content
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub name: String,
    pub content: String,
    pub saved_at: DateTime<Local>,
}

/// Artifacts ordered by file modification time
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Open the store, creating its directory when missing
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{EXTENSION}"))
    }

    /// Newest modification time among the stored artifacts
    fn newest_mtime(&self) -> Result<Option<SystemTime>, StoreError> {
        let mut newest = None;
        for entry in std::fs::read_dir(&self.dir)?.flatten() {
            if !has_extension(&entry.path(), EXTENSION) {
                continue;
            }
            if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
                newest = newest.max(Some(modified));
            }
        }
        Ok(newest)
    }

    /// Save `content` and return the record name
    ///
    /// Without a title, or with one longer than five words, the title is
    /// derived from the content. Existing records are never overwritten.
    /// The new file's mtime is strictly later than every existing one, so
    /// the latest save is always rank 1 even on coarse-grained clocks.
    pub fn save(&self, content: &str, title: Option<&str>) -> Result<String, StoreError> {
        let title = match title {
            Some(t) if !t.trim().is_empty() && t.split_whitespace().count() <= TITLE_WORDS => {
                t.to_string()
            }
            _ => derive_title(content),
        };
        let stem = sanitize_title(&title, PLACEHOLDER);
        let (name, path) = unique_path(&self.dir, &stem, EXTENSION);
        let newest = self.newest_mtime()?;

        let mut file = std::fs::File::create(&path)?;
        file.write_all(content.as_bytes())?;
        if let Some(newest) = newest {
            if file.metadata()?.modified()? <= newest {
                file.set_modified(newest + STAMP_STEP)?;
            }
        }
        tracing::info!("Artifact saved to {}", path.display());
        Ok(name)
    }

    /// All artifacts, most recent first
    pub fn list(&self) -> Result<Vec<RecordEntry>, StoreError> {
        let mut entries = Vec::new();

        for entry in std::fs::read_dir(&self.dir)?.flatten() {
            let path = entry.path();
            if !has_extension(&path, EXTENSION) {
                continue;
            }
            let Some(name) = stem_of(&path) else {
                continue;
            };
            match entry.metadata().and_then(|m| m.modified()) {
                Ok(modified) => entries.push(RecordEntry {
                    name,
                    saved_at: DateTime::<Local>::from(modified),
                    style: None,
                }),
                Err(e) => tracing::warn!("Skipping artifact {}: {}", path.display(), e),
            }
        }

        sort_by_recency(&mut entries);
        Ok(entries)
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        Ok(self.list()?.len())
    }

    /// Content of the artifact called `name`
    pub fn read(&self, name: &str) -> Result<String, StoreError> {
        let path = self.path_for(name);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Artifact at 1-based recency `rank`
    pub fn get_by_number(&self, rank: usize) -> Result<Artifact, StoreError> {
        let entries = self.list()?;
        let index = rank_index(rank, entries.len())?;
        let entry = &entries[index];
        Ok(Artifact {
            name: entry.name.clone(),
            content: self.read(&entry.name)?,
            saved_at: entry.saved_at,
        })
    }

    /// Delete by name; `false` when it was already gone
    pub fn delete(&self, name: &str) -> Result<bool, StoreError> {
        let removed = remove_if_present(&self.path_for(name))?;
        if removed {
            tracing::info!("Artifact {} deleted", name);
        } else {
            tracing::warn!("Artifact {} not found", name);
        }
        Ok(removed)
    }

    /// Delete the artifact at `rank` and return its name
    pub fn delete_by_number(&self, rank: usize) -> Result<String, StoreError> {
        let entries = self.list()?;
        let index = rank_index(rank, entries.len())?;
        let name = entries[index].name.clone();
        if !self.delete(&name)? {
            return Err(StoreError::NotFound(name));
        }
        Ok(name)
    }

    /// Numbered listing for speech
    pub fn format_listing(&self) -> Result<String, StoreError> {
        let entries = self.list()?;
        if entries.is_empty() {
            return Ok("Non ci sono artefatti salvati.".to_string());
        }

        let mut lines = vec!["Ecco gli artefatti salvati, dal più recente:".to_string()];
        for (i, entry) in entries.iter().enumerate() {
            lines.push(format!(
                "Numero {}: {}, salvato il {}",
                i + 1,
                entry.name,
                format_timestamp(&entry.saved_at)
            ));
        }
        Ok(lines.join(" ... "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn store() -> (TempDir, ArtifactStore) {
        let temp = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp.path().join("artifacts")).unwrap();
        (temp, store)
    }

    fn age(store: &ArtifactStore, name: &str, secs_ago: u64) {
        let file = std::fs::File::options()
            .write(true)
            .open(store.path_for(name))
            .unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(secs_ago))
            .unwrap();
    }

    #[test]
    fn test_save_without_title_derives_it() {
        let (_temp, store) = store();
        let name = store.save("Ciao mondo", None).unwrap();
        assert_eq!(name, "Ciao mondo");

        let artifact = store.get_by_number(1).unwrap();
        assert_eq!(artifact.content, "Ciao mondo");
        assert_eq!(artifact.name, "Ciao mondo");
    }

    #[test]
    fn test_long_title_is_ignored() {
        let (_temp, store) = store();
        let name = store
            .save("Testo breve qui", Some("uno due tre quattro cinque sei"))
            .unwrap();
        assert_eq!(name, "Testo breve qui");
    }

    #[test]
    fn test_collision_appends_counter() {
        let (_temp, store) = store();
        assert_eq!(store.save("prima", Some("Nota")).unwrap(), "Nota");
        assert_eq!(store.save("seconda", Some("Nota")).unwrap(), "Nota_1");
        assert_eq!(store.read("Nota").unwrap(), "prima");
        assert_eq!(store.read("Nota_1").unwrap(), "seconda");
    }

    #[test]
    fn test_list_is_newest_first() {
        let (_temp, store) = store();
        store.save("vecchio", Some("Vecchio")).unwrap();
        store.save("recente", Some("Recente")).unwrap();
        age(&store, "Vecchio", 3600);
        age(&store, "Recente", 60);

        let names: Vec<_> = store.list().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Recente", "Vecchio"]);
        assert_eq!(store.get_by_number(2).unwrap().content, "vecchio");
    }

    #[test]
    fn test_back_to_back_saves_rank_latest_first() {
        let (_temp, store) = store();
        for i in 0..5 {
            // Name order alone would rank the first save higher
            store.save(&format!("testo numero {i}"), Some("aaa titolo")).unwrap();
            store.save(&format!("altro testo {i}"), Some("zzz titolo")).unwrap();
            assert_eq!(store.get_by_number(1).unwrap().content, format!("altro testo {i}"));
        }

        let entries = store.list().unwrap();
        for pair in entries.windows(2) {
            assert!(pair[0].saved_at > pair[1].saved_at);
        }
    }

    #[test]
    fn test_out_of_range_reports_count() {
        let (_temp, store) = store();
        store.save("uno", Some("Uno")).unwrap();
        assert!(matches!(
            store.get_by_number(2),
            Err(StoreError::OutOfRange { requested: 2, count: 1 })
        ));
    }

    #[test]
    fn test_delete_tolerates_absent() {
        let (_temp, store) = store();
        store.save("x", Some("Da cancellare")).unwrap();
        assert!(store.delete("Da cancellare").unwrap());
        assert!(!store.delete("Da cancellare").unwrap());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_non_text_files_are_ignored() {
        let (_temp, store) = store();
        std::fs::write(store.dir().join("note.md"), "x").unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_listing_format() {
        let (_temp, store) = store();
        assert_eq!(store.format_listing().unwrap(), "Non ci sono artefatti salvati.");

        store.save("contenuto", Some("Poesia")).unwrap();
        let listing = store.format_listing().unwrap();
        assert!(listing.starts_with("Ecco gli artefatti salvati"));
        assert!(listing.contains(" ... Numero 1: Poesia, salvato il "));
    }
}
