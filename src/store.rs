//! # Sent-ID store
//!
//! The only durable state: a JSON array of identifiers that were already
//! notified. Read once at run start, written at most once at run end.
//!
//! - Missing or unreadable file → empty set (re-notifying beats crashing).
//! - Saved sorted and pretty-printed, via a sibling temp file + rename so a
//!   crash mid-write never leaves a truncated array behind.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

pub type SentIdSet = BTreeSet<String>;

#[derive(Debug, Clone)]
pub struct SentIdStore {
    path: PathBuf,
}

impl SentIdStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> SentIdSet {
        let raw = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return SentIdSet::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "sent-id file unreadable, starting empty");
                return SentIdSet::new();
            }
        };
        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(ids) => ids.into_iter().collect(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "sent-id file corrupt, starting empty");
                SentIdSet::new()
            }
        }
    }

    /// Overwrite the file with the full set.
    pub fn save(&self, ids: &SentIdSet) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating state dir {}", dir.display()))?;
        }
        let body = serde_json::to_string_pretty(ids).context("serializing sent ids")?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, body.as_bytes())
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SentIdStore::new(dir.path().join("sent_ids.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("sent_ids.json");
        fs::write(&p, "{not json").unwrap();
        assert!(SentIdStore::new(&p).load().is_empty());

        fs::write(&p, r#"{"ids": ["a"]}"#).unwrap();
        assert!(SentIdStore::new(&p).load().is_empty());
    }

    #[test]
    fn save_is_sorted_and_keeps_unicode() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("state").join("sent_ids.json");
        let store = SentIdStore::new(&p);

        let ids: SentIdSet = ["b", "トヨタ-1", "a"].iter().map(|s| s.to_string()).collect();
        store.save(&ids).unwrap();

        let raw = fs::read_to_string(&p).unwrap();
        let parsed: Vec<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, vec!["a", "b", "トヨタ-1"]);
        assert!(raw.contains("トヨタ-1"));
        assert!(!p.with_extension("json.tmp").exists());
        assert_eq!(store.load(), ids);
    }
}
