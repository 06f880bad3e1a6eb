// src/ledger.rs
use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Deduplication key for one article, version 1: feed guid and canonical
/// link joined by "::". The guid alone is not trustworthy across feeds and
/// a link can be re-issued under a new guid; the pair is the identity unit.
/// Persisted keys depend on this exact format, so changing it means
/// migrating the posted file.
pub fn identity_key(guid: &str, link: &str) -> String {
    format!("{guid}::{link}")
}

/// On-disk forms: the legacy bare array, plus a wrapped object so the file
/// can grow fields later without breaking old readers of the array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PersistedKeys {
    Bare(Vec<String>),
    Wrapped { keys: Vec<String> },
}

/// Bounded most-recent-first list of already-published identity keys.
///
/// Single writer by construction: the cycle controller holds the only
/// `&mut Ledger`, and cycles never overlap, so no locking is needed.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    cap: usize,
    keys: Vec<String>,
}

impl Ledger {
    /// Load the persisted ledger. A missing, unreadable, or unparseable
    /// file starts empty; corruption must never abort startup.
    ///
    /// The read is blocking and runs once, at startup, before the
    /// scheduler loop starts.
    pub fn open(path: impl Into<PathBuf>, cap: usize) -> Self {
        let path = path.into();
        let keys = match std::fs::read_to_string(&path) {
            Ok(s) => match serde_json::from_str::<PersistedKeys>(&s) {
                Ok(PersistedKeys::Bare(v)) | Ok(PersistedKeys::Wrapped { keys: v }) => v,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        path = %path.display(),
                        "posted file unparseable, starting with an empty ledger"
                    );
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
        let keys = dedup_and_cap(keys, cap);
        Self { path, cap, keys }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    /// Mark a key as published: prepend, truncate to the cap, rewrite the
    /// file. In-memory state is updated even when the write fails, so a
    /// later successful write still lands the full sequence.
    pub async fn record(&mut self, key: String) -> Result<()> {
        if !self.contains(&key) {
            self.keys.insert(0, key);
            self.keys.truncate(self.cap);
        }
        self.save().await
    }

    async fn save(&self) -> Result<()> {
        let json = serde_json::to_vec_pretty(&self.keys).context("serialize posted keys")?;
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                tokio::fs::create_dir_all(dir)
                    .await
                    .with_context(|| format!("create {}", dir.display()))?;
            }
        }
        // Full rewrite through a sibling temp file; a crash mid-write never
        // leaves a torn ledger behind.
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .with_context(|| format!("write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replace {}", self.path.display()))?;
        Ok(())
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }
}

/// Repair pass applied on load: drop repeated keys (first occurrence wins,
/// so the most recent survives) and enforce the cap.
fn dedup_and_cap(keys: Vec<String>, cap: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(keys.len().min(cap));
    for k in keys {
        if out.len() == cap {
            break;
        }
        if seen.insert(k.clone()) {
            out.push(k);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_guid_and_link_joined() {
        assert_eq!(identity_key("g1", "https://x/1"), "g1::https://x/1");
        assert_eq!(identity_key("", "https://x/1"), "::https://x/1");
    }

    #[test]
    fn load_repair_drops_duplicates_and_enforces_cap() {
        let keys = vec![
            "a".to_string(),
            "b".to_string(),
            "a".to_string(),
            "c".to_string(),
            "d".to_string(),
        ];
        assert_eq!(dedup_and_cap(keys, 3), vec!["a", "b", "c"]);
    }
}
