use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::artifact::Artifact;
use crate::error::Result;

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("filename pattern"));

const MAX_BASE_LEN: usize = 120;

/// Persistence sink for assembled artifacts.
///
/// Each artifact becomes `<base>.<index>.json`, with a sibling
/// `<base>.<index>.txt` when there is normalized text to keep. The index
/// is a millisecond timestamp forced strictly monotonic within the store,
/// so repeated runs never collide on a name.
pub struct ArtifactStore {
    dir: PathBuf,
    last_index: AtomicI64,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            last_index: AtomicI64::new(0),
        })
    }

    /// Write the artifact's JSON (always) and text body (when non-empty).
    /// Returns the JSON path.
    pub fn persist(&self, artifact: &Artifact) -> Result<PathBuf> {
        let index = self.next_index();
        let base = sanitize_filename(artifact.title.as_deref().unwrap_or(&artifact.url));

        let json_path = self.dir.join(format!("{base}.{index}.json"));
        std::fs::write(&json_path, serde_json::to_string_pretty(artifact)?)?;

        if let Some(text) = artifact.raw_text.as_deref().filter(|t| !t.is_empty()) {
            std::fs::write(self.dir.join(format!("{base}.{index}.txt")), text)?;
        }

        Ok(json_path)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn next_index(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut prev = self.last_index.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match self
                .last_index
                .compare_exchange(prev, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }
}

/// Reduce a title or URL to a safe file-name stem.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    UNSAFE_CHARS
        .replace_all(name, "_")
        .chars()
        .take(MAX_BASE_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{Artifact, ContentKind};

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(
            sanitize_filename("https://example.com/a b?c"),
            "https___example.com_a_b_c"
        );
        assert_eq!(sanitize_filename("plain-name_1.txt"), "plain-name_1.txt");
        assert!(sanitize_filename(&"x".repeat(500)).len() <= MAX_BASE_LEN);
    }

    #[test]
    fn test_persist_writes_json_and_text() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path()).unwrap();

        let artifact = Artifact::new("https://example.com/doc", ContentKind::Html)
            .with_title("Doc")
            .with_raw_text("the body");
        let json_path = store.persist(&artifact).unwrap();

        assert!(json_path.exists());
        let restored: Artifact =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(restored, artifact);

        let txt_path = json_path.with_extension("txt");
        assert_eq!(std::fs::read_to_string(txt_path).unwrap(), "the body");
    }

    #[test]
    fn test_persist_skips_text_when_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path()).unwrap();

        let artifact = Artifact::failure("https://example.com/doc", "HTTP 404");
        let json_path = store.persist(&artifact).unwrap();

        assert!(json_path.exists());
        assert!(!json_path.with_extension("txt").exists());
    }

    #[test]
    fn test_indices_are_strictly_monotonic() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path()).unwrap();
        let artifact = Artifact::new("https://example.com", ContentKind::Html);

        let first = store.persist(&artifact).unwrap();
        let second = store.persist(&artifact).unwrap();
        assert_ne!(first, second);
    }
}
