//! File-backed prompt template store.
//!
//! One file per template in a single directory. Nothing is cached, so every
//! read reflects the file system. Writes to the same name are serialized and
//! land through a temporary file plus rename, so a reader never sees a
//! partially written template.

use dashmap::DashMap;
use service_core::error::AppError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Suffix every template file name must carry.
pub const PROMPT_SUFFIX: &str = ".prompt";

#[derive(Debug, Error)]
pub enum PromptStoreError {
    #[error("Invalid filename: must end with .prompt and not contain path components: {0}")]
    InvalidName(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Prompt store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PromptStoreError> for AppError {
    fn from(err: PromptStoreError) -> Self {
        match err {
            PromptStoreError::InvalidName(_) => AppError::BadRequest(anyhow::Error::new(err)),
            PromptStoreError::NotFound(_) => AppError::NotFound(anyhow::Error::new(err)),
            PromptStoreError::Io(_) => AppError::InternalError(anyhow::Error::new(err)),
        }
    }
}

/// Returns true when `name` is a plain `*.prompt` file name inside the store.
pub fn is_valid_name(name: &str) -> bool {
    let Some(stem) = name.strip_suffix(PROMPT_SUFFIX) else {
        return false;
    };
    !stem.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
        && !name.contains("..")
}

#[derive(Clone)]
pub struct PromptStore {
    dir: PathBuf,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl PromptStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: Arc::new(DashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reads the full content of a template.
    pub async fn get(&self, name: &str) -> Result<String, PromptStoreError> {
        if !is_valid_name(name) {
            return Err(PromptStoreError::NotFound(name.to_string()));
        }

        match fs::read_to_string(self.dir.join(name)).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(PromptStoreError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Lists template names, sorted.
    pub async fn list(&self) -> Result<Vec<String>, PromptStoreError> {
        let mut entries = fs::read_dir(&self.dir).await?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if is_valid_name(name) {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    /// Replaces the whole content of a template, creating it if needed.
    pub async fn set(&self, name: &str, content: &str) -> Result<(), PromptStoreError> {
        if !is_valid_name(name) {
            return Err(PromptStoreError::InvalidName(name.to_string()));
        }

        let lock = self
            .locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock().await;
        let result = self.replace(name, content).await;
        drop(guard);

        // Held only by the map and by us: no writer is queued on this name.
        self.locks
            .remove_if(name, |_, held| Arc::strong_count(held) == 2);

        result?;
        tracing::info!(template = %name, bytes = content.len(), "Prompt file updated");
        Ok(())
    }

    async fn replace(&self, name: &str, content: &str) -> Result<(), PromptStoreError> {
        let target = self.dir.join(name);
        let staging = self.dir.join(format!(".{}.{}.tmp", name, Uuid::new_v4()));

        if let Err(e) = fs::write(&staging, content).await {
            let _ = fs::remove_file(&staging).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&staging, &target).await {
            let _ = fs::remove_file(&staging).await;
            return Err(e.into());
        }
        Ok(())
    }

    /// Fails when a template required at startup is missing.
    pub async fn ensure_exists(&self, name: &str) -> Result<(), PromptStoreError> {
        self.get(name).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_store() -> PromptStore {
        let dir = std::env::temp_dir().join(format!("prompt-store-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).await.unwrap();
        PromptStore::new(dir)
    }

    async fn file_count(store: &PromptStore) -> usize {
        let mut entries = fs::read_dir(store.dir()).await.unwrap();
        let mut count = 0;
        while entries.next_entry().await.unwrap().is_some() {
            count += 1;
        }
        count
    }

    #[test]
    fn test_name_validation() {
        assert!(is_valid_name("notes.prompt"));
        assert!(is_valid_name("release-notes_v2.prompt"));
        assert!(!is_valid_name("notes.txt"));
        assert!(!is_valid_name(".prompt"));
        assert!(!is_valid_name(".hidden.prompt"));
        assert!(!is_valid_name("../escape.prompt"));
        assert!(!is_valid_name("nested/notes.prompt"));
        assert!(!is_valid_name("nested\\notes.prompt"));
        assert!(!is_valid_name("notes.prompt.bak"));
    }

    #[tokio::test]
    async fn test_set_then_get_returns_content() {
        let store = temp_store().await;
        let content = "You are a release-notes assistant.\n\nBe terse.";

        store.set("notes.prompt", content).await.unwrap();

        assert_eq!(store.get("notes.prompt").await.unwrap(), content);
        let _ = fs::remove_dir_all(store.dir()).await;
    }

    #[tokio::test]
    async fn test_set_overwrites_previous_content() {
        let store = temp_store().await;

        store.set("notes.prompt", "a much longer first version").await.unwrap();
        store.set("notes.prompt", "short").await.unwrap();

        assert_eq!(store.get("notes.prompt").await.unwrap(), "short");
        let _ = fs::remove_dir_all(store.dir()).await;
    }

    #[tokio::test]
    async fn test_set_rejects_bad_name_without_writing() {
        let store = temp_store().await;

        let err = store.set("notes.txt", "ignored").await.unwrap_err();
        assert!(matches!(err, PromptStoreError::InvalidName(_)));
        let err = store.set("../outside.prompt", "ignored").await.unwrap_err();
        assert!(matches!(err, PromptStoreError::InvalidName(_)));

        assert_eq!(file_count(&store).await, 0);
        let _ = fs::remove_dir_all(store.dir()).await;
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = temp_store().await;

        let err = store.get("missing.prompt").await.unwrap_err();
        assert!(matches!(err, PromptStoreError::NotFound(_)));
        let err = store.get("../../etc/passwd").await.unwrap_err();
        assert!(matches!(err, PromptStoreError::NotFound(_)));
        let _ = fs::remove_dir_all(store.dir()).await;
    }

    #[tokio::test]
    async fn test_list_only_returns_prompt_files() {
        let store = temp_store().await;
        store.set("summary.prompt", "sum").await.unwrap();
        store.set("notes.prompt", "notes").await.unwrap();
        fs::write(store.dir().join("readme.md"), "x").await.unwrap();
        fs::create_dir_all(store.dir().join("dir.prompt")).await.unwrap();

        let names = store.list().await.unwrap();

        assert_eq!(names, vec!["notes.prompt", "summary.prompt"]);
        let _ = fs::remove_dir_all(store.dir()).await;
    }

    #[tokio::test]
    async fn test_concurrent_writes_keep_one_whole_value() {
        let store = temp_store().await;
        let first = "A".repeat(256 * 1024);
        let second = "B".repeat(128 * 1024);

        let (a, b) = tokio::join!(
            store.set("race.prompt", &first),
            store.set("race.prompt", &second)
        );
        a.unwrap();
        b.unwrap();

        let stored = store.get("race.prompt").await.unwrap();
        assert!(stored == first || stored == second);
        assert_eq!(store.list().await.unwrap(), vec!["race.prompt"]);
        let _ = fs::remove_dir_all(store.dir()).await;
    }

    #[tokio::test]
    async fn test_idle_write_locks_are_released() {
        let store = temp_store().await;

        for i in 0..8 {
            let name = format!("note-{}.prompt", i);
            store.set(&name, "content").await.unwrap();
        }
        let (a, b) = tokio::join!(
            store.set("shared.prompt", "one"),
            store.set("shared.prompt", "two")
        );
        a.unwrap();
        b.unwrap();

        assert!(store.locks.is_empty());
        assert_eq!(store.list().await.unwrap().len(), 9);
        let _ = fs::remove_dir_all(store.dir()).await;
    }

    #[test]
    fn test_store_error_statuses() {
        use axum::http::StatusCode;

        let invalid: AppError = PromptStoreError::InvalidName("x".into()).into();
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);
        let missing: AppError = PromptStoreError::NotFound("x.prompt".into()).into();
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    }
}
