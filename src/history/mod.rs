use async_trait::async_trait;
use log::{ info, warn };
use std::path::{ Path, PathBuf };
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::cli::Args;
use crate::llm::chat::BoxError;
use crate::models::audit::{ HistoryEntry, WebsiteContext };

/// Most-recent-first, deduplicated by URL, bounded.
const MAX_ENTRIES: usize = 10;

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn record(&self, context: &WebsiteContext) -> Result<(), BoxError>;

    async fn entries(&self) -> Result<Vec<HistoryEntry>, BoxError>;
}

pub fn create_history_store(args: &Args) -> Result<Arc<dyn HistoryStore>, BoxError> {
    info!("Audit history will be stored in: {}", args.history_path);
    let store = FileHistoryStore::open(&args.history_path)?;
    Ok(Arc::new(store))
}

/// JSON-file-backed store: loaded once on open, written through on record.
pub struct FileHistoryStore {
    path: PathBuf,
    entries: Mutex<Vec<HistoryEntry>>,
}

impl FileHistoryStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BoxError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
                Ok(loaded) => loaded,
                Err(e) => {
                    warn!("Discarding unreadable history file {}: {}", path.display(), e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn persist(&self, entries: &[HistoryEntry]) -> Result<(), BoxError> {
        let raw = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
    async fn record(&self, context: &WebsiteContext) -> Result<(), BoxError> {
        let mut entries = self.entries.lock().await;
        entries.retain(|existing| existing.url != context.url);
        entries.insert(0, HistoryEntry {
            id: Uuid::new_v4().to_string(),
            url: context.url.clone(),
            timestamp: context.timestamp,
            data: context.clone(),
        });
        entries.truncate(MAX_ENTRIES);
        self.persist(&entries)
    }

    async fn entries(&self) -> Result<Vec<HistoryEntry>, BoxError> {
        Ok(self.entries.lock().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::generate_mock_audit;

    fn temp_store() -> (FileHistoryStore, PathBuf) {
        let path = std::env::temp_dir().join(format!("tt_history_{}.json", Uuid::new_v4()));
        let store = FileHistoryStore::open(&path).expect("open store");
        (store, path)
    }

    #[tokio::test]
    async fn records_most_recent_first_and_dedupes_by_url() {
        let (store, path) = temp_store();

        store.record(&generate_mock_audit("https://a.com")).await.expect("record");
        store.record(&generate_mock_audit("https://b.com")).await.expect("record");
        store.record(&generate_mock_audit("https://a.com")).await.expect("record");

        let entries = store.entries().await.expect("entries");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].url, "https://a.com");
        assert_eq!(entries[1].url, "https://b.com");

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn bounds_the_list_at_ten_entries() {
        let (store, path) = temp_store();

        for i in 0..14 {
            let audit = generate_mock_audit(&format!("https://site-{}.com", i));
            store.record(&audit).await.expect("record");
        }

        let entries = store.entries().await.expect("entries");
        assert_eq!(entries.len(), 10);
        assert_eq!(entries[0].url, "https://site-13.com");

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn reloads_from_disk_on_open() {
        let (store, path) = temp_store();
        store.record(&generate_mock_audit("https://persisted.com")).await.expect("record");
        drop(store);

        let reopened = FileHistoryStore::open(&path).expect("reopen");
        let entries = reopened.entries().await.expect("entries");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, "https://persisted.com");

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn unreadable_history_file_starts_empty() {
        let path = std::env::temp_dir().join(format!("tt_history_{}.json", Uuid::new_v4()));
        std::fs::write(&path, "not json {").expect("write junk");

        let store = FileHistoryStore::open(&path).expect("open");
        assert!(store.entries().await.expect("entries").is_empty());

        let _ = std::fs::remove_file(path);
    }
}
