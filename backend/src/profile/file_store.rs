use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{ProfileRecord, ProfileStore};
use crate::error::CollaboratorError;

type ProfileDocument = BTreeMap<String, ProfileRecord>;

/// Profiles kept in a single JSON document keyed by user id.
pub struct FileProfileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<ProfileDocument, CollaboratorError> {
        match tokio::fs::read(&self.path).await {
            Ok(raw) if raw.is_empty() => Ok(ProfileDocument::new()),
            Ok(raw) => Ok(serde_json::from_slice(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(ProfileDocument::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_document(&self, document: &ProfileDocument) -> Result<(), CollaboratorError> {
        let serialized = serde_json::to_vec_pretty(document)?;
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, serialized).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for FileProfileStore {
    async fn init(&self) -> Result<(), CollaboratorError> {
        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        if tokio::fs::try_exists(&self.path).await? {
            // Surfaces a corrupt document at startup rather than on first request.
            self.read_document().await?;
        } else {
            self.write_document(&ProfileDocument::new()).await?;
        }
        log::info!("Profile store ready at {}", self.path.display());
        Ok(())
    }

    async fn save(&self, record: ProfileRecord) -> Result<(), CollaboratorError> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document().await?;
        log::debug!("Saving profile for user {}", record.user_id);
        document.insert(record.user_id.clone(), record);
        self.write_document(&document).await
    }

    async fn get(&self, user_id: &str) -> Result<Option<ProfileRecord>, CollaboratorError> {
        let mut document = self.read_document().await?;
        Ok(document.remove(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(user_id: &str, name: &str) -> ProfileRecord {
        ProfileRecord {
            user_id: user_id.to_string(),
            name: name.to_string(),
            dob: "1994-07-21".to_string(),
            height: 180.0,
            weight: 75.2,
            gender: Some("Not Specified".to_string()),
        }
    }

    #[actix_web::test]
    async fn init_creates_parent_and_empty_document() {
        let dir = TempDir::new().unwrap();
        let store = FileProfileStore::new(dir.path().join("nested/profiles.json"));

        store.init().await.unwrap();

        assert!(store.path().exists());
        assert_eq!(store.get("user_1").await.unwrap(), None);
    }

    #[actix_web::test]
    async fn save_upserts_by_user_id() {
        let dir = TempDir::new().unwrap();
        let store = FileProfileStore::new(dir.path().join("profiles.json"));
        store.init().await.unwrap();

        store.save(record("user_1", "First")).await.unwrap();
        store.save(record("user_2", "Other")).await.unwrap();
        store.save(record("user_1", "Renamed")).await.unwrap();

        let fetched = store.get("user_1").await.unwrap().unwrap();
        assert_eq!(fetched.name, "Renamed");
        assert_eq!(store.get("user_2").await.unwrap(), Some(record("user_2", "Other")));
    }

    #[actix_web::test]
    async fn corrupt_document_fails_instead_of_resetting() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profiles.json");
        std::fs::write(&path, b"{not json").unwrap();
        let store = FileProfileStore::new(&path);

        assert!(matches!(
            store.init().await,
            Err(CollaboratorError::Serialization(_))
        ));
        assert!(store.save(record("user_1", "A")).await.is_err());
    }
}
