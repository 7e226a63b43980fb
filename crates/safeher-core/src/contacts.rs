//! Contact directory
//!
//! The alert flow only reads contacts. The two stores here exist so the
//! flow can run outside the app: an in-memory list and a JSON file.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::model::{Contact, ContactId};
use crate::{Result, SafeherError};

/// Ordered source of trusted recipients
#[async_trait]
pub trait ContactDirectory: Send + Sync + std::fmt::Debug {
    /// All contacts in display order. Empty is a valid answer.
    async fn contacts(&self) -> Result<Vec<Contact>>;
}

/// In-memory directory
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    contacts: Arc<RwLock<Vec<Contact>>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contacts(contacts: Vec<Contact>) -> Self {
        Self {
            contacts: Arc::new(RwLock::new(contacts)),
        }
    }

    pub fn add(&self, contact: Contact) {
        self.contacts.write().push(contact);
    }

    pub fn remove(&self, id: &ContactId) -> Option<Contact> {
        let mut contacts = self.contacts.write();
        let index = contacts.iter().position(|c| &c.id == id)?;
        Some(contacts.remove(index))
    }

    pub fn len(&self) -> usize {
        self.contacts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.read().is_empty()
    }
}

#[async_trait]
impl ContactDirectory for InMemoryDirectory {
    async fn contacts(&self) -> Result<Vec<Contact>> {
        Ok(self.contacts.read().clone())
    }
}

/// Directory stored as a JSON array on disk
#[derive(Debug, Clone)]
pub struct JsonFileDirectory {
    path: PathBuf,
}

impl JsonFileDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file; a missing file is an empty directory.
    pub async fn load(&self) -> Result<Vec<Contact>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(Vec::new());
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            SafeherError::Directory(format!("invalid contacts file {:?}: {}", self.path, e))
        })
    }

    pub async fn save(&self, contacts: &[Contact]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_json::to_string_pretty(contacts)?;

        // the live file is only ever replaced whole
        let staging = self.staging_path();
        tokio::fs::write(&staging, content).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Append a contact and persist.
    pub async fn add(&self, contact: Contact) -> Result<Contact> {
        let mut contacts = self.load().await?;
        contacts.push(contact.clone());
        self.save(&contacts).await?;
        tracing::info!("Contact added: {}", contact.id);
        Ok(contact)
    }

    /// Remove a contact by id and persist.
    pub async fn remove(&self, id: &ContactId) -> Result<Contact> {
        let mut contacts = self.load().await?;
        let index = contacts
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| SafeherError::ContactNotFound(id.to_string()))?;
        let removed = contacts.remove(index);
        self.save(&contacts).await?;
        tracing::info!("Contact removed: {}", id);
        Ok(removed)
    }
}

#[async_trait]
impl ContactDirectory for JsonFileDirectory {
    async fn contacts(&self) -> Result<Vec<Contact>> {
        self.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_in_memory_directory_preserves_order() {
        let directory = InMemoryDirectory::new();
        assert!(directory.contacts().await.unwrap().is_empty());

        directory.add(Contact::new("Asha", "+911111"));
        directory.add(Contact::new("Meera", "+912222"));
        assert_eq!(directory.len(), 2);

        let names: Vec<String> = directory
            .contacts()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Asha", "Meera"]);
    }

    #[test]
    fn test_in_memory_remove() {
        let asha = Contact::new("Asha", "+911111");
        let directory = InMemoryDirectory::with_contacts(vec![asha.clone()]);

        assert_eq!(directory.remove(&asha.id), Some(asha.clone()));
        assert!(directory.remove(&asha.id).is_none());
        assert!(directory.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let directory = JsonFileDirectory::new(dir.path().join("contacts.json"));
        assert!(directory.contacts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_add_and_remove() {
        let dir = tempdir().unwrap();
        let directory = JsonFileDirectory::new(dir.path().join("nested").join("contacts.json"));

        let asha = directory.add(Contact::new("Asha", "+911111")).await.unwrap();
        directory.add(Contact::new("Meera", "+912222")).await.unwrap();
        assert_eq!(directory.contacts().await.unwrap().len(), 2);

        let removed = directory.remove(&asha.id).await.unwrap();
        assert_eq!(removed.name, "Asha");

        let remaining = directory.contacts().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "Meera");

        let missing = directory.remove(&asha.id).await;
        assert!(matches!(missing, Err(SafeherError::ContactNotFound(_))));
    }

    #[tokio::test]
    async fn test_save_replaces_file_through_staging() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("contacts.json");
        let staging = dir.path().join("contacts.json.tmp");
        let directory = JsonFileDirectory::new(&path);

        directory.add(Contact::new("Asha", "+911111")).await.unwrap();

        // an interrupted write only ever leaves the staging file behind
        std::fs::write(&staging, "[{\"id\": \"trunc").unwrap();
        assert_eq!(directory.contacts().await.unwrap().len(), 1);

        directory.add(Contact::new("Meera", "+912222")).await.unwrap();
        assert!(!staging.exists());
        assert_eq!(directory.contacts().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_directory_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("contacts.json");
        std::fs::write(&path, "{ not json").unwrap();

        let directory = JsonFileDirectory::new(path);
        assert!(matches!(
            directory.contacts().await,
            Err(SafeherError::Directory(_))
        ));
    }
}
