use super::Resource;
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// Errors raised by a [`ResourceStore`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Another resource with the same identifier exists
    #[error("a resource with id {0:?} already exists")]
    DuplicateId(String),
    /// Backing storage failed
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Storage capability injected into the services
///
/// Identifiers are unique, listing order is unspecified once resources have been removed.
#[async_trait]
pub trait ResourceStore<R: Resource>: Send + Sync {
    /// Looks up a resource by its identifier
    async fn find(&self, id: &str) -> Result<Option<R>, StoreError>;

    /// Stores a new resource, fails if the identifier is taken
    async fn insert(&self, resource: R) -> Result<R, StoreError>;

    /// Replaces an existing resource, returns `None` if it does not exist
    async fn update(&self, resource: R) -> Result<Option<R>, StoreError>;

    /// Removes a resource, returns whether it existed
    async fn remove(&self, id: &str) -> Result<bool, StoreError>;

    /// All stored resources
    async fn list(&self) -> Result<Vec<R>, StoreError>;
}

/// [`ResourceStore`] which keeps everything in process memory
pub struct MemoryStore<R> {
    resources: Mutex<Vec<R>>,
}

impl<R> Default for MemoryStore<R> {
    fn default() -> Self {
        Self {
            resources: Mutex::new(Vec::new()),
        }
    }
}

impl<R: Resource> MemoryStore<R> {
    /// Creates a store which initially contains the given resources
    pub fn with_resources(resources: Vec<R>) -> Self {
        Self {
            resources: Mutex::new(resources),
        }
    }

    fn resources(&self) -> MutexGuard<'_, Vec<R>> {
        match self.resources.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl<R: Resource> ResourceStore<R> for MemoryStore<R> {
    async fn find(&self, id: &str) -> Result<Option<R>, StoreError> {
        Ok(self.resources().iter().find(|r| r.id() == id).cloned())
    }

    async fn insert(&self, resource: R) -> Result<R, StoreError> {
        let mut resources = self.resources();

        if resources.iter().any(|r| r.id() == resource.id()) {
            return Err(StoreError::DuplicateId(resource.id().to_owned()));
        }

        resources.push(resource.clone());
        Ok(resource)
    }

    async fn update(&self, resource: R) -> Result<Option<R>, StoreError> {
        let mut resources = self.resources();

        match resources.iter_mut().find(|r| r.id() == resource.id()) {
            Some(existing) => {
                *existing = resource.clone();
                Ok(Some(resource))
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let mut resources = self.resources();

        match resources.iter().position(|r| r.id() == id) {
            Some(index) => {
                resources.swap_remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(&self) -> Result<Vec<R>, StoreError> {
        Ok(self.resources().clone())
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: String,
        text: String,
    }

    impl Resource for Note {
        const KIND: &'static str = "Note";

        fn id(&self) -> &str {
            &self.id
        }
    }

    fn note(id: &str, text: &str) -> Note {
        Note {
            id: id.into(),
            text: text.into(),
        }
    }

    #[tokio::test]
    async fn insert_and_find() {
        let store = MemoryStore::default();
        store.insert(note("1", "hello")).await.unwrap();

        assert_eq!(store.find("1").await.unwrap(), Some(note("1", "hello")));
        assert_eq!(store.find("2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn reject_duplicate_ids() {
        let store = MemoryStore::with_resources(vec![note("1", "hello")]);

        assert_eq!(
            store.insert(note("1", "again")).await,
            Err(StoreError::DuplicateId("1".into()))
        );
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_existing_only() {
        let store = MemoryStore::with_resources(vec![note("1", "hello")]);

        assert_eq!(
            store.update(note("1", "changed")).await.unwrap(),
            Some(note("1", "changed"))
        );
        assert_eq!(store.update(note("2", "missing")).await.unwrap(), None);
        assert_eq!(store.find("1").await.unwrap().unwrap().text, "changed");
    }

    #[tokio::test]
    async fn remove_resources() {
        let store = MemoryStore::with_resources(vec![note("1", "a"), note("2", "b")]);

        assert!(store.remove("1").await.unwrap());
        assert!(!store.remove("1").await.unwrap());
        assert_eq!(store.list().await.unwrap(), vec![note("2", "b")]);
    }
}
