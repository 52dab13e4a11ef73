use crate::BoxedError;
use async_trait::async_trait;
use serde_json::Value;

/// Append-only collection of JSON documents which can be searched by text
#[async_trait]
pub trait DocumentIndex {
    /// Name of the index documents are written to
    fn name(&self) -> &str;

    /// Adds a document to the index
    async fn insert(&self, document: &Value) -> Result<(), BoxedError>;
}

#[cfg(any(test, feature = "test"))]
mod memory {
    use super::*;
    use std::sync::Mutex;

    /// In-process [`DocumentIndex`] with a naive substring search
    pub struct MemoryIndex {
        name: String,
        documents: Mutex<Vec<Value>>,
        failing: bool,
    }

    impl MemoryIndex {
        /// Creates a new, empty index
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                documents: Mutex::new(Vec::new()),
                failing: false,
            }
        }

        /// Creates an index which rejects every insertion
        pub fn failing(name: impl Into<String>) -> Self {
            Self {
                failing: true,
                ..Self::new(name)
            }
        }

        /// All documents inserted so far
        pub fn documents(&self) -> Vec<Value> {
            self.documents.lock().unwrap().clone()
        }

        /// Documents whose string field contains the query
        pub fn search(&self, field: &str, query: &str) -> Vec<Value> {
            self.documents()
                .into_iter()
                .filter(|document| {
                    document
                        .get(field)
                        .and_then(Value::as_str)
                        .map(|text| text.contains(query))
                        .unwrap_or(false)
                })
                .collect()
        }
    }

    #[async_trait]
    impl DocumentIndex for MemoryIndex {
        fn name(&self) -> &str {
            &self.name
        }

        async fn insert(&self, document: &Value) -> Result<(), BoxedError> {
            if self.failing {
                return Err(format!("index {} is unavailable", self.name).into());
            }

            self.documents.lock().unwrap().push(document.clone());
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test"))]
pub use memory::MemoryIndex;
