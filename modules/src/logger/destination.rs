use async_trait::async_trait;
use library::logging::LogRecord;
use library::storage::{DocumentIndex, RotatingFileArchive};
use library::{BoxedError, EmptyResult};
use mongodb::bson::{to_document, Document};
use mongodb::Collection;
use serde_json::Value;

/// Durable storage for aggregated [`LogRecords`](LogRecord)
#[async_trait]
pub trait LogDestination: Send + Sync {
    /// Short name used in log messages
    fn name(&self) -> &str;

    /// Persists a record
    async fn write(&self, record: &LogRecord) -> EmptyResult;
}

#[async_trait]
impl LogDestination for RotatingFileArchive {
    fn name(&self) -> &str {
        "archive"
    }

    async fn write(&self, record: &LogRecord) -> EmptyResult {
        let line = serde_json::to_string(record)?;
        self.append(&line).await?;
        Ok(())
    }
}

/// Adapter which writes records into a [`DocumentIndex`]
pub struct IndexDestination<I>(pub I);

#[async_trait]
impl<I> LogDestination for IndexDestination<I>
where
    I: DocumentIndex + Send + Sync,
{
    fn name(&self) -> &str {
        self.0.name()
    }

    async fn write(&self, record: &LogRecord) -> EmptyResult {
        let document = serde_json::to_value(record)?;
        self.0.insert(&document).await
    }
}

/// [`DocumentIndex`] backed by a MongoDB collection
pub struct MongoIndex {
    name: String,
    collection: Collection<Document>,
}

impl MongoIndex {
    /// Creates a new instance writing to the given collection
    pub fn new(name: impl Into<String>, collection: Collection<Document>) -> Self {
        Self {
            name: name.into(),
            collection,
        }
    }
}

#[async_trait]
impl DocumentIndex for MongoIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert(&self, document: &Value) -> Result<(), BoxedError> {
        let document = to_document(document)?;
        self.collection.insert_one(document, None).await?;
        Ok(())
    }
}
