use async_trait::async_trait;
use chrono::Utc;
use domain::event::UserCreatedNotification;
use domain::resource::{Product, ResourceStore};
use harness::Service;
use library::communication::event::{Consumer, NotificationFrame};
use library::communication::CommunicationFactory;
use library::EmptyResult;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Creates the products listed in [`UserCreatedNotification`]s
///
/// Product identifiers are derived from the user and the position in the list, products that
/// already exist are left untouched. Processing the same notification twice is thus harmless.
pub struct UserCreatedConsumer {
    store: Arc<dyn ResourceStore<Product>>,
}

impl<F> Service<F> for UserCreatedConsumer
where
    F: CommunicationFactory + Send + Sync,
{
    const NAME: &'static str = "UserCreatedConsumer";

    type Instance = UserCreatedConsumer;
    type Config = Arc<dyn ResourceStore<Product>>;

    fn instantiate(_factory: F, store: &Self::Config) -> Self::Instance {
        Self {
            store: store.clone(),
        }
    }
}

#[async_trait]
impl Consumer for UserCreatedConsumer {
    type Notification = UserCreatedNotification;

    async fn consume(&self, notification: NotificationFrame<Self::Notification>) -> EmptyResult {
        // Notifications without a user are keyed by their publication time to stay replay-safe
        let origin = match &notification.user_id {
            Some(user_id) => user_id.clone(),
            None => notification.publication_time().to_rfc3339(),
        };

        debug!(user = %origin, products = notification.products().len(), "User created");

        let now = Utc::now();
        let mut created = 0;

        for (index, data) in notification.products().iter().enumerate() {
            let product = Product::for_user(&origin, index, data.clone(), now);

            if self.store.find(&product.id).await?.is_some() {
                trace!(id = %product.id, "Product already exists");
                continue;
            }

            self.store.insert(product).await?;
            created += 1;
        }

        if created > 0 {
            info!(user = %origin, created, "Created products for user");
        }

        Ok(())
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use domain::resource::{CreateProductData, MemoryStore};
    use pretty_assertions::assert_eq;

    fn notification(
        user_id: Option<&str>,
        names: &[&str],
    ) -> NotificationFrame<UserCreatedNotification> {
        let products = names
            .iter()
            .map(|name| CreateProductData {
                name: name.to_string(),
                description: "".into(),
                price: 9.99,
                stock: 1,
            })
            .collect();

        NotificationFrame::new(UserCreatedNotification {
            user_id: user_id.map(String::from),
            products: Some(products),
        })
    }

    fn consumer() -> (UserCreatedConsumer, Arc<MemoryStore<Product>>) {
        let store = Arc::new(MemoryStore::default());
        let consumer = UserCreatedConsumer {
            store: store.clone(),
        };

        (consumer, store)
    }

    #[tokio::test]
    async fn create_listed_products() {
        let (consumer, store) = consumer();

        consumer
            .consume(notification(Some("7"), &["Mouse", "Keyboard"]))
            .await
            .unwrap();

        let mut names: Vec<_> = store.list().await.unwrap().into_iter().map(|p| p.name).collect();
        names.sort();

        assert_eq!(names, vec!["Keyboard", "Mouse"]);
    }

    #[tokio::test]
    async fn ignore_replayed_notifications() {
        let (consumer, store) = consumer();
        let frame = notification(Some("7"), &["Mouse", "Mouse"]);

        consumer.consume(frame.clone()).await.unwrap();
        let first = store.list().await.unwrap();

        consumer.consume(frame).await.unwrap();
        let second = store.list().await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn tolerate_missing_products() {
        let (consumer, store) = consumer();

        consumer
            .consume(NotificationFrame::new(UserCreatedNotification::default()))
            .await
            .unwrap();

        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn handle_anonymous_notifications() {
        let (consumer, store) = consumer();
        let frame = notification(None, &["Cable"]);

        consumer.consume(frame.clone()).await.unwrap();
        consumer.consume(frame).await.unwrap();

        assert_eq!(store.list().await.unwrap().len(), 1);
    }
}
