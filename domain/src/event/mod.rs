//! Domain specific [`Notification`](library::communication::event::Notification) structures

mod user_created;

pub use library::logging::LogRecord;
pub use user_created::*;

use library::communication::event::ConsumerGroupIdentifier;

/// Consumer group of the product service
pub const PRODUCT_GROUP: &str = "product-group";

/// Consumer group of the log aggregator
pub const LOGGER_GROUP: &str = "logger-group";

/// Group identifier of the product service
pub fn product_group() -> ConsumerGroupIdentifier {
    ConsumerGroupIdentifier::new(PRODUCT_GROUP)
}

/// Group identifier of the log aggregator
pub fn logger_group() -> ConsumerGroupIdentifier {
    ConsumerGroupIdentifier::new(LOGGER_GROUP)
}
