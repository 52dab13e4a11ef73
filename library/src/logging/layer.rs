use super::forwarder::is_forwarding;
use super::{LogLevel, LogRecord, LOCAL_ONLY_TARGET};
use chrono::Utc;
use std::fmt;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Targets whose events stay local
///
/// These crates are used while publishing records, forwarding their output would cause every
/// published record to produce further records.
const LOCAL_TARGET_PREFIXES: [&str; 6] = ["redis", "hyper", "warp", "mongodb", "h2", "tokio"];

/// Receiving end of a [`LogForwardingLayer`]
pub type LogRecordReceiver = UnboundedReceiver<LogRecord>;

/// [`Layer`] which captures events as [`LogRecords`](LogRecord)
///
/// Captured records are enriched with the service name and the current time and passed on to
/// a channel, usually drained by a [`LogForwarderJob`](super::LogForwarderJob). Capturing never
/// blocks and silently stops once the receiving end is dropped.
pub struct LogForwardingLayer {
    service_name: String,
    sender: UnboundedSender<LogRecord>,
}

impl LogForwardingLayer {
    /// Creates a new layer and the receiver for its records
    pub fn new(service_name: impl Into<String>) -> (Self, LogRecordReceiver) {
        let (sender, receiver) = unbounded_channel();

        let layer = Self {
            service_name: service_name.into(),
            sender,
        };

        (layer, receiver)
    }

    fn forwards(target: &str) -> bool {
        target != LOCAL_ONLY_TARGET
            && !LOCAL_TARGET_PREFIXES
                .iter()
                .any(|prefix| target.starts_with(prefix))
    }
}

impl<S: Subscriber> Layer<S> for LogForwardingLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        if !Self::forwards(metadata.target()) || is_forwarding() {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let record = LogRecord::new(LogLevel::from(metadata.level()), visitor.finish())
            .enrich(&self.service_name, Utc::now());

        // A closed channel means forwarding has been shut down
        self.sender.send(record).ok();
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields.join(" ")
        } else {
            format!("{} {}", self.message, self.fields.join(" "))
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_owned();
        } else if !field.name().starts_with("log.") {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else if !field.name().starts_with("log.") {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}
