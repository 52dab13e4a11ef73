use super::DEFAULT_SERVICE_NAME;
use crate::communication::event::{Notification, QueueDescriptor};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::Level;

/// Name of the queue on which log records are distributed
pub const LOG_QUEUE: &str = "microservices-logs";

/// Severity of a [`LogRecord`]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Failures which require attention
    Error,
    /// Unexpected but recoverable conditions
    Warn,
    /// Regular operational messages
    Info,
    /// Diagnostic details
    Debug,
    /// Everything else
    Verbose,
}

impl LogLevel {
    /// Emits a message at this level through [`tracing`]
    pub fn log(&self, message: &str) {
        match self {
            LogLevel::Error => tracing::error!("{}", message),
            LogLevel::Warn => tracing::warn!("{}", message),
            LogLevel::Info => tracing::info!("{}", message),
            LogLevel::Debug => tracing::debug!("{}", message),
            LogLevel::Verbose => tracing::trace!("{}", message),
        }
    }
}

impl From<&Level> for LogLevel {
    fn from(level: &Level) -> Self {
        if *level == Level::ERROR {
            LogLevel::Error
        } else if *level == Level::WARN {
            LogLevel::Warn
        } else if *level == Level::INFO {
            LogLevel::Info
        } else if *level == Level::DEBUG {
            LogLevel::Debug
        } else {
            LogLevel::Verbose
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Verbose => "verbose",
        };

        f.write_str(name)
    }
}

/// Writes a message at the given level
///
/// The message lands on the console and, if a [`LogForwardingLayer`](super::LogForwardingLayer)
/// is installed, is published to the log queue. This function never fails.
pub fn log(level: LogLevel, message: &str) {
    level.log(message);
}

/// Structured log event as it is distributed to aggregators
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// Severity
    pub level: LogLevel,
    /// Human readable content
    pub message: String,
    /// ISO-8601 time of creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Name of the service which emitted the record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
}

impl LogRecord {
    /// Creates a new record without origin information
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: None,
            service_name: None,
        }
    }

    /// Fills missing origin information
    ///
    /// Values which are already present are kept. An empty fallback service name is replaced
    /// by [`DEFAULT_SERVICE_NAME`].
    pub fn enrich(mut self, fallback_service_name: &str, now: DateTime<Utc>) -> Self {
        if self.timestamp.is_none() {
            self.timestamp = Some(format_timestamp(now));
        }

        if self.service_name.is_none() {
            let name = if fallback_service_name.is_empty() {
                DEFAULT_SERVICE_NAME
            } else {
                fallback_service_name
            };

            self.service_name = Some(name.to_owned());
        }

        self
    }

    /// Service name or the default if unset
    pub fn service_name(&self) -> &str {
        self.service_name.as_deref().unwrap_or(DEFAULT_SERVICE_NAME)
    }
}

impl Notification for LogRecord {
    fn queue() -> QueueDescriptor {
        QueueDescriptor::new(LOG_QUEUE.into(), 100_000)
    }
}

/// Formats a timestamp the way it is stored in log records
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod does {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn fill_missing_origin() {
        let now = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap() + Duration::milliseconds(89);
        let record = LogRecord::new(LogLevel::Info, "hello").enrich("user-service", now);

        assert_eq!(record.timestamp.as_deref(), Some("2021-03-04T05:06:07.089Z"));
        assert_eq!(record.service_name(), "user-service");
    }

    #[test]
    fn keep_existing_origin() {
        let mut record = LogRecord::new(LogLevel::Warn, "hello");
        record.timestamp = Some("yesterday".into());
        record.service_name = Some("product-service".into());

        let record = record.enrich("user-service", Utc::now());

        assert_eq!(record.timestamp.as_deref(), Some("yesterday"));
        assert_eq!(record.service_name(), "product-service");
    }

    #[test]
    fn fall_back_to_default_service() {
        let record = LogRecord::new(LogLevel::Debug, "hello").enrich("", Utc::now());
        assert_eq!(record.service_name(), DEFAULT_SERVICE_NAME);
        assert_eq!(LogRecord::new(LogLevel::Debug, "x").service_name(), DEFAULT_SERVICE_NAME);
    }

    #[test]
    fn serialize_in_wire_format() {
        let mut record = LogRecord::new(LogLevel::Verbose, "details");
        record.service_name = Some("user-service".into());

        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({ "level": "verbose", "message": "details", "serviceName": "user-service" })
        );
    }

    #[test]
    fn reject_unknown_levels() {
        let result =
            serde_json::from_value::<LogRecord>(json!({ "level": "fatal", "message": "x" }));
        assert!(result.is_err());
    }

    #[test]
    fn map_tracing_levels() {
        assert_eq!(LogLevel::from(&Level::ERROR), LogLevel::Error);
        assert_eq!(LogLevel::from(&Level::INFO), LogLevel::Info);
        assert_eq!(LogLevel::from(&Level::TRACE), LogLevel::Verbose);
    }
}
