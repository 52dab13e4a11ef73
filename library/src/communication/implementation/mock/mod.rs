//! Expectation based test doubles

mod notification_publisher;

pub use notification_publisher::*;

/// Strictness of a mock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectationMode {
    /// No validity checks of any sort, just a dummy
    Ignore,
    /// Only allows expected items and requires all of them
    ExpectOnlyProvided,
    /// Allows intermittent noise but still requires all expected
    /// items to eventually be published
    AllowNoise,
    /// Rejects every item as if the broker was unreachable
    Fail,
}
