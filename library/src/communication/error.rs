use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{self, Display, Formatter};

use crate::BoxedError;

/// Type erased, serializable error which retains the error chain information
///
/// Remote calls use it to carry handler failures across the wire. The caller does not know
/// the concrete error types of its peer but can still display every cause of the chain and
/// embed it into its own errors.
///
/// When the error it is created from contains another BlackboxError in its source chain,
/// the nested causes are integrated so that the chain stays flat.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BlackboxError {
    causes: Vec<String>,
}

impl BlackboxError {
    /// Creates a new instance from any error type
    pub fn new<E: Error + 'static>(e: E) -> Self {
        (&e as &(dyn Error + 'static)).into()
    }

    /// Creates a new instance from a boxed error type
    pub fn from_boxed(e: BoxedError) -> Self {
        (e.as_ref() as &(dyn Error + 'static)).into()
    }

    /// Creates an instance with a single cause
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            causes: vec![message.into()],
        }
    }

    /// Outermost cause, usually the most descriptive one for end users
    pub fn message(&self) -> Option<&str> {
        self.causes.first().map(String::as_str)
    }

    /// All causes, starting with the outermost one
    pub fn causes(&self) -> &[String] {
        &self.causes
    }
}

impl Error for BlackboxError {}

impl Display for BlackboxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.causes.is_empty() {
            return write!(f, "unknown error");
        }

        write!(f, "{}", self.causes.join(": "))
    }
}

impl From<&(dyn Error + 'static)> for BlackboxError {
    fn from(e: &(dyn Error + 'static)) -> Self {
        let mut source: Option<&(dyn Error + 'static)> = Some(e);
        let mut causes: Vec<String> = Vec::new();

        while let Some(error) = source {
            if let Some(blackbox_error) = error.downcast_ref::<BlackboxError>() {
                causes.extend(blackbox_error.causes.iter().cloned());
            } else {
                causes.push(error.to_string());
            }

            source = error.source();
        }

        Self { causes }
    }
}
