use crate::communication::BlackboxError;
use crate::BoxedError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Category of an [`RpcFault`]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FaultKind {
    /// Requested resource does not exist
    NotFound,
    /// Method (or contract) is not served by the peer
    MethodNotFound,
    /// Request body does not match the method's request type
    InvalidRequest,
    /// Handler failed for any other reason
    Application,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FaultKind::NotFound => "not found",
            FaultKind::MethodNotFound => "method not found",
            FaultKind::InvalidRequest => "invalid request",
            FaultKind::Application => "application error",
        };

        f.write_str(text)
    }
}

/// Application level failure sent back to the caller
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {error}")]
pub struct RpcFault {
    /// Category of the failure
    pub kind: FaultKind,
    /// Cause chain
    #[serde(flatten)]
    pub error: BlackboxError,
}

impl RpcFault {
    /// Creates a new instance from raw parts
    pub fn new(kind: FaultKind, error: BlackboxError) -> Self {
        Self { kind, error }
    }

    /// Resource lookup failed, the message is shown to the caller as is
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(FaultKind::NotFound, BlackboxError::from_message(message))
    }

    /// Method is not registered
    pub fn method_not_found(contract: &str, method: &str) -> Self {
        Self::new(
            FaultKind::MethodNotFound,
            BlackboxError::from_message(format!("{}/{} is not served", contract, method)),
        )
    }

    /// Request could not be parsed
    pub fn invalid_request<E: std::error::Error + 'static>(error: E) -> Self {
        Self::new(FaultKind::InvalidRequest, BlackboxError::new(error))
    }

    /// Any other handler failure
    pub fn application(error: BoxedError) -> Self {
        Self::new(FaultKind::Application, BlackboxError::from_boxed(error))
    }
}

impl From<BoxedError> for RpcFault {
    fn from(error: BoxedError) -> Self {
        Self::application(error)
    }
}

/// Errors observed by the caller of a remote method
#[derive(Debug, Error)]
pub enum RpcError {
    /// Peer could not be reached or the connection broke
    #[error("unable to reach {endpoint}")]
    Transport {
        /// Address of the peer
        endpoint: String,
        /// Underlying error
        #[source]
        source: BoxedError,
    },
    /// Peer did not reply in time
    #[error("call to {endpoint} timed out")]
    Timeout {
        /// Address of the peer
        endpoint: String,
    },
    /// Reply could not be understood
    #[error("peer sent an invalid reply")]
    InvalidResponse(#[source] BoxedError),
    /// Requested resource does not exist
    #[error("not found: {0}")]
    NotFound(BlackboxError),
    /// Method or contract is not served by the peer
    #[error("method not found: {0}")]
    MethodNotFound(BlackboxError),
    /// Peer rejected the request body
    #[error("request rejected by peer")]
    InvalidRequest(#[source] BlackboxError),
    /// Handler of the peer failed
    #[error("remote handler failed")]
    Application(#[source] BlackboxError),
}

impl RpcError {
    /// Whether the error was caused by the transport rather than the peer's application logic
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            RpcError::Transport { .. } | RpcError::Timeout { .. } | RpcError::InvalidResponse(_)
        )
    }
}

impl From<RpcFault> for RpcError {
    fn from(fault: RpcFault) -> Self {
        match fault.kind {
            FaultKind::NotFound => RpcError::NotFound(fault.error),
            FaultKind::MethodNotFound => RpcError::MethodNotFound(fault.error),
            FaultKind::InvalidRequest => RpcError::InvalidRequest(fault.error),
            FaultKind::Application => RpcError::Application(fault.error),
        }
    }
}

impl From<RpcError> for RpcFault {
    /// Faults of a peer are passed on as they are, transport failures become application faults
    fn from(error: RpcError) -> Self {
        match error {
            RpcError::NotFound(e) => RpcFault::new(FaultKind::NotFound, e),
            RpcError::MethodNotFound(e) => RpcFault::new(FaultKind::MethodNotFound, e),
            RpcError::InvalidRequest(e) => RpcFault::new(FaultKind::InvalidRequest, e),
            RpcError::Application(e) => RpcFault::new(FaultKind::Application, e),
            transport => RpcFault::application(transport.into()),
        }
    }
}
