//! Error types for the SoftLayer client.

use thiserror::Error;

use super::transport::TransportError;

/// Errors raised by [`SoftLayerClient`](super::SoftLayerClient) operations.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SoftLayerError {
    /// Wrapper for transport and provider-reported failures.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Raised when a response cannot be interpreted as expected.
    #[error("unexpected response from {operation}: {detail}")]
    UnexpectedResponse {
        /// Operation whose response was malformed.
        operation: String,
        /// Description of what was wrong.
        detail: String,
    },
    /// Raised when a delete call is not acknowledged with `true`.
    #[error("failed to destroy {resource} with id '{id}', got '{response}' as response from the API")]
    DestroyRejected {
        /// Kind of resource being deleted.
        resource: String,
        /// Provider identifier of the resource.
        id: String,
        /// Raw acknowledgement returned by the API.
        response: String,
    },
    /// Raised when no image template matches the requested name.
    #[error("no image found with name '{name}'")]
    ImageNotFound {
        /// Image name used for the lookup.
        name: String,
    },
}

impl SoftLayerError {
    pub(super) fn unexpected(operation: &str, detail: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            operation: operation.to_owned(),
            detail: detail.into(),
        }
    }

    /// Returns `true` when SoftLayer reported that the object does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Transport(TransportError::Provider { code: Some(code), .. })
                if code.contains("ObjectNotFound")
        )
    }
}
