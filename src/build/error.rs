//! Errors surfaced by the image build pipeline.

use std::time::Duration;

use thiserror::Error;

use super::provision::ProvisionError;
use crate::poller::WaitError;
use crate::softlayer::SoftLayerError;
use crate::ssh_key::SshKeyError;

/// Terminal error of an image build.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum BuildError {
    /// Raised when a SoftLayer call fails.
    #[error("{action}: {source}")]
    Remote {
        /// What the pipeline was doing.
        action: String,
        /// Underlying client error.
        #[source]
        source: SoftLayerError,
    },
    /// Raised when a readiness wait exceeds its deadline.
    #[error("{action}: timed out after {waited:?} waiting for {resource_id}")]
    Timeout {
        /// What the pipeline was waiting for.
        action: String,
        /// Resource being polled.
        resource_id: String,
        /// Deadline that elapsed.
        waited: Duration,
    },
    /// Raised when a readiness wait stops without a verdict.
    #[error("{action}: {message}")]
    Interrupted {
        /// What the pipeline was waiting for.
        action: String,
        /// Description of the interruption.
        message: String,
    },
    /// Raised when SoftLayer answers with a payload the pipeline cannot use.
    #[error("{action}: {detail}")]
    UnexpectedResponse {
        /// What the pipeline was doing.
        action: String,
        /// Description of what was wrong.
        detail: String,
    },
    /// Raised when SSH key material cannot be produced or read.
    #[error("error preparing SSH key: {0}")]
    SshKey(String),
    /// Raised when a standard capture cannot be resolved to an image.
    #[error("no image found with name '{name}'")]
    ImageNotFound {
        /// Configured image name.
        name: String,
    },
    /// Raised when the caller's provisioner rejects the guest.
    #[error("error provisioning instance: {0}")]
    Provision(#[from] ProvisionError),
    /// Raised when a step reads a value an earlier step should have stored.
    #[error("pipeline state is missing {0}")]
    MissingState(&'static str),
}

impl From<SshKeyError> for BuildError {
    fn from(value: SshKeyError) -> Self {
        Self::SshKey(value.to_string())
    }
}

impl BuildError {
    /// Classifies a client error raised while performing `action`.
    #[must_use]
    pub fn remote(action: &str, error: SoftLayerError) -> Self {
        match error {
            SoftLayerError::ImageNotFound { name } => Self::ImageNotFound { name },
            SoftLayerError::UnexpectedResponse { operation, detail } => Self::UnexpectedResponse {
                action: action.to_owned(),
                detail: format!("{operation}: {detail}"),
            },
            other => Self::Remote {
                action: action.to_owned(),
                source: other,
            },
        }
    }

    /// Classifies a readiness wait failure raised while performing `action`.
    #[must_use]
    pub fn wait(action: &str, error: WaitError<SoftLayerError>) -> Self {
        match error {
            WaitError::Timeout {
                resource_id,
                waited,
            } => Self::Timeout {
                action: action.to_owned(),
                resource_id,
                waited,
            },
            WaitError::Query { error, .. } => Self::remote(action, error),
            WaitError::Interrupted { message, .. } => Self::Interrupted {
                action: action.to_owned(),
                message,
            },
        }
    }
}

/// Failure of a compensating action.
///
/// Cleanup errors are reported to the operator and collected; they never
/// replace the error that halted the pipeline.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("{step}: {message}{}", .hint.as_deref().map(|hint| format!(". {hint}")).unwrap_or_default())]
pub struct CleanupError {
    /// Step whose cleanup failed.
    pub step: &'static str,
    /// What went wrong.
    pub message: String,
    /// Remediation for the orphaned resource.
    pub hint: Option<String>,
}

impl CleanupError {
    /// Creates a cleanup error with a remediation hint.
    #[must_use]
    pub fn with_hint(
        step: &'static str,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self {
            step,
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Creates a cleanup error without a remediation hint.
    #[must_use]
    pub fn new(step: &'static str, message: impl Into<String>) -> Self {
        Self {
            step,
            message: message.into(),
            hint: None,
        }
    }
}
