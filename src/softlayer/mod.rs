//! SoftLayer implementation of the remote resource client.
//!
//! [`SoftLayerClient`] is a typed façade over the handful of SoftLayer
//! services the image pipeline needs: SSH keys, virtual guests, block devices
//! and image templates. It carries no orchestration logic; sequencing and
//! cleanup live in the build pipeline.

mod error;
mod image;
mod instance;
mod key;
pub mod transport;
mod types;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use error::SoftLayerError;
pub use image::{METADATA_MARKER, SWAP_MARKER, capturable_block_devices, select_image_id};
pub use instance::sanitize_label;
pub use transport::{
    DEFAULT_API_ENDPOINT, HttpTransport, Method, Transport, TransportError, TransportFuture,
};
pub use types::{
    BlockDevice, BootSource, DiskImage, ImageTemplate, InstanceRecord, InstanceSpec,
    InstanceStatus, PowerState, Transaction, TransactionStatus,
};

use types::Parameters;

/// Typed client for the SoftLayer REST API.
#[derive(Clone)]
pub struct SoftLayerClient {
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for SoftLayerClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SoftLayerClient")
            .finish_non_exhaustive()
    }
}

impl SoftLayerClient {
    /// Creates a client on top of `transport`.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Creates a client that talks to `endpoint` over HTTPS.
    ///
    /// # Errors
    ///
    /// Returns [`SoftLayerError::Transport`] when the HTTP client cannot be
    /// constructed.
    pub fn connect(
        endpoint: &str,
        username: &str,
        api_key: &str,
    ) -> Result<Self, SoftLayerError> {
        let transport = HttpTransport::new(endpoint, username, api_key)?;
        Ok(Self::new(Arc::new(transport)))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
    ) -> Result<T, SoftLayerError> {
        let value = self.transport.call(path, Method::Get, None).await?;
        decode(operation, value)
    }

    async fn post<P: Serialize, T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        parameters: P,
    ) -> Result<T, SoftLayerError> {
        let body = serde_json::to_value(Parameters { parameters }).map_err(|err| {
            SoftLayerError::unexpected(operation, format!("could not encode request: {err}"))
        })?;
        let value = self.transport.call(path, Method::Post, Some(body)).await?;
        decode(operation, value)
    }

    async fn delete(&self, resource: &str, id: &str, path: &str) -> Result<(), SoftLayerError> {
        let value = self.transport.call(path, Method::Delete, None).await?;
        tracing::debug!(resource, id, response = %value, "delete acknowledged");
        if value == Value::Bool(true) {
            return Ok(());
        }
        Err(SoftLayerError::DestroyRejected {
            resource: resource.to_owned(),
            id: id.to_owned(),
            response: value.to_string(),
        })
    }
}

fn decode<T: DeserializeOwned>(operation: &str, value: Value) -> Result<T, SoftLayerError> {
    serde_json::from_value(value)
        .map_err(|err| SoftLayerError::unexpected(operation, err.to_string()))
}
