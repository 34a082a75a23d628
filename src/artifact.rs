//! Handle to a captured image template.

use std::fmt;

use thiserror::Error;

use crate::softlayer::{SoftLayerClient, SoftLayerError};

/// Identifier of the component that produced an [`Artifact`].
pub const BUILDER_ID: &str = "softlayer-imager.softlayer";

/// Errors raised by [`Artifact::destroy`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ArtifactError {
    /// The image template could not be deleted.
    #[error("failed to destroy image {image_id}: {source}")]
    DestroyFailed {
        /// Image that was being deleted.
        image_id: String,
        /// Underlying client error.
        #[source]
        source: SoftLayerError,
    },
}

impl ArtifactError {
    /// Returns `true` when the image no longer exists on SoftLayer.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::DestroyFailed { source, .. } => source.is_not_found(),
        }
    }
}

/// Immutable result of a successful build.
#[derive(Clone, Debug)]
pub struct Artifact {
    image_id: String,
    image_name: String,
    client: SoftLayerClient,
}

impl Artifact {
    /// Wraps an existing image template.
    #[must_use]
    pub const fn new(image_id: String, image_name: String, client: SoftLayerClient) -> Self {
        Self {
            image_id,
            image_name,
            client,
        }
    }

    /// Image template identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.image_id
    }

    /// Image template name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.image_name
    }

    /// Identifier of the producing builder.
    #[must_use]
    pub const fn builder_id(&self) -> &'static str {
        BUILDER_ID
    }

    /// Deletes the image template.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::DestroyFailed`] unless SoftLayer confirms the
    /// deletion, including when the image is already gone.
    pub async fn destroy(&self) -> Result<(), ArtifactError> {
        self.client
            .destroy_image(&self.image_id)
            .await
            .map_err(|source| ArtifactError::DestroyFailed {
                image_id: self.image_id.clone(),
                source,
            })
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "A disk image was created: {} (id: {})",
            self.image_name, self.image_id
        )
    }
}
