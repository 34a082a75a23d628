//! Block device inspection and image capture.

use serde_json::Value;

use super::types::{BlockDevice, FlexImageRequest, IdRef, ImageTemplate};
use super::{SoftLayerClient, SoftLayerError};

/// Disk image name marker for swap devices.
pub const SWAP_MARKER: &str = "SWAP";

/// Disk image name marker for metadata devices.
pub const METADATA_MARKER: &str = "METADATA";

const BLOCK_DEVICE_MASK: &str = "objectMask=mask.diskImage.name";

/// Selects the devices a standard capture should include.
///
/// Swap and metadata devices are skipped; every other device is kept in its
/// original order.
#[must_use]
pub fn capturable_block_devices(devices: &[BlockDevice]) -> Vec<&BlockDevice> {
    devices
        .iter()
        .filter(|device| {
            let name = device.disk_image_name();
            !name.contains(SWAP_MARKER) && !name.contains(METADATA_MARKER)
        })
        .collect()
}

/// Picks the global identifier of the first template named `name`.
///
/// Templates without a (non-empty) global identifier are ignored.
#[must_use]
pub fn select_image_id(templates: &[ImageTemplate], name: &str) -> Option<String> {
    templates
        .iter()
        .filter(|template| template.name == name)
        .find_map(|template| {
            template
                .global_identifier
                .as_deref()
                .filter(|id| !id.is_empty())
                .map(str::to_owned)
        })
}

impl SoftLayerClient {
    /// Lists the guest's block devices including their disk image names.
    ///
    /// # Errors
    ///
    /// Returns [`SoftLayerError`] when the query fails.
    pub async fn block_devices(
        &self,
        instance_id: &str,
    ) -> Result<Vec<BlockDevice>, SoftLayerError> {
        let path = format!(
            "SoftLayer_Virtual_Guest/{instance_id}/getBlockDevices.json?{BLOCK_DEVICE_MASK}"
        );
        self.get("get block devices", &path).await
    }

    /// Captures the whole guest as a flex image and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SoftLayerError`] when the capture is rejected or the reply
    /// carries no global identifier.
    pub async fn capture_flex_image(
        &self,
        instance_id: &str,
        name: &str,
        description: &str,
    ) -> Result<String, SoftLayerError> {
        let operation = "capture flex image";
        let path = format!("SoftLayer_Virtual_Guest/{instance_id}/captureImage.json");
        let request = FlexImageRequest {
            name: name.to_owned(),
            description: description.to_owned(),
            summary: description.to_owned(),
        };
        let template: ImageTemplate = self.post(operation, &path, (request,)).await?;
        template
            .global_identifier
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SoftLayerError::unexpected(operation, "missing globalIdentifier"))
    }

    /// Starts a standard capture of the given block devices.
    ///
    /// SoftLayer does not return the new template's identifier; resolve it with
    /// [`find_image_id_by_name`](Self::find_image_id_by_name) once the guest is
    /// quiescent again.
    ///
    /// # Errors
    ///
    /// Returns [`SoftLayerError`] when the capture is rejected.
    pub async fn capture_standard_image(
        &self,
        instance_id: &str,
        name: &str,
        description: &str,
        block_device_ids: &[u64],
    ) -> Result<(), SoftLayerError> {
        let path = format!("SoftLayer_Virtual_Guest/{instance_id}/createArchiveTransaction.json");
        let devices: Vec<IdRef> = block_device_ids.iter().map(|&id| IdRef { id }).collect();
        let _transaction: Value = self
            .post("capture standard image", &path, (name, devices, description))
            .await?;
        Ok(())
    }

    /// Lists the account's private image templates.
    ///
    /// # Errors
    ///
    /// Returns [`SoftLayerError`] when the query fails.
    pub async fn image_templates(&self) -> Result<Vec<ImageTemplate>, SoftLayerError> {
        self.get(
            "list image templates",
            "SoftLayer_Account/getBlockDeviceTemplateGroups.json",
        )
        .await
    }

    /// Resolves an image template's global identifier from its name.
    ///
    /// # Errors
    ///
    /// Returns [`SoftLayerError::ImageNotFound`] when no template matches, or
    /// the listing error.
    pub async fn find_image_id_by_name(&self, name: &str) -> Result<String, SoftLayerError> {
        let templates = self.image_templates().await?;
        select_image_id(&templates, name).ok_or_else(|| SoftLayerError::ImageNotFound {
            name: name.to_owned(),
        })
    }

    /// Deletes an image template.
    ///
    /// # Errors
    ///
    /// Returns [`SoftLayerError::DestroyRejected`] unless the API answers
    /// `true`, or the provider error (for example when the template is
    /// already gone).
    pub async fn destroy_image(&self, image_id: &str) -> Result<(), SoftLayerError> {
        let path = format!("SoftLayer_Virtual_Guest_Block_Device_Template_Group/{image_id}.json");
        self.delete("image", image_id, &path).await
    }
}
