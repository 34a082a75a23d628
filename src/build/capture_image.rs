//! Captures the prepared guest as an image template.

use crate::config::ImageType;
use crate::context::BuildContext;
use crate::softlayer::capturable_block_devices;
use crate::step::{Step, StepAction, StepFuture};

use super::BuildError;
use super::wait_for_instance::wait_until_quiescent;

/// Captures a flex or standard image and resolves its identifier.
#[derive(Debug, Default)]
pub struct CaptureImage;

impl CaptureImage {
    /// Step identifier.
    pub const NAME: &'static str = "capture-image";

    async fn execute(ctx: &mut BuildContext) -> Result<(), BuildError> {
        let instance_id = ctx.instance()?.global_identifier.clone();
        let client = ctx.client().clone();
        let name = ctx.config().image_name.clone();
        let description = ctx.config().image_description.clone();

        let captured_id = match ctx.config().image_type {
            ImageType::Flex => {
                ctx.ui().say(&format!("Creating flex image '{name}'..."));
                let id = client
                    .capture_flex_image(&instance_id, &name, &description)
                    .await
                    .map_err(|err| BuildError::remote("error creating flex image", err))?;
                Some(id)
            }
            ImageType::Standard => {
                ctx.ui().say("Getting block devices...");
                let devices = client
                    .block_devices(&instance_id)
                    .await
                    .map_err(|err| BuildError::remote("error getting block devices", err))?;
                for device in &devices {
                    ctx.ui().say(&format!(
                        "Found block device '{}' ({})",
                        device.device,
                        device.disk_image_name()
                    ));
                }
                let device_ids: Vec<u64> = capturable_block_devices(&devices)
                    .into_iter()
                    .map(|device| device.id)
                    .collect();

                ctx.ui().say(&format!("Creating standard image '{name}'..."));
                client
                    .capture_standard_image(&instance_id, &name, &description, &device_ids)
                    .await
                    .map_err(|err| BuildError::remote("error creating standard image", err))?;
                None
            }
        };

        ctx.ui().say("Waiting for the image capture to finish...");
        // Capture may leave the guest powered off; only the transaction queue gates the id.
        wait_until_quiescent(ctx, &instance_id)
            .await
            .map_err(|err| BuildError::wait("error waiting for image capture", err))?;

        let image_id = match captured_id {
            Some(id) => id,
            None => client
                .find_image_id_by_name(&name)
                .await
                .map_err(|err| BuildError::remote("error looking up captured image", err))?,
        };

        ctx.ui()
            .say(&format!("Image '{name}' captured with id '{image_id}'"));
        ctx.set_image_id(image_id);
        Ok(())
    }
}

impl Step<BuildContext> for CaptureImage {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn run<'a>(&'a mut self, state: &'a mut BuildContext) -> StepFuture<'a, StepAction> {
        Box::pin(async move {
            match Self::execute(state).await {
                Ok(()) => StepAction::Continue,
                Err(err) => state.halt(err),
            }
        })
    }

    fn cleanup<'a>(&'a mut self, _state: &'a mut BuildContext) -> StepFuture<'a, ()> {
        Box::pin(async {})
    }
}
