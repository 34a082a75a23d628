//! Orders the disposable build guest.

use crate::context::BuildContext;
use crate::step::{Step, StepAction, StepFuture};

use super::wait_for_instance::wait_until_quiescent;
use super::{BuildError, CleanupError};

/// Creates the guest and cancels it again during cleanup.
#[derive(Debug, Default)]
pub struct CreateInstance {
    created: Option<String>,
}

impl CreateInstance {
    /// Step identifier.
    pub const NAME: &'static str = "create-instance";

    async fn execute(&mut self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        let spec = ctx.config().instance_spec(ctx.ssh_key_id());

        ctx.ui().say("Creating instance...");
        let record = ctx
            .client()
            .clone()
            .create_instance(&spec)
            .await
            .map_err(|err| BuildError::remote("error creating instance", err))?;

        ctx.ui().say(&format!(
            "Created instance '{}' ({}.{})",
            record.global_identifier, record.hostname, record.domain
        ));
        self.created = Some(record.global_identifier.clone());
        ctx.set_instance(record);
        Ok(())
    }
}

impl Step<BuildContext> for CreateInstance {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn run<'a>(&'a mut self, state: &'a mut BuildContext) -> StepFuture<'a, StepAction> {
        Box::pin(async move {
            match self.execute(state).await {
                Ok(()) => StepAction::Continue,
                Err(err) => state.halt(err),
            }
        })
    }

    fn cleanup<'a>(&'a mut self, state: &'a mut BuildContext) -> StepFuture<'a, ()> {
        Box::pin(async move {
            let Some(instance_id) = self.created.take() else {
                return;
            };

            state.ui().say(
                "Waiting for the instance to have no active transactions before destroying it...",
            );
            if let Err(err) = wait_until_quiescent(state, &instance_id).await {
                state.record_cleanup_error(CleanupError::new(
                    Self::NAME,
                    format!("error waiting for instance to become idle: {err}"),
                ));
            }

            state.ui().say("Destroying instance...");
            let client = state.client().clone();
            if let Err(err) = client.destroy_instance(&instance_id).await {
                state.record_cleanup_error(CleanupError::with_hint(
                    Self::NAME,
                    format!("error destroying instance: {err}"),
                    format!("Please delete the instance ({instance_id}) manually"),
                ));
            }
        })
    }
}
