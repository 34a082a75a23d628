//! Waits for the build guest to become usable and records its addresses.

use tracing::debug;

use crate::context::BuildContext;
use crate::poller::WaitError;
use crate::softlayer::{InstanceStatus, SoftLayerError, Transaction};
use crate::step::{Step, StepAction, StepFuture};

use super::BuildError;

/// Polls until the guest is running with no transaction in flight.
pub(super) async fn wait_until_ready(
    ctx: &BuildContext,
    instance_id: &str,
) -> Result<InstanceStatus, WaitError<SoftLayerError>> {
    let client = ctx.client().clone();
    let id = instance_id.to_owned();
    ctx.poller()
        .wait(
            instance_id,
            ctx.config().state_timeout,
            move || {
                let query_client = client.clone();
                let query_id = id.clone();
                async move { query_client.instance_status(&query_id).await }
            },
            InstanceStatus::is_ready,
        )
        .await
}

/// Polls until the guest has no transaction in flight.
///
/// SoftLayer rejects captures and cancellations while a transaction runs.
pub(super) async fn wait_until_quiescent(
    ctx: &BuildContext,
    instance_id: &str,
) -> Result<(), WaitError<SoftLayerError>> {
    let client = ctx.client().clone();
    let id = instance_id.to_owned();
    ctx.poller()
        .wait(
            instance_id,
            ctx.config().state_timeout,
            move || {
                let query_client = client.clone();
                let query_id = id.clone();
                async move { query_client.active_transaction(&query_id).await }
            },
            Option::<Transaction>::is_none,
        )
        .await
        .map(|_| ())
}

/// Pipeline step waiting for the guest to finish provisioning.
#[derive(Debug, Default)]
pub struct WaitForInstance;

impl WaitForInstance {
    /// Step identifier.
    pub const NAME: &'static str = "wait-for-instance";

    async fn execute(ctx: &mut BuildContext) -> Result<(), BuildError> {
        let instance_id = ctx.instance()?.global_identifier.clone();

        ctx.ui().say("Waiting for the instance to become ACTIVE...");
        let status = wait_until_ready(ctx, &instance_id)
            .await
            .map_err(|err| BuildError::wait("error waiting for instance to become ACTIVE", err))?;
        debug!(instance = %instance_id, status = ?status, "instance is ready");

        let client = ctx.client().clone();
        let public = if ctx.config().private_network_only {
            None
        } else {
            client
                .primary_public_address(&instance_id)
                .await
                .map_err(|err| BuildError::remote("error fetching public address", err))?
        };
        let private = client
            .primary_private_address(&instance_id)
            .await
            .map_err(|err| BuildError::remote("error fetching private address", err))?;
        ctx.set_addresses(public, private);

        if let Some(host) = ctx.ssh_host() {
            ctx.ui().say(&format!("Instance is ACTIVE and reachable at {host}"));
        } else {
            ctx.ui().say("Instance is ACTIVE");
        }
        Ok(())
    }
}

impl Step<BuildContext> for WaitForInstance {
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
