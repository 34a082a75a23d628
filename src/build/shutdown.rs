//! Hook run after capture; SoftLayer needs no explicit shutdown.

use tracing::debug;

use crate::context::BuildContext;
use crate::step::{Step, StepAction, StepFuture};

/// No-op final step.
#[derive(Debug, Default)]
pub struct Shutdown;

impl Shutdown {
    /// Step identifier.
    pub const NAME: &'static str = "shutdown";
}

impl Step<BuildContext> for Shutdown {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn run<'a>(&'a mut self, _state: &'a mut BuildContext) -> StepFuture<'a, StepAction> {
        Box::pin(async {
            debug!("guest is destroyed during cleanup, nothing to shut down");
            StepAction::Continue
        })
    }

    fn cleanup<'a>(&'a mut self, _state: &'a mut BuildContext) -> StepFuture<'a, ()> {
        Box::pin(async {})
    }
}
