//! Hands the ready guest to a caller-supplied provisioner before capture.
//!
//! The crate does not speak SSH itself. A [`Provisioner`] receives an
//! [`SshTarget`] with the address, login and private key for the guest and
//! customises it however it likes; the image is captured once it returns.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::context::BuildContext;
use crate::step::{Step, StepAction, StepFuture};
use crate::ui::Ui;

use super::BuildError;

/// Connection details for the build guest.
#[derive(Clone, Eq, PartialEq)]
pub struct SshTarget {
    /// Address the guest is reachable at.
    pub host: IpAddr,
    /// SSH port on the guest.
    pub port: u16,
    /// Login user.
    pub username: String,
    private_key: String,
}

impl SshTarget {
    /// Bundles the connection details for one guest.
    #[must_use]
    pub const fn new(host: IpAddr, port: u16, username: String, private_key: String) -> Self {
        Self {
            host,
            port,
            username,
            private_key,
        }
    }

    /// Socket address to connect to.
    #[must_use]
    pub const fn address(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// PKCS#8 PEM private key accepted by the guest.
    #[must_use]
    pub fn private_key(&self) -> &str {
        &self.private_key
    }
}

impl std::fmt::Debug for SshTarget {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SshTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Failure reported by a [`Provisioner`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("{message}")]
pub struct ProvisionError {
    /// What went wrong on the guest.
    pub message: String,
}

impl ProvisionError {
    /// Wraps a provisioner failure message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Customises the running guest before it is captured.
pub trait Provisioner: Send + Sync {
    /// Provisions the guest reachable through `target`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError`] to halt the build; the guest and key are
    /// still torn down.
    fn provision<'a>(
        &'a self,
        target: &'a SshTarget,
        ui: &'a dyn Ui,
    ) -> StepFuture<'a, Result<(), ProvisionError>>;
}

/// Pipeline step running the caller's [`Provisioner`], if any.
#[derive(Clone, Default)]
pub struct Provision {
    provisioner: Option<Arc<dyn Provisioner>>,
}

impl std::fmt::Debug for Provision {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Provision")
            .field("configured", &self.provisioner.is_some())
            .finish()
    }
}

impl Provision {
    /// Step identifier.
    pub const NAME: &'static str = "provision";

    /// Creates the step around an optional provisioner.
    #[must_use]
    pub const fn new(provisioner: Option<Arc<dyn Provisioner>>) -> Self {
        Self { provisioner }
    }

    async fn execute(&self, ctx: &BuildContext) -> Result<(), BuildError> {
        let Some(provisioner) = self.provisioner.as_ref() else {
            debug!("no provisioner configured, capturing the guest as booted");
            return Ok(());
        };

        let target = ctx.ssh_target()?;
        ctx.ui().say(&format!("Provisioning instance at {}...", target.address()));
        provisioner.provision(&target, ctx.ui()).await?;
        Ok(())
    }
}

impl Step<BuildContext> for Provision {
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

    fn cleanup<'a>(&'a mut self, _state: &'a mut BuildContext) -> StepFuture<'a, ()> {
        Box::pin(async {})
    }
}
