//! SoftLayer image build pipeline.
//!
//! [`ImageBuilder`] wires a validated [`BuildConfig`], a [`SoftLayerClient`]
//! and a [`Ui`] sink into the fixed step pipeline:
//!
//! 1. [`CreateSshKey`] uploads an ephemeral key (or loads the caller's key);
//! 2. [`CreateInstance`] orders the build guest;
//! 3. [`WaitForInstance`] waits until the guest is running and idle;
//! 4. [`Provision`] hands the guest to the caller's [`Provisioner`], if any;
//! 5. [`CaptureImage`] captures the image and resolves its identifier;
//! 6. [`Shutdown`] is a no-op hook.
//!
//! Cleanup runs in reverse after every run, so the guest and the key are
//! removed whether the build succeeds or not.

mod capture_image;
mod create_instance;
mod create_ssh_key;
mod error;
mod provision;
mod shutdown;
mod wait_for_instance;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

pub use capture_image::CaptureImage;
pub use create_instance::CreateInstance;
pub use create_ssh_key::CreateSshKey;
pub use error::{BuildError, CleanupError};
pub use provision::{Provision, ProvisionError, Provisioner, SshTarget};
pub use shutdown::Shutdown;
pub use wait_for_instance::WaitForInstance;

use crate::artifact::Artifact;
use crate::config::BuildConfig;
use crate::context::BuildContext;
use crate::poller::ReadinessPoller;
use crate::softlayer::SoftLayerClient;
use crate::step::{Step, StepRunner};
use crate::ui::Ui;

/// Runs one image build from configuration to [`Artifact`].
#[derive(Clone)]
pub struct ImageBuilder {
    client: SoftLayerClient,
    config: Arc<BuildConfig>,
    ui: Arc<dyn Ui>,
    poller: ReadinessPoller,
    provisioner: Option<Arc<dyn Provisioner>>,
}

impl std::fmt::Debug for ImageBuilder {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ImageBuilder")
            .field("config", &self.config)
            .field("poller", &self.poller)
            .field("provisioner", &self.provisioner.is_some())
            .finish_non_exhaustive()
    }
}

impl ImageBuilder {
    /// Creates a builder on top of an existing client.
    #[must_use]
    pub fn new(client: SoftLayerClient, config: BuildConfig, ui: Arc<dyn Ui>) -> Self {
        Self {
            client,
            config: Arc::new(config),
            ui,
            poller: ReadinessPoller::new(),
            provisioner: None,
        }
    }

    /// Creates a builder talking to the configured SoftLayer endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Remote`] when the HTTP client cannot be built.
    pub fn connect(config: BuildConfig, ui: Arc<dyn Ui>) -> Result<Self, BuildError> {
        let client =
            SoftLayerClient::connect(&config.api_endpoint, &config.username, &config.api_key)
                .map_err(|err| BuildError::remote("error creating SoftLayer client", err))?;
        Ok(Self::new(client, config, ui))
    }

    /// Overrides the readiness polling interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poller = ReadinessPoller::with_interval(interval);
        self
    }

    /// Runs `provisioner` against the ready guest before it is captured.
    #[must_use]
    pub fn with_provisioner(mut self, provisioner: Arc<dyn Provisioner>) -> Self {
        self.provisioner = Some(provisioner);
        self
    }

    /// Client used by the pipeline.
    #[must_use]
    pub const fn client(&self) -> &SoftLayerClient {
        &self.client
    }

    /// Returns the pipeline in execution order.
    #[must_use]
    pub fn pipeline(&self) -> Vec<Box<dyn Step<BuildContext>>> {
        vec![
            Box::new(CreateSshKey::default()),
            Box::new(CreateInstance::default()),
            Box::new(WaitForInstance),
            Box::new(Provision::new(self.provisioner.clone())),
            Box::new(CaptureImage),
            Box::new(Shutdown),
        ]
    }

    /// Runs the pipeline.
    ///
    /// Cleanup failures are reported through the [`Ui`] sink and never replace
    /// the error that halted the pipeline.
    ///
    /// # Errors
    ///
    /// Returns the first error recorded by a step.
    pub async fn run(&self) -> Result<Artifact, BuildError> {
        let mut ctx = BuildContext::new(
            self.client.clone(),
            Arc::clone(&self.config),
            Arc::clone(&self.ui),
            self.poller,
        );
        let mut runner = StepRunner::new(self.pipeline());
        let report = runner.run(&mut ctx).await;
        info!(
            ran = ?report.ran,
            halted_at = ?report.halted_at,
            cleanup_failures = ctx.cleanup_errors().len(),
            "image build finished"
        );

        if let Some(err) = ctx.take_error() {
            return Err(err);
        }
        if !report.completed() {
            return Err(BuildError::MissingState("error of the halted step"));
        }

        let image_id = ctx.image_id()?.to_owned();
        Ok(Artifact::new(
            image_id,
            self.config.image_name.clone(),
            self.client.clone(),
        ))
    }
}
