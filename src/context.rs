//! Typed state shared by the steps of one image build.
//!
//! Each value an earlier step produces has its own field. Reading a value that
//! has not been stored yet is a pipeline wiring bug and surfaces as
//! [`BuildError::MissingState`].

use std::net::IpAddr;
use std::sync::Arc;

use tracing::{debug, info};

use crate::build::{BuildError, CleanupError, SshTarget};
use crate::config::BuildConfig;
use crate::poller::ReadinessPoller;
use crate::softlayer::{InstanceRecord, SoftLayerClient};
use crate::step::StepAction;
use crate::ui::Ui;

/// State bag threaded through the build pipeline.
pub struct BuildContext {
    client: SoftLayerClient,
    config: Arc<BuildConfig>,
    ui: Arc<dyn Ui>,
    poller: ReadinessPoller,
    ssh_key_id: Option<u64>,
    ssh_private_key: Option<String>,
    instance: Option<InstanceRecord>,
    public_address: Option<IpAddr>,
    private_address: Option<IpAddr>,
    image_id: Option<String>,
    error: Option<BuildError>,
    cleanup_errors: Vec<CleanupError>,
}

impl std::fmt::Debug for BuildContext {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("BuildContext")
            .field("config", &self.config)
            .field("ssh_key_id", &self.ssh_key_id)
            .field("instance", &self.instance)
            .field("image_id", &self.image_id)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl BuildContext {
    /// Creates an empty context for one run.
    #[must_use]
    pub fn new(
        client: SoftLayerClient,
        config: Arc<BuildConfig>,
        ui: Arc<dyn Ui>,
        poller: ReadinessPoller,
    ) -> Self {
        Self {
            client,
            config,
            ui,
            poller,
            ssh_key_id: None,
            ssh_private_key: None,
            instance: None,
            public_address: None,
            private_address: None,
            image_id: None,
            error: None,
            cleanup_errors: Vec::new(),
        }
    }

    /// SoftLayer client for the run.
    #[must_use]
    pub const fn client(&self) -> &SoftLayerClient {
        &self.client
    }

    /// Validated build settings.
    #[must_use]
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Operator-facing message sink.
    #[must_use]
    pub fn ui(&self) -> &dyn Ui {
        self.ui.as_ref()
    }

    /// Poller used for every readiness wait.
    #[must_use]
    pub const fn poller(&self) -> ReadinessPoller {
        self.poller
    }

    /// Uploaded SSH key, if one was created for this run.
    #[must_use]
    pub const fn ssh_key_id(&self) -> Option<u64> {
        self.ssh_key_id
    }

    /// Records the uploaded SSH key.
    pub const fn set_ssh_key_id(&mut self, key_id: u64) {
        self.ssh_key_id = Some(key_id);
    }

    /// Private key accepted by the guest.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::MissingState`] before the key step ran.
    pub fn ssh_private_key(&self) -> Result<&str, BuildError> {
        self.ssh_private_key
            .as_deref()
            .ok_or(BuildError::MissingState("ssh private key"))
    }

    /// Stores the private key material.
    pub fn set_ssh_private_key(&mut self, pem: String) {
        self.ssh_private_key = Some(pem);
    }

    /// Guest created for this run.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::MissingState`] before the guest was created.
    pub fn instance(&self) -> Result<&InstanceRecord, BuildError> {
        self.instance
            .as_ref()
            .ok_or(BuildError::MissingState("instance"))
    }

    /// Stores the created guest.
    pub fn set_instance(&mut self, record: InstanceRecord) {
        self.instance = Some(record);
    }

    /// Stores both guest addresses.
    pub const fn set_addresses(&mut self, public: Option<IpAddr>, private: Option<IpAddr>) {
        self.public_address = public;
        self.private_address = private;
    }

    /// Address an SSH client should connect to.
    #[must_use]
    pub fn ssh_host(&self) -> Option<IpAddr> {
        if self.config.private_network_only {
            self.private_address
        } else {
            self.public_address.or(self.private_address)
        }
    }

    /// Everything an SSH client needs to log in to the guest.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::MissingState`] before the key was prepared or
    /// the guest addresses were fetched.
    pub fn ssh_target(&self) -> Result<SshTarget, BuildError> {
        let host = self
            .ssh_host()
            .ok_or(BuildError::MissingState("guest address"))?;
        Ok(SshTarget::new(
            host,
            self.config.ssh_port,
            self.config.ssh_username.clone(),
            self.ssh_private_key()?.to_owned(),
        ))
    }

    /// Identifier of the captured image.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::MissingState`] before the capture completed.
    pub fn image_id(&self) -> Result<&str, BuildError> {
        self.image_id
            .as_deref()
            .ok_or(BuildError::MissingState("image id"))
    }

    /// Stores the captured image identifier.
    pub fn set_image_id(&mut self, image_id: String) {
        self.image_id = Some(image_id);
    }

    /// Records `error` unless an earlier one exists, and halts the pipeline.
    pub fn halt(&mut self, error: BuildError) -> StepAction {
        info!(error = %error, "build step failed");
        if self.error.is_none() {
            self.error = Some(error);
        }
        StepAction::Halt
    }

    /// First error recorded during the run.
    #[must_use]
    pub const fn error(&self) -> Option<&BuildError> {
        self.error.as_ref()
    }

    /// Removes and returns the recorded error.
    pub const fn take_error(&mut self) -> Option<BuildError> {
        self.error.take()
    }

    /// Reports a cleanup failure to the operator and keeps it.
    pub fn record_cleanup_error(&mut self, error: CleanupError) {
        debug!(step = error.step, error = %error, "cleanup failed");
        self.ui.error(&error.to_string());
        self.cleanup_errors.push(error);
    }

    /// Cleanup failures collected so far.
    #[must_use]
    pub fn cleanup_errors(&self) -> &[CleanupError] {
        &self.cleanup_errors
    }
}
