//! Core library for the SoftLayer image builder.
//!
//! The crate provisions a disposable SoftLayer virtual guest, captures it as
//! a reusable image template, and tears every transient resource down again.
//! A linear pipeline of [`step::Step`]s does the work (create key → create
//! guest → wait for readiness → provision → capture image); the
//! [`step::StepRunner`] guarantees reverse-order cleanup of everything that
//! ran, whether the build succeeded or not.

pub mod artifact;
pub mod build;
pub mod config;
pub mod context;
pub mod poller;
pub mod softlayer;
pub mod ssh_key;
pub mod step;
pub mod test_support;
pub mod ui;

pub use artifact::{Artifact, ArtifactError, BUILDER_ID};
pub use build::{
    BuildError, CleanupError, ImageBuilder, ProvisionError, Provisioner, SshTarget,
};
pub use config::{
    ApiCredentials, BuildConfig, ConfigError, ConfigOverrides, ImageType, ImagerConfig,
};
pub use context::BuildContext;
pub use poller::{DEFAULT_POLL_INTERVAL, ReadinessPoller, WaitError};
pub use softlayer::{
    HttpTransport, Method, SoftLayerClient, SoftLayerError, Transport, TransportError,
};
pub use step::{RunReport, Step, StepAction, StepFuture, StepRunner};
pub use ui::{ConsoleUi, Ui};
