//! Command-line interface definitions for the `softlayer-imager` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `softlayer-imager` binary.
#[derive(Debug, Parser)]
#[command(
    name = "softlayer-imager",
    about = "Build reusable SoftLayer image templates from disposable virtual guests",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Provision a guest, capture it as an image, and clean up.
    #[command(
        name = "build",
        about = "Provision a guest, capture it as an image, and clean up"
    )]
    Build(BuildCommand),
    /// Delete a previously captured image template.
    #[command(name = "destroy-image", about = "Delete a captured image template")]
    DestroyImage(DestroyImageCommand),
}

/// Arguments for the `softlayer-imager build` subcommand.
///
/// Every flag overrides the value loaded from configuration files and
/// `SOFTLAYER_*` environment variables.
#[derive(Debug, Parser)]
pub(crate) struct BuildCommand {
    /// Name of the image template to create.
    #[arg(long, value_name = "NAME")]
    pub(crate) image_name: Option<String>,
    /// Capture mode: `standard` or `flex`.
    #[arg(long, value_name = "TYPE")]
    pub(crate) image_type: Option<String>,
    /// Boot the guest from this image template (global identifier).
    #[arg(long, value_name = "ID", conflicts_with = "base_os_code")]
    pub(crate) base_image_id: Option<String>,
    /// Boot the guest from this operating system reference code.
    #[arg(long, value_name = "CODE", conflicts_with = "base_image_id")]
    pub(crate) base_os_code: Option<String>,
    /// Datacenter short name (for example `ams01`).
    #[arg(long, value_name = "NAME")]
    pub(crate) datacenter: Option<String>,
}

/// Arguments for the `softlayer-imager destroy-image` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct DestroyImageCommand {
    /// Identifier of the image template to delete.
    #[arg(value_name = "IMAGE_ID")]
    pub(crate) image_id: String,
}
