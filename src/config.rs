//! Configuration loading via `ortho-config`.
//!
//! [`ImagerConfig`] holds the raw layered input (defaults, configuration
//! files, `SOFTLAYER_*` environment variables). [`ImagerConfig::validate`]
//! turns it into a [`BuildConfig`] once, before any remote call is made.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::softlayer::{BootSource, DEFAULT_API_ENDPOINT, InstanceSpec};

/// Description stamped on images when none is configured.
pub const DEFAULT_IMAGE_DESCRIPTION: &str = "Instance snapshot. Generated by softlayer-imager.";

const CONFIG_FILE: &str = "softlayer-imager.toml";

/// Image capture mode.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ImageType {
    /// Snapshot of an explicit list of block devices.
    Standard,
    /// Whole-guest capture in a single call.
    #[default]
    Flex,
}

impl ImageType {
    /// Lowercase name as accepted in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Flex => "flex",
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for ImageType {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "standard" => Ok(Self::Standard),
            "flex" => Ok(Self::Flex),
            other => Err(ConfigError::Invalid(format!(
                "image type must be 'standard' or 'flex', got '{other}': \
                 set SOFTLAYER_IMAGE_TYPE or image_type in {CONFIG_FILE}"
            ))),
        }
    }
}

/// Raw SoftLayer image build settings loaded via `ortho-config`.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "SOFTLAYER",
    discovery(
        app_name = "softlayer-imager",
        env_var = "SOFTLAYER_IMAGER_CONFIG_PATH",
        config_file_name = "softlayer-imager.toml",
        dotfile_name = ".softlayer-imager.toml",
        project_file_name = "softlayer-imager.toml"
    )
)]
pub struct ImagerConfig {
    /// SoftLayer API user name.
    pub username: Option<String>,
    /// SoftLayer API key.
    pub api_key: Option<String>,
    /// REST endpoint; override for private endpoints or tests.
    #[ortho_config(default = DEFAULT_API_ENDPOINT.to_owned())]
    pub api_endpoint: String,
    /// Name given to the captured image template.
    pub image_name: Option<String>,
    /// Description given to the captured image template.
    #[ortho_config(default = DEFAULT_IMAGE_DESCRIPTION.to_owned())]
    pub image_description: String,
    /// Capture mode, `standard` or `flex`.
    #[ortho_config(default = "flex".to_owned())]
    pub image_type: String,
    /// Global identifier of the template to boot from.
    pub base_image_id: Option<String>,
    /// Operating system reference code to boot from.
    pub base_os_code: Option<String>,
    /// Datacenter short name.
    #[ortho_config(default = "ams01".to_owned())]
    pub datacenter_name: String,
    /// Hostname of the build guest. Defaults to `imager-<uuid>`.
    pub instance_name: Option<String>,
    /// Domain of the build guest.
    #[ortho_config(default = "defaultdomain.com".to_owned())]
    pub instance_domain: String,
    /// Number of CPUs.
    #[ortho_config(default = 1)]
    pub instance_cpu: u32,
    /// Memory in MiB.
    #[ortho_config(default = 1024)]
    pub instance_memory: u64,
    /// Maximum NIC speed in Mbps.
    #[ortho_config(default = 10)]
    pub instance_network_speed: u32,
    /// Comma separated disk sizes in GiB; only used with `base_os_code`.
    #[ortho_config(default = "25".to_owned())]
    pub instance_disk_capacities: String,
    /// Provision the guest without a public interface.
    #[ortho_config(default = false)]
    pub private_network_only: bool,
    /// User a communicator logs in as.
    #[ortho_config(default = "root".to_owned())]
    pub ssh_username: String,
    /// Port a communicator connects to.
    #[ortho_config(default = 22)]
    pub ssh_port: u16,
    /// Existing private key; when set no key is uploaded.
    pub ssh_private_key_file: Option<String>,
    /// Readiness wait timeout in seconds.
    #[ortho_config(default = 600)]
    pub state_timeout_secs: u64,
}

/// Command-line values layered over the loaded configuration.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConfigOverrides {
    /// Replaces `image_name`.
    pub image_name: Option<String>,
    /// Replaces `image_type`.
    pub image_type: Option<String>,
    /// Replaces the base with a template identifier.
    pub base_image_id: Option<String>,
    /// Replaces the base with an operating system code.
    pub base_os_code: Option<String>,
    /// Replaces `datacenter_name`.
    pub datacenter: Option<String>,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }

    fn hint(&self) -> String {
        format!(
            "set {} or add {} to {CONFIG_FILE}",
            self.env_var, self.toml_key
        )
    }

    fn missing(&self) -> ConfigError {
        ConfigError::MissingField(format!("missing {}: {}", self.description, self.hint()))
    }

    fn invalid(&self, problem: &str) -> ConfigError {
        ConfigError::Invalid(format!("{} {problem}: {}", self.description, self.hint()))
    }
}

const USERNAME: FieldMetadata =
    FieldMetadata::new("SoftLayer API user name", "SOFTLAYER_USERNAME", "username");
const API_KEY: FieldMetadata =
    FieldMetadata::new("SoftLayer API key", "SOFTLAYER_API_KEY", "api_key");
const API_ENDPOINT: FieldMetadata =
    FieldMetadata::new("API endpoint", "SOFTLAYER_API_ENDPOINT", "api_endpoint");
const IMAGE_NAME: FieldMetadata =
    FieldMetadata::new("image name", "SOFTLAYER_IMAGE_NAME", "image_name");
const BASE: FieldMetadata = FieldMetadata::new(
    "base image",
    "SOFTLAYER_BASE_IMAGE_ID or SOFTLAYER_BASE_OS_CODE",
    "base_image_id or base_os_code",
);
const DATACENTER: FieldMetadata =
    FieldMetadata::new("datacenter", "SOFTLAYER_DATACENTER_NAME", "datacenter_name");
const INSTANCE_DOMAIN: FieldMetadata =
    FieldMetadata::new("instance domain", "SOFTLAYER_INSTANCE_DOMAIN", "instance_domain");
const INSTANCE_CPU: FieldMetadata =
    FieldMetadata::new("CPU count", "SOFTLAYER_INSTANCE_CPU", "instance_cpu");
const INSTANCE_MEMORY: FieldMetadata =
    FieldMetadata::new("memory size", "SOFTLAYER_INSTANCE_MEMORY", "instance_memory");
const NETWORK_SPEED: FieldMetadata = FieldMetadata::new(
    "network speed",
    "SOFTLAYER_INSTANCE_NETWORK_SPEED",
    "instance_network_speed",
);
const DISK_CAPACITIES: FieldMetadata = FieldMetadata::new(
    "disk capacities",
    "SOFTLAYER_INSTANCE_DISK_CAPACITIES",
    "instance_disk_capacities",
);
const SSH_USERNAME: FieldMetadata =
    FieldMetadata::new("SSH user name", "SOFTLAYER_SSH_USERNAME", "ssh_username");
const SSH_PORT: FieldMetadata = FieldMetadata::new("SSH port", "SOFTLAYER_SSH_PORT", "ssh_port");
const SSH_KEY_FILE: FieldMetadata = FieldMetadata::new(
    "SSH private key file",
    "SOFTLAYER_SSH_PRIVATE_KEY_FILE",
    "ssh_private_key_file",
);
const STATE_TIMEOUT: FieldMetadata = FieldMetadata::new(
    "state timeout",
    "SOFTLAYER_STATE_TIMEOUT_SECS",
    "state_timeout_secs",
);

fn required(value: Option<&str>, metadata: &FieldMetadata) -> Result<String, ConfigError> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_owned()),
        _ => Err(metadata.missing()),
    }
}

fn non_blank(value: &str, metadata: &FieldMetadata) -> Result<String, ConfigError> {
    required(Some(value), metadata)
}

fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
}

fn positive<T: Default + PartialOrd>(value: T, metadata: &FieldMetadata) -> Result<T, ConfigError> {
    if value > T::default() {
        Ok(value)
    } else {
        Err(metadata.invalid("must be greater than zero"))
    }
}

/// Parses a comma separated list of disk sizes in GiB.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when the list is empty or an entry is not
/// a positive integer.
pub fn parse_disk_capacities(raw: &str) -> Result<Vec<u32>, ConfigError> {
    let capacities = raw
        .split(',')
        .map(|entry| {
            let trimmed = entry.trim();
            match trimmed.parse::<u32>() {
                Ok(size) if size > 0 => Ok(size),
                _ => Err(DISK_CAPACITIES.invalid(&format!(
                    "must be a comma separated list of positive sizes, got '{trimmed}'"
                ))),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    if capacities.is_empty() {
        return Err(DISK_CAPACITIES.invalid("must list at least one disk"));
    }
    Ok(capacities)
}

impl ImagerConfig {
    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("softlayer-imager")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Layers command-line values over the loaded configuration.
    ///
    /// Naming a base on the command line replaces whichever base the
    /// configuration selected.
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        let ConfigOverrides {
            image_name,
            image_type,
            base_image_id,
            base_os_code,
            datacenter,
        } = overrides;

        if image_name.is_some() {
            self.image_name = image_name;
        }
        if let Some(kind) = image_type {
            self.image_type = kind;
        }
        if base_image_id.is_some() || base_os_code.is_some() {
            self.base_image_id = base_image_id;
            self.base_os_code = base_os_code;
        }
        if let Some(name) = datacenter {
            self.datacenter_name = name;
        }
    }

    /// Validates only what is needed to talk to the API.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when the user name or key is
    /// absent.
    pub fn credentials(&self) -> Result<ApiCredentials, ConfigError> {
        Ok(ApiCredentials {
            endpoint: non_blank(&self.api_endpoint, &API_ENDPOINT)?,
            username: required(self.username.as_deref(), &USERNAME)?,
            api_key: required(self.api_key.as_deref(), &API_KEY)?,
        })
    }

    /// Validates the configuration and resolves defaults that depend on it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required value is absent
    /// and [`ConfigError::Invalid`] when a value is out of range or
    /// contradicts another.
    pub fn validate(&self) -> Result<BuildConfig, ConfigError> {
        let ApiCredentials {
            endpoint: api_endpoint,
            username,
            api_key,
        } = self.credentials()?;
        let image_name = required(self.image_name.as_deref(), &IMAGE_NAME)?;
        let image_type = self.image_type.parse::<ImageType>()?;
        let boot = self.boot_source()?;
        let datacenter = non_blank(&self.datacenter_name, &DATACENTER)?;
        let instance_domain = non_blank(&self.instance_domain, &INSTANCE_DOMAIN)?;
        let ssh_username = non_blank(&self.ssh_username, &SSH_USERNAME)?;

        let ssh_private_key_file = match self.ssh_private_key_file.as_deref() {
            None => None,
            Some(path) => Some(Utf8PathBuf::from(non_blank(path, &SSH_KEY_FILE)?)),
        };

        Ok(BuildConfig {
            username,
            api_key,
            api_endpoint,
            image_name,
            image_description: self.image_description.trim().to_owned(),
            image_type,
            boot,
            datacenter,
            instance_name: optional(self.instance_name.as_deref())
                .unwrap_or_else(|| format!("imager-{}", Uuid::new_v4())),
            instance_domain,
            instance_cpu: positive(self.instance_cpu, &INSTANCE_CPU)?,
            instance_memory: positive(self.instance_memory, &INSTANCE_MEMORY)?,
            instance_network_speed: positive(self.instance_network_speed, &NETWORK_SPEED)?,
            private_network_only: self.private_network_only,
            ssh_username,
            ssh_port: positive(self.ssh_port, &SSH_PORT)?,
            ssh_private_key_file,
            state_timeout: Duration::from_secs(positive(self.state_timeout_secs, &STATE_TIMEOUT)?),
        })
    }

    fn boot_source(&self) -> Result<BootSource, ConfigError> {
        match (
            optional(self.base_image_id.as_deref()),
            optional(self.base_os_code.as_deref()),
        ) {
            (Some(global_identifier), None) => Ok(BootSource::Template { global_identifier }),
            (None, Some(reference_code)) => Ok(BootSource::OperatingSystem {
                reference_code,
                disk_capacities: parse_disk_capacities(&self.instance_disk_capacities)?,
            }),
            (Some(_), Some(_)) => Err(BASE.invalid("must be set exactly once, not both")),
            (None, None) => Err(BASE.missing()),
        }
    }
}

/// Endpoint and authentication for the SoftLayer API.
#[derive(Clone, Eq, PartialEq)]
pub struct ApiCredentials {
    /// REST endpoint.
    pub endpoint: String,
    /// API user name.
    pub username: String,
    /// API key.
    pub api_key: String,
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ApiCredentials")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Validated, immutable settings for one image build.
#[derive(Clone, Eq, PartialEq)]
pub struct BuildConfig {
    /// SoftLayer API user name.
    pub username: String,
    /// SoftLayer API key.
    pub api_key: String,
    /// REST endpoint.
    pub api_endpoint: String,
    /// Name of the captured image.
    pub image_name: String,
    /// Description of the captured image.
    pub image_description: String,
    /// Capture mode.
    pub image_type: ImageType,
    /// Template or operating system the guest boots from.
    pub boot: BootSource,
    /// Datacenter short name.
    pub datacenter: String,
    /// Guest hostname.
    pub instance_name: String,
    /// Guest domain.
    pub instance_domain: String,
    /// Number of CPUs.
    pub instance_cpu: u32,
    /// Memory in MiB.
    pub instance_memory: u64,
    /// NIC speed in Mbps.
    pub instance_network_speed: u32,
    /// Private network only.
    pub private_network_only: bool,
    /// Communicator user.
    pub ssh_username: String,
    /// Communicator port.
    pub ssh_port: u16,
    /// Caller supplied private key.
    pub ssh_private_key_file: Option<Utf8PathBuf>,
    /// Readiness wait timeout.
    pub state_timeout: Duration,
}

impl fmt::Debug for BuildConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("BuildConfig")
            .field("username", &self.username)
            .field("api_endpoint", &self.api_endpoint)
            .field("image_name", &self.image_name)
            .field("image_type", &self.image_type)
            .field("boot", &self.boot)
            .field("datacenter", &self.datacenter)
            .field("instance_name", &self.instance_name)
            .field("state_timeout", &self.state_timeout)
            .finish_non_exhaustive()
    }
}

impl BuildConfig {
    /// Describes the guest to order, provisioning `ssh_key_id` when present.
    #[must_use]
    pub fn instance_spec(&self, ssh_key_id: Option<u64>) -> InstanceSpec {
        InstanceSpec {
            hostname: self.instance_name.clone(),
            domain: self.instance_domain.clone(),
            datacenter: self.datacenter.clone(),
            cpus: self.instance_cpu,
            memory_mb: self.instance_memory,
            network_speed: self.instance_network_speed,
            private_network_only: self.private_network_only,
            ssh_key_id,
            boot: self.boot.clone(),
        }
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a value is out of range or contradicts another value.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
