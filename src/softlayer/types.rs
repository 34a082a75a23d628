//! Request and response shapes for the SoftLayer REST API.

use serde::{Deserialize, Serialize};

const RUNNING_POWER_STATE: &str = "RUNNING";

/// How the new virtual guest boots.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BootSource {
    /// Boot from an existing image template (its global identifier).
    Template {
        /// Global identifier of the template.
        global_identifier: String,
    },
    /// Boot a stock operating system with explicitly sized disks.
    OperatingSystem {
        /// SoftLayer operating system reference code (for example
        /// `UBUNTU_LATEST`).
        reference_code: String,
        /// Disk sizes in GiB; the first entry is the boot disk.
        disk_capacities: Vec<u32>,
    },
}

/// Fully resolved description of the virtual guest to create.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceSpec {
    /// Requested hostname; sanitised before it is sent.
    pub hostname: String,
    /// Requested domain; sanitised before it is sent.
    pub domain: String,
    /// Datacenter short name (for example `ams01`).
    pub datacenter: String,
    /// Number of CPUs.
    pub cpus: u32,
    /// Memory in MiB.
    pub memory_mb: u64,
    /// Maximum NIC speed in Mbps.
    pub network_speed: u32,
    /// Whether the guest only gets a private network interface.
    pub private_network_only: bool,
    /// SSH key to provision onto the guest, if one was uploaded.
    pub ssh_key_id: Option<u64>,
    /// Boot image or operating system.
    pub boot: BootSource,
}

/// Envelope used for every SoftLayer request body.
#[derive(Debug, Serialize)]
pub(super) struct Parameters<T> {
    pub(super) parameters: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateGuestRequest {
    pub(super) hostname: String,
    pub(super) domain: String,
    pub(super) datacenter: NamedRef,
    pub(super) start_cpus: u32,
    pub(super) max_memory: u64,
    pub(super) hourly_billing_flag: bool,
    pub(super) local_disk_flag: bool,
    pub(super) private_network_only_flag: bool,
    pub(super) network_components: Vec<NetworkComponent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) block_device_template_group: Option<TemplateRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(super) block_devices: Vec<BlockDeviceRequest>,
    #[serde(
        rename = "operatingSystemReferenceCode",
        skip_serializing_if = "Option::is_none"
    )]
    pub(super) os_reference_code: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(super) ssh_keys: Vec<IdRef>,
}

#[derive(Debug, Serialize)]
pub(super) struct NamedRef {
    pub(super) name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct NetworkComponent {
    pub(super) max_speed: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct TemplateRef {
    pub(super) global_identifier: String,
}

#[derive(Debug, Serialize)]
pub(super) struct IdRef {
    pub(super) id: u64,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct BlockDeviceRequest {
    pub(super) device: String,
    pub(super) disk_image: DiskCapacity,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub(super) struct DiskCapacity {
    pub(super) capacity: u32,
}

#[derive(Debug, Serialize)]
pub(super) struct SshKeyRequest {
    pub(super) key: String,
    pub(super) label: String,
}

#[derive(Debug, Serialize)]
pub(super) struct FlexImageRequest {
    pub(super) name: String,
    pub(super) description: String,
    pub(super) summary: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct SshKeyRecord {
    pub(super) id: u64,
}

/// Virtual guest as returned by `createObject`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstanceRecord {
    /// Numeric guest identifier.
    pub id: u64,
    /// Globally unique identifier used for all follow-up calls.
    pub global_identifier: String,
    /// Hostname accepted by the provider.
    #[serde(default)]
    pub hostname: String,
    /// Domain accepted by the provider.
    #[serde(default)]
    pub domain: String,
}

/// Power state reported by `getPowerState`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PowerState {
    /// Machine readable state (`RUNNING`, `HALTED`, ...).
    pub key_name: String,
    /// Human readable state.
    #[serde(default)]
    pub name: String,
}

impl PowerState {
    /// Returns `true` when the guest is electrically powered on.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.key_name == RUNNING_POWER_STATE
    }
}

/// Provisioning transaction reported by `getActiveTransaction`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Transaction identifier.
    #[serde(default)]
    pub id: Option<u64>,
    /// Current status of the transaction.
    #[serde(default)]
    pub transaction_status: Option<TransactionStatus>,
}

/// Status attached to a [`Transaction`].
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct TransactionStatus {
    /// Status name (for example `CLOUD_INSTANCE_BOOT`).
    #[serde(default)]
    pub name: String,
}

/// Snapshot of the two signals that make up guest readiness.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceStatus {
    /// Current power state.
    pub power_state: PowerState,
    /// Transaction in flight, if any.
    pub active_transaction: Option<Transaction>,
}

impl InstanceStatus {
    /// A guest is ready when it is running and no transaction is in flight.
    ///
    /// Power-on can complete while provisioning transactions are still
    /// queued, so both conditions must hold at once.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.power_state.is_running() && self.active_transaction.is_none()
    }
}

/// Block device attached to a guest.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlockDevice {
    /// Block device identifier, used by standard captures.
    pub id: u64,
    /// Device slot (`0`, `1`, ...).
    #[serde(default)]
    pub device: String,
    /// Backing disk image, when the mask requested it.
    #[serde(default)]
    pub disk_image: Option<DiskImage>,
}

impl BlockDevice {
    /// Name of the backing disk image, or an empty string.
    #[must_use]
    pub fn disk_image_name(&self) -> &str {
        self.disk_image
            .as_ref()
            .map_or("", |image| image.name.as_str())
    }
}

/// Disk image backing a [`BlockDevice`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiskImage {
    /// Disk image identifier.
    #[serde(default)]
    pub id: Option<u64>,
    /// Disk image name; swap and metadata disks carry marker substrings.
    #[serde(default)]
    pub name: String,
}

/// Image template (block device template group).
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageTemplate {
    /// Numeric template identifier.
    #[serde(default)]
    pub id: Option<u64>,
    /// Template name.
    #[serde(default)]
    pub name: String,
    /// Global identifier, the value callers boot from.
    #[serde(default)]
    pub global_identifier: Option<String>,
}
