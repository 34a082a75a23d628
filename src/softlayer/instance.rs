//! Virtual guest operations.

use std::net::IpAddr;
use std::str::FromStr;

use super::types::{
    BlockDeviceRequest, BootSource, CreateGuestRequest, DiskCapacity, IdRef, InstanceRecord,
    InstanceSpec, InstanceStatus, NamedRef, NetworkComponent, PowerState, TemplateRef,
    Transaction,
};
use super::{SoftLayerClient, SoftLayerError};

/// Device slot reserved for swap on SoftLayer guests.
const SWAP_DEVICE_SLOT: usize = 1;

/// Strips every character SoftLayer rejects in hostnames and domains.
///
/// Only ASCII letters, digits, `-` and `.` survive.
#[must_use]
pub fn sanitize_label(value: &str) -> String {
    value
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '.'))
        .collect()
}

/// Lays out disk capacities as SoftLayer block devices.
///
/// The first disk is the boot device `0`; slot `1` belongs to swap, so every
/// further disk is numbered from `2` upwards.
pub(super) fn block_device_layout(capacities: &[u32]) -> Vec<BlockDeviceRequest> {
    capacities
        .iter()
        .enumerate()
        .map(|(index, capacity)| {
            let slot = if index == 0 {
                0
            } else {
                index + SWAP_DEVICE_SLOT
            };
            BlockDeviceRequest {
                device: slot.to_string(),
                disk_image: DiskCapacity {
                    capacity: *capacity,
                },
            }
        })
        .collect()
}

fn create_request(spec: &InstanceSpec) -> CreateGuestRequest {
    let (block_device_template_group, block_devices, os_reference_code) = match &spec.boot {
        BootSource::Template { global_identifier } => (
            Some(TemplateRef {
                global_identifier: global_identifier.clone(),
            }),
            Vec::new(),
            None,
        ),
        BootSource::OperatingSystem {
            reference_code,
            disk_capacities,
        } => (
            None,
            block_device_layout(disk_capacities),
            Some(reference_code.clone()),
        ),
    };

    CreateGuestRequest {
        hostname: sanitize_label(&spec.hostname),
        domain: sanitize_label(&spec.domain),
        datacenter: NamedRef {
            name: spec.datacenter.clone(),
        },
        start_cpus: spec.cpus,
        max_memory: spec.memory_mb,
        hourly_billing_flag: true,
        local_disk_flag: false,
        private_network_only_flag: spec.private_network_only,
        network_components: vec![NetworkComponent {
            max_speed: spec.network_speed,
        }],
        block_device_template_group,
        block_devices,
        os_reference_code,
        ssh_keys: spec.ssh_key_id.map(|id| IdRef { id }).into_iter().collect(),
    }
}

impl SoftLayerClient {
    /// Orders a new hourly virtual guest.
    ///
    /// # Errors
    ///
    /// Returns [`SoftLayerError`] when the API rejects the order or the reply
    /// lacks a global identifier.
    pub async fn create_instance(
        &self,
        spec: &InstanceSpec,
    ) -> Result<InstanceRecord, SoftLayerError> {
        let request = create_request(spec);
        self.post(
            "create instance",
            "SoftLayer_Virtual_Guest/createObject.json",
            (request,),
        )
        .await
    }

    /// Cancels a virtual guest.
    ///
    /// The guest must have no active transaction, otherwise SoftLayer refuses
    /// the deletion.
    ///
    /// # Errors
    ///
    /// Returns [`SoftLayerError::DestroyRejected`] unless the API answers
    /// `true`.
    pub async fn destroy_instance(&self, instance_id: &str) -> Result<(), SoftLayerError> {
        let path = format!("SoftLayer_Virtual_Guest/{instance_id}.json");
        self.delete("instance", instance_id, &path).await
    }

    /// Fetches the guest's power state.
    ///
    /// # Errors
    ///
    /// Returns [`SoftLayerError`] when the query fails.
    pub async fn power_state(&self, instance_id: &str) -> Result<PowerState, SoftLayerError> {
        let path = format!("SoftLayer_Virtual_Guest/{instance_id}/getPowerState.json");
        self.get("get power state", &path).await
    }

    /// Fetches the transaction currently running against the guest.
    ///
    /// # Errors
    ///
    /// Returns [`SoftLayerError`] when the query fails.
    pub async fn active_transaction(
        &self,
        instance_id: &str,
    ) -> Result<Option<Transaction>, SoftLayerError> {
        let path = format!("SoftLayer_Virtual_Guest/{instance_id}/getActiveTransaction.json");
        self.get("get active transaction", &path).await
    }

    /// Fetches both readiness signals for the guest.
    ///
    /// # Errors
    ///
    /// Returns [`SoftLayerError`] when either query fails.
    pub async fn instance_status(
        &self,
        instance_id: &str,
    ) -> Result<InstanceStatus, SoftLayerError> {
        let power_state = self.power_state(instance_id).await?;
        let active_transaction = self.active_transaction(instance_id).await?;
        Ok(InstanceStatus {
            power_state,
            active_transaction,
        })
    }

    /// Fetches the primary public address; `None` for private-only guests.
    ///
    /// # Errors
    ///
    /// Returns [`SoftLayerError`] when the query fails or the reply is not an
    /// IP address.
    pub async fn primary_public_address(
        &self,
        instance_id: &str,
    ) -> Result<Option<IpAddr>, SoftLayerError> {
        let path = format!("SoftLayer_Virtual_Guest/{instance_id}/getPrimaryIpAddress.json");
        self.address("get primary public address", &path).await
    }

    /// Fetches the primary backend (private) address.
    ///
    /// # Errors
    ///
    /// Returns [`SoftLayerError`] when the query fails or the reply is not an
    /// IP address.
    pub async fn primary_private_address(
        &self,
        instance_id: &str,
    ) -> Result<Option<IpAddr>, SoftLayerError> {
        let path =
            format!("SoftLayer_Virtual_Guest/{instance_id}/getPrimaryBackendIpAddress.json");
        self.address("get primary private address", &path).await
    }

    async fn address(&self, operation: &str, path: &str) -> Result<Option<IpAddr>, SoftLayerError> {
        let raw: Option<String> = self.get(operation, path).await?;
        let Some(text) = raw.map(|value| value.trim().to_owned()) else {
            return Ok(None);
        };
        if text.is_empty() {
            return Ok(None);
        }
        IpAddr::from_str(&text)
            .map(Some)
            .map_err(|err| SoftLayerError::unexpected(operation, format!("'{text}': {err}")))
    }
}
