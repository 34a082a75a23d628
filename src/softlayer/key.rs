//! SSH key operations.

use super::types::{SshKeyRecord, SshKeyRequest};
use super::{SoftLayerClient, SoftLayerError};

impl SoftLayerClient {
    /// Uploads a public key and returns the provider-assigned key id.
    ///
    /// # Errors
    ///
    /// Returns [`SoftLayerError`] when the upload fails or the reply carries
    /// no id.
    pub async fn upload_ssh_key(
        &self,
        label: &str,
        public_key: &str,
    ) -> Result<u64, SoftLayerError> {
        let request = SshKeyRequest {
            key: public_key.to_owned(),
            label: label.to_owned(),
        };
        let record: SshKeyRecord = self
            .post(
                "upload ssh key",
                "SoftLayer_Security_Ssh_Key/createObject.json",
                (request,),
            )
            .await?;
        Ok(record.id)
    }

    /// Deletes an uploaded SSH key.
    ///
    /// # Errors
    ///
    /// Returns [`SoftLayerError::DestroyRejected`] unless the API answers
    /// `true`.
    pub async fn destroy_ssh_key(&self, key_id: u64) -> Result<(), SoftLayerError> {
        let path = format!("SoftLayer_Security_Ssh_Key/{key_id}.json");
        self.delete("ssh key", &key_id.to_string(), &path).await
    }
}
