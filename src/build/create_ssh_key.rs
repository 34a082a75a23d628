//! Prepares the SSH key the build guest is provisioned with.

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use uuid::Uuid;

use crate::context::BuildContext;
use crate::ssh_key::GeneratedKey;
use crate::step::{Step, StepAction, StepFuture};

use super::{BuildError, CleanupError};

fn read_key_file(path: &Utf8Path) -> Result<String, String> {
    let (dir_path, file_path) = if path.is_absolute() {
        let parent = path
            .parent()
            .ok_or_else(|| format!("path has no parent directory: {path}"))?;
        let file_name = path
            .file_name()
            .ok_or_else(|| format!("path has no file name: {path}"))?;
        (parent, Utf8Path::new(file_name))
    } else {
        (Utf8Path::new("."), path)
    };

    let dir =
        Dir::open_ambient_dir(dir_path, ambient_authority()).map_err(|err| err.to_string())?;
    dir.read_to_string(file_path).map_err(|err| err.to_string())
}

async fn load_private_key(path: &Utf8Path) -> Result<String, BuildError> {
    let task_path = path.to_owned();
    let pem = tokio::task::spawn_blocking(move || read_key_file(&task_path))
        .await
        .map_err(|err| BuildError::SshKey(format!("could not read {path}: {err}")))?
        .map_err(|err| BuildError::SshKey(format!("could not read {path}: {err}")))?;
    if pem.trim().is_empty() {
        return Err(BuildError::SshKey(format!("{path} is empty")));
    }
    Ok(pem)
}

/// Uploads an ephemeral key, or loads the caller's private key instead.
#[derive(Debug, Default)]
pub struct CreateSshKey {
    uploaded: Option<u64>,
}

impl CreateSshKey {
    /// Step identifier.
    pub const NAME: &'static str = "create-ssh-key";

    async fn execute(&mut self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        if let Some(path) = ctx.config().ssh_private_key_file.clone() {
            ctx.ui().say(&format!("Using SSH private key from {path}"));
            let pem = load_private_key(&path).await?;
            ctx.set_ssh_private_key(pem);
            return Ok(());
        }

        ctx.ui().say("Creating temporary SSH key for instance...");
        let label = format!("softlayer-imager-{}", Uuid::new_v4());
        let key = GeneratedKey::generate(&label)?;
        let key_id = ctx
            .client()
            .clone()
            .upload_ssh_key(&label, key.public_key())
            .await
            .map_err(|err| BuildError::remote("error creating temporary SSH key", err))?;

        self.uploaded = Some(key_id);
        ctx.set_ssh_key_id(key_id);
        ctx.set_ssh_private_key(key.into_private_key_pem());
        ctx.ui().say(&format!("Created SSH key with id '{key_id}'"));
        Ok(())
    }
}

impl Step<BuildContext> for CreateSshKey {
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

    fn cleanup<'a>(&'a mut self, state: &'a mut BuildContext) -> StepFuture<'a, ()> {
        Box::pin(async move {
            let Some(key_id) = self.uploaded.take() else {
                return;
            };

            state.ui().say("Deleting temporary SSH key...");
            let client = state.client().clone();
            if let Err(err) = client.destroy_ssh_key(key_id).await {
                state.record_cleanup_error(CleanupError::with_hint(
                    Self::NAME,
                    format!("error cleaning up SSH key: {err}"),
                    format!("Please delete the key ({key_id}) manually"),
                ));
            }
        })
    }
}
