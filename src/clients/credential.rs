use std::{fs, path::PathBuf};

use tracing::{debug, warn};

use crate::{error::DispatchError, models::credential::Credential};

/// Source of the access token attached to every provider request.
pub trait CredentialProvider: Send + Sync {
    fn read_credential(&self) -> Result<Credential, DispatchError>;
}

/// Reads the token JSON (`{"access_token": "...", ...}`) written by the
/// token refresh job.
#[derive(Debug, Clone)]
pub struct FileCredentialProvider {
    path: PathBuf,
}

impl FileCredentialProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialProvider for FileCredentialProvider {
    fn read_credential(&self) -> Result<Credential, DispatchError> {
        let raw = fs::read_to_string(&self.path).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "Token file unreadable");
            DispatchError::CredentialUnavailable(format!(
                "cannot read {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let credential: Credential = serde_json::from_str(&raw).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "Token file corrupt");
            DispatchError::CredentialUnavailable(format!(
                "cannot parse {}: {}",
                self.path.display(),
                e
            ))
        })?;

        if credential.access_token.trim().is_empty() {
            return Err(DispatchError::CredentialUnavailable(
                "access_token is empty".to_string(),
            ));
        }

        debug!(path = %self.path.display(), "Access token loaded");

        Ok(credential)
    }
}

/// Fixed credential, or a permanently missing one when built with `None`.
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    credential: Option<Credential>,
}

impl StaticCredentialProvider {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            credential: Some(Credential::new(access_token)),
        }
    }

    pub fn unavailable() -> Self {
        Self { credential: None }
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn read_credential(&self) -> Result<Credential, DispatchError> {
        self.credential.clone().ok_or_else(|| {
            DispatchError::CredentialUnavailable("no credential configured".to_string())
        })
    }
}
