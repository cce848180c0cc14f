use async_trait::async_trait;

use super::base::CredentialProvider;
use crate::errors::ChatResult;

pub const PLACEHOLDER_CREDENTIAL: &str = "test-token";

/// Credential used in development or when no site key is configured.
/// Performs no I/O.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderCredential;

#[async_trait]
impl CredentialProvider for PlaceholderCredential {
    async fn acquire_credential(&self) -> ChatResult<String> {
        Ok(PLACEHOLDER_CREDENTIAL.to_string())
    }
}
