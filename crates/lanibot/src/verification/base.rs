use async_trait::async_trait;

use crate::errors::ChatResult;

/// Header that echoes the credential alongside the request body
pub const CREDENTIAL_HEADER: &str = "X-Turnstile-Token";

/// Source of the single-use credential that authorizes one chat request
///
/// Implementations never retry. A failure is reported once as
/// [`crate::errors::ChatError::VerificationUnavailable`] and the caller decides what to do.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn acquire_credential(&self) -> ChatResult<String>;
}
