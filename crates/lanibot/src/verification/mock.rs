use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::base::CredentialProvider;
use crate::errors::{ChatError, ChatResult};

/// A credential provider with a canned answer that counts how often it was asked
pub struct MockCredential {
    result: ChatResult<String>,
    calls: Arc<AtomicUsize>,
}

impl MockCredential {
    pub fn token(token: &str) -> Self {
        Self {
            result: Ok(token.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(ChatError::VerificationUnavailable(message.to_string())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl CredentialProvider for MockCredential {
    async fn acquire_credential(&self) -> ChatResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}
