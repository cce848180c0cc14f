use async_trait::async_trait;
use std::sync::Arc;

use super::base::CredentialProvider;
use crate::errors::{ChatError, ChatResult};

pub const WIDGET_NOT_INITIALIZED: &str = "Turnstile not initialized";
pub const WIDGET_NO_TOKEN: &str = "Failed to get Turnstile token";

/// A rendered verification widget that exposes its current response
pub trait VerificationWidget: Send + Sync {
    /// The widget's current response, `None` until it has produced one
    fn current_response(&self) -> Option<String>;
}

/// Widget with a fixed response, e.g. one pasted on the command line
#[derive(Debug, Clone, Default)]
pub struct StaticWidget {
    response: Option<String>,
}

impl StaticWidget {
    pub fn new(response: Option<String>) -> Self {
        Self { response }
    }
}

impl VerificationWidget for StaticWidget {
    fn current_response(&self) -> Option<String> {
        self.response.clone()
    }
}

/// Reads the credential from a verification widget, if one was rendered
#[derive(Clone, Default)]
pub struct WidgetCredential {
    widget: Option<Arc<dyn VerificationWidget>>,
}

impl WidgetCredential {
    pub fn new(widget: Option<Arc<dyn VerificationWidget>>) -> Self {
        Self { widget }
    }
}

#[async_trait]
impl CredentialProvider for WidgetCredential {
    async fn acquire_credential(&self) -> ChatResult<String> {
        let widget = self.widget.as_ref().ok_or_else(|| {
            ChatError::VerificationUnavailable(WIDGET_NOT_INITIALIZED.to_string())
        })?;

        match widget.current_response() {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(ChatError::VerificationUnavailable(
                WIDGET_NO_TOKEN.to_string(),
            )),
        }
    }
}
