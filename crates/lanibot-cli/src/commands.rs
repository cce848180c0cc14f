pub mod chat;
pub mod health;
pub mod question;

use anyhow::Result;
use lanibot::config::Settings;
use lanibot::transport::ChatClient;
use lanibot::verification::factory::get_credential_provider;
use lanibot::verification::widget::{StaticWidget, VerificationWidget};
use std::sync::Arc;

/// Build a client whose widget answers with the configured token, if any
pub fn build_client(settings: Settings) -> Result<ChatClient> {
    let widget: Arc<dyn VerificationWidget> =
        Arc::new(StaticWidget::new(settings.verification.token.clone()));
    let credentials = get_credential_provider(&settings.verification, Some(widget));
    Ok(ChatClient::new(settings.api, credentials)?)
}
