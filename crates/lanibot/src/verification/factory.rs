use std::sync::Arc;

use super::{
    base::CredentialProvider, placeholder::PlaceholderCredential, widget::VerificationWidget,
    widget::WidgetCredential,
};
use crate::config::VerificationSettings;

/// Pick the credential source for the given settings.
///
/// Development mode, or a missing site key, means there is no verification
/// backend to talk to and the placeholder is used.
pub fn get_credential_provider(
    settings: &VerificationSettings,
    widget: Option<Arc<dyn VerificationWidget>>,
) -> Arc<dyn CredentialProvider> {
    if settings.requires_widget() {
        Arc::new(WidgetCredential::new(widget))
    } else {
        Arc::new(PlaceholderCredential)
    }
}
