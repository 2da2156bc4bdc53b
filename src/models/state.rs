//! Session state snapshot pushed to the presentation surface.

use serde::{Deserialize, Serialize};

use super::ProviderType;

/// Authoritative UI state. Only the orchestrator mutates it; observers
/// receive cloned snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub has_api_key: bool,
    pub has_staged_changes: bool,
    pub is_loading: bool,
    pub generated_message: Option<String>,
    pub error: Option<String>,
    pub current_provider: ProviderType,
    pub provider_label: String,
}

impl Default for SessionState {
    fn default() -> Self {
        let provider = ProviderType::default();
        Self {
            has_api_key: false,
            has_staged_changes: false,
            is_loading: false,
            generated_message: None,
            error: None,
            current_provider: provider,
            provider_label: provider.label().to_string(),
        }
    }
}
