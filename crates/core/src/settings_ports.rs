//! Port interface for API settings

use apsis_domain::ApiSettings;

/// Supplies the current API settings.
///
/// Read on every request so changes apply without rebuilding the client.
pub trait SettingsProvider: Send + Sync {
    fn settings(&self) -> ApiSettings;
}

impl SettingsProvider for ApiSettings {
    fn settings(&self) -> ApiSettings {
        self.clone()
    }
}
