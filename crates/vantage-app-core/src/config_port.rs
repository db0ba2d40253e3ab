// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Settings port shared across Vantage tools (CLI, viewers).

use tracing::warn;

use crate::config::{ConfigService, ConfigStore};
use crate::settings::{StreamSettings, SETTINGS_KEY};

/// Config-facing port for loading/saving stream settings.
pub trait SettingsPort {
    /// Load stream settings (returns None if missing or unreadable).
    fn load_settings(&self) -> Option<StreamSettings>;
    /// Persist stream settings (best-effort; impl may log errors internally).
    fn save_settings(&self, settings: &StreamSettings);
}

impl<S: ConfigStore> SettingsPort for ConfigService<S> {
    fn load_settings(&self) -> Option<StreamSettings> {
        match self.load(SETTINGS_KEY) {
            Ok(settings) => settings,
            Err(err) => {
                warn!(%err, "ignoring unreadable stream settings");
                None
            }
        }
    }

    fn save_settings(&self, settings: &StreamSettings) {
        if let Err(err) = self.save(SETTINGS_KEY, settings) {
            warn!(%err, "failed to save stream settings");
        }
    }
}
