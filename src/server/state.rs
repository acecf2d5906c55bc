use crate::gazetteer::{self, GazetteerIndex};
use crate::prayer::TimingsClient;
use crate::settings::SettingsStore;
use std::sync::{Arc, Mutex};

pub struct AppState {
    /// Built once at startup; read-only afterwards.
    pub index: Arc<GazetteerIndex>,
    pub settings: Mutex<SettingsStore>,
    pub client: TimingsClient,
}

impl AppState {
    /// State for a long-running server. A dataset that cannot be fetched leaves
    /// the index empty; routes that do not need it keep working.
    pub fn load(source: &str, settings: SettingsStore, client: TimingsClient) -> Self {
        Self {
            index: Arc::new(gazetteer::load_or_empty(source)),
            settings: Mutex::new(settings),
            client,
        }
    }
}
