pub mod store;

use crate::api::{self, Error};
use crate::model::DeviceEndpoint;
pub use store::{FileSessionStore, SessionStore};

use std::collections::HashMap;

/// Holds the session id of each inverter endpoint and renews it on demand.
pub struct SessionManager {
    client: reqwest::Client,
    store: Box<dyn SessionStore>,
    /// Session id per endpoint base URL.
    sessions: HashMap<String, String>,
}

impl SessionManager {
    /// Create a manager for `device`, picking up the session id persisted by a previous run.
    pub fn new(
        client: reqwest::Client,
        store: Box<dyn SessionStore>,
        device: &DeviceEndpoint,
    ) -> Self {
        let mut sessions = HashMap::new();
        if let Some(sid) = store.get() {
            sessions.insert(device.base_url.to_owned(), sid);
        }

        Self {
            client,
            store,
            sessions,
        }
    }

    /// Cached session id of `device`, empty when there is none.
    pub fn current_token(&self, device: &DeviceEndpoint) -> &str {
        self.sessions.get(&device.base_url).map_or("", String::as_str)
    }

    pub async fn login(&mut self, device: &DeviceEndpoint) -> Result<(), Error> {
        log::info!("Doing new login on {}", device.base_url);

        let sid = api::login(&self.client, device).await?;
        self.store.save(&sid);
        self.sessions.insert(device.base_url.to_owned(), sid);

        Ok(())
    }
}
