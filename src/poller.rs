use crate::api::response::{DevicePayload, DeviceValues};
use crate::api::{self, Error};
use crate::catalog;
use crate::extract;
use crate::model::{
    DeviceEndpoint, FieldDescriptor, MetricSample, RawFieldValue, METRIC_TYPE, ONLINE,
};
use crate::queue::MetricsQueue;
use crate::session::SessionManager;

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const DEFAULT_SAMPLE_RATE: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_LOGIN_RETRIES: u32 = 1;

const SEPARATOR: &str = "----------------------------------------";

/// Polls a single inverter and feeds its samples into a `MetricsQueue`.
pub struct Poller {
    device: DeviceEndpoint,
    client: reqwest::Client,
    sessions: SessionManager,
    queue: MetricsQueue,
    sample_rate: Duration,
    /// Re-logins allowed within one cycle before an expired session fails it.
    max_login_retries: u32,
}

impl Poller {
    pub fn new(
        device: DeviceEndpoint,
        client: reqwest::Client,
        sessions: SessionManager,
        queue: MetricsQueue,
    ) -> Self {
        Self {
            device,
            client,
            sessions,
            queue,
            sample_rate: DEFAULT_SAMPLE_RATE,
            max_login_retries: DEFAULT_MAX_LOGIN_RETRIES,
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: Duration) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_max_login_retries(mut self, max_login_retries: u32) -> Self {
        self.max_login_retries = max_login_retries;
        self
    }

    pub fn device(&self) -> &DeviceEndpoint {
        &self.device
    }

    /// Request all catalog fields, logging in again when the session has expired.
    async fn fetch(&mut self) -> Result<DeviceValues, Error> {
        let keys = catalog::device_keys();
        let mut logins = 0;

        loop {
            let sid = self.sessions.current_token(&self.device);
            match api::get_values(&self.client, &self.device, sid, &keys).await {
                Err(Error::AuthenticationExpired) if logins < self.max_login_retries => {
                    logins += 1;
                    self.sessions.login(&self.device).await?;
                }
                result => return result,
            }
        }
    }

    /// Run one fetch/parse cycle and return the resulting sample.
    pub async fn poll_once(&mut self) -> Result<MetricSample, Error> {
        let (serial, payload) = self.fetch().await?.into_single_device()?;

        log::info!("{}", SEPARATOR);
        log::info!("Device {} at {}", serial, self.device.base_url);

        Ok(build_sample(serial, &payload, unix_timestamp()))
    }

    /// Run one cycle and enqueue its sample. Failures are logged, never returned.
    pub async fn cycle(&mut self) {
        match self.poll_once().await {
            Ok(sample) => self.queue.enqueue(sample),
            Err(e) => log::error!(
                "Could not read SMA device values from {}: {}",
                self.device.base_url,
                e
            ),
        }
    }

    /// Poll forever, sleeping `sample_rate` between cycles.
    pub async fn run(mut self) {
        loop {
            self.cycle().await;
            log::info!("{}", SEPARATOR);
            log::info!("Sleeping for {} seconds", self.sample_rate.as_secs());
            tokio::time::sleep(self.sample_rate).await;
        }
    }
}

fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

fn log_field(field: &FieldDescriptor, values: &[RawFieldValue]) {
    match values {
        [] => log::info!("* {}: No values", field.description),
        [Some(value)] => log::info!("* {}: {}{}", field.description, value, field.unit),
        [None] => log::info!("* {}: None", field.description),
        _ => {
            log::info!("* {}:", field.description);
            for value in values {
                match value {
                    Some(value) => log::info!("    {}{}", value, field.unit),
                    None => log::info!("    None"),
                }
            }
        }
    }
}

/// Turn the payload of one device into a sample. `online` is always set and is true iff
/// the grid frequency was reported.
pub fn build_sample(device: String, payload: &DevicePayload, timestamp: f64) -> MetricSample {
    let mut values = BTreeMap::new();

    for field in catalog::FIELDS.iter() {
        match payload.get(field.device_key) {
            Some(raw) => {
                let extracted = extract::extract(field.device_key, raw, field.factor);
                log_field(field, &extracted);
                if let Some(value) = extract::reduce(&extracted) {
                    values.insert(field.name.to_string(), value);
                }
            }
            None => log::info!("* Missing key: {} - {}", field.device_key, field.description),
        }
    }

    for (key, raw) in payload {
        if catalog::lookup(key).is_none() {
            log::info!("* Unknown key {}: {}", key, raw);
        }
    }

    let online = values.contains_key(catalog::FREQUENCY);
    if !online {
        log::info!("* Device {} is offline", device);
    }
    values.insert(ONLINE.to_string(), if online { 1.0 } else { 0.0 });

    MetricSample {
        metric_type: METRIC_TYPE.to_string(),
        device,
        timestamp,
        values,
    }
}
