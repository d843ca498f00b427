use crate::api::response::ChannelData;
use crate::api::Error;
use crate::model::RawFieldValue;
use serde::Deserialize;
use serde_json::Value;

fn parse_channels(device_key: &str, raw: &Value) -> Result<ChannelData, Error> {
    ChannelData::deserialize(raw)
        .map_err(|e| Error::StructuralAnomaly(device_key.to_string(), format!("{} ({})", raw, e)))
}

/// Scale every channel instance of `device_key`, keeping device order. A malformed
/// container is logged and yields no values.
pub fn extract(device_key: &str, raw: &Value, factor: f64) -> Vec<RawFieldValue> {
    match parse_channels(device_key, raw) {
        Ok(channels) => channels
            .instances
            .iter()
            .map(|reading| reading.val.map(|v| v / factor))
            .collect(),
        Err(e) => {
            log::warn!("* {}", e);
            Vec::new()
        }
    }
}

/// Collapse extracted values into one: absent readings are dropped, the rest averaged.
pub fn reduce(values: &[RawFieldValue]) -> Option<f64> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    match present.len() {
        0 => None,
        1 => Some(present[0]),
        n => Some(present.iter().sum::<f64>() / n as f64),
    }
}
