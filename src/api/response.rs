use crate::api::Error;
use num_derive::FromPrimitive;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Error codes reported by the inverter in `{"err": <code>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum ErrorCode {
    SessionExpired = 401,
    MaxSessions = 503,
}

#[derive(Debug, Deserialize)]
pub struct LoginResult {
    pub sid: Option<String>,
}

/* Valid login.json response types */
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum LoginResponse {
    Success { result: LoginResult },
    Error { err: Option<u64> },
}

/// Channel readings of one device, keyed by device key.
pub type DevicePayload = BTreeMap<String, Value>;

#[derive(Debug, Deserialize)]
pub struct DeviceValues {
    pub result: BTreeMap<String, Value>,
}

impl DeviceValues {
    /// Unwrap the single `<serial>: {...}` entry the inverter answers with.
    pub fn into_single_device(self) -> Result<(String, DevicePayload), Error> {
        if self.result.len() != 1 {
            return Err(Error::UnexpectedResponseShape(format!(
                "expected exactly one device, got {}: {:?}",
                self.result.len(),
                self.result.keys().collect::<Vec<_>>()
            )));
        }

        let (serial, payload) = self
            .result
            .into_iter()
            .next()
            .ok_or_else(|| Error::UnexpectedResponseShape("empty result".to_string()))?;

        match payload {
            Value::Object(map) => Ok((serial, map.into_iter().collect())),
            other => Err(Error::UnexpectedResponseShape(format!(
                "payload of device {}: {}",
                serial, other
            ))),
        }
    }
}

/* Valid getValues.json response types */
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum GetValuesResponse {
    Values(DeviceValues),
    Error { err: u64 },
}

/// Readings of one field: `{"1": [{"val": ...}, ...]}`, one entry per channel instance.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelData {
    #[serde(rename = "1")]
    pub instances: Vec<Reading>,
}

/// One channel instance. `val` must be present; null means no reading.
#[derive(Debug, Deserialize)]
pub struct Reading {
    #[serde(deserialize_with = "required_nullable")]
    pub val: Option<f64>,
}

/* without `deserialize_with` serde would treat a missing `val` like null */
fn required_nullable<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Option::<f64>::deserialize(d)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn read_resource(filename: &str) -> String {
        let mut d = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        d.push(format!("resources/test/{}", filename));
        fs::read_to_string(d.as_path()).unwrap()
    }

    #[test]
    fn login_success() {
        let input = read_resource("login.json");
        match serde_json::from_str::<LoginResponse>(&input).unwrap() {
            LoginResponse::Success { result } => assert_eq!(Some("abc".to_string()), result.sid),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn login_max_sessions() {
        let input = read_resource("login_max_sessions.json");
        match serde_json::from_str::<LoginResponse>(&input).unwrap() {
            LoginResponse::Error { err } => {
                assert_eq!(
                    Some(ErrorCode::MaxSessions),
                    err.and_then(num::FromPrimitive::from_u64)
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn get_values_single_device() {
        let input = read_resource("getValues.json");
        let output: GetValuesResponse = serde_json::from_str(&input).unwrap();
        match output {
            GetValuesResponse::Values(values) => {
                let (serial, payload) = values.into_single_device().unwrap();
                assert_eq!("0199-B32C7A1F", serial);
                assert!(payload.contains_key("6100_00465700"));
            }
            GetValuesResponse::Error { err } => panic!("unexpected err {}", err),
        }
    }

    #[test]
    fn get_values_session_expired() {
        let input = read_resource("getValues_expired.json");
        match serde_json::from_str::<GetValuesResponse>(&input).unwrap() {
            GetValuesResponse::Error { err } => assert_eq!(
                Some(ErrorCode::SessionExpired),
                num::FromPrimitive::from_u64(err)
            ),
            GetValuesResponse::Values(_) => panic!("expected error response"),
        }
    }

    #[test]
    fn get_values_two_devices_rejected() {
        let input = read_resource("getValues_two_devices.json");
        match serde_json::from_str::<GetValuesResponse>(&input).unwrap() {
            GetValuesResponse::Values(values) => assert!(matches!(
                values.into_single_device(),
                Err(Error::UnexpectedResponseShape(_))
            )),
            GetValuesResponse::Error { .. } => panic!("expected values response"),
        }
    }

    #[test]
    fn get_values_null_payload_rejected() {
        let values: DeviceValues =
            serde_json::from_str(r#"{"result": {"0199-B32C7A1F": null}}"#).unwrap();
        assert!(matches!(
            values.into_single_device(),
            Err(Error::UnexpectedResponseShape(_))
        ));
    }

    #[test]
    fn channel_data_rejects_extra_keys() {
        let result = serde_json::from_str::<ChannelData>(r#"{"1": [], "7": []}"#);
        assert!(result.is_err());
    }

    #[test]
    fn reading_requires_val() {
        assert!(serde_json::from_str::<ChannelData>(r#"{"1": [{"value": 5}]}"#).is_err());

        let channels: ChannelData = serde_json::from_str(r#"{"1": [{"val": null}]}"#).unwrap();
        assert_eq!(None, channels.instances[0].val);
    }

    #[test]
    #[should_panic]
    fn get_values_invalid_json() {
        let input = read_resource("invalid_json.json");
        let _output: GetValuesResponse = serde_json::from_str(&input).unwrap();
    }
}
