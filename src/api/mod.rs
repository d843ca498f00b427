pub mod endpoint;
pub mod error;
pub mod response;

use crate::model;
pub use error::Error;
use response::{DeviceValues, ErrorCode, GetValuesResponse, LoginResponse};
use serde_json::{json, Value};
use std::time::Duration;

/// Build a `DeviceEndpoint`, defaulting to `https://` when `url` carries no scheme.
pub fn device(url: &str, password: String) -> model::DeviceEndpoint {
    let url = url.trim_end_matches('/');
    let base_url = if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    };

    model::DeviceEndpoint { base_url, password }
}

/// HTTP client for talking to a single inverter.
///
/// SMA inverters serve WebConnect with a self-signed certificate, so certificate
/// validation is disabled here. The bypass only applies to clients built by this
/// function.
pub fn client(timeout: Duration) -> Result<reqwest::Client, Error> {
    reqwest::ClientBuilder::new()
        .danger_accept_invalid_certs(true)
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {}", e)))
}

/// Map failed request or non-2xx HTTP response to Error
fn map_transport_err(error: reqwest::Error) -> Error {
    match error.status() {
        Some(http::StatusCode::UNAUTHORIZED) => Error::AuthenticationExpired,
        _ => Error::TransportFailure(error.to_string()),
    }
}

fn map_login_err(code: Option<u64>) -> Error {
    match code.and_then(num::FromPrimitive::from_u64) {
        Some(ErrorCode::MaxSessions) => Error::AuthenticationExhausted,
        _ => Error::AuthenticationFailed(
            code.map_or_else(|| "unknown".to_string(), |c| c.to_string()),
        ),
    }
}

async fn post(
    request: reqwest::RequestBuilder,
    endpoint: &endpoint::Endpoint,
) -> Result<Value, Error> {
    let response_text = request
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(map_transport_err)?
        .text()
        .await
        .map_err(|e| Error::TransportFailure(format!("error reading response: {}", e)))?;

    log::trace!("endpoint: {}, response_text: {}", endpoint, response_text);

    serde_json::from_str::<Value>(&response_text).map_err(|e| {
        Error::TransportFailure(format!("invalid JSON ({}): {}", e, response_text))
    })
}

/// Log in as `usr` and return the session id issued by the inverter.
pub async fn login(
    client: &reqwest::Client,
    device: &model::DeviceEndpoint,
) -> Result<String, Error> {
    let url = format!("{}{}", device.base_url, endpoint::LOGIN);
    let request_body = json!({"right": "usr", "pass": device.password});

    /* a 401 here is a rejected login, not an expired session */
    let value = post(client.post(url).json(&request_body), endpoint::LOGIN)
        .await
        .map_err(|e| match e {
            Error::AuthenticationExpired => Error::AuthenticationFailed(
                http::StatusCode::UNAUTHORIZED.as_u16().to_string(),
            ),
            other => other,
        })?;

    match serde_json::from_value::<LoginResponse>(value.clone()) {
        Ok(LoginResponse::Success { result }) => result.sid.ok_or_else(|| {
            Error::AuthenticationFailed("no session id returned".to_string())
        }),
        Ok(LoginResponse::Error { err }) => Err(map_login_err(err)),
        Err(e) => Err(Error::TransportFailure(format!(
            "unexpected login response {}: {}",
            value, e
        ))),
    }
}

/// Read `keys` from the inverter using session `sid`.
pub async fn get_values(
    client: &reqwest::Client,
    device: &model::DeviceEndpoint,
    sid: &str,
    keys: &[&str],
) -> Result<DeviceValues, Error> {
    let url = format!("{}{}", device.base_url, endpoint::GET_VALUES);
    let request_body = json!({"destDev": [], "keys": keys});

    let request = client
        .post(url)
        .query(&[("sid", sid)])
        .json(&request_body);
    let value = post(request, endpoint::GET_VALUES).await?;

    match serde_json::from_value::<GetValuesResponse>(value.clone()) {
        Ok(GetValuesResponse::Values(values)) => Ok(values),
        Ok(GetValuesResponse::Error { err }) => match num::FromPrimitive::from_u64(err) {
            Some(ErrorCode::SessionExpired) => Err(Error::AuthenticationExpired),
            _ => Err(Error::DeviceError(err)),
        },
        Err(e) => Err(Error::TransportFailure(format!(
            "unexpected getValues response {}: {}",
            value, e
        ))),
    }
}
