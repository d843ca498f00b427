use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use std::io::Cursor;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Unexpected shape of a single field's channel data.
    #[error("unexpected structure for {0}: {1}")]
    StructuralAnomaly(String, String),
    /// Device rejected the session id; a new login is needed.
    #[error("session expired")]
    AuthenticationExpired,
    /// Device refuses new logins until an existing session times out.
    #[error("maximum amount of sessions reached")]
    AuthenticationExhausted,
    #[error("could not login: {0}")]
    AuthenticationFailed(String),
    #[error("transport failure: {0}")]
    TransportFailure(String),
    #[error("unexpected response: {0}")]
    UnexpectedResponseShape(String),
    #[error("device reported error {0}")]
    DeviceError(u64),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("session store: {0}")]
    SessionStore(String),
    #[error("could not encode metrics")]
    FormatError,
}

impl<'r> Responder<'r, 'static> for Error {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let error = format!(
            "<html><body><h3>500 Internal Server Error</h3><code>{}</code></body></html>",
            self
        );
        Response::build()
            .status(Status::InternalServerError)
            .sized_body(error.len(), Cursor::new(error))
            .header(ContentType::new("text", "html"))
            .ok()
    }
}
