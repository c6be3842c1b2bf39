use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use std::fmt;
use std::io::Cursor;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// No gateway answered the mDNS browse.
    DiscoveryFailed(String),
    /// Cloud login rejected the credentials. Needs operator attention.
    AuthFailed(String),
    TokenExchangeFailed(String),
    /// The gateway no longer accepts the token or no local session is held.
    AuthRequired(String),
    Unreachable(String),
    /// Decoder error and the raw body.
    Decode(String, String),
    NoData,
    InternalError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DiscoveryFailed(s) => write!(f, "gateway discovery failed: {}", s),
            Error::AuthFailed(s) => write!(f, "authentication failed: {}", s),
            Error::TokenExchangeFailed(s) => write!(f, "token exchange failed: {}", s),
            Error::AuthRequired(s) => write!(f, "authentication required: {}", s),
            Error::Unreachable(s) => write!(f, "gateway unreachable: {}", s),
            Error::Decode(e, _) => write!(f, "invalid response: {}", e),
            Error::NoData => write!(f, "no data collected yet"),
            Error::InternalError => write!(f, "internal error"),
        }
    }
}

impl std::error::Error for Error {}

fn html(status: Status, title: &str, detail: String) -> response::Result<'static> {
    let error = format!(
        "<html><body><h3>{}</h3><code>{}</code></body></html>",
        title, detail
    );
    Response::build()
        .status(status)
        .sized_body(error.len(), Cursor::new(error))
        .header(ContentType::new("text", "html"))
        .ok()
}

impl<'r> Responder<'r, 'static> for Error {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        match self {
            Error::NoData => html(
                Status::ServiceUnavailable,
                "503 Service Unavailable",
                String::from("No data has been collected from the gateway yet"),
            ),
            Error::AuthFailed(s) | Error::AuthRequired(s) => html(
                Status::BadGateway,
                "502 Bad Gateway",
                format!("Error while authenticating to the gateway: {}", s),
            ),
            _ => html(
                Status::InternalServerError,
                "Unknown exception",
                self.to_string(),
            ),
        }
    }
}
