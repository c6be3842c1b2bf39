pub mod endpoint;
pub mod error;
pub mod response;

use crate::model;
pub use error::Error;
use reqwest::header::COOKIE;
use reqwest::Response;
use response::home::Home;
use response::info::Info;
use response::inventory::Inventory;
use response::inverters::{self, Inverter};
use response::login::{Login, Token, LOGIN_SUCCESS};
use response::production::Production;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Marker the gateway puts in the `check_jwt` body when it accepts the token.
const VALID_TOKEN: &str = "Valid token";

pub fn envoy(
    credentials: model::Credentials,
    enlighten_url: String,
    timeout: Duration,
) -> Result<model::Envoy, Error> {
    /* Gateways ship a self-signed certificate and handle one connection at a time */
    let client = reqwest::ClientBuilder::new()
        .cookie_store(true)
        .danger_accept_invalid_certs(true)
        .timeout(timeout)
        .pool_max_idle_per_host(0)
        .build()
        .or(Err(Error::InternalError))?;

    Ok(model::Envoy {
        discovered: false,
        credentials,
        session: model::Session::default(),
        enlighten_url,
        client,
    })
}

/// Map transport and non-2xx errors to `Error`. 401 and 403 mean the credentials were refused.
fn map_api_err(error: reqwest::Error) -> Error {
    match error.status() {
        Some(http::StatusCode::UNAUTHORIZED) | Some(http::StatusCode::FORBIDDEN) => {
            Error::AuthRequired(error.to_string())
        }
        _ => Error::Unreachable(error.to_string()),
    }
}

async fn read_body(response: Response) -> Result<String, Error> {
    response
        .text()
        .await
        .map_err(|e| Error::Unreachable(format!("Error reading response: {}", e)))
}

fn cookie(name: &str, value: &str) -> String {
    format!("{}={}", name, value)
}

/// Log in to Enlighten and keep the manager session id.
pub async fn login(envoy: &mut model::Envoy) -> Result<(), Error> {
    log::debug!("Login");

    let url = format!("{}{}", envoy.enlighten_url, endpoint::LOGIN);
    let form = [
        ("user[email]", envoy.credentials.username.as_str()),
        ("user[password]", envoy.credentials.password.as_str()),
    ];

    let response = envoy
        .client
        .post(url)
        .form(&form)
        .send()
        .await
        .and_then(Response::error_for_status)
        .map_err(|e| match map_api_err(e) {
            Error::AuthRequired(message) => Error::AuthFailed(message),
            other => other,
        })?;
    let text = read_body(response).await?;

    match serde_json::from_str::<Login>(&text) {
        Ok(Login {
            message,
            session_id: Some(session_id),
        }) if message == LOGIN_SUCCESS => {
            envoy.session.manager_session_id = Some(session_id);
            Ok(())
        }
        Ok(Login { message, .. }) => Err(Error::AuthFailed(format!(
            "login on enlighten failed: {}",
            message
        ))),
        Err(e) => {
            log::debug!("login failure:\n{}", text);
            Err(Error::AuthFailed(e.to_string()))
        }
    }
}

/// Exchange the manager session for a bearer token scoped to the gateway serial.
pub async fn get_token(envoy: &mut model::Envoy) -> Result<(), Error> {
    log::debug!("GetToken");

    let session_id = envoy
        .session
        .manager_session_id
        .as_deref()
        .ok_or_else(|| Error::TokenExchangeFailed(String::from("not logged in to enlighten")))?;
    let url = format!("{}{}", envoy.enlighten_url, endpoint::TOKEN);

    let response = envoy
        .client
        .get(url)
        .query(&[("serial_num", envoy.credentials.serial.as_str())])
        .header(COOKIE, cookie(endpoint::MANAGER_SESSION_COOKIE, session_id))
        .send()
        .await
        .and_then(Response::error_for_status)
        .map_err(|e| match map_api_err(e) {
            Error::AuthRequired(message) => Error::TokenExchangeFailed(message),
            other => other,
        })?;
    let text = read_body(response).await?;

    match serde_json::from_str::<Token>(&text) {
        Ok(token) => {
            envoy.credentials.token = Some(token.token);
            Ok(())
        }
        Err(e) => {
            log::debug!("token exchange failure:\n{}", text);
            Err(Error::TokenExchangeFailed(e.to_string()))
        }
    }
}

/// Present the bearer token to the gateway and keep the `sessionId` cookie it hands back.
///
/// A body without the success marker is not an error, but leaves the local session unset.
pub async fn get_local_session_cookie(envoy: &mut model::Envoy) -> Result<(), Error> {
    log::debug!("GetLocalSessionCookie");

    envoy.session.local_session_id = None;
    let token = envoy
        .credentials
        .token
        .as_deref()
        .ok_or_else(|| Error::AuthRequired(String::from("no bearer token")))?;
    let url = format!("https://{}{}", envoy.credentials.host, endpoint::CHECK_JWT);

    let response = envoy
        .client
        .get(url)
        .bearer_auth(token)
        .send()
        .await
        .map_err(map_api_err)?;

    envoy.session.local_session_id = local_session(response).await?;
    Ok(())
}

/// The `sessionId` cookie of a `check_jwt` response, if the body confirms the token.
async fn local_session(response: Response) -> Result<Option<String>, Error> {
    let status = response.status();
    if status.as_u16() >= 400 {
        return Err(Error::AuthRequired(format!("gateway responded {}", status)));
    }

    let session_id = response
        .cookies()
        .find(|cookie| cookie.name() == endpoint::LOCAL_SESSION_COOKIE)
        .map(|cookie| String::from(cookie.value()));
    let body = read_body(response).await?;

    if body.contains(VALID_TOKEN) {
        Ok(session_id)
    } else {
        log::warn!("Gateway did not confirm the token: {}", body);
        Ok(None)
    }
}

async fn get_str(envoy: &model::Envoy, endpoint: &endpoint::Endpoint) -> Result<String, Error> {
    let session_id = envoy
        .session
        .local_session_id
        .as_deref()
        .ok_or_else(|| Error::AuthRequired(String::from("no local session")))?;
    let url = format!("http://{}{}", envoy.credentials.host, endpoint);

    let response = envoy
        .client
        .get(url)
        .header(COOKIE, cookie(endpoint::LOCAL_SESSION_COOKIE, session_id))
        .send()
        .await
        .and_then(Response::error_for_status)
        .map_err(map_api_err)?;
    read_body(response).await
}

async fn get_json<T: DeserializeOwned>(
    envoy: &model::Envoy,
    endpoint: &endpoint::Endpoint,
) -> Result<T, Error> {
    let text = get_str(envoy, endpoint).await?;
    log::trace!("endpoint: {}, response_text: {}", endpoint, text);

    match serde_json::from_str(&text) {
        Ok(value) => Ok(value),
        Err(e) => {
            log::debug!("Undecodable response from {}: {}", endpoint, text);
            Err(Error::Decode(e.to_string(), text))
        }
    }
}

async fn get_xml<T: DeserializeOwned>(
    envoy: &model::Envoy,
    endpoint: &endpoint::Endpoint,
) -> Result<T, Error> {
    let text = get_str(envoy, endpoint).await?;
    log::trace!("endpoint: {}, response_text: {}", endpoint, text);

    match serde_xml_rs::from_str(&text) {
        Ok(value) => Ok(value),
        Err(e) => {
            log::debug!("Undecodable response from {}: {}", endpoint, text);
            Err(Error::Decode(e.to_string(), text))
        }
    }
}

pub async fn production(envoy: &model::Envoy) -> Result<Production, Error> {
    get_json(envoy, endpoint::PRODUCTION).await
}

pub async fn home(envoy: &model::Envoy) -> Result<Home, Error> {
    get_json(envoy, endpoint::HOME).await
}

pub async fn inventory(envoy: &model::Envoy) -> Result<Vec<Inventory>, Error> {
    get_json(envoy, endpoint::INVENTORY).await
}

pub async fn info(envoy: &model::Envoy) -> Result<Info, Error> {
    get_xml(envoy, endpoint::INFO).await
}

pub async fn inverters(envoy: &model::Envoy) -> Result<Vec<Inverter>, Error> {
    get_json(envoy, endpoint::INVERTERS).await
}

/// Current production, consumption and net power in W.
pub async fn now(envoy: &model::Envoy) -> Result<model::Readings, Error> {
    production(envoy).await.map(|p| p.now())
}

/// Production, consumption and net energy since midnight in Wh.
pub async fn today(envoy: &model::Envoy) -> Result<model::Readings, Error> {
    production(envoy).await.map(|p| p.today())
}

/// Sum of the maximum power every inverter has reported.
pub async fn system_max(envoy: &model::Envoy) -> Result<u64, Error> {
    inverters(envoy)
        .await
        .map(|list| inverters::system_max(&list))
}

#[cfg(test)]
mod test {
    use super::{envoy, get_token, local_session, login, production, Error};
    use crate::model::{Credentials, Envoy};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn reply(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    /// Whether `request` holds the headers and the whole body announced by them.
    fn complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        match text.find("\r\n\r\n") {
            Some(end) => {
                let length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                request.len() >= end + 4 + length
            }
            None => false,
        }
    }

    /// Answer a single request on a local port and hand back what was received.
    async fn serve_once(response: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let request = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || complete(&request) {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request).to_lowercase()
        });

        (address, request)
    }

    fn test_envoy(address: &str) -> Envoy {
        envoy(
            Credentials {
                host: String::from(address),
                username: String::from("user@example.com"),
                password: String::from("secret"),
                serial: String::from("122233103807"),
                token: None,
            },
            format!("http://{}", address),
            Duration::from_secs(3),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn login_keeps_session_id() {
        let (address, request) =
            serve_once(reply("200 OK", r#"{"message":"success","session_id":"abc123"}"#)).await;
        let mut envoy = test_envoy(&address);

        login(&mut envoy).await.unwrap();
        assert_eq!(Some(String::from("abc123")), envoy.session.manager_session_id);

        let request = request.await.unwrap();
        assert!(request.starts_with("post /login/login.json"));
        assert!(request.contains("user%5bemail%5d="));
    }

    #[tokio::test]
    async fn login_rejected() {
        let (address, _) = serve_once(reply("200 OK", r#"{"message":"failure"}"#)).await;
        let mut envoy = test_envoy(&address);

        match login(&mut envoy).await {
            Err(Error::AuthFailed(message)) => assert!(message.contains("failure")),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(None, envoy.session.manager_session_id);
    }

    #[tokio::test]
    async fn login_unauthorized() {
        let (address, _) = serve_once(reply("401 Unauthorized", "")).await;
        let mut envoy = test_envoy(&address);

        assert!(matches!(login(&mut envoy).await, Err(Error::AuthFailed(_))));
    }

    #[tokio::test]
    async fn login_during_outage_is_transient() {
        let (address, _) = serve_once(reply(
            "503 Service Unavailable",
            "<html><body>Down for maintenance</body></html>",
        ))
        .await;
        let mut envoy = test_envoy(&address);

        assert!(matches!(login(&mut envoy).await, Err(Error::Unreachable(_))));
    }

    #[tokio::test]
    async fn token_for_serial() {
        let (address, request) =
            serve_once(reply("200 OK", r#"{"token":"jwt","expires_at":1709536000}"#)).await;
        let mut envoy = test_envoy(&address);
        envoy.session.manager_session_id = Some(String::from("abc123"));

        get_token(&mut envoy).await.unwrap();
        assert_eq!(Some(String::from("jwt")), envoy.credentials.token);

        let request = request.await.unwrap();
        assert!(request.starts_with("get /entrez-auth-token?serial_num=122233103807"));
        assert!(request.contains("cookie: _enlighten_4_session=abc123"));
    }

    #[tokio::test]
    async fn token_undecodable() {
        let (address, _) = serve_once(reply("200 OK", "<html></html>")).await;
        let mut envoy = test_envoy(&address);
        envoy.session.manager_session_id = Some(String::from("abc123"));

        assert!(matches!(
            get_token(&mut envoy).await,
            Err(Error::TokenExchangeFailed(_))
        ));
        assert_eq!(None, envoy.credentials.token);
    }

    #[tokio::test]
    async fn token_needs_login() {
        let mut envoy = test_envoy("127.0.0.1:9");
        assert!(matches!(
            get_token(&mut envoy).await,
            Err(Error::TokenExchangeFailed(_))
        ));
    }

    fn check_jwt(status: u16, cookie: Option<&str>, body: &'static str) -> reqwest::Response {
        let mut builder = http::Response::builder().status(status);
        if let Some(cookie) = cookie {
            builder = builder.header(http::header::SET_COOKIE, cookie);
        }
        reqwest::Response::from(builder.body(body).unwrap())
    }

    #[tokio::test]
    async fn valid_token_keeps_session_cookie() {
        let response = check_jwt(
            200,
            Some("sessionId=abc; Path=/; HttpOnly"),
            "<!DOCTYPE html><h2>Valid token.</h2>",
        );
        assert_eq!(Some(String::from("abc")), local_session(response).await.unwrap());
    }

    #[tokio::test]
    async fn unconfirmed_token_keeps_nothing() {
        let response = check_jwt(200, Some("sessionId=abc; Path=/"), "<h2>Invalid token</h2>");
        assert_eq!(None, local_session(response).await.unwrap());

        let response = check_jwt(200, None, "<h2>Valid token.</h2>");
        assert_eq!(None, local_session(response).await.unwrap());
    }

    #[tokio::test]
    async fn refused_token_requires_auth() {
        let response = check_jwt(401, None, "");
        assert!(matches!(
            local_session(response).await,
            Err(Error::AuthRequired(_))
        ));
    }

    #[tokio::test]
    async fn telemetry_sends_session_cookie() {
        let (address, request) = serve_once(reply("200 OK", "{}")).await;
        let mut envoy = test_envoy(&address);
        envoy.session.local_session_id = Some(String::from("abc"));

        production(&envoy).await.unwrap();

        let request = request.await.unwrap();
        assert!(request.starts_with("get /production.json?details=1"));
        assert!(request.contains("cookie: sessionid=abc"));
    }

    #[tokio::test]
    async fn telemetry_undecodable_keeps_body() {
        let (address, _) = serve_once(reply("200 OK", "{\"production\": [")).await;
        let mut envoy = test_envoy(&address);
        envoy.session.local_session_id = Some(String::from("abc"));

        match production(&envoy).await {
            Err(Error::Decode(_, body)) => assert_eq!("{\"production\": [", body),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn telemetry_unauthorized() {
        let (address, _) = serve_once(reply("401 Unauthorized", "")).await;
        let mut envoy = test_envoy(&address);
        envoy.session.local_session_id = Some(String::from("abc"));

        assert!(matches!(production(&envoy).await, Err(Error::AuthRequired(_))));
    }

    #[tokio::test]
    async fn telemetry_server_error() {
        let (address, _) = serve_once(reply("500 Internal Server Error", "")).await;
        let mut envoy = test_envoy(&address);
        envoy.session.local_session_id = Some(String::from("abc"));

        assert!(matches!(production(&envoy).await, Err(Error::Unreachable(_))));
    }

    #[tokio::test]
    async fn telemetry_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);
        let mut envoy = test_envoy(&address);
        envoy.session.local_session_id = Some(String::from("abc"));

        assert!(matches!(production(&envoy).await, Err(Error::Unreachable(_))));
    }

    #[tokio::test]
    async fn telemetry_needs_local_session() {
        let envoy = test_envoy("127.0.0.1:9");
        assert!(matches!(production(&envoy).await, Err(Error::AuthRequired(_))));
    }
}
