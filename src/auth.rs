use crate::api::{self, Error};
use crate::model;
use async_trait::async_trait;

/// The three login steps against Enlighten and the gateway.
#[async_trait]
pub trait Authenticator {
    fn has_token(&self) -> bool;
    fn has_local_session(&self) -> bool;

    /// Cloud login, yields a manager session.
    async fn login(&mut self) -> Result<(), Error>;
    /// Manager session to bearer token.
    async fn get_token(&mut self) -> Result<(), Error>;
    /// Bearer token to local session cookie.
    async fn get_local_session_cookie(&mut self) -> Result<(), Error>;
}

#[async_trait]
impl Authenticator for model::Envoy {
    fn has_token(&self) -> bool {
        self.credentials.token.is_some()
    }

    fn has_local_session(&self) -> bool {
        self.session.local_session_id.is_some()
    }

    async fn login(&mut self) -> Result<(), Error> {
        api::login(self).await
    }

    async fn get_token(&mut self) -> Result<(), Error> {
        api::get_token(self).await
    }

    async fn get_local_session_cookie(&mut self) -> Result<(), Error> {
        api::get_local_session_cookie(self).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    NoToken,
    ManagerAuthenticated,
    TokenIssued,
    LocalSessionValid,
}

/// Make sure `gateway` holds a local session.
///
/// With a cached token the gateway is asked to validate it first. Only when it refuses
/// (`AuthRequired`) is the full login sequence run, once. Without a cached token the full
/// sequence runs directly and a refusal is returned to the caller.
pub async fn try_login<A>(gateway: &mut A) -> Result<(), Error>
where
    A: Authenticator + Send + ?Sized,
{
    let mut state = if gateway.has_token() {
        AuthState::TokenIssued
    } else {
        AuthState::NoToken
    };
    let mut fresh_login = state == AuthState::NoToken;

    loop {
        log::trace!("auth state: {:?}", state);
        state = match state {
            AuthState::NoToken => {
                gateway.login().await?;
                AuthState::ManagerAuthenticated
            }
            AuthState::ManagerAuthenticated => {
                gateway.get_token().await?;
                AuthState::TokenIssued
            }
            AuthState::TokenIssued => {
                let checked = gateway.get_local_session_cookie().await.and_then(|_| {
                    if gateway.has_local_session() {
                        Ok(())
                    } else {
                        Err(Error::AuthRequired(String::from(
                            "gateway did not issue a session",
                        )))
                    }
                });
                match checked {
                    Ok(()) => AuthState::LocalSessionValid,
                    Err(Error::AuthRequired(reason)) if !fresh_login => {
                        log::info!("Cached token refused ({}), logging in again", reason);
                        fresh_login = true;
                        AuthState::NoToken
                    }
                    Err(e) => return Err(e),
                }
            }
            AuthState::LocalSessionValid => return Ok(()),
        }
    }
}
