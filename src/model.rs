use crate::api::response::inventory::Inventory;
use crate::api::response::inverters::{self, Inverter};
use crate::api::response::production::Production;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

type Watts = f64;

/// Gateway address and account data. Everything here except the token is set by configuration
/// and does not change while a session is alive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub serial: String,
    /// Bearer token from the last token exchange, reused across restarts.
    #[serde(default, rename = "jwt_token")]
    pub token: Option<String>,
}

impl Credentials {
    /// Overlay non-empty values of `other` on top of `self`.
    ///
    /// A changed username or serial invalidates the cached token.
    pub fn merge(&mut self, other: Credentials) {
        let mut changed = false;
        for (ours, theirs) in [
            (&mut self.username, other.username),
            (&mut self.serial, other.serial),
        ] {
            if !theirs.is_empty() && *ours != theirs {
                *ours = theirs;
                changed = true;
            }
        }
        if !other.host.is_empty() {
            self.host = other.host;
        }
        if !other.password.is_empty() {
            self.password = other.password;
        }
        if changed {
            self.token = None;
        }
        if other.token.is_some() {
            self.token = other.token;
        }
    }
}

/// Identifiers obtained while logging in. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub manager_session_id: Option<String>,
    pub local_session_id: Option<String>,
}

/// A gateway client. One instance drives every request, so the session is never shared.
#[derive(Debug)]
pub struct Envoy {
    pub credentials: Credentials,
    pub session: Session,
    /// Whether `credentials.host` came from mDNS rather than configuration.
    pub discovered: bool,
    pub enlighten_url: String,
    pub client: reqwest::Client,
}

/// Production, consumption and net values for one point in time (W) or one day (Wh).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Readings {
    pub production: Watts,
    pub consumption: Watts,
    pub net: Watts,
}

/// One complete set of gateway readings.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub production: Production,
    pub inventory: Vec<Inventory>,
    pub inverters: Vec<Inverter>,
    pub updated: DateTime<Utc>,
}

impl Snapshot {
    pub fn summary(&self) -> Summary {
        Summary {
            now: self.production.now(),
            today: self.production.today(),
            system_max: inverters::system_max(&self.inverters),
            updated: self.updated,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Summary {
    pub now: Readings,
    pub today: Readings,
    pub system_max: u64,
    pub updated: DateTime<Utc>,
}
