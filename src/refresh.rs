use crate::api::{self, Error};
use crate::auth::{self, Authenticator};
use crate::cache::CacheStore;
use crate::discovery;
use crate::metrics;
use crate::model::{self, Credentials, Snapshot};
use crate::state::SharedSnapshot;
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{self, MissedTickBehavior};

/// Everything the refresh loop needs from a gateway.
#[async_trait]
pub trait Gateway: Authenticator + Send {
    fn credentials(&self) -> &Credentials;

    /// Resolve the gateway address if it is not known yet.
    async fn locate(&mut self) -> Result<(), Error>;

    /// Read production, inventory and inverters in one go.
    async fn snapshot(&mut self) -> Result<Snapshot, Error>;

    /// Called when the gateway could not be reached.
    fn unreachable(&mut self) {}
}

#[async_trait]
impl Gateway for model::Envoy {
    fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    async fn locate(&mut self) -> Result<(), Error> {
        if self.credentials.host.is_empty() {
            let address = discovery::discover(discovery::DEFAULT_TIMEOUT).await?;
            self.credentials.host = address.to_string();
            self.discovered = true;
        }
        Ok(())
    }

    async fn snapshot(&mut self) -> Result<Snapshot, Error> {
        let production = api::production(self).await?;
        let inventory = api::inventory(self).await?;
        let inverters = api::inverters(self).await?;

        Ok(Snapshot {
            production,
            inventory,
            inverters,
            updated: Utc::now(),
        })
    }

    /// A discovered address may have moved, look it up again next time.
    fn unreachable(&mut self) {
        if self.discovered {
            self.credentials.host.clear();
            self.discovered = false;
        }
    }
}

/// One refresh: locate, log in, read, publish. Nothing is published unless every read succeeds.
pub async fn cycle<G: Gateway>(gateway: &mut G, state: &SharedSnapshot) -> Result<(), Error> {
    gateway.locate().await?;
    auth::try_login(gateway).await?;
    let snapshot = gateway.snapshot().await?;

    metrics::record(&snapshot);
    state.publish(snapshot);
    Ok(())
}

/// Refresh `state` every `interval` until `shutdown` fires or its sender is dropped.
///
/// Credentials are written to `store` whenever the token changes and once more on exit. A rejected
/// cloud login suspends refreshing, the credentials need fixing first. The gateway is handed back
/// once the loop has stopped.
pub async fn run<G: Gateway>(
    mut gateway: G,
    store: CacheStore,
    state: SharedSnapshot,
    interval: Duration,
    mut shutdown: oneshot::Receiver<()>,
) -> G {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut saved_token = gateway.credentials().token.clone();
    let mut suspended = false;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                log::debug!("exiting data gather routine");
                break;
            }
            _ = ticker.tick() => {}
        }

        if suspended {
            continue;
        }

        match cycle(&mut gateway, &state).await {
            Ok(()) => log::trace!("snapshot refreshed"),
            Err(e) => {
                metrics::REFRESH_FAILURES.inc();
                match e {
                    Error::AuthFailed(_) => {
                        log::error!("{}; refreshing suspended until restart", e);
                        suspended = true;
                    }
                    Error::Unreachable(_) | Error::DiscoveryFailed(_) => {
                        log::warn!("Refresh failed: {}", e);
                        gateway.unreachable();
                    }
                    _ => log::error!("Refresh failed: {}", e),
                }
            }
        }

        if gateway.credentials().token != saved_token {
            store.save(gateway.credentials());
            saved_token = gateway.credentials().token.clone();
        }
    }

    store.save(gateway.credentials());
    gateway
}
