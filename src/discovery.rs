use crate::api::Error;
use mdns_sd::{ServiceDaemon, ServiceEvent};
use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};

pub const SERVICE_TYPE: &str = "_enphase-envoy._tcp.local.";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// A running mDNS browse. Dropping it shuts the daemon down.
struct Subscription {
    daemon: ServiceDaemon,
    service_type: &'static str,
}

impl Subscription {
    fn new(service_type: &'static str) -> Result<Self, Error> {
        let daemon = ServiceDaemon::new().map_err(|e| Error::DiscoveryFailed(e.to_string()))?;
        Ok(Subscription {
            daemon,
            service_type,
        })
    }

    /// Wait for the first resolved service with an IPv4 address, then stop browsing.
    fn first_ipv4(&self, timeout: Duration) -> Result<Option<Ipv4Addr>, Error> {
        let receiver = self
            .daemon
            .browse(self.service_type)
            .map_err(|e| Error::DiscoveryFailed(e.to_string()))?;
        let deadline = Instant::now() + timeout;

        let found = loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break None;
            }
            match receiver.recv_timeout(remaining) {
                Ok(ServiceEvent::ServiceResolved(info)) => {
                    log::debug!("dnssd-lookup: {}", info.get_fullname());
                    if let Some(address) = first_ipv4(info.get_addresses()) {
                        break Some(address);
                    }
                }
                Ok(ServiceEvent::SearchStopped(_)) => break None,
                Ok(_) => {}
                Err(_) => break None,
            }
        };

        if let Err(e) = self.daemon.stop_browse(self.service_type) {
            log::trace!("stop_browse: {}", e);
        }
        Ok(found)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Err(e) = self.daemon.shutdown() {
            log::trace!("mdns shutdown: {}", e);
        }
    }
}

fn first_ipv4<'a, I>(addresses: I) -> Option<Ipv4Addr>
where
    I: IntoIterator<Item = &'a IpAddr>,
{
    addresses.into_iter().find_map(|address| match address {
        IpAddr::V4(v4) => Some(*v4),
        IpAddr::V6(_) => None,
    })
}

/// Find the gateway on the local network.
pub async fn discover(timeout: Duration) -> Result<IpAddr, Error> {
    let found = tokio::task::spawn_blocking(move || {
        Subscription::new(SERVICE_TYPE)?.first_ipv4(timeout)
    })
    .await
    .map_err(|e| Error::DiscoveryFailed(e.to_string()))??;

    match found {
        Some(address) => {
            log::debug!("Found envoy host: {}", address);
            Ok(IpAddr::V4(address))
        }
        None => Err(Error::DiscoveryFailed(format!(
            "no {} service answered within {:?}",
            SERVICE_TYPE, timeout
        ))),
    }
}
