// ABOUTME: Name resolution used to decide whether a known_hosts entry still points anywhere
// ABOUTME: Forward lookups for hostnames, reverse lookups for IP literals, with an optional per-lookup deadline

use crate::ssh::HostToken;
use std::net::IpAddr;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// DNS lookups needed by the scan. Any failure is reported as `false`.
pub trait Resolver {
    /// Forward lookup: hostname to at least one address
    fn resolve_hostname(&self, hostname: &str) -> bool;

    /// Reverse lookup: address literal to a name
    fn resolve_address(&self, address: &str) -> bool;
}

/// Check a host token with the lookup its kind calls for.
pub fn host_resolves(resolver: &dyn Resolver, host: &HostToken) -> bool {
    match host {
        HostToken::Pair { hostname, .. } => resolver.resolve_hostname(hostname),
        HostToken::Ipv6(address) | HostToken::Ipv4(address) => resolver.resolve_address(address),
        HostToken::Hostname(hostname) => resolver.resolve_hostname(hostname),
    }
}

/// Resolver backed by the system's getaddrinfo/getnameinfo.
pub struct SystemResolver {
    timeout: Option<Duration>,
}

impl SystemResolver {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    // The lookup thread is detached if the deadline passes and finishes whenever
    // the system resolver returns. Nothing caps how many can pile up while DNS hangs.
    fn with_deadline<F>(&self, what: &str, lookup: F) -> bool
    where
        F: FnOnce() -> bool + Send + 'static,
    {
        let Some(limit) = self.timeout else {
            return lookup();
        };

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(lookup());
        });

        match rx.recv_timeout(limit) {
            Ok(resolved) => resolved,
            Err(_) => {
                tracing::debug!("Lookup of {} timed out after {:?}", what, limit);
                false
            }
        }
    }
}

impl Resolver for SystemResolver {
    fn resolve_hostname(&self, hostname: &str) -> bool {
        let name = hostname.to_string();
        self.with_deadline(hostname, move || forward_lookup(&name))
    }

    fn resolve_address(&self, address: &str) -> bool {
        let Ok(ip) = address.parse::<IpAddr>() else {
            tracing::debug!("{} is not a valid IP address", address);
            return false;
        };
        self.with_deadline(address, move || reverse_lookup(ip))
    }
}

fn forward_lookup(hostname: &str) -> bool {
    match dns_lookup::lookup_host(hostname) {
        Ok(addrs) => !addrs.is_empty(),
        Err(e) => {
            tracing::debug!("Forward lookup of {} failed: {}", hostname, e);
            false
        }
    }
}

fn reverse_lookup(ip: IpAddr) -> bool {
    match dns_lookup::lookup_addr(&ip) {
        // getnameinfo hands back the numeric form when no PTR record exists
        Ok(name) => !name.is_empty() && name.parse::<IpAddr>().is_err(),
        Err(e) => {
            tracing::debug!("Reverse lookup of {} failed: {}", ip, e);
            false
        }
    }
}
