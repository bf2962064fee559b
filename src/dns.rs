use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use reqwest::dns::{Addrs, Name, Resolve, Resolving};

use crate::{BoxError, DnsError};

/// Caller-supplied host to IP mapping used in place of the system resolver.
pub type DnsResolverFn = dyn Fn(&str) -> Result<IpAddr, BoxError> + Send + Sync;

/// Routes every dial through a custom resolver.
///
/// Only the host component is handed to the resolver; the port of the
/// original address is kept as is. Connect timeout and keep-alive are
/// applied by the surrounding transport exactly as for the default dialer.
#[derive(Clone)]
pub struct DnsOverride {
    resolver: Arc<DnsResolverFn>,
}

impl fmt::Debug for DnsOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DnsOverride").finish_non_exhaustive()
    }
}

impl DnsOverride {
    pub fn new(resolver: Arc<DnsResolverFn>) -> Self {
        Self { resolver }
    }

    /// Resolves a bare host name.
    pub fn lookup(&self, host: &str) -> Result<IpAddr, DnsError> {
        (self.resolver)(host).map_err(|source| DnsError::Lookup {
            host: host.to_owned(),
            source,
        })
    }
}

impl Resolve for DnsOverride {
    fn resolve(&self, name: Name) -> Resolving {
        let this = self.clone();
        Box::pin(async move {
            // The connector replaces port 0 with the port of the request URI.
            let ip = this.lookup(name.as_str())?;

            #[cfg(feature = "tracing")]
            tracing::debug!(host = name.as_str(), %ip, "dns override resolved host");

            let addrs: Addrs = Box::new(std::iter::once(SocketAddr::new(ip, 0)));
            Ok::<_, BoxError>(addrs)
        })
    }
}
