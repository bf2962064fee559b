use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;

use crate::dns::DnsResolverFn;
use crate::retry::{default_should_retry, ShouldRetry};
use crate::{BoxError, Response};

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
pub(crate) const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub(crate) const DEFAULT_MAX_IDLE_CONNS_PER_HOST: usize = 2;

/// Draft configuration for [`crate::HttpClient`].
///
/// Every `with_*` method applies one named effect and returns the draft, so
/// options compose in call order and the last write to a field wins. Fields
/// left unset are filled in by [`ClientOptions::finalize`].
#[derive(Clone, Default)]
pub struct ClientOptions {
    client: Option<reqwest::Client>,
    cookie_jar: Option<Arc<Jar>>,
    dns_resolver: Option<Arc<DnsResolverFn>>,
    should_retry: Option<ShouldRetry>,
    enable_default_header: bool,
    retry_times: usize,
    retry_backoff: Duration,
    proxy_url: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    max_idle_conns_per_host: usize,
    disable_keep_alive: bool,
    debug: bool,
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("custom_client", &self.client.is_some())
            .field("cookie_jar", &self.cookie_jar.is_some())
            .field("dns_resolver", &self.dns_resolver.is_some())
            .field("should_retry", &self.should_retry.is_some())
            .field("enable_default_header", &self.enable_default_header)
            .field("retry_times", &self.retry_times)
            .field("retry_backoff", &self.retry_backoff)
            .field("proxy_url", &self.proxy_url)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("max_idle_conns_per_host", &self.max_idle_conns_per_host)
            .field("disable_keep_alive", &self.disable_keep_alive)
            .field("debug", &self.debug)
            .finish()
    }
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses an externally built client instead of constructing one.
    ///
    /// The supplied client keeps its own transport: proxy, pool, DNS and
    /// cookie settings from these options are not applied to it.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Attaches a shared cookie store.
    pub fn with_cookie_jar(mut self, jar: Arc<Jar>) -> Self {
        self.cookie_jar = Some(jar);
        self
    }

    /// Resolves every dialed host through `resolver` instead of the system resolver.
    pub fn with_dns_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&str) -> Result<IpAddr, BoxError> + Send + Sync + 'static,
    {
        self.dns_resolver = Some(Arc::new(resolver));
        self
    }

    /// Replaces the default "retry unless 200" rule.
    pub fn with_should_retry<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&crate::Result<Response>) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Some(Arc::new(predicate));
        self
    }

    /// Merges the browser-like default header set into every request.
    pub fn with_default_header(mut self) -> Self {
        self.enable_default_header = true;
        self
    }

    /// Number of attempts made after the first one.
    pub fn with_retry_times(mut self, retry_times: usize) -> Self {
        self.retry_times = retry_times;
        self
    }

    /// Base delay before a retry; doubles on every further retry.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Routes every connection through a static proxy.
    pub fn with_proxy_url(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy_url.into());
        self
    }

    /// Deadline for a single attempt.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Deadline for establishing a connection.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_max_idle_conns_per_host(mut self, max_idle: usize) -> Self {
        self.max_idle_conns_per_host = max_idle;
        self
    }

    /// Opens a fresh connection for every request.
    pub fn with_disable_keep_alive(mut self) -> Self {
        self.disable_keep_alive = true;
        self
    }

    /// Dumps every request and response to standard output.
    pub fn with_debug(mut self) -> Self {
        self.debug = true;
        self
    }

    /// Applies defaults to every unset field and freezes the result.
    ///
    /// The client instance itself is created later by the transport builder,
    /// since building it can fail.
    pub fn finalize(self) -> EffectiveConfig {
        let connect_timeout = self
            .connect_timeout
            .filter(|timeout| !timeout.is_zero())
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT);
        let max_idle_conns_per_host = if self.max_idle_conns_per_host == 0 {
            DEFAULT_MAX_IDLE_CONNS_PER_HOST
        } else {
            self.max_idle_conns_per_host
        };

        EffectiveConfig {
            custom_client: self.client,
            cookie_jar: self.cookie_jar,
            dns_resolver: self.dns_resolver,
            should_retry: self
                .should_retry
                .unwrap_or_else(|| Arc::new(default_should_retry) as ShouldRetry),
            enable_default_header: self.enable_default_header,
            retry_times: self.retry_times,
            retry_backoff: self.retry_backoff,
            proxy_url: self.proxy_url,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            connect_timeout,
            max_idle_conns_per_host,
            disable_keep_alive: self.disable_keep_alive,
            debug: self.debug,
        }
    }
}

/// Finalized, read-only configuration shared by every call made through one client.
#[derive(Clone)]
pub struct EffectiveConfig {
    pub(crate) custom_client: Option<reqwest::Client>,
    pub(crate) cookie_jar: Option<Arc<Jar>>,
    pub(crate) dns_resolver: Option<Arc<DnsResolverFn>>,
    pub(crate) should_retry: ShouldRetry,
    enable_default_header: bool,
    retry_times: usize,
    retry_backoff: Duration,
    proxy_url: Option<String>,
    timeout: Duration,
    connect_timeout: Duration,
    max_idle_conns_per_host: usize,
    disable_keep_alive: bool,
    debug: bool,
}

impl fmt::Debug for EffectiveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectiveConfig")
            .field("custom_client", &self.custom_client.is_some())
            .field("cookie_jar", &self.cookie_jar.is_some())
            .field("dns_resolver", &self.dns_resolver.is_some())
            .field("enable_default_header", &self.enable_default_header)
            .field("retry_times", &self.retry_times)
            .field("retry_backoff", &self.retry_backoff)
            .field("proxy_url", &self.proxy_url)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("max_idle_conns_per_host", &self.max_idle_conns_per_host)
            .field("disable_keep_alive", &self.disable_keep_alive)
            .field("debug", &self.debug)
            .finish()
    }
}

impl EffectiveConfig {
    pub fn enable_default_header(&self) -> bool {
        self.enable_default_header
    }

    pub fn retry_times(&self) -> usize {
        self.retry_times
    }

    pub fn retry_backoff(&self) -> Duration {
        self.retry_backoff
    }

    pub fn proxy_url(&self) -> Option<&str> {
        self.proxy_url.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn max_idle_conns_per_host(&self) -> usize {
        self.max_idle_conns_per_host
    }

    pub fn disable_keep_alive(&self) -> bool {
        self.disable_keep_alive
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn has_dns_resolver(&self) -> bool {
        self.dns_resolver.is_some()
    }

    pub fn has_custom_client(&self) -> bool {
        self.custom_client.is_some()
    }

    /// Runs the configured retry predicate on one attempt outcome.
    pub fn should_retry(&self, outcome: &crate::Result<Response>) -> bool {
        (self.should_retry)(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::{ClientOptions, HttpClientError};

    #[test]
    fn finalize_applies_defaults() {
        let config = ClientOptions::new().finalize();

        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.timeout(), Duration::from_secs(20));
        assert_eq!(config.max_idle_conns_per_host(), 2);
        assert_eq!(config.retry_times(), 0);
        assert_eq!(config.retry_backoff(), Duration::ZERO);
        assert!(config.proxy_url().is_none());
        assert!(!config.debug());
        assert!(!config.enable_default_header());
        assert!(!config.disable_keep_alive());
        assert!(!config.has_dns_resolver());
        assert!(!config.has_custom_client());
    }

    #[test]
    fn zero_values_fall_back_to_defaults() {
        let config = ClientOptions::new()
            .with_connect_timeout(Duration::ZERO)
            .with_max_idle_conns_per_host(0)
            .finalize();

        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.max_idle_conns_per_host(), 2);
    }

    #[test]
    fn later_options_override_earlier_ones() {
        let config = ClientOptions::new()
            .with_retry_times(5)
            .with_proxy_url("http://first:8080")
            .with_timeout(Duration::from_secs(1))
            .with_retry_times(2)
            .with_proxy_url("http://second:8080")
            .with_timeout(Duration::from_secs(3))
            .finalize();

        assert_eq!(config.retry_times(), 2);
        assert_eq!(config.proxy_url(), Some("http://second:8080"));
        assert_eq!(config.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn flags_are_recorded() {
        let config = ClientOptions::new()
            .with_debug()
            .with_default_header()
            .with_disable_keep_alive()
            .with_max_idle_conns_per_host(16)
            .with_dns_resolver(|_| Ok("127.0.0.1".parse()?))
            .finalize();

        assert!(config.debug());
        assert!(config.enable_default_header());
        assert!(config.disable_keep_alive());
        assert!(config.has_dns_resolver());
        assert_eq!(config.max_idle_conns_per_host(), 16);
    }

    #[test]
    fn default_predicate_is_installed() {
        let config = ClientOptions::new().finalize();
        let failed: crate::Result<crate::Response> =
            Err(HttpClientError::UnsupportedPayload("test"));
        assert!(config.should_retry(&failed));
    }

    #[test]
    fn custom_predicate_replaces_default() {
        let config = ClientOptions::new().with_should_retry(|_| false).finalize();
        let failed: crate::Result<crate::Response> = Err(HttpClientError::BodyNotReplayable);
        assert!(!config.should_retry(&failed));
    }
}
