//! Real-time layer options and configuration
//!
//! This module contains the configuration for the connection manager, count
//! source and reconciler, including a builder and environment loading.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::Result;
use crate::transport::websocket::DEFAULT_CONNECT_TIMEOUT;

/// Path the notification service serves its dashboard socket on
pub const WS_DASHBOARD_PATH: &str = "/ws/dashboard";

/// REST base used when none is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Socket endpoint used when none can be derived
pub const FALLBACK_WS_ENDPOINT: &str = "ws://localhost:8001/ws/dashboard";

/// Storage key holding the serialized read-state mapping
pub const READ_STATE_STORAGE_KEY: &str = "inbox-section-read-state";

/// Default reconnect ceiling
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Default base delay for exponential reconnect backoff
pub const DEFAULT_RECONNECT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Default keepalive ping interval
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Default timeout for one count snapshot fetch
pub const DEFAULT_COUNT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Default cadence of the background refresh scheduler
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

// ============================================================================
// Realtime Options
// ============================================================================

/// Main options for the inbox real-time layer
#[derive(Debug, Clone)]
pub struct RealtimeOptions {
    /// WebSocket endpoint of the notification service
    pub ws_endpoint: Url,
    /// Base URL of the REST backend serving chat snapshots
    pub api_base_url: Url,
    /// Maximum automatic reconnect attempts before giving up
    pub max_reconnect_attempts: u32,
    /// Base delay for exponential reconnect backoff
    pub reconnect_base_delay: Duration,
    /// Interval between keepalive pings while connected
    pub heartbeat_interval: Duration,
    /// Timeout for the WebSocket handshake
    pub connect_timeout: Duration,
    /// Timeout for a single count snapshot fetch
    pub count_fetch_timeout: Duration,
    /// Interval of the background refresh scheduler
    pub refresh_interval: Duration,
    /// Directory holding the file-backed read-state store
    pub read_state_dir: Option<PathBuf>,
}

impl Default for RealtimeOptions {
    fn default() -> Self {
        let api_base_url = builtin_url(DEFAULT_API_BASE_URL);
        let ws_endpoint = derive_ws_endpoint(None, &api_base_url);
        Self {
            ws_endpoint,
            api_base_url,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            reconnect_base_delay: DEFAULT_RECONNECT_BASE_DELAY,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            count_fetch_timeout: DEFAULT_COUNT_FETCH_TIMEOUT,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            read_state_dir: None,
        }
    }
}

impl RealtimeOptions {
    /// Create a new builder for `RealtimeOptions`
    #[must_use]
    pub fn builder() -> RealtimeOptionsBuilder {
        RealtimeOptionsBuilder::default()
    }

    /// Load options from the environment
    ///
    /// Reads `WS_BASE_URL`, `API_BASE_URL` and `INBOX_READ_STATE_DIR`. A
    /// malformed `API_BASE_URL` falls back to the local default.
    #[must_use]
    pub fn from_env() -> Self {
        let api_base_url = std::env::var("API_BASE_URL")
            .ok()
            .and_then(|raw| match Url::parse(&raw) {
                Ok(url) => Some(url),
                Err(e) => {
                    log::warn!("Ignoring invalid API_BASE_URL {raw:?}: {e}");
                    None
                }
            })
            .unwrap_or_else(|| builtin_url(DEFAULT_API_BASE_URL));

        let explicit_ws = std::env::var("WS_BASE_URL").ok().filter(|s| !s.is_empty());
        let ws_endpoint = derive_ws_endpoint(explicit_ws.as_deref(), &api_base_url);

        Self {
            ws_endpoint,
            api_base_url,
            read_state_dir: std::env::var_os("INBOX_READ_STATE_DIR").map(PathBuf::from),
            ..Self::default()
        }
    }

    /// URL of the users/chats snapshot endpoint
    ///
    /// # Errors
    /// Returns error if the joined URL is invalid
    pub fn users_chats_url(&self) -> Result<Url> {
        let base = self.api_base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/debug/users-chats"))?)
    }
}

fn builtin_url(raw: &'static str) -> Url {
    Url::parse(raw).expect("built-in URL constants are valid")
}

fn fallback_ws_endpoint() -> Url {
    builtin_url(FALLBACK_WS_ENDPOINT)
}

/// Derive the notification socket endpoint
///
/// An explicit base wins and gets `/ws/dashboard` appended unless it already
/// ends with it. Otherwise the endpoint follows the REST base: `http` becomes
/// `ws`, `https` becomes `wss`, port 8000 maps to the service's 8001, and an
/// insecure base without a port also gets 8001.
#[must_use]
pub fn derive_ws_endpoint(explicit: Option<&str>, api_base_url: &Url) -> Url {
    if let Some(explicit) = explicit {
        let joined = if explicit.ends_with(WS_DASHBOARD_PATH) {
            explicit.to_string()
        } else {
            format!("{}{WS_DASHBOARD_PATH}", explicit.trim_end_matches('/'))
        };
        match Url::parse(&joined) {
            Ok(url) => return url,
            Err(e) => log::warn!("Ignoring invalid WS_BASE_URL {explicit:?}: {e}"),
        }
    }

    let mut url = api_base_url.clone();
    let secure = url.scheme() == "https";
    if url.set_scheme(if secure { "wss" } else { "ws" }).is_err() {
        log::warn!(
            "Failed to derive WebSocket URL from {api_base_url}, falling back to {FALLBACK_WS_ENDPOINT}"
        );
        return fallback_ws_endpoint();
    }

    let port = match url.port() {
        Some(8000) => Some(8001),
        Some(other) => Some(other),
        None if !secure => Some(8001),
        None => None,
    };
    if url.set_port(port).is_err() {
        return fallback_ws_endpoint();
    }

    url.set_path(WS_DASHBOARD_PATH);
    url.set_query(None);
    url
}

// ============================================================================
// Builder for RealtimeOptions
// ============================================================================

/// Builder for `RealtimeOptions`
#[derive(Debug, Default)]
pub struct RealtimeOptionsBuilder {
    options: RealtimeOptions,
}

impl RealtimeOptionsBuilder {
    /// Set the socket endpoint
    #[must_use]
    pub fn ws_endpoint(mut self, url: Url) -> Self {
        self.options.ws_endpoint = url;
        self
    }

    /// Set the REST base URL
    #[must_use]
    pub fn api_base_url(mut self, url: Url) -> Self {
        self.options.api_base_url = url;
        self
    }

    /// Set the reconnect ceiling
    #[must_use]
    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.options.max_reconnect_attempts = attempts;
        self
    }

    /// Set the backoff base delay
    #[must_use]
    pub fn reconnect_base_delay(mut self, delay: Duration) -> Self {
        self.options.reconnect_base_delay = delay;
        self
    }

    /// Set the heartbeat interval; zero keeps the default
    #[must_use]
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.options.heartbeat_interval = interval;
        }
        self
    }

    /// Set the WebSocket handshake timeout; zero keeps the default
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.options.connect_timeout = timeout;
        }
        self
    }

    /// Set the count fetch timeout; zero keeps the default
    #[must_use]
    pub fn count_fetch_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.options.count_fetch_timeout = timeout;
        }
        self
    }

    /// Set the refresh scheduler interval; zero keeps the default
    #[must_use]
    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.options.refresh_interval = interval;
        }
        self
    }

    /// Set the read-state directory
    #[must_use]
    pub fn read_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.read_state_dir = Some(dir.into());
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> RealtimeOptions {
        self.options
    }
}
