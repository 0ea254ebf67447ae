//! Watcher configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Loading goes through a lookup function
//! so tests can supply their own variables.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::error::ConfigError;

/// Query parameter carrying the departure stop.
pub const POINT_FROM_ID_KEY: &str = "point_from_id";
/// Query parameter carrying the arrival stop.
pub const POINT_TO_ID_KEY: &str = "point_to_id";
/// Query parameter carrying the trip date.
pub const DATE_KEY: &str = "date";
/// Query parameter carrying the route direction.
pub const DIRECTION_ID_KEY: &str = "direction_id";

/// Top-level configuration.
///
/// Loaded once at startup via [`WatcherConfig::from_env`].
#[derive(Debug, Clone, PartialEq)]
pub struct WatcherConfig {
    /// Socket address the HTTP server binds to.
    pub listen_addr: SocketAddr,
    /// Where and what to poll.
    pub request: RequestConfig,
    /// Time between poll cycles.
    pub poll_interval: Duration,
    /// Detection window lower bound, `YYYY-MM-DD HH:MM:SS`.
    pub window_start: String,
    /// Detection window upper bound, `YYYY-MM-DD HH:MM:SS`.
    pub window_end: String,
    /// Notification sink settings.
    pub notify: NotifyConfig,
    /// Upper bound on graceful shutdown.
    pub shutdown_timeout: Duration,
    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,
}

/// Booking endpoint and the route being watched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    /// URL scheme, normally `https`.
    pub scheme: String,
    /// Host, optionally with a port.
    pub host: String,
    /// Path of the search endpoint.
    pub path: String,
    /// Departure stop id.
    pub point_from_id: u32,
    /// Arrival stop id.
    pub point_to_id: u32,
    /// Trip date as the endpoint expects it.
    pub date: String,
    /// Route direction id.
    pub direction_id: u32,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl RequestConfig {
    /// Returns the query string pairs sent with every poll.
    #[must_use]
    pub fn query_pairs(&self) -> [(&'static str, String); 4] {
        [
            (POINT_FROM_ID_KEY, self.point_from_id.to_string()),
            (POINT_TO_ID_KEY, self.point_to_id.to_string()),
            (DATE_KEY, self.date.clone()),
            (DIRECTION_ID_KEY, self.direction_id.to_string()),
        ]
    }
}

/// Notification sink settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyConfig {
    /// Audio file played on a hit. `None` logs the hit instead.
    pub signal_path: Option<String>,
    /// Player program followed by its arguments; the signal file is appended.
    pub command: Vec<String>,
    /// Upper bound on a single notification.
    pub timeout: Duration,
}

impl WatcherConfig {
    /// Loads configuration from the process environment.
    ///
    /// Calls `dotenvy::dotenv().ok()` first to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if a required variable is unset and
    /// [`ConfigError::Invalid`] if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Same as [`WatcherConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let port: u16 = env.parse_or("SERVER_PORT", 8080)?;
        let listen_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));

        let request = RequestConfig {
            scheme: env.get("REMOTE_SCHEME").unwrap_or_else(|| "https".to_string()),
            host: env.required("REMOTE_HOST")?,
            path: env.required("REMOTE_PATH")?,
            point_from_id: env.parse_required("POINT_FROM_ID")?,
            point_to_id: env.parse_required("POINT_TO_ID")?,
            date: env.required("TRIP_DATE")?,
            direction_id: env.parse_required("DIRECTION_ID")?,
            timeout: Duration::from_secs(env.parse_or("REQUEST_TIMEOUT_SECS", 30)?),
        };

        let poll_interval = Duration::from_secs(env.parse_or("POLL_INTERVAL_SECS", 60)?);
        if poll_interval.is_zero() {
            return Err(ConfigError::Invalid {
                key: "POLL_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        let notify = NotifyConfig {
            signal_path: env.get("SIGNAL_PATH"),
            command: env
                .get("NOTIFY_COMMAND")
                .unwrap_or_else(|| "mpg123 -q".to_string())
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            timeout: Duration::from_secs(env.parse_or("NOTIFY_TIMEOUT_SECS", 60)?),
        };

        Ok(Self {
            listen_addr,
            request,
            poll_interval,
            window_start: env.required("WINDOW_START")?,
            window_end: env.required("WINDOW_END")?,
            notify,
            shutdown_timeout: Duration::from_secs(env.parse_or("SHUTDOWN_TIMEOUT_SECS", 30)?),
            json_logs: env
                .get("LOG_FORMAT")
                .is_some_and(|v| v.eq_ignore_ascii_case("json")),
        })
    }
}

/// Variable lookup that treats blank values as unset.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing(key))
    }

    fn parse_required<T: std::str::FromStr>(&self, key: &'static str) -> Result<T, ConfigError> {
        let value = self.required(key)?;
        value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value })
    }

    fn parse_or<T: std::str::FromStr>(
        &self,
        key: &'static str,
        default: T,
    ) -> Result<T, ConfigError> {
        match self.get(key) {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid { key, value }),
            None => Ok(default),
        }
    }
}
