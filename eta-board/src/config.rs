//! Dashboard configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default KMB open-data base URL.
pub const DEFAULT_KMB_URL: &str = "https://data.etabus.gov.hk/v1/transport/kmb";
/// Default Citybus open-data base URL.
pub const DEFAULT_CTB_URL: &str = "https://rt.data.gov.hk/v2/transport/citybus";
/// Default New Lantao Bus base URL.
pub const DEFAULT_NLB_URL: &str = "https://rt.data.gov.hk/v2/transport/nlb";
/// Default heavy-rail schedule endpoint.
pub const DEFAULT_MTR_URL: &str = "https://rt.data.gov.hk/v1/transport/mtr/getSchedule.php";
/// Default light-rail schedule endpoint.
pub const DEFAULT_LRT_URL: &str = "https://rt.data.gov.hk/v1/transport/mtr/lrt/getSchedule";

/// Error returned when an environment variable holds an invalid value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value for {var}: {value:?} ({reason})")]
pub struct ConfigError {
    var: &'static str,
    value: String,
    reason: &'static str,
}

/// Configuration for the dashboard and its upstream adapters.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// KMB base URL
    pub kmb_url: String,
    /// Citybus base URL
    pub ctb_url: String,
    /// NLB base URL
    pub nlb_url: String,
    /// Heavy-rail schedule endpoint
    pub mtr_url: String,
    /// Light-rail schedule endpoint
    pub lrt_url: String,

    /// Request timeout for every upstream call.
    pub timeout: Duration,

    /// Delay between the end of one card fetch and the start of the next.
    pub poll_interval: Duration,

    /// Poll delay for the single-stop focus view.
    pub focus_poll_interval: Duration,

    /// How long a destroyed card stays on screen for its exit animation.
    pub removal_delay: Duration,

    /// Maximum arrivals shown per bus stop row.
    pub bus_eta_limit: usize,

    /// File backing the client-local key-value store.
    pub store_path: PathBuf,

    /// Where the HTML surface writes the rendered dashboard.
    pub output_path: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            kmb_url: DEFAULT_KMB_URL.to_string(),
            ctb_url: DEFAULT_CTB_URL.to_string(),
            nlb_url: DEFAULT_NLB_URL.to_string(),
            mtr_url: DEFAULT_MTR_URL.to_string(),
            lrt_url: DEFAULT_LRT_URL.to_string(),
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(30),
            focus_poll_interval: Duration::from_secs(10),
            removal_delay: Duration::from_millis(300),
            bus_eta_limit: 3,
            store_path: PathBuf::from("eta_board_store.json"),
            output_path: PathBuf::from("eta_board.html"),
        }
    }
}

impl DashboardConfig {
    /// Point every operator at one base URL (for testing).
    ///
    /// Bus feeds live under `{base}/kmb`, `{base}/ctb` and `{base}/nlb`;
    /// rail endpoints are `{base}/mtr` and `{base}/lrt`.
    pub fn with_base_url(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.kmb_url = format!("{base}/kmb");
        self.ctb_url = format!("{base}/ctb");
        self.nlb_url = format!("{base}/nlb");
        self.mtr_url = format!("{base}/mtr");
        self.lrt_url = format!("{base}/lrt");
        self
    }

    /// Set the card poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the focus view poll interval.
    pub fn with_focus_poll_interval(mut self, interval: Duration) -> Self {
        self.focus_poll_interval = interval;
        self
    }

    /// Set the key-value store file.
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    /// Set the HTML output file.
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    /// Build a configuration from `ETA_BOARD_*` environment variables.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("ETA_BOARD_KMB_URL") {
            config.kmb_url = url;
        }
        if let Some(url) = lookup("ETA_BOARD_CTB_URL") {
            config.ctb_url = url;
        }
        if let Some(url) = lookup("ETA_BOARD_NLB_URL") {
            config.nlb_url = url;
        }
        if let Some(url) = lookup("ETA_BOARD_MTR_URL") {
            config.mtr_url = url;
        }
        if let Some(url) = lookup("ETA_BOARD_LRT_URL") {
            config.lrt_url = url;
        }
        if let Some(v) = lookup("ETA_BOARD_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse_positive("ETA_BOARD_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = lookup("ETA_BOARD_POLL_SECS") {
            config.poll_interval = Duration::from_secs(parse_positive("ETA_BOARD_POLL_SECS", &v)?);
        }
        if let Some(v) = lookup("ETA_BOARD_FOCUS_POLL_SECS") {
            config.focus_poll_interval =
                Duration::from_secs(parse_positive("ETA_BOARD_FOCUS_POLL_SECS", &v)?);
        }
        if let Some(v) = lookup("ETA_BOARD_BUS_ETA_LIMIT") {
            config.bus_eta_limit = parse_positive("ETA_BOARD_BUS_ETA_LIMIT", &v)? as usize;
        }
        if let Some(path) = lookup("ETA_BOARD_STORE") {
            config.store_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("ETA_BOARD_OUTPUT") {
            config.output_path = PathBuf::from(path);
        }

        Ok(config)
    }
}

fn parse_positive(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError {
            var,
            value: value.to_string(),
            reason: "must be greater than zero",
        }),
        Ok(n) => Ok(n),
        Err(_) => Err(ConfigError {
            var,
            value: value.to_string(),
            reason: "expected a whole number",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn default_config() {
        let config = DashboardConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.focus_poll_interval, Duration::from_secs(10));
        assert_eq!(config.removal_delay, Duration::from_millis(300));
        assert_eq!(config.bus_eta_limit, 3);
        assert_eq!(config.kmb_url, DEFAULT_KMB_URL);
    }

    #[test]
    fn with_base_url_rewrites_all_operators() {
        let config = DashboardConfig::default().with_base_url("http://mock/");
        assert_eq!(config.kmb_url, "http://mock/kmb");
        assert_eq!(config.ctb_url, "http://mock/ctb");
        assert_eq!(config.nlb_url, "http://mock/nlb");
        assert_eq!(config.mtr_url, "http://mock/mtr");
        assert_eq!(config.lrt_url, "http://mock/lrt");
    }

    #[test]
    fn env_overrides() {
        let config = DashboardConfig::from_lookup(lookup(&[
            ("ETA_BOARD_POLL_SECS", "45"),
            ("ETA_BOARD_MTR_URL", "http://local/mtr"),
            ("ETA_BOARD_STORE", "/tmp/store.json"),
        ]))
        .unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(45));
        assert_eq!(config.mtr_url, "http://local/mtr");
        assert_eq!(config.store_path, PathBuf::from("/tmp/store.json"));
        assert_eq!(config.focus_poll_interval, Duration::from_secs(10));
    }

    #[test]
    fn env_rejects_bad_numbers() {
        let err = DashboardConfig::from_lookup(lookup(&[("ETA_BOARD_POLL_SECS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("ETA_BOARD_POLL_SECS"));

        assert!(
            DashboardConfig::from_lookup(lookup(&[("ETA_BOARD_TIMEOUT_SECS", "0")])).is_err()
        );
    }
}
