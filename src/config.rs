use config::{Config, ConfigError};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub reservations: ReservationSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Bearer token sent with every request when present
    #[serde(default)]
    pub auth_token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchSettings {
    #[serde(default = "default_radius_km")]
    pub default_radius_km: f64,
    #[serde(default = "default_relaxed_radius_multiplier")]
    pub relaxed_radius_multiplier: f64,
    #[serde(default = "default_relaxed_radius_floor_km")]
    pub relaxed_radius_floor_km: f64,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReservationSettings {
    #[serde(default = "default_checkout_window_hours")]
    pub checkout_window_hours: i64,
    #[serde(default = "default_arrival_window_hours")]
    pub arrival_window_hours: i64,
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("stay-scout/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_radius_km() -> f64 {
    10.0
}

fn default_relaxed_radius_multiplier() -> f64 {
    5.0
}

fn default_relaxed_radius_floor_km() -> f64 {
    50.0
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_checkout_window_hours() -> i64 {
    24
}

fn default_arrival_window_hours() -> i64 {
    48
}

fn default_recent_limit() -> usize {
    5
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            auth_token: None,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_radius_km: default_radius_km(),
            relaxed_radius_multiplier: default_relaxed_radius_multiplier(),
            relaxed_radius_floor_km: default_relaxed_radius_floor_km(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for ReservationSettings {
    fn default() -> Self {
        Self {
            checkout_window_hours: default_checkout_window_hours(),
            arrival_window_hours: default_arrival_window_hours(),
            recent_limit: default_recent_limit(),
        }
    }
}

impl Settings {
    /// Loads an optional settings file, then `STAY_`-prefixed environment
    /// overrides such as `STAY_API__BASE_URL`.
    pub fn new(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("STAY")
                .prefix_separator("_")
                .separator("__"),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;

        debug!(
            base_url = %settings.api.base_url,
            debounce_ms = settings.search.debounce_ms,
            "Loaded settings"
        );

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_thresholds() {
        let settings = Settings::default();
        assert_eq!(settings.search.default_radius_km, 10.0);
        assert_eq!(settings.search.relaxed_radius_multiplier, 5.0);
        assert_eq!(settings.search.relaxed_radius_floor_km, 50.0);
        assert_eq!(settings.search.debounce_ms, 300);
        assert_eq!(settings.reservations.checkout_window_hours, 24);
        assert_eq!(settings.reservations.arrival_window_hours, 48);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let path = std::env::temp_dir().join("stay-scout-settings-test.toml");
        std::fs::write(&path, "[search]\ndefault_radius_km = 25.0\n").unwrap();

        let settings = Settings::new(path.to_str()).unwrap();
        assert_eq!(settings.search.default_radius_km, 25.0);
        assert_eq!(settings.search.relaxed_radius_floor_km, 50.0);
        assert_eq!(settings.api.timeout_secs, 30);

        std::fs::remove_file(path).ok();
    }
}
