use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, Context};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://art-showcase-backend-c9gs.onrender.com";
pub const SETTINGS_FILE: &str = "artshowcase.toml";
pub const DOUBLE_TAP_WINDOW: Duration = Duration::from_millis(300);
pub const BURST_DURATION: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub session_path: PathBuf,
    pub double_tap_window: Duration,
    pub burst_duration: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.into(),
            session_path: default_session_path(),
            double_tap_window: DOUBLE_TAP_WINDOW,
            burst_duration: BURST_DURATION,
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    session_path: Option<PathBuf>,
    double_tap_window_ms: Option<u64>,
    burst_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
}

fn default_session_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("artshowcase")
        .join("session.json")
}

/// Defaults, then `artshowcase.toml` in the working directory, then the
/// environment.
pub fn load_settings() -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(SETTINGS_FILE) {
        if let Err(err) = apply_file_overrides(&mut settings, &raw) {
            tracing::warn!("config: ignoring malformed {SETTINGS_FILE}: {err}");
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

pub fn load_settings_from(path: &Path) -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
    apply_file_overrides(&mut settings, &raw)?;
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file_overrides(settings: &mut ClientSettings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.api_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file_cfg.session_path {
        settings.session_path = v;
    }
    if let Some(v) = file_cfg.double_tap_window_ms {
        settings.double_tap_window = Duration::from_millis(v);
    }
    if let Some(v) = file_cfg.burst_ms {
        settings.burst_duration = Duration::from_millis(v);
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout = Duration::from_secs(v);
    }
    Ok(())
}

fn apply_env_overrides(settings: &mut ClientSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("ARTSHOWCASE_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("APP__API_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = lookup("ARTSHOWCASE_SESSION_PATH") {
        settings.session_path = PathBuf::from(v);
    }

    if let Some(v) = lookup("APP__DOUBLE_TAP_WINDOW_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.double_tap_window = Duration::from_millis(parsed);
        }
    }
    if let Some(v) = lookup("APP__BURST_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.burst_duration = Duration::from_millis(parsed);
        }
    }
}

/// Validates the API base URL and strips trailing slashes so paths can be
/// appended with `format!`.
pub fn normalize_api_url(raw: &str) -> anyhow::Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(DEFAULT_API_URL.to_string());
    }

    let parsed = Url::parse(raw).with_context(|| format!("invalid api url '{raw}'"))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(anyhow!("api url must start with http:// or https://"));
    }

    Ok(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_match_gesture_timings() {
        let settings = ClientSettings::default();
        assert_eq!(settings.double_tap_window, Duration::from_millis(300));
        assert_eq!(settings.burst_duration, Duration::from_millis(1000));
        assert!(settings.session_path.ends_with("artshowcase/session.json"));
    }

    #[test]
    fn file_then_env_overrides_apply_in_order() {
        let mut settings = ClientSettings::default();
        apply_file_overrides(
            &mut settings,
            r#"
                api_url = "http://file.example"
                double_tap_window_ms = 250
                session_path = "/tmp/from-file.json"
            "#,
        )
        .expect("parse file");
        assert_eq!(settings.api_base_url, "http://file.example");
        assert_eq!(settings.double_tap_window, Duration::from_millis(250));

        let env: HashMap<&str, &str> = HashMap::from([
            ("APP__API_URL", "http://env.example"),
            ("APP__BURST_MS", "1500"),
            ("APP__DOUBLE_TAP_WINDOW_MS", "not-a-number"),
        ]);
        apply_env_overrides(&mut settings, |key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.api_base_url, "http://env.example");
        assert_eq!(settings.burst_duration, Duration::from_millis(1500));
        assert_eq!(settings.double_tap_window, Duration::from_millis(250));
        assert_eq!(settings.session_path, PathBuf::from("/tmp/from-file.json"));
    }

    #[test]
    fn normalizes_api_urls() {
        assert_eq!(
            normalize_api_url("http://localhost:5000/").expect("url"),
            "http://localhost:5000"
        );
        assert_eq!(normalize_api_url("  ").expect("url"), DEFAULT_API_URL);
        assert!(normalize_api_url("ftp://example.com").is_err());
        assert!(normalize_api_url("not a url").is_err());
    }
}
