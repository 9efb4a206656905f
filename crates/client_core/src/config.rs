use std::{fs, path::Path, time::Duration};

use anyhow::{anyhow, Context};
use tracing::warn;
use url::Url;

pub const CONFIG_FILE: &str = "client.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend_url: String,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:8001".into(),
            request_timeout_secs: 120,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Defaults, then `client.toml` in the working directory, then environment.
pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(Path::new(CONFIG_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        apply_file_overrides(&mut settings, &raw)
            .with_context(|| format!("invalid settings file '{}'", path.display()))?;
    }
    apply_env_overrides(&mut settings, env);

    settings.backend_url = normalize_backend_url(&settings.backend_url)?;
    if settings.request_timeout_secs == 0 {
        return Err(anyhow!("request_timeout_secs must be greater than zero"));
    }
    Ok(settings)
}

fn apply_file_overrides(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let table: toml::Table = toml::from_str(raw)?;

    if let Some(v) = table.get("backend_url") {
        let v = v
            .as_str()
            .ok_or_else(|| anyhow!("backend_url must be a string"))?;
        settings.backend_url = v.to_string();
    }
    if let Some(v) = table.get("request_timeout_secs") {
        settings.request_timeout_secs = match v {
            toml::Value::Integer(secs) => u64::try_from(*secs)
                .map_err(|_| anyhow!("request_timeout_secs must not be negative"))?,
            toml::Value::String(secs) => secs
                .trim()
                .parse()
                .context("request_timeout_secs must be a whole number of seconds")?,
            _ => return Err(anyhow!("request_timeout_secs must be an integer")),
        };
    }
    Ok(())
}

fn apply_env_overrides(settings: &mut Settings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("BACKEND_URL") {
        settings.backend_url = v;
    }
    if let Some(v) = env("APP__BACKEND_URL") {
        settings.backend_url = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        match v.trim().parse::<u64>() {
            Ok(parsed) => settings.request_timeout_secs = parsed,
            Err(_) => warn!(value = %v, "config: ignoring invalid APP__REQUEST_TIMEOUT_SECS"),
        }
    }
}

/// Trims the URL, adds a scheme when missing and drops trailing slashes.
pub fn normalize_backend_url(raw: &str) -> anyhow::Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Settings::default().backend_url);
    }

    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };

    let parsed =
        Url::parse(&with_scheme).with_context(|| format!("invalid backend url '{raw}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(anyhow!(
            "backend url '{raw}' must use http:// or https://"
        ));
    }

    Ok(with_scheme.trim_end_matches('/').to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
