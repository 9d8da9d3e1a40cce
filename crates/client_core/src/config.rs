use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
pub const CONFIG_FILE_NAME: &str = "eventreg.toml";
pub const DEFAULT_NOTICE_SECONDS: u64 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub server_url: String,
    pub data_dir: Option<PathBuf>,
    pub notice_seconds: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.into(),
            data_dir: None,
            notice_seconds: DEFAULT_NOTICE_SECONDS,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    server_url: Option<String>,
    data_dir: Option<PathBuf>,
    notice_seconds: Option<u64>,
}

impl ClientSettings {
    pub fn notice_duration(&self) -> Duration {
        Duration::from_secs(self.notice_seconds)
    }

    /// Directory holding the persisted session. An explicit setting wins,
    /// then the per-user local data dir, then `./data` under the working
    /// directory.
    pub fn resolved_data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        if let Some(base) = dirs::data_local_dir() {
            return base.join("eventreg");
        }
        PathBuf::from("data").join("eventreg")
    }
}

/// Defaults, then `eventreg.toml` in the working directory, then environment.
pub fn load_settings() -> ClientSettings {
    let mut settings = load_settings_from(Path::new(CONFIG_FILE_NAME));
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    settings
}

pub fn load_settings_from(path: &Path) -> ClientSettings {
    let mut settings = ClientSettings::default();

    let Ok(raw) = fs::read_to_string(path) else {
        return settings;
    };
    match toml::from_str::<FileSettings>(&raw) {
        Ok(file_cfg) => {
            if let Some(v) = file_cfg.server_url {
                settings.server_url = v;
            }
            if let Some(v) = file_cfg.data_dir {
                settings.data_dir = Some(v);
            }
            if let Some(v) = file_cfg.notice_seconds {
                settings.notice_seconds = v;
            }
        }
        Err(err) => warn!(path = %path.display(), "ignoring unreadable config file: {err}"),
    }

    settings
}

pub fn apply_env_overrides(
    settings: &mut ClientSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = non_empty("EVENTREG_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = non_empty("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = non_empty("EVENTREG_DATA_DIR") {
        settings.data_dir = Some(PathBuf::from(v));
    }

    if let Some(v) = non_empty("APP__NOTICE_SECONDS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.notice_seconds = parsed,
            Err(err) => warn!("ignoring APP__NOTICE_SECONDS={v}: {err}"),
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
