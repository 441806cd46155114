use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, Context};
use serde::Deserialize;
use shared::domain::ActorId;
use url::Url;

pub const CONFIG_FILE_NAME: &str = "policy_desk.toml";
const CONFIG_DIR_NAME: &str = "policy_desk";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub actor_id: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8080/api".into(),
            actor_id: None,
            request_timeout_secs: None,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn base_url(&self) -> anyhow::Result<Url> {
        Url::parse(self.api_base_url.trim())
            .with_context(|| format!("invalid api base url '{}'", self.api_base_url))
    }

    pub fn actor(&self) -> anyhow::Result<ActorId> {
        self.actor_id
            .as_deref()
            .map(str::trim)
            .filter(|actor| !actor.is_empty())
            .map(ActorId::new)
            .ok_or_else(|| {
                anyhow!(
                    "no actor id configured; pass --actor-id, set POLICY_DESK_ACTOR_ID, or add actor_id to {CONFIG_FILE_NAME}"
                )
            })
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Values given on the command line; they win over file and environment.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub api_base_url: Option<String>,
    pub actor_id: Option<String>,
    pub config_path: Option<PathBuf>,
    pub log_filter: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    actor_id: Option<String>,
    request_timeout_secs: Option<u64>,
    log_filter: Option<String>,
}

pub fn load_settings(cli: &CliOverrides) -> anyhow::Result<Settings> {
    load_settings_with(cli, |key| std::env::var(key).ok())
}

fn load_settings_with(
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Some(path) = config_file(cli) {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let file_cfg = toml::from_str::<FileSettings>(&raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
        if let Some(v) = file_cfg.api_base_url {
            settings.api_base_url = v;
        }
        if let Some(v) = file_cfg.actor_id {
            settings.actor_id = Some(v);
        }
        if let Some(v) = file_cfg.request_timeout_secs {
            settings.request_timeout_secs = Some(v);
        }
        if let Some(v) = file_cfg.log_filter {
            settings.log_filter = v;
        }
    }

    if let Some(v) = env("POLICY_DESK_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("POLICY_DESK_ACTOR_ID") {
        settings.actor_id = Some(v);
    }
    if let Some(v) = env("APP__ACTOR_ID") {
        settings.actor_id = Some(v);
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.request_timeout_secs = Some(parsed);
        }
    }

    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    if let Some(v) = &cli.api_base_url {
        settings.api_base_url = v.clone();
    }
    if let Some(v) = &cli.actor_id {
        settings.actor_id = Some(v.clone());
    }
    if let Some(v) = &cli.log_filter {
        settings.log_filter = v.clone();
    }

    Ok(settings)
}

/// `--config` if given, else the working directory, else the user config dir.
fn config_file(cli: &CliOverrides) -> Option<PathBuf> {
    if let Some(path) = &cli.config_path {
        return Some(path.clone());
    }
    let local = Path::new(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local.to_path_buf());
    }
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file())
}
