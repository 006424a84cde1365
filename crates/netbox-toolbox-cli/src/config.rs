// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::logging::LogConfig;

pub const APP_NAME: &str = "netbox-toolbox";
pub const URL_ENV: &str = "NETBOX_API_URL";
pub const TOKEN_ENV: &str = "NETBOX_API_TOKEN";
pub const CONFIG_PATH_ENV: &str = "NETBOX_TOOLBOX_CONFIG_PATH";

const CONFIG_VERSION: i64 = 1;
const DEFAULT_TIMEOUT: &str = "30s";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub netbox: Netbox,
    #[serde(default)]
    pub log: Log,
    #[serde(skip)]
    source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            netbox: Netbox::default(),
            log: Log::default(),
            source: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Netbox {
    pub url: Option<String>,
    pub token: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Netbox {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

/// Everything needed to build the API client, after env overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub url: String,
    pub token: String,
    pub timeout: Duration,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [netbox] and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let mut config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(timeout) = &self.netbox.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "netbox.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(level) = &self.log.level
            && level.trim().is_empty()
        {
            bail!("log.level in {} must not be empty", path.display());
        }

        Ok(())
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.netbox.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self
                .log
                .level
                .clone()
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_owned()),
            file: self.log.file.as_ref().map(PathBuf::from),
        }
    }

    /// Resolves the NetBox URL and token. Environment variables win over the
    /// config file; if neither supplies a value startup fails.
    pub fn connection(&self) -> Result<Connection> {
        self.connection_from(|key| env::var(key).ok())
    }

    pub fn connection_from<F>(&self, lookup: F) -> Result<Connection>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = self.required(&lookup, URL_ENV, self.netbox.url.as_deref(), "url")?;
        let token = self.required(&lookup, TOKEN_ENV, self.netbox.token.as_deref(), "token")?;
        Ok(Connection {
            url: url.trim_end_matches('/').to_owned(),
            token,
            timeout: self.timeout()?,
        })
    }

    fn required<F>(
        &self,
        lookup: &F,
        env_key: &str,
        from_file: Option<&str>,
        field: &str,
    ) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = lookup(env_key)
            .filter(|value| !value.trim().is_empty())
            .or_else(|| {
                from_file
                    .filter(|value| !value.trim().is_empty())
                    .map(str::to_owned)
            });
        match value {
            Some(value) => Ok(value.trim().to_owned()),
            None => {
                let file_hint = match &self.source {
                    Some(path) => format!(" or set [netbox].{field} in {}", path.display()),
                    None => format!(" or set [netbox].{field} in the config file"),
                };
                bail!("{env_key} is not set; export it{file_hint}")
            }
        }
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# netbox-toolbox config\n# Place this file at: {}\n# {} and {} override the [netbox] values below.\n\nversion = 1\n\n[netbox]\n# url = \"https://netbox.example.com\"\n# token = \"0123456789abcdef0123456789abcdef01234567\"\ntimeout = \"{}\"\n\n[log]\nlevel = \"{}\"\n# Interactive mode only logs when a file is set.\n# file = \"/tmp/netbox-toolbox.log\"\n",
            path.display(),
            URL_ENV,
            TOKEN_ENV,
            DEFAULT_TIMEOUT,
            DEFAULT_LOG_LEVEL,
        )
    }
}

pub const DOTENV_FILE: &str = ".env";

/// Exports `KEY=value` pairs from `dir/.env` into the process environment.
/// Variables that are already set keep their value. A missing file is fine.
pub fn load_dotenv(dir: &Path) -> Result<Option<PathBuf>> {
    let path = dir.join(DOTENV_FILE);
    match dotenvy::from_path(&path) {
        Ok(()) => Ok(Some(path)),
        Err(error) if error.not_found() => Ok(None),
        Err(error) => Err(error).with_context(|| format!("load {}", path.display())),
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        let secs = mins
            .checked_mul(60)
            .ok_or_else(|| anyhow!("timeout duration {raw:?} is too large"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 30s)")
}
