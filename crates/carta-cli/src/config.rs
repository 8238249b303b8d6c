// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use carta_agent::ModelConfig;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "carta";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_AGENT_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_MODEL_ENDPOINT: &str = "ollama";
const DEFAULT_MODEL_NAME: &str = "qwen3";
const DEFAULT_AGENT_TIMEOUT: &str = "30s";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub agent: Agent,
    #[serde(default)]
    pub model: Model,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            agent: Agent::default(),
            model: Model::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Agent {
    pub enabled: Option<bool>,
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Agent {
    fn default() -> Self {
        Self {
            enabled: Some(true),
            base_url: Some(DEFAULT_AGENT_BASE_URL.to_owned()),
            timeout: Some(DEFAULT_AGENT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Model {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub api_version: Option<String>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            endpoint: Some(DEFAULT_MODEL_ENDPOINT.to_owned()),
            model: Some(DEFAULT_MODEL_NAME.to_owned()),
            api_key: None,
            api_base: None,
            api_version: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("CARTA_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set CARTA_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
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
                    "config file {} is not versioned. Add `version = 1` and move values under [agent] and [model]",
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

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.version != CONFIG_VERSION {
            bail!(
                "config {} has version {}; expected 1",
                path.display(),
                self.version
            );
        }

        if let Some(base_url) = &self.agent.base_url
            && base_url.trim().is_empty()
        {
            bail!("agent.base_url in {} must not be empty", path.display());
        }

        if let Some(timeout) = &self.agent.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "agent.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        Ok(())
    }

    pub fn agent_enabled(&self) -> bool {
        self.agent.enabled.unwrap_or(true)
    }

    pub fn agent_base_url(&self) -> &str {
        self.agent
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_AGENT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn agent_timeout(&self) -> Result<Duration> {
        parse_duration(self.agent.timeout.as_deref().unwrap_or(DEFAULT_AGENT_TIMEOUT))
    }

    pub fn model_config(&self) -> ModelConfig {
        let mut model = ModelConfig::new(
            self.model.endpoint.as_deref().unwrap_or(DEFAULT_MODEL_ENDPOINT),
            self.model.model.as_deref().unwrap_or(DEFAULT_MODEL_NAME),
        );
        model.api_key = self.model.api_key.clone();
        model.api_base = self.model.api_base.clone();
        model.api_version = self.model.api_version.clone();
        model
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# carta config\n# Place this file at: {}\n\nversion = 1\n\n[agent]\nenabled = true\nbase_url = \"{}\"\ntimeout = \"{}\"\n\n[model]\nendpoint = \"{}\"\nmodel = \"{}\"\n# api_key = \"...\"\n# api_base = \"...\"\n# api_version = \"...\"\n",
            path.display(),
            DEFAULT_AGENT_BASE_URL,
            DEFAULT_AGENT_TIMEOUT,
            DEFAULT_MODEL_ENDPOINT,
            DEFAULT_MODEL_NAME,
        )
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
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 30s)")
}
