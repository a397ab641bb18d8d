use crate::gateway::DEFAULT_GATEWAY_URL;
use crate::index::DEFAULT_INDEX_URL;
use anyhow::{Context, Result};
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const CONFIG_FILE: &str = "crust-browser.config.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub root: PathBuf,
    pub index_url: String,
    pub gateway_url: String,
    pub data_dir: PathBuf,
    pub request_timeout: Duration,
}

impl Config {
    pub fn files_dir(&self) -> PathBuf {
        self.data_dir.join("files")
    }

    pub fn prefs_path(&self) -> PathBuf {
        self.data_dir.join("prefs.json")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

pub fn find_config_root(start: &Path) -> Result<Option<PathBuf>> {
    let mut cur = start
        .canonicalize()
        .with_context(|| format!("canonicalize {:?}", start))?;

    loop {
        if cur.join(CONFIG_FILE).exists() {
            return Ok(Some(cur));
        }
        if !cur.pop() {
            return Ok(None);
        }
    }
}

pub fn load_config(root: &Path) -> Result<Value> {
    let cfg_path = root.join(CONFIG_FILE);
    let data = fs::read_to_string(&cfg_path).with_context(|| format!("read {:?}", cfg_path))?;
    let v: Value = serde_json::from_str(&data).with_context(|| format!("parse {}", CONFIG_FILE))?;
    Ok(v)
}

pub fn resolve_data_dir(root: &Path, cfg: &Value) -> PathBuf {
    let data_dir = cfg
        .get("dataDir")
        .and_then(|v| v.as_str())
        .unwrap_or("./crust-browser-data");

    let p = PathBuf::from(data_dir);
    if p.is_absolute() {
        p
    } else {
        root.join(p)
    }
}

fn str_setting(cfg: &Value, key: &str, env: &str, default: &str) -> String {
    if let Ok(v) = std::env::var(env) {
        if !v.trim().is_empty() {
            return v.trim().to_string();
        }
    }
    cfg.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or(default)
        .to_string()
}

/// Builds the effective configuration from a parsed config document.
///
/// Environment variables win over the file; the file wins over defaults.
pub fn from_value(root: &Path, cfg: &Value) -> Config {
    let data_dir = match std::env::var("CRUST_BROWSER_DATA_DIR") {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => resolve_data_dir(root, cfg),
    };

    let timeout_secs = cfg
        .get("requestTimeoutSecs")
        .and_then(|v| v.as_u64())
        .filter(|n| *n > 0)
        .unwrap_or(10);

    Config {
        root: root.to_path_buf(),
        index_url: str_setting(cfg, "indexUrl", "CRUST_BROWSER_INDEX_URL", DEFAULT_INDEX_URL),
        gateway_url: str_setting(cfg, "gatewayUrl", "CRUST_BROWSER_GATEWAY_URL", DEFAULT_GATEWAY_URL),
        data_dir,
        request_timeout: Duration::from_secs(timeout_secs),
    }
}

pub fn get_root(cwd: &Path) -> Result<Option<PathBuf>> {
    if let Ok(v) = std::env::var("CRUST_BROWSER_ROOT") {
        return Ok(Some(PathBuf::from(v)));
    }
    find_config_root(cwd)
}

/// Loads the configuration for a process started in `cwd`. Without a config
/// file, defaults are used relative to `cwd`.
pub fn load(cwd: &Path) -> Result<Config> {
    match get_root(cwd)? {
        Some(root) => {
            let cfg = if root.join(CONFIG_FILE).exists() {
                load_config(&root)?
            } else {
                Value::Null
            };
            Ok(from_value(&root, &cfg))
        }
        None => Ok(from_value(cwd, &Value::Null)),
    }
}
