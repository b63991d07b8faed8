use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$PRIORA_HOME`, or `~/.priora`.
pub fn priora_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("PRIORA_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set (or set PRIORA_HOME)")?;
    Ok(PathBuf::from(home).join(".priora"))
}

pub fn ensure_priora_home() -> Result<PathBuf> {
    let dir = priora_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(priora_home()?.join("config.toml"))
}
