use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$REWARDLY_HOME`, else `~/.rewardly`.
pub fn rewardly_home() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("REWARDLY_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".rewardly"))
}

pub fn ensure_rewardly_home() -> Result<PathBuf> {
    let dir = rewardly_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
