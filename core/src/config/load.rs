use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// File names searched for, in priority order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["veritree.toml", ".veritree.toml"];

/// A loaded configuration plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    /// `None` when no file was found and defaults are in use.
    pub path: Option<PathBuf>,
}

impl LoadedConfig {
    /// Directory relative task working directories resolve against.
    pub fn base_dir(&self, fallback: &Path) -> PathBuf {
        self.path
            .as_deref()
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| fallback.to_path_buf())
    }
}

/// Find the configuration file in `dir`.
pub fn find_config(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

pub fn load_file(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
    toml::from_str::<AppConfig>(&s).map_err(|e| anyhow::anyhow!("invalid {}: {}", path.display(), e))
}

/// Load the explicit file if given, else search `dir`, else use defaults.
/// Environment overrides are applied last.
pub fn load(explicit: Option<&Path>, dir: &Path) -> anyhow::Result<LoadedConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config(dir),
    };
    let mut config = match &path {
        Some(path) => load_file(path)?,
        None => AppConfig::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(LoadedConfig { config, path })
}

/// `VERITREE_LOGS`, `VERITREE_MAX_PARALLEL` and `VERITREE_LOG_LEVEL` win over the file.
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("VERITREE_LOGS") {
        cfg.run.logs = v
            .parse()
            .map_err(|e: String| anyhow::anyhow!("VERITREE_LOGS: {e}"))?;
    }
    if let Some(v) = get("VERITREE_MAX_PARALLEL") {
        let n: usize = v
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("VERITREE_MAX_PARALLEL: '{v}' is not a number"))?;
        cfg.run.max_parallel = (n > 0).then_some(n);
    }
    if let Some(v) = get("VERITREE_LOG_LEVEL") {
        cfg.logging.level = v;
    }
    Ok(())
}
