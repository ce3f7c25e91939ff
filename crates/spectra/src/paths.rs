use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories_next::ProjectDirs;
use liveconfig::LiveConfig;

pub const ENV_CONFIG_DIR: &str = "SPECTRA_CONFIG_DIR";
pub const CONFIG_FILE: &str = "spectra.toml";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "Spectra";
const APPLICATION: &str = "Spectra";

/// Where the configuration came from, for logging and `spectra config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    File(PathBuf),
    /// No file exists at the discovered location.
    Defaults(PathBuf),
}

pub fn config_dir() -> Result<PathBuf> {
    if let Some(value) = env_override(ENV_CONFIG_DIR) {
        return Ok(value);
    }
    let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
        .ok_or_else(|| anyhow!("failed to determine user directories"))?;
    Ok(project_dirs.config_dir().to_path_buf())
}

/// Loads `explicit` (which must exist) or the discovered config file (which may not).
pub fn load_config(explicit: Option<&Path>) -> Result<(LiveConfig, ConfigOrigin)> {
    if let Some(path) = explicit {
        let config = read_config(path)?;
        return Ok((config, ConfigOrigin::File(path.to_path_buf())));
    }

    let path = config_dir()
        .context("failed to resolve spectra config directory")?
        .join(CONFIG_FILE);
    if path.is_file() {
        let config = read_config(&path)?;
        Ok((config, ConfigOrigin::File(path)))
    } else {
        tracing::debug!(path = %path.display(), "no config file; using defaults");
        Ok((LiveConfig::default(), ConfigOrigin::Defaults(path)))
    }
}

fn read_config(path: &Path) -> Result<LiveConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    LiveConfig::from_toml_str(&raw)
        .with_context(|| format!("failed to load config at {}", path.display()))
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.as_os_str().is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;
    use tempfile::TempDir;

    fn env_lock() -> &'static Mutex<()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    struct EnvGuard {
        key: &'static str,
        previous: Option<OsString>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &Path) -> Self {
            let previous = env::var_os(key);
            env::set_var(key, value);
            Self { key, previous }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = self.previous.take() {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    #[test]
    fn env_override_takes_precedence() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let _env = EnvGuard::set(ENV_CONFIG_DIR, root.path());

        assert_eq!(config_dir().unwrap(), root.path());
    }

    #[test]
    fn missing_discovered_file_means_defaults() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let _env = EnvGuard::set(ENV_CONFIG_DIR, root.path());

        let (config, origin) = load_config(None).unwrap();
        assert_eq!(config, LiveConfig::default());
        assert_eq!(origin, ConfigOrigin::Defaults(root.path().join(CONFIG_FILE)));
    }

    #[test]
    fn discovered_file_is_loaded() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let _env = EnvGuard::set(ENV_CONFIG_DIR, root.path());
        fs::write(
            root.path().join(CONFIG_FILE),
            "[pipeline]\nquiet_period = \"250ms\"\n",
        )
        .unwrap();

        let (config, origin) = load_config(None).unwrap();
        assert_eq!(config.pipeline.quiet_period, Duration::from_millis(250));
        assert!(matches!(origin, ConfigOrigin::File(_)));
    }

    #[test]
    fn explicit_file_must_exist() {
        let root = TempDir::new().unwrap();
        let missing = root.path().join("absent.toml");
        let err = load_config(Some(&missing)).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read config"));
    }
}
