// void-common/src/config.rs
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use directories::UserDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{Result, VoidError};

// Shared-machine default: per-user scratch space outside the quota.
const DEFAULT_ROOT_PARENT: &str = "/goinfre";
const PROFILE_FILENAME: &str = "apps.json";
const CUSTOM_APPS_FILENAME: &str = "custom_apps.json";

#[derive(Debug, Clone)]
pub struct Config {
    /// Quota-exempt storage root; apps and relocated data live below `<root>/void`.
    pub void_root: PathBuf,
    pub home_dir: PathBuf,
    /// Directory holding launcher symlinks, expected to be on `PATH`.
    pub bin_dir: PathBuf,
    pub desktop_dir: PathBuf,
    pub config_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        debug!("Loading void configuration");

        let home_dir = UserDirs::new()
            .map(|ud| ud.home_dir().to_path_buf())
            .ok_or_else(|| VoidError::Config("Could not determine home directory".to_string()))?;

        let void_root = env::var("VOID_ROOT")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                let user = env::var("USER").unwrap_or_else(|_| "unknown".to_string());
                debug!(
                    "VOID_ROOT not set or empty, falling back to {}/{}",
                    DEFAULT_ROOT_PARENT, user
                );
                Path::new(DEFAULT_ROOT_PARENT).join(user)
            });

        let mut config = Self::new(void_root, home_dir);
        if let Some(bin_dir) = env::var("VOID_BIN_DIR").ok().filter(|s| !s.is_empty()) {
            config.bin_dir = PathBuf::from(bin_dir);
        }

        debug!("Effective VOID_ROOT set to: {}", config.void_root.display());
        debug!("Launcher directory: {}", config.bin_dir.display());
        Ok(config)
    }

    /// Builds a config with every location derived from the two roots.
    pub fn new(void_root: impl Into<PathBuf>, home_dir: impl Into<PathBuf>) -> Self {
        let home_dir = home_dir.into();
        Self {
            void_root: void_root.into(),
            bin_dir: home_dir.join("bin"),
            desktop_dir: home_dir.join(".local/share/applications"),
            config_dir: home_dir.join(".config/void"),
            home_dir,
        }
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    pub fn apps_dir(&self) -> PathBuf {
        self.void_root.join("void").join("apps")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.void_root.join("void").join("data")
    }

    pub fn app_install_dir(&self, app_key: &str) -> PathBuf {
        self.apps_dir().join(app_key)
    }

    pub fn app_data_dir(&self, app_key: &str) -> PathBuf {
        self.data_dir().join(app_key)
    }

    pub fn launcher_path(&self, link_name: &str) -> PathBuf {
        self.bin_dir.join(link_name)
    }

    pub fn desktop_entry_path(&self, app_key: &str) -> PathBuf {
        self.desktop_dir.join(format!("{app_key}.desktop"))
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.config_dir.join("logs")
    }

    pub fn profile_file(&self) -> PathBuf {
        self.config_dir.join(PROFILE_FILENAME)
    }

    pub fn custom_apps_file(&self) -> PathBuf {
        self.config_dir.join(CUSTOM_APPS_FILENAME)
    }

    /// True when the launcher directory appears in the given `PATH` value.
    pub fn bin_dir_on_path(&self, path_var: &str) -> bool {
        env::split_paths(path_var).any(|p| p == self.bin_dir)
    }
}

/// The user's selection of apps for `install-all` (`apps.json`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub apps: Vec<String>,
}

impl Profile {
    pub fn load(config: &Config) -> Result<Self> {
        let path = config.profile_file();
        if !path.is_file() {
            return Err(VoidError::Config(format!(
                "Profile not found at {} (run 'void init' first)",
                path.display()
            )));
        }
        let raw = fs::read_to_string(&path)?;
        let profile: Profile = serde_json::from_str(&raw)?;
        debug!("Loaded profile with {} apps", profile.apps.len());
        Ok(profile)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        let path = config.profile_file();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
