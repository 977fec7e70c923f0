//! Configuration for varstash.
//!
//! Values are layered, later sources winning:
//! 1. built-in defaults (platform data directory, quality 70, no roots),
//! 2. a JSON file,
//! 3. `VARSTASH_`-prefixed environment variables (e.g.
//!    `VARSTASH_IMAGE_SAVE_QUALITY=85`, `VARSTASH_SCAN_ROOTS='["/vam"]'`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "VARSTASH_";
pub const DEFAULT_IMAGE_SAVE_QUALITY: u8 = 70;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// VaM install directories. Packages are looked for in each root's
    /// `AddonPackages` subdirectory.
    pub scan_roots: Vec<PathBuf>,
    /// JPEG quality (0-100) used when re-encoding preview images.
    pub image_save_quality: u8,
    /// Where preview images are written. Must be absolute.
    pub images_dir: PathBuf,
    /// SQLite database file.
    pub database: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            scan_roots: Vec::new(),
            image_save_quality: DEFAULT_IMAGE_SAVE_QUALITY,
            images_dir: data_dir.join("images"),
            database: data_dir.join("varstash.sqlite"),
        }
    }
}

fn default_data_dir() -> PathBuf {
    match ProjectDirs::from("", "", "varstash") {
        Some(dirs) => dirs.data_dir().to_path_buf(),
        // No home directory to speak of (some containers); still needs to be absolute.
        None => std::env::temp_dir().join("varstash"),
    }
}

impl Config {
    /// Default location of the configuration file.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "varstash").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// The layered sources, without extracting. A missing file is skipped.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            figment = figment.merge(Json::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load and validate configuration.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        if let Some(file) = file {
            tracing::debug!(path = %file.display(), exists = file.exists(), "loading configuration");
        }
        let config: Config = Self::figment(file).extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.image_save_quality > 100 {
            exn::bail!(ErrorKind::Invalid(format!(
                "image_save_quality must be between 0 and 100, got {}",
                self.image_save_quality
            )));
        }
        if !self.images_dir.is_absolute() {
            exn::bail!(ErrorKind::Invalid(format!(
                "images_dir must be an absolute path, got {}",
                self.images_dir.display()
            )));
        }
        Ok(())
    }

    /// Write the current values as pretty-printed JSON, creating parent
    /// directories as needed.
    pub fn save(&self, file: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).or_raise(|| ErrorKind::Save(file.to_path_buf()))?;
        if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).or_raise(|| ErrorKind::Save(file.to_path_buf()))?;
        }
        std::fs::write(file, json).or_raise(|| ErrorKind::Save(file.to_path_buf()))?;
        tracing::info!(path = %file.display(), "configuration saved");
        Ok(())
    }
}
