use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::{Location, MediaConvention};

/// Environment variable that overrides `catalog.root`.
pub const ROOT_ENV: &str = "SOUNDCHART_ROOT";

/// Application configuration, persisted to `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub catalog: CatalogSection,
    #[serde(default)]
    pub media: MediaSection,
    #[serde(default)]
    pub ui: UiSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogSection {
    /// Site root: an `http(s)` URL or a directory. Media paths resolve against it.
    #[serde(default = "default_root")]
    pub root: String,
    /// Catalog document, relative to `root`.
    #[serde(default = "default_catalog_path")]
    pub path: String,
    #[serde(default = "default_true")]
    pub select_first_on_load: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaSection {
    #[serde(default = "default_true")]
    pub derive_paths: bool,
    #[serde(default = "default_audio_dir")]
    pub audio_dir: String,
    #[serde(default = "default_audio_ext")]
    pub audio_ext: String,
    #[serde(default = "default_icon_dir")]
    pub icon_dir: String,
    #[serde(default = "default_icon_ext")]
    pub icon_ext: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UiSection {
    #[serde(default)]
    pub dark_mode: bool,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            root: default_root(),
            path: default_catalog_path(),
            select_first_on_load: true,
        }
    }
}

impl Default for MediaSection {
    fn default() -> Self {
        Self {
            derive_paths: true,
            audio_dir: default_audio_dir(),
            audio_ext: default_audio_ext(),
            icon_dir: default_icon_dir(),
            icon_ext: default_icon_ext(),
        }
    }
}

fn default_root() -> String {
    ".".to_owned()
}

fn default_catalog_path() -> String {
    "data/colorchart.json".to_owned()
}

fn default_true() -> bool {
    true
}

fn default_audio_dir() -> String {
    "audio".to_owned()
}

fn default_audio_ext() -> String {
    "mp3".to_owned()
}

fn default_icon_dir() -> String {
    "img".to_owned()
}

fn default_icon_ext() -> String {
    "png".to_owned()
}

/// Return the path to `config.toml` in the data directory.
pub fn config_path() -> PathBuf {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("soundchart").join("config.toml")
}

/// Load config from disk, returning defaults if the file does not exist.
/// `SOUNDCHART_ROOT` replaces the configured site root when set.
pub fn load() -> AppConfig {
    let mut config = load_from(&config_path());
    apply_root_override(&mut config, std::env::var(ROOT_ENV).ok());
    config
}

/// Replace the site root with `value` unless it is missing or blank.
fn apply_root_override(config: &mut AppConfig, value: Option<String>) {
    if let Some(root) = value
        && !root.trim().is_empty()
    {
        config.catalog.root = root.trim().to_owned();
    }
}

fn load_from(path: &Path) -> AppConfig {
    if !path.exists() {
        return AppConfig::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "invalid config, using defaults");
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

/// Save config to disk.
pub fn save(config: &AppConfig) -> Result<()> {
    save_to(config, &config_path())
}

fn save_to(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, contents).context("failed to write config file")?;
    Ok(())
}

impl AppConfig {
    pub fn root(&self) -> Location {
        Location::parse(&self.catalog.root)
    }

    /// The catalog document: `path` resolved against `root`.
    pub fn catalog_location(&self) -> Result<Location> {
        self.root()
            .join(&self.catalog.path)
            .with_context(|| format!("invalid catalog path {:?}", self.catalog.path))
    }

    /// Point the configuration at a catalog file picked by the user. The
    /// file's directory becomes the site root.
    pub fn use_catalog_file(&mut self, file: &Path) -> Result<()> {
        let dir = file
            .parent()
            .context("catalog file has no parent directory")?;
        let name = file
            .file_name()
            .and_then(|n| n.to_str())
            .context("catalog file name is not valid UTF-8")?;
        self.catalog.root = dir.display().to_string();
        name.clone_into(&mut self.catalog.path);
        Ok(())
    }

    pub fn media_convention(&self) -> MediaConvention {
        MediaConvention {
            derive: self.media.derive_paths,
            audio_dir: self.media.audio_dir.clone(),
            audio_ext: self.media.audio_ext.clone(),
            icon_dir: self.media.icon_dir.clone(),
            icon_ext: self.media.icon_ext.clone(),
        }
    }
}
