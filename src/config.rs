use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use storekit::NixOptions;

use crate::cli::TargetArgs;

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("flakesync"))
}

/// Supported config file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

/// Find config.toml or config.json in `dir`, TOML first
pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
    ["config.toml", "config.json"]
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Settings read from the config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Flake reference
    #[serde(default)]
    pub flake: Option<String>,
    /// Profile path
    #[serde(default)]
    pub profile: Option<String>,
    /// Nix system override
    #[serde(default)]
    pub system: Option<String>,
    /// Explicit nix binary
    #[serde(default)]
    pub nix: Option<String>,
    #[serde(default)]
    pub allow_unfree: bool,
    #[serde(default)]
    pub allow_insecure: bool,
    /// Command-line values, used verbatim
    #[serde(skip)]
    pub overrides: TargetArgs,
}

impl Config {
    /// Load from `path`, or from the default location when `None`
    ///
    /// A missing default file yields an empty config. An explicitly given
    /// file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match find_config_file(&config_dir()?) {
                Some(path) => path,
                None => {
                    log::debug!("no config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };
        Self::load_from(&path)
    }

    /// Load a specific config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;
        log::debug!("loaded config from {}", path.display());

        match ConfigFormat::from_path(path) {
            ConfigFormat::Toml => toml::from_str(&content)
                .with_context(|| format!("Invalid TOML in {}", path.display())),
            ConfigFormat::Json => serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON in {}", path.display())),
        }
    }

    /// Apply command-line overrides on top of the file's values
    ///
    /// Overrides are taken as given; only file values are expanded.
    pub fn merge(mut self, args: &TargetArgs) -> Self {
        if let Some(system) = &args.system {
            self.system = Some(system.clone());
        }
        self.overrides = args.clone();
        self
    }

    /// Nix environment options
    pub fn nix_options(&self) -> NixOptions {
        NixOptions {
            allow_unfree: self.allow_unfree,
            allow_insecure: self.allow_insecure,
        }
    }

    /// Expanded path to the nix binary, if configured
    pub fn nix_path(&self) -> Result<Option<PathBuf>> {
        self.nix.as_deref().map(expand_path).transpose()
    }

    /// Profile path from the command line, else the expanded file value
    pub fn profile_path(&self) -> Result<PathBuf> {
        if let Some(profile) = &self.overrides.profile {
            return Ok(profile.clone());
        }
        match &self.profile {
            Some(profile) => expand_path(profile),
            None => bail!(
                "No profile configured\n  hint: pass --profile, set FLAKESYNC_PROFILE, or add `profile = \"...\"` to {}",
                default_config_hint()
            ),
        }
    }

    /// Build the reconciliation target
    pub fn target(&self) -> Result<reconcile::SyncTarget> {
        let flake = match (&self.overrides.flake, &self.flake) {
            (Some(flake), _) => flake.clone(),
            (None, Some(flake)) => expand_flake(flake)?,
            (None, None) => bail!(
                "No flake configured\n  hint: pass --flake, set FLAKESYNC_FLAKE, or add `flake = \"...\"` to {}",
                default_config_hint()
            ),
        };

        let mut target = reconcile::SyncTarget::new(flake, self.profile_path()?);
        if let Some(system) = &self.system {
            target = target.with_system(system.clone());
        }
        Ok(target)
    }
}

fn default_config_hint() -> String {
    config_dir()
        .map(|dir| dir.join("config.toml").display().to_string())
        .unwrap_or_else(|_| "~/.config/flakesync/config.toml".to_string())
}

/// Expand `~` and environment variables in a path
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded =
        shellexpand::full(raw).with_context(|| format!("Could not expand path: {raw}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Expand local flake paths; leave URL-like references untouched
fn expand_flake(flake: &str) -> Result<String> {
    if flake.contains(':') {
        return Ok(flake.to_string());
    }
    Ok(expand_path(flake)?.to_string_lossy().into_owned())
}
