//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/rebudget/rebudget.toml`
//! 3. Local config: `<snapshot_dir>/.rebudget.toml`
//! 4. Environment variables: `REBUDGET_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, Map};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{AllocationPolicy, DistributionDepth, Rounding};

/// Largest scale a decimal amount can carry.
const MAX_DECIMAL_PLACES: u32 = 28;

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Tree,
    Json,
}

/// Raw settings for intermediate parsing (`None` means "not specified, inherit").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub decimal_places: Option<u32>,
    pub rounding: Option<Rounding>,
    pub distribution: Option<DistributionDepth>,
    pub output: Option<OutputFormat>,
}

/// Unified configuration for rebudget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Decimal places kept when distributing onto children (default: 2)
    pub decimal_places: u32,
    /// Midpoint rounding of distributed amounts
    pub rounding: Rounding,
    /// How far a distribution reaches below the edited node
    pub distribution: DistributionDepth,
    /// Default output format
    pub output: OutputFormat,
}

impl Default for Settings {
    fn default() -> Self {
        let policy = AllocationPolicy::default();
        Self {
            decimal_places: policy.decimal_places,
            rounding: policy.rounding,
            distribution: policy.distribution,
            output: OutputFormat::default(),
        }
    }
}

/// Get the XDG config directory for rebudget.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "rebudget").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("rebudget.toml"))
}

/// Get the path to the local config file next to a snapshot.
pub fn local_config_path(snapshot_dir: &Path) -> PathBuf {
    snapshot_dir.join(".rebudget.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Arithmetic policy for the allocation engine.
    pub fn policy(&self) -> AllocationPolicy {
        AllocationPolicy {
            decimal_places: self.decimal_places,
            rounding: self.rounding,
            distribution: self.distribution,
        }
    }

    /// Overlay wins for every field it specifies.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            decimal_places: overlay.decimal_places.unwrap_or(self.decimal_places),
            rounding: overlay.rounding.unwrap_or(self.rounding),
            distribution: overlay.distribution.unwrap_or(self.distribution),
            output: overlay.output.unwrap_or(self.output),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `snapshot_dir` - Optional directory holding the snapshot, for local config
    pub fn load(snapshot_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(dir) = snapshot_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        current = Self::apply_env_overrides(current, None)?;
        current.validate()?;
        Ok(current)
    }

    /// Load settings from one explicit file on top of defaults (no env, no global).
    pub fn load_file(path: &Path) -> Result<Self, ApplicationError> {
        let settings = Self::default().merge_with(&load_raw_settings(path)?);
        settings.validate()?;
        Ok(settings)
    }

    /// Apply REBUDGET_* environment variables as explicit overrides.
    ///
    /// `vars` replaces the process environment when given. A variable that is
    /// set but does not parse is a config error, like a malformed file layer.
    fn apply_env_overrides(
        mut settings: Self,
        vars: Option<Map<String, String>>,
    ) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("REBUDGET")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(vars),
            )
            .build()
            .map_err(config_err)?;

        if let Some(val) = env_value::<u32>(&config, "decimal_places")? {
            settings.decimal_places = val;
        }
        if let Some(val) = env_value::<Rounding>(&config, "rounding")? {
            settings.rounding = val;
        }
        if let Some(val) = env_value::<DistributionDepth>(&config, "distribution")? {
            settings.distribution = val;
        }
        if let Some(val) = env_value::<OutputFormat>(&config, "output")? {
            settings.output = val;
        }

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.decimal_places > MAX_DECIMAL_PLACES {
            return Err(ApplicationError::Config {
                message: format!(
                    "decimal_places must be at most {}, got {}",
                    MAX_DECIMAL_PLACES, self.decimal_places
                ),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# rebudget configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/rebudget/rebudget.toml
#   Local:  <snapshot_dir>/.rebudget.toml
#   Env:    REBUDGET_* environment variables (e.g. REBUDGET_ROUNDING=half-even)

# Decimal places kept when a parent amount is distributed onto its children
# decimal_places = 2

# Midpoint rounding: "half-away-from-zero" or "half-even"
# rounding = "half-away-from-zero"

# Distribution reach: "immediate" (children only) or "recursive" (whole subtree)
# distribution = "immediate"

# Output format: "table", "tree" or "json"
# output = "table"
"#
        .to_string()
    }
}

/// One override key: `None` when unset, an error when set but unparsable.
fn env_value<T: DeserializeOwned>(config: &Config, key: &str) -> Result<Option<T>, ApplicationError> {
    match config.get::<T>(key) {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(ApplicationError::Config {
            message: format!("REBUDGET_{}: {}", key.to_uppercase(), e),
        }),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
