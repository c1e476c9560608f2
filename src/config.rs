//! Build configuration: `weft.toml` loading and defaults.
//!
//! The configuration surface is deliberately small — where templates live,
//! what they are called, and one knob for the assembler. Every field has a
//! default, a missing config file means "all defaults", and CLI flags
//! override whatever the file says.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Everything a batch compilation needs to know.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Base directory for absolute insertion references.
    pub site_root: PathBuf,
    /// File suffix identifying templates during directory walks.
    pub template_suffix: String,
    /// Suffix for generated source files (same base name as the template).
    pub output_suffix: String,
    /// Merge each run of adjacent literal sections into a single emission
    /// call. Off, every literal keeps its own call.
    pub merge_literals: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            site_root: PathBuf::from("."),
            template_suffix: "wt".to_string(),
            output_suffix: "rs".to_string(),
            merge_literals: true,
        }
    }
}

pub const DEFAULT_CONFIG_NAME: &str = "weft.toml";

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<BuildConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load `weft.toml` from the current directory if present, defaults
/// otherwise. An explicitly named file that is missing is an error; the
/// implicit one is not.
pub fn load_config_or_default(explicit: Option<&Path>) -> Result<BuildConfig, ConfigError> {
    match explicit {
        Some(path) => load_config(path),
        None => {
            let implicit = Path::new(DEFAULT_CONFIG_NAME);
            if implicit.exists() {
                load_config(implicit)
            } else {
                Ok(BuildConfig::default())
            }
        }
    }
}

/// A documented stock config, printed by `weft gen-config`.
pub fn stock_config_toml() -> &'static str {
    r#"# weft build configuration.
# Every setting is optional; the values below are the defaults.

# Base directory for absolute insertion references: <?insert /shared/nav.wt ?>
# resolves inside this directory. Relative references always resolve against
# the directory of the template that contains the insertion.
site_root = "."

# File suffix that marks a template during directory walks.
template_suffix = "wt"

# Suffix for generated Rust sources, written next to each template with the
# same base name.
output_suffix = "rs"

# Merge runs of adjacent literal sections into a single emission call.
merge_literals = true
"#
}
