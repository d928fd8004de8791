use std::fs;
use std::path::Path;

use cas_equiv::{EngineLimits, EquivOptions, MatcherKind, TieBreak};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_CONFIG_FILE: &str = "dae_equiv.toml";

/// How equation files are read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// LaTeX for `.tex` files or files containing a backslash, text otherwise
    #[default]
    Auto,
    Latex,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaeEquivConfig {
    pub format: InputFormat,
    pub matcher: MatcherKind,
    pub tie_break: TieBreak,
    pub max_rounds: usize,
    pub timeout_ms: Option<u64>,
    pub poly_budget: EngineLimits,
}

impl Default for DaeEquivConfig {
    fn default() -> Self {
        let options = EquivOptions::default();
        Self {
            format: InputFormat::Auto,
            matcher: options.matcher,
            tie_break: options.tie_break,
            max_rounds: options.max_rounds,
            timeout_ms: options.timeout_ms,
            poly_budget: options.poly_budget,
        }
    }
}

impl DaeEquivConfig {
    /// Reads `path`, or `dae_equiv.toml` in the working directory when no
    /// path is given. Unreadable or malformed files fall back to defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let explicit = path.is_some();
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        if !path.exists() {
            if explicit {
                warn!(path = %path.display(), "config file not found, using defaults");
            } else {
                debug!(path = %path.display(), "no config file, using defaults");
            }
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => match Self::parse(&content) {
                Ok(config) => {
                    debug!(path = %path.display(), "loaded config");
                    config
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "error parsing config file, using defaults"
                    );
                    Self::default()
                }
            },
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "error reading config file, using defaults"
                );
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn equiv_options(&self) -> EquivOptions {
        EquivOptions {
            matcher: self.matcher,
            tie_break: self.tie_break,
            max_rounds: self.max_rounds,
            timeout_ms: self.timeout_ms,
            poly_budget: self.poly_budget.clone(),
        }
    }
}
