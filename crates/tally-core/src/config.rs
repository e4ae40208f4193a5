//! User configuration, read from `config.toml`.
//!
//! ```toml
//! rows = 200
//! cols = 40
//! decimal_places = 4
//! shift_references = true
//! ```

use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use tally_engine::engine::EvalOptions;

use crate::error::{Result, TallyError};

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Row count of a new sheet.
    pub rows: usize,
    /// Column count of a new sheet.
    pub cols: usize,
    /// Ranges covering more cells than this evaluate to `#RANGE!`.
    pub max_range_cells: usize,
    /// Cap on fractional digits shown for non-integral numbers. Unset keeps
    /// full precision, which formulas reading the display rely on.
    pub decimal_places: Option<usize>,
    /// Rewrite keys inside formulas when rows/columns are inserted or deleted.
    /// When false, formula text stays literal across structural edits.
    pub shift_references: bool,
}

impl Default for Config {
    fn default() -> Self {
        let eval = EvalOptions::default();
        Config {
            rows: 100,
            cols: 26,
            max_range_cells: eval.max_range_cells,
            decimal_places: eval.decimal_places,
            shift_references: false,
        }
    }
}

impl Config {
    pub fn eval_options(&self) -> EvalOptions {
        EvalOptions {
            max_range_cells: self.max_range_cells,
            decimal_places: self.decimal_places,
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Config> {
        toml::from_str(content).map_err(|e| TallyError::Config(e.to_string()))
    }

    /// Load configuration from `path`, or from the user config directory when
    /// no path is given. Never fails: problems come back as warnings and the
    /// defaults are used instead.
    pub fn load(path: Option<&Path>) -> (Config, Vec<String>) {
        let mut warnings = Vec::new();
        let explicit = path.is_some();
        let Some(path) = path.map(Path::to_path_buf).or_else(user_config_path) else {
            return (Config::default(), warnings);
        };

        if !path.exists() {
            if explicit {
                warnings.push(format!("Config file not found: {}", path.display()));
            }
            return (Config::default(), warnings);
        }

        match read_config_file(&path) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded config");
                (config, warnings)
            }
            Err(err) => {
                warnings.push(format!("Failed to load {}: {}", path.display(), err));
                (Config::default(), warnings)
            }
        }
    }
}

fn read_config_file(path: &Path) -> Result<Config> {
    let meta = std::fs::metadata(path)?;
    if meta.len() > MAX_CONFIG_FILE_BYTES {
        return Err(TallyError::Config(format!(
            "file too large ({} bytes, max {})",
            meta.len(),
            MAX_CONFIG_FILE_BYTES
        )));
    }
    Config::from_toml_str(&std::fs::read_to_string(path)?)
}

pub fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "tally")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}
