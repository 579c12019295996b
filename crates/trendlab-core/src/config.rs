// Configuration loading and parsing (trendlab.toml).

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the single configuration file under `config/`.
pub const CONFIG_FILE_NAME: &str = "trendlab.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Every tunable constant of the pipeline. Built once and passed by
/// reference into the engines; nothing reads configuration globally.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub fwoba: FwobaConfig,
    pub woba: WobaWeights,
    pub usage: UsageConfig,
    pub view: ViewConfig,
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// [data]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding the `MM_YYYY.csv` monthly split files.
    pub dir: String,
    /// Seasons before this year are dropped at load time.
    pub min_season: i32,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            dir: "data/monthly".into(),
            min_season: 2021,
        }
    }
}

// ---------------------------------------------------------------------------
// [fwoba]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FwobaConfig {
    pub weights: FwobaWeights,
    /// Mean of the rescaled distribution (league-average wOBA).
    pub target_mean: f64,
    /// Spread of the rescaled distribution (monthly wOBA volatility).
    pub target_stdev: f64,
    /// Minimum PA for a row to enter the standardization population.
    /// Rows with fewer (but non-zero) PA are still scored.
    pub min_pa_for_distribution: u32,
}

impl Default for FwobaConfig {
    fn default() -> Self {
        FwobaConfig {
            weights: FwobaWeights::default(),
            target_mean: 0.320,
            target_stdev: 0.045,
            min_pa_for_distribution: 1,
        }
    }
}

/// Per-category multipliers for the raw FWOBA score. TOML keys use the
/// box-score abbreviations (H, R, 2B, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "UPPERCASE")]
pub struct FwobaWeights {
    pub h: f64,
    pub r: f64,
    #[serde(rename = "2B")]
    pub doubles: f64,
    pub hr: f64,
    pub sb: f64,
    pub bb: f64,
    pub rbi: f64,
    pub k: f64,
}

impl Default for FwobaWeights {
    fn default() -> Self {
        FwobaWeights {
            h: 0.55,
            r: 0.55,
            doubles: 0.25,
            hr: 1.10,
            sb: 0.35,
            bb: 0.45,
            rbi: 0.55,
            k: -0.35,
        }
    }
}

// ---------------------------------------------------------------------------
// [woba]
// ---------------------------------------------------------------------------

/// Linear weights for the approximate wOBA used when a file has no wOBA
/// column. These are fixed, not season-specific.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WobaWeights {
    /// Unintentional walk.
    pub ubb: f64,
    pub hbp: f64,
    #[serde(rename = "1b")]
    pub single: f64,
    #[serde(rename = "2b")]
    pub double: f64,
    #[serde(rename = "3b")]
    pub triple: f64,
    pub hr: f64,
}

impl Default for WobaWeights {
    fn default() -> Self {
        WobaWeights {
            ubb: 0.69,
            hbp: 0.72,
            single: 0.88,
            double: 1.25,
            triple: 1.58,
            hr: 2.01,
        }
    }
}

// ---------------------------------------------------------------------------
// [usage]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageConfig {
    /// Monthly PA at or above which a hitter counts as an everyday player.
    pub full_time_pa: u32,
}

impl Default for UsageConfig {
    fn default() -> Self {
        UsageConfig { full_time_pa: 90 }
    }
}

// ---------------------------------------------------------------------------
// [view]
// ---------------------------------------------------------------------------

/// Default trend-view filters. Empty / absent values mean "derive from the
/// dataset" (latest season, every Apr-Sep month present, first N players).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub season: Option<i32>,
    pub months: Vec<u8>,
    pub min_pa: u32,
    pub search: String,
    pub players: Vec<String>,
    pub max_players: usize,
    pub metric: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig {
            season: None,
            months: Vec::new(),
            min_pa: 0,
            search: String::new(),
            players: Vec::new(),
            max_players: 8,
            metric: "FWOBA".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// [output]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// When set, the computed table and baselines are also written here.
    pub json_path: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/trendlab.toml` relative to `base_dir`.
///
/// Does not copy defaults; prefer `load_config()` for the binary.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE_NAME);
    let text = read_file(&path)?;
    let config = parse_config(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Parse a config document without validating it.
pub fn parse_config(text: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(text)
}

/// Seed `config/trendlab.toml` from `defaults/` on first run.
///
/// Returns the path written, or nothing when the user's file already exists.
/// A user's file is never overwritten.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let shipped = base_dir.join("defaults").join(CONFIG_FILE_NAME);
    let target = base_dir.join("config").join(CONFIG_FILE_NAME);
    let copy_error = |message: String| ConfigError::DefaultsCopyError { message };

    if target.exists() {
        return Ok(Vec::new());
    }
    if !shipped.is_file() {
        return Err(copy_error(format!(
            "no {CONFIG_FILE_NAME} under {}/defaults or {}/config; \
             run from the project root",
            base_dir.display(),
            base_dir.display()
        )));
    }

    let contents = fs::read(&shipped)
        .map_err(|e| copy_error(format!("failed to read {}: {e}", shipped.display())))?;
    if let Some(dir) = target.parent() {
        fs::create_dir_all(dir)
            .map_err(|e| copy_error(format!("failed to create {}: {e}", dir.display())))?;
    }

    // create_new: a file that appears between the check and the write wins.
    let mut file = match fs::OpenOptions::new().write(true).create_new(true).open(&target) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(Vec::new()),
        Err(e) => {
            return Err(copy_error(format!("failed to create {}: {e}", target.display())))
        }
    };
    file.write_all(&contents)
        .map_err(|e| copy_error(format!("failed to write {}: {e}", target.display())))?;

    tracing::info!("Seeded {} from shipped defaults", target.display());
    Ok(vec![target])
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn invalid(field: &str, message: String) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message,
    }
}

/// Check the semantic constraints serde cannot express.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let fw = &config.fwoba;
    if !fw.target_mean.is_finite() {
        return Err(invalid(
            "fwoba.target_mean",
            format!("must be finite, got {}", fw.target_mean),
        ));
    }
    if !(fw.target_stdev.is_finite() && fw.target_stdev > 0.0) {
        return Err(invalid(
            "fwoba.target_stdev",
            format!("must be > 0, got {}", fw.target_stdev),
        ));
    }

    let w = &fw.weights;
    let positive_fields: &[(&str, f64)] = &[
        ("fwoba.weights.H", w.h),
        ("fwoba.weights.R", w.r),
        ("fwoba.weights.2B", w.doubles),
        ("fwoba.weights.HR", w.hr),
        ("fwoba.weights.SB", w.sb),
        ("fwoba.weights.BB", w.bb),
        ("fwoba.weights.RBI", w.rbi),
    ];
    for (name, val) in positive_fields {
        if !(val.is_finite() && *val >= 0.0) {
            return Err(invalid(name, format!("must be >= 0, got {val}")));
        }
    }
    if !(w.k.is_finite() && w.k <= 0.0) {
        return Err(invalid(
            "fwoba.weights.K",
            format!("strikeouts count against the score; must be <= 0, got {}", w.k),
        ));
    }

    let ww = &config.woba;
    let woba_fields: &[(&str, f64)] = &[
        ("woba.ubb", ww.ubb),
        ("woba.hbp", ww.hbp),
        ("woba.1b", ww.single),
        ("woba.2b", ww.double),
        ("woba.3b", ww.triple),
        ("woba.hr", ww.hr),
    ];
    for (name, val) in woba_fields {
        if !(val.is_finite() && *val > 0.0) {
            return Err(invalid(name, format!("must be > 0, got {val}")));
        }
    }

    if config.view.max_players == 0 {
        return Err(invalid("view.max_players", "must be greater than 0".into()));
    }
    if let Some(m) = config.view.months.iter().find(|m| !(1..=12).contains(*m)) {
        return Err(invalid(
            "view.months",
            format!("month numbers must be in 1..=12, got {m}"),
        ));
    }
    if config.data.dir.trim().is_empty() {
        return Err(invalid("data.dir", "must not be empty".into()));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
