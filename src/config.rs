use crate::error::AppError;
use crate::forecast::MAX_PERIODS;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "cost-forecast";
pub const ENV_PREFIX: &str = "COST_FORECAST";
pub const DEFAULT_PERIODS: u32 = 12;

fn app_home_dir() -> Result<PathBuf, AppError> {
    if let Ok(custom) = std::env::var("COST_FORECAST_HOME") {
        return Ok(PathBuf::from(custom));
    }

    if let Some(dirs) = ProjectDirs::from("com", "costforecast", APP_NAME) {
        let candidate = dirs.data_local_dir().to_path_buf();
        if fs::create_dir_all(&candidate).is_ok() {
            return Ok(candidate);
        }
    }

    let cwd = std::env::current_dir()?;
    Ok(cwd.join(".cost-forecast"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub default_periods: u32,
    pub currency: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_periods: DEFAULT_PERIODS,
            currency: "USD".into(),
        }
    }
}

pub fn config_dir() -> Result<PathBuf, AppError> {
    Ok(app_home_dir()?.join("config"))
}

pub fn data_dir() -> Result<PathBuf, AppError> {
    Ok(app_home_dir()?.join("data"))
}

pub fn config_path() -> Result<PathBuf, AppError> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn db_path() -> Result<PathBuf, AppError> {
    Ok(data_dir()?.join("scenarios.sqlite"))
}

pub fn ensure_dirs() -> Result<(), AppError> {
    fs::create_dir_all(config_dir()?)?;
    fs::create_dir_all(data_dir()?)?;
    Ok(())
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Normalized {
    currency: bool,
    default_periods: bool,
}

fn normalize_config(config: &mut AppConfig) -> Normalized {
    let mut changed = Normalized::default();

    let currency = config.currency.trim().to_ascii_uppercase();
    if currency != config.currency {
        config.currency = currency;
        changed.currency = true;
    }
    if config.currency.is_empty() {
        config.currency = AppConfig::default().currency;
        changed.currency = true;
    }

    if config.default_periods == 0 || config.default_periods > MAX_PERIODS {
        config.default_periods = DEFAULT_PERIODS;
        changed.default_periods = true;
    }

    changed
}

fn read_layered(path: &Path) -> Result<AppConfig, AppError> {
    let settings = ::config::Config::builder()
        .add_source(::config::File::from(path).required(false))
        .add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
        .build()?;
    Ok(settings.try_deserialize()?)
}

/// File settings overlaid with `COST_FORECAST_*` environment variables.
pub fn load_config() -> Result<AppConfig, AppError> {
    let path = config_path()?;
    let mut parsed = read_layered(&path)?;
    let changed = normalize_config(&mut parsed);
    if changed.default_periods {
        tracing::warn!(
            path = %path.display(),
            default_periods = parsed.default_periods,
            "default_periods out of range, using default"
        );
    }
    if changed.currency {
        tracing::debug!(currency = %parsed.currency, "normalized currency code");
    }
    Ok(parsed)
}

pub fn save_config(config: &AppConfig) -> Result<(), AppError> {
    ensure_dirs()?;
    let path = config_path()?;
    let raw = toml::to_string_pretty(config)?;
    fs::write(path, raw)?;
    Ok(())
}

pub fn ensure_initialized() -> Result<(), AppError> {
    ensure_dirs()?;
    let cfg_path = config_path()?;
    if !Path::new(&cfg_path).exists() {
        save_config(&AppConfig::default())?;
    }
    Ok(())
}
