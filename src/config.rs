use crate::board::{GameConfig};
use crate::error::{ConfigError};

use serde::{Deserialize};
use std::env;
use std::fs;
use std::path::{Path};
use std::time::{Duration};

pub const CONFIG_PATH_VAR: &'static str = "WATSON_CONFIG_PATH";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub game:   GameConfig,
  pub search: SearchConfig,
}

/// Search parameters. Every field has a default, so a config file only names
/// what it changes.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
  pub explore:        f64,
  pub rave_equiv:     f64,
  pub expand_after:   f64,
  pub max_playouts:   usize,
  /// Seconds; <= 0 means no deadline.
  pub time_limit:     f64,
  /// Visit-gap ratio at which the search stops early; < 0 disables it.
  pub cutoff:         f64,
  pub amaf:           bool,
  pub neighbors:      bool,
  pub ancestor:       bool,
  pub eval:           bool,
  pub seed_playouts:  bool,
  pub variance:       bool,
  pub stats:          bool,
  pub verbose:        bool,
  pub num_workers:    usize,
  pub rng_seed:       Option<u64>,
}

impl Default for SearchConfig {
  fn default() -> SearchConfig {
    SearchConfig{
      explore:        0.5,
      rave_equiv:     0.0,
      expand_after:   50.0,
      max_playouts:   10000,
      time_limit:     0.0,
      cutoff:         -1.0,
      amaf:           false,
      neighbors:      false,
      ancestor:       false,
      eval:           false,
      seed_playouts:  false,
      variance:       true,
      stats:          false,
      verbose:        false,
      num_workers:    1,
      rng_seed:       None,
    }
  }
}

impl Config {
  pub fn from_toml_str(s: &str) -> Result<Config, ConfigError> {
    let cfg: Config = toml::from_str(s)?;
    cfg.validate()?;
    Ok(cfg)
  }

  pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let s = fs::read_to_string(path).map_err(|e| ConfigError::Io{
      path:   path.to_path_buf(),
      source: e,
    })?;
    let cfg = Config::from_toml_str(&s)?;
    info!("loaded config from {:?}", path);
    Ok(cfg)
  }

  /// Loads the file named by `WATSON_CONFIG_PATH`, or the defaults if the
  /// variable is unset.
  pub fn from_env() -> Result<Config, ConfigError> {
    match env::var_os(CONFIG_PATH_VAR) {
      Some(path) => Config::load(path),
      None => {
        debug!("{} not set, using default config", CONFIG_PATH_VAR);
        Ok(Config::default())
      }
    }
  }

  fn validate(&self) -> Result<(), ConfigError> {
    if self.game.size == 0 {
      return Err(ConfigError::Invalid("game.size must be positive".to_string()));
    }
    if self.search.num_workers == 0 {
      return Err(ConfigError::Invalid("search.num_workers must be positive".to_string()));
    }
    Ok(())
  }
}

/// How much search a single move may spend.
#[derive(Clone, Copy, Debug)]
pub struct Budget {
  pub max_playouts: usize,
  pub time_limit:   f64,
}

impl Budget {
  pub fn from_config(cfg: &SearchConfig) -> Budget {
    Budget{
      max_playouts: cfg.max_playouts,
      time_limit:   cfg.time_limit,
    }
  }

  pub fn playouts(max_playouts: usize) -> Budget {
    Budget{
      max_playouts: max_playouts,
      time_limit:   0.0,
    }
  }

  pub fn deadline(&self) -> Option<Duration> {
    if self.time_limit > 0.0 && self.time_limit.is_finite() {
      Some(Duration::from_secs_f64(self.time_limit))
    } else {
      None
    }
  }

  /// With a deadline the playout count does not bound the search.
  pub fn exhausted(&self, playouts: usize, elapsed: Duration) -> bool {
    match self.deadline() {
      Some(limit) => elapsed >= limit,
      None => playouts >= self.max_playouts,
    }
  }
}
