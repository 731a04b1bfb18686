use crate::engine::{IllegalReason};

use std::io;
use std::path::{PathBuf};
use thiserror::{Error};

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("failed to read config file {path:?}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse config: {0}")]
  Parse(#[from] toml::de::Error),

  #[error("invalid config: {0}")]
  Invalid(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BoardError {
  #[error("unsupported board size {size} (must be {min}..={max})")]
  UnsupportedSize { size: usize, min: usize, max: usize },

  #[error("bad vertex label: {0:?}")]
  BadLabel(String),

  #[error("illegal move {label} ({reason:?})")]
  IllegalMove { label: String, reason: IllegalReason },
}
