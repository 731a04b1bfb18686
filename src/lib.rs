#[macro_use]
extern crate log;

extern crate bit_set;
extern crate bit_vec;
extern crate rand;
extern crate serde;
extern crate thiserror;
extern crate threadpool;
extern crate toml;
extern crate vec_map;

pub mod array_util;
pub mod board;
pub mod capture;
pub mod config;
pub mod connection;
pub mod discrete;
pub mod engine;
pub mod error;
pub mod hash;
pub mod pattern;
pub mod policy;
pub mod random;
pub mod search;
pub mod util;
