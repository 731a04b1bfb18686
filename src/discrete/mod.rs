pub use self::sampler::{WeightedSampler};

pub mod sampler;
