#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod report;
pub mod selection;
pub mod slicing;
pub mod targeting;

pub use config::GenerationConfig;
pub use error::{ConfigError, SliceError, SliceResult};
pub use models::{AssetSlice, BundleModule, SliceTargeting};
pub use selection::{AssetPackFilter, ModuleInclusion};
pub use slicing::{AssetSlicesGenerator, generate};
pub use targeting::{OptimizationDimension, TargetingValue};
