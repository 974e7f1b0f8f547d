//! Generation configuration: which dimensions the caller wants asset modules split on.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::targeting::OptimizationDimension;

/// File name looked up by [`GenerationConfig::discover`].
pub const DEFAULT_CONFIG_FILE: &str = "asset-slices.config.json";

/// Validated configuration for one generation run.
///
/// The default configuration requests no dimensions, so every asset module yields a single
/// master slice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
  /// Dimensions asset modules may be split on.
  optimization_dimensions: BTreeSet<OptimizationDimension>,
}

impl GenerationConfig {
  /// Configuration requesting exactly the given dimensions.
  pub fn new(dimensions: impl IntoIterator<Item = OptimizationDimension>) -> Self {
    Self {
      optimization_dimensions: dimensions.into_iter().collect(),
    }
  }

  /// Start from the default configuration.
  pub fn builder() -> GenerationConfigBuilder {
    GenerationConfigBuilder::default()
  }

  /// Copy of this configuration with `dimension` added.
  pub fn with_dimension(mut self, dimension: OptimizationDimension) -> Self {
    self.optimization_dimensions.insert(dimension);
    self
  }

  /// Requested dimensions in canonical order.
  pub fn optimization_dimensions(&self) -> &BTreeSet<OptimizationDimension> {
    &self.optimization_dimensions
  }

  /// Look for [`DEFAULT_CONFIG_FILE`] in `dir`.
  ///
  /// A missing file yields the default configuration; a file that exists but cannot be read or
  /// parsed is reported.
  pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
    let candidate = dir.join(DEFAULT_CONFIG_FILE);
    match Self::from_path(&candidate) {
      Err(ConfigError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
        Ok(Self::default())
      }
      other => other,
    }
  }

  /// Read configuration from a specific JSON file.
  pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug, Clone, Default)]
pub struct GenerationConfigBuilder {
  dimensions: BTreeSet<OptimizationDimension>,
}

impl GenerationConfigBuilder {
  /// Replace the requested dimensions.
  pub fn optimization_dimensions(
    mut self,
    dimensions: impl IntoIterator<Item = OptimizationDimension>,
  ) -> Self {
    self.dimensions = dimensions.into_iter().collect();
    self
  }

  /// Request one more dimension.
  pub fn dimension(mut self, dimension: OptimizationDimension) -> Self {
    self.dimensions.insert(dimension);
    self
  }

  /// Finish the configuration.
  pub fn build(self) -> GenerationConfig {
    GenerationConfig {
      optimization_dimensions: self.dimensions,
    }
  }
}
