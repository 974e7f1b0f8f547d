//! Error types raised while slicing asset modules.

use std::path::PathBuf;

use thiserror::Error;

use crate::targeting::OptimizationDimension;

/// Result alias used throughout the slicing pipeline.
pub type SliceResult<T> = Result<T, SliceError>;

/// Failures that abort slice generation for a single module.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SliceError {
  /// A qualifying module reached the generator without any asset directories.
  #[error("module '{module}' declares no asset directories")]
  NoDirectories {
    /// Module being sliced.
    module: String,
  },

  /// A declared targeting value does not fit the dimension it was declared for.
  #[error("module '{module}': invalid {dimension} value '{value}' for directory '{directory}'")]
  InvalidTargetingValue {
    /// Module being sliced.
    module: String,
    /// Directory carrying the value.
    directory: String,
    /// Dimension the value was declared for.
    dimension: OptimizationDimension,
    /// Raw value as declared.
    value: String,
  },

  /// A directory segment encodes a targeting key this generator does not understand.
  #[error("module '{module}': unknown targeting key '{key}' in directory '{directory}'")]
  UnknownTargetingKey {
    /// Module being sliced.
    module: String,
    /// Directory carrying the key.
    directory: String,
    /// Key found after the `#`.
    key: String,
  },

  /// A directory segment could not be split into base name, key and value.
  #[error("module '{module}': malformed segment '{segment}' in directory '{directory}'")]
  MalformedDirectorySegment {
    /// Module being sliced.
    module: String,
    /// Directory containing the segment.
    directory: String,
    /// Offending path segment.
    segment: String,
  },

  /// Declared targeting disagrees with the value encoded in the directory name.
  #[error(
    "module '{module}': directory '{directory}' declares {dimension} '{declared}' but its name encodes '{encoded}'"
  )]
  ConflictingTargeting {
    /// Module being sliced.
    module: String,
    /// Directory with the conflict.
    directory: String,
    /// Dimension in conflict.
    dimension: OptimizationDimension,
    /// Value from the module's assets configuration.
    declared: String,
    /// Value decoded from the directory name.
    encoded: String,
  },

  /// Two segments of the same directory path target the same dimension.
  #[error("module '{module}': directory '{directory}' targets {dimension} more than once")]
  DuplicateTargetingKey {
    /// Module being sliced.
    module: String,
    /// Directory with the duplicate.
    directory: String,
    /// Dimension encoded twice.
    dimension: OptimizationDimension,
  },

  /// Two entries would land on the same final path inside one slice.
  #[error("module '{module}': entry path '{path}' would be written more than once")]
  PathCollision {
    /// Module being sliced.
    module: String,
    /// Final (stripped) path that collides.
    path: String,
  },
}

impl SliceError {
  /// Name of the module the error was raised for.
  pub fn module(&self) -> &str {
    match self {
      Self::NoDirectories { module }
      | Self::InvalidTargetingValue { module, .. }
      | Self::UnknownTargetingKey { module, .. }
      | Self::MalformedDirectorySegment { module, .. }
      | Self::ConflictingTargeting { module, .. }
      | Self::DuplicateTargetingKey { module, .. }
      | Self::PathCollision { module, .. } => module,
    }
  }
}

/// Errors raised while loading generation configuration or module descriptors.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// Failed to read a file from disk.
  #[error("failed to read {}: {source}", path.display())]
  Io {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    #[source]
    source: std::io::Error,
  },

  /// Failed to parse a JSON document.
  #[error("failed to parse {}: {source}", path.display())]
  Parse {
    /// Path that caused the error.
    path: PathBuf,
    /// Source parse error.
    #[source]
    source: serde_json::Error,
  },

  /// A dimension name is not part of the closed dimension set.
  #[error("unknown optimization dimension '{value}'")]
  UnknownDimension {
    /// Raw dimension name.
    value: String,
  },
}
