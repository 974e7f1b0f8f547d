//! Targeting dimensions, directory-name targeting and the per-module targeting index.

mod dimension;
mod directory;
mod index;

pub use dimension::{OptimizationDimension, TargetingValue, TextureCompressionFormat};
pub use directory::{DirectoryNameError, TargetedDirectory, TargetedSegment};
pub use index::{DirectoryTargeting, DirectoryTargetingIndex, IndexedDirectory};
