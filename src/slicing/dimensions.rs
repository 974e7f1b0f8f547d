//! Chooses the dimensions a module is actually split on.

use std::collections::BTreeSet;

use crate::targeting::{DirectoryTargetingIndex, OptimizationDimension};

/// Intersect the requested dimensions with those that vary in the module's directories.
///
/// An empty result means the module is delivered as a single master slice.
pub fn select_split_dimensions(
  requested: &BTreeSet<OptimizationDimension>,
  index: &DirectoryTargetingIndex,
) -> BTreeSet<OptimizationDimension> {
  let present = index.targeted_dimensions();
  requested.intersection(&present).copied().collect()
}
