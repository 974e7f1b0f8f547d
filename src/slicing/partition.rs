//! Groups a module's directories by their targeting across the split dimensions.

use std::collections::{BTreeMap, BTreeSet};

use crate::targeting::{DirectoryTargetingIndex, OptimizationDimension, TargetingValue};

/// Per split dimension, either a concrete value or `None` for untargeted.
///
/// Keys are laid out in the canonical dimension order. `None` sorts before every concrete
/// value, so the untargeted fallback partition always comes first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionKey(Vec<Option<TargetingValue>>);

impl PartitionKey {
  /// Values in split-dimension order.
  pub fn values(&self) -> &[Option<TargetingValue>] {
    &self.0
  }
}

/// Directories that end up in the same slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition<'a> {
  /// Shared targeting of every directory in the partition.
  pub key: PartitionKey,
  /// Declared directory paths, sorted.
  pub directories: Vec<&'a str>,
}

/// Result of partitioning one module.
#[derive(Debug, Clone)]
pub struct Partitioning<'a> {
  dimensions: Vec<OptimizationDimension>,
  alternatives: BTreeMap<OptimizationDimension, BTreeSet<TargetingValue>>,
  partitions: Vec<Partition<'a>>,
}

impl<'a> Partitioning<'a> {
  /// Split dimensions in canonical order.
  pub fn dimensions(&self) -> &[OptimizationDimension] {
    &self.dimensions
  }

  /// Every value observed across the module for `dimension`.
  pub fn observed_values(&self, dimension: OptimizationDimension) -> &BTreeSet<TargetingValue> {
    static EMPTY: BTreeSet<TargetingValue> = BTreeSet::new();
    self.alternatives.get(&dimension).unwrap_or(&EMPTY)
  }

  /// Partitions in key order.
  pub fn partitions(&self) -> &[Partition<'a>] {
    &self.partitions
  }

  /// Returns `true` when at least one dimension is split on.
  pub fn is_split(&self) -> bool {
    !self.dimensions.is_empty()
  }
}

/// Group every directory of `index` by its values across `dimensions`.
///
/// All directories must be visible here: the observed value sets feed the alternatives of
/// every slice of the module.
pub fn partition_directories<'a>(
  index: &'a DirectoryTargetingIndex,
  dimensions: &BTreeSet<OptimizationDimension>,
) -> Partitioning<'a> {
  let dimensions: Vec<OptimizationDimension> = dimensions.iter().copied().collect();
  let mut groups: BTreeMap<PartitionKey, Vec<&'a str>> = BTreeMap::new();
  let mut alternatives: BTreeMap<OptimizationDimension, BTreeSet<TargetingValue>> = dimensions
    .iter()
    .map(|dimension| (*dimension, BTreeSet::new()))
    .collect();

  for (path, directory) in index.iter() {
    let key = PartitionKey(
      dimensions
        .iter()
        .map(|dimension| directory.targeting.get(dimension).cloned())
        .collect(),
    );

    for (dimension, value) in dimensions.iter().zip(key.values()) {
      if let (Some(value), Some(observed)) = (value, alternatives.get_mut(dimension)) {
        observed.insert(value.clone());
      }
    }

    groups.entry(key).or_default().push(path);
  }

  let partitions = groups
    .into_iter()
    .map(|(key, directories)| Partition { key, directories })
    .collect();

  Partitioning {
    dimensions,
    alternatives,
    partitions,
  }
}
