//! Turns a partition into an installable asset slice.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{SliceError, SliceResult};
use crate::models::{AssetSlice, ContentRef, ModuleEntry, SliceEntry, SliceKind, SliceTargeting};
use crate::targeting::{DirectoryTargetingIndex, OptimizationDimension};

use super::partition::{Partition, Partitioning};

/// Builds the slices of a single module once its partitioning is known.
pub struct SliceBuilder<'a> {
  module_name: &'a str,
  index: &'a DirectoryTargetingIndex,
  partitioning: &'a Partitioning<'a>,
  split_dimensions: BTreeSet<OptimizationDimension>,
  entries_by_directory: BTreeMap<&'a str, Vec<&'a ModuleEntry>>,
}

impl<'a> SliceBuilder<'a> {
  /// Prepare a builder over `entries`, grouping them by their parent directory.
  pub fn new(
    module_name: &'a str,
    entries: &'a [ModuleEntry],
    index: &'a DirectoryTargetingIndex,
    partitioning: &'a Partitioning<'a>,
  ) -> Self {
    let mut entries_by_directory: BTreeMap<&'a str, Vec<&'a ModuleEntry>> = BTreeMap::new();
    for entry in entries {
      entries_by_directory
        .entry(entry.directory())
        .or_default()
        .push(entry);
    }

    Self {
      module_name,
      index,
      partitioning,
      split_dimensions: partitioning.dimensions().iter().copied().collect(),
      entries_by_directory,
    }
  }

  /// Build every slice of the module in partition order.
  pub fn build_all(&self) -> SliceResult<Vec<AssetSlice>> {
    self
      .partitioning
      .partitions()
      .iter()
      .map(|partition| self.build(partition))
      .collect()
  }

  /// Build the slice for one partition.
  ///
  /// Entry paths lose the directory suffixes of the split dimensions. Suffixes of other
  /// dimensions stay, since they may be all that keeps two entries apart.
  pub fn build(&self, partition: &Partition<'_>) -> SliceResult<AssetSlice> {
    let mut entries: BTreeMap<String, ContentRef> = BTreeMap::new();

    for directory in &partition.directories {
      let canonical = self
        .index
        .get(directory)
        .map(|indexed| indexed.path_for_split(&self.split_dimensions))
        .unwrap_or_else(|| directory.to_string());

      for entry in self.entries_by_directory.get(directory).into_iter().flatten() {
        let path = final_entry_path(directory, &canonical, &entry.path);
        match entries.entry(path) {
          Entry::Vacant(slot) => {
            slot.insert(entry.content_ref());
          }
          Entry::Occupied(slot) => {
            return Err(SliceError::PathCollision {
              module: self.module_name.to_string(),
              path: slot.key().clone(),
            });
          }
        }
      }
    }

    let is_split = self.partitioning.is_split();

    Ok(AssetSlice {
      module_name: self.module_name.to_string(),
      kind: SliceKind::AssetSlice,
      master: !is_split,
      targeting: self.targeting(partition),
      entries: entries
        .into_iter()
        .map(|(path, content)| SliceEntry { path, content })
        .collect(),
    })
  }

  /// Per split dimension, the partition's value plus every other value seen in the module.
  ///
  /// The untargeted partition lists every observed value as an alternative, which makes it
  /// the fallback for devices matching none of them.
  fn targeting(&self, partition: &Partition<'_>) -> SliceTargeting {
    self
      .partitioning
      .dimensions()
      .iter()
      .zip(partition.key.values())
      .fold(SliceTargeting::unsplit(), |targeting, (dimension, value)| {
        let alternatives = self
          .partitioning
          .observed_values(*dimension)
          .iter()
          .filter(|candidate| Some(*candidate) != value.as_ref())
          .cloned();
        targeting.with(*dimension, value.clone(), alternatives)
      })
  }
}

/// Replace the declared directory prefix of `entry_path` with its canonical form.
fn final_entry_path(directory: &str, canonical: &str, entry_path: &str) -> String {
  let file_name = if directory.is_empty() {
    entry_path
  } else {
    entry_path
      .strip_prefix(directory)
      .and_then(|rest| rest.strip_prefix('/'))
      .unwrap_or(entry_path)
  };

  if canonical.is_empty() {
    file_name.to_string()
  } else {
    format!("{canonical}/{file_name}")
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use super::*;
  use crate::models::BundleModule;
  use crate::slicing::partition::partition_directories;
  use crate::targeting::{OptimizationDimension, TargetingValue};
  use rstest::rstest;

  use OptimizationDimension::Language;

  fn language(value: &str) -> TargetingValue {
    TargetingValue::Language(value.into())
  }

  fn slices(
    module: &BundleModule,
    dimensions: &[OptimizationDimension],
  ) -> SliceResult<Vec<AssetSlice>> {
    let index = DirectoryTargetingIndex::build(module)?;
    let dimensions: BTreeSet<_> = dimensions.iter().copied().collect();
    let partitioning = partition_directories(&index, &dimensions);
    SliceBuilder::new(&module.name, &module.entries, &index, &partitioning).build_all()
  }

  #[rstest]
  #[case(
    "assets/images#lang_en",
    "assets/images",
    "assets/images#lang_en/a/b.png",
    "assets/images/a/b.png"
  )]
  #[case("", "", "root.txt", "root.txt")]
  #[case("assets", "assets", "assets/x.txt", "assets/x.txt")]
  fn rewrites_directory_prefix(
    #[case] directory: &str,
    #[case] canonical: &str,
    #[case] entry: &str,
    #[case] expected: &str,
  ) {
    assert_eq!(final_entry_path(directory, canonical, entry), expected);
  }

  #[test]
  fn colliding_stripped_paths_are_reported() {
    let module = BundleModule::builder("m")
      .add_file("assets/text#lang_en/a.txt")
      .add_file("assets/text/a.txt")
      .add_directory("assets/text", [(Language, "en")])
      .build();

    let err = slices(&module, &[Language]).unwrap_err();

    assert_eq!(err, SliceError::PathCollision {
      module: "m".into(),
      path: "assets/text/a.txt".into(),
    });
  }

  #[test]
  fn split_slices_carry_value_and_alternatives() {
    let module = BundleModule::builder("m")
      .add_file("assets/text#lang_en/a.txt")
      .add_file("assets/text#lang_es/a.txt")
      .add_file("assets/common/b.txt")
      .build();

    let slices = slices(&module, &[Language]).unwrap();

    assert_eq!(slices.len(), 3);
    assert!(slices.iter().all(|slice| !slice.master));

    assert_eq!(
      slices[0].targeting,
      SliceTargeting::single(Language, None, [language("en"), language("es")])
    );
    assert_eq!(slices[0].entry_paths(), vec!["assets/common/b.txt"]);

    assert_eq!(
      slices[1].targeting,
      SliceTargeting::single(Language, Some(language("en")), [language("es")])
    );
    assert_eq!(slices[1].entry_paths(), vec!["assets/text/a.txt"]);
    assert_eq!(slices[1].entries[0].content, ContentRef("assets/text#lang_en/a.txt".into()));

    assert_eq!(
      slices[2].targeting,
      SliceTargeting::single(Language, Some(language("es")), [language("en")])
    );
  }

  #[test]
  fn master_slice_keeps_unsplit_suffixes() {
    let module = BundleModule::builder("m")
      .add_file("assets/text#lang_en/a.txt")
      .add_file("assets/text#lang_es/a.txt")
      .build();

    let slices = slices(&module, &[]).unwrap();

    assert_eq!(slices.len(), 1);
    assert!(slices[0].master);
    assert!(slices[0].targeting.is_unsplit());
    assert_eq!(slices[0].entry_paths(), vec![
      "assets/text#lang_en/a.txt",
      "assets/text#lang_es/a.txt"
    ]);
  }

  #[test]
  fn split_keeps_suffixes_of_other_dimensions() {
    let module = BundleModule::builder("m")
      .add_file("assets/gfx#tcf_astc/text#lang_en/a.txt")
      .add_file("assets/gfx#tcf_etc2/text#lang_en/a.txt")
      .build();

    let slices = slices(&module, &[Language]).unwrap();

    assert_eq!(slices.len(), 1);
    assert!(!slices[0].master);
    assert_eq!(slices[0].entry_paths(), vec![
      "assets/gfx#tcf_astc/text/a.txt",
      "assets/gfx#tcf_etc2/text/a.txt"
    ]);
  }

  #[test]
  fn duplicate_input_paths_are_reported() {
    let module = BundleModule::builder("dupes")
      .add_file_with_content("assets/a.txt", "one")
      .add_file_with_content("assets/a.txt", "two")
      .build();

    assert!(matches!(
      slices(&module, &[]),
      Err(SliceError::PathCollision { ref path, .. }) if path == "assets/a.txt"
    ));
  }
}
