//! Per-module index from asset directory path to its declared targeting.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::OptimizationDimension;
use super::TargetingValue;
use super::directory::TargetedDirectory;
use crate::error::{SliceError, SliceResult};
use crate::models::BundleModule;

/// Typed targeting of one directory. Dimensions without an entry are untargeted.
pub type DirectoryTargeting = BTreeMap<OptimizationDimension, TargetingValue>;

/// A directory known to the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedDirectory {
  /// Decoded directory name.
  pub name: TargetedDirectory,
  /// Validated targeting values.
  pub targeting: DirectoryTargeting,
}

impl IndexedDirectory {
  /// Directory path with every targeting suffix removed.
  pub fn canonical_path(&self) -> String {
    self.name.canonical_path()
  }

  /// Directory path with the suffixes of the split dimensions removed.
  pub fn path_for_split(&self, dimensions: &BTreeSet<OptimizationDimension>) -> String {
    self.name.path_without(dimensions)
  }
}

/// Mapping from every asset directory of a module to its targeting.
#[derive(Debug, Clone)]
pub struct DirectoryTargetingIndex {
  module: String,
  directories: BTreeMap<String, IndexedDirectory>,
}

impl DirectoryTargetingIndex {
  /// Index the declared directories of `module`, plus any directory that only appears as the
  /// parent of an entry.
  ///
  /// Undeclared directories take whatever targeting their name encodes. Every directory also
  /// inherits the targeting of its nearest indexed ancestor, so files nested below a targeted
  /// directory stay with it.
  pub fn build(module: &BundleModule) -> SliceResult<Self> {
    let mut directories = BTreeMap::new();

    for declared in &module.directories {
      let indexed = index_directory(&module.name, &declared.path, &declared.targeting)?;
      let path = indexed.name.path().to_string();
      insert_directory(&module.name, &mut directories, &path, indexed)?;
    }

    let undeclared: BTreeSet<&str> = module
      .entries
      .iter()
      .map(|entry| entry.directory())
      .filter(|directory| !directories.contains_key(*directory))
      .collect();
    for path in undeclared {
      let indexed = index_directory(&module.name, path, &BTreeMap::new())?;
      directories.insert(path.to_string(), indexed);
    }

    inherit_ancestor_targeting(&module.name, &mut directories)?;

    if directories.is_empty() {
      return Err(SliceError::NoDirectories {
        module: module.name.clone(),
      });
    }

    debug!(
      module = %module.name,
      directories = directories.len(),
      "indexed asset directories"
    );

    Ok(Self {
      module: module.name.clone(),
      directories,
    })
  }

  /// Name of the indexed module.
  pub fn module(&self) -> &str {
    &self.module
  }

  /// Number of indexed directories.
  pub fn len(&self) -> usize {
    self.directories.len()
  }

  /// Returns `true` when nothing was indexed. A built index is never empty.
  pub fn is_empty(&self) -> bool {
    self.directories.is_empty()
  }

  /// Look up a directory by its declared path.
  pub fn get(&self, path: &str) -> Option<&IndexedDirectory> {
    self.directories.get(path)
  }

  /// Every directory ordered by declared path.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexedDirectory)> {
    self
      .directories
      .iter()
      .map(|(path, directory)| (path.as_str(), directory))
  }

  /// Dimensions for which at least one directory declares a value.
  pub fn targeted_dimensions(&self) -> BTreeSet<OptimizationDimension> {
    self
      .directories
      .values()
      .flat_map(|directory| directory.targeting.keys().copied())
      .collect()
  }
}

fn index_directory(
  module: &str,
  path: &str,
  declared: &BTreeMap<OptimizationDimension, String>,
) -> SliceResult<IndexedDirectory> {
  let decoded =
    TargetedDirectory::parse(path).map_err(|err| err.into_slice_error(module, path))?;

  let mut targeting = DirectoryTargeting::new();
  for (dimension, raw) in declared {
    targeting.insert(*dimension, parse_value(module, path, *dimension, raw)?);
  }

  for (dimension, raw) in decoded.encoded_targeting() {
    let encoded = parse_value(module, path, dimension, raw)?;
    match targeting.get(&dimension) {
      Some(existing) if *existing != encoded => {
        return Err(SliceError::ConflictingTargeting {
          module: module.to_string(),
          directory: path.to_string(),
          dimension,
          declared: existing.to_string(),
          encoded: encoded.to_string(),
        });
      }
      Some(_) => {}
      None => {
        targeting.insert(dimension, encoded);
      }
    }
  }

  Ok(IndexedDirectory {
    name: decoded,
    targeting,
  })
}

fn parse_value(
  module: &str,
  path: &str,
  dimension: OptimizationDimension,
  raw: &str,
) -> SliceResult<TargetingValue> {
  dimension
    .parse_value(raw)
    .ok_or_else(|| SliceError::InvalidTargetingValue {
      module: module.to_string(),
      directory: path.to_string(),
      dimension,
      value: raw.to_string(),
    })
}

/// Merge each directory's targeting with that of its nearest indexed ancestor.
///
/// Shallow directories go first, so an ancestor has already inherited from its own ancestors.
fn inherit_ancestor_targeting(
  module: &str,
  directories: &mut BTreeMap<String, IndexedDirectory>,
) -> SliceResult<()> {
  let mut by_depth: Vec<(usize, String)> = directories
    .iter()
    .map(|(path, directory)| (directory.name.segments().len(), path.clone()))
    .collect();
  by_depth.sort();

  for (_, path) in by_depth {
    let Some(inherited) = nearest_ancestor(directories, &path).cloned() else {
      continue;
    };
    let Some(directory) = directories.get_mut(&path) else {
      continue;
    };
    for (dimension, value) in inherited {
      match directory.targeting.get(&dimension) {
        Some(own) if *own != value => {
          return Err(SliceError::ConflictingTargeting {
            module: module.to_string(),
            directory: path,
            dimension,
            declared: value.to_string(),
            encoded: own.to_string(),
          });
        }
        Some(_) => {}
        None => {
          directory.targeting.insert(dimension, value);
        }
      }
    }
  }
  Ok(())
}

fn nearest_ancestor<'a>(
  directories: &'a BTreeMap<String, IndexedDirectory>,
  path: &str,
) -> Option<&'a DirectoryTargeting> {
  let segments = directories.get(path)?.name.segments();
  (1..segments.len()).rev().find_map(|depth| {
    let ancestor = segments[..depth]
      .iter()
      .map(|segment| segment.raw.as_str())
      .collect::<Vec<_>>()
      .join("/");
    directories.get(&ancestor).map(|directory| &directory.targeting)
  })
}

fn insert_directory(
  module: &str,
  directories: &mut BTreeMap<String, IndexedDirectory>,
  path: &str,
  indexed: IndexedDirectory,
) -> SliceResult<()> {
  if let Some(existing) = directories.get(path) {
    let differing = existing
      .targeting
      .keys()
      .chain(indexed.targeting.keys())
      .find(|dimension| existing.targeting.get(*dimension) != indexed.targeting.get(*dimension));
    if let Some(dimension) = differing {
      let describe = |targeting: &DirectoryTargeting| {
        targeting
          .get(dimension)
          .map(ToString::to_string)
          .unwrap_or_default()
      };
      return Err(SliceError::ConflictingTargeting {
        module: module.to_string(),
        directory: path.to_string(),
        dimension: *dimension,
        declared: describe(&existing.targeting),
        encoded: describe(&indexed.targeting),
      });
    }
    return Ok(());
  }

  directories.insert(path.to_string(), indexed);
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  use OptimizationDimension::{DeviceTier, Language, TextureCompressionFormat};

  fn language(value: &str) -> TargetingValue {
    TargetingValue::Language(value.into())
  }

  #[test]
  fn indexes_declared_and_implicit_directories() {
    let module = BundleModule::builder("asset_module")
      .add_file("assets/images#lang_en/image.jpg")
      .add_file("assets/sounds/click.ogg")
      .add_directory("assets/images#lang_en", [(Language, "en")])
      .build();

    let index = DirectoryTargetingIndex::build(&module).unwrap();

    assert_eq!(index.len(), 2);
    let images = index.get("assets/images#lang_en").unwrap();
    assert_eq!(images.canonical_path(), "assets/images");
    assert_eq!(images.targeting.get(&Language), Some(&language("en")));
    assert!(index.get("assets/sounds").unwrap().targeting.is_empty());
    assert_eq!(index.targeted_dimensions(), BTreeSet::from([Language]));
  }

  #[test]
  fn decodes_targeting_for_undeclared_directories() {
    let module = BundleModule::builder("textures")
      .add_file("assets/gfx#tcf_astc/level#tier_1/a.ktx")
      .build();

    let index = DirectoryTargetingIndex::build(&module).unwrap();
    let directory = index.get("assets/gfx#tcf_astc/level#tier_1").unwrap();

    assert_eq!(directory.canonical_path(), "assets/gfx/level");
    assert_eq!(
      directory.path_for_split(&BTreeSet::from([DeviceTier])),
      "assets/gfx#tcf_astc/level"
    );
    assert_eq!(
      directory.targeting.keys().copied().collect::<Vec<_>>(),
      vec![TextureCompressionFormat, DeviceTier]
    );
  }

  #[test]
  fn fails_for_modules_without_directories() {
    let module = BundleModule::builder("empty").delivery_type("asset-pack").build();
    assert_eq!(
      DirectoryTargetingIndex::build(&module).unwrap_err(),
      SliceError::NoDirectories {
        module: "empty".into()
      }
    );
  }

  #[test]
  fn rejects_malformed_declared_values() {
    let module = BundleModule::builder("tiers")
      .add_directory("assets/gfx", [(DeviceTier, "high")])
      .build();
    assert!(matches!(
      DirectoryTargetingIndex::build(&module),
      Err(SliceError::InvalidTargetingValue { dimension: DeviceTier, .. })
    ));
  }

  #[test]
  fn rejects_declarations_contradicting_directory_names() {
    let module = BundleModule::builder("langs")
      .add_directory("assets/text#lang_en", [(Language, "fr")])
      .build();
    let err = DirectoryTargetingIndex::build(&module).unwrap_err();
    assert_eq!(err, SliceError::ConflictingTargeting {
      module: "langs".into(),
      directory: "assets/text#lang_en".into(),
      dimension: Language,
      declared: "fr".into(),
      encoded: "en".into(),
    });
  }

  #[test]
  fn tolerates_repeated_identical_declarations() {
    let module = BundleModule::builder("langs")
      .add_directory("assets/text#lang_en", [(Language, "en")])
      .add_directory("assets/text#lang_en", [(Language, "en")])
      .build();
    let index = DirectoryTargetingIndex::build(&module).unwrap();
    assert_eq!(index.len(), 1);
  }

  #[test]
  fn nested_directories_inherit_declared_targeting() {
    let module = BundleModule::builder("voices")
      .add_file("assets/vo_en/intro.ogg")
      .add_file("assets/vo_en/chapter1/line.ogg")
      .add_file("assets/vo_en/chapter1/hd#tier_1/line.ogg")
      .add_directory("assets/vo_en", [(Language, "en")])
      .build();

    let index = DirectoryTargetingIndex::build(&module).unwrap();

    let chapter = index.get("assets/vo_en/chapter1").unwrap();
    assert_eq!(chapter.targeting, DirectoryTargeting::from([(Language, language("en"))]));
    let hd = index.get("assets/vo_en/chapter1/hd#tier_1").unwrap();
    assert_eq!(
      hd.targeting,
      DirectoryTargeting::from([
        (Language, language("en")),
        (DeviceTier, TargetingValue::DeviceTier(1)),
      ])
    );
  }

  #[test]
  fn nested_suffix_contradicting_ancestor_is_rejected() {
    let module = BundleModule::builder("voices")
      .add_file("assets/vo/sub#lang_fr/line.ogg")
      .add_directory("assets/vo", [(Language, "en")])
      .build();

    assert_eq!(
      DirectoryTargetingIndex::build(&module).unwrap_err(),
      SliceError::ConflictingTargeting {
        module: "voices".into(),
        directory: "assets/vo/sub#lang_fr".into(),
        dimension: Language,
        declared: "en".into(),
        encoded: "fr".into(),
      }
    );
  }

  #[test]
  fn declared_paths_match_entries_despite_trailing_slash() {
    let module = BundleModule::builder("voices")
      .add_file("assets/vo_en/intro.ogg")
      .add_directory("assets/vo_en/", [(Language, "en")])
      .add_directory("assets/vo_en", [(Language, "en")])
      .build();

    let index = DirectoryTargetingIndex::build(&module).unwrap();

    assert_eq!(index.len(), 1);
    assert_eq!(
      index.get("assets/vo_en").unwrap().targeting.get(&Language),
      Some(&language("en"))
    );
  }

  #[test]
  fn reports_unknown_keys_with_module_identity() {
    let module = BundleModule::builder("libs")
      .add_file("assets/native#abi_arm64/lib.bin")
      .build();
    let err = DirectoryTargetingIndex::build(&module).unwrap_err();
    assert_eq!(err.module(), "libs");
    assert!(matches!(err, SliceError::UnknownTargetingKey { ref key, .. } if key == "abi"));
  }
}
