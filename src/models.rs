//! Data structures consumed and produced by the asset slice generator.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::targeting::{OptimizationDimension, TargetingValue};

/// Manifest delivery attribute values that mark a module as asset-only.
const ASSET_PACK_ATTRIBUTES: [&str; 2] = ["asset-pack", "remote-asset"];

/// How a module is delivered, as declared by its manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryType {
  /// Code-bearing feature module, handled by other generators.
  Feature,
  /// Asset-only module delivered remotely or on demand.
  AssetPack,
}

impl DeliveryType {
  /// Interpret the manifest's delivery type attribute.
  pub fn from_manifest_attribute(value: Option<&str>) -> Self {
    match value.map(str::trim) {
      Some(attribute) if ASSET_PACK_ATTRIBUTES.contains(&attribute) => Self::AssetPack,
      _ => Self::Feature,
    }
  }
}

/// Opaque reference to an entry's content; the generator never reads it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ContentRef(pub String);

impl fmt::Display for ContentRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// A single file inside a module.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModuleEntry {
  /// Module-relative path using forward slashes.
  pub path: String,
  /// Where the content lives; defaults to the entry path.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub content: Option<ContentRef>,
}

impl ModuleEntry {
  /// Entry whose content is referenced by its own path.
  pub fn new(path: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      content: None,
    }
  }

  /// Content reference, falling back to the entry path.
  pub fn content_ref(&self) -> ContentRef {
    self
      .content
      .clone()
      .unwrap_or_else(|| ContentRef(self.path.clone()))
  }

  /// Directory holding the entry, or an empty string for module-root files.
  pub fn directory(&self) -> &str {
    self
      .path
      .rsplit_once('/')
      .map(|(directory, _)| directory)
      .unwrap_or("")
  }
}

/// An asset directory with the targeting declared for it in the module's assets config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AssetsDirectory {
  /// Directory path, possibly carrying `#key_value` suffixes.
  pub path: String,
  /// Raw declared value per dimension; absent dimensions are untargeted.
  #[serde(default)]
  pub targeting: BTreeMap<OptimizationDimension, String>,
}

/// Immutable description of one bundle module.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BundleModule {
  /// Unique module name.
  pub name: String,
  /// Raw manifest delivery type attribute, e.g. `asset-pack`.
  #[serde(default)]
  pub delivery_type: Option<String>,
  /// Declared asset directories.
  #[serde(default)]
  pub directories: Vec<AssetsDirectory>,
  /// Every file in the module.
  #[serde(default)]
  pub entries: Vec<ModuleEntry>,
}

impl BundleModule {
  /// Start building a module with the given name.
  pub fn builder(name: impl Into<String>) -> BundleModuleBuilder {
    BundleModuleBuilder {
      module: BundleModule {
        name: name.into(),
        delivery_type: None,
        directories: Vec::new(),
        entries: Vec::new(),
      },
    }
  }

  /// Delivery type derived from the manifest attribute.
  pub fn delivery(&self) -> DeliveryType {
    DeliveryType::from_manifest_attribute(self.delivery_type.as_deref())
  }
}

/// Fluent builder for [`BundleModule`], mostly used by tests and loaders.
#[derive(Debug, Clone)]
pub struct BundleModuleBuilder {
  module: BundleModule,
}

impl BundleModuleBuilder {
  /// Set the manifest delivery type attribute.
  pub fn delivery_type(mut self, attribute: impl Into<String>) -> Self {
    self.module.delivery_type = Some(attribute.into());
    self
  }

  /// Add a file referenced by its own path.
  pub fn add_file(mut self, path: impl Into<String>) -> Self {
    self.module.entries.push(ModuleEntry::new(path));
    self
  }

  /// Add a file with an explicit content reference.
  pub fn add_file_with_content(
    mut self,
    path: impl Into<String>,
    content: impl Into<String>,
  ) -> Self {
    self.module.entries.push(ModuleEntry {
      path: path.into(),
      content: Some(ContentRef(content.into())),
    });
    self
  }

  /// Declare a directory with its targeting.
  pub fn add_directory<'a>(
    mut self,
    path: impl Into<String>,
    targeting: impl IntoIterator<Item = (OptimizationDimension, &'a str)>,
  ) -> Self {
    self.module.directories.push(AssetsDirectory {
      path: path.into(),
      targeting: targeting
        .into_iter()
        .map(|(dimension, value)| (dimension, value.to_string()))
        .collect(),
    });
    self
  }

  /// Finish the module.
  pub fn build(self) -> BundleModule {
    self.module
  }
}

/// Kind of artifact produced by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SliceKind {
  /// Subset of an asset module's files.
  AssetSlice,
}

/// Targeting of a slice along one dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DimensionTargeting {
  /// Value served by the slice; `None` marks the fallback for untargeted directories.
  pub value: Option<TargetingValue>,
  /// Every other value observed for the dimension within the module.
  pub alternatives: BTreeSet<TargetingValue>,
}

/// Targeting metadata attached to a slice.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SliceTargeting {
  dimensions: BTreeMap<OptimizationDimension, DimensionTargeting>,
}

impl SliceTargeting {
  /// Targeting for a slice that was not split at all.
  pub fn unsplit() -> Self {
    Self::default()
  }

  /// Targeting along a single dimension.
  pub fn single(
    dimension: OptimizationDimension,
    value: Option<TargetingValue>,
    alternatives: impl IntoIterator<Item = TargetingValue>,
  ) -> Self {
    Self::default().with(dimension, value, alternatives)
  }

  /// Add (or replace) targeting along `dimension`.
  pub fn with(
    mut self,
    dimension: OptimizationDimension,
    value: Option<TargetingValue>,
    alternatives: impl IntoIterator<Item = TargetingValue>,
  ) -> Self {
    self.dimensions.insert(dimension, DimensionTargeting {
      value,
      alternatives: alternatives.into_iter().collect(),
    });
    self
  }

  /// Returns `true` when no dimension is targeted.
  pub fn is_unsplit(&self) -> bool {
    self.dimensions.is_empty()
  }

  /// Targeting for one dimension.
  pub fn get(&self, dimension: OptimizationDimension) -> Option<&DimensionTargeting> {
    self.dimensions.get(&dimension)
  }

  /// Every targeted dimension in canonical order.
  pub fn iter(&self) -> impl Iterator<Item = (OptimizationDimension, &DimensionTargeting)> {
    self.dimensions.iter().map(|(dimension, targeting)| (*dimension, targeting))
  }
}

/// A file placed in a slice at its final on-device path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SliceEntry {
  /// Final path with targeting suffixes removed.
  pub path: String,
  /// Content carried over from the module entry.
  pub content: ContentRef,
}

/// One installable asset slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetSlice {
  /// Name of the module the slice was cut from.
  pub module_name: String,
  /// Artifact kind.
  pub kind: SliceKind,
  /// Whether this is the module's only, untargeted slice.
  pub master: bool,
  /// Targeting metadata.
  pub targeting: SliceTargeting,
  /// Entries ordered by final path.
  pub entries: Vec<SliceEntry>,
}

impl AssetSlice {
  /// Final entry paths in order.
  pub fn entry_paths(&self) -> Vec<&str> {
    self.entries.iter().map(|entry| entry.path.as_str()).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rstest::rstest;

  #[rstest]
  #[case(Some("asset-pack"), DeliveryType::AssetPack)]
  #[case(Some("remote-asset"), DeliveryType::AssetPack)]
  #[case(Some(" remote-asset "), DeliveryType::AssetPack)]
  #[case(Some("feature"), DeliveryType::Feature)]
  #[case(None, DeliveryType::Feature)]
  fn reads_delivery_type_attribute(
    #[case] attribute: Option<&str>,
    #[case] expected: DeliveryType,
  ) {
    assert_eq!(DeliveryType::from_manifest_attribute(attribute), expected);
  }

  #[test]
  fn entry_directory_is_parent_path() {
    assert_eq!(ModuleEntry::new("assets/a/b.txt").directory(), "assets/a");
    assert_eq!(ModuleEntry::new("root.txt").directory(), "");
  }

  #[test]
  fn content_defaults_to_entry_path() {
    let module = BundleModule::builder("m")
      .add_file("assets/a.txt")
      .add_file_with_content("assets/b.txt", "blobs/42")
      .build();
    assert_eq!(module.entries[0].content_ref(), ContentRef("assets/a.txt".into()));
    assert_eq!(module.entries[1].content_ref(), ContentRef("blobs/42".into()));
  }

  #[test]
  fn deserialises_module_descriptors() {
    let source = r#"{
      "name": "textures",
      "delivery_type": "asset-pack",
      "directories": [{"path": "assets/gfx#tcf_astc", "targeting": {"tcf": "astc"}}],
      "entries": [{"path": "assets/gfx#tcf_astc/a.ktx"}]
    }"#;
    let module: BundleModule = serde_json::from_str(source).unwrap();
    assert_eq!(module.delivery(), DeliveryType::AssetPack);
    assert_eq!(
      module.directories[0].targeting.get(&OptimizationDimension::TextureCompressionFormat),
      Some(&"astc".to_string())
    );
  }

  #[test]
  fn unsplit_targeting_has_no_dimensions() {
    assert!(SliceTargeting::unsplit().is_unsplit());
    let targeting = SliceTargeting::single(
      OptimizationDimension::Language,
      Some(TargetingValue::Language("en".into())),
      [TargetingValue::Language("es".into())],
    );
    assert!(!targeting.is_unsplit());
    assert_eq!(
      targeting.get(OptimizationDimension::Language).unwrap().alternatives.len(),
      1
    );
  }
}
