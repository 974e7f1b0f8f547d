//! Codec for targeting encoded in directory names, e.g. `assets/images#lang_en`.
//!
//! Each path segment may carry at most one `#key_value` suffix. The suffix is build-time
//! metadata only: once a module is split on a dimension, that dimension's suffixes are removed
//! from the paths that end up on device.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use super::dimension::OptimizationDimension;
use crate::error::SliceError;

const TARGETING_MARKER: char = '#';

/// One `/`-separated segment of a directory path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetedSegment {
  /// Segment exactly as written.
  pub raw: String,
  /// Segment name with any targeting suffix removed.
  pub name: String,
  /// Dimension and raw value encoded in the segment, if any.
  pub targeting: Option<(OptimizationDimension, String)>,
}

/// A directory path split into segments with their encoded targeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetedDirectory {
  path: String,
  segments: Vec<TargetedSegment>,
}

/// Reasons a directory name cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryNameError {
  /// Segment is not of the form `name#key_value`.
  Malformed {
    /// Offending segment.
    segment: String,
  },
  /// Segment uses a key outside the known dimensions.
  UnknownKey {
    /// Offending key.
    key: String,
  },
  /// The same dimension is encoded by two segments.
  DuplicateKey {
    /// Dimension encoded twice.
    dimension: OptimizationDimension,
  },
}

impl DirectoryNameError {
  /// Attach module and directory identity to the error.
  pub fn into_slice_error(self, module: &str, directory: &str) -> SliceError {
    let module = module.to_string();
    let directory = directory.to_string();
    match self {
      Self::Malformed { segment } => SliceError::MalformedDirectorySegment {
        module,
        directory,
        segment,
      },
      Self::UnknownKey { key } => SliceError::UnknownTargetingKey {
        module,
        directory,
        key,
      },
      Self::DuplicateKey { dimension } => SliceError::DuplicateTargetingKey {
        module,
        directory,
        dimension,
      },
    }
  }
}

fn segment_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r"^(?P<base>[^#]+)#(?P<key>[^_#]+)_(?P<value>[^#]+)$")
      .expect("invalid targeted segment regex")
  })
}

impl TargetedDirectory {
  /// Decode the targeting carried by every segment of `path`.
  pub fn parse(path: &str) -> Result<Self, DirectoryNameError> {
    let mut segments: Vec<TargetedSegment> = Vec::new();

    for raw in path.split('/').filter(|segment| !segment.is_empty()) {
      let segment = parse_segment(raw)?;
      if let Some((dimension, _)) = &segment.targeting {
        let repeated = segments
          .iter()
          .filter_map(|existing| existing.targeting.as_ref())
          .any(|(existing, _)| existing == dimension);
        if repeated {
          return Err(DirectoryNameError::DuplicateKey {
            dimension: *dimension,
          });
        }
      }
      segments.push(segment);
    }

    let path = segments
      .iter()
      .map(|segment| segment.raw.as_str())
      .collect::<Vec<_>>()
      .join("/");
    Ok(Self { path, segments })
  }

  /// Declared path with empty segments dropped, e.g. `assets/vo/` becomes `assets/vo`.
  pub fn path(&self) -> &str {
    &self.path
  }

  /// Decoded segments in path order.
  pub fn segments(&self) -> &[TargetedSegment] {
    &self.segments
  }

  /// Path with every targeting suffix removed.
  pub fn canonical_path(&self) -> String {
    self
      .segments
      .iter()
      .map(|segment| segment.name.as_str())
      .collect::<Vec<_>>()
      .join("/")
  }

  /// Path with the suffixes of `dimensions` removed; other suffixes are kept verbatim.
  pub fn path_without(&self, dimensions: &BTreeSet<OptimizationDimension>) -> String {
    self
      .segments
      .iter()
      .map(|segment| match &segment.targeting {
        Some((dimension, _)) if dimensions.contains(dimension) => segment.name.as_str(),
        _ => segment.raw.as_str(),
      })
      .collect::<Vec<_>>()
      .join("/")
  }

  /// Dimension/value pairs encoded anywhere in the path.
  pub fn encoded_targeting(&self) -> impl Iterator<Item = (OptimizationDimension, &str)> {
    self
      .segments
      .iter()
      .filter_map(|segment| segment.targeting.as_ref())
      .map(|(dimension, value)| (*dimension, value.as_str()))
  }
}

fn parse_segment(raw: &str) -> Result<TargetedSegment, DirectoryNameError> {
  if !raw.contains(TARGETING_MARKER) {
    return Ok(TargetedSegment {
      raw: raw.to_string(),
      name: raw.to_string(),
      targeting: None,
    });
  }

  let captures = segment_pattern()
    .captures(raw)
    .ok_or_else(|| DirectoryNameError::Malformed {
      segment: raw.to_string(),
    })?;

  let key = &captures["key"];
  let dimension =
    OptimizationDimension::from_suffix_key(key).ok_or_else(|| DirectoryNameError::UnknownKey {
      key: key.to_string(),
    })?;

  Ok(TargetedSegment {
    raw: raw.to_string(),
    name: captures["base"].to_string(),
    targeting: Some((dimension, captures["value"].to_string())),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use rstest::rstest;

  #[test]
  fn decodes_language_suffix() {
    let directory = TargetedDirectory::parse("assets/images#lang_en").unwrap();
    assert_eq!(directory.canonical_path(), "assets/images");
    assert_eq!(
      directory.encoded_targeting().collect::<Vec<_>>(),
      vec![(OptimizationDimension::Language, "en")]
    );
  }

  #[test]
  fn decodes_nested_suffixes_with_underscored_values() {
    let directory = TargetedDirectory::parse("assets/gfx#tcf_etc1_rgb8/levels#tier_2").unwrap();
    assert_eq!(directory.canonical_path(), "assets/gfx/levels");
    assert_eq!(
      directory.encoded_targeting().collect::<Vec<_>>(),
      vec![
        (OptimizationDimension::TextureCompressionFormat, "etc1_rgb8"),
        (OptimizationDimension::DeviceTier, "2"),
      ]
    );
  }

  #[test]
  fn strips_only_requested_dimensions() {
    let directory = TargetedDirectory::parse("assets/gfx#tcf_astc/text#lang_en").unwrap();
    assert_eq!(
      directory.path_without(&BTreeSet::from([OptimizationDimension::Language])),
      "assets/gfx#tcf_astc/text"
    );
    assert_eq!(
      directory.path_without(&BTreeSet::new()),
      "assets/gfx#tcf_astc/text#lang_en"
    );
  }

  #[rstest]
  #[case("assets/vo#lang_en/", "assets/vo#lang_en")]
  #[case("/assets//vo", "assets/vo")]
  #[case("assets", "assets")]
  fn drops_empty_segments(#[case] declared: &str, #[case] expected: &str) {
    assert_eq!(TargetedDirectory::parse(declared).unwrap().path(), expected);
  }

  #[test]
  fn untargeted_paths_are_already_canonical() {
    let directory = TargetedDirectory::parse("assets/sounds").unwrap();
    assert_eq!(directory.canonical_path(), "assets/sounds");
    assert_eq!(directory.encoded_targeting().count(), 0);
  }

  #[rstest]
  #[case("assets/#lang_en")]
  #[case("assets/images#lang")]
  #[case("assets/images#lang_en#tier_1")]
  fn rejects_malformed_segments(#[case] path: &str) {
    assert!(matches!(
      TargetedDirectory::parse(path),
      Err(DirectoryNameError::Malformed { .. })
    ));
  }

  #[test]
  fn rejects_unknown_keys() {
    assert_eq!(
      TargetedDirectory::parse("assets/libs#abi_x86"),
      Err(DirectoryNameError::UnknownKey { key: "abi".into() })
    );
  }

  #[test]
  fn rejects_repeated_dimensions() {
    assert_eq!(
      TargetedDirectory::parse("assets/a#lang_en/b#lang_fr"),
      Err(DirectoryNameError::DuplicateKey {
        dimension: OptimizationDimension::Language
      })
    );
  }
}
