//! The closed set of targeting dimensions and the typed values each one accepts.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ConfigError;

/// Axis of device variation an asset module can be split on.
///
/// The declaration order doubles as the canonical ordering of split dimensions, which in
/// turn fixes the layout of partition keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationDimension {
  /// Device locale language.
  #[serde(alias = "lang")]
  Language,
  /// GPU texture compression format support.
  #[serde(alias = "tcf")]
  TextureCompressionFormat,
  /// Developer-defined device tier.
  #[serde(alias = "tier")]
  DeviceTier,
  /// Developer-defined set of countries.
  #[serde(alias = "countries")]
  CountrySet,
}

impl OptimizationDimension {
  /// Every dimension in canonical order.
  pub const ALL: [OptimizationDimension; 4] = [
    Self::Language,
    Self::TextureCompressionFormat,
    Self::DeviceTier,
    Self::CountrySet,
  ];

  /// Stable configuration name of the dimension.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Language => "language",
      Self::TextureCompressionFormat => "texture_compression_format",
      Self::DeviceTier => "device_tier",
      Self::CountrySet => "country_set",
    }
  }

  /// Key used after `#` in a targeted directory name, e.g. `lang` in `images#lang_en`.
  pub fn suffix_key(self) -> &'static str {
    match self {
      Self::Language => "lang",
      Self::TextureCompressionFormat => "tcf",
      Self::DeviceTier => "tier",
      Self::CountrySet => "countries",
    }
  }

  /// Resolve a directory-name key back to its dimension.
  pub fn from_suffix_key(key: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|dimension| dimension.suffix_key() == key)
  }

  /// Parse a raw declared value into the typed value for this dimension.
  ///
  /// Returns `None` when the value is malformed for the dimension type.
  pub fn parse_value(self, raw: &str) -> Option<TargetingValue> {
    let raw = raw.trim();
    match self {
      Self::Language => language_pattern()
        .is_match(raw)
        .then(|| TargetingValue::Language(raw.to_string())),
      Self::TextureCompressionFormat => raw
        .parse::<TextureCompressionFormat>()
        .ok()
        .map(TargetingValue::TextureCompressionFormat),
      Self::DeviceTier => {
        if raw.is_empty() || !raw.bytes().all(|byte| byte.is_ascii_digit()) {
          return None;
        }
        raw.parse::<u32>().ok().map(TargetingValue::DeviceTier)
      }
      Self::CountrySet => country_set_pattern()
        .is_match(raw)
        .then(|| TargetingValue::CountrySet(raw.to_string())),
    }
  }
}

impl fmt::Display for OptimizationDimension {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OptimizationDimension {
  type Err = ConfigError;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    let normalised = value.trim().to_ascii_lowercase().replace('-', "_");
    Self::ALL
      .into_iter()
      .find(|dimension| dimension.as_str() == normalised || dimension.suffix_key() == normalised)
      .ok_or_else(|| ConfigError::UnknownDimension {
        value: value.to_string(),
      })
  }
}

fn language_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r"^[a-z]{2,3}(-[A-Za-z0-9]{2,8})?$").expect("invalid language regex")
  })
}

fn country_set_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("invalid country set regex"))
}

/// Texture compression formats a device GPU may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TextureCompressionFormat {
  /// ETC1 RGB8.
  Etc1Rgb8,
  /// Paletted textures.
  Paletted,
  /// ATI 3Dc.
  ThreeDc,
  /// ATI ATC.
  Atc,
  /// LATC.
  Latc,
  /// DXT1.
  Dxt1,
  /// S3TC.
  S3tc,
  /// PowerVR PVRTC.
  Pvrtc,
  /// ASTC.
  Astc,
  /// ETC2.
  Etc2,
}

impl TextureCompressionFormat {
  const NAMES: [(TextureCompressionFormat, &'static str); 10] = [
    (Self::Etc1Rgb8, "etc1_rgb8"),
    (Self::Paletted, "paletted"),
    (Self::ThreeDc, "3dc"),
    (Self::Atc, "atc"),
    (Self::Latc, "latc"),
    (Self::Dxt1, "dxt1"),
    (Self::S3tc, "s3tc"),
    (Self::Pvrtc, "pvrtc"),
    (Self::Astc, "astc"),
    (Self::Etc2, "etc2"),
  ];

  /// Name used in directory suffixes and serialised targeting.
  pub fn as_str(self) -> &'static str {
    Self::NAMES
      .iter()
      .find(|(format, _)| *format == self)
      .map(|(_, name)| *name)
      .unwrap_or_default()
  }
}

impl FromStr for TextureCompressionFormat {
  type Err = ();

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    Self::NAMES
      .iter()
      .find(|(_, name)| *name == value)
      .map(|(format, _)| *format)
      .ok_or(())
  }
}

impl fmt::Display for TextureCompressionFormat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A concrete, validated value along one dimension.
///
/// Values of the same dimension order lexicographically (numerically for device tiers),
/// which is what makes partition ordering reproducible.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TargetingValue {
  /// Language code such as `en` or `pt-BR`.
  Language(String),
  /// Texture compression format.
  TextureCompressionFormat(TextureCompressionFormat),
  /// Device tier level.
  DeviceTier(u32),
  /// Country set name.
  CountrySet(String),
}

impl TargetingValue {
  /// Dimension this value belongs to.
  pub fn dimension(&self) -> OptimizationDimension {
    match self {
      Self::Language(_) => OptimizationDimension::Language,
      Self::TextureCompressionFormat(_) => OptimizationDimension::TextureCompressionFormat,
      Self::DeviceTier(_) => OptimizationDimension::DeviceTier,
      Self::CountrySet(_) => OptimizationDimension::CountrySet,
    }
  }
}

impl fmt::Display for TargetingValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Language(value) | Self::CountrySet(value) => f.write_str(value),
      Self::TextureCompressionFormat(format) => fmt::Display::fmt(format, f),
      Self::DeviceTier(tier) => write!(f, "{tier}"),
    }
  }
}

impl Serialize for TargetingValue {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}
