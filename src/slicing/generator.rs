//! Orchestrates slicing across every qualifying module of a bundle.

use tracing::{debug, info};

use crate::config::GenerationConfig;
use crate::error::SliceResult;
use crate::models::{AssetSlice, BundleModule};
use crate::selection::{AssetPackFilter, ModuleInclusion, select_modules};
use crate::targeting::DirectoryTargetingIndex;

use super::dimensions::select_split_dimensions;
use super::partition::partition_directories;
use super::slice::SliceBuilder;

/// Slicing result for a single module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleOutcome<'a> {
  /// Module the result belongs to.
  pub module: &'a BundleModule,
  /// Slices in partition order, or the error that aborted this module.
  pub result: SliceResult<Vec<AssetSlice>>,
}

/// Generates asset slices for the asset-only modules of a bundle.
#[derive(Debug, Clone)]
pub struct AssetSlicesGenerator<'a, S = AssetPackFilter> {
  modules: &'a [BundleModule],
  config: &'a GenerationConfig,
  filter: S,
}

impl<'a> AssetSlicesGenerator<'a> {
  /// Generator selecting modules by their manifest delivery type.
  pub fn new(modules: &'a [BundleModule], config: &'a GenerationConfig) -> Self {
    Self {
      modules,
      config,
      filter: AssetPackFilter,
    }
  }
}

impl<'a, S: ModuleInclusion> AssetSlicesGenerator<'a, S> {
  /// Replace the module filter.
  pub fn with_filter<T: ModuleInclusion>(self, filter: T) -> AssetSlicesGenerator<'a, T> {
    AssetSlicesGenerator {
      modules: self.modules,
      config: self.config,
      filter,
    }
  }

  /// Slice every qualifying module, stopping at the first module that fails.
  ///
  /// Slices are concatenated in module input order, each module's slices in partition order.
  pub fn generate_asset_slices(&self) -> SliceResult<Vec<AssetSlice>> {
    let mut slices = Vec::new();
    for outcome in self.generate_per_module() {
      slices.extend(outcome.result?);
    }
    info!(slices = slices.len(), "generated asset slices");
    Ok(slices)
  }

  /// Slice every qualifying module independently.
  ///
  /// A module that fails does not affect the outcome of any other module.
  pub fn generate_per_module(&self) -> Vec<ModuleOutcome<'a>> {
    select_modules(self.modules, &self.filter)
      .into_iter()
      .map(|module| ModuleOutcome {
        module,
        result: slice_module(module, self.config),
      })
      .collect()
  }
}

#[cfg(feature = "parallel")]
impl<'a, S: ModuleInclusion + Sync> AssetSlicesGenerator<'a, S> {
  /// Same output as [`Self::generate_asset_slices`], slicing modules on the rayon pool.
  pub fn generate_asset_slices_parallel(&self) -> SliceResult<Vec<AssetSlice>> {
    use rayon::prelude::*;

    let selected = select_modules(self.modules, &self.filter);
    let results: Vec<SliceResult<Vec<AssetSlice>>> = selected
      .par_iter()
      .map(|module| slice_module(module, self.config))
      .collect();

    let mut slices = Vec::new();
    for result in results {
      slices.extend(result?);
    }
    info!(slices = slices.len(), "generated asset slices");
    Ok(slices)
  }
}

/// Slice one module according to `config`.
///
/// The module is assumed to be asset-only; no delivery type check happens here.
pub fn slice_module(
  module: &BundleModule,
  config: &GenerationConfig,
) -> SliceResult<Vec<AssetSlice>> {
  let index = DirectoryTargetingIndex::build(module)?;
  let dimensions = select_split_dimensions(config.optimization_dimensions(), &index);
  let partitioning = partition_directories(&index, &dimensions);

  debug!(
    module = %module.name,
    dimensions = ?dimensions,
    partitions = partitioning.partitions().len(),
    "partitioned asset directories"
  );

  SliceBuilder::new(&module.name, &module.entries, &index, &partitioning).build_all()
}

/// Slice the asset-only modules among `modules`.
pub fn generate(
  modules: &[BundleModule],
  config: &GenerationConfig,
) -> SliceResult<Vec<AssetSlice>> {
  AssetSlicesGenerator::new(modules, config).generate_asset_slices()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::SliceError;
  use crate::targeting::OptimizationDimension;

  fn asset_pack(name: &str, files: &[&str]) -> BundleModule {
    files
      .iter()
      .fold(
        BundleModule::builder(name).delivery_type("asset-pack"),
        |builder, file| builder.add_file(*file),
      )
      .build()
  }

  #[test]
  fn preserves_module_order() {
    let modules = vec![
      asset_pack("zeta", &["assets/z.txt"]),
      asset_pack("alpha", &["assets/a.txt"]),
    ];
    let config = GenerationConfig::default();

    let slices = generate(&modules, &config).unwrap();

    let names: Vec<&str> = slices.iter().map(|slice| slice.module_name.as_str()).collect();
    assert_eq!(names, vec!["zeta", "alpha"]);
  }

  #[test]
  fn isolates_failing_modules() {
    let modules = vec![
      asset_pack("broken", &[]),
      asset_pack("fine", &["assets/a.txt"]),
    ];
    let config = GenerationConfig::default();
    let generator = AssetSlicesGenerator::new(&modules, &config);

    let outcomes = generator.generate_per_module();

    assert_eq!(outcomes.len(), 2);
    assert_eq!(
      outcomes[0].result,
      Err(SliceError::NoDirectories {
        module: "broken".into()
      })
    );
    assert_eq!(outcomes[1].result.as_ref().map(Vec::len), Ok(1));
    assert!(generator.generate_asset_slices().is_err());
  }

  #[test]
  fn custom_filters_replace_delivery_check() {
    let modules = vec![BundleModule::builder("base").add_file("assets/a.txt").build()];
    let config = GenerationConfig::default();

    let slices = AssetSlicesGenerator::new(&modules, &config)
      .with_filter(|_: &BundleModule| true)
      .generate_asset_slices()
      .unwrap();

    assert_eq!(slices.len(), 1);
  }

  #[cfg(feature = "parallel")]
  #[test]
  fn parallel_generation_matches_sequential() {
    let modules: Vec<BundleModule> = (0..16)
      .map(|i| {
        asset_pack(&format!("pack_{i:02}"), &[
          "assets/text#lang_en/a.txt",
          "assets/text#lang_fr/a.txt",
          "assets/shared/b.txt",
        ])
      })
      .collect();
    let config = GenerationConfig::new([OptimizationDimension::Language]);
    let generator = AssetSlicesGenerator::new(&modules, &config);

    assert_eq!(
      generator.generate_asset_slices_parallel().unwrap(),
      generator.generate_asset_slices().unwrap()
    );
  }
}
