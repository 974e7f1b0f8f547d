//! Helpers used to filter which modules are handed to the asset slice generator.

use tracing::debug;

use crate::models::{BundleModule, DeliveryType};

/// Trait describing which modules a generator should slice.
pub trait ModuleInclusion {
  /// Returns `true` when the module should be sliced.
  fn is_included(&self, module: &BundleModule) -> bool;
}

/// Selects modules whose manifest marks them as asset-only deliveries.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssetPackFilter;

impl ModuleInclusion for AssetPackFilter {
  fn is_included(&self, module: &BundleModule) -> bool {
    module.delivery() == DeliveryType::AssetPack
  }
}

impl<F> ModuleInclusion for F
where
  F: Fn(&BundleModule) -> bool,
{
  fn is_included(&self, module: &BundleModule) -> bool {
    self(module)
  }
}

/// Return the modules accepted by `filter`, preserving input order.
///
/// Rejected modules are left for other generators; they are neither sliced nor reported.
pub fn select_modules<'a, S: ModuleInclusion + ?Sized>(
  modules: &'a [BundleModule],
  filter: &S,
) -> Vec<&'a BundleModule> {
  modules
    .iter()
    .filter(|module| {
      let included = filter.is_included(module);
      if !included {
        debug!(module = %module.name, "module not selected for asset slicing");
      }
      included
    })
    .collect()
}
