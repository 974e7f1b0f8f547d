//! Serialisable summary of a generation run, handed to packaging and device matching.

use serde::Serialize;

use crate::models::AssetSlice;

/// Per-module slice counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleSliceSummary {
  /// Module name.
  pub module: String,
  /// Number of slices produced for the module.
  pub slices: usize,
  /// Whether the module was left unsplit.
  pub master_only: bool,
}

/// Slice manifest written by the command line tool.
#[derive(Debug, Clone, Serialize)]
pub struct SliceReport<'a> {
  /// Per-module summaries in module order.
  pub modules: Vec<ModuleSliceSummary>,
  /// Every generated slice in generation order.
  pub slices: &'a [AssetSlice],
}

impl<'a> SliceReport<'a> {
  /// Summarise `slices`, which must be grouped by module as the generator emits them.
  pub fn new(slices: &'a [AssetSlice]) -> Self {
    let mut modules: Vec<ModuleSliceSummary> = Vec::new();
    for slice in slices {
      match modules.last_mut() {
        Some(summary) if summary.module == slice.module_name => {
          summary.slices += 1;
          summary.master_only &= slice.master;
        }
        _ => modules.push(ModuleSliceSummary {
          module: slice.module_name.clone(),
          slices: 1,
          master_only: slice.master,
        }),
      }
    }
    Self { modules, slices }
  }

  /// Render the report as prettified JSON.
  pub fn to_json_pretty(&self) -> serde_json::Result<String> {
    serde_json::to_string_pretty(self)
  }
}
