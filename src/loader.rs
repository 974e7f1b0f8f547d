//! Loading module descriptors from JSON or from an on-disk bundle layout.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::models::{AssetsDirectory, BundleModule, ContentRef, ModuleEntry};

/// Per-module metadata file looked up by [`scan_bundle_dir`].
pub const MODULE_METADATA_FILE: &str = "module.json";

/// Directory under each module holding its assets.
pub const ASSETS_DIR: &str = "assets";

/// Optional metadata stored next to a module's assets.
#[derive(Debug, Default, Deserialize)]
struct ModuleMetadataFile {
  #[serde(default)]
  delivery_type: Option<String>,
  #[serde(default)]
  directories: Vec<AssetsDirectory>,
}

/// Read a JSON array of module descriptors.
pub fn load_modules_from_json(path: &Path) -> Result<Vec<BundleModule>, ConfigError> {
  let contents = read(path)?;
  serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
    path: path.to_path_buf(),
    source,
  })
}

/// Discover modules laid out as `<root>/<module>/assets/...`.
///
/// Every non-hidden sub-directory of `root` is a module. Its optional [`MODULE_METADATA_FILE`]
/// supplies the manifest delivery type and declared directory targeting; every regular file
/// under [`ASSETS_DIR`] becomes an entry whose content reference is its path on disk. Modules
/// and entries are sorted by name so repeated scans agree.
pub fn scan_bundle_dir(root: &Path) -> Result<Vec<BundleModule>, ConfigError> {
  let mut module_dirs = Vec::new();
  for entry in read_dir(root)? {
    let entry = entry.map_err(|source| io_error(root, source))?;
    let name = entry.file_name().to_string_lossy().to_string();
    if name.starts_with('.') {
      continue;
    }
    if entry.file_type().is_ok_and(|ft| ft.is_dir()) {
      module_dirs.push((name, entry.path()));
    }
  }
  module_dirs.sort();

  module_dirs
    .into_iter()
    .map(|(name, path)| scan_module(name, &path))
    .collect()
}

fn scan_module(name: String, module_dir: &Path) -> Result<BundleModule, ConfigError> {
  let metadata_path = module_dir.join(MODULE_METADATA_FILE);
  let metadata = if metadata_path.is_file() {
    let contents = read(&metadata_path)?;
    serde_json::from_str::<ModuleMetadataFile>(&contents).map_err(|source| ConfigError::Parse {
      path: metadata_path.clone(),
      source,
    })?
  } else {
    ModuleMetadataFile::default()
  };

  let mut entries = Vec::new();
  let assets_root = module_dir.join(ASSETS_DIR);
  if assets_root.is_dir() {
    collect_entries(&assets_root, Path::new(ASSETS_DIR), &mut entries)?;
  }
  entries.sort_by(|left: &ModuleEntry, right: &ModuleEntry| left.path.cmp(&right.path));

  debug!(module = %name, entries = entries.len(), "scanned module");

  Ok(BundleModule {
    name,
    delivery_type: metadata.delivery_type,
    directories: metadata.directories,
    entries,
  })
}

fn collect_entries(
  dir: &Path,
  relative_root: &Path,
  entries: &mut Vec<ModuleEntry>,
) -> Result<(), ConfigError> {
  for entry in read_dir(dir)? {
    let entry = entry.map_err(|source| io_error(dir, source))?;
    let file_name = entry.file_name();
    if file_name.to_string_lossy().starts_with('.') {
      continue;
    }

    let path = entry.path();
    let relative = relative_root.join(&file_name);
    let file_type = entry.file_type().map_err(|source| io_error(&path, source))?;

    if file_type.is_dir() {
      collect_entries(&path, &relative, entries)?;
    } else if file_type.is_file() {
      entries.push(ModuleEntry {
        path: relative.to_string_lossy().replace('\\', "/"),
        content: Some(ContentRef(path.to_string_lossy().to_string())),
      });
    }
  }
  Ok(())
}

fn read(path: &Path) -> Result<String, ConfigError> {
  fs::read_to_string(path).map_err(|source| io_error(path, source))
}

fn read_dir(path: &Path) -> Result<fs::ReadDir, ConfigError> {
  fs::read_dir(path).map_err(|source| io_error(path, source))
}

fn io_error(path: &Path, source: std::io::Error) -> ConfigError {
  ConfigError::Io {
    path: PathBuf::from(path),
    source,
  }
}
