//! Package resources.
//!
//! Resources are addressed the way the editor addresses them:
//! `Packages/<package>/<path>`. The store maps those names onto a packages
//! directory on disk and searches it by basename pattern.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use glob::Pattern;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::ResourceError;

/// Root every resource path lives under.
pub const PACKAGES_PREFIX: &str = "Packages/";

/// Resource search and read primitives.
pub trait ResourceLoader {
    /// All resources whose basename matches `pattern` (a glob), sorted.
    fn find_resources(&self, pattern: &str) -> Vec<String>;

    /// Read a resource by its `Packages/...` path.
    fn load_resource(&self, path: &str) -> Result<String, ResourceError>;
}

/// Prefix `name` with `Packages/` unless it already is.
pub fn with_packages_prefix(name: &str) -> String {
    if name.starts_with(PACKAGES_PREFIX) {
        name.to_string()
    } else {
        format!("{}{}", PACKAGES_PREFIX, name)
    }
}

/// Whether a resource basename matches a find pattern.
///
/// Invalid glob patterns degrade to a literal comparison.
pub fn matches_pattern(pattern: &str, basename: &str) -> bool {
    match Pattern::new(pattern) {
        Ok(p) => p.matches(basename),
        Err(_) => pattern == basename,
    }
}

/// Resources backed by a packages directory.
#[derive(Debug, Clone)]
pub struct ResourceStore {
    packages_path: PathBuf,
}

impl ResourceStore {
    pub fn new(packages_path: impl Into<PathBuf>) -> Self {
        Self {
            packages_path: packages_path.into(),
        }
    }

    pub fn packages_path(&self) -> &Path {
        &self.packages_path
    }

    /// Map a `Packages/...` resource path to its location on disk.
    pub fn file_path(&self, resource: &str) -> PathBuf {
        let relative = resource.strip_prefix(PACKAGES_PREFIX).unwrap_or(resource);
        relative
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.packages_path.clone(), |path, part| path.join(part))
    }

    /// Map a file on disk back to its `Packages/...` resource path.
    ///
    /// Returns `None` when the file is outside the packages directory.
    pub fn resource_path(&self, file: &Path) -> Option<String> {
        let root = fs::canonicalize(&self.packages_path).unwrap_or_else(|_| self.packages_path.clone());
        let file = fs::canonicalize(file).unwrap_or_else(|_| file.to_path_buf());
        let relative = file.strip_prefix(&root).ok()?;

        let parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        if parts.is_empty() {
            return None;
        }
        Some(format!("{}{}", PACKAGES_PREFIX, parts.join("/")))
    }

    /// The package a resource belongs to (`Packages/<package>/...`).
    pub fn package_of(resource: &str) -> Option<&str> {
        resource
            .strip_prefix(PACKAGES_PREFIX)?
            .split('/')
            .next()
            .filter(|p| !p.is_empty())
    }
}

impl ResourceLoader for ResourceStore {
    fn find_resources(&self, pattern: &str) -> Vec<String> {
        let mut found: Vec<String> = WalkDir::new(&self.packages_path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| matches_pattern(pattern, &entry.file_name().to_string_lossy()))
            .filter_map(|entry| self.resource_path(entry.path()))
            .collect();

        found.sort();
        debug!(pattern, count = found.len(), "find_resources");
        found
    }

    fn load_resource(&self, path: &str) -> Result<String, ResourceError> {
        if !path.starts_with(PACKAGES_PREFIX) {
            return Err(ResourceError::NotFound(path.to_string()));
        }

        let file = self.file_path(path);
        fs::read_to_string(&file).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ResourceError::NotFound(path.to_string()),
            _ => ResourceError::Io {
                path: path.to_string(),
                source: e,
            },
        })
    }
}
