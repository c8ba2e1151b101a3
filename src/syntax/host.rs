use std::path::{Path, PathBuf};

use tracing::info;

use super::{SyntaxCatalog, SyntectScorer, SyntectView};
use crate::error::ResourceError;
use crate::host::{Host, View};
use crate::resource::{ResourceLoader, ResourceStore};
use crate::scheme::SelectorScorer;

/// Host backed by a packages directory and syntect.
#[derive(Debug)]
pub struct SyntectHost {
    store: ResourceStore,
    catalog: SyntaxCatalog,
    scorer: SyntectScorer,
    build: u32,
}

impl SyntectHost {
    pub fn new(packages_path: impl Into<PathBuf>, build: u32) -> Self {
        let store = ResourceStore::new(packages_path);
        let catalog = SyntaxCatalog::load(&store);
        info!(
            packages = %store.packages_path().display(),
            build,
            "host initialized"
        );
        Self {
            store,
            catalog,
            scorer: SyntectScorer::new(),
            build,
        }
    }

    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    pub fn catalog(&self) -> &SyntaxCatalog {
        &self.catalog
    }

    pub fn packages_path(&self) -> &Path {
        self.store.packages_path()
    }

    /// A concretely typed view, for callers that need more than [`View`].
    pub fn open_view(&self) -> SyntectView<'_> {
        SyntectView::new(self)
    }
}

impl ResourceLoader for SyntectHost {
    fn find_resources(&self, pattern: &str) -> Vec<String> {
        let mut found = self.store.find_resources(pattern);
        found.extend(self.catalog.find_bundled(pattern));
        found.sort();
        found.dedup();
        found
    }

    fn load_resource(&self, path: &str) -> Result<String, ResourceError> {
        self.store.load_resource(path)
    }
}

impl Host for SyntectHost {
    fn resources(&self) -> &dyn ResourceLoader {
        self
    }

    fn file_name(&self, resource: &str) -> PathBuf {
        self.store.file_path(resource)
    }

    fn scorer(&self) -> &dyn SelectorScorer {
        &self.scorer
    }

    fn build(&self) -> u32 {
        self.build
    }

    fn platform(&self) -> &str {
        std::env::consts::OS
    }

    fn create_view(&self) -> Box<dyn View + '_> {
        Box::new(self.open_view())
    }
}
