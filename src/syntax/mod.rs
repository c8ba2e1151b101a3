//! Syntax definitions and the syntect-backed host.
//!
//! ## Syntax sources
//!
//! Syntaxes come from two places:
//! 1. **Bundled syntaxes**: syntect's defaults, compiled into the binary and
//!    exposed as virtual resources `Packages/<Name>/<Name>.sublime-syntax`
//! 2. **Package syntaxes**: every `.sublime-syntax` under the packages
//!    directory
//!
//! A package syntax overrides a bundled syntax of the same name.

mod host;
mod themes;
mod view;

use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use syntect::parsing::{SyntaxDefinition, SyntaxReference, SyntaxSet, SyntaxSetBuilder};
use tracing::{debug, warn};

use crate::resource::{matches_pattern, ResourceLoader, ResourceStore, PACKAGES_PREFIX};

pub use host::SyntectHost;
pub use themes::{scope_style, view_style, SyntectScorer};
pub use view::SyntectView;

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();

/// Get the bundled SyntaxSet instance.
/// This is lazily initialized on first access.
pub fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

/// Virtual resource path of a bundled syntax.
pub fn bundled_resource_path(name: &str) -> String {
    format!("{}{}/{}.sublime-syntax", PACKAGES_PREFIX, name, name)
}

/// All syntaxes a view can be assigned, keyed by resource path.
#[derive(Debug, Clone)]
pub struct SyntaxCatalog {
    syntaxes: SyntaxSet,
    /// Resource path -> syntax name.
    resources: BTreeMap<String, String>,
    /// Resource paths that exist only inside the binary.
    bundled: Vec<String>,
}

impl SyntaxCatalog {
    /// Load the bundled syntaxes plus every package syntax found in `store`.
    pub fn load(store: &ResourceStore) -> Self {
        let mut packaged: Vec<(String, SyntaxDefinition)> = Vec::new();
        for resource in store.find_resources("*.sublime-syntax") {
            let content = match store.load_resource(&resource) {
                Ok(content) => content,
                Err(e) => {
                    warn!(resource = %resource, error = %e, "failed to read syntax");
                    continue;
                }
            };
            match SyntaxDefinition::load_from_str(&content, true, None) {
                Ok(definition) => packaged.push((resource, definition)),
                Err(e) => warn!(resource = %resource, error = %e, "failed to load syntax"),
            }
        }

        Self::from_definitions(packaged)
    }

    fn from_definitions(packaged: Vec<(String, SyntaxDefinition)>) -> Self {
        let bundled_syntaxes = syntax_set();
        let overridden: HashSet<&str> = packaged.iter().map(|(_, d)| d.name.as_str()).collect();

        let mut resources = BTreeMap::new();
        let mut bundled = Vec::new();
        for syntax in bundled_syntaxes.syntaxes() {
            if overridden.contains(syntax.name.as_str()) {
                continue;
            }
            let path = bundled_resource_path(&syntax.name);
            resources.insert(path.clone(), syntax.name.clone());
            bundled.push(path);
        }
        for (resource, definition) in &packaged {
            resources.insert(resource.clone(), definition.name.clone());
        }

        let syntaxes = if packaged.is_empty() {
            bundled_syntaxes.clone()
        } else {
            let defaults = bundled_syntaxes.clone().into_builder();
            let mut builder = SyntaxSetBuilder::new();
            for definition in defaults.syntaxes() {
                if !overridden.contains(definition.name.as_str()) {
                    builder.add(definition.clone());
                }
            }
            for (_, definition) in packaged {
                builder.add(definition);
            }
            builder.build()
        };

        bundled.sort();
        debug!(
            syntaxes = syntaxes.syntaxes().len(),
            resources = resources.len(),
            "syntax catalog loaded"
        );
        Self {
            syntaxes,
            resources,
            bundled,
        }
    }

    pub fn syntax_set(&self) -> &SyntaxSet {
        &self.syntaxes
    }

    /// Bundled syntax resources whose basename matches `pattern`.
    pub fn find_bundled(&self, pattern: &str) -> Vec<String> {
        self.bundled
            .iter()
            .filter(|path| {
                path.rsplit('/')
                    .next()
                    .is_some_and(|basename| matches_pattern(pattern, basename))
            })
            .cloned()
            .collect()
    }

    /// The syntax a resource path defines, if it can be assigned to a view.
    pub fn syntax_for_resource(&self, resource: &str) -> Option<&SyntaxReference> {
        let name = self.resources.get(resource)?;
        self.syntaxes.find_syntax_by_name(name)
    }
}
