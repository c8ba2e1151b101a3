//! Scope path to resolved style.
//!
//! Legacy documents are resolved directly from their rules: the merged
//! defaults, then every matching scoped rule folded in ascending score order.
//! Modern documents go through the view's style API, with `fontStyle`
//! synthesized from the reported `bold`/`italic` flags.
//!
//! Results are memoized per scope path for the lifetime of one resolver.

use std::collections::HashMap;

use crate::host::View;
use crate::scheme::{accumulate_matching, SelectorScorer, StyleMap, ThemeDocument};

/// A fully merged style. Missing attributes read as `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedStyle(StyleMap);

impl ResolvedStyle {
    pub fn get(&self, attribute: &str) -> &str {
        self.0.get(attribute).map_or("", String::as_str)
    }

    pub fn as_map(&self) -> &StyleMap {
        &self.0
    }
}

impl From<StyleMap> for ResolvedStyle {
    fn from(style: StyleMap) -> Self {
        Self(style)
    }
}

/// Resolves styles for one rendered view.
pub struct StyleResolver<'a> {
    document: ThemeDocument,
    defaults: StyleMap,
    scorer: &'a dyn SelectorScorer,
    view: &'a dyn View,
    cache: HashMap<String, ResolvedStyle>,
}

impl<'a> StyleResolver<'a> {
    pub fn new(document: ThemeDocument, scorer: &'a dyn SelectorScorer, view: &'a dyn View) -> Self {
        let defaults = match &document {
            ThemeDocument::Legacy(theme) => theme.default_style(),
            ThemeDocument::Modern(_) => StyleMap::new(),
        };
        Self {
            document,
            defaults,
            scorer,
            view,
            cache: HashMap::new(),
        }
    }

    /// Style of the scope at a buffer offset of the view.
    pub fn at_point(&mut self, point: usize) -> ResolvedStyle {
        let scope = self.view.scope_name(point);
        self.at(&scope)
    }

    /// Style of a scope path.
    pub fn at(&mut self, scope_path: &str) -> ResolvedStyle {
        let scope_path = scope_path.trim();
        if let Some(style) = self.cache.get(scope_path) {
            return style.clone();
        }

        let style = match &self.document {
            ThemeDocument::Legacy(theme) => ResolvedStyle(accumulate_matching(
                self.scorer,
                scope_path,
                theme.scoped_rules(),
                self.defaults.clone(),
            )),
            ThemeDocument::Modern(_) => {
                let host_style = self
                    .view
                    .style()
                    .overlay(&self.view.style_for_scope(scope_path));
                let mut style = host_style.attributes.clone();
                style.insert("fontStyle".to_string(), host_style.font_style());
                ResolvedStyle(style)
            }
        };

        self.cache.insert(scope_path.to_string(), style.clone());
        style
    }
}
