//! Color scheme documents.
//!
//! Two generations of color scheme files exist:
//!
//! - **Legacy** (`.tmTheme`, `.hidden-tmTheme`): a property list with an
//!   ordered `settings` array. Entries without a `scope` supply the defaults.
//! - **Modern** (`.sublime-color-scheme`, `.hidden-color-scheme`): JSON with
//!   `globals`, `variables` and an ordered `rules` array.
//!
//! The shape is chosen once from the resource suffix and kept as a tagged
//! variant, so resolution code never inspects content to decide.

mod legacy;
mod modern;

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::ThemeError;
use crate::resource::{with_packages_prefix, ResourceLoader};

pub use legacy::LegacyTheme;
pub use modern::ModernTheme;

#[cfg(test)]
pub(crate) use legacy::tests as legacy_tests;
#[cfg(test)]
pub(crate) use modern::tests as modern_tests;

/// Style attributes keyed by attribute name (`foreground`, `fontStyle`, ...).
pub type StyleMap = BTreeMap<String, String>;

/// Suffixes of the modern color scheme format.
pub const MODERN_SUFFIXES: [&str; 2] = [".sublime-color-scheme", ".hidden-color-scheme"];

/// Whether a color scheme path names a modern (JSON) document.
pub fn is_modern_scheme(path: &str) -> bool {
    MODERN_SUFFIXES.iter().any(|suffix| path.ends_with(suffix))
}

/// Computes how specifically a selector matches a scope path.
///
/// A score of `0.0` means no match; higher scores are more specific.
pub trait SelectorScorer {
    fn score(&self, scope_path: &str, selector: &str) -> f64;
}

/// One entry of a color scheme. A rule without a selector applies everywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeRule {
    pub scope_selector: Option<String>,
    pub style: StyleMap,
}

impl ThemeRule {
    pub fn scoped(selector: &str, style: StyleMap) -> Self {
        Self {
            scope_selector: Some(selector.to_string()),
            style,
        }
    }

    pub fn is_default(&self) -> bool {
        self.scope_selector.is_none()
    }
}

/// A parsed color scheme of either generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeDocument {
    Legacy(LegacyTheme),
    Modern(ModernTheme),
}

impl ThemeDocument {
    /// Load a color scheme by name or resource path.
    ///
    /// A name that resolves to exactly one resource uses that resource;
    /// anything else is read relative to `Packages/`.
    pub fn load(resources: &dyn ResourceLoader, name: &str) -> Result<Self, ThemeError> {
        let found = resources.find_resources(name);
        let path = match found.as_slice() {
            [unique] => unique.clone(),
            _ => with_packages_prefix(name),
        };

        debug!(name, path = %path, "loading color scheme");
        let content = resources.load_resource(&path)?;
        Self::parse(&path, &content)
    }

    /// Parse color scheme content, picking the shape from `path`'s suffix.
    pub fn parse(path: &str, content: &str) -> Result<Self, ThemeError> {
        if is_modern_scheme(path) {
            ModernTheme::from_json(path, content).map(Self::Modern)
        } else {
            LegacyTheme::from_plist(path, content).map(Self::Legacy)
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Legacy(theme) => theme.name.as_deref(),
            Self::Modern(theme) => theme.name.as_deref(),
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy(_))
    }

    pub fn rules(&self) -> &[ThemeRule] {
        match self {
            Self::Legacy(theme) => &theme.rules,
            Self::Modern(theme) => &theme.rules,
        }
    }

    pub fn rules_mut(&mut self) -> &mut Vec<ThemeRule> {
        match self {
            Self::Legacy(theme) => &mut theme.rules,
            Self::Modern(theme) => &mut theme.rules,
        }
    }
}

/// Fold overlays left to right; later overlays win per key.
pub fn merge_styles<'a>(base: StyleMap, overlays: impl IntoIterator<Item = &'a StyleMap>) -> StyleMap {
    overlays.into_iter().fold(base, |mut style, overlay| {
        style.extend(overlay.iter().map(|(k, v)| (k.clone(), v.clone())));
        style
    })
}

/// Apply every scoped rule matching `scope_path` on top of `base`, in
/// ascending score order.
///
/// Rules with equal scores keep document order. A broad rule and a narrow
/// rule both contribute; only overlapping attributes are overridden.
pub fn accumulate_matching<'a>(
    scorer: &dyn SelectorScorer,
    scope_path: &str,
    rules: impl IntoIterator<Item = &'a ThemeRule>,
    base: StyleMap,
) -> StyleMap {
    let mut scored: Vec<(f64, &ThemeRule)> = rules
        .into_iter()
        .filter_map(|rule| {
            let selector = rule.scope_selector.as_deref()?;
            let score = scorer.score(scope_path, selector);
            (score > 0.0).then_some((score, rule))
        })
        .collect();

    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    merge_styles(base, scored.into_iter().map(|(_, rule)| &rule.style))
}
