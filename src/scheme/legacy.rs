use std::collections::BTreeMap;

use serde::Deserialize;

use super::{merge_styles, StyleMap, ThemeRule};
use crate::error::ThemeError;

#[derive(Debug, Deserialize)]
struct RawScheme {
    #[serde(default)]
    name: Option<String>,
    settings: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    settings: BTreeMap<String, plist::Value>,
}

/// A `.tmTheme` color scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyTheme {
    pub name: Option<String>,
    pub rules: Vec<ThemeRule>,
}

impl LegacyTheme {
    pub fn from_plist(path: &str, content: &str) -> Result<Self, ThemeError> {
        let raw: RawScheme =
            plist::from_bytes(content.as_bytes()).map_err(|source| ThemeError::MalformedPlist {
                path: path.to_string(),
                source,
            })?;

        let rules = raw
            .settings
            .into_iter()
            .map(|entry| ThemeRule {
                scope_selector: entry.scope,
                style: entry
                    .settings
                    .into_iter()
                    .filter_map(|(k, v)| v.as_string().map(|s| (k, s.to_string())))
                    .collect(),
            })
            .collect();

        Ok(Self {
            name: raw.name,
            rules,
        })
    }

    /// Union of every ruleless entry's settings, later entries winning.
    pub fn default_style(&self) -> StyleMap {
        merge_styles(
            StyleMap::new(),
            self.rules
                .iter()
                .filter(|rule| rule.is_default())
                .map(|rule| &rule.style),
        )
    }

    pub fn scoped_rules(&self) -> impl Iterator<Item = &ThemeRule> {
        self.rules.iter().filter(|rule| !rule.is_default())
    }
}
