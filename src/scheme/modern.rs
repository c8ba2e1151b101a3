use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::{StyleMap, ThemeRule};
use crate::error::ThemeError;

/// Maximum depth of `var()` indirection followed before giving up.
const MAX_VARIABLE_DEPTH: usize = 8;

#[derive(Debug, Deserialize)]
struct RawScheme {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    globals: BTreeMap<String, Value>,
    #[serde(default)]
    variables: BTreeMap<String, Value>,
    #[serde(default)]
    rules: Vec<BTreeMap<String, Value>>,
}

/// Keep only string-valued entries.
fn strings_only(map: BTreeMap<String, Value>) -> StyleMap {
    map.into_iter()
        .filter_map(|(k, v)| match v {
            Value::String(s) => Some((k, s)),
            _ => None,
        })
        .collect()
}

/// A `.sublime-color-scheme` color scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModernTheme {
    pub name: Option<String>,
    pub globals: StyleMap,
    pub variables: StyleMap,
    pub rules: Vec<ThemeRule>,
}

impl ModernTheme {
    pub fn from_json(path: &str, content: &str) -> Result<Self, ThemeError> {
        let raw: RawScheme =
            serde_json::from_str(content).map_err(|source| ThemeError::MalformedJson {
                path: path.to_string(),
                source,
            })?;

        let rules = raw
            .rules
            .into_iter()
            .map(|rule| {
                let mut style = strings_only(rule);
                let scope_selector = style.remove("scope");
                style.remove("name");
                ThemeRule {
                    scope_selector,
                    style,
                }
            })
            .collect();

        Ok(Self {
            name: raw.name,
            globals: strings_only(raw.globals),
            variables: strings_only(raw.variables),
            rules,
        })
    }

    /// Resolve `var(name)` references through `variables`.
    ///
    /// Anything that is not a plain `var()` reference is returned unchanged,
    /// as is a reference to an unknown variable.
    pub fn resolve_value(&self, value: &str) -> String {
        let mut current = value.trim();
        for _ in 0..MAX_VARIABLE_DEPTH {
            let Some(name) = current
                .strip_prefix("var(")
                .and_then(|rest| rest.strip_suffix(')'))
            else {
                break;
            };
            match self.variables.get(name.trim()) {
                Some(next) => current = next.trim(),
                None => break,
            }
        }
        current.to_string()
    }

    /// Resolve every value of a style map.
    pub fn resolve_style(&self, style: &StyleMap) -> StyleMap {
        style
            .iter()
            .map(|(k, v)| (k.clone(), self.resolve_value(v)))
            .collect()
    }
}
