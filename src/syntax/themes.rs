//! Selector scoring and the per-view style API.
//!
//! Scoring uses syntect's selector matcher. The per-view style functions
//! answer `style()` / `style_for_scope()` for a view's assigned color scheme
//! the way the editor reports them: plain attribute values with `var()`
//! references resolved and font style split into `bold`/`italic` flags.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;

use syntect::highlighting::ScopeSelectors;
use syntect::parsing::ScopeStack;

use crate::host::HostStyle;
use crate::scheme::{accumulate_matching, SelectorScorer, StyleMap, ThemeDocument};

/// Scores selectors with syntect's `ScopeSelectors::does_match`.
///
/// Parsed selectors are cached by their source text.
#[derive(Debug, Default)]
pub struct SyntectScorer {
    selectors: Mutex<HashMap<String, Option<ScopeSelectors>>>,
}

impl SyntectScorer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectorScorer for SyntectScorer {
    fn score(&self, scope_path: &str, selector: &str) -> f64 {
        let Ok(stack) = ScopeStack::from_str(scope_path.trim()) else {
            return 0.0;
        };

        let mut selectors = self
            .selectors
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let parsed = selectors
            .entry(selector.to_string())
            .or_insert_with(|| ScopeSelectors::from_str(selector).ok());

        parsed
            .as_ref()
            .and_then(|s| s.does_match(stack.as_slice()))
            .map_or(0.0, |power| power.0)
    }
}

/// Split a `fontStyle`/`font_style` keyword list into host flags.
fn font_flags(style: &mut StyleMap) -> (Option<bool>, Option<bool>) {
    let keywords: Vec<String> = ["font_style", "fontStyle"]
        .iter()
        .filter_map(|key| style.remove(*key))
        .collect();
    if keywords.is_empty() {
        return (None, None);
    }

    let has = |flag: &str| {
        keywords
            .iter()
            .any(|k| k.split_whitespace().any(|word| word == flag))
    };
    (has("bold").then_some(true), has("italic").then_some(true))
}

fn host_style(mut attributes: StyleMap) -> HostStyle {
    let (bold, italic) = font_flags(&mut attributes);
    HostStyle {
        attributes,
        bold,
        italic,
    }
}

/// The view-level style: modern globals, or the legacy default entries.
pub fn view_style(document: &ThemeDocument) -> HostStyle {
    match document {
        ThemeDocument::Modern(theme) => host_style(theme.resolve_style(&theme.globals)),
        ThemeDocument::Legacy(theme) => host_style(theme.default_style()),
    }
}

/// The style a document assigns to a scope path.
///
/// The foreground falls back to the view foreground when no rule sets one.
pub fn scope_style(
    document: &ThemeDocument,
    scorer: &dyn SelectorScorer,
    scope_path: &str,
) -> HostStyle {
    match document {
        ThemeDocument::Modern(theme) => {
            let base: StyleMap = theme
                .globals
                .get("foreground")
                .map(|fg| ("foreground".to_string(), fg.clone()))
                .into_iter()
                .collect();
            let style = accumulate_matching(scorer, scope_path, &theme.rules, base);
            host_style(theme.resolve_style(&style))
        }
        ThemeDocument::Legacy(theme) => {
            let base: StyleMap = theme
                .default_style()
                .remove_entry("foreground")
                .into_iter()
                .collect();
            host_style(accumulate_matching(
                scorer,
                scope_path,
                theme.scoped_rules(),
                base,
            ))
        }
    }
}
