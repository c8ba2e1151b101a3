//! Editing helpers: caret assertions for a fixture line, and the scope and
//! style under a position.

use std::fmt;

use crate::error::FixtureError;
use crate::host::{Host, View};
use crate::runner::{render_fixture, RenderedFixture};
use crate::style::{ResolvedStyle, StyleResolver};

/// Comment start and end markers for generated assertion lines.
pub fn comment_markers(token: Option<&str>) -> (String, String) {
    let Some(token) = token else {
        return (String::new(), String::new());
    };
    let start = if token.ends_with(' ') {
        token.to_string()
    } else {
        format!("{} ", token)
    };
    let end = match token.trim_end() {
        "/*" => " */",
        "<!--" => " -->",
        _ => "",
    };
    (start, end.to_string())
}

/// Collapse per-character styles into caret assertion lines.
///
/// Runs of equal styles share one assertion. Blank styles (spaces) produce
/// no assertion, and carets that would sit under `comment_start` are dropped.
pub fn build_assertions<S: AsRef<str>>(styles: &[S], comment_start: &str, comment_end: &str) -> String {
    let mut runs: Vec<(usize, usize, &str)> = Vec::new();
    let mut indent = 0;
    for style in styles.iter().map(AsRef::as_ref) {
        if let Some((start, repeat, prev)) = runs.last_mut() {
            if *prev == style {
                *repeat += 1;
                continue;
            }
            indent = *start + *repeat;
        }
        runs.push((indent, 1, style));
    }

    let skip = comment_start.chars().count();
    runs.into_iter()
        .filter_map(|(indent, repeat, style)| {
            let line = format!("{}{} {}", " ".repeat(indent), "^".repeat(repeat), style);
            let rest: String = line.chars().skip(skip).collect();
            let is_assertion = rest.trim_start_matches(' ').starts_with('^')
                && !rest.trim_matches([' ', '^']).is_empty();
            is_assertion.then(|| format!("{}{}{}", comment_start, rest, comment_end))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Generate assertions for `row` (0-based) of fixture `content`.
pub fn generate_assertions(
    host: &dyn Host,
    test: &str,
    content: &str,
    row: usize,
) -> Result<String, FixtureError> {
    let RenderedFixture {
        view,
        header,
        document,
    } = render_fixture(host, test, content)?;
    let view: &dyn View = &*view;
    let mut resolver = StyleResolver::new(document, host.scorer(), view);

    let line = content.lines().nth(row).unwrap_or_default();
    let styles: Vec<String> = line
        .chars()
        .enumerate()
        .map(|(col, c)| {
            if c == ' ' {
                return String::new();
            }
            let style = resolver.at_point(view.text_point(row, col));
            format!("fg={} fs={}", style.get("foreground"), style.get("fontStyle"))
        })
        .collect();

    let (comment_start, comment_end) = comment_markers(header.comment_token.as_deref());
    Ok(build_assertions(&styles, &comment_start, &comment_end))
}

/// The scope path and resolved style at one position of a fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeInfo {
    pub scope: String,
    pub style: ResolvedStyle,
}

impl fmt::Display for ScopeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for scope in self.scope.split_whitespace() {
            writeln!(f, "{}", scope)?;
        }
        writeln!(f)?;

        let style = self.style.as_map();
        let leading = ["foreground", "background", "fontStyle"];
        for key in leading {
            if let Some(value) = style.get(key) {
                writeln!(f, "{}: {}", key, value)?;
            }
        }
        for (key, value) in style.iter().filter(|(k, _)| !leading.contains(&k.as_str())) {
            writeln!(f, "{}: {}", key, value)?;
        }
        Ok(())
    }
}

/// Scope path and style at (`row`, `col`), both 0-based, of fixture `content`.
pub fn inspect_scope(
    host: &dyn Host,
    test: &str,
    content: &str,
    row: usize,
    col: usize,
) -> Result<ScopeInfo, FixtureError> {
    let RenderedFixture { view, document, .. } = render_fixture(host, test, content)?;
    let view: &dyn View = &*view;
    let point = view.text_point(row, col);
    let scope = view.scope_name(point);
    let style = StyleResolver::new(document, host.scorer(), view).at(&scope);

    Ok(ScopeInfo {
        scope: scope.trim_end().to_string(),
        style,
    })
}
