use syntect::parsing::{ParseState, ScopeStack, SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;
use tracing::debug;

use super::SyntectHost;
use crate::error::FixtureError;
use crate::host::{Host, HostStyle, View};
use crate::scheme::ThemeDocument;

/// A byte range of the buffer and the scope path that covers it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ScopeSpan {
    start: usize,
    end: usize,
    scope: String,
}

fn scope_path(stack: &ScopeStack) -> String {
    stack
        .as_slice()
        .iter()
        .map(|scope| scope.build_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse `content` line by line and record the scope path of every span.
fn render(
    content: &str,
    syntax: &SyntaxReference,
    syntax_set: &SyntaxSet,
) -> Result<Vec<ScopeSpan>, FixtureError> {
    let mut state = ParseState::new(syntax);
    let mut stack = ScopeStack::new();
    let mut spans = Vec::new();
    let mut offset = 0;

    for line in LinesWithEndings::from(content) {
        let ops = state
            .parse_line(line, syntax_set)
            .map_err(|e| FixtureError::Render(e.to_string()))?;

        let mut cursor = 0;
        for (index, op) in ops {
            if index > cursor {
                spans.push(ScopeSpan {
                    start: offset + cursor,
                    end: offset + index,
                    scope: scope_path(&stack),
                });
                cursor = index;
            }
            stack
                .apply(&op)
                .map_err(|e| FixtureError::Render(format!("{:?}", e)))?;
        }
        if line.len() > cursor {
            spans.push(ScopeSpan {
                start: offset + cursor,
                end: offset + line.len(),
                scope: scope_path(&stack),
            });
        }
        offset += line.len();
    }

    Ok(spans)
}

/// A transient view rendered with syntect.
pub struct SyntectView<'h> {
    host: &'h SyntectHost,
    syntax: Option<String>,
    color_scheme: Option<String>,
    document: Option<ThemeDocument>,
    content: String,
    line_starts: Vec<usize>,
    spans: Vec<ScopeSpan>,
}

impl<'h> SyntectView<'h> {
    pub fn new(host: &'h SyntectHost) -> Self {
        Self {
            host,
            syntax: None,
            color_scheme: None,
            document: None,
            content: String::new(),
            line_starts: vec![0],
            spans: Vec::new(),
        }
    }

    fn rerender(&mut self) -> Result<(), FixtureError> {
        self.line_starts = std::iter::once(0)
            .chain(self.content.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        let host = self.host;
        let catalog = host.catalog();
        let syntax = match self.syntax.as_deref() {
            Some(resource) => catalog
                .syntax_for_resource(resource)
                .ok_or_else(|| FixtureError::UnsupportedSyntax(resource.to_string()))?,
            None => catalog.syntax_set().find_syntax_plain_text(),
        };

        self.spans = render(&self.content, syntax, catalog.syntax_set())?;
        debug!(syntax = %syntax.name, spans = self.spans.len(), "rendered view");
        Ok(())
    }

    /// The text of a 0-based row, without its line ending.
    pub fn line(&self, row: usize) -> Option<&str> {
        let start = *self.line_starts.get(row)?;
        let end = self
            .line_starts
            .get(row + 1)
            .copied()
            .unwrap_or(self.content.len());
        Some(self.content[start..end].trim_end_matches(['\n', '\r']))
    }
}

impl View for SyntectView<'_> {
    fn assign_syntax(&mut self, syntax: &str) -> Result<(), FixtureError> {
        if self.host.catalog().syntax_for_resource(syntax).is_none() {
            return Err(FixtureError::UnsupportedSyntax(syntax.to_string()));
        }
        self.syntax = Some(syntax.to_string());
        self.rerender()
    }

    fn syntax(&self) -> Option<&str> {
        self.syntax.as_deref()
    }

    fn set_color_scheme(&mut self, color_scheme: &str, document: ThemeDocument) {
        self.document = Some(document);
        self.color_scheme = Some(color_scheme.to_string());
    }

    fn color_scheme(&self) -> Option<&str> {
        self.color_scheme.as_deref()
    }

    fn set_content(&mut self, content: &str) -> Result<(), FixtureError> {
        self.content = content.to_string();
        self.rerender()
    }

    fn text_point(&self, row: usize, col: usize) -> usize {
        let Some(line) = self.line(row) else {
            return self.content.len();
        };
        let start = self.line_starts[row];
        let byte = line
            .char_indices()
            .nth(col)
            .map_or(line.len(), |(i, _)| i);
        start + byte
    }

    fn scope_name(&self, point: usize) -> String {
        let index = self.spans.partition_point(|span| span.end <= point);
        self.spans
            .get(index)
            .or_else(|| self.spans.last())
            .map(|span| span.scope.clone())
            .unwrap_or_default()
    }

    fn style(&self) -> HostStyle {
        self.document
            .as_ref()
            .map(super::view_style)
            .unwrap_or_default()
    }

    fn style_for_scope(&self, scope: &str) -> HostStyle {
        self.document
            .as_ref()
            .map(|document| super::scope_style(document, self.host.scorer(), scope))
            .unwrap_or_default()
    }

    fn close(&mut self) {
        self.content.clear();
        self.spans.clear();
        self.line_starts = vec![0];
        self.document = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::modern_tests::MODERN_SCHEME;
    use std::fs;
    use tempfile::TempDir;

    const KEY_VALUE_SYNTAX: &str = r#"%YAML 1.2
---
name: KeyValue
file_extensions: [kv]
scope: source.kv
contexts:
  main:
    - match: '#.*$'
      scope: comment.line.kv
    - match: '"[^"]*"'
      scope: string.quoted.double.kv
"#;

    fn host() -> (TempDir, SyntectHost) {
        let dir = TempDir::new().unwrap();
        let user = dir.path().join("User");
        fs::create_dir_all(&user).unwrap();
        fs::write(user.join("KeyValue.sublime-syntax"), KEY_VALUE_SYNTAX).unwrap();
        fs::write(user.join("Test.sublime-color-scheme"), MODERN_SCHEME).unwrap();
        let host = SyntectHost::new(dir.path(), 4200);
        (dir, host)
    }

    #[test]
    fn test_scope_name_at_points() {
        let (_dir, host) = host();
        let mut view = SyntectView::new(&host);
        view.assign_syntax("Packages/User/KeyValue.sublime-syntax")
            .unwrap();
        view.set_content("a \"b\"\n# c\n").unwrap();

        assert_eq!(view.scope_name(view.text_point(0, 0)), "source.kv");
        assert_eq!(
            view.scope_name(view.text_point(0, 2)),
            "source.kv string.quoted.double.kv"
        );
        assert_eq!(
            view.scope_name(view.text_point(1, 2)),
            "source.kv comment.line.kv"
        );
    }

    #[test]
    fn test_text_point_counts_characters() {
        let (_dir, host) = host();
        let mut view = SyntectView::new(&host);
        view.set_content("é\"x\"\nabc").unwrap();

        assert_eq!(view.text_point(0, 1), 2);
        assert_eq!(view.text_point(1, 0), 6);
        // Columns past the end clamp to the end of the line.
        assert_eq!(view.text_point(1, 10), 9);
        assert_eq!(view.line(0), Some("é\"x\""));
    }

    #[test]
    fn test_assign_unknown_syntax_fails() {
        let (_dir, host) = host();
        let mut view = SyntectView::new(&host);
        let err = view
            .assign_syntax("Packages/User/KeyValue.tmLanguage")
            .unwrap_err();
        assert!(matches!(err, FixtureError::UnsupportedSyntax(_)));
        assert_eq!(view.syntax(), None);
    }

    #[test]
    fn test_style_for_scope_uses_color_scheme() {
        let (_dir, host) = host();
        let mut view = SyntectView::new(&host);
        let scheme = "Packages/User/Test.sublime-color-scheme";
        view.set_color_scheme(scheme, ThemeDocument::load(&host, scheme).unwrap());

        assert_eq!(view.style().attributes["background"], "#111111");
        let style = view.style_for_scope("source.kv string.quoted.double.kv");
        assert_eq!(style.attributes["foreground"], "#ffff00");
        assert_eq!(style.font_style(), "bold italic");
    }

    #[test]
    fn test_close_resets_buffer() {
        let (_dir, host) = host();
        let mut view = SyntectView::new(&host);
        view.set_content("abc").unwrap();
        view.close();
        assert_eq!(view.scope_name(0), "");
        assert_eq!(view.line(0), Some(""));
    }
}
