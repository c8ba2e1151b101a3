//! Fixture files: the `COLOR SCHEME TEST` header and caret assertion lines.
//!
//! ```text
//! // COLOR SCHEME TEST "Packages/User/Mono.sublime-color-scheme" "PHP"
//! $var = "string";
//! //     ^^^^^^^^ fg=#e6db74 fs=
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::FixtureError;
use crate::resource::with_packages_prefix;
use crate::scheme::is_modern_scheme;

static HEADER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"^(?:(?:<\?php )?(?P<comment>//|#|/\*|<!--|--)\s*)?"#,
        r#"COLOR SCHEME TEST "(?P<color_scheme>[^"]+)""#,
        r#"(?:(?P<skip> SKIP IF NOT)? "(?P<syntax_name>[^"]+)")?"#,
        r#"(?:\s*(?:-->|\?>|\*/))?"#,
    ))
    .expect("header regex")
});

static ASSERTION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?://|#|/\*|<!--|--)\s*(?P<repeat>\^+)").expect("assertion regex"));

static TEST_FILE_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^color_scheme_test.*\.[a-zA-Z0-9]+$").expect("test file name regex"));

/// The directive on the first line of a fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureHeader {
    /// Color scheme exactly as written in the header.
    pub color_scheme: String,
    pub syntax_name: Option<String>,
    pub skip_if_syntax_missing: bool,
    /// Comment-open token the header line starts with, if any.
    pub comment_token: Option<String>,
}

impl FixtureHeader {
    /// The color scheme resource the fixture renders with.
    pub fn color_scheme_path(&self) -> String {
        normalize_color_scheme(&self.color_scheme)
    }

    /// The declared syntax name, or the fixture's extension uppercased.
    pub fn syntax_for(&self, fixture: &str) -> String {
        match &self.syntax_name {
            Some(name) => name.clone(),
            None => Path::new(fixture)
                .extension()
                .map(|ext| ext.to_string_lossy().to_uppercase())
                .unwrap_or_default(),
        }
    }
}

/// Match the header at the start of a fixture document.
pub fn parse_header(content: &str) -> Result<FixtureHeader, FixtureError> {
    let captures = HEADER_PATTERN
        .captures(content)
        .ok_or(FixtureError::InvalidHeader)?;

    Ok(FixtureHeader {
        color_scheme: captures["color_scheme"].to_string(),
        syntax_name: captures.name("syntax_name").map(|m| m.as_str().to_string()),
        skip_if_syntax_missing: captures.name("skip").is_some(),
        comment_token: captures.name("comment").map(|m| m.as_str().to_string()),
    })
}

/// Modern scheme paths containing `/` and every legacy name are rooted
/// under `Packages/`; a bare modern file name is left for resource search.
pub fn normalize_color_scheme(color_scheme: &str) -> String {
    if is_modern_scheme(color_scheme) && !color_scheme.contains('/') {
        color_scheme.to_string()
    } else {
        with_packages_prefix(color_scheme)
    }
}

/// Whether a path names a fixture: `color_scheme_test*.<ext>`.
pub fn is_valid_color_scheme_test_file_name(path: &str) -> bool {
    let basename = path.rsplit(['/', '\\']).next().unwrap_or_default();
    TEST_FILE_NAME_PATTERN.is_match(basename)
}

/// A style attribute an assertion can check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Attribute {
    Foreground,
    Background,
    FontStyle,
}

impl Attribute {
    /// Key of the attribute in a resolved style.
    pub fn key(self) -> &'static str {
        match self {
            Self::Foreground => "foreground",
            Self::Background => "background",
            Self::FontStyle => "fontStyle",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One parsed assertion line, before rows are assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssertionLine {
    pub repeat: usize,
    pub fg: Option<String>,
    pub bg: Option<String>,
    pub fs: Option<String>,
    pub build: Option<u32>,
    /// The normalized (lowercased, trimmed) line text.
    pub text: String,
}

/// An expected-style claim about `[col_begin, col_end)` of `row` (0-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    pub row: usize,
    pub col_begin: usize,
    pub col_end: usize,
    pub expected: BTreeMap<Attribute, String>,
    pub raw_text: String,
    pub min_build: Option<u32>,
}

impl Assertion {
    /// Whether a host of `build` evaluates this assertion.
    pub fn applies_to(&self, build: u32) -> bool {
        self.min_build.is_none_or(|min| build >= min)
    }
}

fn normalize_line(line: &str) -> String {
    line.to_lowercase()
        .trim_end_matches([' ', '-', '>'])
        .trim_end_matches([' ', '*', '/'])
        .to_string()
}

/// Parse one line as an assertion line.
///
/// Returns `None` for anything that is not a comment followed by carets and
/// attributes, so prose after the carets or a non-numeric `build>=` makes the
/// line an ordinary comment. The first occurrence of a key wins.
pub fn parse_assertion_line(line: &str) -> Option<AssertionLine> {
    let text = normalize_line(line);
    let captures = ASSERTION_PATTERN.captures(&text)?;
    let repeat = captures.name("repeat")?;

    let rest = &text[repeat.end()..];
    if !rest.is_empty() && !rest.starts_with(' ') {
        return None;
    }

    let mut parsed = AssertionLine {
        repeat: repeat.as_str().len(),
        ..Default::default()
    };

    let mut tokens = rest.split(' ').filter(|t| !t.is_empty()).peekable();
    while let Some(token) = tokens.next() {
        if let Some(value) = token.strip_prefix("fg=") {
            if parsed.fg.is_none() && !value.is_empty() {
                parsed.fg = Some(value.to_string());
            }
        } else if let Some(value) = token.strip_prefix("bg=") {
            if parsed.bg.is_none() && !value.is_empty() {
                parsed.bg = Some(value.to_string());
            }
        } else if let Some(value) = token.strip_prefix("fs=") {
            let mut keywords = Vec::new();
            while let Some(keyword) = tokens.next_if(|t| !t.contains('=')) {
                keywords.push(keyword);
            }
            if parsed.fs.is_none() {
                parsed.fs = Some(if value.is_empty() {
                    String::new()
                } else {
                    std::iter::once(value)
                        .chain(keywords)
                        .collect::<Vec<_>>()
                        .join(" ")
                });
            }
        } else if let Some(value) = token.strip_prefix("build>=") {
            let build = value.parse().ok()?;
            if parsed.build.is_none() {
                parsed.build = Some(build);
            }
        } else {
            return None;
        }
    }

    parsed.text = text;
    Some(parsed)
}

/// All assertions of a fixture document, build-gated ones included.
///
/// Consecutive assertion lines stack: each asserts against the nearest
/// preceding line that is not an assertion line.
pub fn parse_assertions(content: &str) -> Vec<Assertion> {
    let mut assertions = Vec::new();
    let mut consecutive = 0;

    for (line_number, line) in content.lines().enumerate() {
        let Some(parsed) = parse_assertion_line(line) else {
            consecutive = 0;
            continue;
        };
        consecutive += 1;

        let Some(row) = line_number.checked_sub(consecutive) else {
            continue;
        };
        let Some(col_begin) = line.chars().position(|c| c == '^') else {
            continue;
        };

        let expected = [
            (Attribute::Foreground, parsed.fg),
            (Attribute::Background, parsed.bg),
            (Attribute::FontStyle, parsed.fs),
        ]
        .into_iter()
        .filter_map(|(attribute, value)| value.map(|v| (attribute, v)))
        .collect();

        assertions.push(Assertion {
            row,
            col_begin,
            col_end: col_begin + parsed.repeat,
            expected,
            raw_text: parsed.text,
            min_build: parsed.build,
        });
    }

    assertions
}
