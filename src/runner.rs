//! Fixture execution and suite runs.
//!
//! A fixture moves through `Init -> SyntaxResolved -> Rendered -> Asserting`
//! and ends `Passed`, `Failed`, `Error` or `Skipped`. Fixture-fatal errors end
//! only that fixture; the suite carries on with the next one.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::coverage::Coverage;
use crate::error::FixtureError;
use crate::fixture::{
    is_valid_color_scheme_test_file_name, parse_assertions, parse_header, Attribute, FixtureHeader,
};
use crate::host::{Host, View, ViewGuard};
use crate::report::ResultPrinter;
use crate::resource::{ResourceLoader, ResourceStore};
use crate::scheme::ThemeDocument;
use crate::style::StyleResolver;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Syntax definition suffixes, in search order.
pub const SYNTAX_SUFFIXES: [&str; 3] = [".sublime-syntax", ".tmLanguage", ".hidden-tmLanguage"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    Passed,
    Failed,
    Error,
    Skipped,
}

/// An error or skip reason, located in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub file: String,
    pub row: usize,
    pub col: usize,
}

/// One failed comparison. `row` and `col` are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub assertion: String,
    pub file: String,
    pub row: usize,
    pub col: usize,
    pub actual: BTreeMap<Attribute, String>,
    pub expected: BTreeMap<Attribute, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    pub status: TestStatus,
    pub failures: Vec<FailureRecord>,
    pub assertion_count: usize,
    pub notice: Option<Notice>,
}

/// A finished fixture plus what it was rendered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureRun {
    pub result: TestResult,
    pub color_scheme: Option<String>,
    pub syntax: Option<String>,
}

enum Halt {
    Error(FixtureError),
    Skip(FixtureError),
}

impl From<FixtureError> for Halt {
    fn from(e: FixtureError) -> Self {
        Halt::Error(e)
    }
}

#[derive(Default)]
struct Progress {
    failures: Vec<FailureRecord>,
    assertion_count: usize,
    color_scheme: Option<String>,
    syntax: Option<String>,
}

/// Find the one syntax definition named `name`.
pub fn resolve_syntax(resources: &dyn ResourceLoader, name: &str) -> Result<String, FixtureError> {
    for suffix in SYNTAX_SUFFIXES {
        let mut found = resources.find_resources(&format!("{}{}", name, suffix));
        match found.len() {
            0 => continue,
            1 => return Ok(found.remove(0)),
            _ => return Err(FixtureError::AmbiguousSyntax(found)),
        }
    }
    Err(FixtureError::SyntaxNotFound(name.to_string()))
}

/// A fixture rendered into a view, ready for style queries.
pub struct RenderedFixture<'h> {
    pub view: ViewGuard<'h>,
    pub header: FixtureHeader,
    pub document: ThemeDocument,
}

/// Render fixture `content` into a fresh view of `host`.
pub fn render_fixture<'h>(
    host: &'h dyn Host,
    test: &str,
    content: &str,
) -> Result<RenderedFixture<'h>, FixtureError> {
    let header = parse_header(content)?;
    let syntax = resolve_syntax(host.resources(), &header.syntax_for(test))?;
    render_with(host, header, &syntax, content)
}

fn render_with<'h>(
    host: &'h dyn Host,
    header: FixtureHeader,
    syntax: &str,
    content: &str,
) -> Result<RenderedFixture<'h>, FixtureError> {
    let color_scheme = header.color_scheme_path();

    let mut view = ViewGuard::new(host.create_view());
    view.assign_syntax(syntax)?;
    // The view and the resolver share one parse of the scheme.
    let document = ThemeDocument::load(host.resources(), &color_scheme)?;
    view.set_color_scheme(&color_scheme, document.clone());
    view.set_content(content)?;

    Ok(RenderedFixture {
        view,
        header,
        document,
    })
}

fn execute(host: &dyn Host, test: &str, file: &str, progress: &mut Progress) -> Result<(), Halt> {
    let content = host
        .resources()
        .load_resource(test)
        .map_err(FixtureError::from)?;
    let header = parse_header(&content)?;
    let syntax_name = header.syntax_for(test);

    let syntax = match resolve_syntax(host.resources(), &syntax_name) {
        Ok(syntax) => syntax,
        Err(e @ FixtureError::SyntaxNotFound(_)) if header.skip_if_syntax_missing => {
            progress.color_scheme = Some(header.color_scheme_path());
            progress.syntax = Some(syntax_name);
            return Err(Halt::Skip(e));
        }
        Err(e) => return Err(e.into()),
    };
    debug!(test, syntax = %syntax, "syntax resolved");

    let RenderedFixture { view, document, .. } = render_with(host, header, &syntax, &content)?;
    progress.color_scheme = view.color_scheme().map(str::to_string);
    progress.syntax = view.syntax().map(str::to_string);

    let view: &dyn View = &*view;
    let mut resolver = StyleResolver::new(document, host.scorer(), view);
    let build = host.build();

    for assertion in parse_assertions(&content) {
        if !assertion.applies_to(build) {
            debug!(test, row = assertion.row, min_build = ?assertion.min_build, "assertion gated by build");
            continue;
        }

        for col in assertion.col_begin..assertion.col_end {
            progress.assertion_count += 1;
            let style = resolver.at_point(view.text_point(assertion.row, col));

            let actual: BTreeMap<Attribute, String> = assertion
                .expected
                .keys()
                .map(|attribute| (*attribute, style.get(attribute.key()).to_lowercase()))
                .collect();

            if actual != assertion.expected {
                progress.failures.push(FailureRecord {
                    assertion: assertion.raw_text.clone(),
                    file: file.to_string(),
                    row: assertion.row + 1,
                    col: col + 1,
                    actual,
                    expected: assertion.expected.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Run one fixture resource to a terminal state.
pub fn run_fixture(host: &dyn Host, test: &str) -> FixtureRun {
    let file = host.file_name(test).display().to_string();
    let mut progress = Progress::default();
    let outcome = execute(host, test, &file, &mut progress);

    let notice = |e: FixtureError| Notice {
        message: e.to_string(),
        file: file.clone(),
        row: 0,
        col: 0,
    };

    let (status, notice) = match outcome {
        Ok(()) if progress.failures.is_empty() => (TestStatus::Passed, None),
        Ok(()) => (TestStatus::Failed, None),
        Err(Halt::Error(e)) => {
            warn!(test, error = %e, "fixture error");
            (TestStatus::Error, Some(notice(e)))
        }
        Err(Halt::Skip(e)) => {
            info!(test, reason = %e, "fixture skipped");
            (TestStatus::Skipped, Some(notice(e)))
        }
    };

    debug!(test, ?status, assertions = progress.assertion_count, "fixture finished");
    FixtureRun {
        result: TestResult {
            status,
            failures: progress.failures,
            assertion_count: progress.assertion_count,
            notice,
        },
        color_scheme: progress.color_scheme,
        syntax: progress.syntax,
    }
}

/// The fixtures of one package, optionally narrowed to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suite {
    pub package: String,
    pub tests: Vec<String>,
    pub file: Option<PathBuf>,
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Collect the fixtures of the package that contains `target`.
///
/// `target` is any path inside a package; when it is a file, only that
/// fixture is collected. Returns `None` when no fixture qualifies.
pub fn discover(host: &dyn Host, target: &Path) -> Option<Suite> {
    let target = canonical(target);
    let file = target.is_file().then(|| target.clone());

    let mut package = None;
    let mut tests = Vec::new();
    for resource in host.resources().find_resources("color_scheme_test*") {
        if !is_valid_color_scheme_test_file_name(&resource) {
            continue;
        }
        let Some(name) = ResourceStore::package_of(&resource) else {
            continue;
        };
        let package_path = canonical(&host.file_name(&format!("Packages/{}", name)));
        if !target.starts_with(&package_path) {
            continue;
        }

        package = Some(name.to_string());
        match &file {
            Some(file) if canonical(&host.file_name(&resource)) != *file => {}
            _ => tests.push(resource),
        }
    }

    if tests.is_empty() {
        return None;
    }
    debug!(count = tests.len(), "discovered fixtures");
    Some(Suite {
        package: package?,
        tests,
        file,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub debug: bool,
    pub coverage: bool,
    /// Append the unittesting trailer.
    pub unittesting: bool,
}

/// Aggregate outcome of a suite run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub tests: usize,
    pub assertions: usize,
    pub errors: Vec<Notice>,
    pub skipped: Vec<Notice>,
    pub failures: Vec<FailureRecord>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.failures.is_empty()
    }

    fn record(&mut self, result: TestResult) {
        self.tests += 1;
        self.assertions += result.assertion_count;
        self.failures.extend(result.failures);
        match (result.status, result.notice) {
            (TestStatus::Error, Some(notice)) => self.errors.push(notice),
            (TestStatus::Skipped, Some(notice)) => self.skipped.push(notice),
            _ => {}
        }
    }
}

/// Write the run header.
pub fn write_header(out: &mut dyn Write, host: &dyn Host, suite: &Suite) -> io::Result<()> {
    write!(out, "ColorSchemeUnit {}\n\n", VERSION)?;
    writeln!(out, "Runtime: {} build {}", host.platform(), host.build())?;
    writeln!(out, "Package: {}", suite.package)?;
    if let Some(file) = &suite.file {
        writeln!(out, "File:    {}", file.display())?;
    }
    writeln!(out)
}

/// Run every fixture of `suite` in order, streaming the report to `out`.
pub fn run_suite(
    host: &dyn Host,
    suite: &Suite,
    options: &RunOptions,
    out: &mut dyn Write,
) -> io::Result<RunSummary> {
    info!(package = %suite.package, tests = suite.tests.len(), "starting run");
    let started = Instant::now();

    write_header(out, host, suite)?;

    let mut printer = ResultPrinter::new(options.debug);
    let mut coverage = Coverage::new(options.coverage, suite.file.is_some());
    let mut summary = RunSummary::default();

    printer.on_tests_start(out, &suite.tests)?;

    for test in &suite.tests {
        let run = run_fixture(host, test);
        let color_scheme = run.color_scheme.as_deref();
        let syntax = run.syntax.as_deref();

        match run.result.status {
            TestStatus::Passed | TestStatus::Failed => {
                printer.on_test_start(out, test, color_scheme, syntax)?;
                if let (Some(color_scheme), Some(syntax)) = (color_scheme, syntax) {
                    coverage.on_test_start(test, color_scheme, syntax);
                }
                if run.result.status == TestStatus::Passed {
                    printer.on_test_success(out)?;
                } else {
                    printer.on_test_failure(out)?;
                }
            }
            TestStatus::Error => printer.add_error(out)?,
            TestStatus::Skipped => printer.add_skipped_test(out, test, color_scheme, syntax)?,
        }
        printer.on_test_end();
        summary.record(run.result);
    }

    printer.on_tests_end(out, &summary, started.elapsed())?;

    if summary.is_success() {
        coverage.on_tests_end(host.resources(), out)?;
    }

    if options.unittesting {
        if summary.is_success() {
            write!(out, "\nOK.\n")?;
        } else {
            write!(out, "\nFAILED.\n")?;
        }
        write!(out, "\nUnitTesting: Done.\n")?;
    }

    out.flush()?;
    info!(
        tests = summary.tests,
        errors = summary.errors.len(),
        failures = summary.failures.len(),
        "run finished"
    );
    Ok(summary)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ResourceError;
    use crate::host::HostStyle;
    use crate::scheme::SelectorScorer;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    pub(crate) const SCHEME: &str = r##"{
        "name": "Fake",
        "globals": { "foreground": "#FFFFFF", "background": "#000000" },
        "rules": [
            { "scope": "string", "foreground": "#00FF00" },
            { "scope": "keyword", "foreground": "#ff0000", "font_style": "bold" }
        ]
    }"##;

    /// Scores a selector by whether it is a dotted prefix of any scope atom.
    pub(crate) struct PrefixScorer;

    impl SelectorScorer for PrefixScorer {
        fn score(&self, scope_path: &str, selector: &str) -> f64 {
            let matches = |sel: &str| {
                scope_path
                    .split_whitespace()
                    .any(|scope| scope == sel || scope.starts_with(&format!("{}.", sel)))
            };
            if selector.split(',').any(|sel| matches(sel.trim())) {
                1.0
            } else {
                0.0
            }
        }
    }

    /// An in-memory host. Each fixture character is scoped by a table of
    /// `char -> scope`; anything else gets the root scope only.
    pub(crate) struct FakeHost {
        pub files: HashMap<String, String>,
        pub build: u32,
        pub views_closed: Cell<u32>,
        pub loads: RefCell<Vec<String>>,
    }

    impl FakeHost {
        pub(crate) fn new(files: &[(&str, &str)]) -> Self {
            Self {
                files: files
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                build: 4200,
                views_closed: Cell::new(0),
                loads: RefCell::new(Vec::new()),
            }
        }
    }

    impl ResourceLoader for FakeHost {
        fn find_resources(&self, pattern: &str) -> Vec<String> {
            let mut found: Vec<String> = self
                .files
                .keys()
                .filter(|path| {
                    path.rsplit('/')
                        .next()
                        .is_some_and(|base| crate::resource::matches_pattern(pattern, base))
                })
                .cloned()
                .collect();
            found.sort();
            found
        }

        fn load_resource(&self, path: &str) -> Result<String, ResourceError> {
            self.loads.borrow_mut().push(path.to_string());
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| ResourceError::NotFound(path.to_string()))
        }
    }

    pub(crate) struct FakeView<'h> {
        host: &'h FakeHost,
        syntax: Option<String>,
        color_scheme: Option<String>,
        document: Option<ThemeDocument>,
        lines: Vec<String>,
        closed: bool,
    }

    impl View for FakeView<'_> {
        fn assign_syntax(&mut self, syntax: &str) -> Result<(), FixtureError> {
            self.syntax = Some(syntax.to_string());
            Ok(())
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
            self.lines = content.lines().map(str::to_string).collect();
            Ok(())
        }
        fn text_point(&self, row: usize, col: usize) -> usize {
            row * 1000 + col
        }
        fn scope_name(&self, point: usize) -> String {
            let (row, col) = (point / 1000, point % 1000);
            let Some(line) = self.lines.get(row) else {
                return "source.fake ".to_string();
            };
            let quotes_before = line.chars().take(col).filter(|c| *c == '"').count();
            match line.chars().nth(col) {
                Some(c) if c == '"' || quotes_before % 2 == 1 => {
                    "source.fake string.quoted ".to_string()
                }
                Some(c) if c.is_ascii_uppercase() => "source.fake keyword.control ".to_string(),
                _ => "source.fake ".to_string(),
            }
        }
        fn style(&self) -> HostStyle {
            self.document
                .as_ref()
                .map(crate::syntax::view_style)
                .unwrap_or_default()
        }
        fn style_for_scope(&self, scope: &str) -> HostStyle {
            self.document
                .as_ref()
                .map(|d| crate::syntax::scope_style(d, &PrefixScorer, scope))
                .unwrap_or_default()
        }
        fn close(&mut self) {
            assert!(!self.closed, "view closed twice");
            self.closed = true;
            self.host.views_closed.set(self.host.views_closed.get() + 1);
        }
    }

    impl Host for FakeHost {
        fn resources(&self) -> &dyn ResourceLoader {
            self
        }
        fn file_name(&self, resource: &str) -> PathBuf {
            PathBuf::from("/packages").join(resource.trim_start_matches("Packages/"))
        }
        fn scorer(&self) -> &dyn SelectorScorer {
            &PrefixScorer
        }
        fn build(&self) -> u32 {
            self.build
        }
        fn platform(&self) -> &str {
            "linux"
        }
        fn create_view(&self) -> Box<dyn View + '_> {
            Box::new(FakeView {
                host: self,
                syntax: None,
                color_scheme: None,
                document: None,
                lines: Vec::new(),
                closed: false,
            })
        }
    }

    const TEST: &str = "Packages/User/color_scheme_test.fake";
    const SYNTAX: &str = "Packages/Fake/FAKE.sublime-syntax";
    const SCHEME_PATH: &str = "Packages/User/Fake.sublime-color-scheme";

    fn host_with_fixture(fixture: &str) -> FakeHost {
        FakeHost::new(&[(TEST, fixture), (SYNTAX, ""), (SCHEME_PATH, SCHEME)])
    }

    fn expected(pairs: &[(Attribute, &str)]) -> BTreeMap<Attribute, String> {
        pairs.iter().map(|(a, v)| (*a, v.to_string())).collect()
    }

    #[test]
    fn test_passing_fixture() {
        let host = host_with_fixture(concat!(
            "// COLOR SCHEME TEST \"User/Fake.sublime-color-scheme\"\n",
            "x = \"s\"\n",
            "//  ^^^ fg=#00ff00\n",
        ));

        let run = run_fixture(&host, TEST);
        assert_eq!(run.result.status, TestStatus::Passed);
        assert_eq!(run.result.assertion_count, 3);
        assert!(run.result.failures.is_empty());
        assert_eq!(run.color_scheme.as_deref(), Some(SCHEME_PATH));
        assert_eq!(run.syntax.as_deref(), Some(SYNTAX));
        assert_eq!(host.views_closed.get(), 1);
    }

    #[test]
    fn test_color_scheme_is_loaded_once_per_fixture() {
        let host = host_with_fixture(concat!(
            "// COLOR SCHEME TEST \"User/Fake.sublime-color-scheme\"\n",
            "x = \"s\"\n",
            "//  ^^^ fg=#00ff00\n",
        ));

        let run = run_fixture(&host, TEST);
        assert_eq!(run.result.status, TestStatus::Passed);
        let loads = host.loads.borrow();
        assert_eq!(loads.iter().filter(|path| *path == SCHEME_PATH).count(), 1);
    }

    #[test]
    fn test_prose_caret_comment_is_not_an_assertion() {
        let host = host_with_fixture(concat!(
            "// COLOR SCHEME TEST \"User/Fake.sublime-color-scheme\"\n",
            "K\n",
            "// ^ see the keyword above\n",
            "// ^ fg=#ff0000\n",
        ));

        // The last line asserts against the prose line, not the keyword.
        let run = run_fixture(&host, TEST);
        assert_eq!(run.result.status, TestStatus::Failed);
        assert_eq!(run.result.assertion_count, 1);
        assert_eq!(run.result.failures.len(), 1);
        assert_eq!(run.result.failures[0].row, 3);
        assert_eq!(run.result.failures[0].col, 4);
        assert_eq!(
            run.result.failures[0].actual,
            expected(&[(Attribute::Foreground, "#ffffff")])
        );
    }

    #[test]
    fn test_failing_fixture_reports_one_based_position() {
        let host = host_with_fixture(concat!(
            "// COLOR SCHEME TEST \"User/Fake.sublime-color-scheme\"\n",
            "x\n",
            "// ^ fg=#00ff00\n",
        ));

        let run = run_fixture(&host, TEST);
        assert_eq!(run.result.status, TestStatus::Failed);
        assert_eq!(run.result.assertion_count, 1);
        assert_eq!(
            run.result.failures,
            vec![FailureRecord {
                assertion: "// ^ fg=#00ff00".to_string(),
                file: "/packages/User/color_scheme_test.fake".to_string(),
                row: 2,
                col: 4,
                actual: expected(&[(Attribute::Foreground, "#ffffff")]),
                expected: expected(&[(Attribute::Foreground, "#00ff00")]),
            }]
        );
    }

    #[test]
    fn test_caret_line_without_comment_is_content() {
        let host = host_with_fixture(concat!(
            "// COLOR SCHEME TEST \"User/Fake.sublime-color-scheme\"\n",
            "a\n",
            "^ fg=#00ff00\n",
            "# ^ fg=#00ff00\n",
        ));
        // The `#` line asserts against the comment-less caret line above it.
        let run = run_fixture(&host, TEST);
        assert_eq!(run.result.failures.len(), 1);
        assert_eq!(run.result.failures[0].row, 3);
        assert_eq!(run.result.failures[0].col, 3);
    }

    #[test]
    fn test_missing_syntax_is_error() {
        let host = FakeHost::new(&[
            (TEST, "// COLOR SCHEME TEST \"User/Fake.sublime-color-scheme\" \"Java\"\n"),
            (SCHEME_PATH, SCHEME),
        ]);

        let run = run_fixture(&host, TEST);
        assert_eq!(run.result.status, TestStatus::Error);
        assert_eq!(
            run.result.notice,
            Some(Notice {
                message: "Syntax not found: Java".to_string(),
                file: "/packages/User/color_scheme_test.fake".to_string(),
                row: 0,
                col: 0,
            })
        );
        assert_eq!(host.views_closed.get(), 0);
    }

    #[test]
    fn test_missing_syntax_with_skip_if_not() {
        let host = FakeHost::new(&[
            (
                TEST,
                "// COLOR SCHEME TEST \"User/Fake.sublime-color-scheme\" SKIP IF NOT \"Java\"\n",
            ),
            (SCHEME_PATH, SCHEME),
        ]);

        let run = run_fixture(&host, TEST);
        assert_eq!(run.result.status, TestStatus::Skipped);
        assert_eq!(
            run.result.notice.map(|n| n.message).as_deref(),
            Some("Syntax not found: Java")
        );
        assert_eq!(run.result.assertion_count, 0);
    }

    #[test]
    fn test_ambiguous_syntax_is_error_even_when_skippable() {
        let host = FakeHost::new(&[
            (
                TEST,
                "// COLOR SCHEME TEST \"User/Fake.sublime-color-scheme\" SKIP IF NOT \"Java\"\n",
            ),
            ("Packages/A/Java.sublime-syntax", ""),
            ("Packages/B/Java.sublime-syntax", ""),
            (SCHEME_PATH, SCHEME),
        ]);

        let run = run_fixture(&host, TEST);
        assert_eq!(run.result.status, TestStatus::Error);
        assert_eq!(
            run.result.notice.unwrap().message,
            "More than one syntax found: ['Packages/A/Java.sublime-syntax', 'Packages/B/Java.sublime-syntax']"
        );
    }

    #[test]
    fn test_syntax_suffix_order() {
        let host = FakeHost::new(&[
            ("Packages/A/Java.tmLanguage", ""),
            ("Packages/B/Java.hidden-tmLanguage", ""),
        ]);
        assert_eq!(
            resolve_syntax(&host, "Java").unwrap(),
            "Packages/A/Java.tmLanguage"
        );
    }

    #[test]
    fn test_invalid_header_is_error() {
        let host = host_with_fixture("hello\n");
        let run = run_fixture(&host, TEST);
        assert_eq!(run.result.status, TestStatus::Error);
        let notice = run.result.notice.unwrap();
        assert_eq!(notice.message, "Invalid COLOR SCHEME TEST header");
        assert_eq!((notice.row, notice.col), (0, 0));
    }

    #[test]
    fn test_build_gated_assertions_are_not_counted() {
        let mut host = host_with_fixture(concat!(
            "// COLOR SCHEME TEST \"User/Fake.sublime-color-scheme\"\n",
            "x\n",
            "// ^ fg=#123456 build>=9999\n",
            "// ^ fg=#ffffff\n",
        ));
        host.build = 4200;

        let run = run_fixture(&host, TEST);
        assert_eq!(run.result.status, TestStatus::Passed);
        assert_eq!(run.result.assertion_count, 1);
    }

    #[test]
    fn test_stacked_assertions_share_row() {
        let host = host_with_fixture(concat!(
            "// COLOR SCHEME TEST \"User/Fake.sublime-color-scheme\"\n",
            "K \"s\"\n",
            "// ^ fg=#ffffff\n",
            "// ^ fg=#ffffff\n",
        ));
        // Both lines assert column 3 of row 1 (1-based: row 2).
        let run = run_fixture(&host, TEST);
        assert_eq!(run.result.assertion_count, 2);
        assert_eq!(run.result.failures.len(), 2);
        assert!(run.result.failures.iter().all(|f| f.row == 2 && f.col == 4));
    }

    #[test]
    fn test_font_style_comparison() {
        let host = host_with_fixture(concat!(
            "// COLOR SCHEME TEST \"User/Fake.sublime-color-scheme\"\n",
            "  K s\n",
            "# ^ fs=bold\n",
            "#   ^ fs=\n",
        ));

        let run = run_fixture(&host, TEST);
        assert_eq!(run.result.status, TestStatus::Passed);
        assert_eq!(run.result.assertion_count, 2);
    }

    #[test]
    fn test_empty_expected_assertion_trivially_passes() {
        let host = host_with_fixture(concat!(
            "// COLOR SCHEME TEST \"User/Fake.sublime-color-scheme\"\n",
            "x\n",
            "// ^^\n",
        ));
        let run = run_fixture(&host, TEST);
        assert_eq!(run.result.status, TestStatus::Passed);
        assert_eq!(run.result.assertion_count, 2);
    }

    #[test]
    fn test_theme_load_error_keeps_view_closed() {
        let host = FakeHost::new(&[
            (TEST, "// COLOR SCHEME TEST \"User/Missing.sublime-color-scheme\"\n"),
            (SYNTAX, ""),
        ]);
        let run = run_fixture(&host, TEST);
        assert_eq!(run.result.status, TestStatus::Error);
        assert_eq!(
            run.result.notice.unwrap().message,
            "Resource not found: Packages/User/Missing.sublime-color-scheme"
        );
        assert_eq!(host.views_closed.get(), 1);
    }

    #[test]
    fn test_run_summary_counts() {
        let mut summary = RunSummary::default();
        summary.record(TestResult {
            status: TestStatus::Error,
            failures: Vec::new(),
            assertion_count: 2,
            notice: Some(Notice {
                message: "boom".to_string(),
                file: "f".to_string(),
                row: 0,
                col: 0,
            }),
        });
        summary.record(TestResult {
            status: TestStatus::Passed,
            failures: Vec::new(),
            assertion_count: 3,
            notice: None,
        });
        assert_eq!(summary.tests, 2);
        assert_eq!(summary.assertions, 5);
        assert_eq!(summary.errors.len(), 1);
        assert!(!summary.is_success());
    }

    #[test]
    fn test_run_suite_output() {
        let host = host_with_fixture(concat!(
            "// COLOR SCHEME TEST \"User/Fake.sublime-color-scheme\"\n",
            "x = \"s\"\n",
            "//  ^^^ fg=#00ff00\n",
        ));
        let suite = Suite {
            package: "User".to_string(),
            tests: vec![TEST.to_string()],
            file: None,
        };
        let options = RunOptions {
            unittesting: true,
            ..Default::default()
        };

        let mut out = Vec::new();
        let summary = run_suite(&host, &suite, &options, &mut out).unwrap();
        let output = String::from_utf8(out).unwrap();

        assert!(summary.is_success());
        assert!(output.starts_with(&format!(
            "ColorSchemeUnit {}\n\nRuntime: linux build 4200\nPackage: User\n\n.",
            VERSION
        )));
        assert!(output.contains("OK (1 tests, 3 assertions)\n"));
        assert!(output.ends_with("\nOK.\n\nUnitTesting: Done.\n"));
    }

    #[test]
    fn test_run_suite_records_failures_and_errors() {
        let host = FakeHost::new(&[
            (
                TEST,
                "// COLOR SCHEME TEST \"User/Fake.sublime-color-scheme\"\nx\n// ^ fg=#00ff00\n",
            ),
            ("Packages/User/color_scheme_test_2.fake", "nope\n"),
            (SYNTAX, ""),
            (SCHEME_PATH, SCHEME),
        ]);
        let suite = Suite {
            package: "User".to_string(),
            tests: vec![
                TEST.to_string(),
                "Packages/User/color_scheme_test_2.fake".to_string(),
            ],
            file: None,
        };

        let mut out = Vec::new();
        let summary = run_suite(&host, &suite, &RunOptions::default(), &mut out).unwrap();
        let output = String::from_utf8(out).unwrap();

        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.errors.len(), 1);
        assert!(output.contains("FE"));
        assert!(output.ends_with("FAILURES!\nTests: 2, Assertions: 1, Errors: 1, Failures: 1.\n"));
    }
}
