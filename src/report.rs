//! Textual run report: progress characters, then the summary blocks.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::time::Duration;

use crate::fixture::Attribute;
use crate::runner::{Notice, RunSummary};

/// Progress characters per line before the running count is printed.
const PROGRESS_WIDTH: usize = 80;

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 {
        one
    } else {
        many
    }
}

/// Render an attribute map as `{'foreground': '#ffffff'}`.
pub fn format_style_map(map: &BTreeMap<Attribute, String>) -> String {
    let entries: Vec<String> = map
        .iter()
        .map(|(attribute, value)| format!("'{}': '{}'", attribute, value))
        .collect();
    format!("{{{}}}", entries.join(", "))
}

#[derive(Debug, Default)]
pub struct ResultPrinter {
    debug: bool,
    progress_count: usize,
    tests: usize,
    tests_total: usize,
}

impl ResultPrinter {
    pub fn new(debug: bool) -> Self {
        Self {
            debug,
            ..Default::default()
        }
    }

    pub fn on_tests_start(&mut self, out: &mut dyn Write, tests: &[String]) -> io::Result<()> {
        self.tests_total = tests.len();
        if self.debug {
            write!(
                out,
                "Starting {} test{}:\n\n",
                tests.len(),
                if tests.len() > 1 { "s" } else { "" }
            )?;
            for (i, test) in tests.iter().enumerate() {
                writeln!(out, "{}) {}", i + 1, test)?;
            }
        }
        Ok(())
    }

    pub fn on_test_start(
        &mut self,
        out: &mut dyn Write,
        test: &str,
        color_scheme: Option<&str>,
        syntax: Option<&str>,
    ) -> io::Result<()> {
        if self.debug {
            self.write_test_info(out, "Starting", test, color_scheme, syntax)?;
        }
        Ok(())
    }

    fn write_test_info(
        &self,
        out: &mut dyn Write,
        verb: &str,
        test: &str,
        color_scheme: Option<&str>,
        syntax: Option<&str>,
    ) -> io::Result<()> {
        write!(
            out,
            "\n{} test '{}'\n  color scheme: '{}'\n  syntax: '{}'\n",
            verb,
            test,
            color_scheme.unwrap_or("None"),
            syntax.unwrap_or("None"),
        )
    }

    pub fn on_test_end(&mut self) {
        self.tests += 1;
    }

    pub fn on_test_success(&mut self, out: &mut dyn Write) -> io::Result<()> {
        self.write_progress(out, '.')
    }

    pub fn on_test_failure(&mut self, out: &mut dyn Write) -> io::Result<()> {
        self.write_progress(out, 'F')
    }

    pub fn add_error(&mut self, out: &mut dyn Write) -> io::Result<()> {
        self.write_progress(out, 'E')
    }

    pub fn add_skipped_test(
        &mut self,
        out: &mut dyn Write,
        test: &str,
        color_scheme: Option<&str>,
        syntax: Option<&str>,
    ) -> io::Result<()> {
        self.write_progress(out, 'S')?;
        if self.debug {
            self.write_test_info(out, "Skipping", test, color_scheme, syntax)?;
        }
        Ok(())
    }

    fn write_progress(&mut self, out: &mut dyn Write, c: char) -> io::Result<()> {
        write!(out, "{}", c)?;
        self.progress_count += 1;
        if self.progress_count % PROGRESS_WIDTH == 0 {
            let percent = if self.tests_total == 0 {
                0.0
            } else {
                self.progress_count as f64 / self.tests_total as f64 * 100.0
            };
            writeln!(
                out,
                " {} / {} ({:3.1}%)",
                self.progress_count, self.tests_total, percent
            )?;
        }
        Ok(())
    }

    fn write_notices(out: &mut dyn Write, notices: &[Notice]) -> io::Result<()> {
        for (i, notice) in notices.iter().enumerate() {
            writeln!(out, "{}) {}", i + 1, notice.message)?;
            write!(out, "\n{}:{}:{}\n", notice.file, notice.row, notice.col)?;
            writeln!(out)?;
        }
        Ok(())
    }

    pub fn on_tests_end(
        &mut self,
        out: &mut dyn Write,
        summary: &RunSummary,
        elapsed: Duration,
    ) -> io::Result<()> {
        let errors = summary.errors.len();
        let failures = summary.failures.len();
        let skipped = summary.skipped.len();

        write!(out, "\n\n")?;
        writeln!(out, "Time: {:.2} secs", elapsed.as_secs_f64())?;
        writeln!(out)?;

        if errors > 0 {
            write!(
                out,
                "There {} {} error{}:\n\n",
                plural(errors, "was", "were"),
                errors,
                plural(errors, "", "s")
            )?;
            Self::write_notices(out, &summary.errors)?;
        }

        if failures > 0 {
            if errors > 0 {
                write!(out, "--\n\n")?;
            }
            write!(
                out,
                "There {} {} failure{}:\n\n",
                plural(failures, "was", "were"),
                failures,
                plural(failures, "", "s")
            )?;
            for (i, failure) in summary.failures.iter().enumerate() {
                writeln!(out, "{}) {}", i + 1, failure.assertion)?;
                writeln!(
                    out,
                    "Failed asserting {} equals {}",
                    format_style_map(&failure.actual),
                    format_style_map(&failure.expected)
                )?;
                writeln!(out, "{}:{}:{}", failure.file, failure.row, failure.col)?;
                writeln!(out)?;
            }
        }

        if skipped > 0 {
            if errors + failures > 0 {
                write!(out, "--\n\n")?;
            }
            write!(
                out,
                "There {} {} skipped test{}:\n\n",
                plural(skipped, "was", "were"),
                skipped,
                plural(skipped, "", "s")
            )?;
            Self::write_notices(out, &summary.skipped)?;
        }

        if errors == 0 && failures == 0 {
            write!(out, "OK ({} tests, {} assertions", self.tests, summary.assertions)?;
            if skipped > 0 {
                write!(out, ", {} skipped", skipped)?;
            }
            writeln!(out, ")")?;
        } else {
            writeln!(out, "FAILURES!")?;
            write!(out, "Tests: {}, Assertions: {}", self.tests, summary.assertions)?;
            if errors > 0 {
                write!(out, ", Errors: {}", errors)?;
            }
            write!(out, ", Failures: {}", failures)?;
            if skipped > 0 {
                write!(out, ", Skipped: {}", skipped)?;
            }
            writeln!(out, ".")?;
        }

        Ok(())
    }
}
