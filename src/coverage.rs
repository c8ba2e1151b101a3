//! Coverage statistics for the color schemes a run exercised.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};

use phf::phf_set;
use tracing::warn;

use crate::error::format_list;
use crate::resource::ResourceLoader;
use crate::scheme::{StyleMap, ThemeDocument};

/// Syntaxes every color scheme is recommended to be tested against.
pub static MINIMAL_SYNTAXES: phf::Set<&'static str> = phf_set! {
    "Packages/C++/C.sublime-syntax",
    "Packages/CSS/CSS.sublime-syntax",
    "Packages/HTML/HTML.sublime-syntax",
    "Packages/JSON/JSON.sublime-syntax",
    "Packages/JavaScript/JavaScript.sublime-syntax",
    "Packages/Markdown/Markdown.sublime-syntax",
    "Packages/PHP/PHP.sublime-syntax",
    "Packages/Python/Python.sublime-syntax",
    "Packages/Ruby/Ruby.sublime-syntax",
    "Packages/XML/XML.sublime-syntax",
};

/// The minimal scope set a color scheme should style.
pub static MINIMAL_SCOPES: phf::Set<&'static str> = phf_set! {
    "comment",
    "constant",
    "constant.character.escape",
    "constant.language",
    "constant.numeric",
    "entity.name",
    "entity.name.section",
    "entity.name.tag",
    "entity.other.attribute-name",
    "entity.other.inherited-class",
    "invalid",
    "invalid.deprecated",
    "keyword",
    "keyword.control",
    "keyword.declaration",
    "keyword.operator",
    "storage.modifier",
    "storage.type",
    "string",
    "support",
    "variable",
    "variable.function",
    "variable.language",
    "variable.parameter",
};

/// Colors, scopes and font styles a color scheme declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemeInfo {
    pub colors: BTreeSet<String>,
    pub scopes: BTreeSet<String>,
    /// Font style keywords; legacy documents only.
    pub font_styles: BTreeSet<String>,
}

fn hex_colors(style: &StyleMap) -> impl Iterator<Item = String> + '_ {
    style
        .values()
        .filter(|v| v.starts_with('#'))
        .map(|v| v.to_lowercase())
}

fn split_scopes(selector: &str) -> impl Iterator<Item = String> + '_ {
    selector.split(',').map(|scope| scope.trim().to_string())
}

/// Extract coverage information from a color scheme document.
pub fn extract(document: &ThemeDocument) -> SchemeInfo {
    let mut info = SchemeInfo::default();
    match document {
        ThemeDocument::Modern(theme) => {
            info.colors.extend(hex_colors(&theme.globals));
            info.colors.extend(hex_colors(&theme.variables));
            for rule in &theme.rules {
                info.colors.extend(hex_colors(&rule.style));
                if let Some(selector) = &rule.scope_selector {
                    info.scopes.extend(split_scopes(selector));
                }
            }
        }
        ThemeDocument::Legacy(theme) => {
            for rule in &theme.rules {
                match &rule.scope_selector {
                    Some(selector) => info.scopes.extend(split_scopes(selector)),
                    None => info.colors.extend(hex_colors(&rule.style)),
                }
                for key in ["foreground", "background"] {
                    if let Some(color) = rule.style.get(key) {
                        info.colors.insert(color.to_lowercase());
                    }
                }
                if let Some(font_style) = rule.style.get("fontStyle") {
                    info.font_styles
                        .extend(font_style.split_whitespace().map(str::to_string));
                }
            }
        }
    }
    info
}

/// Per color scheme coverage, ready to print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeReport {
    pub color_scheme: String,
    pub syntaxes: BTreeSet<String>,
    pub info: SchemeInfo,
    pub is_legacy: bool,
}

impl SchemeReport {
    pub fn minimal_syntaxes(&self) -> usize {
        self.syntaxes
            .iter()
            .filter(|s| MINIMAL_SYNTAXES.contains(s.as_str()))
            .count()
    }

    pub fn minimal_scopes(&self) -> usize {
        self.info
            .scopes
            .iter()
            .filter(|s| MINIMAL_SCOPES.contains(s.as_str()))
            .count()
    }

    fn syntaxes_not_covered(&self) -> Vec<&'static str> {
        sorted(&MINIMAL_SYNTAXES)
            .into_iter()
            .filter(|s| !self.syntaxes.contains(*s))
            .collect()
    }

    fn scopes_not_covered(&self) -> Vec<&'static str> {
        sorted(&MINIMAL_SCOPES)
            .into_iter()
            .filter(|s| !self.info.scopes.contains(*s))
            .collect()
    }
}

fn sorted(set: &phf::Set<&'static str>) -> Vec<&'static str> {
    let mut items: Vec<&'static str> = set.iter().copied().collect();
    items.sort_unstable();
    items
}

/// Collects which color scheme each rendered fixture used.
#[derive(Debug, Default)]
pub struct Coverage {
    enabled: bool,
    is_single_file: bool,
    /// Color scheme -> syntaxes tested with it.
    tested: BTreeMap<String, BTreeSet<String>>,
}

impl Coverage {
    pub fn new(enabled: bool, is_single_file: bool) -> Self {
        Self {
            enabled,
            is_single_file,
            tested: BTreeMap::new(),
        }
    }

    pub fn on_test_start(&mut self, _test: &str, color_scheme: &str, syntax: &str) {
        if !self.enabled {
            return;
        }
        self.tested
            .entry(color_scheme.to_string())
            .or_default()
            .insert(syntax.to_string());
    }

    /// Load every tested color scheme and build its report.
    pub fn reports(&self, resources: &dyn ResourceLoader) -> Vec<SchemeReport> {
        self.tested
            .iter()
            .filter_map(|(color_scheme, syntaxes)| {
                match ThemeDocument::load(resources, color_scheme) {
                    Ok(document) => Some(SchemeReport {
                        color_scheme: color_scheme.clone(),
                        syntaxes: syntaxes.clone(),
                        info: extract(&document),
                        is_legacy: document.is_legacy(),
                    }),
                    Err(e) => {
                        warn!(color_scheme = %color_scheme, error = %e, "skipping coverage");
                        None
                    }
                }
            })
            .collect()
    }

    pub fn on_tests_end(&self, resources: &dyn ResourceLoader, out: &mut dyn Write) -> io::Result<()> {
        if !self.enabled || self.tested.is_empty() {
            return Ok(());
        }
        let reports = self.reports(resources);
        self.write_report(out, &reports)
    }

    pub fn write_report(&self, out: &mut dyn Write, reports: &[SchemeReport]) -> io::Result<()> {
        write!(out, "\nGenerating code coverage report...\n\n")?;

        let width = reports
            .iter()
            .map(|r| r.color_scheme.chars().count())
            .max()
            .unwrap_or(0);
        writeln!(
            out,
            "{:<width$} {:>20} {:>20}",
            "Name",
            "Minimal syntaxes",
            "Minimal scopes",
            width = width
        )?;
        writeln!(out, "{}{}", "-".repeat(width), "-".repeat(42))?;
        for report in reports {
            writeln!(
                out,
                "{:<width$} {:>20} {:>20}",
                report.color_scheme,
                format!("{} / {}", report.minimal_syntaxes(), MINIMAL_SYNTAXES.len()),
                format!("{} / {}", report.minimal_scopes(), MINIMAL_SCOPES.len()),
                width = width
            )?;
        }
        writeln!(out)?;

        for (i, report) in reports.iter().enumerate() {
            self.write_scheme(out, i + 1, report)?;
        }
        writeln!(out)
    }

    fn write_scheme(&self, out: &mut dyn Write, index: usize, report: &SchemeReport) -> io::Result<()> {
        writeln!(out, "{}) {}", index, report.color_scheme)?;

        let syntaxes_not_covered = report.syntaxes_not_covered();
        let scopes_not_covered = report.scopes_not_covered();
        let mut notices = scopes_not_covered.len();
        if !self.is_single_file {
            notices += syntaxes_not_covered.len();
        }

        if notices > 0 {
            write!(
                out,
                "\n   There {} {} notice{}:\n",
                if notices == 1 { "is" } else { "are" },
                notices,
                if notices == 1 { "" } else { "s" }
            )?;

            if !syntaxes_not_covered.is_empty() && !self.is_single_file {
                write!(
                    out,
                    "\n   The following is a recommended minimal set of syntaxes that should be tested.\n\n"
                )?;
                for (i, syntax) in syntaxes_not_covered.iter().enumerate() {
                    writeln!(out, "   {}/{}: {}", i + 1, syntaxes_not_covered.len(), syntax)?;
                }
            }

            if !scopes_not_covered.is_empty() {
                write!(
                    out,
                    "\n   The following is a recommended minimal set of scopes that your color scheme should support.\n"
                )?;
                write!(
                    out,
                    "   See https://www.sublimetext.com/docs/scope_naming.html#minimal-scope-coverage\n\n"
                )?;
                for (i, scope) in scopes_not_covered.iter().enumerate() {
                    writeln!(out, "   {}/{}: {}", i + 1, scopes_not_covered.len(), scope)?;
                }
            }
        }

        let info = &report.info;
        let syntaxes: Vec<&String> = report.syntaxes.iter().collect();
        let colors: Vec<&String> = info.colors.iter().collect();
        let colors_excl_alpha: BTreeSet<String> =
            info.colors.iter().map(|c| c.chars().take(7).collect()).collect();
        let colors_incl_alpha: Vec<&String> =
            info.colors.iter().filter(|c| c.chars().count() > 7).collect();
        let scopes: Vec<&String> = info.scopes.iter().collect();

        writeln!(out)?;
        stat_row(out, "Syntaxes tested", &syntaxes)?;
        stat_row(out, "Colors used", &colors)?;
        if colors_excl_alpha.len() != colors.len() {
            stat_row(
                out,
                "Colors excl. alpha",
                &colors_excl_alpha.iter().collect::<Vec<_>>(),
            )?;
        }
        if !colors_incl_alpha.is_empty() {
            stat_row(out, "Colors incl. alpha", &colors_incl_alpha)?;
        }
        stat_row(out, "Scopes used", &scopes)?;
        if report.is_legacy {
            stat_row(
                out,
                "Font styles used",
                &info.font_styles.iter().collect::<Vec<_>>(),
            )?;
        }
        writeln!(out)
    }
}

fn stat_row(out: &mut dyn Write, label: &str, items: &[&String]) -> io::Result<()> {
    writeln!(out, "   {:<18} | {:>3} | {}", label, items.len(), format_list(items))
}
