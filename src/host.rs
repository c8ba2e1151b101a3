//! Contracts for the editor host the runner drives.
//!
//! The runner never renders text or reads files itself. It asks a [`Host`]
//! for resources and transient [`View`]s, and a view for scope names and
//! per-view styles. `crate::syntax` provides the syntect-backed host.

use std::ops::{Deref, DerefMut};
use std::path::PathBuf;

use tracing::debug;

use crate::error::FixtureError;
use crate::resource::ResourceLoader;
use crate::scheme::{SelectorScorer, StyleMap, ThemeDocument};

/// A style dict as reported by the host's per-view style API.
///
/// Font style is reported as boolean flags rather than a keyword string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostStyle {
    pub attributes: StyleMap,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
}

impl HostStyle {
    /// Overlay `other` on top of `self`; `other` wins per key and per flag.
    pub fn overlay(mut self, other: &HostStyle) -> HostStyle {
        self.attributes
            .extend(other.attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.bold = other.bold.or(self.bold);
        self.italic = other.italic.or(self.italic);
        self
    }

    /// Font style keywords synthesized from the flags: `""`, `"bold"`,
    /// `"italic"` or `"bold italic"`.
    pub fn font_style(&self) -> String {
        let mut font_style = String::new();
        if self.bold == Some(true) {
            font_style.push_str(" bold");
        }
        if self.italic == Some(true) {
            font_style.push_str(" italic");
        }
        font_style.trim().to_string()
    }
}

/// A transient text view that renders a buffer with a syntax and a theme.
pub trait View {
    /// Assign a syntax definition by resource path.
    fn assign_syntax(&mut self, syntax: &str) -> Result<(), FixtureError>;

    fn syntax(&self) -> Option<&str>;

    /// Assign a color scheme already loaded from `color_scheme`.
    fn set_color_scheme(&mut self, color_scheme: &str, document: ThemeDocument);

    fn color_scheme(&self) -> Option<&str>;

    /// Replace the buffer content and render it.
    fn set_content(&mut self, content: &str) -> Result<(), FixtureError>;

    /// Buffer offset of a 0-based row and character column.
    fn text_point(&self, row: usize, col: usize) -> usize;

    /// Space-separated scope path at a buffer offset.
    fn scope_name(&self, point: usize) -> String;

    /// The view-level base style.
    fn style(&self) -> HostStyle;

    /// The style the view's theme assigns to a scope path.
    fn style_for_scope(&self, scope: &str) -> HostStyle;

    /// Release the view. Called exactly once, by [`ViewGuard`].
    fn close(&mut self);
}

/// The host editor.
pub trait Host {
    fn resources(&self) -> &dyn ResourceLoader;

    /// Location on disk of a resource, for report output.
    fn file_name(&self, resource: &str) -> PathBuf;

    fn scorer(&self) -> &dyn SelectorScorer;

    /// Numeric build identifier of the host.
    fn build(&self) -> u32;

    fn platform(&self) -> &str;

    fn create_view(&self) -> Box<dyn View + '_>;
}

/// Owns a transient view and closes it on every exit path.
pub struct ViewGuard<'h> {
    view: Box<dyn View + 'h>,
}

impl<'h> ViewGuard<'h> {
    pub fn new(view: Box<dyn View + 'h>) -> Self {
        Self { view }
    }
}

impl<'h> Deref for ViewGuard<'h> {
    type Target = dyn View + 'h;

    fn deref(&self) -> &Self::Target {
        self.view.as_ref()
    }
}

impl DerefMut for ViewGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.view.as_mut()
    }
}

impl Drop for ViewGuard<'_> {
    fn drop(&mut self) {
        debug!("closing test view");
        self.view.close();
    }
}
