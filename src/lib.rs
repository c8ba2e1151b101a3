//! color-scheme-unit - conformance tests for Sublime Text color schemes
//!
//! Fixture files declare a color scheme in a `COLOR SCHEME TEST` header and
//! assert, with caret lines, the foreground, background and font style the
//! scheme gives each highlighted character.

pub mod config;
pub mod coverage;
pub mod error;
pub mod fixture;
pub mod generator;
pub mod host;
pub mod report;
pub mod resource;
pub mod runner;
pub mod scheme;
pub mod style;
pub mod syntax;
