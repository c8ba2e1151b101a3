//! Error types shared by the resolution engine and the fixture runner.

use thiserror::Error;

/// Failure to locate or read a package resource.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Failed to read resource {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure to load a color scheme document.
#[derive(Debug, Error)]
pub enum ThemeError {
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error("Malformed color scheme {path}: {source}")]
    MalformedPlist {
        path: String,
        #[source]
        source: plist::Error,
    },
    #[error("Malformed color scheme {path}: {source}")]
    MalformedJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Fixture-fatal errors. Any of these halts the current fixture only.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("Invalid COLOR SCHEME TEST header")]
    InvalidHeader,
    #[error("Syntax not found: {0}")]
    SyntaxNotFound(String),
    #[error("More than one syntax found: {}", format_list(.0))]
    AmbiguousSyntax(Vec<String>),
    #[error("Unsupported syntax definition: {0}")]
    UnsupportedSyntax(String),
    #[error("Failed to render fixture: {0}")]
    Render(String),
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error(transparent)]
    Theme(#[from] ThemeError),
}

/// Render a list of strings the way the report prints collections:
/// `['a', 'b']`.
pub fn format_list<S: AsRef<str>>(items: &[S]) -> String {
    let quoted: Vec<String> = items
        .iter()
        .map(|item| format!("'{}'", item.as_ref()))
        .collect();
    format!("[{}]", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_list() {
        assert_eq!(format_list::<&str>(&[]), "[]");
        assert_eq!(format_list(&["a"]), "['a']");
        assert_eq!(format_list(&["a", "b"]), "['a', 'b']");
    }

    #[test]
    fn test_ambiguous_syntax_message() {
        let err = FixtureError::AmbiguousSyntax(vec![
            "Packages/A/PHP.sublime-syntax".to_string(),
            "Packages/B/PHP.sublime-syntax".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "More than one syntax found: ['Packages/A/PHP.sublime-syntax', 'Packages/B/PHP.sublime-syntax']"
        );
    }

    #[test]
    fn test_syntax_not_found_message() {
        let err = FixtureError::SyntaxNotFound("PHP".to_string());
        assert_eq!(err.to_string(), "Syntax not found: PHP");
    }
}
