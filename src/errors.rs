//! Attest error handling.
//!
//! The harness distinguishes exactly two error classes and keeps them
//! disjoint in the type system:
//!
//! - [`Failure`]: one failed expectation. Recoverable, local to a single
//!   assertion batch. Caught only by `should::execute_tests`, printed as a
//!   framed message, and the run continues with the next file.
//! - [`Fatal`]: everything else (caller misuse, unresolvable scan root,
//!   unsupported registry capability, an unhandled raise). Never caught by
//!   the harness; it propagates to the CLI and terminates the run.
//!
//! [`AttestError`] is the union a batch yields, so `?` composes both
//! classes inside one closure. [`Raised`] is the generic error value test
//! callables produce for the `throw`/`not_throw` assertions, constructed
//! with the [`raise!`](crate::raise) macro.

use std::fmt;
use std::panic::Location;

use miette::Diagnostic;
use thiserror::Error;
use unicode_width::UnicodeWidthStr;

// ============================================================================
// RAISED - the error-reporting channel for test callables
// ============================================================================

/// An error raised by code under test.
///
/// Carries a type name (resolved against the type registry for subtype
/// checks), a message, and the raise site. Test code constructs these with
/// the [`raise!`](crate::raise) macro, which captures `file!()`/`line!()`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{type_name}: {message} in {file} on line {line}")]
pub struct Raised {
    pub type_name: String,
    pub message: String,
    pub file: String,
    pub line: u32,
}

impl Raised {
    pub fn new(
        type_name: impl Into<String>,
        message: impl Into<String>,
        file: impl Into<String>,
        line: u32,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            file: file.into(),
            line,
        }
    }
}

/// Constructs a [`Raised`] at the current source location.
///
/// ```rust
/// use attest::raise;
/// let e = raise!("NotFoundError", "no user with id {}", 7);
/// assert_eq!(e.type_name, "NotFoundError");
/// ```
#[macro_export]
macro_rules! raise {
    ($type_name:expr) => {
        $crate::errors::Raised::new($type_name, "", file!(), line!())
    };
    ($type_name:expr, $($arg:tt)+) => {
        $crate::errors::Raised::new($type_name, format!($($arg)+), file!(), line!())
    };
}

// ============================================================================
// FAILURE - one failed expectation
// ============================================================================

/// A single failed expectation.
///
/// Construction captures the *caller's* call site, so the reported location
/// points at the assertion call inside the test file, never at engine
/// internals. `Display` renders a framed message; the `!` border is as wide
/// as the longest line among the call-site file, the bracketed line number,
/// and the explanation text.
#[derive(Debug, Clone)]
pub struct Failure {
    pub message: String,
    pub file: String,
    pub line: u32,
    pub cause: Option<Raised>,
}

impl Failure {
    /// Creates a failure located at the immediate caller.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        Self::at(Location::caller(), message)
    }

    /// Creates a failure at an explicit location. Used by assertion methods
    /// that capture their caller once and report it from inner loops.
    pub fn at(location: &Location<'_>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            file: location.file().to_string(),
            line: location.line(),
            cause: None,
        }
    }

    /// Attaches the error that triggered this failure.
    pub fn with_cause(mut self, cause: Raised) -> Self {
        self.cause = Some(cause);
        self
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = format!("{} [{}]", self.file, self.line);
        let mut lines: Vec<&str> = vec!["", &location, ""];
        lines.extend(self.message.lines());
        lines.push("");

        let width = lines
            .iter()
            .map(|line| UnicodeWidthStr::width(*line))
            .max()
            .unwrap_or(0);
        let border = "!".repeat(width);

        writeln!(f, "{}", border)?;
        for line in &lines {
            writeln!(f, "{}", line)?;
        }
        write!(f, "{}", border)
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

// ============================================================================
// FATAL - configuration and environment errors
// ============================================================================

/// Non-recoverable harness errors.
///
/// These signal a programming or environment problem rather than a failed
/// expectation. The execution wrapper never catches them; they surface
/// through the scanner and the CLI as a non-zero exit.
#[derive(Debug, Error, Diagnostic)]
pub enum Fatal {
    /// The scan root does not resolve to an existing, readable path.
    #[error("invalid path: {path}")]
    #[diagnostic(
        code(attest::invalid_root),
        help("the scan root must be an existing, readable directory")
    )]
    InvalidRoot {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A reflection assertion was given a subject whose type is unknown to
    /// the registry. Caller misuse, not a test outcome.
    #[error("subject type '{name}' is not registered")]
    #[diagnostic(
        code(attest::unregistered_subject),
        help("register the type with attest::reflect::register before asserting on it")
    )]
    UnregisteredSubject { name: String },

    /// Enum assertions were used against a registry built without enum
    /// support. An environment precondition, not a test outcome.
    #[error("enum declarations are not supported by this type registry")]
    #[diagnostic(code(attest::enums_unsupported))]
    EnumsUnsupported,

    /// A `not_throw` callable raised an error of an unrelated type. The
    /// harness neither suppresses it nor reports it as a failure.
    #[error("unhandled raise: {0}")]
    #[diagnostic(code(attest::unhandled_raise))]
    Unhandled(#[from] Raised),
}

// ============================================================================
// ATTEST ERROR - the union a batch yields
// ============================================================================

/// The error type of an assertion batch: either class, so `?` works
/// uniformly inside `execute_tests` closures.
#[derive(Debug, Error)]
pub enum AttestError {
    #[error(transparent)]
    Failure(#[from] Failure),
    #[error(transparent)]
    Fatal(#[from] Fatal),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_captures_the_callers_location() {
        let failure = Failure::new("boom");
        assert!(failure.file.ends_with("errors.rs"));
        assert!(failure.line > 0);
    }

    #[test]
    fn frame_border_matches_longest_line() {
        let failure = Failure::new("short");
        let rendered = failure.to_string();
        let lines: Vec<&str> = rendered.lines().collect();

        let border = lines[0];
        assert!(!border.is_empty());
        assert!(border.chars().all(|c| c == '!'));
        assert_eq!(lines[lines.len() - 1], border);

        let widest = lines
            .iter()
            .map(|line| UnicodeWidthStr::width(*line))
            .max()
            .unwrap();
        assert_eq!(UnicodeWidthStr::width(border), widest);
    }

    #[test]
    fn frame_contains_location_and_message() {
        let failure = Failure::new("[0] value is not true");
        let rendered = failure.to_string();
        assert!(rendered.contains(&format!("{} [{}]", failure.file, failure.line)));
        assert!(rendered.contains("[0] value is not true"));
    }

    #[test]
    fn multi_line_messages_widen_the_border() {
        let long = "a much longer explanation line than the location line above it is";
        let failure = Failure::new(format!("first\n{}", long));
        let rendered = failure.to_string();
        let border = rendered.lines().next().unwrap();
        assert!(border.len() >= long.len());
    }

    #[test]
    fn raise_macro_captures_site_and_formats() {
        let raised = raise!("NotFoundError", "no user with id {}", 42);
        assert_eq!(raised.type_name, "NotFoundError");
        assert_eq!(raised.message, "no user with id 42");
        assert!(raised.file.ends_with("errors.rs"));
    }

    #[test]
    fn failure_source_is_the_cause() {
        use std::error::Error;
        let failure = Failure::new("wrapped").with_cause(raise!("IoError"));
        assert!(failure.source().is_some());
        assert!(Failure::new("bare").source().is_none());
    }
}
