//! Diagnostics collector
//!
//! One [`Diagnostics`] value is created per operation and handed back to the
//! caller with the operation's result. It is append-only; any error entry
//! marks the operation failed.

use super::error::{GatewayError, ReconcileError, SessionError};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Class of an error diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Schema or shape violation, caught before any network call
    Validation,
    /// Transport, auth or cancellation failure of a remote call
    Gateway,
    /// Zero items returned for the identifier
    NotFound,
    /// Create (or another lifecycle step this provider refuses)
    UnsupportedOperation,
    /// Provider session could not be configured
    Configuration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    pub class: Option<ErrorClass>,
}

impl Diagnostic {
    pub fn error(class: ErrorClass, summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            class: Some(class),
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            class: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity.as_str(), self.summary)?;
        if !self.detail.is_empty() {
            write!(f, "\n  {}", self.detail.replace('\n', "\n  "))?;
        }
        Ok(())
    }
}

/// Per-operation accumulator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => tracing::debug!("diagnostic error: {}", diagnostic.summary),
            Severity::Warning => tracing::debug!("diagnostic warning: {}", diagnostic.summary),
        }
        self.entries.push(diagnostic);
    }

    pub fn add_error(
        &mut self,
        class: ErrorClass,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.push(Diagnostic::error(class, summary, detail));
    }

    pub fn add_warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Diagnostic::warning(summary, detail));
    }

    /// Record a reconciler failure under the given summary.
    /// Validation failures expand to one entry per violated attribute.
    pub fn add_reconcile_error(&mut self, summary: &str, err: &ReconcileError) {
        match err {
            ReconcileError::Validation(errors) => {
                for e in errors {
                    self.add_error(ErrorClass::Validation, summary, e.to_string());
                }
            }
            ReconcileError::Gateway(e) => self.add_gateway_error(summary, e),
            ReconcileError::Unsupported(detail) => {
                self.add_error(ErrorClass::UnsupportedOperation, summary, detail.clone())
            }
        }
    }

    pub fn add_gateway_error(&mut self, summary: &str, err: &GatewayError) {
        self.add_error(err.class(), summary, err.to_string());
    }

    pub fn add_session_error(&mut self, summary: &str, err: &SessionError) {
        self.add_error(ErrorClass::Configuration, summary, err.to_string());
    }

    pub fn has_error(&self) -> bool {
        self.entries.iter().any(Diagnostic::is_error)
    }

    /// Whether any error entry carries the given class
    pub fn has_error_class(&self, class: ErrorClass) -> bool {
        self.errors().any(|d| d.class == Some(class))
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| !d.is_error())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", d)?;
        }
        Ok(())
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
