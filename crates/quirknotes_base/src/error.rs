use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use tracing_error::{SpanTrace, SpanTraceStatus};

/* 📖 # Why a custom error type and not use anyhow/eyre/thiserror etc?

- Better control over error handling
- The HTTP boundary needs to know the failure class of every error, which a
  custom kind enum expresses directly
- More transparency into error handling logic
 */

/// Error variants that can occur in quirknotes operations.
/// Each variant represents a specific error category with its associated context.
#[derive(Debug)]
pub enum ErrorKind {
    /// The caller supplied missing or malformed input
    InvalidInput { message: String },

    /// A well-formed lookup matched nothing
    NotFound { message: String },

    /// File system operation failed
    FileError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON encoding or decoding failed
    Json { source: serde_json::Error },

    /// The HTTP server or transport failed
    Http { message: String },

    /// Catch-all for other errors with a message
    Message { message: String },
}

/// The failure class an error maps to at the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Missing or invalid input, reported as 400.
    Input,
    /// Missing resource, reported as 404.
    NotFound,
    /// Anything unexpected, reported as 500.
    Infrastructure,
}

impl ErrorKind {
    /// Classify this error kind for the request boundary.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidInput { .. } => ErrorClass::Input,
            Self::NotFound { .. } => ErrorClass::NotFound,
            Self::FileError { .. } | Self::Json { .. } | Self::Http { .. } | Self::Message { .. } => {
                ErrorClass::Infrastructure
            }
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput { message }
            | Self::NotFound { message }
            | Self::Http { message }
            | Self::Message { message } => write!(f, "{}", message),
            Self::FileError { path, source } => {
                write!(f, "File error at {}: {}", path.display(), source)
            }
            Self::Json { source } => write!(f, "JSON error: {}", source),
        }
    }
}

/* 📖 # Why separate ErrorKind and QuirkError?
This two-layer design provides a clear separation of concerns:
- ErrorKind: structural variants with specific contexts (file paths, messages, etc.)
- QuirkError: wraps ErrorKind with context strings and a span trace

Users can pattern match on ErrorKind for specific handling, while QuirkError provides
ergonomic context attachment during propagation.
*/

/// Comprehensive error type wrapping ErrorKind with optional context.
pub struct QuirkError {
    kind: ErrorKind,
    context: Vec<String>,
    span_trace: SpanTrace,
}

impl QuirkError {
    /// Creates a new error from an ErrorKind, capturing the current span trace.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: vec![],
            span_trace: SpanTrace::capture(),
        }
    }

    /// Creates a catch-all error from a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Message {
            message: message.into(),
        })
    }

    /// Creates an input error from a message.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput {
            message: message.into(),
        })
    }

    /// Creates a not-found error from a message.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound {
            message: message.into(),
        })
    }

    /// Attaches context to an error.
    /// Context is displayed before the error message.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Attaches context using lazy evaluation.
    pub fn with_context<F>(mut self, f: F) -> Self
    where
        F: FnOnce() -> String,
    {
        self.context.push(f());
        self
    }

    /// Returns a reference to the underlying ErrorKind.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the failure class of the underlying kind.
    pub fn class(&self) -> ErrorClass {
        self.kind.class()
    }

    fn tree_lines(&self) -> Vec<String> {
        let count = self.context.len();
        self.context
            .iter()
            .enumerate()
            .map(|(i, ctx)| {
                let branch = if i + 1 == count { "└─" } else { "├─" };
                format!("{} {}", branch, ctx)
            })
            .collect()
    }
}

impl From<ErrorKind> for QuirkError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<serde_json::Error> for Box<QuirkError> {
    fn from(source: serde_json::Error) -> Self {
        Box::new(QuirkError::new(ErrorKind::Json { source }))
    }
}

impl StdError for QuirkError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.kind {
            ErrorKind::FileError { source, .. } => Some(source),
            ErrorKind::Json { source } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for QuirkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ctx in &self.context {
            write!(f, "{}: ", ctx)?;
        }
        write!(f, "{}", self.kind)
    }
}

/* 📖 # Why a tree-shaped Debug output?
Errors are usually printed once, at the top of the program or in a failed test. A tree
with the message first, then the context from innermost to outermost, reads top-down the
way the failure is usually investigated. The span trace is only printed when one was captured,
so output without a tracing subscriber stays stable.
*/
impl fmt::Debug for QuirkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = vec![self.kind.to_string()];
        lines.extend(self.tree_lines());
        write!(f, "{}", lines.join("\n"))?;
        if self.span_trace.status() == SpanTraceStatus::CAPTURED {
            write!(f, "\nTrace: {}", self.span_trace)?;
        }
        Ok(())
    }
}

/* 📖 # Why use Box<QuirkError> in the result type?

Boxing the error reduces the size of the result type, making it more efficient to return in the common case.

*/

/// Standard result type for quirknotes operations.
pub type QuirkResult<T> = std::result::Result<T, Box<QuirkError>>;

/// Build a boxed catch-all error from a format string.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        Box::new($crate::QuirkError::message(format!($($arg)*)))
    };
}

/// Return early with a boxed catch-all error built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::err!($($arg)*))
    };
}

/// Extension trait for attaching context to Results.
pub trait ResultExt<T> {
    /// Attaches context to an error, consuming and re-wrapping it.
    fn context(self, context: impl Into<String>) -> QuirkResult<T>;

    /// Attaches context using lazy evaluation.
    /// Context is only evaluated if the result is an error.
    fn with_context<F>(self, f: F) -> QuirkResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for QuirkResult<T> {
    fn context(self, context: impl Into<String>) -> QuirkResult<T> {
        self.map_err(|err| Box::new((*err).context(context)))
    }

    fn with_context<F>(self, f: F) -> QuirkResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|err| Box::new((*err).with_context(f)))
    }
}
