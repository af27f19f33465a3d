//! # Error Module
//!
//! Unified error types for all stages of the Minnow interpreter pipeline.
//! Front-end errors (lexer, parser, compiler) carry source location
//! information; runtime errors do not, since bytecode carries no source map.

use std::fmt;

// -----------------------------------------------------------------------------
// SPAN — Source Location
// -----------------------------------------------------------------------------

/// Represents a position in source code.
///
/// Compact 12-byte representation tracking line, column, and length
/// for precise error reporting and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// 1-based line number in the source file.
    pub line: u32,
    /// 1-based column number in the source file.
    pub col: u32,
    /// Length of the spanned region in bytes.
    pub len: u32,
}

impl Span {
    /// Creates a new span at the given location.
    #[inline]
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        Self { line, col, len }
    }
}

// -----------------------------------------------------------------------------
// ERROR KIND — Pipeline Stage Classification
// -----------------------------------------------------------------------------

/// Classifies which stage of the pipeline produced the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Error during lexical analysis (tokenization).
    Lexer,
    /// Error during parsing (syntax analysis).
    Parser,
    /// Error during compilation (AST to bytecode).
    Compiler,
    /// Error during VM execution.
    Runtime,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Lexer => write!(f, "LexerError"),
            ErrorKind::Parser => write!(f, "ParseError"),
            ErrorKind::Compiler => write!(f, "CompileError"),
            ErrorKind::Runtime => write!(f, "RuntimeError"),
        }
    }
}

// -----------------------------------------------------------------------------
// MINNOW ERROR — Unified Error Type
// -----------------------------------------------------------------------------

/// The unified error type for the entire Minnow interpreter.
///
/// Every error carries a classification (`kind`), a human-readable
/// `message`, and an optional `span` pointing to the source location.
#[derive(Debug, Clone)]
pub struct MinnowError {
    /// Which pipeline stage produced this error.
    pub kind: ErrorKind,
    /// Human-readable description of what went wrong.
    pub message: String,
    /// Source location where the error occurred, if available.
    pub span: Option<Span>,
}

impl MinnowError {
    /// Creates a new error with a source location.
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span: Some(span),
        }
    }

    /// Creates a new error without source location information.
    pub fn no_span(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            span: None,
        }
    }

    /// Creates a lexer error at the given span.
    #[inline]
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Lexer, message, span)
    }

    /// Creates a parser error at the given span.
    #[inline]
    pub fn parser(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Parser, message, span)
    }

    /// Creates a compiler error at the given span.
    #[inline]
    pub fn compiler(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Compiler, message, span)
    }

    /// Creates a runtime error without source location.
    #[inline]
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::no_span(ErrorKind::Runtime, message)
    }
}

impl fmt::Display for MinnowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Some(span) => write!(
                f,
                "{} [line {}:{}]: {}",
                self.kind, span.line, span.col, self.message
            ),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for MinnowError {}

/// Convenience type alias for Results throughout the Minnow interpreter.
pub type MinnowResult<T> = std::result::Result<T, MinnowError>;

// -----------------------------------------------------------------------------
// PRETTY PRINTING
// -----------------------------------------------------------------------------

/// Renders an error with the offending source line and a caret marker.
///
/// Falls back to the plain `Display` form when the error carries no span
/// or the span's line is out of range for `source`.
pub fn format_error(err: &MinnowError, source: &str, filename: &str) -> String {
    let span = match err.span {
        Some(span) => span,
        None => return err.to_string(),
    };

    let line_text = match source.lines().nth(span.line as usize - 1) {
        Some(text) => text,
        None => return err.to_string(),
    };

    let mut out = String::new();
    out.push_str(&format!(
        "{}: {}\n  --> {}:{}:{}\n",
        err.kind, err.message, filename, span.line, span.col
    ));
    out.push_str(&format!("   | {}\n", line_text));

    let caret_col = span.col.max(1) as usize - 1;
    let width = (span.len.max(1) as usize).min(line_text.len().saturating_sub(caret_col).max(1));
    out.push_str(&format!("   | {}{}", " ".repeat(caret_col), "^".repeat(width)));
    out
}
