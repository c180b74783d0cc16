//! Error types for every layer of the toolkit.
//!
//! Each layer reports its own enum so callers can tell an invalid
//! expression apart from a structurally broken template.

use crate::ast::Separator;
use thiserror::Error;

/// Failure of a single parse call over a lexem stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unexpected `{found}` at offset {offset}, expected {expected}")]
    UnexpectedToken {
        found: String,
        offset: usize,
        expected: &'static str,
    },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("unterminated {quote} literal starting at offset {offset}")]
    UnterminatedLiteral { quote: char, offset: usize },

    #[error("expected `{expected}` at offset {offset}, found `{found}`")]
    MismatchedBracket {
        expected: char,
        found: String,
        offset: usize,
    },

    #[error("bracket `{bracket}` at offset {offset} is not allowed here")]
    DisallowedBracket { bracket: char, offset: usize },

    #[error("separator {found} at offset {offset} does not match the sequence separator {expected}")]
    InconsistentSeparator {
        expected: Separator,
        found: Separator,
        offset: usize,
    },

    #[error("unparsed input `{found}` at offset {offset}")]
    TrailingInput { found: String, offset: usize },
}

impl ParseError {
    /// Byte offset the error points at, if it has one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            ParseError::UnexpectedToken { offset, .. }
            | ParseError::UnterminatedLiteral { offset, .. }
            | ParseError::MismatchedBracket { offset, .. }
            | ParseError::DisallowedBracket { offset, .. }
            | ParseError::InconsistentSeparator { offset, .. }
            | ParseError::TrailingInput { offset, .. } => Some(*offset),
            ParseError::UnexpectedEnd { .. } => None,
        }
    }
}

/// Failure while evaluating attribute text as a condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("`{expr}` has no boolean meaning")]
    UnsupportedCondition { expr: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpolationError {
    #[error("interpolation did not converge after {passes} passes (cyclic variable definition?)")]
    DidNotConverge { passes: usize },
}

/// Structural failure of the template compiler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("line {line}: `{directive}` closes a scope but none is open")]
    UnbalancedEnd { line: usize, directive: String },

    #[error("line {line}: `{directive}` is never closed")]
    Unclosed { line: usize, directive: String },

    #[error("line {line}: invalid attributes: {source}")]
    Attrs {
        line: usize,
        #[source]
        source: ParseError,
    },
}

impl CompileError {
    /// 1-based source line the error is reported against.
    pub fn line(&self) -> usize {
        match self {
            CompileError::UnbalancedEnd { line, .. }
            | CompileError::Unclosed { line, .. }
            | CompileError::Attrs { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("condition `{directive}`: {source}")]
    Eval {
        directive: String,
        #[source]
        source: EvalError,
    },

    #[error(transparent)]
    Interpolation(#[from] InterpolationError),

    #[error("rendered line contains a line break: {line:?}")]
    EmbeddedLineBreak { line: String },
}

/// Any failure of the one-call helpers in the crate root.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Render(#[from] RenderError),
}
