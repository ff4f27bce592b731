//! Diagnostics and error types.
//!
//! Semantic and translation diagnostics are sticky: they are recorded in a
//! [`Diagnostics`] sink and analysis continues so one run surfaces as many
//! problems as possible. The only fatal condition is a division by a
//! constant zero, which aborts translation through [`TranslateError`].

use core::fmt;
use std::io;

use thiserror::Error;

/// Numbered semantic error kinds.
///
/// The numbers are part of the user-visible output format
/// (`Error type E at Line L: ...`) and must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
#[repr(u8)]
pub enum ErrorCode {
    /// A language-restriction assumption is violated.
    AssumptionViolated = 0,
    /// Use of an undefined variable.
    UndefinedVariable = 1,
    /// Call of an undefined function.
    UndefinedFunction = 2,
    /// Variable redefined, or its name collides with a structure.
    RedefinedVariable = 3,
    /// Function body defined twice.
    RedefinedFunction = 4,
    /// Assignment between mismatched types.
    AssignTypeMismatch = 5,
    /// Assignment target is not an l-value.
    AssignToRvalue = 6,
    /// Operand types do not fit the operator.
    OperandTypeMismatch = 7,
    /// Returned type differs from the declared return type.
    ReturnTypeMismatch = 8,
    /// Call arguments do not match the declared parameters.
    ArgumentMismatch = 9,
    /// Indexing applied to a non-array.
    NotAnArray = 10,
    /// Call applied to a non-function.
    NotAFunction = 11,
    /// Array index is not an integer.
    NonIntegerIndex = 12,
    /// Field access applied to a non-structure.
    IllegalFieldAccess = 13,
    /// Access to a field the structure does not have.
    NonExistentField = 14,
    /// Field or parameter repeated, or field initialised in a definition.
    RedefinedField = 15,
    /// Structure name already registered.
    DuplicatedStructName = 16,
    /// Structure tag never defined.
    UndefinedStruct = 17,
    /// Function declared but never given a body.
    FunctionNotDefined = 18,
    /// Function re-declared with an incompatible signature.
    InconsistentDeclaration = 19,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// One recorded problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Semantic-analysis diagnostic, printed
    /// `Error type E at Line L: message`.
    Semantic {
        /// Numbered kind.
        code: ErrorCode,
        /// Source line.
        lineno: u32,
        /// Message text, including its trailing period.
        message: String,
    },
    /// Translation diagnostic, printed `Line L: message`.
    Translate {
        /// Source line.
        lineno: u32,
        /// Message text.
        message: String,
    },
}

impl Diagnostic {
    /// Source line the diagnostic points at.
    pub fn lineno(&self) -> u32 {
        match self {
            Self::Semantic { lineno, .. } | Self::Translate { lineno, .. } => *lineno,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Semantic {
                code,
                lineno,
                message,
            } => write!(f, "Error type {code} at Line {lineno}: {message}"),
            Self::Translate { lineno, message } => write!(f, "Line {lineno}: {message}"),
        }
    }
}

/// Ordered sink of diagnostics with the two sticky stage flags.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    semantic_errors: bool,
    translate_errors: bool,
}

impl Diagnostics {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a semantic error and set the sticky flag.
    pub fn semantic(&mut self, code: ErrorCode, lineno: u32, message: impl Into<String>) {
        self.semantic_errors = true;
        self.entries.push(Diagnostic::Semantic {
            code,
            lineno,
            message: message.into(),
        });
    }

    /// Record a translation error and set the sticky flag.
    pub fn translate(&mut self, lineno: u32, message: impl Into<String>) {
        self.translate_errors = true;
        self.entries.push(Diagnostic::Translate {
            lineno,
            message: message.into(),
        });
    }

    /// Whether any semantic error was recorded.
    pub fn has_semantic_errors(&self) -> bool {
        self.semantic_errors
    }

    /// Whether any translation error was recorded.
    pub fn has_translate_errors(&self) -> bool {
        self.translate_errors
    }

    /// Recorded diagnostics in emission order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Number of recorded diagnostics.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Print every diagnostic, one per line.
    pub fn write_to(&self, out: &mut impl io::Write) -> io::Result<()> {
        for diag in &self.entries {
            writeln!(out, "{diag}")?;
        }
        Ok(())
    }
}

/// Fatal translation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// Division by a literal zero; translation cannot continue.
    #[error("Line {lineno}: divide zero error.")]
    DivisionByZero {
        /// Source line of the divisor.
        lineno: u32,
    },
}

/// Driver-level failure.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Semantic analysis recorded errors; later stages were not run.
    #[error("semantic analysis reported errors")]
    SemanticErrors,
    /// Translation aborted.
    #[error(transparent)]
    Translate(#[from] TranslateError),
    /// Translation recorded errors; assembly was not generated.
    #[error("translation reported errors")]
    TranslateErrors,
    /// Writing to the output sink failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}
