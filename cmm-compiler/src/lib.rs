//! Compiler for the CMM source language: semantic analysis, translation to
//! a three-address intermediate representation, and MIPS-32 code
//! generation.
//!
//! The lexer and parser are external collaborators; this crate starts from
//! the [`ast::Node`] tree they hand over. The [`Compiler`] driver sequences
//! the stages and owns their diagnostics; each stage can also be run on its
//! own through [`semantics::Analyser`] and [`translate::Translator`].

pub mod ast;
mod compiler;
pub mod error;
pub mod mips;
pub mod semantics;
pub mod table;
pub mod translate;
pub mod types;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use compiler::Compiler;

/// Commonly used types re-exported for convenience.
pub mod prelude {
    pub use crate::ast::{Kind, Node, Tok};
    pub use crate::error::{CompileError, Diagnostic, Diagnostics, ErrorCode, TranslateError};
    pub use crate::types::{Basic, FieldList, StructDef, Type};
    pub use crate::Compiler;
    pub use cmm_ir::{BinOp, Instruction, Operand, Program, RelOp};
}
