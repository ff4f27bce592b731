//! The stage-sequencing driver.

use std::io::{self, Write};

use cmm_ir::Program;
use tracing::debug;

use crate::ast::Node;
use crate::error::{CompileError, Diagnostics, TranslateError};
use crate::mips;
use crate::semantics::Analyser;
use crate::translate::Translator;

/// Drives the three stages over one syntax tree and owns the diagnostics
/// they produce.
///
/// The stages are independently callable: a driver may stop after analysis
/// for an error listing, dump the IR text, or go all the way to assembly.
/// Diagnostics are sticky and never alter control flow by themselves; only
/// [`compile_to_mips`](Self::compile_to_mips) gates each stage on the
/// previous one being clean.
#[derive(Debug, Default)]
pub struct Compiler {
    diags: Diagnostics,
}

impl Compiler {
    /// A compiler with an empty diagnostics sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run semantic analysis; returns whether it was error-free.
    pub fn analyse(&mut self, root: &Node) -> bool {
        debug!("running semantic analysis");
        Analyser::new(&mut self.diags).run(root);
        !self.diags.has_semantic_errors()
    }

    /// Lower the tree to three-address code.
    ///
    /// Assumption violations are recorded as sticky diagnostics; division
    /// by a constant zero aborts translation.
    pub fn translate(&mut self, root: &Node) -> Result<Program, TranslateError> {
        debug!("translating to intermediate code");
        Translator::new(&mut self.diags).run(root)
    }

    /// Write the textual IR, one instruction per line.
    pub fn dump_ir(&self, program: &Program, out: &mut impl Write) -> io::Result<()> {
        write!(out, "{program}")
    }

    /// Emit SPIM-flavoured MIPS-32 assembly.
    pub fn gen_mips(&self, program: &Program, out: &mut impl Write) -> io::Result<()> {
        debug!("generating assembly");
        mips::gen_mips(program, out)
    }

    /// Run every stage, gating each on the previous one being clean.
    pub fn compile_to_mips(
        &mut self,
        root: &Node,
        out: &mut impl Write,
    ) -> Result<(), CompileError> {
        if !self.analyse(root) {
            return Err(CompileError::SemanticErrors);
        }
        let program = self.translate(root)?;
        if self.diags.has_translate_errors() {
            return Err(CompileError::TranslateErrors);
        }
        self.gen_mips(&program, out)?;
        Ok(())
    }

    /// Everything recorded so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diags
    }
}
