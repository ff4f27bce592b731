//! Lowering of the checked syntax tree into three-address code.
//!
//! The translator re-resolves declarations against fresh tables (reusing the
//! analyser's declaration services) while generating instructions in one
//! depth-first pass. Constant-only subexpressions fold away; boolean
//! expressions lower through the fall-through condition convention; complex
//! l-values become synthesised addresses that [`try_deref`] turns back into
//! values on demand.
//!
//! [`try_deref`]: Translator::try_deref

use std::rc::Rc;

use cmm_ir::{BinOp, IdGen, Instruction, LabelId, Operand, Program, RelOp};
use tracing::debug;

use crate::ast::{Kind, Node, Tok};
use crate::error::{Diagnostics, TranslateError};
use crate::semantics::Analyser;
use crate::table::SymbolId;
use crate::types::{FieldList, Type};

type Result<T> = std::result::Result<T, TranslateError>;

/// Branch edge of a lowered condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    /// The successor instruction is the edge; no branch is emitted.
    Fall,
    /// Jump to the label.
    To(LabelId),
}

/// Tree-to-IR translator.
pub struct Translator<'d> {
    sema: Analyser<'d>,
    labels: IdGen,
    program: Program,
}

impl<'d> Translator<'d> {
    /// Translator with fresh tables and id generators.
    pub fn new(diags: &'d mut Diagnostics) -> Self {
        Self {
            sema: Analyser::new(diags),
            labels: IdGen::new(),
            program: Program::new(),
        }
    }

    /// Translate a whole tree.
    ///
    /// Non-fatal problems (assumption violations) are recorded as sticky
    /// diagnostics; division by a constant zero aborts with an error.
    pub fn run(mut self, root: &Node) -> Result<Program> {
        self.walk(root)?;
        debug!(instructions = self.program.len(), "translation finished");
        Ok(self.program)
    }

    fn walk(&mut self, node: &Node) -> Result<()> {
        if node.kind == Kind::ExtDef {
            return self.translate_ext_def(node);
        }
        for child in &node.children {
            self.walk(child)?;
        }
        Ok(())
    }

    fn translate_ext_def(&mut self, node: &Node) -> Result<()> {
        let [spec_node, rest @ ..] = node.children.as_slice() else {
            return Ok(());
        };
        let Some(spec) = self.sema.analyse_specifier(spec_node) else {
            return Ok(());
        };
        match rest {
            [dec_list, ..] if dec_list.kind == Kind::ExtDecList => {
                self.sema.diags.translate(
                    dec_list.lineno,
                    "Assumption 4 is violated. Global variables are not allowed.",
                );
            }
            [fun_dec, body_or_semi] if fun_dec.kind == Kind::FunDec => {
                let Some((func, params)) = self.sema.analyse_fun_dec(fun_dec, &spec) else {
                    return Ok(());
                };
                let name = func.name.clone();
                let is_def = !body_or_semi.is_tok(Tok::Semi);
                if !self.sema.checked_add_func(func, is_def) {
                    return Ok(());
                }
                if is_def {
                    self.sema.symtab.push_env();
                    self.sema.add_params(&params);
                    self.gen_funcdef(&name, &params);
                    self.translate_comp_st(body_or_semi)?;
                    self.sema.symtab.pop_env();
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn gen_funcdef(&mut self, name: &str, params: &FieldList) {
        self.program.push(Instruction::FuncDef(name.into()));
        for (pname, _) in params.iter() {
            if let Some(sym) = self.sema.symtab.find(pname) {
                let id = self.sema.symtab.symbol(sym).id;
                self.program.push(Instruction::Param(Operand::var(id)));
            }
        }
    }

    fn translate_comp_st(&mut self, node: &Node) -> Result<()> {
        for child in &node.children {
            match child.kind {
                Kind::DefList => self.translate_def_list(child)?,
                Kind::StmtList => self.translate_stmt_list(child)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn translate_def_list(&mut self, node: &Node) -> Result<()> {
        let mut cur = node;
        loop {
            match cur.children.as_slice() {
                [def] => return self.translate_def(def),
                [def, next] => {
                    self.translate_def(def)?;
                    cur = next;
                }
                _ => return Ok(()),
            }
        }
    }

    fn translate_def(&mut self, node: &Node) -> Result<()> {
        let [spec_node, dec_list, _semi] = node.children.as_slice() else {
            return Ok(());
        };
        let Some(spec) = self.sema.analyse_specifier(spec_node) else {
            return Ok(());
        };
        let mut cur = dec_list;
        loop {
            match cur.children.as_slice() {
                [dec] => return self.translate_dec(dec, &spec),
                [dec, _comma, next] => {
                    self.translate_dec(dec, &spec)?;
                    cur = next;
                }
                _ => return Ok(()),
            }
        }
    }

    fn translate_dec(&mut self, node: &Node, spec: &Rc<Type>) -> Result<()> {
        let Some(var_dec) = node.children.first() else {
            return Ok(());
        };
        let symbol = self.sema.analyse_var_dec(var_dec, spec);
        let Some(sym) = self.sema.checked_add_var(symbol) else {
            return Ok(());
        };
        let (id, ty) = {
            let symbol = self.sema.symtab.symbol(sym);
            (symbol.id, symbol.ty.clone())
        };
        if !ty.is_basic() {
            self.program.push(Instruction::Dec {
                var: Operand::var(id),
                size: ty.width(),
            });
        }
        if let [_, _assign, exp] = node.children.as_slice() {
            let lhs = self.symbol_operand(sym);
            self.assign_into(lhs, exp)?;
        }
        Ok(())
    }

    fn translate_stmt_list(&mut self, node: &Node) -> Result<()> {
        let mut cur = node;
        loop {
            match cur.children.as_slice() {
                [stmt] => return self.translate_stmt(stmt),
                [stmt, next] => {
                    self.translate_stmt(stmt)?;
                    cur = next;
                }
                _ => return Ok(()),
            }
        }
    }

    fn translate_stmt(&mut self, node: &Node) -> Result<()> {
        match node.children.as_slice() {
            [exp, _semi] if exp.kind == Kind::Exp => {
                self.translate_exp(exp)?;
                Ok(())
            }
            [comp] if comp.kind == Kind::CompSt => self.translate_comp_st(comp),
            [ret_tok, exp, _semi] if ret_tok.is_tok(Tok::Return) => {
                let val = self.translate_exp(exp)?;
                let val = self.try_deref(val);
                self.program.push(Instruction::Return(val));
                Ok(())
            }
            [kw, _lp, exp, _rp, rest @ ..] if kw.is_tok(Tok::If) => match rest {
                [then] => self.translate_stmt_if(exp, then),
                [then, _else, other] => self.translate_stmt_if_else(exp, then, other),
                _ => Ok(()),
            },
            [kw, _lp, exp, _rp, body] if kw.is_tok(Tok::While) => {
                self.translate_stmt_while(exp, body)
            }
            _ => Ok(()),
        }
    }

    fn translate_stmt_if(&mut self, exp: &Node, then: &Node) -> Result<()> {
        let label_false = self.labels.next_id();
        self.translate_cond(exp, Target::Fall, Target::To(label_false))?;
        self.translate_stmt(then)?;
        self.program.push(Instruction::Label(label_false));
        Ok(())
    }

    fn translate_stmt_if_else(&mut self, exp: &Node, then: &Node, other: &Node) -> Result<()> {
        let label_false = self.labels.next_id();
        let label_exit = self.labels.next_id();
        self.translate_cond(exp, Target::Fall, Target::To(label_false))?;
        self.translate_stmt(then)?;
        self.program.push(Instruction::Goto(label_exit));
        self.program.push(Instruction::Label(label_false));
        self.translate_stmt(other)?;
        self.program.push(Instruction::Label(label_exit));
        Ok(())
    }

    fn translate_stmt_while(&mut self, exp: &Node, body: &Node) -> Result<()> {
        let label_begin = self.labels.next_id();
        let label_exit = self.labels.next_id();
        self.program.push(Instruction::Label(label_begin));
        self.translate_cond(exp, Target::Fall, Target::To(label_exit))?;
        self.translate_stmt(body)?;
        self.program.push(Instruction::Goto(label_begin));
        self.program.push(Instruction::Label(label_exit));
        Ok(())
    }

    // ----- expressions -----

    fn translate_exp(&mut self, exp: &Node) -> Result<Operand> {
        match exp.children.as_slice() {
            [lit] if matches!(lit.kind, Kind::Int(_) | Kind::Float(_)) => {
                self.translate_literal(lit)
            }
            [id] if matches!(id.kind, Kind::Id(_)) => Ok(self.translate_var(id)),
            [id, _lp, args, _rp] if args.kind == Kind::Args => {
                self.translate_func_call(id, Some(args), None)
            }
            [id, _lp, _rp] if matches!(id.kind, Kind::Id(_)) => {
                self.translate_func_call(id, None, None)
            }
            [lp, inner, _rp] if lp.is_tok(Tok::Lp) => self.translate_exp(inner),
            [minus, inner] if minus.is_tok(Tok::Minus) => self.translate_unary_minus(inner, None),
            [not, _] if not.is_tok(Tok::Not) => self.translate_boolexp(exp, None),
            [lhs, op, rhs] if op.is_tok(Tok::Plus) => {
                self.translate_arith(lhs, rhs, BinOp::Add, None)
            }
            [lhs, op, rhs] if op.is_tok(Tok::Minus) => {
                self.translate_arith(lhs, rhs, BinOp::Sub, None)
            }
            [lhs, op, rhs] if op.is_tok(Tok::Star) => {
                self.translate_arith(lhs, rhs, BinOp::Mul, None)
            }
            [lhs, op, rhs] if op.is_tok(Tok::Div) => {
                self.translate_arith(lhs, rhs, BinOp::Div, None)
            }
            [lhs, op, rhs] if op.is_tok(Tok::Assign) => self.translate_assign(lhs, rhs),
            [_, op, _] if op.is_tok(Tok::And) || op.is_tok(Tok::Or) => {
                self.translate_boolexp(exp, None)
            }
            [_, op, _] if matches!(op.kind, Kind::Relop(_)) => self.translate_boolexp(exp, None),
            [_, op, _] if op.is_tok(Tok::Dot) => self.translate_access_exp(exp),
            [_, lb, _, _] if lb.is_tok(Tok::Lb) => self.translate_access_exp(exp),
            _ => Ok(Operand::Const(0)),
        }
    }

    /// Integer literals become constants; float literals violate
    /// assumption 1 and evaluate to `#0` so translation can continue.
    fn translate_literal(&mut self, lit: &Node) -> Result<Operand> {
        match lit.kind {
            Kind::Int(val) => Ok(Operand::Const(val)),
            _ => {
                self.sema.diags.translate(
                    lit.lineno,
                    "Assumption 1 is violated. Floats are not allowed.",
                );
                Ok(Operand::Const(0))
            }
        }
    }

    /// Operand for a resolved symbol: basic variables by value, aggregate
    /// parameters by their incoming address, aggregate locals through a
    /// fresh address of their storage.
    fn symbol_operand(&mut self, sym: SymbolId) -> Operand {
        let (id, ty, is_param) = {
            let symbol = self.sema.symtab.symbol(sym);
            (symbol.id, symbol.ty.clone(), symbol.is_param)
        };
        if ty.is_basic() {
            return Operand::var(id);
        }
        if is_param {
            return Operand::addr(id);
        }
        let addr = Operand::temp_addr(&mut self.sema.vars);
        self.program.push(Instruction::Ref {
            lhs: addr,
            rhs: Operand::var(id),
        });
        addr
    }

    fn translate_var(&mut self, id: &Node) -> Operand {
        let found = id.as_id().and_then(|name| self.sema.symtab.find(name));
        match found {
            Some(sym) => self.symbol_operand(sym),
            // Analysis has already rejected this use.
            None => Operand::Const(0),
        }
    }

    fn translate_func_call(
        &mut self,
        id: &Node,
        args: Option<&Node>,
        target: Option<Operand>,
    ) -> Result<Operand> {
        let Some(name) = id.as_id() else {
            return Ok(Operand::Const(0));
        };
        let name = name.to_string();

        if name == "read" {
            let ret = target.unwrap_or_else(|| Operand::temp_var(&mut self.sema.vars));
            self.program.push(Instruction::Read(ret));
            return Ok(ret);
        }
        if name == "write" {
            let arg = match args {
                Some(args) => self.first_arg(args)?,
                None => Operand::Const(0),
            };
            let arg = self.try_deref(arg);
            self.program.push(Instruction::Write(arg));
            if let Some(target) = target {
                self.program.push(Instruction::Assign {
                    lhs: target,
                    rhs: Operand::Const(0),
                });
                return Ok(target);
            }
            return Ok(Operand::Const(0));
        }

        if let Some(args) = args {
            self.translate_args(args)?;
        }
        let ret = target.unwrap_or_else(|| Operand::temp_var(&mut self.sema.vars));
        self.program.push(Instruction::Call { name, result: ret });
        Ok(ret)
    }

    /// Evaluate the arguments left to right; the `ARG` run is emitted in
    /// reverse source order, last argument first, directly before the call.
    fn translate_args(&mut self, args: &Node) -> Result<()> {
        let [exp, rest @ ..] = args.children.as_slice() else {
            return Ok(());
        };
        let result = self.translate_exp(exp)?;
        if let [_comma, next] = rest {
            self.translate_args(next)?;
        }
        self.program.push(Instruction::Arg(result));
        Ok(())
    }

    fn first_arg(&mut self, args: &Node) -> Result<Operand> {
        match args.children.first() {
            Some(exp) => self.translate_exp(exp),
            None => Ok(Operand::Const(0)),
        }
    }

    fn translate_assign(&mut self, lexp: &Node, rexp: &Node) -> Result<Operand> {
        let lhs = self.translate_exp(lexp)?;
        self.assign_into(lhs, rexp)
    }

    fn assign_into(&mut self, lhs: Operand, rexp: &Node) -> Result<Operand> {
        if matches!(lhs, Operand::Var { .. }) && self.optim_assign(lhs, rexp)? {
            return Ok(lhs);
        }
        let rhs = self.translate_exp(rexp)?;
        let rhs = self.try_deref(rhs);
        if lhs.is_addr() {
            self.program.push(Instruction::DerefAssign { lhs, rhs });
        } else {
            self.program.push(Instruction::Assign { lhs, rhs });
        }
        Ok(lhs)
    }

    /// Try to have the right-hand side write directly into `target`,
    /// skipping the move through a fresh temporary. Only lowerings that
    /// accept a destination qualify; plain values fall back to the caller.
    fn optim_assign(&mut self, target: Operand, rexp: &Node) -> Result<bool> {
        match rexp.children.as_slice() {
            [id, _lp, args, _rp] if args.kind == Kind::Args => {
                self.translate_func_call(id, Some(args), Some(target))?;
                Ok(true)
            }
            [id, _lp, _rp] if matches!(id.kind, Kind::Id(_)) => {
                self.translate_func_call(id, None, Some(target))?;
                Ok(true)
            }
            [lp, inner, _rp] if lp.is_tok(Tok::Lp) => self.optim_assign(target, inner),
            [minus, inner] if minus.is_tok(Tok::Minus) => {
                self.translate_unary_minus(inner, Some(target))?;
                Ok(true)
            }
            [not, _] if not.is_tok(Tok::Not) => {
                self.translate_boolexp(rexp, Some(target))?;
                Ok(true)
            }
            [lhs, op, rhs] if op.is_tok(Tok::Plus) => {
                self.translate_arith(lhs, rhs, BinOp::Add, Some(target))?;
                Ok(true)
            }
            [lhs, op, rhs] if op.is_tok(Tok::Minus) => {
                self.translate_arith(lhs, rhs, BinOp::Sub, Some(target))?;
                Ok(true)
            }
            [lhs, op, rhs] if op.is_tok(Tok::Star) => {
                self.translate_arith(lhs, rhs, BinOp::Mul, Some(target))?;
                Ok(true)
            }
            [lhs, op, rhs] if op.is_tok(Tok::Div) => {
                self.translate_arith(lhs, rhs, BinOp::Div, Some(target))?;
                Ok(true)
            }
            [_, op, _] if op.is_tok(Tok::And) || op.is_tok(Tok::Or) => {
                self.translate_boolexp(rexp, Some(target))?;
                Ok(true)
            }
            [_, op, _] if matches!(op.kind, Kind::Relop(_)) => {
                self.translate_boolexp(rexp, Some(target))?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn translate_unary_minus(&mut self, exp: &Node, target: Option<Operand>) -> Result<Operand> {
        let sub = self.translate_exp(exp)?;
        let sub = self.try_deref(sub);

        if let Some(val) = sub.as_const() {
            let folded = Operand::Const(val.wrapping_neg());
            if let Some(target) = target {
                self.program.push(Instruction::Assign {
                    lhs: target,
                    rhs: folded,
                });
                return Ok(target);
            }
            return Ok(folded);
        }

        let dest = target.unwrap_or_else(|| Operand::temp_var(&mut self.sema.vars));
        self.program.push(Instruction::Arith {
            op: BinOp::Sub,
            target: dest,
            lhs: Operand::Const(0),
            rhs: sub,
        });
        Ok(dest)
    }

    fn translate_arith(
        &mut self,
        lexp: &Node,
        rexp: &Node,
        op: BinOp,
        target: Option<Operand>,
    ) -> Result<Operand> {
        let lhs = self.translate_exp(lexp)?;
        let lhs = self.try_deref(lhs);
        let rhs = self.translate_exp(rexp)?;
        let rhs = self.try_deref(rhs);

        if let (Some(l), Some(r)) = (lhs.as_const(), rhs.as_const()) {
            let val = match op {
                BinOp::Add => l.wrapping_add(r),
                BinOp::Sub => l.wrapping_sub(r),
                BinOp::Mul => l.wrapping_mul(r),
                BinOp::Div => {
                    if r == 0 {
                        return Err(TranslateError::DivisionByZero {
                            lineno: rexp.lineno,
                        });
                    }
                    l.wrapping_div(r)
                }
            };
            let folded = Operand::Const(val);
            if let Some(target) = target {
                self.program.push(Instruction::Assign {
                    lhs: target,
                    rhs: folded,
                });
                return Ok(target);
            }
            return Ok(folded);
        }

        let dest = target.unwrap_or_else(|| Operand::temp_var(&mut self.sema.vars));
        self.program.push(Instruction::Arith {
            op,
            target: dest,
            lhs,
            rhs,
        });
        Ok(dest)
    }

    /// Lower a boolean expression in value position: a 0/1 skeleton around
    /// the condition, with the true edge falling through to the 1.
    fn translate_boolexp(&mut self, exp: &Node, target: Option<Operand>) -> Result<Operand> {
        let label_false = self.labels.next_id();
        let dest = target.unwrap_or_else(|| Operand::temp_var(&mut self.sema.vars));
        self.program.push(Instruction::Assign {
            lhs: dest,
            rhs: Operand::Const(0),
        });
        self.translate_cond(exp, Target::Fall, Target::To(label_false))?;
        self.program.push(Instruction::Assign {
            lhs: dest,
            rhs: Operand::Const(1),
        });
        self.program.push(Instruction::Label(label_false));
        Ok(dest)
    }

    fn translate_access_exp(&mut self, exp: &Node) -> Result<Operand> {
        Ok(self.translate_access(exp)?.0)
    }

    // ----- conditions -----

    fn translate_cond(&mut self, exp: &Node, ontrue: Target, onfalse: Target) -> Result<()> {
        match exp.children.as_slice() {
            [lp, inner, _rp] if lp.is_tok(Tok::Lp) => self.translate_cond(inner, ontrue, onfalse),
            [not, inner] if not.is_tok(Tok::Not) => {
                self.translate_cond(inner, onfalse, ontrue)
            }
            [lhs, op, rhs] if op.is_tok(Tok::And) => {
                let label = match onfalse {
                    Target::Fall => self.labels.next_id(),
                    Target::To(label) => label,
                };
                self.translate_cond(lhs, Target::Fall, Target::To(label))?;
                self.translate_cond(rhs, ontrue, onfalse)?;
                if onfalse == Target::Fall {
                    self.program.push(Instruction::Label(label));
                }
                Ok(())
            }
            [lhs, op, rhs] if op.is_tok(Tok::Or) => {
                let label = match ontrue {
                    Target::Fall => self.labels.next_id(),
                    Target::To(label) => label,
                };
                self.translate_cond(lhs, Target::To(label), Target::Fall)?;
                self.translate_cond(rhs, ontrue, onfalse)?;
                if ontrue == Target::Fall {
                    self.program.push(Instruction::Label(label));
                }
                Ok(())
            }
            [lhs, op, rhs] => match op.kind {
                Kind::Relop(rel) => self.translate_cond_relop(lhs, rhs, rel, ontrue, onfalse),
                _ => self.translate_cond_otherwise(exp, ontrue, onfalse),
            },
            _ => self.translate_cond_otherwise(exp, ontrue, onfalse),
        }
    }

    fn translate_cond_relop(
        &mut self,
        lexp: &Node,
        rexp: &Node,
        rel: RelOp,
        ontrue: Target,
        onfalse: Target,
    ) -> Result<()> {
        let lhs = self.translate_exp(lexp)?;
        let lhs = self.try_deref(lhs);
        let rhs = self.translate_exp(rexp)?;
        let rhs = self.try_deref(rhs);

        if let (Some(l), Some(r)) = (lhs.as_const(), rhs.as_const()) {
            self.goto_selected(rel.holds(l, r), ontrue, onfalse);
            return Ok(());
        }

        match (ontrue, onfalse) {
            (Target::To(t), Target::To(f)) => {
                self.program.push(Instruction::CondGoto {
                    op: rel,
                    lhs,
                    rhs,
                    label: t,
                });
                self.program.push(Instruction::Goto(f));
            }
            (Target::To(t), Target::Fall) => {
                self.program.push(Instruction::CondGoto {
                    op: rel,
                    lhs,
                    rhs,
                    label: t,
                });
            }
            (Target::Fall, Target::To(f)) => {
                self.program.push(Instruction::CondGoto {
                    op: rel.complement(),
                    lhs,
                    rhs,
                    label: f,
                });
            }
            (Target::Fall, Target::Fall) => {}
        }
        Ok(())
    }

    fn translate_cond_otherwise(
        &mut self,
        exp: &Node,
        ontrue: Target,
        onfalse: Target,
    ) -> Result<()> {
        let val = self.translate_exp(exp)?;
        let val = self.try_deref(val);

        if let Some(known) = val.as_const() {
            self.goto_selected(known != 0, ontrue, onfalse);
            return Ok(());
        }

        let zero = Operand::Const(0);
        match (ontrue, onfalse) {
            (Target::To(t), Target::To(f)) => {
                self.program.push(Instruction::CondGoto {
                    op: RelOp::Ne,
                    lhs: val,
                    rhs: zero,
                    label: t,
                });
                self.program.push(Instruction::Goto(f));
            }
            (Target::To(t), Target::Fall) => {
                self.program.push(Instruction::CondGoto {
                    op: RelOp::Ne,
                    lhs: val,
                    rhs: zero,
                    label: t,
                });
            }
            (Target::Fall, Target::To(f)) => {
                self.program.push(Instruction::CondGoto {
                    op: RelOp::Eq,
                    lhs: val,
                    rhs: zero,
                    label: f,
                });
            }
            (Target::Fall, Target::Fall) => {}
        }
        Ok(())
    }

    /// A condition with a known outcome needs at most one `GOTO`.
    fn goto_selected(&mut self, cond: bool, ontrue: Target, onfalse: Target) {
        match (ontrue, onfalse) {
            (Target::To(t), Target::To(f)) => {
                self.program.push(Instruction::Goto(if cond { t } else { f }));
            }
            (Target::To(t), Target::Fall) if cond => {
                self.program.push(Instruction::Goto(t));
            }
            (Target::Fall, Target::To(f)) if !cond => {
                self.program.push(Instruction::Goto(f));
            }
            _ => {}
        }
    }

    // ----- l-value addresses -----

    /// Translate a memory-access expression to the address of its storage,
    /// together with the accessed type when resolution succeeded.
    fn translate_access(&mut self, exp: &Node) -> Result<(Operand, Option<Rc<Type>>)> {
        match exp.children.as_slice() {
            [id] if matches!(id.kind, Kind::Id(_)) => Ok(self.translate_access_var(id)),
            [lp, inner, _rp] if lp.is_tok(Tok::Lp) => self.translate_access(inner),
            [obj, dot, id] if dot.is_tok(Tok::Dot) => self.translate_access_struct(obj, id),
            [arr, lb, idx, _rb] if lb.is_tok(Tok::Lb) => self.translate_access_array(arr, idx),
            _ => Ok((Operand::Const(0), None)),
        }
    }

    fn translate_access_var(&mut self, id: &Node) -> (Operand, Option<Rc<Type>>) {
        let found = id.as_id().and_then(|name| self.sema.symtab.find(name));
        let Some(sym) = found else {
            return (Operand::Const(0), None);
        };
        let ty = self.sema.symtab.symbol(sym).ty.clone();
        (self.symbol_operand(sym), Some(ty))
    }

    /// `a[i]`: element address `base + i * width(elem)`, with the constant
    /// index fast paths (index 0 is the base itself, a known index becomes
    /// a precomputed constant offset).
    fn translate_access_array(
        &mut self,
        arr: &Node,
        idx: &Node,
    ) -> Result<(Operand, Option<Rc<Type>>)> {
        let (base, ty) = self.translate_access(arr)?;
        let Some(elem) = ty.as_ref().and_then(|ty| ty.as_array_elem()).cloned() else {
            return Ok((base, None));
        };
        let idx_op = self.translate_exp(idx)?;
        let idx_op = self.try_deref(idx_op);

        let width = elem.width() as i32;
        let offset = match idx_op.as_const() {
            Some(0) => return Ok((base, Some(elem))),
            Some(known) => Operand::Const(width.wrapping_mul(known)),
            None => {
                let product = Operand::temp_var(&mut self.sema.vars);
                self.program.push(Instruction::Arith {
                    op: BinOp::Mul,
                    target: product,
                    lhs: idx_op,
                    rhs: Operand::Const(width),
                });
                product
            }
        };
        let out = Operand::temp_addr(&mut self.sema.vars);
        self.program.push(Instruction::Arith {
            op: BinOp::Add,
            target: out,
            lhs: base,
            rhs: offset,
        });
        Ok((out, Some(elem)))
    }

    /// `s.f`: the base plus the field's fixed offset; offset 0 reuses the
    /// base address unchanged.
    fn translate_access_struct(
        &mut self,
        obj: &Node,
        id: &Node,
    ) -> Result<(Operand, Option<Rc<Type>>)> {
        let (base, ty) = self.translate_access(obj)?;
        let field = id.as_id().and_then(|name| {
            ty.as_ref()
                .and_then(|ty| ty.as_struct())
                .and_then(|def| def.fields.offset_of(name))
                .map(|(field_ty, offset)| (field_ty.clone(), offset))
        });
        let Some((field_ty, offset)) = field else {
            return Ok((base, None));
        };
        if offset == 0 {
            return Ok((base, Some(field_ty)));
        }
        let out = Operand::temp_addr(&mut self.sema.vars);
        self.program.push(Instruction::Arith {
            op: BinOp::Add,
            target: out,
            lhs: base,
            rhs: Operand::Const(offset as i32),
        });
        Ok((out, Some(field_ty)))
    }

    /// An address operand used as a value loads through a fresh temporary;
    /// everything else passes through unchanged.
    fn try_deref(&mut self, op: Operand) -> Operand {
        if !op.is_addr() {
            return op;
        }
        let var = Operand::temp_var(&mut self.sema.vars);
        self.program.push(Instruction::Deref { lhs: var, rhs: op });
        var
    }
}
