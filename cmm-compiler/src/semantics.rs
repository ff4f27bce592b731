//! Semantic analysis: scope and table population, declaration checking and
//! expression type checking with l-value tracking.
//!
//! The analyser owns fresh tables per run and records numbered diagnostics
//! in the shared [`Diagnostics`] sink; nothing here is fatal, so one pass
//! surfaces as many errors as possible. After an error the analyser keeps a
//! best-effort type where one is recoverable (an illegal index expression
//! still yields the array's element type, a bad call still yields the
//! declared return type) to avoid cascades of follow-on errors.
//!
//! The declaration services (`analyse_specifier`, `analyse_var_dec`,
//! `analyse_fun_dec` and the checked table insertions) are also used by the
//! translator, which re-resolves declarations against its own tables.

use std::rc::Rc;

use cmm_ir::IdGen;
use itertools::Itertools;
use tracing::trace;

use crate::ast::{Kind, Node, Tok};
use crate::error::{Diagnostics, ErrorCode};
use crate::table::{StructRegistry, Symbol, SymbolId, SymbolTable};
use crate::types::{FieldList, StructDef, Type};

/// Operator classes sharing a type rule.
#[derive(Clone, Copy, PartialEq, Eq)]
enum OpClass {
    /// `+ - * /` and unary minus: both basic types allowed.
    Arith,
    /// `&& || !`: integers only.
    Bool,
    /// Relational comparison: basic types, result is `int`.
    Rel,
}

/// Scope-aware semantic analyser.
pub struct Analyser<'d> {
    pub(crate) registry: StructRegistry,
    pub(crate) symtab: SymbolTable,
    pub(crate) vars: IdGen,
    pub(crate) diags: &'d mut Diagnostics,
}

impl<'d> Analyser<'d> {
    /// Fresh tables with the builtin functions pre-registered.
    pub fn new(diags: &'d mut Diagnostics) -> Self {
        let mut analyser = Self {
            registry: StructRegistry::new(),
            symtab: SymbolTable::new(),
            vars: IdGen::new(),
            diags,
        };
        analyser.add_builtins();
        analyser
    }

    /// Analyse a whole tree, then report functions left undefined.
    pub fn run(&mut self, root: &Node) {
        self.walk(root);
        self.report_undefined();
    }

    fn walk(&mut self, node: &Node) {
        if node.kind == Kind::ExtDef {
            self.analyse_ext_def(node);
            return;
        }
        for child in &node.children {
            self.walk(child);
        }
    }

    /// `int read()` and `int write(int)` are always visible and defined.
    fn add_builtins(&mut self) {
        let int_ty = Type::int();
        let read = Rc::new(Type::Func {
            ret: int_ty.clone(),
            params: vec![],
        });
        let write = Rc::new(Type::Func {
            ret: int_ty.clone(),
            params: vec![int_ty],
        });
        self.symtab
            .add(Symbol::new("read", read, 0, true), &mut self.vars);
        self.symtab
            .add(Symbol::new("write", write, 0, true), &mut self.vars);
    }

    fn analyse_ext_def(&mut self, node: &Node) {
        let [spec_node, rest @ ..] = node.children.as_slice() else {
            return;
        };
        let Some(spec) = self.analyse_specifier(spec_node) else {
            return;
        };
        match rest {
            [dec_list, ..] if dec_list.kind == Kind::ExtDecList => {
                self.analyse_ext_dec_list(dec_list, &spec);
            }
            [fun_dec, body_or_semi] if fun_dec.kind == Kind::FunDec => {
                let Some((func, params)) = self.analyse_fun_dec(fun_dec, &spec) else {
                    return;
                };
                let is_def = !body_or_semi.is_tok(Tok::Semi);
                if !self.checked_add_func(func, is_def) {
                    return;
                }
                if is_def {
                    self.analyse_comp_st(body_or_semi, &spec, Some(&params));
                }
            }
            _ => {} // `Specifier SEMI`: registering the specifier was the work
        }
    }

    /// Resolve a specifier to a type; `None` is the anonymous error value.
    pub(crate) fn analyse_specifier(&mut self, node: &Node) -> Option<Rc<Type>> {
        let child = node.children.first()?;
        match &child.kind {
            Kind::TypeName(basic) => Some(Rc::new(Type::Basic(*basic))),
            Kind::StructSpecifier => self.analyse_struct_specifier(child),
            _ => None,
        }
    }

    fn analyse_struct_specifier(&mut self, node: &Node) -> Option<Rc<Type>> {
        match node.children.as_slice() {
            // `struct Tag { ... }`: create and register a named type.
            [_, opt_tag, _lc, rest @ ..] if opt_tag.kind == Kind::OptTag => {
                let id = opt_tag.children.first()?;
                let name = id.as_id()?.to_string();
                let mut fields = FieldList::new();
                if let [def_list, _rc] = rest {
                    self.analyse_def_list(def_list, Some(&mut fields));
                }
                let def = Rc::new(Type::Struct(StructDef {
                    name: Some(name),
                    fields,
                }));
                self.checked_register_struct(&def, id.lineno).then_some(def)
            }
            // `struct Tag`: look up an existing definition.
            [_, tag] if tag.kind == Kind::Tag => {
                let id = tag.children.first()?;
                let name = id.as_id()?;
                let found = self.registry.find(name).cloned();
                if found.is_none() {
                    self.diags.semantic(
                        ErrorCode::UndefinedStruct,
                        tag.lineno,
                        format!("Undefined structure \"{name}\"."),
                    );
                }
                found
            }
            // `struct { ... }`: anonymous, registered but never found by name.
            [_, _lc, rest @ ..] => {
                let mut fields = FieldList::new();
                if let [def_list, _rc] = rest {
                    self.analyse_def_list(def_list, Some(&mut fields));
                }
                let def = Rc::new(Type::Struct(StructDef { name: None, fields }));
                self.registry.add(def.clone());
                Some(def)
            }
            _ => None,
        }
    }

    /// Analyse a definition list either into a field list (structure body)
    /// or into the symbol table (local definitions).
    pub(crate) fn analyse_def_list(&mut self, node: &Node, mut fields: Option<&mut FieldList>) {
        let mut cur = node;
        loop {
            match cur.children.as_slice() {
                [def] => {
                    self.analyse_def(def, fields.as_deref_mut());
                    return;
                }
                [def, next] => {
                    self.analyse_def(def, fields.as_deref_mut());
                    cur = next;
                }
                _ => return,
            }
        }
    }

    fn analyse_def(&mut self, node: &Node, fields: Option<&mut FieldList>) {
        let [spec_node, dec_list, _semi] = node.children.as_slice() else {
            return;
        };
        let Some(spec) = self.analyse_specifier(spec_node) else {
            return;
        };
        self.analyse_dec_list(dec_list, &spec, fields);
    }

    fn analyse_dec_list(&mut self, node: &Node, spec: &Rc<Type>, mut fields: Option<&mut FieldList>) {
        let mut cur = node;
        loop {
            match cur.children.as_slice() {
                [dec] => {
                    self.analyse_dec(dec, spec, fields.as_deref_mut());
                    return;
                }
                [dec, _comma, next] => {
                    self.analyse_dec(dec, spec, fields.as_deref_mut());
                    cur = next;
                }
                _ => return,
            }
        }
    }

    fn analyse_dec(&mut self, node: &Node, spec: &Rc<Type>, fields: Option<&mut FieldList>) {
        let Some(var_dec) = node.children.first() else {
            return;
        };
        let symbol = self.analyse_var_dec(var_dec, spec);
        match fields {
            Some(fields) => {
                self.checked_push_field(fields, &symbol, "field");
                if let [_, assign, _] = node.children.as_slice() {
                    self.diags.semantic(
                        ErrorCode::RedefinedField,
                        assign.lineno,
                        "Field assigned during definition.",
                    );
                }
            }
            None => {
                let name = symbol.name.clone();
                let lineno = symbol.lineno;
                self.checked_add_var(symbol);
                if let [_, _assign, exp] = node.children.as_slice() {
                    self.typecheck_init(&name, lineno, exp);
                }
            }
        }
    }

    /// Type-check `T x = e;`: the declared variable is an l-value, so only
    /// the type-equality rule applies.
    fn typecheck_init(&mut self, name: &str, lineno: u32, exp: &Node) {
        let ltype = self
            .symtab
            .find(name)
            .map(|sym| self.symtab.symbol(sym).ty.clone());
        let (rtype, _) = self.typecheck_exp(exp);
        if let (Some(ltype), Some(rtype)) = (ltype, rtype) {
            if ltype != rtype {
                self.diags.semantic(
                    ErrorCode::AssignTypeMismatch,
                    lineno,
                    "Type mismatched for assignment.",
                );
            }
        }
    }

    /// Unwrap array dimensions right-to-left: `T id[n1][n2]` declares
    /// `Array{n1, Array{n2, T}}`.
    pub(crate) fn analyse_var_dec(&self, node: &Node, spec: &Rc<Type>) -> Symbol {
        match node.children.as_slice() {
            [inner, _lb, size, _rb] => {
                let len = match size.kind {
                    Kind::Int(val) => val as u32,
                    _ => 0,
                };
                let array = Rc::new(Type::Array {
                    elem: spec.clone(),
                    len,
                });
                self.analyse_var_dec(inner, &array)
            }
            [id] => match id.as_id() {
                Some(name) => Symbol::new(name, spec.clone(), id.lineno, false),
                None => Symbol::new("", spec.clone(), id.lineno, false),
            },
            _ => Symbol::new("", spec.clone(), node.lineno, false),
        }
    }

    fn analyse_ext_dec_list(&mut self, node: &Node, spec: &Rc<Type>) {
        let mut cur = node;
        loop {
            match cur.children.as_slice() {
                [var_dec] => {
                    let symbol = self.analyse_var_dec(var_dec, spec);
                    self.checked_add_var(symbol);
                    return;
                }
                [var_dec, _comma, next] => {
                    let symbol = self.analyse_var_dec(var_dec, spec);
                    self.checked_add_var(symbol);
                    cur = next;
                }
                _ => return,
            }
        }
    }

    /// Build the function symbol and, separately, its parameter field list
    /// so the body can enter a scope pre-populated with the parameters.
    pub(crate) fn analyse_fun_dec(
        &mut self,
        node: &Node,
        spec: &Rc<Type>,
    ) -> Option<(Symbol, FieldList)> {
        let id = node.children.first()?;
        let name = id.as_id()?.to_string();
        let mut params = FieldList::new();
        if let Some(var_list) = node.children.iter().find(|c| c.kind == Kind::VarList) {
            self.analyse_var_list(var_list, &mut params);
        }
        let func = Rc::new(Type::Func {
            ret: spec.clone(),
            params: params.iter().map(|(_, ty)| ty.clone()).collect(),
        });
        Some((Symbol::new(name, func, id.lineno, false), params))
    }

    fn analyse_var_list(&mut self, node: &Node, params: &mut FieldList) {
        let mut cur = node;
        loop {
            match cur.children.as_slice() {
                [param_dec] => {
                    self.analyse_param_dec(param_dec, params);
                    return;
                }
                [param_dec, _comma, next] => {
                    self.analyse_param_dec(param_dec, params);
                    cur = next;
                }
                _ => return,
            }
        }
    }

    fn analyse_param_dec(&mut self, node: &Node, params: &mut FieldList) {
        let [spec_node, var_dec] = node.children.as_slice() else {
            return;
        };
        let Some(spec) = self.analyse_specifier(spec_node) else {
            return;
        };
        let symbol = self.analyse_var_dec(var_dec, &spec);
        self.checked_push_field(params, &symbol, "parameter");
    }

    /// Analyse a compound statement; `params` populates the new scope when
    /// the block is a function body.
    pub(crate) fn analyse_comp_st(
        &mut self,
        node: &Node,
        ret: &Rc<Type>,
        params: Option<&FieldList>,
    ) {
        self.symtab.push_env();
        trace!("entering scope");
        if let Some(params) = params {
            self.add_params(params);
        }
        for child in &node.children {
            match child.kind {
                Kind::DefList => self.analyse_def_list(child, None),
                Kind::StmtList => self.analyse_stmt_list(child, ret),
                _ => {}
            }
        }
        trace!("leaving scope");
        self.symtab.pop_env();
    }

    /// Enter the parameters into the innermost scope as defined symbols.
    pub(crate) fn add_params(&mut self, params: &FieldList) {
        for (name, ty) in params.iter() {
            let mut symbol = Symbol::new(name, ty.clone(), 0, true);
            symbol.is_param = true;
            self.symtab.add(symbol, &mut self.vars);
        }
    }

    fn analyse_stmt_list(&mut self, node: &Node, ret: &Rc<Type>) {
        let mut cur = node;
        loop {
            match cur.children.as_slice() {
                [stmt] => {
                    self.analyse_stmt(stmt, ret);
                    return;
                }
                [stmt, next] => {
                    self.analyse_stmt(stmt, ret);
                    cur = next;
                }
                _ => return,
            }
        }
    }

    fn analyse_stmt(&mut self, node: &Node, ret: &Rc<Type>) {
        match node.children.as_slice() {
            [exp, _semi] if exp.kind == Kind::Exp => {
                self.typecheck_exp(exp);
            }
            [comp] if comp.kind == Kind::CompSt => {
                self.analyse_comp_st(comp, ret, None);
            }
            [ret_tok, exp, _semi] if ret_tok.is_tok(Tok::Return) => {
                let (ty, _) = self.typecheck_exp(exp);
                if let Some(ty) = ty {
                    if ty != *ret {
                        self.diags.semantic(
                            ErrorCode::ReturnTypeMismatch,
                            exp.lineno,
                            "Type mismatched for return.",
                        );
                    }
                }
            }
            [kw, _lp, exp, _rp, rest @ ..] if kw.is_tok(Tok::If) || kw.is_tok(Tok::While) => {
                let (ty, _) = self.typecheck_exp(exp);
                if let Some(ty) = ty {
                    if !ty.is_int() {
                        self.diags.semantic(
                            ErrorCode::AssumptionViolated,
                            exp.lineno,
                            "Expression conflicts assumption 2.",
                        );
                    }
                }
                if let Some(stmt) = rest.first() {
                    self.analyse_stmt(stmt, ret);
                }
                if let [_, _else, stmt2] = rest {
                    self.analyse_stmt(stmt2, ret);
                }
            }
            _ => {}
        }
    }

    // ----- checked table insertions -----

    /// Register a named structure, rejecting a duplicated tag (error 16).
    pub(crate) fn checked_register_struct(&mut self, def: &Rc<Type>, lineno: u32) -> bool {
        let name = def
            .as_struct()
            .and_then(|s| s.name.as_deref())
            .unwrap_or_default();
        if self.registry.find(name).is_some() {
            self.diags.semantic(
                ErrorCode::DuplicatedStructName,
                lineno,
                format!("Duplicated name \"{name}\"."),
            );
            return false;
        }
        self.registry.add(def.clone());
        true
    }

    /// Append a field or parameter, rejecting a repeated name (error 15).
    pub(crate) fn checked_push_field(&mut self, fields: &mut FieldList, symbol: &Symbol, what: &str) {
        if fields.find(&symbol.name).is_some() {
            self.diags.semantic(
                ErrorCode::RedefinedField,
                symbol.lineno,
                format!(
                    "Redefined {what} \"{name}\".",
                    name = symbol.name
                ),
            );
            return;
        }
        fields.push(symbol.name.clone(), symbol.ty.clone());
    }

    /// Add a variable, rejecting a same-scope duplicate or a name shared
    /// with a structure (error 3).
    pub(crate) fn checked_add_var(&mut self, mut symbol: Symbol) -> Option<SymbolId> {
        if self.symtab.find_in_current(&symbol.name).is_some()
            || self.registry.find(&symbol.name).is_some()
        {
            self.diags.semantic(
                ErrorCode::RedefinedVariable,
                symbol.lineno,
                format!("Redefined variable \"{name}\".", name = symbol.name),
            );
            return None;
        }
        symbol.is_defined = true;
        Some(self.symtab.add(symbol, &mut self.vars))
    }

    /// Add or merge a function declaration, enforcing the collision policy
    /// (errors 3, 4 and 19).
    pub(crate) fn checked_add_func(&mut self, mut func: Symbol, is_def: bool) -> bool {
        if self.registry.find(&func.name).is_some() {
            self.diags.semantic(
                ErrorCode::RedefinedVariable,
                func.lineno,
                format!("Redefined name \"{name}\".", name = func.name),
            );
            return false;
        }
        if let Some(existing) = self.symtab.find_in_current(&func.name) {
            let existing_sym = self.symtab.symbol(existing);
            if existing_sym.is_defined && is_def {
                self.diags.semantic(
                    ErrorCode::RedefinedFunction,
                    func.lineno,
                    format!("Redefined function \"{name}\".", name = func.name),
                );
                return false;
            }
            if existing_sym.ty != func.ty {
                self.diags.semantic(
                    ErrorCode::InconsistentDeclaration,
                    func.lineno,
                    format!(
                        "Inconsistent declaration of function \"{name}\".",
                        name = func.name
                    ),
                );
                return false;
            }
            if is_def {
                self.symtab.symbol_mut(existing).is_defined = true;
            }
        } else {
            func.is_defined = is_def;
            self.symtab.add(func, &mut self.vars);
        }
        true
    }

    fn report_undefined(&mut self) {
        let reports: Vec<(u32, String)> = self
            .symtab
            .undefined_symbols()
            .iter()
            .map(|symbol| {
                (
                    symbol.lineno,
                    format!("Undefined function \"{name}\".", name = symbol.name),
                )
            })
            .collect();
        for (lineno, message) in reports {
            self.diags
                .semantic(ErrorCode::FunctionNotDefined, lineno, message);
        }
    }

    // ----- expression type checking -----

    /// Type of an expression together with its l-value flag.
    pub(crate) fn typecheck_exp(&mut self, exp: &Node) -> (Option<Rc<Type>>, bool) {
        match exp.children.as_slice() {
            [lit] if matches!(lit.kind, Kind::Int(_)) => (Some(Type::int()), false),
            [lit] if matches!(lit.kind, Kind::Float(_)) => (Some(Type::float()), false),
            [id] if matches!(id.kind, Kind::Id(_)) => self.typecheck_var(id),
            [id, _lp, args, _rp] if args.kind == Kind::Args => {
                self.typecheck_func_call(id, Some(args))
            }
            [id, _lp, _rp] if matches!(id.kind, Kind::Id(_)) => self.typecheck_func_call(id, None),
            [lp, inner, _rp] if lp.is_tok(Tok::Lp) => self.typecheck_exp(inner),
            [minus, inner] if minus.is_tok(Tok::Minus) => self.typecheck_unop(inner, OpClass::Arith),
            [not, inner] if not.is_tok(Tok::Not) => self.typecheck_unop(inner, OpClass::Bool),
            [obj, dot, id] if dot.is_tok(Tok::Dot) => self.typecheck_struct_access(obj, dot, id),
            [arr, lb, idx, _rb] if lb.is_tok(Tok::Lb) => self.typecheck_array_access(arr, idx),
            [lhs, op, rhs] if op.is_tok(Tok::Assign) => self.typecheck_assign(lhs, rhs),
            [lhs, op, rhs] if matches!(op.kind, Kind::Relop(_)) => {
                self.typecheck_binop(lhs, rhs, OpClass::Rel)
            }
            [lhs, op, rhs] if op.is_tok(Tok::And) || op.is_tok(Tok::Or) => {
                self.typecheck_binop(lhs, rhs, OpClass::Bool)
            }
            [lhs, op, rhs]
                if op.is_tok(Tok::Plus)
                    || op.is_tok(Tok::Minus)
                    || op.is_tok(Tok::Star)
                    || op.is_tok(Tok::Div) =>
            {
                self.typecheck_binop(lhs, rhs, OpClass::Arith)
            }
            _ => (None, false),
        }
    }

    fn typecheck_var(&mut self, id: &Node) -> (Option<Rc<Type>>, bool) {
        let Some(name) = id.as_id() else {
            return (None, true);
        };
        match self.symtab.find(name) {
            Some(sym) => (Some(self.symtab.symbol(sym).ty.clone()), true),
            None => {
                self.diags.semantic(
                    ErrorCode::UndefinedVariable,
                    id.lineno,
                    format!("Undefined variable \"{name}\"."),
                );
                (None, true)
            }
        }
    }

    fn typecheck_struct_access(
        &mut self,
        obj: &Node,
        dot: &Node,
        id: &Node,
    ) -> (Option<Rc<Type>>, bool) {
        let (obj_ty, _) = self.typecheck_exp(obj);
        let Some(obj_ty) = obj_ty else {
            return (None, true);
        };
        let Some(def) = obj_ty.as_struct() else {
            self.diags.semantic(
                ErrorCode::IllegalFieldAccess,
                dot.lineno,
                "Illegal use of \".\".",
            );
            return (None, true);
        };
        let Some(name) = id.as_id() else {
            return (None, true);
        };
        match def.fields.find(name) {
            Some(ty) => (Some(ty.clone()), true),
            None => {
                self.diags.semantic(
                    ErrorCode::NonExistentField,
                    id.lineno,
                    format!("Non-existent field \"{name}\"."),
                );
                (None, true)
            }
        }
    }

    /// Both the array side and the index side are diagnosed independently;
    /// the element type is still returned whenever the array side is sound.
    fn typecheck_array_access(&mut self, arr: &Node, idx: &Node) -> (Option<Rc<Type>>, bool) {
        let (arr_ty, _) = self.typecheck_exp(arr);
        let (idx_ty, _) = self.typecheck_exp(idx);

        let mut arr_err = false;
        let elem = match &arr_ty {
            None => {
                arr_err = true;
                None
            }
            Some(ty) => match ty.as_array_elem() {
                Some(elem) => Some(elem.clone()),
                None => {
                    self.diags.semantic(
                        ErrorCode::NotAnArray,
                        arr.lineno,
                        format!("\"{}\" is not an array.", arr.repr()),
                    );
                    arr_err = true;
                    None
                }
            },
        };
        let idx_err = match &idx_ty {
            None => true,
            Some(ty) if !ty.is_int() => {
                self.diags.semantic(
                    ErrorCode::NonIntegerIndex,
                    idx.lineno,
                    format!("\"{}\" is not an integer.", idx.repr()),
                );
                true
            }
            Some(_) => false,
        };
        if arr_err || idx_err {
            return (if arr_err { None } else { elem }, true);
        }
        (elem, true)
    }

    fn typecheck_func_call(
        &mut self,
        id: &Node,
        args: Option<&Node>,
    ) -> (Option<Rc<Type>>, bool) {
        let Some(name) = id.as_id() else {
            return (None, false);
        };
        let Some(sym) = self.symtab.find(name) else {
            self.diags.semantic(
                ErrorCode::UndefinedFunction,
                id.lineno,
                format!("Undefined function \"{name}\"."),
            );
            return (None, false);
        };
        let ty = self.symtab.symbol(sym).ty.clone();
        let Some((ret, params)) = ty.as_func() else {
            self.diags.semantic(
                ErrorCode::NotAFunction,
                id.lineno,
                format!("\"{name}\" is not a function."),
            );
            return (None, false);
        };

        let arg_types = match args {
            Some(args) => match self.analyse_args(args) {
                Ok(types) => types,
                Err(()) => return (Some(ret.clone()), false),
            },
            None => vec![],
        };
        if params.len() != arg_types.len()
            || !params.iter().zip(&arg_types).all(|(p, a)| p == a)
        {
            self.diags.semantic(
                ErrorCode::ArgumentMismatch,
                id.lineno,
                format!(
                    "Function \"{name}({params})\" is not applicable for arguments \"({args})\".",
                    params = params.iter().join(", "),
                    args = arg_types.iter().join(", "),
                ),
            );
        }
        (Some(ret.clone()), false)
    }

    /// Collect the argument types; the first untypable argument aborts the
    /// collection so the caller falls back to the declared return type.
    fn analyse_args(&mut self, args: &Node) -> Result<Vec<Rc<Type>>, ()> {
        let mut types = Vec::new();
        let mut cur = args;
        loop {
            match cur.children.as_slice() {
                [exp] => {
                    types.push(self.typecheck_exp(exp).0.ok_or(())?);
                    return Ok(types);
                }
                [exp, _comma, next] => {
                    types.push(self.typecheck_exp(exp).0.ok_or(())?);
                    cur = next;
                }
                _ => return Ok(types),
            }
        }
    }

    fn typecheck_binop(&mut self, lhs: &Node, rhs: &Node, class: OpClass) -> (Option<Rc<Type>>, bool) {
        let (lt, _) = self.typecheck_exp(lhs);
        let (rt, _) = self.typecheck_exp(rhs);
        let (Some(lt), Some(rt)) = (lt, rt) else {
            return (None, false);
        };
        if lt != rt {
            self.diags.semantic(
                ErrorCode::OperandTypeMismatch,
                lhs.lineno,
                "Type mismatched for operands.",
            );
            return (None, false);
        }
        match class {
            OpClass::Arith => {
                if !lt.is_basic() {
                    self.diags.semantic(
                        ErrorCode::OperandTypeMismatch,
                        lhs.lineno,
                        "Type mismatched for the operator and operands. \
                         \"int\" or \"float\" is expected.",
                    );
                    return (None, false);
                }
                (Some(lt), false)
            }
            OpClass::Bool => {
                if !lt.is_int() {
                    self.diags.semantic(
                        ErrorCode::OperandTypeMismatch,
                        lhs.lineno,
                        "Type mismatched for the operator and operands. \
                         \"int\" is expected.",
                    );
                    return (None, false);
                }
                (Some(lt), false)
            }
            OpClass::Rel => {
                if !lt.is_basic() {
                    self.diags.semantic(
                        ErrorCode::OperandTypeMismatch,
                        lhs.lineno,
                        "Type mismatched for the operator and operands. \
                         \"int\" or \"float\" is expected.",
                    );
                    return (None, false);
                }
                (Some(Type::int()), false)
            }
        }
    }

    fn typecheck_unop(&mut self, exp: &Node, class: OpClass) -> (Option<Rc<Type>>, bool) {
        let (ty, _) = self.typecheck_exp(exp);
        let Some(ty) = ty else {
            return (None, false);
        };
        match class {
            OpClass::Bool => {
                if !ty.is_int() {
                    self.diags.semantic(
                        ErrorCode::OperandTypeMismatch,
                        exp.lineno,
                        "Type mismatched for the operator and the operand. \
                         \"int\" is expected.",
                    );
                    return (None, false);
                }
                (Some(ty), false)
            }
            _ => {
                if !ty.is_basic() {
                    self.diags.semantic(
                        ErrorCode::OperandTypeMismatch,
                        exp.lineno,
                        "Type mismatched for the operator and the operand. \
                         \"int\" or \"float\" is expected.",
                    );
                    return (None, false);
                }
                (Some(ty), false)
            }
        }
    }

    fn typecheck_assign(&mut self, lhs: &Node, rhs: &Node) -> (Option<Rc<Type>>, bool) {
        let (lt, l_is_lval) = self.typecheck_exp(lhs);
        let (rt, _) = self.typecheck_exp(rhs);
        if lt.is_some() && !l_is_lval {
            self.diags.semantic(
                ErrorCode::AssignToRvalue,
                lhs.lineno,
                "The left-hand side of an assignment must be a left value.",
            );
            return (None, false);
        }
        let (Some(lt), Some(rt)) = (lt, rt) else {
            return (None, false);
        };
        if lt != rt {
            self.diags.semantic(
                ErrorCode::AssignTypeMismatch,
                lhs.lineno,
                "Type mismatched for assignment.",
            );
            return (None, false);
        }
        if matches!(*lt, Type::Func { .. }) {
            self.diags.semantic(
                ErrorCode::OperandTypeMismatch,
                lhs.lineno,
                "Functions should not exist at any side of an assignment.",
            );
            return (None, false);
        }
        (Some(lt), false)
    }
}
