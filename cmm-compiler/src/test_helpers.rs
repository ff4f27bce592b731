//! Convenience constructors for syntax trees, shaped exactly as the parser
//! would shape them. Only compiled for tests and the `test-helpers`
//! feature.

#![allow(missing_docs)]

use cmm_ir::RelOp;

use crate::ast::{Kind, Node, Tok};
use crate::types::Basic;

fn tok(t: Tok) -> Node {
    Node::leaf(Kind::Token(t), 1)
}

fn inner(kind: Kind, children: Vec<Node>) -> Node {
    let lineno = children.first().map(|c| c.lineno).unwrap_or(1);
    Node::inner(kind, lineno, children)
}

/// Build a `[item, rest]` list chain (`DefList`, `StmtList`, `ExtDefList`).
fn chain(kind: Kind, mut items: Vec<Node>) -> Option<Node> {
    let last = items.pop()?;
    let mut list = inner(kind.clone(), vec![last]);
    while let Some(item) = items.pop() {
        list = inner(kind.clone(), vec![item, list]);
    }
    Some(list)
}

/// Build a `[item, COMMA, rest]` chain (`DecList`, `VarList`, `Args`,
/// `ExtDecList`).
fn comma_chain(kind: Kind, mut items: Vec<Node>) -> Option<Node> {
    let last = items.pop()?;
    let mut list = inner(kind.clone(), vec![last]);
    while let Some(item) = items.pop() {
        list = inner(kind.clone(), vec![item, tok(Tok::Comma), list]);
    }
    Some(list)
}

/// Set a node's line number, recursively.
pub fn on_line(mut node: Node, lineno: u32) -> Node {
    node.lineno = lineno;
    node.children = node
        .children
        .into_iter()
        .map(|child| on_line(child, lineno))
        .collect();
    node
}

// ----- program structure -----

pub fn program(ext_defs: Vec<Node>) -> Node {
    match chain(Kind::ExtDefList, ext_defs) {
        Some(list) => inner(Kind::Program, vec![list]),
        None => Node::inner(Kind::Program, 1, vec![]),
    }
}

pub fn spec_int() -> Node {
    inner(Kind::Specifier, vec![Node::leaf(Kind::TypeName(Basic::Int), 1)])
}

pub fn spec_float() -> Node {
    inner(
        Kind::Specifier,
        vec![Node::leaf(Kind::TypeName(Basic::Float), 1)],
    )
}

/// `struct Tag { defs }` or `struct { defs }` as a specifier.
pub fn spec_struct_def(tag: Option<&str>, defs: Vec<Node>) -> Node {
    let mut children = vec![tok(Tok::Struct)];
    if let Some(tag) = tag {
        children.push(inner(
            Kind::OptTag,
            vec![Node::leaf(Kind::Id(tag.into()), 1)],
        ));
    }
    children.push(tok(Tok::Lc));
    if let Some(list) = chain(Kind::DefList, defs) {
        children.push(list);
    }
    children.push(tok(Tok::Rc));
    inner(Kind::Specifier, vec![inner(Kind::StructSpecifier, children)])
}

/// `struct Tag` as a specifier.
pub fn spec_struct_tag(tag: &str) -> Node {
    inner(
        Kind::Specifier,
        vec![inner(
            Kind::StructSpecifier,
            vec![
                tok(Tok::Struct),
                inner(Kind::Tag, vec![Node::leaf(Kind::Id(tag.into()), 1)]),
            ],
        )],
    )
}

pub fn var_dec(name: &str) -> Node {
    inner(Kind::VarDec, vec![Node::leaf(Kind::Id(name.into()), 1)])
}

/// Append one array dimension: `inner[len]`.
pub fn array_of(inner_dec: Node, len: i32) -> Node {
    inner(
        Kind::VarDec,
        vec![
            inner_dec,
            tok(Tok::Lb),
            Node::leaf(Kind::Int(len), 1),
            tok(Tok::Rb),
        ],
    )
}

pub fn param(spec: Node, dec: Node) -> Node {
    inner(Kind::ParamDec, vec![spec, dec])
}

pub fn fun_dec(name: &str, params: Vec<Node>) -> Node {
    let mut children = vec![Node::leaf(Kind::Id(name.into()), 1), tok(Tok::Lp)];
    if let Some(list) = comma_chain(Kind::VarList, params) {
        children.push(list);
    }
    children.push(tok(Tok::Rp));
    inner(Kind::FunDec, children)
}

/// `spec f(...) { ... }`
pub fn func_def(spec: Node, dec: Node, body: Node) -> Node {
    inner(Kind::ExtDef, vec![spec, dec, body])
}

/// `spec f(...);`
pub fn func_decl(spec: Node, dec: Node) -> Node {
    inner(Kind::ExtDef, vec![spec, dec, tok(Tok::Semi)])
}

/// `spec v1, v2;` at file scope.
pub fn global_vars(spec: Node, decs: Vec<Node>) -> Node {
    let mut children = vec![spec];
    if let Some(list) = comma_chain(Kind::ExtDecList, decs) {
        children.push(list);
    }
    children.push(tok(Tok::Semi));
    inner(Kind::ExtDef, children)
}

/// `spec;` (a bare structure definition).
pub fn bare_spec(spec: Node) -> Node {
    inner(Kind::ExtDef, vec![spec, tok(Tok::Semi)])
}

/// `{ defs stmts }`
pub fn body(defs: Vec<Node>, stmts: Vec<Node>) -> Node {
    let mut children = vec![tok(Tok::Lc)];
    if let Some(list) = chain(Kind::DefList, defs) {
        children.push(list);
    }
    if let Some(list) = chain(Kind::StmtList, stmts) {
        children.push(list);
    }
    children.push(tok(Tok::Rc));
    inner(Kind::CompSt, children)
}

/// `spec dec1, dec2;` as a local definition.
pub fn def(spec: Node, decs: Vec<Node>) -> Node {
    let mut children = vec![spec];
    if let Some(list) = comma_chain(Kind::DecList, decs) {
        children.push(list);
    }
    children.push(tok(Tok::Semi));
    inner(Kind::Def, children)
}

pub fn dec(var: Node) -> Node {
    inner(Kind::Dec, vec![var])
}

pub fn dec_init(var: Node, exp: Node) -> Node {
    inner(Kind::Dec, vec![var, tok(Tok::Assign), exp])
}

// ----- statements -----

pub fn stmt_exp(exp: Node) -> Node {
    inner(Kind::Stmt, vec![exp, tok(Tok::Semi)])
}

pub fn stmt_block(comp: Node) -> Node {
    inner(Kind::Stmt, vec![comp])
}

pub fn stmt_return(exp: Node) -> Node {
    inner(Kind::Stmt, vec![tok(Tok::Return), exp, tok(Tok::Semi)])
}

pub fn stmt_if(cond: Node, then: Node) -> Node {
    inner(
        Kind::Stmt,
        vec![tok(Tok::If), tok(Tok::Lp), cond, tok(Tok::Rp), then],
    )
}

pub fn stmt_if_else(cond: Node, then: Node, otherwise: Node) -> Node {
    inner(
        Kind::Stmt,
        vec![
            tok(Tok::If),
            tok(Tok::Lp),
            cond,
            tok(Tok::Rp),
            then,
            tok(Tok::Else),
            otherwise,
        ],
    )
}

pub fn stmt_while(cond: Node, body: Node) -> Node {
    inner(
        Kind::Stmt,
        vec![tok(Tok::While), tok(Tok::Lp), cond, tok(Tok::Rp), body],
    )
}

// ----- expressions -----

pub fn int_exp(val: i32) -> Node {
    inner(Kind::Exp, vec![Node::leaf(Kind::Int(val), 1)])
}

pub fn float_exp(val: f32) -> Node {
    inner(Kind::Exp, vec![Node::leaf(Kind::Float(val), 1)])
}

pub fn var_exp(name: &str) -> Node {
    inner(Kind::Exp, vec![Node::leaf(Kind::Id(name.into()), 1)])
}

pub fn paren(exp: Node) -> Node {
    inner(Kind::Exp, vec![tok(Tok::Lp), exp, tok(Tok::Rp)])
}

pub fn assign(lhs: Node, rhs: Node) -> Node {
    inner(Kind::Exp, vec![lhs, tok(Tok::Assign), rhs])
}

fn binary(lhs: Node, op: Tok, rhs: Node) -> Node {
    inner(Kind::Exp, vec![lhs, tok(op), rhs])
}

pub fn add(lhs: Node, rhs: Node) -> Node {
    binary(lhs, Tok::Plus, rhs)
}

pub fn sub(lhs: Node, rhs: Node) -> Node {
    binary(lhs, Tok::Minus, rhs)
}

pub fn mul(lhs: Node, rhs: Node) -> Node {
    binary(lhs, Tok::Star, rhs)
}

pub fn div(lhs: Node, rhs: Node) -> Node {
    binary(lhs, Tok::Div, rhs)
}

pub fn and(lhs: Node, rhs: Node) -> Node {
    binary(lhs, Tok::And, rhs)
}

pub fn or(lhs: Node, rhs: Node) -> Node {
    binary(lhs, Tok::Or, rhs)
}

pub fn rel(lhs: Node, op: RelOp, rhs: Node) -> Node {
    inner(Kind::Exp, vec![lhs, Node::leaf(Kind::Relop(op), 1), rhs])
}

pub fn not(exp: Node) -> Node {
    inner(Kind::Exp, vec![tok(Tok::Not), exp])
}

pub fn neg(exp: Node) -> Node {
    inner(Kind::Exp, vec![tok(Tok::Minus), exp])
}

pub fn call(name: &str, args: Vec<Node>) -> Node {
    let mut children = vec![Node::leaf(Kind::Id(name.into()), 1), tok(Tok::Lp)];
    if let Some(list) = comma_chain(Kind::Args, args) {
        children.push(list);
    }
    children.push(tok(Tok::Rp));
    inner(Kind::Exp, children)
}

pub fn index(arr: Node, idx: Node) -> Node {
    inner(Kind::Exp, vec![arr, tok(Tok::Lb), idx, tok(Tok::Rb)])
}

pub fn field(obj: Node, name: &str) -> Node {
    inner(
        Kind::Exp,
        vec![obj, tok(Tok::Dot), Node::leaf(Kind::Id(name.into()), 1)],
    )
}
