use core::fmt;

use crate::{BinOp, LabelId, Operand, RelOp};

/// A three-address instruction.
///
/// Every variant keeps at most three operand fields; the [`Display`]
/// implementation renders the canonical one-line textual form.
///
/// [`Display`]: fmt::Display
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Instruction {
    /// Jump target, printed `LABEL Ln :`.
    Label(LabelId),
    /// Start of a function body, printed `FUNCTION name :`.
    FuncDef(String),
    /// `lhs := rhs`
    Assign {
        /// Destination.
        lhs: Operand,
        /// Source.
        rhs: Operand,
    },
    /// `target := lhs op rhs`
    Arith {
        /// Arithmetic operator.
        op: BinOp,
        /// Destination.
        target: Operand,
        /// Left source.
        lhs: Operand,
        /// Right source.
        rhs: Operand,
    },
    /// `lhs := &rhs` — take the address of a variable's storage.
    Ref {
        /// Destination address.
        lhs: Operand,
        /// Variable whose storage is referenced.
        rhs: Operand,
    },
    /// `lhs := *rhs` — load through an address.
    Deref {
        /// Destination.
        lhs: Operand,
        /// Source address.
        rhs: Operand,
    },
    /// `*lhs := rhs` — store through the address `lhs`.
    DerefAssign {
        /// Destination address.
        lhs: Operand,
        /// Value stored.
        rhs: Operand,
    },
    /// Unconditional jump, printed `GOTO Ln`.
    Goto(LabelId),
    /// Conditional jump, printed `IF lhs relop rhs GOTO Ln`.
    CondGoto {
        /// Relational operator.
        op: RelOp,
        /// Left comparand.
        lhs: Operand,
        /// Right comparand.
        rhs: Operand,
        /// Taken target.
        label: LabelId,
    },
    /// Return from the current function.
    Return(Operand),
    /// Reserve `size` bytes of local storage for `var`, printed `DEC v N`.
    Dec {
        /// Variable naming the storage.
        var: Operand,
        /// Byte size of the storage.
        size: u32,
    },
    /// Outgoing call argument.
    Arg(Operand),
    /// Call a function, printed `result := CALL name`.
    Call {
        /// Callee name.
        name: String,
        /// Destination of the returned value.
        result: Operand,
    },
    /// Incoming parameter declaration.
    Param(Operand),
    /// Read an integer from the input into `var`.
    Read(Operand),
    /// Write an integer value to the output.
    Write(Operand),
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Label(label) => write!(f, "LABEL L{label} :"),
            Self::FuncDef(name) => write!(f, "FUNCTION {name} :"),
            Self::Assign { lhs, rhs } => write!(f, "{lhs} := {rhs}"),
            Self::Arith {
                op,
                target,
                lhs,
                rhs,
            } => write!(f, "{target} := {lhs} {op} {rhs}"),
            Self::Ref { lhs, rhs } => write!(f, "{lhs} := &{rhs}"),
            Self::Deref { lhs, rhs } => write!(f, "{lhs} := *{rhs}"),
            Self::DerefAssign { lhs, rhs } => write!(f, "*{lhs} := {rhs}"),
            Self::Goto(label) => write!(f, "GOTO L{label}"),
            Self::CondGoto {
                op,
                lhs,
                rhs,
                label,
            } => write!(f, "IF {lhs} {op} {rhs} GOTO L{label}"),
            Self::Return(val) => write!(f, "RETURN {val}"),
            Self::Dec { var, size } => write!(f, "DEC {var} {size}"),
            Self::Arg(arg) => write!(f, "ARG {arg}"),
            Self::Call { name, result } => write!(f, "{result} := CALL {name}"),
            Self::Param(var) => write!(f, "PARAM {var}"),
            Self::Read(var) => write!(f, "READ {var}"),
            Self::Write(val) => write!(f, "WRITE {val}"),
        }
    }
}
