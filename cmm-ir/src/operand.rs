use core::fmt;

use crate::{IdGen, VarId};

/// Operand of a three-address instruction.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operand {
    /// A named variable or a temporary holding a value.
    Var {
        /// Process-unique variable id.
        id: VarId,
        /// Whether the variable was synthesised during translation.
        temp: bool,
    },
    /// The address of a variable, or a synthesised address.
    Addr {
        /// Process-unique variable id.
        id: VarId,
        /// Whether the address was synthesised during translation.
        temp: bool,
    },
    /// An integer constant.
    Const(i32),
}

impl Operand {
    /// Operand for the named variable `id`.
    pub const fn var(id: VarId) -> Self {
        Self::Var { id, temp: false }
    }

    /// Address operand for the named variable `id`.
    pub const fn addr(id: VarId) -> Self {
        Self::Addr { id, temp: false }
    }

    /// Fresh temporary variable operand.
    pub fn temp_var(ids: &mut IdGen) -> Self {
        Self::Var {
            id: ids.next_id(),
            temp: true,
        }
    }

    /// Fresh temporary address operand.
    pub fn temp_addr(ids: &mut IdGen) -> Self {
        Self::Addr {
            id: ids.next_id(),
            temp: true,
        }
    }

    /// Whether the operand is a constant.
    pub const fn is_const(&self) -> bool {
        matches!(self, Self::Const(_))
    }

    /// Whether the operand is an address.
    pub const fn is_addr(&self) -> bool {
        matches!(self, Self::Addr { .. })
    }

    /// Whether the operand was synthesised during translation.
    pub const fn is_temp(&self) -> bool {
        match self {
            Self::Var { temp, .. } | Self::Addr { temp, .. } => *temp,
            Self::Const(_) => false,
        }
    }

    /// The variable id, if the operand names one.
    pub const fn id(&self) -> Option<VarId> {
        match self {
            Self::Var { id, .. } | Self::Addr { id, .. } => Some(*id),
            Self::Const(_) => None,
        }
    }

    /// The constant value, if the operand is one.
    pub const fn as_const(&self) -> Option<i32> {
        match self {
            Self::Const(val) => Some(*val),
            _ => None,
        }
    }
}

/// `Var` and `Addr` compare equal on matching ids: they name the same
/// physical location, which is what the register allocator keys on.
impl PartialEq for Operand {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Var { id: a, .. } | Self::Addr { id: a, .. },
                Self::Var { id: b, .. } | Self::Addr { id: b, .. },
            ) => a == b,
            (Self::Const(a), Self::Const(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Operand {}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Var { id, temp } | Self::Addr { id, temp } => {
                write!(f, "{}{}", if *temp { 't' } else { 'v' }, id)
            }
            Self::Const(val) => write!(f, "#{val}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn var_and_addr_are_the_same_location() {
        assert_eq!(Operand::var(3), Operand::addr(3));
        assert_eq!(Operand::addr(3), Operand::var(3));
        assert_ne!(Operand::var(3), Operand::var(4));
        assert_ne!(Operand::var(3), Operand::Const(3));
        assert_eq!(Operand::Const(7), Operand::Const(7));
        assert_ne!(Operand::Const(7), Operand::Const(8));
    }

    #[test]
    fn temps_draw_fresh_ids() {
        let mut ids = IdGen::new();
        let a = Operand::temp_var(&mut ids);
        let b = Operand::temp_addr(&mut ids);
        assert!(a.is_temp() && b.is_temp());
        assert_ne!(a, b);
    }

    #[rstest]
    #[case(Operand::var(2), "v2")]
    #[case(Operand::addr(9), "v9")]
    #[case(Operand::Var { id: 5, temp: true }, "t5")]
    #[case(Operand::Addr { id: 5, temp: true }, "t5")]
    #[case(Operand::Const(42), "#42")]
    #[case(Operand::Const(-1), "#-1")]
    fn display(#[case] op: Operand, #[case] expected: &str) {
        assert_eq!(op.to_string(), expected);
    }
}
