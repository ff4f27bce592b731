//! Per-function stack-frame layout.

use cmm_ir::{Instruction, Operand};

use super::regs::{Reg, RegFile};

/// Stack home of one operand.
#[derive(Debug, Clone)]
pub struct VarInfo {
    /// The operand.
    pub op: Operand,
    /// Offset from `$fp`: negative for locals and spilled parameters,
    /// positive for parameters left on the caller's stack.
    pub offset: i32,
}

/// Frame layout of one function.
#[derive(Debug, Default)]
pub struct FrameLayout {
    vars: Vec<VarInfo>,
    total: i32,
}

impl FrameLayout {
    /// Assign every distinct operand of a function a stack slot, walking
    /// the instructions in order. The first four parameters additionally
    /// get register homes in `$a0..$a3`, marked dirty so a writeback
    /// persists the incoming values; parameters beyond four keep the
    /// caller-assigned positive offsets `8 + 4*(i-5)`.
    pub fn collect(run: &[Instruction], regs: &mut RegFile) -> Self {
        let mut layout = Self::default();
        let mut n_param = 0usize;
        for inst in run.iter().skip(1) {
            match inst {
                Instruction::FuncDef(_) => break,
                Instruction::Param(var) => {
                    n_param += 1;
                    if n_param <= 4 {
                        layout.try_add(var, 4);
                        let home = Reg::argument(n_param - 1);
                        regs.alloc(home, *var);
                        regs.set_dirty(home);
                    } else {
                        layout.vars.push(VarInfo {
                            op: *var,
                            offset: 8 + 4 * (n_param as i32 - 5),
                        });
                    }
                }
                Instruction::Dec { var, size } => layout.try_add(var, *size as i32),
                Instruction::Assign { lhs, rhs }
                | Instruction::Ref { lhs, rhs }
                | Instruction::Deref { lhs, rhs }
                | Instruction::DerefAssign { lhs, rhs } => {
                    layout.try_add(lhs, 4);
                    layout.try_add(rhs, 4);
                }
                Instruction::Arith {
                    target, lhs, rhs, ..
                } => {
                    layout.try_add(lhs, 4);
                    layout.try_add(rhs, 4);
                    layout.try_add(target, 4);
                }
                Instruction::CondGoto { lhs, rhs, .. } => {
                    layout.try_add(lhs, 4);
                    layout.try_add(rhs, 4);
                }
                Instruction::Return(var)
                | Instruction::Arg(var)
                | Instruction::Read(var)
                | Instruction::Write(var) => layout.try_add(var, 4),
                Instruction::Call { result, .. } => layout.try_add(result, 4),
                Instruction::Label(_) | Instruction::Goto(_) => {}
            }
        }
        layout
    }

    fn try_add(&mut self, op: &Operand, size: i32) {
        if op.is_const() || self.offset_of(op).is_some() {
            return;
        }
        self.total -= size;
        self.vars.push(VarInfo {
            op: *op,
            offset: self.total,
        });
    }

    /// FP-relative home of an operand.
    pub fn offset_of(&self, op: &Operand) -> Option<i32> {
        self.vars
            .iter()
            .find(|info| info.op == *op)
            .map(|info| info.offset)
    }

    /// Total downward adjustment the prologue applies to `$sp`.
    pub fn total(&self) -> i32 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmm_ir::BinOp;

    #[test]
    fn slots_grow_downward_and_deduplicate() {
        let run = vec![
            Instruction::FuncDef("f".into()),
            Instruction::Param(Operand::var(1)),
            Instruction::Dec {
                var: Operand::var(2),
                size: 40,
            },
            Instruction::Arith {
                op: BinOp::Add,
                target: Operand::Var { id: 3, temp: true },
                lhs: Operand::var(1),
                rhs: Operand::Const(1),
            },
        ];
        let mut regs = RegFile::new();
        let layout = FrameLayout::collect(&run, &mut regs);
        assert_eq!(layout.offset_of(&Operand::var(1)), Some(-4));
        assert_eq!(layout.offset_of(&Operand::var(2)), Some(-44));
        assert_eq!(layout.offset_of(&Operand::var(3)), Some(-48));
        assert_eq!(layout.total(), -48);
        assert_eq!(layout.offset_of(&Operand::Const(1)), None);
        // the parameter also has a register home, already dirty
        assert_eq!(regs.find(&Operand::var(1)), Some(Reg::A0));
        assert!(regs.is_dirty(Reg::A0));
    }

    #[test]
    fn late_parameters_keep_caller_offsets() {
        let mut run = vec![Instruction::FuncDef("f".into())];
        for id in 1..=6 {
            run.push(Instruction::Param(Operand::var(id)));
        }
        let mut regs = RegFile::new();
        let layout = FrameLayout::collect(&run, &mut regs);
        assert_eq!(layout.offset_of(&Operand::var(5)), Some(8));
        assert_eq!(layout.offset_of(&Operand::var(6)), Some(12));
        assert!(layout.offset_of(&Operand::var(4)).unwrap() < 0);
        assert_eq!(regs.find(&Operand::var(4)), Some(Reg::A3));
        assert_eq!(regs.find(&Operand::var(5)), None);
    }
}
