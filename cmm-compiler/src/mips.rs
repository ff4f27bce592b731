//! MIPS-32 code generation in SPIM flavour.
//!
//! Each function is compiled independently: a frame-layout pass assigns
//! every operand a stack home, then the instructions are emitted with a
//! local register allocator. Registers are flushed to their stack homes at
//! every basic-block boundary and around every call, so values never cross
//! a control-flow edge in a register.

mod frame;
mod regs;

pub use frame::{FrameLayout, VarInfo};
pub use regs::{Reg, RegFile, RegFlags};

use std::io::{self, Write};

use cmm_ir::{BinOp, Instruction, Operand, Program, RelOp};
use tracing::trace;

/// Hand-written runtime preamble: the data strings and the syscall-based
/// `read`/`write` routines. Emitted before the translated program.
const PREAMBLE: &str = "\
.data
_prompt: .asciiz \"Enter an integer:\"
_ret: .asciiz \"\\n\"
.globl main
.text
read:
li $v0, 4
la $a0, _prompt
syscall
li $v0, 5
syscall
jr $ra
write:
li $v0, 1
syscall
li $v0, 4
la $a0, _ret
syscall
move $v0, $0
jr $ra
";

/// Emit assembly for a whole IR program.
pub fn gen_mips<W: Write>(program: &Program, out: &mut W) -> io::Result<()> {
    out.write_all(PREAMBLE.as_bytes())?;
    for run in program.functions() {
        FuncGen::new(out).gen(run)?;
    }
    Ok(())
}

const fn branch_of(op: RelOp) -> &'static str {
    match op {
        RelOp::Eq => "beq",
        RelOp::Ne => "bne",
        RelOp::Lt => "blt",
        RelOp::Le => "ble",
        RelOp::Gt => "bgt",
        RelOp::Ge => "bge",
    }
}

/// Code generator for one function.
struct FuncGen<'w, W> {
    out: &'w mut W,
    regs: RegFile,
    frame: FrameLayout,
    /// Pending `ARG` run, in stream order (last source argument first).
    args: Vec<Operand>,
}

impl<'w, W: Write> FuncGen<'w, W> {
    fn new(out: &'w mut W) -> Self {
        Self {
            out,
            regs: RegFile::new(),
            frame: FrameLayout::default(),
            args: Vec::new(),
        }
    }

    fn gen(mut self, run: &[Instruction]) -> io::Result<()> {
        let Some((Instruction::FuncDef(name), body)) = run.split_first() else {
            return Ok(());
        };
        self.frame = FrameLayout::collect(run, &mut self.regs);
        trace!(function = %name, frame = self.frame.total(), "generating");

        writeln!(self.out, "{name}:")?;
        self.push_reg(Reg::Fp)?;
        writeln!(self.out, "move $fp, $sp")?;
        writeln!(self.out, "addi $sp, $sp, {}", self.frame.total())?;

        for inst in body {
            self.gen_inst(inst)?;
        }
        Ok(())
    }

    fn gen_inst(&mut self, inst: &Instruction) -> io::Result<()> {
        match inst {
            Instruction::FuncDef(_) => Ok(()),
            Instruction::Dec { .. } | Instruction::Param(_) => Ok(()),
            Instruction::Label(label) => {
                self.writeback_all()?;
                writeln!(self.out, "L{label}:")
            }
            Instruction::Assign { lhs, rhs } => self.gen_assign(lhs, rhs),
            Instruction::Arith {
                op,
                target,
                lhs,
                rhs,
            } => self.gen_arith(*op, target, lhs, rhs),
            Instruction::Ref { lhs, rhs } => {
                let offset = self.frame.offset_of(rhs).unwrap_or(0);
                let rd = self.get_reg(lhs, true)?;
                writeln!(self.out, "addi ${rd}, $fp, {offset}")?;
                self.regs.set_dirty(rd);
                Ok(())
            }
            Instruction::Deref { lhs, rhs } => {
                let rs = self.get_reg(rhs, false)?;
                self.regs.lock(rs);
                let rd = self.get_reg(lhs, true)?;
                self.regs.unlock(rs);
                writeln!(self.out, "lw ${rd}, 0(${rs})")?;
                self.regs.set_dirty(rd);
                Ok(())
            }
            Instruction::DerefAssign { lhs, rhs } => {
                let ra = self.get_reg(lhs, false)?;
                self.regs.lock(ra);
                let rv = self.get_reg(rhs, false)?;
                self.regs.unlock(ra);
                writeln!(self.out, "sw ${rv}, 0(${ra})")
            }
            Instruction::Goto(label) => {
                self.writeback_all()?;
                writeln!(self.out, "j L{label}")
            }
            Instruction::CondGoto {
                op,
                lhs,
                rhs,
                label,
            } => {
                let rl = self.get_reg(lhs, false)?;
                self.regs.lock(rl);
                let rr = self.get_reg(rhs, false)?;
                self.regs.unlock(rl);
                self.writeback_all()?;
                writeln!(self.out, "{} ${rl}, ${rr}, L{label}", branch_of(*op))
            }
            Instruction::Return(val) => {
                if let Some(known) = val.as_const() {
                    writeln!(self.out, "li $v0, {known}")?;
                } else {
                    let rv = self.get_reg(val, false)?;
                    writeln!(self.out, "move $v0, ${rv}")?;
                }
                writeln!(self.out, "move $sp, $fp")?;
                self.pop_reg(Reg::Fp)?;
                writeln!(self.out, "jr $ra")
            }
            Instruction::Arg(arg) => {
                self.args.push(*arg);
                Ok(())
            }
            Instruction::Call { name, result } => self.gen_call(name, result),
            Instruction::Read(var) => {
                self.writeback_all()?;
                self.push_reg(Reg::Ra)?;
                writeln!(self.out, "jal read")?;
                self.pop_reg(Reg::Ra)?;
                let rd = self.get_reg(var, true)?;
                writeln!(self.out, "move ${rd}, $v0")?;
                self.regs.set_dirty(rd);
                Ok(())
            }
            Instruction::Write(val) => {
                if let Some(known) = val.as_const() {
                    self.writeback_all()?;
                    writeln!(self.out, "li $a0, {known}")?;
                } else {
                    let rv = self.get_reg(val, false)?;
                    self.writeback_all()?;
                    writeln!(self.out, "move $a0, ${rv}")?;
                }
                self.push_reg(Reg::Ra)?;
                writeln!(self.out, "jal write")?;
                self.pop_reg(Reg::Ra)
            }
        }
    }

    fn gen_assign(&mut self, lhs: &Operand, rhs: &Operand) -> io::Result<()> {
        if let Some(known) = rhs.as_const() {
            let rd = self.get_reg(lhs, true)?;
            writeln!(self.out, "li ${rd}, {known}")?;
            self.regs.set_dirty(rd);
            return Ok(());
        }
        let rs = self.get_reg(rhs, false)?;
        self.regs.lock(rs);
        let rd = self.get_reg(lhs, true)?;
        self.regs.unlock(rs);
        writeln!(self.out, "move ${rd}, ${rs}")?;
        self.regs.set_dirty(rd);
        Ok(())
    }

    fn gen_arith(
        &mut self,
        op: BinOp,
        target: &Operand,
        lhs: &Operand,
        rhs: &Operand,
    ) -> io::Result<()> {
        // Immediate forms; a fully constant operation never reaches the
        // backend, the translator folds it.
        match (op, lhs.as_const(), rhs.as_const()) {
            (BinOp::Add, Some(known), None) => return self.gen_addi(target, rhs, known),
            (BinOp::Add, None, Some(known)) => return self.gen_addi(target, lhs, known),
            (BinOp::Sub, None, Some(known)) => {
                return self.gen_addi(target, lhs, known.wrapping_neg())
            }
            _ => {}
        }

        let rs = self.get_reg(lhs, false)?;
        self.regs.lock(rs);
        let rt = self.get_reg(rhs, false)?;
        self.regs.lock(rt);
        let rd = self.get_reg(target, true)?;
        self.regs.unlock(rs);
        self.regs.unlock(rt);
        match op {
            BinOp::Add => writeln!(self.out, "add ${rd}, ${rs}, ${rt}")?,
            BinOp::Sub => writeln!(self.out, "sub ${rd}, ${rs}, ${rt}")?,
            BinOp::Mul => writeln!(self.out, "mul ${rd}, ${rs}, ${rt}")?,
            BinOp::Div => {
                writeln!(self.out, "div ${rs}, ${rt}")?;
                writeln!(self.out, "mflo ${rd}")?;
            }
        }
        self.regs.set_dirty(rd);
        Ok(())
    }

    fn gen_addi(&mut self, target: &Operand, src: &Operand, imm: i32) -> io::Result<()> {
        let rs = self.get_reg(src, false)?;
        self.regs.lock(rs);
        let rd = self.get_reg(target, true)?;
        self.regs.unlock(rs);
        writeln!(self.out, "addi ${rd}, ${rs}, {imm}")?;
        self.regs.set_dirty(rd);
        Ok(())
    }

    /// Place the pending arguments and perform the call. The `ARG` run is
    /// in reverse source order, so walking it forward pushes the tail
    /// arguments first and fills `$a3` down to `$a0` last; argument `i`
    /// beyond the fourth ends up at `8 + 4*(i-5)` above the callee's frame
    /// pointer.
    fn gen_call(&mut self, name: &str, result: &Operand) -> io::Result<()> {
        self.writeback_all()?;
        let args = std::mem::take(&mut self.args);
        let count = args.len();
        for (k, arg) in args.iter().enumerate() {
            let i = count - k;
            if i <= 4 {
                self.load_into(Reg::argument(i - 1), arg)?;
            } else {
                self.load_into(Reg::T0, arg)?;
                self.push_reg(Reg::T0)?;
            }
        }
        self.push_reg(Reg::Ra)?;
        writeln!(self.out, "jal {name}")?;
        self.pop_reg(Reg::Ra)?;
        if count > 4 {
            writeln!(self.out, "addi $sp, $sp, {}", 4 * (count as i32 - 4))?;
        }
        let rd = self.get_reg(result, true)?;
        writeln!(self.out, "move ${rd}, $v0")?;
        self.regs.set_dirty(rd);
        Ok(())
    }

    /// Acquire a register for an operand. A resident operand is a hit; an
    /// empty register is filled (loading unless the caller is about to
    /// write it); otherwise the cheapest victim is written back and
    /// evicted.
    fn get_reg(&mut self, op: &Operand, for_write: bool) -> io::Result<Reg> {
        if let Some(reg) = self.regs.find(op) {
            return Ok(reg);
        }
        let reg = match self.regs.find_empty() {
            Some(reg) => reg,
            None => {
                let victim = self
                    .regs
                    .find_victim()
                    .expect("locked registers never cover the whole candidate window");
                self.spill(victim)?;
                victim
            }
        };
        self.regs.alloc(reg, *op);
        if !for_write {
            self.load_into(reg, op)?;
        }
        Ok(reg)
    }

    /// Store a register's value back to its stack home if needed, then
    /// empty it.
    fn spill(&mut self, reg: Reg) -> io::Result<()> {
        if let Some(op) = self.regs.loaded(reg).copied() {
            if self.regs.is_dirty(reg) && !op.is_const() {
                if let Some(offset) = self.frame.offset_of(&op) {
                    writeln!(self.out, "sw ${reg}, {offset}($fp)")?;
                }
            }
        }
        self.regs.free(reg);
        Ok(())
    }

    /// Flush every allocatable register and clear residency; run at every
    /// basic-block boundary and around calls.
    fn writeback_all(&mut self) -> io::Result<()> {
        for reg in Reg::allocatable() {
            if !self.regs.is_empty(reg) {
                self.spill(reg)?;
            }
        }
        Ok(())
    }

    /// Emit a load of an operand's value into a specific register without
    /// touching residency.
    fn load_into(&mut self, reg: Reg, op: &Operand) -> io::Result<()> {
        if let Some(known) = op.as_const() {
            writeln!(self.out, "li ${reg}, {known}")
        } else {
            let offset = self.frame.offset_of(op).unwrap_or(0);
            writeln!(self.out, "lw ${reg}, {offset}($fp)")
        }
    }

    fn push_reg(&mut self, reg: Reg) -> io::Result<()> {
        writeln!(self.out, "addi $sp, $sp, -4")?;
        writeln!(self.out, "sw ${reg}, 0($sp)")
    }

    fn pop_reg(&mut self, reg: Reg) -> io::Result<()> {
        writeln!(self.out, "lw ${reg}, 0($sp)")?;
        writeln!(self.out, "addi $sp, $sp, 4")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit(program: &Program) -> String {
        let mut out = Vec::new();
        gen_mips(program, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn body(program: &Program) -> Vec<String> {
        emit(program)
            .lines()
            .skip(PREAMBLE.lines().count())
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn preamble_is_emitted_verbatim() {
        let text = emit(&Program::new());
        assert!(text.starts_with(".data\n_prompt: .asciiz \"Enter an integer:\"\n"));
        assert!(text.contains("read:\nli $v0, 4\nla $a0, _prompt\nsyscall\nli $v0, 5\nsyscall\njr $ra\n"));
        assert!(text.ends_with("move $v0, $0\njr $ra\n"));
    }

    #[test]
    fn trivial_function_has_prologue_and_epilogue() {
        let mut program = Program::new();
        program.push(Instruction::FuncDef("main".into()));
        program.push(Instruction::Return(Operand::Const(0)));
        assert_eq!(
            body(&program),
            [
                "main:",
                "addi $sp, $sp, -4",
                "sw $fp, 0($sp)",
                "move $fp, $sp",
                "addi $sp, $sp, 0",
                "li $v0, 0",
                "move $sp, $fp",
                "lw $fp, 0($sp)",
                "addi $sp, $sp, 4",
                "jr $ra",
            ]
        );
    }

    #[test]
    fn assignment_and_arith_use_immediate_forms() {
        let mut program = Program::new();
        program.push(Instruction::FuncDef("f".into()));
        program.push(Instruction::Assign {
            lhs: Operand::var(1),
            rhs: Operand::Const(5),
        });
        program.push(Instruction::Arith {
            op: BinOp::Add,
            target: Operand::var(2),
            lhs: Operand::var(1),
            rhs: Operand::Const(3),
        });
        program.push(Instruction::Return(Operand::var(2)));
        let lines = body(&program);
        assert!(lines.contains(&"li $t0, 5".to_string()));
        assert!(lines.contains(&"addi $t1, $t0, 3".to_string()));
    }

    #[test]
    fn labels_and_branches_flush_registers() {
        let mut program = Program::new();
        program.push(Instruction::FuncDef("f".into()));
        program.push(Instruction::Assign {
            lhs: Operand::var(1),
            rhs: Operand::Const(1),
        });
        program.push(Instruction::CondGoto {
            op: RelOp::Lt,
            lhs: Operand::var(1),
            rhs: Operand::Const(0),
            label: 1,
        });
        program.push(Instruction::Label(1));
        let lines = body(&program);
        // v1 is dirty in $t0, so the pre-branch writeback stores it
        let sw = lines
            .iter()
            .position(|line| line == "sw $t0, -4($fp)")
            .unwrap();
        let branch = lines
            .iter()
            .position(|line| line == "blt $t0, $t1, L1")
            .unwrap();
        assert!(sw < branch);
        assert_eq!(lines.last().unwrap(), "L1:");
    }

    #[test]
    fn call_places_register_arguments_in_source_order() {
        // f(v1, v2): the ARG run is reversed in the stream
        let mut program = Program::new();
        program.push(Instruction::FuncDef("caller".into()));
        program.push(Instruction::Assign {
            lhs: Operand::var(1),
            rhs: Operand::Const(10),
        });
        program.push(Instruction::Assign {
            lhs: Operand::var(2),
            rhs: Operand::Const(20),
        });
        program.push(Instruction::Arg(Operand::var(2)));
        program.push(Instruction::Arg(Operand::var(1)));
        program.push(Instruction::Call {
            name: "f".into(),
            result: Operand::Var { id: 3, temp: true },
        });
        let lines = body(&program);
        let a0 = lines
            .iter()
            .position(|line| line == "lw $a0, -4($fp)")
            .unwrap();
        let a1 = lines
            .iter()
            .position(|line| line == "lw $a1, -8($fp)")
            .unwrap();
        let jal = lines.iter().position(|line| line == "jal f").unwrap();
        assert!(a1 < a0, "tail arguments are placed first");
        assert!(a0 < jal);
        let ra_save = lines
            .iter()
            .position(|line| line == "sw $ra, 0($sp)")
            .unwrap();
        assert!(ra_save < jal && jal < lines.len());
        assert!(lines.contains(&"move $t0, $v0".to_string()));
    }

    #[test]
    fn read_and_write_wrap_syscall_stubs() {
        let mut program = Program::new();
        program.push(Instruction::FuncDef("main".into()));
        program.push(Instruction::Read(Operand::var(1)));
        program.push(Instruction::Write(Operand::var(1)));
        let lines = body(&program);
        let jal_read = lines.iter().position(|line| line == "jal read").unwrap();
        let move_ret = lines
            .iter()
            .position(|line| line == "move $t0, $v0")
            .unwrap();
        assert!(jal_read < move_ret);
        let move_arg = lines
            .iter()
            .position(|line| line == "move $a0, $t0")
            .unwrap();
        let jal_write = lines.iter().position(|line| line == "jal write").unwrap();
        assert!(move_ret < move_arg && move_arg < jal_write);
    }
}
