use cmm_ir::{BinOp, IdGen, Instruction, Operand, Program, RelOp};

#[test]
fn a_small_program_renders_to_the_canonical_text() {
    let mut vars = IdGen::new();
    let x = Operand::var(vars.next_id());
    let tmp = Operand::temp_var(&mut vars);

    let mut program = Program::new();
    program.push(Instruction::FuncDef("main".into()));
    program.push(Instruction::Read(x));
    program.push(Instruction::Arith {
        op: BinOp::Mul,
        target: tmp,
        lhs: x,
        rhs: Operand::Const(2),
    });
    program.push(Instruction::CondGoto {
        op: RelOp::Gt,
        lhs: tmp,
        rhs: Operand::Const(10),
        label: 1,
    });
    program.push(Instruction::Write(x));
    program.push(Instruction::Label(1));
    program.push(Instruction::Return(tmp));

    assert_eq!(
        program.to_string(),
        "FUNCTION main :\n\
         READ v1\n\
         t2 := v1 * #2\n\
         IF t2 > #10 GOTO L1\n\
         WRITE v1\n\
         LABEL L1 :\n\
         RETURN t2\n"
    );
}

#[test]
fn separate_generators_do_not_interfere() {
    let mut vars = IdGen::new();
    let mut labels = IdGen::new();
    assert_eq!(vars.next_id(), 1);
    assert_eq!(vars.next_id(), 2);
    assert_eq!(labels.next_id(), 1);
}
