use core::fmt;

use crate::Instruction;

/// An append-only sequence of three-address instructions.
///
/// Instructions appear exactly in the order they were generated by the
/// translator's depth-first walk; the backend relies on that order for its
/// basic-block boundaries and for the argument runs preceding each call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    /// Create an empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction.
    pub fn push(&mut self, inst: Instruction) {
        self.instructions.push(inst);
    }

    /// All instructions, in generation order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the program holds no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The runs of instructions belonging to each function: every run starts
    /// at a [`FuncDef`](Instruction::FuncDef) and extends to the next one.
    pub fn functions(&self) -> impl Iterator<Item = &[Instruction]> {
        let starts: Vec<usize> = self
            .instructions
            .iter()
            .enumerate()
            .filter_map(|(i, inst)| matches!(inst, Instruction::FuncDef(_)).then_some(i))
            .collect();
        let len = self.instructions.len();
        let bounds: Vec<(usize, usize)> = starts
            .iter()
            .enumerate()
            .map(|(k, &start)| (start, starts.get(k + 1).copied().unwrap_or(len)))
            .collect();
        bounds
            .into_iter()
            .map(move |(start, end)| &self.instructions[start..end])
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for inst in &self.instructions {
            writeln!(f, "{inst}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Operand;

    fn sample() -> Program {
        let mut program = Program::new();
        program.push(Instruction::FuncDef("main".into()));
        program.push(Instruction::Return(Operand::Const(0)));
        program.push(Instruction::FuncDef("f".into()));
        program.push(Instruction::Param(Operand::var(1)));
        program.push(Instruction::Return(Operand::var(1)));
        program
    }

    #[test]
    fn functions_split_at_funcdef_boundaries() {
        let program = sample();
        let runs: Vec<&[Instruction]> = program.functions().collect();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].len(), 2);
        assert_eq!(runs[1].len(), 3);
        assert!(matches!(runs[1][0], Instruction::FuncDef(ref name) if name == "f"));
    }

    #[test]
    fn display_is_one_line_per_instruction() {
        let text = sample().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "FUNCTION main :",
                "RETURN #0",
                "FUNCTION f :",
                "PARAM v1",
                "RETURN v1",
            ]
        );
    }
}
