//! Instruction set and code word decoding.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Words in `(-CODE_CMD_OFFS, CODE_CMD_OFFS)` are literals; `CODE_CMD_OFFS + i` is opcode `i`.
pub const CODE_CMD_OFFS: i32 = 1024;
/// Number of opcodes.
pub const CODE_COMMANDS: i32 = 30;
/// Bound of the values produced by `rand`.
pub const CODE_MAX_RAND: i32 = CODE_CMD_OFFS + CODE_COMMANDS;

/// Closed set of organism instructions, in encoding order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Step,
    Eat,
    Clone,
    See,
    DtoA,
    DtoB,
    AtoD,
    AtoB,
    Add,
    Sub,
    Mul,
    Div,
    Inc,
    Dec,
    Loop,
    IfDGA,
    IfDLA,
    IfDEA,
    Nop,
    MGet,
    MPut,
    Offs,
    Rand,
    Call,
    Func,
    Ret,
    End,
    Get,
    Put,
    Mix,
}

impl Opcode {
    pub const ALL: [Opcode; CODE_COMMANDS as usize] = [
        Opcode::Step,
        Opcode::Eat,
        Opcode::Clone,
        Opcode::See,
        Opcode::DtoA,
        Opcode::DtoB,
        Opcode::AtoD,
        Opcode::AtoB,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Inc,
        Opcode::Dec,
        Opcode::Loop,
        Opcode::IfDGA,
        Opcode::IfDLA,
        Opcode::IfDEA,
        Opcode::Nop,
        Opcode::MGet,
        Opcode::MPut,
        Opcode::Offs,
        Opcode::Rand,
        Opcode::Call,
        Opcode::Func,
        Opcode::Ret,
        Opcode::End,
        Opcode::Get,
        Opcode::Put,
        Opcode::Mix,
    ];

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Code word encoding this opcode.
    #[must_use]
    pub const fn word(self) -> i32 {
        CODE_CMD_OFFS + self as i32
    }

    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Step => "step",
            Opcode::Eat => "eat",
            Opcode::Clone => "clone",
            Opcode::See => "see",
            Opcode::DtoA => "dtoa",
            Opcode::DtoB => "dtob",
            Opcode::AtoD => "atod",
            Opcode::AtoB => "atob",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Div => "div",
            Opcode::Inc => "inc",
            Opcode::Dec => "dec",
            Opcode::Loop => "loop",
            Opcode::IfDGA => "ifdga",
            Opcode::IfDLA => "ifdla",
            Opcode::IfDEA => "ifdea",
            Opcode::Nop => "nop",
            Opcode::MGet => "mget",
            Opcode::MPut => "mput",
            Opcode::Offs => "offs",
            Opcode::Rand => "rand",
            Opcode::Call => "call",
            Opcode::Func => "func",
            Opcode::Ret => "ret",
            Opcode::End => "end",
            Opcode::Get => "get",
            Opcode::Put => "put",
            Opcode::Mix => "mix",
        }
    }

    /// Opcodes closed by a matching `end`.
    #[must_use]
    pub const fn is_block_opener(self) -> bool {
        matches!(
            self,
            Opcode::Loop | Opcode::IfDGA | Opcode::IfDLA | Opcode::IfDEA | Opcode::Func
        )
    }
}

/// One decoded code word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// Loads the value into `d`.
    Literal(i32),
    Op(Opcode),
    /// Words outside both bands; executed as `nop`.
    Invalid(i32),
}

impl Instruction {
    #[inline]
    #[must_use]
    pub fn decode(word: i32) -> Self {
        if word > -CODE_CMD_OFFS && word < CODE_CMD_OFFS {
            return Instruction::Literal(word);
        }
        word.checked_sub(CODE_CMD_OFFS)
            .and_then(|index| usize::try_from(index).ok())
            .and_then(Opcode::from_index)
            .map_or(Instruction::Invalid(word), Instruction::Op)
    }

    #[must_use]
    pub const fn encode(self) -> i32 {
        match self {
            Instruction::Literal(value) | Instruction::Invalid(value) => value,
            Instruction::Op(op) => op.word(),
        }
    }

    /// Returns the opcode, if this is one.
    #[must_use]
    pub const fn opcode(self) -> Option<Opcode> {
        match self {
            Instruction::Op(op) => Some(op),
            _ => None,
        }
    }
}

impl From<Opcode> for Instruction {
    fn from(op: Opcode) -> Self {
        Instruction::Op(op)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Literal(value) => write!(f, "{value}"),
            Instruction::Op(op) => f.write_str(op.mnemonic()),
            Instruction::Invalid(word) => write!(f, "?{word}"),
        }
    }
}

/// Encodes a program into code words.
#[must_use]
pub fn assemble(program: &[Instruction]) -> Vec<i32> {
    program.iter().map(|ins| ins.encode()).collect()
}

/// Renders code words as whitespace separated mnemonics.
#[must_use]
pub fn disassemble(code: &[i32]) -> String {
    code.iter()
        .map(|&word| Instruction::decode(word).to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_table_matches_encoding() {
        assert_eq!(Opcode::ALL.len(), CODE_COMMANDS as usize);
        for (index, op) in Opcode::ALL.iter().enumerate() {
            assert_eq!(*op as usize, index);
            assert_eq!(Instruction::decode(op.word()), Instruction::Op(*op));
        }
        assert_eq!(Opcode::Step.word(), 1024);
        assert_eq!(Opcode::Mix.word(), CODE_MAX_RAND - 1);
    }

    #[test]
    fn decode_bands() {
        assert_eq!(Instruction::decode(0), Instruction::Literal(0));
        assert_eq!(Instruction::decode(-1023), Instruction::Literal(-1023));
        assert_eq!(Instruction::decode(1023), Instruction::Literal(1023));
        assert_eq!(Instruction::decode(-1024), Instruction::Invalid(-1024));
        assert_eq!(Instruction::decode(CODE_MAX_RAND), Instruction::Invalid(CODE_MAX_RAND));
        assert_eq!(Instruction::decode(i32::MIN), Instruction::Invalid(i32::MIN));
        assert_eq!(Instruction::decode(i32::MIN + 1_023), Instruction::Invalid(i32::MIN + 1_023));
        assert_eq!(Instruction::decode(i32::MAX), Instruction::Invalid(i32::MAX));
    }

    #[test]
    fn disassemble_uses_mnemonics() {
        let code = assemble(&[
            Instruction::Literal(3),
            Opcode::Loop.into(),
            Opcode::Step.into(),
            Opcode::End.into(),
            Instruction::Invalid(-5000),
        ]);
        assert_eq!(disassemble(&code), "3 loop step end ?-5000");
        assert!(Opcode::Func.is_block_opener());
        assert!(!Opcode::End.is_block_opener());
    }
}
