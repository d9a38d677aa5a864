//! Block structure precomputed from an organism's code.

use crate::opcode::{Instruction, Opcode};

/// Jump targets, loop counters and function entry points for one genome.
///
/// `targets[i]` of a block opener is the line after its matching `end`;
/// `targets[i]` of an `end` is its opener.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JumpTable {
    targets: Vec<usize>,
    loops: Vec<i64>,
    functions: Vec<usize>,
}

impl JumpTable {
    #[must_use]
    pub fn build(code: &[i32]) -> Self {
        let len = code.len();
        let mut targets = vec![len; len];
        let mut functions = Vec::new();
        let mut open: Vec<usize> = Vec::new();

        for (line, &word) in code.iter().enumerate() {
            match Instruction::decode(word).opcode() {
                Some(op) if op.is_block_opener() => {
                    if op == Opcode::Func {
                        functions.push(line + 1);
                    }
                    open.push(line);
                }
                Some(Opcode::End) => match open.pop() {
                    Some(opener) => {
                        targets[opener] = line + 1;
                        targets[line] = opener;
                    }
                    None => targets[line] = line,
                },
                _ => {}
            }
        }

        Self {
            targets,
            loops: vec![-1; len],
            functions,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn target(&self, line: usize) -> usize {
        self.targets.get(line).copied().unwrap_or(line)
    }

    /// Loop counter of the `loop` at `line`; negative when not running.
    #[inline]
    #[must_use]
    pub fn counter(&self, line: usize) -> i64 {
        self.loops.get(line).copied().unwrap_or(-1)
    }

    #[inline]
    pub fn set_counter(&mut self, line: usize, value: i64) {
        if let Some(counter) = self.loops.get_mut(line) {
            *counter = value;
        }
    }

    /// Body start lines of every `func`, in code order.
    #[must_use]
    pub fn functions(&self) -> &[usize] {
        &self.functions
    }
}
