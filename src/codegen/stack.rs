use super::asm_ast::{AsmInstruction, AsmInstructions, Operand};
use crate::ast::Identifier;

use std::collections::HashMap;

/// Assigns every distinct pseudo-register a 4-byte `%rbp`-relative slot and
/// reports the total size so the legalizer can size the frame. No pseudo
/// operand survives this pass.
pub(super) fn replace_pseudos(instructions: &mut AsmInstructions) -> i64 {
    let mut sa = StackAllocator::new();
    for inst in instructions.iter_mut() {
        match inst {
            AsmInstruction::Unary(_, operand)
            | AsmInstruction::Idiv(operand)
            | AsmInstruction::SetCC(_, operand)
            | AsmInstruction::Push(operand) => {
                sa.allocate_if_pseudo(operand);
            }
            AsmInstruction::Mov(src, dst)
            | AsmInstruction::Binary(_, src, dst)
            | AsmInstruction::Cmp(src, dst) => {
                sa.allocate_if_pseudo(src);
                sa.allocate_if_pseudo(dst);
            }
            _ => (),
        }
    }
    sa.offset
}

struct StackAllocator {
    offset: i64,
    map: HashMap<Identifier, i32>,
}

impl StackAllocator {
    fn new() -> Self {
        Self {
            offset: 0,
            map: HashMap::new(),
        }
    }

    fn allocate_if_pseudo(&mut self, operand: &mut Operand) {
        if let Operand::Pseudo(name) = operand {
            let offset = self.allocate(name.clone());
            *operand = Operand::Stack(offset);
        }
    }

    fn allocate(&mut self, name: Identifier) -> i32 {
        if let Some(offset) = self.map.get(&name) {
            return *offset;
        }
        self.offset += 4;
        let offset = -self.offset as i32;
        self.map.insert(name, offset);
        offset
    }
}
