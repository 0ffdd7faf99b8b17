use super::asm_ast::{AsmInstruction, AsmInstructions, Operand, Register};

/// Removes every instruction matching `predicate` and splices the fixer's
/// replacement sequence in its place.
fn fix_with_fixer(
    instructions: &mut AsmInstructions,
    predicate: fn(&AsmInstruction) -> bool,
    fixer: fn(AsmInstruction) -> AsmInstructions,
) {
    let indexes: Vec<_> = instructions
        .iter()
        .enumerate()
        .filter(|(_, i)| predicate(i))
        .map(|(i, _)| i)
        .collect();

    let mut count = 0;
    for i in indexes {
        let instr = instructions.remove(i + count);
        let fixed = fixer(instr);
        for instr in fixed {
            instructions.insert(i + count, instr);
            count += 1;
        }
        count -= 1;
    }
}

// A shift count living in memory moves through %cl; the count itself is
// untouched, so storing it back is a plain copy.
fn fix_shift_count(instruction: AsmInstruction) -> AsmInstructions {
    let AsmInstruction::Binary(op, count, dst) = instruction else {
        unreachable!("bad fix predicate for fix_shift_count")
    };
    let cx = Operand::Reg(Register::CX);
    vec![
        AsmInstruction::Mov(count.clone(), cx.clone()),
        AsmInstruction::Binary(op, cx.clone(), dst),
        AsmInstruction::Mov(cx, count),
    ]
}

// imul cannot write to memory: compute in %r11d, store back.
fn fix_imul(instruction: AsmInstruction) -> AsmInstructions {
    let AsmInstruction::Binary(op, src, dst) = instruction else {
        unreachable!("bad fix predicate for fix_imul")
    };
    let r11 = Operand::Reg(Register::R11);
    vec![
        AsmInstruction::Mov(dst.clone(), r11.clone()),
        AsmInstruction::Binary(op, src, r11.clone()),
        AsmInstruction::Mov(r11, dst),
    ]
}

fn fix_idiv(instruction: AsmInstruction) -> AsmInstructions {
    let AsmInstruction::Idiv(operand) = instruction else {
        unreachable!("bad fix predicate for fix_idiv")
    };
    let r10 = Operand::Reg(Register::R10);
    vec![
        AsmInstruction::Mov(operand, r10.clone()),
        AsmInstruction::Idiv(r10),
    ]
}

// No instruction may take two memory operands; the source goes through
// %r10d.
fn fix_two_memoperands(instruction: AsmInstruction) -> AsmInstructions {
    let r10 = Operand::Reg(Register::R10);
    let (mov, snd) = match instruction {
        AsmInstruction::Mov(src, dst) => (
            AsmInstruction::Mov(src, r10.clone()),
            AsmInstruction::Mov(r10, dst),
        ),
        AsmInstruction::Binary(op, src, dst) => (
            AsmInstruction::Mov(src, r10.clone()),
            AsmInstruction::Binary(op, r10, dst),
        ),
        AsmInstruction::Cmp(src, dst) => (
            AsmInstruction::Mov(src, r10.clone()),
            AsmInstruction::Cmp(r10, dst),
        ),
        _ => unreachable!("bad fix predicate for fix_two_memoperands"),
    };
    vec![mov, snd]
}

fn fix_binary_sndimm(instruction: AsmInstruction) -> AsmInstructions {
    let AsmInstruction::Binary(op, src, dst) = instruction else {
        unreachable!("bad fix predicate for fix_binary_sndimm")
    };
    let r11 = Operand::Reg(Register::R11);
    vec![
        AsmInstruction::Mov(dst, r11.clone()),
        AsmInstruction::Binary(op, src, r11),
    ]
}

// cmp cannot take an immediate on the right.
fn fix_cmp_sndimm(instruction: AsmInstruction) -> AsmInstructions {
    let AsmInstruction::Cmp(src, dst) = instruction else {
        unreachable!("bad fix predicate for fix_cmp_sndimm")
    };
    let r11 = Operand::Reg(Register::R11);
    vec![
        AsmInstruction::Mov(dst, r11.clone()),
        AsmInstruction::Cmp(src, r11),
    ]
}

/// Rewrites every instruction whose operand form the target does not
/// accept. Applying this a second time changes nothing: every replacement
/// sequence is already legal.
pub(super) fn legalize(instructions: &mut AsmInstructions) {
    use AsmInstruction as I;

    fix_with_fixer(instructions, I::is_shift_count_in_mem, fix_shift_count);
    fix_with_fixer(instructions, I::is_mul_sndmem, fix_imul);
    fix_with_fixer(instructions, I::is_idiv_constant, fix_idiv);
    fix_with_fixer(instructions, I::mem_operands, fix_two_memoperands);
    fix_with_fixer(instructions, I::is_binary_sndimm, fix_binary_sndimm);
    fix_with_fixer(instructions, I::is_cmp_sndimm, fix_cmp_sndimm);
}

/// Sizes the frame (16-byte rounded, emitted as the function's first
/// `AllocStack`) and legalizes the instruction stream.
pub(super) fn fix_instructions(instructions: &mut AsmInstructions, stack_size: i64) {
    let frame_size = (stack_size + 15) / 16 * 16;
    instructions.insert(0, AsmInstruction::AllocStack(frame_size));
    legalize(instructions);
}
