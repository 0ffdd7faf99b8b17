use super::asm_ast::*;
use super::fix::fix_instructions;
use super::stack::replace_pseudos;
use crate::ast::Identifier;
use crate::tacky::{TBinaryOp, TFunction, TInstruction, TInstructions, TUnaryOp, TValue};

use std::iter::successors;

const ARG_REGISTERS: [Register; 6] = [
    Register::DI,
    Register::SI,
    Register::DX,
    Register::CX,
    Register::R8,
    Register::R9,
];

fn trelational_to_asm(
    op: TBinaryOp,
    val1: TValue,
    val2: TValue,
    dst: TValue,
    instructions: &mut AsmInstructions,
) {
    // `a < b` becomes `cmp b, a` followed by setl, so the operand order
    // swaps here.
    let src1 = Operand::from(val1);
    let src2 = Operand::from(val2);
    let dst = Operand::from(dst);

    instructions.push(AsmInstruction::Cmp(src2, src1));
    instructions.push(AsmInstruction::Mov(Operand::Imm(0), dst.clone()));
    instructions.push(AsmInstruction::SetCC(Condition::from(op), dst));
}

fn tdivrem_to_asm(
    op: TBinaryOp,
    val1: TValue,
    val2: TValue,
    dst: TValue,
    instructions: &mut AsmInstructions,
) {
    let src1 = Operand::from(val1);
    let src2 = Operand::from(val2);
    let dst = Operand::from(dst);
    let ax = Operand::Reg(Register::AX);
    let dx = Operand::Reg(Register::DX);

    // The quotient lands in eax, the remainder in edx.
    let result = if op.is_rem() { dx } else { ax.clone() };
    instructions.push(AsmInstruction::Mov(src1, ax));
    instructions.push(AsmInstruction::Cdq);
    instructions.push(AsmInstruction::Idiv(src2));
    instructions.push(AsmInstruction::Mov(result, dst));
}

fn tbinary_to_asm(
    op: TBinaryOp,
    val1: TValue,
    val2: TValue,
    dst: TValue,
    instructions: &mut AsmInstructions,
) {
    let src1 = Operand::from(val1);
    let src2 = Operand::from(val2);
    let dst = Operand::from(dst);

    instructions.push(AsmInstruction::Mov(src1, dst.clone()));
    instructions.push(AsmInstruction::Binary(AsmBinaryOp::from(op), src2, dst));
}

fn tlogical_not_to_asm(src: TValue, dst: TValue, instructions: &mut AsmInstructions) {
    let src = Operand::from(src);
    let dst = Operand::from(dst);

    instructions.push(AsmInstruction::Cmp(Operand::Imm(0), src));
    instructions.push(AsmInstruction::Mov(Operand::Imm(0), dst.clone()));
    instructions.push(AsmInstruction::SetCC(Condition::E, dst));
}

fn tunary_to_asm(op: TUnaryOp, src: TValue, dst: TValue, instructions: &mut AsmInstructions) {
    let src = Operand::from(src);
    let dst = Operand::from(dst);

    instructions.push(AsmInstruction::Mov(src, dst.clone()));
    instructions.push(AsmInstruction::Unary(AsmUnaryOp::from(op), dst));
}

fn treturn_to_asm(val: TValue, instructions: &mut AsmInstructions) {
    let src = Operand::from(val);
    instructions.push(AsmInstruction::Mov(src, Operand::Reg(Register::AX)));
    instructions.push(AsmInstruction::Ret);
}

fn tjz_to_asm(val: TValue, target: Identifier, instructions: &mut AsmInstructions) {
    let src = Operand::from(val);
    instructions.push(AsmInstruction::Cmp(Operand::Imm(0), src));
    instructions.push(AsmInstruction::JmpCC(Condition::E, target));
}

fn tjnz_to_asm(val: TValue, target: Identifier, instructions: &mut AsmInstructions) {
    let src = Operand::from(val);
    instructions.push(AsmInstruction::Cmp(Operand::Imm(0), src));
    instructions.push(AsmInstruction::JmpCC(Condition::NE, target));
}

/// Calls follow the System-V convention: the first six arguments go through
/// registers, the rest are pushed right to left. `%rsp` is padded to keep it
/// 16-byte aligned at the `call`, and the caller pops everything afterwards.
fn tcall_to_asm(
    name: Identifier,
    args: Vec<TValue>,
    dst: TValue,
    instructions: &mut AsmInstructions,
) {
    let reg_args_count = args.len().min(ARG_REGISTERS.len());
    let mut args = args.into_iter().map(Operand::from);
    let reg_args: Vec<Operand> = args.by_ref().take(reg_args_count).collect();
    let stack_args: Vec<Operand> = args.collect();

    let stack_padding = 8 * (stack_args.len() & 1) as i64;
    if stack_padding != 0 {
        instructions.push(AsmInstruction::AllocStack(stack_padding));
    }

    for (arg, reg) in reg_args.into_iter().zip(ARG_REGISTERS) {
        instructions.push(AsmInstruction::Mov(arg, Operand::Reg(reg)));
    }

    let stack_args_count = stack_args.len() as i64;
    for arg in stack_args.into_iter().rev() {
        if arg.is_imm() || arg.is_reg() {
            instructions.push(AsmInstruction::Push(arg));
        } else {
            // pushq would read 8 bytes from a 4-byte slot; stage through a
            // register instead.
            let ax = Operand::Reg(Register::AX);
            instructions.push(AsmInstruction::Mov(arg, ax.clone()));
            instructions.push(AsmInstruction::Push(ax));
        }
    }

    instructions.push(AsmInstruction::Call(name));

    let bytes_to_remove = 8 * stack_args_count + stack_padding;
    if bytes_to_remove != 0 {
        instructions.push(AsmInstruction::DeallocStack(bytes_to_remove));
    }

    let dst = Operand::from(dst);
    instructions.push(AsmInstruction::Mov(Operand::Reg(Register::AX), dst));
}

fn tacky_to_asm(body: TInstructions, instructions: &mut AsmInstructions) {
    use TInstruction as TI;
    for inst in body {
        match inst {
            TI::Return(val) => treturn_to_asm(val, instructions),
            TI::Unary(TUnaryOp::LogicalNot, src, dst) => {
                tlogical_not_to_asm(src, dst, instructions);
            }
            TI::Unary(op, src, dst) => tunary_to_asm(op, src, dst, instructions),
            TI::Binary(op, v1, v2, dst) if op.is_relational() => {
                trelational_to_asm(op, v1, v2, dst, instructions);
            }
            TI::Binary(op, v1, v2, dst) if op.is_divrem() => {
                tdivrem_to_asm(op, v1, v2, dst, instructions);
            }
            TI::Binary(op, v1, v2, dst) => tbinary_to_asm(op, v1, v2, dst, instructions),
            TI::Copy(src, dst) => {
                let src = Operand::from(src);
                let dst = Operand::from(dst);
                instructions.push(AsmInstruction::Mov(src, dst));
            }
            TI::Jump(target) => instructions.push(AsmInstruction::Jmp(target)),
            TI::JumpIfZero(val, target) => tjz_to_asm(val, target, instructions),
            TI::JumpIfNotZero(val, target) => tjnz_to_asm(val, target, instructions),
            TI::Label(id) => instructions.push(AsmInstruction::Label(id)),
            TI::FunCall { name, args, dst } => tcall_to_asm(name, args, dst, instructions),
        }
    }
}

/// Incoming parameters are copied into their pseudo-registers up front:
/// the first six out of the argument registers, the rest from the caller's
/// stack slots starting at `16(%rbp)`.
fn set_up_parameters(params: Vec<Identifier>, instructions: &mut AsmInstructions) {
    let reg_srcs = ARG_REGISTERS.into_iter().map(Operand::Reg);
    let stack_srcs = successors(Some(16), |n| Some(n + 8)).map(Operand::Stack);

    let reg_params_count = params.len().min(ARG_REGISTERS.len());
    let mut params = params.into_iter().map(Operand::Pseudo);
    let reg_params: Vec<Operand> = params.by_ref().take(reg_params_count).collect();

    for (param, src) in reg_params.into_iter().zip(reg_srcs) {
        instructions.push(AsmInstruction::Mov(src, param));
    }
    for (param, src) in params.zip(stack_srcs) {
        instructions.push(AsmInstruction::Mov(src, param));
    }
}

pub(super) fn gen_fundef(f: TFunction) -> AsmFunction {
    let TFunction { name, params, body } = f;

    let mut instructions = AsmInstructions::new();
    set_up_parameters(params, &mut instructions);
    tacky_to_asm(body, &mut instructions);

    let stack_size = replace_pseudos(&mut instructions);
    fix_instructions(&mut instructions, stack_size);

    AsmFunction {
        name,
        body: instructions,
    }
}
