use super::fix::legalize;
use super::*;
use crate::lexer;
use crate::names::NameFactory;
use crate::parser;
use crate::semantic_analysis;
use crate::tacky;

fn asm(src: &str) -> AsmAst {
    let tokens = lexer::lex(src).expect("should lex");
    let ast = parser::parse(&tokens).expect("should parse");
    let mut names = NameFactory::new();
    let (ast, _env) = semantic_analysis::validate(ast, &mut names).expect("should validate");
    codegen(tacky::emit_tacky(ast, &mut names))
}

fn operands(inst: &AsmInstruction) -> Vec<&Operand> {
    use AsmInstruction as I;
    match inst {
        I::Mov(src, dst) | I::Binary(_, src, dst) | I::Cmp(src, dst) => vec![src, dst],
        I::Unary(_, op) | I::Idiv(op) | I::SetCC(_, op) | I::Push(op) => vec![op],
        _ => vec![],
    }
}

const BRANCHY: &str = "int pick(int a, int b) {\
                         int r = a * b;\
                         r <<= 2;\
                         r >>= a % 3;\
                         if (r < b || r == 0) r = b / (a + 1);\
                         switch (r & 3) {\
                           case 0: r = -r; break;\
                           case 1: r = ~r;\
                           default: r = r + 1;\
                         }\
                         while (r > 100) r -= 7;\
                         return r;\
                       }\
                       int main(void) { return pick(21, 4); }";

#[test]
fn test_no_pseudo_registers_survive() {
    let asm_ast = asm(BRANCHY);
    for fun in &asm_ast.functions {
        for inst in &fun.body {
            assert!(
                operands(inst).iter().all(|op| !op.is_pseudo()),
                "pseudo operand left in {inst:?}"
            );
        }
    }
}

#[test]
fn test_frame_allocation_is_first_and_16_byte_aligned() {
    let asm_ast = asm(BRANCHY);
    for fun in &asm_ast.functions {
        let AsmInstruction::AllocStack(n) = &fun.body[0] else {
            panic!("function must start with its frame allocation");
        };
        assert_eq!(0, n % 16, "frame size {n} is not 16-byte aligned");
    }
}

#[test]
fn test_no_instruction_with_two_memory_operands() {
    let asm_ast = asm(BRANCHY);
    for fun in &asm_ast.functions {
        for inst in &fun.body {
            let mems = operands(inst).iter().filter(|op| op.is_mem()).count();
            match inst {
                AsmInstruction::Mov(..) | AsmInstruction::Binary(..) | AsmInstruction::Cmp(..) => {
                    assert!(mems < 2, "two memory operands in {inst:?}");
                }
                _ => (),
            }
        }
    }
}

#[test]
fn test_imul_destination_is_never_memory() {
    let asm_ast = asm(BRANCHY);
    for fun in &asm_ast.functions {
        for inst in &fun.body {
            if let AsmInstruction::Binary(AsmBinaryOp::Mul, _, dst) = inst {
                assert!(!dst.is_mem(), "imul writes to memory in {inst:?}");
            }
        }
    }
}

#[test]
fn test_cmp_right_operand_is_never_immediate() {
    let asm_ast = asm(BRANCHY);
    for fun in &asm_ast.functions {
        for inst in &fun.body {
            if let AsmInstruction::Cmp(_, dst) = inst {
                assert!(!dst.is_imm(), "cmp against an immediate in {inst:?}");
            }
        }
    }
}

#[test]
fn test_shift_counts_are_immediate_or_cl() {
    let asm_ast = asm(BRANCHY);
    let mut shifts = 0;
    for fun in &asm_ast.functions {
        for inst in &fun.body {
            if let AsmInstruction::Binary(op, count, _) = inst {
                if op.is_shift() {
                    shifts += 1;
                    assert!(
                        count.is_imm() || *count == Operand::Reg(Register::CX),
                        "shift count must be immediate or %cl: {inst:?}"
                    );
                }
            }
        }
    }
    assert!(shifts > 0, "the fixture should exercise shifts");
}

#[test]
fn test_idiv_never_takes_an_immediate() {
    let asm_ast = asm(BRANCHY);
    let mut divs = 0;
    for fun in &asm_ast.functions {
        for inst in &fun.body {
            if let AsmInstruction::Idiv(op) = inst {
                divs += 1;
                assert!(!op.is_imm(), "idiv with immediate in {inst:?}");
            }
        }
    }
    assert!(divs > 0, "the fixture should exercise division");
}

#[test]
fn test_legalization_is_idempotent() {
    let asm_ast = asm(BRANCHY);
    for fun in asm_ast.functions {
        let mut again = fun.body.clone();
        legalize(&mut again);
        assert_eq!(fun.body, again);
    }
}

#[test]
fn test_relational_comparison_swaps_operands() {
    // `1 < 2` must compare as `cmp $2, $1` (then setl), so the right source
    // comes first.
    let asm_ast = asm("int main(void) { return 1 < 2; }");
    let body = &asm_ast.functions[0].body;
    let cmp = body
        .iter()
        .find(|inst| matches!(inst, AsmInstruction::Cmp(..)))
        .expect("comparison present");
    let AsmInstruction::Cmp(src, _) = cmp else {
        unreachable!()
    };
    assert_eq!(&Operand::Imm(2), src);
    assert!(body
        .iter()
        .any(|inst| matches!(inst, AsmInstruction::SetCC(Condition::L, _))));
}

#[test]
fn test_call_with_stack_arguments_keeps_alignment() {
    let src = "int f(int a, int b, int c, int d, int e, int g, int h, int i, int j);\
               int main(void) { return f(1, 2, 3, 4, 5, 6, 7, 8, 9); }";
    let asm_ast = asm(src);
    let body = &asm_ast.functions[0].body;

    // Nine arguments: six in registers, three pushed. The odd push count
    // needs 8 bytes of padding, popped together with the arguments.
    let pushes = body
        .iter()
        .filter(|inst| matches!(inst, AsmInstruction::Push(_)))
        .count();
    assert_eq!(3, pushes);
    assert!(body
        .iter()
        .any(|inst| matches!(inst, AsmInstruction::AllocStack(8))));
    assert!(body
        .iter()
        .any(|inst| matches!(inst, AsmInstruction::DeallocStack(32))));

    let call_pos = body
        .iter()
        .position(|inst| matches!(inst, AsmInstruction::Call(_)))
        .expect("call present");
    let dealloc_pos = body
        .iter()
        .position(|inst| matches!(inst, AsmInstruction::DeallocStack(_)))
        .expect("dealloc present");
    assert!(call_pos < dealloc_pos);
}

#[test]
fn test_call_without_stack_arguments_needs_no_padding() {
    let src = "int f(int a, int b);\
               int main(void) { return f(1, 2); }";
    let asm_ast = asm(src);
    let body = &asm_ast.functions[0].body;
    assert!(!body
        .iter()
        .any(|inst| matches!(inst, AsmInstruction::Push(_) | AsmInstruction::DeallocStack(_))));
    // Only the frame allocation remains.
    let allocs = body
        .iter()
        .filter(|inst| matches!(inst, AsmInstruction::AllocStack(_)))
        .count();
    assert_eq!(1, allocs);
}

#[test]
fn test_parameters_come_from_registers_then_caller_stack() {
    let src = "int f(int a, int b, int c, int d, int e, int g, int h, int i) { return a + i; }\
               int main(void) { return 0; }";
    let asm_ast = asm(src);
    let body = &asm_ast.functions[0].body;

    // The first parameter move sits right after the frame allocation and
    // reads %edi; the seventh and eighth read the caller's slots.
    assert!(matches!(
        body[1],
        AsmInstruction::Mov(Operand::Reg(Register::DI), _)
    ));
    let from_caller: Vec<i32> = body
        .iter()
        .filter_map(|inst| match inst {
            AsmInstruction::Mov(Operand::Stack(n), _) if *n > 0 => Some(*n),
            _ => None,
        })
        .collect();
    assert_eq!(vec![16, 24], from_caller);
}
