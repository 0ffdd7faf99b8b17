use crate::codegen::*;
use crate::semantic_analysis::Environments;

use std::fmt;

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::AX => write!(f, "%eax"),
            Self::CX => write!(f, "%ecx"),
            Self::DX => write!(f, "%edx"),
            Self::DI => write!(f, "%edi"),
            Self::SI => write!(f, "%esi"),
            Self::R8 => write!(f, "%r8d"),
            Self::R9 => write!(f, "%r9d"),
            Self::R10 => write!(f, "%r10d"),
            Self::R11 => write!(f, "%r11d"),
        }
    }
}

fn reg_to_8byte(reg: &Operand) -> String {
    if let Operand::Reg(reg) = reg {
        match reg {
            Register::AX => "%rax",
            Register::CX => "%rcx",
            Register::DX => "%rdx",
            Register::DI => "%rdi",
            Register::SI => "%rsi",
            Register::R8 => "%r8",
            Register::R9 => "%r9",
            Register::R10 => "%r10",
            Register::R11 => "%r11",
        }
        .into()
    } else {
        reg.to_string()
    }
}

fn reg_to_1byte(reg: &Operand) -> String {
    if let Operand::Reg(reg) = reg {
        match reg {
            Register::AX => "%al",
            Register::CX => "%cl",
            Register::DX => "%dl",
            Register::DI => "%dil",
            Register::SI => "%sil",
            Register::R8 => "%r8b",
            Register::R9 => "%r9b",
            Register::R10 => "%r10b",
            Register::R11 => "%r11b",
        }
        .into()
    } else {
        reg.to_string()
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Imm(i) => write!(f, "${i}"),
            Self::Reg(r) => write!(f, "{r}"),
            Self::Stack(i) => write!(f, "{i}(%rbp)"),
            Self::Pseudo(_) => unreachable!("pseudo-registers never reach emission"),
        }
    }
}

impl fmt::Display for AsmUnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Neg => write!(f, "negl"),
            Self::Not => write!(f, "notl"),
        }
    }
}

impl fmt::Display for AsmBinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Add => write!(f, "addl"),
            Self::Sub => write!(f, "subl"),
            Self::Mul => write!(f, "imull"),
            Self::And => write!(f, "andl"),
            Self::Or => write!(f, "orl"),
            Self::Xor => write!(f, "xorl"),
            Self::Shl => write!(f, "sall"),
            Self::Shr => write!(f, "sarl"),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::E => write!(f, "e"),
            Self::NE => write!(f, "ne"),
            Self::G => write!(f, "g"),
            Self::GE => write!(f, "ge"),
            Self::L => write!(f, "l"),
            Self::LE => write!(f, "le"),
        }
    }
}

impl fmt::Display for AsmInstruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Mov(src, dst) => write!(f, "movl {src}, {dst}"),
            Self::Unary(op, operand) => write!(f, "{op} {operand}"),
            // A register shift count always sits in %cl.
            Self::Binary(op @ (AsmBinaryOp::Shl | AsmBinaryOp::Shr), Operand::Reg(_), dst) => {
                write!(f, "{op} %cl, {dst}")
            }
            Self::Binary(op, src, dst) => write!(f, "{op} {src}, {dst}"),
            Self::Cmp(src, dst) => write!(f, "cmpl {src}, {dst}"),
            Self::Idiv(operand) => write!(f, "idivl {operand}"),
            Self::Cdq => write!(f, "cdq"),
            Self::Jmp(label) => write!(f, "jmp .L{label}"),
            Self::JmpCC(condition, label) => write!(f, "j{condition} .L{label}"),
            Self::SetCC(condition, operand) => {
                write!(f, "set{condition} {}", reg_to_1byte(operand))
            }
            Self::Label(label) => write!(f, ".L{label}:"),
            Self::AllocStack(n) => write!(f, "subq ${n}, %rsp"),
            Self::DeallocStack(n) => write!(f, "addq ${n}, %rsp"),
            Self::Push(operand) => write!(f, "pushq {}", reg_to_8byte(operand)),
            Self::Call(name) => write!(f, "call {name}"),
            Self::Ret => write!(f, "movq %rbp, %rsp\n\tpopq %rbp\n\tret"),
        }
    }
}

/// The assembly AST paired with the environments from semantic analysis, so
/// calls to functions defined in this program bypass the PLT while
/// externally linked ones go through it.
pub struct AsmProgram<'a> {
    ast: &'a AsmAst,
    env: &'a Environments,
}

/// Binds the assembly AST to the symbol environments for printing;
/// `emit(..).to_string()` yields the final GAS text.
pub fn emit<'a>(ast: &'a AsmAst, env: &'a Environments) -> AsmProgram<'a> {
    AsmProgram { ast, env }
}

impl AsmProgram<'_> {
    fn fmt_function(&self, fun: &AsmFunction, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "\t.globl {}", fun.name)?;
        writeln!(f, "{}:", fun.name)?;
        // Prologue:
        writeln!(f, "\tpushq %rbp")?;
        writeln!(f, "\tmovq %rsp, %rbp")?;
        for instruction in &fun.body {
            match instruction {
                AsmInstruction::Call(name) if !self.env.is_function_defined(name) => {
                    writeln!(f, "\tcall {name}@PLT")?;
                }
                _ => writeln!(f, "\t{instruction}")?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for AsmProgram<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for fun in &self.ast.functions {
            self.fmt_function(fun, f)?;
        }
        writeln!(f, ".section .note.GNU-stack,\"\",@progbits")
    }
}

#[cfg(test)]
mod emission_tests {
    use super::*;
    use crate::lexer;
    use crate::names::NameFactory;
    use crate::parser;
    use crate::semantic_analysis;
    use crate::tacky;

    fn compile(src: &str) -> String {
        let tokens = lexer::lex(src).expect("should lex");
        let ast = parser::parse(&tokens).expect("should parse");
        let mut names = NameFactory::new();
        let (ast, env) = semantic_analysis::validate(ast, &mut names).expect("should validate");
        let asm_ast = codegen(tacky::emit_tacky(ast, &mut names));
        emit(&asm_ast, &env).to_string()
    }

    #[test]
    fn test_prologue_and_epilogue() {
        let text = compile("int main(void) { return 2; }");
        assert!(text.contains("\t.globl main\n"));
        assert!(text.contains("main:\n\tpushq %rbp\n\tmovq %rsp, %rbp\n"));
        assert!(text.contains("\tmovl $2, %eax\n"));
        assert!(text.contains("\tmovq %rbp, %rsp\n\tpopq %rbp\n\tret\n"));
        assert!(text.ends_with(".section .note.GNU-stack,\"\",@progbits\n"));
    }

    #[test]
    fn test_labels_are_local() {
        let text = compile("int main(void) { int i = 0; while (i < 5) i = i + 1; return i; }");
        assert!(text.contains("jmp .L"));
        assert!(text.contains(".Lloop.0.continue:"));
        assert!(text.contains(".Lloop.0.break:"));
    }

    #[test]
    fn test_calls_to_defined_functions_skip_the_plt() {
        let text = compile(
            "int helper(void) { return 3; }\
             int main(void) { return helper(); }",
        );
        assert!(text.contains("\tcall helper\n"));
        assert!(!text.contains("helper@PLT"));
    }

    #[test]
    fn test_calls_to_external_functions_use_the_plt() {
        let text = compile(
            "int putchar(int c);\
             int main(void) { return putchar(65); }",
        );
        assert!(text.contains("\tcall putchar@PLT\n"));
    }

    #[test]
    fn test_shift_by_cl() {
        let text = compile("int main(void) { int a = 1; int b = 3; return a << b; }");
        assert!(text.contains("sall %cl,"));
    }

    #[test]
    fn test_setcc_after_zeroing_destination() {
        let text = compile("int main(void) { return 1 < 2; }");
        assert!(text.contains("setl "));
        // The flag materialization zeroes the full destination first.
        assert!(text.contains("movl $0,"));
    }

    #[test]
    fn test_push_uses_quadword_registers() {
        let text = compile(
            "int f(int a, int b, int c, int d, int e, int g, int h);\
             int main(void) { return f(1, 2, 3, 4, 5, 6, 7); }",
        );
        assert!(text.contains("pushq"));
        assert!(text.contains("subq $8, %rsp"));
        assert!(text.contains("addq $16, %rsp"));
    }
}
