mod asm_ast;
#[cfg(test)]
mod codegen_tests;
mod fix;
mod gen;
mod stack;

pub use asm_ast::*;

use crate::tacky::TAst;

/// Lowers TAC to the abstract x86-64 instruction AST. Each function is
/// translated with pseudo-registers, which are then assigned stack slots,
/// and finally every instruction is rewritten to a legal operand form.
pub fn codegen(tast: TAst) -> AsmAst {
    let functions = tast.functions.into_iter().map(gen::gen_fundef).collect();
    AsmAst { functions }
}
