/*!
A whole-program compiler for a small C dialect: `int`-only functions, local
variables with lexical scoping, the usual arithmetic/bitwise/logical/relational
operators, control flow (`if`/`else`, ternary, `while`, `do`-`while`, `for`,
`break`, `continue`, `switch` with fallthrough, labeled `goto`), and function
calls following the System-V AMD64 calling convention. The output is GAS-syntax
assembly for x86-64 Linux; `gcc` is used for preprocessing and assembling.

## Compilation stages

1. **Lexing** - [lex](lexer::lex) scans the preprocessed source with maximal
   munch and produces position-tagged [Tokens](lexer::Tokens). Unknown input
   raises a [LexError](lexer::LexError).
2. **Parsing** - [parse](parser::parse) builds an [Ast](ast::Ast) by recursive
   descent with precedence climbing. Compound assignment and prefix
   increment/decrement are desugared here. Any syntactic error raises a
   [ParseError](parser::ParseError).
3. **Validation** - [validate](semantic_analysis::validate) labels loops and
   switches, checks `goto`/label well-formedness, checks categories and
   arities, and renames every identifier to a globally unique name. It returns
   the rewritten [Ast](ast::Ast) together with the
   [Environments](semantic_analysis::Environments) describing every linked
   name. Any semantic error raises a
   [SemAnalysisError](semantic_analysis::SemAnalysisError).
4. **Tacky** - [emit_tacky](tacky::emit_tacky) lowers the validated AST into
   three-address code ([TAst](tacky::TAst)). From here on any failure is a
   compiler bug and panics.
5. **Codegen** - [codegen](codegen::codegen) lowers TAC into an abstract x86-64
   instruction AST, replaces pseudo-registers with stack slots and rewrites
   instructions so every operand form is legal on the target.
6. **Emission** - [emit](emission::emit) prints the assembly AST as GAS text,
   decorating calls to externally linked functions with `@PLT`.

The [NameFactory](names::NameFactory) is owned by the driver and shared by
validation and TAC generation, so renamed user variables and compiler
temporaries can never collide.
*/

#![deny(unused_must_use)]
#![warn(clippy::pedantic)]
#![allow(clippy::wildcard_imports)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_possible_truncation)]

pub mod ast;
pub mod codegen;
pub mod emission;
pub mod lexer;
pub mod names;
pub mod parser;
pub mod semantic_analysis;
pub mod tacky;
