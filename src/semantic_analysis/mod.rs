mod environment;
mod label_check;
mod loop_labeling;
mod name_resolution;
#[cfg(test)]
mod semantic_tests;
mod typecheck;

use crate::ast::*;
use crate::names::NameFactory;
use std::fmt;

pub use environment::{Category, EnvEntry, Environments, Linkage, TypeInfo};
use label_check::check_labels;
use loop_labeling::label_loops;
use name_resolution::resolve_identifiers;
use typecheck::check_types;

pub type Result<T> = std::result::Result<T, SemAnalysisError>;

#[derive(Clone, Debug, PartialEq)]
pub enum SemAnalysisError {
    IdentifierRedeclaration(Identifier),
    DuplicateDeclaration(Identifier),
    DuplicateParamNames(Identifier),
    LocalFunDefinition(Identifier),
    VariableNotDeclared(Identifier),
    UndeclaredFunction(Identifier),
    WrongLvalue(Exp),
    LabelRedeclaration(Identifier),
    UnknownLabel(Identifier),
    LabelBeforeDeclaration(Identifier),
    LabelAtEndOfBlock(Identifier),
    BreakOutsideOfLoop,
    ContinueOutsideOfLoop,
    CaseNotInSwitch,
    DefaultNotInSwitch,
    NotAConstCase(Exp),
    DuplicateCase(String),
    IncompatibleFunDec(Identifier),
    FunctionRedefinition(Identifier),
    FunctionRedeclaredAsVariable(Identifier),
    FunctionNameAsVariable(Identifier),
    VariableCall(Identifier),
    ExpectedArgsCountButGot(usize, usize, Identifier),
}

impl fmt::Display for SemAnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::IdentifierRedeclaration(id) => write!(f, "redeclaration of identifier {id}"),
            Self::DuplicateDeclaration(name) => write!(f, "redeclaration of {name}"),
            Self::DuplicateParamNames(name) => {
                write!(f, "parameters of function {name} must be unique")
            }
            Self::LocalFunDefinition(name) => {
                write!(f, "function {name} must not be defined within another function")
            }
            Self::VariableNotDeclared(id) => write!(f, "unknown variable: {id}"),
            Self::UndeclaredFunction(name) => write!(f, "call to undeclared function {name}"),
            Self::WrongLvalue(exp) => write!(f, "invalid lvalue: {exp:?}"),
            Self::LabelRedeclaration(name) => write!(f, "label {name} already exists"),
            Self::UnknownLabel(name) => write!(f, "goto target {name} does not exist"),
            Self::LabelBeforeDeclaration(name) => {
                write!(f, "label {name} is not allowed before a declaration")
            }
            Self::LabelAtEndOfBlock(name) => {
                write!(f, "label {name} is not followed by any statement")
            }
            Self::BreakOutsideOfLoop => write!(f, "break statement outside of loop or switch"),
            Self::ContinueOutsideOfLoop => write!(f, "continue statement outside of loop"),
            Self::CaseNotInSwitch => write!(f, "case not in switch"),
            Self::DefaultNotInSwitch => write!(f, "default case not in switch"),
            Self::NotAConstCase(exp) => {
                write!(f, "case label is not an integer constant: {exp:?}")
            }
            Self::DuplicateCase(case) => write!(f, "duplicate case {case}"),
            Self::IncompatibleFunDec(name) => {
                write!(f, "{name} is already declared with a different signature")
            }
            Self::FunctionRedefinition(name) => write!(f, "{name} is already defined"),
            Self::FunctionRedeclaredAsVariable(name) => {
                write!(f, "{name} redeclared as a non-function")
            }
            Self::FunctionNameAsVariable(name) => write!(f, "function {name} used as a variable"),
            Self::VariableCall(name) => write!(f, "{name} is not a function"),
            Self::ExpectedArgsCountButGot(expected, got, name) => write!(
                f,
                "function {name} called with {got} arguments, but expected {expected}"
            ),
        }
    }
}

impl std::error::Error for SemAnalysisError {}

/// Runs the semantic pipeline: loop/switch labeling, `goto`/label checks,
/// category/arity checks, identifier resolution. Returns the rewritten AST
/// plus the environments built by the type checker.
pub fn validate(ast: Ast, names: &mut NameFactory) -> Result<(Ast, Environments)> {
    let ast = label_loops(ast, names)?;
    check_labels(&ast)?;
    let env = check_types(&ast)?;
    let ast = resolve_identifiers(ast, names)?;

    Ok((ast, env))
}
