use super::{Result, SemAnalysisError};
use crate::ast::*;

use std::collections::HashSet;

type LabelSet = HashSet<Identifier>;

fn collect_labels_statement(statement: &Statement, labels: &mut LabelSet) -> Result<()> {
    use Statement as S;
    match statement {
        S::Label(name) => {
            let is_duplicate = !labels.insert(name.clone());
            if is_duplicate {
                return Err(SemAnalysisError::LabelRedeclaration(name.clone()));
            }
            Ok(())
        }
        S::While(While { body, .. })
        | S::DoWhile(DoWhile { body, .. })
        | S::For(For { body, .. })
        | S::Switch(Switch { body, .. }) => collect_labels_statement(body, labels),
        S::If(If { then, els, .. }) => {
            collect_labels_statement(then, labels)?;
            if let Some(els) = els {
                collect_labels_statement(els, labels)?;
            }
            Ok(())
        }
        S::Compound(block) => collect_labels_block(block, labels),
        S::Exp(_) | S::Break(_) | S::Continue(_) | S::Return(_) | S::Goto(_) | S::Case(_)
        | S::Null => Ok(()),
    }
}

fn collect_labels_block(block: &Block, labels: &mut LabelSet) -> Result<()> {
    for item in &block.items {
        if let BlockItem::S(st) = item {
            collect_labels_statement(st, labels)?;
        }
    }
    Ok(())
}

fn validate_gotos_statement(st: &Statement, labels: &LabelSet) -> Result<()> {
    use Statement as S;
    match st {
        S::Goto(target) => {
            if !labels.contains(target) {
                return Err(SemAnalysisError::UnknownLabel(target.clone()));
            }
            Ok(())
        }
        S::While(While { body, .. })
        | S::DoWhile(DoWhile { body, .. })
        | S::For(For { body, .. })
        | S::Switch(Switch { body, .. }) => validate_gotos_statement(body, labels),
        S::If(If { then, els, .. }) => {
            validate_gotos_statement(then, labels)?;
            if let Some(els) = els {
                validate_gotos_statement(els, labels)?;
            }
            Ok(())
        }
        S::Compound(block) => validate_gotos_block(block, labels),
        S::Exp(_) | S::Break(_) | S::Continue(_) | S::Return(_) | S::Label(_) | S::Case(_)
        | S::Null => Ok(()),
    }
}

fn validate_gotos_block(block: &Block, labels: &LabelSet) -> Result<()> {
    for item in &block.items {
        if let BlockItem::S(st) = item {
            validate_gotos_statement(st, labels)?;
        }
    }
    Ok(())
}

fn marker_name(st: &Statement) -> Option<&Identifier> {
    match st {
        Statement::Label(name) => Some(name),
        Statement::Case(case) => Some(&case.label),
        _ => None,
    }
}

/// Label and case markers must introduce a statement: one directly followed
/// by a declaration, or sitting at the end of its block, is rejected.
fn check_marker_placement(block: &Block) -> Result<()> {
    let mut pending: Option<&Identifier> = None;

    for item in &block.items {
        match item {
            BlockItem::D(_) => {
                if let Some(name) = pending {
                    return Err(SemAnalysisError::LabelBeforeDeclaration(name.clone()));
                }
            }
            BlockItem::S(st) => {
                pending = marker_name(st);
                check_markers_statement(st)?;
                if pending.is_some() {
                    continue;
                }
            }
        }
        pending = None;
    }

    if let Some(name) = pending {
        return Err(SemAnalysisError::LabelAtEndOfBlock(name.clone()));
    }
    Ok(())
}

fn check_markers_statement(st: &Statement) -> Result<()> {
    use Statement as S;
    match st {
        S::Compound(block) => check_marker_placement(block),
        S::While(While { body, .. })
        | S::DoWhile(DoWhile { body, .. })
        | S::For(For { body, .. })
        | S::Switch(Switch { body, .. }) => check_markers_statement(body),
        S::If(If { then, els, .. }) => {
            check_markers_statement(then)?;
            if let Some(els) = els {
                check_markers_statement(els)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn check_function_body(body: &Block) -> Result<()> {
    let mut labels = LabelSet::new();
    collect_labels_block(body, &mut labels)?;
    validate_gotos_block(body, &labels)?;
    check_marker_placement(body)
}

/// Per function: every `goto` must name an existing label, labels must be
/// unique, and label/case markers must be followed by a statement.
pub fn check_labels(ast: &Ast) -> Result<()> {
    for dec in &ast.declarations {
        if let Some(body) = &dec.body {
            check_function_body(body)?;
        }
    }
    Ok(())
}
