use super::{Result, SemAnalysisError};
use crate::ast::*;
use crate::names::NameFactory;

use std::collections::HashSet;

/// Per-switch bookkeeping: the case labels generated so far (in source
/// order) and the values already taken, so duplicates are rejected on the
/// spot.
struct SwitchFrame {
    label: Identifier,
    cases: Vec<Identifier>,
    seen_values: HashSet<String>,
}

enum Frame {
    Loop(Identifier),
    Switch(SwitchFrame),
}

struct LabelCtx<'a> {
    names: &'a mut NameFactory,
    frames: Vec<Frame>,
}

impl LabelCtx<'_> {
    fn break_target(&self) -> Option<Identifier> {
        self.frames.last().map(|frame| match frame {
            Frame::Loop(label) => label.clone(),
            Frame::Switch(sf) => sf.label.clone(),
        })
    }

    fn continue_target(&self) -> Option<Identifier> {
        self.frames.iter().rev().find_map(|frame| match frame {
            Frame::Loop(label) => Some(label.clone()),
            Frame::Switch(_) => None,
        })
    }

    fn innermost_switch(&mut self) -> Option<&mut SwitchFrame> {
        self.frames.iter_mut().rev().find_map(|frame| match frame {
            Frame::Switch(sf) => Some(sf),
            Frame::Loop(_) => None,
        })
    }
}

fn get_case_value(exp: &Exp) -> Result<i32> {
    match exp {
        Exp::Constant(c) => Ok(*c),
        _ => Err(SemAnalysisError::NotAConstCase(exp.clone())),
    }
}

fn label_case(mut case: Case, ctx: &mut LabelCtx) -> Result<Statement> {
    let value_key = match &case.value {
        Some(exp) => get_case_value(exp)?.to_string(),
        None => String::from("default"),
    };

    let Some(frame) = ctx.innermost_switch() else {
        return Err(if case.value.is_some() {
            SemAnalysisError::CaseNotInSwitch
        } else {
            SemAnalysisError::DefaultNotInSwitch
        });
    };

    if !frame.seen_values.insert(value_key.clone()) {
        return Err(SemAnalysisError::DuplicateCase(value_key));
    }

    let index = frame.cases.len();
    case.label = format!("{}.case.{}", frame.label, index);
    case.prev_case_label = frame.cases.last().cloned().unwrap_or_default();
    frame.cases.push(case.label.clone());

    Ok(Statement::Case(case))
}

/// Fills in each case's `next_case_label` once the whole switch body has
/// been walked: the chain runs through the cases in source order and ends at
/// the break label. Nested switches were patched already and their labels do
/// not match `cases[idx]`, so they are left alone.
fn patch_case_links(st: &mut Statement, cases: &[Identifier], break_label: &str, idx: &mut usize) {
    match st {
        Statement::Case(case) => {
            if cases.get(*idx) == Some(&case.label) {
                case.next_case_label = cases
                    .get(*idx + 1)
                    .cloned()
                    .unwrap_or_else(|| break_label.to_owned());
                *idx += 1;
            }
        }
        Statement::Compound(block) => {
            for item in &mut block.items {
                if let BlockItem::S(st) = item {
                    patch_case_links(st, cases, break_label, idx);
                }
            }
        }
        Statement::If(if_st) => {
            patch_case_links(&mut if_st.then, cases, break_label, idx);
            if let Some(els) = &mut if_st.els {
                patch_case_links(els, cases, break_label, idx);
            }
        }
        Statement::While(While { body, .. })
        | Statement::DoWhile(DoWhile { body, .. })
        | Statement::For(For { body, .. })
        | Statement::Switch(Switch { body, .. }) => {
            patch_case_links(body, cases, break_label, idx);
        }
        _ => (),
    }
}

fn label_switch(mut switch: Switch, ctx: &mut LabelCtx) -> Result<Statement> {
    let label = ctx.names.label_name("switch");
    ctx.frames.push(Frame::Switch(SwitchFrame {
        label: label.clone(),
        cases: Vec::new(),
        seen_values: HashSet::new(),
    }));
    let mut body = label_statement(*switch.body, ctx)?;
    let Some(Frame::Switch(frame)) = ctx.frames.pop() else {
        unreachable!("switch frame was pushed above")
    };

    let break_label = format!("{label}.break");
    let mut idx = 0;
    patch_case_links(&mut body, &frame.cases, &break_label, &mut idx);

    switch.first_case_label = frame.cases.first().cloned().unwrap_or(break_label);
    switch.label = label;
    switch.body = Box::new(body);
    Ok(Statement::Switch(switch))
}

fn label_while(mut while_st: While, ctx: &mut LabelCtx) -> Result<Statement> {
    while_st.label = ctx.names.label_name("loop");
    ctx.frames.push(Frame::Loop(while_st.label.clone()));
    while_st.body = label_statement(*while_st.body, ctx).map(Box::new)?;
    ctx.frames.pop();
    Ok(Statement::While(while_st))
}

fn label_dowhile(mut dowhile: DoWhile, ctx: &mut LabelCtx) -> Result<Statement> {
    dowhile.label = ctx.names.label_name("loop");
    ctx.frames.push(Frame::Loop(dowhile.label.clone()));
    dowhile.body = label_statement(*dowhile.body, ctx).map(Box::new)?;
    ctx.frames.pop();
    Ok(Statement::DoWhile(dowhile))
}

fn label_for(mut for_st: For, ctx: &mut LabelCtx) -> Result<Statement> {
    for_st.label = ctx.names.label_name("loop");
    ctx.frames.push(Frame::Loop(for_st.label.clone()));
    for_st.body = label_statement(*for_st.body, ctx).map(Box::new)?;
    ctx.frames.pop();
    Ok(Statement::For(for_st))
}

fn label_if(mut if_st: If, ctx: &mut LabelCtx) -> Result<Statement> {
    if_st.then = label_statement(*if_st.then, ctx).map(Box::new)?;
    if_st.els = if_st
        .els
        .map(|st| label_statement(*st, ctx).map(Box::new))
        .transpose()?;
    Ok(Statement::If(if_st))
}

fn label_statement(statement: Statement, ctx: &mut LabelCtx) -> Result<Statement> {
    use Statement as S;
    match statement {
        S::While(while_st) => label_while(while_st, ctx),
        S::DoWhile(dowhile) => label_dowhile(dowhile, ctx),
        S::For(for_st) => label_for(for_st, ctx),
        S::Switch(switch) => label_switch(switch, ctx),
        S::Case(case) => label_case(case, ctx),
        S::If(if_st) => label_if(if_st, ctx),
        S::Compound(block) => label_block(block, ctx).map(S::Compound),
        S::Break(_) => ctx
            .break_target()
            .ok_or(SemAnalysisError::BreakOutsideOfLoop)
            .map(S::Break),
        S::Continue(_) => ctx
            .continue_target()
            .ok_or(SemAnalysisError::ContinueOutsideOfLoop)
            .map(S::Continue),
        S::Null | S::Return(_) | S::Goto(_) | S::Label(_) | S::Exp(_) => Ok(statement),
    }
}

fn label_block(block: Block, ctx: &mut LabelCtx) -> Result<Block> {
    let items = block
        .items
        .into_iter()
        .map(|item| match item {
            BlockItem::S(st) => label_statement(st, ctx).map(BlockItem::S),
            dec => Ok(dec),
        })
        .collect::<Result<BlockItems>>()?;

    Ok(Block { items })
}

fn label_fundecl(mut fundecl: FunDecl, names: &mut NameFactory) -> Result<FunDecl> {
    let mut ctx = LabelCtx {
        names,
        frames: Vec::new(),
    };
    fundecl.body = fundecl
        .body
        .map(|block| label_block(block, &mut ctx))
        .transpose()?;
    Ok(fundecl)
}

/// Annotates every loop and switch with a unique label and links each
/// switch's case chain.
pub fn label_loops(ast: Ast, names: &mut NameFactory) -> Result<Ast> {
    let Ast { declarations } = ast;

    let declarations = declarations
        .into_iter()
        .map(|dec| label_fundecl(dec, names))
        .collect::<Result<Vec<_>>>()?;

    Ok(Ast { declarations })
}
