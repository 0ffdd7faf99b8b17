mod tast;

use crate::ast::*;
use crate::names::NameFactory;
pub use tast::*;

/// TAC generation context: the shared name factory plus the selector
/// temporaries of the enclosing switches, innermost last, so case markers in
/// nested switches compare against the right value.
struct Emitter<'a> {
    names: &'a mut NameFactory,
    switch_values: Vec<TValue>,
}

impl Emitter<'_> {
    fn fresh_var(&mut self) -> TValue {
        TValue::Var(self.names.var_name())
    }

    fn fresh_label(&mut self, prefix: &str) -> Identifier {
        self.names.label_name(prefix)
    }
}

fn emit_short_circuit(
    instructions: &mut TInstructions,
    op: TBinaryOp,
    left: Exp,
    right: Exp,
    ctx: &mut Emitter,
) -> TValue {
    let is_and = matches!(op, TBinaryOp::LogicalAnd);
    let shortcut_label = if is_and {
        ctx.fresh_label("false")
    } else {
        ctx.fresh_label("true")
    };
    let end_label = ctx.fresh_label("end");
    let result = ctx.fresh_var();

    let (shortcut_result, full_result) = if is_and { (0, 1) } else { (1, 0) };
    let jump = |v: TValue, target: Identifier| {
        if is_and {
            TInstruction::JumpIfZero(v, target)
        } else {
            TInstruction::JumpIfNotZero(v, target)
        }
    };

    let v1 = emit_expression(instructions, left, ctx);
    instructions.push(jump(v1, shortcut_label.clone()));

    let v2 = emit_expression(instructions, right, ctx);
    instructions.push(jump(v2, shortcut_label.clone()));

    instructions.push(TInstruction::Copy(
        TValue::Constant(full_result),
        result.clone(),
    ));
    instructions.push(TInstruction::Jump(end_label.clone()));
    instructions.push(TInstruction::Label(shortcut_label));
    instructions.push(TInstruction::Copy(
        TValue::Constant(shortcut_result),
        result.clone(),
    ));
    instructions.push(TInstruction::Label(end_label));

    result
}

fn emit_conditional(
    instructions: &mut TInstructions,
    conditional: Conditional,
    ctx: &mut Emitter,
) -> TValue {
    let Conditional {
        condition,
        then,
        els,
    } = conditional;

    let else_label = ctx.fresh_label("else");
    let end_label = ctx.fresh_label("end");
    let result = ctx.fresh_var();

    let c = emit_expression(instructions, *condition, ctx);
    instructions.push(TInstruction::JumpIfZero(c, else_label.clone()));

    let v1 = emit_expression(instructions, *then, ctx);
    instructions.push(TInstruction::Copy(v1, result.clone()));
    instructions.push(TInstruction::Jump(end_label.clone()));

    instructions.push(TInstruction::Label(else_label));
    let v2 = emit_expression(instructions, *els, ctx);
    instructions.push(TInstruction::Copy(v2, result.clone()));
    instructions.push(TInstruction::Label(end_label));

    result
}

fn emit_expression(instructions: &mut TInstructions, e: Exp, ctx: &mut Emitter) -> TValue {
    match e {
        Exp::Constant(c) => TValue::Constant(c),
        Exp::Var(name) => TValue::Var(name),
        Exp::Unary(op, exp) => {
            let src = emit_expression(instructions, *exp, ctx);
            let dst = ctx.fresh_var();
            instructions.push(TInstruction::Unary(TUnaryOp::from(op), src, dst.clone()));
            dst
        }
        // The result is the old value: copy it out before adjusting the
        // variable.
        Exp::PostfixIncDec(op, name) => {
            let result = ctx.fresh_var();
            let var = TValue::Var(name);
            instructions.push(TInstruction::Copy(var.clone(), result.clone()));
            instructions.push(TInstruction::Binary(
                TBinaryOp::from(op),
                var.clone(),
                TValue::Constant(1),
                var,
            ));
            result
        }
        Exp::Binary(op, left, right) if op.is_short_circuit() => {
            emit_short_circuit(instructions, TBinaryOp::from(op), *left, *right, ctx)
        }
        Exp::Binary(op, left, right) => {
            let v1 = emit_expression(instructions, *left, ctx);
            let v2 = emit_expression(instructions, *right, ctx);
            let dst = ctx.fresh_var();
            instructions.push(TInstruction::Binary(
                TBinaryOp::from(op),
                v1,
                v2,
                dst.clone(),
            ));
            dst
        }
        Exp::Assignment(var, rhs) => {
            let Exp::Var(name) = *var else {
                unreachable!("assignment targets are variables after validation")
            };
            let rhs = emit_expression(instructions, *rhs, ctx);
            let var = TValue::Var(name);
            instructions.push(TInstruction::Copy(rhs, var.clone()));
            var
        }
        Exp::Conditional(conditional) => emit_conditional(instructions, conditional, ctx),
        Exp::Call(name, args) => {
            let args = args
                .into_iter()
                .map(|arg| emit_expression(instructions, arg, ctx))
                .collect();
            let dst = ctx.fresh_var();
            instructions.push(TInstruction::FunCall {
                name,
                args,
                dst: dst.clone(),
            });
            dst
        }
    }
}

fn emit_vardecl(dec: VarDecl, instructions: &mut TInstructions, ctx: &mut Emitter) {
    if let Some(init) = dec.init {
        let rhs = emit_expression(instructions, init, ctx);
        instructions.push(TInstruction::Copy(rhs, TValue::Var(dec.name)));
    }
}

fn emit_declaration(dec: Declaration, instructions: &mut TInstructions, ctx: &mut Emitter) {
    match dec {
        Declaration::Var(vardec) => emit_vardecl(vardec, instructions, ctx),
        // Local function declarations produce no code.
        Declaration::Fun(_) => (),
    }
}

fn emit_forinit(init: ForInit, instructions: &mut TInstructions, ctx: &mut Emitter) {
    match init {
        ForInit::Decl(dec) => emit_vardecl(dec, instructions, ctx),
        ForInit::Exp(Some(exp)) => {
            let _ = emit_expression(instructions, exp, ctx);
        }
        ForInit::Exp(None) => (),
    }
}

fn emit_dowhile(dowhile: DoWhile, instructions: &mut TInstructions, ctx: &mut Emitter) {
    let start_label = format!("{}.start", dowhile.label);
    let continue_label = format!("{}.continue", dowhile.label);
    let break_label = format!("{}.break", dowhile.label);

    instructions.push(TInstruction::Label(start_label.clone()));
    emit_statement(*dowhile.body, instructions, ctx);
    instructions.push(TInstruction::Label(continue_label));

    let v = emit_expression(instructions, dowhile.condition, ctx);
    instructions.push(TInstruction::JumpIfNotZero(v, start_label));
    instructions.push(TInstruction::Label(break_label));
}

fn emit_while(while_st: While, instructions: &mut TInstructions, ctx: &mut Emitter) {
    let continue_label = format!("{}.continue", while_st.label);
    let break_label = format!("{}.break", while_st.label);

    instructions.push(TInstruction::Label(continue_label.clone()));
    let v = emit_expression(instructions, while_st.condition, ctx);
    instructions.push(TInstruction::JumpIfZero(v, break_label.clone()));

    emit_statement(*while_st.body, instructions, ctx);
    instructions.push(TInstruction::Jump(continue_label));
    instructions.push(TInstruction::Label(break_label));
}

fn emit_for(for_st: For, instructions: &mut TInstructions, ctx: &mut Emitter) {
    let start_label = format!("{}.start", for_st.label);
    let continue_label = format!("{}.continue", for_st.label);
    let break_label = format!("{}.break", for_st.label);

    emit_forinit(for_st.init, instructions, ctx);
    instructions.push(TInstruction::Label(start_label.clone()));

    if let Some(condition) = for_st.condition {
        let v = emit_expression(instructions, condition, ctx);
        instructions.push(TInstruction::JumpIfZero(v, break_label.clone()));
    }

    emit_statement(*for_st.body, instructions, ctx);
    instructions.push(TInstruction::Label(continue_label));

    if let Some(post) = for_st.post {
        let _ = emit_expression(instructions, post, ctx);
    }

    instructions.push(TInstruction::Jump(start_label));
    instructions.push(TInstruction::Label(break_label));
}

/// A case marker compares the enclosing switch's selector with the case
/// value and chains to the next case on mismatch. When a previous case
/// exists, control falling in from it must skip the comparison, hence the
/// `.fallthrough` detour around it. A default marker is just its label.
fn emit_case(case: Case, instructions: &mut TInstructions, ctx: &mut Emitter) {
    let has_prev = !case.prev_case_label.is_empty();
    let fallthrough_label = format!("{}.fallthrough", case.label);

    if has_prev {
        instructions.push(TInstruction::Jump(fallthrough_label.clone()));
    }

    instructions.push(TInstruction::Label(case.label));

    if let Some(value) = case.value {
        let case_val = emit_expression(instructions, value, ctx);
        let selector = ctx
            .switch_values
            .last()
            .expect("case markers always sit inside a switch")
            .clone();
        let result = ctx.fresh_var();
        instructions.push(TInstruction::Binary(
            TBinaryOp::Subtract,
            case_val,
            selector,
            result.clone(),
        ));
        instructions.push(TInstruction::JumpIfNotZero(result, case.next_case_label));
    }

    if has_prev {
        instructions.push(TInstruction::Label(fallthrough_label));
    }
}

/// The selector is evaluated once into its own temporary, then control jumps
/// to the first case label (or straight to the break label when there is
/// none). A block body keeps its hoisted declaration prefix ahead of the
/// dispatch jump so every slot exists no matter which case runs.
fn emit_switch(switch: Switch, instructions: &mut TInstructions, ctx: &mut Emitter) {
    let break_label = format!("{}.break", switch.label);

    let selector_val = emit_expression(instructions, switch.ctrl, ctx);
    let selector = ctx.fresh_var();
    instructions.push(TInstruction::Copy(selector_val, selector.clone()));
    ctx.switch_values.push(selector);

    let dispatch = TInstruction::Jump(switch.first_case_label);
    match *switch.body {
        Statement::Compound(block) => {
            let mut dispatched = false;
            for item in block.items {
                match item {
                    BlockItem::D(dec) if !dispatched => {
                        emit_declaration(dec, instructions, ctx);
                    }
                    item => {
                        if !dispatched {
                            instructions.push(dispatch.clone());
                            dispatched = true;
                        }
                        emit_block_item(item, instructions, ctx);
                    }
                }
            }
            if !dispatched {
                instructions.push(dispatch);
            }
        }
        body => {
            instructions.push(dispatch);
            emit_statement(body, instructions, ctx);
        }
    }

    instructions.push(TInstruction::Label(break_label));
    ctx.switch_values.pop();
}

fn emit_if(if_st: If, instructions: &mut TInstructions, ctx: &mut Emitter) {
    let c = emit_expression(instructions, if_st.condition, ctx);

    if let Some(els) = if_st.els {
        let else_label = ctx.fresh_label("else");
        let end_label = ctx.fresh_label("end");
        instructions.push(TInstruction::JumpIfZero(c, else_label.clone()));
        emit_statement(*if_st.then, instructions, ctx);
        instructions.push(TInstruction::Jump(end_label.clone()));
        instructions.push(TInstruction::Label(else_label));
        emit_statement(*els, instructions, ctx);
        instructions.push(TInstruction::Label(end_label));
    } else {
        let end_label = ctx.fresh_label("end");
        instructions.push(TInstruction::JumpIfZero(c, end_label.clone()));
        emit_statement(*if_st.then, instructions, ctx);
        instructions.push(TInstruction::Label(end_label));
    }
}

fn emit_statement(statement: Statement, instructions: &mut TInstructions, ctx: &mut Emitter) {
    use Statement as S;
    match statement {
        S::Return(e) => {
            let value = emit_expression(instructions, e, ctx);
            instructions.push(TInstruction::Return(value));
        }
        S::Exp(e) => {
            let _ = emit_expression(instructions, e, ctx);
        }
        S::If(if_st) => emit_if(if_st, instructions, ctx),
        S::Compound(block) => {
            for item in block.items {
                emit_block_item(item, instructions, ctx);
            }
        }
        S::Goto(target) => instructions.push(TInstruction::Jump(target)),
        S::Label(name) => instructions.push(TInstruction::Label(name)),
        S::While(while_st) => emit_while(while_st, instructions, ctx),
        S::DoWhile(dowhile) => emit_dowhile(dowhile, instructions, ctx),
        S::For(for_st) => emit_for(for_st, instructions, ctx),
        S::Break(label) => instructions.push(TInstruction::Jump(format!("{label}.break"))),
        S::Continue(label) => instructions.push(TInstruction::Jump(format!("{label}.continue"))),
        S::Switch(switch) => emit_switch(switch, instructions, ctx),
        S::Case(case) => emit_case(case, instructions, ctx),
        S::Null => (),
    }
}

fn emit_block_item(item: BlockItem, instructions: &mut TInstructions, ctx: &mut Emitter) {
    match item {
        BlockItem::S(s) => emit_statement(s, instructions, ctx),
        BlockItem::D(d) => emit_declaration(d, instructions, ctx),
    }
}

fn emit_function(
    name: Identifier,
    params: Vec<Identifier>,
    body: Block,
    ctx: &mut Emitter,
) -> TFunction {
    let mut instructions = TInstructions::new();
    for item in body.items {
        emit_block_item(item, &mut instructions, ctx);
    }

    // Falling off the end of a function returns 0.
    instructions.push(TInstruction::Return(TValue::Constant(0)));

    TFunction {
        name,
        params,
        body: instructions,
    }
}

/// Lowers the validated AST to three-address code, one [TFunction] per
/// function definition; pure declarations vanish here.
pub fn emit_tacky(ast: Ast, names: &mut NameFactory) -> TAst {
    let mut ctx = Emitter {
        names,
        switch_values: Vec::new(),
    };

    let functions = ast
        .declarations
        .into_iter()
        .filter_map(|dec| {
            let FunDecl { name, params, body } = dec;
            body.map(|body| emit_function(name, params, body, &mut ctx))
        })
        .collect();

    TAst { functions }
}
