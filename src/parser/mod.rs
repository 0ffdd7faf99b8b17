mod cursor;
mod parse_error;
#[cfg(test)]
mod parser_tests;

use crate::ast::*;
use crate::lexer::{Token, TokenKind};
use cursor::Cursor;
pub use parse_error::{InnerParseError, ParseError, Result};

fn get_prec(token: &TokenKind) -> u64 {
    match token {
        TokenKind::Asterisk | TokenKind::FSlash | TokenKind::Percent => 50,
        TokenKind::Plus | TokenKind::Hyphen => 45,
        TokenKind::ShiftLeft | TokenKind::ShiftRight => 40,
        TokenKind::IsLessThan
        | TokenKind::IsLessThanOrEqual
        | TokenKind::IsGreaterThan
        | TokenKind::IsGreaterThanOrEqual => 35,
        TokenKind::IsEqual | TokenKind::IsNotEqual => 30,
        TokenKind::BitwiseAnd => 25,
        TokenKind::BitwiseXor => 20,
        TokenKind::BitwiseOr => 15,
        TokenKind::LogicalAnd => 10,
        TokenKind::LogicalOr => 5,
        TokenKind::QuestionMark => 3,
        t if t.is_compound_assign() => 1,
        TokenKind::Assign => 1,
        _ => 0,
    }
}

impl TryFrom<&TokenKind> for BinaryOp {
    type Error = InnerParseError;
    fn try_from(value: &TokenKind) -> std::result::Result<Self, InnerParseError> {
        match value {
            TokenKind::Plus => Ok(Self::Add),
            TokenKind::Hyphen => Ok(Self::Subtract),
            TokenKind::Asterisk => Ok(Self::Multiply),
            TokenKind::FSlash => Ok(Self::Divide),
            TokenKind::Percent => Ok(Self::Remainder),
            TokenKind::BitwiseAnd => Ok(Self::BitAnd),
            TokenKind::BitwiseOr => Ok(Self::BitOr),
            TokenKind::BitwiseXor => Ok(Self::BitXor),
            TokenKind::ShiftLeft => Ok(Self::ShiftLeft),
            TokenKind::ShiftRight => Ok(Self::ShiftRight),
            TokenKind::IsLessThan => Ok(Self::LessThan),
            TokenKind::IsLessThanOrEqual => Ok(Self::LessOrEqual),
            TokenKind::IsGreaterThan => Ok(Self::GreaterThan),
            TokenKind::IsGreaterThanOrEqual => Ok(Self::GreaterOrEqual),
            TokenKind::IsEqual => Ok(Self::Equal),
            TokenKind::IsNotEqual => Ok(Self::NotEqual),
            TokenKind::LogicalAnd => Ok(Self::LogicalAnd),
            TokenKind::LogicalOr => Ok(Self::LogicalOr),
            _ => Err(InnerParseError::UnexpectedToken(value.clone())),
        }
    }
}

fn parse_identifier(cursor: &mut Cursor) -> Result<Identifier> {
    let pos = cursor.get_pos();
    let next = cursor.next_or_error()?;
    if let TokenKind::Identifier(name) = next {
        Ok(name.clone())
    } else {
        Err(InnerParseError::ExpectedIdentifierButGot(next.clone()).set_pos(pos))
    }
}

fn parse_exp_compassign(cursor: &mut Cursor, prec: u64, left: Exp) -> Result<Exp> {
    let pos = cursor.get_pos();
    let t = cursor.next_or_error()?.clone();
    let single = t.compound_to_single();
    let op = BinaryOp::try_from(&single).map_err(|err| err.set_pos(pos))?;

    // `lhs op= rhs` is sugar for `lhs = lhs op rhs`.
    let right = parse_exp(cursor, prec).map(Box::new)?;
    let operation = Exp::Binary(op, Box::new(left.clone()), right);
    Ok(Exp::Assignment(Box::new(left), Box::new(operation)))
}

fn parse_exp_assign(cursor: &mut Cursor, prec: u64, left: Exp) -> Result<Exp> {
    cursor.expect(&TokenKind::Assign)?;
    let right = parse_exp(cursor, prec).map(Box::new)?;
    Ok(Exp::Assignment(Box::new(left), right))
}

fn parse_exp_conditional(cursor: &mut Cursor, prec: u64, left: Exp) -> Result<Exp> {
    cursor.expect(&TokenKind::QuestionMark)?;
    let then = parse_exp(cursor, 0).map(Box::new)?;
    cursor.expect(&TokenKind::Colon)?;
    let els = parse_exp(cursor, prec).map(Box::new)?;
    let conditional = Conditional {
        condition: Box::new(left),
        then,
        els,
    };

    Ok(Exp::Conditional(conditional))
}

fn parse_exp_binary(cursor: &mut Cursor, prec: u64, left: Exp) -> Result<Exp> {
    let pos = cursor.get_pos();
    let next = cursor.next_or_error()?;
    let op = BinaryOp::try_from(next).map_err(|err| err.set_pos(pos))?;
    let right = parse_exp(cursor, prec + 1).map(Box::new)?;
    Ok(Exp::Binary(op, Box::new(left), right))
}

/// Precedence climbing; assignment and `?:` are right-associative, the rest
/// associate left.
fn parse_exp(cursor: &mut Cursor, min_prec: u64) -> Result<Exp> {
    let mut left = parse_factor(cursor)?;

    while let Some(next_token) = cursor.peek().filter(|t| t.is_binaryop()) {
        let prec = get_prec(next_token);
        if prec < min_prec {
            break;
        }
        left = match next_token {
            t if t.is_compound_assign() => parse_exp_compassign(cursor, prec, left)?,
            TokenKind::Assign => parse_exp_assign(cursor, prec, left)?,
            TokenKind::QuestionMark => parse_exp_conditional(cursor, prec, left)?,
            _ => parse_exp_binary(cursor, prec, left)?,
        };
    }

    Ok(left)
}

impl TryFrom<&TokenKind> for UnaryOp {
    type Error = InnerParseError;
    fn try_from(value: &TokenKind) -> std::result::Result<Self, InnerParseError> {
        match value {
            TokenKind::Hyphen => Ok(Self::Negate),
            TokenKind::Tilde => Ok(Self::Complement),
            TokenKind::LogicalNot => Ok(Self::Not),
            _ => Err(InnerParseError::UnexpectedToken(value.clone())),
        }
    }
}

fn parse_prefix_incdec(cursor: &mut Cursor) -> Result<Exp> {
    let next = cursor.next_or_error()?;
    let op = if matches!(next, TokenKind::Increment) {
        BinaryOp::Add
    } else {
        BinaryOp::Subtract
    };

    // `++lhs` is sugar for `lhs = lhs + 1`.
    let operand = parse_factor(cursor)?;
    let one = Exp::Constant(1);
    let operation = Exp::Binary(op, Box::new(operand.clone()), Box::new(one));
    Ok(Exp::Assignment(Box::new(operand), Box::new(operation)))
}

fn parse_unary_operation(cursor: &mut Cursor) -> Result<Exp> {
    let pos = cursor.get_pos();
    let next = cursor.next_or_error()?;
    let op = UnaryOp::try_from(next).map_err(|err| err.set_pos(pos))?;
    let inner = parse_factor(cursor).map(Box::new)?;

    Ok(Exp::Unary(op, inner))
}

fn parse_arguments(cursor: &mut Cursor) -> Result<Vec<Exp>> {
    let mut args = Vec::new();

    if !cursor.peek_is(&TokenKind::CloseParen) {
        loop {
            let exp = parse_exp(cursor, 0)?;
            args.push(exp);
            if !cursor.bump_if(&TokenKind::Comma) {
                break;
            }
        }
    }

    Ok(args)
}

fn parse_factor_call(cursor: &mut Cursor, name: Identifier) -> Result<Exp> {
    cursor.expect(&TokenKind::OpenParen)?;
    let arguments = parse_arguments(cursor)?;
    cursor.expect(&TokenKind::CloseParen)?;
    Ok(Exp::Call(name, arguments))
}

fn parse_factor_identifier(cursor: &mut Cursor) -> Result<Exp> {
    let name = parse_identifier(cursor)?;
    match cursor.peek() {
        Some(TokenKind::OpenParen) => parse_factor_call(cursor, name),
        // Postfix ++/-- binds only directly after a variable factor.
        Some(TokenKind::Increment) => {
            cursor.bump();
            Ok(Exp::PostfixIncDec(IncDecOp::Inc, name))
        }
        Some(TokenKind::Decrement) => {
            cursor.bump();
            Ok(Exp::PostfixIncDec(IncDecOp::Dec, name))
        }
        _ => Ok(Exp::Var(name)),
    }
}

fn parse_factor_subexp(cursor: &mut Cursor) -> Result<Exp> {
    cursor.expect(&TokenKind::OpenParen)?;
    let exp = parse_exp(cursor, 0)?;
    cursor.expect(&TokenKind::CloseParen)?;
    Ok(exp)
}

fn parse_factor(cursor: &mut Cursor) -> Result<Exp> {
    let peek = cursor.peek_or_error()?;
    match peek {
        TokenKind::Constant(c) => {
            let constant = Exp::Constant(*c as i32);
            cursor.bump();
            Ok(constant)
        }
        TokenKind::Identifier(_) => parse_factor_identifier(cursor),
        TokenKind::OpenParen => parse_factor_subexp(cursor),
        TokenKind::Increment | TokenKind::Decrement => parse_prefix_incdec(cursor),
        t if t.is_unaryop() => parse_unary_operation(cursor),
        _ => {
            let peek = peek.clone();
            let pos = cursor.get_pos();
            Err(InnerParseError::BadFactor(peek).set_pos(pos))
        }
    }
}

fn parse_return(cursor: &mut Cursor) -> Result<Statement> {
    cursor.expect(&TokenKind::Return)?;
    let exp = parse_exp(cursor, 0)?;
    cursor.expect(&TokenKind::Semicolon)?;
    Ok(Statement::Return(exp))
}

fn parse_if(cursor: &mut Cursor) -> Result<Statement> {
    cursor.expect(&TokenKind::If)?;
    cursor.expect(&TokenKind::OpenParen)?;
    let condition = parse_exp(cursor, 0)?;
    cursor.expect(&TokenKind::CloseParen)?;
    let then = parse_statement(cursor).map(Box::new)?;
    let else_present = cursor.bump_if(&TokenKind::Else);
    let els = else_present
        .then(|| parse_statement(cursor))
        .transpose()?
        .map(Box::new);
    let if_st = If {
        condition,
        then,
        els,
    };

    Ok(Statement::If(if_st))
}

fn parse_while(cursor: &mut Cursor) -> Result<Statement> {
    cursor.expect(&TokenKind::While)?;
    cursor.expect(&TokenKind::OpenParen)?;
    let condition = parse_exp(cursor, 0)?;
    cursor.expect(&TokenKind::CloseParen)?;
    let body = parse_statement(cursor).map(Box::new)?;
    let while_st = While {
        condition,
        body,
        label: String::new(),
    };

    Ok(Statement::While(while_st))
}

fn parse_dowhile(cursor: &mut Cursor) -> Result<Statement> {
    cursor.expect(&TokenKind::Do)?;
    let body = parse_statement(cursor).map(Box::new)?;
    cursor.expect(&TokenKind::While)?;
    cursor.expect(&TokenKind::OpenParen)?;
    let condition = parse_exp(cursor, 0)?;
    cursor.expect(&TokenKind::CloseParen)?;
    cursor.expect(&TokenKind::Semicolon)?;
    let dowhile = DoWhile {
        body,
        condition,
        label: String::new(),
    };

    Ok(Statement::DoWhile(dowhile))
}

fn parse_optional_exp(cursor: &mut Cursor, delim: &TokenKind) -> Result<Option<Exp>> {
    let not_met_delim = !cursor.bump_if(delim);
    let exp = not_met_delim.then(|| parse_exp(cursor, 0)).transpose()?;

    if not_met_delim {
        cursor.expect(delim)?;
    }

    Ok(exp)
}

fn parse_forinit(cursor: &mut Cursor) -> Result<ForInit> {
    if cursor.peek_is(&TokenKind::Int) {
        let pos = cursor.get_pos();
        match parse_declaration(cursor)? {
            Declaration::Var(dec) => Ok(ForInit::Decl(dec)),
            Declaration::Fun(_) => Err(InnerParseError::BadForInit.set_pos(pos)),
        }
    } else {
        let exp = parse_optional_exp(cursor, &TokenKind::Semicolon)?;
        Ok(ForInit::Exp(exp))
    }
}

fn parse_for(cursor: &mut Cursor) -> Result<Statement> {
    cursor.expect(&TokenKind::For)?;
    cursor.expect(&TokenKind::OpenParen)?;
    let init = parse_forinit(cursor)?;
    let condition = parse_optional_exp(cursor, &TokenKind::Semicolon)?;
    let post = parse_optional_exp(cursor, &TokenKind::CloseParen)?;
    let body = parse_statement(cursor).map(Box::new)?;
    let for_st = For {
        init,
        condition,
        post,
        body,
        label: String::new(),
    };

    Ok(Statement::For(for_st))
}

fn parse_break(cursor: &mut Cursor) -> Result<Statement> {
    cursor.expect(&TokenKind::Break)?;
    cursor.expect(&TokenKind::Semicolon)?;
    Ok(Statement::Break(String::new()))
}

fn parse_continue(cursor: &mut Cursor) -> Result<Statement> {
    cursor.expect(&TokenKind::Continue)?;
    cursor.expect(&TokenKind::Semicolon)?;
    Ok(Statement::Continue(String::new()))
}

fn parse_goto(cursor: &mut Cursor) -> Result<Statement> {
    cursor.expect(&TokenKind::Goto)?;
    let target = parse_identifier(cursor)?;
    cursor.expect(&TokenKind::Semicolon)?;
    Ok(Statement::Goto(target))
}

fn parse_label(cursor: &mut Cursor) -> Result<Statement> {
    let name = parse_identifier(cursor)?;
    cursor.expect(&TokenKind::Colon)?;
    Ok(Statement::Label(name))
}

fn parse_case(cursor: &mut Cursor) -> Result<Statement> {
    cursor.expect(&TokenKind::Case)?;
    let value = parse_exp(cursor, 0)?;
    cursor.expect(&TokenKind::Colon)?;
    Ok(Statement::Case(Case {
        value: Some(value),
        label: String::new(),
        prev_case_label: String::new(),
        next_case_label: String::new(),
    }))
}

fn parse_default_case(cursor: &mut Cursor) -> Result<Statement> {
    cursor.expect(&TokenKind::KwDefault)?;
    cursor.expect(&TokenKind::Colon)?;
    Ok(Statement::Case(Case {
        value: None,
        label: String::new(),
        prev_case_label: String::new(),
        next_case_label: String::new(),
    }))
}

/// Variable declarations before the first `case` marker become uninitialized
/// and move to the start of the block, so the dispatch jump cannot skip a
/// definition. Their initializers are unreachable anyway and are dropped.
fn hoist_switch_decls(block: Block) -> Block {
    let mut decls = BlockItems::new();
    let mut rest = BlockItems::new();
    let mut seen_case = false;

    for item in block.items {
        match item {
            BlockItem::D(Declaration::Var(mut dec)) if !seen_case => {
                dec.init = None;
                decls.push(BlockItem::D(Declaration::Var(dec)));
            }
            item => {
                if matches!(item, BlockItem::S(Statement::Case(_))) {
                    seen_case = true;
                }
                rest.push(item);
            }
        }
    }

    decls.extend(rest);
    Block { items: decls }
}

fn parse_switch(cursor: &mut Cursor) -> Result<Statement> {
    cursor.expect(&TokenKind::Switch)?;
    cursor.expect(&TokenKind::OpenParen)?;
    let ctrl = parse_exp(cursor, 0)?;
    cursor.expect(&TokenKind::CloseParen)?;
    let body = parse_statement(cursor)?;
    let body = match body {
        Statement::Compound(block) => Statement::Compound(hoist_switch_decls(block)),
        other => other,
    };
    let switch = Switch {
        ctrl,
        body: Box::new(body),
        label: String::new(),
        first_case_label: String::new(),
    };

    Ok(Statement::Switch(switch))
}

fn parse_statement_exp(cursor: &mut Cursor) -> Result<Statement> {
    let exp = parse_exp(cursor, 0)?;
    cursor.expect(&TokenKind::Semicolon)?;
    Ok(Statement::Exp(exp))
}

fn parse_statement_label_or_exp(cursor: &mut Cursor) -> Result<Statement> {
    let second = cursor.peek_nth_or_error(1)?;
    if matches!(second, TokenKind::Colon) {
        parse_label(cursor)
    } else {
        parse_statement_exp(cursor)
    }
}

fn parse_statement(cursor: &mut Cursor) -> Result<Statement> {
    let peek = cursor.peek_or_error()?;
    match peek {
        TokenKind::Return => parse_return(cursor),
        TokenKind::If => parse_if(cursor),
        TokenKind::While => parse_while(cursor),
        TokenKind::Do => parse_dowhile(cursor),
        TokenKind::For => parse_for(cursor),
        TokenKind::Break => parse_break(cursor),
        TokenKind::Continue => parse_continue(cursor),
        TokenKind::Goto => parse_goto(cursor),
        TokenKind::Switch => parse_switch(cursor),
        TokenKind::Case => parse_case(cursor),
        TokenKind::KwDefault => parse_default_case(cursor),
        TokenKind::Identifier(_) => parse_statement_label_or_exp(cursor),
        TokenKind::Semicolon => {
            cursor.bump();
            Ok(Statement::Null)
        }
        TokenKind::OpenBrace => {
            let block = parse_block(cursor)?;
            Ok(Statement::Compound(block))
        }
        _ => parse_statement_exp(cursor),
    }
}

/// A leading `int` starts either a variable declaration or a function
/// declaration/definition; nested function *definitions* pass the grammar
/// and are rejected during validation.
fn parse_declaration(cursor: &mut Cursor) -> Result<Declaration> {
    cursor.expect(&TokenKind::Int)?;
    let name = parse_identifier(cursor)?;

    if cursor.peek_is(&TokenKind::OpenParen) {
        cursor.bump();
        let params = parse_params(cursor)?;
        cursor.expect(&TokenKind::CloseParen)?;
        let has_body = !cursor.bump_if(&TokenKind::Semicolon);
        let body = has_body.then(|| parse_block(cursor)).transpose()?;
        return Ok(Declaration::Fun(FunDecl { name, params, body }));
    }

    let init = if cursor.bump_if(&TokenKind::Assign) {
        Some(parse_exp(cursor, 0)?)
    } else {
        None
    };
    cursor.expect(&TokenKind::Semicolon)?;
    Ok(Declaration::Var(VarDecl { name, init }))
}

fn parse_block_item(cursor: &mut Cursor) -> Result<BlockItem> {
    let peek = cursor.peek_or_error()?;
    match peek {
        TokenKind::Int => parse_declaration(cursor).map(BlockItem::D),
        _ => parse_statement(cursor).map(BlockItem::S),
    }
}

fn parse_block(cursor: &mut Cursor) -> Result<Block> {
    let mut items = BlockItems::new();

    cursor.expect(&TokenKind::OpenBrace)?;

    while !cursor.bump_if(&TokenKind::CloseBrace) {
        let item = parse_block_item(cursor)?;
        items.push(item);
    }

    Ok(Block { items })
}

/// A parameter list is either `void` or a comma-separated run of
/// `int <name>`. Duplicate parameter names pass the grammar and are caught
/// during identifier resolution.
fn parse_params(cursor: &mut Cursor) -> Result<Vec<Identifier>> {
    let mut params = Vec::new();

    if cursor.bump_if(&TokenKind::Void) {
        return Ok(params);
    }

    loop {
        cursor.expect(&TokenKind::Int)?;
        let param = parse_identifier(cursor)?;
        params.push(param);
        if !cursor.bump_if(&TokenKind::Comma) {
            break;
        }
    }

    Ok(params)
}

fn parse_function(cursor: &mut Cursor) -> Result<FunDecl> {
    cursor.expect(&TokenKind::Int)?;
    let name = parse_identifier(cursor)?;
    cursor.expect(&TokenKind::OpenParen)?;
    let params = parse_params(cursor)?;
    cursor.expect(&TokenKind::CloseParen)?;

    let has_body = !cursor.bump_if(&TokenKind::Semicolon);
    let body = has_body.then(|| parse_block(cursor)).transpose()?;

    Ok(FunDecl { name, params, body })
}

/// Parses a whole program. The loop runs until every token is consumed, so
/// trailing junk after the last declaration fails instead of being ignored.
pub fn parse(tokens: &[Token]) -> Result<Ast> {
    let mut declarations = Vec::new();
    let mut cursor = Cursor::new(tokens);

    while !cursor.at_end() {
        let f = parse_function(&mut cursor)?;
        declarations.push(f);
    }

    Ok(Ast { declarations })
}
