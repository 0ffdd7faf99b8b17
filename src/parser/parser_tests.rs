use super::*;
use crate::lexer;

fn parse_expression(src: &str) -> Exp {
    let tokens = lexer::lex(src).expect("should lex");
    let mut cursor = Cursor::new(&tokens);
    parse_exp(&mut cursor, 0).expect("should parse")
}

fn parse_program(src: &str) -> Ast {
    let tokens = lexer::lex(src).expect("should lex");
    parse(&tokens).expect("should parse")
}

#[test]
fn test_expression_precedence() {
    let parsed = parse_expression("1 * 2 - 3 * (4 + 5)");
    let expected = Exp::Binary(
        BinaryOp::Subtract,
        Box::new(Exp::Binary(
            BinaryOp::Multiply,
            Box::new(Exp::Constant(1)),
            Box::new(Exp::Constant(2)),
        )),
        Box::new(Exp::Binary(
            BinaryOp::Multiply,
            Box::new(Exp::Constant(3)),
            Box::new(Exp::Binary(
                BinaryOp::Add,
                Box::new(Exp::Constant(4)),
                Box::new(Exp::Constant(5)),
            )),
        )),
    );
    assert_eq!(expected, parsed);
}

#[test]
fn test_shift_binds_tighter_than_comparison() {
    let parsed = parse_expression("1 << 2 < 3");
    let expected = Exp::Binary(
        BinaryOp::LessThan,
        Box::new(Exp::Binary(
            BinaryOp::ShiftLeft,
            Box::new(Exp::Constant(1)),
            Box::new(Exp::Constant(2)),
        )),
        Box::new(Exp::Constant(3)),
    );
    assert_eq!(expected, parsed);
}

#[test]
fn test_assignment_is_right_associative() {
    let parsed = parse_expression("a = b = 1");
    let expected = Exp::Assignment(
        Box::new(Exp::Var("a".into())),
        Box::new(Exp::Assignment(
            Box::new(Exp::Var("b".into())),
            Box::new(Exp::Constant(1)),
        )),
    );
    assert_eq!(expected, parsed);
}

#[test]
fn test_compound_assignment_desugars() {
    let parsed = parse_expression("a += 2");
    let expected = Exp::Assignment(
        Box::new(Exp::Var("a".into())),
        Box::new(Exp::Binary(
            BinaryOp::Add,
            Box::new(Exp::Var("a".into())),
            Box::new(Exp::Constant(2)),
        )),
    );
    assert_eq!(expected, parsed);
}

#[test]
fn test_shift_compound_assignment_desugars() {
    let parsed = parse_expression("a <<= b");
    let expected = Exp::Assignment(
        Box::new(Exp::Var("a".into())),
        Box::new(Exp::Binary(
            BinaryOp::ShiftLeft,
            Box::new(Exp::Var("a".into())),
            Box::new(Exp::Var("b".into())),
        )),
    );
    assert_eq!(expected, parsed);
}

#[test]
fn test_prefix_increment_desugars() {
    let parsed = parse_expression("++a");
    let expected = Exp::Assignment(
        Box::new(Exp::Var("a".into())),
        Box::new(Exp::Binary(
            BinaryOp::Add,
            Box::new(Exp::Var("a".into())),
            Box::new(Exp::Constant(1)),
        )),
    );
    assert_eq!(expected, parsed);
}

#[test]
fn test_postfix_only_after_variable() {
    let parsed = parse_expression("a++");
    assert_eq!(Exp::PostfixIncDec(IncDecOp::Inc, "a".into()), parsed);

    let tokens = lexer::lex("int main(void) { return (a)++; }").expect("should lex");
    assert!(parse(&tokens).is_err());
}

#[test]
fn test_ternary_is_right_associative() {
    let parsed = parse_expression("a ? 1 : b ? 2 : 3");
    let expected = Exp::Conditional(Conditional {
        condition: Box::new(Exp::Var("a".into())),
        then: Box::new(Exp::Constant(1)),
        els: Box::new(Exp::Conditional(Conditional {
            condition: Box::new(Exp::Var("b".into())),
            then: Box::new(Exp::Constant(2)),
            els: Box::new(Exp::Constant(3)),
        })),
    });
    assert_eq!(expected, parsed);
}

#[test]
fn test_function_declaration_and_definition() {
    let ast = parse_program("int forward(int a, int b); int main(void) { return forward(1, 2); }");
    assert_eq!(2, ast.declarations.len());

    let forward = &ast.declarations[0];
    assert_eq!("forward", forward.name);
    assert_eq!(vec!["a".to_owned(), "b".to_owned()], forward.params);
    assert!(forward.body.is_none());

    let main = &ast.declarations[1];
    assert!(main.params.is_empty());
    assert!(main.body.is_some());
}

#[test]
fn test_label_is_a_marker_statement() {
    let ast = parse_program("int main(void) { top: return 0; }");
    let body = ast.declarations[0].body.as_ref().expect("has body");
    assert_eq!(
        vec![
            BlockItem::S(Statement::Label("top".into())),
            BlockItem::S(Statement::Return(Exp::Constant(0))),
        ],
        body.items
    );
}

#[test]
fn test_switch_hoists_leading_declarations() {
    let ast = parse_program(
        "int main(void) {\
           switch (1) {\
             int a = 5;\
             case 1: return a;\
             default: return 0;\
           }\
           return 2;\
         }",
    );
    let body = ast.declarations[0].body.as_ref().expect("has body");
    let BlockItem::S(Statement::Switch(switch)) = &body.items[0] else {
        panic!("expected a switch");
    };
    let Statement::Compound(block) = switch.body.as_ref() else {
        panic!("expected a block body");
    };

    // The declaration moved to the front and lost its initializer.
    assert_eq!(
        BlockItem::D(Declaration::Var(VarDecl {
            name: "a".into(),
            init: None
        })),
        block.items[0]
    );
    assert!(block.items[1..]
        .iter()
        .all(|item| !matches!(item, BlockItem::D(_))));
}

#[test]
fn test_declarations_after_first_case_stay_in_place() {
    let ast = parse_program(
        "int main(void) {\
           switch (1) {\
             case 1: ;\
             int b = 3;\
           }\
           return 0;\
         }",
    );
    let body = ast.declarations[0].body.as_ref().expect("has body");
    let BlockItem::S(Statement::Switch(switch)) = &body.items[0] else {
        panic!("expected a switch");
    };
    let Statement::Compound(block) = switch.body.as_ref() else {
        panic!("expected a block body");
    };
    assert_eq!(
        BlockItem::D(Declaration::Var(VarDecl {
            name: "b".into(),
            init: Some(Exp::Constant(3)),
        })),
        block.items[2]
    );
}

#[test]
fn test_unexpected_token_fails() {
    let tokens = lexer::lex("int main(void) { return 1 +; }").expect("should lex");
    assert!(parse(&tokens).is_err());
}

#[test]
fn test_trailing_tokens_fail() {
    let tokens = lexer::lex("int main(void) { return 0; } 42").expect("should lex");
    assert!(parse(&tokens).is_err());
}
