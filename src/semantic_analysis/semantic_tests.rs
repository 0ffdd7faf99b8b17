use super::*;
use crate::lexer;
use crate::parser;

fn try_validate(src: &str) -> Result<(Ast, Environments)> {
    let tokens = lexer::lex(src).expect("should lex");
    let ast = parser::parse(&tokens).expect("should parse");
    let mut names = NameFactory::new();
    validate(ast, &mut names)
}

fn validate_ok(src: &str) -> (Ast, Environments) {
    try_validate(src).expect("should validate")
}

fn main_body(ast: &Ast) -> &Block {
    ast.declarations
        .iter()
        .find(|dec| dec.body.is_some())
        .and_then(|dec| dec.body.as_ref())
        .expect("a function body")
}

#[test]
fn test_undefined_variable() {
    let err = try_validate("int main(void) { return a; }").unwrap_err();
    assert_eq!(SemAnalysisError::VariableNotDeclared("a".into()), err);
}

#[test]
fn test_duplicate_declaration_in_same_scope() {
    let err = try_validate("int main(void) { int a = 1; int a = 2; return a; }").unwrap_err();
    assert_eq!(SemAnalysisError::IdentifierRedeclaration("a".into()), err);
}

#[test]
fn test_shadowing_in_inner_block_is_fine() {
    let (ast, _) = validate_ok("int main(void) { int a = 1; { int a = 2; a = 3; } return a; }");

    // The two declarations got distinct unique names.
    let items = &main_body(&ast).items;
    let BlockItem::D(Declaration::Var(outer)) = &items[0] else {
        panic!("expected outer declaration");
    };
    let BlockItem::S(Statement::Compound(inner_block)) = &items[1] else {
        panic!("expected inner block");
    };
    let BlockItem::D(Declaration::Var(inner)) = &inner_block.items[0] else {
        panic!("expected inner declaration");
    };
    assert_ne!(outer.name, inner.name);

    // The assignment refers to the inner one, the return to the outer one.
    let BlockItem::S(Statement::Exp(Exp::Assignment(target, _))) = &inner_block.items[1] else {
        panic!("expected assignment");
    };
    assert_eq!(Exp::Var(inner.name.clone()), **target);
    let BlockItem::S(Statement::Return(Exp::Var(returned))) = &items[2] else {
        panic!("expected return");
    };
    assert_eq!(&outer.name, returned);
}

#[test]
fn test_param_redeclared_in_body() {
    let err = try_validate("int f(int a) { int a = 1; return a; }").unwrap_err();
    assert_eq!(SemAnalysisError::IdentifierRedeclaration("a".into()), err);
}

#[test]
fn test_param_shadowed_in_nested_block_is_fine() {
    assert!(try_validate("int f(int a) { { int a = 1; } return a; }").is_ok());
}

#[test]
fn test_duplicate_parameters() {
    let err = try_validate("int f(int a, int a);").unwrap_err();
    assert_eq!(SemAnalysisError::DuplicateParamNames("f".into()), err);
}

#[test]
fn test_goto_unknown_label() {
    let err = try_validate("int main(void) { goto nowhere; return 0; }").unwrap_err();
    assert_eq!(SemAnalysisError::UnknownLabel("nowhere".into()), err);
}

#[test]
fn test_duplicate_label() {
    let err = try_validate("int main(void) { l: l: return 0; }").unwrap_err();
    assert_eq!(SemAnalysisError::LabelRedeclaration("l".into()), err);
}

#[test]
fn test_goto_and_label_agree_on_unique_name() {
    let (ast, _) = validate_ok("int main(void) { goto end; end: return 1; }");
    let items = &main_body(&ast).items;
    let BlockItem::S(Statement::Goto(target)) = &items[0] else {
        panic!("expected goto");
    };
    let BlockItem::S(Statement::Label(label)) = &items[1] else {
        panic!("expected label");
    };
    assert_eq!(target, label);
    assert_ne!(target, "end");
}

#[test]
fn test_label_before_declaration() {
    let err = try_validate("int main(void) { l: int a = 1; return a; }").unwrap_err();
    assert_eq!(SemAnalysisError::LabelBeforeDeclaration("l".into()), err);
}

#[test]
fn test_label_at_end_of_block() {
    let err = try_validate("int main(void) { return 0; l: }").unwrap_err();
    assert_eq!(SemAnalysisError::LabelAtEndOfBlock("l".into()), err);
}

#[test]
fn test_case_at_end_of_block() {
    let err = try_validate("int main(void) { switch (1) { case 1: } return 0; }").unwrap_err();
    assert!(matches!(err, SemAnalysisError::LabelAtEndOfBlock(_)));
}

#[test]
fn test_break_outside_of_loop() {
    let err = try_validate("int main(void) { break; }").unwrap_err();
    assert_eq!(SemAnalysisError::BreakOutsideOfLoop, err);
}

#[test]
fn test_continue_inside_switch_only() {
    let err =
        try_validate("int main(void) { switch (1) { case 1: continue; case 2: ; } return 0; }")
            .unwrap_err();
    assert_eq!(SemAnalysisError::ContinueOutsideOfLoop, err);
}

#[test]
fn test_case_outside_of_switch() {
    let err = try_validate("int main(void) { case 1: return 0; }").unwrap_err();
    assert_eq!(SemAnalysisError::CaseNotInSwitch, err);
}

#[test]
fn test_duplicate_case_value() {
    let err = try_validate(
        "int main(void) { switch (1) { case 2: return 1; case 2: return 2; } return 0; }",
    )
    .unwrap_err();
    assert_eq!(SemAnalysisError::DuplicateCase("2".into()), err);
}

#[test]
fn test_duplicate_default() {
    let err = try_validate(
        "int main(void) { switch (1) { default: return 1; default: return 2; } return 0; }",
    )
    .unwrap_err();
    assert_eq!(SemAnalysisError::DuplicateCase("default".into()), err);
}

#[test]
fn test_case_value_must_be_constant() {
    let err = try_validate(
        "int main(void) { int a = 1; switch (1) { case a: return 1; } return 0; }",
    )
    .unwrap_err();
    assert!(matches!(err, SemAnalysisError::NotAConstCase(_)));
}

#[test]
fn test_nested_function_definition() {
    let err = try_validate("int main(void) { int f(void) { return 1; } return f(); }").unwrap_err();
    assert_eq!(SemAnalysisError::LocalFunDefinition("f".into()), err);
}

#[test]
fn test_local_function_declaration_is_fine() {
    assert!(try_validate("int main(void) { int f(void); return 0; }").is_ok());
}

#[test]
fn test_call_arity_mismatch() {
    let err = try_validate("int f(int a, int b); int main(void) { return f(1); }").unwrap_err();
    assert_eq!(
        SemAnalysisError::ExpectedArgsCountButGot(2, 1, "f".into()),
        err
    );
}

#[test]
fn test_function_redefinition() {
    let err = try_validate("int f(void) { return 1; } int f(void) { return 2; }").unwrap_err();
    assert_eq!(SemAnalysisError::FunctionRedefinition("f".into()), err);
}

#[test]
fn test_function_redeclared_with_different_arity() {
    let err = try_validate("int f(void); int f(int a);").unwrap_err();
    assert_eq!(SemAnalysisError::IncompatibleFunDec("f".into()), err);
}

#[test]
fn test_invalid_lvalue() {
    let err = try_validate("int main(void) { return 1 = 2; }").unwrap_err();
    assert!(matches!(err, SemAnalysisError::WrongLvalue(_)));
}

#[test]
fn test_prefix_increment_needs_lvalue() {
    let err = try_validate("int main(void) { int a = 1; return ++(a + 1); }").unwrap_err();
    assert!(matches!(err, SemAnalysisError::WrongLvalue(_)));
}

#[test]
fn test_variable_called_as_function() {
    let err = try_validate("int main(void) { int a = 1; return a(); }").unwrap_err();
    assert_eq!(SemAnalysisError::VariableCall("a".into()), err);
}

#[test]
fn test_function_used_as_variable() {
    let err = try_validate("int f(void); int main(void) { return f + 1; }").unwrap_err();
    assert_eq!(SemAnalysisError::FunctionNameAsVariable("f".into()), err);
}

#[test]
fn test_case_chain_links() {
    let (ast, _) = validate_ok(
        "int main(void) {\
           switch (2) {\
             case 1: return 1;\
             case 2: return 2;\
             default: return 3;\
           }\
           return 0;\
         }",
    );
    let items = &main_body(&ast).items;
    let BlockItem::S(Statement::Switch(switch)) = &items[0] else {
        panic!("expected switch");
    };
    assert_eq!("switch.0", switch.label);
    assert_eq!("switch.0.case.0", switch.first_case_label);

    let Statement::Compound(block) = switch.body.as_ref() else {
        panic!("expected block body");
    };
    let cases: Vec<&Case> = block
        .items
        .iter()
        .filter_map(|item| match item {
            BlockItem::S(Statement::Case(case)) => Some(case),
            _ => None,
        })
        .collect();
    assert_eq!(3, cases.len());

    assert_eq!("switch.0.case.0", cases[0].label);
    assert_eq!("", cases[0].prev_case_label);
    assert_eq!("switch.0.case.1", cases[0].next_case_label);

    assert_eq!("switch.0.case.1", cases[1].label);
    assert_eq!("switch.0.case.0", cases[1].prev_case_label);
    assert_eq!("switch.0.case.2", cases[1].next_case_label);

    // The default marker closes the chain towards the break label.
    assert_eq!("switch.0.case.2", cases[2].label);
    assert!(cases[2].value.is_none());
    assert_eq!("switch.0.break", cases[2].next_case_label);
}

#[test]
fn test_environments_track_definedness() {
    let (_, env) = validate_ok("int declared(int a); int defined(void) { return 0; }");
    assert!(!env.is_function_defined("declared"));
    assert!(env.is_function_defined("defined"));
    assert!(!env.is_function_defined("never_mentioned"));
}
