use super::*;

fn kinds(input: &str) -> Vec<TokenKind> {
    lex(input)
        .expect("should lex")
        .into_iter()
        .map(TokenKind::from)
        .collect()
}

#[test]
fn test_basic1() {
    let input = "int main(void) {}";
    let expected = vec![
        TokenKind::Int,
        TokenKind::Identifier(String::from("main")),
        TokenKind::OpenParen,
        TokenKind::Void,
        TokenKind::CloseParen,
        TokenKind::OpenBrace,
        TokenKind::CloseBrace,
    ];
    assert_eq!(expected, kinds(input));
}

#[test]
fn test_keywords_vs_identifiers() {
    let input = "return returned switch switcher default defaulted";
    let expected = vec![
        TokenKind::Return,
        TokenKind::Identifier(String::from("returned")),
        TokenKind::Switch,
        TokenKind::Identifier(String::from("switcher")),
        TokenKind::KwDefault,
        TokenKind::Identifier(String::from("defaulted")),
    ];
    assert_eq!(expected, kinds(input));
}

#[test]
fn test_maximal_munch_shifts() {
    assert_eq!(
        vec![
            TokenKind::Identifier(String::from("a")),
            TokenKind::AssignShl,
            TokenKind::Constant(1),
            TokenKind::Semicolon,
        ],
        kinds("a <<= 1;")
    );
    assert_eq!(
        vec![
            TokenKind::Identifier(String::from("a")),
            TokenKind::ShiftLeft,
            TokenKind::Assign,
            TokenKind::Constant(1),
            TokenKind::Semicolon,
        ],
        kinds("a << = 1;")
    );
}

#[test]
fn test_maximal_munch_incdec() {
    assert_eq!(
        vec![
            TokenKind::Identifier(String::from("a")),
            TokenKind::Decrement,
            TokenKind::Hyphen,
            TokenKind::Identifier(String::from("b")),
        ],
        kinds("a---b")
    );
}

#[test]
fn test_bad_atsign() {
    let lexed = lex("int main(void) {\nreturn 0@1;\n}");
    let err = lexed.expect_err("should fail");
    assert_eq!(Position { line: 2, column: 9 }, err.get_pos());
}

#[test]
fn test_bad_constant_suffix() {
    let lexed = lex("int main(void) { return 1foo; }");
    assert!(lexed.is_err());
}

#[test]
fn test_positions() {
    let tokens = lex("int a;\n  a = 3;").expect("should lex");
    let positions: Vec<Position> = tokens.iter().map(Token::get_pos).collect();
    let expected = vec![
        Position { line: 1, column: 1 },
        Position { line: 1, column: 5 },
        Position { line: 1, column: 6 },
        Position { line: 2, column: 3 },
        Position { line: 2, column: 5 },
        Position { line: 2, column: 7 },
        Position { line: 2, column: 8 },
    ];
    assert_eq!(expected, positions);
}

// Concatenating every lexeme plus the skipped whitespace must reconstruct
// the input.
#[test]
fn test_lexeme_roundtrip() {
    let input = "int main ( void ) { int a = 1 ; a <<= 2 ; return a != 4 ? 0 : ~ a ; }";
    let tokens = lex(input).expect("should lex");
    let rebuilt = tokens
        .iter()
        .map(|t| t.get_kind().lexeme())
        .collect::<Vec<_>>()
        .join(" ");
    assert_eq!(input, rebuilt);
}

#[test]
fn test_precedence_stream() {
    let input = "int main(void) {\nreturn (0 == 0 && 3 == 2 + 1 > 1) + 1;\n}";
    let expected = vec![
        TokenKind::Int,
        TokenKind::Identifier(String::from("main")),
        TokenKind::OpenParen,
        TokenKind::Void,
        TokenKind::CloseParen,
        TokenKind::OpenBrace,
        TokenKind::Return,
        TokenKind::OpenParen,
        TokenKind::Constant(0),
        TokenKind::IsEqual,
        TokenKind::Constant(0),
        TokenKind::LogicalAnd,
        TokenKind::Constant(3),
        TokenKind::IsEqual,
        TokenKind::Constant(2),
        TokenKind::Plus,
        TokenKind::Constant(1),
        TokenKind::IsGreaterThan,
        TokenKind::Constant(1),
        TokenKind::CloseParen,
        TokenKind::Plus,
        TokenKind::Constant(1),
        TokenKind::Semicolon,
        TokenKind::CloseBrace,
    ];
    assert_eq!(expected, kinds(input));
}
