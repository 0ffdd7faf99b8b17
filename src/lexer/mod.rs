mod cursor;
mod lexer_error;
#[cfg(test)]
mod lexer_tests;
mod token;

use cursor::Cursor;
pub use lexer_error::{InnerLexError, LexError};
pub use token::{Position, Token, TokenKind};

pub type Tokens = Vec<Token>;

fn lex_mcharop3(first: char, second: char, third: char) -> Option<TokenKind> {
    match (first, second, third) {
        ('<', '<', '=') => Some(TokenKind::AssignShl),
        ('>', '>', '=') => Some(TokenKind::AssignShr),
        _ => None,
    }
}

fn lex_mcharop2(first: char, second: char) -> Option<TokenKind> {
    match (first, second) {
        ('-', '-') => Some(TokenKind::Decrement),
        ('+', '+') => Some(TokenKind::Increment),
        ('&', '&') => Some(TokenKind::LogicalAnd),
        ('|', '|') => Some(TokenKind::LogicalOr),
        ('=', '=') => Some(TokenKind::IsEqual),
        ('!', '=') => Some(TokenKind::IsNotEqual),
        ('<', '=') => Some(TokenKind::IsLessThanOrEqual),
        ('>', '=') => Some(TokenKind::IsGreaterThanOrEqual),
        ('<', '<') => Some(TokenKind::ShiftLeft),
        ('>', '>') => Some(TokenKind::ShiftRight),
        ('+', '=') => Some(TokenKind::AssignAdd),
        ('-', '=') => Some(TokenKind::AssignSub),
        ('*', '=') => Some(TokenKind::AssignMul),
        ('/', '=') => Some(TokenKind::AssignDiv),
        ('%', '=') => Some(TokenKind::AssignMod),
        ('&', '=') => Some(TokenKind::AssignAnd),
        ('|', '=') => Some(TokenKind::AssignOr),
        ('^', '=') => Some(TokenKind::AssignXor),
        _ => None,
    }
}

/// Maximal munch over the operator family: try the 3-char forms, then the
/// 2-char forms, then fall back to the single character.
fn lex_mcharoperator(cursor: &mut Cursor) -> Result<TokenKind, InnerLexError> {
    let first = cursor.take().expect("is always Some");
    let second = cursor.peek();
    let third = cursor.peek_2nd();

    if let (Some(second), Some(third)) = (second, third) {
        if let Some(op) = lex_mcharop3(first, second, third) {
            cursor.take();
            cursor.take();
            return Ok(op);
        }
    }

    if let Some(second) = second {
        if let Some(op) = lex_mcharop2(first, second) {
            cursor.take();
            return Ok(op);
        }
    }

    TokenKind::try_from(first)
}

fn lex_constant(cursor: &mut Cursor) -> Result<TokenKind, InnerLexError> {
    let start = cursor.as_str();
    let mut count = 0;

    while cursor.skip_if(|c| c.is_ascii_digit()) {
        count += 1;
    }

    // A constant must not run straight into a name, as in `1foo`.
    let is_bad = |c: &char| c.is_alphabetic() || *c == '_';
    if let Some(bad_suffix) = cursor.peek().filter(is_bad) {
        return Err(InnerLexError::BadConstantSuffix(bad_suffix));
    }

    let const_str = &start[..count];
    let parsed = const_str
        .parse::<i64>()
        .map_err(|_| InnerLexError::BadConstant(const_str.to_owned()))?;

    Ok(TokenKind::Constant(parsed))
}

fn lex_identifier(cursor: &mut Cursor) -> TokenKind {
    let start = cursor.as_str();
    let mut len = 0;

    while cursor.skip_if(|c| c.is_ascii_alphanumeric() || c == '_') {
        len += 1;
    }

    TokenKind::from(&start[..len])
}

/// Tokenizes `input`, skipping whitespace between tokens. Fails with a
/// position-tagged error on the first character no token kind matches.
pub fn lex(input: &str) -> Result<Tokens, LexError> {
    let mut tokens = Tokens::new();
    let mut cursor = Cursor::new(input);
    cursor.skip_whitespaces();

    while let Some(peek) = cursor.peek() {
        let pos = cursor.get_pos();
        let kind = match peek {
            '(' | ')' | '{' | '}' | ';' | ',' | '~' | '?' | ':' => {
                cursor.take();
                TokenKind::try_from(peek)
            }
            '-' | '+' | '*' | '/' | '%' | '!' | '=' | '<' | '>' | '&' | '|' | '^' => {
                lex_mcharoperator(&mut cursor)
            }
            '_' | 'a'..='z' | 'A'..='Z' => Ok(lex_identifier(&mut cursor)),
            '0'..='9' => lex_constant(&mut cursor),
            _ => Err(InnerLexError::UnexpectedChar(peek)),
        }
        .map_err(|err| err.set_pos(pos))?;
        tokens.push(Token::new(kind, pos));
        cursor.skip_whitespaces();
    }

    Ok(tokens)
}
