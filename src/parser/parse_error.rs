use crate::lexer::{Position, TokenKind};
use std::fmt::{Display, Formatter};

pub type Result<T> = std::result::Result<T, ParseError>;

#[derive(Debug, PartialEq)]
pub enum InnerParseError {
    ExpectedButGot(TokenKind, TokenKind),
    ExpectedIdentifierButGot(TokenKind),
    UnexpectedToken(TokenKind),
    BadFactor(TokenKind),
    BadForInit,
    UnexpectedEof,
}

#[derive(Debug, PartialEq)]
pub struct ParseError {
    pub inner: InnerParseError,
    pub pos: Position,
}

impl ParseError {
    pub fn get_pos(&self) -> Position {
        self.pos
    }
}

impl InnerParseError {
    pub fn set_pos(self, pos: Position) -> ParseError {
        ParseError { inner: self, pos }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} at {}", self.inner, self.pos)
    }
}

impl Display for InnerParseError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        use InnerParseError as PE;
        match self {
            PE::ExpectedButGot(expected, got) => {
                write!(f, "expected token '{expected}', but got '{got}'")
            }
            PE::ExpectedIdentifierButGot(t) => write!(f, "expected identifier, but got '{t}'"),
            PE::UnexpectedToken(t) => write!(f, "unexpected token '{t}'"),
            PE::BadFactor(t) => write!(f, "bad factor '{t}'"),
            PE::BadForInit => write!(
                f,
                "function declarations are not allowed in a for loop initializer"
            ),
            PE::UnexpectedEof => write!(f, "reached unexpected EOF"),
        }
    }
}

impl std::error::Error for ParseError {}
impl std::error::Error for InnerParseError {}
