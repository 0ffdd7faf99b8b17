use super::token::Position;
use std::{error, fmt};

#[derive(Debug, Eq, PartialEq)]
pub enum InnerLexError {
    UnexpectedChar(char),
    BadConstantSuffix(char),
    BadConstant(String),
    ExpectedOperatorOrSeparator(char),
}

#[derive(Debug, PartialEq, Eq)]
pub struct LexError {
    inner: InnerLexError,
    pos: Position,
}

impl LexError {
    pub fn get_pos(&self) -> Position {
        self.pos
    }
}

impl InnerLexError {
    pub(super) fn set_pos(self, pos: Position) -> LexError {
        LexError { inner: self, pos }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} at {}", self.inner, self.pos)
    }
}

impl error::Error for LexError {}

impl fmt::Display for InnerLexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnexpectedChar(c) => write!(f, "no token matches character: {c}"),
            Self::BadConstantSuffix(c) => write!(f, "bad constant suffix: {c}"),
            Self::BadConstant(s) => write!(f, "bad integer constant: {s}"),
            Self::ExpectedOperatorOrSeparator(c) => {
                write!(f, "expected operator or separator, but got: {c}")
            }
        }
    }
}

impl error::Error for InnerLexError {}
