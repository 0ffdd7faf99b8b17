use crate::lexer::{Position, Token, TokenKind};
use crate::parser::{InnerParseError, Result};

#[derive(Debug)]
pub struct Cursor<'a> {
    tokens: &'a [Token],
    position: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Source position of the current token, or of the last one at EOF.
    pub fn get_pos(&self) -> Position {
        self.tokens
            .get(self.position)
            .or_else(|| self.tokens.last())
            .map_or_else(Position::start, Token::get_pos)
    }

    pub fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.position).map(Token::get_kind)
    }

    pub fn peek_nth(&self, n: usize) -> Option<&TokenKind> {
        self.tokens.get(self.position + n).map(Token::get_kind)
    }

    pub fn peek_is(&self, t: &TokenKind) -> bool {
        self.peek() == Some(t)
    }

    pub fn bump(&mut self) {
        self.position += 1;
    }

    pub fn bump_if(&mut self, t: &TokenKind) -> bool {
        let condition = self.peek() == Some(t);
        if condition {
            self.bump();
        }
        condition
    }

    pub fn at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    pub fn expect(&mut self, t: &TokenKind) -> Result<()> {
        let pos = self.get_pos();
        let next = self.next_or_error()?;
        if next == t {
            Ok(())
        } else {
            let next = next.clone();
            Err(InnerParseError::ExpectedButGot(t.clone(), next).set_pos(pos))
        }
    }

    pub fn peek_or_error(&self) -> Result<&TokenKind> {
        self.peek()
            .ok_or_else(|| InnerParseError::UnexpectedEof.set_pos(self.get_pos()))
    }

    pub fn peek_nth_or_error(&self, n: usize) -> Result<&TokenKind> {
        self.peek_nth(n)
            .ok_or_else(|| InnerParseError::UnexpectedEof.set_pos(self.get_pos()))
    }

    pub fn next_or_error(&mut self) -> Result<&TokenKind> {
        let pos = self.get_pos();
        let next = self
            .tokens
            .get(self.position)
            .ok_or_else(|| InnerParseError::UnexpectedEof.set_pos(pos))?;
        self.position += 1;
        Ok(next.get_kind())
    }
}
