use super::token::Position;
use std::str::Chars;

#[derive(Clone)]
pub struct Cursor<'a> {
    chars: Chars<'a>,
    pos: Position,
}

impl<'a> Cursor<'a> {
    pub fn new(s: &'a str) -> Self {
        Self {
            chars: s.chars(),
            pos: Position::start(),
        }
    }

    pub fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    pub fn peek_2nd(&self) -> Option<char> {
        // cheap to clone
        let mut chars = self.chars.clone();
        chars.next();
        chars.next()
    }

    pub fn take(&mut self) -> Option<char> {
        let c = self.chars.next();
        match c {
            Some('\n') => {
                self.pos.line += 1;
                self.pos.column = 1;
            }
            Some(_) => self.pos.column += 1,
            None => (),
        }
        c
    }

    pub fn skip_if(&mut self, p: impl FnOnce(char) -> bool) -> bool {
        let hit = self.peek().filter(|c| p(*c)).is_some();
        if hit {
            self.take();
        }
        hit
    }

    pub fn skip_whitespaces(&mut self) {
        while self.peek().filter(|c| c.is_whitespace()).is_some() {
            self.take();
        }
    }

    pub fn get_pos(&self) -> Position {
        self.pos
    }

    pub fn as_str(&self) -> &'a str {
        self.chars.as_str()
    }
}
