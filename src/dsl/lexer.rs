//! Lexer for bytebeat expressions.
//!
//! Converts source text into a stream of [`Token`]s, one at a time via
//! [`Lexer::next_token`] or all at once via [`Lexer::tokenize`].

use super::error::CompileError;
use super::token::{Token, TokenKind};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Lex the whole input, ending with an [`TokenKind::Eof`] token.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, CompileError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(tokens)
    }

    /// Produce the next token. Once the input is exhausted, every call
    /// returns [`TokenKind::Eof`].
    pub fn next_token(&mut self) -> Result<Token, CompileError> {
        self.skip_whitespace();

        if self.is_at_end() {
            return Ok(Token {
                kind: TokenKind::Eof,
                line: self.line,
                col: self.col,
            });
        }

        let ch = self.peek();
        match ch {
            '0'..='9' => self.lex_number(),
            'a'..='z' | 'A'..='Z' | '_' => Ok(self.lex_ident()),
            _ => self.lex_operator(),
        }
    }

    fn peek(&self) -> char {
        self.chars[self.pos]
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.pos];
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        ch
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn starts_with(&self, s: &str) -> bool {
        s.chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c))
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.peek().is_whitespace() {
            self.advance();
        }
    }

    fn lex_number(&mut self) -> Result<Token, CompileError> {
        let line = self.line;
        let col = self.col;

        if self.peek() == '0'
            && matches!(self.peek_at(1), Some('x' | 'X'))
            && self.peek_at(2).is_some_and(|c| c.is_ascii_hexdigit())
        {
            self.advance();
            self.advance();
            let mut digits = String::new();
            while !self.is_at_end() && self.peek().is_ascii_hexdigit() {
                digits.push(self.advance());
            }
            let val = u64::from_str_radix(&digits, 16).map_err(|_| {
                CompileError::lex(format!("invalid number: 0x{digits}"), line, col)
            })?;
            return Ok(Token {
                kind: TokenKind::Number(val as f64),
                line,
                col,
            });
        }

        let mut s = String::new();
        while !self.is_at_end() && self.peek().is_ascii_digit() {
            s.push(self.advance());
        }

        if !self.is_at_end() && self.peek() == '.' {
            s.push(self.advance());
            let mut fraction = false;
            while !self.is_at_end() && self.peek().is_ascii_digit() {
                s.push(self.advance());
                fraction = true;
            }
            if !fraction {
                s.push('0');
            }
        }

        // Exponent only when a digit actually follows, so `2e` stays `2` then `e`.
        if !self.is_at_end() && matches!(self.peek(), 'e' | 'E') {
            let signed = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                s.push(self.advance());
                if signed {
                    s.push(self.advance());
                }
                while !self.is_at_end() && self.peek().is_ascii_digit() {
                    s.push(self.advance());
                }
            }
        }

        let val: f64 = s
            .parse()
            .map_err(|_| CompileError::lex(format!("invalid number: {s}"), line, col))?;
        Ok(Token {
            kind: TokenKind::Number(val),
            line,
            col,
        })
    }

    fn lex_ident(&mut self) -> Token {
        let line = self.line;
        let col = self.col;
        let mut s = String::new();

        while !self.is_at_end() && (self.peek().is_ascii_alphanumeric() || self.peek() == '_') {
            s.push(self.advance());
        }

        Token {
            kind: TokenKind::Ident(s),
            line,
            col,
        }
    }

    fn lex_operator(&mut self) -> Result<Token, CompileError> {
        let line = self.line;
        let col = self.col;

        // Longest match first.
        const MULTI: [(&str, TokenKind); 9] = [
            (">>>", TokenKind::UShr),
            ("<<", TokenKind::Shl),
            (">>", TokenKind::Shr),
            ("<=", TokenKind::Le),
            (">=", TokenKind::Ge),
            ("==", TokenKind::EqEq),
            ("!=", TokenKind::NotEq),
            ("&&", TokenKind::AndAnd),
            ("||", TokenKind::OrOr),
        ];
        for (text, kind) in MULTI {
            if self.starts_with(text) {
                for _ in 0..text.len() {
                    self.advance();
                }
                return Ok(Token { kind, line, col });
            }
        }

        let ch = self.peek();
        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            '?' => TokenKind::Question,
            ':' => TokenKind::Colon,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '~' => TokenKind::Tilde,
            '!' => TokenKind::Bang,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            '&' => TokenKind::Amp,
            '|' => TokenKind::Pipe,
            '^' => TokenKind::Caret,
            _ => {
                return Err(CompileError::lex(
                    format!("unexpected character '{ch}'"),
                    line,
                    col,
                ));
            }
        };
        self.advance();
        Ok(Token { kind, line, col })
    }
}
