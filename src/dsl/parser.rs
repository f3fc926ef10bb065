//! Recursive-descent parser for bytebeat expressions.
//!
//! Precedence, loosest to tightest:
//!
//! ```text
//! ?:  ||  &&  |  ^  &  == !=  < > <= >=  << >> >>>  + -  * / %  unary - ~ !
//! ```
//!
//! The ternary operator is right-associative; every binary level is
//! left-associative.

use super::ast::*;
use super::error::CompileError;
use super::lexer::Lexer;
use super::token::{Token, TokenKind};

/// Maximum depth of the finished tree and of parser recursion. Keeps both
/// parsing and per-sample evaluation well inside the audio thread's stack.
pub const MAX_DEPTH: usize = 128;

pub struct Parser {
    lexer: Lexer,
    current: Token,
    builder: ProgramBuilder,
    depths: Vec<usize>,
    nesting: usize,
}

type BinaryLevel = fn(&mut Parser) -> Result<NodeId, CompileError>;

impl Parser {
    pub fn new(source: &str) -> Self {
        Self {
            lexer: Lexer::new(source),
            current: Token {
                kind: TokenKind::Eof,
                line: 1,
                col: 1,
            },
            builder: ProgramBuilder::new(),
            depths: Vec::new(),
            nesting: 0,
        }
    }

    /// Parse the whole input as one expression.
    ///
    /// Fails if anything but end of input follows the expression.
    pub fn parse(mut self) -> Result<Program, CompileError> {
        self.advance()?;
        let root = self.parse_expr()?;
        if self.current.kind != TokenKind::Eof {
            return Err(self.error(format!(
                "unexpected trailing tokens starting at {}",
                self.current.kind.describe()
            )));
        }
        Ok(self.builder.finish(root))
    }

    fn parse_expr(&mut self) -> Result<NodeId, CompileError> {
        self.enter()?;
        let result = self.parse_ternary();
        self.nesting -= 1;
        result
    }

    fn parse_ternary(&mut self) -> Result<NodeId, CompileError> {
        let cond = self.parse_or()?;
        if !self.eat(TokenKind::Question)? {
            return Ok(cond);
        }

        let then = self.parse_expr()?;
        if !self.eat(TokenKind::Colon)? {
            return Err(self.error(format!(
                "expected ':' in ternary operator, got {}",
                self.current.kind.describe()
            )));
        }
        self.enter()?;
        let otherwise = self.parse_ternary();
        self.nesting -= 1;
        let otherwise = otherwise?;

        self.push(Node::Ternary {
            cond,
            then,
            otherwise,
        })
    }

    fn parse_or(&mut self) -> Result<NodeId, CompileError> {
        self.binary_level(Self::parse_and, |k| match k {
            TokenKind::OrOr => Some(BinaryOp::Or),
            _ => None,
        })
    }

    fn parse_and(&mut self) -> Result<NodeId, CompileError> {
        self.binary_level(Self::parse_bit_or, |k| match k {
            TokenKind::AndAnd => Some(BinaryOp::And),
            _ => None,
        })
    }

    fn parse_bit_or(&mut self) -> Result<NodeId, CompileError> {
        self.binary_level(Self::parse_bit_xor, |k| match k {
            TokenKind::Pipe => Some(BinaryOp::BitOr),
            _ => None,
        })
    }

    fn parse_bit_xor(&mut self) -> Result<NodeId, CompileError> {
        self.binary_level(Self::parse_bit_and, |k| match k {
            TokenKind::Caret => Some(BinaryOp::BitXor),
            _ => None,
        })
    }

    fn parse_bit_and(&mut self) -> Result<NodeId, CompileError> {
        self.binary_level(Self::parse_equality, |k| match k {
            TokenKind::Amp => Some(BinaryOp::BitAnd),
            _ => None,
        })
    }

    fn parse_equality(&mut self) -> Result<NodeId, CompileError> {
        self.binary_level(Self::parse_relational, |k| match k {
            TokenKind::EqEq => Some(BinaryOp::Eq),
            TokenKind::NotEq => Some(BinaryOp::Ne),
            _ => None,
        })
    }

    fn parse_relational(&mut self) -> Result<NodeId, CompileError> {
        self.binary_level(Self::parse_shift, |k| match k {
            TokenKind::Lt => Some(BinaryOp::Lt),
            TokenKind::Gt => Some(BinaryOp::Gt),
            TokenKind::Le => Some(BinaryOp::Le),
            TokenKind::Ge => Some(BinaryOp::Ge),
            _ => None,
        })
    }

    fn parse_shift(&mut self) -> Result<NodeId, CompileError> {
        self.binary_level(Self::parse_additive, |k| match k {
            TokenKind::Shl => Some(BinaryOp::Shl),
            TokenKind::Shr => Some(BinaryOp::Shr),
            TokenKind::UShr => Some(BinaryOp::UShr),
            _ => None,
        })
    }

    fn parse_additive(&mut self) -> Result<NodeId, CompileError> {
        self.binary_level(Self::parse_multiplicative, |k| match k {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn parse_multiplicative(&mut self) -> Result<NodeId, CompileError> {
        self.binary_level(Self::parse_unary, |k| match k {
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            TokenKind::Percent => Some(BinaryOp::Mod),
            _ => None,
        })
    }

    /// One left-associative level: `next (op next)*`.
    fn binary_level(
        &mut self,
        next: BinaryLevel,
        op_for: fn(&TokenKind) -> Option<BinaryOp>,
    ) -> Result<NodeId, CompileError> {
        let mut left = next(self)?;
        while let Some(op) = op_for(&self.current.kind) {
            self.advance()?;
            let right = next(self)?;
            left = self.push(Node::Binary(op, left, right))?;
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<NodeId, CompileError> {
        let op = match self.current.kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Tilde => UnaryOp::BitNot,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.parse_primary(),
        };
        self.advance()?;

        self.enter()?;
        let operand = self.parse_unary();
        self.nesting -= 1;
        let operand = operand?;

        self.push(Node::Unary(op, operand))
    }

    fn parse_primary(&mut self) -> Result<NodeId, CompileError> {
        match &self.current.kind {
            TokenKind::Number(n) => {
                let n = *n;
                self.advance()?;
                self.push(Node::Number(n))
            }
            TokenKind::Ident(name) => {
                let name = name.clone();
                let (line, col) = (self.current.line, self.current.col);
                self.advance()?;

                if self.eat(TokenKind::LParen)? {
                    return self.parse_call(name);
                }

                match Var::from_name(&name) {
                    Some(var) => self.push(Node::Var(var)),
                    None => Err(CompileError::parse(
                        format!("unknown identifier '{name}'"),
                        line,
                        col,
                    )),
                }
            }
            TokenKind::LParen => {
                self.advance()?;
                let inner = self.parse_expr()?;
                if !self.eat(TokenKind::RParen)? {
                    return Err(self.error(format!(
                        "expected ')', got {}",
                        self.current.kind.describe()
                    )));
                }
                Ok(inner)
            }
            TokenKind::Eof => Err(self.error("unexpected end of input, expected expression")),
            other => Err(self.error(format!("expected expression, got {}", other.describe()))),
        }
    }

    /// Argument list after `name(`. Arity is not checked here.
    fn parse_call(&mut self, name: String) -> Result<NodeId, CompileError> {
        let mut args = Vec::new();
        if !self.eat(TokenKind::RParen)? {
            loop {
                args.push(self.parse_expr()?);
                if self.eat(TokenKind::RParen)? {
                    break;
                }
                if !self.eat(TokenKind::Comma)? {
                    return Err(self.error(format!(
                        "expected ',' or ')' in arguments to '{name}', got {}",
                        self.current.kind.describe()
                    )));
                }
            }
        }

        let builtin = Builtin::from_name(&name);
        self.push(Node::Call(Call {
            name: name.into_boxed_str(),
            builtin,
            args: args.into_boxed_slice(),
        }))
    }

    // --- Utility methods ---

    fn advance(&mut self) -> Result<(), CompileError> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    /// Consume the current token if it has the given kind.
    fn eat(&mut self, kind: TokenKind) -> Result<bool, CompileError> {
        if self.current.kind == kind {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn enter(&mut self) -> Result<(), CompileError> {
        self.nesting += 1;
        if self.nesting > MAX_DEPTH {
            self.nesting -= 1;
            return Err(self.error("expression nested too deeply"));
        }
        Ok(())
    }

    fn push(&mut self, node: Node) -> Result<NodeId, CompileError> {
        let child_depth = match &node {
            Node::Number(_) | Node::Var(_) => 0,
            Node::Unary(_, a) => self.depths[a.index()],
            Node::Binary(_, a, b) => self.depths[a.index()].max(self.depths[b.index()]),
            Node::Ternary {
                cond,
                then,
                otherwise,
            } => self.depths[cond.index()]
                .max(self.depths[then.index()])
                .max(self.depths[otherwise.index()]),
            Node::Call(call) => call
                .args
                .iter()
                .map(|a| self.depths[a.index()])
                .max()
                .unwrap_or(0),
        };
        let depth = child_depth + 1;
        if depth > MAX_DEPTH {
            return Err(self.error("expression nested too deeply"));
        }
        self.depths.push(depth);
        Ok(self.builder.push(node))
    }

    fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::parse(message, self.current.line, self.current.col)
    }
}
