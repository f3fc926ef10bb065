//! Token types for the bytebeat expression lexer.

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub col: usize,
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(f64),
    Ident(String),

    // Punctuation
    LParen,
    RParen,
    Comma,
    Question,
    Colon,

    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // Unary-only
    Tilde, // ~
    Bang,  // !

    // Comparison
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    NotEq,

    // Logical
    AndAnd,
    OrOr,

    // Bitwise
    Amp,
    Pipe,
    Caret,
    Shl,  // <<
    Shr,  // >>
    UShr, // >>>

    Eof,
}

impl TokenKind {
    /// Short human-readable form used in error messages.
    pub fn describe(&self) -> String {
        let s = match self {
            TokenKind::Number(n) => return format!("number {n}"),
            TokenKind::Ident(name) => return format!("identifier '{name}'"),
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::Comma => ",",
            TokenKind::Question => "?",
            TokenKind::Colon => ":",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Tilde => "~",
            TokenKind::Bang => "!",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::Le => "<=",
            TokenKind::Ge => ">=",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::AndAnd => "&&",
            TokenKind::OrOr => "||",
            TokenKind::Amp => "&",
            TokenKind::Pipe => "|",
            TokenKind::Caret => "^",
            TokenKind::Shl => "<<",
            TokenKind::Shr => ">>",
            TokenKind::UShr => ">>>",
            TokenKind::Eof => return "end of input".to_string(),
        };
        format!("'{s}'")
    }
}
