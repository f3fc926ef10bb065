//! Expression compiler. JavaScript-flavored text is normalized, tokenized
//! and parsed into an arena [`Program`].

pub mod ast;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod normalize;
pub mod parser;
pub mod token;

pub use ast::{Program, Var};
pub use error::{CompileError, ErrorKind};
pub use eval::{to_i32, to_u32, EvalContext};
pub use normalize::normalize;

use parser::Parser;

/// The bytebeat compiler.
pub struct Compiler;

impl Compiler {
    /// Parse an already-normalized expression.
    pub fn parse(source: &str) -> Result<Program, CompileError> {
        Parser::new(source).parse()
    }

    /// Normalize JavaScript-flavored text and compile it.
    pub fn compile(text: &str) -> Result<Program, CompileError> {
        Self::parse(&normalize(text))
    }
}
