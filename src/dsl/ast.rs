//! Abstract syntax tree for bytebeat expressions.
//!
//! A [`Program`] is an arena: every node lives in one `Vec` and children are
//! referenced by [`NodeId`]. The program owns the whole tree, so replacing or
//! dropping a program frees every node exactly once.

use std::fmt;

/// Index of a node inside its [`Program`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// The variables an expression may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Var {
    T,
    A,
    B,
    C,
    D,
    Sh,
    Mask,
}

impl Var {
    pub const ALL: [Var; 7] = [
        Var::T,
        Var::A,
        Var::B,
        Var::C,
        Var::D,
        Var::Sh,
        Var::Mask,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "t" => Some(Var::T),
            "a" => Some(Var::A),
            "b" => Some(Var::B),
            "c" => Some(Var::C),
            "d" => Some(Var::D),
            "sh" => Some(Var::Sh),
            "mask" => Some(Var::Mask),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Var::T => "t",
            Var::A => "a",
            Var::B => "b",
            Var::C => "c",
            Var::D => "d",
            Var::Sh => "sh",
            Var::Mask => "mask",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    BitNot,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
        }
    }
}

/// Built-in functions callable from expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Sin,
    Cos,
    Tan,
    Abs,
    Sqrt,
    Floor,
    Ceil,
    Pow,
    Min,
    Max,
    Clamp,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sin" => Some(Builtin::Sin),
            "cos" => Some(Builtin::Cos),
            "tan" => Some(Builtin::Tan),
            "abs" => Some(Builtin::Abs),
            "sqrt" => Some(Builtin::Sqrt),
            "floor" => Some(Builtin::Floor),
            "ceil" => Some(Builtin::Ceil),
            "pow" => Some(Builtin::Pow),
            "min" => Some(Builtin::Min),
            "max" => Some(Builtin::Max),
            "clamp" => Some(Builtin::Clamp),
            _ => None,
        }
    }

    /// Number of arguments the function accepts.
    pub fn arity(self) -> usize {
        match self {
            Builtin::Pow | Builtin::Min | Builtin::Max => 2,
            Builtin::Clamp => 3,
            _ => 1,
        }
    }
}

/// A call site. Names are resolved at parse time, but unknown names are kept
/// so they can be printed; they evaluate to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: Box<str>,
    pub builtin: Option<Builtin>,
    pub args: Box<[NodeId]>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Number(f64),
    Var(Var),
    Unary(UnaryOp, NodeId),
    Binary(BinaryOp, NodeId, NodeId),
    Ternary {
        cond: NodeId,
        then: NodeId,
        otherwise: NodeId,
    },
    Call(Call),
}

/// A compiled expression: a node arena plus its root.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Program {
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn write_node(&self, id: NodeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node(id) {
            Node::Number(n) => write!(f, "{n}"),
            Node::Var(v) => f.write_str(v.name()),
            Node::Unary(op, a) => {
                let sym = match op {
                    UnaryOp::Neg => "-",
                    UnaryOp::BitNot => "~",
                    UnaryOp::Not => "!",
                };
                f.write_str(sym)?;
                self.write_node(*a, f)
            }
            Node::Binary(op, a, b) => {
                f.write_str("(")?;
                self.write_node(*a, f)?;
                write!(f, " {} ", op.symbol())?;
                self.write_node(*b, f)?;
                f.write_str(")")
            }
            Node::Ternary {
                cond,
                then,
                otherwise,
            } => {
                f.write_str("(")?;
                self.write_node(*cond, f)?;
                f.write_str(" ? ")?;
                self.write_node(*then, f)?;
                f.write_str(" : ")?;
                self.write_node(*otherwise, f)?;
                f.write_str(")")
            }
            Node::Call(call) => {
                write!(f, "{}(", call.name)?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    self.write_node(*arg, f)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Prints the program fully parenthesised, e.g. `(1 + (2 * 3))`.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(self.root, f)
    }
}

/// Incremental builder used by the parser. Nodes are appended children-first,
/// so a finished program never references a node that does not exist.
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    nodes: Vec<Node>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn finish(self, root: NodeId) -> Program {
        Program {
            nodes: self.nodes,
            root,
        }
    }
}
