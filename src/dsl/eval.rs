//! Per-sample evaluation of a compiled [`Program`].
//!
//! Evaluation never fails: every edge case (division by near-zero, modulo by
//! zero, unknown function, wrong argument count) produces `0.0`. The walk is
//! recursive over the arena and does not allocate.

use super::ast::{BinaryOp, Builtin, Node, NodeId, Program, UnaryOp, Var};

/// Divisors smaller than this in magnitude make `/` yield zero.
const DIV_EPSILON: f64 = 1e-12;
/// Tolerance for `==` and `!=`.
const EQ_EPSILON: f64 = 1e-12;
/// Arguments past this count are ignored.
const MAX_ARGS: usize = 8;

/// Variable bindings for one sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EvalContext {
    pub t: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub sh: f64,
    pub mask: f64,
}

impl EvalContext {
    #[inline]
    pub fn get(&self, var: Var) -> f64 {
        match var {
            Var::T => self.t,
            Var::A => self.a,
            Var::B => self.b,
            Var::C => self.c,
            Var::D => self.d,
            Var::Sh => self.sh,
            Var::Mask => self.mask,
        }
    }
}

/// Convert to a 32-bit integer: floor, round to `i64`, then wrap.
#[inline]
pub fn to_i32(v: f64) -> i32 {
    (v.floor().round() as i64) as i32
}

/// [`to_i32`] reinterpreted as unsigned.
#[inline]
pub fn to_u32(v: f64) -> u32 {
    to_i32(v) as u32
}

#[inline]
fn truth(v: f64) -> bool {
    v != 0.0
}

#[inline]
fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

impl Program {
    /// Evaluate the program for one sample.
    pub fn eval(&self, ctx: &EvalContext) -> f64 {
        self.eval_node(self.root(), ctx)
    }

    fn eval_node(&self, id: NodeId, ctx: &EvalContext) -> f64 {
        match self.node(id) {
            Node::Number(n) => *n,
            Node::Var(var) => ctx.get(*var),
            Node::Unary(op, a) => {
                let a = self.eval_node(*a, ctx);
                match op {
                    UnaryOp::Neg => -a,
                    UnaryOp::BitNot => f64::from(!to_i32(a)),
                    UnaryOp::Not => flag(a == 0.0),
                }
            }
            Node::Binary(BinaryOp::And, a, b) => {
                flag(truth(self.eval_node(*a, ctx)) && truth(self.eval_node(*b, ctx)))
            }
            Node::Binary(BinaryOp::Or, a, b) => {
                flag(truth(self.eval_node(*a, ctx)) || truth(self.eval_node(*b, ctx)))
            }
            Node::Binary(op, a, b) => {
                let a = self.eval_node(*a, ctx);
                let b = self.eval_node(*b, ctx);
                binary(*op, a, b)
            }
            Node::Ternary {
                cond,
                then,
                otherwise,
            } => {
                if truth(self.eval_node(*cond, ctx)) {
                    self.eval_node(*then, ctx)
                } else {
                    self.eval_node(*otherwise, ctx)
                }
            }
            Node::Call(call) => {
                let mut vals = [0.0; MAX_ARGS];
                let argc = call.args.len().min(MAX_ARGS);
                for (slot, arg) in vals.iter_mut().zip(&call.args[..argc]) {
                    *slot = self.eval_node(*arg, ctx);
                }
                match call.builtin {
                    Some(f) => call_builtin(f, &vals[..argc]),
                    None => 0.0,
                }
            }
        }
    }
}

fn binary(op: BinaryOp, a: f64, b: f64) -> f64 {
    let shift = |b: f64| (to_i32(b) & 31) as u32;
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b.abs() < DIV_EPSILON {
                0.0
            } else {
                a / b
            }
        }
        BinaryOp::Mod => match to_i32(b) {
            0 => 0.0,
            ib => f64::from(to_i32(a).wrapping_rem(ib)),
        },
        BinaryOp::Lt => flag(a < b),
        BinaryOp::Gt => flag(a > b),
        BinaryOp::Le => flag(a <= b),
        BinaryOp::Ge => flag(a >= b),
        BinaryOp::Eq => flag((a - b).abs() < EQ_EPSILON),
        BinaryOp::Ne => flag((a - b).abs() >= EQ_EPSILON),
        BinaryOp::BitAnd => f64::from(to_i32(a) & to_i32(b)),
        BinaryOp::BitOr => f64::from(to_i32(a) | to_i32(b)),
        BinaryOp::BitXor => f64::from(to_i32(a) ^ to_i32(b)),
        BinaryOp::Shl => f64::from(to_i32(a).wrapping_shl(shift(b))),
        BinaryOp::Shr => f64::from(to_i32(a) >> shift(b)),
        BinaryOp::UShr => f64::from(to_u32(a) >> shift(b)),
        // Short-circuit operators are handled before operands are evaluated.
        BinaryOp::And => flag(truth(a) && truth(b)),
        BinaryOp::Or => flag(truth(a) || truth(b)),
    }
}

/// Apply a builtin. Wrong argument counts yield zero.
fn call_builtin(f: Builtin, args: &[f64]) -> f64 {
    if args.len() != f.arity() {
        return 0.0;
    }
    match f {
        Builtin::Sin => args[0].sin(),
        Builtin::Cos => args[0].cos(),
        Builtin::Tan => args[0].tan(),
        Builtin::Abs => args[0].abs(),
        Builtin::Sqrt => args[0].abs().sqrt(),
        Builtin::Floor => args[0].floor(),
        Builtin::Ceil => args[0].ceil(),
        Builtin::Pow => args[0].powf(args[1]),
        Builtin::Min => args[0].min(args[1]),
        Builtin::Max => args[0].max(args[1]),
        Builtin::Clamp => args[1].max(args[2].min(args[0])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::Compiler;
    use assert_approx_eq::assert_approx_eq;

    fn ctx() -> EvalContext {
        EvalContext {
            t: 0.0,
            a: 5.0,
            b: 3.0,
            c: 7.0,
            d: 10.0,
            sh: 8.0,
            mask: 127.0,
        }
    }

    fn eval(src: &str) -> f64 {
        eval_at(src, &ctx())
    }

    fn eval_at(src: &str, ctx: &EvalContext) -> f64 {
        Compiler::compile(src).unwrap().eval(ctx)
    }

    #[test]
    fn to_i32_floors_first() {
        assert_eq!(to_i32(5.9), 5);
        assert_eq!(to_i32(-5.1), -6);
        assert_eq!(to_i32(0.0), 0);
    }

    #[test]
    fn to_i32_wraps_on_overflow() {
        assert_eq!(to_i32(4_294_967_296.0), 0);
        assert_eq!(to_i32(2_147_483_648.0), i32::MIN);
        assert_eq!(to_u32(-1.0), u32::MAX);
    }

    #[test]
    fn precedence_examples() {
        assert_eq!(eval("1+2*3"), 7.0);
        assert_eq!(eval("(1+2)*3"), 9.0);
        assert_eq!(eval("1?2:3"), 2.0);
        assert_eq!(eval("0?2:3"), 3.0);
    }

    #[test]
    fn variables_read_context() {
        let c = EvalContext { t: 42.0, ..ctx() };
        assert_eq!(eval_at("t", &c), 42.0);
        assert_eq!(eval("a+b+c+d"), 25.0);
        assert_eq!(eval("sh"), 8.0);
        assert_eq!(eval("mask"), 127.0);
    }

    #[test]
    fn unary_operators() {
        assert_eq!(eval("-a"), -5.0);
        assert_eq!(eval("~0"), -1.0);
        assert_eq!(eval("~5.5"), -6.0);
        assert_eq!(eval("!0"), 1.0);
        assert_eq!(eval("!3"), 0.0);
        assert_eq!(eval("!0.5"), 0.0);
    }

    #[test]
    fn division_guard() {
        assert_eq!(eval("1/0"), 0.0);
        assert_eq!(eval("1/0.0000000000001"), 0.0);
        assert_eq!(eval("7/2"), 3.5);
    }

    #[test]
    fn modulo_truncates_and_guards() {
        assert_eq!(eval("7%3"), 1.0);
        assert_eq!(eval("-7%3"), -1.0);
        assert_eq!(eval("7.9%3.2"), 1.0);
        assert_eq!(eval("5%0"), 0.0);
        assert_eq!(eval("5%0.5"), 0.0);
    }

    #[test]
    fn modulo_does_not_trap_on_min_by_minus_one() {
        assert_eq!(eval("-2147483648%-1"), 0.0);
    }

    #[test]
    fn comparisons_use_epsilon_for_equality() {
        assert_eq!(eval("0.1+0.2==0.3"), 1.0);
        assert_eq!(eval("0.1+0.2!=0.3"), 0.0);
        assert_eq!(eval("1==2"), 0.0);
        assert_eq!(eval("1<2"), 1.0);
        assert_eq!(eval("2<=2"), 1.0);
        assert_eq!(eval("2>3"), 0.0);
        assert_eq!(eval("3>=2"), 1.0);
    }

    #[test]
    fn logical_operators_short_circuit_and_normalise() {
        assert_eq!(eval("0&&(1/0)"), 0.0);
        assert_eq!(eval("1||(1/0)"), 1.0);
        assert_eq!(eval("5&&7"), 1.0);
        assert_eq!(eval("0||7"), 1.0);
        assert_eq!(eval("0||0"), 0.0);
    }

    #[test]
    fn bitwise_operators() {
        assert_eq!(eval("12&10"), 8.0);
        assert_eq!(eval("12|3"), 15.0);
        assert_eq!(eval("12^10"), 6.0);
        assert_eq!(eval("-1&255"), 255.0);
    }

    #[test]
    fn shift_amount_is_masked_to_five_bits() {
        assert_eq!(eval("1<<33"), 2.0);
        assert_eq!(eval("1<<33"), eval("1<<1"));
        assert_eq!(eval("256>>36"), 16.0);
        assert_eq!(eval("1<<31"), f64::from(i32::MIN));
    }

    #[test]
    fn unsigned_shift_fills_zeros() {
        assert_eq!(eval("-1>>>28"), 15.0);
        assert_eq!(eval("-1>>28"), -1.0);
        assert_eq!(eval("-1>>>0"), 4_294_967_295.0);
    }

    #[test]
    fn ternary_is_lazy() {
        // Both branches divide by zero; only the chosen one is evaluated.
        assert_eq!(eval("1?4:(1/0)"), 4.0);
        assert_eq!(eval("0?(1/0):4"), 4.0);
    }

    #[test]
    fn builtin_functions() {
        assert_approx_eq!(eval("sin(0)"), 0.0);
        assert_approx_eq!(eval("cos(0)"), 1.0);
        assert_approx_eq!(eval("tan(0)"), 0.0);
        assert_eq!(eval("abs(-3)"), 3.0);
        assert_eq!(eval("sqrt(-16)"), 4.0);
        assert_eq!(eval("floor(2.7)"), 2.0);
        assert_eq!(eval("ceil(2.1)"), 3.0);
        assert_eq!(eval("pow(2,10)"), 1024.0);
        assert_eq!(eval("min(a,b)"), 3.0);
        assert_eq!(eval("max(a,b)"), 5.0);
        assert_eq!(eval("clamp(300,0,255)"), 255.0);
        assert_eq!(eval("clamp(-4,0,255)"), 0.0);
        assert_eq!(eval("clamp(9,0,255)"), 9.0);
    }

    #[test]
    fn bad_calls_yield_zero() {
        assert_eq!(eval("nope(1)"), 0.0);
        assert_eq!(eval("sin()"), 0.0);
        assert_eq!(eval("sin(1,2)"), 0.0);
        assert_eq!(eval("pow(2)"), 0.0);
        assert_eq!(eval("max(1,2,3,4,5,6,7,8,9)"), 0.0);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let program = Compiler::compile("((t*a&t>>b)|(t*c&t>>d))+(sin(t/(20+d))*32)").unwrap();
        for t in [0.0, 1.0, 1000.0, 123_456.0] {
            let c = EvalContext { t, ..ctx() };
            assert_eq!(program.eval(&c).to_bits(), program.eval(&c).to_bits());
        }
    }
}
