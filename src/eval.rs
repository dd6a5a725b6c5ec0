//! Iterative AST evaluation.
//!
//! The evaluator has no environment: constants, the arithmetic operators and the
//! whitelisted functions are everything an expression can reach.
//!
//! Evaluation walks the tree with an explicit operation stack instead of
//! recursion, so a long flat chain such as `1+1+...+1` (whose left spine is as
//! deep as the chain is long) costs heap, not call stack.

extern crate alloc;

use alloc::format;
use alloc::string::ToString;
use alloc::vec::Vec;

use crate::Real;
use crate::engine::MAX_EXPRESSION_LENGTH;
use crate::error::{CalcError, Result};
use crate::functions;
use crate::types::{AstExpr, BinaryOperator, MathFunction, UnaryOperator};
use crate::value::Value;

/// Maximum number of pending operations.
///
/// A tree parsed from an input within [`MAX_EXPRESSION_LENGTH`] never needs
/// more than two pending operations per input byte.
pub const MAX_STACK_DEPTH: usize = 2 * MAX_EXPRESSION_LENGTH + 16;

const INITIAL_OP_CAPACITY: usize = 32;
const INITIAL_VALUE_CAPACITY: usize = 16;

/// Operations pushed onto the evaluation stack
enum EvalOp<'a> {
    /// Evaluate a subtree and push its value
    Eval(&'a AstExpr),
    /// Apply a prefix operator to the value on top of the stack
    ApplyUnary(UnaryOperator),
    /// Apply an operator to the two values on top of the stack
    CompleteBinary(BinaryOperator),
    /// Call a function with the top `argc` values as its arguments
    ApplyFunction { function: MathFunction, argc: usize },
}

/// Evaluates a parsed expression.
///
/// ```
/// use calc_rs::engine::parse_expression;
/// use calc_rs::eval::eval_ast;
/// use calc_rs::Value;
///
/// let ast = parse_expression("math.sqrt(16) + 1").unwrap();
/// assert_eq!(eval_ast(&ast).unwrap(), Value::Float(5.0));
/// ```
pub fn eval_ast(ast: &AstExpr) -> Result<Value> {
    let mut op_stack: Vec<EvalOp<'_>> = Vec::with_capacity(INITIAL_OP_CAPACITY);
    let mut value_stack: Vec<Value> = Vec::with_capacity(INITIAL_VALUE_CAPACITY);
    op_stack.push(EvalOp::Eval(ast));

    while let Some(op) = op_stack.pop() {
        match op {
            EvalOp::Eval(expr) => match expr {
                AstExpr::Constant(value) => value_stack.push(*value),
                AstExpr::Unary { op, operand } => {
                    op_stack.push(EvalOp::ApplyUnary(*op));
                    op_stack.push(EvalOp::Eval(operand.as_ref()));
                }
                AstExpr::Binary { op, left, right } => {
                    // Left is popped, and so evaluated, first
                    op_stack.push(EvalOp::CompleteBinary(*op));
                    op_stack.push(EvalOp::Eval(right.as_ref()));
                    op_stack.push(EvalOp::Eval(left.as_ref()));
                }
                AstExpr::Call { function, args } => {
                    op_stack.push(EvalOp::ApplyFunction {
                        function: *function,
                        argc: args.len(),
                    });
                    op_stack.extend(args.iter().rev().map(EvalOp::Eval));
                }
            },
            EvalOp::ApplyUnary(op) => {
                let operand = pop_value(&mut value_stack)?;
                value_stack.push(match op {
                    UnaryOperator::Plus => operand,
                    UnaryOperator::Minus => operand.neg(),
                });
            }
            EvalOp::CompleteBinary(op) => {
                let rhs = pop_value(&mut value_stack)?;
                let lhs = pop_value(&mut value_stack)?;
                value_stack.push(apply_binary(op, lhs, rhs)?);
            }
            EvalOp::ApplyFunction { function, argc } => {
                let split = value_stack
                    .len()
                    .checked_sub(argc)
                    .ok_or_else(|| CalcError::Syntax("missing function arguments".to_string()))?;
                let args: Vec<Real> = value_stack.drain(split..).map(Value::as_real).collect();
                value_stack.push(Value::Float(functions::apply(function, &args)?));
            }
        }

        if op_stack.len() > MAX_STACK_DEPTH {
            return Err(CalcError::RecursionLimit(format!(
                "more than {} pending operations",
                MAX_STACK_DEPTH
            )));
        }
    }

    pop_value(&mut value_stack)
}

fn pop_value(stack: &mut Vec<Value>) -> Result<Value> {
    stack
        .pop()
        .ok_or_else(|| CalcError::Syntax("missing operand".to_string()))
}

/// Applies an arithmetic operator to two evaluated operands.
pub fn apply_binary(op: BinaryOperator, lhs: Value, rhs: Value) -> Result<Value> {
    match op {
        BinaryOperator::Add => lhs.add(rhs),
        BinaryOperator::Sub => lhs.sub(rhs),
        BinaryOperator::Mul => lhs.mul(rhs),
        BinaryOperator::Div => lhs.div(rhs),
        BinaryOperator::Mod => lhs.rem(rhs),
        BinaryOperator::Pow => lhs.pow(rhs),
    }
}
