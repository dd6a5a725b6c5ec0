//! Type definitions for the expression parser and evaluator.
//!
//! This module contains the Abstract Syntax Tree (AST) representation, the token
//! kinds produced by the lexer, and the closed sets of operators and functions the
//! sandbox understands.

extern crate alloc;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::value::Value;

/// The only namespace a call may be qualified with (`math.sqrt(...)`).
pub const NAMESPACE: &str = "math";

/// Abstract Syntax Tree (AST) node representing an expression.
///
/// The tree can only express what the sandbox allows: there is no variable,
/// attribute or arbitrary-call node, so anything outside the whitelist is
/// rejected while parsing.
#[derive(Clone, Debug, PartialEq)]
pub enum AstExpr {
    /// A literal numerical value.
    ///
    /// Examples: `3`, `1.5`, `.5`, `2e-3`
    Constant(Value),

    /// A prefix `+` or `-` applied to an operand.
    Unary {
        op: UnaryOperator,
        operand: Box<AstExpr>,
    },

    /// A binary arithmetic operation.
    ///
    /// Examples: `1 + 2`, `2 ** 8`, `7 % 3`
    Binary {
        op: BinaryOperator,
        left: Box<AstExpr>,
        right: Box<AstExpr>,
    },

    /// A call to one of the whitelisted functions.
    ///
    /// Examples: `math.sqrt(9)`, `math.fmod(7, 3)`
    Call {
        function: MathFunction,
        args: Vec<AstExpr>,
    },
}

impl AstExpr {
    /// Depth of the tree, counting this node.
    pub fn depth(&self) -> usize {
        match self {
            AstExpr::Constant(_) => 1,
            AstExpr::Unary { operand, .. } => 1 + operand.depth(),
            AstExpr::Binary { left, right, .. } => 1 + left.depth().max(right.depth()),
            AstExpr::Call { args, .. } => 1 + args.iter().map(AstExpr::depth).max().unwrap_or(0),
        }
    }
}

/// Classifies the kind of token produced during lexical analysis.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TokenKind {
    /// A numerical literal. Its value is `None` when the literal is malformed.
    Number,

    /// An identifier such as `sqrt`, `math` or `mod`.
    Identifier,

    /// An operator such as `+`, `**` or `.`.
    Operator,

    /// An opening parenthesis.
    Open,

    /// A closing parenthesis.
    Close,

    /// The argument separator `,`.
    Separator,

    /// A character the grammar has no use for.
    Error,
}

/// Prefix operators.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum UnaryOperator {
    Plus,
    Minus,
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Plus => write!(f, "+"),
            UnaryOperator::Minus => write!(f, "-"),
        }
    }
}

/// Infix arithmetic operators.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    /// Flooring remainder, written `%` (or the word `mod` before rewriting).
    Mod,
    /// Exponentiation, written `**` or `^`.
    Pow,
}

impl BinaryOperator {
    /// Maps an operator token to its operator. `^` and `**` are both exponentiation.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(BinaryOperator::Add),
            "-" => Some(BinaryOperator::Sub),
            "*" => Some(BinaryOperator::Mul),
            "/" => Some(BinaryOperator::Div),
            "%" => Some(BinaryOperator::Mod),
            "**" | "^" => Some(BinaryOperator::Pow),
            _ => None,
        }
    }

    /// Canonical symbol used when printing.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Pow => "**",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// The whitelisted functions.
///
/// Each function has two spellings: the short name the user types or presses
/// (`ln`, `mod`) and the qualified name it is rewritten to before parsing
/// (`math.log`, `math.fmod`).
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum MathFunction {
    Exp,
    Log10,
    Log2,
    Ln,
    Sqrt,
    Fmod,
}

impl MathFunction {
    /// All functions, in the order their substitutions are applied.
    pub const ALL: [MathFunction; 6] = [
        MathFunction::Exp,
        MathFunction::Log10,
        MathFunction::Log2,
        MathFunction::Ln,
        MathFunction::Sqrt,
        MathFunction::Fmod,
    ];

    /// The name used in user input and on keypad buttons.
    pub fn key_name(self) -> &'static str {
        match self {
            MathFunction::Exp => "exp",
            MathFunction::Log10 => "log10",
            MathFunction::Log2 => "log2",
            MathFunction::Ln => "ln",
            MathFunction::Sqrt => "sqrt",
            MathFunction::Fmod => "mod",
        }
    }

    /// The member name inside the `math` namespace.
    pub fn qualified_name(self) -> &'static str {
        match self {
            MathFunction::Exp => "exp",
            MathFunction::Log10 => "log10",
            MathFunction::Log2 => "log2",
            MathFunction::Ln => "log",
            MathFunction::Sqrt => "sqrt",
            MathFunction::Fmod => "fmod",
        }
    }

    pub fn from_key_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key_name() == name)
    }

    pub fn from_qualified_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.qualified_name() == name)
    }

    /// Number of arguments the function takes.
    pub fn arity(self) -> usize {
        match self {
            MathFunction::Fmod => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for MathFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", NAMESPACE, self.qualified_name())
    }
}
