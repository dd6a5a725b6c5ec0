extern crate alloc;

use alloc::boxed::Box;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::error::{CalcError, Result};
use crate::eval::eval_ast;
use crate::lexer::{Lexer, Token};
use crate::rewrite::rewrite_functions;
use crate::types::{AstExpr, BinaryOperator, MathFunction, NAMESPACE, TokenKind, UnaryOperator};
use crate::value::Value;

/// Longest input accepted, in bytes.
pub const MAX_EXPRESSION_LENGTH: usize = 10_000;

/// Deepest nesting of parentheses, calls and prefix operators accepted.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Longest identifier accepted, in bytes.
pub const MAX_IDENTIFIER_LENGTH: usize = 64;

/// Pratt parser for calculator expressions
struct PrattParser<'a> {
    lexer: Lexer<'a>,
    current: Option<Token>,
    depth: usize,
}

/// Token binding powers for the Pratt parser
#[derive(Debug, Clone, Copy)]
struct BindingPower {
    left: u8,
    right: u8,
}

impl BindingPower {
    const fn new(left: u8, right: u8) -> Self {
        Self { left, right }
    }

    // For left-associative operators, right binding power is left + 1
    const fn left_assoc(power: u8) -> Self {
        Self::new(power, power + 1)
    }

    // For right-associative operators, right binding power is same as left
    const fn right_assoc(power: u8) -> Self {
        Self::new(power, power)
    }
}

// Prefix operators bind looser than exponentiation so that -2**2 is -(2**2)
const PREFIX_BINDING_POWER: u8 = 5;

impl<'a> PrattParser<'a> {
    fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.current.as_ref()
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.current.take();
        self.current = self.lexer.next_token();
        tok
    }

    fn binding_power(op: BinaryOperator) -> BindingPower {
        match op {
            BinaryOperator::Add | BinaryOperator::Sub => BindingPower::left_assoc(1),
            BinaryOperator::Mul | BinaryOperator::Div | BinaryOperator::Mod => {
                BindingPower::left_assoc(3)
            }
            BinaryOperator::Pow => BindingPower::right_assoc(7),
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(CalcError::RecursionLimit(format!(
                "expression nests deeper than {} levels",
                MAX_NESTING_DEPTH
            )));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn parse(&mut self) -> Result<AstExpr> {
        if self.peek().is_none() {
            return Err(CalcError::Syntax("empty expression".to_string()));
        }

        let expr = self.parse_expr(0)?;

        match self.peek() {
            None => Ok(expr),
            Some(tok) if tok.kind == TokenKind::Close => Err(CalcError::UnmatchedParenthesis {
                position: tok.position,
                found: tok.text.clone(),
            }),
            Some(tok) if tok.kind == TokenKind::Error => Err(unexpected_character(tok)),
            Some(tok) => Err(CalcError::Syntax(format!(
                "Unexpected token at position {}: '{}'",
                tok.position, tok.text
            ))),
        }
    }

    fn parse_expr(&mut self, min_bp: u8) -> Result<AstExpr> {
        self.enter()?;
        let lhs = self.parse_prefix_or_primary()?;
        let expr = self.parse_infix_operators(lhs, min_bp)?;
        self.leave();
        Ok(expr)
    }

    fn parse_prefix_or_primary(&mut self) -> Result<AstExpr> {
        let op = match self.peek() {
            Some(tok) if tok.is_operator("-") => UnaryOperator::Minus,
            Some(tok) if tok.is_operator("+") => UnaryOperator::Plus,
            _ => return self.parse_primary(),
        };
        let op_position = self.peek().map(|t| t.position).unwrap_or(0);
        self.next();

        if self.peek().is_none() {
            return Err(CalcError::Syntax(format!(
                "Expected expression after '{}' at position {}",
                op, op_position
            )));
        }

        let operand = self.parse_expr(PREFIX_BINDING_POWER)?;
        Ok(AstExpr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_infix_operators(&mut self, mut lhs: AstExpr, min_bp: u8) -> Result<AstExpr> {
        loop {
            let (op, position) = match self.peek() {
                Some(tok) if tok.kind == TokenKind::Operator => {
                    if tok.text == "." {
                        return Err(CalcError::disallowed(format!(
                            "attribute access at position {}",
                            tok.position
                        )));
                    }
                    match BinaryOperator::from_symbol(&tok.text) {
                        Some(op) => (op, tok.position),
                        None => break,
                    }
                }
                _ => break,
            };

            let bp = Self::binding_power(op);
            if bp.left < min_bp {
                break;
            }
            self.next();

            if self.peek().is_none() {
                return Err(CalcError::Syntax(format!(
                    "Expected expression after '{}' at position {}",
                    op, position
                )));
            }

            let rhs = self.parse_expr(bp.right)?;
            lhs = AstExpr::Binary {
                op,
                left: Box::new(lhs),
                right: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    // Parse a primary expression (number, qualified call, parenthesized expression)
    fn parse_primary(&mut self) -> Result<AstExpr> {
        let Some(tok) = self.peek() else {
            return Err(CalcError::Syntax("Unexpected end of input".to_string()));
        };

        match tok.kind {
            TokenKind::Number => {
                let value = tok.value;
                let text = tok.text.clone();
                self.next();
                match value {
                    // Literals such as 1e400 overflow to infinity
                    Some(Value::Float(f)) => Value::finite(f, "literal").map(AstExpr::Constant),
                    Some(value) => Ok(AstExpr::Constant(value)),
                    None => Err(CalcError::InvalidNumber(text)),
                }
            }
            TokenKind::Identifier => self.parse_qualified_call(),
            TokenKind::Open => self.parse_parenthesized_expr(),
            TokenKind::Close => Err(CalcError::UnmatchedParenthesis {
                position: tok.position,
                found: tok.text.clone(),
            }),
            TokenKind::Error => Err(unexpected_character(tok)),
            TokenKind::Operator | TokenKind::Separator => Err(CalcError::Syntax(format!(
                "Unexpected token at position {}: '{}'",
                tok.position, tok.text
            ))),
        }
    }

    fn parse_parenthesized_expr(&mut self) -> Result<AstExpr> {
        let open_position = self.peek().map(|t| t.position).unwrap_or(0);
        self.next(); // consume '('

        if self.peek().is_some_and(|t| t.kind == TokenKind::Close) {
            return Err(CalcError::Syntax(format!(
                "Empty parentheses at position {}",
                open_position
            )));
        }

        let expr = self.parse_expr(0)?;
        self.expect_close(open_position)?;
        Ok(expr)
    }

    fn expect_close(&mut self, open_position: usize) -> Result<()> {
        match self.peek() {
            Some(tok) if tok.kind == TokenKind::Close => {
                self.next();
                Ok(())
            }
            Some(tok) if tok.kind == TokenKind::Error => Err(unexpected_character(tok)),
            Some(tok) => Err(CalcError::Syntax(format!(
                "Expected closing parenthesis ')' but found '{}' at position {} (opening at position {})",
                tok.text, tok.position, open_position
            ))),
            None => Err(CalcError::UnmatchedParenthesis {
                position: open_position,
                found: "(".to_string(),
            }),
        }
    }

    // Only `math.<whitelisted>(...)` is callable; every other name is rejected.
    fn parse_qualified_call(&mut self) -> Result<AstExpr> {
        let Some(base) = self.next() else {
            return Err(CalcError::Syntax("Unexpected end of input".to_string()));
        };
        check_identifier_length(&base)?;

        if base.text != NAMESPACE || !self.peek().is_some_and(|t| t.is_operator(".")) {
            return Err(CalcError::disallowed(format!("name '{}'", base.text)));
        }
        self.next(); // consume '.'

        let member = match self.next() {
            Some(tok) if tok.kind == TokenKind::Identifier => tok,
            Some(tok) => {
                return Err(CalcError::Syntax(format!(
                    "Expected function name after '{}.' at position {}, found '{}'",
                    NAMESPACE, tok.position, tok.text
                )));
            }
            None => {
                return Err(CalcError::Syntax(format!(
                    "Expected function name after '{}.'",
                    NAMESPACE
                )));
            }
        };
        check_identifier_length(&member)?;

        let function = MathFunction::from_qualified_name(&member.text).ok_or_else(|| {
            CalcError::disallowed(format!("name '{}.{}'", NAMESPACE, member.text))
        })?;

        match self.peek() {
            Some(tok) if tok.kind == TokenKind::Open => {}
            _ => {
                return Err(CalcError::Syntax(format!(
                    "Expected '(' after '{}' at position {}",
                    function,
                    member.end()
                )));
            }
        }
        self.parse_call_arguments(function)
    }

    fn parse_call_arguments(&mut self, function: MathFunction) -> Result<AstExpr> {
        let open_position = self.peek().map(|t| t.position).unwrap_or(0);
        self.next(); // consume '('

        let mut args = Vec::new();
        if !self.peek().is_some_and(|t| t.kind == TokenKind::Close) {
            args.push(self.parse_expr(0)?);
            while self.peek().is_some_and(|t| t.kind == TokenKind::Separator) {
                self.next(); // consume ','
                args.push(self.parse_expr(0)?);
            }
        }
        self.expect_close(open_position)?;

        if args.len() != function.arity() {
            return Err(CalcError::InvalidFunctionCall {
                name: function.key_name().to_string(),
                expected: function.arity(),
                found: args.len(),
            });
        }
        Ok(AstExpr::Call { function, args })
    }
}

fn unexpected_character(tok: &Token) -> CalcError {
    CalcError::disallowed(format!(
        "character '{}' at position {}",
        tok.text, tok.position
    ))
}

fn check_length(input: &str) -> Result<()> {
    if input.len() > MAX_EXPRESSION_LENGTH {
        return Err(CalcError::Syntax(format!(
            "Expression too long: {} characters (maximum is {})",
            input.len(),
            MAX_EXPRESSION_LENGTH
        )));
    }
    Ok(())
}

fn check_identifier_length(tok: &Token) -> Result<()> {
    if tok.text.len() > MAX_IDENTIFIER_LENGTH {
        return Err(CalcError::Syntax(format!(
            "Identifier too long at position {}: {} characters (maximum is {})",
            tok.position,
            tok.text.len(),
            MAX_IDENTIFIER_LENGTH
        )));
    }
    Ok(())
}

/// Parse an already rewritten expression string into an AST.
///
/// Function calls must be qualified (`math.sqrt(9)`); use [`interp`] or
/// [`evaluate`] to accept the short names a user types.
pub fn parse_expression(input: &str) -> Result<AstExpr> {
    check_length(input)?;
    PrattParser::new(input).parse()
}

/// Rewrites, parses and evaluates `raw`, returning the numeric value.
///
/// # Examples
///
/// ```
/// use calc_rs::engine::interp;
/// use calc_rs::Value;
///
/// assert_eq!(interp("2 + 3 * 4").unwrap(), Value::Int(14));
/// assert_eq!(interp("sqrt(16)").unwrap(), Value::Float(4.0));
/// ```
pub fn interp(raw: &str) -> Result<Value> {
    // The limit applies to what the user typed, not to the longer rewritten form
    check_length(raw)?;
    let rewritten = rewrite_functions(raw);
    let ast = PrattParser::new(&rewritten).parse()?;
    eval_ast(&ast)
}

/// Evaluates a calculator expression and renders the result as display text.
///
/// This is the evaluator entry point. It is pure: the same input always gives
/// the same output and no state is read or written.
///
/// # Examples
///
/// ```
/// use calc_rs::engine::evaluate;
/// use calc_rs::error::ErrorKind;
///
/// assert_eq!(evaluate("sqrt(9)").unwrap(), "3.0");
/// assert_eq!(evaluate("5 mod 3").unwrap(), "2");
/// assert_eq!(evaluate("1/0").unwrap_err().kind(), ErrorKind::Division);
/// assert_eq!(
///     evaluate("__import__('os')").unwrap_err().kind(),
///     ErrorKind::DisallowedConstruct
/// );
/// ```
pub fn evaluate(raw: &str) -> Result<String> {
    match interp(raw) {
        Ok(value) => {
            let text = value.to_string();
            tracing::debug!(expression = raw, result = %text, "evaluated");
            Ok(text)
        }
        Err(err) => {
            tracing::debug!(expression = raw, error = %err, "evaluation failed");
            Err(err)
        }
    }
}

/// Like [`evaluate`], but folds failures into an `"Error: <message>"` string.
///
/// ```
/// use calc_rs::engine::calculate;
///
/// assert_eq!(calculate("2 ** 10"), "1024");
/// assert_eq!(calculate("1/0"), "Error: Division by zero");
/// ```
pub fn calculate(raw: &str) -> String {
    match evaluate(raw) {
        Ok(result) => result,
        Err(err) => format!("Error: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn int(i: i64) -> AstExpr {
        AstExpr::Constant(Value::Int(i))
    }

    fn binary(op: BinaryOperator, left: AstExpr, right: AstExpr) -> AstExpr {
        AstExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[test]
    fn test_parse_precedence() {
        let ast = parse_expression("1 + 2 * 3").unwrap();
        assert_eq!(
            ast,
            binary(
                BinaryOperator::Add,
                int(1),
                binary(BinaryOperator::Mul, int(2), int(3))
            )
        );
    }

    #[test]
    fn test_parse_left_associative_subtraction() {
        let ast = parse_expression("8 - 4 - 2").unwrap();
        assert_eq!(
            ast,
            binary(
                BinaryOperator::Sub,
                binary(BinaryOperator::Sub, int(8), int(4)),
                int(2)
            )
        );
    }

    #[test]
    fn test_parse_right_associative_power() {
        let ast = parse_expression("2 ^ 3 ** 2").unwrap();
        assert_eq!(
            ast,
            binary(
                BinaryOperator::Pow,
                int(2),
                binary(BinaryOperator::Pow, int(3), int(2))
            )
        );
    }

    #[test]
    fn test_parse_unary_minus_binds_looser_than_power() {
        let ast = parse_expression("-2 ** 2").unwrap();
        assert_eq!(
            ast,
            AstExpr::Unary {
                op: UnaryOperator::Minus,
                operand: Box::new(binary(BinaryOperator::Pow, int(2), int(2))),
            }
        );
        assert!(parse_expression("2 ** -1").is_ok());
    }

    #[test]
    fn test_parse_qualified_calls() {
        let ast = parse_expression("math.fmod(7, math.sqrt(4))").unwrap();
        match ast {
            AstExpr::Call { function, args } => {
                assert_eq!(function, MathFunction::Fmod);
                assert_eq!(args.len(), 2);
                assert!(matches!(
                    args[1],
                    AstExpr::Call {
                        function: MathFunction::Sqrt,
                        ..
                    }
                ));
            }
            other => panic!("Expected call node, got {:?}", other),
        }
    }

    #[test]
    fn test_unqualified_names_are_disallowed() {
        for input in ["sqrt(9)", "x", "math", "math.sin(1)", "os.system(1)", "pi"] {
            let err = parse_expression(input).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::DisallowedConstruct, "{}", input);
        }
    }

    #[test]
    fn test_attribute_access_is_disallowed() {
        let err = parse_expression("(1).real").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisallowedConstruct);
    }

    #[test]
    fn test_syntax_errors() {
        for input in ["", "   ", "1 +", "(1 + 2", "1 + 2)", "()", "1 2", ", 1", "*3", "math.sqrt"] {
            let err = parse_expression(input).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Syntax, "{}: {:?}", input, err);
        }
    }

    #[test]
    fn test_unmatched_parenthesis_positions() {
        assert_eq!(
            parse_expression("(1 + 2").unwrap_err(),
            CalcError::UnmatchedParenthesis {
                position: 0,
                found: "(".to_string()
            }
        );
        assert_eq!(
            parse_expression("1 + 2)").unwrap_err(),
            CalcError::UnmatchedParenthesis {
                position: 5,
                found: ")".to_string()
            }
        );
    }

    #[test]
    fn test_wrong_arity() {
        assert_eq!(
            parse_expression("math.fmod(5)").unwrap_err(),
            CalcError::InvalidFunctionCall {
                name: "mod".to_string(),
                expected: 2,
                found: 1
            }
        );
        assert!(matches!(
            parse_expression("math.sqrt(1, 2)").unwrap_err(),
            CalcError::InvalidFunctionCall { .. }
        ));
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}1{}", "(".repeat(1000), ")".repeat(1000));
        assert!(matches!(
            parse_expression(&deep).unwrap_err(),
            CalcError::RecursionLimit(_)
        ));
        let shallow = format!("{}1{}", "(".repeat(50), ")".repeat(50));
        assert_eq!(parse_expression(&shallow).unwrap(), int(1));
    }

    #[test]
    fn test_length_limits() {
        let long = "1+".repeat(MAX_EXPRESSION_LENGTH);
        assert!(matches!(
            parse_expression(&long).unwrap_err(),
            CalcError::Syntax(_)
        ));
        let name = "a".repeat(MAX_IDENTIFIER_LENGTH + 1);
        assert!(matches!(
            parse_expression(&name).unwrap_err(),
            CalcError::Syntax(_)
        ));
    }

    #[test]
    fn test_length_limit_applies_to_raw_input() {
        // Each `ln(1)+` doubles in length once rewritten to `math.log(1)+`
        let raw = "ln(1)+".repeat(1600) + "1";
        assert!(raw.len() <= MAX_EXPRESSION_LENGTH);
        assert!(rewrite_functions(&raw).len() > MAX_EXPRESSION_LENGTH);
        assert_eq!(interp(&raw).unwrap(), Value::Float(1.0));

        let too_long = "1+".repeat(MAX_EXPRESSION_LENGTH / 2) + "1";
        assert!(matches!(interp(&too_long).unwrap_err(), CalcError::Syntax(_)));
    }

    #[test]
    fn test_overflowing_literals_are_range_errors() {
        let huge_integer = "9".repeat(400);
        for input in ["1e400", "-1e400", huge_integer.as_str()] {
            assert_eq!(
                parse_expression(input).unwrap_err(),
                CalcError::range("literal"),
                "{}",
                input
            );
        }
        assert_eq!(parse_expression("1e-400").unwrap(), AstExpr::Constant(Value::Float(0.0)));
    }

    #[test]
    fn test_calculate_folds_errors() {
        assert_eq!(calculate("sqrt(9)"), "3.0");
        assert!(calculate("sqrt(-1)").starts_with("Error: "));
    }
}
