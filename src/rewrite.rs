//! Function-name substitution applied before parsing.
//!
//! The calculator accepts the short names printed on its keys (`exp`, `log10`,
//! `log2`, `ln`, `sqrt`, `mod`). Before parsing, each of these is replaced by its
//! qualified form inside the `math` namespace, and the word `mod` becomes the `%`
//! operator. Replacement works on whole identifier tokens, never on substrings, so
//! `logna` or `expo` are left alone (and rejected later as unknown names).

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

use crate::lexer::{Lexer, Token};
use crate::types::{MathFunction, NAMESPACE, TokenKind};

/// Rewrites the short function names in `input` to their qualified forms.
///
/// Whitespace and every other token are copied through unchanged. Identifiers
/// directly preceded by `.` are already qualified and are not touched, which
/// makes the rewrite idempotent.
///
/// `mod` followed by `(` is the two-argument call `math.fmod(a, b)`; anywhere else
/// it is the infix operator `%`.
///
/// # Examples
///
/// ```
/// use calc_rs::rewrite::rewrite_functions;
///
/// assert_eq!(rewrite_functions("2+sqrt(9)*ln(5)"), "2+math.sqrt(9)*math.log(5)");
/// assert_eq!(rewrite_functions("5 mod 3"), "5 % 3");
/// assert_eq!(rewrite_functions("mod(5, 3)"), "math.fmod(5, 3)");
/// assert_eq!(rewrite_functions("logna + 1"), "logna + 1");
/// ```
pub fn rewrite_functions(input: &str) -> String {
    let mut lexer = Lexer::new(input);
    let mut tokens: Vec<Token> = Vec::new();
    while let Some(tok) = lexer.next_token() {
        tokens.push(tok);
    }

    let mut output = String::with_capacity(input.len() + 16);
    let mut copied_to = 0;

    for (i, tok) in tokens.iter().enumerate() {
        output.push_str(&input[copied_to..tok.position]);
        copied_to = tok.end();

        let after_dot = i > 0 && tokens[i - 1].is_operator(".");
        let replacement = if tok.kind == TokenKind::Identifier && !after_dot {
            let opens_call = tokens
                .get(i + 1)
                .is_some_and(|next| next.kind == TokenKind::Open);
            substitution(&tok.text, opens_call)
        } else {
            None
        };

        match replacement {
            Some(Substitution::Function(function)) => {
                output.push_str(NAMESPACE);
                output.push('.');
                output.push_str(function.qualified_name());
            }
            Some(Substitution::ModOperator) => output.push('%'),
            None => output.push_str(&tok.text),
        }
    }
    output.push_str(&input[copied_to..]);

    if output != input {
        tracing::debug!(input, rewritten = %output, "rewrote function names");
    }
    output
}

enum Substitution {
    Function(MathFunction),
    ModOperator,
}

fn substitution(identifier: &str, opens_call: bool) -> Option<Substitution> {
    match MathFunction::from_key_name(identifier)? {
        MathFunction::Fmod if !opens_call => Some(Substitution::ModOperator),
        function => Some(Substitution::Function(function)),
    }
}
