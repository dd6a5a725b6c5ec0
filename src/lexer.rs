extern crate alloc;

use alloc::string::String;

use crate::Real;
use crate::types::TokenKind;
use crate::value::Value;

/// A token produced by the lexer.
///
/// `text` is always the exact slice of the input the token was read from, so
/// `position + text.len()` is the byte offset just past the token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: Option<Value>,
    pub text: String,
    pub position: usize,
}

impl Token {
    /// Byte offset just past the end of the token.
    pub fn end(&self) -> usize {
        self.position + self.text.len()
    }

    pub fn is_operator(&self, symbol: &str) -> bool {
        self.kind == TokenKind::Operator && self.text == symbol
    }
}

/// The lexer struct, which produces tokens from an input string.
#[derive(Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    pub pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Peek at the current character.
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Advance the position by one character.
    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    /// Skip whitespace.
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn token(&self, kind: TokenKind, value: Option<Value>, start_pos: usize) -> Token {
        Token {
            kind,
            value,
            text: String::from(&self.input[start_pos..self.pos]),
            position: start_pos,
        }
    }

    /// Get the next token from the input.
    pub fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace();
        let start_pos = self.pos;
        let c = self.peek()?;

        // Numbers: 12, 1.5, .5, 3., 2e10, 1.5E-3
        let starts_fraction = c == '.' && self.peek_second().is_some_and(|d| d.is_ascii_digit());
        if c.is_ascii_digit() || starts_fraction {
            return Some(self.lex_number(start_pos));
        }

        // `**` is the only two-character operator
        if "+-*/%^.".contains(c) {
            self.advance();
            if c == '*' && self.peek() == Some('*') {
                self.advance();
            }
            return Some(self.token(TokenKind::Operator, None, start_pos));
        }

        if c.is_ascii_alphabetic() || c == '_' {
            while let Some(nc) = self.peek() {
                if nc.is_ascii_alphanumeric() || nc == '_' {
                    self.advance();
                } else {
                    break;
                }
            }
            return Some(self.token(TokenKind::Identifier, None, start_pos));
        }

        let kind = match c {
            '(' => TokenKind::Open,
            ')' => TokenKind::Close,
            ',' => TokenKind::Separator,
            _ => TokenKind::Error,
        };
        self.advance();
        Some(self.token(kind, None, start_pos))
    }

    fn lex_number(&mut self, start_pos: usize) -> Token {
        let mut saw_dot = false;
        let mut saw_e = false;
        let mut digits_after_e = false;

        while let Some(nc) = self.peek() {
            if nc.is_ascii_digit() {
                self.advance();
                if saw_e {
                    digits_after_e = true;
                }
            } else if nc == '.' && !saw_dot && !saw_e {
                saw_dot = true;
                self.advance();
            } else if (nc == 'e' || nc == 'E') && !saw_e {
                saw_e = true;
                self.advance();
                if let Some(sign) = self.peek() {
                    if sign == '+' || sign == '-' {
                        self.advance();
                    }
                }
            } else {
                break;
            }
        }

        let text = &self.input[start_pos..self.pos];
        let value = if saw_e && !digits_after_e {
            None
        } else if saw_dot || saw_e {
            text.parse::<Real>().ok().map(Value::Float)
        } else {
            // Integers too large for i64 degrade to floats
            text.parse::<i64>()
                .ok()
                .map(Value::Int)
                .or_else(|| text.parse::<Real>().ok().map(Value::Float))
        };
        self.token(TokenKind::Number, value, start_pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn tokens(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut tokens = Vec::new();
        while let Some(tok) = lexer.next_token() {
            tokens.push(tok);
        }
        tokens
    }

    #[test]
    fn test_lexer_tokenization_all_types() {
        let kinds: Vec<TokenKind> = tokens("1 + math.sqrt(2.5e-1) , $")
            .iter()
            .map(|t| t.kind)
            .collect();
        assert_eq!(
            kinds,
            [
                TokenKind::Number,
                TokenKind::Operator,
                TokenKind::Identifier,
                TokenKind::Operator,
                TokenKind::Identifier,
                TokenKind::Open,
                TokenKind::Number,
                TokenKind::Close,
                TokenKind::Separator,
                TokenKind::Error,
            ]
        );
    }

    #[test]
    fn test_lexer_integer_and_float_literals() {
        let toks = tokens("42 4.0 .5 3. 1e3");
        assert_eq!(toks[0].value, Some(Value::Int(42)));
        assert_eq!(toks[1].value, Some(Value::Float(4.0)));
        assert_eq!(toks[2].value, Some(Value::Float(0.5)));
        assert_eq!(toks[3].value, Some(Value::Float(3.0)));
        assert_eq!(toks[4].value, Some(Value::Float(1000.0)));
    }

    #[test]
    fn test_lexer_malformed_exponent() {
        let toks = tokens("1e+ 2");
        assert_eq!(toks[0].kind, TokenKind::Number);
        assert_eq!(toks[0].value, None);
        assert_eq!(toks[0].text, "1e+");
    }

    #[test]
    fn test_lexer_double_star_and_caret() {
        let toks = tokens("2**3^4");
        let ops: Vec<&str> = toks
            .iter()
            .filter(|t| t.kind == TokenKind::Operator)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(ops, ["**", "^"]);
    }

    #[test]
    fn test_lexer_positions_cover_input() {
        let input = "  sqrt( 9 )";
        for tok in tokens(input) {
            assert_eq!(&input[tok.position..tok.end()], tok.text);
        }
    }

    #[test]
    fn test_lexer_quotes_and_brackets_are_errors() {
        let errors: Vec<String> = tokens("__import__('os')[0]")
            .into_iter()
            .filter(|t| t.kind == TokenKind::Error)
            .map(|t| t.text)
            .collect();
        assert_eq!(errors, ["'", "'", "[", "]"]);
    }
}
