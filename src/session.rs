//! Headless keypad session.
//!
//! A [`Session`] is everything a calculator front end needs besides drawing: the
//! display buffer, the evaluation history and the rules for how a key press
//! changes the display text. Front ends forward button presses with
//! [`Session::press`] (or [`Session::press_label`]) and render
//! [`Session::display`] and [`Session::history`] afterwards.
//!
//! Storage is bounded. The display holds at most [`DISPLAY_CAPACITY`] bytes and
//! the history keeps the last [`HISTORY_CAPACITY`] entries.

extern crate alloc;

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use core::fmt::{self, Write};

use bitflags::bitflags;
use heapless::Deque;

use crate::Real;
use crate::engine;
use crate::error::{CalcError, Result};
use crate::functions;
use crate::types::{BinaryOperator, MathFunction};
use crate::value::Value;

/// Display buffer size in bytes.
pub const DISPLAY_CAPACITY: usize = 256;

/// Number of history entries kept before the oldest is dropped.
pub const HISTORY_CAPACITY: usize = 64;

const HISTORY_SEPARATOR_WIDTH: usize = 50;

/// Numeric keypad labels, row by row from the top left.
pub const KEYPAD_LABELS: [&str; 12] = ["7", "8", "9", "4", "5", "6", "1", "2", "3", " ", "0", "."];

/// Operator pad labels, in button order.
pub const OPERATOR_LABELS: [&str; 16] = [
    "DEL", "CLR", "+", "-", "*", "/", "^", "=", "(", ")", "exp", "ln", "log10", "log2", "sqrt",
    "mod",
];

const DIGIT_LABELS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

bitflags! {
    /// Toggles for how key presses edit the display.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InsertRules: u8 {
        /// Insert `*` before `(` or a function call that directly follows a
        /// number or a closing parenthesis.
        const IMPLICIT_MULTIPLY = 1 << 0;
        /// Function keys act on the number at the end of the display right away
        /// instead of inserting a call.
        const APPLY_TO_OPERAND = 1 << 1;
        /// Typing after an error (or starting a new number after a result)
        /// replaces the display instead of appending to it.
        const REPLACE_ERROR = 1 << 2;
        /// The `^` key squares: it inserts `**2` instead of a bare `^`.
        const SQUARE_CARET = 1 << 3;
    }
}

impl Default for InsertRules {
    fn default() -> Self {
        InsertRules::IMPLICIT_MULTIPLY | InsertRules::REPLACE_ERROR
    }
}

/// A calculator button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Digit(u8),
    Point,
    Space,
    Operator(BinaryOperator),
    Open,
    Close,
    Delete,
    Clear,
    Equals,
    Function(MathFunction),
}

impl Key {
    /// Parses a button label such as `"7"`, `"^"`, `"DEL"` or `"log10"`.
    pub fn from_label(label: &str) -> Option<Key> {
        let key = match label {
            "." => Key::Point,
            " " => Key::Space,
            "+" => Key::Operator(BinaryOperator::Add),
            "-" => Key::Operator(BinaryOperator::Sub),
            "*" => Key::Operator(BinaryOperator::Mul),
            "/" => Key::Operator(BinaryOperator::Div),
            "^" => Key::Operator(BinaryOperator::Pow),
            "(" => Key::Open,
            ")" => Key::Close,
            "DEL" => Key::Delete,
            "CLR" => Key::Clear,
            "=" => Key::Equals,
            _ => {
                if let Some(digit) = DIGIT_LABELS.iter().position(|d| *d == label) {
                    Key::Digit(digit as u8)
                } else {
                    Key::Function(MathFunction::from_key_name(label)?)
                }
            }
        };
        Some(key)
    }

    /// The text printed on the button.
    pub fn label(self) -> &'static str {
        match self {
            Key::Digit(d) => DIGIT_LABELS[usize::from(d % 10)],
            Key::Point => ".",
            Key::Space => " ",
            Key::Operator(BinaryOperator::Pow) => "^",
            Key::Operator(BinaryOperator::Mod) => " mod ",
            Key::Operator(op) => op.symbol(),
            Key::Open => "(",
            Key::Close => ")",
            Key::Delete => "DEL",
            Key::Clear => "CLR",
            Key::Equals => "=",
            Key::Function(function) => function.key_name(),
        }
    }

    fn starts_operand(self) -> bool {
        matches!(self, Key::Digit(_) | Key::Point | Key::Open | Key::Function(_))
    }
}

/// One evaluated expression and the text it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub expression: String,
    pub result: String,
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.expression, self.result)
    }
}

/// What the display currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    /// An expression being typed.
    Editing,
    /// The result of the last evaluation.
    Result,
    /// `Error: <message>` from the last evaluation.
    Error,
}

/// Display, history and insertion rules of one calculator.
#[derive(Debug)]
pub struct Session {
    display: heapless::String<DISPLAY_CAPACITY>,
    history: Deque<HistoryEntry, HISTORY_CAPACITY>,
    state: DisplayState,
    rules: InsertRules,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_rules(InsertRules::default())
    }

    pub fn with_rules(rules: InsertRules) -> Self {
        Self {
            display: heapless::String::new(),
            history: Deque::new(),
            state: DisplayState::Editing,
            rules,
        }
    }

    pub fn rules(&self) -> InsertRules {
        self.rules
    }

    pub fn display(&self) -> &str {
        self.display.as_str()
    }

    pub fn state(&self) -> DisplayState {
        self.state
    }

    /// History entries, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Applies one key press.
    ///
    /// Evaluation failures are not returned: they are shown on the display and
    /// the session stays usable. The only error is a full display buffer, in
    /// which case the display is left unchanged.
    pub fn press(&mut self, key: Key) -> Result<()> {
        tracing::trace!(key = key.label(), display = self.display.as_str(), "key press");
        match key {
            Key::Equals => self.evaluate_display(),
            Key::Delete => {
                if self.state == DisplayState::Error
                    && self.rules.contains(InsertRules::REPLACE_ERROR)
                {
                    self.display.clear();
                } else {
                    self.display.pop();
                }
                self.state = DisplayState::Editing;
                Ok(())
            }
            Key::Clear => {
                self.display.clear();
                self.history.clear();
                self.state = DisplayState::Editing;
                Ok(())
            }
            Key::Function(function) => self.press_function(function),
            _ => self.insert(key),
        }
    }

    /// Applies the key printed as `label`.
    pub fn press_label(&mut self, label: &str) -> Result<()> {
        let key = Key::from_label(label)
            .ok_or_else(|| CalcError::disallowed(format!("key '{}'", label)))?;
        self.press(key)
    }

    /// Replaces the display with `expression` and evaluates it, as if it had been
    /// typed and `=` pressed.
    pub fn submit(&mut self, expression: &str) -> Result<()> {
        self.set_display(expression, DisplayState::Editing)?;
        self.evaluate_display()
    }

    /// Puts the expression of history entry `index` (oldest is 0) back on the
    /// display. Returns `false` when there is no such entry.
    pub fn recall(&mut self, index: usize) -> Result<bool> {
        let Some(expression) = self.history.iter().nth(index).map(|e| e.expression.clone())
        else {
            return Ok(false);
        };
        self.set_display(&expression, DisplayState::Editing)?;
        Ok(true)
    }

    /// Renders the history as the history pane shows it: one `expr = result`
    /// line per entry, each followed by a separator.
    pub fn render_history(&self) -> String {
        let mut out = String::new();
        for entry in self.history.iter() {
            // Writing into a String cannot fail
            let _ = writeln!(out, "{}", entry);
            out.push_str(&"-".repeat(HISTORY_SEPARATOR_WIDTH));
            out.push('\n');
        }
        out
    }

    fn insert(&mut self, key: Key) -> Result<()> {
        self.prepare_for_input(key);
        let implicit_multiply = key == Key::Open && self.wants_implicit_multiply();
        let text = match key {
            Key::Operator(BinaryOperator::Pow)
                if self.rules.contains(InsertRules::SQUARE_CARET) =>
            {
                "**2"
            }
            _ => key.label(),
        };
        self.append(implicit_multiply, text)?;
        self.state = DisplayState::Editing;
        Ok(())
    }

    fn press_function(&mut self, function: MathFunction) -> Result<()> {
        if self.rules.contains(InsertRules::APPLY_TO_OPERAND)
            && self.state != DisplayState::Error
            && trailing_number(self.display.as_str()).is_some()
        {
            return self.apply_to_operand(function);
        }

        self.prepare_for_input(Key::Function(function));
        let implicit_multiply = self.wants_implicit_multiply();
        let call = format!("{}(", function.key_name());
        self.append(implicit_multiply, &call)?;
        self.state = DisplayState::Editing;
        Ok(())
    }

    // A shown result is one operand as a whole, sign and exponent included.
    // While editing, `mod` takes the two space-separated numbers at the end.
    fn apply_to_operand(&mut self, function: MathFunction) -> Result<()> {
        let text = self.display.as_str().to_string();
        let (mut start, last) = if self.state == DisplayState::Result {
            (0, text.trim())
        } else {
            match trailing_number(&text) {
                Some(operand) => operand,
                None => return Ok(()),
            }
        };

        let mut operands = vec![last];
        while operands.len() < function.arity() {
            let head = &text[..start];
            let trimmed = head.trim_end();
            if trimmed.len() == head.len() {
                break;
            }
            let Some((previous_start, previous)) = trailing_number(trimmed) else {
                break;
            };
            start = previous_start;
            operands.insert(0, previous);
        }

        let result = operands
            .iter()
            .map(|operand| operand_value(operand))
            .collect::<Result<Vec<Real>>>()
            .and_then(|args| functions::apply(function, &args));

        match result {
            Ok(value) => {
                let result = Value::Float(value).to_string();
                let expression = match function {
                    MathFunction::Fmod => operands.join(" mod "),
                    _ => format!("{}({})", function.key_name(), operands.join(", ")),
                };
                let mut updated = String::from(&text[..start]);
                updated.push_str(&result);
                let state = if start == 0 {
                    DisplayState::Result
                } else {
                    DisplayState::Editing
                };
                self.set_display(&updated, state)?;
                self.push_history(HistoryEntry { expression, result })
            }
            Err(err) => {
                self.show_error(&err);
                Ok(())
            }
        }
    }

    fn evaluate_display(&mut self) -> Result<()> {
        if self.state == DisplayState::Error {
            return Ok(());
        }
        let expression = self.display.as_str().trim().to_string();
        if expression.is_empty() {
            return Ok(());
        }

        match engine::evaluate(&expression) {
            Ok(result) => {
                self.set_display(&result, DisplayState::Result)?;
                self.push_history(HistoryEntry { expression, result })
            }
            Err(err) => {
                self.show_error(&err);
                Ok(())
            }
        }
    }

    fn prepare_for_input(&mut self, key: Key) {
        if !self.rules.contains(InsertRules::REPLACE_ERROR) {
            return;
        }
        let replace = match self.state {
            DisplayState::Error => true,
            DisplayState::Result => key.starts_operand(),
            DisplayState::Editing => false,
        };
        if replace {
            self.display.clear();
            self.state = DisplayState::Editing;
        }
    }

    fn wants_implicit_multiply(&self) -> bool {
        self.rules.contains(InsertRules::IMPLICIT_MULTIPLY)
            && self
                .display
                .trim_end()
                .chars()
                .next_back()
                .is_some_and(|c| c.is_ascii_digit() || c == '.' || c == ')')
    }

    fn append(&mut self, implicit_multiply: bool, text: &str) -> Result<()> {
        let needed = text.len() + usize::from(implicit_multiply);
        if self.display.len() + needed > DISPLAY_CAPACITY {
            return Err(CalcError::CapacityExceeded("display"));
        }
        if implicit_multiply {
            self.display
                .push('*')
                .map_err(|_| CalcError::CapacityExceeded("display"))?;
        }
        self.display
            .push_str(text)
            .map_err(|_| CalcError::CapacityExceeded("display"))
    }

    fn set_display(&mut self, text: &str, state: DisplayState) -> Result<()> {
        if text.len() > DISPLAY_CAPACITY {
            return Err(CalcError::CapacityExceeded("display"));
        }
        self.display.clear();
        self.display
            .push_str(text)
            .map_err(|_| CalcError::CapacityExceeded("display"))?;
        self.state = state;
        Ok(())
    }

    fn show_error(&mut self, err: &CalcError) {
        let message = format!("Error: {}", err);
        let mut end = message.len().min(DISPLAY_CAPACITY);
        while !message.is_char_boundary(end) {
            end -= 1;
        }
        self.display.clear();
        let _ = self.display.push_str(&message[..end]);
        self.state = DisplayState::Error;
    }

    fn push_history(&mut self, entry: HistoryEntry) -> Result<()> {
        if self.history.is_full() {
            if let Some(dropped) = self.history.pop_front() {
                tracing::warn!(expression = %dropped.expression, "history full, dropping oldest entry");
            }
        }
        self.history
            .push_back(entry)
            .map_err(|_| CalcError::CapacityExceeded("history"))
    }
}

/// Finds the number at the end of `text`: its byte offset and its text.
///
/// An exponent suffix belongs to the number (`2*1e+16` ends in `1e+16`). A sign
/// in front of the number does not, since while editing it is an operator.
fn trailing_number(text: &str) -> Option<(usize, &str)> {
    let start = digits_start(text, text.len())?;

    let head = &text[..start];
    let head = head.strip_suffix(|c: char| c == '+' || c == '-').unwrap_or(head);
    if let Some(mantissa) = head.strip_suffix(|c: char| c == 'e' || c == 'E') {
        if let Some(mantissa_start) = digits_start(text, mantissa.len()) {
            return Some((mantissa_start, &text[mantissa_start..]));
        }
    }
    Some((start, &text[start..]))
}

/// Start of the run of digits and points ending at `end`, if it holds a digit.
fn digits_start(text: &str, end: usize) -> Option<usize> {
    let start = text[..end]
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit() || *c == '.')
        .last()
        .map(|(i, _)| i)?;
    text[start..end]
        .chars()
        .any(|c| c.is_ascii_digit())
        .then_some(start)
}

fn operand_value(text: &str) -> Result<Real> {
    Ok(text.parse::<Real>()?)
}
