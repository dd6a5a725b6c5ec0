//! Line-oriented calculator driving a keypad session.
//!
//! Each input line is evaluated as an expression. Lines starting with `:` are
//! commands:
//!
//! - `:history` prints the history pane
//! - `:clear` empties the history
//! - `:recall N` puts history entry N back on the display and evaluates it
//! - `:key LABEL...` presses keypad buttons, e.g. `:key 9 sqrt =`
//!
//! Set `RUST_LOG=calc_rs=debug` to see the rewritten expressions.

use std::io::{self, BufRead, Write};

use calc_rs::session::{DisplayState, Session};
use tracing_subscriber::EnvFilter;

fn main() -> io::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();

    let mut session = Session::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    write!(stdout, "> ")?;
    stdout.flush()?;
    for line in stdin.lock().lines() {
        let line = line?;
        let input = line.trim();

        if let Err(err) = run_line(&mut session, input, &mut stdout) {
            writeln!(stdout, "Error: {}", err)?;
        }

        write!(stdout, "> ")?;
        stdout.flush()?;
    }
    writeln!(stdout)?;
    Ok(())
}

fn run_line(
    session: &mut Session,
    input: &str,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut words = input.split_whitespace();
    match words.next() {
        None => return Ok(()),
        Some(":history") => {
            write!(out, "{}", session.render_history())?;
            return Ok(());
        }
        Some(":clear") => {
            session.clear_history();
            return Ok(());
        }
        Some(":recall") => {
            let index: usize = words.next().ok_or("usage: :recall N")?.parse()?;
            if !session.recall(index)? {
                writeln!(out, "no history entry {}", index)?;
                return Ok(());
            }
            let expression = session.display().to_string();
            session.submit(&expression)?;
        }
        Some(":key") => {
            for label in words {
                // `_` stands for the space key
                let label = if label == "_" { " " } else { label };
                session.press_label(label)?;
            }
        }
        Some(_) => session.submit(input)?,
    }

    match session.state() {
        DisplayState::Editing => writeln!(out, "[{}]", session.display())?,
        DisplayState::Result | DisplayState::Error => writeln!(out, "{}", session.display())?,
    }
    Ok(())
}
