//! Interactive autocomplete demo in the terminal.

pub mod compose;
pub mod suggest;

use anyhow::Result;
use crossterm::cursor::MoveToColumn;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType};
use std::io::{Write, stdout};
use std::sync::Arc;
use std::time::Duration;

use crate::inference::Completer;
use compose::{Composer, Key, Outcome};
use suggest::{InputCell, SuggestionWorker};

const KEY_POLL: Duration = Duration::from_millis(50);

struct RawMode;

impl RawMode {
    fn enable() -> Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn to_key(ev: KeyEvent) -> Option<Key> {
    if ev.kind != KeyEventKind::Press {
        return None;
    }
    match ev.code {
        KeyCode::Char('c') if ev.modifiers.contains(KeyModifiers::CONTROL) => Some(Key::Interrupt),
        KeyCode::Esc => Some(Key::Interrupt),
        KeyCode::Char(' ') => Some(Key::Space),
        KeyCode::Char(c) => Some(Key::Char(c)),
        KeyCode::Backspace => Some(Key::Backspace),
        KeyCode::Tab => Some(Key::Tab),
        KeyCode::Enter => Some(Key::Enter),
        _ => None,
    }
}

fn repaint(out: &mut impl Write, line: &str) -> Result<()> {
    queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine), Print(line))?;
    out.flush()?;
    Ok(())
}

/// Runs the demo until Enter or an interrupt; returns the typed body.
pub fn run_demo(completer: Arc<dyn Completer>, subject: &str, refresh: Duration) -> Result<String> {
    println!("\n--- Email Auto-Complete Assistant ---\n");
    println!("Start typing your email body. Press [Tab] to accept suggestions.");
    println!("Press [Enter] when done.\n");

    let cell = Arc::new(InputCell::default());
    let worker = SuggestionWorker::spawn(cell.clone(), completer, subject.to_string(), refresh);
    let mut composer = Composer::default();
    let mut out = stdout();

    let outcome = {
        let _raw = RawMode::enable()?;
        let mut shown: Option<String> = None;
        loop {
            if event::poll(KEY_POLL)? {
                let Event::Key(ev) = event::read()? else {
                    continue;
                };
                let Some(key) = to_key(ev) else {
                    continue;
                };
                let current = worker.fresh(cell.revision());
                match composer.apply(key, current.as_deref()) {
                    Outcome::Edited => {
                        cell.publish(&composer.text());
                    }
                    Outcome::Unchanged => {}
                    done @ (Outcome::Finished | Outcome::Interrupted) => break done,
                }
            }

            let current = worker.fresh(cell.revision());
            let line = composer.render_line(current.as_deref());
            if shown.as_deref() != Some(line.as_str()) {
                repaint(&mut out, &line)?;
                shown = Some(line);
            }
        }
    };
    drop(worker);

    match outcome {
        Outcome::Interrupted => println!("\nExiting the email assistant."),
        _ => println!("\nExiting..."),
    }
    Ok(composer.final_body())
}
