extern crate ansi_term;
extern crate ctrlc;
extern crate linefeed;
use crate::mach::{Event, Runtime};
use ansi_term::Style;
use linefeed::{Completer, Completion, Interface, Prompter, ReadResult, Terminal};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Interactive session. A file name given on the command line is run
/// before the first prompt.
pub fn main() {
    let interrupted = Arc::new(AtomicBool::new(false));
    let int_moved = interrupted.clone();
    if let Err(error) = ctrlc::set_handler(move || {
        int_moved.store(true, Ordering::SeqCst);
    }) {
        warn!(%error, "can't catch ctrl-c");
    }
    let filename = std::env::args().nth(1);
    if let Err(error) = main_loop(interrupted, filename) {
        eprintln!("{}", error);
    }
}

fn main_loop(interrupted: Arc<AtomicBool>, filename: Option<String>) -> std::io::Result<()> {
    let mut runtime = Runtime::default();
    let command = Interface::new("BASIC")?;
    let mut ready = true;
    if let Some(filename) = filename {
        info!(%filename, "running program");
        runtime.enter(&format!("RUN \"{}\"", filename));
    }
    loop {
        if interrupted.load(Ordering::SeqCst) {
            runtime.interrupt();
            interrupted.store(false, Ordering::SeqCst);
        };
        match runtime.execute(5000) {
            Event::Stopped => {
                if ready {
                    command.write_fmt(format_args!("Ok\n"))?;
                }
                let saved_completer = command.completer();
                command.set_completer(Arc::new(LineCompleter::new(&runtime)));
                let string = match command.read_line()? {
                    ReadResult::Input(string) => string,
                    ReadResult::Signal(_) | ReadResult::Eof => break,
                };
                command.set_completer(saved_completer);
                // Numbered lines are stored quietly.
                ready = !string.trim_start().starts_with(|c: char| c.is_ascii_digit());
                if !string.trim().is_empty() {
                    command.add_history_unique(string.clone());
                }
                runtime.enter(&string);
            }
            Event::Errors(errors) => {
                for error in errors.iter() {
                    command.write_fmt(format_args!(
                        "{}\n",
                        Style::new().bold().paint(error.to_string())
                    ))?;
                }
                ready = true;
            }
            Event::Running => {}
            Event::Print(s) => {
                command.write_fmt(format_args!("{}", s))?;
            }
        }
    }
    Ok(())
}

/// Typing a line number then tab brings back the line for editing.
struct LineCompleter {
    lines: BTreeMap<u32, String>,
}

impl LineCompleter {
    fn new(runtime: &Runtime) -> LineCompleter {
        let mut lines = BTreeMap::new();
        if let Ok(listing) = runtime.program().list_lines(None, None) {
            for line in listing {
                let number = line.split(' ').next().and_then(|n| n.parse::<u32>().ok());
                if let Some(number) = number {
                    lines.insert(number, line);
                }
            }
        }
        LineCompleter { lines }
    }
}

impl<Term: Terminal> Completer<Term> for LineCompleter {
    fn complete(
        &self,
        _word: &str,
        prompter: &Prompter<Term>,
        _start: usize,
        _end: usize,
    ) -> Option<Vec<Completion>> {
        let num = prompter.buffer().trim().parse::<u32>().ok()?;
        let line = self.lines.get(&num)?;
        let mut comp = Completion::simple(line.clone());
        comp.suffix = linefeed::complete::Suffix::None;
        Some(vec![comp])
    }
}
