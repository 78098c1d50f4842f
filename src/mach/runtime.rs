use super::event::Events;
use super::file::{Device, DiskDevice, Files};
use super::{Config, Program, Stack, Val, Var, VarHandle};
use crate::error;
use crate::lang::{token, Error, Reader};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

type Result<T> = std::result::Result<T, Error>;

/// ## Events for the user interface

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Nothing to do until a line is entered.
    Stopped,
    /// Still busy, call `execute` again.
    Running,
    Print(String),
    Errors(Vec<Error>),
}

#[derive(Debug, Clone, Copy)]
pub(super) struct GosubRecord {
    pub pos: usize,
    pub run_mode: bool,
    pub trap: Option<usize>,
}

#[derive(Debug, Clone)]
pub(super) struct ForRecord {
    pub for_pos: usize,
    pub next_pos: usize,
    pub handle: VarHandle,
    pub stop: Val,
    pub step: Val,
    pub sign: i8,
}

#[derive(Debug, Clone, Copy)]
pub(super) struct WhileRecord {
    pub while_pos: usize,
    pub wend_pos: usize,
}

/// ## Interpreter session
///
/// Owns the program, variables, open files and event traps. Statements
/// execute one at a time straight from the tokenised program or from the
/// direct mode line.

pub struct Runtime {
    pub(super) program: Program,
    pub(super) vars: Var,
    pub(super) files: Files,
    pub(super) events: Events,
    pub(super) run_mode: bool,
    pub(super) program_pos: usize,
    pub(super) direct_line: Vec<u8>,
    pub(super) direct_pos: usize,
    pub(super) current_statement: usize,
    pub(super) gosub_stack: Stack<GosubRecord>,
    pub(super) for_stack: Stack<ForRecord>,
    pub(super) while_stack: Stack<WhileRecord>,
    pub(super) on_error: Option<u16>,
    pub(super) error_handle_mode: bool,
    pub(super) error_resume: Option<(usize, bool)>,
    pub(super) error_num: u16,
    pub(super) error_pos: Option<usize>,
    pub(super) data_pos: usize,
    pub(super) stop: Option<usize>,
    pub(super) tron: bool,
    pub(super) rng: StdRng,
    pub(super) last_rnd: f32,
    pub(super) column: usize,
    output: String,
    interrupted: bool,
    pending_error: Option<Error>,
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime::new(Config::default())
    }
}

impl Runtime {
    /// Files are opened in the current directory.
    pub fn new(config: Config) -> Runtime {
        Runtime::with_device(config, Box::new(DiskDevice::new(".")))
    }

    pub fn with_device(config: Config, device: Box<dyn Device>) -> Runtime {
        let program = Program::new(&config);
        let files = Files::new(device, config.max_files);
        Runtime {
            program,
            vars: Var::new(),
            files,
            events: Events::new(),
            run_mode: false,
            program_pos: 0,
            direct_line: vec![],
            direct_pos: 0,
            current_statement: 0,
            gosub_stack: Stack::new("GOSUB STACK OVERFLOW"),
            for_stack: Stack::new("FOR STACK OVERFLOW"),
            while_stack: Stack::new("WHILE STACK OVERFLOW"),
            on_error: None,
            error_handle_mode: false,
            error_resume: None,
            error_num: 0,
            error_pos: None,
            data_pos: 0,
            stop: None,
            tron: false,
            rng: StdRng::seed_from_u64(0),
            last_rnd: 0.0,
            column: 0,
            output: String::new(),
            interrupted: false,
            pending_error: None,
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn vars(&self) -> &Var {
        &self.vars
    }

    /// Traps are triggered from outside the interpreter.
    pub fn events(&mut self) -> &mut Events {
        &mut self.events
    }

    pub fn is_running(&self) -> bool {
        self.run_mode
    }

    /// Stores a numbered line or runs a direct mode line.
    pub fn enter(&mut self, line: &str) {
        let tokens = self.program.tokeniser().tokenise_line(line);
        match tokens.first() {
            None => {}
            Some(0) => match self.program.store_line(&tokens) {
                Ok(()) => self.program_edited(),
                Err(e) => self.pending_error = Some(e),
            },
            Some(_) => {
                self.direct_line = tokens;
                self.direct_line.push(0);
                self.set_pointer(false, Some(0));
            }
        }
    }

    /// Stops a running program as if STOP was executed.
    pub fn interrupt(&mut self) {
        self.interrupted = true;
    }

    /// Abandons whatever was running and returns to an idle state.
    pub fn reset(&mut self) {
        self.clear_stacks_and_pointers();
        self.init_error_trapping();
        self.events.suspend(false);
        self.output.clear();
        self.pending_error = None;
        self.interrupted = false;
    }

    /// Runs up to `cycles` statements.
    pub fn execute(&mut self, cycles: usize) -> Event {
        if self.interrupted {
            self.interrupted = false;
            let line = if self.run_mode {
                self.stop = Some(self.program_pos);
                self.program.get_line_number(self.program_pos)
            } else {
                None
            };
            self.set_pointer(false, None);
            self.pending_error = Some(error!(Break).in_line_number(line));
        }
        if !self.output.is_empty() {
            return Event::Print(std::mem::take(&mut self.output));
        }
        if let Some(e) = self.pending_error.take() {
            return Event::Errors(vec![e]);
        }
        for _ in 0..cycles {
            match self.parse_statement() {
                Ok(true) => {}
                Ok(false) => {
                    if self.output.is_empty() {
                        return Event::Stopped;
                    }
                    return Event::Print(std::mem::take(&mut self.output));
                }
                Err(e) => {
                    debug!(error = %e, "stopped on error");
                    if self.output.is_empty() {
                        return Event::Errors(vec![e]);
                    }
                    self.pending_error = Some(e);
                    return Event::Print(std::mem::take(&mut self.output));
                }
            }
            if !self.output.is_empty() {
                return Event::Print(std::mem::take(&mut self.output));
            }
        }
        Event::Running
    }

    pub(super) fn write(&mut self, s: &str) {
        for c in s.chars() {
            if c == '\n' {
                self.column = 0;
            } else {
                self.column += 1;
            }
        }
        self.output.push_str(s);
    }

    pub(super) fn write_line(&mut self, s: &str) {
        self.write(s);
        self.write("\n");
    }

    /// Switches between the program and the direct line. Without a
    /// position the cursor goes to the end, so nothing runs until a jump.
    pub(super) fn set_pointer(&mut self, run_mode: bool, pos: Option<usize>) {
        self.run_mode = run_mode;
        self.events.set_active(run_mode);
        if run_mode {
            self.program_pos = pos.unwrap_or_else(|| self.program.bytecode().len());
        } else {
            self.direct_pos = pos.unwrap_or(self.direct_line.len());
        }
    }

    pub(super) fn init_error_trapping(&mut self) {
        self.error_handle_mode = false;
        self.error_resume = None;
        self.on_error = None;
    }

    pub(super) fn clear_loop_stacks(&mut self) {
        self.for_stack.clear();
        self.while_stack.clear();
    }

    pub(super) fn clear_stacks_and_pointers(&mut self) {
        self.set_pointer(false, None);
        self.gosub_stack.clear();
        self.clear_loop_stacks();
        self.program_pos = 0;
        self.stop = None;
        self.data_pos = 0;
    }

    /// Forgets error and event state, loops and the DATA position.
    pub(super) fn clear(&mut self) {
        self.error_num = 0;
        self.error_pos = None;
        self.init_error_trapping();
        self.events.reset();
        self.clear_loop_stacks();
        self.data_pos = 0;
    }

    /// A changed program can not continue and loses its variables.
    pub(super) fn program_edited(&mut self) {
        self.clear_stacks_and_pointers();
        self.vars.clear();
        self.clear();
    }

    fn stream(&self) -> (&[u8], usize) {
        if self.run_mode {
            (self.program.bytecode(), self.program_pos)
        } else {
            (&self.direct_line, self.direct_pos)
        }
    }

    /// Runs `f` with a reader over the active stream and keeps its
    /// position.
    pub(super) fn with_reader<T, F: FnOnce(&mut Reader) -> T>(&mut self, f: F) -> T {
        let (buf, pos) = self.stream();
        let mut r = Reader::at(buf, pos);
        let out = f(&mut r);
        let pos = r.pos();
        self.seek(pos);
        out
    }

    pub(super) fn tell(&self) -> usize {
        self.stream().1
    }

    pub(super) fn seek(&mut self, pos: usize) {
        if self.run_mode {
            self.program_pos = pos;
        } else {
            self.direct_pos = pos;
        }
    }

    pub(super) fn peek(&self) -> Option<u8> {
        let (buf, pos) = self.stream();
        buf.get(pos).copied()
    }

    pub(super) fn read(&mut self) -> Option<u8> {
        self.with_reader(|r| r.read())
    }

    pub(super) fn read_u16(&mut self) -> Option<u16> {
        self.with_reader(|r| r.read_u16())
    }

    /// Next one or two byte token.
    pub(super) fn peek_token(&self) -> Option<u16> {
        let (buf, pos) = self.stream();
        let c = *buf.get(pos)?;
        if token::is_twobyte_prefix(c) {
            let d = *buf.get(pos + 1)?;
            Some((c as u16) << 8 | d as u16)
        } else {
            Some(c as u16)
        }
    }

    pub(super) fn read_token(&mut self) -> Option<u16> {
        let t = self.peek_token()?;
        self.seek(self.tell() + if t > 0xFF { 2 } else { 1 });
        Some(t)
    }

    pub(super) fn skip_white(&mut self) -> Option<u8> {
        self.with_reader(|r| r.skip_white())
    }

    pub(super) fn skip_white_read_if(&mut self, set: &[u8]) -> bool {
        match self.skip_white() {
            Some(c) if set.contains(&c) => {
                self.read();
                true
            }
            _ => false,
        }
    }

    pub(super) fn require_read(&mut self, set: &[u8]) -> Result<u8> {
        match self.skip_white() {
            Some(c) if set.contains(&c) => {
                self.read();
                Ok(c)
            }
            _ => Err(error!(SyntaxError)),
        }
    }

    pub(super) fn require_end(&mut self) -> Result<()> {
        if token::is_end_statement(self.skip_white()) {
            Ok(())
        } else {
            Err(error!(SyntaxError))
        }
    }

    pub(super) fn skip_to(&mut self, stops: &[u8]) -> Option<u8> {
        self.with_reader(|r| r.skip_to(stops))
    }

    pub(super) fn skip_to_read(&mut self, stops: &[u8]) -> Option<u8> {
        self.with_reader(|r| r.skip_to_read(stops))
    }

    pub(super) fn parse_line_number(&mut self) -> Option<u16> {
        self.with_reader(|r| r.parse_line_number())
    }

    /// A line number after GOTO, GOSUB and friends.
    pub(super) fn parse_jumpnum(&mut self) -> Result<u16> {
        if self.skip_white() != Some(token::T_UINT) {
            return Err(error!(SyntaxError));
        }
        self.read();
        self.read_u16().ok_or_else(|| error!(SyntaxError))
    }

    pub(super) fn parse_jumpnum_opt(&mut self) -> Result<Option<u16>> {
        if self.skip_white() == Some(token::T_UINT) {
            Ok(Some(self.parse_jumpnum()?))
        } else {
            Ok(None)
        }
    }
}
