use super::runtime::{ForRecord, GosubRecord};
use super::statement::Statement;
use super::{Operation, Runtime, Val};
use crate::error;
use crate::lang::{token, Error, Reader};
use std::cmp::Ordering;
use std::rc::Rc;
use tracing::{debug, trace};

type Result<T> = std::result::Result<T, Error>;

impl Runtime {
    /// Executes one statement. Returns false once there is nothing left
    /// to run. Errors are trapped by ON ERROR when possible.
    pub fn parse_statement(&mut self) -> Result<bool> {
        match self.next_statement() {
            Ok(more) => Ok(more),
            Err(e) if e.is_break() => {
                let line = if self.run_mode {
                    self.program.get_line_number(self.program_pos)
                } else {
                    None
                };
                self.set_pointer(false, None);
                Err(e.in_line_number(line))
            }
            Err(e) => {
                self.trap_error(e)?;
                Ok(true)
            }
        }
    }

    fn next_statement(&mut self) -> Result<bool> {
        self.handle_basic_events()?;
        self.current_statement = self.tell();
        match self.skip_white() {
            None => {
                self.set_pointer(false, None);
                return Ok(false);
            }
            Some(0) => {
                let prepos = self.tell();
                self.read();
                match self.parse_line_number() {
                    Some(line) => {
                        if self.tron {
                            self.write(&format!("[{}]", line));
                        }
                        trace!(line, "enter line");
                    }
                    None => {
                        if self.run_mode && self.error_resume.is_some() {
                            self.error_handle_mode = true;
                            return Err(error!(NoResume, at prepos.saturating_sub(1)));
                        }
                        self.set_pointer(false, None);
                        return Ok(false);
                    }
                }
            }
            Some(b':') => {
                self.read();
            }
            _ => {}
        }
        let c = self.skip_white();
        if token::is_end_statement(c) {
            return Ok(true);
        }
        if c.map_or(false, |c| c.is_ascii_alphabetic()) {
            self.exec_let()?;
            return Ok(true);
        }
        let statement = match self.read_token().and_then(Statement::from_token) {
            Some(statement) => statement,
            None => return Err(error!(SyntaxError)),
        };
        self.execute_statement(statement)?;
        Ok(true)
    }

    /// Jumps to the ON ERROR handler, or returns the error with its line
    /// number once execution has stopped.
    fn trap_error(&mut self, e: Error) -> Result<()> {
        let pos = match e.pos() {
            Some(pos) => Some(pos),
            None if self.run_mode => Some(self.program_pos.saturating_sub(1)),
            None => None,
        };
        self.error_num = e.code();
        self.error_pos = pos;
        match self.on_error {
            Some(line) if line != 0 && !self.error_handle_mode => {
                debug!(code = e.code(), line, "trapped error");
                self.error_resume = Some((self.current_statement, self.run_mode));
                if let Err(e) = self.jump(Some(line)) {
                    self.set_pointer(false, None);
                    return Err(e);
                }
                self.error_handle_mode = true;
                self.events.suspend(true);
                Ok(())
            }
            _ => {
                self.error_handle_mode = false;
                let line = pos.and_then(|pos| self.program.get_line_number(pos));
                self.set_pointer(false, None);
                let e = match pos {
                    Some(pos) if e.pos().is_none() => e.at(pos),
                    _ => e,
                };
                Err(e.in_line_number(line))
            }
        }
    }

    fn handle_basic_events(&mut self) -> Result<()> {
        if let Some((index, line)) = self.events.next_pending() {
            trace!(index, line, "event trap");
            self.jump_gosub(line, Some(index))?;
        }
        Ok(())
    }

    /// Line number of the last error for ERL. Errors outside the program
    /// report 65535.
    pub(super) fn error_line(&self) -> u32 {
        if self.error_num == 0 {
            return 0;
        }
        match self.error_pos.and_then(|pos| self.program.get_line_number(pos)) {
            Some(line) if line < 65535 => line,
            _ => 65535,
        }
    }

    pub(super) fn jump(&mut self, line: Option<u16>) -> Result<()> {
        self.jump_or(line, error!(UndefinedLine))
    }

    /// Jumps to a program line, with `err` when it doesn't exist. Without
    /// a line the program starts from the top.
    pub(super) fn jump_or(&mut self, line: Option<u16>, err: Error) -> Result<()> {
        match line {
            None => {
                self.set_pointer(true, Some(0));
                Ok(())
            }
            Some(line) => match self.program.line_offset(line as u32) {
                Some(offset) => {
                    self.set_pointer(true, Some(offset));
                    Ok(())
                }
                None => Err(err),
            },
        }
    }

    pub(super) fn jump_gosub(&mut self, line: u16, trap: Option<usize>) -> Result<()> {
        self.gosub_stack.push(GosubRecord {
            pos: self.tell(),
            run_mode: self.run_mode,
            trap,
        })?;
        self.jump(Some(line))
    }

    pub(super) fn jump_return(&mut self, line: Option<u16>) -> Result<()> {
        if self.gosub_stack.is_empty() {
            return Err(error!(ReturnWithoutGosub));
        }
        let record = self.gosub_stack.pop()?;
        if let Some(index) = record.trap {
            self.events.release(index);
        }
        match line {
            None => {
                self.set_pointer(record.run_mode, Some(record.pos));
                Ok(())
            }
            Some(line) => self.jump(Some(line)),
        }
    }

    /// Starts a FOR loop and moves to its NEXT, where the first
    /// iteration is counted.
    pub(super) fn loop_init(
        &mut self,
        for_pos: usize,
        next_pos: usize,
        name: &Rc<str>,
        start: Val,
        stop: Val,
        step: Val,
    ) -> Result<()> {
        let typechar = name.bytes().last().unwrap_or(b'!');
        if typechar == b'$' {
            return Err(error!(TypeMismatch));
        }
        let start = start.coerce(typechar)?;
        let stop = stop.coerce(typechar)?;
        let step = step.coerce(typechar)?;
        let handle = self.vars.handle(name)?;
        self.vars.mutate(handle, Operation::subtract(&start, &step)?)?;
        if let Some(depth) = self.for_stack.rposition(|r| r.for_pos == for_pos) {
            self.for_stack.truncate(depth);
        }
        let sign = step.sign()?;
        self.for_stack.push(ForRecord {
            for_pos,
            next_pos,
            handle,
            stop,
            step,
            sign,
        })?;
        self.seek(next_pos);
        Ok(())
    }

    /// Counts one iteration of the loop whose NEXT is at `next_pos`.
    /// Returns true if execution went back to the FOR.
    pub(super) fn loop_iterate(&mut self, next_pos: usize) -> Result<bool> {
        let depth = match self.for_stack.rposition(|r| r.next_pos == next_pos) {
            Some(depth) => depth,
            None => return Err(error!(NextWithoutFor)),
        };
        self.for_stack.truncate(depth + 1);
        let record = match self.for_stack.last() {
            Some(record) => record.clone(),
            None => return Err(error!(NextWithoutFor)),
        };
        if self.loop_ends(&record)? {
            self.for_stack.pop()?;
            Ok(false)
        } else {
            self.seek(record.for_pos);
            Ok(true)
        }
    }

    /// A zero step never ends and leaves the variable alone.
    fn loop_ends(&mut self, record: &ForRecord) -> Result<bool> {
        if record.sign == 0 {
            return Ok(false);
        }
        let next = Operation::sum(&self.vars.value(record.handle), &record.step)?;
        let ordering = Operation::compare(&next, &record.stop)?;
        self.vars.mutate(record.handle, next)?;
        Ok(if record.sign > 0 {
            ordering == Ordering::Greater
        } else {
            ordering == Ordering::Less
        })
    }

    /// Moves to the NEXT or WEND matching the current FOR or WHILE,
    /// skipping nested pairs. Stops on the closing keyword without reading
    /// it, or at the end of the program.
    pub(super) fn skip_to_next(&mut self, open: u8, close: u8, allow_comma: bool) {
        let mut depth = 0;
        loop {
            match self.skip_to_read(&[0, b':', token::THEN, token::ELSE]) {
                None => return,
                Some(0) => {
                    if self.parse_line_number().is_none() {
                        return;
                    }
                }
                _ => {}
            }
            match self.skip_white() {
                None => return,
                Some(c) if c == open => {
                    self.read();
                    depth += 1;
                }
                Some(c) if c == close => {
                    if depth == 0 {
                        return;
                    }
                    self.read();
                    depth -= 1;
                    if allow_comma {
                        while !token::is_end_statement(self.skip_white()) {
                            self.skip_to(&[0, b':', b',']);
                            if self.peek() == Some(b',') {
                                if depth == 0 {
                                    return;
                                }
                                self.read();
                                depth -= 1;
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }

    pub(super) fn restore(&mut self, line: Option<u16>) -> Result<()> {
        self.data_pos = match line {
            None => 0,
            Some(line) => match self.program.line_offset(line as u32) {
                Some(offset) => offset,
                None => return Err(error!(UndefinedLine)),
            },
        };
        Ok(())
    }

    /// Reads the next DATA item as text. Quoted items keep their spaces and
    /// commas, unquoted ones are trimmed.
    pub(super) fn read_entry(&mut self) -> Result<String> {
        let mut r = Reader::at(self.program.bytecode(), self.data_pos);
        if token::is_end_statement(r.peek()) {
            r.skip_to(&[token::DATA]);
        }
        match r.read() {
            Some(token::DATA) | Some(b',') => {}
            _ => return Err(error!(OutOfData)),
        }
        let mut vals: Vec<u8> = vec![];
        let mut word: Vec<u8> = vec![];
        let mut literal = false;
        loop {
            let c = if !literal && vals.is_empty() {
                r.skip_white()
            } else {
                r.peek()
            };
            let c = match c {
                None | Some(0) => break,
                Some(c) if !literal && (c == b',' || c == b':') => break,
                Some(c) => c,
            };
            r.read();
            if c == b'"' {
                literal = !literal;
                if !literal {
                    match r.skip_white() {
                        None | Some(0) | Some(b':') | Some(b',') => {}
                        _ => return Err(error!(SyntaxError, at r.pos())),
                    }
                }
                continue;
            }
            if literal {
                vals.push(c);
            } else {
                word.push(c);
                if !token::WHITESPACE.contains(&c) {
                    vals.append(&mut word);
                }
            }
        }
        self.data_pos = r.pos();
        Ok(String::from_utf8_lossy(&vals).into_owned())
    }
}
