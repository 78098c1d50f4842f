use super::expression::address;
use super::file::{FileType, Mode};
use super::runtime::WhileRecord;
use super::{Runtime, Val};
use crate::error;
use crate::lang::{from_text, token, Error};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, trace};

type Result<T> = std::result::Result<T, Error>;

const SCREEN_WIDTH: usize = 80;
const ZONE_WIDTH: usize = 14;

/// ## Statements

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statement {
    Clear,
    Close,
    Cont,
    Data,
    Defdbl,
    Defint,
    Defsng,
    Defstr,
    Delete,
    Dim,
    Edit,
    Else,
    End,
    Erase,
    Error,
    For,
    Gosub,
    Goto,
    If,
    Let,
    Line,
    List,
    Llist,
    Load,
    Merge,
    New,
    Next,
    On,
    Open,
    Poke,
    Print,
    Randomize,
    Read,
    Rem,
    Renum,
    Restore,
    Resume,
    Return,
    Run,
    Save,
    Stop,
    Swap,
    Troff,
    Tron,
    Wend,
    While,
    Write,
}

impl Statement {
    pub fn from_token(t: u16) -> Option<Statement> {
        use Statement::*;
        if t > 0xFF {
            return None;
        }
        Some(match t as u8 {
            token::CLEAR => Clear,
            token::CLOSE => Close,
            token::CONT => Cont,
            token::DATA => Data,
            token::DEFDBL => Defdbl,
            token::DEFINT => Defint,
            token::DEFSNG => Defsng,
            token::DEFSTR => Defstr,
            token::DELETE => Delete,
            token::DIM => Dim,
            token::EDIT => Edit,
            token::ELSE => Else,
            token::END => End,
            token::ERASE => Erase,
            token::ERROR => Error,
            token::FOR => For,
            token::GOSUB => Gosub,
            token::GOTO => Goto,
            token::IF => If,
            token::LET => Let,
            token::LINE => Line,
            token::LIST => List,
            token::LLIST => Llist,
            token::LOAD => Load,
            token::MERGE => Merge,
            token::NEW => New,
            token::NEXT => Next,
            token::ON => On,
            token::OPEN => Open,
            token::POKE => Poke,
            token::PRINT => Print,
            token::RANDOMIZE => Randomize,
            token::READ => Read,
            token::REM => Rem,
            token::RENUM => Renum,
            token::RESTORE => Restore,
            token::RESUME => Resume,
            token::RETURN => Return,
            token::RUN => Run,
            token::SAVE => Save,
            token::STOP => Stop,
            token::SWAP => Swap,
            token::TROFF => Troff,
            token::TRON => Tron,
            token::WEND => Wend,
            token::WHILE => While,
            token::WRITE => Write,
            _ => return None,
        })
    }
}

enum ResumeTarget {
    Retry,
    Next,
    Line(u16),
}

impl Runtime {
    pub(super) fn execute_statement(&mut self, statement: Statement) -> Result<()> {
        trace!(?statement, "execute");
        use Statement::*;
        match statement {
            Clear => self.exec_clear(),
            Close => self.exec_close(),
            Cont => self.exec_cont(),
            Data => self.exec_data(),
            Defdbl => self.exec_deftype(b'#'),
            Defint => self.exec_deftype(b'%'),
            Defsng => self.exec_deftype(b'!'),
            Defstr => self.exec_deftype(b'$'),
            Delete => self.exec_delete(),
            Dim => self.exec_dim(),
            Edit => self.exec_edit(),
            Else | Rem => self.exec_rem(),
            End => self.exec_end(),
            Erase => self.exec_erase(),
            Error => self.exec_error(),
            For => self.exec_for(),
            Gosub => self.exec_gosub(),
            Goto => self.exec_goto(),
            If => self.exec_if(),
            Let => self.exec_let(),
            Line => self.exec_line_input(),
            List | Llist => self.exec_list(),
            Load => self.exec_load(),
            Merge => self.exec_merge(),
            New => self.exec_new(),
            Next => self.exec_next(),
            On => self.exec_on(),
            Open => self.exec_open(),
            Poke => self.exec_poke(),
            Print => self.exec_print(),
            Randomize => self.exec_randomize(),
            Read => self.exec_read(),
            Renum => self.exec_renum(),
            Restore => self.exec_restore(),
            Resume => self.exec_resume(),
            Return => self.exec_return(),
            Run => self.exec_run(),
            Save => self.exec_save(),
            Stop => self.exec_stop(),
            Swap => self.exec_swap(),
            Troff => self.exec_tron(false),
            Tron => self.exec_tron(true),
            Wend => self.exec_wend(),
            While => self.exec_while(true),
            Write => self.exec_write(),
        }
    }

    pub(super) fn exec_let(&mut self) -> Result<()> {
        let (name, indices) = self.parse_variable()?;
        self.require_read(&[token::O_EQ])?;
        let val = self.parse_expression()?;
        self.set_value(&name, &indices, val)?;
        self.require_end()
    }

    fn exec_rem(&mut self) -> Result<()> {
        self.with_reader(|r| {
            r.read_to(&[0]);
        });
        Ok(())
    }

    fn exec_data(&mut self) -> Result<()> {
        self.skip_to(token::END_STATEMENT);
        Ok(())
    }

    fn exec_clear(&mut self) -> Result<()> {
        self.skip_to(token::END_STATEMENT);
        self.vars.clear();
        self.files.close_all()?;
        self.clear();
        Ok(())
    }

    fn exec_end(&mut self) -> Result<()> {
        self.require_end()?;
        if self.run_mode {
            self.stop = Some(self.tell());
        }
        self.set_pointer(false, None);
        self.files.close_all()
    }

    fn exec_stop(&mut self) -> Result<()> {
        self.require_end()?;
        if self.run_mode {
            self.stop = Some(self.tell());
        }
        Err(error!(Break))
    }

    fn exec_cont(&mut self) -> Result<()> {
        match self.stop {
            None => Err(error!(CantContinue)),
            Some(pos) => {
                self.set_pointer(true, Some(pos));
                Ok(())
            }
        }
    }

    fn exec_tron(&mut self, on: bool) -> Result<()> {
        self.require_end()?;
        self.tron = on;
        Ok(())
    }

    fn exec_goto(&mut self) -> Result<()> {
        let line = self.parse_jumpnum()?;
        self.jump(Some(line))
    }

    fn exec_gosub(&mut self) -> Result<()> {
        let line = self.parse_jumpnum()?;
        self.skip_to(token::END_STATEMENT);
        self.jump_gosub(line, None)
    }

    fn exec_return(&mut self) -> Result<()> {
        let line = if token::is_end_statement(self.skip_white()) {
            None
        } else {
            Some(self.parse_jumpnum()?)
        };
        self.jump_return(line)
    }

    fn exec_if(&mut self) -> Result<()> {
        let val = self.parse_expression()?;
        self.skip_white_read_if(b",");
        self.require_read(&[token::THEN, token::GOTO])?;
        if !val.is_zero()? {
            if let Some(line) = self.parse_jumpnum_opt()? {
                self.jump(Some(line))?;
            }
            return Ok(());
        }
        let mut nesting = 0;
        loop {
            match self.skip_to_read(&[0, b':', token::IF]) {
                Some(token::IF) => nesting += 1,
                Some(b':') => {
                    if self.skip_white_read_if(&[token::ELSE]) {
                        if nesting > 0 {
                            nesting -= 1;
                        } else {
                            if let Some(line) = self.parse_jumpnum_opt()? {
                                self.jump(Some(line))?;
                            }
                            return Ok(());
                        }
                    }
                }
                Some(_) => {
                    self.seek(self.tell() - 1);
                    return Ok(());
                }
                None => return Ok(()),
            }
        }
    }

    fn exec_for(&mut self) -> Result<()> {
        let name = self.parse_name()?;
        self.require_read(&[token::O_EQ])?;
        let start = self.parse_expression()?;
        self.require_read(&[token::TO])?;
        let stop = self.parse_expression()?;
        let step = if self.skip_white_read_if(&[token::STEP]) {
            self.parse_expression()?
        } else {
            Val::Integer(1)
        };
        self.require_end()?;
        let for_pos = self.tell();
        let next_pos = self.find_next(&name)?;
        self.loop_init(for_pos, next_pos, &name, start, stop, step)?;
        self.exec_next()
    }

    /// Position right after the NEXT, or comma, that closes the loop.
    fn find_next(&mut self, name: &std::rc::Rc<str>) -> Result<usize> {
        let current = self.tell();
        self.skip_to_next(token::FOR, token::NEXT, true);
        match self.skip_white() {
            Some(token::NEXT) | Some(b',') => {}
            _ => {
                self.seek(current);
                return Err(error!(ForWithoutNext));
            }
        }
        let comma = self.read() == Some(b',');
        let next_pos = self.tell();
        let next_name = self.parse_name_opt()?;
        match &next_name {
            None => {
                if comma || !token::is_end_statement(self.skip_white()) {
                    return Err(error!(NextWithoutFor));
                }
            }
            Some(next_name) => {
                if next_name != name {
                    return Err(error!(NextWithoutFor));
                }
            }
        }
        self.seek(next_pos);
        Ok(next_pos)
    }

    fn exec_next(&mut self) -> Result<()> {
        loop {
            let pos = self.tell();
            if self.parse_name_opt()?.is_none() {
                match self.skip_white() {
                    Some(b',') => {}
                    c if token::is_end_statement(c) => {}
                    _ => return Err(error!(SyntaxError)),
                }
            }
            if self.loop_iterate(pos)? {
                break;
            }
            if !self.skip_white_read_if(b",") {
                break;
            }
        }
        self.require_end()
    }

    fn exec_while(&mut self, first: bool) -> Result<()> {
        let while_pos = self.tell();
        let val = self.parse_expression()?;
        if first {
            let current = self.tell();
            self.skip_to_next(token::WHILE, token::WEND, false);
            if self.read() != Some(token::WEND) {
                self.seek(current);
                return Err(error!(WhileWithoutWend));
            }
            self.skip_to(token::END_STATEMENT);
            let wend_pos = self.tell();
            self.seek(current);
            self.while_stack.push(WhileRecord {
                while_pos,
                wend_pos,
            })?;
        }
        if val.is_zero()? {
            let record = self.while_stack.pop()?;
            self.seek(record.wend_pos);
        }
        Ok(())
    }

    fn exec_wend(&mut self) -> Result<()> {
        self.require_end()?;
        let pos = self.tell();
        loop {
            let record = match self.while_stack.last() {
                Some(record) => *record,
                None => return Err(error!(WendWithoutWhile)),
            };
            if record.wend_pos == pos {
                self.seek(record.while_pos);
                return self.exec_while(false);
            }
            self.while_stack.pop()?;
        }
    }

    fn exec_on(&mut self) -> Result<()> {
        if self.skip_white_read_if(&[token::ERROR]) {
            return self.exec_on_error();
        }
        let n = self.parse_expression()?.to_i16()?;
        if !(0..=255).contains(&n) {
            return Err(error!(IllegalFunctionCall));
        }
        let command = self.require_read(&[token::GOTO, token::GOSUB])?;
        let mut jumps = vec![];
        loop {
            jumps.push(self.parse_jumpnum()?);
            if !self.skip_white_read_if(b",") {
                break;
            }
        }
        self.require_end()?;
        match jumps.get((n as usize).wrapping_sub(1)) {
            Some(&line) if command == token::GOSUB => self.jump_gosub(line, None),
            Some(&line) => self.jump(Some(line)),
            None => Ok(()),
        }
    }

    fn exec_on_error(&mut self) -> Result<()> {
        self.require_read(&[token::GOTO])?;
        let line = self.parse_jumpnum()?;
        if line != 0 && !self.program.contains_line(line as u32) {
            return Err(error!(UndefinedLine));
        }
        self.on_error = Some(line);
        if line == 0 && self.error_handle_mode {
            let e = Error::from_number(self.error_num);
            return Err(match self.error_pos {
                Some(pos) => e.at(pos),
                None => e,
            });
        }
        self.require_end()
    }

    fn exec_resume(&mut self) -> Result<()> {
        let (start, run_mode) = match self.error_resume {
            Some(resume) => resume,
            None => return Err(error!(ResumeWithoutError)),
        };
        let target = match self.skip_white() {
            Some(token::NEXT) => {
                self.read();
                ResumeTarget::Next
            }
            c if token::is_end_statement(c) => ResumeTarget::Retry,
            _ => match self.parse_jumpnum()? {
                0 => ResumeTarget::Retry,
                line => ResumeTarget::Line(line),
            },
        };
        self.require_end()?;
        self.error_num = 0;
        self.error_handle_mode = false;
        self.error_resume = None;
        self.events.suspend(false);
        match target {
            ResumeTarget::Retry => {
                self.set_pointer(run_mode, Some(start));
                Ok(())
            }
            ResumeTarget::Next => {
                self.set_pointer(run_mode, Some(start));
                self.with_reader(|r| {
                    match r.peek() {
                        Some(0) => {
                            r.read();
                            r.parse_line_number();
                        }
                        Some(b':') => {
                            r.read();
                        }
                        _ => {}
                    }
                    r.skip_to(token::END_STATEMENT);
                });
                Ok(())
            }
            ResumeTarget::Line(line) => self.jump(Some(line)),
        }
    }

    fn exec_error(&mut self) -> Result<()> {
        let n = self.parse_expression()?.to_i16()?;
        self.require_end()?;
        if !(1..=255).contains(&n) {
            return Err(error!(IllegalFunctionCall));
        }
        Err(Error::from_number(n as u16))
    }

    fn exec_restore(&mut self) -> Result<()> {
        let line = self.parse_jumpnum_opt()?;
        self.require_end()?;
        self.restore(line)
    }

    fn exec_read(&mut self) -> Result<()> {
        loop {
            let (name, indices) = self.parse_variable()?;
            let entry = self.read_entry()?;
            let val = if name.ends_with('$') {
                Val::String(entry.into())
            } else {
                match from_text(&entry) {
                    Some(n) => n.into(),
                    None => return Err(error!(SyntaxError, at self.data_pos.saturating_sub(1))),
                }
            };
            self.set_value(&name, &indices, val)?;
            if !self.skip_white_read_if(b",") {
                break;
            }
        }
        self.require_end()
    }

    fn exec_dim(&mut self) -> Result<()> {
        loop {
            let name = self.parse_name()?;
            self.require_read(b"([")?;
            let mut dims = vec![];
            loop {
                dims.push(self.parse_expression()?.to_i16()?);
                if !self.skip_white_read_if(b",") {
                    break;
                }
            }
            self.require_read(b")]")?;
            self.vars.dimension_array(&name, &dims)?;
            if !self.skip_white_read_if(b",") {
                break;
            }
        }
        self.require_end()
    }

    fn exec_erase(&mut self) -> Result<()> {
        loop {
            let name = self.parse_name()?;
            self.vars.erase_array(&name)?;
            if !self.skip_white_read_if(b",") {
                break;
            }
        }
        self.require_end()
    }

    fn exec_swap(&mut self) -> Result<()> {
        let (name1, indices1) = self.parse_variable()?;
        self.require_read(b",")?;
        let (name2, indices2) = self.parse_variable()?;
        self.require_end()?;
        if name1.bytes().last() != name2.bytes().last() {
            return Err(error!(TypeMismatch));
        }
        let val1 = self.get_value(&name1, &indices1)?;
        let val2 = self.get_value(&name2, &indices2)?;
        self.set_value(&name1, &indices1, val2)?;
        self.set_value(&name2, &indices2, val1)
    }

    fn exec_deftype(&mut self, typechar: u8) -> Result<()> {
        loop {
            let first = self.parse_letter()?;
            let last = if self.skip_white_read_if(&[token::O_MINUS]) {
                self.parse_letter()?
            } else {
                first
            };
            self.vars.set_deftype(first, last, typechar);
            if !self.skip_white_read_if(b",") {
                break;
            }
        }
        self.require_end()
    }

    fn parse_letter(&mut self) -> Result<u8> {
        match self.skip_white() {
            Some(c) if c.is_ascii_alphabetic() => {
                self.read();
                Ok(c)
            }
            _ => Err(error!(SyntaxError)),
        }
    }

    fn exec_poke(&mut self) -> Result<()> {
        let addr = address(&self.parse_expression()?)?;
        self.require_read(b",")?;
        let val = self.parse_expression()?.to_i16()?;
        self.require_end()?;
        if !(0..=255).contains(&val) {
            return Err(error!(IllegalFunctionCall));
        }
        if addr >= self.program.code_start() {
            self.program.poke_byte(addr, val as u8);
        } else {
            trace!(addr, "POKE outside program memory");
        }
        Ok(())
    }

    fn exec_randomize(&mut self) -> Result<()> {
        let seed = match self.parse_expression_opt(true)? {
            Some(val) => val.to_f64()?.to_bits(),
            None => chrono::Local::now().timestamp_nanos_opt().unwrap_or(0) as u64,
        };
        self.require_end()?;
        self.rng = StdRng::seed_from_u64(seed);
        Ok(())
    }

    /// Optional file number in front of a PRINT, WRITE or INPUT list.
    fn parse_file_number(&mut self) -> Result<Option<i16>> {
        if !self.skip_white_read_if(b"#") {
            return Ok(None);
        }
        let number = self.parse_expression()?.to_i16()?;
        self.require_read(b",")?;
        Ok(Some(number))
    }

    fn output_to(&mut self, file: Option<i16>, text: &str) -> Result<()> {
        match file {
            None => {
                self.write(text);
                Ok(())
            }
            Some(number) => {
                let bytes = text.replace('\n', "\r\n");
                let handle = self.files.get(number, &[Mode::Output, Mode::Append, Mode::Random])?;
                handle.write(bytes.as_bytes())
            }
        }
    }

    fn exec_print(&mut self) -> Result<()> {
        let file = self.parse_file_number()?;
        let mut out = String::new();
        let mut column = if file.is_none() { self.column } else { 0 };
        let mut newline = true;
        loop {
            let d = self.skip_white();
            if token::is_end_statement(d) {
                break;
            }
            newline = true;
            match d {
                Some(b';') => {
                    self.read();
                    newline = false;
                }
                Some(b',') => {
                    self.read();
                    newline = false;
                    let zone = (column / ZONE_WIDTH + 1) * ZONE_WIDTH;
                    if zone >= SCREEN_WIDTH {
                        push(&mut out, &mut column, "\n");
                    } else {
                        let pad = " ".repeat(zone - column);
                        push(&mut out, &mut column, &pad);
                    }
                }
                Some(token::SPC) => {
                    self.read();
                    let n = self.parse_expression()?.to_i16()?;
                    self.require_read(b")")?;
                    newline = false;
                    let n = n.clamp(0, 255) as usize % SCREEN_WIDTH;
                    push(&mut out, &mut column, &" ".repeat(n));
                }
                Some(token::TAB) => {
                    self.read();
                    let n = self.parse_expression()?.to_i16()?;
                    self.require_read(b")")?;
                    newline = false;
                    let target = (n.clamp(1, 255) as usize - 1) % SCREEN_WIDTH;
                    if target < column {
                        push(&mut out, &mut column, "\n");
                    }
                    let pad = " ".repeat(target - column);
                    push(&mut out, &mut column, &pad);
                }
                _ => {
                    let text = match self.parse_expression()? {
                        Val::String(s) => s.to_string(),
                        val => format!("{} ", val),
                    };
                    push(&mut out, &mut column, &text);
                }
            }
        }
        if newline {
            out.push('\n');
        }
        self.output_to(file, &out)
    }

    fn exec_write(&mut self) -> Result<()> {
        let file = self.parse_file_number()?;
        let mut items = vec![];
        loop {
            match self.parse_expression_opt(true)? {
                None => break,
                Some(Val::String(s)) => items.push(format!("\"{}\"", s)),
                Some(val) => items.push(val.to_string().trim_start().to_string()),
            }
            if !self.skip_white_read_if(b",;") {
                break;
            }
        }
        self.require_end()?;
        let mut out = items.join(",");
        out.push('\n');
        self.output_to(file, &out)
    }

    fn exec_line_input(&mut self) -> Result<()> {
        self.require_read(&[token::INPUT])?;
        let number = match self.parse_file_number()? {
            Some(number) => number,
            None => return Err(error!(SyntaxError)),
        };
        let (name, indices) = self.parse_variable()?;
        self.require_end()?;
        if !name.ends_with('$') {
            return Err(error!(TypeMismatch));
        }
        let line = match self.files.get(number, &[Mode::Input])?.read_line()? {
            Some(line) => line,
            None => return Err(error!(InputPastEnd)),
        };
        self.set_value(&name, &indices, Val::String(line.into()))
    }

    fn exec_open(&mut self) -> Result<()> {
        let first = self.parse_expression()?.into_string()?;
        let (number, name, mode) = if self.skip_white_read_if(b",") {
            let mode = match Mode::from_letter(first.trim()) {
                Some(mode) => mode,
                None => return Err(error!(BadFileMode)),
            };
            self.skip_white_read_if(b"#");
            let number = self.parse_expression()?.to_i16()?;
            self.require_read(b",")?;
            let name = self.parse_expression()?.into_string()?;
            if self.skip_white_read_if(b",") {
                self.parse_expression()?;
            }
            (number, name, mode)
        } else {
            let mode = if self.skip_white_read_if(&[token::FOR]) {
                if self.skip_white_read_if(&[token::INPUT]) {
                    Mode::Input
                } else {
                    match self.parse_word().as_str() {
                        "OUTPUT" => Mode::Output,
                        "APPEND" => Mode::Append,
                        "RANDOM" => Mode::Random,
                        _ => return Err(error!(SyntaxError)),
                    }
                }
            } else {
                Mode::Random
            };
            if self.parse_word() != "AS" {
                return Err(error!(SyntaxError));
            }
            self.skip_white_read_if(b"#");
            let number = self.parse_expression()?.to_i16()?;
            (number, first, mode)
        };
        self.require_end()?;
        debug!(number, name = %name, ?mode, "open");
        self.files.open(number, &name, FileType::Ascii, mode)
    }

    /// Letters that the tokeniser left as plain text.
    fn parse_word(&mut self) -> String {
        self.skip_white();
        self.with_reader(|r| {
            let mut word = String::new();
            while let Some(c) = r.peek() {
                if !c.is_ascii_alphabetic() {
                    break;
                }
                word.push(c.to_ascii_uppercase() as char);
                r.read();
            }
            word
        })
    }

    fn exec_close(&mut self) -> Result<()> {
        if token::is_end_statement(self.skip_white()) {
            return self.files.close_all();
        }
        loop {
            self.skip_white_read_if(b"#");
            let number = self.parse_expression()?.to_i16()?;
            self.files.close(number)?;
            if !self.skip_white_read_if(b",") {
                break;
            }
        }
        self.require_end()
    }

    fn parse_line_range(&mut self) -> Result<(Option<u16>, Option<u16>)> {
        let from = self.parse_jumpnum_opt()?;
        if self.skip_white_read_if(&[token::O_MINUS]) {
            let to = self.parse_jumpnum_opt()?;
            Ok((from, to))
        } else {
            Ok((from, from))
        }
    }

    fn exec_list(&mut self) -> Result<()> {
        let (from, to) = self.parse_line_range()?;
        let file = if self.skip_white_read_if(b",") {
            Some(self.parse_expression()?.into_string()?)
        } else {
            None
        };
        self.require_end()?;
        let lines = self
            .program
            .list_lines(from.map(u32::from), to.map(u32::from))?;
        match file {
            None => {
                for line in &lines {
                    self.write_line(line);
                }
                Ok(())
            }
            Some(name) => {
                let mut file = self.files.open_unnumbered(&name, FileType::Ascii, Mode::Output)?;
                for line in &lines {
                    file.write_line(line)?;
                }
                file.close()
            }
        }
    }

    fn exec_delete(&mut self) -> Result<()> {
        let (from, to) = self.parse_line_range()?;
        self.require_end()?;
        if from.is_none() && to.is_none() {
            return Err(error!(IllegalFunctionCall));
        }
        self.program.delete(from.map(u32::from), to.map(u32::from))?;
        self.program_edited();
        Ok(())
    }

    fn exec_renum(&mut self) -> Result<()> {
        let mut args = [None; 3];
        for (i, arg) in args.iter_mut().enumerate() {
            if i > 0 && !self.skip_white_read_if(b",") {
                break;
            }
            *arg = self.parse_jumpnum_opt()?.map(u32::from);
        }
        self.require_end()?;
        let renumbered = self.program.renum(args[0], args[1], args[2])?;
        for (jump, line) in renumbered.undefined {
            let text = match line {
                Some(line) => format!("Undefined line {} in {}", jump, line),
                None => format!("Undefined line {}", jump),
            };
            self.write_line(&text);
        }
        self.program_edited();
        Ok(())
    }

    fn exec_edit(&mut self) -> Result<()> {
        let line = self.parse_jumpnum()?;
        self.require_end()?;
        let (text, _) = self.program.edit(line as u32, None)?;
        self.write_line(&text);
        Ok(())
    }

    fn exec_new(&mut self) -> Result<()> {
        self.require_end()?;
        self.files.close_all()?;
        self.program.erase();
        self.program_edited();
        Ok(())
    }

    /// Program file name with an optional `,R`, `,A` or `,P` flag.
    fn parse_file_with_flag(&mut self, flags: &[u8]) -> Result<(String, Option<u8>)> {
        let name = self.parse_expression()?.into_string()?;
        let flag = if self.skip_white_read_if(b",") {
            let word = self.parse_word();
            match word.bytes().next() {
                Some(c) if word.len() == 1 && flags.contains(&c) => Some(c),
                _ => return Err(error!(SyntaxError)),
            }
        } else {
            None
        };
        self.require_end()?;
        Ok((name.to_string(), flag))
    }

    fn load_program(&mut self, name: &str) -> Result<()> {
        let mut file = self.files.open_unnumbered(name, FileType::Ascii, Mode::Input)?;
        self.program.load(file.as_mut(), true)?;
        file.close()?;
        debug!(name, "loaded program");
        Ok(())
    }

    fn exec_run(&mut self) -> Result<()> {
        let mut line = None;
        let mut close_files = true;
        match self.skip_white() {
            Some(token::T_UINT) => line = Some(self.parse_jumpnum()?),
            c if token::is_end_statement(c) => {}
            _ => {
                let (name, flag) = self.parse_file_with_flag(b"R")?;
                close_files = flag.is_none();
                self.load_program(&name)?;
            }
        }
        self.clear_stacks_and_pointers();
        self.vars.clear();
        if close_files {
            self.files.close_all()?;
        }
        self.clear();
        self.jump(line)
    }

    fn exec_load(&mut self) -> Result<()> {
        let (name, flag) = self.parse_file_with_flag(b"R")?;
        if flag.is_none() {
            self.files.close_all()?;
        }
        self.load_program(&name)?;
        self.program_edited();
        if flag.is_some() {
            self.jump(None)?;
        }
        Ok(())
    }

    fn exec_save(&mut self) -> Result<()> {
        let (name, flag) = self.parse_file_with_flag(b"AP")?;
        let filetype = match flag {
            Some(b'A') => FileType::Ascii,
            Some(b'P') => FileType::Protected,
            _ => FileType::Binary,
        };
        let mut file = self.files.open_unnumbered(&name, filetype, Mode::Output)?;
        self.program.save(file.as_mut())?;
        file.close()
    }

    fn exec_merge(&mut self) -> Result<()> {
        let (name, _) = self.parse_file_with_flag(b"")?;
        let mut file = self.files.open_unnumbered(&name, FileType::Ascii, Mode::Input)?;
        if file.filetype() != FileType::Ascii {
            return Err(error!(BadFileMode));
        }
        self.program.merge(file.as_mut())?;
        file.close()?;
        self.program_edited();
        Ok(())
    }
}

fn push(out: &mut String, column: &mut usize, text: &str) {
    for c in text.chars() {
        if c == '\n' {
            *column = 0;
        } else {
            *column += 1;
        }
    }
    out.push_str(text);
}
