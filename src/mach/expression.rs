use super::file::Mode;
use super::{Function, Operation, Operator, Runtime, Val};
use crate::error;
use crate::lang::{read_number, token, tokenise_number, Error, Reader};
use chrono::Timelike;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

const MAX_NAME_LEN: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Last {
    Nothing,
    Operator,
    Unit,
}

impl Runtime {
    pub(super) fn parse_expression(&mut self) -> Result<Val> {
        match self.parse_expression_opt(false)? {
            Some(val) => Ok(val),
            None => Err(error!(MissingOperand)),
        }
    }

    /// Evaluates an expression with operator precedence. An empty
    /// expression is `None` if allowed.
    pub(super) fn parse_expression_opt(&mut self, allow_empty: bool) -> Result<Option<Val>> {
        let mut stack: Vec<(Operator, usize)> = vec![];
        let mut units: Vec<Val> = vec![];
        let mut last = Last::Nothing;
        let mut missing = error!(MissingOperand);
        loop {
            let d = self.skip_white();
            if let Some(op) = d.and_then(Operator::from_token) {
                if op == Operator::Not && last == Last::Unit {
                    break;
                }
                self.read();
                let mut op = op;
                if op.is_combinable() {
                    if let Some(next) = self.skip_white().and_then(Operator::from_token) {
                        if next.is_combinable() {
                            self.read();
                            op = match op.combine(next) {
                                Some(op) => op,
                                None => return Err(error!(SyntaxError)),
                            };
                        }
                    }
                }
                if last != Last::Unit {
                    match op.unary() {
                        Some(op) => stack.push((op, 1)),
                        None => return Err(error!(SyntaxError)),
                    }
                } else {
                    self.evaluate_stack(&mut stack, &mut units, op.precedence(), &missing)?;
                    stack.push((op, 2));
                }
                last = Last::Operator;
                continue;
            }
            if last == Last::Unit {
                break;
            }
            match d {
                Some(b'(') => {
                    let val = self.parse_bracket()?;
                    units.push(val);
                }
                Some(c) if c.is_ascii_alphabetic() => {
                    let (name, indices) = self.parse_variable()?;
                    units.push(self.get_value(&name, &indices)?);
                }
                c if token::is_end_statement(c) => break,
                Some(b')') | Some(b']') | Some(b',') | Some(b';') => {
                    missing = error!(SyntaxError);
                    break;
                }
                _ => match self.peek_token().and_then(Function::from_token) {
                    Some(function) => {
                        let val = self.parse_function(function)?;
                        units.push(val);
                    }
                    None => {
                        let val = self.parse_literal()?;
                        units.push(val);
                    }
                },
            }
            last = Last::Unit;
        }
        if units.is_empty() && stack.is_empty() {
            return if allow_empty { Ok(None) } else { Err(missing) };
        }
        self.evaluate_stack(&mut stack, &mut units, 0, &missing)?;
        match units.pop() {
            Some(val) if units.is_empty() => Ok(Some(val)),
            _ => Err(missing),
        }
    }

    fn evaluate_stack(
        &mut self,
        stack: &mut Vec<(Operator, usize)>,
        units: &mut Vec<Val>,
        precedence: u8,
        missing: &Error,
    ) -> Result<()> {
        while let Some(&(op, arity)) = stack.last() {
            if op.precedence() < precedence {
                break;
            }
            stack.pop();
            let rhs = units.pop().ok_or_else(|| missing.clone())?;
            let result = if arity == 1 {
                match Operation::unary(op, &rhs) {
                    Ok(val) => val,
                    Err(e) => self.soft_error(e, op, None, &rhs)?,
                }
            } else {
                let lhs = units.pop().ok_or_else(|| missing.clone())?;
                match Operation::binary(op, &lhs, &rhs) {
                    Ok(val) => val,
                    Err(e) => self.soft_error(e, op, Some(&lhs), &rhs)?,
                }
            };
            units.push(result);
        }
        Ok(())
    }

    /// Overflow and division by zero print a message and carry on with
    /// the largest value of the right sign, unless ON ERROR is set.
    fn soft_error(&mut self, e: Error, op: Operator, lhs: Option<&Val>, rhs: &Val) -> Result<Val> {
        if !e.is_recoverable() || self.on_error.map_or(false, |line| line != 0) {
            return Err(e);
        }
        self.write_line(&e.to_string());
        Ok(Operation::fallback(op, lhs, rhs))
    }

    fn parse_bracket(&mut self) -> Result<Val> {
        self.require_read(b"(")?;
        let val = self.parse_expression()?;
        self.require_read(b")")?;
        Ok(val)
    }

    fn parse_literal(&mut self) -> Result<Val> {
        match self.skip_white() {
            Some(b'"') => {
                self.read();
                let bytes = self.with_reader(|r| {
                    let s = r.read_to(&[0, b'"']).to_vec();
                    if r.peek() == Some(b'"') {
                        r.read();
                    }
                    s
                });
                Ok(Val::String(String::from_utf8_lossy(&bytes).into()))
            }
            Some(c) if c.is_ascii_digit() || c == b'.' => {
                let mut outs = vec![];
                self.with_reader(|r| tokenise_number(r, &mut outs));
                match read_number(&mut Reader::new(&outs)) {
                    Some(n) => Ok(n.into()),
                    None => Err(error!(SyntaxError)),
                }
            }
            Some(token::T_UINT) => {
                self.read();
                match self.read_u16() {
                    Some(n) => Ok(Val::Single(n as f32)),
                    None => Err(error!(SyntaxError)),
                }
            }
            Some(c) if token::is_number(c) => match self.with_reader(|r| read_number(r)) {
                Some(n) => Ok(n.into()),
                None => Err(error!(SyntaxError)),
            },
            _ => Err(error!(SyntaxError)),
        }
    }

    /// Reads a name, adding the default type suffix. Only the first 40
    /// characters count.
    pub(super) fn parse_name(&mut self) -> Result<Rc<str>> {
        match self.parse_name_opt()? {
            Some(name) => Ok(name),
            None => Err(error!(SyntaxError)),
        }
    }

    pub(super) fn parse_name_opt(&mut self) -> Result<Option<Rc<str>>> {
        match self.skip_white() {
            Some(c) if c.is_ascii_alphabetic() => {}
            _ => return Ok(None),
        }
        let (mut name, suffix) = self.with_reader(|r| {
            let mut name = String::new();
            while let Some(c) = r.peek() {
                if !token::is_name_char(c) {
                    break;
                }
                name.push(c.to_ascii_uppercase() as char);
                r.read();
            }
            let suffix = match r.peek() {
                Some(c) if b"$%!#".contains(&c) => {
                    r.read();
                    Some(c as char)
                }
                _ => None,
            };
            (name, suffix)
        });
        name.truncate(MAX_NAME_LEN);
        if let Some(suffix) = suffix {
            name.push(suffix);
        }
        Ok(Some(self.vars.complete_name(&name)))
    }

    /// A scalar or an array element with its subscripts.
    pub(super) fn parse_variable(&mut self) -> Result<(Rc<str>, Vec<i16>)> {
        let name = self.parse_name()?;
        let mut indices = vec![];
        if self.skip_white_read_if(b"([") {
            loop {
                indices.push(self.parse_expression()?.to_i16()?);
                if !self.skip_white_read_if(b",") {
                    break;
                }
            }
            self.require_read(b")]")?;
        }
        Ok((name, indices))
    }

    pub(super) fn get_value(&mut self, name: &Rc<str>, indices: &[i16]) -> Result<Val> {
        if indices.is_empty() {
            Ok(self.vars.fetch(name))
        } else {
            self.vars.fetch_array(name, indices)
        }
    }

    pub(super) fn set_value(&mut self, name: &Rc<str>, indices: &[i16], val: Val) -> Result<()> {
        if indices.is_empty() {
            self.vars.store(name, val)
        } else {
            self.vars.store_array(name, indices, val)
        }
    }

    fn parse_function(&mut self, function: Function) -> Result<Val> {
        self.read_token();
        let arity = function.arity();
        let mut args = vec![];
        if *arity.end() > 0 {
            if self.skip_white_read_if(b"(") {
                loop {
                    args.push(self.parse_expression()?);
                    if !self.skip_white_read_if(b",") {
                        break;
                    }
                }
                self.require_read(b")")?;
            } else if *arity.start() > 0 {
                return Err(error!(SyntaxError));
            }
        }
        if !arity.contains(&args.len()) {
            return Err(error!(SyntaxError));
        }
        match function {
            Function::Err => Ok(Val::Integer(self.error_num as i16)),
            Function::Erl => Ok(Val::Single(self.error_line() as f32)),
            Function::Rnd => self.rnd(args.first()),
            Function::Pos => Ok(Val::Integer(self.column as i16 + 1)),
            Function::Fre => Ok(Val::Single(self.free_memory() as f32)),
            Function::Peek => {
                let address = address(&args[0])?;
                match self.program.peek_byte(address) {
                    Some(byte) => Ok(Val::Integer(byte as i16)),
                    None => Ok(Val::Integer(-1)),
                }
            }
            Function::Eof => {
                let number = args[0].to_i16()?;
                let file = self.files.get(number, &[Mode::Input])?;
                Ok(Val::from_bool(file.eof()))
            }
            Function::Timer => {
                let now = chrono::Local::now();
                let seconds = now.num_seconds_from_midnight() as f64
                    + now.nanosecond().min(999_999_999) as f64 / 1e9;
                Ok(Val::Single(seconds as f32))
            }
            Function::Date => {
                let now = chrono::Local::now();
                Ok(Val::String(now.format("%m-%d-%Y").to_string().into()))
            }
            Function::Time => {
                let now = chrono::Local::now();
                Ok(Val::String(now.format("%H:%M:%S").to_string().into()))
            }
            _ => match function.apply(&args) {
                Ok(val) => Ok(val),
                Err(e) => {
                    let arg = args.first().cloned().unwrap_or(Val::Integer(0));
                    self.soft_error(e, Operator::Identity, None, &arg)
                }
            },
        }
    }

    /// RND(x): negative reseeds, zero repeats the last number.
    fn rnd(&mut self, arg: Option<&Val>) -> Result<Val> {
        let x = match arg {
            Some(val) => val.to_f64()?,
            None => 1.0,
        };
        if x < 0.0 {
            self.rng = StdRng::seed_from_u64(x.to_bits());
        }
        if x != 0.0 {
            self.last_rnd = self.rng.gen::<f32>();
        }
        Ok(Val::Single(self.last_rnd))
    }

    fn free_memory(&self) -> usize {
        let used = self.program.bytecode().len();
        let max = u16::max_value() as usize;
        max.saturating_sub(self.program.code_start() + used)
    }
}

/// Memory addresses may be given as negative numbers.
pub(super) fn address(val: &Val) -> Result<usize> {
    let n = val.to_f64()?.round();
    if !(-32768.0..=65535.0).contains(&n) {
        return Err(error!(Overflow));
    }
    if n < 0.0 {
        Ok((n + 65536.0) as usize)
    } else {
        Ok(n as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address() {
        assert_eq!(address(&Val::Integer(-1)), Ok(65535));
        assert_eq!(address(&Val::Single(4718.0)), Ok(4718));
        assert!(address(&Val::Single(70000.0)).is_err());
    }
}
