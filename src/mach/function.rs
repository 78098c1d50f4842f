use super::Val;
use crate::error;
use crate::lang::{parse_prefix, token, Error, DOUBLE_MAX, SINGLE_MAX};
use std::ops::RangeInclusive;

type Result<T> = std::result::Result<T, Error>;

/// ## Built-in functions
///
/// Functions that only depend on their arguments are applied here. The
/// ones reading interpreter state are evaluated by the runtime.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Abs,
    Asc,
    Atn,
    Cdbl,
    Chr,
    Cint,
    Cos,
    Csng,
    Date,
    Eof,
    Erl,
    Err,
    Exp,
    Fix,
    Fre,
    Hex,
    Instr,
    Int,
    Left,
    Len,
    Log,
    Mid,
    Oct,
    Peek,
    Pos,
    Right,
    Rnd,
    Sgn,
    Sin,
    Space,
    Sqr,
    Str,
    String,
    Tan,
    Time,
    Timer,
    Val,
}

impl Function {
    pub fn from_token(t: u16) -> Option<Function> {
        use Function::*;
        Some(match t {
            token::ABS => Abs,
            token::ASC => Asc,
            token::ATN => Atn,
            token::CDBL => Cdbl,
            token::CHR => Chr,
            token::CINT => Cint,
            token::COS => Cos,
            token::CSNG => Csng,
            token::DATE => Date,
            token::EOF => Eof,
            token::EXP => Exp,
            token::FIX => Fix,
            token::FRE => Fre,
            token::HEX => Hex,
            token::INT => Int,
            token::LEFT => Left,
            token::LEN => Len,
            token::LOG => Log,
            token::MID => Mid,
            token::OCT => Oct,
            token::PEEK => Peek,
            token::POS => Pos,
            token::RIGHT => Right,
            token::RND => Rnd,
            token::SGN => Sgn,
            token::SIN => Sin,
            token::SPACE => Space,
            token::SQR => Sqr,
            token::STR => Str,
            token::TAN => Tan,
            token::TIME => Time,
            token::TIMER => Timer,
            token::VAL => Val,
            t if t == token::ERL as u16 => Erl,
            t if t == token::ERR as u16 => Err,
            t if t == token::STRING as u16 => String,
            t if t == token::INSTR as u16 => Instr,
            _ => return None,
        })
    }

    /// Accepted argument counts. Functions taking no arguments are written
    /// without brackets.
    pub fn arity(self) -> RangeInclusive<usize> {
        use Function::*;
        match self {
            Date | Erl | Err | Time | Timer => 0..=0,
            Rnd => 0..=1,
            Left | Right | String => 2..=2,
            Instr | Mid => 2..=3,
            _ => 1..=1,
        }
    }

    pub fn apply(self, args: &[Val]) -> Result<Val> {
        if !self.arity().contains(&args.len()) {
            return Err(error!(SyntaxError));
        }
        let arg = match args.first() {
            Some(arg) => arg,
            None => return Err(error!(InternalError; "FUNCTION NEEDS RUNTIME")),
        };
        match self {
            Self::Abs => abs(arg),
            Self::Asc => match arg.clone().into_string()?.chars().next() {
                Some(c) => Ok(Val::Integer(c as i16)),
                None => Err(error!(IllegalFunctionCall)),
            },
            Self::Atn => float(arg, arg.to_f64()?.atan()),
            Self::Cdbl => arg.clone().coerce(b'#'),
            Self::Chr => {
                let n = int_arg(arg, 0..=255)?;
                Ok(Val::String(char::from(n as u8).to_string().into()))
            }
            Self::Cint => Ok(Val::Integer(arg.to_i16()?)),
            Self::Cos => float(arg, arg.to_f64()?.cos()),
            Self::Csng => arg.clone().coerce(b'!'),
            Self::Exp => float(arg, arg.to_f64()?.exp()),
            Self::Fix => round(arg, f64::trunc),
            Self::Hex => Ok(Val::String(format!("{:X}", word(arg)?).into())),
            Self::Instr => instr(args),
            Self::Int => round(arg, f64::floor),
            Self::Left => {
                let s = arg.clone().into_string()?;
                let n = int_arg(&args[1], 0..=255)? as usize;
                Ok(Val::String(s.chars().take(n).collect::<std::string::String>().into()))
            }
            Self::Len => Ok(Val::Integer(arg.clone().into_string()?.chars().count() as i16)),
            Self::Log => {
                let n = arg.to_f64()?;
                if n <= 0.0 {
                    return Err(error!(IllegalFunctionCall));
                }
                float(arg, n.ln())
            }
            Self::Mid => {
                let s = arg.clone().into_string()?;
                let start = int_arg(&args[1], 1..=255)? as usize;
                let len = match args.get(2) {
                    Some(v) => int_arg(v, 0..=255)? as usize,
                    None => 255,
                };
                let mid: std::string::String = s.chars().skip(start - 1).take(len).collect();
                Ok(Val::String(mid.into()))
            }
            Self::Oct => Ok(Val::String(format!("{:o}", word(arg)?).into())),
            Self::Right => {
                let s = arg.clone().into_string()?;
                let n = int_arg(&args[1], 0..=255)? as usize;
                let count = s.chars().count();
                let right: std::string::String = s.chars().skip(count.saturating_sub(n)).collect();
                Ok(Val::String(right.into()))
            }
            Self::Sgn => Ok(Val::Integer(arg.sign()? as i16)),
            Self::Sin => float(arg, arg.to_f64()?.sin()),
            Self::Space => {
                let n = int_arg(arg, 0..=255)? as usize;
                Ok(Val::String(" ".repeat(n).into()))
            }
            Self::Sqr => {
                let n = arg.to_f64()?;
                if n < 0.0 {
                    return Err(error!(IllegalFunctionCall));
                }
                float(arg, n.sqrt())
            }
            Self::Str => match arg {
                Val::String(_) => Err(error!(TypeMismatch)),
                v => Ok(Val::String(v.to_string().into())),
            },
            Self::String => {
                let n = int_arg(arg, 0..=255)? as usize;
                let c = match &args[1] {
                    Val::String(s) => match s.chars().next() {
                        Some(c) => c,
                        None => return Err(error!(IllegalFunctionCall)),
                    },
                    v => char::from(int_arg(v, 0..=255)? as u8),
                };
                Ok(Val::String(c.to_string().repeat(n).into()))
            }
            Self::Tan => float(arg, arg.to_f64()?.tan()),
            Self::Val => {
                let s = arg.clone().into_string()?;
                Ok(parse_prefix(&s).0.into())
            }
            _ => Err(error!(InternalError; "FUNCTION NEEDS RUNTIME")),
        }
    }
}

fn abs(val: &Val) -> Result<Val> {
    match val {
        Val::Integer(n) => Ok(match n.checked_abs() {
            Some(n) => Val::Integer(n),
            None => Val::Single(32768.0),
        }),
        Val::Single(n) => Ok(Val::Single(n.abs())),
        Val::Double(n) => Ok(Val::Double(n.abs())),
        Val::String(_) => Err(error!(TypeMismatch)),
    }
}

fn round(val: &Val, f: fn(f64) -> f64) -> Result<Val> {
    match val {
        Val::Integer(n) => Ok(Val::Integer(*n)),
        Val::Single(n) => Ok(Val::Single(f(*n as f64) as f32)),
        Val::Double(n) => Ok(Val::Double(f(*n))),
        Val::String(_) => Err(error!(TypeMismatch)),
    }
}

/// Result of a math function in the precision of its argument.
fn float(arg: &Val, n: f64) -> Result<Val> {
    if n.is_nan() {
        return Err(error!(IllegalFunctionCall));
    }
    if let Val::Double(_) = arg {
        if n.abs() > DOUBLE_MAX {
            return Err(error!(Overflow).recoverable());
        }
        Ok(Val::Double(n))
    } else {
        if n.abs() > SINGLE_MAX as f64 {
            return Err(error!(Overflow).recoverable());
        }
        Ok(Val::Single(n as f32))
    }
}

fn int_arg(val: &Val, range: RangeInclusive<i16>) -> Result<i16> {
    let n = val.to_i16()?;
    if range.contains(&n) {
        Ok(n)
    } else {
        Err(error!(IllegalFunctionCall))
    }
}

/// Numbers from -32768 to 65535 as sixteen bits.
fn word(val: &Val) -> Result<u16> {
    let n = val.to_f64()?.round();
    if n < -32768.0 || n > 65535.0 {
        return Err(error!(Overflow));
    }
    Ok((n as i32) as u16)
}

fn instr(args: &[Val]) -> Result<Val> {
    let (start, haystack, needle) = match args {
        [start, h, n] => (int_arg(start, 1..=255)? as usize, h, n),
        [h, n] => (1, h, n),
        _ => return Err(error!(SyntaxError)),
    };
    let haystack: Vec<char> = haystack.clone().into_string()?.chars().collect();
    let needle: Vec<char> = needle.clone().into_string()?.chars().collect();
    if start > haystack.len() {
        return Ok(Val::Integer(0));
    }
    if needle.is_empty() {
        return Ok(Val::Integer(start as i16));
    }
    let found = haystack[start - 1..]
        .windows(needle.len())
        .position(|w| w == &needle[..])
        .map(|p| p + start)
        .unwrap_or(0);
    Ok(Val::Integer(found as i16))
}

impl std::fmt::Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(f: Function, args: &[Val]) -> Result<Val> {
        f.apply(args)
    }

    #[test]
    fn test_string_functions() {
        let s: Val = "HELLO".into();
        assert_eq!(call(Function::Left, &[s.clone(), Val::Integer(2)]), Ok("HE".into()));
        assert_eq!(call(Function::Right, &[s.clone(), Val::Integer(9)]), Ok("HELLO".into()));
        assert_eq!(call(Function::Mid, &[s.clone(), Val::Integer(2), Val::Integer(3)]), Ok("ELL".into()));
        assert_eq!(call(Function::Mid, &[s.clone(), Val::Integer(0)]), Err(error!(IllegalFunctionCall)));
        assert_eq!(call(Function::Len, &[s.clone()]), Ok(Val::Integer(5)));
        assert_eq!(call(Function::Asc, &["".into()]), Err(error!(IllegalFunctionCall)));
        assert_eq!(call(Function::Chr, &[Val::Integer(65)]), Ok("A".into()));
        assert_eq!(call(Function::String, &[Val::Integer(3), "xy".into()]), Ok("xxx".into()));
        assert_eq!(call(Function::Instr, &[s.clone(), "L".into()]), Ok(Val::Integer(3)));
        assert_eq!(call(Function::Instr, &[Val::Integer(4), s, "L".into()]), Ok(Val::Integer(4)));
    }

    #[test]
    fn test_number_functions() {
        assert_eq!(call(Function::Int, &[Val::Single(-2.5)]), Ok(Val::Single(-3.0)));
        assert_eq!(call(Function::Fix, &[Val::Single(-2.5)]), Ok(Val::Single(-2.0)));
        assert_eq!(call(Function::Abs, &[Val::Integer(-32768)]), Ok(Val::Single(32768.0)));
        assert_eq!(call(Function::Sgn, &[Val::Double(-0.1)]), Ok(Val::Integer(-1)));
        assert_eq!(call(Function::Sqr, &[Val::Integer(-1)]), Err(error!(IllegalFunctionCall)));
        assert_eq!(call(Function::Log, &[Val::Integer(0)]), Err(error!(IllegalFunctionCall)));
        assert!(call(Function::Exp, &[Val::Integer(100)]).unwrap_err().is_recoverable());
        assert_eq!(call(Function::Hex, &[Val::Integer(-1)]), Ok("FFFF".into()));
        assert_eq!(call(Function::Oct, &[Val::Integer(8)]), Ok("10".into()));
        assert_eq!(call(Function::Str, &[Val::Integer(7)]), Ok(" 7".into()));
        assert_eq!(call(Function::Val, &[" -12abc".into()]), Ok(Val::Integer(-12)));
        assert_eq!(call(Function::Cint, &[Val::Single(2.5)]), Ok(Val::Integer(3)));
    }

    #[test]
    fn test_arity() {
        assert_eq!(call(Function::Left, &["A".into()]), Err(error!(SyntaxError)));
        assert_eq!(Function::from_token(token::ERR as u16), Some(Function::Err));
        assert_eq!(Function::from_token(token::MID), Some(Function::Mid));
        assert_eq!(Function::from_token(token::PRINT as u16), None);
    }
}
