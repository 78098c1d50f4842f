use crate::error;
use crate::lang::{format_double, format_single, Error, Number, SINGLE_MAX};
use std::convert::TryFrom;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// ## Runtime values

#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    String(Rc<str>),
    Integer(i16),
    Single(f32),
    Double(f64),
}

impl Val {
    /// The type suffix of the value: `$`, `%`, `!` or `#`.
    pub fn typechar(&self) -> u8 {
        match self {
            Val::String(_) => b'$',
            Val::Integer(_) => b'%',
            Val::Single(_) => b'!',
            Val::Double(_) => b'#',
        }
    }

    pub fn default_for(typechar: u8) -> Val {
        match typechar {
            b'$' => Val::String("".into()),
            b'%' => Val::Integer(0),
            b'#' => Val::Double(0.0),
            _ => Val::Single(0.0),
        }
    }

    pub fn from_bool(b: bool) -> Val {
        Val::Integer(if b { -1 } else { 0 })
    }

    pub fn is_zero(&self) -> Result<bool> {
        Ok(self.to_f64()? == 0.0)
    }

    pub fn sign(&self) -> Result<i8> {
        let n = self.to_f64()?;
        Ok(if n > 0.0 {
            1
        } else if n < 0.0 {
            -1
        } else {
            0
        })
    }

    pub fn to_f64(&self) -> Result<f64> {
        use Val::*;
        match self {
            Integer(n) => Ok(*n as f64),
            Single(n) => Ok(*n as f64),
            Double(n) => Ok(*n),
            String(_) => Err(error!(TypeMismatch)),
        }
    }

    /// Rounds half away from zero.
    pub fn to_i16(&self) -> Result<i16> {
        match self {
            Val::Integer(n) => Ok(*n),
            _ => {
                let n = self.to_f64()?.round();
                if n >= i16::MIN as f64 && n <= i16::MAX as f64 {
                    Ok(n as i16)
                } else {
                    Err(error!(Overflow))
                }
            }
        }
    }

    pub fn into_string(self) -> Result<Rc<str>> {
        match self {
            Val::String(s) => Ok(s),
            _ => Err(error!(TypeMismatch)),
        }
    }

    /// Converts to the type named by a suffix character. Strings and
    /// numbers never convert into each other.
    pub fn coerce(self, typechar: u8) -> Result<Val> {
        use Val::*;
        match (typechar, self) {
            (b'$', String(s)) => Ok(String(s)),
            (b'$', _) | (_, String(_)) => Err(error!(TypeMismatch)),
            (b'%', v) => Ok(Integer(v.to_i16()?)),
            (b'#', v) => Ok(Double(v.to_f64()?)),
            (_, Single(n)) => Ok(Single(n)),
            (_, v) => {
                let n = v.to_f64()?;
                if n.abs() > SINGLE_MAX as f64 {
                    Err(error!(Overflow))
                } else {
                    Ok(Single(n as f32))
                }
            }
        }
    }
}

impl From<Number> for Val {
    fn from(n: Number) -> Val {
        match n {
            Number::Integer(n) => Val::Integer(n),
            Number::Single(n) => Val::Single(n),
            Number::Double(n) => Val::Double(n),
        }
    }
}

impl From<&str> for Val {
    fn from(s: &str) -> Val {
        Val::String(s.into())
    }
}

impl TryFrom<Val> for i16 {
    type Error = Error;
    fn try_from(val: Val) -> std::result::Result<Self, Self::Error> {
        val.to_i16()
    }
}

impl TryFrom<Val> for f64 {
    type Error = Error;
    fn try_from(val: Val) -> std::result::Result<Self, Self::Error> {
        val.to_f64()
    }
}

/// Formats as STR$ does: non-negative numbers get a leading space.
impl std::fmt::Display for Val {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Val::*;
        match self {
            String(s) => write!(f, "{}", s),
            Integer(n) => {
                if *n < 0 {
                    write!(f, "{}", n)
                } else {
                    write!(f, " {}", n)
                }
            }
            Single(n) => {
                if *n < 0.0 {
                    write!(f, "{}", format_single(*n))
                } else {
                    write!(f, " {}", format_single(*n))
                }
            }
            Double(n) => {
                if *n < 0.0 {
                    write!(f, "{}", format_double(*n))
                } else {
                    write!(f, " {}", format_double(*n))
                }
            }
        }
    }
}
