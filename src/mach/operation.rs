use super::Val;
use crate::error;
use crate::lang::{token, Error, DOUBLE_MAX, SINGLE_MAX};
use std::cmp::Ordering;

type Result<T> = std::result::Result<T, Error>;

/// ## Operators of expressions

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Caret,
    Multiply,
    Divide,
    DivideInt,
    Modulo,
    Add,
    Subtract,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Not,
    And,
    Or,
    Xor,
    Eqv,
    Imp,
    Negate,
    Identity,
}

impl Operator {
    pub fn from_token(t: u8) -> Option<Operator> {
        use Operator::*;
        Some(match t {
            token::O_CARET => Caret,
            token::O_TIMES => Multiply,
            token::O_DIV => Divide,
            token::O_INTDIV => DivideInt,
            token::MOD => Modulo,
            token::O_PLUS => Add,
            token::O_MINUS => Subtract,
            token::O_EQ => Equal,
            token::O_LT => Less,
            token::O_GT => Greater,
            token::NOT => Not,
            token::AND => And,
            token::OR => Or,
            token::XOR => Xor,
            token::EQV => Eqv,
            token::IMP => Imp,
            _ => return None,
        })
    }

    pub fn precedence(self) -> u8 {
        use Operator::*;
        match self {
            Caret => 12,
            Multiply | Divide => 11,
            DivideInt => 10,
            Modulo => 9,
            Add | Subtract | Negate | Identity => 8,
            Equal | NotEqual | Less | LessEqual | Greater | GreaterEqual => 7,
            Not => 6,
            And => 5,
            Or => 4,
            Xor => 3,
            Eqv => 2,
            Imp => 1,
        }
    }

    /// `<`, `>` and `=` pair up into two-character comparisons.
    pub fn is_combinable(self) -> bool {
        matches!(self, Operator::Less | Operator::Greater | Operator::Equal)
    }

    pub fn combine(self, next: Operator) -> Option<Operator> {
        use Operator::*;
        match (self, next) {
            (Less, Greater) | (Greater, Less) => Some(NotEqual),
            (Less, Equal) | (Equal, Less) => Some(LessEqual),
            (Greater, Equal) | (Equal, Greater) => Some(GreaterEqual),
            _ => None,
        }
    }

    /// The operator's meaning in front of an operand.
    pub fn unary(self) -> Option<Operator> {
        match self {
            Operator::Subtract => Some(Operator::Negate),
            Operator::Add => Some(Operator::Identity),
            Operator::Not => Some(Operator::Not),
            _ => None,
        }
    }
}

pub struct Operation {}

impl Operation {
    pub fn unary(op: Operator, val: &Val) -> Result<Val> {
        match op {
            Operator::Negate => Operation::negate(val),
            Operator::Not => Operation::not(val),
            Operator::Identity => Ok(val.clone()),
            _ => Err(error!(InternalError; "NOT A UNARY OPERATOR")),
        }
    }

    pub fn binary(op: Operator, lhs: &Val, rhs: &Val) -> Result<Val> {
        use Operator::*;
        match op {
            Caret => Operation::power(lhs, rhs),
            Multiply => Operation::multiply(lhs, rhs),
            Divide => Operation::divide(lhs, rhs),
            DivideInt => Operation::divide_int(lhs, rhs),
            Modulo => Operation::modulo(lhs, rhs),
            Add => Operation::sum(lhs, rhs),
            Subtract => Operation::subtract(lhs, rhs),
            Equal => Ok(Val::from_bool(Operation::compare(lhs, rhs)? == Ordering::Equal)),
            NotEqual => Ok(Val::from_bool(Operation::compare(lhs, rhs)? != Ordering::Equal)),
            Less => Ok(Val::from_bool(Operation::compare(lhs, rhs)? == Ordering::Less)),
            LessEqual => Ok(Val::from_bool(Operation::compare(lhs, rhs)? != Ordering::Greater)),
            Greater => Ok(Val::from_bool(Operation::compare(lhs, rhs)? == Ordering::Greater)),
            GreaterEqual => Ok(Val::from_bool(Operation::compare(lhs, rhs)? != Ordering::Less)),
            And => Ok(Val::Integer(logic(lhs)? & logic(rhs)?)),
            Or => Ok(Val::Integer(logic(lhs)? | logic(rhs)?)),
            Xor => Ok(Val::Integer(logic(lhs)? ^ logic(rhs)?)),
            Eqv => Ok(Val::Integer(!(logic(lhs)? ^ logic(rhs)?))),
            Imp => Ok(Val::Integer(!logic(lhs)? | logic(rhs)?)),
            Not | Negate | Identity => Err(error!(InternalError; "NOT A BINARY OPERATOR")),
        }
    }

    /// Signed maximum used in place of a result that overflowed or
    /// divided by zero.
    pub fn fallback(op: Operator, lhs: Option<&Val>, rhs: &Val) -> Val {
        let double = matches!(lhs, Some(Val::Double(_))) || matches!(rhs, Val::Double(_));
        let l = lhs.and_then(|v| v.to_f64().ok()).unwrap_or(0.0);
        let r = rhs.to_f64().unwrap_or(0.0);
        let n = match op {
            Operator::Divide | Operator::DivideInt | Operator::Modulo => l,
            Operator::Caret if r < 0.0 => 1.0,
            Operator::Caret => l.powf(r),
            Operator::Multiply => l * r,
            Operator::Add => l + r,
            Operator::Subtract => l - r,
            Operator::Negate => -r,
            _ => 1.0,
        };
        let negative = n < 0.0;
        if double {
            Val::Double(if negative { -DOUBLE_MAX } else { DOUBLE_MAX })
        } else {
            Val::Single(if negative { -SINGLE_MAX } else { SINGLE_MAX })
        }
    }

    pub fn compare(lhs: &Val, rhs: &Val) -> Result<Ordering> {
        match (lhs, rhs) {
            (Val::String(l), Val::String(r)) => Ok(l.as_bytes().cmp(r.as_bytes())),
            (Val::String(_), _) | (_, Val::String(_)) => Err(error!(TypeMismatch)),
            (Val::Integer(l), Val::Integer(r)) => Ok(l.cmp(r)),
            _ => {
                let l = lhs.to_f64()?;
                let r = rhs.to_f64()?;
                Ok(l.partial_cmp(&r).unwrap_or(Ordering::Equal))
            }
        }
    }

    pub fn negate(val: &Val) -> Result<Val> {
        use Val::*;
        match val {
            Integer(n) => match n.checked_neg() {
                Some(n) => Ok(Integer(n)),
                None => Err(error!(Overflow)),
            },
            Single(n) => Ok(Single(-n)),
            Double(n) => Ok(Double(-n)),
            String(_) => Err(error!(TypeMismatch)),
        }
    }

    pub fn not(val: &Val) -> Result<Val> {
        Ok(Val::Integer(!logic(val)?))
    }

    pub fn sum(lhs: &Val, rhs: &Val) -> Result<Val> {
        use Val::*;
        match lhs {
            String(l) => match rhs {
                String(r) => {
                    if l.chars().count() + r.chars().count() > 255 {
                        Err(error!(StringTooLong))
                    } else {
                        Ok(String((l.to_string() + r.as_ref()).into()))
                    }
                }
                _ => Err(error!(TypeMismatch)),
            },
            Integer(l) => match rhs {
                Integer(r) => match l.checked_add(*r) {
                    Some(i) => Ok(Integer(i)),
                    None => Err(error!(Overflow)),
                },
                Single(r) => single(*l as f32 + r),
                Double(r) => double(*l as f64 + r),
                String(_) => Err(error!(TypeMismatch)),
            },
            Single(l) => match rhs {
                Integer(r) => single(l + *r as f32),
                Single(r) => single(l + r),
                Double(r) => double(*l as f64 + r),
                String(_) => Err(error!(TypeMismatch)),
            },
            Double(l) => match rhs {
                Integer(r) => double(l + *r as f64),
                Single(r) => double(l + *r as f64),
                Double(r) => double(l + r),
                String(_) => Err(error!(TypeMismatch)),
            },
        }
    }

    pub fn subtract(lhs: &Val, rhs: &Val) -> Result<Val> {
        use Val::*;
        match lhs {
            Integer(l) => match rhs {
                Integer(r) => match l.checked_sub(*r) {
                    Some(i) => Ok(Integer(i)),
                    None => Err(error!(Overflow)),
                },
                Single(r) => single(*l as f32 - r),
                Double(r) => double(*l as f64 - r),
                String(_) => Err(error!(TypeMismatch)),
            },
            Single(l) => match rhs {
                Integer(r) => single(l - *r as f32),
                Single(r) => single(l - r),
                Double(r) => double(*l as f64 - r),
                String(_) => Err(error!(TypeMismatch)),
            },
            Double(l) => match rhs {
                Integer(r) => double(l - *r as f64),
                Single(r) => double(l - *r as f64),
                Double(r) => double(l - r),
                String(_) => Err(error!(TypeMismatch)),
            },
            String(_) => Err(error!(TypeMismatch)),
        }
    }

    pub fn multiply(lhs: &Val, rhs: &Val) -> Result<Val> {
        use Val::*;
        match lhs {
            Integer(l) => match rhs {
                Integer(r) => match l.checked_mul(*r) {
                    Some(i) => Ok(Integer(i)),
                    None => Err(error!(Overflow)),
                },
                Single(r) => single(*l as f32 * r),
                Double(r) => double(*l as f64 * r),
                String(_) => Err(error!(TypeMismatch)),
            },
            Single(l) => match rhs {
                Integer(r) => single(l * *r as f32),
                Single(r) => single(l * r),
                Double(r) => double(*l as f64 * r),
                String(_) => Err(error!(TypeMismatch)),
            },
            Double(l) => match rhs {
                Integer(r) => double(l * *r as f64),
                Single(r) => double(l * *r as f64),
                Double(r) => double(l * r),
                String(_) => Err(error!(TypeMismatch)),
            },
            String(_) => Err(error!(TypeMismatch)),
        }
    }

    /// Floating point division; integers divide as singles.
    pub fn divide(lhs: &Val, rhs: &Val) -> Result<Val> {
        use Val::*;
        let l = lhs.to_f64()?;
        let r = rhs.to_f64()?;
        if r == 0.0 {
            return Err(error!(DivisionByZero).recoverable());
        }
        match (lhs, rhs) {
            (Double(_), _) | (_, Double(_)) => double(l / r),
            _ => single((l / r) as f32),
        }
    }

    pub fn divide_int(lhs: &Val, rhs: &Val) -> Result<Val> {
        let l = lhs.to_i16()?;
        let r = rhs.to_i16()?;
        if r == 0 {
            return Err(error!(DivisionByZero).recoverable());
        }
        match l.checked_div(r) {
            Some(i) => Ok(Val::Integer(i)),
            None => Err(error!(Overflow)),
        }
    }

    pub fn modulo(lhs: &Val, rhs: &Val) -> Result<Val> {
        let l = lhs.to_i16()?;
        let r = rhs.to_i16()?;
        if r == 0 {
            return Err(error!(DivisionByZero).recoverable());
        }
        Ok(Val::Integer(l.checked_rem(r).unwrap_or(0)))
    }

    pub fn power(lhs: &Val, rhs: &Val) -> Result<Val> {
        use Val::*;
        let l = lhs.to_f64()?;
        let r = rhs.to_f64()?;
        if l == 0.0 && r < 0.0 {
            return Err(error!(DivisionByZero).recoverable());
        }
        if l < 0.0 && r.fract() != 0.0 {
            return Err(error!(IllegalFunctionCall));
        }
        match (lhs, rhs) {
            (Double(_), _) | (_, Double(_)) => double(l.powf(r)),
            _ => single((l as f32).powf(r as f32)),
        }
    }
}

fn single(n: f32) -> Result<Val> {
    if n.is_finite() && n.abs() <= SINGLE_MAX {
        Ok(Val::Single(n))
    } else {
        Err(error!(Overflow).recoverable())
    }
}

fn double(n: f64) -> Result<Val> {
    if n.is_finite() && n.abs() <= DOUBLE_MAX {
        Ok(Val::Double(n))
    } else {
        Err(error!(Overflow).recoverable())
    }
}

/// Operand of a logical operator: -32768 to 65535, taken as 16 bits.
fn logic(val: &Val) -> Result<i16> {
    let n = val.to_f64()?.round();
    if n >= i16::MIN as f64 && n <= u16::MAX as f64 {
        Ok(n as i32 as u16 as i16)
    } else {
        Err(error!(Overflow))
    }
}
