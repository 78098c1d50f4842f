use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// ## Size limited vector for GOSUB, FOR and WHILE records

pub struct Stack<T> {
    overflow_message: &'static str,
    vec: Vec<T>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for Stack<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.vec)
    }
}

impl<T> Stack<T> {
    pub fn new(overflow_message: &'static str) -> Stack<T> {
        Stack {
            overflow_message,
            vec: vec![],
        }
    }
    fn max_len(&self) -> usize {
        u16::max_value() as usize / 8
    }
    pub fn clear(&mut self) {
        self.vec.clear()
    }
    pub fn len(&self) -> usize {
        self.vec.len()
    }
    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }
    pub fn last(&self) -> Option<&T> {
        self.vec.last()
    }
    /// Position of the topmost record matching `f`, counted from the bottom.
    pub fn rposition<F: Fn(&T) -> bool>(&self, f: F) -> Option<usize> {
        self.vec.iter().rposition(f)
    }
    pub fn truncate(&mut self, len: usize) {
        self.vec.truncate(len)
    }
    pub fn push(&mut self, val: T) -> Result<()> {
        if self.vec.len() >= self.max_len() {
            return Err(error!(OutOfMemory; self.overflow_message));
        }
        self.vec.push(val);
        Ok(())
    }
    pub fn pop(&mut self) -> Result<T> {
        match self.vec.pop() {
            Some(v) => Ok(v),
            None => Err(error!(InternalError; "UNDERFLOW")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow() {
        let mut s: Stack<u8> = Stack::new("STACK OVERFLOW");
        for _ in 0..s.max_len() {
            s.push(0).unwrap();
        }
        assert_eq!(s.push(0), Err(error!(OutOfMemory; "STACK OVERFLOW")));
    }

    #[test]
    fn test_rposition() {
        let mut s: Stack<u8> = Stack::new("");
        s.push(1).unwrap();
        s.push(2).unwrap();
        s.push(1).unwrap();
        assert_eq!(s.rposition(|v| *v == 1), Some(2));
        s.truncate(1);
        assert_eq!(s.len(), 1);
        assert_eq!(s.pop(), Ok(1));
        assert!(s.pop().is_err());
    }
}
