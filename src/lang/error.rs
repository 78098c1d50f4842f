#[derive(Clone, PartialEq)]
pub struct Error {
    code: u16,
    pos: Option<usize>,
    line_number: Option<u32>,
    message: &'static str,
    recoverable: bool,
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($err:ident) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
    };
    ($err:ident; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).message($msg)
    };
    ($err:ident, at $pos:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).at($pos)
    };
    ($err:ident, at $pos:expr; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .at($pos)
            .message($msg)
    };
}

impl Error {
    pub fn new(code: ErrorCode) -> Error {
        Error::from_number(code as u16)
    }

    /// Error raised by number, as the `ERROR` statement does.
    pub fn from_number(code: u16) -> Error {
        Error {
            code,
            pos: None,
            line_number: None,
            message: "",
            recoverable: false,
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    /// Byte offset into the program stream where the error happened.
    /// `None` for errors in direct mode or not yet positioned.
    pub fn pos(&self) -> Option<usize> {
        self.pos
    }

    pub fn line_number(&self) -> Option<u32> {
        self.line_number
    }

    pub fn is_break(&self) -> bool {
        self.code == ErrorCode::Break as u16
    }

    /// Floating point overflow and division by zero can continue with a
    /// substitute value when no error handler is set.
    pub fn is_recoverable(&self) -> bool {
        self.recoverable
    }

    pub fn recoverable(mut self) -> Error {
        self.recoverable = true;
        self
    }

    pub fn at(mut self, pos: usize) -> Error {
        self.pos = Some(pos);
        self
    }

    pub fn in_line_number(mut self, line: Option<u32>) -> Error {
        self.line_number = line;
        self
    }

    pub fn message(mut self, message: &'static str) -> Error {
        debug_assert_eq!(self.message.len(), 0);
        self.message = message;
        self
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        match e.kind() {
            std::io::ErrorKind::NotFound => error!(FileNotFound),
            std::io::ErrorKind::PermissionDenied => error!(PermissionDenied),
            _ => error!(DeviceIoError),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorCode {
    Break = 0,
    NextWithoutFor = 1,
    SyntaxError = 2,
    ReturnWithoutGosub = 3,
    OutOfData = 4,
    IllegalFunctionCall = 5,
    Overflow = 6,
    OutOfMemory = 7,
    UndefinedLine = 8,
    SubscriptOutOfRange = 9,
    DuplicateDefinition = 10,
    DivisionByZero = 11,
    TypeMismatch = 13,
    StringTooLong = 15,
    CantContinue = 17,
    NoResume = 19,
    ResumeWithoutError = 20,
    MissingOperand = 22,
    ForWithoutNext = 26,
    WhileWithoutWend = 29,
    WendWithoutWhile = 30,
    InternalError = 51,
    BadFileNumber = 52,
    FileNotFound = 53,
    BadFileMode = 54,
    FileAlreadyOpen = 55,
    DeviceIoError = 57,
    InputPastEnd = 62,
    BadFileName = 64,
    DirectStatementInFile = 66,
    DeviceUnavailable = 68,
    PermissionDenied = 70,
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error {{ {} }}", self.to_string())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let code_str = match self.code {
            0 => "BREAK",
            1 => "NEXT WITHOUT FOR",
            2 => "SYNTAX ERROR",
            3 => "RETURN WITHOUT GOSUB",
            4 => "OUT OF DATA",
            5 => "ILLEGAL FUNCTION CALL",
            6 => "OVERFLOW",
            7 => "OUT OF MEMORY",
            8 => "UNDEFINED LINE NUMBER",
            9 => "SUBSCRIPT OUT OF RANGE",
            10 => "DUPLICATE DEFINITION",
            11 => "DIVISION BY ZERO",
            12 => "ILLEGAL DIRECT",
            13 => "TYPE MISMATCH",
            14 => "OUT OF STRING SPACE",
            15 => "STRING TOO LONG",
            16 => "STRING FORMULA TOO COMPLEX",
            17 => "CAN'T CONTINUE",
            18 => "UNDEFINED USER FUNCTION",
            19 => "NO RESUME",
            20 => "RESUME WITHOUT ERROR",
            22 => "MISSING OPERAND",
            23 => "LINE BUFFER OVERFLOW",
            26 => "FOR WITHOUT NEXT",
            29 => "WHILE WITHOUT WEND",
            30 => "WEND WITHOUT WHILE",
            50 => "FIELD OVERFLOW",
            51 => "INTERNAL ERROR",
            52 => "BAD FILE NUMBER",
            53 => "FILE NOT FOUND",
            54 => "BAD FILE MODE",
            55 => "FILE ALREADY OPEN",
            57 => "DEVICE I/O ERROR",
            58 => "FILE ALREADY EXISTS",
            61 => "DISK FULL",
            62 => "INPUT PAST END",
            63 => "BAD RECORD NUMBER",
            64 => "BAD FILE NAME",
            66 => "DIRECT STATEMENT IN FILE",
            67 => "TOO MANY FILES",
            68 => "DEVICE UNAVAILABLE",
            70 => "PERMISSION DENIED",
            _ => "",
        };
        let mut suffix = String::new();
        if let Some(line_number) = self.line_number {
            suffix.push_str(&format!(" {}", line_number));
        }
        if !self.message.is_empty() {
            suffix.push_str(&format!("; {}", self.message));
        }
        if code_str.is_empty() {
            if suffix.is_empty() {
                write!(f, "UNPRINTABLE ERROR")
            } else {
                write!(f, "UNPRINTABLE ERROR IN{}", suffix)
            }
        } else if suffix.is_empty() {
            write!(f, "{}", code_str)
        } else {
            write!(f, "{} IN{}", code_str, suffix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_line_number() {
        let e = error!(SyntaxError).in_line_number(Some(20));
        assert_eq!(e.to_string(), "SYNTAX ERROR IN 20");
    }

    #[test]
    fn test_unnamed_code() {
        assert_eq!(Error::from_number(200).to_string(), "UNPRINTABLE ERROR");
        assert_eq!(Error::from_number(200).code(), 200);
    }

    #[test]
    fn test_positioned() {
        let e = error!(OutOfData, at 17);
        assert_eq!(e.pos(), Some(17));
        assert!(!e.is_recoverable());
        assert!(error!(Overflow).recoverable().is_recoverable());
    }
}
