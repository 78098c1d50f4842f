//! Byte values of the tokenised program format.
//!
//! Keywords are one byte in `0x81..=0xF4` or two bytes prefixed by
//! `0xFD`, `0xFE` or `0xFF`. Two-byte tokens are handled as `u16` values
//! with the prefix in the high byte.

// numeric constants
pub const T_OCT: u8 = 0x0B;
pub const T_HEX: u8 = 0x0C;
pub const T_UINT_PTR: u8 = 0x0D;
pub const T_UINT: u8 = 0x0E;
pub const T_BYTE: u8 = 0x0F;
pub const C_0: u8 = 0x11;
pub const C_10: u8 = 0x1B;
pub const T_INT: u8 = 0x1C;
pub const T_SINGLE: u8 = 0x1D;
pub const T_DOUBLE: u8 = 0x1F;

// single-byte keywords
pub const END: u8 = 0x81;
pub const FOR: u8 = 0x82;
pub const NEXT: u8 = 0x83;
pub const DATA: u8 = 0x84;
pub const INPUT: u8 = 0x85;
pub const DIM: u8 = 0x86;
pub const READ: u8 = 0x87;
pub const LET: u8 = 0x88;
pub const GOTO: u8 = 0x89;
pub const RUN: u8 = 0x8A;
pub const IF: u8 = 0x8B;
pub const RESTORE: u8 = 0x8C;
pub const GOSUB: u8 = 0x8D;
pub const RETURN: u8 = 0x8E;
pub const REM: u8 = 0x8F;
pub const STOP: u8 = 0x90;
pub const PRINT: u8 = 0x91;
pub const CLEAR: u8 = 0x92;
pub const LIST: u8 = 0x93;
pub const NEW: u8 = 0x94;
pub const ON: u8 = 0x95;
pub const WAIT: u8 = 0x96;
pub const DEF: u8 = 0x97;
pub const POKE: u8 = 0x98;
pub const CONT: u8 = 0x99;
pub const OUT: u8 = 0x9C;
pub const LPRINT: u8 = 0x9D;
pub const LLIST: u8 = 0x9E;
pub const WIDTH: u8 = 0xA0;
pub const ELSE: u8 = 0xA1;
pub const TRON: u8 = 0xA2;
pub const TROFF: u8 = 0xA3;
pub const SWAP: u8 = 0xA4;
pub const ERASE: u8 = 0xA5;
pub const EDIT: u8 = 0xA6;
pub const ERROR: u8 = 0xA7;
pub const RESUME: u8 = 0xA8;
pub const DELETE: u8 = 0xA9;
pub const AUTO: u8 = 0xAA;
pub const RENUM: u8 = 0xAB;
pub const DEFSTR: u8 = 0xAC;
pub const DEFINT: u8 = 0xAD;
pub const DEFSNG: u8 = 0xAE;
pub const DEFDBL: u8 = 0xAF;
pub const LINE: u8 = 0xB0;
pub const WHILE: u8 = 0xB1;
pub const WEND: u8 = 0xB2;
pub const CALL: u8 = 0xB3;
pub const WRITE: u8 = 0xB7;
pub const OPTION: u8 = 0xB8;
pub const RANDOMIZE: u8 = 0xB9;
pub const OPEN: u8 = 0xBA;
pub const CLOSE: u8 = 0xBB;
pub const LOAD: u8 = 0xBC;
pub const MERGE: u8 = 0xBD;
pub const SAVE: u8 = 0xBE;
pub const COLOR: u8 = 0xBF;
pub const CLS: u8 = 0xC0;
pub const MOTOR: u8 = 0xC1;
pub const BSAVE: u8 = 0xC2;
pub const BLOAD: u8 = 0xC3;
pub const SOUND: u8 = 0xC4;
pub const BEEP: u8 = 0xC5;
pub const PSET: u8 = 0xC6;
pub const PRESET: u8 = 0xC7;
pub const SCREEN: u8 = 0xC8;
pub const KEY: u8 = 0xC9;
pub const LOCATE: u8 = 0xCA;
pub const TO: u8 = 0xCC;
pub const THEN: u8 = 0xCD;
pub const TAB: u8 = 0xCE;
pub const STEP: u8 = 0xCF;
pub const USR: u8 = 0xD0;
pub const FN: u8 = 0xD1;
pub const SPC: u8 = 0xD2;
pub const NOT: u8 = 0xD3;
pub const ERL: u8 = 0xD4;
pub const ERR: u8 = 0xD5;
pub const STRING: u8 = 0xD6;
pub const USING: u8 = 0xD7;
pub const INSTR: u8 = 0xD8;
pub const O_REM: u8 = 0xD9;
pub const VARPTR: u8 = 0xDA;
pub const CSRLIN: u8 = 0xDB;
pub const POINT: u8 = 0xDC;
pub const OFF: u8 = 0xDD;
pub const INKEY: u8 = 0xDE;
pub const O_GT: u8 = 0xE6;
pub const O_EQ: u8 = 0xE7;
pub const O_LT: u8 = 0xE8;
pub const O_PLUS: u8 = 0xE9;
pub const O_MINUS: u8 = 0xEA;
pub const O_TIMES: u8 = 0xEB;
pub const O_DIV: u8 = 0xEC;
pub const O_CARET: u8 = 0xED;
pub const AND: u8 = 0xEE;
pub const OR: u8 = 0xEF;
pub const XOR: u8 = 0xF0;
pub const EQV: u8 = 0xF1;
pub const IMP: u8 = 0xF2;
pub const MOD: u8 = 0xF3;
pub const O_INTDIV: u8 = 0xF4;

// two-byte keywords
pub const CVI: u16 = 0xFD81;
pub const CVS: u16 = 0xFD82;
pub const CVD: u16 = 0xFD83;
pub const MKI: u16 = 0xFD84;
pub const MKS: u16 = 0xFD85;
pub const MKD: u16 = 0xFD86;
pub const EXTERR: u16 = 0xFD8B;
pub const FILES: u16 = 0xFE81;
pub const FIELD: u16 = 0xFE82;
pub const SYSTEM: u16 = 0xFE83;
pub const NAME: u16 = 0xFE84;
pub const LSET: u16 = 0xFE85;
pub const RSET: u16 = 0xFE86;
pub const KILL: u16 = 0xFE87;
pub const PUT: u16 = 0xFE88;
pub const GET: u16 = 0xFE89;
pub const RESET: u16 = 0xFE8A;
pub const COMMON: u16 = 0xFE8B;
pub const CHAIN: u16 = 0xFE8C;
pub const DATE: u16 = 0xFE8D;
pub const TIME: u16 = 0xFE8E;
pub const PAINT: u16 = 0xFE8F;
pub const COM: u16 = 0xFE90;
pub const CIRCLE: u16 = 0xFE91;
pub const DRAW: u16 = 0xFE92;
pub const PLAY: u16 = 0xFE93;
pub const TIMER: u16 = 0xFE94;
pub const ERDEV: u16 = 0xFE95;
pub const IOCTL: u16 = 0xFE96;
pub const CHDIR: u16 = 0xFE97;
pub const MKDIR: u16 = 0xFE98;
pub const RMDIR: u16 = 0xFE99;
pub const SHELL: u16 = 0xFE9A;
pub const ENVIRON: u16 = 0xFE9B;
pub const VIEW: u16 = 0xFE9C;
pub const WINDOW: u16 = 0xFE9D;
pub const PMAP: u16 = 0xFE9E;
pub const PALETTE: u16 = 0xFE9F;
pub const LCOPY: u16 = 0xFEA0;
pub const CALLS: u16 = 0xFEA1;
pub const PCOPY: u16 = 0xFEA5;
pub const LOCK: u16 = 0xFEA7;
pub const UNLOCK: u16 = 0xFEA8;
pub const LEFT: u16 = 0xFF81;
pub const RIGHT: u16 = 0xFF82;
pub const MID: u16 = 0xFF83;
pub const SGN: u16 = 0xFF84;
pub const INT: u16 = 0xFF85;
pub const ABS: u16 = 0xFF86;
pub const SQR: u16 = 0xFF87;
pub const RND: u16 = 0xFF88;
pub const SIN: u16 = 0xFF89;
pub const LOG: u16 = 0xFF8A;
pub const EXP: u16 = 0xFF8B;
pub const COS: u16 = 0xFF8C;
pub const TAN: u16 = 0xFF8D;
pub const ATN: u16 = 0xFF8E;
pub const FRE: u16 = 0xFF8F;
pub const INP: u16 = 0xFF90;
pub const POS: u16 = 0xFF91;
pub const LEN: u16 = 0xFF92;
pub const STR: u16 = 0xFF93;
pub const VAL: u16 = 0xFF94;
pub const ASC: u16 = 0xFF95;
pub const CHR: u16 = 0xFF96;
pub const PEEK: u16 = 0xFF97;
pub const SPACE: u16 = 0xFF98;
pub const OCT: u16 = 0xFF99;
pub const HEX: u16 = 0xFF9A;
pub const LPOS: u16 = 0xFF9B;
pub const CINT: u16 = 0xFF9C;
pub const CSNG: u16 = 0xFF9D;
pub const CDBL: u16 = 0xFF9E;
pub const FIX: u16 = 0xFF9F;
pub const PEN: u16 = 0xFFA0;
pub const STICK: u16 = 0xFFA1;
pub const STRIG: u16 = 0xFFA2;
pub const EOF: u16 = 0xFFA3;
pub const LOC: u16 = 0xFFA4;
pub const LOF: u16 = 0xFFA5;
pub const DEBUG: u16 = 0xFFFF;

/// Whitespace inside tokenised code.
pub const WHITESPACE: &[u8] = b" \t\n";

/// Bytes that end a statement. End of stream does too.
pub const END_STATEMENT: &[u8] = &[0, b':'];

/// Symbolic operator tokens; keyword operators such as AND are not included.
pub const OPERATORS: &[u8] = &[
    O_GT, O_EQ, O_LT, O_PLUS, O_MINUS, O_TIMES, O_DIV, O_CARET, O_INTDIV,
];

pub const KEYWORDS: &[(u16, &str)] = &[
    (END as u16, "END"),
    (FOR as u16, "FOR"),
    (NEXT as u16, "NEXT"),
    (DATA as u16, "DATA"),
    (INPUT as u16, "INPUT"),
    (DIM as u16, "DIM"),
    (READ as u16, "READ"),
    (LET as u16, "LET"),
    (GOTO as u16, "GOTO"),
    (RUN as u16, "RUN"),
    (IF as u16, "IF"),
    (RESTORE as u16, "RESTORE"),
    (GOSUB as u16, "GOSUB"),
    (RETURN as u16, "RETURN"),
    (REM as u16, "REM"),
    (STOP as u16, "STOP"),
    (PRINT as u16, "PRINT"),
    (CLEAR as u16, "CLEAR"),
    (LIST as u16, "LIST"),
    (NEW as u16, "NEW"),
    (ON as u16, "ON"),
    (WAIT as u16, "WAIT"),
    (DEF as u16, "DEF"),
    (POKE as u16, "POKE"),
    (CONT as u16, "CONT"),
    (OUT as u16, "OUT"),
    (LPRINT as u16, "LPRINT"),
    (LLIST as u16, "LLIST"),
    (WIDTH as u16, "WIDTH"),
    (ELSE as u16, "ELSE"),
    (TRON as u16, "TRON"),
    (TROFF as u16, "TROFF"),
    (SWAP as u16, "SWAP"),
    (ERASE as u16, "ERASE"),
    (EDIT as u16, "EDIT"),
    (ERROR as u16, "ERROR"),
    (RESUME as u16, "RESUME"),
    (DELETE as u16, "DELETE"),
    (AUTO as u16, "AUTO"),
    (RENUM as u16, "RENUM"),
    (DEFSTR as u16, "DEFSTR"),
    (DEFINT as u16, "DEFINT"),
    (DEFSNG as u16, "DEFSNG"),
    (DEFDBL as u16, "DEFDBL"),
    (LINE as u16, "LINE"),
    (WHILE as u16, "WHILE"),
    (WEND as u16, "WEND"),
    (CALL as u16, "CALL"),
    (WRITE as u16, "WRITE"),
    (OPTION as u16, "OPTION"),
    (RANDOMIZE as u16, "RANDOMIZE"),
    (OPEN as u16, "OPEN"),
    (CLOSE as u16, "CLOSE"),
    (LOAD as u16, "LOAD"),
    (MERGE as u16, "MERGE"),
    (SAVE as u16, "SAVE"),
    (COLOR as u16, "COLOR"),
    (CLS as u16, "CLS"),
    (MOTOR as u16, "MOTOR"),
    (BSAVE as u16, "BSAVE"),
    (BLOAD as u16, "BLOAD"),
    (SOUND as u16, "SOUND"),
    (BEEP as u16, "BEEP"),
    (PSET as u16, "PSET"),
    (PRESET as u16, "PRESET"),
    (SCREEN as u16, "SCREEN"),
    (KEY as u16, "KEY"),
    (LOCATE as u16, "LOCATE"),
    (TO as u16, "TO"),
    (THEN as u16, "THEN"),
    (TAB as u16, "TAB("),
    (STEP as u16, "STEP"),
    (USR as u16, "USR"),
    (FN as u16, "FN"),
    (SPC as u16, "SPC("),
    (NOT as u16, "NOT"),
    (ERL as u16, "ERL"),
    (ERR as u16, "ERR"),
    (STRING as u16, "STRING$"),
    (USING as u16, "USING"),
    (INSTR as u16, "INSTR"),
    (O_REM as u16, "'"),
    (VARPTR as u16, "VARPTR"),
    (CSRLIN as u16, "CSRLIN"),
    (POINT as u16, "POINT"),
    (OFF as u16, "OFF"),
    (INKEY as u16, "INKEY$"),
    (O_GT as u16, ">"),
    (O_EQ as u16, "="),
    (O_LT as u16, "<"),
    (O_PLUS as u16, "+"),
    (O_MINUS as u16, "-"),
    (O_TIMES as u16, "*"),
    (O_DIV as u16, "/"),
    (O_CARET as u16, "^"),
    (AND as u16, "AND"),
    (OR as u16, "OR"),
    (XOR as u16, "XOR"),
    (EQV as u16, "EQV"),
    (IMP as u16, "IMP"),
    (MOD as u16, "MOD"),
    (O_INTDIV as u16, "\\"),
    (CVI, "CVI"),
    (CVS, "CVS"),
    (CVD, "CVD"),
    (MKI, "MKI$"),
    (MKS, "MKS$"),
    (MKD, "MKD$"),
    (EXTERR, "EXTERR"),
    (FILES, "FILES"),
    (FIELD, "FIELD"),
    (SYSTEM, "SYSTEM"),
    (NAME, "NAME"),
    (LSET, "LSET"),
    (RSET, "RSET"),
    (KILL, "KILL"),
    (PUT, "PUT"),
    (GET, "GET"),
    (RESET, "RESET"),
    (COMMON, "COMMON"),
    (CHAIN, "CHAIN"),
    (DATE, "DATE$"),
    (TIME, "TIME$"),
    (PAINT, "PAINT"),
    (COM, "COM"),
    (CIRCLE, "CIRCLE"),
    (DRAW, "DRAW"),
    (PLAY, "PLAY"),
    (TIMER, "TIMER"),
    (ERDEV, "ERDEV"),
    (IOCTL, "IOCTL"),
    (CHDIR, "CHDIR"),
    (MKDIR, "MKDIR"),
    (RMDIR, "RMDIR"),
    (SHELL, "SHELL"),
    (ENVIRON, "ENVIRON"),
    (VIEW, "VIEW"),
    (WINDOW, "WINDOW"),
    (PMAP, "PMAP"),
    (PALETTE, "PALETTE"),
    (LCOPY, "LCOPY"),
    (CALLS, "CALLS"),
    (PCOPY, "PCOPY"),
    (LOCK, "LOCK"),
    (UNLOCK, "UNLOCK"),
    (LEFT, "LEFT$"),
    (RIGHT, "RIGHT$"),
    (MID, "MID$"),
    (SGN, "SGN"),
    (INT, "INT"),
    (ABS, "ABS"),
    (SQR, "SQR"),
    (RND, "RND"),
    (SIN, "SIN"),
    (LOG, "LOG"),
    (EXP, "EXP"),
    (COS, "COS"),
    (TAN, "TAN"),
    (ATN, "ATN"),
    (FRE, "FRE"),
    (INP, "INP"),
    (POS, "POS"),
    (LEN, "LEN"),
    (STR, "STR$"),
    (VAL, "VAL"),
    (ASC, "ASC"),
    (CHR, "CHR$"),
    (PEEK, "PEEK"),
    (SPACE, "SPACE$"),
    (OCT, "OCT$"),
    (HEX, "HEX$"),
    (LPOS, "LPOS"),
    (CINT, "CINT"),
    (CSNG, "CSNG"),
    (CDBL, "CDBL"),
    (FIX, "FIX"),
    (PEN, "PEN"),
    (STICK, "STICK"),
    (STRIG, "STRIG"),
    (EOF, "EOF"),
    (LOC, "LOC"),
    (LOF, "LOF"),
];

/// Keywords that may be followed by line numbers.
pub const LINENUM_WORDS: &[&str] = &[
    "GOTO", "THEN", "ELSE", "GOSUB", "LIST", "RENUM", "EDIT", "LLIST", "DELETE", "RUN", "RESUME",
    "AUTO", "ERL", "RESTORE", "RETURN",
];

pub fn is_twobyte_prefix(b: u8) -> bool {
    b == 0xFD || b == 0xFE || b == 0xFF
}

/// Letters, digits and the period make up names.
pub fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'.'
}

pub fn is_end_statement(b: Option<u8>) -> bool {
    match b {
        None => true,
        Some(b) => END_STATEMENT.contains(&b),
    }
}

/// Number of payload bytes following a numeric token, or `None` if the
/// byte does not start a number.
pub fn number_payload(b: u8) -> Option<usize> {
    match b {
        T_OCT | T_HEX | T_UINT_PTR | T_UINT | T_INT => Some(2),
        T_BYTE => Some(1),
        C_0..=C_10 => Some(0),
        T_SINGLE => Some(4),
        T_DOUBLE => Some(8),
        _ => None,
    }
}

/// Numeric constant tokens, excluding line numbers and pointers.
pub fn is_number(b: u8) -> bool {
    match b {
        T_UINT | T_UINT_PTR => false,
        _ => number_payload(b).is_some(),
    }
}

pub fn to_bytes(token: u16) -> Vec<u8> {
    if token > 0xFF {
        vec![(token >> 8) as u8, token as u8]
    } else {
        vec![token as u8]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_table_has_unique_tokens() {
        let mut seen = std::collections::HashSet::new();
        for (token, word) in KEYWORDS {
            assert!(seen.insert(*token), "duplicate token for {}", word);
        }
    }

    #[test]
    fn test_payloads() {
        assert_eq!(number_payload(T_SINGLE), Some(4));
        assert_eq!(number_payload(C_0 + 5), Some(0));
        assert!(!is_number(T_UINT));
        assert_eq!(to_bytes(LEFT), vec![0xFF, 0x81]);
        assert_eq!(to_bytes(PRINT as u16), vec![0x91]);
    }
}
