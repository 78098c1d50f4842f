use super::number;
use super::reader::Reader;
use super::token::{self, *};
use std::collections::HashMap;

const ASCII_WHITESPACE: &[u8] = b" \t\n";
const ASCII_OPERATORS: &[u8] = b"+-=/\\^*<>";

/// Converts between program text and tokenised lines.
#[derive(Debug, Clone)]
pub struct Tokeniser {
    token_to_keyword: HashMap<u16, &'static str>,
    keyword_to_token: HashMap<&'static str, u16>,
}

/// A line converted back to text.
#[derive(Debug, Clone, PartialEq)]
pub struct Detokenised {
    pub line_number: Option<u16>,
    pub text: Vec<u8>,
    /// Text column matching the requested byte position.
    pub text_pos: usize,
}

impl Default for Tokeniser {
    fn default() -> Tokeniser {
        Tokeniser::new(false)
    }
}

impl Tokeniser {
    /// The `DEBUG` keyword is only known when `debug` is set.
    pub fn new(debug: bool) -> Tokeniser {
        let mut token_to_keyword: HashMap<u16, &'static str> =
            token::KEYWORDS.iter().copied().collect();
        if debug {
            token_to_keyword.insert(DEBUG, "DEBUG");
        }
        let keyword_to_token = token_to_keyword.iter().map(|(t, k)| (*k, *t)).collect();
        Tokeniser {
            token_to_keyword,
            keyword_to_token,
        }
    }

    pub fn keyword(&self, token: u16) -> Option<&'static str> {
        self.token_to_keyword.get(&token).copied()
    }

    /// Tokenises one line of program text. Numbered lines start with
    /// `\0` followed by a four byte header; direct lines start with `:`.
    pub fn tokenise_line(&self, line: &str) -> Vec<u8> {
        let mut ins = Reader::new(line.as_bytes());
        let mut outs = Vec::new();
        if ins.skip(ASCII_WHITESPACE).is_none() {
            return outs;
        }
        self.tokenise_line_number(&mut ins, &mut outs);
        let mut allow_jumpnum = false;
        let mut allow_number = true;
        let mut spc_or_tab = false;
        loop {
            let c = match ins.peek() {
                None | Some(b'\r') | Some(0) => break,
                Some(c) => c,
            };
            if ASCII_WHITESPACE.contains(&c) {
                ins.read();
                outs.push(c);
            } else if c == b'"' {
                tokenise_literal(&mut ins, &mut outs);
            } else if allow_number && allow_jumpnum && (c.is_ascii_digit() || c == b'.') {
                tokenise_jump_number(&mut ins, &mut outs);
            } else if c == b'&' || c == b'.' || (allow_number && !allow_jumpnum && c.is_ascii_digit())
            {
                number::tokenise_number(&mut ins, &mut outs);
            } else if ASCII_OPERATORS.contains(&c) {
                ins.read();
                if let Some(t) = self.token_of(&[c]) {
                    outs.extend(token::to_bytes(t));
                }
                allow_number = true;
            } else if c == b'\'' {
                ins.read();
                outs.extend_from_slice(&[b':', REM, O_REM]);
                tokenise_rem(&mut ins, &mut outs);
            } else if c == b'?' {
                ins.read();
                outs.push(PRINT);
                allow_number = true;
            } else if c.is_ascii_alphabetic() {
                let word = self.tokenise_word(&mut ins, &mut outs);
                if word == "REM" || (word == "DEBUG" && self.keyword_to_token.contains_key("DEBUG"))
                {
                    tokenise_rem(&mut ins, &mut outs);
                } else if word == "DATA" {
                    tokenise_data(&mut ins, &mut outs);
                } else {
                    allow_jumpnum = token::LINENUM_WORDS.contains(&word.as_str());
                    allow_number = self.keyword_to_token.contains_key(word.as_str());
                    if word == "SPC(" || word == "TAB(" {
                        spc_or_tab = true;
                    }
                }
            } else {
                ins.read();
                if c == b',' || c == b'#' || c == b';' {
                    allow_number = true;
                } else if c == b'(' || c == b'[' {
                    allow_jumpnum = false;
                    allow_number = true;
                } else if c == b')' && spc_or_tab {
                    spc_or_tab = false;
                    allow_jumpnum = false;
                    allow_number = true;
                } else {
                    allow_jumpnum = false;
                    allow_number = false;
                }
                outs.push(if (32..=127).contains(&c) { c } else { b' ' });
            }
        }
        outs
    }

    fn token_of(&self, word: &[u8]) -> Option<u16> {
        std::str::from_utf8(word)
            .ok()
            .and_then(|w| self.keyword_to_token.get(w))
            .copied()
    }

    fn tokenise_line_number(&self, ins: &mut Reader, outs: &mut Vec<u8>) {
        match tokenise_uint(ins) {
            Some(linenum) => {
                outs.extend_from_slice(&[0, 0xC0, 0xDE]);
                outs.extend_from_slice(&linenum);
                if ins.peek() == Some(b' ') && linenum != [0, 0] {
                    ins.read();
                }
            }
            None => outs.push(b':'),
        }
    }

    fn tokenise_word(&self, ins: &mut Reader, outs: &mut Vec<u8>) -> String {
        let mut word = String::new();
        loop {
            let c = ins.read();
            if let Some(c) = c {
                word.push(c.to_ascii_uppercase() as char);
            }
            if word == "GO" {
                let pos = ins.pos();
                if ins.peek_n(4).eq_ignore_ascii_case(b" SUB") {
                    word = "GOSUB".to_string();
                    ins.read_n(4);
                } else {
                    ins.skip(ASCII_WHITESPACE);
                    if ins.read_n(2).eq_ignore_ascii_case(b"TO") {
                        word = "GOTO".to_string();
                    } else {
                        ins.seek(pos);
                    }
                }
                if (word == "GOTO" || word == "GOSUB") && ins.peek().map_or(false, is_name_char) {
                    ins.seek(pos);
                    word = "GO".to_string();
                }
            }
            if let Some(&t) = self.keyword_to_token.get(word.as_str()) {
                let bracketed = matches!(word.as_str(), "FN" | "SPC(" | "TAB(" | "USR");
                if !bracketed && ins.peek().map_or(false, is_name_char) {
                    continue;
                }
                match word.as_str() {
                    "ELSE" => {
                        outs.push(b':');
                        outs.extend(token::to_bytes(t));
                    }
                    "WHILE" => {
                        outs.extend(token::to_bytes(t));
                        outs.push(O_PLUS);
                    }
                    _ => outs.extend(token::to_bytes(t)),
                }
                break;
            }
            match c {
                None => {
                    outs.extend_from_slice(word.as_bytes());
                    break;
                }
                Some(c) if !is_name_char(c) => {
                    word.pop();
                    ins.back(1);
                    outs.extend_from_slice(word.as_bytes());
                    break;
                }
                _ => {}
            }
        }
        word
    }

    /// Converts the line whose header starts at the reader's position,
    /// just past the `\0`. The reader ends past the closing `\0`.
    pub fn detokenise_line(&self, ins: &mut Reader, bytepos: Option<usize>) -> Detokenised {
        let line_number = match ins.parse_line_number() {
            Some(n) => n,
            None => {
                return Detokenised {
                    line_number: None,
                    text: vec![],
                    text_pos: 0,
                }
            }
        };
        if line_number == 0 && ins.peek() == Some(b' ') {
            ins.read();
        }
        let mut text = line_number.to_string().into_bytes();
        if ins.peek() != Some(b'\t') {
            text.push(b' ');
        }
        let (line, text_pos) = self.detokenise_compound_statement(ins, bytepos);
        let text_pos = text_pos + text.len() + 1;
        text.extend(line);
        Detokenised {
            line_number: Some(line_number),
            text,
            text_pos,
        }
    }

    pub fn detokenise_compound_statement(
        &self,
        ins: &mut Reader,
        bytepos: Option<usize>,
    ) -> (Vec<u8>, usize) {
        let mut litstring = false;
        let mut comment = false;
        let mut textpos = 0;
        let mut output = Vec::new();
        loop {
            let s = ins.read();
            if textpos == 0 {
                if let Some(bytepos) = bytepos {
                    if ins.pos() >= bytepos {
                        textpos = output.len();
                    }
                }
            }
            let s = match s {
                None | Some(0) => break,
                Some(s) => s,
            };
            if s == b'"' {
                output.push(s);
                litstring = !litstring;
            } else if token::is_number(s) {
                ins.back(1);
                number::detokenise_number(ins, &mut output);
            } else if s == T_UINT || s == T_UINT_PTR {
                let n = ins.read_u16().unwrap_or(0);
                output.extend_from_slice(n.to_string().as_bytes());
            } else if comment || litstring || (0x20..=0x7E).contains(&s) {
                output.push(s);
            } else if s == 0x0A {
                output.extend_from_slice(&[0x0A, 0x0D]);
            } else if s <= 0x09 {
                output.push(s);
            } else {
                ins.back(1);
                comment = self.detokenise_keyword(ins, &mut output);
            }
        }
        (output, textpos)
    }

    fn detokenise_keyword(&self, ins: &mut Reader, output: &mut Vec<u8>) -> bool {
        let s1 = match ins.read() {
            Some(s) => s,
            None => return false,
        };
        let (tok, keyword) = match self.token_to_keyword.get(&(s1 as u16)) {
            Some(k) => (s1 as u16, *k),
            None => {
                let t = ins.peek().map(|s2| (s1 as u16) << 8 | s2 as u16);
                match t.and_then(|t| self.token_to_keyword.get(&t).map(|k| (t, *k))) {
                    Some(found) => {
                        ins.read();
                        found
                    }
                    None => {
                        output.push(s1);
                        return false;
                    }
                }
            }
        };
        let is_operator = tok <= 0xFF && token::OPERATORS.contains(&(tok as u8));
        if let Some(&last) = output.last() {
            if last.is_ascii_alphanumeric() && !is_operator {
                output.push(b' ');
            }
        }
        output.extend_from_slice(keyword.as_bytes());
        let mut comment = false;
        if keyword == "'" {
            comment = true;
        } else if keyword == "REM" {
            if ins.peek() == Some(O_REM) {
                ins.read();
                output.push(b'\'');
            }
            comment = true;
        }
        let n = output.len();
        if output.ends_with(b":REM'") {
            output.truncate(n - 5);
            output.push(b'\'');
        } else if output.ends_with(b"WHILE+") {
            output.pop();
        } else if n > 4 && output.ends_with(b"ELSE") {
            if n > 5 && output[n - 5] == b':' && output[n - 6].is_ascii_digit() {
                output.truncate(n - 5);
                output.extend_from_slice(b" ELSE");
            } else {
                output.truncate(n - 5);
                output.extend_from_slice(b"ELSE");
            }
        }
        let spaced_next = match ins.peek() {
            None | Some(0) | Some(O_REM) => false,
            Some(c) if token::OPERATORS.contains(&c) => false,
            Some(c) => !b"\", :()$%!#_@~|`".contains(&c),
        };
        let unspaced_token = is_operator
            || tok == TAB as u16
            || tok == SPC as u16
            || tok == USR as u16
            || tok == FN as u16;
        if !comment && spaced_next && !unspaced_token {
            output.push(b' ');
        }
        comment
    }
}

fn tokenise_uint(ins: &mut Reader) -> Option<[u8; 2]> {
    let mut word = Vec::new();
    while let Some(c) = ins.peek() {
        if c.is_ascii_digit() || ASCII_WHITESPACE.contains(&c) {
            word.push(c);
            ins.read();
        } else {
            break;
        }
    }
    while let Some(c) = word.last() {
        if !ASCII_WHITESPACE.contains(c) {
            break;
        }
        word.pop();
        ins.back(1);
    }
    let digits: Vec<u8> = word.into_iter().filter(u8::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let parse = |d: &[u8]| {
        d.iter()
            .fold(0u32, |acc, c| acc.saturating_mul(10).saturating_add((c - b'0') as u32))
    };
    let mut value = parse(&digits);
    if value >= 65530 {
        ins.back(digits.len() - 4);
        value = parse(&digits[..4]);
    }
    Some((value as u16).to_le_bytes())
}

fn tokenise_jump_number(ins: &mut Reader, outs: &mut Vec<u8>) {
    match tokenise_uint(ins) {
        Some(word) => {
            outs.push(T_UINT);
            outs.extend_from_slice(&word);
        }
        None => {
            if ins.peek() == Some(b'.') {
                ins.read();
                outs.push(b'.');
            }
        }
    }
}

fn tokenise_rem(ins: &mut Reader, outs: &mut Vec<u8>) {
    outs.extend_from_slice(ins.read_to(b"\r\0"));
}

fn tokenise_data(ins: &mut Reader, outs: &mut Vec<u8>) {
    loop {
        outs.extend_from_slice(ins.read_to(b"\r\0:\""));
        if ins.peek() == Some(b'"') {
            tokenise_literal(ins, outs);
        } else {
            break;
        }
    }
}

fn tokenise_literal(ins: &mut Reader, outs: &mut Vec<u8>) {
    if let Some(q) = ins.read() {
        outs.push(q);
    }
    outs.extend_from_slice(ins.read_to(b"\r\0\""));
    if ins.peek() == Some(b'"') {
        ins.read();
        outs.push(b'"');
    }
}
