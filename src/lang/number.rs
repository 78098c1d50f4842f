use super::reader::Reader;
use super::token::{self, C_0, C_10, T_BYTE, T_DOUBLE, T_HEX, T_INT, T_OCT, T_SINGLE};

/// Largest value a Microsoft Binary Format single can hold.
pub const SINGLE_MAX: f32 = 1.701_411_7e38;
/// Largest value a Microsoft Binary Format double can hold.
pub const DOUBLE_MAX: f64 = 1.701_411_834_604_692e38;

/// A numeric constant as stored in tokenised code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i16),
    Single(f32),
    Double(f64),
}

impl Number {
    pub fn negate(self) -> Number {
        match self {
            Number::Integer(n) => match n.checked_neg() {
                Some(n) => Number::Integer(n),
                None => Number::Single(32768.0),
            },
            Number::Single(n) => Number::Single(-n),
            Number::Double(n) => Number::Double(-n),
        }
    }
}

pub fn single_to_mbf(n: f32) -> Option<[u8; 4]> {
    let bits = n.to_bits();
    let sign = (bits >> 31) as u8;
    let exp = (bits >> 23) & 0xFF;
    let mantissa = bits & 0x7F_FFFF;
    if exp == 0 {
        return Some([0; 4]);
    }
    if exp + 2 > 0xFF {
        return None;
    }
    Some([
        mantissa as u8,
        (mantissa >> 8) as u8,
        (sign << 7) | ((mantissa >> 16) as u8 & 0x7F),
        (exp + 2) as u8,
    ])
}

pub fn mbf_to_single(b: [u8; 4]) -> f32 {
    if b[3] < 2 {
        return 0.0;
    }
    let sign = (b[2] >> 7) as u32;
    let exp = b[3] as u32 - 2;
    let mantissa = ((b[2] & 0x7F) as u32) << 16 | (b[1] as u32) << 8 | b[0] as u32;
    f32::from_bits(sign << 31 | exp << 23 | mantissa)
}

pub fn double_to_mbf(n: f64) -> Option<[u8; 8]> {
    let bits = n.to_bits();
    let sign = (bits >> 63) as u8;
    let exp = ((bits >> 52) & 0x7FF) as i64 - 894;
    if exp <= 0 {
        return Some([0; 8]);
    }
    if exp > 0xFF {
        return None;
    }
    let mantissa = (bits & 0xF_FFFF_FFFF_FFFF) << 3;
    let mut out = [0; 8];
    out[..7].copy_from_slice(&mantissa.to_le_bytes()[..7]);
    out[6] = (sign << 7) | (out[6] & 0x7F);
    out[7] = exp as u8;
    Some(out)
}

pub fn mbf_to_double(b: [u8; 8]) -> f64 {
    if b[7] == 0 {
        return 0.0;
    }
    let sign = (b[6] >> 7) as u64;
    let exp = b[7] as u64 + 894;
    let mut m = [0; 8];
    m[..7].copy_from_slice(&b[..7]);
    m[6] &= 0x7F;
    let mantissa = u64::from_le_bytes(m) >> 3;
    f64::from_bits(sign << 63 | exp << 52 | mantissa)
}

/// Reads a numeric constant token. The reader is left unmoved if the
/// next byte is not one.
pub fn read_number(ins: &mut Reader) -> Option<Number> {
    let start = ins.pos();
    let c = ins.read()?;
    let n = match c {
        T_OCT | T_HEX | T_INT => ins.read_u16().map(|v| Number::Integer(v as i16)),
        T_BYTE => ins.read().map(|b| Number::Integer(b as i16)),
        C_0..=C_10 => Some(Number::Integer((c - C_0) as i16)),
        T_SINGLE => {
            let b = ins.read_n(4);
            if b.len() == 4 {
                Some(Number::Single(mbf_to_single([b[0], b[1], b[2], b[3]])))
            } else {
                None
            }
        }
        T_DOUBLE => {
            let b = ins.read_n(8);
            if b.len() == 8 {
                let mut buf = [0; 8];
                buf.copy_from_slice(b);
                Some(Number::Double(mbf_to_double(buf)))
            } else {
                None
            }
        }
        _ => None,
    };
    if n.is_none() {
        ins.seek(start);
    }
    n
}

/// Tokenises a decimal, `&H` or `&O` number from program text.
pub fn tokenise_number(ins: &mut Reader, outs: &mut Vec<u8>) {
    if ins.peek() == Some(b'&') {
        tokenise_radix(ins, outs);
        return;
    }
    let mut word = String::new();
    let mut have_point = false;
    let mut have_exp = false;
    let mut double_exp = false;
    let mut suffix = None;
    let mut trailing_white = 0;
    while let Some(c) = ins.peek() {
        let c = c.to_ascii_uppercase();
        if c.is_ascii_digit() {
            word.push(c as char);
            trailing_white = 0;
        } else if c == b'.' && !have_point && !have_exp {
            have_point = true;
            word.push('.');
            trailing_white = 0;
        } else if (c == b'E' || c == b'D') && !have_exp && word.bytes().any(|b| b.is_ascii_digit())
        {
            match ins.peek_at(1) {
                Some(n) if n.is_ascii_digit() || n == b'+' || n == b'-' => {
                    have_exp = true;
                    double_exp = c == b'D';
                    word.push('e');
                    ins.read();
                    if n == b'+' || n == b'-' {
                        word.push(n as char);
                        ins.read();
                    }
                    trailing_white = 0;
                    continue;
                }
                _ => break,
            }
        } else if (c == b'!' || c == b'#' || c == b'%') && !word.is_empty() {
            ins.read();
            suffix = Some(c);
            trailing_white = 0;
            break;
        } else if token::WHITESPACE.contains(&c) {
            trailing_white += 1;
        } else {
            break;
        }
        ins.read();
    }
    ins.back(trailing_white);
    if word.is_empty() {
        return;
    }
    let mantissa = word.split('e').next().unwrap_or("");
    let significant = mantissa
        .trim_start_matches(|c| c == '0' || c == '.')
        .bytes()
        .filter(|b| b.is_ascii_digit())
        .count();
    let value = parse_decimal(&word);
    match suffix {
        Some(b'#') => write_double(value, outs),
        Some(b'!') => write_single(value, outs),
        Some(b'%') if value.fract() == 0.0 && value <= i16::MAX as f64 => {
            write_integer(value as i16, outs)
        }
        Some(_) => write_single(value, outs),
        None => {
            if !have_point && !have_exp && value <= i16::MAX as f64 {
                write_integer(value as i16, outs)
            } else if double_exp || significant > 7 {
                write_double(value, outs)
            } else {
                write_single(value, outs)
            }
        }
    }
}

fn tokenise_radix(ins: &mut Reader, outs: &mut Vec<u8>) {
    ins.read();
    let (radix, tok) = match ins.peek().map(|c| c.to_ascii_uppercase()) {
        Some(b'H') => {
            ins.read();
            (16, T_HEX)
        }
        Some(b'O') => {
            ins.read();
            (8, T_OCT)
        }
        _ => (8, T_OCT),
    };
    let mut value: u32 = 0;
    while let Some(d) = ins.peek().and_then(|c| (c as char).to_digit(radix)) {
        ins.read();
        value = value.saturating_mul(radix).saturating_add(d);
    }
    outs.push(tok);
    outs.extend_from_slice(&(value.min(0xFFFF) as u16).to_le_bytes());
}

fn parse_decimal(word: &str) -> f64 {
    let word = word.trim_end_matches(|c| c == 'e' || c == '+' || c == '-');
    match word {
        "" | "." => 0.0,
        _ => word.parse().unwrap_or(0.0),
    }
}

fn write_integer(n: i16, outs: &mut Vec<u8>) {
    match n {
        0..=10 => outs.push(C_0 + n as u8),
        11..=255 => {
            outs.push(T_BYTE);
            outs.push(n as u8);
        }
        _ => {
            outs.push(T_INT);
            outs.extend_from_slice(&n.to_le_bytes());
        }
    }
}

fn write_single(n: f64, outs: &mut Vec<u8>) {
    let bytes = single_to_mbf(n as f32).or_else(|| single_to_mbf(SINGLE_MAX.copysign(n as f32)));
    outs.push(T_SINGLE);
    outs.extend_from_slice(&bytes.unwrap_or([0xFF, 0xFF, 0x7F, 0xFF]));
}

fn write_double(n: f64, outs: &mut Vec<u8>) {
    let bytes = double_to_mbf(n).or_else(|| double_to_mbf(DOUBLE_MAX.copysign(n)));
    outs.push(T_DOUBLE);
    outs.extend_from_slice(&bytes.unwrap_or([0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F, 0xFF]));
}

/// Parses the leading number in `text` the way VAL does, returning the
/// value and the count of bytes it spans. Unparseable text is zero.
pub fn parse_prefix(text: &str) -> (Number, usize) {
    let bytes = text.as_bytes();
    let mut ins = Reader::new(bytes);
    ins.skip_white();
    let negative = match ins.peek() {
        Some(b'-') => {
            ins.read();
            true
        }
        Some(b'+') => {
            ins.read();
            false
        }
        _ => false,
    };
    ins.skip_white();
    let mut out = Vec::new();
    tokenise_number(&mut ins, &mut out);
    let n = read_number(&mut Reader::new(&out)).unwrap_or(Number::Integer(0));
    let n = if negative { n.negate() } else { n };
    (n, ins.pos())
}

/// Parses text that must hold a single number, as READ requires of
/// numeric DATA entries. Blank text is zero.
pub fn from_text(text: &str) -> Option<Number> {
    let (n, used) = parse_prefix(text);
    if text[used..].bytes().all(|b| token::WHITESPACE.contains(&b)) {
        Some(n)
    } else {
        None
    }
}

/// Writes the listing text of a numeric token.
pub fn detokenise_number(ins: &mut Reader, output: &mut Vec<u8>) {
    let c = match ins.peek() {
        Some(c) => c,
        None => return,
    };
    let text = match c {
        T_OCT => {
            ins.read();
            format!("&O{:o}", ins.read_u16().unwrap_or(0))
        }
        T_HEX => {
            ins.read();
            format!("&H{:X}", ins.read_u16().unwrap_or(0))
        }
        _ => match read_number(ins) {
            Some(Number::Integer(n)) => n.to_string(),
            Some(Number::Single(n)) => single_listing(n),
            Some(Number::Double(n)) => double_listing(n),
            None => {
                ins.read();
                return;
            }
        },
    };
    output.extend_from_slice(text.as_bytes());
}

fn decimal_digits(n: f64, digits: usize) -> (String, i32) {
    let s = format!("{:.*e}", digits - 1, n.abs());
    let mut parts = s.split('e');
    let mantissa = parts.next().unwrap_or("0");
    let exp = parts.next().and_then(|e| e.parse().ok()).unwrap_or(0);
    let mut ds: String = mantissa.chars().filter(|c| c.is_ascii_digit()).collect();
    while ds.len() > 1 && ds.ends_with('0') {
        ds.pop();
    }
    (ds, exp)
}

/// Decimal text with at most `digits` significant digits and no leading
/// zero. Returns the text and whether scientific notation was used.
fn format_float(n: f64, digits: usize, exp_char: char) -> (String, usize, bool) {
    if n == 0.0 {
        return ("0".to_string(), 1, false);
    }
    let (ds, exp) = decimal_digits(n, digits);
    let count = ds.len() as i32;
    let mut s = String::new();
    if n < 0.0 {
        s.push('-');
    }
    let scientific = exp >= digits as i32 || count - exp - 1 > digits as i32;
    if scientific {
        s.push_str(&ds[..1]);
        if count > 1 {
            s.push('.');
            s.push_str(&ds[1..]);
        }
        s.push(exp_char);
        s.push(if exp < 0 { '-' } else { '+' });
        s.push_str(&format!("{:02}", exp.abs()));
    } else if exp >= 0 {
        let whole = exp as usize + 1;
        if ds.len() <= whole {
            s.push_str(&ds);
            s.push_str(&"0".repeat(whole - ds.len()));
        } else {
            s.push_str(&ds[..whole]);
            s.push('.');
            s.push_str(&ds[whole..]);
        }
    } else {
        s.push('.');
        s.push_str(&"0".repeat((-exp - 1) as usize));
        s.push_str(&ds);
    }
    (s, ds.len(), scientific)
}

pub fn format_single(n: f32) -> String {
    format_float(n as f64, 7, 'E').0
}

pub fn format_double(n: f64) -> String {
    format_float(n, 16, 'D').0
}

/// Listing form of a single; integral values carry a `!`.
pub fn single_listing(n: f32) -> String {
    let (mut s, _, scientific) = format_float(n as f64, 7, 'E');
    if !scientific && !s.contains('.') {
        s.push('!');
    }
    s
}

/// Listing form of a double; a `#` marks values short enough to be
/// read back as singles.
pub fn double_listing(n: f64) -> String {
    let (mut s, digits, scientific) = format_float(n, 16, 'D');
    if !scientific && digits <= 7 {
        s.push('#');
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenise(s: &str) -> Vec<u8> {
        let mut out = vec![];
        tokenise_number(&mut Reader::new(s.as_bytes()), &mut out);
        out
    }

    fn listing(code: &[u8]) -> String {
        let mut out = vec![];
        detokenise_number(&mut Reader::new(code), &mut out);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_mbf_single() {
        assert_eq!(single_to_mbf(1.0), Some([0, 0, 0, 0x81]));
        assert_eq!(single_to_mbf(10.0), Some([0, 0, 0x20, 0x84]));
        assert_eq!(single_to_mbf(-1.0), Some([0, 0, 0x80, 0x81]));
        assert_eq!(mbf_to_single([0, 0, 0x20, 0x84]), 10.0);
        assert_eq!(mbf_to_single(single_to_mbf(SINGLE_MAX).unwrap()), SINGLE_MAX);
        assert_eq!(single_to_mbf(f32::MAX), None);
    }

    #[test]
    fn test_mbf_double() {
        assert_eq!(double_to_mbf(1.0), Some([0, 0, 0, 0, 0, 0, 0, 0x81]));
        assert_eq!(mbf_to_double(double_to_mbf(-0.1).unwrap()), -0.1);
        assert_eq!(double_to_mbf(1e300), None);
    }

    #[test]
    fn test_integers() {
        assert_eq!(tokenise("7"), vec![C_0 + 7]);
        assert_eq!(tokenise("200"), vec![T_BYTE, 200]);
        assert_eq!(tokenise("1000"), vec![T_INT, 0xE8, 0x03]);
        assert_eq!(tokenise("1 0"), vec![C_10]);
        assert_eq!(tokenise("&HFF"), vec![T_HEX, 0xFF, 0]);
        assert_eq!(tokenise("&17"), vec![T_OCT, 15, 0]);
    }

    #[test]
    fn test_floats() {
        assert_eq!(tokenise("40000")[0], T_SINGLE);
        assert_eq!(tokenise("123456789")[0], T_DOUBLE);
        assert_eq!(tokenise("1.5D3")[0], T_DOUBLE);
        assert_eq!(tokenise("2#")[0], T_DOUBLE);
        assert_eq!(tokenise("2!")[0], T_SINGLE);
        assert_eq!(tokenise("1E"), vec![C_0 + 1]);
    }

    #[test]
    fn test_listing() {
        assert_eq!(listing(&tokenise("1.5")), "1.5");
        assert_eq!(listing(&tokenise("0.25")), ".25");
        assert_eq!(listing(&tokenise("2!")), "2!");
        assert_eq!(listing(&tokenise("40000")), "40000!");
        assert_eq!(listing(&tokenise("1.5#")), "1.5#");
        assert_eq!(listing(&tokenise("1E20")), "1E+20");
        assert_eq!(listing(&tokenise("&HFF")), "&HFF");
    }

    #[test]
    fn test_format() {
        assert_eq!(format_single(0.1), ".1");
        assert_eq!(format_single(-2.5), "-2.5");
        assert_eq!(format_single(1e-9), "1E-09");
        assert_eq!(format_single(1234567.0), "1234567");
        assert_eq!(format_double(1e20), "1D+20");
    }

    #[test]
    fn test_text() {
        assert_eq!(from_text(" -12 "), Some(Number::Integer(-12)));
        assert_eq!(from_text(""), Some(Number::Integer(0)));
        assert_eq!(from_text("1X"), None);
        assert_eq!(parse_prefix("3.5abc").0, Number::Single(3.5));
    }
}
