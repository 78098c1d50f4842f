use super::token::*;
use super::*;

mod tokenise_test;

fn listing(t: &Tokeniser, line: &str) -> String {
    let code = t.tokenise_line(line);
    let mut r = Reader::at(&code, 1);
    String::from_utf8(t.detokenise_line(&mut r, None).text).unwrap()
}
