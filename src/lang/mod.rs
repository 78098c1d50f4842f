/*!
# Language Module

Tokenised program text: keyword tables, the tokeniser and detokeniser,
numeric constants, and the cipher for protected programs.

*/

#[macro_use]
mod error;
mod number;
mod reader;
mod tokenise;

pub mod protect;
pub mod token;

pub use error::Error;
pub use error::ErrorCode;
pub use number::{
    format_double, format_single, from_text, parse_prefix, read_number, tokenise_number, Number,
    DOUBLE_MAX, SINGLE_MAX,
};
pub use reader::Reader;
pub use tokenise::{Detokenised, Tokeniser};

#[cfg(test)]
mod tests;
