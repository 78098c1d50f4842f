/*!
## Rust Machine Module

This Rust module runs tokenised BASIC. Statements execute one at a time,
straight from the program buffer or from the direct mode line.

*/

mod config;
mod event;
mod expression;
mod file;
mod function;
mod operation;
mod parser;
mod program;
mod runtime;
mod stack;
mod statement;
mod val;
mod var;

pub use config::Config;
pub use event::{Events, Trap};
pub use file::{Device, DiskDevice, FileHandle, FileType, Files, MemoryDevice, Mode};
pub use function::Function;
pub use operation::{Operation, Operator};
pub use program::{Program, Renumbered, END_OF_PROGRAM};
pub use runtime::{Event, Runtime};
pub use stack::Stack;
pub use statement::Statement;
pub use val::Val;
pub use var::{Var, VarHandle};

#[cfg(test)]
mod tests;
