//! # GW-BASIC
//!
//! A GW-BASIC interpreter. Programs are kept tokenised in memory the way
//! the original did, so PEEK, POKE and binary SAVE files see the same
//! bytes.
//!
//! ```
//! use basic::mach::{Event, Runtime};
//!
//! let mut runtime = Runtime::default();
//! runtime.enter("10 PRINT 6*7");
//! runtime.enter("RUN");
//! assert_eq!(runtime.execute(100), Event::Print(" 42 \n".to_string()));
//! ```

pub mod lang;
pub mod mach;
pub mod term;
