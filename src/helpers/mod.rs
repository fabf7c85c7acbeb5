//! Small shared helpers

mod date;

pub use date::*;
