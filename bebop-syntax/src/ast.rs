//! The schema abstract syntax tree, as produced by the parser and before any
//! name resolution has happened.

mod file;
mod item;
mod lit;
mod types;

pub use file::*;
pub use item::*;
pub use lit::*;
pub use types::*;
