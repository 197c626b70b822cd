pub mod ast;
pub mod lexis;
pub mod parsing;

pub use parsing::{Parse, ParseError, Parser};
