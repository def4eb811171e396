#![allow(clippy::len_zero)]

pub mod ast;
pub mod html;
pub mod parser;
