#![crate_name = "pxldis"]

#[macro_use]
extern crate lazy_static;

pub mod attribute;
pub mod config;
pub mod cursor;
pub mod disassembler;
pub mod error;
pub mod formatter;
pub mod header;
pub mod payload;
pub mod tag_tables;
pub mod value;

#[cfg(test)]
mod test_utils;

#[cfg(test)]
mod disassembler_tests;

pub use config::OutputOptions;
pub use disassembler::{disassemble, DecodeSession, Disassembly, Step, Token};
pub use error::{DecodeError, DecodeFailure};
