//! ARM (32-bit) instruction decoding, execution and disassembly.

pub mod display;
pub mod exec;
pub mod instruction;
