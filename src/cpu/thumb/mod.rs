//! Thumb (16-bit) instruction decoding, execution and disassembly.

pub mod display;
pub mod exec;
pub mod instruction;
