//! Error kinds produced while decoding or executing ARMv4T instructions.

use std::error;
use std::fmt;

/// Errors the core can report while fetching, decoding or executing.
///
/// None of these unwind partial state: the register file and memory are
/// left exactly as they were when the error was raised, so the caller can
/// inspect them.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CoreError {
    /// Decode reached an ARM encoding that isn't one of the recognised
    /// forms (this includes the co-processor bit patterns, since
    /// co-processor execution is out of scope).
    InvalidArmInstruction(u32),

    /// Decode reached a Thumb halfword that isn't one of the 19
    /// standard formats.
    InvalidThumbInstruction(u16),

    /// An ARM instruction's condition field was `NV` (0b1111), which is
    /// reserved and has no defined meaning in ARMv4T.
    ReservedCondition,

    /// Code running in User mode attempted an operation that requires a
    /// banked SPSR or a privileged register bank: reading/writing SPSR,
    /// the `S=1, Rd=15` CPSR-restore form, or `LDM^`/`STM^`.
    PrivilegedModeViolation,

    /// An instruction reused a register in a way ARMv4 declares
    /// unpredictable, e.g. `Rd == Rm` in `MUL`.
    InvalidRegisterReuse,

    /// An instruction used `r15` (PC) as an operand in a position where
    /// ARMv4 declares the result unpredictable.
    InvalidUseOfR15,
}

impl error::Error for CoreError {}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            CoreError::InvalidArmInstruction(raw) => write!(f, "invalid ARM instruction {raw:#010X}"),
            CoreError::InvalidThumbInstruction(raw) => write!(f, "invalid THUMB instruction {raw:#06X}"),
            CoreError::ReservedCondition => write!(f, "reserved NV condition in ARM state"),
            CoreError::PrivilegedModeViolation => write!(f, "User mode has no SPSR / banked registers"),
            CoreError::InvalidRegisterReuse => write!(f, "unpredictable register reuse"),
            CoreError::InvalidUseOfR15 => write!(f, "unpredictable use of r15 as an operand"),
        }
    }
}

/// The reason a run of the core stopped.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Termination {
    /// `pc` left every mapped region of the address space.
    Halted,

    /// The decoder gave up on an instruction; carries the raw encoding
    /// (widened to `u32` for Thumb) and the `pc` it was fetched from.
    UnhandledInstruction(u32, u32),

    /// The caller's cancellation flag was observed set between
    /// instructions.
    Cancelled,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Termination::Halted => write!(f, "halted: pc left the mapped address space"),
            Termination::UnhandledInstruction(raw, pc) => {
                write!(f, "unhandled instruction {raw:#010X} at pc={pc:#010X}")
            }
            Termination::Cancelled => write!(f, "cancelled"),
        }
    }
}
