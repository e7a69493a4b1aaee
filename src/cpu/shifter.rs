//! The barrel shifter.
//!
//! Every data-processing operand and every load/store register offset
//! passes through one of these five operations before reaching the ALU.
//! Each is a pure function of its inputs and the carry-in, returning the
//! shifted value together with the carry the shifter itself produces
//! (which, for a data-processing instruction with `S=1`, becomes the
//! new carry flag unless the ALU op overrides it with its own carry).

/// Logical shift left by `amount` (0..=32 for immediate shifts, any
/// width for register-specified shifts whose amount the caller has
/// already reduced to a `u8` byte).
pub fn lsl(value: u32, amount: u32, carry_in: bool) -> (u32, bool) {
    match amount {
        0 => (value, carry_in),
        1..=31 => (value << amount, 0 != (value >> (32 - amount)) & 1),
        32 => (0, 0 != (value & 1)),
        _ => (0, false),
    }
}

/// Logical shift right. An immediate shift amount of 0 encodes `LSR #32`.
pub fn lsr(value: u32, amount: u32, carry_in: bool) -> (u32, bool) {
    match amount {
        0 => (value, carry_in),
        1..=31 => (value >> amount, 0 != (value >> (amount - 1)) & 1),
        32 => (0, 0 != (value >> 31)),
        _ => (0, false),
    }
}

/// Arithmetic shift right, sign-extending. An immediate shift amount of
/// 0 encodes `ASR #32`.
pub fn asr(value: u32, amount: u32, carry_in: bool) -> (u32, bool) {
    let signed = value as i32;
    match amount {
        0 => (value, carry_in),
        1..=31 => ((signed >> amount) as u32, 0 != (value >> (amount - 1)) & 1),
        _ => {
            let result = if signed < 0 { u32::MAX } else { 0 };
            (result, signed < 0)
        }
    }
}

/// Rotate right. An immediate shift amount of 0 encodes `RRX` (rotate
/// right through carry by one bit) and must be routed to [`rrx`]
/// instead; this function treats amount 0 as a no-op, matching the
/// `ROR Rd, Rm, Rs` case where a register-sourced amount can genuinely
/// be zero.
pub fn ror(value: u32, amount: u32, carry_in: bool) -> (u32, bool) {
    if amount == 0 {
        return (value, carry_in);
    }
    let amount = amount % 32;
    if amount == 0 {
        (value, 0 != (value >> 31))
    } else {
        (value.rotate_right(amount), 0 != (value >> (amount - 1)) & 1)
    }
}

/// Rotate right by one bit through the carry flag (`RRX`).
pub fn rrx(value: u32, carry_in: bool) -> (u32, bool) {
    let carry_out = 0 != (value & 1);
    let result = (value >> 1) | ((carry_in as u32) << 31);
    (result, carry_out)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lsl_by_zero_is_identity_and_preserves_carry() {
        assert_eq!(lsl(0x1234, 0, true), (0x1234, true));
        assert_eq!(lsl(0x1234, 0, false), (0x1234, false));
    }

    #[test]
    fn lsl_by_32_is_zero_with_carry_from_bit_0() {
        assert_eq!(lsl(0b1, 32, false), (0, true));
        assert_eq!(lsl(0b10, 32, false), (0, false));
    }

    #[test]
    fn lsl_beyond_32_is_all_zero_no_carry() {
        assert_eq!(lsl(0xFFFF_FFFF, 40, true), (0, false));
    }

    #[test]
    fn lsr_by_32_takes_carry_from_bit_31() {
        assert_eq!(lsr(0x8000_0000, 32, false), (0, true));
        assert_eq!(lsr(0x7FFF_FFFF, 32, false), (0, false));
    }

    #[test]
    fn asr_sign_extends_and_saturates_beyond_31() {
        assert_eq!(asr(0x8000_0000, 40, false), (0xFFFF_FFFF, true));
        assert_eq!(asr(0x7FFF_FFFF, 40, false), (0, false));
        assert_eq!(asr(0xFFFF_FFFF, 4, false), (0xFFFF_FFFF, true));
    }

    #[test]
    fn ror_by_register_amount_that_is_multiple_of_32_is_identity() {
        assert_eq!(ror(0x8000_0001, 32, false), (0x8000_0001, true));
    }

    #[test]
    fn ror_rotates_and_reports_carry_from_last_bit_rotated_out() {
        assert_eq!(ror(0b1, 1, false), (0x8000_0000, true));
    }

    #[test]
    fn rrx_shifts_in_the_carry_flag() {
        assert_eq!(rrx(0b10, true), (0x8000_0001, false));
        assert_eq!(rrx(0b11, false), (0x0000_0001, true));
    }
}
