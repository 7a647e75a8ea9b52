//! Numeric output over a serial channel
//!
//! No allocation and no `core::fmt`: every routine works out of a fixed
//! stack buffer and pushes bytes straight into [`Serial::send_byte`].

use heapless::Vec;

use crate::drivers::Serial;

/// Decimal digits in `u64::MAX`
pub const MAX_DECIMAL_DIGITS: usize = 20;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Emit exactly `digits` uppercase hex characters of `value`, MSB first
///
/// No `0x` prefix. Digits above the 16th are always zero; a count smaller
/// than the value's width drops the high nibbles.
pub fn write_hex<S: Serial + ?Sized>(serial: &mut S, value: u64, digits: u32) {
    for i in (0..digits).rev() {
        serial.send_byte(HEX_DIGITS[nibble(value, i) as usize]);
    }
}

/// Hex digit `index` of `value`, counting from the least significant; zero
/// past the top of a `u64`
fn nibble(value: u64, index: u32) -> u64 {
    index
        .checked_mul(4)
        .and_then(|shift| value.checked_shr(shift))
        .unwrap_or(0)
        & 0xF
}

/// Emit `value` in decimal with no leading zeros
pub fn write_decimal<S: Serial + ?Sized>(serial: &mut S, mut value: u64) {
    if value == 0 {
        serial.send_byte(b'0');
        return;
    }

    // Least significant digit first
    let mut buf: Vec<u8, MAX_DECIMAL_DIGITS> = Vec::new();
    while value > 0 {
        // Cannot overflow: u64 never has more than 20 decimal digits
        let _ = buf.push(b'0' + (value % 10) as u8);
        value /= 10;
    }

    for &digit in buf.iter().rev() {
        serial.send_byte(digit);
    }
}

/// Emit the low `bits` bits of `value` in binary, MSB first
///
/// A space follows every bit position that is a non-zero multiple of four,
/// so `write_binary(s, 0xA5, 8)` prints `1010 0101`.
pub fn write_binary<S: Serial + ?Sized>(serial: &mut S, value: u32, bits: u32) {
    for i in (0..bits).rev() {
        let bit = value.checked_shr(i).unwrap_or(0) & 1;
        serial.send_byte(if bit == 1 { b'1' } else { b'0' });
        if i % 4 == 0 && i != 0 {
            serial.send_byte(b' ');
        }
    }
}
