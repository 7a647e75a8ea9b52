//! Compile-time configuration for cboot
//!
//! Everything the monitor needs to know about the board lives here. There is
//! no runtime configuration source: the values are baked into the image.

/// Raspberry Pi 3B peripheral window
pub const PERIPHERAL_BASE: usize = 0x3F00_0000;

/// PL011 UART0 base address
pub const UART0_BASE: usize = PERIPHERAL_BASE + 0x0020_1000;

/// UART reference clock in Hz
pub const UART_CLOCK_HZ: u32 = 48_000_000;

/// Console baud rate
pub const BAUD_RATE: u32 = 115_200;

/// Divisor programmed into IBRD/FBRD at init
pub const BAUD_DIVISOR: BaudDivisor = BaudDivisor::new(UART_CLOCK_HZ, BAUD_RATE);

/// Busy-wait iterations after disabling the UART
pub const UART_SETTLE_CYCLES: u64 = 150;

/// Busy-wait iterations between the reboot message and the jump
pub const REBOOT_DELAY_CYCLES: u64 = 5_000_000;

/// Image entry point; the `r` command jumps here
pub const RESTART_ADDRESS: usize = 0x8000;

/// Product name shown in the banner
pub const PRODUCT_NAME: &str = "cboot - Raspberry Pi 3B Bootloader";

/// Author line shown in the banner
pub const AUTHOR: &str = "cboot Contributors";

/// Build timestamp injected by build.rs
pub const BUILD_TIMESTAMP: &str = match option_env!("CBOOT_BUILD_TIMESTAMP") {
    Some(ts) => ts,
    None => "unknown",
};

/// Interactive prompt
pub const PROMPT: &str = "> ";

/// PL011 baud-rate divisor split into its integer and 6-bit fractional parts
///
/// The hardware divides the reference clock by `16 * (IBRD + FBRD / 64)`.
/// The fractional part is rounded to the nearest 1/64.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaudDivisor {
    /// Value for IBRD
    pub integer: u16,
    /// Value for FBRD (0..=63)
    pub fractional: u8,
}

impl BaudDivisor {
    /// Derive the divisor for `clock_hz` / `baud`
    ///
    /// `baud` must be non-zero; this is only ever evaluated at compile time
    /// with the constants above.
    pub const fn new(clock_hz: u32, baud: u32) -> Self {
        // 64 * clock / (16 * baud), rounded to nearest
        let scaled = (4 * clock_hz as u64 + baud as u64 / 2) / baud as u64;
        Self {
            integer: (scaled >> 6) as u16,
            fractional: (scaled & 0x3F) as u8,
        }
    }

    /// Effective baud rate produced by this divisor, in Hz
    pub const fn effective_baud(&self, clock_hz: u32) -> u32 {
        let scaled = ((self.integer as u64) << 6) | self.fractional as u64;
        ((4 * clock_hz as u64) / scaled) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_divisor() {
        assert_eq!(BAUD_DIVISOR.integer, 26);
        assert_eq!(BAUD_DIVISOR.fractional, 3);
    }

    #[test]
    fn test_divisor_within_tolerance() {
        let actual = BAUD_DIVISOR.effective_baud(UART_CLOCK_HZ);
        let error = actual.abs_diff(BAUD_RATE);
        // PL011 tolerates a few percent; this divisor is well under 1%
        assert!(error * 100 < BAUD_RATE, "baud error {} Hz", error);
    }

    #[test]
    fn test_other_rates() {
        // 3 MHz clock at 115200 is the classic Pi firmware setup: 1 + 40/64
        let d = BaudDivisor::new(3_000_000, 115_200);
        assert_eq!((d.integer, d.fractional), (1, 40));

        let d = BaudDivisor::new(48_000_000, 9_600);
        assert_eq!((d.integer, d.fractional), (312, 32));
    }

    #[test]
    fn test_uart_base() {
        assert_eq!(UART0_BASE, 0x3F20_1000);
    }
}
