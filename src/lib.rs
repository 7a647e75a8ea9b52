//! cboot - a bare-metal AArch64 serial monitor
//!
//! Brings up the PL011 console on a Raspberry Pi 3B, prints boot
//! diagnostics (exception level, memory layout), runs a small self-test and
//! then serves single-key debug commands until told to halt or restart.
//!
//! The crate is `no_std`. Hardware access is confined to [`arch`] and
//! [`drivers::pl011`]; everything above them is written against the
//! [`drivers::Serial`] and [`arch::Platform`] traits and is tested on the
//! host with scripted doubles.

#![cfg_attr(not(test), no_std)]
// Hardware register code often uses explicit bit shifts for documentation
#![allow(clippy::identity_op)]

pub mod arch;
pub mod config;
pub mod console;
pub mod drivers;
pub mod format;
pub mod layout;
pub mod logger;
pub mod mem;
pub mod monitor;
pub mod panic;

pub use arch::{ExceptionLevel, Platform, RegisterSnapshot};
pub use drivers::Serial;
pub use layout::MemoryLayout;
pub use monitor::{Monitor, Stage};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Product name
pub const NAME: &str = "cboot";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(NAME, "cboot");
        assert!(!VERSION.is_empty());
    }
}
