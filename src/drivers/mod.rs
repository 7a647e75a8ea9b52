//! Device drivers for cboot
//!
//! There is exactly one device: the console UART. The [`Serial`] trait is the
//! seam between the polled transport protocol (blocking, LF to CR+LF) and the
//! hardware that moves bytes, so the protocol can be exercised against a
//! scripted device on the host.

pub mod pl011;

pub use pl011::Pl011Uart;

/// Polled byte-oriented serial channel
///
/// Implementors supply the four raw FIFO primitives plus `initialize`; the
/// transport operations are provided on top of them and are what the rest
/// of the crate uses.
pub trait Serial {
    /// Bring the device up for transmit and receive
    fn initialize(&mut self);

    /// Transmit FIFO cannot take another byte
    fn tx_fifo_full(&self) -> bool;

    /// Receive FIFO holds nothing
    fn rx_fifo_empty(&self) -> bool;

    /// Push one byte into the transmit FIFO without checking for space
    fn write_data(&mut self, byte: u8);

    /// Pop the data register; upper bits carry error flags
    fn read_data(&mut self) -> u32;

    /// Send one byte, spinning until there is room
    ///
    /// A line feed is followed by a carriage return so callers never emit
    /// both. Blocks forever if the FIFO never drains.
    fn send_byte(&mut self, byte: u8) {
        while self.tx_fifo_full() {
            core::hint::spin_loop();
        }
        self.write_data(byte);

        if byte == b'\n' {
            self.send_byte(b'\r');
        }
    }

    /// Send every byte of `s` in order
    fn send_str(&mut self, s: &str) {
        for byte in s.bytes() {
            self.send_byte(byte);
        }
    }

    /// Send a NUL-terminated byte string, stopping at the first NUL
    fn send_cstr(&mut self, bytes: &[u8]) {
        for &byte in bytes.iter().take_while(|&&b| b != 0) {
            self.send_byte(byte);
        }
    }

    /// Wait for a byte and return it
    fn receive_byte(&mut self) -> u8 {
        while self.rx_fifo_empty() {
            core::hint::spin_loop();
        }
        (self.read_data() & 0xFF) as u8
    }

    /// A `receive_byte` would return immediately
    fn byte_available(&self) -> bool {
        !self.rx_fifo_empty()
    }
}
