//! Console output for cboot
//!
//! The console is the single owner of the UART once the image is running.
//! Everything that prints (the monitor, the logger, the panic handler) goes
//! through [`Console`], which takes the lock for each FIFO operation.

use core::fmt::{self, Write};
use spin::Mutex;

use crate::drivers::{Pl011Uart, Serial};

/// Global console instance
static CONSOLE: Mutex<Option<Pl011Uart>> = Mutex::new(None);

/// Hand the UART to the console
///
/// The device is not initialised here; that happens when the monitor runs
/// its INIT stage through [`Console::initialize`].
pub fn install(uart: Pl011Uart) {
    *CONSOLE.lock() = Some(uart);
}

/// Drop any lock held on the console
///
/// # Safety
/// Only for the panic path: the interrupted holder must never resume.
pub unsafe fn force_unlock() {
    // SAFETY: upheld by caller
    unsafe { CONSOLE.force_unlock() }
}

/// Handle to the global console
///
/// Before a UART is installed, output is discarded and input never arrives.
#[derive(Debug, Clone, Copy, Default)]
pub struct Console;

impl Serial for Console {
    fn initialize(&mut self) {
        if let Some(uart) = CONSOLE.lock().as_mut() {
            uart.initialize();
        }
    }

    fn tx_fifo_full(&self) -> bool {
        CONSOLE.lock().as_ref().is_some_and(|uart| uart.tx_fifo_full())
    }

    fn rx_fifo_empty(&self) -> bool {
        CONSOLE.lock().as_ref().map_or(true, |uart| uart.rx_fifo_empty())
    }

    fn write_data(&mut self, byte: u8) {
        if let Some(uart) = CONSOLE.lock().as_mut() {
            uart.write_data(byte);
        }
    }

    fn read_data(&mut self) -> u32 {
        CONSOLE.lock().as_mut().map_or(0, |uart| uart.read_data())
    }
}

/// `core::fmt::Write` over any [`Serial`]
pub struct SerialWriter<'a, S: Serial + ?Sized>(pub &'a mut S);

impl<S: Serial + ?Sized> fmt::Write for SerialWriter<'_, S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.send_str(s);
        Ok(())
    }
}

/// Print formatted text to console
pub fn print(args: fmt::Arguments) {
    // Serial output cannot fail
    let _ = SerialWriter(&mut Console).write_fmt(args);
}

/// Print macro for console output
#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {
        $crate::console::print(format_args!($($arg)*))
    };
}

/// Print with newline macro
#[macro_export]
macro_rules! println {
    () => {
        $crate::print!("\n")
    };
    ($($arg:tt)*) => {
        $crate::console::print(format_args!("{}\n", format_args!($($arg)*)))
    };
}
