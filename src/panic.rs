//! Panic reporting

use core::panic::PanicInfo;

use crate::{arch, console, println};

/// Report a panic on the console and park the core
pub fn monitor_panic(info: &PanicInfo) -> ! {
    arch::disable_interrupts();

    // SAFETY: interrupts are off and the core never returns from here, so
    // whoever held the console lock will not run again.
    unsafe { console::force_unlock() };

    println!("\n!!! MONITOR PANIC !!!");

    if let Some(location) = info.location() {
        println!("Location: {}:{}", location.file(), location.line());
    }

    println!("Message: {}", info.message());
    println!("System halted.");

    arch::halt()
}
