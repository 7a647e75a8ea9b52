//! cboot image entry point
//!
//! `boot.s` parks secondary cores, sets up the stack, clears BSS and then
//! calls `_start_rust`. On any target other than bare-metal AArch64 this
//! binary only prints a notice, so host `cargo test` can still link it.

#![cfg_attr(all(target_arch = "aarch64", target_os = "none"), no_std)]
#![cfg_attr(all(target_arch = "aarch64", target_os = "none"), no_main)]

#[cfg(all(target_arch = "aarch64", target_os = "none"))]
mod image {
    use core::arch::global_asm;
    use core::panic::PanicInfo;

    use cboot::arch::Cpu;
    use cboot::config::{BAUD_DIVISOR, UART0_BASE};
    use cboot::console::{self, Console};
    use cboot::drivers::Pl011Uart;
    use cboot::{logger, MemoryLayout, Monitor};

    global_asm!(include_str!("arch/aarch64/boot.s"));

    /// Rust entry, called from `_start` with a valid stack and zeroed BSS
    #[no_mangle]
    pub unsafe extern "C" fn _start_rust() -> ! {
        // SAFETY: UART0_BASE is the PL011 on this board and the console is
        // its only user from here on.
        console::install(unsafe { Pl011Uart::new(UART0_BASE, BAUD_DIVISOR) });

        // set_logger only fails on a second call. Nothing may log before
        // the monitor's Init stage has brought the UART up.
        let _ = logger::init();

        Monitor::new(Console, Cpu, MemoryLayout::from_linker()).run()
    }

    /// Panic handler
    #[panic_handler]
    fn panic(info: &PanicInfo) -> ! {
        cboot::panic::monitor_panic(info)
    }
}

#[cfg(not(all(target_arch = "aarch64", target_os = "none")))]
fn main() {
    eprintln!(
        "{} {} is a bare-metal image; build it for aarch64-unknown-none (cargo xtask image)",
        cboot::NAME,
        cboot::VERSION
    );
}
