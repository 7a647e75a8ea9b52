//! Memory layout reported at boot
//!
//! The addresses come from the linker script. The monitor never computes
//! them; it only prints what it was handed.

/// Zero-initialised data region and stack bounds of the running image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryLayout {
    pub bss_start: usize,
    pub bss_end: usize,
    /// Linker-computed size, reported as-is
    pub bss_size: usize,
    pub stack_top: usize,
    pub stack_bottom: usize,
}

impl MemoryLayout {
    /// Stack size implied by the two stack symbols
    pub const fn stack_size(&self) -> usize {
        self.stack_top.saturating_sub(self.stack_bottom)
    }

    /// Read the layout symbols exported by `link.ld`
    #[cfg(all(target_arch = "aarch64", target_os = "none"))]
    pub fn from_linker() -> Self {
        extern "C" {
            static __bss_start: u8;
            static __bss_end: u8;
            static __bss_size: u8;
            static _stack_top: u8;
            static _stack_bottom: u8;
        }

        // SAFETY: only the symbol addresses are taken, never their contents.
        unsafe {
            Self {
                bss_start: core::ptr::addr_of!(__bss_start) as usize,
                bss_end: core::ptr::addr_of!(__bss_end) as usize,
                bss_size: core::ptr::addr_of!(__bss_size) as usize,
                stack_top: core::ptr::addr_of!(_stack_top) as usize,
                stack_bottom: core::ptr::addr_of!(_stack_bottom) as usize,
            }
        }
    }
}
