//! AArch64 bare-metal support
pub mod arch_impl;

// Re-export things from arch_impl for convenience
pub use arch_impl::*;
