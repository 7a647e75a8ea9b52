//! PL011 UART driver
//!
//! Polled only: interrupts are masked at init and never unmasked. Register
//! layout follows the ARM PrimeCell UART (PL011) TRM; only the registers the
//! monitor touches are named.

use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::registers::{ReadOnly, ReadWrite, WriteOnly};
use tock_registers::{register_bitfields, register_structs};

use super::Serial;
use crate::arch;
use crate::config::{BaudDivisor, UART_SETTLE_CYCLES};

register_bitfields! {
    u32,

    /// Flag Register
    FR [
        /// Transmit FIFO full
        TXFF OFFSET(5) NUMBITS(1) [],
        /// Receive FIFO empty
        RXFE OFFSET(4) NUMBITS(1) []
    ],

    /// Integer Baud Rate Divisor
    IBRD [
        BAUD_DIVINT OFFSET(0) NUMBITS(16) []
    ],

    /// Fractional Baud Rate Divisor
    FBRD [
        BAUD_DIVFRAC OFFSET(0) NUMBITS(6) []
    ],

    /// Line Control Register
    LCR_H [
        /// Word length
        WLEN OFFSET(5) NUMBITS(2) [
            FiveBit = 0b00,
            SixBit = 0b01,
            SevenBit = 0b10,
            EightBit = 0b11
        ],
        /// FIFO enable
        FEN OFFSET(4) NUMBITS(1) [
            FifosDisabled = 0,
            FifosEnabled = 1
        ]
    ],

    /// Control Register
    CR [
        RXE OFFSET(9) NUMBITS(1) [
            Disabled = 0,
            Enabled = 1
        ],
        TXE OFFSET(8) NUMBITS(1) [
            Disabled = 0,
            Enabled = 1
        ],
        UARTEN OFFSET(0) NUMBITS(1) [
            Disabled = 0,
            Enabled = 1
        ]
    ],

    /// Interrupt Mask Set/Clear
    IMSC [
        ALL OFFSET(0) NUMBITS(11) []
    ],

    /// Interrupt Clear Register
    ICR [
        ALL OFFSET(0) NUMBITS(11) []
    ]
}

register_structs! {
    #[allow(non_snake_case)]
    pub RegisterBlock {
        (0x00 => DR: ReadWrite<u32>),
        (0x04 => _reserved1),
        (0x18 => FR: ReadOnly<u32, FR::Register>),
        (0x1c => _reserved2),
        (0x24 => IBRD: WriteOnly<u32, IBRD::Register>),
        (0x28 => FBRD: WriteOnly<u32, FBRD::Register>),
        (0x2c => LCR_H: WriteOnly<u32, LCR_H::Register>),
        (0x30 => CR: WriteOnly<u32, CR::Register>),
        (0x34 => _reserved3),
        (0x38 => IMSC: ReadWrite<u32, IMSC::Register>),
        (0x3c => _reserved4),
        (0x44 => ICR: WriteOnly<u32, ICR::Register>),
        (0x48 => @END),
    }
}

/// Size of the register window in bytes
pub const REGISTER_WINDOW: usize = 0x48;

/// A PL011 at a fixed physical address
pub struct Pl011Uart {
    base: usize,
    divisor: BaudDivisor,
}

impl Pl011Uart {
    /// Create a driver for the UART at `base`
    ///
    /// # Safety
    /// `base` must be the address of a PL011 register window (or memory laid
    /// out like one) that nothing else accesses while this driver exists.
    pub const unsafe fn new(base: usize, divisor: BaudDivisor) -> Self {
        Self { base, divisor }
    }

    fn registers(&self) -> &RegisterBlock {
        // SAFETY: guaranteed by the contract of `new`
        unsafe { &*(self.base as *const RegisterBlock) }
    }
}

impl Serial for Pl011Uart {
    fn initialize(&mut self) {
        let regs = self.registers();

        regs.CR.set(0);
        arch::spin_delay(UART_SETTLE_CYCLES);

        regs.IBRD
            .write(IBRD::BAUD_DIVINT.val(self.divisor.integer as u32));
        regs.FBRD
            .write(FBRD::BAUD_DIVFRAC.val(self.divisor.fractional as u32));
        regs.LCR_H
            .write(LCR_H::WLEN::EightBit + LCR_H::FEN::FifosEnabled);
        regs.IMSC.set(0);
        regs.ICR.write(ICR::ALL::SET);
        regs.CR
            .write(CR::UARTEN::Enabled + CR::TXE::Enabled + CR::RXE::Enabled);
    }

    fn tx_fifo_full(&self) -> bool {
        self.registers().FR.is_set(FR::TXFF)
    }

    fn rx_fifo_empty(&self) -> bool {
        self.registers().FR.is_set(FR::RXFE)
    }

    fn write_data(&mut self, byte: u8) {
        self.registers().DR.set(byte as u32);
    }

    fn read_data(&mut self) -> u32 {
        self.registers().DR.get()
    }
}
