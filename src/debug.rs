//! UART debug console (the ambient logging stack a complete firmware image
//! needs even though the Non-goals exclude metrics/telemetry).
//!
//! Ring-buffered and ISR-drained, grounded in an H5-family USB stack's
//! `debug.rs`: the write side fills a byte ring and kicks the TXE interrupt,
//! the ISR drains it one byte at a time, `flush` busy-waits for the last
//! byte to actually leave the shift register. Collapsed from that design's
//! generic `Meta`-parameterized multi-UART layout down to the one USART1
//! instance this board wires up — there is exactly one debug UART here, so
//! the generic machinery bought nothing but nightly-feature baggage.

use crate::pac::{self, Usart};
use crate::utils::{barrier, WFE};
use crate::vcell::{UCell, VCell};

const DEBUG_ENABLE: bool = cfg!(feature = "internal_debug");
const BUF_SIZE: usize = 256;

pub struct Console {
    w: VCell<u8>,
    r: VCell<u8>,
    buf: [UCell<u8>; BUF_SIZE],
}

impl Console {
    pub const fn new() -> Self {
        Self {
            w: VCell::new(0),
            r: VCell::new(0),
            buf: [const { UCell::new(0) }; BUF_SIZE],
        }
    }

    fn write_bytes(&self, uart: &Usart, s: &[u8]) {
        if !DEBUG_ENABLE {
            return;
        }
        let mut w = self.w.read();
        for &b in s {
            while self.r.read().wrapping_sub(w) == 1 {
                self.enable(uart, w);
                self.push(uart);
            }
            // SAFETY: the ISR only ever touches buf[r..w), never buf[w].
            unsafe { *self.buf[w as usize].as_mut() = b };
            w = w.wrapping_add(1);
        }
        self.enable(uart, w);
    }

    fn enable(&self, uart: &Usart, w: u8) {
        barrier();
        self.w.write(w);
        uart.cr1.write(
            uart.cr1.read() | pac::USART_CR1_TE | pac::USART_CR1_UE | pac::USART_CR1_TXEIE,
        );
    }

    /// Sleep for an interrupt, then run the ISR ourselves if it turned out
    /// to be USART1's — same "we might race the NVIC" workaround the
    /// teacher's `push` uses, since `wfe` can also wake on unrelated events.
    fn push(&self, uart: &Usart) {
        WFE();
        let nvic = pac::nvic();
        let idx = (pac::NVIC_USART1_IRQ / 32) as usize;
        let bit = pac::NVIC_USART1_IRQ % 32;
        if nvic.icpr[idx].read() & (1 << bit) == 0 {
            return;
        }
        while nvic.icpr[idx].read() & (1 << bit) != 0 {
            nvic.icpr[idx].write(1 << bit);
            self.isr(uart);
        }
    }

    /// USART1 global interrupt handler: drain one ring byte into DR per TXE,
    /// disable the TXE interrupt once the ring is empty.
    pub fn isr(&self, uart: &Usart) {
        if !DEBUG_ENABLE {
            return;
        }
        let sr = uart.sr.read();
        if sr & pac::USART_SR_TC != 0 {
            uart.cr1.write(uart.cr1.read() & !pac::USART_CR1_TCIE);
        }
        if sr & pac::USART_SR_TXE == 0 {
            return;
        }

        let mut r = self.r.read();
        let w = self.w.read();
        if r != w {
            let byte = unsafe { *self.buf[r as usize].as_ref() };
            uart.dr.write(byte as u32);
            r = r.wrapping_add(1);
        }
        self.r.write(r);
        if r == w {
            uart.cr1.write(uart.cr1.read() & !pac::USART_CR1_TXEIE);
        }
    }

    fn flush(&self, uart: &Usart) {
        if !DEBUG_ENABLE {
            return;
        }
        uart.cr1.write(uart.cr1.read() | pac::USART_CR1_TCIE);
        loop {
            let sr = uart.sr.read();
            if self.r.read() == self.w.read() && sr & pac::USART_SR_TC != 0 {
                break;
            }
            self.push(uart);
        }
    }
}

pub static CONSOLE: Console = Console::new();

pub fn isr() {
    CONSOLE.isr(pac::usart1());
}

pub fn flush() {
    CONSOLE.flush(pac::usart1());
}

pub fn write_str(s: &str) {
    if DEBUG_ENABLE {
        CONSOLE.write_bytes(pac::usart1(), s.as_bytes());
    }
}

struct Writer;

impl core::fmt::Write for Writer {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        write_str(s);
        Ok(())
    }
}

pub fn write_fmt(fmt: core::fmt::Arguments) {
    if DEBUG_ENABLE {
        let _ = core::fmt::write(&mut Writer, fmt);
    }
}

/// `dbg!("x={}", x)` — stable-Rust replacement for a `format_args_nl!`-based
/// macro, which needs a nightly feature this crate doesn't otherwise use.
#[macro_export]
macro_rules! dbg {
    ($($tt:tt)*) => {
        $crate::debug::write_fmt(format_args!($($tt)*))
    };
}

#[macro_export]
macro_rules! dbgln {
    () => {
        $crate::dbg!("\n")
    };
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::dbg!(concat!($fmt, "\n") $(, $arg)*)
    };
}
