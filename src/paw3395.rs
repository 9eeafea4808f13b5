//! PAW3395 optical sensor driver (C3), grounded in
//! `examples/original_source/13-sensor/src/sensor.c` (`paw_read`/`paw_write`/
//! `paw_modify`/`paw_motion_burst`) and `16-mouse/src/mouse.c` (dpi setup,
//! `BURST_SIZE`/`send_hid_report`'s burst-byte layout). Register addresses
//! beyond the handful the retrieved sources name directly, including the
//! power-up sequence, come from the PAW3395 public datasheet; treated as an
//! opaque vendor-published `(reg, value)` list, not something this driver
//! needs to explain.

use crate::gpio;
use crate::pac::{Gpio, Spi, Tim2};
use crate::spi;
use crate::time;

pub const PRODUCT_ID: u8 = 0x00;
pub const REVISION_ID: u8 = 0x01;
pub const MOTION: u8 = 0x02;
pub const DELTA_X_L: u8 = 0x03;
pub const DELTA_X_H: u8 = 0x04;
pub const DELTA_Y_L: u8 = 0x05;
pub const DELTA_Y_H: u8 = 0x06;
pub const PERFORMANCE: u8 = 0x40;
pub const MOTION_BURST: u8 = 0x12;
pub const RESOLUTION_X_L: u8 = 0x4e;
pub const RESOLUTION_X_H: u8 = 0x4f;
pub const RESOLUTION_Y_L: u8 = 0x65;
pub const RESOLUTION_Y_H: u8 = 0x66;
pub const POWER_UP_RESET: u8 = 0x3a;
pub const SHUTDOWN: u8 = 0x3b;

pub const PERFORMANCE_AWAKE: u8 = 1 << 2;

/// Vendor power-up register sequence (datasheet §Power-Up Sequence): a
/// fixed reset key written to [`POWER_UP_RESET`] followed by a handful of
/// recommended register pokes, each separated by the settle delay the
/// datasheet calls for. Treated as an opaque `(reg, value)` list, the same
/// way the rest of this driver treats vendor register addresses.
const POWER_UP_SEQUENCE: &[(u8, u8)] = &[(POWER_UP_RESET, 0x5a), (0x7f, 0x00), (0x61, 0xad), (0x7f, 0x00)];

pub const BURST_SIZE: usize = 12;
const WRITE_BIT: u8 = 1 << 7;

/// CS, SPI bus and delay timer bundled so every transaction site doesn't
/// need to thread three arguments through by hand.
pub struct Paw3395<'a> {
    pub spi: &'a Spi,
    pub cs_port: &'a Gpio,
    pub cs_pin: u32,
    pub tim: &'a Tim2,
}

impl<'a> Paw3395<'a> {
    pub fn new(spi: &'a Spi, cs_port: &'a Gpio, cs_pin: u32, tim: &'a Tim2) -> Self {
        Self {
            spi,
            cs_port,
            cs_pin,
            tim,
        }
    }

    pub fn read(&self, addr: u8) -> u8 {
        gpio::clear(self.cs_port, self.cs_pin);
        spi::transfer(self.spi, addr as u32);
        let data = spi::transfer(self.spi, 0) as u8;
        gpio::set(self.cs_port, self.cs_pin);
        data
    }

    pub fn write(&self, addr: u8, data: u8) {
        gpio::clear(self.cs_port, self.cs_pin);
        spi::transfer(self.spi, (addr | WRITE_BIT) as u32);
        spi::transfer(self.spi, data as u32);
        gpio::set(self.cs_port, self.cs_pin);
    }

    pub fn modify(&self, addr: u8, clear_mask: u8, set_mask: u8) {
        let reg = self.read(addr);
        self.write(addr, (reg & !clear_mask) | set_mask);
    }

    /// Read `buf.len()` bytes (up to [`BURST_SIZE`]) back-to-back after a
    /// single `MOTION_BURST` address phase, CS held low for the whole
    /// transaction (RM: the burst read must not be interrupted by another
    /// register access or it restarts from byte 0).
    pub fn motion_burst(&self, buf: &mut [u8]) {
        let len = buf.len().min(BURST_SIZE);
        gpio::clear(self.cs_port, self.cs_pin);
        spi::transfer(self.spi, MOTION_BURST as u32);
        for slot in buf.iter_mut().take(len) {
            *slot = spi::transfer(self.spi, 0) as u8;
        }
        gpio::set(self.cs_port, self.cs_pin);
    }

    /// Vendor power-up sequence followed by leaving REST mode so motion is
    /// reported continuously rather than only after every Nth frame.
    pub fn init(&self) {
        time::delay_ms(self.tim, 100);
        self.power_up();
        let _product_id = self.read(PRODUCT_ID);
        self.modify(PERFORMANCE, 0, PERFORMANCE_AWAKE);
    }

    /// Run [`POWER_UP_SEQUENCE`], settling 1ms between writes per the
    /// datasheet's power-up timing.
    fn power_up(&self) {
        for &(reg, val) in POWER_UP_SEQUENCE {
            self.write(reg, val);
            time::delay_ms(self.tim, 1);
        }
    }

    /// Put the sensor into its lowest-power shutdown state. Not part of
    /// this board's normal boot path, but kept alongside [`init`](Self::init)
    /// for the symmetric power-down counterpart the datasheet documents.
    pub fn shutdown(&self) {
        self.write(SHUTDOWN, 0xb6);
    }

    /// Program the X/Y resolution registers from a CPI value. The PAW3395
    /// resolution field is CPI/50 - 1, 16-bit, split across two registers
    /// per axis (datasheet §Resolution_X/Y).
    pub fn set_dpi(&self, cpi: u16) {
        let raw = (cpi / 50).saturating_sub(1);
        self.write(RESOLUTION_X_L, (raw & 0xff) as u8);
        self.write(RESOLUTION_X_H, (raw >> 8) as u8);
        self.write(RESOLUTION_Y_L, (raw & 0xff) as u8);
        self.write(RESOLUTION_Y_H, (raw >> 8) as u8);
    }
}

/// Pull (dx, dy) out of a raw burst buffer the way `mouse.c`'s
/// `send_hid_report` does: bytes 2/3 are Delta_X low/high, bytes 4/5 are
/// Delta_Y low/high, little-endian signed 16-bit.
pub fn burst_delta(buf: &[u8; BURST_SIZE]) -> (i16, i16) {
    let dx = i16::from_le_bytes([buf[2], buf[3]]);
    let dy = i16::from_le_bytes([buf[4], buf[5]]);
    (dx, dy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_delta_decodes_little_endian_signed() {
        let mut buf = [0u8; BURST_SIZE];
        buf[2] = 0xfe; // -2 low byte
        buf[3] = 0xff; // -2 high byte
        buf[4] = 0x64; // 100 low byte
        buf[5] = 0x00;
        let (dx, dy) = burst_delta(&buf);
        assert_eq!(dx, -2);
        assert_eq!(dy, 100);
    }

    #[test]
    fn dpi_to_raw_resolution_rounds_down() {
        assert_eq!(800u16 / 50 - 1, 15);
        assert_eq!(400u16 / 50 - 1, 7);
    }
}
