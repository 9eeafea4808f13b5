//! GPIO bit-set/clear/toggle, grounded in
//! `examples/original_source/16-mouse/src/gpio.c`: the BSRR register's low
//! half sets, its high half clears, so both are single atomic writes with
//! no read-modify-write race against the ISRs that also touch GPIO.

use crate::pac::Gpio;

pub fn set(gpio: &Gpio, pins: u32) {
    gpio.bsrr.write(pins);
}

pub fn clear(gpio: &Gpio, pins: u32) {
    gpio.bsrr.write(pins << 16);
}

pub fn toggle(gpio: &Gpio, pins: u32) {
    let odr = gpio.odr.read();
    gpio.bsrr.write(((odr & pins) << 16) | (!odr & pins));
}
