//! Microsecond/millisecond delay built on TIM2 as a free-running counter,
//! grounded in `examples/original_source/16-mouse/src/delay.c`. spec.md
//! lists this timer as an external collaborator whose interface must be
//! supplied; it is trivial enough (one prescaler write, a busy-wait) that
//! implementing it directly carries no design risk and every other
//! component's doctests need it to run, so SPEC_FULL keeps a real
//! implementation rather than a stub.

use crate::pac::{self, Tim2};

/// Configure TIM2 as a 1 MHz free-running counter (assumes the 72 MHz
/// system clock from `set_sysclk_72mhz`, an external collaborator).
pub fn setup(tim: &Tim2) {
    tim.psc.write(71);
    tim.egr.write(tim.egr.read() | pac::TIM_EGR_UG);
    tim.cr1.write(tim.cr1.read() | pac::TIM_CR1_CEN);
}

pub fn delay_us(tim: &Tim2, us: u16) {
    tim.cnt.write(0);
    while tim.cnt.read() < us as u32 {}
}

pub fn delay_ms(tim: &Tim2, ms: u32) {
    for _ in 0..ms {
        tim.cnt.write(0);
        while tim.cnt.read() < 1000 {}
    }
}
