//! Zero-latency SPDT button debouncer (C4).
//!
//! Grounded in `examples/original_source/12-spdt/src/spdt.c` and the mouse
//! firmware's `exti9_5_isr`/`exti15_10_isr`. Each switch is wired as two
//! EXTI lines (NO and NC); at any time exactly one is unmasked, and a
//! falling edge on the armed line is the definitive transition — because
//! SPDT contacts break before make, the departing contact is already
//! masked by the time it could bounce, so there is no spurious re-arrival
//! to filter.

use crate::pac::{self, Exti};
use crate::vcell::VCell;

/// EXTI line bit for each button contact (RM0008 §9: PA8/PA9/PA10/PB12).
pub const EXTI_R_NO: u32 = 1 << 8;
pub const EXTI_L_NO: u32 = 1 << 9;
pub const EXTI_L_NC: u32 = 1 << 10;
pub const EXTI_R_NC: u32 = 1 << 12;

/// Published, atomically-readable button state. Written only from EXTI ISR
/// context, read only from USB-ISR context (report generation); a single
/// `bool` store/load needs no further synchronisation (spec.md §5).
pub static L_CLICK: VCell<bool> = VCell::new(false);
pub static R_CLICK: VCell<bool> = VCell::new(false);

/// Map PA8/PA9/PA10/PB12 onto EXTI lines 8/9/10/12 and AFIO's EXTICR, unmask
/// the two "Released" (NO) lines, mask the two "Pressed" (NC) lines, and
/// arm falling-edge detection on all four.
pub fn setup(exti: &Exti, afio: &pac::Afio) {
    // EXTICR[2] holds EXTI8..11 (4 bits each); PA maps to source 0b0000.
    let excr2 = afio.exticr[2].read();
    afio.exticr[2].write(excr2 & !0x0fff);
    // EXTICR[3] holds EXTI12..15; PB12 maps to source 0b0001.
    let excr3 = afio.exticr[3].read();
    afio.exticr[3].write((excr3 & !0x000f) | 0x0001);

    exti.imr
        .write((exti.imr.read() | EXTI_L_NO | EXTI_R_NO) & !(EXTI_L_NC | EXTI_R_NC));
    exti.ftsr
        .write(exti.ftsr.read() | EXTI_L_NO | EXTI_L_NC | EXTI_R_NO | EXTI_R_NC);
    exti.pr.write(EXTI_L_NO | EXTI_L_NC | EXTI_R_NO | EXTI_R_NC);

    pac::enable_irq(pac::NVIC_EXTI9_5_IRQ);
    pac::enable_irq(pac::NVIC_EXTI15_10_IRQ);
}

/// EXTI9_5 ISR: handles the "just made contact" edges (NO lines for both
/// switches live in this bank).
pub fn exti9_5_isr(exti: &Exti) {
    let pr = exti.pr.read();
    if pr & EXTI_L_NO != 0 {
        exti.imr
            .write((exti.imr.read() & !EXTI_L_NO) | EXTI_L_NC);
        exti.pr.write(EXTI_L_NO | EXTI_L_NC);
        L_CLICK.write(true);
    }
    if pr & EXTI_R_NO != 0 {
        exti.imr
            .write((exti.imr.read() & !EXTI_R_NO) | EXTI_R_NC);
        exti.pr.write(EXTI_R_NO | EXTI_R_NC);
        R_CLICK.write(true);
    }
}

/// EXTI15_10 ISR: handles the "just departed" edges (NC lines).
pub fn exti15_10_isr(exti: &Exti) {
    let pr = exti.pr.read();
    if pr & EXTI_L_NC != 0 {
        exti.imr
            .write((exti.imr.read() & !EXTI_L_NC) | EXTI_L_NO);
        exti.pr.write(EXTI_L_NO | EXTI_L_NC);
        L_CLICK.write(false);
    }
    if pr & EXTI_R_NC != 0 {
        exti.imr
            .write((exti.imr.read() & !EXTI_R_NC) | EXTI_R_NO);
        exti.pr.write(EXTI_R_NO | EXTI_R_NC);
        R_CLICK.write(false);
    }
}

/// Pure per-switch SR-latch emulation, factored out of the ISR bodies so
/// the debounce logic in spec.md §8 ("Button SR-latch") can be property
/// tested on the host without simulating EXTI registers.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Armed {
    No,
    Nc,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Switch {
    armed: Armed,
    pressed: bool,
}

impl Default for Switch {
    fn default() -> Self {
        Self {
            armed: Armed::No,
            pressed: false,
        }
    }
}

impl Switch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pressed(&self) -> bool {
        self.pressed
    }

    pub fn armed(&self) -> Armed {
        self.armed
    }

    /// A falling edge observed on `line`. Edges on the disarmed line are
    /// bounce on a contact that's already masked at the controller and
    /// must not change state (this mirrors "the ISR never fires for a
    /// masked line" rather than re-implementing masking here).
    pub fn falling_edge(&mut self, line: Armed) {
        if line != self.armed {
            return;
        }
        match self.armed {
            Armed::No => {
                self.pressed = true;
                self.armed = Armed::Nc;
            }
            Armed::Nc => {
                self.pressed = false;
                self.armed = Armed::No;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_to_pressed_on_no_edge() {
        let mut sw = Switch::new();
        assert!(!sw.pressed());
        sw.falling_edge(Armed::No);
        assert!(sw.pressed());
        assert_eq!(sw.armed(), Armed::Nc);
    }

    #[test]
    fn bounce_on_disarmed_line_is_ignored() {
        let mut sw = Switch::new();
        // Released, NC is disarmed: 20 rapid bounce edges must not move us.
        for _ in 0..20 {
            sw.falling_edge(Armed::Nc);
        }
        assert!(!sw.pressed());
        assert_eq!(sw.armed(), Armed::No);
    }

    #[test]
    fn full_press_release_cycle() {
        let mut sw = Switch::new();
        sw.falling_edge(Armed::No);
        assert!(sw.pressed());
        // Bounce on the now-disarmed NO line must not change anything.
        sw.falling_edge(Armed::No);
        assert!(sw.pressed());
        sw.falling_edge(Armed::Nc);
        assert!(!sw.pressed());
        assert_eq!(sw.armed(), Armed::No);
    }

    #[test]
    fn interleaved_sequence_tracks_ground_truth() {
        let mut sw = Switch::new();
        let edges = [Armed::No, Armed::No, Armed::Nc, Armed::Nc, Armed::No];
        let mut expect = false;
        for e in edges {
            if e == sw.armed() {
                expect = !expect;
            }
            sw.falling_edge(e);
            assert_eq!(sw.pressed(), expect);
        }
    }
}
