//! SPI master transport (C2): one primitive, full duplex, no chip-select
//! management. Grounded in `examples/original_source/16-mouse/src/spim.c`
//! and `10-spi/src/spi.c` (the ADXL345 lesson reuses the exact same
//! `spi_transfer` shape against a different sensor, confirming this
//! primitive is meant to be sensor-agnostic).

use crate::pac::{self, Spi};

/// Configure SPI1 as done by the mouse firmware: master mode, CPOL=1/
/// CPHA=1 (mode 3, required by the PAW3395), 8-bit frames, MSB first,
/// software NSS management (CS is driven by GPIO, not the peripheral).
pub fn setup(spi: &Spi) {
    let cr1 = spi.cr1.read();
    spi.cr1.write(
        (cr1 & !pac::SPI_CR1_BR_DIV8 & !pac::SPI_CR1_DFF & !pac::SPI_CR1_LSBFIRST)
            | pac::SPI_CR1_BR_DIV8
            | pac::SPI_CR1_CPOL
            | pac::SPI_CR1_CPHA,
    );
    spi.cr1.write(spi.cr1.read() | pac::SPI_CR1_MSTR);
    spi.cr1.write(spi.cr1.read() | pac::SPI_CR1_SSM);
    spi.cr2.write(spi.cr2.read() & !pac::SPI_CR2_SSOE);
    // Must set SSI before SPE when SSM is set, or MSTR/SPE get cleared
    // (RM0008 25.3.3).
    spi.cr1.write(spi.cr1.read() | pac::SPI_CR1_SSI);
    spi.cr1.write(spi.cr1.read() | pac::SPI_CR1_SPE);
}

/// Full-duplex transfer of one frame. Blocks until TXE then RXNE. No
/// failure mode: a wedged peripheral hangs the caller, which is an
/// acceptable outcome for this firmware class (spec.md §2).
pub fn transfer(spi: &Spi, word: u32) -> u32 {
    while spi.sr.read() & pac::SPI_SR_TXE == 0 {}
    spi.dr.write(word);
    while spi.sr.read() & pac::SPI_SR_RXNE == 0 {}
    spi.dr.read()
}
