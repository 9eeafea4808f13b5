//! Mouse firmware core: peripheral façade, SPI transport, PAW3395 driver,
//! button debouncer, and USB FS HID device stack (spec.md §2's C1-C7).
//! `no_std`, stable Rust; the firmware image that links this crate in owns
//! the vector table, clock tree bring-up, and `main` (spec.md's "excluded
//! collaborators").

#![no_std]

pub mod buttons;
#[macro_use]
pub mod debug;
pub mod error;
pub mod gpio;
pub mod hid;
pub mod interrupt;
pub mod pac;
pub mod paw3395;
pub mod spi;
pub mod time;
pub mod usb;
pub mod utils;
pub mod vcell;
