//! Peripheral register façade (C1).
//!
//! Typed, fixed-offset views over the STM32F103 memory map. Every field is a
//! plain unsigned integer word behind a [`VCell`]; there is no bitfield
//! abstraction layered on top — callers peek/poke the same bits the
//! reference manual (RM0008) describes, same as the vendor header this
//! crate's ancestor C firmware used. Each peripheral is reached through a
//! `&'static` accessor built from an `unsafe` pointer cast from its fixed
//! base address, so the peripherals behave as process-wide singletons
//! without needing a runtime "take once" token — callers are expected not
//! to construct competing `&mut` views, the same convention generated PAC
//! crates use for their own singleton peripheral types.

use crate::vcell::VCell;

#[repr(C)]
pub struct Rcc {
    pub cr: VCell<u32>,
    pub cfgr: VCell<u32>,
    pub cir: VCell<u32>,
    pub apb2rstr: VCell<u32>,
    pub apb1rstr: VCell<u32>,
    pub ahbenr: VCell<u32>,
    pub apb2enr: VCell<u32>,
    pub apb1enr: VCell<u32>,
}

pub const RCC_APB2ENR_AFIOEN: u32 = 1 << 0;
pub const RCC_APB2ENR_IOPAEN: u32 = 1 << 2;
pub const RCC_APB2ENR_IOPBEN: u32 = 1 << 3;
pub const RCC_APB2ENR_SPI1EN: u32 = 1 << 12;
pub const RCC_APB1ENR_TIM2EN: u32 = 1 << 0;
pub const RCC_APB1ENR_USBEN: u32 = 1 << 23;

pub const RCC_CR_HSEON: u32 = 1 << 16;
pub const RCC_CR_HSERDY: u32 = 1 << 17;
pub const RCC_CR_PLLON: u32 = 1 << 24;
pub const RCC_CR_PLLRDY: u32 = 1 << 25;

const RCC_BASE: usize = 0x4002_1000;
pub fn rcc() -> &'static Rcc {
    unsafe { &*(RCC_BASE as *const Rcc) }
}

#[repr(C)]
pub struct Gpio {
    pub crl: VCell<u32>,
    pub crh: VCell<u32>,
    pub idr: VCell<u32>,
    pub odr: VCell<u32>,
    pub bsrr: VCell<u32>,
    pub brr: VCell<u32>,
    pub lckr: VCell<u32>,
}

const GPIOA_BASE: usize = 0x4001_0800;
const GPIOB_BASE: usize = 0x4001_0C00;

pub fn gpioa() -> &'static Gpio {
    unsafe { &*(GPIOA_BASE as *const Gpio) }
}
pub fn gpiob() -> &'static Gpio {
    unsafe { &*(GPIOB_BASE as *const Gpio) }
}

/// CNF/MODE encodings for the 4-bit-per-pin CRL/CRH fields (RM0008 9.2.1/2).
pub const CNF_MODE_INPUT_ANALOG: u32 = 0b00_00;
pub const CNF_MODE_INPUT_FLOATING: u32 = 0b01_00;
pub const CNF_MODE_INPUT_PUPD: u32 = 0b10_00;
pub const CNF_MODE_OUTPUT_GP_PUSHPULL_50MHZ: u32 = 0b00_11;
pub const CNF_MODE_OUTPUT_GP_OPENDRAIN_2MHZ: u32 = 0b01_01;
pub const CNF_MODE_OUTPUT_AF_PUSHPULL_50MHZ: u32 = 0b10_11;

/// Set the 4-bit CNF/MODE field for `pin` (0..16) to `value`, preserving
/// every other pin's configuration.
pub fn configure_pin(gpio: &Gpio, pin: u8, value: u32) {
    let reg = if pin < 8 { &gpio.crl } else { &gpio.crh };
    let shift = (pin % 8) * 4;
    let mask = 0xf_u32 << shift;
    let cur = reg.read();
    reg.write((cur & !mask) | ((value & 0xf) << shift));
}

#[repr(C)]
pub struct Afio {
    pub evcr: VCell<u32>,
    pub mapr: VCell<u32>,
    pub exticr: [VCell<u32>; 4],
}

const AFIO_BASE: usize = 0x4001_0000;
pub fn afio() -> &'static Afio {
    unsafe { &*(AFIO_BASE as *const Afio) }
}

#[repr(C)]
pub struct Exti {
    pub imr: VCell<u32>,
    pub emr: VCell<u32>,
    pub rtsr: VCell<u32>,
    pub ftsr: VCell<u32>,
    pub swier: VCell<u32>,
    pub pr: VCell<u32>,
}

const EXTI_BASE: usize = 0x4001_0400;
pub fn exti() -> &'static Exti {
    unsafe { &*(EXTI_BASE as *const Exti) }
}

#[repr(C)]
pub struct Spi {
    pub cr1: VCell<u32>,
    pub cr2: VCell<u32>,
    pub sr: VCell<u32>,
    pub dr: VCell<u32>,
    pub crcpr: VCell<u32>,
    pub rxcrcr: VCell<u32>,
    pub txcrcr: VCell<u32>,
}

pub const SPI_CR1_CPHA: u32 = 1 << 0;
pub const SPI_CR1_CPOL: u32 = 1 << 1;
pub const SPI_CR1_MSTR: u32 = 1 << 2;
pub const SPI_CR1_BR_DIV8: u32 = 0b010 << 3;
pub const SPI_CR1_SPE: u32 = 1 << 6;
pub const SPI_CR1_LSBFIRST: u32 = 1 << 7;
pub const SPI_CR1_SSI: u32 = 1 << 8;
pub const SPI_CR1_SSM: u32 = 1 << 9;
pub const SPI_CR1_DFF: u32 = 1 << 11;
pub const SPI_CR2_SSOE: u32 = 1 << 2;
pub const SPI_SR_RXNE: u32 = 1 << 0;
pub const SPI_SR_TXE: u32 = 1 << 1;

const SPI1_BASE: usize = 0x4001_3000;
pub fn spi1() -> &'static Spi {
    unsafe { &*(SPI1_BASE as *const Spi) }
}

#[repr(C)]
pub struct Tim2 {
    pub cr1: VCell<u32>,
    pub cr2: VCell<u32>,
    pub smcr: VCell<u32>,
    pub dier: VCell<u32>,
    pub sr: VCell<u32>,
    pub egr: VCell<u32>,
    pub ccmr1: VCell<u32>,
    pub ccmr2: VCell<u32>,
    pub ccer: VCell<u32>,
    pub cnt: VCell<u32>,
    pub psc: VCell<u32>,
    pub arr: VCell<u32>,
}

pub const TIM_CR1_CEN: u32 = 1 << 0;
pub const TIM_EGR_UG: u32 = 1 << 0;

const TIM2_BASE: usize = 0x4000_0000;
pub fn tim2() -> &'static Tim2 {
    unsafe { &*(TIM2_BASE as *const Tim2) }
}

/// NVIC ISER/ICPR are each banks of 32-bit words; STM32F103 only populates
/// the first bank (IRQ numbers 0..43 fit in 2 words, but we only ever
/// address the EXTI and USB lines, all < 32).
#[repr(C)]
pub struct Nvic {
    pub iser: [VCell<u32>; 2],
    _reserved0: [u32; 30],
    pub icer: [VCell<u32>; 2],
    _reserved1: [u32; 30],
    pub ispr: [VCell<u32>; 2],
    _reserved2: [u32; 30],
    pub icpr: [VCell<u32>; 2],
}

const NVIC_BASE: usize = 0xE000_E100;
pub fn nvic() -> &'static Nvic {
    unsafe { &*(NVIC_BASE as *const Nvic) }
}

pub const NVIC_USB_LP_CAN_RX0_IRQ: u32 = 20;
pub const NVIC_EXTI9_5_IRQ: u32 = 23;
pub const NVIC_USART1_IRQ: u32 = 37;
pub const NVIC_EXTI15_10_IRQ: u32 = 40;

/// Unmask `irq` at the NVIC. STM32F103's vector table and the rest of the
/// interrupt enable/priority dance are supplied by the firmware image that
/// links this crate in (spec.md's "startup code" exclusion); this is the one
/// piece of NVIC plumbing every component here needs directly.
pub fn enable_irq(irq: u32) {
    let n = nvic();
    n.iser[(irq / 32) as usize].write(1 << (irq % 32));
}

#[repr(C)]
pub struct Usart {
    pub sr: VCell<u32>,
    pub dr: VCell<u32>,
    pub brr: VCell<u32>,
    pub cr1: VCell<u32>,
    pub cr2: VCell<u32>,
    pub cr3: VCell<u32>,
    pub gtpr: VCell<u32>,
}

pub const USART_SR_TXE: u32 = 1 << 7;
pub const USART_SR_TC: u32 = 1 << 6;
pub const USART_CR1_TE: u32 = 1 << 3;
pub const USART_CR1_UE: u32 = 1 << 13;
pub const USART_CR1_TXEIE: u32 = 1 << 7;
pub const USART_CR1_TCIE: u32 = 1 << 6;

const USART1_BASE: usize = 0x4001_3800;
pub fn usart1() -> &'static Usart {
    unsafe { &*(USART1_BASE as *const Usart) }
}

/// USB full-speed device controller (C5/C6's register surface). `epr` holds
/// the eight mixed normal/toggle/write-1-to-clear endpoint control words;
/// the buffer descriptor table and per-endpoint buffers live in the
/// separate [`pma`] module's 512-byte SRAM window.
#[repr(C)]
pub struct Usb {
    pub epr: [VCell<u32>; 8],
    _reserved0: [u32; 8],
    pub cntr: VCell<u32>,
    pub istr: VCell<u32>,
    pub fnr: VCell<u32>,
    pub daddr: VCell<u32>,
    pub btable: VCell<u32>,
}

pub const USB_CNTR_FRES: u16 = 1 << 0;
pub const USB_CNTR_PDWN: u16 = 1 << 1;
pub const USB_CNTR_RESETM: u16 = 1 << 10;
pub const USB_CNTR_SUSPM: u16 = 1 << 11;
pub const USB_CNTR_WKUPM: u16 = 1 << 12;
pub const USB_CNTR_CTRM: u16 = 1 << 15;

pub const USB_ISTR_EP_ID_MASK: u16 = 0x0f;
pub const USB_ISTR_DIR: u16 = 1 << 4;
pub const USB_ISTR_RESET: u16 = 1 << 10;
pub const USB_ISTR_SOF: u16 = 1 << 9;
pub const USB_ISTR_WKUP: u16 = 1 << 13;
pub const USB_ISTR_SUSP: u16 = 1 << 12;
pub const USB_ISTR_CTR: u16 = 1 << 15;

pub const USB_DADDR_EF: u32 = 1 << 7;

const USB_BASE: usize = 0x4000_5C00;
pub fn usb() -> &'static Usb {
    unsafe { &*(USB_BASE as *const Usb) }
}

/// Start of the 512-byte packet memory area, from the CPU side. Every
/// 16-bit PMA cell is mapped at twice its natural offset (`PMA_BASE + 2*x`)
/// because the PMA's dual-port SRAM is accessed 16 bits at a time over a
/// 32-bit AHB bus; see [`crate::usb::hardware`].
pub const USB_PMA_BASE: usize = 0x4000_6000;
pub const USB_PMA_SIZE: usize = 512;
