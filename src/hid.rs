//! Mouse HID application (C7): descriptors, the HID-specific endpoint-0
//! request handlers, and the report generator that ties C3 (motion) and C4
//! (buttons) together into the 7-byte report endpoint 1 streams.
//!
//! Grounded in `examples/original_source/16-mouse/src/mouse.c`: the device/
//! config descriptor field values, the report descriptor byte array, and
//! `send_hid_report`'s button/delta packing are reproduced verbatim; the
//! registration dance (`hid_set_configuration`) is reshaped onto
//! [`crate::usb::UsbDevice`]'s handler-table API instead of libopencm3-style
//! free functions.

use crate::buttons;
use crate::error::WriteError;
use crate::gpio;
use crate::pac::{self, Afio, Exti, Gpio, Spi, Tim2};
use crate::paw3395::{self, Paw3395};
use crate::spi;
use crate::time;
use crate::usb::UsbDevice;
use crate::usb::hardware::EP_TYPE_INTERRUPT;
use crate::usb::types::{
    ConfigurationDesc, DeviceDesc, EndpointDesc, HidDesc, InterfaceDesc, REQ_GET_DESCRIPTOR,
    RequestOutcome, SetupHeader, TYPE_CONFIGURATION, TYPE_DEVICE, TYPE_HID, TYPE_HID_REPORT,
    TYPE_INTERFACE,
};

const USB_CLASS_HID: u8 = 3;
const HID_SUBCLASS_NONE: u8 = 0;
const HID_PROTOCOL_NONE: u8 = 0;

pub const EP1_ADDR: u8 = 0x81;
pub const REPORT_LEN: usize = 7;

/// PAW3395 nCS (see `mouse.c`'s `gpio_setup`: PA4).
const SENSOR_CS_PIN: u32 = 1 << 4;

/// Reproduced byte-for-byte from `mouse.c`'s `hid_mouse_report_descriptor`:
/// two buttons + padding in byte 0, X/Y/wheel as signed 16-bit relative axes.
pub const REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // USAGE_PAGE (Generic Desktop)
    0x09, 0x02, // USAGE (Mouse)
    0xa1, 0x01, // COLLECTION (Application)
    0x09, 0x01, //   USAGE (Pointer)
    0xa1, 0x00, //   COLLECTION (Physical)
    0x05, 0x09, //     USAGE_PAGE (Button)
    0x19, 0x01, //     USAGE_MINIMUM (Button 1)
    0x29, 0x02, //     USAGE_MAXIMUM (Button 2)
    0x15, 0x00, //     LOGICAL_MINIMUM (0)
    0x25, 0x01, //     LOGICAL_MAXIMUM (1)
    0x95, 0x02, //     REPORT_COUNT (2)
    0x75, 0x01, //     REPORT_SIZE (1)
    0x81, 0x02, //     INPUT (Data,Var,Abs)
    0x95, 0x01, //     REPORT_COUNT (1)
    0x75, 0x06, //     REPORT_SIZE (6)
    0x81, 0x01, //     INPUT (Cnst,Ary,Abs)
    0x05, 0x01, //     USAGE_PAGE (Generic Desktop)
    0x09, 0x30, //     USAGE (X)
    0x09, 0x31, //     USAGE (Y)
    0x09, 0x38, //     USAGE (Wheel)
    0x16, 0x01, 0x80, //     LOGICAL_MINIMUM (-32767)
    0x26, 0xff, 0x7f, //     LOGICAL_MAXIMUM (32767)
    0x95, 0x03, //     REPORT_COUNT (3)
    0x75, 0x10, //     REPORT_SIZE (16)
    0x81, 0x06, //     INPUT (Data,Var,Rel)
    0xc0, //   END_COLLECTION
    0x09, 0x3c, //   USAGE (Motion Wakeup)
    0xc0, // END_COLLECTION
];

static DEVICE_DESC: DeviceDesc = DeviceDesc {
    length: 18,
    descriptor_type: TYPE_DEVICE,
    usb: 0x0200,
    device_class: 0,
    device_sub_class: 0,
    device_protocol: 0,
    max_packet_size0: 64,
    vendor: 0x0483,
    product: 0x572B,
    device: 0x0200,
    i_manufacturer: 1,
    i_product: 2,
    i_serial: 3,
    num_configurations: 1,
};

#[repr(C, packed)]
struct ConfigBlock {
    config: ConfigurationDesc,
    if0: InterfaceDesc,
    if0_hid: HidDesc,
    if0_hid_ep: EndpointDesc,
}

const CONFIG_TOTAL_LEN: u16 = 9 + 9 + 9 + 7;

static CONFIG_BLOCK: ConfigBlock = ConfigBlock {
    config: ConfigurationDesc {
        length: 9,
        descriptor_type: TYPE_CONFIGURATION,
        total_length: CONFIG_TOTAL_LEN,
        num_interfaces: 1,
        configuration_value: 1,
        i_configuration: 0,
        attributes: 0x80,
        max_power: 0x32,
    },
    if0: InterfaceDesc {
        length: 9,
        descriptor_type: TYPE_INTERFACE,
        interface_number: 0,
        alternate_setting: 0,
        num_endpoints: 1,
        interface_class: USB_CLASS_HID,
        interface_sub_class: HID_SUBCLASS_NONE,
        interface_protocol: HID_PROTOCOL_NONE,
        i_interface: 0,
    },
    if0_hid: HidDesc {
        length: 9,
        descriptor_type: TYPE_HID,
        bcd_hid: 0x0111,
        country_code: 0,
        num_descriptors: 1,
        report_descriptor_type: TYPE_HID_REPORT,
        report_descriptor_length: REPORT_DESCRIPTOR.len() as u16,
    },
    if0_hid_ep: EndpointDesc {
        length: 7,
        descriptor_type: 5,
        endpoint_address: EP1_ADDR,
        attributes: 0x03, // INTERRUPT
        max_packet_size: REPORT_LEN as u16,
        interval: 1,
    },
};

const MFR_STR: [u8; 20] = crate::usb::string::string_descriptor::<20>("Hiiri Co.");
const PRODUCT_STR: [u8; 20] = crate::usb::string::string_descriptor::<20>("HID Mouse");
const SERIAL_STR: [u8; 10] = crate::usb::string::string_descriptor::<10>("1337");

pub static STRINGS: [&[u8]; 4] = [
    &crate::usb::string::LANGID_US,
    &MFR_STR,
    &PRODUCT_STR,
    &SERIAL_STR,
];

fn device_desc_bytes() -> &'static [u8] {
    unsafe { core::slice::from_raw_parts((&DEVICE_DESC as *const DeviceDesc).cast(), size_of::<DeviceDesc>()) }
}

fn config_desc_bytes() -> &'static [u8] {
    unsafe { core::slice::from_raw_parts((&CONFIG_BLOCK as *const ConfigBlock).cast(), size_of::<ConfigBlock>()) }
}

/// Build the device context for this application (spec.md §6's device/
/// product/vendor IDs, §4.7's endpoint-0 max packet size).
pub fn new_device() -> UsbDevice {
    UsbDevice::new(pac::usb(), 64, device_desc_bytes(), config_desc_bytes(), &STRINGS)
}

/// HID report-descriptor GET_DESCRIPTOR handler (`mouse.c`'s
/// `handle_hid_get_report_descriptor`): the standard dispatcher only knows
/// DEVICE/CONFIGURATION/STRING, so the HID REPORT descriptor is served by a
/// registered user handler instead.
pub fn get_report_descriptor(dev: &mut UsbDevice, setup: &SetupHeader) -> RequestOutcome {
    if setup.request_type != 0x81 || setup.request != REQ_GET_DESCRIPTOR || setup.value_hi != TYPE_HID_REPORT {
        return RequestOutcome::Defer;
    }
    dev.reply_with(REPORT_DESCRIPTOR);
    RequestOutcome::Handled
}

/// Vendor request 0x40/0x01 (spec.md §6): wValue carries the new DPI,
/// wIndex's low byte carries the new report-endpoint bInterval. Applied only
/// after the status stage ACKs, via the same deferred-action path SET_ADDRESS
/// uses (spec.md §9).
pub fn set_dpi_and_binterval(dev: &mut UsbDevice, setup: &SetupHeader) -> RequestOutcome {
    if setup.request_type != 0x40 || setup.request != 0x01 {
        return RequestOutcome::Defer;
    }
    dev.queue_restart(setup.value(), (setup.index & 0xff) as u8);
    dev.reply_with(&[]);
    RequestOutcome::Handled
}

/// SET_CONFIGURATION callback (`mouse.c`'s `hid_set_configuration`): bring
/// up the report endpoint, register the HID-specific handlers, and prime
/// the IN chain with the first report so the CTR_TX loop is self-sustaining
/// from here on.
pub fn configure(dev: &mut UsbDevice, _value: u8) {
    dev.setup_ep(EP1_ADDR, EP_TYPE_INTERRUPT, REPORT_LEN);
    dev.register_ep0_req_handler(0x81u8.wrapping_add(REQ_GET_DESCRIPTOR), 0xff, get_report_descriptor);
    dev.register_ep0_req_handler(0x40u8.wrapping_add(0x01), 0xff, set_dpi_and_binterval);
    dev.register_ep1_tx_handler(send_report);
    send_report(dev);
}

/// CTR_TX handler for endpoint 1 (`mouse.c`'s `send_hid_report`): burst-read
/// the sensor, pack buttons + delta into the 7-byte report, queue it.
/// A busy endpoint (`STAT_TX` not yet `NAK`) just skips this report — the
/// next CTR_TX on EP1 or the next SOF-driven poll tries again; a too-large
/// write would be this module's own bug, not a recoverable condition.
pub fn send_report(dev: &mut UsbDevice) {
    let sensor = Paw3395::new(pac::spi1(), pac::gpioa(), SENSOR_CS_PIN, pac::tim2());
    let mut burst = [0u8; paw3395::BURST_SIZE];
    sensor.motion_burst(&mut burst);
    let (dx, dy) = paw3395::burst_delta(&burst);

    let buttons = (buttons::R_CLICK.read() as u8) << 1 | (buttons::L_CLICK.read() as u8);
    let mut report = [0u8; REPORT_LEN];
    report[0] = buttons;
    report[1..3].copy_from_slice(&dx.to_le_bytes());
    report[3..5].copy_from_slice(&dy.to_le_bytes());

    match dev.write_packet(1, &report) {
        Ok(_) => {}
        Err(WriteError::Busy(_)) => {}
        Err(WriteError::TooLarge) => crate::utils::unreachable(),
    }
}

/// Board bring-up for everything this application owns directly: clocks for
/// the peripherals it uses, GPIO modes for the button/SPI pins, TIM2 as the
/// microsecond tick, EXTI button debouncing, SPI1, then the sensor itself
/// (`mouse.c`'s `clock_setup`/`gpio_setup`/.../`paw_init`/`paw_set_dpi`). USB
/// clock bring-up and the vector table remain the linking firmware's job.
pub fn init_board(gpioa: &Gpio, gpiob: &Gpio, afio: &Afio, exti: &Exti, spi: &Spi, tim: &Tim2) {
    pac::rcc().apb1enr.write(pac::rcc().apb1enr.read() | pac::RCC_APB1ENR_TIM2EN);
    pac::rcc().apb2enr.write(
        pac::rcc().apb2enr.read()
            | pac::RCC_APB2ENR_SPI1EN
            | pac::RCC_APB2ENR_IOPAEN
            | pac::RCC_APB2ENR_IOPBEN
            | pac::RCC_APB2ENR_AFIOEN,
    );

    pac::configure_pin(gpioa, 10, pac::CNF_MODE_INPUT_PUPD);
    gpio::set(gpioa, 1 << 10);
    pac::configure_pin(gpioa, 9, pac::CNF_MODE_INPUT_PUPD);
    gpio::set(gpioa, 1 << 9);
    pac::configure_pin(gpiob, 12, pac::CNF_MODE_INPUT_PUPD);
    gpio::set(gpiob, 1 << 12);
    pac::configure_pin(gpioa, 8, pac::CNF_MODE_INPUT_PUPD);
    gpio::set(gpioa, 1 << 8);

    pac::configure_pin(gpioa, 4, pac::CNF_MODE_OUTPUT_GP_PUSHPULL_50MHZ);
    gpio::set(gpioa, SENSOR_CS_PIN);
    pac::configure_pin(gpioa, 5, pac::CNF_MODE_OUTPUT_AF_PUSHPULL_50MHZ);
    pac::configure_pin(gpioa, 6, pac::CNF_MODE_INPUT_FLOATING);
    pac::configure_pin(gpioa, 7, pac::CNF_MODE_OUTPUT_AF_PUSHPULL_50MHZ);

    time::setup(tim);
    buttons::setup(exti, afio);
    spi::setup(spi);

    let sensor = Paw3395::new(spi, gpioa, SENSOR_CS_PIN, tim);
    sensor.init();
    sensor.set_dpi(800);
}
