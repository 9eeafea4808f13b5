//! USB descriptor and control-transfer types shared by C6/C7, grounded in
//! an H5-family USB stack's `usb/types.rs` (kept: packed descriptor structs,
//! the `SetupHeader` two-word transmute trick) and §3/§4.6 (added: the
//! explicit endpoint-0 [`Phase`] state machine and [`RequestOutcome`]).

#![allow(dead_code)]

#[repr(packed)]
pub struct DeviceDesc {
    pub length: u8,
    pub descriptor_type: u8,
    pub usb: u16,
    pub device_class: u8,
    pub device_sub_class: u8,
    pub device_protocol: u8,
    pub max_packet_size0: u8,
    pub vendor: u16,
    pub product: u16,
    pub device: u16,
    pub i_manufacturer: u8,
    pub i_product: u8,
    pub i_serial: u8,
    pub num_configurations: u8,
}
const _: () = assert!(size_of::<DeviceDesc>() == 18);

#[repr(packed)]
pub struct ConfigurationDesc {
    pub length: u8,
    pub descriptor_type: u8,
    pub total_length: u16,
    pub num_interfaces: u8,
    pub configuration_value: u8,
    pub i_configuration: u8,
    pub attributes: u8,
    pub max_power: u8,
}
const _: () = assert!(size_of::<ConfigurationDesc>() == 9);

#[repr(packed)]
pub struct InterfaceDesc {
    pub length: u8,
    pub descriptor_type: u8,
    pub interface_number: u8,
    pub alternate_setting: u8,
    pub num_endpoints: u8,
    pub interface_class: u8,
    pub interface_sub_class: u8,
    pub interface_protocol: u8,
    pub i_interface: u8,
}
const _: () = assert!(size_of::<InterfaceDesc>() == 9);

#[repr(packed)]
pub struct EndpointDesc {
    pub length: u8,
    pub descriptor_type: u8,
    pub endpoint_address: u8,
    pub attributes: u8,
    pub max_packet_size: u16,
    pub interval: u8,
}
const _: () = assert!(size_of::<EndpointDesc>() == 7);

#[repr(packed)]
pub struct HidDesc {
    pub length: u8,
    pub descriptor_type: u8,
    pub bcd_hid: u16,
    pub country_code: u8,
    pub num_descriptors: u8,
    pub report_descriptor_type: u8,
    pub report_descriptor_length: u16,
}
const _: () = assert!(size_of::<HidDesc>() == 9);

pub const TYPE_DEVICE: u8 = 1;
pub const TYPE_CONFIGURATION: u8 = 2;
pub const TYPE_STRING: u8 = 3;
pub const TYPE_INTERFACE: u8 = 4;
pub const TYPE_ENDPOINT: u8 = 5;
pub const TYPE_HID: u8 = 0x21;
pub const TYPE_HID_REPORT: u8 = 0x22;

/// USB 2.0 standard request codes used by C6's dispatcher (§9.4).
pub const REQ_GET_STATUS: u8 = 0x00;
pub const REQ_CLEAR_FEATURE: u8 = 0x01;
pub const REQ_SET_FEATURE: u8 = 0x03;
pub const REQ_SET_ADDRESS: u8 = 0x05;
pub const REQ_GET_DESCRIPTOR: u8 = 0x06;
pub const REQ_SET_DESCRIPTOR: u8 = 0x07;
pub const REQ_GET_CONFIGURATION: u8 = 0x08;
pub const REQ_SET_CONFIGURATION: u8 = 0x09;
pub const REQ_GET_INTERFACE: u8 = 0x0a;
pub const REQ_SET_INTERFACE: u8 = 0x0b;
pub const REQ_SYNCH_FRAME: u8 = 0x0c;

#[derive(Clone, Copy, Default)]
#[repr(C)]
pub struct SetupHeader {
    pub request_type: u8,
    pub request: u8,
    pub value_lo: u8,
    pub value_hi: u8,
    pub index: u16,
    pub length: u16,
}

impl SetupHeader {
    /// Build a setup header out of the 8 raw bytes read from an endpoint-0
    /// RX area (spec.md §4.6 step 1).
    pub fn from_bytes(b: &[u8; 8]) -> SetupHeader {
        SetupHeader {
            request_type: b[0],
            request: b[1],
            value_lo: b[2],
            value_hi: b[3],
            index: u16::from_le_bytes([b[4], b[5]]),
            length: u16::from_le_bytes([b[6], b[7]]),
        }
    }

    pub fn value(&self) -> u16 {
        u16::from_le_bytes([self.value_lo, self.value_hi])
    }
}

/// What a user endpoint-0 request handler, or the standard-request
/// dispatcher, decided to do with a SETUP packet (spec.md §4.6 step 2 and
/// §7's handler propagation policy).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RequestOutcome {
    /// Fully handled; streaming state has already been set up if needed.
    Handled,
    /// Not our request; try the next matching handler, then the standard
    /// handlers.
    Defer,
    /// Recognized but invalid; stall endpoint 0 immediately.
    NotSupp,
}

/// Endpoint-0 control-transfer phase (spec.md §3/§4.6's exact state list).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Phase {
    #[default]
    Idle,
    DataIn,
    DataOut,
    LastDataIn,
    LastDataOut,
    StatusIn,
    StatusOut,
    Stall,
}

/// A pending action queued from inside a control-transfer completion
/// callback and consumed only after the status stage ACKs (spec.md §9,
/// "vendor-request-driven re-enumeration"). `SetAddress` also goes through
/// this path since the USB spec requires applying the new address only
/// after the status stage completes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PendingAction {
    SetAddress(u8),
    Restart { dpi: u16, binterval: u8 },
}
