//! USB Full-Speed device stack entry point (C5/C6), playing the role the
//! teacher's `usb.rs` plays for its own USB target: owns the single
//! process-wide device context, dispatches ISTR events, and exposes the
//! init/start/stop lifecycle a firmware main loop drives.

pub mod control;
pub mod hardware;
pub mod string;
pub mod types;

use crate::gpio;
use crate::pac::{self, Gpio, Usb};
use crate::utils::nothing;
use hardware::{EprWriter, PmaAllocator};
use types::{Phase, PendingAction, RequestOutcome, SetupHeader};

pub(crate) use control::ctrl_dbgln;

pub const MAX_HANDLERS: usize = 4;

pub type UserHandler = fn(&mut UsbDevice, &SetupHeader) -> RequestOutcome;

#[derive(Clone, Copy)]
pub struct HandlerSlot {
    pub match_value: u8,
    pub match_mask: u8,
    pub handler: UserHandler,
}

/// The one process-wide USB device context (spec.md §3). Created once at
/// boot, mutated only from USB-ISR context (and, transitively, from the
/// callbacks it invokes), never destroyed.
pub struct UsbDevice {
    usb: &'static Usb,
    alloc: PmaAllocator,
    max_packet0: usize,
    ep_tx_size: [usize; 8],

    pub(crate) phase: Phase,
    pub(crate) setup: SetupHeader,
    tx_data: &'static [u8],
    tx_cursor: usize,
    pending_action: Option<PendingAction>,

    pub(crate) configured: bool,

    handlers: [Option<HandlerSlot>; MAX_HANDLERS],
    num_handlers: usize,
    set_config_cb: Option<fn(&mut UsbDevice, u8)>,

    device_desc: &'static [u8],
    config_desc: &'static [u8],
    strings: &'static [&'static [u8]],

    /// Set by the vendor bInterval-change request; consumed by the
    /// foreground loop after the status stage ACKs (spec.md §9).
    pub restart_requested: Option<(u16, u8)>,

    /// Installed by C7's SET_CONFIGURATION callback; invoked on every IN
    /// CTR for endpoint 1 to keep the HID report chain going.
    ep1_tx_handler: Option<fn(&mut UsbDevice)>,
}

impl UsbDevice {
    pub fn new(
        usb: &'static Usb,
        max_packet0: usize,
        device_desc: &'static [u8],
        config_desc: &'static [u8],
        strings: &'static [&'static [u8]],
    ) -> Self {
        Self {
            usb,
            alloc: PmaAllocator::new(),
            max_packet0,
            ep_tx_size: [0; 8],
            phase: Phase::Idle,
            setup: SetupHeader::default(),
            tx_data: &[],
            tx_cursor: 0,
            pending_action: None,
            configured: false,
            handlers: [None; MAX_HANDLERS],
            num_handlers: 0,
            set_config_cb: None,
            device_desc,
            config_desc,
            strings,
            restart_requested: None,
            ep1_tx_handler: None,
        }
    }

    /// Register a user endpoint-0 request handler, matched against
    /// `(bmRequestType + bRequest) & mask == value & mask` (spec.md §3's
    /// "up to N user endpoint-0 request handlers" and §4.6 step 2).
    pub fn register_ep0_req_handler(&mut self, match_value: u8, match_mask: u8, handler: UserHandler) {
        link_assert_has_room(self.num_handlers);
        self.handlers[self.num_handlers] = Some(HandlerSlot {
            match_value,
            match_mask,
            handler,
        });
        self.num_handlers += 1;
    }

    pub fn register_set_config_callback(&mut self, cb: fn(&mut UsbDevice, u8)) {
        self.set_config_cb = Some(cb);
    }

    pub fn register_ep1_tx_handler(&mut self, cb: fn(&mut UsbDevice)) {
        self.ep1_tx_handler = Some(cb);
    }

    pub fn setup_ep(&mut self, addr: u8, ep_type: u32, max_size: usize) {
        let ep = hardware::parse_ep_addr(addr);
        hardware::setup_ep(self.usb, &mut self.alloc, addr, ep_type, max_size, false);
        self.ep_tx_size[ep.number] = max_size;
    }

    /// Queue `data` as the next IN packet on `ep` (spec.md §9's resolution
    /// of the original overloaded-sentinel return: busy and too-large are
    /// now distinct [`crate::error::WriteError`] variants instead of both
    /// folding onto one magic number).
    pub fn write_packet(&self, ep: usize, data: &[u8]) -> crate::error::WriteResult {
        use crate::error::{TransientBusy, WriteError};

        if data.len() > self.ep_tx_size[ep] {
            return Err(WriteError::TooLarge);
        }
        let epr = self.usb.epr[ep].read();
        if hardware::stat_tx(epr) == hardware::STAT_VALID {
            return Err(WriteError::Busy(TransientBusy::EndpointBusy));
        }
        hardware::ep_write_packet(self.usb, ep, data);
        Ok(data.len() as u16)
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Set the data a registered handler wants sent back during this
    /// transfer's response phase (spec.md §4.6 step 2 — called from a
    /// handler before it returns [`RequestOutcome::Handled`]).
    pub fn reply_with(&mut self, data: &'static [u8]) {
        self.tx_data = data;
    }

    /// Queue a vendor-request-driven restart, applied once the status stage
    /// ACKs (spec.md §9).
    pub fn queue_restart(&mut self, dpi: u16, binterval: u8) {
        self.pending_action = Some(PendingAction::Restart { dpi, binterval });
    }

    /// Power up the USB peripheral: bring up the `48 MHz`-derived
    /// peripheral clock (an external collaborator's responsibility), force
    /// re-enumeration by pulling D+ low for a moment (RM0008's bluepill
    /// trick — there is no internal D+ pull-up on this silicon), then hand
    /// D+/D- back to the USB peripheral and unmask its interrupts.
    ///
    /// Grounded in `examples/original_source/14-usbhid/src/usb.c`'s
    /// `usb_start` (see its note 1 for why the D+ toggle is needed at all).
    pub fn start(&mut self, gpioa: &Gpio) {
        pac::rcc().apb1enr.write(pac::rcc().apb1enr.read() & !pac::RCC_APB1ENR_USBEN);

        pac::configure_pin(gpioa, 12, pac::CNF_MODE_OUTPUT_GP_OPENDRAIN_2MHZ);
        gpio::clear(gpioa, 1 << 12);
        for _ in 0..800_000u32 {
            nothing();
        }
        gpio::set(gpioa, 1 << 12);

        pac::rcc().apb1enr.write(pac::rcc().apb1enr.read() | pac::RCC_APB1ENR_USBEN);

        self.usb.cntr.write(0);
        self.usb.btable.write(0);
        self.usb.istr.write(0);
        self.usb.cntr.write(
            (pac::USB_CNTR_RESETM | pac::USB_CNTR_CTRM | pac::USB_CNTR_SUSPM | pac::USB_CNTR_WKUPM) as u32,
        );

        pac::enable_irq(pac::NVIC_USB_LP_CAN_RX0_IRQ);
    }

    pub fn stop(&mut self) {
        self.usb.cntr.write(0);
        self.usb.istr.write(0);
        self.usb.cntr.write(pac::USB_CNTR_FRES as u32);
        self.usb.cntr.write(0);
        self.usb.cntr.write((pac::USB_CNTR_PDWN | pac::USB_CNTR_FRES) as u32);
        pac::rcc().apb1enr.write(pac::rcc().apb1enr.read() & !pac::RCC_APB1ENR_USBEN);
    }

    /// Main ISTR dispatch (spec.md §4.6/§5: RESET short-circuits the rest
    /// of the same dispatch, CTR may fire for several endpoints in one
    /// ISR entry).
    pub fn handle_event(&mut self) {
        let istr = self.usb.istr.read() as u16;

        if istr & pac::USB_ISTR_RESET != 0 {
            self.usb.istr.write(!pac::USB_ISTR_RESET as u32);
            self.usb_initialize();
            return;
        }

        if istr & pac::USB_ISTR_CTR != 0 {
            self.ctr(istr);
        }

        if istr & pac::USB_ISTR_SUSP != 0 {
            self.usb.istr.write(!pac::USB_ISTR_SUSP as u32);
        }
        if istr & pac::USB_ISTR_WKUP != 0 {
            self.usb.istr.write(!pac::USB_ISTR_WKUP as u32);
        }
        if istr & pac::USB_ISTR_SOF != 0 {
            self.usb.istr.write(!pac::USB_ISTR_SOF as u32);
        }
    }

    fn ctr(&mut self, istr: u16) {
        let ep = (istr & pac::USB_ISTR_EP_ID_MASK) as usize;

        if istr & pac::USB_ISTR_DIR != 0 {
            let epr = self.usb.epr[ep].read();
            if epr & hardware::EPR_SETUP != 0 {
                let mut raw = [0u8; 8];
                hardware::ep_read_packet(self.usb, ep, &mut raw);
                let setup = SetupHeader::from_bytes(&raw);
                if ep == 0 {
                    self.ep0_setup(setup);
                } else {
                    self.usb.clear_ctr_rx(ep);
                }
            } else if ep == 0 {
                self.ep0_rx_done();
            } else {
                self.usb.clear_ctr_rx(ep);
            }
        } else {
            if ep == 0 {
                self.ep0_tx_done();
            } else {
                self.usb.clear_ctr_tx(ep);
                if ep == 1 {
                    if let Some(cb) = self.ep1_tx_handler {
                        cb(self);
                    }
                }
            }
        }
    }
}

fn link_assert_has_room(num_handlers: usize) {
    crate::link_assert!(num_handlers < MAX_HANDLERS);
}
