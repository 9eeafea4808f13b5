//! Endpoint-0 control-transfer state machine (C6), structured like an
//! H5-family USB stack's `ControlState` (a dedicated impl block mutating a
//! context struct owned by the top-level USB device) but driving the
//! explicit [`Phase`] enum and deferred-action queue §4.6/§9 call for,
//! against F103's separate `EPR`/PMA registers instead of that target's
//! combined `CHEPR`.

use crate::usb::UsbDevice;
use crate::usb::hardware::{self, EprWriter, STAT_STALL, STAT_VALID};
use crate::usb::types::{
    Phase, PendingAction, REQ_CLEAR_FEATURE, REQ_GET_CONFIGURATION, REQ_GET_DESCRIPTOR,
    REQ_GET_INTERFACE, REQ_GET_STATUS, REQ_SET_ADDRESS, REQ_SET_CONFIGURATION, REQ_SET_DESCRIPTOR,
    REQ_SET_FEATURE, REQ_SET_INTERFACE, REQ_SYNCH_FRAME, RequestOutcome, SetupHeader,
};

macro_rules! ctrl_dbgln {($($tt:tt)*) => {crate::dbgln!($($tt)*)};}
pub(crate) use ctrl_dbgln;

impl UsbDevice {
    /// Bus reset handler (spec.md §4.6): rewind the PMA cursor, clear
    /// `configured`, set up endpoint 0, enable the device at address 0.
    pub fn usb_initialize(&mut self) {
        self.alloc.reset();
        self.configured = false;
        self.phase = Phase::Idle;
        self.pending_action = None;
        self.tx_data = &[];
        self.tx_cursor = 0;

        hardware::setup_ep(
            self.usb,
            &mut self.alloc,
            0,
            hardware::EP_TYPE_CONTROL,
            self.max_packet0,
            true,
        );
        self.usb.daddr.write(0 | crate::pac::USB_DADDR_EF);
    }

    /// Endpoint-0 SETUP/OUT/IN transaction, dispatched by the top-level ISR
    /// loop based on ISTR's DIR bit and EPR's SETUP bit (spec.md §4.6).
    pub fn ep0_setup(&mut self, setup: SetupHeader) {
        self.setup = setup;
        self.tx_data = &[];
        self.tx_cursor = 0;

        let key = setup.request_type | setup.request;
        let outcome = self.dispatch_user_handlers(key, &setup);
        let outcome = match outcome {
            RequestOutcome::Handled => RequestOutcome::Handled,
            RequestOutcome::NotSupp => RequestOutcome::NotSupp,
            RequestOutcome::Defer => self.standard_request(&setup),
        };

        match outcome {
            RequestOutcome::Handled => self.begin_response(&setup),
            RequestOutcome::NotSupp => self.stall(),
            RequestOutcome::Defer => {
                ctrl_dbgln!("unhandled setup {:02x}/{:02x}", setup.request_type, setup.request);
                self.stall();
            }
        }
    }

    fn dispatch_user_handlers(&mut self, key: u8, setup: &SetupHeader) -> RequestOutcome {
        for i in 0..self.num_handlers {
            let slot = self.handlers[i].expect("populated below num_handlers");
            if key & slot.match_mask == slot.match_value & slot.match_mask {
                let outcome = (slot.handler)(self, setup);
                if outcome != RequestOutcome::Defer {
                    return outcome;
                }
            }
        }
        RequestOutcome::Defer
    }

    /// USB 2.0 §9.4 standard requests (spec.md §4.6 step 3/4).
    fn standard_request(&mut self, setup: &SetupHeader) -> RequestOutcome {
        match setup.request {
            REQ_GET_STATUS => {
                self.tx_data = &[0, 0];
                RequestOutcome::Handled
            }
            REQ_SET_ADDRESS => {
                self.pending_action = Some(PendingAction::SetAddress(setup.value_lo));
                RequestOutcome::Handled
            }
            REQ_GET_DESCRIPTOR => self.get_descriptor(setup),
            REQ_SET_CONFIGURATION => self.set_configuration(setup.value_lo),
            REQ_SET_INTERFACE => RequestOutcome::Handled,
            REQ_GET_INTERFACE => {
                self.tx_data = &[0];
                RequestOutcome::Handled
            }
            REQ_GET_CONFIGURATION => {
                self.tx_data = if self.configured { &[1] } else { &[0] };
                RequestOutcome::Handled
            }
            REQ_CLEAR_FEATURE | REQ_SET_FEATURE => RequestOutcome::Handled,
            REQ_SET_DESCRIPTOR | REQ_SYNCH_FRAME => RequestOutcome::NotSupp,
            _ => RequestOutcome::Defer,
        }
    }

    fn get_descriptor(&mut self, setup: &SetupHeader) -> RequestOutcome {
        match setup.value_hi {
            1 => {
                self.tx_data = self.device_desc;
                RequestOutcome::Handled
            }
            2 => {
                self.tx_data = self.config_desc;
                RequestOutcome::Handled
            }
            3 => {
                let idx = setup.value_lo as usize;
                match self.strings.get(idx) {
                    Some(s) => {
                        self.tx_data = s;
                        RequestOutcome::Handled
                    }
                    None => RequestOutcome::NotSupp,
                }
            }
            _ => RequestOutcome::Defer,
        }
    }

    fn set_configuration(&mut self, value: u8) -> RequestOutcome {
        if value == 0 {
            self.configured = false;
            return RequestOutcome::Handled;
        }
        if value != 1 {
            return RequestOutcome::NotSupp;
        }
        self.configured = true;
        if let Some(cb) = self.set_config_cb {
            cb(self, value);
        }
        RequestOutcome::Handled
    }

    /// Kick off the response phase for a handled request: no data means
    /// STATUS_IN (a ZLP ack), otherwise DATA_IN / LAST_DATA_IN depending
    /// on whether the whole response fits in one packet.
    fn begin_response(&mut self, setup: &SetupHeader) {
        let len = self.tx_data.len().min(setup.length as usize);
        self.tx_cursor = 0;
        if len == 0 {
            self.phase = Phase::StatusIn;
            hardware::ep_write_packet(self.usb, 0, &[]);
            return;
        }
        self.send_next_chunk(len);
    }

    fn send_next_chunk(&mut self, total: usize) {
        let remaining = total - self.tx_cursor;
        let chunk = remaining.min(self.max_packet0);
        hardware::ep_write_packet(self.usb, 0, &self.tx_data[self.tx_cursor..self.tx_cursor + chunk]);
        self.tx_cursor += chunk;
        self.phase = if chunk < self.max_packet0 || self.tx_cursor == total {
            Phase::LastDataIn
        } else {
            Phase::DataIn
        };
    }

    fn stall(&mut self) {
        self.phase = Phase::Stall;
        self.usb.set_stat_tx(0, STAT_STALL);
        self.usb.set_stat_rx(0, STAT_STALL);
    }

    /// CTR_TX on endpoint 0 (spec.md §4.6 data stage streaming).
    pub(crate) fn ep0_tx_done(&mut self) {
        self.usb.clear_ctr_tx(0);
        match self.phase {
            Phase::DataIn => {
                let total = self.tx_data.len().min(self.setup.length as usize);
                self.send_next_chunk(total);
            }
            Phase::LastDataIn => {
                self.phase = Phase::StatusOut;
                self.usb.set_stat_rx(0, STAT_VALID);
            }
            Phase::StatusIn => {
                self.phase = Phase::Idle;
                self.run_pending_action();
                self.usb.set_stat_rx(0, STAT_VALID);
            }
            _ => {}
        }
    }

    /// CTR_RX on endpoint 0, non-SETUP (status-stage ACK of a host OUT, or
    /// the end of a DATA_OUT transfer we don't currently use).
    pub(crate) fn ep0_rx_done(&mut self) {
        match self.phase {
            Phase::StatusOut => {
                self.phase = Phase::Idle;
                self.run_pending_action();
            }
            _ => {}
        }
        self.usb.clear_ctr_rx(0);
        self.usb.set_stat_rx(0, STAT_VALID);
    }

    /// Apply whatever was queued by [`PendingAction`] — only once the
    /// status stage has actually ACKed (spec.md §9).
    fn run_pending_action(&mut self) {
        match self.pending_action.take() {
            Some(PendingAction::SetAddress(addr)) => {
                self.usb.daddr.write(addr as u32 | crate::pac::USB_DADDR_EF);
                ctrl_dbgln!("address applied: {addr}");
            }
            Some(PendingAction::Restart { dpi, binterval }) => {
                self.restart_requested = Some((dpi, binterval));
            }
            None => {}
        }
    }
}
