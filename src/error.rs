//! Error taxonomy for the firmware components this crate implements.
//!
//! Three classes, matching the three ways things go wrong in a device this
//! small: a mistake by the programmer that should never reach a built
//! image (`link_assert!`/[`crate::utils::unreachable`] already cover these
//! at the point of the mistake, so there is no `ProgrammerError` value
//! here — it never survives to be returned), a protocol violation the USB
//! host caused that must be answered with STALL, and a transient condition
//! a caller can legitimately retry.
//!
//! [`crate::utils::unreachable`] remains how bugs made by this crate's own
//! code are reported, not how callers of this module signal failure.

use core::fmt;

/// The host sent something this endpoint's logic can't satisfy: an
/// unsupported request, a descriptor index out of range, a class request
/// outside the declared interface. The only valid firmware response is
/// STALLing the endpoint.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ProtocolError;

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("protocol violation: endpoint stalled")
    }
}

/// A resource the caller needs isn't available *right now* but may be
/// shortly — not a protocol violation, not a bug. The sole instance today
/// is an IN endpoint whose TX buffer is still owned by the USB peripheral
/// (`STAT_TX` not `NAK`) when a report write is attempted.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TransientBusy {
    EndpointBusy,
}

impl fmt::Display for TransientBusy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransientBusy::EndpointBusy => f.write_str("endpoint TX buffer still owned by hardware"),
        }
    }
}

/// Result of writing a packet to an IN endpoint.
///
/// The original firmware overloaded the return value of
/// `usb_ep_write_packet` (0 = nothing written because busy, 0xFFFF = bad
/// length, anything else = bytes written) onto a single `uint16_t`. That
/// collapses three outcomes that callers must treat differently into one
/// number and a convention a reader has to remember. This type makes the
/// three outcomes distinct so a caller can `match` instead of comparing
/// against sentinels.
pub type WriteResult = Result<u16, WriteError>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WriteError {
    /// Requested length exceeds the endpoint's configured buffer size.
    TooLarge,
    Busy(TransientBusy),
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::TooLarge => f.write_str("packet length exceeds endpoint buffer size"),
            WriteError::Busy(b) => write!(f, "{b}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_result_distinguishes_busy_from_too_large() {
        let busy: WriteResult = Err(WriteError::Busy(TransientBusy::EndpointBusy));
        let too_large: WriteResult = Err(WriteError::TooLarge);
        assert_ne!(busy, too_large);
        assert_eq!(busy, Err(WriteError::Busy(TransientBusy::EndpointBusy)));
    }
}
