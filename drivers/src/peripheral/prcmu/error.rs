use core::fmt;

/// Why a mailbox operation did not produce a successful round trip.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CallError {
    /// The coprocessor had not consumed the previous request on this
    /// mailbox within the busy-wait bound.
    Busy,
    /// No acknowledgement arrived before the caller's deadline.
    Timeout,
    /// The acknowledgement answered a different service/command than the
    /// request, or its payload did not decode.
    ProtocolMismatch,
    /// The coprocessor answered with a header outside the message catalog.
    UnknownMessage,
    /// Bad mailbox id, a `(service, command)` pair the mailbox does not
    /// carry in this direction, or an oversized payload. Nothing was sent.
    InvalidRequest,
    /// The coprocessor acknowledged with a non-zero status.
    Rejected(u8),
    /// The coprocessor stopped consuming requests. Latched; every later
    /// operation fails with this.
    Fault,
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::Busy => f.write_str("mailbox busy"),
            CallError::Timeout => f.write_str("no acknowledgement before deadline"),
            CallError::ProtocolMismatch => f.write_str("acknowledgement does not match request"),
            CallError::UnknownMessage => f.write_str("unknown message"),
            CallError::InvalidRequest => f.write_str("invalid request"),
            CallError::Rejected(status) => write!(f, "rejected with status {status:#04x}"),
            CallError::Fault => f.write_str("coprocessor firmware not responding"),
        }
    }
}

impl core::error::Error for CallError {}
