//! Protocol-wide constants and small closed-set types that don't belong to
//! any single component.

/// Byte marking the start and end of every frame on the wire.
pub const FRAME_BOUNDARY: u8 = 0x7E;

/// Escape byte used by byte-stuffing; the following byte is XORed with
/// [`ESCAPE_XOR`] to recover its literal value.
pub const ESCAPE: u8 = 0x7D;

/// XOR mask applied to an escaped byte's literal value.
pub const ESCAPE_XOR: u8 = 0x20;

/// Bit position of the poll/final flag within the control byte.
pub const POLL_BIT: u8 = 0x10;

/// Minimum length, in bytes, of an unstuffed serialized frame: two boundary
/// bytes, address, control, and two FCS bytes.
pub const MIN_FRAME_LEN: usize = 6;

/// Default time a primary session waits for a final response before giving
/// up and reporting [`crate::error::Error::NoResponse`].
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 2000;

/// Connection state of an NRM session.
///
/// Grounded on the closed, `TryFrom`-validated enums in the teacher's
/// `misc` module (`Service`, `PowerLevel`): only `Connecting` and
/// `Connected` can be set explicitly through [`ConnectionStatus::set`] —
/// anything else, including `Disconnected` itself, coerces to
/// `Disconnected`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
	#[default]
	Disconnected,
	Connecting,
	Connected,
}

impl ConnectionStatus {
	pub fn is_connected(self) -> bool {
		matches!(self, ConnectionStatus::Connected)
	}
}
