//! In-memory representation of a single HDLC frame.
//!
//! A `Frame` is a short-lived value object: type, address, poll/final bit,
//! the two modulo-8 sequence counters, and an optional payload. It carries
//! no framing or checksum bytes — see [`crate::serializer`] for the wire
//! format.

use std::fmt;

/// The closed set of HDLC frame types this library understands.
///
/// Short ISO names are used everywhere in code; the long names from the
/// original protocol text (`SET_NORMAL_RESPONSE_MODE`, ...) only ever
/// appear in [`FrameType::long_name`], for logging.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FrameType {
	/// Marks a frame that failed validation; carries no other valid field.
	Unset,

	/// Information (`I`).
	Information,

	// --- supervisory ---
	ReceiveReady,
	ReceiveNotReady,
	Reject,
	SelectiveReject,

	// --- unnumbered (command/response pairs that share a wire code are
	// named with both roles, e.g. `SarmDm`: SARM is the command sent by a
	// secondary, DM is the matching disconnect-mode response) ---
	UnnumberedInformation,
	SetAsyncBalancedMode,
	UnnumberedAcknowledgment,
	SarmDm,
	SimRim,
	DiscRd,
	UnnumberedPoll,
	Reset,
	ExchangeIdentification,
	FrameReject,
	SetNormalResponseMode,
	Test,
}

impl FrameType {
	/// Long-form name used only for log messages, per the original source's
	/// two vocabularies (short ISO names are canonical everywhere else).
	pub fn long_name(self) -> &'static str {
		use FrameType::*;
		match self {
			Unset => "UNSET",
			Information => "INFORMATION",
			ReceiveReady => "RECEIVE_READY",
			ReceiveNotReady => "RECEIVE_NOT_READY",
			Reject => "REJECT",
			SelectiveReject => "SELECTIVE_REJECT",
			UnnumberedInformation => "UNNUMBERED_INFORMATION",
			SetAsyncBalancedMode => "SET_ASYNCHRONOUS_BALANCED_MODE",
			UnnumberedAcknowledgment => "UNNUMBERED_ACKNOWLEDGMENT",
			SarmDm => "SET_ASYNCHRONOUS_RESPONSE_MODE/DISCONNECT_MODE",
			SimRim => "SET_INITIALIZATION_MODE/REQUEST_INITIALIZATION_MODE",
			DiscRd => "DISCONNECT/REQUEST_DISCONNECT",
			UnnumberedPoll => "UNNUMBERED_POLL",
			Reset => "RESET",
			ExchangeIdentification => "EXCHANGE_IDENTIFICATION",
			FrameReject => "FRAME_REJECT",
			SetNormalResponseMode => "SET_NORMAL_RESPONSE_MODE",
			Test => "TEST",
		}
	}

	/// Control-bits category: `I` frames.
	pub fn is_information(self) -> bool {
		matches!(self, FrameType::Information)
	}

	/// Control-bits pattern `01`.
	pub fn is_supervisory(self) -> bool {
		use FrameType::*;
		matches!(self, ReceiveReady | ReceiveNotReady | Reject | SelectiveReject)
	}

	/// Control-bits pattern `11`.
	pub fn is_unnumbered(self) -> bool {
		use FrameType::*;
		matches!(
			self,
			UnnumberedInformation
				| SetAsyncBalancedMode
				| UnnumberedAcknowledgment
				| SarmDm
				| SimRim
				| DiscRd
				| UnnumberedPoll
				| Reset
				| ExchangeIdentification
				| FrameReject
				| SetNormalResponseMode
				| Test
		)
	}

	/// Types that carry a payload on the wire: `I`, `UI`, `TEST`.
	pub fn is_payload_type(self) -> bool {
		matches!(
			self,
			FrameType::Information | FrameType::UnnumberedInformation | FrameType::Test
		)
	}
}

impl fmt::Display for FrameType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let short = match self {
			FrameType::Unset => "UNSET",
			FrameType::Information => "I",
			FrameType::ReceiveReady => "RR",
			FrameType::ReceiveNotReady => "RNR",
			FrameType::Reject => "REJ",
			FrameType::SelectiveReject => "SREJ",
			FrameType::UnnumberedInformation => "UI",
			FrameType::SetAsyncBalancedMode => "SABM",
			FrameType::UnnumberedAcknowledgment => "UA",
			FrameType::SarmDm => "SARM_DM",
			FrameType::SimRim => "SIM_RIM",
			FrameType::DiscRd => "DISC_RD",
			FrameType::UnnumberedPoll => "UP",
			FrameType::Reset => "RSET",
			FrameType::ExchangeIdentification => "XID",
			FrameType::FrameReject => "FRMR",
			FrameType::SetNormalResponseMode => "SNRM",
			FrameType::Test => "TEST",
		};
		f.write_str(short)
	}
}

/// A single HDLC frame.
///
/// Equality (used by loopback tests) follows the rule in the protocol
/// design: type, poll, payload, and the sequence numbers that are actually
/// meaningful for that type must all agree. `recv_seq` is ignored on
/// unnumbered frames; `send_seq` is only compared for Information frames.
#[derive(Debug, Clone)]
pub struct Frame {
	kind: FrameType,
	address: u8,
	poll: bool,
	recv_seq: u8,
	send_seq: u8,
	payload: Vec<u8>,
}

impl Frame {
	/// An empty/unset frame, used as a sentinel for failed decodes.
	pub fn unset() -> Frame {
		Frame {
			kind: FrameType::Unset,
			address: 0,
			poll: false,
			recv_seq: 0,
			send_seq: 0,
			payload: Vec::new(),
		}
	}

	/// A frame with type and flags only, no payload.
	pub fn new(kind: FrameType, address: u8, poll: bool) -> Frame {
		Frame {
			kind,
			address,
			poll,
			recv_seq: 0,
			send_seq: 0,
			payload: Vec::new(),
		}
	}

	/// A frame with type, flags, and payload copied from `payload`.
	pub fn with_payload(kind: FrameType, address: u8, poll: bool, payload: &[u8]) -> Frame {
		Frame {
			kind,
			address,
			poll,
			recv_seq: 0,
			send_seq: 0,
			payload: payload.to_vec(),
		}
	}

	pub fn kind(&self) -> FrameType {
		self.kind
	}

	pub fn set_kind(&mut self, kind: FrameType) {
		self.kind = kind;
	}

	pub fn address(&self) -> u8 {
		self.address
	}

	pub fn set_address(&mut self, address: u8) {
		self.address = address;
	}

	pub fn is_empty(&self) -> bool {
		self.kind == FrameType::Unset
	}

	pub fn is_information(&self) -> bool {
		self.kind.is_information()
	}

	pub fn is_supervisory(&self) -> bool {
		self.kind.is_supervisory()
	}

	pub fn is_unnumbered(&self) -> bool {
		self.kind.is_unnumbered()
	}

	pub fn is_payload_type(&self) -> bool {
		self.kind.is_payload_type()
	}

	/// Poll bit on a command, final bit on a response — same storage.
	pub fn poll(&self) -> bool {
		self.poll
	}

	pub fn set_poll(&mut self, poll: bool) {
		self.poll = poll;
	}

	/// Alias for [`Frame::poll`] read from the responder's point of view.
	pub fn is_final(&self) -> bool {
		self.poll
	}

	pub fn recv_seq(&self) -> u8 {
		self.recv_seq
	}

	/// Masks to the low three bits (modulo 8), per the protocol's sequence
	/// numbering.
	pub fn set_recv_seq(&mut self, sequence: u8) {
		self.recv_seq = sequence & 0x7;
	}

	pub fn send_seq(&self) -> u8 {
		self.send_seq
	}

	pub fn set_send_seq(&mut self, sequence: u8) {
		self.send_seq = sequence & 0x7;
	}

	pub fn payload(&self) -> &[u8] {
		&self.payload
	}

	pub fn set_payload(&mut self, payload: &[u8]) {
		self.payload = payload.to_vec();
	}

	pub fn payload_size(&self) -> usize {
		self.payload.len()
	}

	pub fn has_payload(&self) -> bool {
		!self.payload.is_empty()
	}

	pub fn payload_iter(&self) -> std::slice::Iter<'_, u8> {
		self.payload.iter()
	}
}

impl PartialEq for Frame {
	fn eq(&self, other: &Self) -> bool {
		if self.kind != other.kind || self.poll != other.poll || self.payload != other.payload {
			return false;
		}
		if !self.kind.is_unnumbered() && self.recv_seq != other.recv_seq {
			return false;
		}
		if self.kind.is_information() && self.send_seq != other.send_seq {
			return false;
		}
		true
	}
}

impl Eq for Frame {}

impl fmt::Display for Frame {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"Frame {{ type: {}, addr: {:#04x}, p/f: {}, n(r): {}, n(s): {}, len: {} }}",
			self.kind,
			self.address,
			self.poll,
			self.recv_seq,
			self.send_seq,
			self.payload.len()
		)
	}
}
