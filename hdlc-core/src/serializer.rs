//! Encoding and decoding between [`Frame`] values and raw byte sequences:
//! control-byte packing, byte-stuffing, and the frame-check sequence.
//!
//! None of these functions panic on malformed input — a frame that fails to
//! parse decodes to [`Frame::unset`]; serializing a well-formed `Frame`
//! always succeeds. This mirrors the teacher's own `pack`/`unpack` pair in
//! `lifx_core::msg::RawMessage`, generalized with byte-stuffing and a
//! recoverable (not panicking) decode path.

use byteorder::{LittleEndian, WriteBytesExt};
use crc::{Crc, CRC_16_IBM_3740};

use crate::frame::{Frame, FrameType};
use crate::types::{ESCAPE, ESCAPE_XOR, FRAME_BOUNDARY, MIN_FRAME_LEN, POLL_BIT};

/// CRC-CCITT (poly `0x1021`, init `0xFFFF`, no reflection, no final xor) —
/// exactly the catalog entry `oxidecomputer-zmodem2` reaches for via the
/// `crc` crate for its own wire checksum.
const FCS: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// Unnumbered-frame wire codes. Bit layout per type: `MMM 0 MM 11` with the
/// poll bit (`0x10`) OR'd in separately at encode time. The concrete M-bit
/// assignment is this implementation's own choice (the spec only fixes the
/// bit *positions*, not a value table) — see DESIGN.md.
const UNNUMBERED_CODES: &[(FrameType, u8)] = &[
	(FrameType::UnnumberedInformation, 0x03),
	(FrameType::SetAsyncBalancedMode, 0x07),
	(FrameType::UnnumberedAcknowledgment, 0x0B),
	(FrameType::SarmDm, 0x0F),
	(FrameType::SimRim, 0x23),
	(FrameType::DiscRd, 0x27),
	(FrameType::UnnumberedPoll, 0x2B),
	(FrameType::Reset, 0x2F),
	(FrameType::ExchangeIdentification, 0x43),
	(FrameType::FrameReject, 0x47),
	(FrameType::SetNormalResponseMode, 0x4B),
	(FrameType::Test, 0x4F),
];

fn unnumbered_code(kind: FrameType) -> Option<u8> {
	UNNUMBERED_CODES.iter().find(|(t, _)| *t == kind).map(|(_, c)| *c)
}

fn unnumbered_type(code: u8) -> Option<FrameType> {
	UNNUMBERED_CODES.iter().find(|(_, c)| *c == code).map(|(t, _)| *t)
}

/// Supervisory low-4-bit codes, per the worked example in the design:
/// `RR=0x1, RNR=0x9, REJ=0x5, SREJ=0xD`.
fn supervisory_low4(kind: FrameType) -> Option<u8> {
	match kind {
		FrameType::ReceiveReady => Some(0x1),
		FrameType::ReceiveNotReady => Some(0x9),
		FrameType::Reject => Some(0x5),
		FrameType::SelectiveReject => Some(0xD),
		_ => None,
	}
}

fn supervisory_type(low4: u8) -> Option<FrameType> {
	match low4 {
		0x1 => Some(FrameType::ReceiveReady),
		0x9 => Some(FrameType::ReceiveNotReady),
		0x5 => Some(FrameType::Reject),
		0xD => Some(FrameType::SelectiveReject),
		_ => None,
	}
}

/// Encode a frame's control byte (§4.2).
fn control_byte(frame: &Frame) -> u8 {
	let poll_bit = if frame.poll() { POLL_BIT } else { 0 };

	if frame.is_information() {
		(frame.recv_seq() << 5) | poll_bit | (frame.send_seq() << 1)
	} else if let Some(low4) = supervisory_low4(frame.kind()) {
		(frame.recv_seq() << 5) | poll_bit | low4
	} else {
		// Unnumbered: code already carries bit4 cleared and the low `11` bits.
		unnumbered_code(frame.kind()).unwrap_or(0) | poll_bit
	}
}

/// Decode a control byte into `(type, poll, send_seq, recv_seq)`. Unknown
/// unnumbered codes decode to [`FrameType::Unset`].
fn decode_control(control: u8) -> (FrameType, bool, u8, u8) {
	let poll = (control & POLL_BIT) != 0;
	let send_seq = (control >> 1) & 0x7;
	let recv_seq = (control >> 5) & 0x7;

	let kind = if control & 1 == 0 {
		FrameType::Information
	} else if control & 0b11 == 0b01 {
		supervisory_type(control & 0x0F).unwrap_or(FrameType::Unset)
	} else {
		unnumbered_type(control & !POLL_BIT).unwrap_or(FrameType::Unset)
	};

	(kind, poll, send_seq, recv_seq)
}

/// Compute the FCS over `address || control || payload` (i.e. everything
/// between, but not including, the two boundary bytes and the FCS itself).
fn fcs(body: &[u8]) -> u16 {
	FCS.checksum(body)
}

/// Serialize a frame to its unstuffed wire representation:
/// `0x7E || address || control || payload? || fcs_lo || fcs_hi || 0x7E`.
///
/// Serialization of a well-formed [`Frame`] never fails.
pub fn serialize(frame: &Frame) -> Vec<u8> {
	let control = control_byte(frame);
	let payload: &[u8] = if frame.is_payload_type() { frame.payload() } else { &[] };

	let mut body = Vec::with_capacity(2 + payload.len());
	body.push(frame.address());
	body.push(control);
	body.extend_from_slice(payload);

	let crc = fcs(&body);

	let mut out = Vec::with_capacity(body.len() + 4);
	out.push(FRAME_BOUNDARY);
	out.extend_from_slice(&body);
	out.write_u16::<LittleEndian>(crc).expect("writing to a Vec never fails");
	out.push(FRAME_BOUNDARY);
	out
}

/// Deserialize an unstuffed wire sequence into a [`Frame`]. Returns
/// [`Frame::unset`] if the length, boundary bytes, or FCS don't check out —
/// the serializer never panics on malformed input.
pub fn deserialize(buffer: &[u8]) -> Frame {
	if buffer.len() < MIN_FRAME_LEN {
		return Frame::unset();
	}
	if buffer[0] != FRAME_BOUNDARY || buffer[buffer.len() - 1] != FRAME_BOUNDARY {
		return Frame::unset();
	}

	let body = &buffer[1..buffer.len() - 1];
	let (body, fcs_bytes) = body.split_at(body.len() - 2);
	let expected = fcs(body);
	let actual = u16::from_le_bytes([fcs_bytes[0], fcs_bytes[1]]);
	if expected != actual {
		return Frame::unset();
	}

	let address = body[0];
	let control = body[1];
	let (kind, poll, send_seq, recv_seq) = decode_control(control);

	if kind == FrameType::Unset {
		return Frame::unset();
	}

	let payload = if kind.is_payload_type() { &body[2..] } else { &[] };

	let mut f = Frame::with_payload(kind, address, poll, payload);
	f.set_send_seq(send_seq);
	f.set_recv_seq(recv_seq);
	f
}

/// Byte-stuff every byte of `frame` except its two boundary bytes: each
/// `0x7E`/`0x7D` becomes `0x7D, byte ^ 0x20`.
pub fn escape(frame: &[u8]) -> Vec<u8> {
	if frame.len() < 2 {
		return frame.to_vec();
	}
	let body = &frame[1..frame.len() - 1];
	let extra = body.iter().filter(|&&b| b == FRAME_BOUNDARY || b == ESCAPE).count();

	let mut out = Vec::with_capacity(frame.len() + extra);
	out.push(FRAME_BOUNDARY);
	for &byte in body {
		if byte == FRAME_BOUNDARY || byte == ESCAPE {
			out.push(ESCAPE);
			out.push(byte ^ ESCAPE_XOR);
		} else {
			out.push(byte);
		}
	}
	out.push(FRAME_BOUNDARY);
	out
}

/// Reverse [`escape`]. The pending-escape flag lives entirely on this call's
/// stack — re-implementations of the original source must not hoist it to
/// function-level static state (see the design notes on the source's latent
/// cross-call bug).
pub fn descape(buffer: &[u8]) -> Vec<u8> {
	let mut out = Vec::with_capacity(buffer.len());
	let mut escaped = false;
	for &byte in buffer {
		if escaped {
			out.push(byte ^ ESCAPE_XOR);
			escaped = false;
		} else if byte == ESCAPE {
			escaped = true;
		} else {
			out.push(byte);
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::frame::FrameType;

	#[test]
	fn information_round_trip_scenario_a() {
		let mut f = Frame::with_payload(
			FrameType::Information,
			0x11,
			true,
			&[1, 2, 3, FRAME_BOUNDARY, ESCAPE, 4],
		);
		f.set_recv_seq(1);
		f.set_send_seq(2);

		let wire = serialize(&f);
		assert_eq!(wire.len(), 12);
		assert_eq!(wire[0], FRAME_BOUNDARY);
		assert_eq!(wire[wire.len() - 1], FRAME_BOUNDARY);
		assert_eq!(wire[1], 0x11);
		assert_eq!(wire[2], 0x34);

		let escaped = escape(&wire);
		assert_eq!(escaped.len(), 14);
		assert_eq!(&escaped[6..8], &[ESCAPE, 0x5E]);
		assert_eq!(&escaped[8..10], &[ESCAPE, 0x5D]);

		let round_tripped = deserialize(&descape(&escaped));
		assert_eq!(round_tripped, f);
	}

	#[test]
	fn supervisory_control_byte_scenario_b() {
		let mut f = Frame::new(FrameType::ReceiveReady, 0x05, true);
		f.set_recv_seq(3);
		let wire = serialize(&f);
		assert_eq!(wire[2], 0x71);
	}

	#[test]
	fn corrupted_fcs_yields_unset_scenario_f() {
		let f = Frame::with_payload(FrameType::Information, 0x02, false, &[9, 9, 9]);
		let mut wire = serialize(&f);
		let payload_index = 3;
		wire[payload_index] ^= 0xFF;
		assert!(deserialize(&wire).is_empty());
	}

	#[test]
	fn dangling_escape_decodes_to_unset() {
		let mut wire = serialize(&Frame::new(FrameType::UnnumberedAcknowledgment, 1, true));
		wire.push(ESCAPE);
		let descaped = descape(&wire);
		assert!(deserialize(&descaped).is_empty());
	}

	#[test]
	fn escape_then_descape_is_identity_without_boundary_bytes_inside() {
		let body = vec![1u8, 2, 3, 4, 5];
		let mut frame = vec![FRAME_BOUNDARY];
		frame.extend_from_slice(&body);
		frame.push(FRAME_BOUNDARY);
		assert_eq!(descape(&escape(&frame)), frame);
	}

	#[test]
	fn too_short_buffer_is_unset() {
		assert!(deserialize(&[FRAME_BOUNDARY, 0, 0, 0, FRAME_BOUNDARY]).is_empty());
	}

	#[test]
	fn missing_boundary_bytes_is_unset() {
		let mut wire = serialize(&Frame::new(FrameType::SetNormalResponseMode, 1, false));
		wire[0] = 0x00;
		assert!(deserialize(&wire).is_empty());
	}

	#[test]
	fn unknown_unnumbered_code_is_unset() {
		// bit4 cleared, low2 = 11, but an M-pattern not in our table.
		let garbage_control = 0b111_0_11_11u8;
		let (kind, ..) = decode_control(garbage_control);
		assert_eq!(kind, FrameType::Unset);
	}

	#[test]
	fn serialize_always_opens_and_closes_with_boundary() {
		for &(kind, _) in UNNUMBERED_CODES {
			let f = Frame::new(kind, 7, false);
			let wire = serialize(&f);
			assert_eq!(wire.first(), Some(&FRAME_BOUNDARY));
			assert_eq!(wire.last(), Some(&FRAME_BOUNDARY));
		}
	}
}
