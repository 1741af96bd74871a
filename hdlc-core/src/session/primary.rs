//! The primary (master) side of an NRM session: it owns the link, initiates
//! every exchange, and polls secondaries for data.
//!
//! Grounded on `lifx_core::udp::manager::Manager::discover`/`refresh`, which
//! drives the conversation from one side and blocks on a bounded wait for
//! the peer's reply; generalized here into the NRM command/final-response
//! shape (§4.5, §4.6).

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::frame::{Frame, FrameType};
use crate::io::IoCore;
use crate::session::LinkState;
use crate::transport::Transport;
use crate::types::ConnectionStatus;

/// A primary-role NRM session addressing exactly one secondary.
pub struct Primary<T: Transport> {
	io: IoCore<T>,
	link: LinkState,
	address: u8,
}

impl<T: Transport> Primary<T> {
	pub fn new(io: IoCore<T>, address: u8) -> Primary<T> {
		Primary {
			io,
			link: LinkState::new(),
			address,
		}
	}

	pub fn status(&self) -> ConnectionStatus {
		self.link.status()
	}

	pub fn send_seq(&self) -> u8 {
		self.link.send_seq()
	}

	pub fn recv_seq(&self) -> u8 {
		self.link.recv_seq()
	}

	/// Send SNRM and wait for the secondary's UA (connect) or DM (refusal).
	pub fn connect(&self) -> Result<()> {
		self.link.set_status(ConnectionStatus::Connecting);
		let frame = Frame::new(FrameType::SetNormalResponseMode, self.address, true);
		self.io.send_frame(&frame)?;

		let response = self.io.recv_frame().ok_or(Error::NoResponse)?;
		if response.address() != self.address {
			warn!(got = response.address(), want = self.address, "connect response from unexpected address");
			self.link.set_status(ConnectionStatus::Disconnected);
			return Err(Error::InvalidAddress);
		}

		match response.kind() {
			FrameType::UnnumberedAcknowledgment => {
				self.link.set_status(ConnectionStatus::Connected);
				debug!(address = self.address, "connected");
				Ok(())
			}
			FrameType::SarmDm => {
				self.link.set_status(ConnectionStatus::Disconnected);
				Err(Error::ConnectionError)
			}
			_ => {
				self.link.set_status(ConnectionStatus::Disconnected);
				Err(Error::InvalidResponse)
			}
		}
	}

	/// Send DISC and wait for UA.
	pub fn disconnect(&self) -> Result<()> {
		let frame = Frame::new(FrameType::DiscRd, self.address, true);
		self.io.send_frame(&frame)?;
		let response = self.io.recv_frame().ok_or(Error::NoResponse)?;
		self.link.set_status(ConnectionStatus::Disconnected);
		match response.kind() {
			FrameType::UnnumberedAcknowledgment => Ok(()),
			_ => Err(Error::InvalidResponse),
		}
	}

	/// Send a TEST frame carrying `payload` and return the secondary's
	/// echoed payload. Unnumbered: does not touch either sequence counter.
	/// Per §4.5, `test` calls `send_command`'s own response classification,
	/// so a `SARM_DM` reply here is handled identically to one received
	/// while sending a command: `ConnectionError`, link forced `Disconnected`.
	pub fn test(&self, payload: &[u8]) -> Result<Vec<u8>> {
		let frame = Frame::with_payload(FrameType::Test, self.address, true, payload);
		self.io.send_frame(&frame)?;
		let response = self.io.recv_frame().ok_or(Error::NoResponse)?;
		match self.accept_response(&response, None)? {
			Some(final_frame) if final_frame.kind() == FrameType::Test => Ok(final_frame.payload().to_vec()),
			_ => Err(Error::InvalidResponse),
		}
	}

	/// Send `payload` as an Information frame and block for the secondary's
	/// final response, retransmitting on REJ.
	///
	/// This primary verifies the secondary's `N(R)` against the sequence it
	/// just sent and treats a mismatch as [`Error::InvalidSequence`] — an
	/// extension beyond the bare wire format, deliberately left open by the
	/// design and resolved here in favor of catching a desynced peer early.
	pub fn send_command(&self, payload: &[u8]) -> Result<Frame> {
		if !self.link.status().is_connected() {
			return Err(Error::InvalidRequest);
		}

		loop {
			let send_seq = self.link.send_seq();
			let mut frame = Frame::with_payload(FrameType::Information, self.address, true, payload);
			frame.set_send_seq(send_seq);
			frame.set_recv_seq(self.link.recv_seq());
			self.io.send_frame(&frame)?;

			let response = self.io.recv_frame().ok_or(Error::NoResponse)?;
			if response.address() != self.address {
				continue;
			}

			match self.accept_response(&response, Some(send_seq))? {
				Some(final_frame) => return Ok(final_frame),
				None => continue,
			}
		}
	}

	/// Classifies one response frame against the exchange just initiated.
	/// `Ok(Some(frame))` concludes it (§4.5's canonical success is a final
	/// `UA`; an Information exchange's is `RR`/`RNR`/`I`; `test`'s is the
	/// echoed `TEST`); `Ok(None)` means "retry" (`REJ`); `Err` aborts it.
	///
	/// `sent_seq` is `None` for unnumbered exchanges (`test`), which carry
	/// no `N(S)`/`N(R)` to verify.
	fn accept_response(&self, response: &Frame, sent_seq: Option<u8>) -> Result<Option<Frame>> {
		match response.kind() {
			FrameType::Reject => {
				debug!(expected = response.recv_seq(), "peer rejected, retransmitting");
				Ok(None)
			}
			FrameType::SarmDm => {
				self.link.set_status(ConnectionStatus::Disconnected);
				Err(Error::ConnectionError)
			}
			FrameType::UnnumberedAcknowledgment | FrameType::Test => Ok(Some(response.clone())),
			FrameType::ReceiveReady | FrameType::ReceiveNotReady | FrameType::Information => {
				let Some(sent_seq) = sent_seq else {
					return Err(Error::InvalidResponse);
				};
				let expected = (sent_seq + 1) & 0x7;
				if response.recv_seq() != expected {
					return Err(Error::InvalidSequence);
				}
				self.link.advance_send_seq();
				if response.kind() == FrameType::Information {
					self.link.advance_recv_seq();
				}
				Ok(Some(response.clone()))
			}
			_ => Err(Error::InvalidResponse),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::transport::loopback::LoopbackTransport;
	use std::time::Duration;

	fn paired() -> (IoCore<LoopbackTransport>, IoCore<LoopbackTransport>) {
		let (ta, tb) = LoopbackTransport::pair();
		(
			IoCore::new(ta, 1024).with_timeout(Duration::from_millis(200)),
			IoCore::new(tb, 1024).with_timeout(Duration::from_millis(200)),
		)
	}

	#[test]
	fn connect_times_out_with_no_peer() {
		let (io, _peer) = paired();
		let primary = Primary::new(io, 1);
		assert_eq!(primary.connect(), Err(Error::NoResponse));
		assert_eq!(primary.status(), ConnectionStatus::Disconnected);
	}

	#[test]
	fn connect_succeeds_when_peer_answers_ua() {
		let (io, peer) = paired();
		let primary = Primary::new(io, 1);

		std::thread::scope(|scope| {
			scope.spawn(|| {
				primary.connect().unwrap();
			});
			let snrm = peer.recv_frame().expect("snrm should arrive");
			assert_eq!(snrm.kind(), FrameType::SetNormalResponseMode);
			let ua = Frame::new(FrameType::UnnumberedAcknowledgment, 1, true);
			peer.send_frame(&ua).unwrap();
		});

		assert_eq!(primary.status(), ConnectionStatus::Connected);
	}

	#[test]
	fn send_command_rejects_mismatched_recv_seq() {
		let (io, peer) = paired();
		let primary = Primary::new(io, 1);
		primary.link.set_status(ConnectionStatus::Connected);

		let result = std::thread::scope(|scope| {
			let handle = scope.spawn(|| primary.send_command(b"hi"));
			let _info = peer.recv_frame().unwrap();
			let mut bogus = Frame::new(FrameType::ReceiveReady, 1, true);
			bogus.set_recv_seq(5);
			peer.send_frame(&bogus).unwrap();
			handle.join().unwrap()
		});

		assert_eq!(result, Err(Error::InvalidSequence));
	}
}
