//! The secondary (slave) side of an NRM session: it never initiates an
//! exchange, only reacts to frames addressed to it.
//!
//! Grounded on `lifx_core::udp::manager::Manager::handle_message`, whose
//! `match msg.get_message_type() { ... }` dispatch is generalized here into
//! a `HashMap<FrameType, Handler>` registry, so callers can override or add
//! to the default command handlers without touching the dispatch loop
//! itself.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::error::Result;
use crate::frame::{Frame, FrameType};
use crate::io::IoCore;
use crate::session::LinkState;
use crate::transport::Transport;
use crate::types::ConnectionStatus;

/// A handler reacts to one incoming [`FrameType`] and optionally produces a
/// response frame (address/sequence fields are filled in by the dispatcher
/// before it's sent — a handler only decides the type, poll/final bit, and
/// payload).
pub type Handler = Box<dyn Fn(&Frame, &LinkState) -> Option<Frame> + Send + Sync>;

/// A secondary-role NRM session.
pub struct Secondary<T: Transport> {
	io: IoCore<T>,
	link: Arc<LinkState>,
	address: u8,
	handlers: Mutex<HashMap<FrameType, Handler>>,
}

impl<T: Transport> Secondary<T> {
	pub fn new(io: IoCore<T>, address: u8) -> Secondary<T> {
		let secondary = Secondary {
			io,
			link: Arc::new(LinkState::new()),
			address,
			handlers: Mutex::new(HashMap::new()),
		};
		secondary.register(FrameType::SetNormalResponseMode, Box::new(handle_snrm));
		secondary.register(FrameType::DiscRd, Box::new(handle_disc));
		secondary.register(FrameType::Test, Box::new(handle_test));
		secondary.register(FrameType::Information, Box::new(handle_information));
		secondary
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

	/// Install or replace the handler for `kind`.
	pub fn register(&self, kind: FrameType, handler: Handler) {
		self.handlers.lock().unwrap().insert(kind, handler);
	}

	/// Block for one incoming frame and dispatch it, replying if the
	/// matched handler produced a response. Returns `false` on a receive
	/// timeout (nothing to dispatch); propagates the handler's own errors,
	/// if any, through [`Error::FailedToSend`] when the reply can't be
	/// queued.
	pub fn run_once(&self) -> Result<bool> {
		let Some(frame) = self.io.recv_frame() else {
			return Ok(false);
		};

		if frame.address() != self.address {
			debug!(got = frame.address(), want = self.address, "ignoring frame for another address");
			return Ok(true);
		}

		let handler = self.handlers.lock().unwrap().remove(&frame.kind());
		let Some(handler) = handler else {
			warn!(kind = %frame.kind(), "no handler registered, ignoring");
			return Ok(true);
		};

		let response = handler(&frame, &self.link);
		// Handlers are looked up by value so dispatch never holds the
		// registry lock while running one; put it back afterwards.
		self.handlers.lock().unwrap().entry(frame.kind()).or_insert(handler);

		if let Some(mut response) = response {
			response.set_address(self.address);
			self.io.send_frame(&response)?;
		}
		Ok(true)
	}

	/// Drive [`Secondary::run_once`] until the transport stops producing
	/// frames (`recv_frame` times out), propagating the first error.
	pub fn run_until_idle(&self) -> Result<()> {
		while self.run_once()? {}
		Ok(())
	}
}

fn handle_snrm(frame: &Frame, link: &LinkState) -> Option<Frame> {
	link.set_status(ConnectionStatus::Connected);
	Some(Frame::new(FrameType::UnnumberedAcknowledgment, frame.address(), true))
}

fn handle_disc(frame: &Frame, link: &LinkState) -> Option<Frame> {
	link.set_status(ConnectionStatus::Disconnected);
	Some(Frame::new(FrameType::UnnumberedAcknowledgment, frame.address(), true))
}

fn handle_test(frame: &Frame, _link: &LinkState) -> Option<Frame> {
	Some(Frame::with_payload(FrameType::Test, frame.address(), true, frame.payload()))
}

/// Default Information handler: validates `N(S)`, advances `N(R)`, and
/// acknowledges with RR. Does not surface the payload anywhere — replace
/// this handler via [`Secondary::register`] to actually consume data.
fn handle_information(frame: &Frame, link: &LinkState) -> Option<Frame> {
	if !link.status().is_connected() {
		let mut dm = Frame::new(FrameType::SarmDm, frame.address(), true);
		dm.set_poll(true);
		return Some(dm);
	}

	let expected = link.recv_seq();
	if frame.send_seq() != expected {
		let mut rej = Frame::new(FrameType::Reject, frame.address(), true);
		rej.set_recv_seq(expected);
		return Some(rej);
	}

	link.advance_recv_seq();
	let mut rr = Frame::new(FrameType::ReceiveReady, frame.address(), true);
	rr.set_recv_seq(link.recv_seq());
	Some(rr)
}
