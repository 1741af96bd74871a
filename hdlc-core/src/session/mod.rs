//! Session state machines built on top of [`crate::io::IoCore`].
//!
//! [`primary::Primary`] drives the link (connect, test, send a command and
//! wait for its final response); [`secondary::Secondary`] reacts to frames
//! addressed to it. Both share [`LinkState`], which owns the connection
//! status and the two modulo-8 sequence counters.

pub mod primary;
pub mod secondary;

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Mutex;

use crate::types::ConnectionStatus;

/// Connection status and sequence-number bookkeeping shared by both session
/// roles.
///
/// Grounded on `original_source/hdlc/include/hdlc/session.h`'s `set_status`,
/// which resets both sequence counters to zero whenever the link transitions
/// away from `Connected` (any renegotiation starts sequencing over), and
/// otherwise accepts only `Connecting`/`Connected` as the coerced value —
/// anything else (including redundantly setting `Disconnected`) collapses
/// to `Disconnected`.
pub struct LinkState {
	status: Mutex<ConnectionStatus>,
	send_seq: AtomicU8,
	recv_seq: AtomicU8,
}

impl LinkState {
	pub(crate) fn new() -> LinkState {
		LinkState {
			status: Mutex::new(ConnectionStatus::Disconnected),
			send_seq: AtomicU8::new(0),
			recv_seq: AtomicU8::new(0),
		}
	}

	pub fn status(&self) -> ConnectionStatus {
		*self.status.lock().unwrap()
	}

	/// Coerce to `wanted`: only `Connecting`/`Connected` pass through
	/// unchanged; anything else becomes `Disconnected`. Dropping out of
	/// `Connected` resets both sequence counters.
	pub fn set_status(&self, wanted: ConnectionStatus) {
		let coerced = match wanted {
			ConnectionStatus::Connecting | ConnectionStatus::Connected => wanted,
			ConnectionStatus::Disconnected => ConnectionStatus::Disconnected,
		};
		let mut current = self.status.lock().unwrap();
		if *current == ConnectionStatus::Connected && coerced != ConnectionStatus::Connected {
			self.send_seq.store(0, Ordering::Relaxed);
			self.recv_seq.store(0, Ordering::Relaxed);
		}
		*current = coerced;
	}

	pub fn send_seq(&self) -> u8 {
		self.send_seq.load(Ordering::Relaxed)
	}

	pub fn recv_seq(&self) -> u8 {
		self.recv_seq.load(Ordering::Relaxed)
	}

	/// Advance `send_seq` by one (mod 8) and return the value it held
	/// *before* advancing, i.e. the `N(S)` to stamp on the frame just sent.
	pub fn advance_send_seq(&self) -> u8 {
		self.send_seq
			.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |seq| Some((seq + 1) & 0x7))
			.expect("update fn always returns Some")
	}

	/// Advance `recv_seq` by one (mod 8) after accepting an in-sequence
	/// Information frame.
	pub fn advance_recv_seq(&self) -> u8 {
		self.recv_seq
			.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |seq| Some((seq + 1) & 0x7))
			.expect("update fn always returns Some")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn dropping_out_of_connected_resets_sequences() {
		let link = LinkState::new();
		link.set_status(ConnectionStatus::Connected);
		link.advance_send_seq();
		link.advance_recv_seq();
		assert_eq!(link.send_seq(), 1);

		link.set_status(ConnectionStatus::Disconnected);
		assert_eq!(link.send_seq(), 0);
		assert_eq!(link.recv_seq(), 0);
	}

	#[test]
	fn advance_send_seq_wraps_modulo_eight() {
		let link = LinkState::new();
		for expected in 0..8 {
			assert_eq!(link.advance_send_seq(), expected);
		}
		assert_eq!(link.send_seq(), 0);
	}
}
