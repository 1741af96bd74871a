//! An in-memory, full-duplex loopback transport.
//!
//! Grounded on the original source's `test/include/loopback_io.h`, which
//! wires an IO object's own out-pipe directly back into its in-pipe. This
//! version generalizes that self-loop into a two-ended virtual null-modem
//! cable — [`LoopbackTransport::pair`] returns two [`Transport`]
//! endpoints, each of which reads what the other writes — so a primary and
//! a secondary session can be driven against each other without a real
//! serial port. It backs both this crate's own integration tests and the
//! `demos` binary.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::Transport;

struct Link {
	queue: Mutex<VecDeque<u8>>,
	closed: AtomicBool,
}

impl Link {
	fn new() -> Link {
		Link {
			queue: Mutex::new(VecDeque::new()),
			closed: AtomicBool::new(false),
		}
	}
}

/// One end of a [`LoopbackTransport::pair`].
pub struct LoopbackTransport {
	outbound: Arc<Link>,
	inbound: Arc<Link>,
}

impl LoopbackTransport {
	/// Build two connected endpoints: bytes written to `a` are read by `b`,
	/// and vice versa.
	pub fn pair() -> (LoopbackTransport, LoopbackTransport) {
		let a_to_b = Arc::new(Link::new());
		let b_to_a = Arc::new(Link::new());

		let a = LoopbackTransport {
			outbound: a_to_b.clone(),
			inbound: b_to_a.clone(),
		};
		let b = LoopbackTransport {
			outbound: b_to_a,
			inbound: a_to_b,
		};
		(a, b)
	}
}

impl Transport for LoopbackTransport {
	fn write(&self, bytes: &[u8]) -> io::Result<usize> {
		if self.outbound.closed.load(Ordering::Acquire) {
			return Ok(0);
		}
		self.outbound.queue.lock().unwrap().extend(bytes.iter().copied());
		Ok(bytes.len())
	}

	fn read_one(&self, byte: &mut u8) -> bool {
		match self.inbound.queue.lock().unwrap().pop_front() {
			Some(b) => {
				*byte = b;
				true
			}
			None => false,
		}
	}

	fn wait_readable(&self) -> bool {
		!self.inbound.queue.lock().unwrap().is_empty()
	}

	fn flush(&self) {
		self.outbound.queue.lock().unwrap().clear();
		self.inbound.queue.lock().unwrap().clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bytes_written_to_one_end_arrive_at_the_other() {
		let (a, b) = LoopbackTransport::pair();
		a.write(&[1, 2, 3]).unwrap();

		let mut byte = 0;
		assert!(b.read_one(&mut byte));
		assert_eq!(byte, 1);
		assert!(b.read_one(&mut byte));
		assert_eq!(byte, 2);
		assert!(b.read_one(&mut byte));
		assert_eq!(byte, 3);
		assert!(!b.read_one(&mut byte));
	}

	#[test]
	fn flush_clears_both_directions() {
		let (a, b) = LoopbackTransport::pair();
		a.write(&[9]).unwrap();
		b.write(&[8]).unwrap();
		a.flush();
		let mut byte = 0;
		assert!(!a.read_one(&mut byte));
		assert!(!b.read_one(&mut byte));
	}
}
