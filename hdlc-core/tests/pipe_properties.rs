//! Property-based tests for [`FramePipe`]'s incremental `boundary_count`
//! invariant under arbitrary interleavings of writes and reads.

use hdlc_core::pipe::FramePipe;
use hdlc_core::types::FRAME_BOUNDARY;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
	Write(Vec<u8>),
	Read,
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
	prop_oneof![
		prop::collection::vec(any::<u8>(), 0..8).prop_map(Op::Write),
		Just(Op::Read),
	]
}

fn count_boundaries(bytes: &std::collections::VecDeque<u8>) -> usize {
	bytes.iter().filter(|&&b| b == FRAME_BOUNDARY).count()
}

proptest! {
	/// Property 5: boundary_count always equals the number of 0x7E bytes
	/// actually buffered, regardless of the write/read interleaving.
	#[test]
	fn prop_boundary_count_matches_buffer_contents(ops in prop::collection::vec(arbitrary_op(), 0..64)) {
		let pipe = FramePipe::new(64);
		let mut shadow: std::collections::VecDeque<u8> = std::collections::VecDeque::new();

		for op in ops {
			match op {
				Op::Write(bytes) => {
					if bytes.len() <= pipe.space() {
						pipe.write_slice(&bytes);
						shadow.extend(bytes);
					}
				}
				Op::Read => {
					if !pipe.empty() {
						let byte = pipe.read();
						prop_assert_eq!(Some(byte), shadow.pop_front());
					}
				}
			}
			prop_assert_eq!(pipe.frame_count() * 2 + (pipe.partial_frame() as usize), count_boundaries(&shadow));
		}
	}

	/// Property 6: a successful read_frame() strictly shrinks the pipe and
	/// drops exactly two boundary bytes.
	#[test]
	fn prop_read_frame_shrinks_pipe_by_two_boundaries(
		junk in prop::collection::vec(any::<u8>().prop_filter("no boundary", |b| *b != FRAME_BOUNDARY), 0..16),
		body in prop::collection::vec(any::<u8>().prop_filter("no boundary", |b| *b != FRAME_BOUNDARY), 0..32),
	) {
		let pipe = FramePipe::new(256);
		pipe.write_slice(&junk);
		pipe.write(FRAME_BOUNDARY);
		pipe.write_slice(&body);
		pipe.write(FRAME_BOUNDARY);

		let before_size = pipe.size();
		let frame = pipe.read_frame();
		prop_assert!(!frame.is_empty());
		prop_assert!(pipe.size() < before_size);
		prop_assert_eq!(before_size - pipe.size(), frame.len());
	}
}
