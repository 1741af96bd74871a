//! Drives a primary and a secondary session against each other over an
//! in-memory [`LoopbackTransport`] pair, the way `better_day_dusk` drives a
//! `lifx_core::udp::Manager` against real bulbs on the network.

use std::thread;
use std::time::Duration;

use hdlc_core::io::IoCore;
use hdlc_core::session::primary::Primary;
use hdlc_core::session::secondary::Secondary;
use hdlc_core::transport::loopback::LoopbackTransport;

const ADDRESS: u8 = 1;
const PIPE_CAPACITY: usize = 4096;
const RESPONSE_TIMEOUT: Duration = Duration::from_millis(500);

fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt::init();

	let (primary_transport, secondary_transport) = LoopbackTransport::pair();
	let primary = Primary::new(
		IoCore::new(primary_transport, PIPE_CAPACITY).with_timeout(RESPONSE_TIMEOUT),
		ADDRESS,
	);
	let secondary = Secondary::new(
		IoCore::new(secondary_transport, PIPE_CAPACITY).with_timeout(RESPONSE_TIMEOUT),
		ADDRESS,
	);

	let secondary_loop = thread::scope(|scope| -> anyhow::Result<()> {
		scope.spawn(|| {
			secondary.run_once().expect("SNRM handling should not fail");
			secondary.run_once().expect("TEST handling should not fail");
			for _ in 0..3 {
				secondary.run_once().expect("Information handling should not fail");
			}
		});

		primary.connect()?;
		println!("connected: {:?}", primary.status());

		let echoed = primary.test(b"are you there")?;
		println!("test echo: {:?}", String::from_utf8_lossy(&echoed));

		for seq in 0..3u8 {
			let response = primary.send_command(format!("message {seq}").as_bytes())?;
			println!("command {seq} acked by {}", response.kind());
		}

		Ok(())
	});

	secondary_loop
}
