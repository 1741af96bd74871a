//! A subset implementation of HDLC (ISO/IEC 13239) in Normal Response Mode:
//! frame representation, wire codec, a thread-safe byte pipe, an I/O
//! coordinator generic over a pluggable transport, and primary/secondary
//! session state machines.
//!
//! ```
//! use hdlc_core::frame::{Frame, FrameType};
//! use hdlc_core::io::IoCore;
//! use hdlc_core::session::primary::Primary;
//! use hdlc_core::session::secondary::Secondary;
//! use hdlc_core::transport::loopback::LoopbackTransport;
//! use std::time::Duration;
//!
//! let (ta, tb) = LoopbackTransport::pair();
//! let primary = Primary::new(IoCore::new(ta, 1024).with_timeout(Duration::from_millis(200)), 1);
//! let secondary = Secondary::new(IoCore::new(tb, 1024).with_timeout(Duration::from_millis(200)), 1);
//!
//! std::thread::scope(|scope| {
//!     scope.spawn(|| primary.connect().unwrap());
//!     secondary.run_once().unwrap();
//! });
//! assert!(primary.status().is_connected());
//! # let _ = Frame::new(FrameType::Unset, 0, false);
//! ```

pub mod error;
pub mod frame;
pub mod io;
pub mod pipe;
pub mod serializer;
pub mod session;
pub mod transport;
pub mod types;

pub use error::{Error, Result};
pub use frame::{Frame, FrameType};
pub use types::ConnectionStatus;
