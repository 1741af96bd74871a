use thiserror::Error;

/// Status/error codes returned by the public HDLC API.
///
/// `Busy` is an internal signal used by [`crate::session::primary::Primary::send_command`]
/// to mean "keep waiting for a final response"; it is never returned from a
/// public call.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error {
	/// The operation completed without error. Not actually constructed as an
	/// `Err` — kept in the enum because the source protocol treats success
	/// as a value in the same closed set as its failures.
	#[error("success")]
	Success,

	#[error("invalid parameters")]
	InvalidParameters,

	#[error("invalid response")]
	InvalidResponse,

	#[error("invalid sequence number")]
	InvalidSequence,

	#[error("invalid address")]
	InvalidAddress,

	#[error("invalid request")]
	InvalidRequest,

	#[error("peer reported disconnect mode")]
	ConnectionError,

	#[error("failed to send frame")]
	FailedToSend,

	#[error("no response within timeout")]
	NoResponse,

	/// Internal: a response arrived but doesn't conclude the exchange yet.
	#[error("busy")]
	Busy,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
