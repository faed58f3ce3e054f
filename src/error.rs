use std::io;

use crate::osc::DecodeError;

/// The top-level error type for anything that owns a socket. Uses
/// `thiserror`'s derive in place of the hand-written `Display`/`Error`
/// impls a plain enum would otherwise need.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
	#[error("socket error: {0}")]
	Io(#[from] io::Error),
	#[error("protocol error: {0}")]
	Osc(#[from] DecodeError)
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
