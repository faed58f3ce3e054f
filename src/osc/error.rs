use std::string::FromUtf8Error;

use nom::error::{ErrorKind, FromExternalError, ParseError};

/// The error kinds a packet decode can produce.
///
/// A decode failure always drops the whole packet — there is no partial
/// tree to recover. Use [`crate::decode_traced`] to get a human-readable
/// trace of where in the recursive descent the failure happened.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
	#[error("truncated input: expected at least {expected} more byte(s), had {remaining}")]
	TruncatedInput { expected: usize, remaining: usize },
	#[error("string was not NUL-terminated before the end of the buffer")]
	MissingTerminator,
	#[error("address {0:?} does not begin with '/'")]
	MalformedAddress(String),
	#[error("type-tag string {0:?} does not begin with ','")]
	MalformedTypeTag(String),
	#[error("unknown argument type tag {0:?}")]
	UnknownArgType(char),
	#[error("bundle element declares size {declared} but only {remaining} byte(s) remain")]
	OversizedSubPacket { declared: usize, remaining: usize },
	#[error("reading OSC string as utf-8: {0}")]
	StringError(#[from] FromUtf8Error),
	#[error("error reading from buffer: {0:?}")]
	ReadError(ErrorKind),
	#[error("parser error at char: {0:?}")]
	BadChar(char)
}

impl<I> ParseError<I> for DecodeError {
	fn from_error_kind(_input: I, kind: ErrorKind) -> Self {
		Self::ReadError(kind)
	}
	fn append(_input: I, _kind: ErrorKind, other: Self) -> Self {
		other
	}

	fn from_char(_input: I, c: char) -> Self {
		Self::BadChar(c)
	}

	fn or(self, _other: Self) -> Self {
		self
	}
}

impl<I> FromExternalError<I, DecodeError> for DecodeError {
	fn from_external_error(_input: I, _kind: ErrorKind, e: DecodeError) -> Self {
		e
	}
}

pub type DecodeResult<T> = Result<T, DecodeError>;
