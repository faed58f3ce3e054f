use std::fmt;

use nom::{
	number::complete::{be_f32, be_i32, be_u32},
	Offset
};

use super::{
	error::{DecodeError, DecodeResult},
	Element, OscBundle, OscMessage, TimeTag
};

/// Common MTU-ish size, used to size the server's receive buffer. `decode`
/// itself accepts any length its caller hands it; callers with larger
/// datagrams can size their own buffer accordingly.
pub const MTU: usize = 8192;

/// An accumulating, human-readable trace of a decode attempt.
///
/// Cheap on the happy path: an empty `Vec` never allocates, and nothing is
/// pushed unless a decode step actually fails.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Trace(Vec<String>);

impl Trace {
	fn new() -> Self {
		Trace(Vec::new())
	}

	fn log(&mut self, context: &str, message: impl fmt::Display) {
		self.0.push(format!("in {context}: {message}"));
	}

	/// `true` if nothing was logged — the common case on a successful decode.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// The logged lines, oldest first.
	pub fn lines(&self) -> &[String] {
		&self.0
	}
}

impl fmt::Display for Trace {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for line in &self.0 {
			writeln!(f, "{line}")?;
		}
		Ok(())
	}
}

/// Decodes one OSC packet (a message or a bundle) from a single UDP
/// datagram's payload.
///
/// On success, every byte of `bytes` has been copied into the returned tree
/// — the caller may drop or reuse `bytes` immediately. On failure, no
/// partial tree is ever returned: decoding either produces a complete
/// `Element` or an error, never a half-built one.
///
/// # Examples
///
/// ```
/// use osc_runtime::{decode, Element};
///
/// let packet = [
/// 	b'/', b'a', 0, 0, // "/a\0\0"
/// 	b',', 0, 0, 0 // ",\0\0\0" (no arguments)
/// ];
/// let Element::Message(msg) = decode(&packet).unwrap() else { panic!("expected a message") };
/// assert_eq!(msg.address, "/a");
/// assert!(msg.args.is_empty());
/// ```
pub fn decode(bytes: &[u8]) -> DecodeResult<Element> {
	decode_traced(bytes).0
}

/// Like [`decode`], but also returns a [`Trace`] explaining what the decoder
/// was doing — most useful when decoding fails and you want to know which
/// subtree broke it.
pub fn decode_traced(bytes: &[u8]) -> (DecodeResult<Element>, Trace) {
	let mut trace = Trace::new();
	let result = decode_packet(bytes, bytes, &mut trace);
	(result, trace)
}

fn decode_packet(input: &[u8], original: &[u8], trace: &mut Trace) -> DecodeResult<Element> {
	if input.is_empty() {
		trace.log("packet", "empty packet");
		return Err(DecodeError::TruncatedInput { expected: 1, remaining: 0 });
	}

	let mut cursor = input;
	let head = read_osc_string(&mut cursor, original, trace)?;

	if head == "#bundle" {
		decode_bundle(&mut cursor, original, trace)
	} else {
		decode_message(head, &mut cursor, original, trace)
	}
}

fn decode_message(address: String, input: &mut &[u8], original: &[u8], trace: &mut Trace) -> DecodeResult<Element> {
	if !address.starts_with('/') {
		trace.log("message", format!("address {address:?} does not start with '/'"));
		return Err(DecodeError::MalformedAddress(address));
	}

	if input.is_empty() {
		return Ok(Element::Message(OscMessage { address, args: Vec::new() }));
	}

	let type_tags = read_osc_string(input, original, trace)?;
	if !type_tags.starts_with(',') {
		trace.log("message", format!("type-tag string {type_tags:?} does not start with ','"));
		return Err(DecodeError::MalformedTypeTag(type_tags));
	}

	let mut args = Vec::with_capacity(type_tags.len().saturating_sub(1));
	for tag in type_tags.chars().skip(1) {
		args.push(read_arg(tag, input, original, trace)?);
	}

	Ok(Element::Message(OscMessage { address, args }))
}

fn decode_bundle(input: &mut &[u8], original: &[u8], trace: &mut Trace) -> DecodeResult<Element> {
	let timetag = read_time_tag(input, trace)?;
	let mut elements = Vec::new();

	while !input.is_empty() {
		let declared = read_u32(input, trace)? as usize;
		if declared > input.len() {
			trace.log("bundle", format!("element declares {declared} byte(s) but only {} remain", input.len()));
			return Err(DecodeError::OversizedSubPacket { declared, remaining: input.len() });
		}
		let (payload, rest) = input.split_at(declared);
		*input = rest;
		elements.push(decode_packet(payload, original, trace)?);
	}

	Ok(Element::Bundle(OscBundle { timetag, elements }))
}

fn read_arg(tag: char, input: &mut &[u8], original: &[u8], trace: &mut Trace) -> DecodeResult<Element> {
	match tag {
		'i' => Ok(Element::Int32(read_i32(input, trace)?)),
		'f' => Ok(Element::Float32(read_f32(input, trace)?)),
		's' => Ok(Element::String(read_osc_string(input, original, trace)?)),
		'b' => Ok(Element::Blob(read_blob(input, original, trace)?)),
		other => {
			trace.log("message/args", format!("unknown type tag {other:?}"));
			Err(DecodeError::UnknownArgType(other))
		}
	}
}

fn read_i32(input: &mut &[u8], trace: &mut Trace) -> DecodeResult<i32> {
	let bytes = take_n(input, 4, trace)?;
	let (_, value) = be_i32::<_, DecodeError>(bytes).expect("exactly 4 bytes always parse as i32");
	Ok(value)
}

fn read_f32(input: &mut &[u8], trace: &mut Trace) -> DecodeResult<f32> {
	let bytes = take_n(input, 4, trace)?;
	// `be_f32` reconstructs the value from big-endian bytes via `f32::from_bits`,
	// which is bit-exact regardless of the host's native float layout — no
	// sign/exponent/mantissa fallback is needed on any platform Rust targets.
	let (_, value) = be_f32::<_, DecodeError>(bytes).expect("exactly 4 bytes always parse as f32");
	Ok(value)
}

fn read_u32(input: &mut &[u8], trace: &mut Trace) -> DecodeResult<u32> {
	let bytes = take_n(input, 4, trace)?;
	let (_, value) = be_u32::<_, DecodeError>(bytes).expect("exactly 4 bytes always parse as u32");
	Ok(value)
}

fn read_time_tag(input: &mut &[u8], trace: &mut Trace) -> DecodeResult<TimeTag> {
	let secs = read_u32(input, trace)?;
	let fraction = read_u32(input, trace)?;
	Ok(TimeTag::from_wire(secs, fraction))
}

fn read_blob(input: &mut &[u8], original: &[u8], trace: &mut Trace) -> DecodeResult<Vec<u8>> {
	let size = read_u32(input, trace)? as usize;
	let bytes = take_n(input, size, trace)?.to_vec();
	skip_padding(input, original);
	Ok(bytes)
}

fn read_osc_string(input: &mut &[u8], original: &[u8], trace: &mut Trace) -> DecodeResult<String> {
	let Some(terminator) = input.iter().position(|&b| b == 0) else {
		trace.log("string", "no NUL terminator before end of buffer");
		return Err(DecodeError::MissingTerminator);
	};

	let (raw, rest) = input.split_at(terminator);
	let value = String::from_utf8(raw.to_vec())?;
	*input = &rest[1..]; // consume the NUL itself
	skip_padding(input, original);
	Ok(value)
}

fn take_n<'a>(input: &mut &'a [u8], n: usize, trace: &mut Trace) -> DecodeResult<&'a [u8]> {
	if input.len() < n {
		trace.log("buffer", format!("expected {n} more byte(s), had {}", input.len()));
		return Err(DecodeError::TruncatedInput { expected: n, remaining: input.len() });
	}
	let (head, tail) = input.split_at(n);
	*input = tail;
	Ok(head)
}

/// Consumes NUL padding up to the next 4-byte boundary measured from the
/// start of the whole datagram (`original`), tolerating missing trailing
/// padding at end-of-packet. Padding is measured from the
/// outermost packet rather than the current sub-packet because every
/// preceding field in a well-formed OSC packet is itself padded to a
/// multiple of 4 bytes — the two measurements always agree, and bundle
/// recursion (`decode_bundle`) always threads the same `original` through.
fn skip_padding(input: &mut &[u8], original: &[u8]) {
	let consumed = original.offset(input);
	let padded = (consumed + 3) / 4 * 4;
	let skip = (padded - consumed).min(input.len());
	*input = &input[skip..];
}
