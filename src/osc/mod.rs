use std::{
	convert::TryFrom,
	error::Error,
	fmt::{self, Display},
	time::{Duration, SystemTime, UNIX_EPOCH}
};

pub mod decoder;
pub mod error;

pub use self::decoder::{decode, decode_traced, Trace, MTU};
pub use self::error::{DecodeError, DecodeResult};

/// A time tag as carried by an OSC bundle header.
///
/// On the wire a time tag is two 32-bit integers: NTP (era 0) seconds since
/// 1900-01-01, and a fractional second. The sentinel `seconds=0, fraction=1`
/// means "dispatch immediately" and never denotes an actual instant; any
/// other value is converted to a signed offset from the Unix epoch so that
/// NTP instants predating 1970 don't need to be rejected or saturated.
///
/// # Examples
///
/// ```
/// use std::{convert::TryFrom, time::UNIX_EPOCH};
///
/// use osc_runtime::TimeTag;
///
/// assert_eq!(TimeTag::try_from(UNIX_EPOCH).unwrap(), TimeTag::from((2_208_988_800, 0)));
/// assert_eq!(TimeTag::from((0, 1)), TimeTag::Immediately);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimeTag {
	/// Dispatch as soon as the bundle is decoded.
	Immediately,
	/// A defined wall-clock instant, expressed as an offset from the Unix epoch.
	Instant { secs: i64, nanos: u32 }
}

impl TimeTag {
	const NTP_UNIX_OFFSET: i64 = 2_208_988_800; // From RFC 5905
	const TWO_POW_32: f64 = (u32::MAX as f64) + 1.0;
	const ONE_OVER_TWO_POW_32: f64 = 1.0 / TimeTag::TWO_POW_32;
	const NANOS_PER_SECOND: f64 = 1.0e9;

	/// Builds a `TimeTag` from raw NTP wire fields, applying the "immediately" sentinel.
	pub(crate) fn from_wire(ntp_secs: u32, ntp_fraction: u32) -> TimeTag {
		if ntp_secs == 0 && ntp_fraction == 1 {
			return TimeTag::Immediately;
		}
		let secs = ntp_secs as i64 - TimeTag::NTP_UNIX_OFFSET;
		let nanos = (ntp_fraction as f64 * TimeTag::ONE_OVER_TWO_POW_32 * TimeTag::NANOS_PER_SECOND).round() as u32;
		TimeTag::Instant { secs, nanos }
	}

	/// `true` if this time tag is the "immediately" sentinel.
	pub fn is_immediate(&self) -> bool {
		matches!(self, TimeTag::Immediately)
	}
}

impl TryFrom<SystemTime> for TimeTag {
	type Error = TimeTagError;

	fn try_from(time: SystemTime) -> Result<TimeTag, TimeTagError> {
		let since_epoch = time.duration_since(UNIX_EPOCH).map_err(|_| TimeTagError(TimeTagErrorKind::BeforeEpoch))?;
		let secs = i64::try_from(since_epoch.as_secs()).map_err(|_| TimeTagError(TimeTagErrorKind::Overflow))?;
		Ok(TimeTag::Instant { secs, nanos: since_epoch.subsec_nanos() })
	}
}

impl From<TimeTag> for SystemTime {
	fn from(time: TimeTag) -> SystemTime {
		match time {
			TimeTag::Immediately => UNIX_EPOCH,
			TimeTag::Instant { secs, nanos } => {
				if secs >= 0 {
					UNIX_EPOCH + Duration::new(secs as u64, nanos)
				} else {
					UNIX_EPOCH - Duration::new((-secs) as u64, 0) + Duration::new(0, nanos)
				}
			}
		}
	}
}

impl From<(u32, u32)> for TimeTag {
	fn from(time: (u32, u32)) -> TimeTag {
		TimeTag::from_wire(time.0, time.1)
	}
}

/// An error returned by conversions involving [`TimeTag`].
#[derive(Debug)]
pub struct TimeTagError(TimeTagErrorKind);

#[derive(Debug)]
enum TimeTagErrorKind {
	BeforeEpoch,
	Overflow
}

impl Display for TimeTagError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self.0 {
			TimeTagErrorKind::BeforeEpoch => write!(f, "time is before the unix epoch and cannot be stored"),
			TimeTagErrorKind::Overflow => write!(f, "time overflows what a time tag can store")
		}
	}
}

impl Error for TimeTagError {}

/// A decoded OSC message: an address and its ordered argument list.
///
/// Every [`OscMessage::address`] is non-empty and begins with `/` — the
/// decoder never produces one that doesn't, see [`decode`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OscMessage {
	pub address: String,
	pub args: Vec<Element>
}

impl OscMessage {
	/// Splits the address into its `/`-separated segments, see [`crate::address::split`].
	pub fn address_segments(&self) -> Vec<&str> {
		crate::address::split(&self.address)
	}
}

/// A decoded OSC bundle: a time tag and its ordered child packets.
///
/// A bundle's children are always `Element::Message` or `Element::Bundle` —
/// the decoder never nests a bare primitive directly under a bundle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OscBundle {
	pub timetag: TimeTag,
	pub elements: Vec<Element>
}

/// A node in the decoded packet tree.
///
/// Every `Element` is exclusively owned by its parent (the packet root owns
/// its arguments; a bundle owns its children and time tag).
/// There is no sharing and no cycles, so dropping the root drops the whole
/// subtree, as `Vec`/`Box` ownership already guarantees in Rust.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Element {
	Message(OscMessage),
	Bundle(OscBundle),
	Int32(i32),
	Float32(f32),
	String(String),
	Blob(Vec<u8>),
	Time(TimeTag)
}

impl Element {
	/// Returns `Some(&message)` if this is `Element::Message`, `None` otherwise.
	pub fn as_message(&self) -> Option<&OscMessage> {
		match self {
			Element::Message(m) => Some(m),
			_ => None
		}
	}

	/// Returns `Some(&bundle)` if this is `Element::Bundle`, `None` otherwise.
	pub fn as_bundle(&self) -> Option<&OscBundle> {
		match self {
			Element::Bundle(b) => Some(b),
			_ => None
		}
	}

	pub fn int(self) -> Option<i32> {
		match self {
			Element::Int32(v) => Some(v),
			_ => None
		}
	}

	pub fn float(self) -> Option<f32> {
		match self {
			Element::Float32(v) => Some(v),
			_ => None
		}
	}

	pub fn string(self) -> Option<String> {
		match self {
			Element::String(v) => Some(v),
			_ => None
		}
	}

	pub fn blob(self) -> Option<Vec<u8>> {
		match self {
			Element::Blob(v) => Some(v),
			_ => None
		}
	}
}

impl From<i32> for Element {
	fn from(v: i32) -> Self {
		Element::Int32(v)
	}
}
impl From<f32> for Element {
	fn from(v: f32) -> Self {
		Element::Float32(v)
	}
}
impl From<String> for Element {
	fn from(v: String) -> Self {
		Element::String(v)
	}
}
impl<'a> From<&'a str> for Element {
	fn from(v: &'a str) -> Self {
		Element::String(v.to_string())
	}
}
impl From<Vec<u8>> for Element {
	fn from(v: Vec<u8>) -> Self {
		Element::Blob(v)
	}
}
