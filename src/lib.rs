//! # `osc-runtime`
//! A decoder, address-pattern engine, and method dispatcher for [Open Sound
//! Control](https://opensoundcontrol.stanford.edu/) (OSC) 1.0.
//!
//! This crate covers the three tightly-coupled pieces that make up an OSC
//! endpoint:
//!
//! - [`osc::decode`] turns a UDP datagram's bytes into an [`osc::Element`]
//!   tree (messages, bundles, and their primitive arguments).
//! - [`address::pattern_match`] decides whether an OSC address pattern
//!   (`?`, `*`, `[...]`, `{...}`) matches one path segment.
//! - [`MethodRegistry`] and [`dispatch::dispatch`] store handlers under a
//!   hierarchical address namespace and invoke every handler a decoded
//!   message's (possibly patterned) address reaches.
//!
//! [`OscServer`] wires these three together around a `tokio` UDP socket for
//! applications that want a batteries-included receive loop; everything
//! else in this crate works independently of it.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use osc_runtime::{OscResult, OscServer};
//!
//! #[tokio::main]
//! async fn main() -> OscResult<()> {
//! 	let mut server = OscServer::bind("127.0.0.1:9000").await?;
//! 	server.add_method(
//! 		"/fader",
//! 		Arc::new(|args, _user_data| println!("fader: {args:?}")),
//! 		Arc::new(())
//! 	);
//! 	server.run().await
//! }
//! ```

pub mod address;
pub mod dispatch;
mod error;
pub mod osc;
pub mod registry;
mod server;
mod udp;

pub use self::{
	dispatch::{dispatch, dispatch_message},
	error::{RuntimeError, RuntimeResult as OscResult},
	osc::{decode, decode_traced, DecodeError, Element, OscBundle, OscMessage, TimeTag, Trace},
	registry::{Callback, MethodRegistry, UserData},
	server::OscServer
};
