//! The server shim: owns a socket, a [`MethodRegistry`], and drives the
//! receive loop.
//!
//! Grounded on the async `tokio::net::UdpSocket` wrapper this crate's UDP
//! layer already provides, and on `oscserver.c`'s `osc_server_run` for the
//! receive loop's error policy: only a socket-level error other than
//! `EINTR`/`EAGAIN`/`EWOULDBLOCK` ends the loop. `tokio`'s async model means
//! `EINTR` never surfaces to userspace code and `EWOULDBLOCK`/`EAGAIN`
//! appear as a pending future rather than an `io::Error`, so the Rust loop
//! only ever needs to decide what to do with `Ok` and genuine `Err` results
//! from the socket.

use std::net::SocketAddr;

use tokio::net::{ToSocketAddrs, UdpSocket};
use tokio_stream::StreamExt;
use tracing::{instrument, warn};

use crate::{
	dispatch,
	error::RuntimeResult,
	osc::{self, Trace},
	registry::{Callback, MethodRegistry, UserData},
	udp::UDPSocketStream
};

/// An OSC server: a bound UDP socket plus the registry it dispatches
/// decoded messages against.
#[derive(Debug)]
pub struct OscServer {
	socket: UDPSocketStream,
	registry: MethodRegistry,
	blocking: bool
}

impl OscServer {
	/// Creates a server from an already-bound [`tokio::net::UdpSocket`].
	pub fn new(socket: UdpSocket) -> Self {
		Self { socket: UDPSocketStream::new(socket), registry: MethodRegistry::new(), blocking: true }
	}

	/// Binds a new UDP socket at `addr` and wraps it in a server.
	/// `hints`-style address-family selection is left to the caller via the
	/// address passed in, the same simplification this crate's socket
	/// constructor makes over the reference implementation's
	/// `getaddrinfo` hints struct.
	pub async fn bind<A: ToSocketAddrs>(addr: A) -> RuntimeResult<Self> {
		let socket = UdpSocket::bind(addr).await?;
		Ok(Self::new(socket))
	}

	/// Registers a method at `address`, a thin pass-through to
	/// [`MethodRegistry::register`].
	pub fn add_method(&mut self, address: &str, callback: Callback, user_data: UserData) {
		self.registry.register(address, callback, user_data);
	}

	/// Toggles the underlying socket's blocking mode. In this async
	/// runtime "blocking" only controls whether [`run`](Self::run) returns
	/// as soon as no datagram is immediately available, mirroring the
	/// reference implementation's `O_NONBLOCK` toggle at the interface
	/// level; it does not change how the socket itself is polled.
	pub fn set_blocking(&mut self, blocking: bool) {
		self.blocking = blocking;
	}

	/// Runs the receive loop: decode each datagram, dispatch it against
	/// this server's registry, and repeat.
	///
	/// A decode failure logs the packet's [`Trace`] and the loop
	/// continues — the application never sees the malformed packet. Only
	/// an `io::Error` from the socket itself ends the loop.
	///
	/// In blocking mode (the default) this awaits forever, handling one
	/// datagram at a time. In non-blocking mode it drains whatever
	/// datagrams are immediately available and returns as soon as the
	/// socket would block — mirroring `osc_server_run`'s `EWOULDBLOCK`
	/// return, rather than `EWOULDBLOCK`/`EAGAIN` ending the process.
	#[instrument(skip(self), fields(local_addr = ?self.local_addr()))]
	pub async fn run(&mut self) -> RuntimeResult<()> {
		if self.blocking {
			loop {
				let Some(next) = self.socket.next().await else {
					return Ok(());
				};
				let (bytes, peer) = next?;
				self.handle_datagram(&bytes, peer);
			}
		}

		let mut buf = vec![0u8; osc::MTU];
		loop {
			match self.socket().try_recv_from(&mut buf) {
				Ok((n, peer)) => self.handle_datagram(&buf[..n], peer),
				Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => return Ok(()),
				Err(e) => return Err(e.into())
			}
		}
	}

	#[instrument(skip(self, bytes), fields(len = bytes.len()))]
	fn handle_datagram(&self, bytes: &[u8], peer: SocketAddr) {
		let (result, trace) = osc::decode_traced(bytes);
		match result {
			Ok(element) => dispatch::dispatch(&self.registry, &element),
			Err(error) => warn!(%peer, %error, trace = %TraceDisplay(&trace), "dropping unparseable packet")
		}
	}

	/// Returns the local address this server is bound to.
	pub fn local_addr(&self) -> RuntimeResult<SocketAddr> {
		Ok(self.socket.get_ref().local_addr()?)
	}

	/// Returns the underlying [`tokio::net::UdpSocket`].
	pub fn socket(&self) -> &UdpSocket {
		self.socket.get_ref()
	}
}

struct TraceDisplay<'a>(&'a Trace);

impl std::fmt::Display for TraceDisplay<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if self.0.is_empty() { write!(f, "<empty>") } else { write!(f, "{}", self.0) }
	}
}

#[cfg(test)]
mod tests {
	use std::sync::{
		atomic::{AtomicUsize, Ordering},
		Arc
	};

	use super::*;

	#[tokio::test]
	async fn bind_assigns_a_local_address() {
		let server = OscServer::bind("127.0.0.1:0").await.unwrap();
		assert!(server.local_addr().unwrap().port() > 0);
	}

	#[tokio::test]
	async fn non_blocking_run_returns_when_nothing_is_pending() {
		let mut server = OscServer::bind("127.0.0.1:0").await.unwrap();
		server.set_blocking(false);
		server.run().await.unwrap();
	}

	#[tokio::test]
	async fn end_to_end_datagram_invokes_registered_handler() {
		let mut server = OscServer::bind("127.0.0.1:0").await.unwrap();
		let addr = server.local_addr().unwrap();
		let hits = Arc::new(AtomicUsize::new(0));
		let counter = hits.clone();
		server.add_method("/fader", Arc::new(move |_args, _data| { counter.fetch_add(1, Ordering::SeqCst); }), Arc::new(()));
		server.set_blocking(false);

		let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
		let packet: &[u8] = &[b'/', b'f', b'a', b'd', b'e', b'r', 0, 0, b',', 0, 0, 0];
		sender.send_to(packet, addr).await.unwrap();

		// give the datagram a moment to land before the non-blocking run() checks.
		tokio::time::sleep(std::time::Duration::from_millis(50)).await;
		server.run().await.unwrap();

		assert_eq!(hits.load(Ordering::SeqCst), 1);
	}
}
