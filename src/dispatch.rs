//! Message dispatch against a [`MethodRegistry`].
//!
//! Grounded on `oscdispatcher.c`'s `osc_dispatcher_process`/
//! `osc_dispatcher_process_message`, with one deliberate correction: the
//! source walks a *single* current container and compares names with
//! `strcmp`, which can never address more than one registered method per
//! message. This module instead keeps a *frontier* of matching containers
//! at each depth and matches every segment with
//! [`crate::address::pattern_match`], so a pattern segment (`*`, `?`,
//! `[...]`, `{...}`) can fan out to several siblings.

use crate::{
	address,
	osc::{Element, OscBundle, OscMessage},
	registry::{as_method, children_of, is_container, node_name, MethodRegistry}
};

/// Dispatches a decoded root [`Element`] against `registry`.
///
/// - A Message is routed through [`dispatch_message`].
/// - A Bundle whose timetag is [`crate::TimeTag::is_immediate`] has each
///   child dispatched, recursively, in order. A Bundle with any other
///   timetag is dropped entirely — scheduled delivery is out of scope —
///   and this applies to nested bundles too: a future bundle nested inside
///   an immediate one is still dropped.
/// - Any other root [`Element`] (a bare primitive) is ignored; the decoder
///   never produces one as a packet root, but a caller could still hand
///   one to `dispatch` directly.
pub fn dispatch(registry: &MethodRegistry, element: &Element) {
	match element {
		Element::Message(message) => dispatch_message(registry, message),
		Element::Bundle(bundle) => dispatch_bundle(registry, bundle),
		_ => {}
	}
}

fn dispatch_bundle(registry: &MethodRegistry, bundle: &OscBundle) {
	if !bundle.timetag.is_immediate() {
		return;
	}
	for child in &bundle.elements {
		dispatch(registry, child);
	}
}

/// Routes a single Message through the registry's trie.
///
/// Walks the address segment by segment, keeping a frontier of every
/// container reached so far that matched. At the final segment, every
/// matching Method is invoked, in depth-first registration order, with the
/// message's argument list and its bound user-data. Messages that match no
/// registered method are silently discarded.
pub fn dispatch_message(registry: &MethodRegistry, message: &OscMessage) {
	let segments = message.address_segments();
	if segments.is_empty() {
		return;
	}

	let mut frontier = vec![registry.root()];
	for (i, segment) in segments.iter().enumerate() {
		let is_last = i + 1 == segments.len();
		let mut next = Vec::new();

		for container in frontier {
			for child in children_of(container) {
				if !address::pattern_match(segment, node_name(child)) {
					continue;
				}
				if is_last {
					if let Some((callback, user_data)) = as_method(child) {
						callback(&message.args, user_data);
					}
				} else if is_container(child) {
					next.push(child);
				}
			}
		}

		frontier = next;
	}
}

#[cfg(test)]
mod tests {
	use std::sync::{
		atomic::{AtomicUsize, Ordering},
		Arc, Mutex
	};

	use super::*;
	use crate::osc::TimeTag;

	fn counting_callback(counter: Arc<AtomicUsize>) -> crate::registry::Callback {
		Arc::new(move |_args, _data| {
			counter.fetch_add(1, Ordering::SeqCst);
		})
	}

	fn recording_callback(log: Arc<Mutex<Vec<Vec<Element>>>>) -> crate::registry::Callback {
		Arc::new(move |args, _data| {
			log.lock().unwrap().push(args.to_vec());
		})
	}

	fn message(address: &str, args: Vec<Element>) -> Element {
		Element::Message(OscMessage { address: address.to_string(), args })
	}

	#[test]
	fn s1_simple_float_message_invokes_handler_once() {
		let mut registry = MethodRegistry::new();
		let log = Arc::new(Mutex::new(Vec::new()));
		registry.register("/fader", recording_callback(log.clone()), Arc::new(()));

		dispatch(&registry, &message("/fader", vec![Element::Float32(0.5)]));

		let calls = log.lock().unwrap();
		assert_eq!(calls.len(), 1);
		assert_eq!(calls[0], vec![Element::Float32(0.5)]);
	}

	#[test]
	fn s2_two_segment_route_only_invokes_exact_match() {
		let mut registry = MethodRegistry::new();
		let h1 = Arc::new(AtomicUsize::new(0));
		let h2 = Arc::new(AtomicUsize::new(0));
		registry.register("/a/b", counting_callback(h1.clone()), Arc::new(()));
		registry.register("/a/c", counting_callback(h2.clone()), Arc::new(()));

		dispatch(&registry, &message("/a/b", Vec::new()));

		assert_eq!(h1.load(Ordering::SeqCst), 1);
		assert_eq!(h2.load(Ordering::SeqCst), 0);
	}

	#[test]
	fn s3_wildcard_dispatch_fans_out_to_every_matching_sibling() {
		let mut registry = MethodRegistry::new();
		let h1 = Arc::new(AtomicUsize::new(0));
		let h2 = Arc::new(AtomicUsize::new(0));
		let h3 = Arc::new(AtomicUsize::new(0));
		registry.register("/fader1", counting_callback(h1.clone()), Arc::new(()));
		registry.register("/fader2", counting_callback(h2.clone()), Arc::new(()));
		registry.register("/other", counting_callback(h3.clone()), Arc::new(()));

		dispatch(&registry, &message("/fader?", vec![Element::Int32(7)]));

		assert_eq!(h1.load(Ordering::SeqCst), 1);
		assert_eq!(h2.load(Ordering::SeqCst), 1);
		assert_eq!(h3.load(Ordering::SeqCst), 0);
	}

	#[test]
	fn s4_immediate_bundle_dispatches_each_child_once_in_order() {
		let mut registry = MethodRegistry::new();
		let log = Arc::new(Mutex::new(Vec::new()));

		let order_log = log.clone();
		registry.register(
			"/a",
			Arc::new(move |_args, _data| order_log.lock().unwrap().push("a")),
			Arc::new(())
		);
		let order_log = log.clone();
		registry.register(
			"/b",
			Arc::new(move |_args, _data| order_log.lock().unwrap().push("b")),
			Arc::new(())
		);

		let bundle = Element::Bundle(OscBundle {
			timetag: TimeTag::Immediately,
			elements: vec![message("/a", Vec::new()), message("/b", Vec::new())]
		});
		dispatch(&registry, &bundle);

		assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
	}

	#[test]
	fn s5_future_bundle_is_dropped_entirely() {
		let mut registry = MethodRegistry::new();
		let hits = Arc::new(AtomicUsize::new(0));
		registry.register("/a", counting_callback(hits.clone()), Arc::new(()));

		let bundle = Element::Bundle(OscBundle {
			timetag: TimeTag::from((3_000_000_000, 0)),
			elements: vec![message("/a", Vec::new())]
		});
		dispatch(&registry, &bundle);

		assert_eq!(hits.load(Ordering::SeqCst), 0);
	}

	#[test]
	fn future_bundle_nested_inside_immediate_bundle_is_still_dropped() {
		let mut registry = MethodRegistry::new();
		let hits = Arc::new(AtomicUsize::new(0));
		registry.register("/deep", counting_callback(hits.clone()), Arc::new(()));

		let inner = Element::Bundle(OscBundle { timetag: TimeTag::from((3_000_000_000, 0)), elements: vec![message("/deep", Vec::new())] });
		let outer = Element::Bundle(OscBundle { timetag: TimeTag::Immediately, elements: vec![inner] });
		dispatch(&registry, &outer);

		assert_eq!(hits.load(Ordering::SeqCst), 0);
	}

	#[test]
	fn unmatched_message_is_silently_discarded() {
		let registry = MethodRegistry::new();
		// No handlers registered at all; dispatch must not panic.
		dispatch(&registry, &message("/nowhere", Vec::new()));
	}

	#[test]
	fn registry_determinism_same_registrations_same_dispatch_order() {
		let build = || {
			let mut registry = MethodRegistry::new();
			let log = Arc::new(Mutex::new(Vec::new()));
			for name in ["/c", "/a", "/b"] {
				let order_log = log.clone();
				let tag: &'static str = Box::leak(name.to_string().into_boxed_str());
				registry.register(name, Arc::new(move |_args, _data| order_log.lock().unwrap().push(tag)), Arc::new(()));
			}
			(registry, log)
		};

		let (r1, log1) = build();
		let (r2, log2) = build();
		dispatch(&r1, &message("/*", Vec::new()));
		dispatch(&r2, &message("/*", Vec::new()));

		assert_eq!(*log1.lock().unwrap(), *log2.lock().unwrap());
	}
}
