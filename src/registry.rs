//! Hierarchical method registry: a Container/Method trie keyed by address
//! segment.
//!
//! Grounded on `oscdispatcher.c`'s linked-list-of-children container, but
//! using owned `Vec<Node>` instead of an intrusive singly-linked list — a
//! tagged sum type whose branches own their own payloads reads more
//! naturally here than a shared node header with a `next` pointer.

use std::{any::Any, fmt, sync::Arc};

use crate::osc::Element;

/// Opaque per-method context, the idiomatic replacement for the C API's
/// `void *user_data`. `Arc` lets the same registry (and its bound closures)
/// be shared across the tasks an async server spawns.
pub type UserData = Arc<dyn Any + Send + Sync>;

/// A method's callback: invoked with the message's argument list and the
/// user-data bound at registration time.
pub type Callback = Arc<dyn Fn(&[Element], &UserData) + Send + Sync>;

pub(crate) enum Node {
	Container { name: String, children: Vec<Node> },
	Method { name: String, callback: Callback, user_data: UserData }
}

impl Node {
	fn name(&self) -> &str {
		match self {
			Node::Container { name, .. } => name,
			Node::Method { name, .. } => name
		}
	}
}

impl fmt::Debug for Node {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Node::Container { name, children } => f.debug_struct("Container").field("name", name).field("children", children).finish(),
			Node::Method { name, .. } => f.debug_struct("Method").field("name", name).finish()
		}
	}
}

/// A trie of registered OSC methods, rooted at an anonymous container.
///
/// Registrations are append-only for the lifetime of the registry — there
/// is no removal API, matching the source's `osc_dispatcher`, which is
/// only ever freed as a whole.
#[derive(Debug)]
pub struct MethodRegistry {
	root: Node
}

impl Default for MethodRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl MethodRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		MethodRegistry { root: Node::Container { name: String::new(), children: Vec::new() } }
	}

	pub(crate) fn root(&self) -> &Node {
		&self.root
	}

	/// Registers `callback` at `address`.
	///
	/// Silently does nothing if:
	/// - `address` splits into zero segments (the empty address),
	/// - an interior segment collides with an existing Method (a Method
	///   can never host children),
	/// - the terminal segment collides with an existing Container, or
	/// - the terminal segment already names a Method (first registration
	///   wins; the existing binding is never replaced, which keeps a
	///   server's own setup code idempotent if it re-runs its own
	///   registration calls).
	///
	/// # Examples
	///
	/// ```
	/// use std::sync::Arc;
	///
	/// use osc_runtime::MethodRegistry;
	///
	/// let mut registry = MethodRegistry::new();
	/// registry.register("/fader", Arc::new(|_args, _data| {}), Arc::new(()));
	/// assert!(registry.contains("/fader"));
	/// ```
	pub fn register(&mut self, address: &str, callback: Callback, user_data: UserData) {
		// `address::split` treats "" the same as "/" (a single empty segment);
		// the empty address itself must still be a no-op, so it is rejected
		// here rather than inside `split`.
		if address.is_empty() {
			return;
		}

		let segments = crate::address::split(address);
		let Node::Container { children, .. } = &mut self.root else { unreachable!("root is always a container") };
		insert(children, &segments, callback, user_data);
	}

	/// `true` if `address` names a registered Method exactly (no pattern
	/// matching — this is a literal lookup, useful for tests and sanity
	/// checks around setup code).
	pub fn contains(&self, address: &str) -> bool {
		let segments = crate::address::split(address);
		let mut current = &self.root;
		for (i, segment) in segments.iter().enumerate() {
			let Node::Container { children, .. } = current else { return false };
			let Some(found) = children.iter().find(|n| n.name() == *segment) else { return false };
			if i + 1 == segments.len() {
				return matches!(found, Node::Method { .. });
			}
			current = found;
		}
		false
	}
}

fn insert(children: &mut Vec<Node>, segments: &[&str], callback: Callback, user_data: UserData) {
	let (segment, rest) = segments.split_first().expect("non-empty segment list");
	let is_last = rest.is_empty();

	if let Some(existing) = children.iter_mut().find(|n| n.name() == *segment) {
		match existing {
			Node::Container { children: grandchildren, .. } if !is_last => insert(grandchildren, rest, callback, user_data),
			Node::Method { .. } if is_last => {
				// Already bound; first registration wins.
			}
			_ => {
				// Shape conflict: a Method where a Container is needed, or vice versa.
			}
		}
		return;
	}

	if is_last {
		children.push(Node::Method { name: segment.to_string(), callback, user_data });
	} else {
		let mut grandchildren = Vec::new();
		insert(&mut grandchildren, rest, callback, user_data);
		children.push(Node::Container { name: segment.to_string(), children: grandchildren });
	}
}

pub(crate) fn children_of(node: &Node) -> &[Node] {
	match node {
		Node::Container { children, .. } => children,
		Node::Method { .. } => &[]
	}
}

pub(crate) fn is_container(node: &Node) -> bool {
	matches!(node, Node::Container { .. })
}

pub(crate) fn as_method(node: &Node) -> Option<(&Callback, &UserData)> {
	match node {
		Node::Method { callback, user_data, .. } => Some((callback, user_data)),
		Node::Container { .. } => None
	}
}

pub(crate) fn node_name(node: &Node) -> &str {
	node.name()
}

#[cfg(test)]
mod tests {
	use std::sync::{
		atomic::{AtomicUsize, Ordering},
		Arc
	};

	use super::*;

	fn counting_callback(counter: Arc<AtomicUsize>) -> Callback {
		Arc::new(move |_args, _data| {
			counter.fetch_add(1, Ordering::SeqCst);
		})
	}

	#[test]
	fn registers_and_finds_literal_address() {
		let mut registry = MethodRegistry::new();
		registry.register("/a/b", counting_callback(Arc::new(AtomicUsize::new(0))), Arc::new(()));
		assert!(registry.contains("/a/b"));
		assert!(!registry.contains("/a/c"));
	}

	#[test]
	fn empty_address_is_rejected() {
		let mut registry = MethodRegistry::new();
		registry.register("", counting_callback(Arc::new(AtomicUsize::new(0))), Arc::new(()));
		assert!(!registry.contains(""));
	}

	#[test]
	fn container_method_shape_conflict_is_silently_ignored() {
		let mut registry = MethodRegistry::new();
		registry.register("/a", counting_callback(Arc::new(AtomicUsize::new(0))), Arc::new(()));
		// "/a" is already a Method; "/a/b" would need it to be a Container.
		registry.register("/a/b", counting_callback(Arc::new(AtomicUsize::new(0))), Arc::new(()));
		assert!(registry.contains("/a"));
		assert!(!registry.contains("/a/b"));
	}

	#[test]
	fn second_registration_at_existing_method_is_a_no_op() {
		let mut registry = MethodRegistry::new();
		let first_counter = Arc::new(AtomicUsize::new(0));
		registry.register("/a", counting_callback(first_counter.clone()), Arc::new(()));
		registry.register("/a", counting_callback(Arc::new(AtomicUsize::new(0))), Arc::new(()));

		let Node::Container { children, .. } = registry.root() else { unreachable!() };
		let Some((callback, user_data)) = as_method(&children[0]) else { panic!("expected method") };
		callback(&[], user_data);
		assert_eq!(first_counter.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn sibling_append_order_is_preserved() {
		let mut registry = MethodRegistry::new();
		registry.register("/c", counting_callback(Arc::new(AtomicUsize::new(0))), Arc::new(()));
		registry.register("/a", counting_callback(Arc::new(AtomicUsize::new(0))), Arc::new(()));
		registry.register("/b", counting_callback(Arc::new(AtomicUsize::new(0))), Arc::new(()));

		let Node::Container { children, .. } = registry.root() else { unreachable!() };
		let names: Vec<&str> = children.iter().map(node_name).collect();
		assert_eq!(names, vec!["c", "a", "b"]);
	}
}
