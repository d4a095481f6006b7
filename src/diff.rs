//! Index-based child reconciliation.
//!
//! Live children and next descriptors are walked in lockstep. There is no key matching:
//! a reordered list is patched as a series of in-place replacements.

use crate::{
	build::check_void_children,
	descriptor::{Descriptor, Element, ElementType, Props},
	error::Error,
	props::patch_props,
	renderer::Root,
	surface::Surface,
	tree::{ComponentNode, HostNode, NodeId, NodeKind, Parent},
};
use std::borrow::Cow;
use tracing::{instrument, trace, trace_span};

/// What to do with one live child, given its next descriptor.
enum Patch {
	Keep,
	Text(Cow<'static, str>),
	Host { props: Props, children: Vec<Descriptor> },
	Fragment(Vec<Descriptor>),
	Component(Props),
	Replace(Descriptor),
}

fn classify<N>(live: &NodeKind<N>, next: Descriptor) -> Patch {
	match live {
		NodeKind::Null => match next {
			Descriptor::Null => Patch::Keep,
			next => Patch::Replace(next),
		},
		NodeKind::Text { value, .. } => match next {
			Descriptor::Text(next) if next == *value => Patch::Keep,
			Descriptor::Text(next) => Patch::Text(next),
			next => Patch::Replace(next),
		},
		NodeKind::Host(HostNode { tag, .. }) => match next {
			Descriptor::Element(Element { ty: ElementType::Tag(next_tag), mut props }) if next_tag == *tag => {
				let children = props.take_children();
				Patch::Host { props, children }
			}
			next => Patch::Replace(next),
		},
		NodeKind::Fragment { .. } => match next {
			Descriptor::List(items) => Patch::Fragment(items),
			Descriptor::Element(Element { ty: ElementType::Fragment, mut props }) => Patch::Fragment(props.take_children()),
			next => Patch::Replace(next),
		},
		NodeKind::Component(ComponentNode { component, .. }) => match next {
			Descriptor::Element(Element { ty: ElementType::Component(next_component), props }) if next_component.same(component) => Patch::Component(props),
			next => Patch::Replace(next),
		},
	}
}

impl<S: Surface> Root<S> {
	/// Brings `parent`'s live children in line with `next`.
	#[instrument(skip(self, next))]
	pub(crate) fn reconcile_children(&mut self, parent: NodeId, next: Vec<Descriptor>, depth_limit: usize) -> Result<(), Error> {
		if depth_limit == 0 {
			return Err(Error::DepthLimit { limit: self.options.depth_limit });
		}

		let live = self.tree.children(parent).to_vec();
		let mut next = next.into_iter();
		for (index, &child) in live.iter().enumerate() {
			match next.next() {
				Some(descriptor) => self.patch_child(parent, index, child, descriptor, depth_limit)?,
				None => {
					self.truncate_children(parent, index);
					return Ok(());
				}
			}
		}
		self.append_children(parent, next.collect(), depth_limit)
	}

	fn patch_child(&mut self, parent: NodeId, index: usize, child: NodeId, next: Descriptor, depth_limit: usize) -> Result<(), Error> {
		let Some(live) = self.tree.get(child) else {
			return Ok(());
		};

		match classify(&live.kind, next) {
			Patch::Keep => {
				trace!(index, "Unchanged.");
				Ok(())
			}

			Patch::Text(next) => {
				#[cfg(feature = "dangerous-logging")]
				let span = trace_span!("Updating text", index, ?next);
				#[cfg(not(feature = "dangerous-logging"))]
				let span = trace_span!("Updating text", index);
				let _enter = span.enter();

				if let Some(NodeKind::Text { value, surface }) = self.tree.kind_mut(child) {
					if let Some(surface) = surface {
						self.surface.set_text(surface, &next);
					}
					*value = next;
				}
				Ok(())
			}

			Patch::Host { props, children } => {
				let span = trace_span!("Patching host", index);
				let _enter = span.enter();

				if let Some(NodeKind::Host(HostNode { tag, props: current, surface, .. })) = self.tree.kind_mut(child) {
					check_void_children(tag, &children)?;
					match surface {
						Some(element) => patch_props(&mut self.surface, element, current, props),
						None => *current = props,
					}
				}
				self.reconcile_children(child, children, depth_limit - 1)
			}

			Patch::Fragment(children) => {
				let span = trace_span!("Patching fragment", index);
				let _enter = span.enter();

				self.reconcile_children(child, children, depth_limit - 1)
			}

			Patch::Component(props) => {
				let span = trace_span!("Patching component", index);
				let _enter = span.enter();

				if let Some(NodeKind::Component(ComponentNode { props: current, .. })) = self.tree.kind_mut(child) {
					*current = props;
				}
				let rendered = self.render_component(child);
				self.reconcile_children(child, rendered, depth_limit - 1)
			}

			Patch::Replace(next) => self.replace_child(parent, index, child, next, depth_limit),
		}
	}

	/// Unmounts `parent`'s children from `from` on.
	fn truncate_children(&mut self, parent: NodeId, from: usize) {
		let removed = match self.tree.children_mut(parent) {
			Some(children) => children.split_off(from),
			None => return,
		};
		trace!(count = removed.len(), "Truncating.");
		for child in removed {
			self.unmount_node(child);
		}
	}

	/// Builds and appends `next` after `parent`'s existing children.
	fn append_children(&mut self, parent: NodeId, next: Vec<Descriptor>, depth_limit: usize) -> Result<(), Error> {
		if next.is_empty() {
			return Ok(());
		}
		trace!(count = next.len(), "Appending.");

		let element = self.parent_surface(Parent::Node(parent));
		let before = if self.tree.is_host(parent) { None } else { self.tree.next_surface_sibling(parent) };
		for descriptor in next {
			let child = self.build_node(descriptor, Parent::Node(parent), true, depth_limit)?;
			self.commit(child, &element, before.as_ref());
			if let Some(children) = self.tree.children_mut(parent) {
				children.push(child);
			}
		}
		Ok(())
	}

	/// Builds `next`, puts it where `old` is on the surface, then unmounts `old`.
	fn replace_child(&mut self, parent: NodeId, index: usize, old: NodeId, next: Descriptor, depth_limit: usize) -> Result<(), Error> {
		let span = trace_span!("Replacing", index);
		let _enter = span.enter();

		let element = self.parent_surface(Parent::Node(parent));
		let before = self.tree.first_surface_node(old).or_else(|| self.tree.next_surface_sibling(old));

		let replacement = self.build_node(next, Parent::Node(parent), true, depth_limit)?;
		self.commit(replacement, &element, before.as_ref());
		self.unmount_node(old);

		if let Some(slot) = self.tree.children_mut(parent).and_then(|children| children.get_mut(index)) {
			*slot = replacement;
		}
		Ok(())
	}
}
