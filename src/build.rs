//! Turning descriptors into live nodes.

use crate::{
	descriptor::{Descriptor, Element, ElementType},
	error::Error,
	hooks::{HookStore, Hooks},
	props::bind_props,
	renderer::Root,
	scheduler::{Lifecycle, Phase},
	surface::Surface,
	tree::{ComponentNode, HostNode, NodeId, NodeKind, Parent},
};
use std::rc::Rc;
use tracing::{instrument, trace, trace_span};

/// Tags that can't have children.
pub(crate) const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];

pub(crate) fn is_void_element(tag: &str) -> bool {
	VOID_ELEMENTS.iter().any(|void| void.eq_ignore_ascii_case(tag))
}

pub(crate) fn check_void_children(tag: &str, children: &[Descriptor]) -> Result<(), Error> {
	if is_void_element(tag) && children.iter().any(|child| !child.is_null()) {
		return Err(Error::VoidElementChildren { tag: tag.to_owned() });
	}
	Ok(())
}

impl<S: Surface> Root<S> {
	/// Builds `descriptor` (and its whole subtree) under `parent`, without inserting it into `parent`'s children.
	///
	/// With `attach`, surface nodes are created and the subtree is assembled on the surface,
	/// but its top surface nodes still need to be [committed](`Root::commit`).
	/// Without it, no surface nodes are created; hydration binds them later.
	///
	/// On error, the partially built subtree is discarded.
	#[instrument(skip(self, descriptor))]
	pub(crate) fn build_node(&mut self, descriptor: Descriptor, parent: Parent, attach: bool, depth_limit: usize) -> Result<NodeId, Error> {
		if depth_limit == 0 {
			return Err(Error::DepthLimit { limit: self.options.depth_limit });
		}

		match descriptor {
			Descriptor::Null => Ok(self.tree.insert(parent, NodeKind::Null)),

			Descriptor::Text(value) => {
				#[cfg(feature = "dangerous-logging")]
				let span = trace_span!("Building text", ?value);
				#[cfg(not(feature = "dangerous-logging"))]
				let span = trace_span!("Building text");
				let _enter = span.enter();

				let surface = attach.then(|| self.surface.create_text(&value));
				Ok(self.tree.insert(parent, NodeKind::Text { value, surface }))
			}

			Descriptor::List(items) => {
				let span = trace_span!("Building list", len = items.len());
				let _enter = span.enter();

				let id = self.tree.insert(parent, NodeKind::Fragment { children: Vec::new() });
				self.grow_children(id, items, attach, depth_limit - 1)?;
				Ok(id)
			}

			Descriptor::Element(Element { ty: ElementType::Tag(tag), mut props }) => {
				let span = trace_span!("Building host", %tag);
				let _enter = span.enter();

				let children = props.take_children();
				check_void_children(&tag, &children)?;

				let surface = if attach {
					let element = self.surface.create_element(&tag);
					bind_props(&mut self.surface, &element, &props);
					Some(element)
				} else {
					None
				};
				let id = self.tree.insert(
					parent,
					NodeKind::Host(HostNode {
						tag,
						props,
						surface,
						children: Vec::new(),
					}),
				);
				self.grow_children(id, children, attach, depth_limit - 1)?;
				Ok(id)
			}

			Descriptor::Element(Element { ty: ElementType::Fragment, mut props }) => {
				let span = trace_span!("Building fragment");
				let _enter = span.enter();

				let children = props.take_children();
				let id = self.tree.insert(parent, NodeKind::Fragment { children: Vec::new() });
				self.grow_children(id, children, attach, depth_limit - 1)?;
				Ok(id)
			}

			Descriptor::Element(Element { ty: ElementType::Component(component), props }) => {
				let span = trace_span!("Building component", component = component.name());
				let _enter = span.enter();

				let id = self.tree.insert(
					parent,
					NodeKind::Component(ComponentNode {
						component,
						props,
						children: Vec::new(),
						hooks: HookStore::default(),
						lifecycle: Rc::new(Lifecycle::new(component.name())),
					}),
				);
				let rendered = self.render_component(id);
				self.grow_children(id, rendered, attach, depth_limit - 1)?;
				Ok(id)
			}
		}
	}

	/// Builds `descriptors` as `id`'s children.
	///
	/// If `id` is an attached host, the children's surface nodes are appended to its element right away.
	fn grow_children(&mut self, id: NodeId, descriptors: Vec<Descriptor>, attach: bool, depth_limit: usize) -> Result<(), Error> {
		let element = match self.tree.get(id) {
			Some(node) if attach => node.kind.surface().cloned(),
			_ => None,
		};

		for descriptor in descriptors {
			let child = match self.build_node(descriptor, Parent::Node(id), attach, depth_limit) {
				Ok(child) => child,
				Err(error) => {
					self.discard(id);
					return Err(error);
				}
			};
			if let Some(element) = &element {
				self.commit(child, element, None);
			}
			if let Some(children) = self.tree.children_mut(id) {
				children.push(child);
			}
		}
		Ok(())
	}

	/// Frees a subtree that never became visible. Effects registered in it never run.
	fn discard(&mut self, id: NodeId) {
		let mut stack = vec![id];
		while let Some(id) = stack.pop() {
			if let Some(node) = self.tree.get(id) {
				if let NodeKind::Component(ComponentNode { lifecycle, .. }) = &node.kind {
					lifecycle.set_phase(Phase::Unmounted);
				}
				stack.extend_from_slice(node.kind.children());
			}
		}
		let freed = self.tree.free_subtree(id);
		trace!(freed, "Discarded partially built subtree.");
	}

	/// Invokes the component at `id` with its current props and returns the child descriptors it produced.
	pub(crate) fn render_component(&mut self, id: NodeId) -> Vec<Descriptor> {
		let Some(NodeKind::Component(ComponentNode { component, props, hooks, lifecycle, .. })) = self.tree.kind_mut(id) else {
			return Vec::new();
		};

		let span = trace_span!("Rendering", component = component.name());
		let _enter = span.enter();

		lifecycle.begin_render();
		let mut context = Hooks::new(hooks, id, lifecycle, &self.scheduler, self.options.hook_diagnostics);
		let rendered = component.render(&mut context, props);
		context.finish();
		rendered.into_children()
	}

	/// Inserts the top surface nodes of `id`'s subtree into `parent` before `before` (or at the end).
	pub(crate) fn commit(&mut self, id: NodeId, parent: &S::Node, before: Option<&S::Node>) {
		let mut nodes = Vec::new();
		self.tree.top_surface_nodes(id, &mut nodes);
		trace!(count = nodes.len(), "Committing.");
		for node in &nodes {
			self.surface.insert_before(parent, node, before);
		}
	}

	/// The surface node that children of `parent` attach to.
	pub(crate) fn parent_surface(&self, parent: Parent) -> S::Node {
		self.tree.surface_parent(parent).unwrap_or_else(|| self.container.clone())
	}
}

