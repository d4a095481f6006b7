//! Binding a freshly built tree to pre-rendered surface nodes.

use crate::{
	error::Error,
	props::bind_handlers,
	renderer::Root,
	surface::{Surface, SurfaceNodeKind},
	tree::{ComponentNode, HostNode, NodeId, NodeKind},
};
use tracing::{instrument, trace, trace_span};

impl<S: Surface> Root<S> {
	/// Binds `id`'s subtree to the surface nodes starting at `cursor`, matching them up positionally.
	///
	/// Returns the surface node following the ones that were bound.
	#[instrument(skip(self))]
	pub(crate) fn bind_node(&mut self, id: NodeId, cursor: Option<S::Node>) -> Result<Option<S::Node>, Error> {
		let Some(node) = self.tree.get(id) else {
			return Ok(cursor);
		};

		match &node.kind {
			NodeKind::Null => Ok(cursor),

			NodeKind::Text { .. } => {
				let span = trace_span!("Binding text");
				let _enter = span.enter();

				let text = self.expect(cursor, &SurfaceNodeKind::Text)?;
				let mut next = self.surface.next_sibling(&text);
				if let Some(separator) = next.clone() {
					if self.surface.kind(&separator) == SurfaceNodeKind::Comment {
						trace!("Removing text separator.");
						next = self.surface.next_sibling(&separator);
						self.surface.remove(&separator);
					}
				}

				if let Some(NodeKind::Text { surface, .. }) = self.tree.kind_mut(id) {
					*surface = Some(text);
				}
				Ok(next)
			}

			NodeKind::Host(HostNode { tag, .. }) => {
				let span = trace_span!("Binding host", %tag);
				let _enter = span.enter();

				let element = self.expect(cursor, &SurfaceNodeKind::Element(tag.to_ascii_lowercase()))?;
				if let Some(NodeKind::Host(HostNode { props, surface, .. })) = self.tree.kind_mut(id) {
					bind_handlers(&mut self.surface, &element, props);
					*surface = Some(element.clone());
				}

				let mut cursor = self.surface.first_child(&element);
				for child in self.tree.children(id).to_vec() {
					cursor = self.bind_node(child, cursor)?;
				}
				if let Some(extra) = cursor {
					trace!(?extra, "Leaving unclaimed surface nodes in place.");
				}
				Ok(self.surface.next_sibling(&element))
			}

			NodeKind::Fragment { children } | NodeKind::Component(ComponentNode { children, .. }) => {
				let mut cursor = cursor;
				for child in children.clone() {
					cursor = self.bind_node(child, cursor)?;
				}
				Ok(cursor)
			}
		}
	}

	fn expect(&self, cursor: Option<S::Node>, expected: &SurfaceNodeKind) -> Result<S::Node, Error> {
		let node = cursor.ok_or_else(|| Error::SurfaceNodeMissing { expected: expected.to_string() })?;
		let found = self.surface.kind(&node);
		let matches = match (expected, &found) {
			(SurfaceNodeKind::Element(expected), SurfaceNodeKind::Element(found)) => expected.eq_ignore_ascii_case(found),
			(expected, found) => expected == found,
		};
		if matches {
			Ok(node)
		} else {
			Err(Error::SurfaceNodeMismatch {
				expected: expected.to_string(),
				found: found.to_string(),
			})
		}
	}
}
